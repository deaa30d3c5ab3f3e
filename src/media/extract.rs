use super::AudioExtractionService;
use crate::models::{MediaArtifact, MediaKind};
use crate::{Error, Result};
use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use uuid::Uuid;

/// Output sample rate for extracted tracks.
const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Extracts the audio stream of a video container into a mono 44.1kHz WAV.
pub struct AudioTrackExtractor {
    client: reqwest::Client,
    work_dir: PathBuf,
}

impl AudioTrackExtractor {
    pub fn new(work_dir: &Path, client: reqwest::Client) -> Self {
        Self {
            client,
            work_dir: work_dir.to_path_buf(),
        }
    }

    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let response = self
                .client
                .get(location)
                .send()
                .await
                .map_err(|e| Error::MediaDecode(format!("fetch {}: {}", location, e)))?;
            if !response.status().is_success() {
                return Err(Error::MediaDecode(format!(
                    "fetch {} failed (status {})",
                    location,
                    response.status()
                )));
            }
            Ok(response.bytes().await?.to_vec())
        } else {
            Ok(tokio::fs::read(location).await?)
        }
    }
}

#[async_trait]
impl AudioExtractionService for AudioTrackExtractor {
    async fn extract_audio_track(&self, video: &MediaArtifact) -> Result<MediaArtifact> {
        if video.kind != MediaKind::Video {
            return Err(Error::MediaDecode(format!(
                "expected a video artifact, got {}",
                video.location
            )));
        }

        let data = self.fetch(&video.location).await?;

        // Request-unique output name so concurrent requests never collide.
        let output_path = self.work_dir.join(format!("sfx_{}.wav", Uuid::new_v4()));
        let destination = output_path.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let (samples, source_rate) = decode_to_mono(data)?;
            let samples = if source_rate != TARGET_SAMPLE_RATE {
                resample(&samples, source_rate, TARGET_SAMPLE_RATE)?
            } else {
                samples
            };
            write_wav(&destination, &samples)
        })
        .await
        .map_err(|e| Error::MediaDecode(format!("extraction task join error: {}", e)))??;

        tracing::info!("Extracted audio track to {}", output_path.display());
        Ok(MediaArtifact::audio(output_path.to_string_lossy().to_string()))
    }
}

/// Demux and decode the container's audio track to mono f32 samples.
fn decode_to_mono(data: Vec<u8>) -> Result<(Vec<f32>, u32)> {
    let cursor = Cursor::new(data);
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let hint = Hint::new();
    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();
    let decoder_opts = DecoderOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| Error::MediaDecode(format!("probe: {}", e)))?;

    let mut format = probed.format;

    // Video containers also carry video tracks; the audio one is the track
    // with a sample rate.
    let track = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.sample_rate.is_some())
        .ok_or(Error::NoAudioTrack)?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let source_rate = codec_params
        .sample_rate
        .ok_or_else(|| Error::MediaDecode("unknown sample rate".to_string()))?;
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &decoder_opts)
        .map_err(|e| Error::MediaDecode(format!("codec: {}", e)))?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(Error::MediaDecode(format!("packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                tracing::warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => {
                return Err(Error::MediaDecode(format!("decode: {}", e)));
            }
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        if num_frames == 0 {
            continue;
        }

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let samples = sample_buf.samples();

        // Downmix to mono if multi-channel
        if channels > 1 {
            for frame in samples.chunks(channels) {
                let mono: f32 = frame.iter().sum::<f32>() / channels as f32;
                all_samples.push(mono);
            }
        } else {
            all_samples.extend_from_slice(samples);
        }
    }

    if all_samples.is_empty() {
        return Err(Error::MediaDecode("no audio samples decoded".to_string()));
    }

    Ok((all_samples, source_rate))
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let chunk_size = 1024;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| Error::MediaDecode(format!("resampler init: {}", e)))?;

    let mut output = Vec::with_capacity((samples.len() as f64 * ratio) as usize + chunk_size);

    for chunk in samples.chunks(chunk_size) {
        let input = if chunk.len() < chunk_size {
            let mut padded = chunk.to_vec();
            padded.resize(chunk_size, 0.0);
            padded
        } else {
            chunk.to_vec()
        };

        let result = resampler
            .process(&[input], None)
            .map_err(|e| Error::MediaDecode(format!("resample: {}", e)))?;

        if let Some(channel) = result.first() {
            output.extend_from_slice(channel);
        }
    }

    // Trim padding overshoot to the expected length
    let expected_len = (samples.len() as f64 * ratio) as usize;
    output.truncate(expected_len);

    Ok(output)
}

fn write_wav(path: &Path, samples: &[f32]) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: TARGET_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer =
        WavWriter::create(path, spec).map_err(|e| Error::MediaDecode(format!("wav create: {}", e)))?;

    for sample in samples {
        let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(quantized)
            .map_err(|e| Error::MediaDecode(format!("wav write: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| Error::MediaDecode(format!("wav finalize: {}", e)))?;

    Ok(())
}
