use super::AudioExtractionService;
use crate::models::{MediaArtifact, MediaKind};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockAudioExtractor {
    artifact_responses: Arc<Mutex<Vec<MediaArtifact>>>,
    decode_error: Arc<Mutex<Option<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockAudioExtractor {
    pub fn new() -> Self {
        Self {
            artifact_responses: Arc::new(Mutex::new(Vec::new())),
            decode_error: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_artifact_response(self, artifact: MediaArtifact) -> Self {
        self.artifact_responses.lock().unwrap().push(artifact);
        self
    }

    pub fn with_decode_error(self, message: String) -> Self {
        *self.decode_error.lock().unwrap() = Some(message);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockAudioExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioExtractionService for MockAudioExtractor {
    async fn extract_audio_track(&self, video: &MediaArtifact) -> Result<MediaArtifact> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        if video.kind != MediaKind::Video {
            return Err(Error::MediaDecode(format!(
                "expected a video artifact, got {}",
                video.location
            )));
        }

        if let Some(message) = self.decode_error.lock().unwrap().clone() {
            return Err(Error::MediaDecode(message));
        }

        let responses = self.artifact_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(MediaArtifact::audio("mock://extracted.wav"))
        } else {
            let index = (*count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_extractor_default_response() {
        let extractor = MockAudioExtractor::new();
        let video = MediaArtifact::video("mock://clip.mp4");

        let artifact = extractor.extract_audio_track(&video).await.unwrap();
        assert_eq!(artifact.kind, MediaKind::Audio);
        assert_eq!(extractor.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_extractor_rejects_audio_input() {
        let extractor = MockAudioExtractor::new();
        let audio = MediaArtifact::audio("mock://sound.wav");

        let err = extractor.extract_audio_track(&audio).await.unwrap_err();
        assert!(matches!(err, Error::MediaDecode(_)));
    }

    #[tokio::test]
    async fn test_mock_extractor_configured_failure() {
        let extractor = MockAudioExtractor::new().with_decode_error("corrupt".to_string());
        let video = MediaArtifact::video("mock://clip.mp4");

        let err = extractor.extract_audio_track(&video).await.unwrap_err();
        assert!(matches!(err, Error::MediaDecode(_)));
    }
}
