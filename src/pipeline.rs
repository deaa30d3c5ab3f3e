//! Pipeline orchestration: caption, prompt, generation, extraction.

use crate::audio::{
    AudioGenBackend, AudioLdm2Backend, MagnetBackend, SoundGenerationService, TangoBackend,
};
use crate::caption::{CaptionService, Kosmos2Captioner};
use crate::gradio::GradioClient;
use crate::media::{AudioExtractionService, AudioTrackExtractor};
use crate::models::{BackendKind, Caption, Config, ImageReference, MediaArtifact};
use crate::prompt;
use crate::{Error, Result};
use std::fs;
use tracing::{info, warn};

/// Sequences caption extraction, prompt shaping, backend invocation, and
/// audio-track extraction for one request at a time.
pub struct Pipeline {
    caption: Box<dyn CaptionService>,
    backends: Vec<Box<dyn SoundGenerationService>>,
    extractor: Box<dyn AudioExtractionService>,
}

/// Injectable service bundle used to construct [`Pipeline`] in tests/harnesses.
pub struct PipelineServices {
    pub caption: Box<dyn CaptionService>,
    pub backends: Vec<Box<dyn SoundGenerationService>>,
    pub extractor: Box<dyn AudioExtractionService>,
}

/// Outcome of the compare-all variant: one caption, one result per backend.
#[derive(Debug)]
pub struct Comparison {
    pub caption: Caption,
    pub results: Vec<(BackendKind, Result<MediaArtifact>)>,
}

impl Pipeline {
    /// Build a pipeline from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses
    /// that need to inject mocks.
    pub fn with_services(services: PipelineServices) -> Self {
        Self {
            caption: services.caption,
            backends: services.backends,
            extractor: services.extractor,
        }
    }

    /// Construct a pipeline wired to the configured hosted spaces.
    pub fn from_config(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.work_dir)?;

        // Reuse one HTTP connection pool across all space clients.
        let http_client = reqwest::Client::new();
        let gradio = |url: &String| {
            GradioClient::new_with_client(url.clone(), config.hf_token.clone(), http_client.clone())
        };

        Ok(Self::with_services(PipelineServices {
            caption: Box::new(Kosmos2Captioner::new(gradio(&config.caption_space_url))),
            backends: vec![
                Box::new(MagnetBackend::new(gradio(&config.magnet_space_url))),
                Box::new(AudioLdm2Backend::new(gradio(&config.audioldm2_space_url))),
                Box::new(AudioGenBackend::new(gradio(&config.audiogen_space_url))),
                Box::new(TangoBackend::new(gradio(&config.tango_space_url))),
            ],
            extractor: Box::new(AudioTrackExtractor::new(&config.work_dir, http_client)),
        }))
    }

    fn backend_for(&self, kind: BackendKind) -> Result<&dyn SoundGenerationService> {
        self.backends
            .iter()
            .find(|backend| backend.backend() == kind)
            .map(|backend| backend.as_ref())
            .ok_or_else(|| Error::Config(format!("no adapter registered for backend {}", kind)))
    }

    /// Run the full pipeline for one backend. The first failing stage
    /// aborts the request; no partial results are returned.
    pub async fn run(&self, image: &ImageReference, backend: BackendKind) -> Result<MediaArtifact> {
        let caption = self.caption.extract_caption(image).await?;
        self.generate_for(&caption, backend).await
    }

    /// Run every registered backend from one caption. A failing backend
    /// does not prevent the others from completing.
    pub async fn run_all(&self, image: &ImageReference) -> Result<Comparison> {
        let caption = self.caption.extract_caption(image).await?;

        let mut results = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            let kind = backend.backend();
            let result = self.generate_for(&caption, kind).await;
            if let Err(e) = &result {
                warn!("[{}] Generation failed: {}", kind, e);
            }
            results.push((kind, result));
        }

        Ok(Comparison { caption, results })
    }

    async fn generate_for(&self, caption: &Caption, kind: BackendKind) -> Result<MediaArtifact> {
        let backend = self.backend_for(kind)?;
        let prompt = prompt::format_prompt(caption, kind);
        info!("[{}] Generating from prompt: {}", kind, prompt);

        let artifact = backend.generate(&prompt).await?;

        if artifact.is_video() {
            info!("[{}] Extracting audio track from {}", kind, artifact.location);
            return self.extractor.extract_audio_track(&artifact).await;
        }
        Ok(artifact)
    }
}
