use super::params::AudioGenParams;
use super::SoundGenerationService;
use crate::gradio::{GradioClient, PredictRoute};
use crate::models::{BackendKind, MediaArtifact};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::json;

const PREDICT_FN_INDEX: u32 = 0;

pub struct AudioGenBackend {
    gradio: GradioClient,
    params: AudioGenParams,
}

impl AudioGenBackend {
    pub fn new(gradio: GradioClient) -> Self {
        Self {
            gradio,
            params: AudioGenParams::default(),
        }
    }
}

#[async_trait]
impl SoundGenerationService for AudioGenBackend {
    fn backend(&self) -> BackendKind {
        BackendKind::AudioGen
    }

    async fn generate(&self, prompt: &str) -> Result<MediaArtifact> {
        let data = vec![json!(prompt), json!(self.params.duration_secs)];

        let outputs = self
            .gradio
            .predict(PredictRoute::FnIndex(PREDICT_FN_INDEX), data)
            .await?;

        let first = outputs.first().ok_or_else(|| {
            Error::BackendInvocation("AudioGen returned no outputs".to_string())
        })?;
        let url = self.gradio.resolve_file(first)?;

        Ok(MediaArtifact::audio(url))
    }
}
