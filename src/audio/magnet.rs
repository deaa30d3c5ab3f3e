use super::params::MagnetParams;
use super::SoundGenerationService;
use crate::gradio::{GradioClient, PredictRoute};
use crate::models::{BackendKind, MediaArtifact};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::json;

const PREDICT_API: &str = "predict_full";

pub struct MagnetBackend {
    gradio: GradioClient,
    params: MagnetParams,
}

impl MagnetBackend {
    pub fn new(gradio: GradioClient) -> Self {
        Self {
            gradio,
            params: MagnetParams::default(),
        }
    }
}

#[async_trait]
impl SoundGenerationService for MagnetBackend {
    fn backend(&self) -> BackendKind {
        BackendKind::Magnet
    }

    async fn generate(&self, prompt: &str) -> Result<MediaArtifact> {
        let p = &self.params;
        let data = vec![
            json!(p.model),
            json!(p.custom_model_path),
            json!(prompt),
            json!(p.temperature),
            json!(p.top_p),
            json!(p.max_cfg_coef),
            json!(p.min_cfg_coef),
            json!(p.decoding_steps[0]),
            json!(p.decoding_steps[1]),
            json!(p.decoding_steps[2]),
            json!(p.decoding_steps[3]),
            json!(p.span_score),
        ];

        let outputs = self
            .gradio
            .predict(PredictRoute::ApiName(PREDICT_API), data)
            .await?;

        // The space answers with a video player payload; the clip reference
        // sits under its "video" key on newer space revisions.
        let first = outputs.first().ok_or_else(|| {
            Error::BackendInvocation("MAGNet returned no outputs".to_string())
        })?;
        let video = first.get("video").unwrap_or(first);
        let url = self.gradio.resolve_file(video)?;

        Ok(MediaArtifact::video(url))
    }
}
