use super::params::TangoParams;
use super::SoundGenerationService;
use crate::gradio::{GradioClient, PredictRoute};
use crate::models::{BackendKind, MediaArtifact};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::json;

const PREDICT_FN_INDEX: u32 = 0;

pub struct TangoBackend {
    gradio: GradioClient,
    params: TangoParams,
}

impl TangoBackend {
    pub fn new(gradio: GradioClient) -> Self {
        Self {
            gradio,
            params: TangoParams::default(),
        }
    }
}

#[async_trait]
impl SoundGenerationService for TangoBackend {
    fn backend(&self) -> BackendKind {
        BackendKind::Tango
    }

    async fn generate(&self, prompt: &str) -> Result<MediaArtifact> {
        let p = &self.params;
        let data = vec![
            json!(prompt),
            json!(p.inference_steps),
            json!(p.guidance_scale),
        ];

        let outputs = self
            .gradio
            .predict(PredictRoute::FnIndex(PREDICT_FN_INDEX), data)
            .await?;

        let first = outputs
            .first()
            .ok_or_else(|| Error::BackendInvocation("Tango returned no outputs".to_string()))?;
        let url = self.gradio.resolve_file(first)?;

        Ok(MediaArtifact::audio(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_returns_audio_artifact() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/run/predict"))
            .and(body_string_contains("\"A thunderstorm.\",100,3.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": ["/tmp/tango.wav"]
            })))
            .mount(&server)
            .await;

        let backend = TangoBackend::new(GradioClient::new(server.uri(), None));
        let artifact = backend.generate("A thunderstorm.").await.unwrap();

        assert_eq!(artifact.kind, MediaKind::Audio);
        assert_eq!(
            artifact.location,
            format!("{}/file=/tmp/tango.wav", server.uri())
        );
    }
}
