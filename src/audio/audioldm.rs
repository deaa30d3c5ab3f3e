use super::params::AudioLdm2Params;
use super::SoundGenerationService;
use crate::gradio::{GradioClient, PredictRoute};
use crate::models::{BackendKind, MediaArtifact};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::json;

const PREDICT_FN_INDEX: u32 = 1;

pub struct AudioLdm2Backend {
    gradio: GradioClient,
    params: AudioLdm2Params,
}

impl AudioLdm2Backend {
    pub fn new(gradio: GradioClient) -> Self {
        Self {
            gradio,
            params: AudioLdm2Params::default(),
        }
    }
}

#[async_trait]
impl SoundGenerationService for AudioLdm2Backend {
    fn backend(&self) -> BackendKind {
        BackendKind::AudioLdm2
    }

    async fn generate(&self, prompt: &str) -> Result<MediaArtifact> {
        let p = &self.params;
        let data = vec![
            json!(prompt),
            json!(p.negative_prompt),
            json!(p.duration_secs),
            json!(p.guidance_scale),
            json!(p.seed),
            json!(p.candidate_waveforms),
        ];

        let outputs = self
            .gradio
            .predict(PredictRoute::FnIndex(PREDICT_FN_INDEX), data)
            .await?;

        let first = outputs.first().ok_or_else(|| {
            Error::BackendInvocation("AudioLDM2 returned no outputs".to_string())
        })?;
        let url = self.gradio.resolve_file(first)?;

        // The space renders its waveform as a video clip.
        Ok(MediaArtifact::video(url))
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
    async fn test_generate_returns_video_artifact() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/run/predict"))
            .and(body_string_contains("\"fn_index\":1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": ["/tmp/waveform.mp4"]
            })))
            .mount(&server)
            .await;

        let backend = AudioLdm2Backend::new(GradioClient::new(server.uri(), None));
        let artifact = backend.generate("Rain on a roof.").await.unwrap();

        assert_eq!(artifact.kind, MediaKind::Video);
        assert_eq!(
            artifact.location,
            format!("{}/file=/tmp/waveform.mp4", server.uri())
        );
    }

    #[tokio::test]
    async fn test_generate_sends_fixed_params_in_order() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/run/predict"))
            .and(body_string_contains(
                "\"Rain on a roof.\",\"Low quality. Music.\",10,3.5,45,3",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": ["/tmp/waveform.mp4"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = AudioLdm2Backend::new(GradioClient::new(server.uri(), None));
        backend.generate("Rain on a roof.").await.unwrap();
    }
}
