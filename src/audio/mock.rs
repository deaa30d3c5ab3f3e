use super::SoundGenerationService;
use crate::models::{BackendKind, MediaArtifact, MediaKind};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockSoundBackend {
    kind: BackendKind,
    artifact_responses: Arc<Mutex<Vec<MediaArtifact>>>,
    invocation_error: Arc<Mutex<Option<String>>>,
    call_count: Arc<Mutex<usize>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockSoundBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            artifact_responses: Arc::new(Mutex::new(Vec::new())),
            invocation_error: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_artifact_response(self, artifact: MediaArtifact) -> Self {
        self.artifact_responses.lock().unwrap().push(artifact);
        self
    }

    pub fn with_invocation_error(self, message: String) -> Self {
        *self.invocation_error.lock().unwrap() = Some(message);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SoundGenerationService for MockSoundBackend {
    fn backend(&self) -> BackendKind {
        self.kind
    }

    async fn generate(&self, prompt: &str) -> Result<MediaArtifact> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(message) = self.invocation_error.lock().unwrap().clone() {
            return Err(Error::BackendInvocation(message));
        }

        let responses = self.artifact_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(match self.kind.output_kind() {
                MediaKind::Video => MediaArtifact::video(format!("mock://{}.mp4", self.kind)),
                MediaKind::Audio => MediaArtifact::audio(format!("mock://{}.wav", self.kind)),
            })
        } else {
            let index = (*count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}
