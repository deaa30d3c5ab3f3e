use super::CaptionService;
use crate::models::{Caption, ImageReference};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockCaptioner {
    caption_responses: Arc<Mutex<Vec<String>>>,
    format_error: Arc<Mutex<Option<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockCaptioner {
    pub fn new() -> Self {
        Self {
            caption_responses: Arc::new(Mutex::new(Vec::new())),
            format_error: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_caption_response(self, caption: String) -> Self {
        self.caption_responses.lock().unwrap().push(caption);
        self
    }

    pub fn with_format_error(self, message: String) -> Self {
        *self.format_error.lock().unwrap() = Some(message);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockCaptioner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptionService for MockCaptioner {
    async fn extract_caption(&self, _image: &ImageReference) -> Result<Caption> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        if let Some(message) = self.format_error.lock().unwrap().clone() {
            return Err(Error::CaptionFormat(message));
        }

        let responses = self.caption_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Caption::new(
                "A small blue bird perched on a branch.".to_string(),
            ))
        } else {
            let index = (*count - 1) % responses.len();
            Ok(Caption::new(responses[index].clone()))
        }
    }
}
