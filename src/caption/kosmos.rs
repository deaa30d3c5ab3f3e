use super::CaptionService;
use crate::gradio::{GradioClient, PredictRoute};
use crate::models::{Caption, CaptionFragment, ImageReference};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use serde_json::Value;

/// Description mode requested from the grounding space.
const DESCRIPTION_MODE: &str = "Detailed";
const PREDICT_FN_INDEX: u32 = 4;

pub struct Kosmos2Captioner {
    gradio: GradioClient,
}

impl Kosmos2Captioner {
    pub fn new(gradio: GradioClient) -> Self {
        Self { gradio }
    }

    /// Build the image component payload: URLs pass through, local files
    /// are inlined as base64 data URLs.
    async fn image_payload(&self, image: &ImageReference) -> Result<Value> {
        match image {
            ImageReference::Url(url) => Ok(Value::String(url.clone())),
            ImageReference::Path(path) => {
                let bytes = tokio::fs::read(path).await?;
                let mime = sniff_image_mime(&bytes);
                let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
                Ok(Value::String(format!("data:{};base64,{}", mime, encoded)))
            }
        }
    }
}

#[async_trait]
impl CaptionService for Kosmos2Captioner {
    async fn extract_caption(&self, image: &ImageReference) -> Result<Caption> {
        tracing::debug!("Requesting caption for {}", image);
        let payload = self.image_payload(image).await?;

        let outputs = self
            .gradio
            .predict(
                PredictRoute::FnIndex(PREDICT_FN_INDEX),
                vec![payload, Value::String(DESCRIPTION_MODE.to_string())],
            )
            .await?;

        // outputs[0] is the annotated image; outputs[1] references the
        // grounding JSON with the actual text fragments.
        let grounding_ref = outputs.get(1).ok_or_else(|| {
            Error::CaptionFormat("captioning space returned no grounding payload".to_string())
        })?;
        let url = self.gradio.resolve_file(grounding_ref).map_err(|_| {
            Error::CaptionFormat(format!("unexpected grounding reference: {}", grounding_ref))
        })?;

        let raw = self.gradio.download(&url).await?;
        let fragments: Vec<CaptionFragment> = serde_json::from_slice(&raw)
            .map_err(|e| Error::CaptionFormat(format!("unparseable grounding payload: {}", e)))?;

        let caption = super::parse_caption(&fragments)?;
        tracing::info!("Image caption: {}", caption);
        Ok(caption)
    }
}

fn sniff_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => {
            tracing::debug!(
                "Unrecognized image magic (first bytes: {:02X?}), defaulting to image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}
