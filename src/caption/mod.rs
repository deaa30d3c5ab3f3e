//! Image caption extraction
//!
//! Turns an input image into a single descriptive sentence via a remote
//! grounding space. The instruction-echo stripping below matches the exact
//! wording the space prepends to its output; that fragility is contained
//! here so the rest of the pipeline depends only on [`Caption`].

pub mod kosmos;
pub mod mock;

pub use kosmos::Kosmos2Captioner;
pub use mock::MockCaptioner;

use crate::models::{Caption, CaptionFragment, ImageReference};
use crate::{Error, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

static INSTRUCTION_ECHO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^Describe this image in detail:\s*(.*)$").unwrap());

#[async_trait]
pub trait CaptionService: Send + Sync {
    async fn extract_caption(&self, image: &ImageReference) -> Result<Caption>;
}

/// Reduce a grounding payload to one sentence-terminated caption.
///
/// Fragments are joined with single spaces, the instruction echo is
/// stripped, and the text is truncated at the last period; any trailing
/// partial sentence is discarded.
pub fn parse_caption(fragments: &[CaptionFragment]) -> Result<Caption> {
    let full_sentence = fragments
        .iter()
        .map(|fragment| fragment.0.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let captures = INSTRUCTION_ECHO.captures(&full_sentence).ok_or_else(|| {
        Error::CaptionFormat(format!(
            "caption payload is missing the instruction echo: {:?}",
            full_sentence
        ))
    })?;
    let description = &captures[1];

    let last_period = description.rfind('.').ok_or_else(|| {
        Error::CaptionFormat(format!(
            "caption has no sentence terminator: {:?}",
            description
        ))
    })?;

    Ok(Caption::new(description[..=last_period].to_string()))
}
