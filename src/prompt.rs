//! Backend-specific prompt shaping.

use crate::models::{BackendKind, Caption};

/// Quality hint prepended for the sound-effect backends.
pub const SFX_QUALITY_PREFIX: &str = "High quality sound effects. ";

/// Wrap a caption into the prompt a backend expects.
///
/// Pure and deterministic; backends without a quality hint receive the
/// caption unchanged.
pub fn format_prompt(caption: &Caption, backend: BackendKind) -> String {
    match backend {
        BackendKind::Magnet | BackendKind::AudioGen => {
            format!("{}{}", SFX_QUALITY_PREFIX, caption.as_str())
        }
        BackendKind::AudioLdm2 | BackendKind::Tango => caption.as_str().to_string(),
    }
}
