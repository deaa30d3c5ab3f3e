//! Audio track extraction from generated video containers.
//!
//! Some generation spaces render their output as a video clip; this module
//! materializes the embedded audio stream as a standalone WAV artifact.

pub mod extract;
pub mod mock;

pub use extract::AudioTrackExtractor;
pub use mock::MockAudioExtractor;

use crate::models::MediaArtifact;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AudioExtractionService: Send + Sync {
    /// Materialize the audio track of a video artifact as a standalone
    /// audio artifact.
    async fn extract_audio_track(&self, video: &MediaArtifact) -> Result<MediaArtifact>;
}
