//! Sound generation backend adapters
//!
//! One adapter per hosted generation space. Each binds a fixed model and
//! parameter record; only the prompt varies per call. Adapters report their
//! output unmodified, so video-producing backends hand a video artifact to
//! the post-processing stage.

pub mod audiogen;
pub mod audioldm;
pub mod magnet;
pub mod mock;
pub mod params;
pub mod tango;

pub use audiogen::AudioGenBackend;
pub use audioldm::AudioLdm2Backend;
pub use magnet::MagnetBackend;
pub use mock::MockSoundBackend;
pub use tango::TangoBackend;

use crate::models::{BackendKind, MediaArtifact};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait SoundGenerationService: Send + Sync {
    /// Which backend this adapter drives.
    fn backend(&self) -> BackendKind;

    async fn generate(&self, prompt: &str) -> Result<MediaArtifact>;
}
