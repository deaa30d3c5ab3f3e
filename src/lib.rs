//! Image-to-SFX orchestration service
//!
//! Chains hosted inference spaces to turn an image into a generated sound
//! effect: a captioning space describes the image, the description becomes a
//! prompt for one or more audio generation spaces, and video outputs have
//! their audio track extracted to a standalone WAV file.

pub mod admission;
pub mod audio;
pub mod caption;
pub mod error;
pub mod gradio;
pub mod media;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod server;

pub use error::{Error, Result};
