//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! Display strings name the pipeline stage that failed, since they are
//! surfaced to callers as-is.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Caption extraction failed: {0}")]
    CaptionFormat(String),

    #[error("Generation backend unreachable: {0}")]
    BackendUnavailable(String),

    #[error("Generation backend is still warming up, retry later: {0}")]
    BackendNotReady(String),

    #[error("Generation backend invocation failed: {0}")]
    BackendInvocation(String),

    #[error("Audio extraction could not decode media: {0}")]
    MediaDecode(String),

    #[error("Audio extraction found no audio track in the media")]
    NoAudioTrack,

    #[error("Request queue is full, try again later")]
    CapacityExceeded,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
