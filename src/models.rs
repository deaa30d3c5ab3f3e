//! Data models and structures
//!
//! Defines the core data structures for image references, captions, media
//! artifacts, backend selection, and the Gradio prediction wire format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Input image for one request, either a local file or a remote URL.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageReference {
    Url(String),
    Path(PathBuf),
}

impl ImageReference {
    pub fn parse(input: &str) -> Self {
        if input.starts_with("http://") || input.starts_with("https://") {
            Self::Url(input.to_string())
        } else {
            Self::Path(PathBuf::from(input))
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{}", url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One `[text, bounding-region]` pair from a grounding caption payload.
/// The region is opaque to this pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptionFragment(pub String, pub serde_json::Value);

/// A single sentence-terminated image description.
///
/// Only produced by caption parsing, so holders can rely on it being
/// non-empty and ending at a sentence boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Caption(String);

impl Caption {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[value(name = "magnet")]
    Magnet,
    #[value(name = "audioldm2")]
    AudioLdm2,
    #[value(name = "audiogen")]
    AudioGen,
    #[value(name = "tango")]
    Tango,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Magnet,
        BackendKind::AudioLdm2,
        BackendKind::AudioGen,
        BackendKind::Tango,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Magnet => "magnet",
            BackendKind::AudioLdm2 => "audioldm2",
            BackendKind::AudioGen => "audiogen",
            BackendKind::Tango => "tango",
        }
    }

    /// Media kind the backend's space produces for a successful generation.
    pub fn output_kind(&self) -> MediaKind {
        match self {
            BackendKind::Magnet | BackendKind::AudioLdm2 => MediaKind::Video,
            BackendKind::AudioGen | BackendKind::Tango => MediaKind::Audio,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        match input {
            "magnet" => Ok(BackendKind::Magnet),
            "audioldm2" => Ok(BackendKind::AudioLdm2),
            "audiogen" => Ok(BackendKind::AudioGen),
            "tango" => Ok(BackendKind::Tango),
            other => Err(format!(
                "Unknown backend '{}'. Expected one of: magnet, audioldm2, audiogen, tango",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Reference to generated media, either a remote URL or a local file path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaArtifact {
    pub location: String,
    pub kind: MediaKind,
}

impl MediaArtifact {
    pub fn audio(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            kind: MediaKind::Audio,
        }
    }

    pub fn video(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            kind: MediaKind::Video,
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

// Gradio prediction API request/response models
#[derive(Debug, Serialize)]
pub struct PredictRequest {
    pub data: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fn_index: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    pub data: Vec<serde_json::Value>,
}

/// Server-side file reference as returned by Gradio file components.
#[derive(Debug, Clone, Deserialize)]
pub struct GradioFile {
    pub name: String,
    #[serde(default)]
    pub is_file: bool,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub hf_token: Option<String>,
    pub caption_space_url: String,
    pub magnet_space_url: String,
    pub audioldm2_space_url: String,
    pub audiogen_space_url: String,
    pub tango_space_url: String,
    pub max_concurrent_requests: usize,
    pub max_queued_requests: usize,
    pub work_dir: PathBuf,
}

const DEFAULT_CAPTION_SPACE: &str = "https://ydshieh-kosmos-2.hf.space";
const DEFAULT_MAGNET_SPACE: &str = "https://fffiloni-magnet.hf.space";
const DEFAULT_AUDIOLDM2_SPACE: &str = "https://haoheliu-audioldm2-text2audio-text2music.hf.space";
const DEFAULT_AUDIOGEN_SPACE: &str = "https://fffiloni-audiogen.hf.space";
const DEFAULT_TANGO_SPACE: &str = "https://declare-lab-tango.hf.space";

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            hf_token: std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty()),
            caption_space_url: space_url("CAPTION_SPACE_URL", DEFAULT_CAPTION_SPACE),
            magnet_space_url: space_url("MAGNET_SPACE_URL", DEFAULT_MAGNET_SPACE),
            audioldm2_space_url: space_url("AUDIOLDM2_SPACE_URL", DEFAULT_AUDIOLDM2_SPACE),
            audiogen_space_url: space_url("AUDIOGEN_SPACE_URL", DEFAULT_AUDIOGEN_SPACE),
            tango_space_url: space_url("TANGO_SPACE_URL", DEFAULT_TANGO_SPACE),
            max_concurrent_requests: bounded_env("MAX_CONCURRENT_REQUESTS", 2)?,
            max_queued_requests: bounded_env("MAX_QUEUED_REQUESTS", 10)?,
            work_dir: std::env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir().join("image2sfx")),
        })
    }
}

fn space_url(var: &str, default: &str) -> String {
    let url = std::env::var(var).unwrap_or_else(|_| default.to_string());
    url.trim_end_matches('/').to_string()
}

fn bounded_env(var: &str, default: usize) -> crate::Result<usize> {
    match std::env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| crate::Error::Config(format!("{} must be a number, got '{}'", var, value))),
        Err(_) => Ok(default),
    }
}
