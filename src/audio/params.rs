//! Fixed generation parameters, one immutable record per backend.
//!
//! Values mirror the hosted spaces' tuned defaults. They are bound to the
//! adapters at construction and never exposed to callers.

/// MAGNet span-scored decoding parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MagnetParams {
    pub model: &'static str,
    /// Custom model path field on the space; unused with stock models.
    pub custom_model_path: &'static str,
    pub temperature: f64,
    pub top_p: f64,
    pub max_cfg_coef: f64,
    pub min_cfg_coef: f64,
    /// Decoding steps for the four generation stages.
    pub decoding_steps: [u32; 4],
    pub span_score: &'static str,
}

impl Default for MagnetParams {
    fn default() -> Self {
        Self {
            model: "facebook/audio-magnet-small",
            custom_model_path: "",
            temperature: 3.0,
            top_p: 0.9,
            max_cfg_coef: 10.0,
            min_cfg_coef: 1.0,
            decoding_steps: [20, 10, 10, 10],
            span_score: "prod-stride1 (new!)",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioLdm2Params {
    pub negative_prompt: &'static str,
    pub duration_secs: u32,
    pub guidance_scale: f64,
    pub seed: u64,
    pub candidate_waveforms: u32,
}

impl Default for AudioLdm2Params {
    fn default() -> Self {
        Self {
            negative_prompt: "Low quality. Music.",
            duration_secs: 10,
            guidance_scale: 3.5,
            seed: 45,
            candidate_waveforms: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioGenParams {
    pub duration_secs: u32,
}

impl Default for AudioGenParams {
    fn default() -> Self {
        Self { duration_secs: 10 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TangoParams {
    pub inference_steps: u32,
    pub guidance_scale: f64,
}

impl Default for TangoParams {
    fn default() -> Self {
        Self {
            inference_steps: 100,
            guidance_scale: 3.0,
        }
    }
}
