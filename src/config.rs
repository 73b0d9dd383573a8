//! Configuration types for invoice extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across calls, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::ExtractError;
use crate::provider::VisionModel;
use std::fmt;
use std::sync::Arc;

/// Configuration for one or more invoice extractions.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use invoice2json::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gemini-2.0-flash")
///     .temperature(0.1)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Vision model identifier. Default: "gemini-2.0-flash".
    pub model: String,

    /// Explicit API key. If None, `GEMINI_API_KEY` then `GOOGLE_API_KEY` are
    /// read from the environment when the built-in client is constructed.
    pub api_key: Option<String>,

    /// Pre-constructed model client. Takes precedence over `model`/`api_key`.
    ///
    /// This is the seam tests use to run the full pipeline against a scripted
    /// fake with no network dependency.
    pub client: Option<Arc<dyn VisionModel>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Low temperature keeps the model deterministic and faithful to what it
    /// sees on the invoice — exactly what transcription wants. Higher values
    /// introduce creativity that worsens accuracy.
    pub temperature: f32,

    /// Nucleus sampling cutoff. Default: 0.8.
    pub top_p: f32,

    /// Top-k sampling cutoff. Default: 40.
    pub top_k: u32,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// Dense invoices with long item tables can exceed 2 000 output tokens.
    /// Setting this too low truncates the JSON mid-object, which then fails
    /// extraction entirely.
    pub max_tokens: usize,

    /// Per-model-call timeout in seconds. Default: 60.
    ///
    /// Timeout policy belongs to the HTTP client, not the pipeline: the
    /// pipeline itself has no other long-running step.
    pub api_timeout_secs: u64,

    /// Maximum preprocessed image dimension (width or height) in pixels.
    /// Default: 2048.
    ///
    /// Keeps the upload comfortably inside API body limits while staying
    /// sharp enough for the model to read small print. Raise for dense A4
    /// scans with tiny fonts.
    pub max_image_dimension: u32,

    /// Apply sharpening/contrast/brightness enhancement before upload.
    /// Default: true.
    ///
    /// Helps phone photos and faded fax scans; disable for already-clean
    /// digital renders where enhancement only burns CPU.
    pub enhance: bool,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            client: None,
            temperature: 0.1,
            top_p: 0.8,
            top_k: 40,
            max_tokens: 4096,
            api_timeout_secs: 60,
            max_image_dimension: 2048,
            enhance: true,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("client", &self.client.as_ref().map(|_| "<dyn VisionModel>"))
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_image_dimension", &self.max_image_dimension)
            .field("enhance", &self.enhance)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn client(mut self, client: Arc<dyn VisionModel>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn top_k(mut self, k: u32) -> Self {
        self.config.top_k = k.max(1);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn max_image_dimension(mut self, px: u32) -> Self {
        self.config.max_image_dimension = px.max(256);
        self
    }

    pub fn enhance(mut self, v: bool) -> Self {
        self.config.enhance = v;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "model identifier must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
