//! Configuration for the OCR + grounded-chat pipeline.
//!
//! Every knob the pipeline reads lives in [`PipelineConfig`]: which OCR tool
//! to launch and with what environment, which chat endpoint and model answer
//! questions, and how long to wait for them. The config is passed explicitly
//! into each stage; nothing in the library reads process-wide state.

use crate::error::DocQaError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Default OCR executable.
pub const DEFAULT_OCR_TOOL: &str = "chandra";

/// Default OCR strategy passed as `--method`.
pub const DEFAULT_OCR_METHOD: &str = "hf";

/// Default Ollama-compatible chat endpoint.
pub const DEFAULT_CHAT_URL: &str = "http://localhost:11434/api/chat";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "llama3.1:8b";

/// Configuration for document ingestion and grounded chat.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_docqa::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .ocr_tool("/opt/chandra/bin/chandra")
///     .chat_url("http://gpu-box:11434/api/chat")
///     .model("llama3.1:8b")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// OCR executable name or path. Default: `chandra`.
    pub ocr_tool: String,

    /// Strategy id passed to the OCR tool as `--method <id>`. Default: `hf`.
    pub ocr_method: String,

    /// Environment variables set on the OCR subprocess only.
    ///
    /// Defaults pin the numeric libraries to one thread
    /// (`OMP_NUM_THREADS=1`, `MKL_NUM_THREADS=1`) and set
    /// `KMP_DUPLICATE_LIB_OK=TRUE`, which the OCR model runtime needs when two
    /// OpenMP copies end up loaded.
    pub ocr_env: Vec<(String, String)>,

    /// Chat endpoint URL (Ollama `/api/chat` wire format).
    pub chat_url: String,

    /// Model identifier sent with every chat request. Default: `llama3.1:8b`.
    pub model: String,

    /// Timeout for one chat request in seconds. Default: 300.
    ///
    /// Local inference on a long grounding context routinely takes minutes;
    /// the answer is awaited as a single unit.
    pub chat_timeout_secs: u64,

    /// Sampling temperature. `None` leaves the endpoint default in place.
    pub temperature: Option<f32>,

    /// Custom grounding instruction. Must contain `{context}`; if None the
    /// built-in template in [`crate::prompts`] is used.
    pub system_prompt: Option<String>,

    /// Route questions through a named `edgequake-llm` provider
    /// (e.g. "openai", "anthropic") instead of the Ollama endpoint.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Optional progress callback for the long-running stages.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ocr_tool: DEFAULT_OCR_TOOL.to_string(),
            ocr_method: DEFAULT_OCR_METHOD.to_string(),
            ocr_env: default_ocr_env(),
            chat_url: DEFAULT_CHAT_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            chat_timeout_secs: 300,
            temperature: None,
            system_prompt: None,
            provider_name: None,
            provider: None,
            progress_callback: None,
        }
    }
}

fn default_ocr_env() -> Vec<(String, String)> {
    [
        ("OMP_NUM_THREADS", "1"),
        ("MKL_NUM_THREADS", "1"),
        ("KMP_DUPLICATE_LIB_OK", "TRUE"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("ocr_tool", &self.ocr_tool)
            .field("ocr_method", &self.ocr_method)
            .field("ocr_env", &self.ocr_env)
            .field("chat_url", &self.chat_url)
            .field("model", &self.model)
            .field("chat_timeout_secs", &self.chat_timeout_secs)
            .field("temperature", &self.temperature)
            .field("system_prompt", &self.system_prompt.as_ref().map(|_| "<custom>"))
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn ocr_tool(mut self, tool: impl Into<String>) -> Self {
        self.config.ocr_tool = tool.into();
        self
    }

    pub fn ocr_method(mut self, method: impl Into<String>) -> Self {
        self.config.ocr_method = method.into();
        self
    }

    /// Add (or override) one environment variable for the OCR subprocess.
    pub fn ocr_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.config.ocr_env.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.config.ocr_env.push((key, value)),
        }
        self
    }

    /// Drop all OCR environment overrides, including the defaults.
    pub fn clear_ocr_env(mut self) -> Self {
        self.config.ocr_env.clear();
        self
    }

    pub fn chat_url(mut self, url: impl Into<String>) -> Self {
        self.config.chat_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn chat_timeout_secs(mut self, secs: u64) -> Self {
        self.config.chat_timeout_secs = secs;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DocQaError> {
        let c = &self.config;
        if c.ocr_tool.trim().is_empty() {
            return Err(DocQaError::InvalidConfig("OCR tool must not be empty".into()));
        }
        if c.ocr_method.trim().is_empty() {
            return Err(DocQaError::InvalidConfig(
                "OCR method must not be empty".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(DocQaError::InvalidConfig("Model must not be empty".into()));
        }
        if !(c.chat_url.starts_with("http://") || c.chat_url.starts_with("https://")) {
            return Err(DocQaError::InvalidConfig(format!(
                "Chat URL must be http(s), got '{}'",
                c.chat_url
            )));
        }
        if c.chat_timeout_secs == 0 {
            return Err(DocQaError::InvalidConfig(
                "Chat timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref prompt) = c.system_prompt {
            if !prompt.contains("{context}") {
                return Err(DocQaError::InvalidConfig(
                    "Custom system prompt must contain the {context} placeholder".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.ocr_tool, "chandra");
        assert_eq!(c.ocr_method, "hf");
        assert_eq!(c.chat_timeout_secs, 300);
        assert_eq!(c.model, "llama3.1:8b");
        assert!(c
            .ocr_env
            .iter()
            .any(|(k, v)| k == "OMP_NUM_THREADS" && v == "1"));
    }

    #[test]
    fn builder_overrides_env_entry() {
        let c = PipelineConfig::builder()
            .ocr_env("OMP_NUM_THREADS", "4")
            .ocr_env("CUDA_VISIBLE_DEVICES", "0")
            .build()
            .unwrap();
        let omp: Vec<_> = c.ocr_env.iter().filter(|(k, _)| k == "OMP_NUM_THREADS").collect();
        assert_eq!(omp.len(), 1);
        assert_eq!(omp[0].1, "4");
        assert!(c.ocr_env.iter().any(|(k, _)| k == "CUDA_VISIBLE_DEVICES"));
    }

    #[test]
    fn clear_env() {
        let c = PipelineConfig::builder().clear_ocr_env().build().unwrap();
        assert!(c.ocr_env.is_empty());
    }

    #[test]
    fn rejects_bad_url() {
        let err = PipelineConfig::builder()
            .chat_url("localhost:11434")
            .build()
            .unwrap_err();
        assert!(matches!(err, DocQaError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_empty_tool_and_zero_timeout() {
        assert!(PipelineConfig::builder().ocr_tool("  ").build().is_err());
        assert!(PipelineConfig::builder().chat_timeout_secs(0).build().is_err());
    }

    #[test]
    fn rejects_prompt_without_placeholder() {
        let err = PipelineConfig::builder()
            .system_prompt("Answer briefly.")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("{context}"));
    }

    #[test]
    fn temperature_is_clamped() {
        let c = PipelineConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, Some(2.0));
    }

    #[test]
    fn debug_hides_provider() {
        let s = format!("{:?}", PipelineConfig::default());
        assert!(s.contains("chandra"));
        assert!(s.contains("provider: None"));
    }
}
