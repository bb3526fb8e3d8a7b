use async_trait::async_trait;

use crate::config::Config;
use crate::errors::WorkflowError;

pub mod anthropic;
pub mod openai;

/// Planning stages want a creative model, code generation a precise one.
/// The role picks model id and sampling parameters; the backend never sees
/// which stage it is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    Planning,
    Implementation,
}

pub(crate) const PLANNING_TEMPERATURE: f32 = 0.7;
pub(crate) const IMPLEMENTATION_TEMPERATURE: f32 = 0.2;

/// Narrow text-in/text-out boundary over an LLM provider.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;
    async fn generate(&self, prompt: &str, role: ModelRole) -> Result<String, WorkflowError>;
}

pub type DynBackend = Box<dyn Backend + Send + Sync>;

/// Pick the backend from available credentials. A caller-supplied key always
/// wins and is treated as an Anthropic key; otherwise the configured
/// Anthropic key, then the configured OpenAI key. Blank keys do not count.
pub fn select_backend(
    override_key: Option<&str>,
    cfg: &Config,
) -> Result<DynBackend, WorkflowError> {
    if let Some(key) = usable(override_key) {
        return Ok(Box::new(anthropic::AnthropicBackend::new(key.into(), cfg)));
    }
    if let Some(key) = usable(cfg.anthropic_api_key.as_deref()) {
        return Ok(Box::new(anthropic::AnthropicBackend::new(key.into(), cfg)));
    }
    if let Some(key) = usable(cfg.openai_api_key.as_deref()) {
        return Ok(Box::new(openai::OpenAiBackend::new(key.into(), cfg)));
    }
    Err(WorkflowError::Authentication(
        "no API key available; supply one in the request or set ANTHROPIC_API_KEY or OPENAI_API_KEY"
            .to_string(),
    ))
}

fn usable(key: Option<&str>) -> Option<&str> {
    key.map(str::trim).filter(|k| !k.is_empty())
}
