use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Backend, ModelRole, IMPLEMENTATION_TEMPERATURE, PLANNING_TEMPERATURE};
use crate::config::Config;
use crate::errors::WorkflowError;

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 8192;

pub struct AnthropicBackend {
    api_key: String,
    api_base: String,
    planning_model: String,
    implementation_model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Msg<'a>>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    #[serde(default)]
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

impl AnthropicBackend {
    pub fn new(api_key: String, cfg: &Config) -> Self {
        Self {
            api_key,
            api_base: cfg.anthropic_api_base.clone(),
            planning_model: cfg.anthropic_planning_model.clone(),
            implementation_model: cfg.anthropic_implementation_model.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }

    fn params(&self, role: ModelRole) -> (&str, f32) {
        match role {
            ModelRole::Planning => (&self.planning_model, PLANNING_TEMPERATURE),
            ModelRole::Implementation => (&self.implementation_model, IMPLEMENTATION_TEMPERATURE),
        }
    }
}

#[async_trait]
impl Backend for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn generate(&self, prompt: &str, role: ModelRole) -> Result<String, WorkflowError> {
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| WorkflowError::BackendUnavailable(format!("anthropic client: {e}")))?;

        let (model, temperature) = self.params(role);
        let body = MsgRequest {
            model,
            max_tokens: MAX_TOKENS,
            temperature,
            messages: vec![Msg { role: "user", content: prompt }],
        };

        let resp = client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                WorkflowError::BackendUnavailable(format!("anthropic request failed: {e}"))
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            WorkflowError::BackendUnavailable(format!("anthropic read body failed: {e}"))
        })?;

        if !status.is_success() {
            return Err(WorkflowError::BackendUnavailable(format!(
                "anthropic returned {status}: {text}"
            )));
        }

        // A 2xx body we cannot read text out of counts as an empty response.
        let parsed: MsgResponse =
            serde_json::from_str(&text).map_err(|_| WorkflowError::EmptyResponse)?;
        let content = parsed
            .content
            .into_iter()
            .filter(|b| b.r#type == "text" || !b.text.is_empty())
            .map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");

        if content.trim().is_empty() {
            return Err(WorkflowError::EmptyResponse);
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_to_their_model_and_temperature() {
        let backend = AnthropicBackend::new("sk-test".into(), &Config::default());
        let (planning_model, planning_temp) = backend.params(ModelRole::Planning);
        assert_eq!(planning_model, Config::default().anthropic_planning_model);
        assert!((planning_temp - PLANNING_TEMPERATURE).abs() < f32::EPSILON);

        let (impl_model, impl_temp) = backend.params(ModelRole::Implementation);
        assert_eq!(impl_model, Config::default().anthropic_implementation_model);
        assert!((impl_temp - IMPLEMENTATION_TEMPERATURE).abs() < f32::EPSILON);
    }
}
