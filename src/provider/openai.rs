use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Backend, ModelRole, IMPLEMENTATION_TEMPERATURE, PLANNING_TEMPERATURE};
use crate::config::Config;
use crate::errors::WorkflowError;

pub struct OpenAiBackend {
    api_key: String,
    api_base: String,
    planning_model: String,
    implementation_model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<Msg<'a>>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, cfg: &Config) -> Self {
        Self {
            api_key,
            api_base: cfg.openai_api_base.clone(),
            planning_model: cfg.openai_planning_model.clone(),
            implementation_model: cfg.openai_implementation_model.clone(),
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
impl Backend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, prompt: &str, role: ModelRole) -> Result<String, WorkflowError> {
        let url = format!("{}/v1/chat/completions", self.api_base.trim_end_matches('/'));
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| WorkflowError::BackendUnavailable(format!("openai client: {e}")))?;

        let (model, temperature) = self.params(role);
        let body = ChatRequest {
            model,
            temperature,
            messages: vec![Msg { role: "user", content: prompt }],
        };

        let resp = client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                WorkflowError::BackendUnavailable(format!("openai request failed: {e}"))
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            WorkflowError::BackendUnavailable(format!("openai read body failed: {e}"))
        })?;

        if !status.is_success() {
            return Err(WorkflowError::BackendUnavailable(format!(
                "openai returned {status}: {text}"
            )));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|_| WorkflowError::EmptyResponse)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

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
        let backend = OpenAiBackend::new("sk-test".into(), &Config::default());
        let (planning_model, planning_temp) = backend.params(ModelRole::Planning);
        assert_eq!(planning_model, Config::default().openai_planning_model);
        assert!((planning_temp - PLANNING_TEMPERATURE).abs() < f32::EPSILON);

        let (impl_model, impl_temp) = backend.params(ModelRole::Implementation);
        assert_eq!(impl_model, Config::default().openai_implementation_model);
        assert!((impl_temp - IMPLEMENTATION_TEMPERATURE).abs() < f32::EPSILON);
    }
}
