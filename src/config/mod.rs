use fs_err as fs;
use serde::{Deserialize, Serialize};

pub const ANTHROPIC_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Credentials come from the environment or the caller, never from the
    /// config file, and never serialize back out.
    #[serde(skip)]
    pub anthropic_api_key: Option<String>,
    #[serde(skip)]
    pub openai_api_key: Option<String>,
    pub anthropic_api_base: String,
    pub openai_api_base: String,
    pub anthropic_planning_model: String,
    pub anthropic_implementation_model: String,
    pub openai_planning_model: String,
    pub openai_implementation_model: String,
    pub timeout_secs: u64,
    pub out_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            openai_api_key: None,
            anthropic_api_base: "https://api.anthropic.com".into(),
            openai_api_base: "https://api.openai.com".into(),
            anthropic_planning_model: "claude-sonnet-4-5".into(),
            anthropic_implementation_model: "claude-opus-4-1".into(),
            openai_planning_model: "gpt-4.1-mini".into(),
            openai_implementation_model: "gpt-4.1".into(),
            timeout_secs: 2400,
            out_dir: ".ideaforge".into(),
        }
    }
}

impl Config {
    /// Defaults, overridden by an optional TOML file, then credentials from
    /// the process environment.
    pub fn load(path: Option<&str>) -> anyhow::Result<Config> {
        let mut cfg = match path {
            Some(p) => Config::from_toml_str(&fs::read_to_string(p)?)?,
            None => Config::default(),
        };
        cfg.merge_env();
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Config> {
        Ok(toml::from_str(raw)?)
    }

    pub fn merge_env(&mut self) {
        if self.anthropic_api_key.is_none() {
            self.anthropic_api_key = env_key(ANTHROPIC_KEY_ENV);
        }
        if self.openai_api_key.is_none() {
            self.openai_api_key = env_key(OPENAI_KEY_ENV);
        }
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
