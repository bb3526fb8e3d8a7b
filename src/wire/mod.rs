use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::WorkflowError;
use crate::stage::Stage;

/// ========================================
/// Inbound/outbound boundary envelopes
/// ========================================

/// One self-contained workflow invocation. All accumulated session state is
/// carried by the caller; the core only reads these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub app_idea: String,
    /// One of the four stage names. Kept as a string so a bad value surfaces
    /// as `UnknownStage` from the orchestrator rather than a decode fault.
    pub step: String,
    #[serde(default)]
    pub feedback: String,
    /// Request-scoped Anthropic key. When present and non-blank, the
    /// orchestrator runs this call against Anthropic with this key instead
    /// of the configured credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(flatten)]
    pub artifacts: Artifacts,
}

impl WorkflowRequest {
    pub fn new(app_idea: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            app_idea: app_idea.into(),
            step: step.into(),
            feedback: String::new(),
            api_key: None,
            artifacts: Artifacts::default(),
        }
    }
}

fn default_step_number() -> u32 {
    1
}

/// JSON object keys are strings; parse them back into step numbers. Needed
/// because `flatten` buffers nested values and loses serde_json's native
/// integer-key handling.
fn step_keyed_map<'de, D>(deserializer: D) -> Result<BTreeMap<u32, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(k, v)| {
            k.parse::<u32>()
                .map(|step| (step, v))
                .map_err(|_| serde::de::Error::custom(format!("invalid step number: {k}")))
        })
        .collect()
}

/// Prior-stage outputs plus the user-supplied project details, keyed on the
/// wire by the same field names the stage definitions require.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_rules: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starter_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_specification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation_plan: Option<String>,
    /// Implementation-plan step the code stage should generate, 1-based.
    #[serde(default = "default_step_number")]
    pub code_step_number: u32,
    /// Code already generated for earlier steps, keyed by step number.
    #[serde(
        default,
        deserialize_with = "step_keyed_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub existing_code: BTreeMap<u32, String>,
}

impl Default for Artifacts {
    fn default() -> Self {
        Self {
            project_request: None,
            project_rules: None,
            starter_template: None,
            technical_specification: None,
            implementation_plan: None,
            code_step_number: default_step_number(),
            existing_code: BTreeMap::new(),
        }
    }
}

impl Artifacts {
    /// Look up a text artifact by its wire field name.
    pub fn get(&self, field: &str) -> Option<&str> {
        let slot = match field {
            "project_request" => &self.project_request,
            "project_rules" => &self.project_rules,
            "starter_template" => &self.starter_template,
            "technical_specification" => &self.technical_specification,
            "implementation_plan" => &self.implementation_plan,
            _ => return None,
        };
        slot.as_deref()
    }

    /// Store a text artifact under its wire field name. Unknown names are
    /// ignored (the final stage's output feeds no later stage).
    pub fn set(&mut self, field: &str, value: &str) {
        let slot = match field {
            "project_request" => &mut self.project_request,
            "project_rules" => &mut self.project_rules,
            "starter_template" => &mut self.starter_template,
            "technical_specification" => &mut self.technical_specification,
            "implementation_plan" => &mut self.implementation_plan,
            _ => return,
        };
        *slot = Some(value.to_string());
    }
}

/// Successful output of a single stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageOutput {
    pub stage: Stage,
    pub text: String,
}

/// The envelope returned across the boundary: the stage echoed back, the
/// generated text on success, or a human-readable error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowResult {
    pub fn from_outcome(step: &str, outcome: Result<StageOutput, WorkflowError>) -> Self {
        match outcome {
            Ok(out) => Self {
                step: out.stage.name().to_string(),
                result: Some(out.text),
                success: true,
                error: None,
            },
            Err(err) => Self {
                step: step.to_string(),
                result: None,
                success: false,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Result of a composite run over all four stages. Outputs of completed
/// stages are kept even when a later stage fails.
#[derive(Debug)]
pub struct ChainOutcome {
    pub completed: Vec<StageOutput>,
    pub failure: Option<ChainFailure>,
}

#[derive(Debug)]
pub struct ChainFailure {
    pub stage: Stage,
    pub error: WorkflowError,
}

impl ChainOutcome {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// The last stage's output when the whole chain completed.
    pub fn final_output(&self) -> Option<&StageOutput> {
        if self.success() {
            self.completed.last()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_request_fills_defaults() {
        let req: WorkflowRequest =
            serde_json::from_str(r#"{"app_idea":"recipe sharing app","step":"project_request"}"#)
                .unwrap();
        assert_eq!(req.app_idea, "recipe sharing app");
        assert_eq!(req.step, "project_request");
        assert!(req.feedback.is_empty());
        assert!(req.api_key.is_none());
        assert_eq!(req.artifacts.code_step_number, 1);
        assert!(req.artifacts.existing_code.is_empty());
    }

    #[test]
    fn artifact_fields_flatten_into_the_request() {
        let req: WorkflowRequest = serde_json::from_str(
            r#"{
                "app_idea": "recipe sharing app",
                "step": "code",
                "project_request": "the request",
                "code_step_number": 3,
                "existing_code": {"1": "fn a() {}", "2": "fn b() {}"}
            }"#,
        )
        .unwrap();
        assert_eq!(req.artifacts.project_request.as_deref(), Some("the request"));
        assert_eq!(req.artifacts.code_step_number, 3);
        assert_eq!(req.artifacts.existing_code.get(&2).map(String::as_str), Some("fn b() {}"));
    }

    #[test]
    fn get_and_set_go_through_wire_field_names() {
        let mut artifacts = Artifacts::default();
        assert_eq!(artifacts.get("project_request"), None);
        artifacts.set("project_request", "text");
        assert_eq!(artifacts.get("project_request"), Some("text"));
        // Unknown names resolve to nothing and store nothing.
        artifacts.set("code", "ignored");
        assert_eq!(artifacts.get("code"), None);
    }

    #[test]
    fn result_envelope_reports_success_and_failure() {
        let ok = WorkflowResult::from_outcome(
            "project_request",
            Ok(StageOutput {
                stage: Stage::ProjectRequest,
                text: "artifact".into(),
            }),
        );
        assert!(ok.success);
        assert_eq!(ok.step, "project_request");
        assert_eq!(ok.result.as_deref(), Some("artifact"));
        assert!(ok.error.is_none());

        let err = WorkflowResult::from_outcome(
            "bogus_stage",
            Err(WorkflowError::UnknownStage("bogus_stage".into())),
        );
        assert!(!err.success);
        assert_eq!(err.step, "bogus_stage");
        assert!(err.result.is_none());
        assert_eq!(err.error.as_deref(), Some("unknown step: bogus_stage"));
    }
}
