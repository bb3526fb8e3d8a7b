use serde::{Deserialize, Serialize};

use crate::errors::WorkflowError;
use crate::prompt::{self, PromptInputs};
use crate::provider::ModelRole;

/// The four workflow stages, in their fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ProjectRequest,
    TechnicalSpecification,
    ImplementationPlan,
    Code,
}

/// One stage's wire name, required prior artifacts (checked in order), and
/// prompt template.
pub struct StageDefinition {
    pub stage: Stage,
    pub name: &'static str,
    pub requires: &'static [&'static str],
    pub render: fn(&PromptInputs<'_>) -> String,
}

pub static DEFINITIONS: [StageDefinition; 4] = [
    StageDefinition {
        stage: Stage::ProjectRequest,
        name: "project_request",
        requires: &[],
        render: prompt::project_request,
    },
    StageDefinition {
        stage: Stage::TechnicalSpecification,
        name: "technical_specification",
        requires: &["project_request", "project_rules", "starter_template"],
        render: prompt::technical_specification,
    },
    StageDefinition {
        stage: Stage::ImplementationPlan,
        name: "implementation_plan",
        requires: &[
            "project_request",
            "project_rules",
            "starter_template",
            "technical_specification",
        ],
        render: prompt::implementation_plan,
    },
    StageDefinition {
        stage: Stage::Code,
        name: "code",
        requires: &[
            "project_request",
            "project_rules",
            "starter_template",
            "technical_specification",
            "implementation_plan",
        ],
        render: prompt::code,
    },
];

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::ProjectRequest,
        Stage::TechnicalSpecification,
        Stage::ImplementationPlan,
        Stage::Code,
    ];

    /// Resolve a wire name to a stage. Anything but the four names is an
    /// `UnknownStage` error.
    pub fn parse(name: &str) -> Result<Stage, WorkflowError> {
        match name {
            "project_request" => Ok(Stage::ProjectRequest),
            "technical_specification" => Ok(Stage::TechnicalSpecification),
            "implementation_plan" => Ok(Stage::ImplementationPlan),
            "code" => Ok(Stage::Code),
            other => Err(WorkflowError::UnknownStage(other.to_string())),
        }
    }

    pub fn definition(self) -> &'static StageDefinition {
        &DEFINITIONS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.definition().name
    }

    /// Human-readable title for console banners.
    pub fn title(self) -> &'static str {
        match self {
            Stage::ProjectRequest => "Project Request",
            Stage::TechnicalSpecification => "Technical Specification",
            Stage::ImplementationPlan => "Implementation Plan",
            Stage::Code => "Code",
        }
    }

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::ProjectRequest => Some(Stage::TechnicalSpecification),
            Stage::TechnicalSpecification => Some(Stage::ImplementationPlan),
            Stage::ImplementationPlan => Some(Stage::Code),
            Stage::Code => None,
        }
    }

    /// Planning stages run with the creative profile; code generation runs
    /// with the precise one.
    pub fn role(self) -> ModelRole {
        match self {
            Stage::Code => ModelRole::Implementation,
            _ => ModelRole::Planning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_the_four_stage_names() {
        assert_eq!(Stage::parse("project_request").unwrap(), Stage::ProjectRequest);
        assert_eq!(
            Stage::parse("technical_specification").unwrap(),
            Stage::TechnicalSpecification
        );
        assert_eq!(
            Stage::parse("implementation_plan").unwrap(),
            Stage::ImplementationPlan
        );
        assert_eq!(Stage::parse("code").unwrap(), Stage::Code);
    }

    #[test]
    fn parse_rejects_anything_else() {
        for bogus in ["bogus_stage", "", "Project_Request", "optimization_plan"] {
            match Stage::parse(bogus) {
                Err(WorkflowError::UnknownStage(s)) => assert_eq!(s, bogus),
                other => panic!("expected UnknownStage, got {other:?}"),
            }
        }
    }

    #[test]
    fn stages_form_a_strict_linear_order() {
        assert_eq!(Stage::ProjectRequest.next(), Some(Stage::TechnicalSpecification));
        assert_eq!(
            Stage::TechnicalSpecification.next(),
            Some(Stage::ImplementationPlan)
        );
        assert_eq!(Stage::ImplementationPlan.next(), Some(Stage::Code));
        assert_eq!(Stage::Code.next(), None);
    }

    #[test]
    fn definitions_match_stage_order() {
        for stage in Stage::ALL {
            assert_eq!(stage.definition().stage, stage);
        }
    }

    #[test]
    fn required_artifacts_accumulate_down_the_chain() {
        assert!(Stage::ProjectRequest.definition().requires.is_empty());
        assert_eq!(
            Stage::TechnicalSpecification.definition().requires,
            &["project_request", "project_rules", "starter_template"]
        );
        assert_eq!(Stage::Code.definition().requires.len(), 5);
        assert!(Stage::Code
            .definition()
            .requires
            .contains(&"implementation_plan"));
    }

    #[test]
    fn only_the_code_stage_uses_the_implementation_role() {
        assert_eq!(Stage::Code.role(), ModelRole::Implementation);
        assert_eq!(Stage::ProjectRequest.role(), ModelRole::Planning);
        assert_eq!(Stage::TechnicalSpecification.role(), ModelRole::Planning);
        assert_eq!(Stage::ImplementationPlan.role(), ModelRole::Planning);
    }
}
