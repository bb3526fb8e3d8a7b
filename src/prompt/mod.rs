use crate::errors::WorkflowError;
use crate::stage::StageDefinition;
use crate::wire::Artifacts;

/// Everything a stage template may draw on. Artifacts are pre-validated by
/// `compose` against the stage's requirements.
pub struct PromptInputs<'a> {
    pub app_idea: &'a str,
    pub artifacts: &'a Artifacts,
}

const FEEDBACK_HEADER: &str = "User feedback on the previous iteration:";

/// Build the exact prompt for a stage. Fails with `MissingPrerequisite` on
/// the first required artifact that is absent or blank; never touches the
/// network or the filesystem.
pub fn compose(
    def: &StageDefinition,
    app_idea: &str,
    feedback: &str,
    artifacts: &Artifacts,
) -> Result<String, WorkflowError> {
    for &field in def.requires {
        match artifacts.get(field) {
            Some(v) if !v.trim().is_empty() => {}
            _ => return Err(WorkflowError::MissingPrerequisite(field)),
        }
    }

    let inputs = PromptInputs { app_idea, artifacts };
    let mut text = (def.render)(&inputs);
    if !feedback.trim().is_empty() {
        text.push_str(&feedback_section(feedback));
    }
    Ok(text)
}

fn feedback_section(feedback: &str) -> String {
    format!(
        "\n\n{header}\n\n{feedback}\n\nRevise your previous output for this stage according to the feedback and return the complete, updated result.\n",
        header = FEEDBACK_HEADER,
        feedback = feedback
    )
}

fn request_format() -> &'static str {
    r#"```request
# Project Name
## Project Description
[Description]

## Target Audience
[Target users]

## Desired Features
### [Feature Category]
- [ ] [Requirement]
    - [ ] [Sub-requirement]

## Design Requests
- [ ] [Design requirement]
    - [ ] [Design detail]

## Other Notes
- [Additional considerations]
```"#
}

pub fn project_request(ins: &PromptInputs<'_>) -> String {
    format!(
        r#"## 1. Project Request Generator

I have a web app idea I'd like to develop. Here's my initial concept:

{idea}

I'm looking to collaborate with you to turn this into a detailed project request. Let's iterate together until we have a complete request that I find to be complete.

Please return the current state of the request in this format:

{request_format}

Please:
1. Ask me questions about any areas that need more detail
2. Suggest features or considerations I might have missed
3. Help me organize requirements logically
4. Show me the current state of the spec
5. Flag any potential technical challenges or important decisions
"#,
        idea = ins.app_idea,
        request_format = request_format()
    )
}

fn spec_outline() -> &'static str {
    r#"```markdown
# {Project Name} Technical Specification

## 1. System Overview
- Core purpose and value proposition
- Key workflows
- System architecture

## 2. Project Structure
- Detailed breakdown of project structure & organization

## 3. Feature Specification
For each feature:
### 3.1 Feature Name
- User story and requirements
- Detailed implementation steps
- Error handling and edge cases

## 4. Database Schema
### 4.1 Tables
For each table:
- Complete table schema (field names, types, constraints)
- Relationships and indexes

## 5. Server Actions
### 5.1 Database Actions
For each action:
- Detailed description of the action
- Input parameters and return values
- SQL queries or ORM operations

### 5.2 Other Actions
- External API integrations (endpoints, authentication, data formats)
- File handling procedures
- Data processing algorithms

## 6. Design System
### 6.1 Visual Style
- Color palette (with hex codes)
- Typography (font families, sizes, weights)
- Component styling patterns
- Spacing and layout principles

### 6.2 Core Components
- Layout structure (with examples)
- Navigation patterns
- Shared components (with props and usage examples)
- Interactive states (hover, active, disabled)

## 7. Component Architecture
### 7.1 Server Components
- Data fetching strategy
- Suspense boundaries
- Error handling
- Props interface (with types)

### 7.2 Client Components
- State management approach
- Event handlers
- UI interactions
- Props interface (with types)

## 8. Authentication & Authorization
- Implementation details
- Protected routes configuration
- Session management strategy

## 9. Data Flow
- Server/client data passing mechanisms
- State management architecture

## 10. Payments
- Payment flow diagram
- Webhook handling process
- Product/price configuration details

## 11. Analytics
- Analytics strategy
- Event tracking implementation
- Custom property definitions

## 12. Testing
- Unit tests (example test cases)
- End-to-end tests (key user flows to test)
```"#
}

pub fn technical_specification(ins: &PromptInputs<'_>) -> String {
    let a = ins.artifacts;
    format!(
        r#"## 2. Technical Specification Generator

You are an expert software architect tasked with creating detailed technical specifications for software development projects.

Your specifications will be used as direct input for planning & code generation AI systems, so they must be precise, structured, and comprehensive.

The original app idea:

<app_idea>
{idea}
</app_idea>

First, carefully review the project request:

<project_request>
{project_request}
</project_request>

Next, carefully review the project rules:

<project_rules>
{project_rules}
</project_rules>

Finally, carefully review the starter template:

<starter_template>
{starter_template}
</starter_template>

Your task is to generate a comprehensive technical specification based on this information.

Begin with your specification planning, considering:
1. Core system architecture and key workflows
2. Project structure and organization
3. Detailed feature specifications
4. Database schema design
5. Server actions and integrations
6. Design system and component architecture
7. Authentication and authorization implementation
8. Data flow and state management
9. Payment implementation
10. Analytics implementation
11. Testing strategy

Then generate the technical specification using this markdown structure:

{outline}

Ensure that your specification is extremely detailed, providing specific implementation guidance wherever possible. Include concrete examples for complex features and clearly define interfaces between components.
"#,
        idea = ins.app_idea,
        project_request = a.project_request.as_deref().unwrap_or_default(),
        project_rules = a.project_rules.as_deref().unwrap_or_default(),
        starter_template = a.starter_template.as_deref().unwrap_or_default(),
        outline = spec_outline()
    )
}

fn plan_format() -> &'static str {
    r#"```md
# Implementation Plan

## [Section Name]
- [ ] Step 1: [Brief title]
  - **Task**: [Detailed explanation of what needs to be implemented]
  - **Files**: [Maximum of 20 files, ideally less]
    - `path/to/file1.ts`: [Description of changes]
  - **Step Dependencies**: [Step Dependencies]
  - **User Instructions**: [Instructions for User]
```"#
}

pub fn implementation_plan(ins: &PromptInputs<'_>) -> String {
    let a = ins.artifacts;
    format!(
        r#"## 3. Implementation Plan Generator

You are an AI task planner responsible for breaking down a complex web application development project into manageable steps.

Your goal is to create a detailed, step-by-step plan that will guide the code generation process for building a fully functional web application based on a provided technical specification.

The original app idea:

<app_idea>
{idea}
</app_idea>

First, carefully review the following inputs:

<project_request>
{project_request}
</project_request>

<project_rules>
{project_rules}
</project_rules>

<technical_specification>
{technical_specification}
</technical_specification>

<starter_template>
{starter_template}
</starter_template>

After reviewing these inputs, your task is to create a comprehensive, detailed plan for implementing the web application.

Begin with your brainstorming, then create a detailed implementation plan in the format:

{plan_format}

Ensure each step is atomic, builds logically on previous steps, and can be implemented in a single iteration.
"#,
        idea = ins.app_idea,
        project_request = a.project_request.as_deref().unwrap_or_default(),
        project_rules = a.project_rules.as_deref().unwrap_or_default(),
        technical_specification = a.technical_specification.as_deref().unwrap_or_default(),
        starter_template = a.starter_template.as_deref().unwrap_or_default(),
        plan_format = plan_format()
    )
}

fn code_changes_format() -> &'static str {
    r#"```xml
<code_changes>
  <changed_files>
    <file>
      <file_operation>CREATE or UPDATE or DELETE</file_operation>
      <file_path>path/to/file</file_path>
      <file_code><![CDATA[
/**
 * Complete file contents with extensive documentation
 */
// Complete implementation with inline comments & documentation...
]]></file_code>
    </file>
    <!-- Additional files as needed -->
  </changed_files>
</code_changes>
```"#
}

/// Code generated for steps below the target, oldest first. The literal
/// fallback matches what downstream consumers expect on a fresh project.
fn combined_existing_code(artifacts: &Artifacts) -> String {
    let target = artifacts.code_step_number;
    let parts: Vec<&str> = artifacts
        .existing_code
        .iter()
        .filter(|(step, _)| **step < target)
        .map(|(_, code)| code.as_str())
        .collect();
    if parts.is_empty() {
        "// No existing code yet".to_string()
    } else {
        parts.join("\n\n")
    }
}

pub fn code(ins: &PromptInputs<'_>) -> String {
    let a = ins.artifacts;
    format!(
        r#"## 4. Code Generator

You are an AI code generator responsible for implementing a web application based on a provided technical specification and implementation plan.

Your task is to systematically implement each step of the plan, one at a time.

The original app idea:

<app_idea>
{idea}
</app_idea>

First, carefully review the following inputs:

<project_request>
{project_request}
</project_request>

<project_rules>
{project_rules}
</project_rules>

<technical_specification>
{technical_specification}
</technical_specification>

<implementation_plan>
{implementation_plan}
</implementation_plan>

<existing_code>
{existing_code}
</existing_code>

Your task is to:
1. Implement step #{step} from the implementation plan
2. Generate the necessary code for all files specified in that step
3. Return the generated code using the XML format

For EVERY file you modify or create, provide the COMPLETE file contents using this XML structure:

{code_changes_format}

Include comprehensive documentation:
- File-level purpose and scope
- Component/function-level documentation
- Inline comments for complex logic
- Type documentation for interfaces and types
- Notes about edge cases and error handling

After the code, include:
- "STEP {step} COMPLETE" with an explanation of what you did
- User instructions for any manual steps required
"#,
        idea = ins.app_idea,
        project_request = a.project_request.as_deref().unwrap_or_default(),
        project_rules = a.project_rules.as_deref().unwrap_or_default(),
        technical_specification = a.technical_specification.as_deref().unwrap_or_default(),
        implementation_plan = a.implementation_plan.as_deref().unwrap_or_default(),
        existing_code = combined_existing_code(a),
        step = a.code_step_number,
        code_changes_format = code_changes_format()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;

    fn full_artifacts() -> Artifacts {
        Artifacts {
            project_request: Some("the project request".into()),
            project_rules: Some("the project rules".into()),
            starter_template: Some("the starter template".into()),
            technical_specification: Some("the technical specification".into()),
            implementation_plan: Some("the implementation plan".into()),
            ..Artifacts::default()
        }
    }

    #[test]
    fn every_stage_composes_with_full_artifacts_and_no_feedback() {
        let artifacts = full_artifacts();
        for stage in Stage::ALL {
            let prompt = compose(stage.definition(), "recipe sharing app", "", &artifacts)
                .unwrap_or_else(|e| panic!("{} failed: {e}", stage.name()));
            assert!(prompt.contains("recipe sharing app"), "{} lost the idea", stage.name());
            assert!(!prompt.contains(FEEDBACK_HEADER), "{} grew a feedback section", stage.name());
        }
    }

    #[test]
    fn first_missing_requirement_is_named() {
        let empty = Artifacts::default();
        match compose(
            Stage::TechnicalSpecification.definition(),
            "recipe sharing app",
            "",
            &empty,
        ) {
            Err(WorkflowError::MissingPrerequisite(field)) => assert_eq!(field, "project_request"),
            other => panic!("expected MissingPrerequisite, got {other:?}"),
        }

        let mut partial = Artifacts::default();
        partial.project_request = Some("the project request".into());
        match compose(
            Stage::TechnicalSpecification.definition(),
            "recipe sharing app",
            "",
            &partial,
        ) {
            Err(WorkflowError::MissingPrerequisite(field)) => assert_eq!(field, "project_rules"),
            other => panic!("expected MissingPrerequisite, got {other:?}"),
        }

        let mut no_plan = full_artifacts();
        no_plan.implementation_plan = None;
        match compose(Stage::Code.definition(), "recipe sharing app", "", &no_plan) {
            Err(WorkflowError::MissingPrerequisite(field)) => {
                assert_eq!(field, "implementation_plan")
            }
            other => panic!("expected MissingPrerequisite, got {other:?}"),
        }
    }

    #[test]
    fn blank_artifacts_count_as_missing() {
        let mut artifacts = full_artifacts();
        artifacts.project_rules = Some("   \n".into());
        match compose(
            Stage::TechnicalSpecification.definition(),
            "recipe sharing app",
            "",
            &artifacts,
        ) {
            Err(WorkflowError::MissingPrerequisite(field)) => assert_eq!(field, "project_rules"),
            other => panic!("expected MissingPrerequisite, got {other:?}"),
        }
    }

    #[test]
    fn composition_is_pure() {
        let artifacts = full_artifacts();
        for stage in Stage::ALL {
            let a = compose(stage.definition(), "recipe sharing app", "tighten it", &artifacts)
                .unwrap();
            let b = compose(stage.definition(), "recipe sharing app", "tighten it", &artifacts)
                .unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn feedback_appends_a_revision_section() {
        let prompt = compose(
            Stage::ProjectRequest.definition(),
            "recipe sharing app",
            "add offline support",
            &Artifacts::default(),
        )
        .unwrap();
        assert!(prompt.contains(FEEDBACK_HEADER));
        assert!(prompt.contains("add offline support"));

        let bare = compose(
            Stage::ProjectRequest.definition(),
            "recipe sharing app",
            "",
            &Artifacts::default(),
        )
        .unwrap();
        assert!(!bare.contains(FEEDBACK_HEADER));
        assert_ne!(prompt, bare);
    }

    #[test]
    fn unrelated_artifacts_do_not_leak_into_a_stage_prompt() {
        let with_everything = compose(
            Stage::ProjectRequest.definition(),
            "recipe sharing app",
            "",
            &full_artifacts(),
        )
        .unwrap();
        let with_nothing = compose(
            Stage::ProjectRequest.definition(),
            "recipe sharing app",
            "",
            &Artifacts::default(),
        )
        .unwrap();
        assert_eq!(with_everything, with_nothing);
    }

    #[test]
    fn code_stage_folds_only_prior_step_code() {
        let mut artifacts = full_artifacts();
        artifacts.code_step_number = 3;
        artifacts.existing_code.insert(1, "fn one() {}".into());
        artifacts.existing_code.insert(2, "fn two() {}".into());
        artifacts.existing_code.insert(3, "fn three() {}".into());

        let prompt = compose(Stage::Code.definition(), "recipe sharing app", "", &artifacts)
            .unwrap();
        assert!(prompt.contains("Implement step #3"));
        assert!(prompt.contains("fn one() {}"));
        assert!(prompt.contains("fn two() {}"));
        assert!(!prompt.contains("fn three() {}"));
        let one = prompt.find("fn one() {}").unwrap();
        let two = prompt.find("fn two() {}").unwrap();
        assert!(one < two);
    }

    #[test]
    fn code_stage_without_prior_code_uses_the_placeholder() {
        let artifacts = full_artifacts();
        let prompt = compose(Stage::Code.definition(), "recipe sharing app", "", &artifacts)
            .unwrap();
        assert!(prompt.contains("// No existing code yet"));
    }
}
