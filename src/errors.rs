use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("unknown step: {0}")] UnknownStage(String),
    #[error("missing prerequisite: {0}")] MissingPrerequisite(&'static str),
    #[error("authentication: {0}")] Authentication(String),
    #[error("backend unavailable: {0}")] BackendUnavailable(String),
    #[error("model returned no usable text")] EmptyResponse,
}
