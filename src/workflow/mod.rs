use crate::config::Config;
use crate::errors::WorkflowError;
use crate::prompt;
use crate::provider::{self, Backend, DynBackend};
use crate::stage::Stage;
use crate::wire::{
    Artifacts, ChainFailure, ChainOutcome, StageOutput, WorkflowRequest, WorkflowResult,
};

/// Coordinates stage resolution, prompt composition, and the backend call.
/// Holds no session state; every invocation carries everything it needs.
pub struct Orchestrator {
    backend: DynBackend,
    cfg: Config,
}

impl Orchestrator {
    /// `backend` is the default selected from process configuration; `cfg`
    /// stays around so a request-scoped credential can re-select per call.
    pub fn new(backend: DynBackend, cfg: Config) -> Self {
        Self { backend, cfg }
    }

    /// Select the default backend from `cfg` and build the orchestrator.
    pub fn from_config(cfg: Config) -> Result<Self, WorkflowError> {
        let backend = provider::select_backend(None, &cfg)?;
        Ok(Self { backend, cfg })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Execute the stage named by the request. A usable `api_key` on the
    /// request overrides the configured credentials for this call only.
    pub async fn run(&self, req: &WorkflowRequest) -> Result<StageOutput, WorkflowError> {
        let stage = Stage::parse(&req.step)?;
        let override_backend = self.override_backend(req)?;
        let backend = override_backend.as_deref().unwrap_or(self.backend.as_ref());
        self.generate(backend, stage, &req.app_idea, &req.feedback, &req.artifacts)
            .await
    }

    /// Same as `run`, folded into the wire envelope the caller relays.
    pub async fn execute(&self, req: &WorkflowRequest) -> WorkflowResult {
        WorkflowResult::from_outcome(&req.step, self.run(req).await)
    }

    /// Run one stage against the default backend.
    pub async fn run_stage(
        &self,
        stage: Stage,
        app_idea: &str,
        feedback: &str,
        artifacts: &Artifacts,
    ) -> Result<StageOutput, WorkflowError> {
        self.generate(self.backend.as_ref(), stage, app_idea, feedback, artifacts)
            .await
    }

    /// Run all four stages in order, feeding each output forward under its
    /// own artifact name. Stops at the first failure; outputs already
    /// produced are returned either way. Feedback belongs to single-stage
    /// refinement and is not applied here.
    pub async fn run_chain(&self, req: &WorkflowRequest) -> ChainOutcome {
        let override_backend = match self.override_backend(req) {
            Ok(b) => b,
            Err(error) => {
                return ChainOutcome {
                    completed: Vec::new(),
                    failure: Some(ChainFailure {
                        stage: Stage::ProjectRequest,
                        error,
                    }),
                }
            }
        };
        let backend = override_backend.as_deref().unwrap_or(self.backend.as_ref());

        let mut artifacts = req.artifacts.clone();
        let mut completed = Vec::new();
        for stage in Stage::ALL {
            match self
                .generate(backend, stage, &req.app_idea, "", &artifacts)
                .await
            {
                Ok(out) => {
                    if stage.next().is_some() {
                        artifacts.set(stage.name(), &out.text);
                    }
                    completed.push(out);
                }
                Err(error) => {
                    return ChainOutcome {
                        completed,
                        failure: Some(ChainFailure { stage, error }),
                    }
                }
            }
        }
        ChainOutcome {
            completed,
            failure: None,
        }
    }

    async fn generate(
        &self,
        backend: &(dyn Backend + Send + Sync),
        stage: Stage,
        app_idea: &str,
        feedback: &str,
        artifacts: &Artifacts,
    ) -> Result<StageOutput, WorkflowError> {
        let prompt = prompt::compose(stage.definition(), app_idea, feedback, artifacts)?;
        let text = backend.generate(&prompt, stage.role()).await?;
        Ok(StageOutput { stage, text })
    }

    /// A usable request-scoped key always re-selects (it is treated as an
    /// Anthropic key); blank or absent keys leave the default in place.
    fn override_backend(&self, req: &WorkflowRequest) -> Result<Option<DynBackend>, WorkflowError> {
        match req.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => provider::select_backend(Some(key), &self.cfg).map(Some),
            None => Ok(None),
        }
    }
}
