use chrono::Utc;
use fs_err as fs;
use serde_json::json;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::wire::StageOutput;

/// On-disk transcript of one CLI run. Lives entirely in the CLI layer; the
/// orchestrator itself never touches the filesystem.
pub struct RunLog {
    dir: PathBuf,
    enabled: bool,
}

pub struct SavedStage {
    pub prompt: PathBuf,
    pub artifact: PathBuf,
}

impl RunLog {
    pub fn new(out_dir: &str, enabled: bool) -> Self {
        let dir = Path::new(out_dir)
            .join("runs")
            .join(Uuid::new_v4().to_string());
        Self { dir, enabled }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_manifest(&self, app_idea: &str, backend: &str) -> anyhow::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        fs::create_dir_all(&self.dir)?;
        let manifest = json!({
            "app_idea": app_idea,
            "backend": backend,
            "started_at": Utc::now(),
        });
        fs::write(
            self.dir.join("manifest.json"),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        Ok(())
    }

    /// Save one stage iteration's prompt and artifact, e.g.
    /// `project_request.02.prompt.md` / `project_request.02.artifact.md`.
    pub fn save_stage(
        &self,
        iteration: u32,
        prompt: &str,
        out: &StageOutput,
    ) -> anyhow::Result<Option<SavedStage>> {
        if !self.enabled {
            return Ok(None);
        }
        fs::create_dir_all(&self.dir)?;
        let base = format!("{}.{:02}", out.stage.name(), iteration);
        let prompt_path = self.dir.join(format!("{base}.prompt.md"));
        let artifact_path = self.dir.join(format!("{base}.artifact.md"));
        fs::write(&prompt_path, prompt)?;
        fs::write(&artifact_path, &out.text)?;
        Ok(Some(SavedStage {
            prompt: prompt_path,
            artifact: artifact_path,
        }))
    }
}
