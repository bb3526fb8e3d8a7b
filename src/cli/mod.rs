use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "ideaforge",
    version,
    about = "Staged LLM workflow: app idea -> project request -> tech spec -> implementation plan -> code"
)]
pub struct Args {
    /// App idea to develop; prompted for interactively when omitted.
    #[arg(long)]
    pub idea: Option<String>,

    /// Technology stack and constraints for the project.
    #[arg(long)]
    pub project_rules: Option<String>,

    /// Starter template the generated project builds on.
    #[arg(long)]
    pub starter_template: Option<String>,

    /// Run all four stages back to back without feedback pauses.
    #[arg(long, default_value_t = false)]
    pub auto: bool,

    /// Anthropic API key override; otherwise ANTHROPIC_API_KEY or
    /// OPENAI_API_KEY decides the backend.
    #[arg(long)]
    pub api_key: Option<String>,

    /// First implementation-plan step to generate code for.
    #[arg(long, default_value_t = 1)]
    pub code_step: u32,

    #[arg(long, default_value_t = 2400)]
    pub timeout_secs: u64,

    /// Save prompts and artifacts under the run directory.
    #[arg(long, default_value_t = true)]
    pub save_artifacts: bool,

    /// Print full artifacts instead of truncated previews.
    #[arg(long, default_value_t = false)]
    pub full: bool,

    #[arg(long)]
    pub config: Option<String>,
}
