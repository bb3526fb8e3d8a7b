use clap::Parser;

use ideaforge::cli::Args;
use ideaforge::config::Config;
use ideaforge::log::RunLog;
use ideaforge::prompt;
use ideaforge::provider;
use ideaforge::stage::Stage;
use ideaforge::ux;
use ideaforge::wire::{Artifacts, WorkflowRequest};
use ideaforge::workflow::Orchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut cfg = Config::load(args.config.as_deref())?;
    cfg.timeout_secs = args.timeout_secs;

    let backend = provider::select_backend(args.api_key.as_deref(), &cfg)?;
    let orchestrator = Orchestrator::new(backend, cfg.clone());
    println!("Using {} backend", orchestrator.backend_name());

    let idea = match args.idea.clone() {
        Some(idea) => idea,
        None => ux::prompt_line("Enter your app idea"),
    };
    if idea.trim().is_empty() {
        anyhow::bail!("an app idea is required");
    }

    let log = RunLog::new(&cfg.out_dir, args.save_artifacts);
    log.write_manifest(&idea, orchestrator.backend_name())?;
    if args.save_artifacts {
        println!("Saving run artifacts under {}", log.dir().display());
    }

    let mut artifacts = Artifacts::default();
    artifacts.code_step_number = args.code_step;

    if args.auto {
        run_auto(&args, &orchestrator, &log, &idea, artifacts).await
    } else {
        run_interactive(&args, &orchestrator, &log, &idea, artifacts).await
    }
}

/// All four stages back to back, no feedback pauses.
async fn run_auto(
    args: &Args,
    orchestrator: &Orchestrator,
    log: &RunLog,
    idea: &str,
    mut artifacts: Artifacts,
) -> anyhow::Result<()> {
    artifacts.project_rules = Some(required_detail(
        args.project_rules.clone(),
        "Enter project rules (technologies, constraints, etc.)",
    )?);
    artifacts.starter_template = Some(required_detail(
        args.starter_template.clone(),
        "Enter starter template information",
    )?);

    let mut req = WorkflowRequest::new(idea, Stage::ProjectRequest.name());
    req.artifacts = artifacts;

    let pb = ux::spinner("Running the full workflow...");
    let outcome = orchestrator.run_chain(&req).await;
    pb.finish_and_clear();

    // Recompose each stage's prompt for the transcript, then report.
    let mut acc = req.artifacts.clone();
    for out in &outcome.completed {
        let prompt = prompt::compose(out.stage.definition(), &req.app_idea, "", &acc)?;
        log.save_stage(1, &prompt, out)?;
        if out.stage.next().is_some() {
            acc.set(out.stage.name(), &out.text);
        }
        ux::banner(out.stage);
        ux::show_artifact(&out.text, args.full);
    }

    if let Some(failure) = outcome.failure {
        anyhow::bail!("{} stage failed: {}", failure.stage.name(), failure.error);
    }
    println!("Workflow complete.");
    Ok(())
}

/// The original console flow: generate, collect feedback, regenerate, move
/// on once the user types 'done'.
async fn run_interactive(
    args: &Args,
    orchestrator: &Orchestrator,
    log: &RunLog,
    idea: &str,
    mut artifacts: Artifacts,
) -> anyhow::Result<()> {
    let request = refine_stage(args, orchestrator, log, Stage::ProjectRequest, idea, &artifacts).await?;
    artifacts.set("project_request", &request);

    // Project details are supplied only after the request is finalized.
    artifacts.project_rules = Some(required_detail(
        args.project_rules.clone(),
        "Enter project rules (technologies, constraints, etc.)",
    )?);
    artifacts.starter_template = Some(required_detail(
        args.starter_template.clone(),
        "Enter starter template information",
    )?);

    let spec = refine_stage(
        args,
        orchestrator,
        log,
        Stage::TechnicalSpecification,
        idea,
        &artifacts,
    )
    .await?;
    artifacts.set("technical_specification", &spec);

    let plan = refine_stage(
        args,
        orchestrator,
        log,
        Stage::ImplementationPlan,
        idea,
        &artifacts,
    )
    .await?;
    artifacts.set("implementation_plan", &plan);

    // Per-step code generation until the user stops.
    loop {
        let code = refine_stage(args, orchestrator, log, Stage::Code, idea, &artifacts).await?;
        let step = artifacts.code_step_number;
        artifacts.existing_code.insert(step, code);
        if !ux::confirm(&format!("Generate code for step {}?", step + 1)) {
            break;
        }
        artifacts.code_step_number = step + 1;
    }

    println!("Workflow complete.");
    Ok(())
}

/// Generate one stage, looping on user feedback until accepted. Returns the
/// accepted artifact text.
async fn refine_stage(
    args: &Args,
    orchestrator: &Orchestrator,
    log: &RunLog,
    stage: Stage,
    idea: &str,
    artifacts: &Artifacts,
) -> anyhow::Result<String> {
    ux::banner(stage);
    let mut feedback = String::new();
    let mut iteration = 1u32;
    loop {
        let pb = ux::spinner(&format!("Generating {}...", stage.title().to_lowercase()));
        let result = orchestrator.run_stage(stage, idea, &feedback, artifacts).await;
        pb.finish_and_clear();
        let out = result?;

        let prompt = prompt::compose(stage.definition(), idea, &feedback, artifacts)?;
        log.save_stage(iteration, &prompt, &out)?;
        ux::show_artifact(&out.text, args.full);

        match ux::read_feedback(&stage.title().to_lowercase()) {
            Some(fb) => {
                feedback = fb;
                iteration += 1;
            }
            None => return Ok(out.text),
        }
    }
}

fn required_detail(arg: Option<String>, prompt: &str) -> anyhow::Result<String> {
    let value = match arg {
        Some(v) => v,
        None => ux::prompt_line(prompt),
    };
    if value.trim().is_empty() {
        anyhow::bail!("a value is required");
    }
    Ok(value)
}
