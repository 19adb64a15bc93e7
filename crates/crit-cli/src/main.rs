use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use crit_runner::config::CONFIG_TEMPLATE;
use crit_runner::{HarnessConfig, HarnessError, PlanSummary, RunSummary};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "critbench",
    version,
    about = "Benchmark harness for the critcol solver"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct HarnessArgs {
    /// YAML config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    solver: Option<PathBuf>,
    #[arg(long = "instances")]
    instances_dir: Option<PathBuf>,
    #[arg(long = "time-limit")]
    time_limit_secs: Option<u64>,
    #[arg(long)]
    concurrency: Option<usize>,
    #[arg(long)]
    output: Option<PathBuf>,
}

impl HarnessArgs {
    fn resolve(&self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };
        if let Some(solver) = &self.solver {
            config.solver = solver.clone();
        }
        if let Some(dir) = &self.instances_dir {
            config.instances_dir = dir.clone();
        }
        if let Some(t) = self.time_limit_secs {
            config.time_limit_secs = t;
        }
        if let Some(c) = self.concurrency {
            config.concurrency = c;
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        let source = self
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from("<command line>"));
        config.validate(&source)?;
        debug!(
            solver = %config.solver.display(),
            instances_dir = %config.instances_dir.display(),
            concurrency = config.concurrency,
            "resolved configuration"
        );
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run every instance in the instance directory.
    Sweep {
        #[command(flatten)]
        harness: HarnessArgs,
        #[arg(long)]
        repetitions: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Run a single instance many times.
    Profile {
        #[arg(long)]
        instance: String,
        #[command(flatten)]
        harness: HarnessArgs,
        #[arg(long)]
        repetitions: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Show the plan without starting the solver.
    Describe {
        /// Describe a profile of this instance instead of a sweep.
        #[arg(long)]
        instance: Option<String>,
        #[command(flatten)]
        harness: HarnessArgs,
        #[arg(long)]
        repetitions: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Write a commented config template.
    InitConfig {
        #[arg(long, default_value = "critbench.yaml")]
        path: PathBuf,
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json_mode = command_json_mode(&cli.command);
    match run_command(cli.command).await {
        Ok(Some(payload)) => emit_json(&payload),
        Ok(None) => {}
        Err(err) if json_mode => {
            emit_json(&error_payload(&err));
            std::process::exit(1);
        }
        Err(err) => return Err(err),
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_command(command: Commands) -> Result<Option<Value>> {
    match command {
        Commands::Sweep {
            harness,
            repetitions,
            json,
        } => {
            let mut config = harness.resolve()?;
            if let Some(r) = positive(repetitions)? {
                config.repetitions = r;
            }
            let summary = crit_runner::run_sweep(&config).await?;
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "sweep",
                    "run": run_summary_to_json(&summary),
                })));
            }
            print_run_summary(&summary);
        }
        Commands::Profile {
            instance,
            harness,
            repetitions,
            json,
        } => {
            let config = harness.resolve()?;
            let summary =
                crit_runner::run_profile(&config, &instance, positive(repetitions)?).await?;
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "profile",
                    "instance": instance,
                    "run": run_summary_to_json(&summary),
                })));
            }
            println!("instance: {}", instance);
            print_run_summary(&summary);
        }
        Commands::Describe {
            instance,
            harness,
            repetitions,
            json,
        } => {
            let mut config = harness.resolve()?;
            let plan = match &instance {
                Some(name) => {
                    crit_runner::describe_profile(&config, name, positive(repetitions)?)?
                }
                None => {
                    if let Some(r) = positive(repetitions)? {
                        config.repetitions = r;
                    }
                    crit_runner::describe_sweep(&config)?
                }
            };
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "describe",
                    "plan": plan_summary_to_json(&plan),
                })));
            }
            print_plan_summary(&plan);
        }
        Commands::InitConfig { path, force } => {
            if !force && path.exists() {
                return Err(anyhow::anyhow!(
                    "config already exists (use --force): {}",
                    path.display()
                ));
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, CONFIG_TEMPLATE)?;
            println!("wrote: {}", path.display());
            println!("next: critbench describe --config {}", path.display());
        }
    }
    Ok(None)
}

fn positive(repetitions: Option<usize>) -> Result<Option<usize>> {
    match repetitions {
        Some(0) => Err(anyhow::anyhow!("--repetitions must be at least 1")),
        other => Ok(other),
    }
}

fn emit_json(value: &Value) {
    let line = serde_json::to_string(value).unwrap_or_else(|err| {
        json!({
            "ok": false,
            "error": { "code": "serialization_error", "message": err.to_string() }
        })
        .to_string()
    });
    println!("{}", line);
}

/// `--json` failure payload. Harness errors keep their own code and the path
/// they concern; anything else is reported as `command_failed`.
fn error_payload(err: &anyhow::Error) -> Value {
    let harness = err.downcast_ref::<HarnessError>();
    let code = harness.map(HarnessError::code).unwrap_or("command_failed");
    let path = harness
        .and_then(HarnessError::path)
        .map(|p| p.display().to_string());
    json!({
        "ok": false,
        "error": {
            "code": code,
            "message": format!("{:#}", err),
            "path": path,
        }
    })
}

fn command_json_mode(command: &Commands) -> bool {
    match command {
        Commands::Sweep { json, .. }
        | Commands::Profile { json, .. }
        | Commands::Describe { json, .. } => *json,
        Commands::InitConfig { .. } => false,
    }
}

fn run_summary_to_json(summary: &RunSummary) -> Value {
    json!({
        "mode": summary.mode.as_str(),
        "output": summary.output.display().to_string(),
        "instances": summary.instances,
        "tasks": summary.tasks,
        "completed": summary.completed,
        "failed": summary.failed,
        "concurrency": summary.concurrency,
        "started_at": summary.started_at.to_rfc3339(),
        "elapsed_secs": summary.elapsed_secs,
    })
}

fn print_run_summary(summary: &RunSummary) {
    println!("mode: {}", summary.mode.as_str());
    println!("instances: {}", summary.instances);
    println!("tasks: {}", summary.tasks);
    println!("completed: {}", summary.completed);
    println!("failed: {}", summary.failed);
    println!("concurrency: {}", summary.concurrency);
    println!("elapsed_secs: {:.2}", summary.elapsed_secs);
    println!("results written to {}", summary.output.display());
}

fn plan_summary_to_json(plan: &PlanSummary) -> Value {
    json!({
        "mode": plan.mode.as_str(),
        "solver": plan.solver.display().to_string(),
        "instances_dir": plan.instances_dir.display().to_string(),
        "instances": plan
            .instances
            .iter()
            .map(|i| json!({ "name": i.name, "path": i.path.display().to_string(), "k": i.k }))
            .collect::<Vec<_>>(),
        "uncatalogued": plan.uncatalogued,
        "repetitions": plan.repetitions,
        "time_limit_secs": plan.time_limit_secs,
        "concurrency": plan.concurrency,
        "total_tasks": plan.total_tasks,
        "output": plan.output.display().to_string(),
    })
}

fn print_plan_summary(plan: &PlanSummary) {
    println!("mode: {}", plan.mode.as_str());
    println!("solver: {}", plan.solver.display());
    println!("instances_dir: {}", plan.instances_dir.display());
    println!("instances: {}", plan.instances.len());
    for instance in &plan.instances {
        println!("  {:<24} k={}", instance.name, instance.k);
    }
    if !plan.uncatalogued.is_empty() {
        println!("uncatalogued (k=0): {}", plan.uncatalogued.join(", "));
    }
    println!("repetitions: {}", plan.repetitions);
    println!("time_limit_secs: {}", plan.time_limit_secs);
    println!("concurrency: {}", plan.concurrency);
    println!("total_tasks: {}", plan.total_tasks);
    println!("output: {}", plan.output.display());
}
