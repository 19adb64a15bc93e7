pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod parser;
pub mod planner;
pub mod process;
pub mod report;
pub mod schema;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

pub use aggregate::InstanceAggregate;
pub use catalog::InstanceCatalog;
pub use config::HarnessConfig;
pub use error::{HarnessError, TaskFailure};
pub use executor::BoundedExecutor;
pub use parser::{parse_result_line, ResultRecord};
pub use planner::{InstanceSpec, RunPlan, Task};
pub use process::{ProcessRunner, TaskOutcome};
pub use report::{InstanceBlock, ReportWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Every instance in the directory, few repetitions each.
    Sweep,
    /// One instance, many repetitions.
    Profile,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Sweep => "sweep",
            RunMode::Profile => "profile",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: RunMode,
    pub output: PathBuf,
    pub instances: usize,
    pub tasks: usize,
    pub completed: usize,
    pub failed: usize,
    pub concurrency: usize,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub mode: RunMode,
    pub solver: PathBuf,
    pub instances_dir: PathBuf,
    pub instances: Vec<InstanceSpec>,
    /// Instances whose `k` fell back to the default.
    pub uncatalogued: Vec<String>,
    pub repetitions: usize,
    pub time_limit_secs: u64,
    pub concurrency: usize,
    pub total_tasks: usize,
    pub output: PathBuf,
}

pub async fn run_sweep(config: &HarnessConfig) -> Result<RunSummary> {
    let catalog = config.catalog();
    run_with_plan(config, RunMode::Sweep, || {
        planner::plan_sweep(
            &config.instances_dir,
            &catalog,
            config.repetitions,
            config.time_limit_secs,
        )
    })
    .await
}

/// Runs one instance `repetitions` times (default: the configured profile
/// repetitions).
pub async fn run_profile(
    config: &HarnessConfig,
    instance: &str,
    repetitions: Option<usize>,
) -> Result<RunSummary> {
    let catalog = config.catalog();
    let repetitions = repetitions.unwrap_or(config.profile_repetitions);
    run_with_plan(config, RunMode::Profile, || {
        planner::plan_profile(
            &config.instances_dir,
            instance,
            &catalog,
            repetitions,
            config.time_limit_secs,
        )
    })
    .await
}

pub fn describe_sweep(config: &HarnessConfig) -> Result<PlanSummary> {
    let catalog = config.catalog();
    let plan = planner::plan_sweep(
        &config.instances_dir,
        &catalog,
        config.repetitions,
        config.time_limit_secs,
    )?;
    Ok(plan_summary(config, RunMode::Sweep, &catalog, plan))
}

pub fn describe_profile(
    config: &HarnessConfig,
    instance: &str,
    repetitions: Option<usize>,
) -> Result<PlanSummary> {
    let catalog = config.catalog();
    let plan = planner::plan_profile(
        &config.instances_dir,
        instance,
        &catalog,
        repetitions.unwrap_or(config.profile_repetitions),
        config.time_limit_secs,
    )?;
    Ok(plan_summary(config, RunMode::Profile, &catalog, plan))
}

fn plan_summary(
    config: &HarnessConfig,
    mode: RunMode,
    catalog: &InstanceCatalog,
    plan: RunPlan,
) -> PlanSummary {
    let uncatalogued = plan
        .instances
        .iter()
        .filter(|i| !catalog.contains(&i.name))
        .map(|i| i.name.clone())
        .collect();
    PlanSummary {
        mode,
        solver: config.solver.clone(),
        instances_dir: config.instances_dir.clone(),
        total_tasks: plan.tasks.len(),
        instances: plan.instances,
        uncatalogued,
        repetitions: plan.repetitions,
        time_limit_secs: plan.time_limit_secs,
        concurrency: config.concurrency.max(1),
        output: config.output.clone(),
    }
}

// The report destination is opened before planning so that an unusable
// output path fails the run before any solver is started.
async fn run_with_plan<P>(config: &HarnessConfig, mode: RunMode, plan: P) -> Result<RunSummary>
where
    P: FnOnce() -> Result<RunPlan, HarnessError>,
{
    let mut report = report::create_report(&config.output)?;
    report
        .write_header()
        .map_err(|source| write_error(&config.output, source))?;
    let plan = plan()?;

    let runner = ProcessRunner::new(&config.solver);
    let executor = BoundedExecutor::new(config.concurrency);
    let started_at = Utc::now();
    let clock = Instant::now();
    info!(
        mode = mode.as_str(),
        instances = plan.instances.len(),
        tasks = plan.tasks.len(),
        concurrency = executor.concurrency(),
        solver = %runner.solver().display(),
        "starting run"
    );

    let outcomes = executor
        .run(&plan.tasks, |_, task| {
            let runner = runner.clone();
            async move { run_task(&runner, &task).await }
        })
        .await?;

    let completed = outcomes.iter().filter(|o| o.is_completed()).count();
    let blocks = build_blocks(&plan, &outcomes);
    write_blocks(&mut report, &blocks).map_err(|source| write_error(&config.output, source))?;
    report
        .finish()
        .map_err(|source| write_error(&config.output, source))?;

    let summary = RunSummary {
        mode,
        output: config.output.clone(),
        instances: plan.instances.len(),
        tasks: plan.tasks.len(),
        completed,
        failed: plan.tasks.len() - completed,
        concurrency: executor.concurrency(),
        started_at,
        elapsed_secs: clock.elapsed().as_secs_f64(),
    };
    info!(
        output = %summary.output.display(),
        completed = summary.completed,
        failed = summary.failed,
        elapsed_secs = summary.elapsed_secs,
        "results written"
    );
    Ok(summary)
}

async fn run_task(runner: &ProcessRunner, task: &Task) -> TaskOutcome {
    info!(
        instance = %task.path.display(),
        attempt = task.repetition + 1,
        "testing"
    );
    let outcome = runner.run(task).await;
    if let TaskOutcome::Failed(failure) = &outcome {
        warn!(
            instance = %task.path.display(),
            attempt = task.repetition + 1,
            code = failure.code(),
            error = %failure,
            "no result from solver"
        );
    }
    outcome
}

fn record_for(outcome: &TaskOutcome) -> ResultRecord {
    match outcome {
        TaskOutcome::Completed { line } => parse_result_line(line),
        TaskOutcome::Failed(_) => ResultRecord::failed(),
    }
}

/// Groups outcomes (in task order) into one block per planned instance.
pub fn build_blocks(plan: &RunPlan, outcomes: &[TaskOutcome]) -> Vec<InstanceBlock> {
    let mut grouped: Vec<Vec<ResultRecord>> = plan
        .instances
        .iter()
        .map(|_| Vec::with_capacity(plan.repetitions))
        .collect();
    for (task, outcome) in plan.tasks.iter().zip(outcomes) {
        grouped[task.instance_index].push(record_for(outcome));
    }
    plan.instances
        .iter()
        .zip(grouped)
        .map(|(instance, records)| InstanceBlock::new(instance.name.clone(), records))
        .collect()
}

fn write_blocks<W: Write>(
    report: &mut ReportWriter<W>,
    blocks: &[InstanceBlock],
) -> std::io::Result<()> {
    for block in blocks {
        if let Some(seed) = aggregate::repeated_seed(&block.records) {
            warn!(
                instance = %block.instance,
                seed,
                "all repetitions reported the same seed; averages reflect re-runs, not independent trials"
            );
        }
        report.write_block(block)?;
    }
    Ok(())
}

fn write_error(path: &Path, source: std::io::Error) -> HarnessError {
    HarnessError::ReportWrite {
        path: path.to_path_buf(),
        source,
    }
}
