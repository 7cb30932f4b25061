mod cli;

use crate::cli::Cli;
use anyhow::{anyhow, Result};
use bson::Bson;
use clap::Parser;
use mongo_tasks::{mongo, MongoBackend, Runner, Settings, Task, TaskReport};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mongo_tasks=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();
    if let Err(e) = run(args).await {
        error!(error = %format!("{e:#}"), "run aborted");
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<()> {
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    }
    .with_overrides(args.mongo_uri.clone(), args.db.clone());

    let tasks = selected_tasks(&args)?;

    if args.dry_run {
        for task in &tasks {
            print_json(&task.label(), plan_json(*task));
        }
        return Ok(());
    }

    let connection = mongo::connect(&settings).await?;
    let backend = MongoBackend::new(connection, &settings.collections);
    let mut runner = Runner::with_tasks(backend, tasks);

    let mut failed = 0;
    for task in runner.tasks().to_vec() {
        if args.debug {
            print_json(&format!("{task} plan"), plan_json(task));
        }
        let report = runner.run_task(task).await;
        if !report.is_ok() {
            failed += 1;
        }
        print_report(&report);
    }
    info!(failed, "run finished");

    runner.close().await;
    Ok(())
}

fn selected_tasks(args: &Cli) -> Result<Vec<Task>> {
    let mut tasks = if args.only.is_empty() {
        Task::ALL.to_vec()
    } else {
        args.only
            .iter()
            .map(|n| Task::from_number(*n).ok_or_else(|| anyhow!("no task numbered {}", n)))
            .collect::<Result<Vec<_>>>()?
    };
    if args.users_example {
        tasks.insert(0, Task::UsersExample);
    }
    Ok(tasks)
}

/// Failed tasks were already logged by the runner.
fn print_report(report: &TaskReport) {
    if let Some(text) = render_report(report) {
        println!("{}", text);
    }
}

fn render_report(report: &TaskReport) -> Option<String> {
    let output = report.outcome.as_ref().ok()?;
    match output.to_json() {
        Ok(json) => render_json(&report.task.label(), &json),
        Err(e) => {
            error!(task = %report.task, error = %e, "failed to render result");
            None
        }
    }
}

fn plan_json(task: Task) -> serde_json::Value {
    Bson::Document(task.plan().describe()).into_relaxed_extjson()
}

fn print_json(label: &str, value: serde_json::Value) {
    if let Some(text) = render_json(label, &value) {
        println!("{}", text);
    }
}

fn render_json(label: &str, value: &serde_json::Value) -> Option<String> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => Some(format!("{}: {}", label, text)),
        Err(e) => {
            error!(label, error = %e, "failed to print");
            None
        }
    }
}
