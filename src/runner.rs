// src/runner.rs
use crate::backend::Backend;
use crate::error::TaskError;
use crate::output::TaskOutput;
use crate::tasks::Task;
use tracing::{debug, error, info};

/// A task paired with what happened when it ran.
#[derive(Debug)]
pub struct TaskReport {
    pub task: Task,
    pub outcome: Result<TaskOutput, TaskError>,
}

impl TaskReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs tasks one after another. A failing task is logged and recorded, and
/// the next task starts anyway.
pub struct Runner<B> {
    backend: B,
    tasks: Vec<Task>,
}

impl<B: Backend> Runner<B> {
    /// All twelve numbered tasks.
    pub fn new(backend: B) -> Self {
        Self::with_tasks(backend, Task::ALL)
    }

    /// The given tasks, deduplicated and put back into catalogue order.
    pub fn with_tasks(backend: B, tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut tasks: Vec<Task> = tasks.into_iter().collect();
        tasks.sort();
        tasks.dedup();
        Self { backend, tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub async fn run_task(&mut self, task: Task) -> TaskReport {
        if let Some(target) = task.creates() {
            self.backend.open(target);
        }

        let operation = task.plan();
        debug!(
            task = %task,
            operation = operation.name(),
            collection = operation.target().as_str(),
            "starting"
        );

        let outcome = self.backend.execute(&operation).await;
        match &outcome {
            Ok(_) => info!(task = %task, "completed"),
            Err(e) => error!(task = %task, error = %e, "failed"),
        }
        TaskReport { task, outcome }
    }

    /// Runs every selected task, then closes the backend.
    pub async fn run(mut self) -> Vec<TaskReport> {
        let mut reports = Vec::with_capacity(self.tasks.len());
        for task in self.tasks.clone() {
            reports.push(self.run_task(task).await);
        }
        let failed = reports.iter().filter(|r| !r.is_ok()).count();
        info!(total = reports.len(), failed, "run finished");
        self.close().await;
        reports
    }

    /// For callers driving [`Runner::run_task`] themselves.
    pub async fn close(self) {
        self.backend.close().await;
    }
}
