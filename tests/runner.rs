use mongo_tasks::{
    mongo, Backend, MongoBackend, Operation, Runner, Settings, Target, Task, TaskError,
    TaskOutput,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

type Events = Arc<Mutex<Vec<String>>>;

/// Records every call into a shared log and fails the operations it is
/// told to.
#[derive(Default)]
struct RecordingBackend {
    events: Events,
    opened: HashSet<Target>,
    failing: HashSet<&'static str>,
}

impl RecordingBackend {
    fn failing(names: &[&'static str]) -> Self {
        Self {
            failing: names.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn events(&self) -> Events {
        Arc::clone(&self.events)
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl Backend for RecordingBackend {
    fn open(&mut self, target: Target) {
        self.record(format!("open {}", target.as_str()));
        self.opened.insert(target);
    }

    async fn close(self) {
        self.record("close".to_string());
    }

    async fn execute(&mut self, operation: &Operation) -> Result<TaskOutput, TaskError> {
        let target = operation.target();
        self.record(format!("{} {}", operation.name(), target.as_str()));
        if target == Target::Articles && !self.opened.contains(&target) {
            return Err(TaskError::CollectionNotOpened(target.as_str()));
        }
        if self.failing.contains(operation.name()) {
            return Err(TaskError::UnsupportedServer(format!(
                "{} refused",
                operation.name()
            )));
        }
        Ok(TaskOutput::Documents(Vec::new()))
    }
}

#[tokio::test]
async fn runs_all_twelve_tasks_in_order_then_closes_once() {
    let backend = RecordingBackend::default();
    let events = backend.events();
    let reports = Runner::new(backend).run().await;

    let tasks: Vec<Task> = reports.iter().map(|r| r.task).collect();
    assert_eq!(tasks, Task::ALL);
    assert!(reports.iter().all(|r| r.is_ok()));

    assert_eq!(
        *events.lock().unwrap(),
        [
            "find users",
            "updateMany users",
            "findOneAndUpdate users",
            "findOneAndReplace users",
            "updateOne users",
            "updateOne users",
            "deleteMany users",
            "open articles",
            "bulkWrite articles",
            "find articles",
            "aggregate students",
            "aggregate students",
            "aggregate students",
            "close",
        ]
    );
}

#[tokio::test]
async fn close_follows_the_last_task_even_when_it_fails() {
    let backend = RecordingBackend::failing(&["aggregate"]);
    let events = backend.events();
    let reports = Runner::new(backend).run().await;

    assert!(!reports.last().unwrap().is_ok());
    let events = events.lock().unwrap();
    assert_eq!(events.iter().filter(|e| *e == "close").count(), 1);
    assert_eq!(events.last().map(String::as_str), Some("close"));
}

#[tokio::test]
async fn manual_driving_runs_each_task_before_the_next_and_closes_once() {
    let backend = RecordingBackend::default();
    let events = backend.events();
    let mut runner = Runner::with_tasks(backend, [Task::YoungestUsers, Task::AddEmptySkills]);

    let first = runner.run_task(Task::YoungestUsers).await;
    assert!(first.is_ok());
    assert_eq!(*events.lock().unwrap(), ["find users"]);

    runner.run_task(Task::AddEmptySkills).await;
    runner.close().await;
    assert_eq!(
        *events.lock().unwrap(),
        ["find users", "updateMany users", "close"]
    );
}

#[tokio::test]
async fn failing_tasks_do_not_stop_the_sequence() {
    let backend = RecordingBackend::failing(&["findOneAndUpdate", "findOneAndReplace", "bulkWrite"]);
    let reports = Runner::new(backend).run().await;

    assert_eq!(reports.len(), 12);
    let failed: Vec<u8> = reports
        .iter()
        .filter(|r| !r.is_ok())
        .filter_map(|r| r.task.number())
        .collect();
    assert_eq!(failed, [3, 4, 8]);

    // The last task still ran and succeeded.
    let last = reports.last().unwrap();
    assert_eq!(last.task, Task::AverageScoreByStudent);
    assert!(last.is_ok());
}

#[tokio::test]
async fn article_query_without_article_creation_reports_missing_collection() {
    let reports = Runner::with_tasks(RecordingBackend::default(), [Task::FindTaggedArticles])
        .run()
        .await;

    assert_eq!(reports.len(), 1);
    assert!(matches!(
        reports[0].outcome,
        Err(TaskError::CollectionNotOpened("articles"))
    ));
}

#[tokio::test]
async fn selection_is_sorted_and_deduplicated() {
    let runner = Runner::with_tasks(
        RecordingBackend::default(),
        [
            Task::FindTaggedArticles,
            Task::CreateArticles,
            Task::CreateArticles,
            Task::UsersExample,
        ],
    );
    assert_eq!(
        runner.tasks(),
        [Task::UsersExample, Task::CreateArticles, Task::FindTaggedArticles]
    );
}

#[tokio::test]
async fn article_creation_opens_collection_for_later_query() {
    let reports = Runner::with_tasks(
        RecordingBackend::default(),
        [Task::CreateArticles, Task::FindTaggedArticles],
    )
    .run()
    .await;
    assert!(reports.iter().all(|r| r.is_ok()));
}

fn unreachable_settings() -> Settings {
    Settings {
        uri: "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=100&connectTimeoutMS=100"
            .to_string(),
        ..Settings::default()
    }
}

#[tokio::test]
async fn unreachable_server_is_an_outer_failure() {
    let err = mongo::connect(&unreachable_settings()).await.unwrap_err();
    assert!(format!("{err:#}").starts_with("failed to connect to MongoDB"));
}

#[tokio::test]
async fn server_lost_after_connect_fails_every_task_with_a_driver_error() {
    let settings = unreachable_settings();
    let connection = mongo::open(&settings).await.unwrap();
    let backend = MongoBackend::new(connection, &settings.collections);
    let reports = Runner::new(backend).run().await;

    assert_eq!(reports.len(), 12);
    for report in &reports {
        assert!(
            matches!(report.outcome, Err(TaskError::Mongo(_))),
            "{} should fail with a driver error, got {:?}",
            report.task,
            report.outcome
        );
    }
}
