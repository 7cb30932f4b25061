//! Scripted MongoDB exercises.
//!
//! A fixed catalogue of tasks (queries, updates, a bulk write and
//! aggregations) is turned into plain [`Operation`] values and run in order
//! against a [`Backend`]. Every task yields a [`TaskReport`]; a failing task
//! never stops the ones after it.

pub mod backend;
pub mod config;
pub mod error;
pub mod model;
pub mod mongo;
pub mod output;
pub mod runner;
pub mod tasks;

pub use backend::{Backend, MongoBackend, TaskContext};
pub use config::{CollectionNames, Settings};
pub use error::TaskError;
pub use output::TaskOutput;
pub use runner::{Runner, TaskReport};
pub use tasks::{Operation, Target, Task, WriteRequest};
