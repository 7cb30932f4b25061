// src/tasks.rs
//! The task catalogue.
//!
//! Each [`Task`] maps to one [`Operation`]: a plain description of the
//! database call with its literal filter, update and pipeline documents.
//! Nothing here talks to a server, so plans can be printed for a dry run
//! and asserted directly in tests.

use crate::model::{Article, ArticleType};
use bson::{doc, Bson, Document, Regex};
use std::fmt;

/// Collection a plan addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Users,
    Students,
    Articles,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Users => "users",
            Target::Students => "students",
            Target::Articles => "articles",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {
    /// Destructive walkthrough: read every user and the first one, then
    /// delete all users. Only runs when asked for.
    UsersExample,
    YoungestUsers,
    AddEmptySkills,
    PushSkills,
    ReplaceCaliforniaJohn,
    PullTagC,
    PushTagBOnce,
    DeleteSupportUsers,
    CreateArticles,
    FindTaggedArticles,
    WorstHomeworkScore,
    AverageHomeworkScore,
    AverageScoreByStudent,
}

impl Task {
    /// The numbered tasks, in execution order.
    pub const ALL: [Task; 12] = [
        Task::YoungestUsers,
        Task::AddEmptySkills,
        Task::PushSkills,
        Task::ReplaceCaliforniaJohn,
        Task::PullTagC,
        Task::PushTagBOnce,
        Task::DeleteSupportUsers,
        Task::CreateArticles,
        Task::FindTaggedArticles,
        Task::WorstHomeworkScore,
        Task::AverageHomeworkScore,
        Task::AverageScoreByStudent,
    ];

    /// 1-based position in [`Task::ALL`]; `None` for the users example.
    pub fn number(self) -> Option<u8> {
        Self::ALL
            .iter()
            .position(|t| *t == self)
            .map(|i| i as u8 + 1)
    }

    pub fn from_number(n: u8) -> Option<Task> {
        let index = usize::from(n).checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> String {
        match self.number() {
            Some(n) => format!("task{n}"),
            None => "usersExample".to_string(),
        }
    }

    /// Collection this task brings into existence. The runner opens it
    /// before executing the plan.
    pub fn creates(self) -> Option<Target> {
        match self {
            Task::CreateArticles => Some(Target::Articles),
            _ => None,
        }
    }

    pub fn plan(self) -> Operation {
        match self {
            Task::UsersExample => Operation::Snapshot {
                target: Target::Users,
            },
            Task::YoungestUsers => Operation::Find {
                target: Target::Users,
                filter: doc! {},
                sort: Some(doc! { "age": 1 }),
                limit: Some(5),
                projection: Some(doc! { "firstName": 1, "lastName": 1, "age": 1 }),
            },
            Task::AddEmptySkills => Operation::UpdateMany {
                target: Target::Users,
                filter: doc! {
                    "$or": [
                        { "age": { "$gte": 25, "$lt": 30 } },
                        { "tags": "Engineering" },
                    ]
                },
                update: doc! { "$set": { "skills": [] } },
            },
            Task::PushSkills => Operation::FindOneAndUpdate {
                target: Target::Users,
                filter: doc! { "skills": { "$exists": true } },
                update: doc! { "$push": { "skills": { "$each": ["js", "git"] } } },
            },
            Task::ReplaceCaliforniaJohn => Operation::FindOneAndReplace {
                target: Target::Users,
                filter: doc! {
                    "email": Bson::RegularExpression(Regex {
                        pattern: "^john".to_string(),
                        options: String::new(),
                    }),
                    "address.state": "CA",
                },
                replacement: doc! {
                    "firstName": "Jason",
                    "lastName": "Wood",
                    "tags": ["a", "b", "c"],
                    "department": "Support",
                },
            },
            Task::PullTagC => Operation::UpdateOne {
                target: Target::Users,
                filter: doc! { "firstName": "Jason", "lastName": "Wood" },
                update: doc! { "$pull": { "tags": "c" } },
            },
            Task::PushTagBOnce => Operation::UpdateOne {
                target: Target::Users,
                filter: doc! {
                    "firstName": "Jason",
                    "lastName": "Wood",
                    "tags": { "$ne": "b" },
                },
                update: doc! { "$push": { "tags": "b" } },
            },
            Task::DeleteSupportUsers => Operation::DeleteMany {
                target: Target::Users,
                filter: doc! { "department": "Support" },
            },
            Task::CreateArticles => Operation::BulkWrite {
                target: Target::Articles,
                requests: article_requests(),
            },
            Task::FindTaggedArticles => Operation::Find {
                target: Target::Articles,
                filter: doc! { "tags": { "$in": ["super", "tag2-a"] } },
                sort: None,
                limit: None,
                projection: None,
            },
            Task::WorstHomeworkScore => Operation::Aggregate {
                target: Target::Students,
                pipeline: vec![
                    doc! { "$unwind": "$scores" },
                    doc! { "$match": { "scores.type": "homework" } },
                    doc! { "$sort": { "scores.score": 1 } },
                    doc! { "$limit": 1 },
                    doc! {
                        "$project": {
                            "_id": 0,
                            "name": 1,
                            "worst_homework_score": "$scores.score",
                        }
                    },
                ],
            },
            Task::AverageHomeworkScore => Operation::Aggregate {
                target: Target::Students,
                pipeline: vec![
                    doc! { "$unwind": "$scores" },
                    doc! { "$match": { "scores.type": "homework" } },
                    doc! {
                        "$group": {
                            "_id": Bson::Null,
                            "avg_score": { "$avg": "$scores.score" },
                        }
                    },
                    doc! { "$project": { "_id": 0, "avg_score": 1 } },
                ],
            },
            Task::AverageScoreByStudent => Operation::Aggregate {
                target: Target::Students,
                pipeline: vec![
                    doc! { "$unwind": "$scores" },
                    doc! {
                        "$group": {
                            "_id": "$name",
                            "avg_score": { "$avg": "$scores.score" },
                        }
                    },
                    doc! { "$sort": { "avg_score": -1 } },
                ],
            },
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Order matters: the `$set` on type `a` and the `$push` on the others must
/// land before the final `$pull`, otherwise the resulting tag lists differ.
fn article_requests() -> Vec<WriteRequest> {
    let mut requests: Vec<WriteRequest> = [ArticleType::A, ArticleType::B, ArticleType::C]
        .into_iter()
        .zip(1..)
        .map(|(kind, n)| WriteRequest::InsertOne(Article::numbered(n, kind).to_document()))
        .collect();

    requests.push(WriteRequest::UpdateOne {
        filter: doc! { "type": "a" },
        update: doc! { "$set": { "tags": ["tag1-a", "tag2-a", "tag3"] } },
    });
    requests.push(WriteRequest::UpdateMany {
        filter: doc! { "type": { "$ne": "a" } },
        update: doc! { "$push": { "tags": { "$each": ["tag2", "tag3", "super"] } } },
    });
    requests.push(WriteRequest::UpdateMany {
        filter: doc! {},
        update: doc! { "$pull": { "tags": { "$in": ["tag2", "tag1-a"] } } },
    });
    requests
}

/// One entry of an ordered bulk write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    InsertOne(Document),
    UpdateOne { filter: Document, update: Document },
    UpdateMany { filter: Document, update: Document },
}

impl WriteRequest {
    pub fn describe(&self) -> Document {
        match self {
            WriteRequest::InsertOne(document) => {
                doc! { "insertOne": { "document": document.clone() } }
            }
            WriteRequest::UpdateOne { filter, update } => {
                doc! { "updateOne": { "filter": filter.clone(), "update": update.clone() } }
            }
            WriteRequest::UpdateMany { filter, update } => {
                doc! { "updateMany": { "filter": filter.clone(), "update": update.clone() } }
            }
        }
    }
}

/// A single database call, fully described by literal documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Find {
        target: Target,
        filter: Document,
        sort: Option<Document>,
        limit: Option<i64>,
        projection: Option<Document>,
    },
    UpdateMany {
        target: Target,
        filter: Document,
        update: Document,
    },
    UpdateOne {
        target: Target,
        filter: Document,
        update: Document,
    },
    /// Returns the post-image.
    FindOneAndUpdate {
        target: Target,
        filter: Document,
        update: Document,
    },
    /// Returns the post-image.
    FindOneAndReplace {
        target: Target,
        filter: Document,
        replacement: Document,
    },
    DeleteMany {
        target: Target,
        filter: Document,
    },
    /// Ordered: stops at the first failing request.
    BulkWrite {
        target: Target,
        requests: Vec<WriteRequest>,
    },
    Aggregate {
        target: Target,
        pipeline: Vec<Document>,
    },
    /// Reads all documents and the first document concurrently, then
    /// deletes every document.
    Snapshot { target: Target },
}

impl Operation {
    pub fn target(&self) -> Target {
        match self {
            Operation::Find { target, .. }
            | Operation::UpdateMany { target, .. }
            | Operation::UpdateOne { target, .. }
            | Operation::FindOneAndUpdate { target, .. }
            | Operation::FindOneAndReplace { target, .. }
            | Operation::DeleteMany { target, .. }
            | Operation::BulkWrite { target, .. }
            | Operation::Aggregate { target, .. }
            | Operation::Snapshot { target } => *target,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Find { .. } => "find",
            Operation::UpdateMany { .. } => "updateMany",
            Operation::UpdateOne { .. } => "updateOne",
            Operation::FindOneAndUpdate { .. } => "findOneAndUpdate",
            Operation::FindOneAndReplace { .. } => "findOneAndReplace",
            Operation::DeleteMany { .. } => "deleteMany",
            Operation::BulkWrite { .. } => "bulkWrite",
            Operation::Aggregate { .. } => "aggregate",
            Operation::Snapshot { .. } => "snapshot",
        }
    }

    /// Shell-like rendering used by `--dry-run` and `--debug`.
    pub fn describe(&self) -> Document {
        let mut out = doc! {
            "collection": self.target().as_str(),
            "operation": self.name(),
        };
        match self {
            Operation::Find {
                filter,
                sort,
                limit,
                projection,
                ..
            } => {
                out.insert("filter", filter.clone());
                if let Some(projection) = projection {
                    out.insert("projection", projection.clone());
                }
                if let Some(sort) = sort {
                    out.insert("sort", sort.clone());
                }
                if let Some(limit) = limit {
                    out.insert("limit", *limit);
                }
            }
            Operation::UpdateMany { filter, update, .. }
            | Operation::UpdateOne { filter, update, .. } => {
                out.insert("filter", filter.clone());
                out.insert("update", update.clone());
            }
            Operation::FindOneAndUpdate { filter, update, .. } => {
                out.insert("filter", filter.clone());
                out.insert("update", update.clone());
                out.insert("returnDocument", "after");
            }
            Operation::FindOneAndReplace {
                filter,
                replacement,
                ..
            } => {
                out.insert("filter", filter.clone());
                out.insert("replacement", replacement.clone());
                out.insert("returnDocument", "after");
            }
            Operation::DeleteMany { filter, .. } => {
                out.insert("filter", filter.clone());
            }
            Operation::BulkWrite { requests, .. } => {
                let requests: Vec<Bson> = requests
                    .iter()
                    .map(|r| Bson::Document(r.describe()))
                    .collect();
                out.insert("requests", requests);
                out.insert("ordered", true);
            }
            Operation::Aggregate { pipeline, .. } => {
                out.insert("pipeline", pipeline.clone());
            }
            Operation::Snapshot { .. } => {}
        }
        out
    }
}
