// src/output.rs
use crate::error::TaskError;
use bson::{Bson, Document};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// What a task produced. Serialized untagged, so printing shows the raw
/// result rather than the variant name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TaskOutput {
    Documents(Vec<Document>),
    Document(Option<Document>),
    Update(UpdateSummary),
    Delete(DeleteSummary),
    Bulk(BulkSummary),
    Snapshot(UsersSnapshot),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    pub matched_count: u64,
    pub modified_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upserted_id: Option<Bson>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub deleted_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub inserted_count: u64,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl BulkSummary {
    pub fn absorb_update(&mut self, update: &UpdateSummary) {
        self.matched_count += update.matched_count;
        self.modified_count += update.modified_count;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersSnapshot {
    pub all_users: Vec<Document>,
    pub first_user: Option<Document>,
    pub deleted_count: u64,
}

impl From<mongodb::results::UpdateResult> for UpdateSummary {
    fn from(result: mongodb::results::UpdateResult) -> Self {
        Self {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        }
    }
}

impl From<mongodb::results::DeleteResult> for DeleteSummary {
    fn from(result: mongodb::results::DeleteResult) -> Self {
        Self {
            deleted_count: result.deleted_count,
        }
    }
}

impl From<mongodb::results::SummaryBulkWriteResult> for BulkSummary {
    fn from(result: mongodb::results::SummaryBulkWriteResult) -> Self {
        let count = |n: i64| u64::try_from(n).unwrap_or_default();
        Self {
            inserted_count: count(result.inserted_count),
            matched_count: count(result.matched_count),
            modified_count: count(result.modified_count),
        }
    }
}

impl TaskOutput {
    pub fn to_bson(&self) -> Result<Bson, TaskError> {
        Ok(bson::to_bson(self)?)
    }

    /// Relaxed extended JSON, the form printed on the console.
    pub fn to_json(&self) -> Result<serde_json::Value, TaskError> {
        Ok(self.to_bson()?.into_relaxed_extjson())
    }

    /// Decodes document results into typed rows. Write summaries decode to
    /// an empty list.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>, TaskError> {
        let documents: Vec<&Document> = match self {
            TaskOutput::Documents(documents) => documents.iter().collect(),
            TaskOutput::Document(document) => document.iter().collect(),
            TaskOutput::Snapshot(snapshot) => snapshot.all_users.iter().collect(),
            TaskOutput::Update(_) | TaskOutput::Delete(_) | TaskOutput::Bulk(_) => Vec::new(),
        };
        documents
            .into_iter()
            .map(|d| bson::from_document(d.clone()).map_err(TaskError::from))
            .collect()
    }
}
