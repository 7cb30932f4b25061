// src/backend.rs
use crate::config::CollectionNames;
use crate::error::TaskError;
use crate::mongo::{self, Connection};
use crate::output::{BulkSummary, DeleteSummary, TaskOutput, UpdateSummary, UsersSnapshot};
use crate::tasks::{Operation, Target, WriteRequest};

use bson::{doc, Document};
use futures::stream::TryStreamExt;
use mongodb::options::{
    InsertOneModel, ReturnDocument, UpdateManyModel, UpdateOneModel, WriteModel,
};
use mongodb::{Collection, Database, Namespace};
use tracing::{debug, info};

/// Executes plans against some store.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Makes a lazily created collection available to later plans.
    fn open(&mut self, target: Target);

    async fn execute(&mut self, operation: &Operation) -> Result<TaskOutput, TaskError>;

    /// Releases the underlying connection. Consumes the backend, so it can
    /// only happen once.
    async fn close(self);
}

/// Collection handles shared by every task. `users` and `students` exist up
/// front; `articles` stays empty until something opens it.
#[derive(Debug, Clone)]
pub struct TaskContext {
    database: Database,
    articles_name: String,
    users: Collection<Document>,
    students: Collection<Document>,
    articles: Option<Collection<Document>>,
}

impl TaskContext {
    pub fn new(database: &Database, names: &CollectionNames) -> Self {
        Self {
            database: database.clone(),
            articles_name: names.articles.clone(),
            users: database.collection(&names.users),
            students: database.collection(&names.students),
            articles: None,
        }
    }

    pub fn open(&mut self, target: Target) {
        if target == Target::Articles && self.articles.is_none() {
            debug!(collection = %self.articles_name, "opening collection");
            self.articles = Some(self.database.collection(&self.articles_name));
        }
    }

    #[cfg(test)]
    pub fn is_open(&self, target: Target) -> bool {
        match target {
            Target::Users | Target::Students => true,
            Target::Articles => self.articles.is_some(),
        }
    }

    pub fn collection(&self, target: Target) -> Result<&Collection<Document>, TaskError> {
        match target {
            Target::Users => Ok(&self.users),
            Target::Students => Ok(&self.students),
            Target::Articles => self
                .articles
                .as_ref()
                .ok_or(TaskError::CollectionNotOpened(Target::Articles.as_str())),
        }
    }
}

/// [`Backend`] over the MongoDB driver.
pub struct MongoBackend {
    connection: Connection,
    ctx: TaskContext,
    client_bulk_write: Option<bool>,
}

impl MongoBackend {
    pub fn new(connection: Connection, names: &CollectionNames) -> Self {
        Self {
            ctx: TaskContext::new(connection.database(), names),
            connection,
            client_bulk_write: None,
        }
    }

    /// Client-level bulk writes need MongoDB 8.0; checked once per backend.
    async fn supports_client_bulk_write(&mut self) -> Result<bool, TaskError> {
        if let Some(known) = self.client_bulk_write {
            return Ok(known);
        }
        let version = mongo::server_version(self.connection.client())
            .await?
            .ok_or_else(|| TaskError::UnsupportedServer("buildInfo has no version".into()))?;
        let supported = mongo::is_version_8_or_higher(&version);
        info!(%version, client_bulk_write = supported, "detected server version");
        self.client_bulk_write = Some(supported);
        Ok(supported)
    }

    async fn bulk_write(
        &mut self,
        target: Target,
        requests: &[WriteRequest],
    ) -> Result<TaskOutput, TaskError> {
        let collection = self.ctx.collection(target)?.clone();

        if self.supports_client_bulk_write().await? {
            let namespace = collection.namespace();
            let models: Vec<WriteModel> = requests
                .iter()
                .map(|request| write_model(request, &namespace))
                .collect();
            let result = self
                .connection
                .client()
                .bulk_write(models)
                .ordered(true)
                .await?;
            return Ok(TaskOutput::Bulk(result.into()));
        }

        // Older servers: same requests, one at a time, stopping at the first error.
        let mut summary = BulkSummary::default();
        for request in requests {
            match request {
                WriteRequest::InsertOne(document) => {
                    collection.insert_one(document.clone()).await?;
                    summary.inserted_count += 1;
                }
                WriteRequest::UpdateOne { filter, update } => {
                    let result = collection
                        .update_one(filter.clone(), update.clone())
                        .await?;
                    summary.absorb_update(&result.into());
                }
                WriteRequest::UpdateMany { filter, update } => {
                    let result = collection
                        .update_many(filter.clone(), update.clone())
                        .await?;
                    summary.absorb_update(&result.into());
                }
            }
        }
        Ok(TaskOutput::Bulk(summary))
    }
}

fn write_model(request: &WriteRequest, namespace: &Namespace) -> WriteModel {
    match request {
        WriteRequest::InsertOne(document) => WriteModel::InsertOne(
            InsertOneModel::builder()
                .namespace(namespace.clone())
                .document(document.clone())
                .build(),
        ),
        WriteRequest::UpdateOne { filter, update } => WriteModel::UpdateOne(
            UpdateOneModel::builder()
                .namespace(namespace.clone())
                .filter(filter.clone())
                .update(update.clone())
                .build(),
        ),
        WriteRequest::UpdateMany { filter, update } => WriteModel::UpdateMany(
            UpdateManyModel::builder()
                .namespace(namespace.clone())
                .filter(filter.clone())
                .update(update.clone())
                .build(),
        ),
    }
}

async fn find_all(
    collection: &Collection<Document>,
    filter: Document,
) -> mongodb::error::Result<Vec<Document>> {
    let cursor = collection.find(filter).await?;
    cursor.try_collect().await
}

impl Backend for MongoBackend {
    fn open(&mut self, target: Target) {
        self.ctx.open(target);
    }

    async fn close(self) {
        self.connection.close().await;
    }

    async fn execute(&mut self, operation: &Operation) -> Result<TaskOutput, TaskError> {
        match operation {
            Operation::Find {
                target,
                filter,
                sort,
                limit,
                projection,
            } => {
                let collection = self.ctx.collection(*target)?;
                let mut find = collection.find(filter.clone());
                if let Some(sort) = sort {
                    find = find.sort(sort.clone());
                }
                if let Some(limit) = limit {
                    find = find.limit(*limit);
                }
                if let Some(projection) = projection {
                    find = find.projection(projection.clone());
                }
                let documents: Vec<Document> = find.await?.try_collect().await?;
                Ok(TaskOutput::Documents(documents))
            }
            Operation::UpdateMany {
                target,
                filter,
                update,
            } => {
                let result = self
                    .ctx
                    .collection(*target)?
                    .update_many(filter.clone(), update.clone())
                    .await?;
                Ok(TaskOutput::Update(UpdateSummary::from(result)))
            }
            Operation::UpdateOne {
                target,
                filter,
                update,
            } => {
                let result = self
                    .ctx
                    .collection(*target)?
                    .update_one(filter.clone(), update.clone())
                    .await?;
                Ok(TaskOutput::Update(UpdateSummary::from(result)))
            }
            Operation::FindOneAndUpdate {
                target,
                filter,
                update,
            } => {
                let document = self
                    .ctx
                    .collection(*target)?
                    .find_one_and_update(filter.clone(), update.clone())
                    .return_document(ReturnDocument::After)
                    .await?;
                Ok(TaskOutput::Document(document))
            }
            Operation::FindOneAndReplace {
                target,
                filter,
                replacement,
            } => {
                let document = self
                    .ctx
                    .collection(*target)?
                    .find_one_and_replace(filter.clone(), replacement.clone())
                    .return_document(ReturnDocument::After)
                    .await?;
                Ok(TaskOutput::Document(document))
            }
            Operation::DeleteMany { target, filter } => {
                let result = self
                    .ctx
                    .collection(*target)?
                    .delete_many(filter.clone())
                    .await?;
                Ok(TaskOutput::Delete(DeleteSummary::from(result)))
            }
            Operation::BulkWrite { target, requests } => self.bulk_write(*target, requests).await,
            Operation::Aggregate { target, pipeline } => {
                let cursor = self
                    .ctx
                    .collection(*target)?
                    .aggregate(pipeline.clone())
                    .await?;
                let documents: Vec<Document> = cursor.try_collect().await?;
                Ok(TaskOutput::Documents(documents))
            }
            Operation::Snapshot { target } => {
                let collection = self.ctx.collection(*target)?;
                let (all_users, first_user) = tokio::try_join!(
                    find_all(collection, doc! {}),
                    async { collection.find_one(doc! {}).await },
                )?;
                let deleted = collection.delete_many(doc! {}).await?;
                Ok(TaskOutput::Snapshot(UsersSnapshot {
                    all_users,
                    first_user,
                    deleted_count: deleted.deleted_count,
                }))
            }
        }
    }
}
