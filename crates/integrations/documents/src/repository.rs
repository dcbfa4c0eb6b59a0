//! Typed collection wrapper executing document builders.

use std::collections::HashMap;

use common::{run_with_timeout, AppError, AppResult};
use futures::TryStreamExt;
use mongodb::bson::Bson;
use mongodb::results::UpdateResult;
use mongodb::Collection;
use serde::{de::DeserializeOwned, Serialize};

use crate::builders::{
    DeleteDocuments, FindDocument, FindDocuments, InsertDocument, InsertDocuments,
    ReplaceDocument,
};

/// Convert a driver error to AppError, logging it.
fn document_error(operation: &str, e: mongodb::error::Error) -> AppError {
    tracing::error!("Document {} failed: {}", operation, e);
    AppError::Document(e)
}

/// Inserted ids keyed by input position, returned in input order.
fn ordered_ids(inserted: HashMap<usize, Bson>) -> Vec<Bson> {
    let mut ids: Vec<(usize, Bson)> = inserted.into_iter().collect();
    ids.sort_by_key(|(index, _)| *index);
    ids.into_iter().map(|(_, id)| id).collect()
}

/// Outcome of a replace.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceOutcome {
    pub matched: u64,
    pub modified: u64,
    pub upserted_id: Option<Bson>,
}

impl ReplaceOutcome {
    /// Nothing matched and nothing was upserted: the target does not exist.
    fn into_result(self) -> AppResult<Self> {
        if self.matched == 0 && self.upserted_id.is_none() {
            return Err(AppError::NotFound);
        }
        Ok(self)
    }
}

impl From<UpdateResult> for ReplaceOutcome {
    fn from(result: UpdateResult) -> Self {
        Self {
            matched: result.matched_count,
            modified: result.modified_count,
            upserted_id: result.upserted_id,
        }
    }
}

/// Repository over one collection of `T` documents.
#[derive(Debug, Clone)]
pub struct DocumentRepository<T: Send + Sync> {
    collection: Collection<T>,
}

impl<T> DocumentRepository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }

    pub fn name(&self) -> &str {
        self.collection.name()
    }

    /// Insert one document, returning its id.
    pub async fn insert(&self, cmd: InsertDocument<T>) -> AppResult<Bson> {
        run_with_timeout(cmd.timeout.get(), async {
            let result = self
                .collection
                .insert_one(&cmd.document)
                .await
                .map_err(|e| document_error("insert", e))?;
            Ok(result.inserted_id)
        })
        .await
    }

    /// Insert documents in order, returning their ids in input order.
    pub async fn insert_many(&self, cmd: InsertDocuments<T>) -> AppResult<Vec<Bson>> {
        run_with_timeout(cmd.timeout.get(), async {
            let result = self
                .collection
                .insert_many(&cmd.documents)
                .await
                .map_err(|e| document_error("insert_many", e))?;
            Ok(ordered_ids(result.inserted_ids))
        })
        .await
    }

    /// Replace the first match. Without upsert, no match is `NotFound`.
    pub async fn replace(&self, cmd: ReplaceDocument<T>) -> AppResult<ReplaceOutcome> {
        run_with_timeout(cmd.timeout.get(), async {
            let result = self
                .collection
                .replace_one(cmd.filter, &cmd.replacement)
                .upsert(cmd.upsert)
                .await
                .map_err(|e| document_error("replace", e))?;
            ReplaceOutcome::from(result).into_result()
        })
        .await
    }

    /// Delete matches; returns the number deleted.
    pub async fn delete(&self, cmd: DeleteDocuments) -> AppResult<u64> {
        run_with_timeout(cmd.timeout.get(), async {
            let deleted = if cmd.many {
                self.collection.delete_many(cmd.filter).await
            } else {
                self.collection.delete_one(cmd.filter).await
            };
            let result = deleted.map_err(|e| document_error("delete", e))?;
            tracing::debug!(
                collection = self.collection.name(),
                many = cmd.many,
                deleted = result.deleted_count,
                "Documents deleted"
            );
            Ok(result.deleted_count)
        })
        .await
    }

    pub async fn find_one(&self, query: FindDocument) -> AppResult<Option<T>> {
        let filter = query.filter_document();
        let options = query.find_one_options();
        run_with_timeout(query.timeout.get(), async {
            self.collection
                .find_one(filter)
                .with_options(options)
                .await
                .map_err(|e| document_error("find_one", e))
        })
        .await
    }

    pub async fn find(&self, query: FindDocuments) -> AppResult<Vec<T>> {
        let filter = query.filter_document();
        let options = query.find_options();
        run_with_timeout(query.timeout.get(), async {
            let cursor = self
                .collection
                .find(filter)
                .with_options(options)
                .await
                .map_err(|e| document_error("find", e))?;
            cursor
                .try_collect()
                .await
                .map_err(|e| document_error("find", e))
        })
        .await
    }

    /// Count documents matching the query's filter.
    pub async fn count(&self, query: FindDocuments) -> AppResult<u64> {
        let filter = query.filter_document();
        run_with_timeout(query.timeout.get(), async {
            self.collection
                .count_documents(filter)
                .await
                .map_err(|e| document_error("count", e))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use common::testing::LogCapture;
    use common::{DocumentConfig, Timed};
    use mongodb::bson::{doc, oid::ObjectId, Document};

    use super::*;
    use crate::store::DocumentStore;

    /// Store pointed at a closed port; the driver gives up after 200ms.
    async fn unreachable() -> DocumentRepository<Document> {
        let config = DocumentConfig {
            uri: "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200&directConnection=true"
                .to_string(),
            database: "tests".to_string(),
            app_name: None,
        };
        DocumentStore::connect(&config)
            .await
            .unwrap()
            .collection("notes")
    }

    #[test]
    fn test_replace_without_match_is_not_found() {
        let missing = ReplaceOutcome {
            matched: 0,
            modified: 0,
            upserted_id: None,
        };
        assert!(matches!(missing.into_result(), Err(AppError::NotFound)));
    }

    #[test]
    fn test_replace_upsert_or_match_succeeds() {
        let upserted = ReplaceOutcome {
            matched: 0,
            modified: 0,
            upserted_id: Some(Bson::ObjectId(ObjectId::new())),
        };
        assert!(upserted.into_result().is_ok());

        let unchanged = ReplaceOutcome {
            matched: 1,
            modified: 0,
            upserted_id: None,
        };
        assert_eq!(unchanged.clone().into_result().unwrap(), unchanged);
    }

    #[test]
    fn test_inserted_ids_follow_input_order() {
        let inserted: HashMap<usize, Bson> = [(2, "c"), (0, "a"), (1, "b")]
            .into_iter()
            .map(|(index, id)| (index, Bson::String(id.to_string())))
            .collect();

        let ids = ordered_ids(inserted);
        assert_eq!(
            ids,
            vec![
                Bson::String("a".to_string()),
                Bson::String("b".to_string()),
                Bson::String("c".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_document_error() {
        let (logs, _guard) = LogCapture::install();
        let repo = unreachable().await;

        let err = repo
            .find(FindDocuments::new().filter(doc! { "title": "a" }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DOCUMENT_ERROR");

        let err = repo
            .delete(DeleteDocuments::new(doc! { "title": "a" }).many())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DOCUMENT_ERROR");

        let errors = logs.errors();
        assert!(errors.iter().any(|line| line.contains("Document find failed")));
        assert!(errors.iter().any(|line| line.contains("Document delete failed")));
    }

    #[tokio::test]
    async fn test_operation_timeout_wins_over_driver() {
        let repo = unreachable().await;
        let query = FindDocument::new()
            .timeout(Duration::from_millis(20))
            .unwrap();

        let err = repo.find_one(query).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(d) if d == Duration::from_millis(20)));
    }
}
