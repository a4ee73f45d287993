//! MongoDB client and collection wrapper
//!
//! Generic document layer shared by every entity: soft-delete filtering,
//! timestamp stamping, and single-document CRUD. Retries are the driver's
//! concern; this layer logs store failures once and surfaces them unchanged.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::{options::IndexOptions, Client, Collection, IndexModel};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::{AgoraError, Result};

/// Largest page a single list call may return
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// Restrict a filter to live documents.
///
/// Single shared predicate for the soft-delete invariant; read paths must
/// go through this rather than repeating the clause.
pub fn live_filter(mut filter: Document) -> Document {
    filter.insert("metadata.is_deleted", doc! { "$ne": true });
    filter
}

/// Parse an id string into an ObjectId, failing validation on bad format
pub fn parse_object_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id)
        .map_err(|_| AgoraError::Validation(format!("invalid document id: {}", id)))
}

/// Page bounds shared by every list call, checked before any store call
pub fn validate_page_bounds(skip: i64, limit: i64) -> Result<()> {
    if skip < 0 {
        return Err(AgoraError::Validation("skip must be non-negative".into()));
    }
    if limit <= 0 {
        return Err(AgoraError::Validation("limit must be positive".into()));
    }
    if limit > MAX_PAGE_LIMIT {
        return Err(AgoraError::Validation(format!(
            "limit cannot exceed {}",
            MAX_PAGE_LIMIT
        )));
    }
    Ok(())
}

/// Stamp an update document with a fresh `updated_at`
fn with_updated_at(mut set: Document) -> Document {
    set.insert("metadata.updated_at", DateTime::now());
    set
}

/// The `$set` document that soft-deletes a live record
fn soft_delete_set() -> Document {
    doc! {
        "metadata.is_deleted": true,
        "metadata.deleted_at": DateTime::now(),
        "metadata.updated_at": DateTime::now(),
    }
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| AgoraError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        // Verify connection with timeout
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AgoraError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection, applying its schema indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
    name: String,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(client: &Client, db_name: &str, collection_name: &str) -> Result<Self> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection {
            inner: collection,
            name: collection_name.to_string(),
        };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<()> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner.create_indexes(indices).await.map_err(|e| {
            AgoraError::Database(format!(
                "Failed to create indexes on {}: {}",
                self.name, e
            ))
        })?;

        Ok(())
    }

    /// Insert a document, stamping fresh metadata, and return its id
    pub async fn insert_one(&self, item: &mut T) -> Result<ObjectId> {
        let metadata = item.mut_metadata();
        metadata.is_deleted = false;
        metadata.deleted_at = None;
        metadata.created_at = Some(DateTime::now());
        metadata.updated_at = Some(DateTime::now());

        let result = self.inner.insert_one(&*item).await.map_err(|e| {
            error!("Insert into {} failed: {}", self.name, e);
            AgoraError::Database(format!("Insert failed: {}", e))
        })?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AgoraError::Database("Failed to get inserted ID".into()))
    }

    /// Find the live document with the given id.
    ///
    /// Absence (missing or soft-deleted) is `Ok(None)`, not an error; a
    /// malformed id fails validation instead.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        let oid = parse_object_id(id)?;
        self.find_one(doc! { "_id": oid }).await
    }

    /// Find one live document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        self.inner
            .find_one(live_filter(filter))
            .await
            .map_err(|e| {
                error!("Find in {} failed: {}", self.name, e);
                AgoraError::Database(format!("Find failed: {}", e))
            })
    }

    /// Targeted lookup without the liveness predicate.
    ///
    /// The only read path that can see soft-deleted documents.
    pub async fn find_one_raw(&self, filter: Document) -> Result<Option<T>> {
        self.inner.find_one(filter).await.map_err(|e| {
            error!("Find in {} failed: {}", self.name, e);
            AgoraError::Database(format!("Find failed: {}", e))
        })
    }

    /// List a live-only page of matches
    pub async fn find_many(&self, filter: Document, skip: i64, limit: i64) -> Result<Vec<T>> {
        use futures_util::StreamExt;

        validate_page_bounds(skip, limit)?;

        let cursor = self
            .inner
            .find(live_filter(filter))
            .skip(skip as u64)
            .limit(limit)
            .await
            .map_err(|e| {
                error!("Find in {} failed: {}", self.name, e);
                AgoraError::Database(format!("Find failed: {}", e))
            })?;

        let results: Vec<T> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(results)
    }

    /// Count live matches, for pagination metadata
    pub async fn count(&self, filter: Document) -> Result<u64> {
        self.inner
            .count_documents(live_filter(filter))
            .await
            .map_err(|e| {
                error!("Count in {} failed: {}", self.name, e);
                AgoraError::Database(format!("Count failed: {}", e))
            })
    }

    /// Merge fields into the live document with the given id.
    ///
    /// Returns whether anything was modified; a selector matching nothing
    /// live yields `Ok(false)`.
    pub async fn update_by_id(&self, id: &str, set: Document) -> Result<bool> {
        let oid = parse_object_id(id)?;
        self.update_by_filter(doc! { "_id": oid }, set).await
    }

    /// Merge fields into the first live document matching the filter
    pub async fn update_by_filter(&self, filter: Document, set: Document) -> Result<bool> {
        let result = self
            .inner
            .update_one(live_filter(filter), doc! { "$set": with_updated_at(set) })
            .await
            .map_err(|e| {
                error!("Update in {} failed: {}", self.name, e);
                AgoraError::Database(format!("Update failed: {}", e))
            })?;

        Ok(result.modified_count > 0)
    }

    /// Merge fields into every live document matching the filter,
    /// returning the modified count
    pub async fn update_many(&self, filter: Document, set: Document) -> Result<u64> {
        let result = self
            .inner
            .update_many(live_filter(filter), doc! { "$set": with_updated_at(set) })
            .await
            .map_err(|e| {
                error!("Update in {} failed: {}", self.name, e);
                AgoraError::Database(format!("Update failed: {}", e))
            })?;

        Ok(result.modified_count)
    }

    /// Soft-delete the live document with the given id.
    ///
    /// Returns whether a live document was found and flipped; deleting an
    /// already-deleted document returns `Ok(false)`. Never removes data.
    pub async fn soft_delete(&self, id: &str) -> Result<bool> {
        let oid = parse_object_id(id)?;
        let result = self
            .inner
            .update_one(
                live_filter(doc! { "_id": oid }),
                doc! { "$set": soft_delete_set() },
            )
            .await
            .map_err(|e| {
                error!("Delete in {} failed: {}", self.name, e);
                AgoraError::Database(format!("Delete failed: {}", e))
            })?;

        Ok(result.modified_count > 0)
    }

    /// Get the underlying collection for advanced operations
    pub fn inner(&self) -> &Collection<T> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_filter_adds_predicate() {
        let filter = live_filter(doc! { "name": "socrates" });
        assert_eq!(filter.get_str("name").unwrap(), "socrates");
        assert_eq!(
            filter.get_document("metadata.is_deleted").unwrap(),
            &doc! { "$ne": true }
        );
    }

    #[test]
    fn test_live_filter_on_empty() {
        let filter = live_filter(Document::new());
        assert!(filter.contains_key("metadata.is_deleted"));
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn test_parse_object_id() {
        let oid = ObjectId::new();
        assert_eq!(parse_object_id(&oid.to_hex()).unwrap(), oid);

        assert!(matches!(
            parse_object_id("not-an-id"),
            Err(AgoraError::Validation(_))
        ));
        assert!(matches!(parse_object_id(""), Err(AgoraError::Validation(_))));
    }

    #[test]
    fn test_page_bounds() {
        assert!(validate_page_bounds(0, 1).is_ok());
        assert!(validate_page_bounds(500, 1000).is_ok());

        assert!(matches!(
            validate_page_bounds(-1, 100),
            Err(AgoraError::Validation(_))
        ));
        assert!(matches!(
            validate_page_bounds(0, 0),
            Err(AgoraError::Validation(_))
        ));
        assert!(matches!(
            validate_page_bounds(0, 1001),
            Err(AgoraError::Validation(_))
        ));
        assert!(matches!(
            validate_page_bounds(0, -5),
            Err(AgoraError::Validation(_))
        ));
    }

    #[test]
    fn test_update_stamps_updated_at() {
        let set = with_updated_at(doc! { "name": "renamed" });
        assert!(set.contains_key("metadata.updated_at"));
        assert_eq!(set.get_str("name").unwrap(), "renamed");
    }

    #[test]
    fn test_soft_delete_set_shape() {
        let set = soft_delete_set();
        assert_eq!(set.get_bool("metadata.is_deleted").unwrap(), true);
        assert!(set.contains_key("metadata.deleted_at"));
        assert!(set.contains_key("metadata.updated_at"));
    }
}
