//! Model catalog synchronization
//!
//! Reconciles local language-model records against an upstream
//! OpenAI-compatible listing: insert-or-reuse for entries present upstream,
//! soft-delete for live local records absent from the latest listing. A
//! failure mid-loop leaves earlier writes committed; there is no rollback.

use bson::{doc, Document};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::db::schemas::LlmDoc;
use crate::db::Database;
use crate::types::{AgoraError, Result};

/// One model as listed by the upstream catalog
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogModel {
    pub id: String,
    #[serde(default)]
    pub owned_by: String,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<CatalogModel>,
}

/// What one synchronization run did
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    /// Models the upstream listing reported
    pub discovered: usize,
    /// New records created
    pub inserted: usize,
    /// Records that already existed live for their identity tuple
    pub retained: usize,
    /// Soft-deleted records flipped back live because the listing has them again
    pub revived: usize,
    /// Live local records soft-deleted because the listing no longer has them
    pub deactivated: u64,
}

/// HTTP client for the upstream model catalog
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CatalogClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AgoraError::Http(format!("Failed to build catalog client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Credential the records are synced under; empty when none configured
    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }

    /// Fetch the upstream listing (`GET {base_url}/models`)
    pub async fn list_models(&self) -> Result<Vec<CatalogModel>> {
        let mut request = self.http.get(format!("{}/models", self.base_url));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgoraError::Http(format!("Catalog request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AgoraError::Http(format!(
                "Catalog returned {}",
                response.status()
            )));
        }

        let listing: ModelList = response
            .json()
            .await
            .map_err(|e| AgoraError::Http(format!("Invalid catalog response: {}", e)))?;

        Ok(listing.data)
    }
}

/// Identity filter for one record: the full (model_name, provider,
/// api_key, base_url) tuple
fn llm_identity_filter(model: &CatalogModel, api_key: &str, base_url: &str) -> Document {
    doc! {
        "model_name": model.id.as_str(),
        "provider": model.owned_by.as_str(),
        "api_key": api_key,
        "base_url": base_url,
    }
}

/// Filter selecting live records whose model name is absent from the
/// latest upstream listing
fn stale_models_filter(latest_names: &[String]) -> Document {
    doc! { "model_name": { "$nin": latest_names } }
}

/// Reconcile local records against the upstream catalog
pub async fn sync_catalog(db: &Database, client: &CatalogClient) -> Result<SyncReport> {
    let models = client.list_models().await?;

    let mut report = SyncReport {
        discovered: models.len(),
        ..SyncReport::default()
    };

    for model in &models {
        // Raw lookup: a soft-deleted record still owns its identity tuple
        // under the unique index and must be revived, not re-inserted
        let filter = llm_identity_filter(model, client.api_key(), client.base_url());
        match db.llms.find_one_raw(filter.clone()).await? {
            Some(existing) if existing.metadata.is_deleted => {
                db.llms
                    .inner()
                    .update_one(
                        filter,
                        doc! {
                            "$set": {
                                "metadata.is_deleted": false,
                                "metadata.updated_at": bson::DateTime::now(),
                            },
                            "$unset": { "metadata.deleted_at": "" },
                        },
                    )
                    .await
                    .map_err(|e| AgoraError::Database(format!("Update failed: {}", e)))?;
                debug!("Catalog sync revived model {}", model.id);
                report.revived += 1;
            }
            Some(_) => {
                report.retained += 1;
            }
            None => {
                let mut record = LlmDoc::new(
                    model.id.clone(),
                    model.owned_by.clone(),
                    client.api_key().to_string(),
                    client.base_url().to_string(),
                );
                db.llms.insert_one(&mut record).await?;
                debug!("Catalog sync inserted model {}", model.id);
                report.inserted += 1;
            }
        }
    }

    // The sole permitted mutation on llm records: the soft-delete toggle
    let latest_names: Vec<String> = models.iter().map(|m| m.id.clone()).collect();
    report.deactivated = db
        .llms
        .update_many(
            stale_models_filter(&latest_names),
            doc! {
                "metadata.is_deleted": true,
                "metadata.deleted_at": bson::DateTime::now(),
            },
        )
        .await?;

    info!(
        "Catalog sync: {} discovered, {} inserted, {} retained, {} revived, {} deactivated",
        report.discovered, report.inserted, report.retained, report.revived, report.deactivated
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_parses_openai_shape() {
        let raw = r#"{
            "object": "list",
            "data": [
                { "id": "gpt-4", "object": "model", "owned_by": "openai" },
                { "id": "gpt-3.5-turbo", "object": "model" }
            ]
        }"#;
        let listing: ModelList = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.data.len(), 2);
        assert_eq!(listing.data[0].owned_by, "openai");
        // owned_by may be absent upstream
        assert_eq!(listing.data[1].owned_by, "");
    }

    #[test]
    fn test_identity_filter_uses_full_tuple() {
        let model = CatalogModel {
            id: "gpt-4".to_string(),
            owned_by: "openai".to_string(),
        };
        let filter = llm_identity_filter(&model, "sk-key", "https://api.openai.com/v1");
        assert_eq!(filter.get_str("model_name").unwrap(), "gpt-4");
        assert_eq!(filter.get_str("provider").unwrap(), "openai");
        assert_eq!(filter.get_str("api_key").unwrap(), "sk-key");
        assert_eq!(filter.get_str("base_url").unwrap(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_stale_filter_excludes_latest_names() {
        let latest = vec!["gpt-4".to_string(), "gpt-3.5-turbo".to_string()];
        let filter = stale_models_filter(&latest);
        let excluded = filter
            .get_document("model_name")
            .unwrap()
            .get_array("$nin")
            .unwrap();
        assert_eq!(excluded.len(), 2);
    }

    #[test]
    fn test_client_normalizes_base_url() {
        let client = CatalogClient::new("https://api.openai.com/v1/", None).unwrap();
        assert_eq!(client.base_url(), "https://api.openai.com/v1");
        assert_eq!(client.api_key(), "");
    }
}
