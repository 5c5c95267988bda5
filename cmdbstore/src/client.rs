//! HTTP client for the CMDB object API.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::models::{Envelope, InstanceRef};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client over the CMDB's `/object/{type}` instance and relation API.
///
/// The write operations normalize failures to `None` after logging them:
/// the sync run keeps going on degraded data rather than aborting, and
/// callers treat a protocol rejection exactly like a transport failure.
pub struct CmdbClient {
    http: reqwest::Client,
    config: StoreConfig,
}

impl CmdbClient {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    /// Single request core: envelope-checked, non-zero business code is an
    /// error like any other.
    async fn request(&self, method: Method, api_path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}{}", self.config.endpoint, api_path);
        let mut request = self
            .http
            .request(method, &url)
            .header("host", &self.config.api_host)
            .header("content-type", "application/json")
            .header("user", &self.config.user)
            .header("org", &self.config.org);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?.error_for_status()?;
        let envelope = Envelope::from_value(response.json().await?);
        if envelope.code != 0 {
            return Err(StoreError::Api {
                code: envelope.code,
                message: envelope.message.unwrap_or_default(),
            });
        }
        Ok(envelope.data)
    }

    /// Pages through `_search` results and concatenates them in source
    /// order. A failed page ends the walk and whatever was already fetched
    /// is returned.
    #[instrument(skip(self, query))]
    pub async fn search(&self, object_id: &str, query: Value) -> Vec<Value> {
        let api_path = format!("/object/{object_id}/instance/_search");
        let mut results = Vec::new();
        let mut page = 1u64;

        loop {
            let mut body = match &query {
                Value::Object(map) => map.clone(),
                _ => Map::new(),
            };
            body.insert("page".to_string(), json!(page));
            body.insert("page_size".to_string(), json!(self.config.page_size));

            let data = match self
                .request(Method::POST, &api_path, Some(&Value::Object(body)))
                .await
            {
                Ok(data) => data,
                Err(err) => {
                    warn!("search of {object_id} page {page} failed: {err}");
                    break;
                }
            };

            let Some(list) = data.get("list").and_then(Value::as_array) else {
                break;
            };
            if list.is_empty() {
                break;
            }
            results.extend(list.iter().cloned());
            if list.len() < self.config.page_size {
                break;
            }
            page += 1;
        }

        debug!("search of {object_id} returned {} records", results.len());
        results
    }

    /// Upserts a batch keyed on `key_fields` (always `name` in this system).
    pub async fn import(
        &self,
        object_id: &str,
        key_fields: &[&str],
        datas: Vec<Value>,
    ) -> Option<Value> {
        let api_path = format!("/object/{object_id}/instance/_import");
        let body = json!({"keys": key_fields, "datas": datas});
        self.logged(
            self.request(Method::POST, &api_path, Some(&body)).await,
            "import",
            object_id,
        )
    }

    /// Partial field update on one instance.
    pub async fn update(&self, object_id: &str, instance_id: &str, fields: Value) -> Option<Value> {
        let api_path = format!("/object/{object_id}/instance/{instance_id}");
        self.logged(
            self.request(Method::PUT, &api_path, Some(&fields)).await,
            "update",
            object_id,
        )
    }

    pub async fn delete(&self, object_id: &str, instance_id: &str) -> Option<Value> {
        let api_path = format!("/object/{object_id}/instance/{instance_id}");
        self.logged(
            self.request(Method::DELETE, &api_path, None).await,
            "delete",
            object_id,
        )
    }

    /// Appends a relation between existing instances on both sides.
    pub async fn append_relation(
        &self,
        object_id: &str,
        relation: &str,
        instance_ids: Vec<Value>,
        related_instance_ids: Vec<Value>,
    ) -> Option<Value> {
        let api_path = format!("/object/{object_id}/relation/{relation}/append");
        let body = json!({
            "instance_ids": instance_ids,
            "related_instance_ids": related_instance_ids,
        });
        self.logged(
            self.request(Method::POST, &api_path, Some(&body)).await,
            "relation append",
            object_id,
        )
    }

    /// Deletes pre-run records whose name was not touched this run.
    ///
    /// Records missing any identity field cannot be addressed and are
    /// skipped with a warning. Returns the number of confirmed deletions.
    pub async fn clear_stale(&self, existing: &[Value], valid_names: &HashSet<String>) -> usize {
        let mut deleted = 0;
        for record in existing {
            let Some(instance) = InstanceRef::from_record(record) else {
                warn!("incomplete instance record skipped during cleanup: {record}");
                continue;
            };
            if valid_names.contains(&instance.name) {
                continue;
            }
            info!(
                "deleting stale instance {} -> {}",
                instance.object_id, instance.name
            );
            if self
                .delete(&instance.object_id, &instance.instance_id)
                .await
                .is_some()
            {
                deleted += 1;
            }
        }
        deleted
    }

    fn logged(&self, result: Result<Value>, operation: &str, object_id: &str) -> Option<Value> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("{operation} on {object_id} failed: {err}");
                None
            }
        }
    }
}
