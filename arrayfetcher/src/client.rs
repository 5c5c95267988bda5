//! Authenticated HTTP session against one array's management endpoint.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::error::{FetchError, Result};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(15);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// A logged-in management session.
///
/// All reads go through [`ArrayClient::resource_list`], which normalizes
/// every failure mode to an empty list; callers cannot (and must not)
/// distinguish "no data" from "fetch failed".
#[derive(Debug)]
pub struct ArrayClient {
    http: reqwest::Client,
    base_url: String,
    device_id: String,
    token: String,
}

impl ArrayClient {
    /// Logs in and returns a live session.
    ///
    /// Fails unless the response carries both a device identifier and a
    /// session token. The session cookie is retained by the client's cookie
    /// store; the token rides along as a header on every subsequent call.
    /// Arrays ship with self-signed certificates, so TLS verification can be
    /// switched off explicitly.
    pub async fn login(
        base_url: &str,
        username: &str,
        password: &str,
        accept_invalid_certs: bool,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        let url = format!("{base_url}/deviceManager/rest/xxxxx/sessions");
        let body = json!({
            "username": username,
            "password": password,
            "scope": "0",
        });

        let response = http
            .post(&url)
            .timeout(LOGIN_TIMEOUT)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let envelope: Value = response.json().await?;
        let data = envelope.get("data").cloned().unwrap_or(Value::Null);
        let device_id = data.get("deviceid").and_then(Value::as_str);
        let token = data.get("iBaseToken").and_then(Value::as_str);

        let (Some(device_id), Some(token)) = (device_id, token) else {
            return Err(FetchError::Login(
                "response missing deviceid or iBaseToken".to_string(),
            ));
        };

        info!("array session established (device {device_id})");
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            device_id: device_id.to_string(),
            token: token.to_string(),
        })
    }

    /// The device identifier issued at login.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Fetches a resource, normalizing every failure to an empty list.
    ///
    /// A `data` object (the `system/` resource answers with one) comes back
    /// as a one-element list.
    #[instrument(skip(self))]
    pub async fn resource_list(&self, resource: &str) -> Vec<Value> {
        match self.try_fetch(resource).await {
            Ok(records) => records,
            Err(err) => {
                warn!("fetch of {resource} failed: {err}");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, resource: &str) -> Result<Vec<Value>> {
        let url = format!(
            "{}/deviceManager/rest/{}/{}",
            self.base_url, self.device_id, resource
        );
        debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .header("iBaseToken", &self.token)
            .header("Content-Type", "application/json")
            .timeout(READ_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        Ok(match body.get("data") {
            Some(Value::Array(items)) => items.clone(),
            Some(data @ Value::Object(_)) => vec![data.clone()],
            _ => Vec::new(),
        })
    }
}
