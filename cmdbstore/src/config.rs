use serde::Deserialize;

/// Connection settings for the CMDB.
///
/// The service sits behind a shared ingress, so requests carry a virtual
/// host header plus fixed `user`/`org` identification headers.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the CMDB, scheme included.
    pub endpoint: String,
    /// Value of the `host` virtual-host header.
    pub api_host: String,
    /// Organization header.
    pub org: String,
    /// Technical account header.
    pub user: String,
    /// Page size for `_search` walks.
    pub page_size: usize,
}

impl StoreConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_host: "app-resource.example.com".to_string(),
            org: "default".to_string(),
            user: "system_user".to_string(),
            page_size: 1000,
        }
    }
}
