//! Run orchestration: array discovery, per-array sequencing, stale cleanup.

use std::collections::{HashMap, HashSet};

use arrayfetcher::ArrayClient;
use cmdbstore::models::instance_id_of;
use cmdbstore::{CmdbClient, StoreConfig};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::collect::{ArraySync, TrackedNames};
use crate::objects;
use crate::relations;

/// Everything a sync run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub store: StoreConfig,
    /// Array management account.
    pub username: String,
    pub password: String,
    /// URL scheme for the array management endpoint (normally https).
    pub device_scheme: String,
    pub device_port: u16,
    /// When set, only the array with this management IP is collected.
    pub target_ip: Option<String>,
    /// Accept the self-signed certificates arrays ship with.
    pub accept_invalid_certs: bool,
}

impl RunConfig {
    fn array_base_url(&self, mgmt_ip: &str) -> String {
        format!("{}://{}:{}", self.device_scheme, mgmt_ip, self.device_port)
    }
}

/// Terminal state of one array's pass. Login failure is the only fatal
/// per-array condition; it never aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOutcome {
    Completed,
    FailedLogin,
    Skipped,
}

/// Aggregate result of a full run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: usize,
    pub failed_logins: usize,
    pub skipped: usize,
    pub stale_deleted: usize,
}

/// Processes every configured array start-to-finish, strictly sequentially,
/// then sweeps stale sink records.
pub async fn run_sync(config: &RunConfig) -> anyhow::Result<RunSummary> {
    let store = CmdbClient::new(config.store.clone())?;

    // Pre-run population snapshot, diffed against touched names at the end.
    let mut existing: HashMap<&'static str, Vec<Value>> = HashMap::new();
    for object_id in objects::TRACKED {
        let records = store
            .search(object_id, json!({"fields": {"name": true}}))
            .await;
        existing.insert(object_id, records);
    }

    let arrays = store
        .search(objects::DISK_ARRAY, array_query(config.target_ip.as_deref()))
        .await;
    info!("{} array(s) to process", arrays.len());

    let mut tracked = TrackedNames::default();
    let mut summary = RunSummary::default();
    let mut completed_prefixes = Vec::new();

    for array in &arrays {
        match process_array(config, &store, array, &mut tracked).await {
            ArrayOutcome::Completed => {
                summary.completed += 1;
                if let Some(name) = array.get("name").and_then(Value::as_str) {
                    completed_prefixes.push(format!("{name}_"));
                }
            }
            ArrayOutcome::FailedLogin => summary.failed_logins += 1,
            ArrayOutcome::Skipped => summary.skipped += 1,
        }
    }

    summary.stale_deleted =
        clean_stale_records(&store, &existing, &tracked, &completed_prefixes).await;

    info!(
        "run finished: {} completed, {} failed logins, {} skipped, {} stale records deleted",
        summary.completed, summary.failed_logins, summary.skipped, summary.stale_deleted
    );
    Ok(summary)
}

fn array_query(target_ip: Option<&str>) -> Value {
    match target_ip {
        Some(ip) => json!({"query": {"MgmtIP": {"$eq": ip}}}),
        None => json!({}),
    }
}

async fn process_array(
    config: &RunConfig,
    store: &CmdbClient,
    array: &Value,
    tracked: &mut TrackedNames,
) -> ArrayOutcome {
    let Some(mgmt_ip) = array.get("MgmtIP").and_then(Value::as_str) else {
        warn!("array record without MgmtIP skipped");
        return ArrayOutcome::Skipped;
    };
    let Some(instance_id) = instance_id_of(array) else {
        warn!("array record without instanceId skipped ({mgmt_ip})");
        return ArrayOutcome::Skipped;
    };
    let array_name = array
        .get("name")
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| format!("array-{mgmt_ip}"));

    info!("==== collecting {mgmt_ip} ====");
    let base_url = config.array_base_url(mgmt_ip);
    let source = match ArrayClient::login(
        &base_url,
        &config.username,
        &config.password,
        config.accept_invalid_certs,
    )
    .await
    {
        Ok(client) => client,
        Err(err) => {
            error!("login to {mgmt_ip} failed, skipping this array: {err}");
            return ArrayOutcome::FailedLogin;
        }
    };

    let mut sync = ArraySync::new(
        &source,
        store,
        array_name.clone(),
        array.get("instanceId").cloned().unwrap_or(Value::Null),
        tracked,
    );

    // Fixed order: pools feed the zone collector's pool counts, and the
    // array record's counters come from the collectors' outputs.
    let array_info = sync.collect_array_info(mgmt_ip).await;
    let hosts = sync.collect_hosts().await;
    let _host_groups = sync.collect_host_groups().await;
    let _lun_groups = sync.collect_lun_groups().await;
    let mapping_views = sync.collect_mapping_views().await;
    let _controllers = sync.collect_controllers().await;
    let (pools, pool_count) = sync.collect_storage_pools().await;
    let luns = sync.collect_luns().await;
    let disk_zones = sync.collect_disk_zones(&pool_count).await;
    let disks = sync.collect_disks().await;

    if let Some(mut info) = array_info {
        // Counter fields follow the sink schema: HostGroup carries the host
        // count and LunGroup the LUN count.
        merge(
            &mut info,
            json!({
                "HostGroup": hosts.len(),
                "LunGroup": luns.len(),
                "MapView": mapping_views.len(),
                "StorePool": pools.len(),
                "Domain": disk_zones.len(),
                "DiskQuantity": disks.len(),
            }),
        );
        store.update(objects::DISK_ARRAY, &instance_id, info).await;
    }

    relations::sync_relations(&source, store, &array_name).await;

    info!("==== {mgmt_ip} done ====");
    ArrayOutcome::Completed
}

/// Post-run set difference, restricted to arrays that completed collection:
/// records of an array whose login failed (or that was filtered out) must
/// survive untouched.
async fn clean_stale_records(
    store: &CmdbClient,
    existing: &HashMap<&'static str, Vec<Value>>,
    tracked: &TrackedNames,
    completed_prefixes: &[String],
) -> usize {
    if completed_prefixes.is_empty() {
        return 0;
    }

    let empty = HashSet::new();
    let mut deleted = 0;
    for object_id in objects::TRACKED {
        let Some(records) = existing.get(object_id) else {
            continue;
        };
        let candidates: Vec<Value> = records
            .iter()
            .filter(|record| {
                record
                    .get("name")
                    .and_then(Value::as_str)
                    .map(|name| {
                        completed_prefixes
                            .iter()
                            .any(|prefix| name.starts_with(prefix.as_str()))
                    })
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        if candidates.is_empty() {
            continue;
        }

        let valid = tracked.for_object(object_id).unwrap_or(&empty);
        deleted += store.clear_stale(&candidates, valid).await;
    }
    deleted
}

fn merge(target: &mut Value, extra: Value) {
    if let (Value::Object(target), Value::Object(extra)) = (target, extra) {
        target.extend(extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_query_filters_on_target_ip() {
        assert_eq!(array_query(None), json!({}));
        assert_eq!(
            array_query(Some("10.0.0.9")),
            json!({"query": {"MgmtIP": {"$eq": "10.0.0.9"}}})
        );
    }

    #[test]
    fn test_merge_extends_object_fields() {
        let mut info = json!({"name": "arr", "Model": "5500 V3"});
        merge(&mut info, json!({"Domain": 2}));
        assert_eq!(info["Model"], "5500 V3");
        assert_eq!(info["Domain"], 2);
    }
}
