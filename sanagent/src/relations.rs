//! Relation reconciliation passes.
//!
//! Each pass independently joins an owning-side collection against a
//! referenced-side name-to-instance-id map and rewrites the relation field on
//! the owning record. A join that resolves nothing skips the owning record:
//! a previously synced relation is never explicitly cleared, only
//! overwritten by a later non-empty join.

use std::collections::HashMap;

use arrayfetcher::fields::{id_field, str_field};
use arrayfetcher::{resources, ArrayClient};
use cmdbstore::models::instance_id_of;
use cmdbstore::CmdbClient;
use serde_json::{json, Value};
use tracing::info;

use crate::collect::UPSERT_KEYS;
use crate::naming;
use crate::objects;

/// Runs the seven reconciliation passes for one array, in order.
pub async fn sync_relations(source: &ArrayClient, store: &CmdbClient, array_name: &str) {
    info!("reconciling relations");
    host_group_members(source, store, array_name).await;
    array_hosts(store, array_name).await;
    disk_zone_disks(store, array_name).await;
    controller_luns(store, array_name).await;
    pool_luns(store, array_name).await;
    lun_group_members(source, store, array_name).await;
    mapping_view_groups(source, store, array_name).await;
}

/// Host-group membership comes from the source association endpoint keyed by
/// the group's source-local id, then resolves against sink host instances.
async fn host_group_members(source: &ArrayClient, store: &CmdbClient, array_name: &str) {
    let groups = source.resource_list(resources::HOST_GROUP).await;
    if groups.is_empty() {
        return;
    }

    let hosts = store
        .search(objects::HOST, json!({"fields": {"name": true}}))
        .await;
    let host_ids = name_id_map(&hosts);

    for group in &groups {
        let group_id = id_field(group, "ID");
        let members = source
            .resource_list(&resources::hosts_in_group(&group_id))
            .await;
        if members.is_empty() {
            continue;
        }

        let member_ids: Vec<Value> = members
            .iter()
            .filter_map(|member| {
                let name =
                    naming::instance_name(array_name, &str_field(member, "NAME", ""));
                host_ids.get(&name).cloned()
            })
            .collect();

        let group_name =
            naming::host_group_name(array_name, &str_field(group, "NAME", ""), &group_id);
        store
            .import(
                objects::HOST_GROUP,
                UPSERT_KEYS,
                vec![json!({
                    "name": group_name,
                    "_HOSTGROUP_HOST": member_ids,
                    "hostNum": member_ids.len(),
                })],
            )
            .await;
    }
}

/// Array-to-host is the one pass that goes through the sink's native
/// relation-append endpoint instead of a field rewrite.
async fn array_hosts(store: &CmdbClient, array_name: &str) {
    let arrays = store
        .search(
            objects::DISK_ARRAY,
            json!({"query": {"name": {"$eq": array_name}}}),
        )
        .await;
    let array_ids = ids_of(&arrays);
    if array_ids.is_empty() {
        return;
    }

    let hosts = store.search(objects::HOST, prefix_query(array_name)).await;
    let host_ids = ids_of(&hosts);
    if host_ids.is_empty() {
        return;
    }

    store
        .append_relation(objects::DISK_ARRAY, "_ARRAY_HOST", array_ids, host_ids)
        .await;
}

async fn disk_zone_disks(store: &CmdbClient, array_name: &str) {
    let zones = store
        .search(objects::DISK_ZONE, prefix_query(array_name))
        .await;
    for zone in &zones {
        let Some(zone_name) = zone.get("name").and_then(Value::as_str) else {
            continue;
        };
        if instance_id_of(zone).is_none() {
            continue;
        }

        let disks = store
            .search(
                objects::DISK,
                json!({"query": {"disk_diskzone": {"$eq": zone_name}}}),
            )
            .await;
        let disk_ids = ids_of(&disks);
        if disk_ids.is_empty() {
            continue;
        }

        store
            .import(
                objects::DISK_ZONE,
                UPSERT_KEYS,
                vec![json!({"name": zone_name, "DISK": disk_ids})],
            )
            .await;
    }
}

async fn controller_luns(store: &CmdbClient, array_name: &str) {
    let controllers = store
        .search(objects::CONTROLLER, prefix_query(array_name))
        .await;
    for controller in &controllers {
        let Some(controller_name) = controller.get("name").and_then(Value::as_str) else {
            continue;
        };
        if instance_id_of(controller).is_none() {
            continue;
        }

        let luns = store
            .search(
                objects::LUN,
                json!({"query": {"OWNINGCONTROLLER": {"$eq": controller_name}}}),
            )
            .await;
        let lun_ids = ids_of(&luns);
        if lun_ids.is_empty() {
            continue;
        }

        store
            .import(
                objects::CONTROLLER,
                UPSERT_KEYS,
                vec![json!({"name": controller_name, "LUN": lun_ids})],
            )
            .await;
    }
}

async fn pool_luns(store: &CmdbClient, array_name: &str) {
    let pools = store
        .search(objects::STORAGE_POOL, prefix_query(array_name))
        .await;
    for pool in &pools {
        let Some(pool_name) = pool.get("name").and_then(Value::as_str) else {
            continue;
        };
        if instance_id_of(pool).is_none() {
            continue;
        }

        let luns = store
            .search(
                objects::LUN,
                json!({"query": {"PARENTNAME": {"$eq": pool_name}}}),
            )
            .await;
        let lun_ids = ids_of(&luns);
        if lun_ids.is_empty() {
            continue;
        }

        store
            .import(
                objects::STORAGE_POOL,
                UPSERT_KEYS,
                vec![json!({
                    "name": pool_name,
                    "LUN": lun_ids,
                    "LunNum": lun_ids.len(),
                })],
            )
            .await;
    }
}

async fn lun_group_members(source: &ArrayClient, store: &CmdbClient, array_name: &str) {
    let groups = source.resource_list(&resources::lun_groups()).await;
    if groups.is_empty() {
        return;
    }

    let luns = store
        .search(objects::LUN, json!({"fields": {"name": true}}))
        .await;
    let lun_ids = name_id_map(&luns);

    for group in &groups {
        let group_id = id_field(group, "ID");
        let members = source
            .resource_list(&resources::luns_in_group(&group_id))
            .await;
        if members.is_empty() {
            continue;
        }

        let member_ids: Vec<Value> = members
            .iter()
            .filter_map(|member| {
                let name =
                    naming::instance_name(array_name, &str_field(member, "NAME", ""));
                lun_ids.get(&name).cloned()
            })
            .collect();

        let group_name =
            naming::instance_name(array_name, &str_field(group, "NAME", ""));
        store
            .import(
                objects::LUN_GROUP,
                UPSERT_KEYS,
                vec![json!({
                    "name": group_name,
                    "LUNGROUP_LUN": member_ids,
                    "LunNum": member_ids.len(),
                })],
            )
            .await;
    }
}

/// Mapping views resolve host groups through the shifted association id
/// (see [`resources::view_host_association_id`]) with a case-insensitive
/// prefix match, and LUN groups by exact name equality.
async fn mapping_view_groups(source: &ArrayClient, store: &CmdbClient, array_name: &str) {
    let views = source.resource_list(resources::MAPPING_VIEW).await;
    if views.is_empty() {
        return;
    }

    let host_groups = store.search(objects::HOST_GROUP, json!({})).await;
    let host_group_ids = name_id_map(&host_groups);
    let lun_groups = store.search(objects::LUN_GROUP, json!({})).await;
    let lun_group_ids = name_id_map(&lun_groups);

    for view in &views {
        let view_id = id_field(view, "ID");
        let view_name = naming::instance_name(array_name, &str_field(view, "NAME", ""));

        let adjusted = resources::view_host_association_id(&view_id);
        let associated = source
            .resource_list(&resources::hosts_in_group(&adjusted))
            .await;

        let mut group_ids = Vec::new();
        for record in &associated {
            let prefix = naming::host_group_prefix(array_name, &str_field(record, "NAME", ""))
                .to_uppercase();
            for (name, id) in &host_group_ids {
                if name.to_uppercase().contains(&prefix) {
                    group_ids.push(id.clone());
                }
            }
        }

        let lun_group_matches: Vec<Value> = lun_group_ids
            .iter()
            .filter(|(name, _)| **name == view_name)
            .map(|(_, id)| id.clone())
            .collect();

        if group_ids.is_empty() && lun_group_matches.is_empty() {
            continue;
        }

        store
            .import(
                objects::MAPPING_VIEW,
                UPSERT_KEYS,
                vec![json!({
                    "name": view_name,
                    "_mapp_hostGroup": group_ids,
                    "_mapp_lunGroup": lun_group_matches,
                })],
            )
            .await;
    }
}

fn name_id_map(records: &[Value]) -> HashMap<String, Value> {
    records
        .iter()
        .filter_map(|record| {
            let name = record.get("name")?.as_str()?.to_string();
            let id = record.get("instanceId")?.clone();
            Some((name, id))
        })
        .collect()
}

fn ids_of(records: &[Value]) -> Vec<Value> {
    records
        .iter()
        .filter_map(|record| record.get("instanceId").cloned())
        .filter(|id| !id.is_null())
        .collect()
}

fn prefix_query(array_name: &str) -> Value {
    json!({"query": {"name": {"$like": format!("{array_name}_%")}}})
}
