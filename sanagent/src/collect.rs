//! Entity collectors: fetch raw vendor records, translate, upsert.
//!
//! Every collector follows the same contract: fetch the raw list, synthesize
//! the composite name per record, translate coded fields, accumulate one
//! batch and upsert it with a single import call. An empty raw list performs
//! no import and returns empty; the orchestrator degrades instead of
//! aborting.

use std::collections::{HashMap, HashSet};

use arrayfetcher::capacity::{format_capacity, CapacityUnit};
use arrayfetcher::fields::{id_field, int_field, raw_field, str_field};
use arrayfetcher::{codes, resources, ArrayClient};
use chrono::Local;
use cmdbstore::CmdbClient;
use serde_json::{json, Value};
use tracing::info;

use crate::naming;
use crate::objects;

/// Upsert key set used for every entity batch.
pub const UPSERT_KEYS: &[&str] = &["name"];

/// Sector size assumed for pool and disk-zone counters; the `system/`
/// resource reports the real value, the per-pool resources do not.
const DEFAULT_SECTOR_SIZE: i64 = 512;

/// Composite names touched this run, per sink object type; the post-run
/// cleanup diffs these against the pre-run population.
#[derive(Debug, Default)]
pub struct TrackedNames {
    names: HashMap<&'static str, HashSet<String>>,
}

impl TrackedNames {
    pub fn track(&mut self, object_id: &'static str, name: String) {
        self.names.entry(object_id).or_default().insert(name);
    }

    pub fn for_object(&self, object_id: &str) -> Option<&HashSet<String>> {
        self.names.get(object_id)
    }
}

/// One array's collection pass: the source session, the sink handle and the
/// run-scoped bookkeeping.
pub struct ArraySync<'a> {
    source: &'a ArrayClient,
    store: &'a CmdbClient,
    array_name: String,
    array_instance_id: Value,
    stamp: String,
    tracked: &'a mut TrackedNames,
}

impl<'a> ArraySync<'a> {
    pub fn new(
        source: &'a ArrayClient,
        store: &'a CmdbClient,
        array_name: String,
        array_instance_id: Value,
        tracked: &'a mut TrackedNames,
    ) -> Self {
        Self {
            source,
            store,
            array_name,
            array_instance_id,
            stamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            tracked,
        }
    }

    /// Reads the `system/` resource into the array record's base fields.
    ///
    /// `None` when the resource cannot be read; the orchestrator then skips
    /// the array-record update but still runs the remaining collectors.
    pub async fn collect_array_info(&self, mgmt_ip: &str) -> Option<Value> {
        info!("collecting array base info");
        let records = self.source.resource_list(resources::SYSTEM).await;
        let system = records.first()?;
        let sector_size = int_field(system, "SECTORSIZE", DEFAULT_SECTOR_SIZE);

        Some(json!({
            "name": str_field(system, "NAME", "unknown_array"),
            "OSVersion": str_field(system, "PRODUCTVERSION", ""),
            "MgmtIP": mgmt_ip,
            "SN": str_field(system, "ID", ""),
            "CacheSize": raw_field(system, "CACHEWRITEQUOTA", json!(0)),
            "Model": codes::product_model(&str_field(system, "PRODUCTMODE", "")),
            "Allocated": tb_string(system, "STORAGEPOOLUSEDCAPACITY", sector_size),
            "Total": tb_string(system, "TOTALCAPACITY", sector_size),
            "UsedCapacity": tb_string(system, "USEDCAPACITY", sector_size),
            "openReservedCapacity": tb_string(system, "userFreeCapacity", sector_size),
            "wwnInfo": str_field(system, "wwn", ""),
            "updateTime": self.stamp,
        }))
    }

    /// Hosts, with their FC initiator WWNs inlined per record.
    pub async fn collect_hosts(&mut self) -> Vec<Value> {
        info!("collecting hosts");
        let raw = self.source.resource_list(resources::HOST).await;
        let mut batch = Vec::with_capacity(raw.len());

        for host in &raw {
            let host_name = str_field(host, "NAME", "");
            let full_name = naming::instance_name(&self.array_name, &host_name);
            self.tracked.track(objects::HOST, full_name.clone());

            let host_id = id_field(host, "ID");
            let initiators = self
                .source
                .resource_list(&resources::fc_initiators(&host_id))
                .await;
            let wwns: Vec<Value> = initiators
                .iter()
                .map(|item| {
                    json!({
                        "wwn": id_field(item, "ID"),
                        "parentName": str_field(item, "PARENTNAME", ""),
                    })
                })
                .collect();

            batch.push(json!({
                "name": full_name,
                "hostname": host_name,
                "ip": str_field(host, "IP", ""),
                "location": str_field(host, "LOCATION", ""),
                "model": str_field(host, "MODEL", ""),
                "description": str_field(host, "DESCRIPTION", ""),
                "networkname": str_field(host, "NETWORKNAME", ""),
                "isadd2hostgroup": raw_field(host, "ISADD2HOSTGROUP", json!(0)),
                "operationsystem": codes::operating_system(&str_field(host, "OPERATIONSYSTEM", "")),
                "initiatornun": raw_field(host, "INITIATORNUM", json!(0)),
                "HostWwn": wwns,
                "cTime": self.stamp,
            }));
        }

        self.upsert(objects::HOST, batch).await
    }

    pub async fn collect_host_groups(&mut self) -> Vec<Value> {
        info!("collecting host groups");
        let raw = self.source.resource_list(resources::HOST_GROUP).await;
        let mut batch = Vec::with_capacity(raw.len());

        for group in &raw {
            let group_name = str_field(group, "NAME", "");
            let group_id = id_field(group, "ID");
            let full_name = naming::host_group_name(&self.array_name, &group_name, &group_id);
            self.tracked.track(objects::HOST_GROUP, full_name.clone());

            batch.push(json!({
                "name": full_name,
                "groupName": group_name,
                "groupId": group_id,
                "type": raw_field(group, "TYPE", json!("")),
                "description": str_field(group, "DESCRIPTION", ""),
                "isadd2mapingview": raw_field(group, "ISADD2MAPPINGVIEW", json!(0)),
                "cTime": self.stamp,
            }));
        }

        self.upsert(objects::HOST_GROUP, batch).await
    }

    pub async fn collect_lun_groups(&mut self) -> Vec<Value> {
        info!("collecting LUN groups");
        let raw = self.source.resource_list(&resources::lun_groups()).await;
        let mut batch = Vec::with_capacity(raw.len());

        for group in &raw {
            let group_name = str_field(group, "NAME", "");
            batch.push(json!({
                "name": naming::instance_name(&self.array_name, &group_name),
                "groupName": group_name,
                "id": raw_field(group, "ID", json!("")),
                "discription": str_field(group, "DESCRIPTION", ""),
                "app_type": codes::application_type(&str_field(group, "APPTYPE", "0")),
                "capcity": raw_field(group, "CAPCITY", json!(0)),
                "cTime": self.stamp,
            }));
        }

        self.upsert(objects::LUN_GROUP, batch).await
    }

    pub async fn collect_mapping_views(&mut self) -> Vec<Value> {
        info!("collecting mapping views");
        let raw = self.source.resource_list(resources::MAPPING_VIEW).await;
        let mut batch = Vec::with_capacity(raw.len());

        for view in &raw {
            let full_name =
                naming::instance_name(&self.array_name, &str_field(view, "NAME", ""));
            batch.push(json!({
                "name": full_name,
                "viewName": full_name,
                "id": raw_field(view, "ID", json!("")),
                "updateTime": self.stamp,
                "description": str_field(view, "DESCRIPTION", ""),
            }));
        }

        self.upsert(objects::MAPPING_VIEW, batch).await
    }

    pub async fn collect_controllers(&mut self) -> Vec<Value> {
        info!("collecting controllers");
        let raw = self.source.resource_list(resources::CONTROLLER).await;
        let mut batch = Vec::with_capacity(raw.len());

        for controller in &raw {
            let controller_id = id_field(controller, "ID");
            let full_name = naming::instance_name(&self.array_name, &controller_id);
            self.tracked.track(objects::CONTROLLER, full_name.clone());

            batch.push(json!({
                "name": full_name,
                "SOFTWARE_VERSION": str_field(controller, "SOFTVER", ""),
                "HEALTH_STATUS": codes::health_status(&str_field(controller, "HEALTHSTATUS", "0")),
                "RUNNING_STATE": codes::running_status(&str_field(controller, "RUNNINGSTATUS", "0")),
                "LOCATION": str_field(controller, "LOCATION", ""),
                "ROLE": codes::controller_role(&str_field(controller, "ROLE", "0")),
                "BMCVER": str_field(controller, "BMCVER", ""),
                "CACHE": raw_field(controller, "MEMORYSIZE", json!(0)),
                "BIOSVER": str_field(controller, "BIOSVER", ""),
                "LOGICVER": str_field(controller, "LOGICVER", ""),
                "CPUINFO": str_field(controller, "CPUINFO", ""),
                "DISK_ARRAY": [self.array_instance_id],
                "cTime": self.stamp,
            }));
        }

        self.upsert(objects::CONTROLLER, batch).await
    }

    /// Storage pools; also yields the per-disk-zone pool count map consumed by
    /// [`ArraySync::collect_disk_zones`].
    pub async fn collect_storage_pools(&mut self) -> (Vec<Value>, HashMap<String, i64>) {
        info!("collecting storage pools");
        let raw = self.source.resource_list(resources::STORAGE_POOL).await;
        let mut batch = Vec::with_capacity(raw.len());
        let mut pool_count: HashMap<String, i64> = HashMap::new();

        for pool in &raw {
            let pool_name = str_field(pool, "NAME", "");
            let full_name = naming::instance_name(&self.array_name, &pool_name);
            self.tracked.track(objects::STORAGE_POOL, full_name.clone());

            let mut raid_summary = String::new();
            for key in ["TIER0RAIDLV", "TIER1RAIDLV", "TIER2RAIDLV"] {
                if let Some(raid) = codes::raid_level(&str_field(pool, key, "")) {
                    raid_summary.push_str(raid);
                }
            }

            let mut media_summary = String::new();
            for (tier, key) in [
                (0u8, "Tier0DISKTYPE"),
                (1, "Tier1DISKTYPE"),
                (2, "Tier2DISKTYPE"),
            ] {
                if let Some(medium) = codes::tier_disk_type(tier, &str_field(pool, key, "")) {
                    media_summary.push_str(medium);
                }
            }

            let parent_zone =
                naming::instance_name(&self.array_name, &str_field(pool, "PARENTNAME", ""));
            *pool_count.entry(parent_zone).or_insert(0) += 1;

            batch.push(json!({
                "name": full_name,
                "PoolName": pool_name,
                "PoolId": raw_field(pool, "ID", json!("")),
                "AvailableCapacity": capacity_of(pool, "USERTOTALCAPACITY", CapacityUnit::TB),
                "AvailableCapacityUsed": capacity_of(pool, "USERCONSUMEDCAPACITY", CapacityUnit::TB),
                "FreeCapacity": capacity_of(pool, "USERFREECAPACITY", CapacityUnit::TB),
                "Medium": media_summary,
                "RaidType": raid_summary,
                "updateTime": self.stamp,
                "DISK_ZONE": [],
            }));
        }

        (self.upsert(objects::STORAGE_POOL, batch).await, pool_count)
    }

    pub async fn collect_luns(&mut self) -> Vec<Value> {
        info!("collecting LUNs");
        let raw = self.source.resource_list(resources::LUN).await;
        let mut batch = Vec::with_capacity(raw.len());

        for lun in &raw {
            let lun_name = str_field(lun, "NAME", "");
            let full_name = naming::instance_name(&self.array_name, &lun_name);
            self.tracked.track(objects::LUN, full_name.clone());

            batch.push(json!({
                "name": full_name,
                "LUN_ID": raw_field(lun, "ID", json!("")),
                "WWN": str_field(lun, "WWN", ""),
                "ALLOCCAPACITY": raw_field(lun, "ALLOCCAPACITY", json!(0)),
                "METACAPACITY": raw_field(lun, "METACAPACITY", json!(0)),
                "DESC": str_field(lun, "DESCRIPTION", ""),
                "HEALTH_STATUS": codes::health_status(&str_field(lun, "HEALTHSTATUS", "1")),
                "RUNNING_STATE": codes::running_status(&str_field(lun, "RUNNINGSTATUS", "27")),
                "CAPACITY": capacity_of(lun, "CAPACITY", CapacityUnit::GB),
                "IOPRIORITY": codes::io_priority(&str_field(lun, "IOPRIORITY", "2")),
                "ISADD2LUNGROUP": raw_field(lun, "ISADD2LUNGROUP", json!(0)),
                "USAGETYPE": codes::usage_type(&str_field(lun, "USAGETYPE", "0")),
                "OWNINGCONTROLLER": naming::instance_name(&self.array_name, &str_field(lun, "OWNINGCONTROLLER", "")),
                "PARENTNAME": naming::instance_name(&self.array_name, &str_field(lun, "PARENTNAME", "")),
                "cTime": self.stamp,
            }));
        }

        self.upsert(objects::LUN, batch).await
    }

    /// Disk zones (vendor resource `diskpool`), with per-disk-type member
    /// counts, hot-spare strategies and the pool count from
    /// [`ArraySync::collect_storage_pools`].
    pub async fn collect_disk_zones(&mut self, pool_count: &HashMap<String, i64>) -> Vec<Value> {
        info!("collecting disk zones");
        let raw = self.source.resource_list(resources::DISK_POOL).await;
        let mut batch = Vec::with_capacity(raw.len());

        for zone in &raw {
            let zone_name = str_field(zone, "NAME", "");
            let full_name = naming::instance_name(&self.array_name, &zone_name);
            self.tracked.track(objects::DISK_ZONE, full_name.clone());

            let mut disk_count: i64 = 0;
            let mut member_counts = Vec::new();
            for (label, key) in [
                ("SAS", "SASDISKNUM"),
                ("SSD", "SSDDISKNUM"),
                ("NL-SAS", "NLSASDISKNUM"),
            ] {
                let count = int_field(zone, key, 0);
                if count > 0 {
                    disk_count += count;
                    member_counts.push(json!({
                        "name": format!("{label} member disks"),
                        "value": raw_field(zone, key, json!(0)),
                    }));
                }
            }

            let mut hot_spare = Vec::new();
            for (label, key) in [
                ("SAS", "SASHOTSPARESTRATEGY"),
                ("SSD", "SSDHOTSPARESTRATEGY"),
                ("NL-SAS", "NLSASHOTSPARESTRATEGY"),
            ] {
                let code = str_field(zone, key, "");
                if !code.is_empty() {
                    // Unknown strategy codes surface verbatim.
                    let strategy = codes::hot_spare_strategy(&code)
                        .map(String::from)
                        .unwrap_or_else(|| code.clone());
                    hot_spare.push(json!({
                        "name": format!("{label} hot spare policy"),
                        "value": strategy,
                    }));
                }
            }

            batch.push(json!({
                "name": full_name,
                "DomainName": zone_name,
                "TotalCapacity": capacity_of(zone, "TOTALCAPACITY", CapacityUnit::TB),
                "SpareCapacity": capacity_of(zone, "SPARECAPACITY", CapacityUnit::TB),
                "SpareCapacityUsed": capacity_of(zone, "USEDSPARECAPACITY", CapacityUnit::TB),
                "FreeCapacity": capacity_of(zone, "FREECAPACITY", CapacityUnit::TB),
                "updateTime": self.stamp,
                "DiskNum": member_counts,
                "DiskCount": disk_count,
                "HotStrat": hot_spare,
                "StoragePool": pool_count.get(&full_name).copied().unwrap_or(0),
                "DISK_ARRAY": [self.array_instance_id],
            }));
        }

        self.upsert(objects::DISK_ZONE, batch).await
    }

    pub async fn collect_disks(&mut self) -> Vec<Value> {
        info!("collecting disks");
        let raw = self.source.resource_list(resources::DISK).await;
        let mut batch = Vec::with_capacity(raw.len());

        for disk in &raw {
            let disk_id = id_field(disk, "ID");
            let full_name = naming::instance_name(&self.array_name, &disk_id);
            self.tracked.track(objects::DISK, full_name.clone());

            let zone_name =
                naming::instance_name(&self.array_name, &str_field(disk, "POOLNAME", ""));

            batch.push(json!({
                "name": full_name,
                // SECTOR_SIZE/SECTOR_COUNT follow the sink schema, which has
                // the vendor meanings swapped.
                "SECTOR_SIZE": int_field(disk, "SECTORS", 0).to_string(),
                "SECTOR_COUNT": raw_field(disk, "SECTORSIZE", json!(DEFAULT_SECTOR_SIZE)),
                "HEALTH_STATUS": codes::health_status(&str_field(disk, "HEALTHSTATUS", "0")),
                "RUNNING_STATE": codes::running_status(&str_field(disk, "RUNNINGSTATUS", "0")),
                "TYPE": codes::disk_type(&str_field(disk, "DISKTYPE", "0")),
                "SPEED_RPM": raw_field(disk, "SPEEDRPM", json!("")),
                "MODEL": str_field(disk, "MODEL", ""),
                "SERIALNUMBER": str_field(disk, "SERIALNUMBER", ""),
                "FIRMWAREVER": str_field(disk, "FIRMWAREVER", ""),
                "MANUFACTURER": str_field(disk, "MANUFACTURER", ""),
                "BAR_CODE": str_field(disk, "barcode", ""),
                "LOCATION": str_field(disk, "LOCATION", ""),
                "POOLNAME": zone_name,
                "disk_diskzone": zone_name,
                "cTime": self.stamp,
            }));
        }

        self.upsert(objects::DISK, batch).await
    }

    /// Single import for the whole batch; empty batches are a no-op.
    async fn upsert(&self, object_id: &str, batch: Vec<Value>) -> Vec<Value> {
        if batch.is_empty() {
            return batch;
        }
        self.store
            .import(object_id, UPSERT_KEYS, batch.clone())
            .await;
        batch
    }
}

fn capacity_of(record: &Value, key: &str, unit: CapacityUnit) -> f64 {
    format_capacity(
        &raw_field(record, key, json!(0)),
        DEFAULT_SECTOR_SIZE,
        unit,
    )
}

/// Five capacity counters on the array record are strings with a `T` suffix.
fn tb_string(record: &Value, key: &str, sector_size: i64) -> String {
    let tb = format_capacity(&raw_field(record, key, json!(0)), sector_size, CapacityUnit::TB);
    format!("{tb:.2}T")
}
