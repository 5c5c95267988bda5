//! Resource paths on the management API, relative to
//! `{base}/deviceManager/rest/{device_id}/`.

pub const SYSTEM: &str = "system/";
pub const CONTROLLER: &str = "controller";
pub const DISK_POOL: &str = "diskpool";
pub const STORAGE_POOL: &str = "storagepool";
pub const DISK: &str = "disk";
pub const LUN: &str = "lun";
pub const HOST: &str = "host";
pub const HOST_GROUP: &str = "hostgroup";
pub const MAPPING_VIEW: &str = "mappingview";

/// LUN groups, restricted to plain groups (GROUPTYPE 0).
pub fn lun_groups() -> String {
    "LUNGroup?filter=GROUPTYPE::0&range=[0-100]".to_string()
}

/// Hosts associated with a host group (or, through
/// [`view_host_association_id`], with a mapping view).
pub fn hosts_in_group(group_id: &str) -> String {
    format!("host/associate?TYPE=21&ASSOCIATEOBJTYPE=14&ASSOCIATEOBJID={group_id}")
}

/// LUNs associated with a LUN group.
pub fn luns_in_group(group_id: &str) -> String {
    format!("lun/associate?TYPE=11&ASSOCIATEOBJTYPE=256&ASSOCIATEOBJID={group_id}")
}

/// FC initiators registered under a host.
pub fn fc_initiators(host_id: &str) -> String {
    format!("fc_initiator?PARENTID={host_id}")
}

/// Shifts a mapping view's ID before querying its host association.
///
/// Firmware quirk: views with IDs below 4 resolve one lower, views from 14
/// up resolve one higher, the band in between is untouched. The offset's
/// origin is unverified and may not hold on every firmware release; it is
/// kept byte-for-byte from observed behavior. Unparsable IDs pass through.
pub fn view_host_association_id(view_id: &str) -> String {
    match view_id.parse::<i64>() {
        Ok(id) if id < 4 => (id - 1).to_string(),
        Ok(id) if id >= 14 => (id + 1).to_string(),
        _ => view_id.to_string(),
    }
}
