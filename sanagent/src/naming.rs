//! Composite-name synthesis.
//!
//! The sink upserts by `name`; these synthesized names are what makes
//! re-runs update in place and what the relation passes join on. Collisions
//! after synthesis are not detected; the later record wins the upsert.

/// `{array}_{local id or display name}`, the general composite key.
pub fn instance_name(array: &str, local: &str) -> String {
    format!("{array}_{local}")
}

/// Host groups additionally carry their source-local id as a suffix.
pub fn host_group_name(array: &str, group: &str, id: &str) -> String {
    format!("{array}_{group}_{id}")
}

/// Prefix anchoring a host-group display name ahead of its id suffix; the
/// mapping-view pass matches this case-insensitively against sink names.
pub fn host_group_prefix(array: &str, group: &str) -> String {
    format!("{array}_{group}_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_name_joins_with_underscore() {
        assert_eq!(instance_name("arr01", "lun0"), "arr01_lun0");
        assert_eq!(instance_name("arr01", ""), "arr01_");
    }

    #[test]
    fn test_host_group_name_carries_id_suffix() {
        assert_eq!(host_group_name("arr01", "esx", "5"), "arr01_esx_5");
        assert!(host_group_name("arr01", "esx", "5").starts_with(&host_group_prefix("arr01", "esx")));
    }
}
