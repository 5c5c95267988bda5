//! Vendor enumeration codes to display labels.
//!
//! Immutable lookup tables expressed as match arms; unknown codes fall back
//! to a fixed label per table, so translation is never fatal.

pub fn health_status(code: &str) -> &'static str {
    match code {
        "0" => "unknown",
        "1" => "normal",
        "2" => "fault",
        "3" => "about to fail",
        "5" => "degraded",
        "9" => "inconsistent",
        _ => "unknown",
    }
}

pub fn running_status(code: &str) -> &'static str {
    match code {
        "0" => "unknown",
        "1" => "normal",
        "2" => "running",
        "3" => "not running",
        "12" => "powering on",
        "14" => "pre-copy",
        "16" => "reconstruction",
        "27" => "online",
        "28" => "offline",
        "32" => "balancing",
        "47" => "powering off",
        "51" => "upgrading",
        "53" => "initializing",
        _ => "unknown",
    }
}

pub fn product_model(code: &str) -> &'static str {
    match code {
        "61" => "6800 V3",
        "62" => "6900 V3",
        "63" => "5600 V3",
        "64" => "5800 V3",
        "68" => "5500 V3",
        "70" => "5300 V3",
        "825" => "5300 V6",
        _ => "unknown model",
    }
}

pub fn operating_system(code: &str) -> &'static str {
    match code {
        "0" => "Linux",
        "4" => "AIX",
        "7" => "VMware ESX",
        _ => "unknown",
    }
}

/// RAID level per pool tier; tiers without a configured level answer `None`
/// and are left out of the pool's RAID summary.
pub fn raid_level(code: &str) -> Option<&'static str> {
    match code {
        "1" => Some("RAID10"),
        "2" => Some("RAID5"),
        "3" => Some("RAID0"),
        "4" => Some("RAID1"),
        "5" => Some("RAID6"),
        "6" => Some("RAID50"),
        "7" => Some("RAID3"),
        _ => None,
    }
}

pub fn disk_type(code: &str) -> &'static str {
    match code {
        "0" => "FC",
        "1" => "SAS",
        "2" => "SATA",
        "3" => "SSD",
        "4" => "NL-SAS",
        "5" => "SLC SSD",
        "6" => "MLC SSD",
        "7" => "FC SED",
        "8" => "SAS SED",
        "9" => "SATA SED",
        "10" => "SSD SED",
        "11" => "NL-SAS SED",
        "12" => "SLC SSD SED",
        "13" => "MLC SSD SED",
        "14" => "NVMe SSD",
        "16" => "NVMe SSD SED",
        _ => "unknown",
    }
}

/// Hot-spare strategy; callers surface the raw code when it is unknown.
pub fn hot_spare_strategy(code: &str) -> Option<&'static str> {
    match code {
        "0" => Some("invalid"),
        "1" => Some("low"),
        "2" => Some("high"),
        "3" => Some("none"),
        _ => None,
    }
}

pub fn application_type(code: &str) -> &'static str {
    match code {
        "0" => "other",
        "1" => "oracle",
        "2" => "exchange",
        "3" => "sqlserver",
        "4" => "vmware",
        "5" => "hyper-V",
        _ => "other",
    }
}

pub fn usage_type(code: &str) -> &'static str {
    match code {
        "0" => "traditional LUN",
        "1" => "LUN",
        "2" => "file system",
        "3" => "PE LUN",
        _ => "traditional LUN",
    }
}

pub fn controller_role(code: &str) -> &'static str {
    match code {
        "0" => "member",
        "1" => "cluster primary",
        "2" => "cluster secondary",
        _ => "unknown",
    }
}

pub fn io_priority(code: &str) -> &'static str {
    match code {
        "1" => "low",
        "2" => "medium",
        "3" => "high",
        _ => "medium",
    }
}

/// Disk media recognized per performance tier (0 = flash, 1 = SAS,
/// 2 = nearline). Codes outside a tier's media set answer `None` and are
/// left out of the pool's media summary.
pub fn tier_disk_type(tier: u8, code: &str) -> Option<&'static str> {
    match (tier, code) {
        (0, "3") => Some("SSD"),
        (0, "10") => Some("SSD SED"),
        (0, "14") => Some("NVMe SSD"),
        (0, "16") => Some("NVMe SSD SED"),
        (1, "1") => Some("SAS"),
        (1, "8") => Some("SAS SED"),
        (2, "2") => Some("SATA"),
        (2, "4") => Some("NL-SAS"),
        (2, "11") => Some("NL-SAS SED"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_translate() {
        assert_eq!(health_status("1"), "normal");
        assert_eq!(running_status("27"), "online");
        assert_eq!(product_model("68"), "5500 V3");
        assert_eq!(operating_system("4"), "AIX");
        assert_eq!(raid_level("5"), Some("RAID6"));
        assert_eq!(disk_type("14"), "NVMe SSD");
        assert_eq!(hot_spare_strategy("2"), Some("high"));
        assert_eq!(application_type("1"), "oracle");
        assert_eq!(usage_type("2"), "file system");
        assert_eq!(controller_role("1"), "cluster primary");
        assert_eq!(io_priority("3"), "high");
    }

    #[test]
    fn test_unknown_codes_fall_back() {
        assert_eq!(health_status("99"), "unknown");
        assert_eq!(running_status(""), "unknown");
        assert_eq!(product_model("1"), "unknown model");
        assert_eq!(operating_system("9"), "unknown");
        assert_eq!(raid_level("9"), None);
        assert_eq!(disk_type("99"), "unknown");
        assert_eq!(hot_spare_strategy("7"), None);
        assert_eq!(application_type("42"), "other");
        assert_eq!(usage_type("9"), "traditional LUN");
        assert_eq!(controller_role("5"), "unknown");
        assert_eq!(io_priority("0"), "medium");
    }

    #[test]
    fn test_tier_media_is_tier_scoped() {
        assert_eq!(tier_disk_type(0, "3"), Some("SSD"));
        assert_eq!(tier_disk_type(1, "3"), None);
        assert_eq!(tier_disk_type(2, "4"), Some("NL-SAS"));
        assert_eq!(tier_disk_type(3, "3"), None);
    }
}
