// Table/Sheet Name Whitelist
//
// Data-loading statements interpolate table names, so those names must
// never be attacker-controlled. This set is compiled in: it is a
// security boundary, not configuration, and is immutable at runtime.

use thiserror::Error;

/// The 27 permitted sheet/table names, in processing order (inventory
/// sheets first, metadata last). The executor walks this order so that
/// imports are deterministic across runs.
pub const PROCESSING_ORDER: [&str; 27] = [
    "vInfo", "vCPU", "vMemory", "vDisk", "vPartition", "vNetwork",
    "vSnapshot", "vTools", "vHost", "vCluster", "vDatastore", "vHealth",
    "vCD", "vUSB", "vSource", "vRP", "vHBA", "vNIC", "vSwitch", "vPort",
    "dvSwitch", "dvPort", "vSC_VMK", "vMultiPath", "vLicense", "vFileInfo",
    "vMetaData",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("table name '{0}' is not in the allowed import whitelist")]
    NotWhitelisted(String),
}

/// Checks membership, case-insensitively
pub fn is_valid(name: &str) -> bool {
    canonical_name(name).is_some()
}

/// Fails with [`IdentifierError::NotWhitelisted`] for any non-member
pub fn validate(name: &str) -> Result<(), IdentifierError> {
    if is_valid(name) {
        Ok(())
    } else {
        Err(IdentifierError::NotWhitelisted(name.to_string()))
    }
}

/// Returns the properly-cased member, or None
pub fn canonical_name(name: &str) -> Option<&'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }
    PROCESSING_ORDER
        .iter()
        .find(|member| member.eq_ignore_ascii_case(trimmed))
        .copied()
}

/// A table name proven to be a whitelist member. The only way to obtain
/// one is through [`TableName::validate`], so any API taking `TableName`
/// can interpolate it into a statement safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableName(&'static str);

impl TableName {
    pub fn validate(name: &str) -> Result<Self, IdentifierError> {
        canonical_name(name)
            .map(TableName)
            .ok_or_else(|| IdentifierError::NotWhitelisted(name.to_string()))
    }

    /// Properly-cased whitelist member
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_validate() {
        for name in PROCESSING_ORDER {
            assert!(is_valid(name), "{name} should be valid");
            validate(name).unwrap();
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(is_valid("vinfo"));
        assert!(is_valid("VINFO"));
        assert_eq!(canonical_name("vinfo"), Some("vInfo"));
        assert_eq!(canonical_name("DVSWITCH"), Some("dvSwitch"));
    }

    #[test]
    fn injection_attempts_are_rejected() {
        let err = validate("vInfo; DROP TABLE X").unwrap_err();
        assert_eq!(
            err,
            IdentifierError::NotWhitelisted("vInfo; DROP TABLE X".to_string())
        );
        assert!(!is_valid("vInfo--"));
        assert!(!is_valid("jobs"));
        assert_eq!(canonical_name("'; DELETE FROM vInfo"), None);
    }

    #[test]
    fn empty_and_whitespace_are_rejected() {
        assert!(!is_valid(""));
        assert!(!is_valid("   "));
        assert_eq!(canonical_name(""), None);
    }

    #[test]
    fn table_name_carries_canonical_casing() {
        let table = TableName::validate("vsc_vmk").unwrap();
        assert_eq!(table.as_str(), "vSC_VMK");
        assert!(TableName::validate("vInfo; DROP TABLE X").is_err());
    }
}
