//! Record model
//!
//! Typed representations of provider-native zone records and of the logical
//! endpoints the rest of the system reasons about.
//!
//! - [`ZoneRecord`]: one provider-stored record with a single data value
//! - [`Endpoint`]: one DNS name + type with one or more targets
//! - [`ChangeSet`]: desired changes supplied by an upstream planner
//! - [`WriteOp`]: a provider-native write produced by the translator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Provider sentinel for the zone apex
pub const APEX_NAME: &str = "@";

/// DNS record types the adapter manages
///
/// The set is closed: anything else is rejected when parsed from a provider
/// response or a change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Canonical name
    Cname,
    /// Mail exchange
    Mx,
    /// Name server
    Ns,
    /// Service locator
    Srv,
    /// Text
    Txt,
    /// Certification authority authorization
    Caa,
}

impl RecordType {
    /// All supported record types
    pub const ALL: [RecordType; 8] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Cname,
        RecordType::Mx,
        RecordType::Ns,
        RecordType::Srv,
        RecordType::Txt,
        RecordType::Caa,
    ];

    /// The upper-case mnemonic used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Srv => "SRV",
            RecordType::Txt => "TXT",
            RecordType::Caa => "CAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RecordType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnsupportedRecordType(s.to_string()))
    }
}

impl TryFrom<String> for RecordType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.as_str().to_string()
    }
}

/// A single provider-native DNS record
///
/// Multi-value record sets are stored by providers as several records sharing
/// `name` and `record_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    /// Zone-relative name, [`APEX_NAME`] for the apex
    pub name: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record value
    pub data: String,
}

impl ZoneRecord {
    /// Create a new zone record
    pub fn new(
        name: impl Into<String>,
        record_type: RecordType,
        ttl: u32,
        data: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            ttl,
            data: data.into(),
        }
    }
}

/// A logical DNS endpoint: one name + type with an ordered set of targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully qualified DNS name
    pub dns_name: String,
    /// Record type
    pub record_type: RecordType,
    /// TTL in seconds, 0 selects the configured default
    #[serde(default, rename = "recordTTL")]
    pub ttl: u32,
    /// Target values in provider order
    #[serde(default)]
    pub targets: Vec<String>,
}

impl Endpoint {
    /// Create a new endpoint
    pub fn new<I, S>(dns_name: impl Into<String>, record_type: RecordType, ttl: u32, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dns_name: dns_name.into(),
            record_type,
            ttl,
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    /// The DNS name in canonical form
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.dns_name)
    }

    /// Whether both endpoints address the same name + type
    pub fn same_key(&self, other: &Endpoint) -> bool {
        self.record_type == other.record_type && self.normalized_name() == other.normalized_name()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}]",
            self.dns_name,
            self.ttl,
            self.record_type,
            self.targets.join(";")
        )
    }
}

/// Canonical form of a DNS name: lower-case, no leading or trailing dots
///
/// `".example.net"`, `"Example.NET."` and `"example.net"` all normalize to
/// `"example.net"`.
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_matches('.').to_ascii_lowercase()
}

/// A DNS zone managed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Zone {
    /// Zone domain, normalized
    pub domain: String,
}

impl Zone {
    /// Create a zone, normalizing the domain
    pub fn new(domain: impl AsRef<str>) -> Self {
        Self {
            domain: normalize_name(domain.as_ref()),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domain)
    }
}

/// Desired changes supplied by an upstream planner
///
/// `update_old[i]` and `update_new[i]` describe the same logical record before
/// and after the update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    /// Endpoints to create
    #[serde(default)]
    pub create: Vec<Endpoint>,
    /// Current state of updated endpoints
    #[serde(default)]
    pub update_old: Vec<Endpoint>,
    /// Desired state of updated endpoints
    #[serde(default)]
    pub update_new: Vec<Endpoint>,
    /// Endpoints to delete
    #[serde(default)]
    pub delete: Vec<Endpoint>,
}

impl ChangeSet {
    /// Whether the change set contains no changes
    pub fn is_empty(&self) -> bool {
        self.create.is_empty()
            && self.update_old.is_empty()
            && self.update_new.is_empty()
            && self.delete.is_empty()
    }

    /// Check that update pairs are complete
    pub fn validate(&self) -> Result<()> {
        if self.update_old.len() != self.update_new.len() {
            return Err(Error::invalid_input(format!(
                "update pairs are incomplete: {} old vs {} new endpoints",
                self.update_old.len(),
                self.update_new.len()
            )));
        }
        Ok(())
    }
}

/// A provider-native write operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Replace every record of `name` + `record_type` with `records`
    ReplaceRecordSet {
        zone: Zone,
        name: String,
        record_type: RecordType,
        records: Vec<ZoneRecord>,
    },
    /// Delete every record of `name` + `record_type`
    DeleteRecordSet {
        zone: Zone,
        name: String,
        record_type: RecordType,
    },
}

impl WriteOp {
    /// Zone the operation targets
    pub fn zone(&self) -> &Zone {
        match self {
            WriteOp::ReplaceRecordSet { zone, .. } | WriteOp::DeleteRecordSet { zone, .. } => zone,
        }
    }

    /// Zone-relative record name
    pub fn name(&self) -> &str {
        match self {
            WriteOp::ReplaceRecordSet { name, .. } | WriteOp::DeleteRecordSet { name, .. } => name,
        }
    }

    /// Record type
    pub fn record_type(&self) -> RecordType {
        match self {
            WriteOp::ReplaceRecordSet { record_type, .. }
            | WriteOp::DeleteRecordSet { record_type, .. } => *record_type,
        }
    }

    /// Short operation kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            WriteOp::ReplaceRecordSet { .. } => "replace",
            WriteOp::DeleteRecordSet { .. } => "delete",
        }
    }
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} in {}",
            self.kind(),
            self.record_type(),
            self.name(),
            self.zone()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_parse() {
        assert_eq!("a".parse::<RecordType>().unwrap(), RecordType::A);
        assert_eq!("AAAA".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert_eq!(" cname ".parse::<RecordType>().unwrap(), RecordType::Cname);
        assert!(matches!(
            "SOA".parse::<RecordType>(),
            Err(Error::UnsupportedRecordType(t)) if t == "SOA"
        ));
    }

    #[test]
    fn test_record_type_serde_rejects_unknown() {
        let record: ZoneRecord =
            serde_json::from_str(r#"{"name":"www","type":"CNAME","ttl":600,"data":"example.org"}"#)
                .unwrap();
        assert_eq!(record.record_type, RecordType::Cname);

        let bad = serde_json::from_str::<ZoneRecord>(
            r#"{"name":"www","type":"FORWARD","ttl":600,"data":"x"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name(".example.net"), "example.net");
        assert_eq!(normalize_name("Www.Example.NET."), "www.example.net");
        assert_eq!(Zone::new("Example.com.").domain, "example.com");
    }

    #[test]
    fn test_endpoint_same_key() {
        let a = Endpoint::new(".example.net", RecordType::A, 300, ["1.2.3.4"]);
        let b = Endpoint::new("example.net", RecordType::A, 0, Vec::<String>::new());
        let c = Endpoint::new("example.net", RecordType::Txt, 0, ["x"]);
        assert!(a.same_key(&b));
        assert!(!a.same_key(&c));
    }

    #[test]
    fn test_change_set_validate() {
        let mut changes = ChangeSet::default();
        assert!(changes.is_empty());
        assert!(changes.validate().is_ok());

        changes
            .update_new
            .push(Endpoint::new("a.example.com", RecordType::A, 0, ["1.1.1.1"]));
        assert!(!changes.is_empty());
        assert!(matches!(changes.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_change_set_wire_format() {
        let json = r#"{
            "create": [{"dnsName": "a.example.com", "recordType": "A", "recordTTL": 300, "targets": ["1.1.1.1"]}],
            "updateOld": [],
            "updateNew": [],
            "delete": [{"dnsName": "b.example.com", "recordType": "TXT"}]
        }"#;
        let changes: ChangeSet = serde_json::from_str(json).unwrap();
        assert_eq!(changes.create[0].ttl, 300);
        assert_eq!(changes.delete[0].record_type, RecordType::Txt);
        assert!(changes.delete[0].targets.is_empty());
    }

    #[test]
    fn test_write_op_display() {
        let op = WriteOp::DeleteRecordSet {
            zone: Zone::new("example.net"),
            name: "godaddy".to_string(),
            record_type: RecordType::A,
        };
        assert_eq!(op.to_string(), "delete A godaddy in example.net");
        assert_eq!(op.kind(), "delete");
    }
}
