//! DNS record model and per-type partitioning
//!
//! Registrars replace records one type at a time, so a flat desired record
//! set has to be split into per-type groups before it can be applied. A
//! [`RecordTypePolicy`] decides which types the caller is allowed to touch;
//! groups of disallowed types are dropped silently and empty groups are never
//! emitted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// DNS resource record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordType {
    A,
    Aaaa,
    Caa,
    Cname,
    Mx,
    Ns,
    Soa,
    Srv,
    Txt,
}

impl RecordType {
    /// Every type the registrar accepts
    pub const ALL: [RecordType; 9] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Caa,
        RecordType::Cname,
        RecordType::Mx,
        RecordType::Ns,
        RecordType::Soa,
        RecordType::Srv,
        RecordType::Txt,
    ];

    /// Wire name (`A`, `AAAA`, …)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Caa => "CAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Ns => "NS",
            Self::Soa => "SOA",
            Self::Srv => "SRV",
            Self::Txt => "TXT",
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
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_input(format!("Unsupported record type: '{}'", s)))
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

/// A single DNS record within a domain
///
/// Identity within a domain is `(name, type, data)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

impl DomainRecord {
    /// Create a record with no TTL or priority
    pub fn new(name: impl Into<String>, record_type: RecordType, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type,
            data: data.into(),
            ttl: None,
            priority: None,
            port: None,
            weight: None,
            service: None,
            protocol: None,
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the priority (MX, SRV)
    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    /// The `(name, type, data)` identity tuple
    pub fn identity(&self) -> (&str, RecordType, &str) {
        (&self.name, self.record_type, &self.data)
    }
}

/// Per-type allow/deny table covering every supported record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<RecordType, bool>", into = "BTreeMap<RecordType, bool>")]
pub struct RecordTypePolicy {
    allowed: BTreeMap<RecordType, bool>,
}

impl RecordTypePolicy {
    /// Every type allowed
    pub fn allow_all() -> Self {
        Self {
            allowed: RecordType::ALL.into_iter().map(|t| (t, true)).collect(),
        }
    }

    /// Build from explicit entries; every supported type must appear
    pub fn from_entries(entries: BTreeMap<RecordType, bool>) -> Result<Self> {
        let missing: Vec<&str> = RecordType::ALL
            .iter()
            .filter(|t| !entries.contains_key(t))
            .map(|t| t.as_str())
            .collect();

        if !missing.is_empty() {
            return Err(Error::invalid_input(format!(
                "Record type policy has no entry for: {}",
                missing.join(", ")
            )));
        }

        Ok(Self { allowed: entries })
    }

    /// Allow a type
    pub fn allow(mut self, record_type: RecordType) -> Self {
        self.allowed.insert(record_type, true);
        self
    }

    /// Deny a type
    pub fn deny(mut self, record_type: RecordType) -> Self {
        self.allowed.insert(record_type, false);
        self
    }

    /// Whether records of this type may be submitted
    pub fn is_allowed(&self, record_type: RecordType) -> bool {
        self.allowed.get(&record_type).copied().unwrap_or(false)
    }
}

impl Default for RecordTypePolicy {
    /// Everything except SOA, which the registrar manages itself
    fn default() -> Self {
        Self::allow_all().deny(RecordType::Soa)
    }
}

impl TryFrom<BTreeMap<RecordType, bool>> for RecordTypePolicy {
    type Error = Error;

    fn try_from(value: BTreeMap<RecordType, bool>) -> Result<Self> {
        Self::from_entries(value)
    }
}

impl From<RecordTypePolicy> for BTreeMap<RecordType, bool> {
    fn from(value: RecordTypePolicy) -> Self {
        value.allowed
    }
}

/// Records of one type, replaced together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordGroup {
    pub record_type: RecordType,
    pub records: Vec<DomainRecord>,
}

/// Split `records` into per-type groups, dropping disallowed types
///
/// Groups are ordered by the first appearance of their type in `records`, and
/// records keep their relative order inside a group.
pub fn partition(records: &[DomainRecord], policy: &RecordTypePolicy) -> Vec<RecordGroup> {
    let mut groups: Vec<RecordGroup> = Vec::new();

    for record in records {
        if !policy.is_allowed(record.record_type) {
            tracing::debug!(
                "Dropping {} record '{}': type not allowed by policy",
                record.record_type,
                record.name
            );
            continue;
        }

        match groups.iter_mut().find(|g| g.record_type == record.record_type) {
            Some(group) => group.records.push(record.clone()),
            None => groups.push(RecordGroup {
                record_type: record.record_type,
                records: vec![record.clone()],
            }),
        }
    }

    groups
}
