use crate::utils::error::CorrecterError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

const OBJECT_NUMBER_WIDTH: usize = 8;

fn object_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z][A-Za-z0-9]*)_([A-Za-z0-9]+)_([0-9]{1,8})$").unwrap()
    })
}

/// Object identifier of the form `<project>_<type>_<number>`.
///
/// The number is zero-padded to eight digits, so `mir_mods_1` and
/// `mir_mods_00000001` are the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId {
    project: String,
    kind: String,
    number: u32,
}

impl ObjectId {
    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn number(&self) -> u32 {
        self.number
    }
}

impl FromStr for ObjectId {
    type Err = CorrecterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CorrecterError::InvalidObjectId {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let caps = object_id_pattern()
            .captures(s.trim())
            .ok_or_else(|| invalid("expected <project>_<type>_<number>"))?;
        let number = caps[3]
            .parse::<u32>()
            .map_err(|_| invalid("object number is not numeric"))?;

        Ok(Self {
            project: caps[1].to_string(),
            kind: caps[2].to_string(),
            number,
        })
    }
}

impl TryFrom<String> for ObjectId {
    type Error = CorrecterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{:0width$}",
            self.project,
            self.kind,
            self.number,
            width = OBJECT_NUMBER_WIDTH
        )
    }
}

/// An identifier exactly as it is recorded on an object. Not validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedIdentifier {
    pub identifier_type: String,
    pub value: String,
}

/// An identifier that parsed under its type's grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersistentIdentifier {
    identifier_type: String,
    value: String,
}

impl PersistentIdentifier {
    /// Only grammars construct these; see [`crate::domain::ports::IdentifierParser`].
    pub fn new(identifier_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            identifier_type: identifier_type.into(),
            value: value.into(),
        }
    }

    pub fn identifier_type(&self) -> &str {
        &self.identifier_type
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for PersistentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// Embedded metadata document. Members other than `identifiers` are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub identifiers: Vec<MetadataIdentifier>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFlag {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(default)]
    pub flags: Vec<ServiceFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

impl ServiceRecord {
    /// Flags of one type together with their index in the full flag list.
    pub fn flags_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = (usize, &'a ServiceFlag)> {
        self.flags
            .iter()
            .enumerate()
            .filter(move |(_, flag)| flag.kind == kind)
    }

    pub fn remove_flag(&mut self, index: usize) -> Option<ServiceFlag> {
        (index < self.flags.len()).then(|| self.flags.remove(index))
    }

    pub fn add_flag(&mut self, kind: impl Into<String>, value: impl Into<String>) {
        self.flags.push(ServiceFlag {
            kind: kind.into(),
            value: value.into(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalObject {
    pub id: ObjectId,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub service: ServiceRecord,
}

impl DigitalObject {
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            metadata: Metadata::default(),
            service: ServiceRecord::default(),
        }
    }
}

/// Decoded form of a persistent identifier flag.
///
/// `id`, `mycoreID`, `mcrVersion` and `mcrRevision` are bookkeeping; the flag
/// codec never writes them back. Timestamps stay in the form they were
/// stored in, and absent members decode to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiFlag {
    #[serde(default)]
    pub identifier: String,
    #[serde(rename = "type", default)]
    pub identifier_type: String,
    #[serde(rename = "mycoreID", default, skip_serializing_if = "Option::is_none")]
    pub mycore_id: Option<String>,
    #[serde(default)]
    pub additional: String,
    #[serde(default)]
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_started: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcr_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcr_revision: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    pub object_id: ObjectId,
    pub additional: String,
    pub identifier_type: String,
    pub service: String,
}

/// A row of the persistent identifier registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub identifier: String,
    #[serde(rename = "type")]
    pub identifier_type: String,
    #[serde(rename = "mycoreID")]
    pub mycore_id: ObjectId,
    #[serde(default)]
    pub additional: String,
    pub service: String,
    #[serde(default)]
    pub registered: Option<DateTime<Utc>>,
}

impl RegistryRecord {
    pub fn key(&self) -> RegistryKey {
        RegistryKey {
            object_id: self.mycore_id.clone(),
            additional: self.additional.clone(),
            identifier_type: self.identifier_type.clone(),
            service: self.service.clone(),
        }
    }

    pub fn matches(&self, key: &RegistryKey) -> bool {
        self.mycore_id == key.object_id
            && self.additional == key.additional
            && self.identifier_type == key.identifier_type
            && self.service == key.service
    }

    /// A fresh row carrying everything but the identifier value over.
    pub fn with_identifier(&self, identifier: impl Into<String>) -> Self {
        Self {
            id: None,
            identifier: identifier.into(),
            identifier_type: self.identifier_type.clone(),
            mycore_id: self.mycore_id.clone(),
            additional: self.additional.clone(),
            service: self.service.clone(),
            registered: self.registered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_is_zero_padded() {
        let id: ObjectId = "mir_mods_1".parse().unwrap();
        assert_eq!(id.to_string(), "mir_mods_00000001");
        assert_eq!(id, "mir_mods_00000001".parse().unwrap());
        assert_eq!(id.project(), "mir");
        assert_eq!(id.kind(), "mods");
    }

    #[test]
    fn test_object_id_rejects_bad_grammar() {
        assert!("mods_00000001".parse::<ObjectId>().is_err());
        assert!("1mir_mods_00000001".parse::<ObjectId>().is_err());
        assert!("mir_mods_123456789".parse::<ObjectId>().is_err());
        assert!("mir_mods_".parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_object_id_serde_uses_string_form() {
        let id: ObjectId = serde_json::from_str("\"mir_mods_42\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"mir_mods_00000042\"");
        assert!(serde_json::from_str::<ObjectId>("\"nope\"").is_err());
    }

    #[test]
    fn test_flags_of_keeps_global_index() {
        let mut service = ServiceRecord::default();
        service.add_flag("editedby", "admin");
        service.add_flag("MyCoRe-PI", "{}");
        let found: Vec<usize> = service.flags_of("MyCoRe-PI").map(|(i, _)| i).collect();
        assert_eq!(found, vec![1]);
        assert!(service.remove_flag(5).is_none());
        assert_eq!(service.remove_flag(0).unwrap().value, "admin");
    }

    #[test]
    fn test_with_identifier_drops_row_id() {
        let record = RegistryRecord {
            id: Some(7),
            identifier: "urn:nbn:de--1".to_string(),
            identifier_type: "dnbUrn".to_string(),
            mycore_id: "mir_mods_1".parse().unwrap(),
            additional: String::new(),
            service: "DNBURN".to_string(),
            registered: None,
        };
        let fresh = record.with_identifier("urn:nbn:de-1");
        assert_eq!(fresh.id, None);
        assert_eq!(fresh.key(), record.key());
        assert_eq!(fresh.identifier, "urn:nbn:de-1");
    }
}
