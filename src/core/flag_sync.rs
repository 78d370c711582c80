use crate::domain::model::{DigitalObject, PiFlag};
use crate::utils::error::{CorrecterError, Result};
use serde_json::Value;

/// Members that are read from a flag but never written back.
pub const WRITE_EXCLUDED_FIELDS: &[&str] = &["mcrRevision", "mycoreID", "id", "mcrVersion"];

/// JSON codec for persistent identifier flags.
#[derive(Debug, Clone)]
pub struct FlagCodec {
    excluded: Vec<String>,
}

impl Default for FlagCodec {
    fn default() -> Self {
        Self::new(WRITE_EXCLUDED_FIELDS)
    }
}

impl FlagCodec {
    pub fn new(excluded: &[&str]) -> Self {
        Self {
            excluded: excluded.iter().map(|field| field.to_string()).collect(),
        }
    }

    pub fn decode(&self, raw: &str) -> Result<PiFlag> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Decodes `raw` only if it belongs to `service`. Members of flags owned
    /// by other services are never looked at.
    pub fn decode_for(&self, raw: &str, service: &str) -> Result<Option<PiFlag>> {
        let value: Value = serde_json::from_str(raw)?;
        if value.get("service").and_then(Value::as_str) != Some(service) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    pub fn encode(&self, flag: &PiFlag) -> Result<String> {
        let mut value = serde_json::to_value(flag)?;
        if let Some(members) = value.as_object_mut() {
            for field in &self.excluded {
                members.remove(field);
            }
        }
        Ok(serde_json::to_string(&value)?)
    }
}

/// Rewrites the one flag of `flag_type` whose service is `service` so it
/// carries `new_identifier`. The corrected flag is appended to the flag list.
pub fn correct_flag(
    object: &mut DigitalObject,
    codec: &FlagCodec,
    flag_type: &str,
    service: &str,
    new_identifier: &str,
) -> Result<()> {
    let mut matches = Vec::new();
    for (index, flag) in object.service.flags_of(flag_type) {
        if let Some(decoded) = codec.decode_for(&flag.value, service)? {
            matches.push((index, decoded));
        }
    }

    let (index, mut flag) = match matches.len() {
        0 => {
            return Err(CorrecterError::FlagNotFound {
                object_id: object.id.to_string(),
                service: service.to_string(),
            })
        }
        1 => matches.remove(0),
        count => {
            return Err(CorrecterError::AmbiguousFlag {
                object_id: object.id.to_string(),
                service: service.to_string(),
                count,
            })
        }
    };

    flag.identifier = new_identifier.to_string();
    let encoded = codec.encode(&flag)?;

    object.service.remove_flag(index);
    object.service.add_flag(flag_type, encoded);
    tracing::info!("Flag {} of {} now carries {}", service, object.id, new_identifier);
    Ok(())
}
