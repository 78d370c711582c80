use crate::domain::model::{DigitalObject, PersistentIdentifier};
use crate::domain::ports::IdentifierService;
use crate::utils::error::Result;

/// Swaps `old` for `new` in the embedded metadata. In memory only.
///
/// Returns `false` without touching the object when `old` already equals
/// `new`, so a correction can be resumed after a partial failure.
pub fn replace_identifier(
    service: &dyn IdentifierService,
    object: &mut DigitalObject,
    old: &str,
    new: &PersistentIdentifier,
) -> Result<bool> {
    if old == new.as_str() {
        tracing::debug!("Metadata of {} already holds {}", object.id, new);
        return Ok(false);
    }

    service.remove_identifier(old, object)?;
    service.insert_identifier(new, object)?;
    tracing::info!("Metadata of {}: {} -> {}", object.id, old, new);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::metadata_service::MetadataIdentifierService;
    use crate::domain::model::MetadataIdentifier;
    use crate::utils::error::CorrecterError;

    fn object_with(value: &str) -> DigitalObject {
        let mut object = DigitalObject::new("mir_mods_1".parse().unwrap());
        object.metadata.identifiers.push(MetadataIdentifier {
            kind: "urn".to_string(),
            value: value.to_string(),
        });
        object
    }

    #[test]
    fn test_replace_swaps_value() {
        let service = MetadataIdentifierService::new("DNBURN", "dnbUrn", "urn");
        let mut object = object_with("urn:nbn:de--1234--5");
        let new = PersistentIdentifier::new("dnbUrn", "urn:nbn:de-1234-5");

        assert!(replace_identifier(&service, &mut object, "urn:nbn:de--1234--5", &new).unwrap());
        assert_eq!(object.metadata.identifiers.len(), 1);
        assert_eq!(object.metadata.identifiers[0].value, "urn:nbn:de-1234-5");
    }

    #[test]
    fn test_replace_same_value_is_noop() {
        let service = MetadataIdentifierService::new("DNBURN", "dnbUrn", "urn");
        let mut object = object_with("urn:nbn:de-1234-5");
        let before = object.clone();
        let new = PersistentIdentifier::new("dnbUrn", "urn:nbn:de-1234-5");

        assert!(!replace_identifier(&service, &mut object, "urn:nbn:de-1234-5", &new).unwrap());
        assert_eq!(object, before);
    }

    #[test]
    fn test_replace_missing_old_value_fails() {
        let service = MetadataIdentifierService::new("DNBURN", "dnbUrn", "urn");
        let mut object = object_with("urn:nbn:de-9");
        let new = PersistentIdentifier::new("dnbUrn", "urn:nbn:de-1234-5");

        let err = replace_identifier(&service, &mut object, "urn:nbn:de--1234--5", &new).unwrap_err();
        assert!(matches!(err, CorrecterError::IdentifierNotFound { .. }));
        assert_eq!(object.metadata.identifiers[0].value, "urn:nbn:de-9");
    }
}
