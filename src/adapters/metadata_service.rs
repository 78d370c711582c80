use crate::domain::model::{DigitalObject, MetadataIdentifier, PersistentIdentifier, RecordedIdentifier};
use crate::domain::ports::IdentifierService;
use crate::utils::error::{CorrecterError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Identifier service storing its identifier as a typed entry of the
/// embedded metadata (`{"type": "urn", "value": "urn:nbn:..."}`).
#[derive(Debug, Clone)]
pub struct MetadataIdentifierService {
    name: String,
    identifier_type: String,
    metadata_kind: String,
}

impl MetadataIdentifierService {
    pub fn new(
        name: impl Into<String>,
        identifier_type: impl Into<String>,
        metadata_kind: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            identifier_type: identifier_type.into(),
            metadata_kind: metadata_kind.into(),
        }
    }
}

impl IdentifierService for MetadataIdentifierService {
    fn name(&self) -> &str {
        &self.name
    }

    fn identifier_type(&self) -> &str {
        &self.identifier_type
    }

    fn get_identifier(&self, object: &DigitalObject) -> Option<RecordedIdentifier> {
        object
            .metadata
            .identifiers
            .iter()
            .find(|entry| entry.kind == self.metadata_kind)
            .map(|entry| RecordedIdentifier {
                identifier_type: self.identifier_type.clone(),
                value: entry.value.clone(),
            })
    }

    fn remove_identifier(&self, value: &str, object: &mut DigitalObject) -> Result<()> {
        let index = object
            .metadata
            .identifiers
            .iter()
            .position(|entry| entry.kind == self.metadata_kind && entry.value == value)
            .ok_or_else(|| CorrecterError::IdentifierNotFound {
                object_id: object.id.to_string(),
                service: self.name.clone(),
            })?;
        object.metadata.identifiers.remove(index);
        Ok(())
    }

    fn insert_identifier(
        &self,
        identifier: &PersistentIdentifier,
        object: &mut DigitalObject,
    ) -> Result<()> {
        if object
            .metadata
            .identifiers
            .iter()
            .any(|entry| entry.kind == self.metadata_kind)
        {
            return Err(CorrecterError::IdentifierAlreadyPresent {
                object_id: object.id.to_string(),
                kind: self.metadata_kind.clone(),
            });
        }

        object.metadata.identifiers.push(MetadataIdentifier {
            kind: self.metadata_kind.clone(),
            value: identifier.as_str().to_string(),
        });
        Ok(())
    }
}

/// Service name to identifier service.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Arc<dyn IdentifierService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, service: Arc<dyn IdentifierService>) {
        self.services.insert(service.name().to_string(), service);
    }

    pub fn service(&self, name: &str) -> Result<Arc<dyn IdentifierService>> {
        self.services
            .get(name)
            .cloned()
            .ok_or_else(|| CorrecterError::UnknownService {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urn_object(value: &str) -> DigitalObject {
        let mut object = DigitalObject::new("mir_mods_00000001".parse().unwrap());
        object.metadata.identifiers.push(MetadataIdentifier {
            kind: "isbn".to_string(),
            value: "978-3-16-148410-0".to_string(),
        });
        object.metadata.identifiers.push(MetadataIdentifier {
            kind: "urn".to_string(),
            value: value.to_string(),
        });
        object
    }

    #[test]
    fn test_remove_requires_exact_value() {
        let service = MetadataIdentifierService::new("DNBURN", "dnbUrn", "urn");
        let mut object = urn_object("urn:nbn:de--1");

        assert!(matches!(
            service.remove_identifier("urn:nbn:de-1", &mut object),
            Err(CorrecterError::IdentifierNotFound { .. })
        ));
        service.remove_identifier("urn:nbn:de--1", &mut object).unwrap();
        assert_eq!(object.metadata.identifiers.len(), 1);
        assert_eq!(object.metadata.identifiers[0].kind, "isbn");
    }

    #[test]
    fn test_insert_refuses_second_identifier_of_same_kind() {
        let service = MetadataIdentifierService::new("DNBURN", "dnbUrn", "urn");
        let mut object = urn_object("urn:nbn:de-1");
        let err = service
            .insert_identifier(&PersistentIdentifier::new("dnbUrn", "urn:nbn:de-2"), &mut object)
            .unwrap_err();
        assert!(matches!(err, CorrecterError::IdentifierAlreadyPresent { .. }));
    }

    #[test]
    fn test_service_registry_unknown_name() {
        let mut registry = ServiceRegistry::new();
        registry.register(Arc::new(MetadataIdentifierService::new(
            "DNBURN", "dnbUrn", "urn",
        )));
        assert_eq!(registry.service("DNBURN").unwrap().identifier_type(), "dnbUrn");
        assert!(matches!(
            registry.service("DOI"),
            Err(CorrecterError::UnknownService { .. })
        ));
    }
}
