use crate::domain::model::{ObjectId, RegistryRecord};
use crate::domain::ports::{PiRegistry, StoreTransaction};
use crate::utils::error::{CorrecterError, Result};

/// The registry row to drop and the row replacing it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryCorrection {
    pub stale: RegistryRecord,
    pub corrected: RegistryRecord,
}

/// Looks up the registry row for `(service, object_id, additional)` and
/// builds its replacement. Reads only.
pub async fn prepare_registry_correction<R: PiRegistry + ?Sized>(
    registry: &R,
    object_id: &ObjectId,
    service: &str,
    additional: &str,
    new_identifier: &str,
) -> Result<RegistryCorrection> {
    let stale = registry
        .get(service, object_id, additional)
        .await?
        .ok_or_else(|| CorrecterError::RegistryRecordMissing {
            object_id: object_id.to_string(),
            service: service.to_string(),
        })?;

    let corrected = stale.with_identifier(new_identifier);
    Ok(RegistryCorrection { stale, corrected })
}

/// Deletes the stale row and inserts the corrected one inside `tx`.
pub async fn apply_registry_correction<T: StoreTransaction>(
    tx: &mut T,
    correction: RegistryCorrection,
) -> Result<()> {
    let key = correction.stale.key();
    if !tx.delete(&key).await? {
        return Err(CorrecterError::RegistryRecordMissing {
            object_id: key.object_id.to_string(),
            service: key.service,
        });
    }
    tx.insert(correction.corrected).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DigitalObject, RegistryKey};
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct FixedRegistry(Option<RegistryRecord>);

    #[async_trait]
    impl PiRegistry for FixedRegistry {
        async fn get(
            &self,
            service: &str,
            object_id: &ObjectId,
            additional: &str,
        ) -> Result<Option<RegistryRecord>> {
            Ok(self.0.clone().filter(|record| {
                record.service == service
                    && &record.mycore_id == object_id
                    && record.additional == additional
            }))
        }
    }

    #[derive(Default)]
    struct RecordingTransaction {
        rows: Vec<RegistryRecord>,
    }

    #[async_trait]
    impl StoreTransaction for RecordingTransaction {
        async fn save(&mut self, _object: &DigitalObject) -> Result<()> {
            Ok(())
        }

        async fn delete(&mut self, key: &RegistryKey) -> Result<bool> {
            let before = self.rows.len();
            self.rows.retain(|row| !row.matches(key));
            Ok(self.rows.len() != before)
        }

        async fn insert(&mut self, record: RegistryRecord) -> Result<()> {
            self.rows.push(record);
            Ok(())
        }

        async fn commit(self) -> Result<()> {
            Ok(())
        }
    }

    fn record() -> RegistryRecord {
        RegistryRecord {
            id: Some(3),
            identifier: "urn:nbn:de--1234--5".to_string(),
            identifier_type: "dnbUrn".to_string(),
            mycore_id: "mir_mods_1".parse().unwrap(),
            additional: String::new(),
            service: "DNBURN".to_string(),
            registered: Some(chrono::Utc.with_ymd_and_hms(2019, 5, 3, 9, 12, 11).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_prepare_keeps_everything_but_identifier() {
        let registry = FixedRegistry(Some(record()));
        let id: ObjectId = "mir_mods_1".parse().unwrap();

        let correction = prepare_registry_correction(&registry, &id, "DNBURN", "", "urn:nbn:de-1234-5")
            .await
            .unwrap();

        assert_eq!(correction.stale, record());
        assert_eq!(correction.corrected.identifier, "urn:nbn:de-1234-5");
        assert_eq!(correction.corrected.key(), record().key());
        assert_eq!(correction.corrected.registered, record().registered);
    }

    #[tokio::test]
    async fn test_prepare_without_record_fails() {
        let registry = FixedRegistry(None);
        let id: ObjectId = "mir_mods_1".parse().unwrap();

        let err = prepare_registry_correction(&registry, &id, "DNBURN", "", "urn:nbn:de-1")
            .await
            .unwrap_err();
        assert!(matches!(err, CorrecterError::RegistryRecordMissing { .. }));
    }

    #[tokio::test]
    async fn test_apply_replaces_row() {
        let mut tx = RecordingTransaction {
            rows: vec![record()],
        };
        let correction = RegistryCorrection {
            stale: record(),
            corrected: record().with_identifier("urn:nbn:de-1234-5"),
        };

        apply_registry_correction(&mut tx, correction).await.unwrap();
        assert_eq!(tx.rows.len(), 1);
        assert_eq!(tx.rows[0].identifier, "urn:nbn:de-1234-5");
    }

    #[tokio::test]
    async fn test_apply_fails_when_row_vanished() {
        let mut tx = RecordingTransaction::default();
        let correction = RegistryCorrection {
            stale: record(),
            corrected: record().with_identifier("urn:nbn:de-1234-5"),
        };

        let err = apply_registry_correction(&mut tx, correction).await.unwrap_err();
        assert!(matches!(err, CorrecterError::RegistryRecordMissing { .. }));
        assert!(tx.rows.is_empty());
    }
}
