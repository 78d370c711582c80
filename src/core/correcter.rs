use crate::adapters::metadata_service::ServiceRegistry;
use crate::core::flag_sync::{correct_flag, FlagCodec};
use crate::core::grammar::{normalize, GrammarRegistry};
use crate::core::locator::locate;
use crate::core::metadata_sync::replace_identifier;
use crate::core::registry_sync::{
    apply_registry_correction, prepare_registry_correction, RegistryCorrection,
};
use crate::domain::model::{DigitalObject, ObjectId, PersistentIdentifier};
use crate::domain::ports::{ObjectStore, PiRegistry, StoreTransaction, UnitOfWork};
use crate::utils::error::{CorrecterError, Result};
use chrono::Utc;

pub const DEFAULT_SERVICE: &str = "DNBURN";
pub const DEFAULT_FLAG_TYPE: &str = "MyCoRe-PI";

#[derive(Debug, Clone)]
pub struct CorrectionSettings {
    pub service: String,
    pub flag_type: String,
    pub additional: String,
    /// Report a missing object as `ObjectNotFound` instead of skipping it.
    pub fail_on_missing_object: bool,
    pub dry_run: bool,
}

impl Default for CorrectionSettings {
    fn default() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_string(),
            flag_type: DEFAULT_FLAG_TYPE.to_string(),
            additional: String::new(),
            fail_on_missing_object: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionReport {
    pub object_id: ObjectId,
    pub previous: String,
    pub corrected: PersistentIdentifier,
    pub metadata_changed: bool,
    pub committed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionOutcome {
    Corrected(CorrectionReport),
    ObjectMissing,
}

/// In-memory result of a correction, ready to be committed.
#[derive(Debug, Clone)]
pub struct PreparedCorrection {
    pub report: CorrectionReport,
    pub registry: RegistryCorrection,
}

/// Brings the metadata, the flag log and the registry of one object to the
/// same normalized identifier.
pub struct UrnCorrecter<R> {
    repository: R,
    services: ServiceRegistry,
    grammars: GrammarRegistry,
    codec: FlagCodec,
    settings: CorrectionSettings,
}

impl<R> UrnCorrecter<R>
where
    R: ObjectStore + PiRegistry + UnitOfWork,
{
    pub fn new(
        repository: R,
        services: ServiceRegistry,
        grammars: GrammarRegistry,
        settings: CorrectionSettings,
    ) -> Self {
        Self {
            repository,
            services,
            grammars,
            codec: FlagCodec::default(),
            settings,
        }
    }

    pub fn with_codec(mut self, codec: FlagCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn settings(&self) -> &CorrectionSettings {
        &self.settings
    }

    pub async fn correct(&self, object_id: &ObjectId) -> Result<CorrectionOutcome> {
        if !self.repository.exists(object_id).await? {
            tracing::error!("Object with id {} does not exist!", object_id);
            if self.settings.fail_on_missing_object {
                return Err(CorrecterError::ObjectNotFound {
                    object_id: object_id.to_string(),
                });
            }
            return Ok(CorrectionOutcome::ObjectMissing);
        }

        let mut object = self.repository.retrieve(object_id).await?;
        let prepared = self.prepare(&mut object).await?;

        if self.settings.dry_run {
            tracing::info!(
                "Dry run: {} would change {} -> {}",
                object_id,
                prepared.report.previous,
                prepared.report.corrected
            );
            return Ok(CorrectionOutcome::Corrected(prepared.report));
        }

        let mut report = self.commit(&mut object, prepared).await?;
        report.committed = true;
        Ok(CorrectionOutcome::Corrected(report))
    }

    /// Runs every step that does not write to durable storage: locate,
    /// normalize, rewrite the metadata and the flag log of `object`, and look
    /// up the registry row. On error `object` may already be partly mutated.
    pub async fn prepare(&self, object: &mut DigitalObject) -> Result<PreparedCorrection> {
        let service = self.services.service(&self.settings.service)?;

        let recorded = locate(service.as_ref(), object)?;
        let parser = self.grammars.parser(service.identifier_type())?;
        let corrected = normalize(&recorded.value, parser.as_ref())?;

        let metadata_changed =
            replace_identifier(service.as_ref(), object, &recorded.value, &corrected)?;

        correct_flag(
            object,
            &self.codec,
            &self.settings.flag_type,
            service.name(),
            corrected.as_str(),
        )?;

        let registry = prepare_registry_correction(
            &self.repository,
            &object.id,
            service.name(),
            &self.settings.additional,
            corrected.as_str(),
        )
        .await?;

        Ok(PreparedCorrection {
            report: CorrectionReport {
                object_id: object.id.clone(),
                previous: recorded.value,
                corrected,
                metadata_changed,
                committed: false,
            },
            registry,
        })
    }

    /// Writes the registry swap and the object in one transaction.
    pub async fn commit(
        &self,
        object: &mut DigitalObject,
        prepared: PreparedCorrection,
    ) -> Result<CorrectionReport> {
        let mut tx = self.repository.begin().await?;
        apply_registry_correction(&mut tx, prepared.registry).await?;

        object.service.modified = Some(Utc::now());
        tx.save(object).await?;
        tx.commit().await?;

        tracing::info!(
            "Corrected {} identifier of {}: {}",
            self.settings.service,
            object.id,
            prepared.report.corrected
        );
        Ok(prepared.report)
    }
}
