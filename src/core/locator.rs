use crate::domain::model::{DigitalObject, RecordedIdentifier};
use crate::domain::ports::IdentifierService;
use crate::utils::error::{CorrecterError, Result};

/// Reads the identifier currently recorded on `object` for `service`.
pub fn locate(service: &dyn IdentifierService, object: &DigitalObject) -> Result<RecordedIdentifier> {
    let identifier =
        service
            .get_identifier(object)
            .ok_or_else(|| CorrecterError::IdentifierNotFound {
                object_id: object.id.to_string(),
                service: service.name().to_string(),
            })?;

    tracing::debug!(
        "Located {} identifier {} on {}",
        service.name(),
        identifier.value,
        object.id
    );
    Ok(identifier)
}
