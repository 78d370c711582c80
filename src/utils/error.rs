use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorrecterError {
    #[error("Object {object_id} does not exist")]
    ObjectNotFound { object_id: String },

    #[error("Invalid object id '{value}': {reason}")]
    InvalidObjectId { value: String, reason: String },

    #[error("Can not read {service} identifier from {object_id}")]
    IdentifierNotFound { object_id: String, service: String },

    #[error("Identifier '{value}' is not a valid {identifier_type}")]
    MalformedIdentifier {
        value: String,
        identifier_type: String,
    },

    #[error("Object {object_id} already carries a {kind} identifier")]
    IdentifierAlreadyPresent { object_id: String, kind: String },

    #[error("Could not find {service} flag to update on {object_id}")]
    FlagNotFound { object_id: String, service: String },

    #[error("Found {count} {service} flags on {object_id}, expected exactly one")]
    AmbiguousFlag {
        object_id: String,
        service: String,
        count: usize,
    },

    #[error("No {service} registry record for {object_id}")]
    RegistryRecordMissing { object_id: String, service: String },

    #[error("Unknown identifier service: {name}")]
    UnknownService { name: String },

    #[error("No grammar registered for identifier type: {identifier_type}")]
    UnknownIdentifierType { identifier_type: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Consistency,
    Codec,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CorrecterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ObjectNotFound { .. } | Self::InvalidObjectId { .. } => ErrorCategory::Input,
            Self::IdentifierNotFound { .. }
            | Self::MalformedIdentifier { .. }
            | Self::IdentifierAlreadyPresent { .. }
            | Self::FlagNotFound { .. }
            | Self::AmbiguousFlag { .. }
            | Self::RegistryRecordMissing { .. } => ErrorCategory::Consistency,
            Self::SerializationError(_) => ErrorCategory::Codec,
            Self::IoError(_) | Self::StorageError { .. } => ErrorCategory::Storage,
            Self::UnknownService { .. }
            | Self::UnknownIdentifierType { .. }
            | Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Consistency | ErrorCategory::Codec => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ObjectNotFound { .. } => "Check the object id against the object store",
            Self::InvalidObjectId { .. } => {
                "Object ids look like <project>_<type>_<number>, e.g. mir_mods_00000001"
            }
            Self::IdentifierNotFound { .. } => {
                "The object has no identifier for this service; nothing to correct"
            }
            Self::MalformedIdentifier { .. } => {
                "The identifier is broken beyond doubled separators and needs manual repair"
            }
            Self::IdentifierAlreadyPresent { .. } => {
                "Remove the duplicate identifier from the object metadata and re-run"
            }
            Self::FlagNotFound { .. } | Self::AmbiguousFlag { .. } => {
                "Inspect the object's service flags; exactly one flag per service is expected"
            }
            Self::RegistryRecordMissing { .. } => {
                "Register the identifier in the registry before correcting it"
            }
            Self::SerializationError(_) => "A service flag or stored file holds invalid JSON and needs manual repair",
            Self::IoError(_) | Self::StorageError { .. } => {
                "Check the data directory permissions and free space, then re-run"
            }
            Self::UnknownService { .. } | Self::UnknownIdentifierType { .. } => {
                "Declare the service and its identifier type in the [[services]] config section"
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the configuration file and re-run",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Invalid request: {}", self),
            ErrorCategory::Consistency => format!("Correction aborted: {}", self),
            ErrorCategory::Codec => format!("Unreadable stored data: {}", self),
            ErrorCategory::Storage => format!("Storage failure: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, CorrecterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistency_errors_are_high_severity() {
        let err = CorrecterError::FlagNotFound {
            object_id: "mir_mods_00000001".to_string(),
            service: "DNBURN".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Consistency);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().starts_with("Correction aborted"));
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = CorrecterError::MissingConfigError {
            field: "services".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
