pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::CorrecterConfig;

pub use adapters::{local_repository::LocalRepository, metadata_service::ServiceRegistry};
pub use core::correcter::{CorrectionOutcome, CorrectionReport, CorrectionSettings, UrnCorrecter};
pub use core::grammar::GrammarRegistry;
pub use domain::model::{DigitalObject, ObjectId, PersistentIdentifier, RegistryRecord};
pub use utils::error::{CorrecterError, Result};
