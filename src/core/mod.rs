pub mod correcter;
pub mod flag_sync;
pub mod grammar;
pub mod locator;
pub mod metadata_sync;
pub mod registry_sync;

pub use crate::domain::ports::{
    IdentifierParser, IdentifierService, ObjectStore, PiRegistry, StoreTransaction, UnitOfWork,
};
pub use crate::utils::error::Result;
