// Adapters layer: concrete implementations of the domain ports.

pub mod local_repository;
pub mod metadata_service;
