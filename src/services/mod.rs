//! External collaborator services

pub mod catalog;

pub use catalog::{sync_catalog, CatalogClient, CatalogModel, SyncReport};
