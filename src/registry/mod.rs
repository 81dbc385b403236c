//! Devfile registry access.

mod client;
mod types;

pub use client::{RegistryClient, RegistryError, DEFAULT_REGISTRY_TIMEOUT, MAX_INDEX_PAGES};
pub use types::{DevfileType, GitInfo, IndexEntry};
