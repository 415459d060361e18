//! This module re-exports various items from the `entity_api` and `esp-client` crates.
//!
//! The purpose of this re-export is to ensure that consumers of the `domain` crate do not need to
//! directly depend on the lower layers. By re-exporting these items, we provide a clear and
//! consistent interface for the web layer, while the underlying implementation details remain
//! in `entity_api` and `esp-client`.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{esp_integrations, provider, Id};

// Provider-independent shapes returned by the ESP adapters
pub use esp_client::{AccountInfo, MailingList, ValidationResult};

pub mod error;
pub mod esp_integration;
