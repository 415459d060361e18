pub use entity::{esp_integrations, provider, Id};

pub mod error;
pub mod esp_integration;
