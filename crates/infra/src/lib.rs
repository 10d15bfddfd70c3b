//! Infrastructure layer: keyed record stores and configuration loading.

pub mod config;
pub mod store;

pub use config::{CONFIG_ENV, ConfigError, ForgeplanConfig};
pub use store::{InMemoryStore, KeyedStore, StoreError};
