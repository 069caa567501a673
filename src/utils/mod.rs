//! Utility modules.

pub mod env_file;

pub use env_file::{EnvFile, KeyValueStore, PersistOutcome};
