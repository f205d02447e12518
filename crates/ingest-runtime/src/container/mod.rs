//! # Container
//!
//! Everything built once at startup.

pub mod config;
pub mod context;

pub use config::{
    ConfigError, IngestConfig, SourceConfig, SourceKind, StorageBackend, StorageConfig,
};
pub use context::PipelineContext;
