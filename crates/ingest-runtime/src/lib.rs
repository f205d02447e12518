//! # Ingest Runtime Library
//!
//! Wiring for the `ledger-ingest` binary, exposed as a library for tests.
//!
//! ## Modules
//!
//! - `container/` - configuration layering and the pipeline context
//! - `adapters/` - storage backends and block sources
//! - `cli` - command-line surface
//! - `commands` - the sync, validate and status commands

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod container;

pub use container::{IngestConfig, PipelineContext};
