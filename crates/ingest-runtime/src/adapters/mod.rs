//! # Adapters
//!
//! Storage backends behind `KeyValueStore` and block sources behind
//! `BlockSource`.

pub mod sources;
pub mod storage;
