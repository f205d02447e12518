//! Cross-crate flows: source, page scheduler, reassembly engine and store.

pub mod ordering;
pub mod persistence;
pub mod resume;
pub mod support;
