//! # Ports
//!
//! - `outbound` - the ordered key-value store this library requires

pub mod outbound;
