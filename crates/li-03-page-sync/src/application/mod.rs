//! # Application Module
//!
//! The page scheduler and the recovery driver that starts it.

pub mod recovery;
pub mod scheduler;
