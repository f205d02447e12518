//! # Page Sync (li-03)
//!
//! Drives the reassembly engine one page of block numbers at a time and
//! resumes after a crash from the persisted cursor.
//!
//! ## Data Flow
//!
//! ```text
//! RecoveryDriver ──resume point──→ PageScheduler ──fetch_page──→ BlockSource
//!                                        ↑                            │
//!                                        └──── EventSink (mpsc) ←─────┘
//!                                        │
//!                                        └──apply──→ ReassemblyEngine ──→ LedgerStore
//! ```
//!
//! A failed page is retried whole from its original start. Events for
//! blocks already retired on an earlier attempt are dropped by the engine.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::sink::{event_channel, EventSink, EventStream};
pub use application::recovery::{plan_resume, RecoveryDriver, ResumePlan};
pub use application::scheduler::PageScheduler;
pub use config::SyncConfig;
pub use domain::errors::{FetchError, SyncError};
pub use domain::outcome::SyncOutcome;
pub use domain::page::PageRange;
pub use ports::outbound::BlockSource;
