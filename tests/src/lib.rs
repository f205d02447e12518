//! # Ledger Ingest Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── ingest_benchmarks.rs  # Codec, store and reassembly throughput
//! └── src/integration/
//!     ├── support.rs            # Instrumented key-value store
//!     ├── ordering.rs           # Shuffled delivery, retries, violations
//!     ├── resume.rs             # Idempotent restart, crash, cancellation
//!     └── persistence.rs        # File store and runtime end to end
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p li-tests
//! cargo test -p li-tests integration::resume
//! cargo bench -p li-tests
//! ```

pub mod integration;
