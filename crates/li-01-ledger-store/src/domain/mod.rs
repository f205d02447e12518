//! # Domain Layer
//!
//! Pure domain logic for the Ledger Store. No I/O lives here.
//!
//! ## Modules
//!
//! - `keys` - order-preserving block/transaction key codec
//! - `errors` - domain error types
//! - `validation` - structural checks on stored blocks

pub mod errors;
pub mod keys;
pub mod validation;
