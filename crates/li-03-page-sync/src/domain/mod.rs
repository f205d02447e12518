pub mod errors;
pub mod outcome;
pub mod page;
