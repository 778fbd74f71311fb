//! War report history.
//!
//! A bounded, oldest-first sequence of snapshots persisted as a JSON file.

mod models;
mod store;

pub use models::*;
pub use store::*;
