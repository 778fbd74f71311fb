//! Metrics derived from fetched payloads and the report history.

mod casualties;
mod control;

pub use casualties::*;
pub use control::*;
