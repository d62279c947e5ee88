//! # Nestcost Core
//!
//! Shared types for the nestcost costing engine: errors and warnings,
//! unit conversions, and the machine dynamics profile.
//!
//! All lengths are millimetres, times seconds, areas mm² and currency
//! PLN unless a name says otherwise.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod error;
pub mod machine;
pub mod units;

// Re-exports
pub use error::{Error, Result, Warning};
pub use machine::{CornerModel, MachineProfile};
