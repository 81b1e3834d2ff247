//! Domain module
//!
//! Field definitions, their evaluation services and the session aggregates.

pub mod aggregates;
pub mod events;
pub mod services;
pub mod value_objects;

pub use aggregates::*;
pub use events::*;
pub use value_objects::*;
