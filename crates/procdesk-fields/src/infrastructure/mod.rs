//! Infrastructure layer
//!
//! Concrete sources behind the outbound ports.

pub mod bundle;
pub mod persistence;

pub use bundle::FormBundle;
pub use persistence::{InMemoryFieldSource, InMemoryLookupSource};
