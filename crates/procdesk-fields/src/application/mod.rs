//! Application layer
//!
//! Assembles forms for a request context over the outbound ports.

pub mod commands;
pub mod dto;

pub use commands::FormAssemblyService;
pub use dto::*;
