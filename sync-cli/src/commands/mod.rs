//! CLI command implementations.

pub mod drain;
pub mod gate;
pub mod queue;
pub mod snapshot;
pub mod status;
