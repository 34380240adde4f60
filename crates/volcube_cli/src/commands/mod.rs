//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod coterminal;
pub mod cube;
pub mod input;
