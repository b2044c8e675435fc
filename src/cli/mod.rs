//! Command-line interface.

mod args;

pub mod build;
pub mod dev;
pub mod publish;

pub use args::{Cli, Commands};
