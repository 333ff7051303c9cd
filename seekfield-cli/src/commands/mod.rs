//! Subcommand implementations

pub mod fields;
pub mod lines;
pub mod seek;
