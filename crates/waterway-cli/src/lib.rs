//! Waterway CLI library.
//!
//! Terminal styling and report formatting shared by the `waterway-cli`
//! subcommands.

pub mod output;
pub mod terminal;
