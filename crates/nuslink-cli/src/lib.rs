//! nuslink CLI library
//!
//! Components of the `nuslink` terminal client: argument parsing, configuration, the
//! command handlers and the interactive serial terminal.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod terminal;

pub use cli::{Cli, Commands};
pub use config::AppConfig;
pub use error::{CliError, Result};
