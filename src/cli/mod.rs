//! Command-line interface components
//!
//! This module contains CLI-specific code for the Media Archiver application:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{ArchiveArgs, Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs};
pub use commands::{handle_archive, handle_config};
