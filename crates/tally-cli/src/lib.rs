//! Time log summarizer CLI library.
//!
//! This crate provides the command-line interface over `tally-core` and
//! `tally-db`.

mod cli;
pub mod commands;
mod config;
pub mod render;

pub use cli::{Cli, Commands, DbAction, OutputFormat, ReportArgs, ScanArgs};
pub use config::Config;
