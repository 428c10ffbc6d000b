//! CLI argument parsing module for tabq
//!
//! This module handles parsing command-line arguments using the clap crate.
//! Users supply one or more query lines with `-q`, or drop into the
//! interactive shell with `-i`. The join algorithm is selectable per run
//! and the last query's result can be exported to a CSV file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::join::JoinStrategy;

/// Command-line arguments for tabq
///
/// The CLI is read-only by design: queries never modify their input files.
/// `--output` writes the final result to a separate file.
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Pipeline query tool for delimited files (FROM/JOIN/SELECT/COUNTBY/ORDERBY/TAKE)"
)]
pub struct TabqArgs {
    /// Query lines to execute
    ///
    /// Multiple queries can be provided and they run in sequence; loaded
    /// files are cached across them.
    /// Example: -q "FROM data.csv COUNTBY type ORDERBY count TAKE 5"
    #[clap(
        short,
        long,
        required_unless_present = "interactive",
        help = "Query line to execute"
    )]
    pub query: Vec<String>,

    /// Start in interactive mode (REPL)
    ///
    /// Launches a shell for entering queries with immediate feedback.
    /// Type .help in the shell to see available commands.
    #[clap(short, long, help = "Start in interactive mode")]
    pub interactive: bool,

    /// Join algorithm used by JOIN stages
    #[clap(
        long,
        value_enum,
        default_value_t = JoinStrategy::Hash,
        help = "Join algorithm: hash or sort-merge"
    )]
    pub strategy: JoinStrategy,

    /// Write the last query's result to a CSV file
    #[clap(short, long, help = "Export the last query result to this CSV file")]
    pub output: Option<PathBuf>,

    /// Enable verbose diagnostic output
    ///
    /// Shows which tables were loaded and how many rows each query
    /// returned.
    #[clap(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Parse command-line arguments into the TabqArgs structure
///
/// # Returns
/// * `Ok(TabqArgs)` - Command-line arguments successfully parsed
/// * `Err` - Error during argument parsing (handled by clap, usually results in help text display)
pub fn parse_args() -> Result<TabqArgs> {
    Ok(TabqArgs::parse())
}
