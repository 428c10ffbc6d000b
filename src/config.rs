//! Configuration module for tabq
//!
//! This module provides a centralized configuration structure for the
//! application. Settings are captured once at startup and passed to the
//! components that need them rather than living in global state.

use std::path::PathBuf;

use crate::join::JoinStrategy;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Whether to show verbose output
    verbose: bool,

    /// Join algorithm used by JOIN stages
    strategy: JoinStrategy,

    /// Where to export the last query result, if anywhere
    output: Option<PathBuf>,
}

impl AppConfig {
    /// Create a new application configuration
    ///
    /// # Arguments
    /// * `verbose` - Whether to show verbose output
    /// * `strategy` - Join algorithm for JOIN stages
    /// * `output` - Optional export path for the last query result
    pub fn new(verbose: bool, strategy: JoinStrategy, output: Option<PathBuf>) -> Self {
        Self {
            verbose,
            strategy,
            output,
        }
    }

    /// Get the verbose flag
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Get the join strategy
    pub fn strategy(&self) -> JoinStrategy {
        self.strategy
    }

    /// Get the export path, if one was requested
    pub fn output(&self) -> Option<&PathBuf> {
        self.output.as_ref()
    }
}
