//! tabq - a pipeline query tool for delimited files
//!
//! tabq loads CSV files into in-memory tables and runs pipeline queries
//! against them, one line per query:
//!
//! ```text
//! FROM pokemon.csv JOIN stats.csv id COUNTBY type ORDERBY count TAKE 5
//! ```
//!
//! The first stage is always `FROM <file>`; every later stage transforms
//! the table the previous stage produced, strictly left to right. JOIN is
//! an inner equi-join on one shared column, with a hash and a sort-merge
//! implementation selectable via `--strategy`.
//!
//! # Program Flow
//!
//! 1. Parse command-line arguments
//! 2. Run the interactive shell, or each `-q` query in order
//! 3. Print each result table to stdout
//! 4. Optionally export the last result to a CSV file

use anyhow::{Context, Result};

use tabq::cli;
use tabq::config::AppConfig;
use tabq::loader::CsvLoader;
use tabq::query::QueryRunner;
use tabq::repl::Repl;

/// Main entry point for the tabq utility
///
/// Builds a [`QueryRunner`] from the command-line configuration and either
/// hands it to the REPL or drives it over the `-q` queries in order. Query
/// results go to stdout; the loader's table cache is shared across all
/// queries of the run.
fn main() -> Result<()> {
    let args = cli::parse_args()?;

    let config = AppConfig::new(args.verbose, args.strategy, args.output.clone());

    if config.verbose() {
        println!("Running in verbose mode");
        println!("Arguments: {args:?}");
    }

    let runner = QueryRunner::new(config.strategy());

    if args.interactive {
        let mut repl = Repl::new(runner).context("failed to start interactive mode")?;
        repl.run().context("interactive mode failed")?;
        return Ok(());
    }

    let mut runner = runner;
    let mut last_result = None;

    for query in &args.query {
        if config.verbose() {
            println!("Executing query: {query}");
        }

        let result = runner
            .evaluate(query)
            .with_context(|| format!("failed to execute query: {query}"))?;

        if config.verbose() {
            println!("Query returned {} rows", result.row_count());
            println!("{} tables loaded", runner.table_count());
        }

        result.print_to_stdout()?;
        last_result = Some(result);
    }

    if let (Some(path), Some(table)) = (config.output(), last_result.as_ref()) {
        CsvLoader::export(table, path)
            .with_context(|| format!("failed to export result to {}", path.display()))?;
        if config.verbose() {
            println!("Exported {} rows to {}", table.row_count(), path.display());
        }
    }

    Ok(())
}
