//! Interactive shell for tabq
//!
//! A rustyline-backed REPL: query lines are evaluated and printed, dot
//! commands control the session. A failed query reports its error and the
//! loop continues; the table cache survives across queries.

use std::fmt;
use std::path::Path;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use crate::error::TabqError;
use crate::join::JoinStrategy;
use crate::loader::CsvLoader;
use crate::query::QueryRunner;
use crate::table::Table;

/// Errors specific to running the interactive shell
#[derive(Debug)]
pub enum ReplError {
    Readline(ReadlineError),
    Io(std::io::Error),
    Tabq(TabqError),
}

impl fmt::Display for ReplError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplError::Readline(err) => write!(f, "input error: {}", err),
            ReplError::Io(err) => write!(f, "I/O error: {}", err),
            ReplError::Tabq(err) => write!(f, "query error: {}", err),
        }
    }
}

impl std::error::Error for ReplError {}

impl From<ReadlineError> for ReplError {
    fn from(err: ReadlineError) -> Self {
        ReplError::Readline(err)
    }
}

impl From<std::io::Error> for ReplError {
    fn from(err: std::io::Error) -> Self {
        ReplError::Io(err)
    }
}

impl From<TabqError> for ReplError {
    fn from(err: TabqError) -> Self {
        ReplError::Tabq(err)
    }
}

pub type Result<T> = std::result::Result<T, ReplError>;

const HISTORY_FILE: &str = ".tabq_history";

/// Completer for REPL dot commands
#[derive(Default)]
struct CommandCompleter {
    /// List of available dot commands for auto-completion
    commands: Vec<String>,
}

impl CommandCompleter {
    fn new() -> Self {
        let commands = [
            ".exit", ".help", ".quit", ".save", ".strategy", ".tables", ".version",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Self { commands }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        // Only dot commands are completed; query keywords are short enough
        // to type.
        if line.starts_with('.') {
            let partial = line.split(' ').next().unwrap_or(line);
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(partial))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();

            Ok((0, candidates))
        } else {
            Ok((pos, vec![]))
        }
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}

impl Validator for CommandCompleter {}

impl Helper for CommandCompleter {}

/// Commands that can be executed in the REPL
#[derive(Debug)]
enum ReplCommand {
    /// Evaluate a query line
    Query(String),
    /// Show the list of loaded tables
    Tables,
    /// Show or switch the join strategy
    Strategy(Option<String>),
    /// Export the last result to a CSV file
    Save(String),
    /// Show help message
    Help,
    /// Show version information
    Version,
    /// Exit the REPL
    Exit,
    /// Unknown command
    Unknown(String),
}

fn parse_command(line: &str) -> ReplCommand {
    if !line.starts_with('.') {
        return ReplCommand::Query(line.to_string());
    }

    let mut parts = line.splitn(2, ' ');
    let command = parts.next().unwrap_or_default();
    let arg = parts.next().map(|s| s.trim().to_string());

    match command {
        ".exit" | ".quit" => ReplCommand::Exit,
        ".help" => ReplCommand::Help,
        ".tables" => ReplCommand::Tables,
        ".strategy" => ReplCommand::Strategy(arg),
        ".version" => ReplCommand::Version,
        ".save" => match arg {
            Some(path) if !path.is_empty() => ReplCommand::Save(path),
            _ => ReplCommand::Unknown(".save requires a file path".to_string()),
        },
        other => ReplCommand::Unknown(format!("unknown command '{other}', try .help")),
    }
}

/// REPL interface for interactive query entry
pub struct Repl {
    /// Query runner holding the table cache and join strategy
    runner: QueryRunner,
    /// Rustyline editor for command line editing
    editor: Editor<CommandCompleter, DefaultHistory>,
    /// Result of the most recent successful query, for .save
    last_result: Option<Table>,
    /// Whether the REPL keeps reading
    running: bool,
}

impl Repl {
    /// Create a new REPL around a query runner
    pub fn new(runner: QueryRunner) -> Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(CommandCompleter::new()));

        Ok(Repl {
            runner,
            editor,
            last_result: None,
            running: true,
        })
    }

    /// Run the read-eval-print loop until exit or end of input
    pub fn run(&mut self) -> Result<()> {
        // A missing history file on first launch is expected.
        let _ = self.editor.load_history(HISTORY_FILE);

        println!("tabq interactive shell; type .help for commands, .exit to leave");

        while self.running {
            match self.editor.readline("tabq> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    self.editor.add_history_entry(line)?;
                    self.handle(line);
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        let _ = self.editor.save_history(HISTORY_FILE);
        Ok(())
    }

    fn handle(&mut self, line: &str) {
        match parse_command(line) {
            ReplCommand::Query(query) => match self.runner.evaluate(&query) {
                Ok(table) => {
                    if table.row_count() == 0 {
                        println!("{}", table.columns().join(","));
                        println!("(no data returned)");
                    } else if let Err(err) = table.print_to_stdout() {
                        eprintln!("error: {err}");
                    }
                    self.last_result = Some(table);
                }
                Err(err) => eprintln!("error: {err}"),
            },
            ReplCommand::Tables => {
                let mut names = self.runner.table_names();
                names.sort();
                if names.is_empty() {
                    println!("no tables loaded yet");
                } else {
                    for name in names {
                        println!("{name}");
                    }
                }
            }
            ReplCommand::Strategy(arg) => self.handle_strategy(arg),
            ReplCommand::Save(path) => match &self.last_result {
                Some(table) => match CsvLoader::export(table, Path::new(&path)) {
                    Ok(()) => println!("wrote {} rows to {path}", table.row_count()),
                    Err(err) => eprintln!("error: {err}"),
                },
                None => println!("no result to save yet"),
            },
            ReplCommand::Help => self.print_help(),
            ReplCommand::Version => {
                println!("tabq {}", env!("CARGO_PKG_VERSION"));
            }
            ReplCommand::Exit => self.running = false,
            ReplCommand::Unknown(message) => println!("{message}"),
        }
    }

    fn handle_strategy(&mut self, arg: Option<String>) {
        match arg.as_deref() {
            None | Some("") => {
                let current = match self.runner.strategy() {
                    JoinStrategy::Hash => "hash",
                    JoinStrategy::SortMerge => "sort-merge",
                };
                println!("join strategy: {current}");
            }
            Some("hash") => self.runner.set_strategy(JoinStrategy::Hash),
            Some("sort-merge") => self.runner.set_strategy(JoinStrategy::SortMerge),
            Some(other) => println!("unknown strategy '{other}', expected hash or sort-merge"),
        }
    }

    fn print_help(&self) {
        println!("queries:");
        println!("  FROM <file> [JOIN <file> <col>] [SELECT <c1,c2>] [COUNTBY <col>] [ORDERBY <col>] [TAKE <n>]");
        println!("commands:");
        println!("  .tables              list loaded tables");
        println!("  .strategy [name]     show or set join strategy (hash, sort-merge)");
        println!("  .save <file>         export the last result as CSV");
        println!("  .version             show version information");
        println!("  .help                show this message");
        println!("  .exit | .quit        leave the shell");
    }
}
