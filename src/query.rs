//! Query parsing and pipeline evaluation for tabq
//!
//! A query is a single line of whitespace-separated tokens. It must start
//! with `FROM <path>`; every later keyword opens a stage whose argument
//! tokens run until the next keyword or the end of the line:
//!
//! ```text
//! FROM pokemon.csv JOIN stats.csv id COUNTBY type ORDERBY count TAKE 5
//! ```
//!
//! Evaluation is strictly left to right: each stage consumes the table the
//! previous stage produced. There is no reordering or optimization, and a
//! failed stage aborts the rest of the pipeline with no partial result.

use std::path::PathBuf;

use crate::error::{TabqError, TabqResult};
use crate::group::count_by;
use crate::join::{join, JoinStrategy};
use crate::loader::CsvLoader;
use crate::table::Table;

/// The fixed keyword set; anything else in keyword position is an error
const KEYWORDS: [&str; 6] = ["FROM", "JOIN", "SELECT", "COUNTBY", "ORDERBY", "TAKE"];

fn is_keyword(token: &str) -> bool {
    KEYWORDS.contains(&token)
}

/// Arguments of a JOIN stage: the right-hand file and the shared column
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub path: PathBuf,
    pub column: String,
}

/// One pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Join(JoinSpec),
    Select(Vec<String>),
    CountBy(String),
    OrderBy(String),
    Take(usize),
}

/// A parsed query: the FROM source plus the stages in source order
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub source: PathBuf,
    pub stages: Vec<Stage>,
}

/// Parse a query line into a [`Pipeline`]
///
/// # Returns
/// * `Ok(Pipeline)` when the line matches the grammar
/// * `Err(TabqError::Syntax)` naming the malformed stage otherwise
pub fn parse_query(line: &str) -> TabqResult<Pipeline> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if tokens.is_empty() {
        return Err(TabqError::Syntax("empty query".to_string()));
    }
    if tokens[0] != "FROM" {
        return Err(TabqError::Syntax(format!(
            "query must start with FROM, found '{}'",
            tokens[0]
        )));
    }

    let mut cursor = 1;
    let source_args = collect_args(&tokens, &mut cursor);
    let &[source] = source_args.as_slice() else {
        return Err(TabqError::Syntax(format!(
            "FROM takes exactly one path, found {} arguments",
            source_args.len()
        )));
    };

    let mut stages = Vec::new();
    while cursor < tokens.len() {
        let keyword = tokens[cursor];
        cursor += 1;
        if !is_keyword(keyword) {
            return Err(TabqError::Syntax(format!("unknown keyword '{keyword}'")));
        }
        let args = collect_args(&tokens, &mut cursor);
        stages.push(parse_stage(keyword, &args)?);
    }

    Ok(Pipeline {
        source: PathBuf::from(source),
        stages,
    })
}

/// Gather argument tokens up to the next keyword or end of line
fn collect_args<'a>(tokens: &[&'a str], cursor: &mut usize) -> Vec<&'a str> {
    let mut args = Vec::new();
    while *cursor < tokens.len() && !is_keyword(tokens[*cursor]) {
        args.push(tokens[*cursor]);
        *cursor += 1;
    }
    args
}

fn parse_stage(keyword: &str, args: &[&str]) -> TabqResult<Stage> {
    match keyword {
        "JOIN" => {
            let &[path, column] = args else {
                return Err(TabqError::Syntax(format!(
                    "JOIN takes a path and a column, found {} arguments",
                    args.len()
                )));
            };
            Ok(Stage::Join(JoinSpec {
                path: PathBuf::from(path),
                column: column.to_string(),
            }))
        }
        "SELECT" => {
            let &[list] = args else {
                return Err(TabqError::Syntax(format!(
                    "SELECT takes one comma-separated column list, found {} arguments",
                    args.len()
                )));
            };
            let columns: Vec<String> = list.split(',').map(|c| c.to_string()).collect();
            if columns.iter().any(|c| c.is_empty()) {
                return Err(TabqError::Syntax(format!(
                    "SELECT column list '{list}' contains an empty name"
                )));
            }
            Ok(Stage::Select(columns))
        }
        "COUNTBY" => {
            let &[column] = args else {
                return Err(TabqError::Syntax(format!(
                    "COUNTBY takes one column, found {} arguments",
                    args.len()
                )));
            };
            Ok(Stage::CountBy(column.to_string()))
        }
        "ORDERBY" => {
            let &[column] = args else {
                return Err(TabqError::Syntax(format!(
                    "ORDERBY takes one column, found {} arguments",
                    args.len()
                )));
            };
            Ok(Stage::OrderBy(column.to_string()))
        }
        "TAKE" => {
            let &[count] = args else {
                return Err(TabqError::Syntax(format!(
                    "TAKE takes one row count, found {} arguments",
                    args.len()
                )));
            };
            let n = count.parse::<usize>().map_err(|_| {
                TabqError::Syntax(format!(
                    "TAKE requires a non-negative integer, found '{count}'"
                ))
            })?;
            Ok(Stage::Take(n))
        }
        // FROM after the first position falls through to here
        other => Err(TabqError::Syntax(format!(
            "'{other}' cannot open a pipeline stage"
        ))),
    }
}

/// Evaluates query lines against tables loaded from disk
///
/// The runner owns the loader (and with it the per-process table cache)
/// and the configured join strategy. A failed query leaves the runner
/// usable for the next one.
pub struct QueryRunner {
    loader: CsvLoader,
    strategy: JoinStrategy,
}

impl QueryRunner {
    /// Create a runner with the given join strategy
    pub fn new(strategy: JoinStrategy) -> Self {
        QueryRunner {
            loader: CsvLoader::new(),
            strategy,
        }
    }

    /// The join strategy in effect
    pub fn strategy(&self) -> JoinStrategy {
        self.strategy
    }

    /// Switch the join strategy for subsequent queries
    pub fn set_strategy(&mut self, strategy: JoinStrategy) {
        self.strategy = strategy;
    }

    /// Names of tables loaded so far
    pub fn table_names(&self) -> Vec<String> {
        self.loader.table_names()
    }

    /// Number of tables loaded so far
    pub fn table_count(&self) -> usize {
        self.loader.table_count()
    }

    /// Parse and execute one query line
    ///
    /// Resolves the FROM source through the loader, then folds each stage
    /// over the current table in source order. The first failing stage
    /// aborts evaluation; no partial table is returned.
    pub fn evaluate(&mut self, line: &str) -> TabqResult<Table> {
        let pipeline = parse_query(line)?;

        let mut table = self.loader.load(&pipeline.source)?;
        for stage in &pipeline.stages {
            table = self.apply(table, stage)?;
        }

        Ok(table)
    }

    fn apply(&mut self, table: Table, stage: &Stage) -> TabqResult<Table> {
        match stage {
            Stage::Join(spec) => {
                let right = self.loader.load(&spec.path)?;
                join(&table, &right, &spec.column, self.strategy)
            }
            Stage::Select(columns) => table.project(columns),
            Stage::CountBy(column) => count_by(&table, column),
            Stage::OrderBy(column) => table.sort_numeric(column),
            Stage::Take(n) => Ok(table.take(*n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_full_pipeline() {
        let pipeline =
            parse_query("FROM a.csv JOIN b.csv id SELECT id,name COUNTBY name ORDERBY count TAKE 3")
                .unwrap();
        assert_eq!(pipeline.source, PathBuf::from("a.csv"));
        assert_eq!(
            pipeline.stages,
            vec![
                Stage::Join(JoinSpec {
                    path: PathBuf::from("b.csv"),
                    column: "id".to_string(),
                }),
                Stage::Select(vec!["id".to_string(), "name".to_string()]),
                Stage::CountBy("name".to_string()),
                Stage::OrderBy("count".to_string()),
                Stage::Take(3),
            ]
        );
    }

    #[test]
    fn test_parse_from_alone() {
        let pipeline = parse_query("FROM data.csv").unwrap();
        assert!(pipeline.stages.is_empty());
    }

    #[test]
    fn test_parse_rejects_empty_line() {
        assert!(matches!(
            parse_query("   ").unwrap_err(),
            TabqError::Syntax(_)
        ));
    }

    #[test]
    fn test_parse_rejects_missing_from() {
        let err = parse_query("SELECT name").unwrap_err();
        assert!(err.to_string().contains("must start with FROM"));
    }

    #[test]
    fn test_parse_rejects_from_without_path() {
        let err = parse_query("FROM SELECT name").unwrap_err();
        assert!(err.to_string().contains("exactly one path"));
    }

    #[test]
    fn test_parse_rejects_join_missing_column() {
        let err = parse_query("FROM a.csv JOIN b.csv TAKE 1").unwrap_err();
        assert!(err.to_string().contains("JOIN takes a path and a column"));
    }

    #[test]
    fn test_parse_rejects_extra_arguments() {
        let err = parse_query("FROM a.csv COUNTBY x y").unwrap_err();
        assert!(err.to_string().contains("COUNTBY takes one column"));
    }

    #[test]
    fn test_parse_rejects_non_integer_take() {
        let err = parse_query("FROM a.csv TAKE five").unwrap_err();
        assert!(err.to_string().contains("non-negative integer"));

        let err = parse_query("FROM a.csv TAKE -2").unwrap_err();
        assert!(err.to_string().contains("non-negative integer"));
    }

    #[test]
    fn test_parse_rejects_misplaced_from() {
        let err = parse_query("FROM a.csv FROM b.csv").unwrap_err();
        assert!(err.to_string().contains("cannot open a pipeline stage"));
    }

    #[test]
    fn test_parse_rejects_bad_leading_token() {
        // lowercase keywords are not recognized
        assert!(matches!(
            parse_query("from a.csv").unwrap_err(),
            TabqError::Syntax(_)
        ));
    }

    #[test]
    fn test_evaluate_select_take() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "people.csv", "id,name,age\n1,Alice,30\n2,Bob,25\n3,Eve,35\n");

        let mut runner = QueryRunner::new(JoinStrategy::Hash);
        let result = runner
            .evaluate(&format!("FROM {} SELECT name,id TAKE 2", path.display()))
            .unwrap();

        assert_eq!(result.columns(), &["name".to_string(), "id".to_string()]);
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.rows()[0][0].as_str(), "Alice");
    }

    #[test]
    fn test_evaluate_chained_joins() {
        let dir = TempDir::new().unwrap();
        let people = write_file(&dir, "people.csv", "id,name\n1,a\n2,b\n");
        let scores = write_file(&dir, "scores.csv", "id,score\n2,10\n1,20\n1,30\n");
        let flags = write_file(&dir, "flags.csv", "id,flag\n1,yes\n2,no\n");

        let mut runner = QueryRunner::new(JoinStrategy::SortMerge);
        let result = runner
            .evaluate(&format!(
                "FROM {} JOIN {} id JOIN {} id",
                people.display(),
                scores.display(),
                flags.display()
            ))
            .unwrap();

        assert_eq!(
            result.columns(),
            &[
                "id".to_string(),
                "name".to_string(),
                "score".to_string(),
                "flag".to_string(),
            ]
        );
        assert_eq!(result.row_count(), 3);
    }

    #[test]
    fn test_evaluate_countby_orderby_pipeline() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "mons.csv",
            "name,type\nSquirtle,Water\nBulbasaur,Grass\nPsyduck,Water\n",
        );

        let mut runner = QueryRunner::new(JoinStrategy::Hash);
        let result = runner
            .evaluate(&format!("FROM {} COUNTBY type ORDERBY count", path.display()))
            .unwrap();

        assert_eq!(result.columns(), &["type".to_string(), "count".to_string()]);
        assert_eq!(result.rows()[0][0].as_str(), "Grass");
        assert_eq!(result.rows()[1][0].as_str(), "Water");
    }

    #[test]
    fn test_failed_stage_aborts_and_runner_survives() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "t.csv", "id,name\n1,a\n");

        let mut runner = QueryRunner::new(JoinStrategy::Hash);
        let err = runner
            .evaluate(&format!("FROM {} ORDERBY name TAKE 1", path.display()))
            .unwrap_err();
        assert!(matches!(err, TabqError::NotNumeric { .. }));

        // The failed query does not poison the next one.
        let ok = runner
            .evaluate(&format!("FROM {} TAKE 1", path.display()))
            .unwrap();
        assert_eq!(ok.row_count(), 1);
    }

    #[test]
    fn test_join_source_loaded_once() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.csv", "id,x\n1,1\n");
        let b = write_file(&dir, "b.csv", "id,y\n1,2\n");

        let mut runner = QueryRunner::new(JoinStrategy::Hash);
        runner
            .evaluate(&format!("FROM {} JOIN {} id", a.display(), b.display()))
            .unwrap();
        assert_eq!(runner.table_count(), 2);

        // Both files come from the cache on the second run.
        std::fs::remove_file(&a).unwrap();
        std::fs::remove_file(&b).unwrap();
        let result = runner
            .evaluate(&format!("FROM {} JOIN {} id", a.display(), b.display()))
            .unwrap();
        assert_eq!(result.row_count(), 1);
    }
}
