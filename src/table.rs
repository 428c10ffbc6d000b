//! Table module for tabq
//!
//! This module provides the in-memory table representation used throughout
//! the query pipeline:
//!
//! - A `Value` cell type that keeps the original file text and interprets
//!   it numerically only when an operator asks for it
//! - An immutable-by-convention `Table` of named columns and rows
//! - The single-table operators hosted directly on `Table`: projection
//!   (SELECT), limiting (TAKE), and numeric ordering (ORDERBY)
//!
//! Operators never mutate their input; each one builds and returns a new
//! `Table`.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::{TabqError, TabqResult};

/// A single table cell
///
/// Cells hold the exact text read from the source file. Nothing is parsed
/// at load time: a column that is never sorted numerically never has to be
/// numeric. Equality, hashing, ordering and display all operate on the raw
/// text, which keeps join and group keys deterministic regardless of what
/// the text happens to contain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Value {
    raw: String,
}

impl Value {
    /// The cell text exactly as it appeared in the source file
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Interpret the cell as a number, on demand
    ///
    /// Returns `None` when the text does not parse as an f64. Callers that
    /// require a number (ORDERBY) turn `None` into a type error naming the
    /// offending column and value.
    pub fn as_number(&self) -> Option<f64> {
        self.raw.trim().parse::<f64>().ok()
    }

    /// Build a cell from a count, rendered in its native integer form
    pub fn from_count(count: usize) -> Self {
        Value {
            raw: count.to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value { raw: s.to_string() }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value { raw: s }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Represents a row in a table
pub type Row = Vec<Value>;

/// Represents an in-memory table
///
/// A `Table` pairs an ordered list of unique column names with a list of
/// rows; every row has exactly one cell per column (enforced by
/// [`Table::add_row`]). Column order is semantically significant and is
/// preserved exactly by every operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Name of the table (usually the source file stem)
    name: String,

    /// Column names, in schema order
    columns: Vec<String>,

    /// Map of column names to their indices
    column_map: HashMap<String, usize>,

    /// Rows of data
    rows: Vec<Row>,

    /// Source file path, if loaded from a file
    source_file: Option<PathBuf>,
}

impl Table {
    /// Create a new, empty table with the given name and columns
    pub fn new(name: &str, columns: Vec<String>, source_file: Option<PathBuf>) -> Self {
        let column_map = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Table {
            name: name.to_string(),
            columns,
            column_map,
            rows: Vec::new(),
            source_file,
        }
    }

    /// Get the columns of the table
    ///
    /// Column names keep the order they had when the table was created or
    /// loaded from a file.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get the column count
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the rows of the table
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get the row count
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the name of the table
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the source file path, if the table was loaded from a file
    pub fn source_file(&self) -> Option<&PathBuf> {
        self.source_file.as_ref()
    }

    /// Get the index of a column by name
    ///
    /// # Returns
    /// * `Some(usize)` with the column index if found
    /// * `None` if no column with that name exists
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_map.get(name).copied()
    }

    /// Add a row to the table
    ///
    /// Verifies that the row width matches the schema before appending.
    ///
    /// # Returns
    /// * `Ok(())` if the row was successfully added
    /// * `Err` if the row width does not match the column count
    pub fn add_row(&mut self, row: Row) -> TabqResult<()> {
        if row.len() != self.columns.len() {
            return Err(TabqError::Format {
                path: self.name.clone(),
                reason: format!(
                    "row has {} fields, but table '{}' has {} columns",
                    row.len(),
                    self.name,
                    self.columns.len()
                ),
            });
        }

        self.rows.push(row);
        Ok(())
    }

    /// Print the table to stdout in comma-delimited form
    ///
    /// An empty table prints its header only.
    pub fn print_to_stdout(&self) -> Result<()> {
        println!("{}", self.columns.join(","));

        for row in &self.rows {
            let line: Vec<&str> = row.iter().map(|v| v.as_str()).collect();
            println!("{}", line.join(","));
        }

        Ok(())
    }

    /// SELECT: create a new table with exactly the requested columns
    ///
    /// The result schema is `wanted` in the given order. Requesting the
    /// same column twice is allowed and yields duplicate output columns.
    /// Row order is preserved.
    ///
    /// # Returns
    /// * `Ok(Table)` re-keyed to the requested columns
    /// * `Err(TabqError::MissingColumn)` if any name is not in the schema
    pub fn project(&self, wanted: &[String]) -> TabqResult<Self> {
        let mut indices = Vec::with_capacity(wanted.len());
        for name in wanted {
            let idx = self
                .column_index(name)
                .ok_or_else(|| TabqError::MissingColumn {
                    stage: "SELECT",
                    column: name.clone(),
                })?;
            indices.push(idx);
        }

        let mut result = Table::new(&self.name, wanted.to_vec(), None);
        // Duplicate names collapse in column_map; rebuild rows by index so
        // duplicated columns still carry their values.
        for row in &self.rows {
            let projected: Row = indices.iter().map(|&i| row[i].clone()).collect();
            result.rows.push(projected);
        }

        Ok(result)
    }

    /// TAKE: create a new table holding the first `n` rows
    ///
    /// Asking for more rows than the table has returns all of them; the
    /// schema is unchanged either way.
    pub fn take(&self, n: usize) -> Self {
        let mut result = Table::new(&self.name, self.columns.clone(), None);
        result.rows = self.rows.iter().take(n).cloned().collect();
        result
    }

    /// ORDERBY: create a new table sorted ascending by a numeric column
    ///
    /// Every cell in `column` must parse as a number. The sort is stable,
    /// so rows with equal keys keep their relative input order.
    ///
    /// # Returns
    /// * `Ok(Table)` sorted by the parsed numeric value of `column`
    /// * `Err(TabqError::MissingColumn)` if the column does not exist
    /// * `Err(TabqError::NotNumeric)` on the first cell that fails to parse
    pub fn sort_numeric(&self, column: &str) -> TabqResult<Self> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| TabqError::MissingColumn {
                stage: "ORDERBY",
                column: column.to_string(),
            })?;

        // Parse every key up front so a bad cell fails the whole stage
        // instead of surfacing mid-sort.
        let mut keyed: Vec<(f64, &Row)> = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let key = row[idx].as_number().ok_or_else(|| TabqError::NotNumeric {
                stage: "ORDERBY",
                column: column.to_string(),
                value: row[idx].as_str().to_string(),
            })?;
            keyed.push((key, row));
        }

        // sort_by is stable; total_cmp gives a total order over f64
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut result = Table::new(&self.name, self.columns.clone(), None);
        result.rows = keyed.into_iter().map(|(_, row)| row.clone()).collect();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(
            "sample",
            vec!["id".to_string(), "name".to_string()],
            None,
        );
        t.add_row(vec![Value::from("2"), Value::from("b")]).unwrap();
        t.add_row(vec![Value::from("1"), Value::from("a")]).unwrap();
        t.add_row(vec![Value::from("10"), Value::from("c")]).unwrap();
        t
    }

    #[test]
    fn test_value_keeps_raw_text() {
        let v = Value::from("007");
        assert_eq!(v.as_str(), "007");
        assert_eq!(v.as_number(), Some(7.0));
        assert_eq!(v.to_string(), "007");
    }

    #[test]
    fn test_value_non_numeric() {
        assert_eq!(Value::from("Water").as_number(), None);
        assert_eq!(Value::from("").as_number(), None);
    }

    #[test]
    fn test_add_row_width_mismatch() {
        let mut t = sample();
        let err = t.add_row(vec![Value::from("lonely")]).unwrap_err();
        assert!(err.to_string().contains("1 fields"));
    }

    #[test]
    fn test_project_reorders_columns() {
        let t = sample();
        let p = t.project(&["name".to_string(), "id".to_string()]).unwrap();
        assert_eq!(p.columns(), &["name".to_string(), "id".to_string()]);
        assert_eq!(p.rows()[0][0].as_str(), "b");
        assert_eq!(p.rows()[0][1].as_str(), "2");
        assert_eq!(p.row_count(), 3);
    }

    #[test]
    fn test_project_duplicate_column() {
        let t = sample();
        let p = t.project(&["id".to_string(), "id".to_string()]).unwrap();
        assert_eq!(p.columns(), &["id".to_string(), "id".to_string()]);
        assert_eq!(p.rows()[1], vec![Value::from("1"), Value::from("1")]);
    }

    #[test]
    fn test_project_missing_column() {
        let t = sample();
        let err = t.project(&["ghost".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            TabqError::MissingColumn { stage: "SELECT", .. }
        ));
    }

    #[test]
    fn test_project_narrowing_is_composable() {
        // select(select(T, [name,id]), [id]) == select(T, [id])
        let t = sample();
        let wide = t.project(&["name".to_string(), "id".to_string()]).unwrap();
        let narrow = wide.project(&["id".to_string()]).unwrap();
        let direct = t.project(&["id".to_string()]).unwrap();
        assert_eq!(narrow.columns(), direct.columns());
        assert_eq!(narrow.rows(), direct.rows());
    }

    #[test]
    fn test_take_truncates() {
        let t = sample();
        assert_eq!(t.take(2).row_count(), 2);
        assert_eq!(t.take(0).row_count(), 0);
        assert_eq!(t.take(2).columns(), t.columns());
    }

    #[test]
    fn test_take_past_end_returns_all() {
        let t = sample();
        assert_eq!(t.take(99).row_count(), 3);
    }

    #[test]
    fn test_take_composes_as_min() {
        let t = sample();
        let a = t.take(2).take(1);
        let b = t.take(1);
        assert_eq!(a.rows(), b.rows());
    }

    #[test]
    fn test_sort_numeric_ascending() {
        let t = sample();
        let sorted = t.sort_numeric("id").unwrap();
        let ids: Vec<&str> = sorted.rows().iter().map(|r| r[0].as_str()).collect();
        // numeric order, not lexicographic: 1 < 2 < 10
        assert_eq!(ids, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_sort_numeric_is_stable() {
        let mut t = Table::new(
            "dup",
            vec!["k".to_string(), "tag".to_string()],
            None,
        );
        for (k, tag) in [("1", "first"), ("0", "zero"), ("1", "second")] {
            t.add_row(vec![Value::from(k), Value::from(tag)]).unwrap();
        }
        let sorted = t.sort_numeric("k").unwrap();
        let tags: Vec<&str> = sorted.rows().iter().map(|r| r[1].as_str()).collect();
        assert_eq!(tags, vec!["zero", "first", "second"]);
    }

    #[test]
    fn test_sort_numeric_idempotent() {
        let t = sample();
        let once = t.sort_numeric("id").unwrap();
        let twice = once.sort_numeric("id").unwrap();
        assert_eq!(once.rows(), twice.rows());
    }

    #[test]
    fn test_sort_numeric_rejects_text() {
        let t = sample();
        let err = t.sort_numeric("name").unwrap_err();
        match err {
            TabqError::NotNumeric { stage, column, value } => {
                assert_eq!(stage, "ORDERBY");
                assert_eq!(column, "name");
                assert_eq!(value, "b");
            }
            other => panic!("expected NotNumeric, got {other:?}"),
        }
    }

    #[test]
    fn test_sort_numeric_missing_column() {
        let t = sample();
        assert!(matches!(
            t.sort_numeric("ghost").unwrap_err(),
            TabqError::MissingColumn { stage: "ORDERBY", .. }
        ));
    }

    #[test]
    fn test_empty_table_operators() {
        let t = Table::new("empty", vec!["x".to_string()], None);
        assert_eq!(t.project(&["x".to_string()]).unwrap().row_count(), 0);
        assert_eq!(t.take(5).row_count(), 0);
        assert_eq!(t.sort_numeric("x").unwrap().row_count(), 0);
    }
}
