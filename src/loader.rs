//! CSV loading and export for tabq
//!
//! This module turns delimited files into in-memory [`Table`]s and writes
//! finished tables back out. It provides:
//!
//! - Loading with a mandatory header row; cell text is stored verbatim
//!   (no type inference at load time)
//! - Header validation: an empty or duplicated header is a format error
//! - A per-process cache so a file referenced by several queries (or by
//!   several JOIN stages) is parsed once
//! - Writing a result table to a CSV file for export
//!
//! The loader is the only component that touches the file system; the
//! operators in the rest of the crate work purely on in-memory tables.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{TabqError, TabqResult};
use crate::table::{Table, Value};

/// Loads delimited files into tables, caching by path
///
/// The cache lives for the whole process: interactive sessions that query
/// the same file repeatedly only pay the parse cost once. Cached tables
/// are handed out as clones, so nothing an operator does can leak back
/// into the cache.
pub struct CsvLoader {
    /// Parsed tables indexed by their source path
    cache: HashMap<PathBuf, Table>,
}

impl CsvLoader {
    /// Create a new loader with an empty cache
    pub fn new() -> Self {
        CsvLoader {
            cache: HashMap::new(),
        }
    }

    /// Load a CSV file into a table
    ///
    /// The first row is the header and defines the schema; every data row
    /// must have the same number of fields. Repeated loads of the same
    /// path are served from the cache.
    ///
    /// # Returns
    /// * `Ok(Table)` on success
    /// * `Err(TabqError::Io)` if the file cannot be opened
    /// * `Err(TabqError::Format)` if the header is empty or duplicated
    /// * `Err(TabqError::Csv)` if a row's field count does not match
    pub fn load(&mut self, path: &Path) -> TabqResult<Table> {
        if let Some(table) = self.cache.get(path) {
            return Ok(table.clone());
        }

        let table = self.read_file(path)?;
        self.cache.insert(path.to_path_buf(), table.clone());
        Ok(table)
    }

    fn read_file(&self, path: &Path) -> TabqResult<Table> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(|s| s.to_string()).collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(TabqError::Format {
                path: path.display().to_string(),
                reason: "empty header row".to_string(),
            });
        }

        // Duplicate header names would make column lookups ambiguous
        for (i, name) in headers.iter().enumerate() {
            if headers[..i].contains(name) {
                return Err(TabqError::Format {
                    path: path.display().to_string(),
                    reason: format!("duplicate column '{name}' in header"),
                });
            }
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let mut table = Table::new(&name, headers, Some(path.to_path_buf()));

        for record in csv_reader.records() {
            let record = record?;
            let row = record.iter().map(Value::from).collect();
            table.add_row(row)?;
        }

        Ok(table)
    }

    /// Write a table to a CSV file
    ///
    /// Writes the header followed by every row, comma-delimited. Used by
    /// the `--output` flag and the REPL `.save` command.
    pub fn export(table: &Table, path: &Path) -> TabqResult<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);

        csv_writer.write_record(table.columns())?;
        for row in table.rows() {
            csv_writer.write_record(row.iter().map(|v| v.as_str()))?;
        }
        csv_writer.flush()?;

        Ok(())
    }

    /// Names of all cached tables
    pub fn table_names(&self) -> Vec<String> {
        self.cache.values().map(|t| t.name().to_string()).collect()
    }

    /// Number of cached tables
    pub fn table_count(&self) -> usize {
        self.cache.len()
    }
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_basic() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "pets.csv", "id,name\n1,Rex\n2,Milo\n");

        let mut loader = CsvLoader::new();
        let table = loader.load(&path).unwrap();

        assert_eq!(table.name(), "pets");
        assert_eq!(table.columns(), &["id".to_string(), "name".to_string()]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1][1].as_str(), "Milo");
    }

    #[test]
    fn test_load_keeps_text_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "t.csv", "code\n007\n");

        let mut loader = CsvLoader::new();
        let table = loader.load(&path).unwrap();
        // no coercion at load time: the leading zeroes survive
        assert_eq!(table.rows()[0][0].as_str(), "007");
    }

    #[test]
    fn test_load_is_cached() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "t.csv", "a\n1\n");

        let mut loader = CsvLoader::new();
        loader.load(&path).unwrap();
        assert_eq!(loader.table_count(), 1);

        // A second load must not re-read the file.
        std::fs::remove_file(&path).unwrap();
        let table = loader.load(&path).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(loader.table_count(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut loader = CsvLoader::new();
        let err = loader.load(Path::new("/no/such/file.csv")).unwrap_err();
        assert!(matches!(err, TabqError::Io(_)));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.csv", "a,b\n1,2\n3\n");

        let mut loader = CsvLoader::new();
        let err = loader.load(&path).unwrap_err();
        assert!(matches!(err, TabqError::Csv(_)));
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "dup.csv", "a,b,a\n1,2,3\n");

        let mut loader = CsvLoader::new();
        let err = loader.load(&path).unwrap_err();
        assert!(err.to_string().contains("duplicate column 'a'"));
    }

    #[test]
    fn test_empty_header_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.csv", "");

        let mut loader = CsvLoader::new();
        let err = loader.load(&path).unwrap_err();
        assert!(matches!(err, TabqError::Format { .. }));
    }

    #[test]
    fn test_export_round_trip() {
        let dir = TempDir::new().unwrap();
        let src = write_file(&dir, "in.csv", "x,y\n1,a\n2,b\n");
        let out = dir.path().join("out.csv");

        let mut loader = CsvLoader::new();
        let table = loader.load(&src).unwrap();
        CsvLoader::export(&table, &out).unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written, "x,y\n1,a\n2,b\n");
    }
}
