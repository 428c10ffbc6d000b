//! Grouped counting for tabq
//!
//! This module implements COUNTBY: grouping rows by the textual value of
//! one column and emitting one (value, count) row per distinct value, in
//! first-seen order.

use std::collections::HashMap;

use crate::error::{TabqError, TabqResult};
use crate::table::{Table, Value};

/// COUNTBY: count rows per distinct value of `column`
///
/// The result schema is `[column, "count"]`. Groups appear in the order
/// their value was first seen in the input; counts sum to the input row
/// count.
///
/// # Returns
/// * `Ok(Table)` with one row per distinct value
/// * `Err(TabqError::MissingColumn)` if the column does not exist
pub fn count_by(table: &Table, column: &str) -> TabqResult<Table> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| TabqError::MissingColumn {
            stage: "COUNTBY",
            column: column.to_string(),
        })?;

    // Keep first-seen order with a vec of groups; the map only tracks
    // which slot each value landed in.
    let mut slots: HashMap<&Value, usize> = HashMap::new();
    let mut groups: Vec<(&Value, usize)> = Vec::new();

    for row in table.rows() {
        let value = &row[idx];
        match slots.get(value) {
            Some(&slot) => groups[slot].1 += 1,
            None => {
                slots.insert(value, groups.len());
                groups.push((value, 1));
            }
        }
    }

    let mut result = Table::new(
        table.name(),
        vec![column.to_string(), "count".to_string()],
        None,
    );
    for (value, count) in groups {
        result.add_row(vec![value.clone(), Value::from_count(count)])?;
    }

    Ok(result)
}
