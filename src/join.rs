//! Join engine for tabq
//!
//! This module implements the inner equi-join of two tables on one shared
//! column, with two interchangeable strategies behind the same contract:
//!
//! - **Hash join**: index the lower-cardinality side in a key -> row-index
//!   multimap, probe the other side once. O(|left| + |right|) expected.
//! - **Sort-merge join**: stably sort a copy of each side by the key, then
//!   merge equal-key runs, emitting the cross product of each run pair.
//!   O(n log n + m log m).
//!
//! Both strategies produce the identical row multiset and the identical
//! schema: the left columns followed by the right columns with the key
//! column kept once, in its left position. Hash join emits rows in
//! left-major, right-minor input order regardless of which side was used
//! to build the index; sort-merge emits groups in key order, stable within
//! each equal-key run.
//!
//! Column-name policy: a non-key column present on both sides is a hard
//! schema error rather than a silent overwrite.

use std::collections::HashMap;

use clap::ValueEnum;

use crate::error::{TabqError, TabqResult};
use crate::table::{Row, Table, Value};

/// Join strategies supported by tabq
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JoinStrategy {
    /// Build a hash index over the smaller side, probe the larger
    Hash,
    /// Sort both sides by the key, merge equal-key runs
    SortMerge,
}

/// Compute the inner equi-join of `left` and `right` on `key`
///
/// # Arguments
/// * `left` - The left table; its column order leads the result schema
/// * `right` - The right table
/// * `key` - The shared join column, present in both schemas
/// * `strategy` - Which join algorithm to run
///
/// # Returns
/// * `Ok(Table)` with schema `left.columns ++ (right.columns - key)`
/// * `Err(TabqError::MissingColumn)` if `key` is absent from either side
/// * `Err(TabqError::AmbiguousColumn)` if the sides share a non-key column
pub fn join(left: &Table, right: &Table, key: &str, strategy: JoinStrategy) -> TabqResult<Table> {
    let left_key = left
        .column_index(key)
        .ok_or_else(|| TabqError::MissingColumn {
            stage: "JOIN",
            column: key.to_string(),
        })?;
    let right_key = right
        .column_index(key)
        .ok_or_else(|| TabqError::MissingColumn {
            stage: "JOIN",
            column: key.to_string(),
        })?;

    for column in right.columns() {
        if column != key && left.column_index(column).is_some() {
            return Err(TabqError::AmbiguousColumn {
                column: column.clone(),
            });
        }
    }

    let mut columns = left.columns().to_vec();
    columns.extend(
        right
            .columns()
            .iter()
            .filter(|c| c.as_str() != key)
            .cloned(),
    );

    let name = format!("{}_{}", left.name(), right.name());
    let mut result = Table::new(&name, columns, None);

    match strategy {
        JoinStrategy::Hash => hash_join(left, right, left_key, right_key, &mut result)?,
        JoinStrategy::SortMerge => merge_join(left, right, left_key, right_key, &mut result)?,
    }

    Ok(result)
}

/// Merge one row from each side, dropping the right side's key cell
fn merge_rows(left_row: &Row, right_row: &Row, right_key: usize) -> Row {
    let mut row = Vec::with_capacity(left_row.len() + right_row.len() - 1);
    row.extend(left_row.iter().cloned());
    for (i, value) in right_row.iter().enumerate() {
        if i != right_key {
            row.push(value.clone());
        }
    }
    row
}

/// Classic hash join: build over the smaller side, probe the larger
///
/// When the right side is the build side, probing the left in input order
/// yields left-major output directly. When the left side is the build
/// side, match indices are bucketed per left row during the probe so the
/// output can still be emitted left-major, right-minor.
fn hash_join(
    left: &Table,
    right: &Table,
    left_key: usize,
    right_key: usize,
    result: &mut Table,
) -> TabqResult<()> {
    if right.row_count() <= left.row_count() {
        let mut index: HashMap<&Value, Vec<usize>> = HashMap::new();
        for (r_idx, row) in right.rows().iter().enumerate() {
            index.entry(&row[right_key]).or_default().push(r_idx);
        }

        for left_row in left.rows() {
            if let Some(matches) = index.get(&left_row[left_key]) {
                for &r_idx in matches {
                    result.add_row(merge_rows(left_row, &right.rows()[r_idx], right_key))?;
                }
            }
        }
    } else {
        let mut index: HashMap<&Value, Vec<usize>> = HashMap::new();
        for (l_idx, row) in left.rows().iter().enumerate() {
            index.entry(&row[left_key]).or_default().push(l_idx);
        }

        // One pass over the probe side, collecting matches per left row so
        // the emitted order stays left-major even though left was indexed.
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); left.row_count()];
        for (r_idx, row) in right.rows().iter().enumerate() {
            if let Some(matches) = index.get(&row[right_key]) {
                for &l_idx in matches {
                    buckets[l_idx].push(r_idx);
                }
            }
        }

        for (l_idx, left_row) in left.rows().iter().enumerate() {
            for &r_idx in &buckets[l_idx] {
                result.add_row(merge_rows(left_row, &right.rows()[r_idx], right_key))?;
            }
        }
    }

    Ok(())
}

/// Sort-merge join: sort both sides by key, merge equal-key runs
fn merge_join(
    left: &Table,
    right: &Table,
    left_key: usize,
    right_key: usize,
    result: &mut Table,
) -> TabqResult<()> {
    // Sort row indices rather than rows; sort_by is stable, so ties keep
    // their original relative order on both sides.
    let mut left_order: Vec<usize> = (0..left.row_count()).collect();
    left_order.sort_by(|&a, &b| left.rows()[a][left_key].cmp(&left.rows()[b][left_key]));

    let mut right_order: Vec<usize> = (0..right.row_count()).collect();
    right_order.sort_by(|&a, &b| right.rows()[a][right_key].cmp(&right.rows()[b][right_key]));

    let mut i = 0;
    let mut j = 0;
    while i < left_order.len() && j < right_order.len() {
        let left_val = &left.rows()[left_order[i]][left_key];
        let right_val = &right.rows()[right_order[j]][right_key];

        match left_val.cmp(right_val) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                // Extend both cursors to the end of their equal-key runs
                let mut i_end = i + 1;
                while i_end < left_order.len()
                    && &left.rows()[left_order[i_end]][left_key] == left_val
                {
                    i_end += 1;
                }
                let mut j_end = j + 1;
                while j_end < right_order.len()
                    && &right.rows()[right_order[j_end]][right_key] == right_val
                {
                    j_end += 1;
                }

                for &l_idx in &left_order[i..i_end] {
                    for &r_idx in &right_order[j..j_end] {
                        result.add_row(merge_rows(
                            &left.rows()[l_idx],
                            &right.rows()[r_idx],
                            right_key,
                        ))?;
                    }
                }

                i = i_end;
                j = j_end;
            }
        }
    }

    Ok(())
}
