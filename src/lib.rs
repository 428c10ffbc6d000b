//! tabq library crate
//!
//! This is the library component of tabq, a pipeline query tool for
//! delimited files. The library provides:
//!
//! - CSV loading with header validation and a per-process table cache
//! - An in-memory `Table` of textual cells, interpreted numerically only
//!   when an operator needs a number
//! - Inner equi-joins with interchangeable hash and sort-merge strategies
//! - Projection (SELECT), grouped counting (COUNTBY), stable numeric
//!   ordering (ORDERBY) and limiting (TAKE)
//! - A pipeline evaluator that parses a query line into stages and folds
//!   them over the table, strictly left to right
//!
//! The library is deliberately small: operator order is exactly the order
//! written, and every operator returns a fresh table rather than mutating
//! its input.

pub mod cli;
pub mod config;
pub mod error;
pub mod group;
pub mod join;
pub mod loader;
pub mod query;
pub mod repl;
pub mod table;
