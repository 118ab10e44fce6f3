// src/error.rs

use crate::report::TableKind;
use thiserror::Error;

/// The page does not have the structure the extractor was configured for.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("invalid selector for container {position}: {detail}")]
    Selector { position: usize, detail: String },

    #[error("no content block at position {position}")]
    ContainerMissing { position: usize },

    #[error("content block {position} has no table body")]
    TableMissing { position: usize },

    #[error("table in content block {position} has no rows")]
    EmptyTable { position: usize },

    #[error("first row of table {position} has no cells")]
    EmptyHeaderRow { position: usize },

    #[error("row {row} of table {position} has {found} cells, header row has {expected}")]
    RowWidth {
        position: usize,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("column {column} has {found} values, header column has {expected}")]
    ColumnLength {
        column: usize,
        expected: usize,
        found: usize,
    },

    #[error("header label {label:?} appears more than once")]
    DuplicateHeader { label: String },
}

/// A measurement string could not be turned into a number.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown unit: {unit} (expected {})", .expected.unwrap_or("no unit"))]
    UnrecognizedUnit {
        unit: String,
        expected: Option<&'static str>,
    },

    #[error("expected 1 or 2 tokens, got {}: {tokens:?}", .tokens.len())]
    TokenCount { tokens: Vec<String> },

    #[error("not a valid number: {raw:?}")]
    InvalidNumber { raw: String },
}

/// Fatal conditions raised while turning one table into metric events.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{table} table: {source}")]
    Shape {
        table: TableKind,
        #[source]
        source: ShapeError,
    },

    #[error("{table} table: row {row} has no Index")]
    MissingIndex { table: TableKind, row: usize },

    #[error("{table} table, channel {channel}: field {label:?} = {raw:?}: {source}")]
    Field {
        table: TableKind,
        channel: String,
        label: &'static str,
        raw: String,
        #[source]
        source: ParseError,
    },
}
