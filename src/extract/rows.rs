// src/extract/rows.rs

use crate::error::ShapeError;
use crate::extract::table::Column;
use std::collections::{HashMap, HashSet};

/// One materialized row: header label → raw cell text.
pub type RowRecord = HashMap<String, String>;

/// Turn column-major table data into one record per non-header column.
pub fn columns_to_records(columns: &[Column]) -> Result<Vec<RowRecord>, ShapeError> {
    let Some((header, data)) = columns.split_first() else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::with_capacity(header.len());
    if let Some(dup) = header.iter().find(|label| !seen.insert(label.as_str())) {
        return Err(ShapeError::DuplicateHeader { label: dup.clone() });
    }

    data.iter()
        .enumerate()
        .map(|(i, column)| {
            if column.len() != header.len() {
                return Err(ShapeError::ColumnLength {
                    column: i + 1,
                    expected: header.len(),
                    found: column.len(),
                });
            }
            Ok(header
                .iter()
                .cloned()
                .zip(column.iter().cloned())
                .collect::<RowRecord>())
        })
        .collect()
}
