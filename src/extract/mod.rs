pub mod rows;
pub mod table;

pub use rows::{columns_to_records, RowRecord};
pub use table::{extract_indexed_table, Column};
