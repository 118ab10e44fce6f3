// src/extract/table.rs

use crate::error::ShapeError;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

/// One structural column of a table; index 0 is the header label.
pub type Column = Vec<String>;

/// Child elements of `el` named `tag`, skipping text and comment nodes.
fn child_elements<'a>(
    el: ElementRef<'a>,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Extract the table held by the `position`-th (1-based) child block of
/// `#content`, column-major.
///
/// The column count comes from the first row; every other row must have
/// exactly that many cells.
pub fn extract_indexed_table(doc: &Html, position: usize) -> Result<Vec<Column>, ShapeError> {
    let selector = Selector::parse(&format!("#content > div:nth-child({})", position)).map_err(
        |e| ShapeError::Selector {
            position,
            detail: format!("{:?}", e),
        },
    )?;

    let container = doc
        .select(&selector)
        .next()
        .ok_or(ShapeError::ContainerMissing { position })?;

    // html5ever always inserts <tbody>, so the rows live one level down
    let body = child_elements(container, "table")
        .next()
        .and_then(|table| child_elements(table, "tbody").next())
        .ok_or(ShapeError::TableMissing { position })?;

    let mut rows = child_elements(body, "tr").peekable();
    let width = rows
        .peek()
        .map(|row| row.children().filter_map(ElementRef::wrap).count())
        .ok_or(ShapeError::EmptyTable { position })?;
    if width == 0 {
        return Err(ShapeError::EmptyHeaderRow { position });
    }

    let mut columns: Vec<Column> = vec![Vec::new(); width];
    for (row_idx, row) in rows.enumerate() {
        let cells: Vec<String> = row
            .children()
            .filter_map(ElementRef::wrap)
            .map(cell_text)
            .collect();
        if cells.len() != width {
            return Err(ShapeError::RowWidth {
                position,
                row: row_idx,
                expected: width,
                found: cells.len(),
            });
        }
        for (column, cell) in columns.iter_mut().zip(cells) {
            column.push(cell);
        }
    }

    trace!(position, columns = columns.len(), "extracted table");
    Ok(columns)
}
