//! HTML table extraction.
//!
//! The listing pages are plain server-rendered tables. The page is parsed
//! with `scraper`, the table is located with a CSS selector and each `<tr>`
//! of that table becomes one row of cell texts with whitespace collapsed.

use scraper::{ElementRef, Html, Selector};

use super::source::{FetchError, RawRow};

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Config(format!("invalid selector '{css}': {e:?}")))
}

/// Extract the `<td>` rows of a table.
///
/// `anchor` is a CSS selector (for example `#myTable`). When it matches a
/// `<table>` that table is used; when it matches another element the first
/// table inside it is used. Without an anchor the first table on the page
/// is used. Rows holding only `<th>` cells are skipped, as are rows of
/// tables nested inside the chosen one.
pub fn table_rows(html: &str, anchor: Option<&str>) -> Result<Vec<RawRow>, FetchError> {
    let css = anchor.unwrap_or("table");
    let anchor_sel = selector(css)?;
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;

    let document = Html::parse_document(html);
    let found = document
        .select(&anchor_sel)
        .next()
        .ok_or_else(|| FetchError::TableNotFound(css.to_string()))?;
    let table = if found.value().name() == "table" {
        found
    } else {
        found
            .select(&table_sel)
            .next()
            .ok_or_else(|| FetchError::TableNotFound(format!("table inside {css}")))?
    };

    let rows = table
        .select(&row_sel)
        .filter(|row| owning_table(*row).map(|t| t.id()) == Some(table.id()))
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| cell.value().name() == "td")
                .map(cell_text)
                .collect::<RawRow>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();
    Ok(rows)
}

fn owning_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")
}

/// Visible text of a cell: text nodes joined, entities already decoded by
/// the parser, whitespace (including `&nbsp;`) collapsed to single spaces.
pub fn cell_text(cell: ElementRef<'_>) -> String {
    let joined = cell.text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}
