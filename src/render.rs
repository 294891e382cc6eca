//! Plain-text rendering of result rows for the interactive shell.

use crate::row::Row;

/// Formats rows as an aligned text table followed by a row count.
///
/// Column headers come from the first row.
///
/// # Example
/// ```
/// use minidb::{Row, Value, render::format_table};
///
/// let row: Row = [("id", Value::Int(1)), ("title", Value::from("Dune"))]
///     .into_iter()
///     .collect();
/// assert_eq!(
///     format_table(&[row]),
///     "id | title\n---+------\n1  | Dune \n(1 rows)"
/// );
/// ```
pub fn format_table(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return "(0 rows)".to_string();
    };

    let headers: Vec<&str> = first.columns().collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|(_, value)| value.to_string()).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            cells
                .iter()
                .filter_map(|line| line.get(idx))
                .map(|cell| cell.chars().count())
                .fold(header.chars().count(), usize::max)
        })
        .collect();

    let pad = |text: &str, width: usize| format!("{text:<width$}");

    let mut out = String::new();
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, &width)| pad(header, width))
        .collect();
    out.push_str(&header_line.join(" | "));
    out.push('\n');

    let separator: Vec<String> = widths.iter().map(|&width| "-".repeat(width)).collect();
    out.push_str(&separator.join("-+-"));
    out.push('\n');

    for line in &cells {
        let padded: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| pad(cell, width))
            .collect();
        out.push_str(&padded.join(" | "));
        out.push('\n');
    }

    out.push_str(&format!("({} rows)", rows.len()));
    out
}
