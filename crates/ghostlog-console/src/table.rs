//! Box-drawn tables for `table` calls.

use ghostlog_core::inspect::{InspectOptions, inspect};
use ghostlog_core::value::{PropertyKey, Value};

const INDEX_HEADER: &str = "(index)";
const VALUES_HEADER: &str = "Values";

/// Renders `data` as a table, or `None` when it is not tabular (not an object
/// or array), in which case the caller logs it normally.
///
/// Each entry of `data` is a row. Object rows contribute their keys as
/// columns, in order of first appearance; primitive rows fill a `Values`
/// column. `columns` restricts and orders the object columns shown.
#[must_use]
pub fn render_table(data: &Value, columns: Option<&[String]>) -> Option<String> {
    let Value::Object(object) = data else {
        return None;
    };

    let cell_options = InspectOptions::default().with_depth(Some(0));
    let cell = |value: &Value| inspect(value, &cell_options);

    let mut keys: Vec<String> = Vec::new();
    let mut has_values = false;
    let mut rows: Vec<(String, Vec<(String, String)>, Option<String>)> = Vec::new();

    for (key, value) in object.entries() {
        let index = match key {
            PropertyKey::Name(name) => name,
            PropertyKey::Symbol(desc) => format!("Symbol({desc})"),
        };
        match &value {
            Value::Object(row) => {
                let mut cells = Vec::new();
                for (column, item) in row.entries() {
                    let PropertyKey::Name(column) = column else {
                        continue;
                    };
                    if !keys.contains(&column) {
                        keys.push(column.clone());
                    }
                    cells.push((column, cell(&item)));
                }
                rows.push((index, cells, None));
            }
            primitive => {
                has_values = true;
                rows.push((index, Vec::new(), Some(cell(primitive))));
            }
        }
    }

    if let Some(filter) = columns {
        keys = filter.to_vec();
    }

    let mut header: Vec<String> = vec![INDEX_HEADER.to_string()];
    header.extend(keys.iter().cloned());
    if has_values {
        header.push(VALUES_HEADER.to_string());
    }

    let body: Vec<Vec<String>> = rows
        .into_iter()
        .map(|(index, cells, primitive)| {
            let mut line = vec![index];
            for key in &keys {
                let text = cells
                    .iter()
                    .find(|(column, _)| column == key)
                    .map(|(_, text)| text.clone())
                    .unwrap_or_default();
                line.push(text);
            }
            if has_values {
                line.push(primitive.unwrap_or_default());
            }
            line
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            std::iter::once(&header[i])
                .chain(body.iter().map(|row| &row[i]))
                .map(|text| console::measure_text_width(text))
                .max()
                .unwrap_or(0)
                + 2
        })
        .collect();

    let mut out = Vec::with_capacity(body.len() + 4);
    out.push(border(&widths, '┌', '┬', '┐'));
    out.push(row_line(&header, &widths));
    out.push(border(&widths, '├', '┼', '┤'));
    for row in &body {
        out.push(row_line(row, &widths));
    }
    out.push(border(&widths, '└', '┴', '┘'));
    Some(out.join("\n"))
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    format!("{left}{}{right}", segments.join(&mid.to_string()))
}

fn row_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(text, width)| {
            let pad = width.saturating_sub(console::measure_text_width(text) + 1);
            format!(" {text}{}", " ".repeat(pad))
        })
        .collect();
    format!("│{}│", padded.join("│"))
}
