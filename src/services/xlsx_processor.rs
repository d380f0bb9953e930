//! Tabular text rendering of the first worksheet of a workbook.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::DetectedType;

const EMPTY_FRAME: &str = "Empty DataFrame";
const MISSING: &str = "NaN";
const COLUMN_GAP: &str = "  ";
const MAX_PRECISION: usize = 6;

/// Renders the first worksheet as an indexed text table.
pub fn extract_text(bytes: &[u8]) -> AppResult<String> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| failure(format!("Failed to open workbook: {}", e)))?;

    let Some(sheet) = workbook.sheet_names().into_iter().next() else {
        return Ok(EMPTY_FRAME.to_string());
    };

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| failure(format!("Failed to read sheet '{}': {}", sheet, e)))?;

    let cells: Vec<Vec<Data>> = range.rows().map(<[Data]>::to_vec).collect();
    debug!(sheet = %sheet, rows = cells.len(), "Worksheet loaded");

    Ok(render_table(&render_rows(&cells)))
}

/// Formats worksheet cells column by column. A column holding only numbers
/// is a float column once it has a gap or a fractional value; its numbers
/// then share one precision, so `1` renders as `1.0` next to `NaN`.
pub fn render_rows(rows: &[Vec<Data>]) -> Vec<Vec<String>> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let precisions: Vec<Option<usize>> = (0..width)
        .map(|i| float_precision(data.iter().map(|row| row.get(i))))
        .collect();

    let mut rendered = Vec::with_capacity(rows.len());
    rendered.push(header.iter().map(render_cell).collect());
    for row in data {
        rendered.push(
            (0..width)
                .map(|i| match (row.get(i), precisions[i]) {
                    (Some(cell), Some(precision)) => match cell {
                        Data::Int(v) => format!("{:.*}", precision, *v as f64),
                        Data::Float(v) if !v.is_nan() => format!("{:.*}", precision, v),
                        _ => MISSING.to_string(),
                    },
                    (Some(cell), None) => render_cell(cell),
                    (None, _) => MISSING.to_string(),
                })
                .collect(),
        );
    }
    rendered
}

/// Shared decimal places for a float column, or `None` when the column is
/// not one.
fn float_precision<'a>(column: impl Iterator<Item = Option<&'a Data>>) -> Option<usize> {
    let mut has_number = false;
    let mut has_gap = false;
    let mut decimals = 0;

    for cell in column {
        match cell {
            None | Some(Data::Empty) => has_gap = true,
            Some(Data::String(s)) if s.is_empty() => has_gap = true,
            Some(Data::Int(_)) => has_number = true,
            Some(Data::Float(v)) if v.is_nan() => has_gap = true,
            Some(Data::Float(v)) => {
                has_number = true;
                if v.fract() != 0.0 {
                    let repr = v.to_string();
                    let places = repr.split_once('.').map_or(0, |(_, frac)| frac.len());
                    decimals = decimals.max(places.min(MAX_PRECISION));
                }
            }
            Some(_) => return None,
        }
    }

    (has_number && (has_gap || decimals > 0)).then_some(decimals.max(1))
}

/// Lays out `rows` with the first row as header and a zero-based index
/// column. Rows shorter than the widest row are padded with `NaN`.
pub fn render_table(rows: &[Vec<String>]) -> String {
    let Some((header_row, data)) = rows.split_first() else {
        return EMPTY_FRAME.to_string();
    };

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let headers: Vec<String> = (0..width)
        .map(|i| match header_row.get(i) {
            Some(h) if h != MISSING => h.clone(),
            _ => format!("Unnamed: {}", i),
        })
        .collect();

    if data.is_empty() {
        return format!("{}\nColumns: [{}]\nIndex: []", EMPTY_FRAME, headers.join(", "));
    }

    let cells: Vec<Vec<&str>> = data
        .iter()
        .map(|row| {
            (0..width)
                .map(|i| row.get(i).map(String::as_str).unwrap_or(MISSING))
                .collect()
        })
        .collect();

    let column_widths: Vec<usize> = (0..width)
        .map(|i| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(headers[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let index_width = (data.len() - 1).to_string().len();

    let mut lines = Vec::with_capacity(data.len() + 1);

    let mut header_line = " ".repeat(index_width);
    for (header, w) in headers.iter().zip(&column_widths) {
        header_line.push_str(COLUMN_GAP);
        header_line.push_str(&format!("{:>w$}", header, w = *w));
    }
    lines.push(header_line);

    for (index, row) in cells.iter().enumerate() {
        let mut line = format!("{:<w$}", index, w = index_width);
        for (value, w) in row.iter().zip(&column_widths) {
            line.push_str(COLUMN_GAP);
            line.push_str(&format!("{:>w$}", value, w = *w));
        }
        lines.push(line);
    }

    lines.join("\n")
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => MISSING.to_string(),
        Data::String(s) if s.is_empty() => MISSING.to_string(),
        Data::String(s) => s.replace('\n', "\\n"),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => render_float(*f),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| format!("{:?}", dt)),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR: {:?}", e),
    }
}

fn render_float(value: f64) -> String {
    if value.is_nan() {
        MISSING.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn failure(message: String) -> AppError {
    AppError::extraction(DetectedType::Xlsx, message)
}
