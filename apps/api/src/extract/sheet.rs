//! Tabular formats. Rows are rendered as tab-separated lines so the model sees
//! the row/column layout as plain text.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::{DocumentKind, ExtractError};

/// Renders every sheet of an XLSX/XLS workbook under a `## <sheet>` header.
pub fn extract_workbook_text(bytes: Vec<u8>) -> Result<String, ExtractError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ExtractError::corrupt(DocumentKind::Spreadsheet, e))?;

    let mut all_text = String::new();

    for sheet_name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ExtractError::corrupt(DocumentKind::Spreadsheet, e))?;

        all_text.push_str(&format!("## {sheet_name}\n\n"));
        render_rows(
            range.rows().map(|row| row.iter().map(cell_text).collect()),
            &mut all_text,
        );
        all_text.push('\n');
    }

    Ok(all_text)
}

/// Renders a CSV file. No header row is assumed and ragged rows are accepted.
pub fn extract_csv_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect::<Vec<_>>()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ExtractError::corrupt(DocumentKind::Csv, e))?;

    let mut out = String::new();
    render_rows(rows.into_iter(), &mut out);
    Ok(out)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR:{e:?}"),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// One line per row, cells joined by tabs. Rows with only empty cells are skipped.
fn render_rows(rows: impl Iterator<Item = Vec<String>>, out: &mut String) {
    for row in rows {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
}
