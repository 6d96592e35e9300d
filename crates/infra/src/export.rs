//! Cross-reference export: one xlsx sheet of (quote reference, invoice
//! number) pairs.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::info;

use invoicestamp_invoicing::CrossReferenceTable;
use invoicestamp_invoicing::cross_reference::CROSS_REFERENCE_HEADERS;

use crate::error::{PipelineError, PipelineResult};

/// Value written to the sheet: numbers stay numbers so the sheet sorts and
/// filters the way a hand-made one would.
fn write_value(sheet: &mut Worksheet, row: u32, col: u16, value: &str) -> PipelineResult<()> {
    match numeric_value(value) {
        Some(n) => sheet.write_number(row, col, n)?,
        None => sheet.write_string(row, col, value)?,
    };
    Ok(())
}

/// Plain decimal text (no sign prefix tricks, no exponent, no padding).
fn numeric_value(value: &str) -> Option<f64> {
    let looks_numeric = !value.is_empty()
        && value.chars().all(|c| c.is_ascii_digit() || c == '.')
        && value.chars().filter(|c| *c == '.').count() <= 1
        && !value.starts_with('.')
        && !value.ends_with('.')
        && !(value.len() > 1 && value.starts_with('0') && !value.starts_with("0."));
    if looks_numeric {
        value.parse::<f64>().ok().filter(|n| n.is_finite())
    } else {
        None
    }
}

/// Write `table` to `path`, replacing any previous file.
pub fn write_cross_reference(path: &Path, table: &CrossReferenceTable) -> PipelineResult<PathBuf> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, label) in CROSS_REFERENCE_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *label, &header_format)?;
    }
    for (i, row) in table.rows().iter().enumerate() {
        let r = (i + 1) as u32;
        write_value(sheet, r, 0, row.quote_ref.as_str())?;
        write_value(sheet, r, 1, row.invoice_number.as_str())?;
    }

    workbook.save(path)?;
    info!(path = %path.display(), rows = table.len(), "cross-reference export written");
    Ok(path.to_path_buf())
}
