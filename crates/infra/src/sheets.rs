//! Spreadsheet loading: the first worksheet of a workbook, first row as
//! header, every following non-blank row coerced into a typed record.

use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use invoicestamp_core::{EngineError, EngineResult};
use invoicestamp_invoicing::{BackupColumns, BackupRow, CellValue, InvoiceColumns, InvoiceRow};

use crate::error::{PipelineError, PipelineResult};

/// Header labels plus data rows tagged with their 1-based sheet row number.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub header: Vec<String>,
    pub rows: Vec<(usize, Vec<CellValue>)>,
}

/// Convert one calamine cell.
pub fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
            Some(date) => CellValue::Date(date),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{e:?}")),
    }
}

/// Excel serial day number (1900 system) to a calendar date.
///
/// Serials outside chrono's calendar yield `None`.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::try_days(serial.floor() as i64)?)
}

fn sheet_from_range(range: &Range<Data>) -> Sheet {
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = range.rows();

    let header = rows
        .next()
        .map(|cells| cells.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();

    let rows = rows
        .enumerate()
        .filter_map(|(i, cells)| {
            let values: Vec<CellValue> = cells.iter().map(cell_value).collect();
            // Sheet row numbers are 1-based and the header takes the first one.
            let row_number = first_row + i + 2;
            if values.iter().all(CellValue::is_blank) {
                debug!(row = row_number, "skipping blank row");
                None
            } else {
                Some((row_number, values))
            }
        })
        .collect();

    Sheet { header, rows }
}

/// Read the first worksheet of an xlsx/xls/ods workbook.
pub fn read_sheet(path: impl AsRef<Path>) -> PipelineResult<Sheet> {
    let path = path.as_ref();
    let mut workbook =
        open_workbook_auto(path).map_err(|e| PipelineError::spreadsheet(path, e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::spreadsheet(path, "workbook has no worksheet"))?
        .map_err(|e| PipelineError::spreadsheet(path, e.to_string()))?;
    Ok(sheet_from_range(&range))
}

pub fn invoice_rows(sheet: &Sheet) -> EngineResult<Vec<InvoiceRow>> {
    let columns = InvoiceColumns::resolve(&sheet.header)?;
    sheet
        .rows
        .iter()
        .map(|(row_number, cells)| columns.read(cells, *row_number))
        .collect()
}

pub fn backup_rows(sheet: &Sheet) -> EngineResult<Vec<BackupRow>> {
    let columns = BackupColumns::resolve(&sheet.header)?;
    sheet
        .rows
        .iter()
        .map(|(row_number, cells)| columns.read(cells, *row_number))
        .collect()
}

/// The two input datasets of a batch, each loaded at most once per load call.
#[derive(Debug, Clone, Default)]
pub struct DatasetStore {
    invoices: Option<Vec<InvoiceRow>>,
    backups: Option<Vec<BackupRow>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with both datasets already in memory.
    pub fn from_rows(invoices: Vec<InvoiceRow>, backups: Vec<BackupRow>) -> Self {
        Self {
            invoices: Some(invoices),
            backups: Some(backups),
        }
    }

    pub fn load_invoices(&mut self, path: impl AsRef<Path>) -> PipelineResult<usize> {
        let path = path.as_ref();
        let rows = invoice_rows(&read_sheet(path)?)?;
        info!(path = %path.display(), rows = rows.len(), "loaded invoice dataset");
        let count = rows.len();
        self.invoices = Some(rows);
        Ok(count)
    }

    pub fn load_backups(&mut self, path: impl AsRef<Path>) -> PipelineResult<usize> {
        let path = path.as_ref();
        let rows = backup_rows(&read_sheet(path)?)?;
        info!(path = %path.display(), rows = rows.len(), "loaded backup dataset");
        let count = rows.len();
        self.backups = Some(rows);
        Ok(count)
    }

    pub fn set_invoices(&mut self, rows: Vec<InvoiceRow>) {
        self.invoices = Some(rows);
    }

    pub fn set_backups(&mut self, rows: Vec<BackupRow>) {
        self.backups = Some(rows);
    }

    /// True once both datasets are loaded (possibly empty).
    pub fn is_ready(&self) -> bool {
        self.invoices.is_some() && self.backups.is_some()
    }

    pub fn invoices(&self) -> EngineResult<&[InvoiceRow]> {
        self.invoices
            .as_deref()
            .ok_or_else(|| EngineError::not_ready("invoice dataset is not loaded"))
    }

    pub fn backups(&self) -> EngineResult<&[BackupRow]> {
        self.backups
            .as_deref()
            .ok_or_else(|| EngineError::not_ready("backup dataset is not loaded"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoicestamp_invoicing::records::{backup_columns, invoice_columns};
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use rust_xlsxwriter::Workbook;

    fn write_invoice_sheet(path: &Path, amount_cell: &str) {
        use invoice_columns::*;
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let header = [
            INVOICE_NUMBER, PO, INVOICE_DATE, DUE_DATE, PERIOD, INVOICE_AMOUNT, VAT_AMOUNT, TOTAL,
        ];
        for (col, label) in header.iter().enumerate() {
            sheet.write_string(0, col as u16, *label).unwrap();
        }
        sheet.write_number(1, 0, 1001.0).unwrap();
        sheet.write_string(1, 1, "PO1").unwrap();
        sheet.write_string(1, 2, "31/01/2025").unwrap();
        sheet.write_string(1, 3, "2025-03-02").unwrap();
        sheet.write_string(1, 4, "2025-01-15").unwrap();
        sheet.write_string(1, 5, amount_cell).unwrap();
        sheet.write_number(1, 6, 200.0).unwrap();
        sheet.write_number(1, 7, 1200.0).unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn serial_numbers_map_to_dates() {
        assert_eq!(
            excel_serial_to_date(45672.0),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
        assert_eq!(
            excel_serial_to_date(45672.75),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
        assert_eq!(excel_serial_to_date(0.0), None);
    }

    #[test]
    fn out_of_range_serials_are_not_dates() {
        assert_eq!(excel_serial_to_date(1e300), None);
        assert_eq!(excel_serial_to_date(1e20), None);
        assert_eq!(excel_serial_to_date(f64::INFINITY), None);

        let cell = Data::DateTime(ExcelDateTime::new(1e20, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_value(&cell), CellValue::Number(1e20));
    }

    #[test]
    fn calamine_cells_convert() {
        assert_eq!(cell_value(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(cell_value(&Data::Empty), CellValue::Empty);
        assert_eq!(
            cell_value(&Data::DateTimeIso("2025-01-15T00:00:00".into())),
            CellValue::Date(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
        );
    }

    #[test]
    fn invoice_workbook_loads_typed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoices.xlsx");
        write_invoice_sheet(&path, "1000");

        let mut store = DatasetStore::new();
        assert_eq!(store.load_invoices(&path).unwrap(), 1);
        assert!(!store.is_ready());

        let rows = store.invoices().unwrap();
        assert_eq!(rows[0].invoice_number.as_str(), "1001");
        assert_eq!(rows[0].invoice_date, NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        assert_eq!(rows[0].invoice_amount, 1000.0);
    }

    #[test]
    fn bad_amount_fails_with_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoices.xlsx");
        write_invoice_sheet(&path, "a lot");

        let err = DatasetStore::new().load_invoices(&path).unwrap_err();
        let engine = err.engine_error().expect("engine error");
        assert_eq!(engine.kind(), "format");
        assert!(engine.to_string().contains("row 2"), "{engine}");
    }

    #[test]
    fn backup_workbook_skips_blank_rows() {
        use backup_columns::*;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backups.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, label) in [QUOTE_REF, CLIENT_REF, SITE_NAME, REVIEWED_ESTIMATE, FINANCIAL_PERIOD, PO]
            .iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, *label).unwrap();
        }
        sheet.write_string(1, 0, "Q-1").unwrap();
        sheet.write_string(1, 2, "North Depot").unwrap();
        sheet.write_number(1, 3, 1234.5).unwrap();
        sheet.write_string(1, 4, "Jan-25").unwrap();
        sheet.write_string(1, 5, "PO1").unwrap();
        sheet.write_string(3, 0, "Q-2").unwrap();
        sheet.write_number(3, 3, 10.0).unwrap();
        sheet.write_string(3, 4, "Feb-25").unwrap();
        sheet.write_string(3, 5, "PO1").unwrap();
        workbook.save(&path).unwrap();

        let mut store = DatasetStore::new();
        assert_eq!(store.load_backups(&path).unwrap(), 2);
        let rows = store.backups().unwrap();
        assert_eq!(rows[0].client_ref, "");
        assert_eq!(rows[1].quote_ref.as_str(), "Q-2");
    }

    #[test]
    fn missing_workbook_is_a_spreadsheet_error() {
        let err = read_sheet("/no/such/workbook.xlsx").unwrap_err();
        assert!(matches!(err, PipelineError::Spreadsheet { .. }));
    }

    #[test]
    fn unloaded_datasets_are_not_ready() {
        let store = DatasetStore::new();
        assert_eq!(store.invoices().unwrap_err().kind(), "not_ready");
        assert!(DatasetStore::from_rows(vec![], vec![]).is_ready());
    }
}
