//! Typed invoice and backup rows.
//!
//! Rows are validated once, when a loader hands over its cells; everything
//! downstream works on typed fields instead of column labels.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use invoicestamp_core::{
    EngineError, EngineResult, InvoiceNumber, PoReference, QuoteReference,
};

use crate::cell::{
    CellValue, coerce_amount, coerce_date, coerce_optional_text, coerce_period, coerce_text,
};

/// Column labels of the invoice dataset.
pub mod invoice_columns {
    pub const INVOICE_NUMBER: &str = "Invoice Number";
    pub const PO: &str = "PO";
    pub const INVOICE_DATE: &str = "Invoice Date";
    pub const DUE_DATE: &str = "Due Date";
    pub const PERIOD: &str = "Line Description";
    pub const INVOICE_AMOUNT: &str = "Invoice Amount";
    pub const VAT_AMOUNT: &str = "VAT Amount";
    pub const TOTAL: &str = "Total";
}

/// Column labels of the backup dataset (note the trailing space of the site
/// name label).
pub mod backup_columns {
    pub const QUOTE_REF: &str = "Supplier Quote ref.";
    pub const CLIENT_REF: &str = "Client Ref";
    pub const SITE_NAME: &str = "Site Name ";
    pub const REVIEWED_ESTIMATE: &str = "Reviewed Quote/Estimate (£)";
    pub const FINANCIAL_PERIOD: &str = "Financial Month";
    pub const PO: &str = "PO Order No.";
}

/// One invoice header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub invoice_number: InvoiceNumber,
    pub po: PoReference,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Source of the accounting period.
    pub period: NaiveDate,
    pub invoice_amount: f64,
    pub vat_amount: f64,
    /// Assumed to equal amount + VAT upstream; never recomputed.
    pub total: f64,
}

/// One backup line-item row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRow {
    pub quote_ref: QuoteReference,
    pub client_ref: String,
    pub site_name: String,
    pub reviewed_estimate: f64,
    pub financial_period: NaiveDate,
    pub po: PoReference,
}

fn column_index(header: &[String], label: &str) -> EngineResult<usize> {
    header
        .iter()
        .position(|h| h == label)
        .ok_or_else(|| EngineError::format(format!("missing column '{label}'")))
}

fn cell<'a>(cells: &'a [CellValue], index: usize) -> &'a CellValue {
    cells.get(index).unwrap_or(&CellValue::Empty)
}

fn at_row(row_number: usize, label: &str) -> String {
    format!("row {row_number}, column '{label}'")
}

/// Column positions of the invoice dataset, resolved once per sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceColumns {
    invoice_number: usize,
    po: usize,
    invoice_date: usize,
    due_date: usize,
    period: usize,
    invoice_amount: usize,
    vat_amount: usize,
    total: usize,
}

impl InvoiceColumns {
    /// Locate every required column by exact label.
    pub fn resolve(header: &[String]) -> EngineResult<Self> {
        use invoice_columns::*;
        Ok(Self {
            invoice_number: column_index(header, INVOICE_NUMBER)?,
            po: column_index(header, PO)?,
            invoice_date: column_index(header, INVOICE_DATE)?,
            due_date: column_index(header, DUE_DATE)?,
            period: column_index(header, PERIOD)?,
            invoice_amount: column_index(header, INVOICE_AMOUNT)?,
            vat_amount: column_index(header, VAT_AMOUNT)?,
            total: column_index(header, TOTAL)?,
        })
    }

    /// Build a typed row; `row_number` is only used in error messages.
    pub fn read(&self, cells: &[CellValue], row_number: usize) -> EngineResult<InvoiceRow> {
        use invoice_columns::*;
        let invoice_number = coerce_text(cell(cells, self.invoice_number), &at_row(row_number, INVOICE_NUMBER))?;
        let po = coerce_text(cell(cells, self.po), &at_row(row_number, PO))?;
        Ok(InvoiceRow {
            invoice_number: InvoiceNumber::new(invoice_number)?,
            po: PoReference::new(po)?,
            invoice_date: coerce_date(cell(cells, self.invoice_date), &at_row(row_number, INVOICE_DATE))?,
            due_date: coerce_date(cell(cells, self.due_date), &at_row(row_number, DUE_DATE))?,
            period: coerce_date(cell(cells, self.period), &at_row(row_number, PERIOD))?,
            invoice_amount: coerce_amount(cell(cells, self.invoice_amount), &at_row(row_number, INVOICE_AMOUNT))?,
            vat_amount: coerce_amount(cell(cells, self.vat_amount), &at_row(row_number, VAT_AMOUNT))?,
            total: coerce_amount(cell(cells, self.total), &at_row(row_number, TOTAL))?,
        })
    }
}

/// Column positions of the backup dataset, resolved once per sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupColumns {
    quote_ref: usize,
    client_ref: usize,
    site_name: usize,
    reviewed_estimate: usize,
    financial_period: usize,
    po: usize,
}

impl BackupColumns {
    pub fn resolve(header: &[String]) -> EngineResult<Self> {
        use backup_columns::*;
        Ok(Self {
            quote_ref: column_index(header, QUOTE_REF)?,
            client_ref: column_index(header, CLIENT_REF)?,
            site_name: column_index(header, SITE_NAME)?,
            reviewed_estimate: column_index(header, REVIEWED_ESTIMATE)?,
            financial_period: column_index(header, FINANCIAL_PERIOD)?,
            po: column_index(header, PO)?,
        })
    }

    pub fn read(&self, cells: &[CellValue], row_number: usize) -> EngineResult<BackupRow> {
        use backup_columns::*;
        let quote_ref = coerce_text(cell(cells, self.quote_ref), &at_row(row_number, QUOTE_REF))?;
        let po = coerce_text(cell(cells, self.po), &at_row(row_number, PO))?;
        Ok(BackupRow {
            quote_ref: QuoteReference::new(quote_ref)?,
            client_ref: coerce_optional_text(cell(cells, self.client_ref)),
            site_name: coerce_optional_text(cell(cells, self.site_name)),
            reviewed_estimate: coerce_amount(
                cell(cells, self.reviewed_estimate),
                &at_row(row_number, REVIEWED_ESTIMATE),
            )?,
            financial_period: coerce_period(
                cell(cells, self.financial_period),
                &at_row(row_number, FINANCIAL_PERIOD),
            )?,
            po: PoReference::new(po)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn invoice_header() -> Vec<String> {
        use invoice_columns::*;
        header(&[
            INVOICE_NUMBER, PO, INVOICE_DATE, DUE_DATE, PERIOD, INVOICE_AMOUNT, VAT_AMOUNT, TOTAL,
        ])
    }

    #[test]
    fn invoice_row_reads_typed_fields() {
        let columns = InvoiceColumns::resolve(&invoice_header()).unwrap();
        let jan = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let cells = vec![
            CellValue::Number(1001.0),
            CellValue::Text("PO1".into()),
            CellValue::Date(jan),
            CellValue::Text("14/02/2025".into()),
            CellValue::Date(jan),
            CellValue::Number(1000.0),
            CellValue::Number(200.0),
            CellValue::Number(1200.0),
        ];

        let row = columns.read(&cells, 2).unwrap();
        assert_eq!(row.invoice_number.as_str(), "1001");
        assert_eq!(row.po.as_str(), "PO1");
        assert_eq!(row.due_date, NaiveDate::from_ymd_opt(2025, 2, 14).unwrap());
        assert_eq!(row.total, 1200.0);
    }

    #[test]
    fn missing_column_is_reported_by_label() {
        let mut labels = invoice_header();
        labels.retain(|l| l != "VAT Amount");
        let err = InvoiceColumns::resolve(&labels).unwrap_err();
        assert_eq!(err, EngineError::format("missing column 'VAT Amount'"));
    }

    #[test]
    fn bad_cell_names_row_and_column() {
        let columns = InvoiceColumns::resolve(&invoice_header()).unwrap();
        let cells = vec![
            CellValue::Text("INV-1".into()),
            CellValue::Text("PO1".into()),
            CellValue::Text("not a date".into()),
        ];
        let err = columns.read(&cells, 7).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 7"), "{msg}");
        assert!(msg.contains("Invoice Date"), "{msg}");
    }

    #[test]
    fn site_name_label_keeps_trailing_space() {
        use backup_columns::*;
        let labels = header(&[QUOTE_REF, CLIENT_REF, "Site Name", REVIEWED_ESTIMATE, FINANCIAL_PERIOD, PO]);
        assert!(BackupColumns::resolve(&labels).is_err());
    }

    #[test]
    fn backup_row_tolerates_blank_free_text() {
        use backup_columns::*;
        let labels = header(&[QUOTE_REF, CLIENT_REF, SITE_NAME, REVIEWED_ESTIMATE, FINANCIAL_PERIOD, PO]);
        let columns = BackupColumns::resolve(&labels).unwrap();
        let cells = vec![
            CellValue::Text("Q-1".into()),
            CellValue::Empty,
            CellValue::Text("North Depot".into()),
            CellValue::Number(1234.5),
            CellValue::Text("Jan-25".into()),
            CellValue::Text("PO1".into()),
        ];
        let row = columns.read(&cells, 2).unwrap();
        assert_eq!(row.client_ref, "");
        assert_eq!(row.financial_period, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }
}
