//! Spreadsheet cell values and their coercion into typed fields.

use chrono::NaiveDate;

use invoicestamp_core::{EngineError, EngineResult};

/// A single cell as handed over by a spreadsheet loader.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

/// Date layouts accepted for text cells, tried in order.
const DATE_TEXT_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y-%m-%d %H:%M:%S", "%d-%b-%Y"];

impl CellValue {
    /// True for empty cells and for text cells holding only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Textual rendering of the cell, `None` when blank.
    ///
    /// Integral numbers drop their fractional part so that an invoice number
    /// stored as `1001.0` reads `1001`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) if s.trim().is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(number_text(*n)),
            CellValue::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            CellValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }

    fn describe(&self) -> String {
        match self {
            CellValue::Empty => "an empty cell".to_string(),
            CellValue::Text(s) => format!("text '{s}'"),
            CellValue::Number(n) => format!("number {n}"),
            CellValue::Bool(b) => format!("boolean {b}"),
            CellValue::Date(d) => format!("date {d}"),
        }
    }
}

fn number_text(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn mismatch(field: &str, expected: &str, found: &CellValue) -> EngineError {
    EngineError::format(format!(
        "{field}: expected {expected}, found {}",
        found.describe()
    ))
}

/// Required text (identifiers and references).
pub fn coerce_text(value: &CellValue, field: &str) -> EngineResult<String> {
    value
        .as_text()
        .ok_or_else(|| EngineError::format(format!("{field}: value is missing")))
}

/// Free text where a blank cell simply means "no text".
pub fn coerce_optional_text(value: &CellValue) -> String {
    value.as_text().unwrap_or_default()
}

/// Monetary amount; numeric text (with optional `£` and thousands separators)
/// is accepted.
pub fn coerce_amount(value: &CellValue, field: &str) -> EngineResult<f64> {
    let amount = match value {
        CellValue::Number(n) => *n,
        CellValue::Text(s) if !s.trim().is_empty() => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('£')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            cleaned
                .parse::<f64>()
                .map_err(|_| mismatch(field, "a number", value))?
        }
        CellValue::Empty | CellValue::Text(_) => {
            return Err(EngineError::format(format!("{field}: value is missing")));
        }
        other => return Err(mismatch(field, "a number", other)),
    };

    if !amount.is_finite() {
        return Err(mismatch(field, "a finite number", value));
    }
    Ok(amount)
}

/// Calendar date from a date cell or date-like text.
pub fn coerce_date(value: &CellValue, field: &str) -> EngineResult<NaiveDate> {
    match value {
        CellValue::Date(d) => Ok(*d),
        CellValue::Text(s) if !s.trim().is_empty() => {
            let s = s.trim();
            DATE_TEXT_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .or_else(|| parse_month_year(s))
                .ok_or_else(|| mismatch(field, "a date", value))
        }
        CellValue::Empty | CellValue::Text(_) => {
            Err(EngineError::format(format!("{field}: value is missing")))
        }
        other => Err(mismatch(field, "a date", other)),
    }
}

/// Month/year period; `Mon-YY` text maps to the first day of that month.
pub fn coerce_period(value: &CellValue, field: &str) -> EngineResult<NaiveDate> {
    if let CellValue::Text(s) = value {
        if let Some(date) = parse_month_year(s.trim()) {
            return Ok(date);
        }
    }
    coerce_date(value, field)
}

fn parse_month_year(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("01-{s}"), "%d-%b-%y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(1001.0).as_text().as_deref(), Some("1001"));
        assert_eq!(CellValue::Number(12.5).as_text().as_deref(), Some("12.5"));
        assert_eq!(CellValue::Text("  ".into()).as_text(), None);
    }

    #[test]
    fn amounts_accept_numeric_text() {
        let v = CellValue::Text("£1,234.50".into());
        assert_eq!(coerce_amount(&v, "Invoice Amount").unwrap(), 1234.5);
        assert_eq!(coerce_amount(&CellValue::Number(7.25), "x").unwrap(), 7.25);
    }

    #[test]
    fn non_numeric_amount_is_a_format_error() {
        let err = coerce_amount(&CellValue::Text("n/a".into()), "VAT Amount").unwrap_err();
        assert_eq!(err.kind(), "format");
        assert!(err.to_string().contains("VAT Amount"));

        let err = coerce_amount(&CellValue::Empty, "Total").unwrap_err();
        assert!(err.to_string().contains("missing"));

        assert!(coerce_amount(&CellValue::Number(f64::NAN), "Total").is_err());
    }

    #[test]
    fn dates_parse_from_cells_and_text() {
        let jan = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(coerce_date(&CellValue::Date(jan), "d").unwrap(), jan);
        assert_eq!(coerce_date(&CellValue::Text("2025-01-15".into()), "d").unwrap(), jan);
        assert_eq!(coerce_date(&CellValue::Text("15/01/2025".into()), "d").unwrap(), jan);
        assert!(coerce_date(&CellValue::Number(45672.0), "d").is_err());
        assert!(coerce_date(&CellValue::Text("soon".into()), "d").is_err());
    }

    #[test]
    fn periods_parse_month_year_text() {
        let period = coerce_period(&CellValue::Text("Jan-25".into()), "Financial Month").unwrap();
        assert_eq!(period, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(coerce_period(&CellValue::Text("Janvier".into()), "Financial Month").is_err());
    }

    #[test]
    fn optional_text_defaults_to_empty() {
        assert_eq!(coerce_optional_text(&CellValue::Empty), "");
        assert!(coerce_text(&CellValue::Empty, "PO").is_err());
    }
}
