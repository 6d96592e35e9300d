//! Field formatter: pure conversions from typed row values to display text.

use chrono::NaiveDate;

use invoicestamp_core::{EngineError, EngineResult};

use crate::layout::Slot;

/// Width of a site-name cell on a backup page.
pub const SITE_NAME_WIDTH: usize = 30;
/// Width of a client-reference cell on a backup page.
pub const CLIENT_REF_WIDTH: usize = 20;

/// Quantity font size when the text fits in seven characters.
pub const QUANTITY_FONT_SIZE: f32 = 7.0;
/// Quantity font size for longer quantities.
pub const QUANTITY_FONT_SIZE_NARROW: f32 = 6.4;
const QUANTITY_MAX_WIDE_CHARS: usize = 7;

const CURRENCY_SYMBOL: char = '£';

/// `DD/MM/YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Accounting period label `Mon-YY`, also used as the dataset join key.
pub fn format_accounting_period(date: NaiveDate) -> String {
    date.format("%b-%y").to_string()
}

/// Display text for the quantity slot together with the font size it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub text: String,
    pub font_size: f32,
}

/// Invoice amount in thousands, five decimals, trailing zeros stripped.
///
/// Stripping is unconditional: `12000` becomes `"12."`.
pub fn format_quantity(amount: f64) -> EngineResult<Quantity> {
    ensure_finite(amount, "quantity")?;
    let fixed = format!("{:.5}", amount / 1000.0);
    let text = fixed.trim_end_matches('0').to_string();
    let font_size = quantity_font_size(&text);
    Ok(Quantity { text, font_size })
}

pub fn quantity_font_size(text: &str) -> f32 {
    if text.chars().count() > QUANTITY_MAX_WIDE_CHARS {
        QUANTITY_FONT_SIZE_NARROW
    } else {
        QUANTITY_FONT_SIZE
    }
}

/// Two decimals, no symbol.
pub fn format_amount(amount: f64) -> EngineResult<String> {
    ensure_finite(amount, "amount")?;
    Ok(format!("{amount:.2}"))
}

/// Two decimals prefixed with the currency symbol (`£1234.50`).
pub fn format_net_amount(amount: f64) -> EngineResult<String> {
    ensure_finite(amount, "net amount")?;
    Ok(format!("{CURRENCY_SYMBOL}{amount:.2}"))
}

/// Currency symbol, thousands separators, two decimals (`£1,234.50`).
///
/// The sign follows the symbol, as in `£-1,234.50`.
pub fn format_grouped_currency(amount: f64) -> EngineResult<String> {
    ensure_finite(amount, "currency amount")?;
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount.is_sign_negative() { "-" } else { "" };
    Ok(format!(
        "{CURRENCY_SYMBOL}{sign}{}.{frac_part}",
        group_thousands(int_part)
    ))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Pick the VAT slot for an amount.
///
/// The amount is rounded to two decimals and rendered in its shortest form
/// (exponent form from 1e16 upward); a five-character integer part (sign
/// included) or a value strictly between 1000 and 2000 selects the alternate
/// slot. Both tests are kept as they are, overlap included.
pub fn vat_slot(amount: f64) -> EngineResult<Slot> {
    ensure_finite(amount, "VAT amount")?;
    let rounded: f64 = format!("{amount:.2}")
        .parse()
        .map_err(|_| EngineError::format(format!("VAT amount {amount} cannot be rounded")))?;
    let text = shortest_text(rounded);
    let integer_part = text.split('.').next().unwrap_or_default();

    if integer_part.chars().count() == 5 || (rounded > 1000.0 && rounded < 2000.0) {
        Ok(Slot::VatAlternate)
    } else {
        Ok(Slot::Vat)
    }
}

/// Shortest round-trip text of a float. Magnitudes of 1e16 and above switch to
/// exponent form with an explicit sign, e.g. `1e+16` or `2.5e+17`.
fn shortest_text(value: f64) -> String {
    if value.abs() < 1e16 {
        return value.to_string();
    }
    let text = format!("{value:e}");
    match text.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => text,
    }
}

/// Truncate to `width` characters, then left-justify with spaces to exactly
/// `width`.
pub fn fit_width(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{truncated:<width$}")
}

pub fn format_site_name(text: &str) -> String {
    fit_width(text, SITE_NAME_WIDTH)
}

pub fn format_client_ref(text: &str) -> String {
    fit_width(text, CLIENT_REF_WIDTH)
}

/// Render one table column as a multi-line block, each line right-aligned to
/// the widest value.
pub fn column_block<S: AsRef<str>>(values: &[S]) -> String {
    let width = values
        .iter()
        .map(|v| v.as_ref().chars().count())
        .max()
        .unwrap_or(0);
    values
        .iter()
        .map(|v| format!("{:>width$}", v.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn ensure_finite(value: f64, what: &str) -> EngineResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::format(format!("{what} must be a finite number, got {value}")))
    }
}
