//! Page specifications: the text, slot and font size of every stamp on a
//! front page or a backup page.

use serde::{Deserialize, Serialize};

use invoicestamp_core::EngineResult;

use crate::format::{
    column_block, format_accounting_period, format_amount, format_client_ref, format_date,
    format_grouped_currency, format_net_amount, format_quantity, format_site_name, vat_slot,
};
use crate::layout::Slot;
use crate::records::{BackupRow, InvoiceRow};

/// Size of header fields, amounts and backup columns.
pub const FIELD_FONT_SIZE: f32 = 8.0;
/// Size of the accounting-month labels and the net amount.
pub const SMALL_FONT_SIZE: f32 = 7.0;

/// Which template a page is stamped onto.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    FrontPage,
    BackupPage,
}

/// One piece of text placed at a layout slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPlacement {
    pub slot: Slot,
    pub text: String,
    pub font_size: f32,
}

impl TextPlacement {
    pub fn new(slot: Slot, text: impl Into<String>, font_size: f32) -> Self {
        Self {
            slot,
            text: text.into(),
            font_size,
        }
    }
}

/// Everything the renderer needs for one page, in stamping order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub template: TemplateKind,
    pub placements: Vec<TextPlacement>,
}

impl PageSpec {
    pub fn new(template: TemplateKind) -> Self {
        Self {
            template,
            placements: Vec::new(),
        }
    }

    pub fn place(&mut self, slot: Slot, text: impl Into<String>, font_size: f32) {
        self.placements.push(TextPlacement::new(slot, text, font_size));
    }

    /// Text stamped at `slot`, if any.
    pub fn text_at(&self, slot: Slot) -> Option<&str> {
        self.placements
            .iter()
            .find(|p| p.slot == slot)
            .map(|p| p.text.as_str())
    }

    pub fn placement(&self, slot: Slot) -> Option<&TextPlacement> {
        self.placements.iter().find(|p| p.slot == slot)
    }
}

/// Front page of one invoice plus the net-amount text the last backup page
/// repeats.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontPage {
    pub spec: PageSpec,
    pub net_amount: String,
}

/// Lay out the front page of `invoice`.
pub fn front_page(invoice: &InvoiceRow) -> EngineResult<FrontPage> {
    let period = format_accounting_period(invoice.period);
    let quantity = format_quantity(invoice.invoice_amount)?;
    let net_amount = format_net_amount(invoice.invoice_amount)?;

    let mut spec = PageSpec::new(TemplateKind::FrontPage);
    spec.place(Slot::InvoiceReference, invoice.invoice_number.as_str(), FIELD_FONT_SIZE);
    spec.place(Slot::InvoiceDate, format_date(invoice.invoice_date), FIELD_FONT_SIZE);
    spec.place(Slot::DueDate, format_date(invoice.due_date), FIELD_FONT_SIZE);
    spec.place(Slot::Po, invoice.po.as_str(), FIELD_FONT_SIZE);
    spec.place(Slot::AccountingMonthPrimary, period.clone(), SMALL_FONT_SIZE);
    spec.place(Slot::AccountingMonthSecondary, period.clone(), SMALL_FONT_SIZE);
    spec.place(Slot::AccountingMonthTertiary, period, SMALL_FONT_SIZE);
    spec.place(Slot::Quantity, quantity.text, quantity.font_size);
    spec.place(Slot::NetAmount, net_amount.clone(), SMALL_FONT_SIZE);
    spec.place(Slot::SubTotal, format_amount(invoice.invoice_amount)?, FIELD_FONT_SIZE);
    spec.place(
        vat_slot(invoice.vat_amount)?,
        format_amount(invoice.vat_amount)?,
        FIELD_FONT_SIZE,
    );
    spec.place(Slot::Total, format_amount(invoice.total)?, FIELD_FONT_SIZE);

    Ok(FrontPage { spec, net_amount })
}

/// Lay out one backup page from its row group.
///
/// `grand_total` is set only for the last backup page of an invoice.
pub fn backup_page(rows: &[&BackupRow], grand_total: Option<&str>) -> EngineResult<PageSpec> {
    let quote_refs: Vec<&str> = rows.iter().map(|r| r.quote_ref.as_str()).collect();
    let client_refs: Vec<String> = rows.iter().map(|r| format_client_ref(&r.client_ref)).collect();
    let site_names: Vec<String> = rows.iter().map(|r| format_site_name(&r.site_name)).collect();
    let estimates = rows
        .iter()
        .map(|r| format_grouped_currency(r.reviewed_estimate))
        .collect::<EngineResult<Vec<_>>>()?;

    let mut spec = PageSpec::new(TemplateKind::BackupPage);
    spec.place(Slot::QuoteRefColumn, column_block(&quote_refs), FIELD_FONT_SIZE);
    spec.place(Slot::ClientRefColumn, column_block(&client_refs), FIELD_FONT_SIZE);
    spec.place(Slot::SiteNameColumn, column_block(&site_names), FIELD_FONT_SIZE);
    spec.place(Slot::EstimateColumn, column_block(&estimates), FIELD_FONT_SIZE);
    if let Some(total) = grand_total {
        spec.place(Slot::GrandTotal, total, FIELD_FONT_SIZE);
    }
    Ok(spec)
}
