//! Selection of the backup rows that support one invoice.

use crate::format::format_accounting_period;
use crate::records::{BackupRow, InvoiceRow};

/// Backup rows whose accounting period label and PO reference both equal the
/// invoice's, in dataset order.
///
/// Periods are compared as formatted `Mon-YY` text, so any day within the
/// month matches.
pub fn select_backup_rows<'a>(invoice: &InvoiceRow, backups: &'a [BackupRow]) -> Vec<&'a BackupRow> {
    let period = format_accounting_period(invoice.period);
    backups
        .iter()
        .filter(|row| format_accounting_period(row.financial_period) == period)
        .filter(|row| row.po == invoice.po)
        .collect()
}
