//! Cross-reference accumulator: (supplier quote reference, invoice number)
//! pairs exported once per batch.

use serde::{Deserialize, Serialize};

use invoicestamp_core::{InvoiceNumber, QuoteReference};

/// Export column headers, in order.
pub const CROSS_REFERENCE_HEADERS: [&str; 2] = ["Supplier Quote ref.", "Invoice Number"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferenceRow {
    pub quote_ref: QuoteReference,
    pub invoice_number: InvoiceNumber,
}

/// Marks a table length so a failed invoice can drop what it appended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Append-only (within a batch) table of cross-reference rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferenceTable {
    rows: Vec<CrossReferenceRow>,
}

impl CrossReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row per quote reference, keeping their order.
    pub fn record<'a>(
        &mut self,
        invoice_number: &InvoiceNumber,
        quote_refs: impl IntoIterator<Item = &'a QuoteReference>,
    ) -> usize {
        let before = self.rows.len();
        self.rows.extend(quote_refs.into_iter().map(|quote_ref| CrossReferenceRow {
            quote_ref: quote_ref.clone(),
            invoice_number: invoice_number.clone(),
        }));
        self.rows.len() - before
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.rows.len())
    }

    /// Drop every row appended after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.rows.truncate(checkpoint.0);
    }

    pub fn rows(&self) -> &[CrossReferenceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(s: &str) -> QuoteReference {
        QuoteReference::new(s).unwrap()
    }

    #[test]
    fn record_appends_in_order() {
        let mut table = CrossReferenceTable::new();
        let inv1 = InvoiceNumber::new("1001").unwrap();
        let inv2 = InvoiceNumber::new("1002").unwrap();

        assert_eq!(table.record(&inv1, &[quote("Q1"), quote("Q2")]), 2);
        assert_eq!(table.record(&inv2, &[quote("Q3")]), 1);

        let pairs: Vec<(&str, &str)> = table
            .rows()
            .iter()
            .map(|r| (r.quote_ref.as_str(), r.invoice_number.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Q1", "1001"), ("Q2", "1001"), ("Q3", "1002")]);
    }

    #[test]
    fn rollback_drops_rows_after_checkpoint() {
        let mut table = CrossReferenceTable::new();
        let inv = InvoiceNumber::new("1001").unwrap();
        table.record(&inv, &[quote("Q1")]);

        let mark = table.checkpoint();
        table.record(&inv, &[quote("Q2"), quote("Q3")]);
        assert_eq!(table.len(), 3);

        table.rollback(mark);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].quote_ref.as_str(), "Q1");
    }
}
