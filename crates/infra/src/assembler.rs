//! Invoice assembler: one invoice row in, one persisted document out.
//!
//! ```text
//! Filtering -> Paginating -> RenderingFront -> RenderingBackup -> Merging -> Persisted
//!     \____________\______________\_________________\_______________\----> Failed
//! ```
//!
//! Intermediate pages live only inside one `assemble` call.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, error};

use invoicestamp_core::InvoiceNumber;
use invoicestamp_invoicing::pages::{backup_page, front_page};
use invoicestamp_invoicing::{
    BackupRow, CrossReferenceTable, InvoiceRow, paginate, select_backup_rows,
};

use crate::error::PipelineResult;
use crate::pdf::{InvoiceDocument, PageRenderer};
use crate::store::DocumentStore;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyState {
    Filtering,
    Paginating,
    RenderingFront,
    RenderingBackup,
    Merging,
    Persisted,
    Failed,
}

impl AssemblyState {
    pub fn as_str(self) -> &'static str {
        match self {
            AssemblyState::Filtering => "filtering",
            AssemblyState::Paginating => "paginating",
            AssemblyState::RenderingFront => "rendering front page",
            AssemblyState::RenderingBackup => "rendering backup pages",
            AssemblyState::Merging => "merging",
            AssemblyState::Persisted => "persisted",
            AssemblyState::Failed => "failed",
        }
    }
}

impl core::fmt::Display for AssemblyState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one successful assembly produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyOutcome {
    pub invoice_number: InvoiceNumber,
    pub path: PathBuf,
    pub page_count: usize,
    /// Backup rows matched to the invoice (= cross-reference rows added).
    pub backup_rows: usize,
}

/// Tracks the current state of one assembly and logs every transition.
struct Progress<'a> {
    invoice_number: &'a InvoiceNumber,
    state: AssemblyState,
}

impl<'a> Progress<'a> {
    fn start(invoice_number: &'a InvoiceNumber) -> Self {
        debug!(invoice = %invoice_number, state = %AssemblyState::Filtering, "assembly started");
        Self {
            invoice_number,
            state: AssemblyState::Filtering,
        }
    }

    fn advance(&mut self, next: AssemblyState) {
        debug!(
            invoice = %self.invoice_number,
            from = %self.state,
            to = %next,
            "assembly state changed"
        );
        self.state = next;
    }
}

pub struct InvoiceAssembler<S> {
    renderer: PageRenderer,
    store: S,
    rows_per_page: usize,
}

impl<S: DocumentStore> InvoiceAssembler<S> {
    pub fn new(renderer: PageRenderer, store: S, rows_per_page: usize) -> Self {
        Self {
            renderer,
            store,
            rows_per_page,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Build and persist the document for `invoice`.
    ///
    /// Matching quote references are appended to `table` before any page is
    /// rendered; callers that continue past a failure roll them back.
    pub fn assemble(
        &self,
        invoice: &InvoiceRow,
        backups: &[BackupRow],
        table: &mut CrossReferenceTable,
    ) -> PipelineResult<AssemblyOutcome> {
        let mut progress = Progress::start(&invoice.invoice_number);
        match self.run(invoice, backups, table, &mut progress) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let failed_in = progress.state;
                progress.advance(AssemblyState::Failed);
                error!(
                    invoice = %invoice.invoice_number,
                    state = %failed_in,
                    error = %e,
                    "invoice assembly failed"
                );
                Err(e.in_invoice(&invoice.invoice_number, failed_in))
            }
        }
    }

    fn run(
        &self,
        invoice: &InvoiceRow,
        backups: &[BackupRow],
        table: &mut CrossReferenceTable,
        progress: &mut Progress<'_>,
    ) -> PipelineResult<AssemblyOutcome> {
        let selected = select_backup_rows(invoice, backups);
        table.record(&invoice.invoice_number, selected.iter().map(|row| &row.quote_ref));
        debug!(
            invoice = %invoice.invoice_number,
            matched = selected.len(),
            "backup rows selected"
        );

        progress.advance(AssemblyState::Paginating);
        let groups = paginate(&selected, self.rows_per_page)?;

        progress.advance(AssemblyState::RenderingFront);
        let front = front_page(invoice)?;
        let mut pages = Vec::with_capacity(groups.len() + 1);
        pages.push(self.renderer.render(&front.spec)?);

        progress.advance(AssemblyState::RenderingBackup);
        for (i, group) in groups.iter().enumerate() {
            let is_last = i + 1 == groups.len();
            let grand_total = is_last.then_some(front.net_amount.as_str());
            let spec = backup_page(group, grand_total)?;
            pages.push(self.renderer.render(&spec)?);
            debug!(
                invoice = %invoice.invoice_number,
                page = i + 1,
                rows = group.len(),
                "backup page rendered"
            );
        }

        progress.advance(AssemblyState::Merging);
        let mut document = InvoiceDocument::merge(pages)?;
        let bytes = document.to_bytes()?;
        let path = self.store.persist(&invoice.invoice_number, &bytes)?;

        progress.advance(AssemblyState::Persisted);
        Ok(AssemblyOutcome {
            invoice_number: invoice.invoice_number.clone(),
            path,
            page_count: document.page_count(),
            backup_rows: selected.len(),
        })
    }
}
