//! Batch runner: every invoice row in input order, then one export.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info, warn};

use invoicestamp_core::{EngineError, InvoiceNumber};
use invoicestamp_invoicing::CrossReferenceTable;

use crate::assembler::{AssemblyOutcome, AssemblyState, InvoiceAssembler};
use crate::config::{AppConfig, FailurePolicy};
use crate::error::{PipelineError, PipelineResult};
use crate::export::write_cross_reference;
use crate::pdf::{PageRenderer, TemplateSet};
use crate::sheets::DatasetStore;
use crate::store::{DocumentStore, FsDocumentStore};

/// An invoice skipped under [`FailurePolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceFailure {
    pub invoice_number: InvoiceNumber,
    pub state: AssemblyState,
    pub cause: String,
}

impl InvoiceFailure {
    fn from_error(invoice_number: &InvoiceNumber, error: &PipelineError) -> Self {
        match error {
            PipelineError::Invoice {
                invoice_number,
                state,
                source,
            } => Self {
                invoice_number: invoice_number.clone(),
                state: *state,
                cause: source.to_string(),
            },
            other => Self {
                invoice_number: invoice_number.clone(),
                state: AssemblyState::Failed,
                cause: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub documents: Vec<AssemblyOutcome>,
    pub failures: Vec<InvoiceFailure>,
    pub cross_reference: CrossReferenceTable,
    pub export_path: PathBuf,
}

impl BatchReport {
    pub fn documents_written(&self) -> usize {
        self.documents.len()
    }

    /// True when no invoice was skipped.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct BatchRunner<S> {
    assembler: InvoiceAssembler<S>,
    policy: FailurePolicy,
    export_path: PathBuf,
}

impl BatchRunner<FsDocumentStore> {
    /// Wire templates, layout and output directory from the configuration.
    pub fn from_config(config: &AppConfig) -> PipelineResult<Self> {
        let layout = config.layout_registry()?;
        let templates = TemplateSet::from_config(config)?;
        let store = FsDocumentStore::new(config.output_dir());
        let assembler = InvoiceAssembler::new(
            PageRenderer::new(templates, layout),
            store,
            config.rows_per_page,
        );
        Ok(Self::new(assembler, config.failure_policy, config.export_path()))
    }
}

impl<S: DocumentStore> BatchRunner<S> {
    pub fn new(assembler: InvoiceAssembler<S>, policy: FailurePolicy, export_path: PathBuf) -> Self {
        Self {
            assembler,
            policy,
            export_path,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Assemble every invoice, then write the cross-reference export.
    ///
    /// Under `Abort` the first failure is returned and nothing is exported.
    /// Under `Skip` a failed invoice's cross-reference rows are rolled back
    /// and the failure is listed in the report.
    pub fn run(
        &self,
        datasets: &DatasetStore,
        mut table: CrossReferenceTable,
    ) -> PipelineResult<BatchReport> {
        if !datasets.is_ready() {
            return Err(EngineError::not_ready(
                "both the invoice and backup datasets must be loaded before a batch",
            )
            .into());
        }
        let invoices = datasets.invoices()?;
        let backups = datasets.backups()?;
        info!(
            invoices = invoices.len(),
            backups = backups.len(),
            policy = %self.policy,
            "batch started"
        );

        let mut documents = Vec::with_capacity(invoices.len());
        let mut failures = Vec::new();
        for invoice in invoices {
            let checkpoint = table.checkpoint();
            match self.assembler.assemble(invoice, backups, &mut table) {
                Ok(outcome) => {
                    info!(
                        invoice = %outcome.invoice_number,
                        pages = outcome.page_count,
                        path = %outcome.path.display(),
                        "invoice document written"
                    );
                    documents.push(outcome);
                }
                Err(e) => match self.policy {
                    FailurePolicy::Abort => {
                        error!(invoice = %invoice.invoice_number, error = %e, "batch aborted");
                        return Err(e);
                    }
                    FailurePolicy::Skip => {
                        table.rollback(checkpoint);
                        warn!(invoice = %invoice.invoice_number, error = %e, "invoice skipped");
                        failures.push(InvoiceFailure::from_error(&invoice.invoice_number, &e));
                    }
                },
            }
        }

        let export_path = write_cross_reference(&self.export_path, &table)?;
        info!(
            documents = documents.len(),
            failures = failures.len(),
            cross_reference_rows = table.len(),
            "batch finished"
        );
        Ok(BatchReport {
            documents,
            failures,
            cross_reference: table,
            export_path,
        })
    }
}
