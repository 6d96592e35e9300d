//! Infrastructure layer: configuration, spreadsheet loading, PDF templates,
//! document storage, the cross-reference export and the batch pipeline.
//!
//! Domain rules (formatting, pagination, matching) live in
//! `invoicestamp-invoicing`; this crate only moves bytes in and out.

pub mod assembler;
pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod pdf;
pub mod sheets;
pub mod store;

pub use assembler::{AssemblyOutcome, AssemblyState, InvoiceAssembler};
pub use batch::{BatchReport, BatchRunner, InvoiceFailure};
pub use config::{AppConfig, FailurePolicy};
pub use error::{PipelineError, PipelineResult};
pub use pdf::{InvoiceDocument, PageRenderer, RenderedPage, Template, TemplateSet};
pub use sheets::DatasetStore;
pub use store::{DocumentStore, FsDocumentStore, InMemoryDocumentStore};
