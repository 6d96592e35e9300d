//! Pipeline errors: engine errors plus every collaborator failure.

use std::path::PathBuf;

use invoicestamp_core::{EngineError, InvoiceNumber};

use crate::assembler::AssemblyState;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("spreadsheet error in {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    #[error("export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("invoice {invoice_number} failed while {state}: {source}")]
    Invoice {
        invoice_number: InvoiceNumber,
        state: AssemblyState,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn spreadsheet(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Spreadsheet {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Attach the invoice and assembly state a failure happened in.
    pub fn in_invoice(self, invoice_number: &InvoiceNumber, state: AssemblyState) -> Self {
        Self::Invoice {
            invoice_number: invoice_number.clone(),
            state,
            source: Box::new(self),
        }
    }

    /// The engine error at the root of this failure, if any.
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(e) => Some(e),
            Self::Invoice { source, .. } => source.engine_error(),
            _ => None,
        }
    }
}
