//! Where finished invoice documents go.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use invoicestamp_core::{EngineError, InvoiceNumber};

use crate::error::{PipelineError, PipelineResult};

pub const DOCUMENT_EXTENSION: &str = "pdf";

/// `<invoice number>.pdf` with path separators replaced by `-`.
pub fn document_file_name(invoice_number: &InvoiceNumber) -> String {
    format!("{}.{DOCUMENT_EXTENSION}", invoice_number.file_stem())
}

/// Persists one document per invoice, replacing any earlier version.
pub trait DocumentStore {
    /// Store `bytes` under the invoice number and return the location.
    fn persist(&self, invoice_number: &InvoiceNumber, bytes: &[u8]) -> PipelineResult<PathBuf>;
}

/// Documents written into one output directory.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    dir: PathBuf,
}

impl FsDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DocumentStore for FsDocumentStore {
    fn persist(&self, invoice_number: &InvoiceNumber, bytes: &[u8]) -> PipelineResult<PathBuf> {
        std::fs::create_dir_all(&self.dir).map_err(|e| PipelineError::io(&self.dir, e))?;
        let path = self.dir.join(document_file_name(invoice_number));
        std::fs::write(&path, bytes).map_err(|e| PipelineError::io(&path, e))?;
        Ok(path)
    }
}

/// In-memory document store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_name: &str) -> Option<Vec<u8>> {
        self.documents
            .read()
            .ok()
            .and_then(|docs| docs.get(file_name).cloned())
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn persist(&self, invoice_number: &InvoiceNumber, bytes: &[u8]) -> PipelineResult<PathBuf> {
        let file_name = document_file_name(invoice_number);
        let mut docs = self
            .documents
            .write()
            .map_err(|_| EngineError::render("document store lock poisoned"))?;
        docs.insert(file_name.clone(), bytes.to_vec());
        Ok(PathBuf::from(file_name))
    }
}
