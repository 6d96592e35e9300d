//! Merging stamped pages into one invoice document.

use std::collections::BTreeMap;

use lopdf::{Document, Object, ObjectId, dictionary};
use tracing::debug;

use invoicestamp_core::EngineError;

use crate::error::PipelineResult;
use crate::pdf::render::RenderedPage;

const PDF_VERSION: &str = "1.5";

fn has_type(object: &Object, type_name: &[u8]) -> bool {
    object
        .as_dict()
        .ok()
        .and_then(|d| d.get(b"Type").ok())
        .and_then(|t| t.as_name().ok())
        == Some(type_name)
}

/// One invoice as a single PDF: front page first, backup pages in order.
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    document: Document,
    page_count: usize,
}

impl InvoiceDocument {
    /// Merge `pages` in the given order into a fresh page tree.
    pub fn merge(pages: Vec<RenderedPage>) -> PipelineResult<Self> {
        if pages.is_empty() {
            return Err(EngineError::render("cannot build a document without pages").into());
        }

        let mut next_id = 1;
        let mut page_ids: Vec<ObjectId> = Vec::new();
        let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

        for page in pages {
            let mut doc = page.into_document();
            doc.renumber_objects_with(next_id);
            next_id = doc.max_id + 1;

            page_ids.extend(doc.get_pages().into_values());
            objects.extend(
                doc.objects
                    .into_iter()
                    .filter(|(_, o)| !has_type(o, b"Catalog") && !has_type(o, b"Pages")),
            );
        }

        let mut merged = Document::with_version(PDF_VERSION);
        merged.objects = objects;
        merged.max_id = next_id - 1;

        let pages_id = merged.new_object_id();
        for id in &page_ids {
            merged
                .get_object_mut(*id)?
                .as_dict_mut()?
                .set("Parent", pages_id);
        }
        let kids: Vec<Object> = page_ids.iter().copied().map(Object::Reference).collect();
        merged.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_ids.len() as i64,
            }),
        );
        let catalog_id = merged.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        merged.trailer.set("Root", catalog_id);

        merged.prune_objects();
        merged.renumber_objects();

        debug!(pages = page_ids.len(), "document merged");
        Ok(Self {
            document: merged,
            page_count: page_ids.len(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Serialised PDF. Nothing time-dependent is written, so equal inputs
    /// give equal bytes.
    pub fn to_bytes(&mut self) -> PipelineResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.document
            .save_to(&mut bytes)
            .map_err(|e| EngineError::render(format!("cannot serialise document: {e}")))?;
        Ok(bytes)
    }
}
