//! Template pages loaded once per batch and cloned for every stamp.

use std::io::ErrorKind;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use invoicestamp_core::EngineError;
use invoicestamp_invoicing::{Position, TemplateKind};

use crate::config::AppConfig;
use crate::error::PipelineResult;

/// Page attributes a page may inherit from its page-tree ancestors.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];
const MAX_TREE_DEPTH: usize = 64;

/// Rectangle of a page in PDF user space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageBox {
    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// Top-left-origin layout position to PDF user space.
    pub fn to_user_space(&self, position: Position) -> (f32, f32) {
        (self.llx + position.x, self.ury - position.y)
    }

    fn intersect(&self, other: &PageBox) -> Option<PageBox> {
        let clipped = PageBox {
            llx: self.llx.max(other.llx),
            lly: self.lly.max(other.lly),
            urx: self.urx.min(other.urx),
            ury: self.ury.min(other.ury),
        };
        (clipped.width() > 0.0 && clipped.height() > 0.0).then_some(clipped)
    }
}

pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn page_rect(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<PageBox> {
    let raw = doc.get_dictionary(page_id).ok()?.get(key).ok()?;
    let values: Vec<f32> = resolve(doc, raw)?
        .as_array()
        .ok()?
        .iter()
        .filter_map(|v| resolve(doc, v).and_then(number))
        .collect();
    match values.as_slice() {
        [a, b, c, d] => Some(PageBox {
            llx: a.min(*c),
            lly: b.min(*d),
            urx: a.max(*c),
            ury: b.max(*d),
        }),
        _ => None,
    }
}

/// The visible area: the CropBox clipped to the MediaBox, or the MediaBox
/// when the page has no usable CropBox.
fn visible_box(doc: &Document, page_id: ObjectId) -> Option<PageBox> {
    let media_box = page_rect(doc, page_id, b"MediaBox")?;
    Some(
        page_rect(doc, page_id, b"CropBox")
            .and_then(|crop| crop.intersect(&media_box))
            .unwrap_or(media_box),
    )
}

/// A single-page template with its inherited attributes copied onto the page.
#[derive(Debug, Clone)]
pub struct Template {
    document: Document,
    page_id: ObjectId,
    page_box: PageBox,
}

impl Template {
    pub fn load(kind: TemplateKind, path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            let message = format!("{} template {}: {e}", kind_label(kind), path.display());
            if e.kind() == ErrorKind::NotFound {
                EngineError::configuration(message)
            } else {
                EngineError::render(message)
            }
        })?;
        let document = Document::load_mem(&bytes).map_err(|e| {
            EngineError::render(format!(
                "{} template {} cannot be loaded: {e}",
                kind_label(kind),
                path.display()
            ))
        })?;
        debug!(path = %path.display(), kind = ?kind, "template loaded");
        Self::from_document(kind, document)
    }

    /// Keep only the first page of `document` and flatten its inherited
    /// attributes so the page can move into another page tree.
    pub fn from_document(kind: TemplateKind, mut document: Document) -> PipelineResult<Self> {
        let pages = document.get_pages();
        let (&first_number, &page_id) = pages.iter().next().ok_or_else(|| {
            EngineError::render(format!("{} template has no page", kind_label(kind)))
        })?;

        let attributes: Vec<(&[u8], Object)> = INHERITABLE
            .iter()
            .filter_map(|key| inherited(&document, page_id, key).map(|v| (*key, v)))
            .collect();
        let page = document.get_object_mut(page_id)?.as_dict_mut()?;
        for (key, value) in attributes {
            if !page.has(key) {
                page.set(key.to_vec(), value);
            }
        }

        let extra: Vec<u32> = pages.keys().copied().filter(|n| *n != first_number).collect();
        if !extra.is_empty() {
            document.delete_pages(&extra);
            document.prune_objects();
        }

        let page_box = visible_box(&document, page_id).ok_or_else(|| {
            EngineError::render(format!(
                "{} template page has no usable MediaBox",
                kind_label(kind)
            ))
        })?;

        Ok(Self {
            document,
            page_id,
            page_box,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn page_id(&self) -> ObjectId {
        self.page_id
    }

    /// Visible area that layout positions are measured from.
    pub fn page_box(&self) -> PageBox {
        self.page_box
    }
}

fn kind_label(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::FrontPage => "front page",
        TemplateKind::BackupPage => "backup page",
    }
}

/// Both templates of a batch.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    front_page: Template,
    backup_page: Template,
}

impl TemplateSet {
    pub fn load(front_page: impl AsRef<Path>, backup_page: impl AsRef<Path>) -> PipelineResult<Self> {
        Ok(Self {
            front_page: Template::load(TemplateKind::FrontPage, front_page)?,
            backup_page: Template::load(TemplateKind::BackupPage, backup_page)?,
        })
    }

    pub fn from_config(config: &AppConfig) -> PipelineResult<Self> {
        Self::load(config.front_page_template(), config.backup_page_template())
    }

    pub fn from_documents(front_page: Document, backup_page: Document) -> PipelineResult<Self> {
        Ok(Self {
            front_page: Template::from_document(TemplateKind::FrontPage, front_page)?,
            backup_page: Template::from_document(TemplateKind::BackupPage, backup_page)?,
        })
    }

    pub fn get(&self, kind: TemplateKind) -> &Template {
        match kind {
            TemplateKind::FrontPage => &self.front_page,
            TemplateKind::BackupPage => &self.backup_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::blank_document;

    #[test]
    fn inherited_media_box_is_flattened() {
        let template = Template::from_document(TemplateKind::FrontPage, blank_document(1)).unwrap();
        let page = template.document().get_dictionary(template.page_id()).unwrap();
        assert!(page.has(b"MediaBox"));
        assert!(page.has(b"Resources"));
        assert_eq!(template.page_box().height(), 842.0);
        assert_eq!(template.page_box().width(), 595.0);
    }

    #[test]
    fn only_the_first_page_is_kept() {
        let template = Template::from_document(TemplateKind::BackupPage, blank_document(3)).unwrap();
        assert_eq!(template.document().get_pages().len(), 1);
    }

    #[test]
    fn empty_document_is_a_render_error() {
        let err = Template::from_document(TemplateKind::FrontPage, blank_document(0)).unwrap_err();
        assert_eq!(err.engine_error().map(|e| e.kind()), Some("render"));
    }

    #[test]
    fn layout_positions_flip_to_user_space() {
        let mb = PageBox {
            llx: 0.0,
            lly: 0.0,
            urx: 595.0,
            ury: 842.0,
        };
        assert_eq!(mb.to_user_space(Position::new(100.0, 42.0)), (100.0, 800.0));
    }

    #[test]
    fn crop_box_offsets_layout_origin() {
        let mut doc = blank_document(1);
        let page_id = *doc.get_pages().values().next().unwrap();
        doc.get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("CropBox", vec![50.into(), 40.into(), 545.into(), 800.into()]);

        let template = Template::from_document(TemplateKind::FrontPage, doc).unwrap();
        let visible = template.page_box();
        assert_eq!((visible.llx, visible.lly, visible.urx, visible.ury), (50.0, 40.0, 545.0, 800.0));
        assert_eq!(visible.to_user_space(Position::new(10.0, 10.0)), (60.0, 790.0));
    }

    #[test]
    fn crop_box_is_clipped_to_media_box() {
        let mut doc = blank_document(1);
        let page_id = *doc.get_pages().values().next().unwrap();
        doc.get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("CropBox", vec![(-20).into(), 0.into(), 700.into(), 900.into()]);

        let template = Template::from_document(TemplateKind::FrontPage, doc).unwrap();
        assert_eq!(template.page_box().width(), 595.0);
        assert_eq!(template.page_box().ury, 842.0);
    }

    #[test]
    fn missing_template_file_is_a_configuration_error() {
        let err = Template::load(TemplateKind::FrontPage, "/no/such/front_pager.pdf").unwrap_err();
        let engine = err.engine_error().expect("engine error");
        assert_eq!(engine.kind(), "configuration");
        assert!(engine.to_string().contains("front_pager.pdf"), "{engine}");
    }

    #[test]
    fn corrupt_template_file_is_a_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup_page.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let err = Template::load(TemplateKind::BackupPage, &path).unwrap_err();
        let engine = err.engine_error().expect("engine error");
        assert_eq!(engine.kind(), "render");
        assert!(engine.to_string().contains("cannot be loaded"), "{engine}");
    }
}
