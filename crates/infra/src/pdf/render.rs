//! Page renderer: stamps the text placements of a [`PageSpec`] onto a clone
//! of its template.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::debug;

use invoicestamp_core::EngineError;
use invoicestamp_invoicing::{LayoutRegistry, PageSpec, TextPlacement};

use crate::error::PipelineResult;
use crate::pdf::template::{TemplateSet, resolve};
use crate::pdf::text::encode_win_ansi;

/// Line advance as a multiple of the font size.
pub const LINE_LEADING: f32 = 1.2;
const FONT_RESOURCE_PREFIX: &str = "FStamp";

/// A stamped page: a single-page document ready to be merged.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    document: Document,
    page_id: ObjectId,
}

impl RenderedPage {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn page_id(&self) -> ObjectId {
        self.page_id
    }

    pub(crate) fn into_document(self) -> Document {
        self.document
    }

    /// Decoded content of the page, all streams concatenated.
    pub fn content(&self) -> PipelineResult<Vec<u8>> {
        Ok(self.document.get_page_content(self.page_id)?)
    }
}

/// Stamps pages from the batch templates using the layout registry.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    templates: TemplateSet,
    layout: LayoutRegistry,
}

impl PageRenderer {
    pub fn new(templates: TemplateSet, layout: LayoutRegistry) -> Self {
        Self { templates, layout }
    }

    pub fn render(&self, spec: &PageSpec) -> PipelineResult<RenderedPage> {
        let template = self.templates.get(spec.template);
        let page_box = template.page_box();
        let mut document = template.document().clone();
        let page_id = template.page_id();

        let mut operations = vec![Operation::new("Q", vec![])];
        let font_name = install_font(&mut document, page_id)?;
        for placement in &spec.placements {
            let position = self.layout.position(placement.slot)?;
            let (x, y) = page_box.to_user_space(position);
            operations.extend(text_operations(&font_name, placement, x, y));
        }

        let stamp = Content { operations }
            .encode()
            .map_err(|e| EngineError::render(format!("cannot encode page content: {e}")))?;
        let mut stamp_bytes = b"\n".to_vec();
        stamp_bytes.extend(stamp);
        let open_id = document.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let stamp_id = document.add_object(Stream::new(dictionary! {}, stamp_bytes));

        let page = document.get_object_mut(page_id)?.as_dict_mut()?;
        let mut contents = vec![Object::Reference(open_id)];
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => contents.push(Object::Reference(*id)),
            Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
            _ => {}
        }
        contents.push(Object::Reference(stamp_id));
        page.set("Contents", contents);

        debug!(
            template = ?spec.template,
            placements = spec.placements.len(),
            "page stamped"
        );
        Ok(RenderedPage {
            document,
            page_id,
        })
    }
}

fn text_operations(font_name: &[u8], placement: &TextPlacement, x: f32, y: f32) -> Vec<Operation> {
    let size = placement.font_size;
    let mut ops = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font_name.to_vec()), Object::Real(size)]),
        Operation::new("TL", vec![Object::Real(size * LINE_LEADING)]),
        Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
    ];
    for (i, line) in placement.text.split('\n').enumerate() {
        if i > 0 {
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
        ));
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

fn helvetica() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Copy the page's resources (and font map) inline, add Helvetica under an
/// unused name and return that name.
fn install_font(document: &mut Document, page_id: ObjectId) -> PipelineResult<Vec<u8>> {
    let page = document.get_dictionary(page_id)?;
    let mut resources = page
        .get(b"Resources")
        .ok()
        .and_then(|r| resolve(document, r))
        .and_then(|r| r.as_dict().ok())
        .cloned()
        .unwrap_or_default();
    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|f| resolve(document, f))
        .and_then(|f| f.as_dict().ok())
        .cloned()
        .unwrap_or_default();

    let mut name = FONT_RESOURCE_PREFIX.as_bytes().to_vec();
    let mut suffix = 0;
    while fonts.has(&name) {
        suffix += 1;
        name = format!("{FONT_RESOURCE_PREFIX}{suffix}").into_bytes();
    }

    let font_id = document.add_object(helvetica());
    fonts.set(name.clone(), font_id);
    resources.set("Font", fonts);
    document
        .get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", resources);
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::template::number;
    use crate::pdf::testing::blank_document;
    use invoicestamp_invoicing::{Position, Slot, TemplateKind};

    fn renderer() -> PageRenderer {
        let templates =
            TemplateSet::from_documents(blank_document(1), blank_document(1)).unwrap();
        let layout = LayoutRegistry::from_entries(
            Slot::ALL.iter().map(|s| (s.key(), Position::new(100.0, 42.0))),
        )
        .unwrap();
        PageRenderer::new(templates, layout)
    }

    fn operations(page: &RenderedPage) -> Vec<Operation> {
        Content::decode(&page.content().unwrap()).unwrap().operations
    }

    fn operands(ops: &[Operation], operator: &str) -> Vec<f32> {
        ops.iter()
            .find(|op| op.operator == operator)
            .unwrap()
            .operands
            .iter()
            .filter_map(number)
            .collect()
    }

    #[test]
    fn stamps_text_at_flipped_coordinates() {
        let mut spec = PageSpec::new(TemplateKind::FrontPage);
        spec.place(Slot::InvoiceReference, "INV-1001", 8.0);

        let page = renderer().render(&spec).unwrap();
        let ops = operations(&page);

        assert_eq!(operands(&ops, "Td"), vec![100.0, 800.0]);
        assert_eq!(operands(&ops, "Tf"), vec![8.0]);
        let shown = ops.iter().find(|op| op.operator == "Tj").unwrap();
        assert_eq!(
            shown.operands,
            vec![Object::String(b"INV-1001".to_vec(), StringFormat::Literal)]
        );
        // Template drawing is kept, wrapped in q/Q before the stamp.
        let names: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(&names[..5], &["q", "m", "l", "S", "Q"]);
    }

    #[test]
    fn multi_line_blocks_advance_by_leading() {
        let mut spec = PageSpec::new(TemplateKind::BackupPage);
        spec.place(Slot::QuoteRefColumn, " Q-1\nQ-22", 10.0);

        let page = renderer().render(&spec).unwrap();
        let ops = operations(&page);

        let leading = operands(&ops, "TL");
        assert!((leading[0] - 12.0).abs() < 1e-4, "{leading:?}");
        assert_eq!(ops.iter().filter(|op| op.operator == "Tj").count(), 2);
        assert_eq!(ops.iter().filter(|op| op.operator == "T*").count(), 1);
    }

    #[test]
    fn font_is_registered_on_the_page() {
        let spec = PageSpec::new(TemplateKind::FrontPage);
        let page = renderer().render(&spec).unwrap();
        let dict = page.document().get_dictionary(page.page_id()).unwrap();
        let fonts = dict
            .get(b"Resources")
            .and_then(Object::as_dict)
            .and_then(|r| r.get(b"Font"))
            .and_then(Object::as_dict)
            .unwrap();
        assert!(fonts.has(b"FStamp"));
    }

    #[test]
    fn rendering_leaves_the_template_untouched() {
        let r = renderer();
        let mut spec = PageSpec::new(TemplateKind::FrontPage);
        spec.place(Slot::Po, "PO1", 8.0);
        let first = r.render(&spec).unwrap();
        let second = r.render(&spec).unwrap();
        assert_eq!(first.content().unwrap(), second.content().unwrap());
        assert_eq!(first.document().objects.len(), second.document().objects.len());
    }
}
