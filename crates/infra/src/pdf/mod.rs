//! PDF side of the pipeline: template loading, text stamping, merging.

pub mod merge;
pub mod render;
pub mod template;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

pub use merge::InvoiceDocument;
pub use render::{PageRenderer, RenderedPage};
pub use template::{PageBox, Template, TemplateSet};
