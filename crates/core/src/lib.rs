//! `invoicestamp-core`: foundation building blocks of the document engine.
//!
//! This crate contains **pure** primitives (no infrastructure concerns): the
//! engine error taxonomy and typed identifiers.

pub mod error;
pub mod id;

pub use error::{EngineError, EngineResult};
pub use id::{InvoiceNumber, PoReference, QuoteReference};
