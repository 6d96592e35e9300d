//! Invoice document rules.
//!
//! This crate turns typed invoice and backup rows into page specifications:
//! which text goes into which layout slot at which font size. It is purely
//! deterministic domain logic (no IO, no PDF, no spreadsheets).

pub mod cell;
pub mod cross_reference;
pub mod format;
pub mod layout;
pub mod matching;
pub mod pages;
pub mod paginate;
pub mod records;

pub use cell::CellValue;
pub use cross_reference::{Checkpoint, CrossReferenceRow, CrossReferenceTable};
pub use layout::{LayoutRegistry, Position, Slot};
pub use matching::select_backup_rows;
pub use pages::{FrontPage, PageSpec, TemplateKind, TextPlacement};
pub use paginate::{DEFAULT_ROWS_PER_PAGE, paginate};
pub use records::{BackupColumns, BackupRow, InvoiceColumns, InvoiceRow};
