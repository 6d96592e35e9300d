//! Paginator: fixed-size row groups for backup pages.

use invoicestamp_core::{EngineError, EngineResult};

/// Rows per backup page unless configured otherwise.
pub const DEFAULT_ROWS_PER_PAGE: usize = 58;

/// Split `rows` into consecutive groups of at most `page_size`, preserving
/// order. No rows yields no groups.
pub fn paginate<T>(rows: &[T], page_size: usize) -> EngineResult<Vec<&[T]>> {
    if page_size == 0 {
        return Err(EngineError::configuration("rows per page must be positive"));
    }
    Ok(rows.chunks(page_size).collect())
}
