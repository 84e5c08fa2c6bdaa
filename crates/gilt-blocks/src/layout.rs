//! Column count classes driven by container width.

use gilt_dom::{Document, DomError, NodeId};

/// Number of columns for a container `width` given ascending breakpoints.
///
/// With `[600, 900, 1200]`: below 600 is one column, below 900 two, below
/// 1200 three, anything wider four.
pub fn columns_for(width: u32, breakpoints: &[u32]) -> usize {
    1 + breakpoints.iter().filter(|bp| width >= **bp).count()
}

/// Class naming a column count, e.g. `columns-3-cols`.
pub fn columns_class(prefix: &str, columns: usize) -> String {
    format!("{prefix}-{columns}-cols")
}

/// Set exactly one column class on `block`, removing every other count up to
/// `max`.
pub fn apply_columns(
    doc: &mut Document,
    block: NodeId,
    prefix: &str,
    columns: usize,
    max: usize,
) -> Result<(), DomError> {
    for k in 1..=max.max(columns) {
        if k != columns {
            doc.remove_class(block, &columns_class(prefix, k))?;
        }
    }
    doc.add_class(block, &columns_class(prefix, columns))
}
