//! Pure functions for the key/value row editors (query parameters and headers).
//!
//! Every function takes the current rows and returns the next rows; nothing is
//! mutated in place. After any row mutation a non-empty list always ends with
//! exactly one blank row, so the editor offers a ready-to-fill row without an
//! explicit "Add" click. An empty list stays empty until the caller appends.

use crate::types::{KeyValueRow, RowPatch};

/// A row is empty when both key and value are blank after trimming.
pub fn is_row_empty(row: &KeyValueRow) -> bool {
    row.key.trim().is_empty() && row.value.trim().is_empty()
}

pub fn has_row_value(row: &KeyValueRow) -> bool {
    !is_row_empty(row)
}

/// True when the list is non-empty and no row is left blank.
pub fn should_append_empty_row(rows: &[KeyValueRow]) -> bool {
    !rows.is_empty() && rows.iter().all(has_row_value)
}

fn ensure_trailing_blank(mut rows: Vec<KeyValueRow>) -> Vec<KeyValueRow> {
    if should_append_empty_row(&rows) {
        rows.push(KeyValueRow::default());
    }
    rows
}

/// Apply `patch` to the row at `index`.
///
/// A row that becomes empty is dropped unless it is the only row. An
/// out-of-bounds index leaves the list untouched.
pub fn update(rows: &[KeyValueRow], index: usize, patch: &RowPatch) -> Vec<KeyValueRow> {
    if index >= rows.len() {
        return rows.to_vec();
    }

    let mut next = rows.to_vec();
    patch.apply_to(&mut next[index]);

    if is_row_empty(&next[index]) && next.len() > 1 {
        next.remove(index);
    }

    ensure_trailing_blank(next)
}

/// Remove the row at `index`. Deleting the last remaining row leaves an empty list.
pub fn delete(rows: &[KeyValueRow], index: usize) -> Vec<KeyValueRow> {
    let next = rows
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, row)| row.clone())
        .collect();

    ensure_trailing_blank(next)
}

/// Append one blank row unconditionally (the explicit "Add" button).
pub fn append(rows: &[KeyValueRow]) -> Vec<KeyValueRow> {
    let mut next = rows.to_vec();
    next.push(KeyValueRow::default());
    next
}

pub fn clear() -> Vec<KeyValueRow> {
    Vec::new()
}

/// Bring an arbitrary list of rows in line with the trailing-blank rule.
pub fn normalize(rows: Vec<KeyValueRow>) -> Vec<KeyValueRow> {
    ensure_trailing_blank(rows)
}
