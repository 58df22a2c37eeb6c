//! Keep only the rows that fall inside a boundary.

use crate::{boundary::Boundary, row::Located};

/// Keep the rows whose location is strictly inside `boundary`, in their original order.
///
/// Rows on the boundary itself and rows with non-finite coordinates are dropped.
pub fn filter_points<T: Located>(rows: Vec<T>, boundary: &Boundary) -> Vec<T> {
    let total = rows.len();

    let kept: Vec<T> = rows
        .into_iter()
        .filter(|row| boundary.contains(row.coord()))
        .collect();

    log::debug!(
        "{} of {} rows inside {}",
        kept.len(),
        total,
        boundary.name()
    );

    kept
}

/// Count the rows that can never be inside any boundary because a coordinate is not finite.
pub fn count_non_finite<T: Located>(rows: &[T]) -> usize {
    rows.iter().filter(|row| !row.coord().is_finite()).count()
}
