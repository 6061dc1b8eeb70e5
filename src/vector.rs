//! This is the vector math module
//! Provide distances between binary ingredient-presence vectors

use crate::error::{RecommendError, Result};

/// Squared Euclidean distance
/// dist² = sum((a[i] - b[i])^2) for i = 0..a.len()
/// For 0/1 vectors this is the number of differing columns, so it stays an exact integer
/// Can only process vectors with same dimensions
pub fn squared_distance(left: &[u8], right: &[u8]) -> Result<u32> {
    if left.len() != right.len() {
        return Err(RecommendError::DimensionMismatch {
            expected: left.len(),
            actual: right.len(),
        });
    }

    Ok(squared_distance_unchecked(left, right))
}

/// Same as [`squared_distance`] for callers that already checked the widths.
pub(crate) fn squared_distance_unchecked(left: &[u8], right: &[u8]) -> u32 {
    debug_assert_eq!(left.len(), right.len());
    left.iter()
        .zip(right.iter())
        .map(|(&x, &y)| {
            let diff = x.abs_diff(y) as u32;
            diff * diff
        })
        .sum()
}
