//! Transforms for compositional data.
//!
//! This module provides the closure operator and the log-ratio family:
//!
//! - **Closure**: rescale rows to a fixed total
//! - **CLR**: Centered log-ratio (D parts to D coordinates, rows sum to zero)
//! - **ALR**: Additive log-ratio relative to one reference part (D-1 coordinates)
//! - **ILR**: Isometric log-ratio on an orthonormal basis (D-1 coordinates)
//! - **Barycentric**: 3-part projection onto the plane for ternary diagrams
//!
//! All numeric tables are samples (rows) × parts (columns).

pub mod alr;
pub mod barycentric;
pub mod basis;
pub mod closure;
pub mod clr;
pub mod ilr;

pub use alr::{Alr, AlrTable, BaseFeature, LabelledAlr};
pub use barycentric::Barycentric;
pub use basis::basis_matrix;
pub use closure::{close_table, closure};
pub use clr::Clr;
pub use ilr::Ilr;

use crate::error::{EarthchemError, Result};
use nalgebra::DMatrix;

/// A map from compositions to some coordinate space.
pub trait CoordinateTransform {
    /// Short name used in logs and labels.
    fn name(&self) -> &'static str;

    /// Map a samples × parts table into coordinates.
    fn forward(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>>;

    /// Column labels of the forward output given the input part labels.
    fn forward_labels(&self, parts: &[String]) -> Vec<String>;
}

/// A coordinate map that can be inverted back onto the simplex.
///
/// `backward` always returns compositions closed to unity.
pub trait ReversibleTransform: CoordinateTransform {
    /// Map coordinates back to closed compositions.
    fn backward(&self, coords: &DMatrix<f64>) -> Result<DMatrix<f64>>;

    /// Column labels of the backward output given the coordinate labels.
    fn backward_labels(&self, coords: &[String]) -> Vec<String>;
}

/// Reject any non-positive or non-finite entry before taking logarithms.
pub(crate) fn ensure_positive(data: &DMatrix<f64>, method: &str) -> Result<()> {
    for i in 0..data.nrows() {
        for j in 0..data.ncols() {
            let val = data[(i, j)];
            if !(val > 0.0) || !val.is_finite() {
                return Err(EarthchemError::Domain(format!(
                    "{} requires positive values; found {} at ({}, {})",
                    method, val, i, j
                )));
            }
        }
    }
    Ok(())
}

/// Assemble a matrix from per-row results computed in parallel.
pub(crate) fn from_rows(rows: Vec<Vec<f64>>, ncols: usize) -> DMatrix<f64> {
    let nrows = rows.len();
    let mut out = DMatrix::zeros(nrows, ncols);
    for (i, row) in rows.iter().enumerate() {
        for (j, &val) in row.iter().enumerate() {
            out[(i, j)] = val;
        }
    }
    out
}

/// Sequential labels `prefix_1..prefix_n`.
pub(crate) fn numbered_labels(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{}_{}", prefix, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_positive_accepts_positive() {
        let data = DMatrix::from_row_slice(2, 2, &[0.1, 0.9, 0.5, 0.5]);
        assert!(ensure_positive(&data, "CLR").is_ok());
    }

    #[test]
    fn test_ensure_positive_rejects_nan() {
        let data = DMatrix::from_row_slice(1, 2, &[f64::NAN, 0.5]);
        assert!(matches!(
            ensure_positive(&data, "ILR"),
            Err(EarthchemError::Domain(_))
        ));
    }

    #[test]
    fn test_numbered_labels() {
        assert_eq!(numbered_labels("ilr", 3), vec!["ilr_1", "ilr_2", "ilr_3"]);
        assert!(numbered_labels("part", 0).is_empty());
    }
}
