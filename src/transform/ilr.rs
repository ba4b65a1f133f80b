//! Isometric Log-Ratio (ILR) transformation for compositional data.
//!
//! ILR projects log-compositions onto the orthonormal basis from
//! [`basis_matrix`]. Unlike CLR it drops the redundant direction, and unlike
//! ALR it preserves distances and angles, so it is a genuine isometry between
//! the simplex and (D-1)-dimensional real space.

use super::{basis_matrix, closure, ensure_positive, numbered_labels};
use super::{CoordinateTransform, ReversibleTransform};
use crate::error::{EarthchemError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Isometric log-ratio transform.
///
/// The basis depends only on the number of parts, which is read from the
/// input on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ilr;

impl Ilr {
    pub fn new() -> Self {
        Self
    }
}

impl CoordinateTransform for Ilr {
    fn name(&self) -> &'static str {
        "ILR"
    }

    /// # Formula
    /// ILR(X) = log(X) · Ψᵗ
    ///
    /// Ψ's rows sum to zero, so no explicit centering is needed.
    fn forward(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let (n_samples, n_parts) = data.shape();
        debug!(n_samples, n_parts, "ILR forward");

        if n_parts < 2 {
            return Err(EarthchemError::ShapeMismatch {
                operation: "ILR".to_string(),
                expected: "at least 2".to_string(),
                actual: n_parts,
            });
        }
        ensure_positive(data, "ILR")?;

        let psi = basis_matrix(n_parts)?;
        Ok(data.map(f64::ln) * psi.transpose())
    }

    fn forward_labels(&self, parts: &[String]) -> Vec<String> {
        numbered_labels("ilr", parts.len().saturating_sub(1))
    }
}

impl ReversibleTransform for Ilr {
    /// closure(exp(L · Ψ)) with Ψ built for `cols(L) + 1` parts.
    fn backward(&self, coords: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let (n_samples, n_coords) = coords.shape();
        debug!(n_samples, n_coords, "ILR backward");

        if n_coords == 0 {
            return Err(EarthchemError::ShapeMismatch {
                operation: "ILR inverse".to_string(),
                expected: "at least 1".to_string(),
                actual: n_coords,
            });
        }

        let psi = basis_matrix(n_coords + 1)?;
        closure(&(coords * psi).map(f64::exp), 1.0)
    }

    fn backward_labels(&self, coords: &[String]) -> Vec<String> {
        numbered_labels("part", coords.len() + 1)
    }
}
