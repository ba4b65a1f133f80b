//! Barycentric projection of 3-part compositions for ternary diagrams.

use super::{from_rows, CoordinateTransform};
use crate::error::{EarthchemError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Equilateral-triangle embedding of 3-part compositions.
///
/// Vertices sit at (0, 0) for part 0, (1, 0) for part 1 and (1/2, √3/2) for
/// part 2. Inputs need not be closed: each row is scaled by its own sum.
///
/// There is no inverse; the projection is for display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barycentric;

impl Barycentric {
    pub fn new() -> Self {
        Self
    }
}

impl CoordinateTransform for Barycentric {
    fn name(&self) -> &'static str {
        "Barycentric"
    }

    /// # Formula
    /// With s = 2(x0 + x1 + x2): (x, y) = ((2 x1 + x2) / s, √3 x2 / s)
    fn forward(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let (n_samples, n_parts) = data.shape();
        debug!(n_samples, n_parts, "Barycentric forward");

        if n_parts != 3 {
            return Err(EarthchemError::ShapeMismatch {
                operation: "Barycentric".to_string(),
                expected: "3".to_string(),
                actual: n_parts,
            });
        }

        let sqrt3 = 3.0_f64.sqrt();
        let rows: Vec<Vec<f64>> = (0..n_samples)
            .into_par_iter()
            .map(|i| {
                let (x0, x1, x2) = (data[(i, 0)], data[(i, 1)], data[(i, 2)]);
                let denom = 2.0 * (x0 + x1 + x2);
                vec![(2.0 * x1 + x2) / denom, sqrt3 * x2 / denom]
            })
            .collect();

        Ok(from_rows(rows, 2))
    }

    fn forward_labels(&self, _parts: &[String]) -> Vec<String> {
        vec!["x".to_string(), "y".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_barycentric_known_point() {
        let data = DMatrix::from_row_slice(1, 3, &[0.2, 0.3, 0.5]);
        let xy = Barycentric.forward(&data).unwrap();

        assert_eq!(xy.shape(), (1, 2));
        assert_relative_eq!(xy[(0, 0)], 0.4, epsilon = 1e-12);
        assert_relative_eq!(xy[(0, 1)], 3.0_f64.sqrt() / 4.0, epsilon = 1e-12);
        assert_relative_eq!(xy[(0, 1)], 0.433, epsilon = 1e-3);
    }

    #[test]
    fn test_barycentric_vertices() {
        let data = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 2.0]);
        let xy = Barycentric.forward(&data).unwrap();

        assert_relative_eq!(xy[(0, 0)], 0.0, epsilon = 1e-12);
        assert_relative_eq!(xy[(0, 1)], 0.0, epsilon = 1e-12);
        assert_relative_eq!(xy[(1, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(xy[(1, 1)], 0.0, epsilon = 1e-12);
        assert_relative_eq!(xy[(2, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(xy[(2, 1)], 3.0_f64.sqrt() / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_barycentric_scale_invariant() {
        let a = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let b = DMatrix::from_row_slice(1, 3, &[10.0, 20.0, 30.0]);
        let xa = Barycentric.forward(&a).unwrap();
        let xb = Barycentric.forward(&b).unwrap();
        assert_relative_eq!(xa[(0, 0)], xb[(0, 0)], epsilon = 1e-12);
        assert_relative_eq!(xa[(0, 1)], xb[(0, 1)], epsilon = 1e-12);
    }

    #[test]
    fn test_barycentric_wrong_width() {
        for n_parts in [2, 4, 5, 10] {
            let data = DMatrix::from_element(4, n_parts, 1.0);
            match Barycentric.forward(&data) {
                Err(EarthchemError::ShapeMismatch { actual, .. }) => assert_eq!(actual, n_parts),
                other => panic!("expected ShapeMismatch, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_barycentric_labels() {
        assert_eq!(Barycentric.forward_labels(&[]), vec!["x", "y"]);
    }
}
