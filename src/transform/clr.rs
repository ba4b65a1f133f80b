//! Centered Log-Ratio (CLR) transformation for compositional data.

use super::{closure, ensure_positive, from_rows, CoordinateTransform, ReversibleTransform};
use crate::error::{EarthchemError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Centered log-ratio transform.
///
/// CLR takes the log of each part divided by the geometric mean of its
/// sample. The output has as many columns as the input and every row sums to
/// zero, so the coordinates live in a (D-1)-dimensional hyperplane.
///
/// # Formula
/// For sample i: CLR(x_ij) = log(x_ij) - mean_k(log(x_ik))
///
/// Where mean_k(log(x_ik)) is the arithmetic mean of the log values of
/// sample i, which equals log(geometric_mean(x_i)).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clr;

impl Clr {
    pub fn new() -> Self {
        Self
    }

    /// Geometric mean of each sample.
    ///
    /// Computed as exp(mean(log(x))) to avoid overflow of the raw product.
    pub fn geometric_means(data: &DMatrix<f64>) -> Result<Vec<f64>> {
        ensure_positive(data, "Geometric mean")?;
        Ok(mean_logs(data).into_iter().map(f64::exp).collect())
    }
}

fn mean_logs(data: &DMatrix<f64>) -> Vec<f64> {
    let n_parts = data.ncols() as f64;
    (0..data.nrows())
        .into_par_iter()
        .map(|i| data.row(i).iter().map(|x| x.ln()).sum::<f64>() / n_parts)
        .collect()
}

impl CoordinateTransform for Clr {
    fn name(&self) -> &'static str {
        "CLR"
    }

    /// # Errors
    /// Any zero or negative part makes the geometric mean undefined and is
    /// reported as a domain error.
    fn forward(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let (n_samples, n_parts) = data.shape();
        debug!(n_samples, n_parts, "CLR forward");

        if n_parts == 0 {
            return Err(EarthchemError::EmptyData(
                "Cannot apply CLR to a table with no parts".to_string(),
            ));
        }
        ensure_positive(data, "CLR")?;

        let log_means = mean_logs(data);
        let rows: Vec<Vec<f64>> = (0..n_samples)
            .into_par_iter()
            .map(|i| {
                data.row(i)
                    .iter()
                    .map(|x| x.ln() - log_means[i])
                    .collect()
            })
            .collect();

        Ok(from_rows(rows, n_parts))
    }

    fn forward_labels(&self, parts: &[String]) -> Vec<String> {
        parts.to_vec()
    }
}

impl ReversibleTransform for Clr {
    /// exp(L) closed to unity.
    fn backward(&self, coords: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        debug!(n_samples = coords.nrows(), n_coords = coords.ncols(), "CLR backward");
        closure(&coords.map(f64::exp), 1.0)
    }

    fn backward_labels(&self, coords: &[String]) -> Vec<String> {
        coords.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_data() -> DMatrix<f64> {
        // 4 samples × 3 parts
        DMatrix::from_row_slice(
            4,
            3,
            &[
                10.5, 30.5, 5.5, //
                20.5, 40.5, 10.5, //
                15.5, 35.5, 8.5, //
                5.5, 25.5, 3.5, //
            ],
        )
    }

    #[test]
    fn test_clr_basic() {
        let result = Clr.forward(&create_test_data()).unwrap();
        assert_eq!(result.shape(), (4, 3));
        assert_eq!(Clr.name(), "CLR");
    }

    #[test]
    fn test_clr_row_sums_zero() {
        let result = Clr.forward(&create_test_data()).unwrap();
        for i in 0..result.nrows() {
            let row_sum: f64 = result.row(i).iter().sum();
            assert_relative_eq!(row_sum, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_clr_geometric_mean() {
        let means = Clr::geometric_means(&create_test_data()).unwrap();
        let expected = (10.5_f64 * 30.5 * 5.5).powf(1.0 / 3.0);
        assert_relative_eq!(means[0], expected, epsilon = 1e-10);
    }

    #[test]
    fn test_clr_manual_calculation() {
        // 2 samples × 2 parts, geometric mean 2 in both
        let data = DMatrix::from_row_slice(2, 2, &[1.0, 4.0, 4.0, 1.0]);
        let result = Clr.forward(&data).unwrap();

        assert_relative_eq!(result[(0, 0)], -(2.0_f64.ln()), epsilon = 1e-10);
        assert_relative_eq!(result[(0, 1)], 2.0_f64.ln(), epsilon = 1e-10);
        assert_relative_eq!(result[(1, 0)], 2.0_f64.ln(), epsilon = 1e-10);
        assert_relative_eq!(result[(1, 1)], -(2.0_f64.ln()), epsilon = 1e-10);
    }

    #[test]
    fn test_clr_scale_invariant() {
        let data = create_test_data();
        let scaled = &data * 37.0;
        let a = Clr.forward(&data).unwrap();
        let b = Clr.forward(&scaled).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_clr_round_trip_recovers_closure() {
        let data = create_test_data();
        let coords = Clr.forward(&data).unwrap();
        let back = Clr.backward(&coords).unwrap();
        let expected = closure(&data, 1.0).unwrap();
        for (x, y) in back.iter().zip(expected.iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_clr_rejects_zeros() {
        let data = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 4.0, 1.0]);
        assert!(matches!(
            Clr.forward(&data),
            Err(EarthchemError::Domain(_))
        ));
    }

    #[test]
    fn test_clr_rejects_negative() {
        let data = DMatrix::from_row_slice(2, 2, &[1.0, -1.0, 4.0, 1.0]);
        assert!(Clr.forward(&data).is_err());
    }

    #[test]
    fn test_clr_labels_pass_through() {
        let parts: Vec<String> = vec!["SiO2".into(), "MgO".into()];
        assert_eq!(Clr.forward_labels(&parts), parts);
        assert_eq!(Clr.backward_labels(&parts), parts);
    }
}
