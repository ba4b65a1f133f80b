//! The closure operator.
//!
//! Closure rescales every sample so that its parts sum to a fixed total,
//! turning raw abundances (wt%, ppm, counts) into a point on the simplex.
//! It is idempotent: closing an already closed table changes nothing beyond
//! floating-point rounding.

use crate::data::CompositionTable;
use crate::error::{EarthchemError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Common closure totals.
pub mod total {
    /// Fractions (sum to 1.0 per sample).
    pub const UNITY: f64 = 1.0;
    /// Percentages, as in wt% oxide tables.
    pub const PERCENT: f64 = 100.0;
    /// Parts per million.
    pub const PPM: f64 = 1_000_000.0;
}

/// Close each row of `data` so that it sums to `total`.
///
/// # Formula
/// For sample i: C(x_ij) = total * x_ij / sum_k(x_ik)
///
/// # Arguments
/// * `data` - Samples × parts matrix (at least one part)
/// * `total` - The total every row should sum to (finite, > 0)
///
/// # Returns
/// A matrix of the same shape whose rows sum to `total`.
///
/// # Errors
/// A row summing to zero (or to a non-finite value) cannot be closed and is
/// reported as a domain error naming the row.
pub fn closure(data: &DMatrix<f64>, total: f64) -> Result<DMatrix<f64>> {
    let (n_samples, n_parts) = data.shape();

    if !(total > 0.0) || !total.is_finite() {
        return Err(EarthchemError::InvalidParameter(format!(
            "Closure total must be positive and finite, got {}",
            total
        )));
    }

    if n_parts == 0 {
        return Err(EarthchemError::EmptyData(
            "Cannot close a table with no parts".to_string(),
        ));
    }

    let sums: Vec<f64> = (0..n_samples)
        .into_par_iter()
        .map(|i| data.row(i).iter().sum::<f64>())
        .collect();

    for (i, &sum) in sums.iter().enumerate() {
        if sum == 0.0 || !sum.is_finite() {
            return Err(EarthchemError::Domain(format!(
                "Sample {} sums to {}, cannot close",
                i, sum
            )));
        }
    }

    Ok(DMatrix::from_fn(n_samples, n_parts, |i, j| {
        total * data[(i, j)] / sums[i]
    }))
}

/// Close a labelled table, keeping its part and sample ids.
pub fn close_table(table: &CompositionTable, total: f64) -> Result<CompositionTable> {
    let closed = closure(table.matrix(), total)?;
    table.with_data(closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_data() -> DMatrix<f64> {
        // 3 samples × 3 parts, deliberately not closed
        DMatrix::from_row_slice(
            3,
            3,
            &[
                50.0, 30.0, 20.0, // sums to 100
                2.0, 2.0, 4.0, // sums to 8
                0.1, 0.7, 0.2, // already closed
            ],
        )
    }

    #[test]
    fn test_closure_rows_sum_to_one() {
        let closed = closure(&create_test_data(), total::UNITY).unwrap();

        assert_eq!(closed.shape(), (3, 3));
        for i in 0..closed.nrows() {
            let row_sum: f64 = closed.row(i).iter().sum();
            assert_relative_eq!(row_sum, 1.0, epsilon = 1e-12);
        }
        assert_relative_eq!(closed[(0, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(closed[(1, 2)], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_closure_percent() {
        let closed = closure(&create_test_data(), total::PERCENT).unwrap();
        for i in 0..closed.nrows() {
            let row_sum: f64 = closed.row(i).iter().sum();
            assert_relative_eq!(row_sum, 100.0, epsilon = 1e-10);
        }
        assert_relative_eq!(closed[(1, 0)], 25.0, epsilon = 1e-10);
    }

    #[test]
    fn test_closure_idempotent() {
        let once = closure(&create_test_data(), 1.0).unwrap();
        let twice = closure(&once, 1.0).unwrap();
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_closure_already_closed_is_unchanged() {
        let data = DMatrix::from_row_slice(1, 3, &[0.2, 0.3, 0.5]);
        let closed = closure(&data, 1.0).unwrap();
        assert_relative_eq!(closed[(0, 0)], 0.2, epsilon = 1e-12);
        assert_relative_eq!(closed[(0, 1)], 0.3, epsilon = 1e-12);
        assert_relative_eq!(closed[(0, 2)], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_closure_single_part() {
        let data = DMatrix::from_row_slice(2, 1, &[3.0, 7.0]);
        let closed = closure(&data, 1.0).unwrap();
        assert_relative_eq!(closed[(0, 0)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(closed[(1, 0)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_closure_no_samples() {
        let data = DMatrix::<f64>::zeros(0, 4);
        let closed = closure(&data, 1.0).unwrap();
        assert_eq!(closed.shape(), (0, 4));
    }

    #[test]
    fn test_closure_zero_row_rejected() {
        let data = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 0.0, 0.0]);
        let result = closure(&data, 1.0);
        assert!(matches!(result, Err(EarthchemError::Domain(_))));
    }

    #[test]
    fn test_closure_invalid_total() {
        let data = create_test_data();
        assert!(closure(&data, 0.0).is_err());
        assert!(closure(&data, -1.0).is_err());
        assert!(closure(&data, f64::NAN).is_err());
    }

    #[test]
    fn test_close_table_keeps_labels() {
        let table = CompositionTable::new(
            create_test_data(),
            vec!["SiO2".into(), "MgO".into(), "FeO".into()],
            vec!["S1".into(), "S2".into(), "S3".into()],
        )
        .unwrap();
        let closed = close_table(&table, total::PERCENT).unwrap();

        assert_eq!(closed.part_ids(), table.part_ids());
        assert_eq!(closed.sample_ids(), table.sample_ids());
        assert_relative_eq!(closed.get(0, 0), 50.0, epsilon = 1e-10);
    }
}
