//! Orthonormal contrast basis for the isometric log-ratio.

use crate::error::{EarthchemError, Result};
use nalgebra::DMatrix;

/// Build the ILR basis matrix Ψ for `n_parts`-part compositions.
///
/// Ψ is (D-1) × D and built row by row (1-indexed): row i holds
/// `sqrt(1 / ((D-i)(D-i+1)))` in columns `1..=D-i`, `-sqrt((D-i)/(D-i+1))` in
/// column `D-i+1` and zeros after that.
///
/// The rows are orthonormal and orthogonal to the all-ones vector, so
/// `Ψ Ψᵗ = I_{D-1}` and `Ψᵗ Ψ = I_D - J_D / D`.
///
/// The matrix is rebuilt on every call; callers transforming many tables of
/// the same width may cache it themselves.
pub fn basis_matrix(n_parts: usize) -> Result<DMatrix<f64>> {
    if n_parts < 2 {
        return Err(EarthchemError::InvalidParameter(format!(
            "ILR basis needs at least 2 parts, got {}",
            n_parts
        )));
    }

    let d = n_parts;
    let mut psi = DMatrix::zeros(d - 1, d);
    for i in 1..d {
        let k = (d - i) as f64;
        let positive = (1.0 / (k * (k + 1.0))).sqrt();
        let negative = -(k / (k + 1.0)).sqrt();
        for j in 1..=(d - i) {
            psi[(i - 1, j - 1)] = positive;
        }
        psi[(i - 1, d - i)] = negative;
    }
    Ok(psi)
}
