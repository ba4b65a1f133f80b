//! Additive Log-Ratio (ALR) transformation for compositional data.
//!
//! ALR takes the log-ratio of each part relative to one reference part. The
//! output is unconstrained but depends on which part is chosen as reference.
//!
//! # Reference Selection
//!
//! - [`BaseFeature::Index`] names the reference by column position
//! - [`BaseFeature::Last`] is the one sentinel for "the final column"
//! - [`LabelledAlr`] resolves the reference from part ids with a regex
//!
//! # Comparison with CLR
//!
//! | Property | CLR | ALR |
//! |----------|-----|-----|
//! | Output dimensions | D | D-1 |
//! | Sum constraint | Sums to zero | None |
//! | Reference | Geometric mean | Single part |
//! | Interpretation | Relative to average | Relative to reference |

use super::{closure, ensure_positive, from_rows, CoordinateTransform, ReversibleTransform};
use crate::data::CompositionTable;
use crate::error::{EarthchemError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Default pattern for the reference column of labelled tables.
pub const DEFAULT_BASE_PATTERN: &str = ".*_unmeasured";

/// Label given to a reinserted reference column whose name is unknown.
pub const CLOSURE_LABEL: &str = "closure";

/// Which part serves as the ALR reference.
///
/// `Index(D - 1)` and `Last` select the same column on a D-part table; `Last`
/// is the only sentinel and does not depend on D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BaseFeatureRepr", into = "BaseFeatureRepr")]
pub enum BaseFeature {
    /// Zero-based column index.
    Index(usize),
    /// The final column, whatever the width.
    Last,
}

impl Default for BaseFeature {
    fn default() -> Self {
        BaseFeature::Index(0)
    }
}

impl fmt::Display for BaseFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseFeature::Index(i) => write!(f, "{}", i),
            BaseFeature::Last => write!(f, "last"),
        }
    }
}

impl FromStr for BaseFeature {
    type Err = EarthchemError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("last") {
            return Ok(BaseFeature::Last);
        }
        s.parse::<usize>().map(BaseFeature::Index).map_err(|_| {
            EarthchemError::InvalidParameter(format!(
                "Base feature must be a non-negative index or 'last', got '{}'",
                s
            ))
        })
    }
}

/// Serialized form: a bare integer or the keyword `last`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BaseFeatureRepr {
    Index(usize),
    Keyword(String),
}

impl TryFrom<BaseFeatureRepr> for BaseFeature {
    type Error = EarthchemError;

    fn try_from(repr: BaseFeatureRepr) -> Result<Self> {
        match repr {
            BaseFeatureRepr::Index(i) => Ok(BaseFeature::Index(i)),
            BaseFeatureRepr::Keyword(s) => s.parse(),
        }
    }
}

impl From<BaseFeature> for BaseFeatureRepr {
    fn from(base: BaseFeature) -> Self {
        match base {
            BaseFeature::Index(i) => BaseFeatureRepr::Index(i),
            BaseFeature::Last => BaseFeatureRepr::Keyword("last".to_string()),
        }
    }
}

/// Additive log-ratio transform with a fixed reference part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alr {
    base: BaseFeature,
}

impl Alr {
    pub fn new(base: BaseFeature) -> Self {
        Self { base }
    }

    /// Use the part at `index` as reference.
    pub fn with_index(index: usize) -> Self {
        Self::new(BaseFeature::Index(index))
    }

    /// Use the final part as reference.
    pub fn last() -> Self {
        Self::new(BaseFeature::Last)
    }

    pub fn base(&self) -> BaseFeature {
        self.base
    }

    /// Column of the reference part in a table of `n_parts` parts.
    pub fn base_position(&self, n_parts: usize) -> Result<usize> {
        match self.base {
            BaseFeature::Index(index) if index >= n_parts => {
                Err(EarthchemError::BaseIndexOutOfRange { index, n_parts })
            }
            BaseFeature::Index(index) => Ok(index),
            BaseFeature::Last if n_parts == 0 => Err(EarthchemError::BaseIndexOutOfRange {
                index: 0,
                n_parts,
            }),
            BaseFeature::Last => Ok(n_parts - 1),
        }
    }
}

impl CoordinateTransform for Alr {
    fn name(&self) -> &'static str {
        "ALR"
    }

    /// # Formula
    /// ALR(x_ij) = log(x_ij / x_i,base) for every j != base
    ///
    /// Surviving columns keep their input order.
    fn forward(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let (n_samples, n_parts) = data.shape();
        debug!(n_samples, n_parts, base = %self.base, "ALR forward");

        let base = self.base_position(n_parts)?;
        if n_parts < 2 {
            return Err(EarthchemError::ShapeMismatch {
                operation: "ALR".to_string(),
                expected: "at least 2".to_string(),
                actual: n_parts,
            });
        }
        ensure_positive(data, "ALR")?;

        let rows: Vec<Vec<f64>> = (0..n_samples)
            .into_par_iter()
            .map(|i| {
                let log_ref = data[(i, base)].ln();
                (0..n_parts)
                    .filter(|&j| j != base)
                    .map(|j| data[(i, j)].ln() - log_ref)
                    .collect()
            })
            .collect();

        Ok(from_rows(rows, n_parts - 1))
    }

    fn forward_labels(&self, parts: &[String]) -> Vec<String> {
        match self.base_position(parts.len()) {
            Ok(base) => parts
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != base)
                .map(|(_, id)| id.clone())
                .collect(),
            Err(_) => parts.to_vec(),
        }
    }
}

impl ReversibleTransform for Alr {
    /// Reinsert a zero log-ratio for the reference, exponentiate and close.
    fn backward(&self, coords: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let n_coords = coords.ncols();
        debug!(n_samples = coords.nrows(), n_coords, base = %self.base, "ALR backward");

        if n_coords == 0 {
            return Err(EarthchemError::ShapeMismatch {
                operation: "ALR inverse".to_string(),
                expected: "at least 1".to_string(),
                actual: n_coords,
            });
        }
        let base = self.base_position(n_coords + 1)?;

        let expanded = coords.clone().insert_column(base, 0.0);
        closure(&expanded.map(f64::exp), 1.0)
    }

    fn backward_labels(&self, coords: &[String]) -> Vec<String> {
        let mut labels = coords.to_vec();
        if let Ok(base) = self.base_position(coords.len() + 1) {
            labels.insert(base, CLOSURE_LABEL.to_string());
        }
        labels
    }
}

/// ALR output for a labelled table, with the reference it was taken against.
#[derive(Debug, Clone)]
pub struct AlrTable {
    /// Log-ratio coordinates (reference column removed).
    pub coords: CompositionTable,
    /// Part id of the reference column.
    pub base_id: String,
    /// Position of the reference column in the input table.
    pub base_index: usize,
}

/// ALR over labelled tables, picking the reference column by name.
///
/// The reference is the first part whose id matches `pattern` from its start
/// (default `.*_unmeasured`, the residual column of a partially analysed
/// sample). The resolved column is returned with the coordinates rather than
/// remembered, so inverting needs the [`AlrTable`] it came from.
#[derive(Debug, Clone)]
pub struct LabelledAlr {
    pattern: Regex,
    total: f64,
}

impl LabelledAlr {
    /// Build with a custom reference pattern and a closure total of 1.
    pub fn new(pattern: &str) -> Result<Self> {
        let anchored = Regex::new(&format!("^(?:{})", pattern))?;
        Ok(Self {
            pattern: anchored,
            total: 1.0,
        })
    }

    /// Total used when closing inverted tables (e.g. 100 for wt%).
    pub fn with_total(mut self, total: f64) -> Result<Self> {
        if !(total > 0.0) || !total.is_finite() {
            return Err(EarthchemError::InvalidParameter(format!(
                "Closure total must be positive and finite, got {}",
                total
            )));
        }
        self.total = total;
        Ok(self)
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Position of the first part id matching the reference pattern.
    pub fn resolve_base(&self, part_ids: &[String]) -> Result<usize> {
        part_ids
            .iter()
            .position(|id| self.pattern.is_match(id))
            .ok_or_else(|| {
                EarthchemError::MissingColumn(format!(
                    "no part matches reference pattern {}",
                    self.pattern.as_str()
                ))
            })
    }

    pub fn forward(&self, table: &CompositionTable) -> Result<AlrTable> {
        let base_index = self.resolve_base(table.part_ids())?;
        let alr = Alr::with_index(base_index);
        let coords = alr.forward(table.matrix())?;
        let labels = alr.forward_labels(table.part_ids());

        Ok(AlrTable {
            coords: table.with_parts(coords, labels)?,
            base_id: table.part_ids()[base_index].clone(),
            base_index,
        })
    }

    /// Invert, putting the reference column back under its own name.
    pub fn backward(&self, alr: &AlrTable) -> Result<CompositionTable> {
        let core = Alr::with_index(alr.base_index);
        let parts = closure(&core.backward(alr.coords.matrix())?, self.total)?;

        let mut labels = alr.coords.part_ids().to_vec();
        labels.insert(alr.base_index, alr.base_id.clone());
        alr.coords.with_parts(parts, labels)
    }

    /// Invert coordinates whose reference is unknown: the reconstructed part
    /// is appended at the end and labelled `closure`.
    pub fn backward_unlabelled(&self, coords: &CompositionTable) -> Result<CompositionTable> {
        let core = Alr::last();
        let parts = closure(&core.backward(coords.matrix())?, self.total)?;
        coords.with_parts(parts, core.backward_labels(coords.part_ids()))
    }
}

impl Default for LabelledAlr {
    fn default() -> Self {
        Self {
            pattern: Regex::new(&format!("^(?:{})", DEFAULT_BASE_PATTERN))
                .expect("default pattern is valid"),
            total: 1.0,
        }
    }
}
