//! Compositional data transforms for geochemical tables.
//!
//! This library provides the numerical core for working with compositions
//! (parts of a whole, such as oxide wt% or trace-element ppm) pulled from a
//! geochemistry database.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **transform**: Closure, ILR basis, CLR, ALR, ILR and barycentric projection
//! - **data**: Labelled composition tables, delimited I/O, column tidying
//! - **pipeline**: YAML-configurable chains of transform steps
//!
//! # Example
//!
//! ```
//! use earthchem::prelude::*;
//! use nalgebra::DMatrix;
//!
//! let x = DMatrix::from_row_slice(1, 3, &[0.2, 0.3, 0.5]);
//!
//! let ilr = Ilr.forward(&x).unwrap();
//! let back = Ilr.backward(&ilr).unwrap();
//! assert!((back[(0, 2)] - 0.5).abs() < 1e-12);
//!
//! let xy = Barycentric.forward(&x).unwrap();
//! assert!((xy[(0, 0)] - 0.4).abs() < 1e-12);
//! ```

pub mod data;
pub mod error;
pub mod pipeline;
pub mod transform;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{tidy_columns, to_chem_case, CompositionTable};
    pub use crate::error::{EarthchemError, Result};
    pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineStep};
    pub use crate::transform::{
        basis_matrix, close_table, closure, Alr, AlrTable, Barycentric, BaseFeature, Clr,
        CoordinateTransform, Ilr, LabelledAlr, ReversibleTransform,
    };
}
