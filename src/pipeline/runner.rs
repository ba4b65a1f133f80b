//! Pipeline runner for composing and executing transform steps.

use crate::data::{tidy_columns, CompositionTable};
use crate::error::{EarthchemError, Result};
use crate::transform::{close_table, Alr, Barycentric, BaseFeature, Clr, Ilr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A step in the transform pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineStep {
    // === Table Shaping ===
    /// Keep only the named parts, in the given order.
    SelectParts { parts: Vec<String> },
    /// Normalise headers and order columns (others, majors, traces).
    TidyColumns,

    // === Closure ===
    /// Close every sample to a fixed total.
    Close { total: f64 },

    // === Log-Ratio Transforms ===
    /// Centered log-ratio.
    Clr,
    /// Inverse centered log-ratio.
    ClrInverse,
    /// Additive log-ratio against a reference part.
    Alr { base: BaseFeature },
    /// Inverse additive log-ratio, reinserting the reference at `base`.
    AlrInverse { base: BaseFeature },
    /// Isometric log-ratio.
    Ilr,
    /// Inverse isometric log-ratio.
    IlrInverse,

    // === Projection ===
    /// Ternary projection of a 3-part table.
    Barycentric,
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Steps to execute.
    pub steps: Vec<PipelineStep>,
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(EarthchemError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(EarthchemError::from)
    }
}

/// Builder for constructing and running transform pipelines.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    name: String,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "unnamed".to_string(),
        }
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            name: config.name.clone(),
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Keep only the named parts.
    pub fn select_parts<S: AsRef<str>>(mut self, parts: &[S]) -> Self {
        self.steps.push(PipelineStep::SelectParts {
            parts: parts.iter().map(|p| p.as_ref().to_string()).collect(),
        });
        self
    }

    /// Tidy headers and column order.
    pub fn tidy_columns(mut self) -> Self {
        self.steps.push(PipelineStep::TidyColumns);
        self
    }

    /// Close to `total`.
    pub fn close(mut self, total: f64) -> Self {
        self.steps.push(PipelineStep::Close { total });
        self
    }

    pub fn clr(mut self) -> Self {
        self.steps.push(PipelineStep::Clr);
        self
    }

    pub fn clr_inverse(mut self) -> Self {
        self.steps.push(PipelineStep::ClrInverse);
        self
    }

    /// Add ALR against the part at `base`.
    pub fn alr(mut self, base: BaseFeature) -> Self {
        self.steps.push(PipelineStep::Alr { base });
        self
    }

    /// Add inverse ALR; `base` must match the forward step.
    pub fn alr_inverse(mut self, base: BaseFeature) -> Self {
        self.steps.push(PipelineStep::AlrInverse { base });
        self
    }

    pub fn ilr(mut self) -> Self {
        self.steps.push(PipelineStep::Ilr);
        self
    }

    pub fn ilr_inverse(mut self) -> Self {
        self.steps.push(PipelineStep::IlrInverse);
        self
    }

    pub fn barycentric(mut self) -> Self {
        self.steps.push(PipelineStep::Barycentric);
        self
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            name: self.name.clone(),
            description: description.map(String::from),
            steps: self.steps.clone(),
        }
    }

    /// Run the pipeline on a table.
    pub fn run(&self, table: &CompositionTable) -> Result<CompositionTable> {
        info!(
            pipeline = %self.name,
            n_steps = self.steps.len(),
            n_samples = table.n_samples(),
            n_parts = table.n_parts(),
            "running pipeline"
        );

        let mut current = table.clone();
        for (i, step) in self.steps.iter().enumerate() {
            current = apply(&current, step).map_err(|e| {
                EarthchemError::Pipeline(format!("Step {} ({:?}) failed: {}", i + 1, step, e))
            })?;
            debug!(step = i + 1, ?step, n_parts = current.n_parts(), "step complete");
        }

        Ok(current)
    }
}

fn apply(table: &CompositionTable, step: &PipelineStep) -> Result<CompositionTable> {
    match step {
        PipelineStep::SelectParts { parts } => table.select_parts(parts.as_slice()),
        PipelineStep::TidyColumns => tidy_columns(table),
        PipelineStep::Close { total } => close_table(table, *total),
        PipelineStep::Clr => table.transform(&Clr),
        PipelineStep::ClrInverse => table.inverse_transform(&Clr),
        PipelineStep::Alr { base } => table.transform(&Alr::new(*base)),
        PipelineStep::AlrInverse { base } => table.inverse_transform(&Alr::new(*base)),
        PipelineStep::Ilr => table.transform(&Ilr),
        PipelineStep::IlrInverse => table.inverse_transform(&Ilr),
        PipelineStep::Barycentric => table.transform(&Barycentric),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn create_test_table() -> CompositionTable {
        CompositionTable::new(
            DMatrix::from_row_slice(
                3,
                4,
                &[
                    48.0, 2.0, 15.0, 35.0, //
                    70.0, 0.5, 14.0, 15.5, //
                    55.0, 1.0, 18.0, 26.0, //
                ],
            ),
            vec!["sio2".into(), "tio2".into(), "al2o3".into(), "rest".into()],
            vec!["S1".into(), "S2".into(), "S3".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_pipeline_builder() {
        let pipeline = Pipeline::new()
            .name("test")
            .tidy_columns()
            .close(100.0)
            .ilr()
            .ilr_inverse();

        let config = pipeline.to_config(Some("Test pipeline"));
        assert_eq!(config.steps.len(), 4);
        assert_eq!(config.name, "test");
        assert_eq!(config.description.as_deref(), Some("Test pipeline"));
    }

    #[test]
    fn test_pipeline_run_ilr_round_trip() {
        let table = create_test_table();
        let result = Pipeline::new().ilr().ilr_inverse().close(100.0).run(&table).unwrap();

        let expected = close_table(&table, 100.0).unwrap();
        assert_eq!(result.n_parts(), 4);
        for (a, b) in result.matrix().iter().zip(expected.matrix().iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_pipeline_alr_round_trip_keeps_shape() {
        let table = create_test_table();
        let result = Pipeline::new()
            .alr(BaseFeature::Last)
            .alr_inverse(BaseFeature::Last)
            .run(&table)
            .unwrap();

        assert_eq!(result.n_parts(), 4);
        assert_eq!(result.part_ids()[3], "closure");
        let expected = close_table(&table, 1.0).unwrap();
        for (a, b) in result.matrix().iter().zip(expected.matrix().iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_pipeline_select_then_ternary() {
        let result = Pipeline::new()
            .tidy_columns()
            .select_parts(&["SiO2", "Al2O3", "TiO2"])
            .barycentric()
            .run(&create_test_table())
            .unwrap();

        assert_eq!(result.n_samples(), 3);
        assert_eq!(result.part_ids(), &["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_pipeline_config_yaml() {
        let pipeline = Pipeline::new()
            .name("example")
            .select_parts(&["SiO2", "MgO"])
            .close(100.0)
            .alr(BaseFeature::Index(1))
            .alr_inverse(BaseFeature::Last)
            .clr()
            .barycentric();

        let config = pipeline.to_config(Some("Example pipeline"));
        let yaml = config.to_yaml().unwrap();

        let parsed = PipelineConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.name, "example");
        assert_eq!(parsed.steps, config.steps);
    }

    #[test]
    fn test_pipeline_config_hand_written_yaml() {
        let yaml = "\
name: majors
description: ILR of closed majors
steps:
  - TidyColumns
  - !Close
    total: 100
  - !Alr
    base: last
  - Ilr
";
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.steps.len(), 4);
        assert_eq!(config.steps[1], PipelineStep::Close { total: 100.0 });
        assert_eq!(config.steps[2], PipelineStep::Alr { base: BaseFeature::Last });
    }

    #[test]
    fn test_pipeline_error_handling() {
        // Barycentric on a 4-part table must fail
        let result = Pipeline::new().barycentric().run(&create_test_table());
        match result {
            Err(EarthchemError::Pipeline(msg)) => {
                assert!(msg.contains("Step 1"));
                assert!(msg.contains("Barycentric"));
            }
            other => panic!("expected Pipeline error, got {:?}", other),
        }
    }

    #[test]
    fn test_pipeline_empty_is_identity() {
        let table = create_test_table();
        assert_eq!(Pipeline::new().run(&table).unwrap(), table);
    }
}
