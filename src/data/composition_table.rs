//! Labelled composition table: samples × parts with identifiers.

use crate::error::{EarthchemError, Result};
use crate::transform::{CoordinateTransform, ReversibleTransform};
use nalgebra::DMatrix;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// Header used for the sample id column when none is given.
pub const DEFAULT_INDEX_LABEL: &str = "sample_id";

/// A dense table of compositions with named parts and samples.
///
/// Rows represent samples, columns represent parts (oxides, elements or
/// log-ratio coordinates after a transform).
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionTable {
    /// Dense values (samples × parts)
    data: DMatrix<f64>,
    /// Part identifiers (column names)
    part_ids: Vec<String>,
    /// Sample identifiers (row names)
    sample_ids: Vec<String>,
    /// Header of the sample id column
    index_label: String,
}

impl CompositionTable {
    /// Create a new table, checking that labels match the matrix shape.
    pub fn new(data: DMatrix<f64>, part_ids: Vec<String>, sample_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != sample_ids.len() {
            return Err(EarthchemError::DimensionMismatch {
                expected: nrows,
                actual: sample_ids.len(),
            });
        }
        if ncols != part_ids.len() {
            return Err(EarthchemError::DimensionMismatch {
                expected: ncols,
                actual: part_ids.len(),
            });
        }
        Ok(Self {
            data,
            part_ids,
            sample_ids,
            index_label: DEFAULT_INDEX_LABEL.to_string(),
        })
    }

    /// Create a table with generated sample ids (`0`, `1`, ...).
    pub fn from_matrix(data: DMatrix<f64>, part_ids: Vec<String>) -> Result<Self> {
        let sample_ids = (0..data.nrows()).map(|i| i.to_string()).collect();
        Self::new(data, part_ids, sample_ids)
    }

    /// Set the header of the sample id column.
    pub fn with_index_label(mut self, label: &str) -> Self {
        self.index_label = label.to_string();
        self
    }

    /// Read a delimited table.
    ///
    /// Expected format:
    /// - First row: header, first cell names the sample id column, the rest
    ///   are part ids
    /// - Subsequent rows: sample id followed by one numeric value per part
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.len() < 2 {
            return Err(EarthchemError::EmptyData(
                "Table must have at least one part column".to_string(),
            ));
        }
        let index_label = headers[0].to_string();
        let part_ids: Vec<String> = headers.iter().skip(1).map(String::from).collect();
        let n_parts = part_ids.len();

        let mut sample_ids = Vec::new();
        let mut values = Vec::new();
        for (row_idx, record) in rdr.records().enumerate() {
            let record = record?;
            if record.len() != n_parts + 1 {
                return Err(EarthchemError::DimensionMismatch {
                    expected: n_parts + 1,
                    actual: record.len(),
                });
            }
            sample_ids.push(record[0].to_string());
            for (col_idx, field) in record.iter().skip(1).enumerate() {
                let value: f64 = field.parse().map_err(|_| EarthchemError::InvalidValue {
                    value: field.to_string(),
                    row: row_idx,
                    col: col_idx,
                })?;
                values.push(value);
            }
        }

        if sample_ids.is_empty() {
            return Err(EarthchemError::EmptyData("No samples in table".to_string()));
        }

        let data = DMatrix::from_row_slice(sample_ids.len(), n_parts, &values);
        Ok(Self::new(data, part_ids, sample_ids)?.with_index_label(&index_label))
    }

    /// Load a table from a file, choosing the delimiter from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let delimiter = delimiter_for_path(path.as_ref());
        let file = File::open(path.as_ref())?;
        let table = Self::from_reader(file, delimiter)?;
        debug!(
            path = %path.as_ref().display(),
            n_samples = table.n_samples(),
            n_parts = table.n_parts(),
            "loaded composition table"
        );
        Ok(table)
    }

    /// Write the table as delimited text.
    pub fn to_writer<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        let mut header = Vec::with_capacity(self.n_parts() + 1);
        header.push(self.index_label.clone());
        header.extend(self.part_ids.iter().cloned());
        wtr.write_record(&header)?;

        for (i, sample_id) in self.sample_ids.iter().enumerate() {
            let mut record = Vec::with_capacity(self.n_parts() + 1);
            record.push(sample_id.clone());
            record.extend(self.data.row(i).iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write the table to a file, choosing the delimiter from its extension.
    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let delimiter = delimiter_for_path(path.as_ref());
        let file = File::create(path.as_ref())?;
        self.to_writer(file, delimiter)
    }

    /// Get the value at (sample, part).
    #[inline]
    pub fn get(&self, sample: usize, part: usize) -> f64 {
        self.data[(sample, part)]
    }

    /// Number of samples (rows).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    /// Number of parts (columns).
    #[inline]
    pub fn n_parts(&self) -> usize {
        self.data.ncols()
    }

    #[inline]
    pub fn part_ids(&self) -> &[String] {
        &self.part_ids
    }

    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    #[inline]
    pub fn index_label(&self) -> &str {
        &self.index_label
    }

    /// Get reference to the underlying matrix.
    #[inline]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn into_matrix(self) -> DMatrix<f64> {
        self.data
    }

    /// Values of one part across samples.
    pub fn part(&self, part: usize) -> Vec<f64> {
        self.data.column(part).iter().cloned().collect()
    }

    /// Values of one sample across parts.
    pub fn sample(&self, sample: usize) -> Vec<f64> {
        self.data.row(sample).iter().cloned().collect()
    }

    /// Position of a part id, if present.
    pub fn part_index(&self, id: &str) -> Option<usize> {
        self.part_ids.iter().position(|p| p == id)
    }

    /// Same labels, new values.
    pub fn with_data(&self, data: DMatrix<f64>) -> Result<Self> {
        self.with_parts(data, self.part_ids.clone())
    }

    /// Same samples, new parts.
    pub fn with_parts(&self, data: DMatrix<f64>, part_ids: Vec<String>) -> Result<Self> {
        Ok(Self::new(data, part_ids, self.sample_ids.clone())?
            .with_index_label(&self.index_label))
    }

    /// Subset to the given parts, in the given order.
    pub fn select_parts<S: AsRef<str>>(&self, ids: &[S]) -> Result<Self> {
        let indices = ids
            .iter()
            .map(|id| {
                self.part_index(id.as_ref())
                    .ok_or_else(|| EarthchemError::MissingColumn(id.as_ref().to_string()))
            })
            .collect::<Result<Vec<usize>>>()?;
        self.select_indices(&indices)
    }

    /// Subset to the parts at `indices`, in that order.
    pub fn select_indices(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&j| j >= self.n_parts()) {
            return Err(EarthchemError::InvalidParameter(format!(
                "Part index {} out of bounds ({} parts)",
                bad,
                self.n_parts()
            )));
        }
        let data = self.data.select_columns(indices);
        let part_ids = indices.iter().map(|&j| self.part_ids[j].clone()).collect();
        self.with_parts(data, part_ids)
    }

    /// Rename every part id with `f`.
    pub fn rename_parts<F: FnMut(&str) -> String>(&self, mut f: F) -> Self {
        let mut renamed = self.clone();
        renamed.part_ids = self.part_ids.iter().map(|id| f(id)).collect();
        renamed
    }

    /// Apply a forward transform, carrying labels through.
    pub fn transform<T: CoordinateTransform + ?Sized>(&self, transform: &T) -> Result<Self> {
        let coords = transform.forward(&self.data)?;
        self.with_parts(coords, transform.forward_labels(&self.part_ids))
    }

    /// Apply an inverse transform, carrying labels through.
    pub fn inverse_transform<T: ReversibleTransform + ?Sized>(&self, transform: &T) -> Result<Self> {
        let parts = transform.backward(&self.data)?;
        self.with_parts(parts, transform.backward_labels(&self.part_ids))
    }
}

/// Tab for `.tsv`/`.tab`/`.txt`, comma otherwise.
pub fn delimiter_for_path(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("tab") | Some("txt") => b'\t',
        _ => b',',
    }
}
