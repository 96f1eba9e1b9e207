//! Reading table loading and validation
//!
//! The engine consumes an immutable table of N rows: one f64 per sensor
//! dimension plus a 0/1 anomaly flag per row. Storage is column-major since
//! every hot path (sequence hashing, window reconstruction) walks one
//! dimension at a time.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Immutable multi-dimensional reading table
///
/// Rows are time-ordered sensor readings; the anomaly flag marks rows
/// labeled as incidents of interest by an external process.
#[derive(Debug, Clone)]
pub struct ReadingTable {
    dimension_names: Vec<String>,
    /// Column-major values: `columns[d][row]`
    columns: Vec<Vec<f64>>,
    anomaly: Vec<bool>,
}

impl ReadingTable {
    /// Assemble a table from pre-built columns
    ///
    /// # Errors
    ///
    /// Fails if no dimensions are given, a name is missing per column, or
    /// column lengths disagree with the anomaly flags.
    pub fn from_columns(
        dimension_names: Vec<String>,
        columns: Vec<Vec<f64>>,
        anomaly: Vec<bool>,
    ) -> Result<Self> {
        if columns.is_empty() {
            bail!("reading table needs at least one sensor dimension");
        }
        if dimension_names.len() != columns.len() {
            bail!(
                "{} dimension names for {} columns",
                dimension_names.len(),
                columns.len()
            );
        }
        for (name, column) in dimension_names.iter().zip(&columns) {
            if column.len() != anomaly.len() {
                bail!(
                    "column '{}' has {} rows, anomaly flags have {}",
                    name,
                    column.len(),
                    anomaly.len()
                );
            }
        }

        Ok(Self {
            dimension_names,
            columns,
            anomaly,
        })
    }

    /// Number of rows (N)
    pub fn num_rows(&self) -> usize {
        self.anomaly.len()
    }

    /// Number of sensor dimensions (D), excluding the anomaly column
    pub fn num_dimensions(&self) -> usize {
        self.columns.len()
    }

    /// Dimension names in column order
    pub fn dimension_names(&self) -> &[String] {
        &self.dimension_names
    }

    /// One value by (dimension, row)
    pub fn value(&self, dimension: usize, row: usize) -> f64 {
        self.columns[dimension][row]
    }

    /// Full column for a dimension
    pub fn column(&self, dimension: usize) -> &[f64] {
        &self.columns[dimension]
    }

    /// Row indexes labeled anomalous, ascending
    pub fn anomalous_windows(&self) -> Vec<usize> {
        self.anomaly
            .iter()
            .enumerate()
            .filter_map(|(row, &flag)| flag.then_some(row))
            .collect()
    }
}

/// Load a reading table from a CSV file
///
/// The first line is a header; `anomaly_column` names the 0/1 flag column,
/// every other column is parsed as an f64 sensor dimension.
pub fn load_csv(path: &Path, anomaly_column: &str) -> Result<ReadingTable> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut lines = raw.lines().enumerate();

    let (_, header) = lines.next().context("empty input file")?;
    let names: Vec<&str> = header.split(',').map(str::trim).collect();
    let anomaly_pos = names
        .iter()
        .position(|name| *name == anomaly_column)
        .with_context(|| format!("anomaly column '{}' not found in header", anomaly_column))?;

    let dimension_names: Vec<String> = names
        .iter()
        .enumerate()
        .filter(|(pos, _)| *pos != anomaly_pos)
        .map(|(_, name)| name.to_string())
        .collect();

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); dimension_names.len()];
    let mut anomaly = Vec::new();

    for (line_no, line) in lines {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != names.len() {
            bail!(
                "line {}: expected {} fields, found {}",
                line_no + 1,
                names.len(),
                fields.len()
            );
        }

        let mut column_pos = 0;
        for (pos, field) in fields.iter().enumerate() {
            if pos == anomaly_pos {
                let flag: u8 = field.parse().with_context(|| {
                    format!("line {}: invalid anomaly flag '{}'", line_no + 1, field)
                })?;
                anomaly.push(flag != 0);
            } else {
                let value: f64 = field.parse().with_context(|| {
                    format!(
                        "line {}: invalid value '{}' in column '{}'",
                        line_no + 1,
                        field,
                        names[pos]
                    )
                })?;
                columns[column_pos].push(value);
                column_pos += 1;
            }
        }
    }

    tracing::info!(
        rows = anomaly.len(),
        dimensions = dimension_names.len(),
        "loaded reading table from {}",
        path.display()
    );

    ReadingTable::from_columns(dimension_names, columns, anomaly)
}
