//! Reading tabulated calculation output
//!
//! Each calculation is a CSV table with one row per report loop, headed by
//! `iterations` and the column labels of [`Observable`], next to a JSON file
//! with the same stem holding its [`Metadata`]:
//!
//! ```text
//! run.csv    iterations,Shift,N_0,\sum H_0j N_j,# H psips
//! run.json   {"calc_type": "FCIQMC", "UUID": "...", "qmc": {"tau": 0.01, "ncycles": 10}}
//! ```

use csv::ReaderBuilder;
use reblock_core::{
    CalculationRecord, Error, Extractor, Metadata, Observable, Result, TimeSeries,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Header of the iteration column
pub const ITERATIONS_HEADER: &str = "iterations";

/// Reads CSV tables with JSON metadata sidecars
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularExtractor;

impl TabularExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Path of the metadata sidecar for a table
    pub fn metadata_path(path: &Path) -> PathBuf {
        path.with_extension("json")
    }

    /// Read one table and its metadata
    pub fn read(&self, path: &Path) -> Result<CalculationRecord> {
        let metadata = read_metadata(path)?;
        let series = read_table(path)?;
        tracing::debug!(
            path = %path.display(),
            rows = series.len(),
            calc_type = %metadata.calc_type,
            "extracted calculation"
        );
        Ok(CalculationRecord::new(metadata, series))
    }
}

impl Extractor for TabularExtractor {
    fn extract(&self, paths: &[PathBuf]) -> Result<Vec<CalculationRecord>> {
        paths.iter().map(|path| self.read(path)).collect()
    }
}

fn parse_error(path: &Path, message: impl Into<String>) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

fn read_metadata(table: &Path) -> Result<Metadata> {
    let path = TabularExtractor::metadata_path(table);
    let file = File::open(&path)
        .map_err(|err| parse_error(&path, format!("cannot open metadata: {err}")))?;
    let mut metadata: Metadata = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| parse_error(&path, err.to_string()))?;
    metadata.source = Some(table.to_path_buf());
    Ok(metadata)
}

fn parse_iteration(field: &str) -> Option<i64> {
    let field = field.trim();
    field.parse::<i64>().ok().or_else(|| {
        field
            .parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && v.is_finite())
            .map(|v| v as i64)
    })
}

fn read_table(path: &Path) -> Result<TimeSeries> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| parse_error(path, err.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|err| parse_error(path, err.to_string()))?
        .clone();
    let iteration_index = headers
        .iter()
        .position(|h| h == ITERATIONS_HEADER)
        .ok_or_else(|| parse_error(path, format!("no '{ITERATIONS_HEADER}' column")))?;
    let columns: Vec<(usize, Observable)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| Observable::from_label(h).map(|obs| (i, obs)))
        .collect();
    for ignored in headers
        .iter()
        .filter(|h| *h != ITERATIONS_HEADER && Observable::from_label(h).is_none())
    {
        tracing::trace!(path = %path.display(), column = ignored, "ignoring column");
    }

    let mut iterations = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|err| parse_error(path, err.to_string()))?;
        let field = record.get(iteration_index).unwrap_or_default();
        let iteration = parse_iteration(field).ok_or_else(|| {
            parse_error(path, format!("row {}: bad iteration number '{field}'", row + 1))
        })?;
        iterations.push(iteration);
        for ((index, observable), column) in columns.iter().zip(values.iter_mut()) {
            let field = record.get(*index).unwrap_or_default();
            let value = field.parse::<f64>().map_err(|_| {
                parse_error(
                    path,
                    format!("row {}: bad value '{field}' in column '{observable}'", row + 1),
                )
            })?;
            column.push(value);
        }
    }

    TimeSeries::from_columns(
        iterations,
        columns.into_iter().map(|(_, obs)| obs).zip(values),
    )
    .map_err(|err| match err {
        Error::MissingColumn { column, .. } => {
            parse_error(path, format!("missing column '{column}'"))
        }
        other => parse_error(path, other.to_string()),
    })
}
