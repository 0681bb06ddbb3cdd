//! Delimited-text loader for shipment datasets.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// Cell spellings treated as missing values in numeric columns.
const MISSING_MARKERS: &[&str] = &[
    "", "na", "n/a", "#n/a", "nan", "-nan", "null", "none", "<na>",
];

/// A single named column after type inference.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Every non-missing cell parsed as a number; missing cells hold `NaN`.
    Numeric(Vec<f64>),
    /// At least one cell was not numeric; raw strings are kept.
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the numeric values, if this column is numeric.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(values) => Some(values),
            Column::Text(_) => None,
        }
    }

    fn from_cells(cells: Vec<String>) -> Self {
        let mut numeric = Vec::with_capacity(cells.len());
        for cell in &cells {
            match parse_numeric_cell(cell) {
                Some(value) => numeric.push(value),
                None => return Column::Text(cells),
            }
        }
        Column::Numeric(numeric)
    }
}

/// In-memory table loaded from a delimited file.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

/// Shape of a freshly loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub rows: usize,
    pub columns: usize,
}

impl Dataset {
    /// Build a dataset from named columns of equal length.
    pub fn from_columns(named: Vec<(String, Column)>) -> Result<Self> {
        let n_rows = named.first().map(|(_, column)| column.len()).unwrap_or(0);
        if let Some((name, column)) = named.iter().find(|(_, column)| column.len() != n_rows) {
            return Err(PipelineError::Fit(format!(
                "column `{name}` has {} rows but expected {n_rows}",
                column.len()
            )));
        }
        let (headers, columns): (Vec<String>, Vec<Column>) = named.into_iter().unzip();
        Ok(Self {
            headers,
            columns,
            n_rows,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.headers.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.headers
    }

    /// Look up a column by header name. The first match wins for duplicated headers.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.headers
            .iter()
            .position(|header| header == name)
            .map(|idx| &self.columns[idx])
    }

    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            rows: self.n_rows,
            columns: self.n_columns(),
        }
    }
}

/// Load a comma-separated file with a header row.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(PipelineError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|source| PipelineError::io(path, source))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(BufReader::new(file));

    let parse_err = |source| PipelineError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_err)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(parse_err)?;
        for (column, value) in cells.iter_mut().zip(record.iter()) {
            column.push(value.to_string());
        }
    }

    let named = headers
        .into_iter()
        .zip(cells)
        .map(|(name, cells)| (name, Column::from_cells(cells)))
        .collect();
    let dataset = Dataset::from_columns(named)?;
    tracing::debug!(
        "Parsed {} rows x {} columns from {}",
        dataset.n_rows(),
        dataset.n_columns(),
        path.display()
    );
    Ok(dataset)
}

fn parse_numeric_cell(cell: &str) -> Option<f64> {
    if MISSING_MARKERS
        .iter()
        .any(|marker| cell.eq_ignore_ascii_case(marker))
    {
        return Some(f64::NAN);
    }
    cell.parse::<f64>().ok()
}
