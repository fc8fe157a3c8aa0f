//! Dataset Module
//!
//! In-memory tabular dataset backed by a polars `DataFrame`, plus the CSV and
//! Excel loaders used by the session store.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use polars::prelude::*;
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::error::{DataError, Result};

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Excel,
}

impl FileKind {
    /// Resolve the loader for a file name by its extension
    pub fn from_name(name: &str) -> Result<Self> {
        let ext = extension_of(name);
        match ext.as_str() {
            ".csv" => Ok(FileKind::Csv),
            ".xlsx" | ".xls" => Ok(FileKind::Excel),
            _ => Err(DataError::UnsupportedFileType(ext)),
        }
    }
}

/// Lowercased extension including the leading dot, or an empty string
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Result of grouping a dataset by one column and summing others
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedSums {
    /// Group keys, rendered as strings, in ascending key order
    pub labels: Vec<String>,
    /// One `(column, sums)` pair per aggregated column
    pub series: Vec<(String, Vec<f64>)>,
}

/// A tabular dataset owned by one session
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Parse a dataset from raw file contents
    pub fn from_bytes(kind: FileKind, bytes: Vec<u8>) -> Result<Self> {
        match kind {
            FileKind::Csv => Self::from_csv_bytes(bytes),
            FileKind::Excel => Self::from_excel_bytes(bytes),
        }
    }

    /// Parse CSV contents, first row as header
    pub fn from_csv_bytes(bytes: Vec<u8>) -> Result<Self> {
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|e| DataError::Csv(e.to_string()))?;

        debug!(
            "Parsed CSV with {} rows and {} columns",
            frame.height(),
            frame.width()
        );
        Ok(Self::new(frame))
    }

    /// Parse the first worksheet of an Excel workbook, first row as header
    pub fn from_excel_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| DataError::Excel(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| DataError::Excel("workbook has no worksheets".to_string()))?
            .map_err(|e| DataError::Excel(e.to_string()))?;

        let frame = frame_from_range(&range)?;

        debug!(
            "Parsed Excel sheet with {} rows and {} columns",
            frame.height(),
            frame.width()
        );
        Ok(Self::new(frame))
    }

    /// Underlying frame
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// `(column, dtype)` pairs in column order
    pub fn dtypes(&self) -> Vec<(String, String)> {
        self.frame
            .get_columns()
            .iter()
            .map(|series| (series.name().to_string(), series.dtype().to_string()))
            .collect()
    }

    /// First `n` rows as JSON records
    pub fn sample_records(&self, n: usize) -> Vec<Map<String, Value>> {
        let head = self.frame.head(Some(n));
        (0..head.height())
            .map(|row| {
                head.get_columns()
                    .iter()
                    .map(|series| {
                        let value = series
                            .get(row)
                            .map(|v| any_value_to_json(&v))
                            .unwrap_or(Value::Null);
                        (series.name().to_string(), value)
                    })
                    .collect()
            })
            .collect()
    }

    /// Up to `n` non-null values from a column
    pub fn column_examples(&self, column: &str, n: usize) -> Result<Vec<Value>> {
        let series = self.require_column(column)?;
        let non_null = series.drop_nulls();
        Ok((0..non_null.len().min(n))
            .filter_map(|idx| non_null.get(idx).ok())
            .map(|v| any_value_to_json(&v))
            .collect())
    }

    /// Group rows by `x` and sum each of `ys`.
    ///
    /// Rows with a null key are dropped and groups come back sorted by key.
    pub fn grouped_sum(&self, x: &str, ys: &[String]) -> Result<GroupedSums> {
        self.require_column(x)?;
        for y in ys {
            let series = self.require_column(y)?;
            if !series.dtype().is_numeric() {
                return Err(DataError::NonNumericColumn(y.clone()));
            }
        }

        let aggs: Vec<Expr> = ys.iter().map(|y| col(y.as_str()).sum()).collect();
        let grouped = self
            .frame
            .clone()
            .lazy()
            .filter(col(x).is_not_null())
            .group_by([col(x)])
            .agg(aggs)
            .sort_by_exprs(vec![col(x)], SortMultipleOptions::default())
            .collect()?;

        let keys = grouped.column(x)?.cast(&DataType::String)?;
        let labels = keys
            .str()?
            .into_iter()
            .map(|label| label.unwrap_or_default().to_string())
            .collect();

        let mut series = Vec::with_capacity(ys.len());
        for y in ys {
            let sums = grouped.column(y)?.cast(&DataType::Float64)?;
            let values = sums
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            series.push((y.clone(), values));
        }

        Ok(GroupedSums { labels, series })
    }

    fn require_column(&self, name: &str) -> Result<&Series> {
        self.frame
            .column(name)
            .map_err(|_| DataError::ColumnNotFound(name.to_string()))
    }
}

/// Build a frame from a worksheet range, first row as header
fn frame_from_range(range: &calamine::Range<Data>) -> Result<DataFrame> {
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| DataError::Excel("worksheet is empty".to_string()))?;

    let names = header_names(header);
    let body: Vec<&[Data]> = rows.collect();
    let columns: Vec<Series> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                .collect();
            excel_column(name, &cells)
        })
        .collect();

    DataFrame::new(columns).map_err(|e| DataError::Excel(e.to_string()))
}

/// Column names from a header row; blank cells become `Unnamed: <idx>`
fn header_names(header: &[Data]) -> Vec<String> {
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| match cell {
            Data::Empty => format!("Unnamed: {}", idx),
            other => other.to_string(),
        })
        .collect()
}

/// Build a typed column from worksheet cells.
///
/// Integer if every non-empty cell is integral, float if every non-empty cell
/// is numeric, bool if every non-empty cell is boolean, string otherwise.
fn excel_column(name: &str, cells: &[&Data]) -> Series {
    let present: Vec<&Data> = cells
        .iter()
        .copied()
        .filter(|cell| !matches!(cell, Data::Empty))
        .collect();

    if present.is_empty() {
        let nulls: Vec<Option<String>> = vec![None; cells.len()];
        return Series::new(name, nulls);
    }

    let integral = present.iter().all(|cell| match cell {
        Data::Int(_) => true,
        Data::Float(f) => f.is_finite() && f.fract() == 0.0,
        _ => false,
    });
    if integral {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|cell| match cell {
                Data::Int(i) => Some(*i),
                Data::Float(f) => Some(*f as i64),
                _ => None,
            })
            .collect();
        return Series::new(name, values);
    }

    if present
        .iter()
        .all(|cell| matches!(cell, Data::Int(_) | Data::Float(_)))
    {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| match cell {
                Data::Int(i) => Some(*i as f64),
                Data::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        return Series::new(name, values);
    }

    if present.iter().all(|cell| matches!(cell, Data::Bool(_))) {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|cell| match cell {
                Data::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        return Series::new(name, values);
    }

    let values: Vec<Option<String>> = cells
        .iter()
        .map(|cell| match cell {
            Data::Empty => None,
            Data::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect();
    Series::new(name, values)
}

/// Convert a single polars cell to JSON
pub fn any_value_to_json(value: &AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => float_to_json(f64::from(*v)),
        AnyValue::Float64(v) => float_to_json(*v),
        other => match other.get_str() {
            Some(s) => Value::String(s.to_string()),
            None => Value::String(other.to_string()),
        },
    }
}

fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}
