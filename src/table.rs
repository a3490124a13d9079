//! Result table.
//!
//! One column per evaluated metric, every column aligned row for row with
//! the event table the run was started from. Columns are written once and
//! keep their insertion order, which is the evaluation order of the run.

use crate::autocov::nanmean;
use crate::error::{GaitError, TableError};
use crate::events::GaitEventTable;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::Path;

/// Column store for metric results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    bout_ids: Vec<u32>,
    order: Vec<String>,
    columns: HashMap<String, Vec<f64>>,
}

/// Per-bout mean of every column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoutMeans {
    pub bout_id: u32,
    pub rows: usize,
    pub means: BTreeMap<String, f64>,
}

#[derive(Serialize)]
struct ColumnExport<'a> {
    name: &'a str,
    values: Vec<Option<f64>>,
}

#[derive(Serialize)]
struct TableExport<'a> {
    rows: usize,
    bout_id: &'a [u32],
    columns: Vec<ColumnExport<'a>>,
}

impl ResultTable {
    /// Empty table shaped after an event table.
    pub fn for_events(events: &GaitEventTable) -> Self {
        Self {
            bout_ids: events.bout_ids().to_vec(),
            order: Vec::new(),
            columns: HashMap::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.bout_ids.len()
    }

    /// Check if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.bout_ids.is_empty()
    }

    pub fn bout_ids(&self) -> &[u32] {
        &self.bout_ids
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Write a new column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), TableError> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(TableError::LengthMismatch {
                column: name,
                expected: self.len(),
                actual: values.len(),
            });
        }
        if self.columns.contains_key(&name) {
            return Err(TableError::ColumnExists(name));
        }
        self.order.push(name.clone());
        self.columns.insert(name, values);
        Ok(())
    }

    /// Get a column if present.
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    /// Get a column that a computation requires.
    pub fn column(&self, name: &str) -> Result<&[f64], TableError> {
        self.get(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    fn bout_ranges(&self) -> Vec<(u32, Range<usize>)> {
        let mut out: Vec<(u32, Range<usize>)> = Vec::new();
        for (row, &bout) in self.bout_ids.iter().enumerate() {
            match out.last_mut() {
                Some((id, range)) if *id == bout => range.end = row + 1,
                _ => out.push((bout, row..row + 1)),
            }
        }
        out
    }

    /// Mean of the non-missing values of each column, per bout.
    pub fn bout_means(&self) -> Vec<BoutMeans> {
        self.bout_ranges()
            .into_iter()
            .map(|(bout_id, range)| {
                let means = self
                    .order
                    .iter()
                    .map(|name| {
                        let col = &self.columns[name];
                        (name.clone(), nanmean(&col[range.clone()]))
                    })
                    .collect();
                BoutMeans {
                    bout_id,
                    rows: range.len(),
                    means,
                }
            })
            .collect()
    }

    /// Serialize to JSON. Missing values become `null`.
    pub fn to_json(&self) -> Result<String, GaitError> {
        let export = TableExport {
            rows: self.len(),
            bout_id: &self.bout_ids,
            columns: self
                .order
                .iter()
                .map(|name| ColumnExport {
                    name,
                    values: self.columns[name]
                        .iter()
                        .map(|v| if v.is_finite() { Some(*v) } else { None })
                        .collect(),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Export to a CSV file. Missing values are left as empty cells.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<(), GaitError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "bout_id")?;
        for name in &self.order {
            write!(writer, ",{}", name)?;
        }
        writeln!(writer)?;

        for (row, bout) in self.bout_ids.iter().enumerate() {
            write!(writer, "{}", bout)?;
            for name in &self.order {
                let v = self.columns[name][row];
                if v.is_finite() {
                    write!(writer, ",{:.6}", v)?;
                } else {
                    write!(writer, ",")?;
                }
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Spread one value per bout over every row of that bout.
///
/// Bouts absent from `per_bout` get `NaN`.
pub fn broadcast(events: &GaitEventTable, per_bout: &BTreeMap<u32, f64>) -> Vec<f64> {
    events
        .bout_ids()
        .iter()
        .map(|bout| per_bout.get(bout).copied().unwrap_or(f64::NAN))
        .collect()
}
