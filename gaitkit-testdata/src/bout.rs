// gaitkit Testdata - Bout container
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Generated bout container and export.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during bout export.
#[derive(Debug, Error)]
pub enum BoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A generated walking bout.
///
/// Event columns are aligned row for row; sample indices refer to
/// `accel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticBout {
    /// Sampling interval in seconds.
    pub dt: f64,
    /// Index of the vertical axis in `accel`.
    pub vertical_axis: usize,
    pub ic: Vec<usize>,
    pub fc: Vec<usize>,
    pub fc_opposite: Vec<usize>,
    pub delta_h: Vec<f64>,
    /// Tri-axial acceleration in g.
    pub accel: Vec<[f64; 3]>,
}

impl SyntheticBout {
    /// Number of gait events.
    pub fn len(&self) -> usize {
        self.ic.len()
    }

    /// Check if the bout has no events.
    pub fn is_empty(&self) -> bool {
        self.ic.is_empty()
    }

    /// Duration in seconds between each contact and the next one.
    pub fn step_times(&self) -> Vec<f64> {
        self.ic
            .windows(2)
            .map(|w| (w[1] - w[0]) as f64 * self.dt)
            .collect()
    }

    /// Duration in seconds between each contact and the next same-foot one.
    pub fn stride_times(&self) -> Vec<f64> {
        self.ic
            .windows(3)
            .map(|w| (w[2] - w[0]) as f64 * self.dt)
            .collect()
    }

    /// Vertical acceleration component.
    pub fn vertical(&self) -> Vec<f64> {
        self.accel.iter().map(|s| s[self.vertical_axis]).collect()
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, BoutError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Import from JSON.
    pub fn from_json(json: &str) -> Result<Self, BoutError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Export the acceleration trace to CSV.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<(), BoutError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "sample,time_s,x,y,z")?;
        for (i, s) in self.accel.iter().enumerate() {
            writeln!(
                writer,
                "{},{:.4},{:.6},{:.6},{:.6}",
                i,
                i as f64 * self.dt,
                s[0],
                s[1],
                s[2]
            )?;
        }

        writer.flush()?;
        Ok(())
    }
}
