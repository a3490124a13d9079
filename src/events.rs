//! Gait event table and per-bout auxiliary signals.
//!
//! Events are produced upstream by gait-event detection. Rows are grouped
//! contiguously by bout and, inside a bout, initial contacts strictly
//! increase. Sample indices are relative to the start of the bout's own
//! acceleration signal.

use crate::error::TableError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

/// A single detected gait event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaitEvent {
    /// Sample index of the initial contact (heel strike).
    pub ic: usize,
    /// Sample index of the final contact (toe off) of the same foot.
    pub fc: usize,
    /// Sample index of the final contact of the opposite foot.
    pub fc_opposite: usize,
    /// Centre of mass height change during the step (m).
    pub delta_h: f64,
    /// Bout this event belongs to.
    pub bout_id: u32,
}

impl GaitEvent {
    pub fn new(ic: usize, fc: usize, fc_opposite: usize, delta_h: f64, bout_id: u32) -> Self {
        Self {
            ic,
            fc,
            fc_opposite,
            delta_h,
            bout_id,
        }
    }
}

/// Column-oriented, read-only table of gait events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GaitEventTable {
    ic: Vec<usize>,
    fc: Vec<usize>,
    fc_opposite: Vec<usize>,
    delta_h: Vec<f64>,
    bout_id: Vec<u32>,
}

impl GaitEventTable {
    /// Build a table from rows, checking the bout grouping invariant.
    pub fn new(events: &[GaitEvent]) -> Result<Self, TableError> {
        Self::from_columns(
            events.iter().map(|e| e.ic).collect(),
            events.iter().map(|e| e.fc).collect(),
            events.iter().map(|e| e.fc_opposite).collect(),
            events.iter().map(|e| e.delta_h).collect(),
            events.iter().map(|e| e.bout_id).collect(),
        )
    }

    /// Build a table from columns of equal length.
    pub fn from_columns(
        ic: Vec<usize>,
        fc: Vec<usize>,
        fc_opposite: Vec<usize>,
        delta_h: Vec<f64>,
        bout_id: Vec<u32>,
    ) -> Result<Self, TableError> {
        let n = ic.len();
        for (name, len) in [
            ("FC", fc.len()),
            ("FC_opposite", fc_opposite.len()),
            ("delta_h", delta_h.len()),
            ("bout_id", bout_id.len()),
        ] {
            if len != n {
                return Err(TableError::LengthMismatch {
                    column: name.to_string(),
                    expected: n,
                    actual: len,
                });
            }
        }

        let mut closed: HashSet<u32> = HashSet::new();
        for row in 1..n {
            let (prev, cur) = (bout_id[row - 1], bout_id[row]);
            if prev != cur {
                closed.insert(prev);
                if closed.contains(&cur) {
                    return Err(TableError::UnorderedEvents {
                        row,
                        reason: format!("bout {} is not contiguous", cur),
                    });
                }
            } else if ic[row] <= ic[row - 1] {
                return Err(TableError::UnorderedEvents {
                    row,
                    reason: format!(
                        "IC {} does not follow IC {} in bout {}",
                        ic[row],
                        ic[row - 1],
                        cur
                    ),
                });
            }
        }

        Ok(Self {
            ic,
            fc,
            fc_opposite,
            delta_h,
            bout_id,
        })
    }

    /// Number of event rows.
    pub fn len(&self) -> usize {
        self.ic.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.ic.is_empty()
    }

    pub fn ic(&self) -> &[usize] {
        &self.ic
    }

    pub fn fc(&self) -> &[usize] {
        &self.fc
    }

    pub fn fc_opposite(&self) -> &[usize] {
        &self.fc_opposite
    }

    pub fn delta_h(&self) -> &[f64] {
        &self.delta_h
    }

    pub fn bout_ids(&self) -> &[u32] {
        &self.bout_id
    }

    /// Get a row.
    pub fn get(&self, row: usize) -> Option<GaitEvent> {
        if row >= self.len() {
            return None;
        }
        Some(GaitEvent {
            ic: self.ic[row],
            fc: self.fc[row],
            fc_opposite: self.fc_opposite[row],
            delta_h: self.delta_h[row],
            bout_id: self.bout_id[row],
        })
    }

    /// Bouts in table order with their row ranges.
    pub fn bouts(&self) -> Vec<(u32, Range<usize>)> {
        let mut out: Vec<(u32, Range<usize>)> = Vec::new();
        for (row, &bout) in self.bout_id.iter().enumerate() {
            match out.last_mut() {
                Some((id, range)) if *id == bout => range.end = row + 1,
                _ => out.push((bout, row..row + 1)),
            }
        }
        out
    }
}

/// Acceleration recorded during one bout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoutSignal {
    /// Tri-axial acceleration, one sample per row.
    pub accel: Vec<[f64; 3]>,
    /// Index of the vertical axis in `accel`.
    pub vertical_axis: usize,
}

impl BoutSignal {
    pub fn new(accel: Vec<[f64; 3]>, vertical_axis: usize) -> Self {
        Self {
            accel,
            vertical_axis,
        }
    }

    /// Vertical acceleration component.
    pub fn vertical(&self) -> Vec<f64> {
        let axis = self.vertical_axis.min(2);
        self.accel.iter().map(|s| s[axis]).collect()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.accel.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.accel.is_empty()
    }
}

/// Side data shared by all metrics of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitAuxiliary {
    /// Sampling interval (seconds per sample).
    pub dt: f64,
    /// Leg length (m). Spatial metrics are skipped without it.
    pub leg_length: Option<f64>,
    bouts: BTreeMap<u32, BoutSignal>,
}

impl GaitAuxiliary {
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            leg_length: None,
            bouts: BTreeMap::new(),
        }
    }

    /// Set the leg length.
    pub fn with_leg_length(mut self, leg_length: f64) -> Self {
        self.leg_length = Some(leg_length);
        self
    }

    /// Add a bout signal.
    pub fn with_bout(mut self, bout_id: u32, signal: BoutSignal) -> Self {
        self.bouts.insert(bout_id, signal);
        self
    }

    /// Add or replace a bout signal.
    pub fn insert_bout(&mut self, bout_id: u32, signal: BoutSignal) {
        self.bouts.insert(bout_id, signal);
    }

    /// Signal of a bout.
    pub fn bout(&self, bout_id: u32) -> Option<&BoutSignal> {
        self.bouts.get(&bout_id)
    }

    /// Number of bouts with a signal.
    pub fn bout_count(&self) -> usize {
        self.bouts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(bouts: &[(u32, usize)]) -> Vec<GaitEvent> {
        let mut out = Vec::new();
        for &(bout, n) in bouts {
            for i in 0..n {
                let ic = 10 + i * 50;
                out.push(GaitEvent::new(ic, ic + 60, ic + 10, 0.03, bout));
            }
        }
        out
    }

    #[test]
    fn test_table_creation() {
        let table = GaitEventTable::new(&events(&[(0, 4), (1, 3)])).unwrap();
        assert_eq!(table.len(), 7);
        assert!(!table.is_empty());
        assert_eq!(table.ic()[1], 60);
        assert_eq!(table.get(4).unwrap().bout_id, 1);
        assert!(table.get(7).is_none());
    }

    #[test]
    fn test_bouts() {
        let table = GaitEventTable::new(&events(&[(3, 2), (7, 5), (9, 1)])).unwrap();
        let bouts = table.bouts();
        assert_eq!(bouts, vec![(3, 0..2), (7, 2..7), (9, 7..8)]);
    }

    #[test]
    fn test_non_contiguous_bout_rejected() {
        let mut ev = events(&[(0, 2), (1, 2)]);
        ev.extend(events(&[(0, 1)]));
        let err = GaitEventTable::new(&ev).unwrap_err();
        assert!(matches!(err, TableError::UnorderedEvents { row: 4, .. }));
    }

    #[test]
    fn test_decreasing_ic_rejected() {
        let mut ev = events(&[(0, 3)]);
        ev[2].ic = 5;
        assert!(matches!(
            GaitEventTable::new(&ev),
            Err(TableError::UnorderedEvents { row: 2, .. })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let err =
            GaitEventTable::from_columns(vec![1, 2], vec![3, 4], vec![5], vec![0.0, 0.0], vec![0, 0])
                .unwrap_err();
        assert!(matches!(
            err,
            TableError::LengthMismatch { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn test_empty_table() {
        let table = GaitEventTable::new(&[]).unwrap();
        assert!(table.is_empty());
        assert!(table.bouts().is_empty());
    }

    #[test]
    fn test_auxiliary() {
        let signal = BoutSignal::new(vec![[0.0, 1.0, 2.0], [0.5, 1.5, 2.5]], 1);
        let aux = GaitAuxiliary::new(0.01)
            .with_leg_length(0.9)
            .with_bout(4, signal);
        assert_eq!(aux.bout_count(), 1);
        assert_eq!(aux.bout(4).unwrap().vertical(), vec![1.0, 1.5]);
        assert!(aux.bout(5).is_none());
        assert_eq!(aux.leg_length, Some(0.9));
    }
}
