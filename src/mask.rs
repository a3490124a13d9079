//! Event row masking.
//!
//! Metrics that combine an event with a later one (the next opposite-foot
//! contact at offset 1, the next same-foot contact at offset 2) may only do
//! so when that later event exists inside the same bout. [`OffsetMask`]
//! captures which rows qualify and which row each one pairs with.
//!
//! Row `i` is eligible for offset `k` when row `i + k` exists, shares the
//! bout of row `i`, and its initial contact comes later. Ineligible rows keep
//! the `NaN` sentinel; at the end of every bout this is expected.

use crate::events::GaitEventTable;

/// Eligibility of each row and the row it pairs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetMask {
    mask: Vec<bool>,
    pairs: Vec<(usize, usize)>,
}

impl OffsetMask {
    /// Mask with every row ineligible.
    pub fn none(rows: usize) -> Self {
        Self {
            mask: vec![false; rows],
            pairs: Vec::new(),
        }
    }

    /// Per-row eligibility.
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Whether `row` is eligible.
    pub fn is_eligible(&self, row: usize) -> bool {
        self.mask.get(row).copied().unwrap_or(false)
    }

    /// Shifted row index for each eligible row, in row order.
    pub fn shifted(&self) -> Vec<usize> {
        self.pairs.iter().map(|&(_, s)| s).collect()
    }

    /// `(row, shifted_row)` pairs for every eligible row.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Number of eligible rows.
    pub fn eligible_count(&self) -> usize {
        self.pairs.len()
    }

    /// Column of `NaN` with `f(row, shifted_row)` written at eligible rows.
    pub fn fill<F>(&self, mut f: F) -> Vec<f64>
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut out = vec![f64::NAN; self.mask.len()];
        for &(row, shifted) in &self.pairs {
            out[row] = f(row, shifted);
        }
        out
    }
}

/// Build the eligibility mask for pairing each row with the row `offset`
/// events later.
///
/// `None` leaves every row ineligible, which marks a metric as not
/// computable for the run without aborting it. `Some(0)` pairs every row
/// with itself.
pub fn build_offset_mask(table: &GaitEventTable, offset: Option<usize>) -> OffsetMask {
    let rows = table.len();
    let offset = match offset {
        Some(k) => k,
        None => return OffsetMask::none(rows),
    };

    let bouts = table.bout_ids();
    let ic = table.ic();
    let mut mask = vec![false; rows];
    let mut pairs = Vec::new();

    for row in 0..rows {
        let shifted = row + offset;
        if shifted >= rows || bouts[shifted] != bouts[row] {
            continue;
        }
        if offset > 0 && ic[shifted] <= ic[row] {
            continue;
        }
        mask[row] = true;
        pairs.push((row, shifted));
    }

    OffsetMask { mask, pairs }
}
