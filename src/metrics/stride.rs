//! Per-stride signal metrics.

use super::{GaitMetric, MetricContext};
use crate::error::Result;
use crate::mask::build_offset_mask;
use crate::regularity::{self, HarmonicRatio};
use crate::table::ResultTable;
use log::warn;

/// Covariance of the vertical signal between `IC[i]..IC[i + offset]` and
/// the equally long window after it.
pub(super) fn intra_covariance(ctx: &MetricContext<'_>, offset: usize) -> Vec<f64> {
    let mask = build_offset_mask(ctx.events, Some(offset));
    let ic = ctx.events.ic();
    let mut out = vec![f64::NAN; ctx.events.len()];

    for (bout, rows) in ctx.events.bouts() {
        let Some(signal) = ctx.aux.bout(bout) else {
            warn!("no acceleration for bout {}", bout);
            continue;
        };
        let vertical = signal.vertical();
        for &(i, j) in mask.pairs().iter().filter(|(i, _)| rows.contains(i)) {
            out[i] = regularity::intra_covariance(&vertical, ic[i], ic[j]);
        }
    }
    out
}

/// Harmonic ratio of the vertical signal over each stride.
pub(super) fn harmonic_ratio(ctx: &MetricContext<'_>, table: &ResultTable) -> Result<Vec<f64>> {
    let stride_time = table.column(GaitMetric::StrideTime.name())?;
    let mask = build_offset_mask(ctx.events, Some(2));
    let ic = ctx.events.ic();
    let estimator = HarmonicRatio::new(&ctx.config.harmonic_ratio);
    let mut out = vec![f64::NAN; ctx.events.len()];

    for (bout, rows) in ctx.events.bouts() {
        let Some(signal) = ctx.aux.bout(bout) else {
            warn!("no acceleration for bout {}", bout);
            continue;
        };
        let vertical = signal.vertical();
        for &(i, j) in mask.pairs().iter().filter(|(i, _)| rows.contains(i)) {
            if ic[j] > vertical.len() {
                continue;
            }
            out[i] = estimator.compute(&vertical[ic[i]..ic[j]], stride_time[i], ctx.dt);
        }
    }
    Ok(out)
}
