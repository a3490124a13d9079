//! Bout-level metrics, one value per bout.

use super::{GaitMetric, MetricContext};
use crate::error::Result;
use crate::regularity::{self, mean_lag};
use crate::table::ResultTable;
use log::{debug, warn};
use std::collections::BTreeMap;

pub(super) fn phase_coordination_index(
    ctx: &MetricContext<'_>,
    table: &ResultTable,
) -> Result<BTreeMap<u32, f64>> {
    let step = table.column(GaitMetric::StepTime.name())?;
    let stride = table.column(GaitMetric::StrideTime.name())?;
    Ok(ctx
        .events
        .bouts()
        .into_iter()
        .map(|(bout, rows)| {
            let pci =
                regularity::phase_coordination_index(&step[rows.clone()], &stride[rows]);
            (bout, pci)
        })
        .collect())
}

pub(super) fn gait_symmetry_index(
    ctx: &MetricContext<'_>,
    table: &ResultTable,
) -> Result<BTreeMap<u32, f64>> {
    let stride = table.column(GaitMetric::StrideTime.name())?;
    let mut out = BTreeMap::new();
    for (bout, rows) in ctx.events.bouts() {
        let Some(signal) = ctx.aux.bout(bout) else {
            warn!("no acceleration for bout {}", bout);
            continue;
        };
        let Some(lag) = mean_lag(&stride[rows], ctx.dt) else {
            debug!("bout {} has no complete stride", bout);
            out.insert(bout, f64::NAN);
            continue;
        };
        let gsi = regularity::gait_symmetry_index(
            &signal.accel,
            lag,
            ctx.dt,
            &ctx.config.symmetry_index,
        );
        out.insert(bout, gsi);
    }
    Ok(out)
}

/// Step or stride regularity, depending on which duration column is given.
pub(super) fn bout_regularity(ctx: &MetricContext<'_>, durations: &[f64]) -> BTreeMap<u32, f64> {
    let config = &ctx.config.regularity;
    let max_lag = config.lag_window.samples(ctx.dt);
    let mut out = BTreeMap::new();
    for (bout, rows) in ctx.events.bouts() {
        let Some(signal) = ctx.aux.bout(bout) else {
            warn!("no acceleration for bout {}", bout);
            continue;
        };
        let value = match mean_lag(&durations[rows], ctx.dt) {
            Some(lag) => {
                regularity::regularity(&signal.vertical(), lag, max_lag, config.peak_fallback)
            }
            None => f64::NAN,
        };
        out.insert(bout, value);
    }
    out
}

/// Absolute difference of step and stride regularity.
pub(super) fn autocorrelation_symmetry(
    ctx: &MetricContext<'_>,
    table: &ResultTable,
) -> Result<BTreeMap<u32, f64>> {
    let step = table.column(GaitMetric::StepRegularityV.name())?;
    let stride = table.column(GaitMetric::StrideRegularityV.name())?;
    Ok(ctx
        .events
        .bouts()
        .into_iter()
        .map(|(bout, rows)| (bout, (step[rows.start] - stride[rows.start]).abs()))
        .collect())
}
