//! Temporal and spatial event metrics.

use super::{GaitMetric, MetricContext};
use crate::error::Result;
use crate::mask::build_offset_mask;
use crate::table::ResultTable;
use log::warn;

/// `(IC[i + 2] - IC[i]) · dt`
pub(super) fn stride_time(ctx: &MetricContext<'_>) -> Vec<f64> {
    let ic = ctx.events.ic();
    build_offset_mask(ctx.events, Some(2))
        .fill(|i, j| (ic[j] as f64 - ic[i] as f64) * ctx.dt)
}

/// `(FC[i] - IC[i]) · dt`
pub(super) fn stance_time(ctx: &MetricContext<'_>) -> Vec<f64> {
    ctx.events
        .fc()
        .iter()
        .zip(ctx.events.ic())
        .map(|(&fc, &ic)| (fc as f64 - ic as f64) * ctx.dt)
        .collect()
}

/// `(IC[i + 2] - FC[i]) · dt`
pub(super) fn swing_time(ctx: &MetricContext<'_>) -> Vec<f64> {
    let ic = ctx.events.ic();
    let fc = ctx.events.fc();
    build_offset_mask(ctx.events, Some(2))
        .fill(|i, j| (ic[j] as f64 - fc[i] as f64) * ctx.dt)
}

/// `(IC[i + 1] - IC[i]) · dt`
pub(super) fn step_time(ctx: &MetricContext<'_>) -> Vec<f64> {
    let ic = ctx.events.ic();
    build_offset_mask(ctx.events, Some(1))
        .fill(|i, j| (ic[j] as f64 - ic[i] as f64) * ctx.dt)
}

/// `(FC_opposite[i] - IC[i]) · dt`
pub(super) fn initial_double_support(ctx: &MetricContext<'_>) -> Vec<f64> {
    ctx.events
        .fc_opposite()
        .iter()
        .zip(ctx.events.ic())
        .map(|(&fco, &ic)| (fco as f64 - ic as f64) * ctx.dt)
        .collect()
}

/// `(FC_opposite[i + 1] - IC[i + 1]) · dt`
pub(super) fn terminal_double_support(ctx: &MetricContext<'_>) -> Vec<f64> {
    let ic = ctx.events.ic();
    let fco = ctx.events.fc_opposite();
    build_offset_mask(ctx.events, Some(1))
        .fill(|_, j| (fco[j] as f64 - ic[j] as f64) * ctx.dt)
}

pub(super) fn double_support(table: &ResultTable) -> Result<Vec<f64>> {
    let initial = table.column(GaitMetric::InitialDoubleSupport.name())?;
    let terminal = table.column(GaitMetric::TerminalDoubleSupport.name())?;
    Ok(initial.iter().zip(terminal).map(|(a, b)| a + b).collect())
}

/// `(IC[i + 1] - FC_opposite[i]) · dt`
pub(super) fn single_support(ctx: &MetricContext<'_>) -> Vec<f64> {
    let ic = ctx.events.ic();
    let fco = ctx.events.fc_opposite();
    build_offset_mask(ctx.events, Some(1))
        .fill(|i, j| (ic[j] as f64 - fco[i] as f64) * ctx.dt)
}

/// Inverted pendulum step length, `2 · sqrt(2lh - h²)`.
pub(super) fn step_length(ctx: &MetricContext<'_>) -> Vec<f64> {
    match ctx.leg_length {
        Some(l) => ctx
            .events
            .delta_h()
            .iter()
            .map(|&h| 2.0 * (2.0 * l * h - h * h).sqrt())
            .collect(),
        None => {
            warn!("leg length unavailable, skipping '{}'", GaitMetric::StepLength);
            build_offset_mask(ctx.events, None).fill(|_, _| f64::NAN)
        }
    }
}

/// Sum of two consecutive step lengths.
pub(super) fn stride_length(ctx: &MetricContext<'_>, table: &ResultTable) -> Result<Vec<f64>> {
    let step = table.column(GaitMetric::StepLength.name())?;
    if ctx.leg_length.is_none() {
        warn!("leg length unavailable, skipping '{}'", GaitMetric::StrideLength);
        return Ok(vec![f64::NAN; ctx.events.len()]);
    }
    Ok(build_offset_mask(ctx.events, Some(1)).fill(|i, j| step[j] + step[i]))
}

/// Stride length over stride time.
pub(super) fn gait_speed(ctx: &MetricContext<'_>, table: &ResultTable) -> Result<Vec<f64>> {
    let length = table.column(GaitMetric::StrideLength.name())?;
    let time = table.column(GaitMetric::StrideTime.name())?;
    if ctx.leg_length.is_none() {
        warn!("leg length unavailable, skipping '{}'", GaitMetric::GaitSpeed);
        return Ok(vec![f64::NAN; ctx.events.len()]);
    }
    Ok(length.iter().zip(time).map(|(l, t)| l / t).collect())
}

/// Steps per minute.
pub(super) fn cadence(table: &ResultTable) -> Result<Vec<f64>> {
    let step = table.column(GaitMetric::StepTime.name())?;
    Ok(step.iter().map(|t| 60.0 / t).collect())
}
