//! Metric graph engine.
//!
//! Resolves the dependency closure of the requested metrics into an
//! evaluation order, then evaluates each metric once and stores its
//! column(s) in a fresh [`ResultTable`].
//!
//! # Example
//!
//! ```
//! use gaitkit::{GaitAuxiliary, GaitEvent, GaitEventTable, MetricGraphEngine, MetricsConfig};
//!
//! let events = GaitEventTable::new(&[
//!     GaitEvent::new(0, 60, 10, 0.02, 0),
//!     GaitEvent::new(50, 110, 60, 0.02, 0),
//!     GaitEvent::new(100, 160, 110, 0.02, 0),
//! ])
//! .unwrap();
//! let aux = GaitAuxiliary::new(0.01);
//!
//! let engine = MetricGraphEngine::new(MetricsConfig::default());
//! let results = engine.run(&["cadence"], &events, &aux).unwrap();
//!
//! assert_eq!(results.get("cadence").unwrap()[0], 120.0);
//! assert!(results.contains("step time"));
//! ```

use crate::config::MetricsConfig;
use crate::error::{EngineError, Result};
use crate::events::{GaitAuxiliary, GaitEventTable};
use crate::mask::build_offset_mask;
use crate::metrics::{
    asymmetry_column, MetricContext, MetricDescriptor, MetricRegistry, MetricValues,
};
use crate::table::{broadcast, ResultTable};
use log::debug;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Dependency-aware metric evaluator.
#[derive(Debug, Clone)]
pub struct MetricGraphEngine {
    registry: MetricRegistry,
    config: MetricsConfig,
}

impl Default for MetricGraphEngine {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

impl MetricGraphEngine {
    /// Engine over the built-in metrics.
    pub fn new(config: MetricsConfig) -> Self {
        Self::with_registry(MetricRegistry::with_builtins(), config)
    }

    /// Engine over a caller-supplied registry.
    pub fn with_registry(registry: MetricRegistry, config: MetricsConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Register an additional metric.
    pub fn register(&mut self, descriptor: MetricDescriptor) -> Result<()> {
        self.registry.register(descriptor)?;
        Ok(())
    }

    /// Evaluation order covering `requested` and everything it depends on.
    ///
    /// Dependencies always precede their dependents; otherwise metrics
    /// appear in the order they were requested. Nothing is computed.
    pub fn plan<S: AsRef<str>>(&self, requested: &[S]) -> std::result::Result<Vec<String>, EngineError> {
        let mut state: HashMap<String, Visit> = HashMap::new();
        let mut path: Vec<String> = Vec::new();
        let mut order = Vec::new();

        for name in requested {
            self.visit(name.as_ref(), None, &mut state, &mut path, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        name: &str,
        required_by: Option<&str>,
        state: &mut HashMap<String, Visit>,
        path: &mut Vec<String>,
        order: &mut Vec<String>,
    ) -> std::result::Result<(), EngineError> {
        match state.get(name) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = path.iter().position(|p| p == name).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(name.to_string());
                return Err(EngineError::DependencyCycle { cycle });
            }
            None => {}
        }

        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| EngineError::UnknownMetric {
                name: name.to_string(),
                required_by: required_by.map(str::to_string),
            })?;

        state.insert(name.to_string(), Visit::InProgress);
        path.push(name.to_string());
        for dep in descriptor.depends() {
            self.visit(dep, Some(name), state, path, order)?;
        }
        path.pop();
        state.insert(name.to_string(), Visit::Done);
        order.push(name.to_string());
        Ok(())
    }

    /// Compute `requested` metrics and their dependencies.
    ///
    /// Graph and configuration errors are raised before any metric runs.
    pub fn run<S: AsRef<str>>(
        &self,
        requested: &[S],
        events: &GaitEventTable,
        aux: &GaitAuxiliary,
    ) -> Result<ResultTable> {
        let order = self.plan(requested)?;
        self.config.validate(aux.dt)?;
        debug!("evaluation order: {:?}", order);

        let ctx = MetricContext {
            dt: aux.dt,
            leg_length: aux.leg_length,
            events,
            aux,
            config: &self.config,
        };
        let mut run = EvaluationRun::new(ctx);
        for name in &order {
            if let Some(descriptor) = self.registry.get(name) {
                run.evaluate(descriptor)?;
            }
        }
        Ok(run.finish())
    }
}

/// State of one engine run. Discarded when the run ends.
struct EvaluationRun<'a> {
    ctx: MetricContext<'a>,
    table: ResultTable,
    evaluated: HashSet<String>,
}

impl<'a> EvaluationRun<'a> {
    fn new(ctx: MetricContext<'a>) -> Self {
        Self {
            ctx,
            table: ResultTable::for_events(ctx.events),
            evaluated: HashSet::new(),
        }
    }

    fn evaluate(&mut self, descriptor: &MetricDescriptor) -> Result<()> {
        let name = descriptor.name();
        if !self.evaluated.insert(name.to_string()) {
            return Ok(());
        }
        debug!("evaluating '{}'", name);

        let values = match descriptor.compute(&self.ctx, &self.table)? {
            MetricValues::Event(values) => values,
            MetricValues::Bout(per_bout) => broadcast(self.ctx.events, &per_bout),
        };

        let asymmetry = if descriptor.asymmetry() && self.ctx.config.asymmetry {
            Some(asymmetry(self.ctx.events, &values))
        } else {
            None
        };

        self.table.insert(name, values)?;
        if let Some(asym) = asymmetry {
            self.table.insert(asymmetry_column(name), asym)?;
        }
        Ok(())
    }

    fn finish(self) -> ResultTable {
        self.table
    }
}

/// `|v[i] - v[i - 1]|` where row `i - 1` is the preceding event of the
/// same bout. The first row of every bout is `NaN`.
pub fn asymmetry(events: &GaitEventTable, values: &[f64]) -> Vec<f64> {
    let mask = build_offset_mask(events, Some(1));
    let mut out = vec![f64::NAN; values.len()];
    for &(prev, row) in mask.pairs() {
        if row < values.len() {
            out[row] = (values[row] - values[prev]).abs();
        }
    }
    out
}
