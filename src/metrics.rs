//! Gait metric definitions.
//!
//! Built-in metrics form the closed set [`GaitMetric`]. Every metric is
//! registered as a [`MetricDescriptor`] carrying its name, dependency
//! names, level and asymmetry flag; callers may add their own descriptors
//! with a compute closure alongside the built-ins.
//!
//! ```text
//!      IC             FC      IC             FC
//!      i-1            i-1     i+1            i+1
//! L    |--------------|       |--------------|
//! R               |--------------|        |--------------|
//!                 i              i        i+2            i+2
//!                 IC             FC       IC             FC
//! ```
//!
//! Consecutive rows alternate feet: row `i + 1` is the next opposite-foot
//! contact and row `i + 2` the next same-foot contact.

mod bout;
mod stride;
mod temporal;

use crate::config::MetricsConfig;
use crate::error::{EngineError, Result};
use crate::events::{GaitAuxiliary, GaitEventTable};
use crate::table::ResultTable;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Whether a metric yields one value per event or one per bout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricLevel {
    Event,
    Bout,
}

/// Output of one metric computation.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValues {
    /// One value per event row.
    Event(Vec<f64>),
    /// One value per bout, broadcast to the bout's rows when stored.
    Bout(BTreeMap<u32, f64>),
}

/// Read-only inputs shared by every metric of a run.
#[derive(Debug, Clone, Copy)]
pub struct MetricContext<'a> {
    /// Sampling interval (seconds per sample).
    pub dt: f64,
    /// Leg length (m), when known.
    pub leg_length: Option<f64>,
    pub events: &'a GaitEventTable,
    pub aux: &'a GaitAuxiliary,
    pub config: &'a MetricsConfig,
}

/// Compute closure of a caller-defined metric.
///
/// Receives the run inputs and the results written so far; every declared
/// dependency is present in the table.
pub type MetricFn =
    Arc<dyn Fn(&MetricContext<'_>, &ResultTable) -> Result<MetricValues> + Send + Sync>;

/// Built-in gait metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GaitMetric {
    StrideTime,
    StanceTime,
    SwingTime,
    StepTime,
    InitialDoubleSupport,
    TerminalDoubleSupport,
    DoubleSupport,
    SingleSupport,
    StepLength,
    StrideLength,
    GaitSpeed,
    Cadence,
    IntraStepCovarianceV,
    IntraStrideCovarianceV,
    HarmonicRatioV,
    PhaseCoordinationIndex,
    GaitSymmetryIndex,
    StepRegularityV,
    StrideRegularityV,
    AutocorrelationSymmetryV,
}

impl GaitMetric {
    /// Every built-in metric.
    pub const ALL: [GaitMetric; 20] = [
        GaitMetric::StrideTime,
        GaitMetric::StanceTime,
        GaitMetric::SwingTime,
        GaitMetric::StepTime,
        GaitMetric::InitialDoubleSupport,
        GaitMetric::TerminalDoubleSupport,
        GaitMetric::DoubleSupport,
        GaitMetric::SingleSupport,
        GaitMetric::StepLength,
        GaitMetric::StrideLength,
        GaitMetric::GaitSpeed,
        GaitMetric::Cadence,
        GaitMetric::IntraStepCovarianceV,
        GaitMetric::IntraStrideCovarianceV,
        GaitMetric::HarmonicRatioV,
        GaitMetric::PhaseCoordinationIndex,
        GaitMetric::GaitSymmetryIndex,
        GaitMetric::StepRegularityV,
        GaitMetric::StrideRegularityV,
        GaitMetric::AutocorrelationSymmetryV,
    ];

    /// Column name of the metric.
    pub fn name(&self) -> &'static str {
        match self {
            GaitMetric::StrideTime => "stride time",
            GaitMetric::StanceTime => "stance time",
            GaitMetric::SwingTime => "swing time",
            GaitMetric::StepTime => "step time",
            GaitMetric::InitialDoubleSupport => "initial double support",
            GaitMetric::TerminalDoubleSupport => "terminal double support",
            GaitMetric::DoubleSupport => "double support",
            GaitMetric::SingleSupport => "single support",
            GaitMetric::StepLength => "step length",
            GaitMetric::StrideLength => "stride length",
            GaitMetric::GaitSpeed => "gait speed",
            GaitMetric::Cadence => "cadence",
            GaitMetric::IntraStepCovarianceV => "intra-step covariance - V",
            GaitMetric::IntraStrideCovarianceV => "intra-stride covariance - V",
            GaitMetric::HarmonicRatioV => "harmonic ratio - V",
            GaitMetric::PhaseCoordinationIndex => "phase coordination index",
            GaitMetric::GaitSymmetryIndex => "gait symmetry index",
            GaitMetric::StepRegularityV => "step regularity - V",
            GaitMetric::StrideRegularityV => "stride regularity - V",
            GaitMetric::AutocorrelationSymmetryV => "autocorrelation symmetry - V",
        }
    }

    /// Look up a built-in metric by column name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.name() == name)
    }

    /// Metrics whose columns must exist before this one runs.
    pub fn depends(&self) -> &'static [GaitMetric] {
        match self {
            GaitMetric::DoubleSupport => &[
                GaitMetric::InitialDoubleSupport,
                GaitMetric::TerminalDoubleSupport,
            ],
            GaitMetric::StrideLength => &[GaitMetric::StepLength],
            GaitMetric::GaitSpeed => &[GaitMetric::StrideLength, GaitMetric::StrideTime],
            GaitMetric::Cadence => &[GaitMetric::StepTime],
            GaitMetric::HarmonicRatioV => &[GaitMetric::StrideTime],
            GaitMetric::PhaseCoordinationIndex => &[GaitMetric::StepTime, GaitMetric::StrideTime],
            GaitMetric::GaitSymmetryIndex => &[GaitMetric::StrideTime],
            GaitMetric::StepRegularityV => &[GaitMetric::StepTime],
            GaitMetric::StrideRegularityV => &[GaitMetric::StrideTime],
            GaitMetric::AutocorrelationSymmetryV => {
                &[GaitMetric::StepRegularityV, GaitMetric::StrideRegularityV]
            }
            _ => &[],
        }
    }

    pub fn level(&self) -> MetricLevel {
        match self {
            GaitMetric::PhaseCoordinationIndex
            | GaitMetric::GaitSymmetryIndex
            | GaitMetric::StepRegularityV
            | GaitMetric::StrideRegularityV
            | GaitMetric::AutocorrelationSymmetryV => MetricLevel::Bout,
            _ => MetricLevel::Event,
        }
    }

    /// Whether a paired asymmetry column is derived from this metric.
    pub fn has_asymmetry(&self) -> bool {
        matches!(
            self,
            GaitMetric::StrideTime
                | GaitMetric::StanceTime
                | GaitMetric::SwingTime
                | GaitMetric::StepTime
                | GaitMetric::InitialDoubleSupport
                | GaitMetric::TerminalDoubleSupport
                | GaitMetric::DoubleSupport
                | GaitMetric::SingleSupport
                | GaitMetric::StepLength
                | GaitMetric::StrideLength
                | GaitMetric::GaitSpeed
        )
    }

    /// Compute the metric.
    pub fn compute(&self, ctx: &MetricContext<'_>, table: &ResultTable) -> Result<MetricValues> {
        let values = match self {
            GaitMetric::StrideTime => MetricValues::Event(temporal::stride_time(ctx)),
            GaitMetric::StanceTime => MetricValues::Event(temporal::stance_time(ctx)),
            GaitMetric::SwingTime => MetricValues::Event(temporal::swing_time(ctx)),
            GaitMetric::StepTime => MetricValues::Event(temporal::step_time(ctx)),
            GaitMetric::InitialDoubleSupport => {
                MetricValues::Event(temporal::initial_double_support(ctx))
            }
            GaitMetric::TerminalDoubleSupport => {
                MetricValues::Event(temporal::terminal_double_support(ctx))
            }
            GaitMetric::DoubleSupport => MetricValues::Event(temporal::double_support(table)?),
            GaitMetric::SingleSupport => MetricValues::Event(temporal::single_support(ctx)),
            GaitMetric::StepLength => MetricValues::Event(temporal::step_length(ctx)),
            GaitMetric::StrideLength => MetricValues::Event(temporal::stride_length(ctx, table)?),
            GaitMetric::GaitSpeed => MetricValues::Event(temporal::gait_speed(ctx, table)?),
            GaitMetric::Cadence => MetricValues::Event(temporal::cadence(table)?),
            GaitMetric::IntraStepCovarianceV => {
                MetricValues::Event(stride::intra_covariance(ctx, 1))
            }
            GaitMetric::IntraStrideCovarianceV => {
                MetricValues::Event(stride::intra_covariance(ctx, 2))
            }
            GaitMetric::HarmonicRatioV => MetricValues::Event(stride::harmonic_ratio(ctx, table)?),
            GaitMetric::PhaseCoordinationIndex => {
                MetricValues::Bout(bout::phase_coordination_index(ctx, table)?)
            }
            GaitMetric::GaitSymmetryIndex => {
                MetricValues::Bout(bout::gait_symmetry_index(ctx, table)?)
            }
            GaitMetric::StepRegularityV => MetricValues::Bout(bout::bout_regularity(
                ctx,
                table.column(GaitMetric::StepTime.name())?,
            )),
            GaitMetric::StrideRegularityV => MetricValues::Bout(bout::bout_regularity(
                ctx,
                table.column(GaitMetric::StrideTime.name())?,
            )),
            GaitMetric::AutocorrelationSymmetryV => {
                MetricValues::Bout(bout::autocorrelation_symmetry(ctx, table)?)
            }
        };
        Ok(values)
    }
}

impl fmt::Display for GaitMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a descriptor computes its values.
#[derive(Clone)]
pub enum MetricBody {
    Builtin(GaitMetric),
    Custom(MetricFn),
}

impl fmt::Debug for MetricBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricBody::Builtin(m) => f.debug_tuple("Builtin").field(m).finish(),
            MetricBody::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A named metric and the metrics it depends on.
#[derive(Debug, Clone)]
pub struct MetricDescriptor {
    name: String,
    depends: Vec<String>,
    level: MetricLevel,
    asymmetry: bool,
    body: MetricBody,
}

impl MetricDescriptor {
    /// Descriptor of a built-in metric.
    pub fn builtin(metric: GaitMetric) -> Self {
        Self {
            name: metric.name().to_string(),
            depends: metric.depends().iter().map(|d| d.name().to_string()).collect(),
            level: metric.level(),
            asymmetry: metric.has_asymmetry(),
            body: MetricBody::Builtin(metric),
        }
    }

    /// Caller-defined metric without an asymmetry column.
    pub fn custom<F>(name: impl Into<String>, depends: &[&str], level: MetricLevel, compute: F) -> Self
    where
        F: Fn(&MetricContext<'_>, &ResultTable) -> Result<MetricValues> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            depends: depends.iter().map(|d| d.to_string()).collect(),
            level,
            asymmetry: false,
            body: MetricBody::Custom(Arc::new(compute)),
        }
    }

    /// Enable or disable the paired asymmetry column.
    pub fn with_asymmetry(mut self, asymmetry: bool) -> Self {
        self.asymmetry = asymmetry;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn depends(&self) -> &[String] {
        &self.depends
    }

    pub fn level(&self) -> MetricLevel {
        self.level
    }

    /// Whether an asymmetry column is derived. Only event-level metrics
    /// have one.
    pub fn asymmetry(&self) -> bool {
        self.asymmetry && self.level == MetricLevel::Event
    }

    pub fn body(&self) -> &MetricBody {
        &self.body
    }

    /// Run the metric body.
    pub fn compute(&self, ctx: &MetricContext<'_>, table: &ResultTable) -> Result<MetricValues> {
        match &self.body {
            MetricBody::Builtin(metric) => metric.compute(ctx, table),
            MetricBody::Custom(f) => f(ctx, table),
        }
    }
}

/// Name of the asymmetry column paired with `metric`.
pub fn asymmetry_column(metric: &str) -> String {
    format!("{} asymmetry", metric)
}

/// Registry of metric descriptors, unique by name.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    descriptors: Vec<MetricDescriptor>,
    index: HashMap<String, usize>,
}

impl MetricRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in metric.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for metric in GaitMetric::ALL {
            registry.push(MetricDescriptor::builtin(metric));
        }
        registry
    }

    fn push(&mut self, descriptor: MetricDescriptor) {
        self.index
            .insert(descriptor.name.clone(), self.descriptors.len());
        self.descriptors.push(descriptor);
    }

    /// Add a descriptor. Names must be unique.
    pub fn register(&mut self, descriptor: MetricDescriptor) -> std::result::Result<(), EngineError> {
        if self.index.contains_key(&descriptor.name) {
            return Err(EngineError::DuplicateMetric {
                name: descriptor.name,
            });
        }
        self.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&MetricDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for metric in GaitMetric::ALL {
            assert_eq!(GaitMetric::from_name(metric.name()), Some(metric));
        }
        assert_eq!(GaitMetric::from_name("walking speed"), None);
        assert_eq!(GaitMetric::GaitSpeed.to_string(), "gait speed");
    }

    #[test]
    fn test_dependencies_are_builtin() {
        for metric in GaitMetric::ALL {
            for dep in metric.depends() {
                assert_ne!(*dep, metric);
                assert!(GaitMetric::ALL.contains(dep));
            }
        }
    }

    #[test]
    fn test_levels() {
        assert_eq!(GaitMetric::StrideTime.level(), MetricLevel::Event);
        assert_eq!(GaitMetric::StepRegularityV.level(), MetricLevel::Bout);
        assert!(GaitMetric::GaitSpeed.has_asymmetry());
        assert!(!GaitMetric::Cadence.has_asymmetry());
        assert!(!GaitMetric::HarmonicRatioV.has_asymmetry());
    }

    #[test]
    fn test_builtin_descriptor() {
        let d = MetricDescriptor::builtin(GaitMetric::GaitSpeed);
        assert_eq!(d.name(), "gait speed");
        assert_eq!(d.depends(), &["stride length".to_string(), "stride time".to_string()]);
        assert!(d.asymmetry());
        assert!(matches!(d.body(), MetricBody::Builtin(GaitMetric::GaitSpeed)));
    }

    #[test]
    fn test_bout_level_has_no_asymmetry() {
        let d = MetricDescriptor::custom("bout thing", &[], MetricLevel::Bout, |_, _| {
            Ok(MetricValues::Bout(BTreeMap::new()))
        })
        .with_asymmetry(true);
        assert!(!d.asymmetry());
        assert_eq!(format!("{:?}", d.body()), "Custom(..)");
    }

    #[test]
    fn test_registry() {
        let mut registry = MetricRegistry::with_builtins();
        assert_eq!(registry.len(), GaitMetric::ALL.len());
        assert!(registry.contains("stride time"));
        assert_eq!(registry.names().next(), Some("stride time"));

        let custom = MetricDescriptor::custom("stride count", &["stride time"], MetricLevel::Bout, |_, _| {
            Ok(MetricValues::Bout(BTreeMap::new()))
        });
        registry.register(custom).unwrap();
        assert_eq!(registry.get("stride count").unwrap().depends(), &["stride time".to_string()]);

        let duplicate =
            MetricDescriptor::custom("gait speed", &[], MetricLevel::Event, |ctx, _| {
                Ok(MetricValues::Event(vec![0.0; ctx.events.len()]))
            });
        assert!(matches!(
            registry.register(duplicate),
            Err(EngineError::DuplicateMetric { .. })
        ));
    }

    #[test]
    fn test_asymmetry_column() {
        assert_eq!(asymmetry_column("step time"), "step time asymmetry");
    }
}
