//! # gaitkit - Gait metrics from lumbar accelerometry
//!
//! Computes spatio-temporal and signal-regularity gait metrics from
//! acceleration recordings that have already been segmented into bouts and
//! gait events (initial and final contacts).
//!
//! ## Key Features
//!
//! - **Metric graph**: metrics declare dependencies and are evaluated once per run
//! - **Bout-aware masking**: rows without a later event in the same bout get `NaN`
//! - **Asymmetry columns**: left/right imbalance for every basic temporal and spatial metric
//! - **Regularity algorithms**: autocovariance, gait symmetry index, harmonic ratio, PCI
//!
//! ## Quick Start
//!
//! ```rust
//! use gaitkit::{BoutSignal, GaitAuxiliary, GaitEvent, GaitEventTable, MetricGraphEngine};
//!
//! // Six alternating-foot contacts 0.5 s apart, sampled at 100 Hz
//! let events: Vec<GaitEvent> = (0..6)
//!     .map(|i| GaitEvent::new(i * 50, i * 50 + 60, i * 50 + 10, 0.045, 0))
//!     .collect();
//! let events = GaitEventTable::new(&events).unwrap();
//!
//! let accel: Vec<[f64; 3]> = (0..400)
//!     .map(|i| [0.0, (i as f64 * std::f64::consts::PI / 25.0).sin(), 0.0])
//!     .collect();
//! let aux = GaitAuxiliary::new(0.01)
//!     .with_leg_length(0.9)
//!     .with_bout(0, BoutSignal::new(accel, 1));
//!
//! let engine = MetricGraphEngine::default();
//! let results = engine
//!     .run(&["gait speed", "step regularity - V"], &events, &aux)
//!     .unwrap();
//!
//! assert!(results.get("gait speed").unwrap()[0] > 0.0);
//! assert!(results.get("gait speed").unwrap()[5].is_nan());
//! assert!(results.contains("stride time asymmetry"));
//! ```
//!
//! ## Modules
//!
//! - [`engine`]: Dependency resolution and evaluation
//! - [`metrics`]: Built-in metrics, descriptors and the registry
//! - [`mask`]: Offset eligibility masks over the event table
//! - [`autocov`]: Autocovariance routines
//! - [`regularity`]: Regularity and symmetry estimators
//! - [`table`]: Result storage and export
//! - [`activity`]: Acceleration activity metrics

// Modules
pub mod activity;
pub mod autocov;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod filter;
pub mod mask;
pub mod metrics;
pub mod peaks;
pub mod regularity;
pub mod table;

// Re-exports for convenient access
pub use activity::ActivityMetric;
pub use autocov::{
    autocovariance_at_lag, autocovariance_function, autocovariance_function_axes,
    autocovariance_window,
};
pub use config::{
    ActivityConfig, HarmonicRatioConfig, LagWindow, MetricsConfig, PeakFallback,
    RegularityConfig, SymmetryIndexConfig,
};
pub use engine::MetricGraphEngine;
pub use error::{ConfigError, EngineError, GaitError, Result, TableError};
pub use events::{BoutSignal, GaitAuxiliary, GaitEvent, GaitEventTable};
pub use filter::{FilterBand, SosFilter};
pub use mask::{build_offset_mask, OffsetMask};
pub use metrics::{
    GaitMetric, MetricContext, MetricDescriptor, MetricLevel, MetricRegistry, MetricValues,
};
pub use regularity::HarmonicRatio;
pub use table::{BoutMeans, ResultTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
