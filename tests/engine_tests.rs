//! End-to-end tests of the metric engine on synthetic walking bouts

use approx::assert_relative_eq;
use gaitkit::*;
use gaitkit_testdata::{generate_bout, generate_session, SyntheticBout, WalkerConfig};
use std::collections::BTreeMap;
use tempfile::NamedTempFile;

// ============================================================================
// Helpers
// ============================================================================

/// Stack generated bouts into one event table, bout ids 0, 1, ...
fn inputs(bouts: &[SyntheticBout], leg_length: Option<f64>) -> (GaitEventTable, GaitAuxiliary) {
    let mut ic = Vec::new();
    let mut fc = Vec::new();
    let mut fc_opposite = Vec::new();
    let mut delta_h = Vec::new();
    let mut bout_id = Vec::new();
    let mut aux = GaitAuxiliary::new(bouts[0].dt);
    aux.leg_length = leg_length;

    for (id, bout) in bouts.iter().enumerate() {
        ic.extend_from_slice(&bout.ic);
        fc.extend_from_slice(&bout.fc);
        fc_opposite.extend_from_slice(&bout.fc_opposite);
        delta_h.extend_from_slice(&bout.delta_h);
        bout_id.extend(std::iter::repeat(id as u32).take(bout.len()));
        aux.insert_bout(
            id as u32,
            BoutSignal::new(bout.accel.clone(), bout.vertical_axis),
        );
    }

    let events = GaitEventTable::from_columns(ic, fc, fc_opposite, delta_h, bout_id).unwrap();
    (events, aux)
}

/// Height change giving a 0.6 m step for a 1 m leg.
fn delta_h_for_step(step: f64, leg: f64) -> f64 {
    let half = step / 2.0;
    leg - (leg * leg - half * half).sqrt()
}

fn walker() -> WalkerConfig {
    WalkerConfig::new().with_stride_time(1.0).with_seed(11)
}

// ============================================================================
// Spatio-temporal metrics
// ============================================================================

#[test]
fn test_gait_speed_end_to_end() {
    let config = walker()
        .with_strides(5)
        .with_delta_h(delta_h_for_step(0.6, 1.0), 0.0);
    let bout = generate_bout(&config);
    assert_eq!(bout.len(), 10);
    let (events, aux) = inputs(&[bout], Some(1.0));

    let engine = MetricGraphEngine::default();
    let table = engine.run(&["gait speed"], &events, &aux).unwrap();

    let speed = table.get("gait speed").unwrap();
    for (row, v) in speed.iter().enumerate() {
        if row < 8 {
            assert_relative_eq!(*v, 1.2, epsilon = 1e-9);
        } else {
            assert!(v.is_nan(), "row {} should be missing", row);
        }
    }

    // dependencies are stored even though only gait speed was requested
    for name in ["stride time", "step length", "stride length"] {
        assert!(table.contains(name), "missing {}", name);
    }
    assert_relative_eq!(table.get("stride length").unwrap()[0], 1.2, epsilon = 1e-9);
    assert_relative_eq!(table.get("stride time").unwrap()[0], 1.0, epsilon = 1e-12);
}

#[test]
fn test_offset_masking_per_bout() {
    let sizes = [3usize, 5, 50];
    let bouts: Vec<SyntheticBout> = sizes
        .iter()
        .map(|&n| {
            let mut b = generate_bout(&walker().with_strides(25));
            b.ic.truncate(n);
            b.fc.truncate(n);
            b.fc_opposite.truncate(n);
            b.delta_h.truncate(n);
            b
        })
        .collect();
    let (events, aux) = inputs(&bouts, None);

    let engine = MetricGraphEngine::default();
    let table = engine
        .run(&["step time", "stride time"], &events, &aux)
        .unwrap();

    for (name, k) in [("step time", 1usize), ("stride time", 2)] {
        let column = table.get(name).unwrap();
        let mut start = 0;
        for &n in &sizes {
            for i in 0..n {
                let v = column[start + i];
                if i + k < n {
                    assert!(v.is_finite(), "{} row {} of bout size {}", name, i, n);
                } else {
                    assert!(v.is_nan(), "{} row {} of bout size {}", name, i, n);
                }
            }
            start += n;
        }
    }
}

#[test]
fn test_missing_leg_length_skips_spatial_metrics() {
    let (events, aux) = inputs(&[generate_bout(&walker())], None);
    let table = MetricGraphEngine::default()
        .run(&["gait speed", "cadence"], &events, &aux)
        .unwrap();

    for name in ["step length", "stride length", "gait speed"] {
        assert!(table.get(name).unwrap().iter().all(|v| v.is_nan()), "{}", name);
    }
    assert_relative_eq!(table.get("cadence").unwrap()[0], 120.0, epsilon = 1e-9);
}

// ============================================================================
// Asymmetry
// ============================================================================

#[test]
fn test_asymmetry_of_two_event_bout() {
    let rows = vec![
        GaitEvent::new(0, 60, 10, 0.02, 0),
        GaitEvent::new(50, 110, 60, 0.02, 0),
    ];
    let events = GaitEventTable::new(&rows).unwrap();

    let mut engine = MetricGraphEngine::default();
    engine
        .register(
            MetricDescriptor::custom("foot value", &[], MetricLevel::Event, |_, _| {
                Ok(MetricValues::Event(vec![10.0, 12.0]))
            })
            .with_asymmetry(true),
        )
        .unwrap();

    let table = engine
        .run(&["foot value"], &events, &GaitAuxiliary::new(0.01))
        .unwrap();
    let asym = table.get("foot value asymmetry").unwrap();
    assert!(asym[0].is_nan());
    assert_eq!(asym[1], 2.0);
}

#[test]
fn test_step_time_asymmetry_detects_limping() {
    let bout = generate_bout(&walker().with_step_asymmetry(0.2));
    let (events, aux) = inputs(&[bout], None);
    let table = MetricGraphEngine::default()
        .run(&["step time"], &events, &aux)
        .unwrap();

    let asym = table.get("step time asymmetry").unwrap();
    assert!(asym[0].is_nan());
    // steps alternate 0.6 s and 0.4 s
    assert_relative_eq!(asym[1], 0.2, epsilon = 1e-9);
    assert_relative_eq!(asym[2], 0.2, epsilon = 1e-9);
}

// ============================================================================
// Signal metrics
// ============================================================================

#[test]
fn test_regularity_of_symmetric_walker() {
    let (events, aux) = inputs(&generate_session(&walker(), 2), None);
    let table = MetricGraphEngine::default()
        .run(&["autocorrelation symmetry - V"], &events, &aux)
        .unwrap();

    let step = table.get("step regularity - V").unwrap();
    let stride = table.get("stride regularity - V").unwrap();
    let symmetry = table.get("autocorrelation symmetry - V").unwrap();

    // bout-level values repeat on every row of the bout
    assert!(step.iter().all(|v| *v == step[0]));
    assert!(step[0] > 0.9, "step regularity {}", step[0]);
    assert!(stride[0] > 0.9, "stride regularity {}", stride[0]);
    assert!(symmetry[0] < 0.1);
}

#[test]
fn test_step_regularity_drops_with_asymmetry() {
    let (events, aux) = inputs(&[generate_bout(&walker().with_step_asymmetry(0.2))], None);
    let table = MetricGraphEngine::default()
        .run(&["step regularity - V", "stride regularity - V"], &events, &aux)
        .unwrap();

    let step = table.get("step regularity - V").unwrap()[0];
    let stride = table.get("stride regularity - V").unwrap()[0];
    assert!(stride > 0.9);
    assert!(!(step > stride - 0.05), "step {} stride {}", step, stride);
}

#[test]
fn test_bout_level_metrics_cover_all_rows() {
    let (events, aux) = inputs(&generate_session(&walker().with_noise(0.01), 3), Some(0.9));
    let table = MetricGraphEngine::default()
        .run(
            &["gait symmetry index", "phase coordination index"],
            &events,
            &aux,
        )
        .unwrap();

    let gsi = table.get("gait symmetry index").unwrap();
    let pci = table.get("phase coordination index").unwrap();
    assert_eq!(gsi.len(), events.len());
    for (bout, rows) in events.bouts() {
        let g = gsi[rows.start];
        assert!(g > 0.0 && g <= 1.0, "bout {} gsi {}", bout, g);
        assert!(rows.clone().all(|r| gsi[r] == g));
        // regular contacts: phase is always one half
        assert!(pci[rows.start].abs() < 1e-6);
    }
}

#[test]
fn test_missing_bout_signal_leaves_sentinel() {
    let bouts = generate_session(&walker(), 2);
    let (events, full) = inputs(&bouts, None);
    let aux = GaitAuxiliary::new(full.dt).with_bout(1, full.bout(1).unwrap().clone());

    let table = MetricGraphEngine::default()
        .run(&["stride regularity - V", "intra-step covariance - V"], &events, &aux)
        .unwrap();

    let bouts = events.bouts();
    let (_, first) = &bouts[0];
    let (_, second) = &bouts[1];
    let reg = table.get("stride regularity - V").unwrap();
    assert!(first.clone().all(|r| reg[r].is_nan()));
    assert!(second.clone().all(|r| reg[r].is_finite()));

    let cov = table.get("intra-step covariance - V").unwrap();
    assert!(first.clone().all(|r| cov[r].is_nan()));
    assert!(cov[second.start].is_finite());
}

#[test]
fn test_intra_stride_covariance_and_harmonic_ratio() {
    let (events, aux) = inputs(&[generate_bout(&walker())], None);
    let table = MetricGraphEngine::default()
        .run(&["intra-stride covariance - V", "harmonic ratio - V"], &events, &aux)
        .unwrap();

    let n = events.len();
    let cov = table.get("intra-stride covariance - V").unwrap();
    assert!(cov[0] > 0.95);
    assert!(cov[n - 1].is_nan());
    assert!(cov[n - 2].is_nan());

    let hr = table.get("harmonic ratio - V").unwrap();
    assert!(hr[..n - 2].iter().all(|v| v.is_finite()));
    assert!(hr[n - 2..].iter().all(|v| v.is_nan()));
}

// ============================================================================
// Configuration and export
// ============================================================================

#[test]
fn test_configured_peak_fallback() {
    // ramp: the autocovariance only decays, so it has no peak
    let rows: Vec<GaitEvent> = (0..6)
        .map(|i| GaitEvent::new(10 + 50 * i, 70 + 50 * i, 20 + 50 * i, 0.03, 0))
        .collect();
    let events = GaitEventTable::new(&rows).unwrap();
    let ramp: Vec<[f64; 3]> = (0..500).map(|i| [0.0, i as f64, 0.0]).collect();
    let aux = GaitAuxiliary::new(0.01).with_bout(0, BoutSignal::new(ramp, 1));

    let sentinel = MetricGraphEngine::default()
        .run(&["step regularity - V"], &events, &aux)
        .unwrap();
    assert!(sentinel.get("step regularity - V").unwrap()[0].is_nan());

    let mut config = MetricsConfig::default();
    config.regularity.peak_fallback = PeakFallback::NearestSample;
    let nearest = MetricGraphEngine::new(config)
        .run(&["step regularity - V"], &events, &aux)
        .unwrap();
    assert_relative_eq!(
        nearest.get("step regularity - V").unwrap()[0],
        449.0 / 450.0,
        epsilon = 1e-9
    );
}

#[test]
fn test_export() {
    let (events, aux) = inputs(&[generate_bout(&walker().with_strides(3))], Some(1.0));
    let table = MetricGraphEngine::default()
        .run(&["cadence", "stride time"], &events, &aux)
        .unwrap();

    let temp_file = NamedTempFile::new().unwrap();
    table.to_csv(temp_file.path()).unwrap();
    let csv = std::fs::read_to_string(temp_file.path()).unwrap();
    let header = csv.lines().next().unwrap();
    assert_eq!(
        header,
        "bout_id,step time,step time asymmetry,cadence,stride time,stride time asymmetry"
    );
    assert_eq!(csv.lines().count(), events.len() + 1);

    let json: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();
    assert_eq!(json["rows"], events.len());
    assert!(json["columns"][0]["values"][5].is_null());

    let means = table.bout_means();
    assert_eq!(means.len(), 1);
    assert_relative_eq!(means[0].means["stride time"], 1.0, epsilon = 1e-9);
}

#[test]
fn test_config_from_json_drives_engine() {
    let json = r#"{
        "regularity": { "lag_window": { "Samples": 300 }, "peak_fallback": "Sentinel" },
        "symmetry_index": {
            "lag_window": { "Seconds": 3.0 },
            "cutoff_hz": 8.0,
            "order": 4,
            "peak_fallback": "NearestSample"
        },
        "harmonic_ratio": { "fft_length": 512, "harmonics": 10 },
        "asymmetry": false
    }"#;
    let config = MetricsConfig::from_json(json).unwrap();
    assert_eq!(config.regularity.lag_window, LagWindow::Samples(300));

    let (events, aux) = inputs(&[generate_bout(&walker())], None);
    let table = MetricGraphEngine::new(config)
        .run(&["stride regularity - V", "step time"], &events, &aux)
        .unwrap();
    assert!(!table.contains("step time asymmetry"));
    assert!(table.get("stride regularity - V").unwrap()[0] > 0.9);
}

#[test]
fn test_plan_matches_run_order() {
    let (events, aux) = inputs(&[generate_bout(&walker())], Some(1.0));
    let config = MetricsConfig {
        asymmetry: false,
        ..MetricsConfig::default()
    };
    let engine = MetricGraphEngine::new(config);
    let requested = ["gait speed", "phase coordination index", "double support"];

    let plan = engine.plan(&requested).unwrap();
    let table = engine.run(&requested, &events, &aux).unwrap();
    assert_eq!(table.column_names(), plan.as_slice());

    let unique: BTreeMap<&str, ()> = plan.iter().map(|p| (p.as_str(), ())).collect();
    assert_eq!(unique.len(), plan.len());
}
