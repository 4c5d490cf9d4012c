//! End-to-end simulation scenarios
//!
//! Run tests with: cargo test --test `scenarios`

use heat_stencil_core::{
    BackendKind, CountingAllocator, HeatError, ManufacturedSolution, Simulation,
    SimulationConfig, STABILITY_LIMIT,
};

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Reference runs
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_default_configuration_is_stable_and_finite() {
    let simulation =
        Simulation::new(SimulationConfig::default(), BackendKind::Threaded { threads: None })
            .unwrap();
    assert!(simulation.params().is_stable());
    assert!((simulation.params().dx - 1000.0 / 1001.0).abs() < 1e-12);

    let report = simulation.run().unwrap();
    assert!(report.stable);
    assert_eq!(report.updates, 9);
    assert!(report.l2_norm.is_finite());
    assert!(report.l2_norm >= 0.0);
}

#[test]
fn test_unstable_run_still_completes() {
    let config = SimulationConfig {
        n: 32,
        nsteps: 1,
        alpha: 10.0,
        length: 32.0,
        ..SimulationConfig::default()
    };
    let report = Simulation::new(config, BackendKind::Serial)
        .unwrap()
        .run()
        .unwrap();
    assert!(!report.stable);
    assert!(report.diffusion_number > STABILITY_LIMIT);
    assert!(report.l2_norm.is_finite());
}

#[test]
fn test_unstable_run_diverges_without_error() {
    let config = SimulationConfig {
        n: 32,
        nsteps: 40,
        alpha: 1.0,
        length: 32.0,
        dt: Some(1.0),
        ..SimulationConfig::default()
    };
    let report = Simulation::new(config, BackendKind::Serial)
        .unwrap()
        .run()
        .unwrap();
    assert!(!report.stable);
    // r ≈ 1.06: the checkerboard mode grows by |1 − 8r| per step
    assert!(report.l2_norm > 1e6 || !report.l2_norm.is_finite());
}

#[test]
fn test_stable_runs_stay_bounded() {
    for nsteps in [2, 10, 50] {
        let config = SimulationConfig {
            n: 40,
            nsteps,
            ..SimulationConfig::default()
        };
        let (grid, report) = Simulation::new(config, BackendKind::Serial)
            .unwrap()
            .run_to_grid()
            .unwrap();
        assert!(report.stable);
        // Max principle: the scheme never exceeds the initial maximum of 1
        assert!(grid.as_slice().iter().all(|v| v.abs() <= 1.0));
        assert!(report.l2_norm <= 2.0 * 40.0);
    }
}

#[test]
fn test_backends_report_the_same_norm() {
    let config = SimulationConfig {
        n: 50,
        nsteps: 12,
        ..SimulationConfig::default()
    };
    let serial = Simulation::new(config, BackendKind::Serial)
        .unwrap()
        .run()
        .unwrap();
    let threaded = Simulation::new(config, BackendKind::Threaded { threads: Some(4) })
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(serial.l2_norm, threaded.l2_norm);

    let auto = Simulation::new(config, BackendKind::Auto)
        .unwrap()
        .run()
        .unwrap();
    assert!((auto.l2_norm - serial.l2_norm).abs() < 1e-9);
}

#[test]
fn test_phase_allocations_are_reported() {
    let config = SimulationConfig {
        n: 64,
        nsteps: 6,
        ..SimulationConfig::default()
    };
    let report = Simulation::new(config, BackendKind::Threaded { threads: Some(2) })
        .unwrap()
        .run()
        .unwrap();

    assert!(report.validation_allocations.allocations > 0);
    assert!(report.validation_allocations.bytes >= 64 * 64 * 8);
    assert!(report.stepping_allocations.allocations > 0);
    assert!(report.to_string().contains("allocations"));

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["validation_allocations"]["bytes"].as_u64().unwrap() >= 64 * 64 * 8);
    assert!(json["setup"].is_object());
}

// ═══════════════════════════════════════════════════════════════════════════════
// Reference solution
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_reference_grid_is_idempotent() {
    let mms = ManufacturedSolution::new(0.1, 1000.0);
    let a = mms.reference_grid(30, 30, 0.5, 1000.0 / 31.0).unwrap();
    let b = mms.reference_grid(30, 30, 0.5, 1000.0 / 31.0).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.l2_distance(&b).unwrap(), 0.0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rejected configurations
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_invalid_configurations_are_rejected() {
    let cases = [
        SimulationConfig {
            n: 0,
            ..SimulationConfig::default()
        },
        SimulationConfig {
            nsteps: 0,
            ..SimulationConfig::default()
        },
        SimulationConfig {
            alpha: -1.0,
            ..SimulationConfig::default()
        },
        SimulationConfig {
            length: f64::NAN,
            ..SimulationConfig::default()
        },
        SimulationConfig {
            dt: Some(0.0),
            ..SimulationConfig::default()
        },
    ];
    for config in cases {
        let result = Simulation::new(config, BackendKind::Serial);
        assert!(
            matches!(result, Err(HeatError::InvalidParameter { .. })),
            "{config:?} was accepted"
        );
    }
}

#[test]
fn test_config_deserializes_with_defaults() {
    let config: SimulationConfig = serde_json::from_str(r#"{"n": 64, "dt": 0.01}"#).unwrap();
    assert_eq!(config.n, 64);
    assert_eq!(config.nsteps, 10);
    assert_eq!(config.dt, Some(0.01));
    assert!(config.dx.is_none());
}
