//! Backend equivalence suite
//!
//! Serial, threaded and GPU backends must produce the same grid for the same
//! input. CPU backends evaluate the identical expression per cell, so they
//! agree bit for bit; the GPU is held to `1e-12`.
//!
//! GPU comparisons pass trivially when no `SHADER_F64` adapter is available.
//!
//! Run tests with: cargo test --test `backend_equivalence`

use heat_stencil_core::{
    Backend, CpuBackend, FivePointStencil, Grid, ManufacturedSolution, SerialMap,
    SimulationConfig, ThreadedMap,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn random_grid(rng: &mut StdRng, rows: usize, cols: usize) -> Grid {
    let mut grid = Grid::zeros(rows, cols).unwrap();
    for i in 1..rows.saturating_sub(1) {
        for j in 1..cols.saturating_sub(1) {
            grid.set(i, j, rng.random_range(-1.0..1.0));
        }
    }
    grid
}

fn advance(
    backend: &mut dyn Backend,
    initial: &Grid,
    stencil: &FivePointStencil,
    steps: usize,
) -> Grid {
    backend.upload(initial).unwrap();
    for _ in 0..steps {
        backend.step(stencil).unwrap();
    }
    backend.download().unwrap().into_owned()
}

#[test]
fn test_threaded_matches_serial_on_random_grids() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let stencil = FivePointStencil::heat(0.2);

    for &(rows, cols) in &[(3, 3), (17, 29), (64, 64), (101, 7)] {
        let initial = random_grid(&mut rng, rows, cols);
        let serial = advance(&mut CpuBackend::new(SerialMap), &initial, &stencil, 5);
        for threads in [1, 2, 7] {
            let threaded = advance(
                &mut CpuBackend::new(ThreadedMap::new(Some(threads)).unwrap()),
                &initial,
                &stencil,
                5,
            );
            assert_eq!(serial, threaded, "{rows}x{cols} with {threads} threads");
        }
    }
}

#[test]
fn test_boundary_stays_zero_every_step() {
    let config = SimulationConfig {
        n: 24,
        nsteps: 20,
        ..SimulationConfig::default()
    };
    let params = config.resolve().unwrap();
    let mut initial = Grid::zeros(24, 24).unwrap();
    ManufacturedSolution::new(params.alpha, params.length).initial_value(&mut initial, params.dx);

    let mut backend = CpuBackend::new(ThreadedMap::new(Some(3)).unwrap());
    backend.upload(&initial).unwrap();
    for _ in 0..params.updates() {
        backend.step(&params.stencil()).unwrap();
        let grid = backend.download().unwrap();
        for i in 0..24 {
            for j in 0..24 {
                if grid.is_boundary(i, j) {
                    assert_eq!(grid.get(i, j), 0.0);
                }
            }
        }
    }
}

#[test]
fn test_reupload_resets_state() {
    let mut rng = StdRng::seed_from_u64(7);
    let stencil = FivePointStencil::heat(0.1);
    let first = random_grid(&mut rng, 12, 12);
    let second = random_grid(&mut rng, 12, 12);

    let mut backend = CpuBackend::new(SerialMap);
    advance(&mut backend, &first, &stencil, 3);
    let rerun = advance(&mut backend, &second, &stencil, 3);
    let fresh = advance(&mut CpuBackend::new(SerialMap), &second, &stencil, 3);
    assert_eq!(rerun, fresh);
}

#[cfg(feature = "gpu")]
mod gpu {
    use super::*;
    use heat_stencil_core::{GpuBackend, GpuContext, GpuInitResult};

    /// GPU vs CPU tolerance per cell
    const GPU_TOLERANCE: f64 = 1e-12;

    fn gpu_backend() -> Option<GpuBackend> {
        match GpuContext::new() {
            GpuInitResult::Success(context) => Some(GpuBackend::new(context)),
            other => {
                eprintln!("Skipping GPU comparison: {other:?}");
                None
            }
        }
    }

    #[test]
    fn test_gpu_matches_serial_on_random_grids() {
        let Some(mut gpu) = gpu_backend() else {
            return;
        };
        assert!(gpu.is_gpu_accelerated());

        let mut rng = StdRng::seed_from_u64(42);
        let stencil = FivePointStencil::heat(0.24);
        // Shapes straddle the 16×16 workgroup edge
        for &(rows, cols) in &[(5, 5), (16, 16), (17, 33), (70, 45)] {
            let initial = random_grid(&mut rng, rows, cols);
            let expected = advance(&mut CpuBackend::new(SerialMap), &initial, &stencil, 9);
            let actual = advance(&mut gpu, &initial, &stencil, 9);
            let diff = actual.max_abs_difference(&expected).unwrap();
            assert!(diff <= GPU_TOLERANCE, "{rows}x{cols}: max difference {diff:e}");
        }
    }

    #[test]
    fn test_gpu_without_interior_is_noop() {
        let Some(mut gpu) = gpu_backend() else {
            return;
        };
        let mut initial = Grid::zeros(2, 2).unwrap();
        initial.set(0, 1, 3.0);
        let result = advance(&mut gpu, &initial, &FivePointStencil::heat(0.1), 4);
        assert_eq!(result, initial);
    }
}
