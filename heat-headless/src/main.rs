use clap::{Parser, ValueEnum};
use heat_stencil_core::report::{log_configuration, log_report};
use heat_stencil_core::{
    refinement_study, BackendKind, CountingAllocator, RefinementPoint, Simulation,
    SimulationConfig,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

/// Explicit 2-D heat equation solver validated against a manufactured solution
#[derive(Parser, Debug)]
#[command(name = "heat-headless")]
#[command(about = "Explicit 5-point heat equation stencil benchmark", long_about = None)]
struct Args {
    /// Grid dimension (n × n cells, boundary included)
    #[arg(long, default_value_t = 1000)]
    n: usize,

    /// Step count; nsteps − 1 updates are executed
    #[arg(long, default_value_t = 10)]
    nsteps: usize,

    /// Diffusion coefficient
    #[arg(long, default_value_t = 0.1)]
    alpha: f64,

    /// Physical length of the square domain
    #[arg(long, default_value_t = 1000.0)]
    length: f64,

    /// Cell spacing override (default length / (n + 1))
    #[arg(long)]
    dx: Option<f64>,

    /// Timestep override (default 0.5 / nsteps)
    #[arg(long)]
    dt: Option<f64>,

    /// Execution backend
    #[arg(short, long, value_enum, default_value_t = BackendArg::Threaded)]
    backend: BackendArg,

    /// Worker threads for the threaded backend (default: all cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Comma-separated step counts for a refinement study at fixed total time
    #[arg(long, value_delimiter = ',')]
    refine: Vec<usize>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Serial,
    Threaded,
    Gpu,
    Auto,
}

impl Args {
    fn config(&self) -> SimulationConfig {
        SimulationConfig {
            n: self.n,
            nsteps: self.nsteps,
            alpha: self.alpha,
            length: self.length,
            dx: self.dx,
            dt: self.dt,
        }
    }

    fn backend_kind(&self) -> BackendKind {
        match self.backend {
            BackendArg::Serial => BackendKind::Serial,
            BackendArg::Threaded => BackendKind::Threaded {
                threads: self.threads,
            },
            BackendArg::Gpu => BackendKind::Gpu,
            BackendArg::Auto => BackendKind::Auto,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.config();
    let backend = args.backend_kind();

    if args.refine.is_empty() {
        single_run(config, backend, args.json)
    } else {
        let points = refinement_study(&config, &backend, &args.refine)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&points)?);
        } else {
            print_study(&points);
        }
        Ok(())
    }
}

fn single_run(
    config: SimulationConfig,
    backend: BackendKind,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let simulation = Simulation::new(config, backend)?;
    log_configuration(simulation.params());
    info!("Backend: {}", backend);

    let report = simulation.run()?;
    log_report(&report);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

fn print_study(points: &[RefinementPoint]) {
    println!(
        "{:>8}  {:>14}  {:>14}  {:>8}",
        "nsteps", "L2 norm", "self diff", "ratio"
    );
    let mut previous: Option<f64> = None;
    for point in points {
        let diff = point
            .self_difference
            .map_or_else(|| "-".to_string(), |d| format!("{d:.6e}"));
        let ratio = match (previous, point.self_difference) {
            (Some(p), Some(d)) if d > 0.0 => format!("{:.3}", p / d),
            _ => "-".to_string(),
        };
        println!(
            "{:>8}  {:>14.6e}  {:>14}  {:>8}",
            point.nsteps, point.report.l2_norm, diff, ratio
        );
        previous = point.self_difference;
    }
}
