use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{error, info, LevelFilter};

use snd::generate::{generate, GeneratorConfig};
use snd::parse::read_instance;
use snd::{Config, SndModel, SolverKind, TerminalPolicy};

/// Time-expanded service network design: build and solve the cargo routing and fleet
/// model for an instance.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// Enable debug logging
    #[clap(long, short = 'v', global = true)]
    debug: bool,

    /// JSON file with model and solver options
    #[clap(long, short, global = true)]
    config: Option<PathBuf>,

    /// Which flight arcs at terminals are closed: outbound or bidirectional
    #[clap(long, global = true)]
    terminal_policy: Option<TerminalPolicy>,

    /// Which solver to use: microlp or gurobi
    #[clap(long, global = true)]
    solver: Option<SolverKind>,

    /// Create cargo variables for every commodity on every arc
    #[clap(long, global = true)]
    no_prune: bool,

    /// Solver time limit in seconds
    #[clap(long, global = true)]
    time_limit: Option<f64>,

    /// Number of solver threads
    #[clap(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve an instance and write the solved network as JSON
    Solve {
        instance: PathBuf,
        /// Where to write the solved network
        #[clap(long, short)]
        out: Option<PathBuf>,
        /// Show the solver log
        #[clap(long)]
        solver_output: bool,
    },
    /// Build the model for an instance without solving it
    Build {
        instance: PathBuf,
        /// Write the model in LP format (needs Gurobi)
        #[clap(long)]
        lp: Option<PathBuf>,
    },
    /// Write a random instance as JSON
    Generate {
        /// Where to write the instance
        out: PathBuf,
        #[clap(long, default_value_t = 0)]
        seed: u64,
        /// JSON file with generator options
        #[clap(long)]
        options: Option<PathBuf>,
        #[clap(long)]
        cities: Option<usize>,
    },
}

fn setup_logger(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn config(args: &Args) -> snd::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(policy) = args.terminal_policy {
        config.terminal_policy = policy;
    }
    if let Some(solver) = args.solver {
        config.solver = solver;
    }
    if args.no_prune {
        config.prune_unreachable = false;
    }
    if args.time_limit.is_some() {
        config.time_limit = args.time_limit;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    Ok(config)
}

#[cfg(feature = "gurobi")]
fn write_lp(model: &SndModel, path: &std::path::Path) -> snd::Result<()> {
    snd::solver::GurobiSolver::new()?.write(&model.model, path)
}

#[cfg(not(feature = "gurobi"))]
fn write_lp(_: &SndModel, _: &std::path::Path) -> snd::Result<()> {
    Err(snd::SndError::Solver(
        "writing LP files needs Gurobi, rebuild with `--features gurobi`".to_string(),
    ))
}

fn run(args: Args) -> snd::Result<()> {
    let mut config = config(&args)?;

    match args.command {
        Command::Solve {
            instance,
            out,
            solver_output,
        } => {
            config.solver_output |= solver_output;
            let problem = read_instance(&instance)?;
            let model = SndModel::build(&problem, &config)?;
            let solved = model.solve(&problem, config.solver.create()?, &config)?;
            solved.report();
            if let Some(out) = out {
                solved.write_json(&out)?;
                info!("Wrote solution to {}", out.display());
            }
        }
        Command::Build { instance, lp } => {
            let problem = read_instance(&instance)?;
            let model = SndModel::build(&problem, &config)?;
            info!(
                "{} nodes, {} arcs, {} variables, {} constraints",
                model.network.nodes().len(),
                model.network.arcs().len(),
                model.model.num_vars(),
                model.model.num_constrs()
            );
            if let Some(lp) = lp {
                write_lp(&model, &lp)?;
            }
        }
        Command::Generate {
            out,
            seed,
            options,
            cities,
        } => {
            let mut options: GeneratorConfig = match options {
                Some(path) => serde_json::from_reader(File::open(path)?)?,
                None => GeneratorConfig::default(),
            };
            if let Some(cities) = cities {
                options.cities = cities;
            }
            let problem = generate(&options, seed)?;
            serde_json::to_writer_pretty(BufWriter::new(File::create(&out)?), &problem)?;
            info!("Wrote instance to {}", out.display());
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    setup_logger(args.debug);

    if let Err(err) = run(args) {
        error!("{err}");
        std::process::exit(1);
    }
}
