pub mod config;
pub mod error;
pub mod generate;
pub mod geometry;
pub mod models;
pub mod network;
pub mod parse;
pub mod problem;
pub mod solution;
pub mod solver;
pub mod utils;

#[cfg(feature = "python")]
mod python;

pub use config::{Config, TerminalPolicy};
pub use error::{Result, SndError};
pub use models::snd::solve;
pub use models::SndModel;
pub use network::{Reachability, TimeExpandedNetwork};
pub use problem::{InstanceDef, Problem};
pub use solution::SolvedNetwork;
pub use solver::{Solution, SolveStatus, Solver, SolverKind, SolverOptions};
