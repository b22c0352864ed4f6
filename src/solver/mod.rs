//! Adapters between `models::linear::Model` and MILP solvers.
#[cfg(feature = "gurobi")]
pub mod gurobi;
pub mod microlp;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::models::linear::{Assignment, Model};

#[cfg(feature = "gurobi")]
pub use gurobi::GurobiSolver;
pub use microlp::MicroLpSolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    /// Proven optimal
    Optimal,
    /// The time limit was hit, the best assignment found so far is returned
    TimeLimit,
}

/// An assignment returned by a solver, with a value for every variable of the model
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolveStatus,
    pub objective: f64,
    pub values: Assignment,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverOptions {
    pub time_limit: Option<f64>,
    pub threads: Option<usize>,
    pub output: bool,
}

impl From<&Config> for SolverOptions {
    fn from(config: &Config) -> Self {
        SolverOptions {
            time_limit: config.time_limit,
            threads: config.threads,
            output: config.solver_output,
        }
    }
}

/// Something that can solve a mixed integer linear program.
///
/// An infeasible model must be reported as `SndError::SolverInfeasible`, an unbounded one
/// as `SndError::SolverUnbounded`, and a time limit without any assignment as
/// `SndError::SolverTimeout`. Implementations should not retry with relaxed settings.
pub trait Solver {
    fn solve(&mut self, model: &Model, options: &SolverOptions) -> Result<Solution>;
}

impl<S: Solver + ?Sized> Solver for &mut S {
    fn solve(&mut self, model: &Model, options: &SolverOptions) -> Result<Solution> {
        (**self).solve(model, options)
    }
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn solve(&mut self, model: &Model, options: &SolverOptions) -> Result<Solution> {
        (**self).solve(model, options)
    }
}

/// The solvers a model can be handed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Pure Rust branch and bound, always available
    Microlp,
    /// Needs the `gurobi` feature and a Gurobi installation
    Gurobi,
}

impl Default for SolverKind {
    fn default() -> Self {
        SolverKind::Microlp
    }
}

impl std::str::FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "microlp" => Ok(SolverKind::Microlp),
            "gurobi" => Ok(SolverKind::Gurobi),
            _ => Err(format!("unknown solver `{s}`")),
        }
    }
}

impl SolverKind {
    pub fn create(self) -> Result<Box<dyn Solver>> {
        match self {
            SolverKind::Microlp => Ok(Box::new(MicroLpSolver)),
            #[cfg(feature = "gurobi")]
            SolverKind::Gurobi => Ok(Box::new(GurobiSolver::new()?)),
            #[cfg(not(feature = "gurobi"))]
            SolverKind::Gurobi => Err(crate::error::SndError::Solver(
                "this build has no Gurobi support, rebuild with `--features gurobi`".to_string(),
            )),
        }
    }
}
