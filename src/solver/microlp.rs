use good_lp::solvers::microlp::microlp;
use good_lp::{ResolutionError, Solution as _, SolverModel};
use log::{debug, info, warn};

use super::{Solution, SolveStatus, Solver, SolverOptions};
use crate::error::{Result, SndError};
use crate::models::linear::{Assignment, Model};

/// Solves models with `microlp`, a pure Rust simplex and branch and bound solver.
/// It has no time limit and runs on a single thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpSolver;

impl Solver for MicroLpSolver {
    fn solve(&mut self, model: &Model, options: &SolverOptions) -> Result<Solution> {
        if options.time_limit.is_some() || options.threads.is_some() {
            warn!("microlp ignores the time limit and thread settings");
        }
        info!(
            "Solving {} with microlp ({} variables, {} constraints)",
            model.name(),
            model.num_vars(),
            model.num_constrs()
        );

        let (variables, declared) = model.declare()?;
        let mut problem = variables
            .minimise(model.objective().clone())
            .using(microlp);
        for constr in model.constrs() {
            problem.add_constraint(constr.to_good_lp());
        }

        let solved = problem.solve().map_err(|err| match err {
            ResolutionError::Infeasible => SndError::SolverInfeasible("microlp".to_string()),
            ResolutionError::Unbounded => SndError::SolverUnbounded("microlp".to_string()),
            other => SndError::Solver(format!("microlp: {other:?}")),
        })?;
        debug!("microlp finished");

        let values: Assignment = declared.iter().map(|&v| (v, solved.value(v))).collect();
        Ok(Solution {
            status: SolveStatus::Optimal,
            objective: model.objective_value(&values),
            values,
        })
    }
}
