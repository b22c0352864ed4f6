pub mod model;
pub mod objective;
pub mod sets_and_parameters;

use log::{info, warn};

pub use model::{FlowModelBuilder, Variables};
pub use sets_and_parameters::{Parameters, Sets};

use crate::config::Config;
use crate::error::Result;
use crate::models::linear::{Assignment, Model, Violation};
use crate::network::{Reachability, TimeExpandedNetwork};
use crate::problem::Problem;
use crate::solution::SolvedNetwork;
use crate::solver::{Solver, SolverOptions};
use crate::utils::approx_eq;

/// Everything built for a single solve: the time expanded network, the commodities
/// allowed on each arc, and the assembled model.
pub struct SndModel {
    pub network: TimeExpandedNetwork,
    pub reachability: Reachability,
    pub sets: Sets,
    pub parameters: Parameters,
    pub model: Model,
    pub variables: Variables,
}

impl SndModel {
    /// Builds the network and the model. Fails with `UnreachableDemand` before anything
    /// is handed to a solver if some demand can not be delivered within the horizon.
    pub fn build(problem: &Problem, config: &Config) -> Result<SndModel> {
        let network = TimeExpandedNetwork::build(problem)?;

        let swept = Reachability::sweep(&network);
        swept.check_demand(problem, &network)?;

        let reachability = if config.prune_unreachable {
            swept
        } else {
            Reachability::unrestricted(&network)
        };

        let sets = Sets::new(problem, &network, &reachability);
        let parameters = Parameters::new(problem, &network, config.terminal_policy);
        let (model, variables) =
            FlowModelBuilder::new(problem, &network, &sets, &parameters).build();

        Ok(SndModel {
            network,
            reachability,
            sets,
            parameters,
            model,
            variables,
        })
    }

    /// Hands the model to `solver` once and projects the assignment onto the network.
    pub fn solve<S: Solver>(
        &self,
        problem: &Problem,
        mut solver: S,
        config: &Config,
    ) -> Result<SolvedNetwork> {
        let options = SolverOptions::from(config);
        let solution = solver.solve(&self.model, &options)?;
        info!(
            "Solver returned {:?} with objective {}",
            solution.status, solution.objective
        );

        let recomputed = self.model.objective_value(&solution.values);
        let tolerance = config.tolerance * recomputed.abs().max(1.0);
        if !approx_eq(recomputed, solution.objective, tolerance) {
            warn!(
                "Reported objective {} differs from the assignment's cost {}",
                solution.objective, recomputed
            );
        }

        let violations = self.check(&solution.values, config.tolerance);
        if !violations.is_empty() {
            warn!(
                "The solver's assignment violates {} constraints, first: {} ({})",
                violations.len(),
                violations[0].name,
                violations[0].amount
            );
        }

        Ok(SolvedNetwork::project(
            problem,
            &self.network,
            &self.sets,
            &self.variables,
            &solution,
        ))
    }

    /// Checks an assignment against every constraint of the model
    pub fn check(&self, values: &Assignment, tolerance: f64) -> Vec<Violation> {
        self.model.violations(values, tolerance)
    }
}

/// Builds a fresh model for `problem` and solves it with `solver`
pub fn solve<S: Solver>(problem: &Problem, solver: S, config: &Config) -> Result<SolvedNetwork> {
    SndModel::build(problem, config)?.solve(problem, solver, config)
}
