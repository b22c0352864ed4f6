use std::collections::HashMap;
use std::path::Path;

use good_lp::IntoAffineExpression;
use grb::prelude::*;
use log::{debug, info, warn};

use super::{Solution, SolveStatus, Solver, SolverOptions};
use crate::error::{Result, SndError};
use crate::models::linear::{self, Assignment, ConstrSense, VarType};

/// Solves models with Gurobi. The environment is created once and reused across solves.
pub struct GurobiSolver {
    env: Env,
}

/// Maps a Gurobi status to the outcome of a solve. `solutions` is the number of
/// solutions found.
fn outcome(status: Status, solutions: i32, time_limit: Option<f64>) -> Result<SolveStatus> {
    match status {
        Status::Optimal => Ok(SolveStatus::Optimal),
        Status::Infeasible => Err(SndError::SolverInfeasible(format!("{:?}", status))),
        Status::Unbounded => Err(SndError::SolverUnbounded(format!("{:?}", status))),
        // Gurobi did not decide which of the two it is
        Status::InfOrUnbd => Err(SndError::Solver(format!(
            "the model is infeasible or unbounded ({:?})",
            status
        ))),
        Status::TimeLimit if solutions == 0 => {
            Err(SndError::SolverTimeout(time_limit.unwrap_or(0.0)))
        }
        Status::TimeLimit => {
            warn!("Time limit reached, returning the best of {solutions} solutions");
            Ok(SolveStatus::TimeLimit)
        }
        other => Err(SndError::Solver(format!("unexpected status {:?}", other))),
    }
}

impl GurobiSolver {
    pub fn new() -> Result<GurobiSolver> {
        let env = Env::new("")?;
        Ok(GurobiSolver { env })
    }

    fn translate(
        &self,
        model: &linear::Model,
        options: &SolverOptions,
    ) -> Result<(Model, HashMap<linear::Variable, Var>)> {
        let mut grb_model = Model::with_env(model.name(), &self.env)?;
        grb_model.set_param(param::OutputFlag, options.output as i32)?;
        if let Some(limit) = options.time_limit {
            grb_model.set_param(param::TimeLimit, limit)?;
        }
        if let Some(threads) = options.threads {
            grb_model.set_param(param::Threads, threads as i32)?;
        }

        let mut vars = HashMap::with_capacity(model.num_vars());
        for (var, def) in model.vars() {
            let vtype = match def.vtype {
                VarType::Continuous => grb::VarType::Continuous,
                VarType::Integer => grb::VarType::Integer,
            };
            let grb_var =
                grb_model.add_var(&def.name, vtype, 0.0, def.lb, def.ub, std::iter::empty())?;
            vars.insert(var, grb_var);
        }

        let expr = |terms: Vec<(linear::Variable, f64)>| {
            let mut lhs = grb::expr::LinExpr::new();
            for (var, coeff) in terms {
                lhs.add_term(coeff, vars[&var]);
            }
            lhs
        };

        for c in model.constrs() {
            let lhs = expr(c.terms());
            let rhs = c.rhs;
            let constr = match c.sense {
                ConstrSense::Less => c!(lhs <= rhs),
                ConstrSense::Equal => c!(lhs == rhs),
                ConstrSense::Greater => c!(lhs >= rhs),
            };
            grb_model.add_constr(&c.name, constr)?;
        }

        let objective = model.objective().clone().linear_coefficients().into_iter().collect();
        grb_model.set_objective(expr(objective), Minimize)?;
        grb_model.update()?;

        Ok((grb_model, vars))
    }

    /// Writes the model to `path`. Gurobi picks the format from the extension
    /// (`.lp`, `.mps`, ...).
    pub fn write(&self, model: &linear::Model, path: impl AsRef<Path>) -> Result<()> {
        let (grb_model, _) = self.translate(model, &SolverOptions::default())?;
        grb_model.write(&path.as_ref().to_string_lossy())?;
        info!("Wrote {} to {}", model.name(), path.as_ref().display());
        Ok(())
    }
}

impl Solver for GurobiSolver {
    fn solve(&mut self, model: &linear::Model, options: &SolverOptions) -> Result<Solution> {
        let (mut grb_model, vars) = self.translate(model, options)?;
        info!(
            "Solving {} with Gurobi ({} variables, {} constraints)",
            model.name(),
            model.num_vars(),
            model.num_constrs()
        );

        grb_model.optimize()?;
        let status = grb_model.status()?;
        debug!("Gurobi finished with status {:?}", status);

        let solutions = grb_model.get_attr(attr::SolCount)?;
        let status = outcome(status, solutions, options.time_limit)?;

        let objective = grb_model.get_attr(attr::ObjVal)?;
        let (keys, grb_vars): (Vec<_>, Vec<_>) = vars.into_iter().unzip();
        let values = grb_model.get_obj_attr_batch(attr::X, grb_vars)?;
        let values: Assignment = keys.into_iter().zip(values).collect();

        Ok(Solution {
            status,
            objective,
            values,
        })
    }
}
