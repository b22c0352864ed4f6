use derive_more::{Display, From};

use crate::parse::ParseError;

/// Errors raised while building or solving a service network design model.
///
/// `InvalidParameter` and `UnreachableDemand` are detected before the solver is
/// invoked. The solver variants are passed through from the adapter unchanged.
#[derive(Debug, Display, From)]
pub enum SndError {
    /// A non-positive or non-finite parameter, or a malformed instance.
    #[display(fmt = "invalid parameter `{}`: {}", name, reason)]
    #[from(ignore)]
    InvalidParameter { name: String, reason: String },
    /// No time-respecting path from `origin` at time 0 reaches `destination` by the horizon.
    #[display(
        fmt = "demand {} -> {} can not be routed within the horizon",
        origin,
        destination
    )]
    #[from(ignore)]
    UnreachableDemand { origin: String, destination: String },
    #[display(fmt = "the model is infeasible: {}", _0)]
    #[from(ignore)]
    SolverInfeasible(String),
    #[display(fmt = "the model is unbounded: {}", _0)]
    #[from(ignore)]
    SolverUnbounded(String),
    /// The time limit was hit before any feasible assignment was found.
    #[display(fmt = "no solution found within the time limit of {:.1}s", _0)]
    #[from(ignore)]
    SolverTimeout(f64),
    /// Any other solver failure (license, interrupted, numeric trouble, ...)
    #[display(fmt = "solver error: {}", _0)]
    #[from(ignore)]
    Solver(String),
    #[display(fmt = "{}", _0)]
    Parse(ParseError),
    #[display(fmt = "{}", _0)]
    Io(std::io::Error),
    #[display(fmt = "{}", _0)]
    Json(serde_json::Error),
}

impl std::error::Error for SndError {}

#[cfg(feature = "gurobi")]
impl From<grb::Error> for SndError {
    fn from(err: grb::Error) -> Self {
        SndError::Solver(format!("gurobi: {err}"))
    }
}

impl SndError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        SndError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SndError>;
