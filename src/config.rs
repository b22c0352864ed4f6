use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::solver::SolverKind;

/// Which flight arcs at terminals are closed to commodities of other cities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalPolicy {
    /// Only departures from a terminal are restricted to the terminal's own commodity
    Outbound,
    /// Additionally, arrivals at a terminal may only carry the terminal's own commodity
    /// or commodities with demand to the terminal
    Bidirectional,
}

impl Default for TerminalPolicy {
    fn default() -> Self {
        TerminalPolicy::Outbound
    }
}

impl std::str::FromStr for TerminalPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "outbound" => Ok(TerminalPolicy::Outbound),
            "bidirectional" => Ok(TerminalPolicy::Bidirectional),
            _ => Err(format!("unknown terminal policy `{s}`")),
        }
    }
}

/// Options for building and solving a model. Every field has a default, so a JSON
/// config file only needs to mention what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub terminal_policy: TerminalPolicy,
    /// Which solver `snd solve` uses
    pub solver: SolverKind,
    /// Only create cargo variables for (commodity, arc) pairs where the commodity can
    /// reach the arc. Disabling this creates one variable per commodity and arc.
    pub prune_unreachable: bool,
    /// Wall clock limit for the solver, in seconds
    pub time_limit: Option<f64>,
    /// Number of solver threads, `None` lets the solver decide
    pub threads: Option<usize>,
    /// Show the solver log
    pub solver_output: bool,
    /// Tolerance used when checking a solution against the model
    pub tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            terminal_policy: TerminalPolicy::Outbound,
            solver: SolverKind::Microlp,
            prune_unreachable: true,
            time_limit: None,
            threads: None,
            solver_output: false,
            tolerance: 1e-6,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
