//! Projection of a solver assignment back onto the time-expanded network.
use std::collections::BTreeMap;
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::models::utils::ConvertVars;
use crate::models::snd::{Sets, Variables};
use crate::network::{ArcKind, TimeExpandedNetwork};
use crate::problem::{Problem, Quantity, TimeIndex};
use crate::solver::{Solution, SolveStatus};
use crate::utils::EPSILON;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedNode {
    pub city: String,
    pub time: TimeIndex,
    /// Plotting position: the time step along one axis and the rank of the city's
    /// name along the other
    pub pos: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedArc {
    /// Index of the tail in `SolvedNetwork::nodes`
    pub from: usize,
    /// Index of the head in `SolvedNetwork::nodes`
    pub to: usize,
    pub kind: ArcKind,
    /// Number of planes along the arc
    pub planes: f64,
    /// Cargo per commodity, keyed by the name of the commodity's origin. Only the
    /// commodities that can use the arc are present.
    pub cargo: BTreeMap<String, Quantity>,
}

impl ProjectedArc {
    pub fn total_cargo(&self) -> Quantity {
        self.cargo.values().sum()
    }
}

/// The network annotated with the flows of a solved model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolvedNetwork {
    pub status: SolveStatus,
    pub objective: f64,
    pub nodes: Vec<ProjectedNode>,
    pub arcs: Vec<ProjectedArc>,
}

/// Values within `EPSILON` of zero are solver noise
fn clean(value: f64) -> f64 {
    if value.abs() < EPSILON {
        0.0
    } else {
        value
    }
}

impl SolvedNetwork {
    pub fn project(
        problem: &Problem,
        network: &TimeExpandedNetwork,
        sets: &Sets,
        variables: &Variables,
        solution: &Solution,
    ) -> SolvedNetwork {
        // cities are kept sorted by name, so the index is the lexicographic rank
        let nodes = network
            .nodes()
            .iter()
            .map(|node| ProjectedNode {
                city: problem.city(node.city()).name.clone(),
                time: node.time(),
                pos: (node.time() as f64, usize::from(node.city()) as f64),
            })
            .collect();

        let x = variables.x.convert(&solution.values);
        let y = variables.y.convert(&solution.values);

        let arcs = network
            .arcs()
            .iter()
            .map(|arc| {
                let a = arc.get_index();
                let cargo = sets.K[a]
                    .iter()
                    .filter_map(|&c| {
                        let value = x.get(&(c, a))?;
                        Some((problem.city(c).name.clone(), clean(*value)))
                    })
                    .collect();
                ProjectedArc {
                    from: arc.get_from().index().into(),
                    to: arc.get_to().index().into(),
                    kind: arc.kind(),
                    planes: clean(y[a]),
                    cargo,
                }
            })
            .collect();

        SolvedNetwork {
            status: solution.status,
            objective: solution.objective,
            nodes,
            arcs,
        }
    }

    /// Arcs used by at least one plane
    pub fn used_arcs(&self) -> impl Iterator<Item = &ProjectedArc> + '_ {
        self.arcs.iter().filter(|arc| arc.planes > 0.0)
    }

    /// Every non-zero cargo flow as (commodity, arc)
    pub fn cargo_flows(&self) -> impl Iterator<Item = (&str, &ProjectedArc)> + '_ {
        self.arcs.iter().flat_map(|arc| {
            arc.cargo
                .iter()
                .filter(|(_, q)| **q > 0.0)
                .map(move |(c, _)| (c.as_str(), arc))
        })
    }

    /// Number of planes leaving time 0
    pub fn planes_in_use(&self) -> f64 {
        self.arcs
            .iter()
            .filter(|arc| self.nodes[arc.from].time == 0)
            .map(|arc| arc.planes)
            .sum()
    }

    /// `(city,t)` of a node, as used in variable names
    pub fn node_label(&self, node: usize) -> String {
        let node = &self.nodes[node];
        format!("({},{})", node.city, node.time)
    }

    /// Logs the objective and every non-zero flow
    pub fn report(&self) {
        info!("Status: {:?}, objective: {}", self.status, self.objective);
        for arc in self.used_arcs() {
            info!(
                "y_{}_{} = {}",
                self.node_label(arc.from),
                self.node_label(arc.to),
                arc.planes
            );
        }
        for (commodity, arc) in self.cargo_flows() {
            info!(
                "x_{}_{}_{} = {}",
                commodity,
                self.node_label(arc.from),
                self.node_label(arc.to),
                arc.cargo[commodity]
            );
        }
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }
}
