//! The time-expanded network: one node per (city, time step), hold arcs between
//! consecutive time steps of the same city and flight arcs between distinct cities.
//!
//! Nodes and arcs are stored in contiguous arenas indexed by `NodeIndex` and
//! `ArcIndex`. The node of city `c` at time `t` has index `c * (H + 1) + t`.
pub mod reachability;

use derive_more::{Deref, Display, From, Into};
use itertools::iproduct;
use log::{debug, info, warn};
use serde::Serialize;
use typed_index_collections::TiVec;

use crate::error::{Result, SndError};
use crate::problem::{CityIndex, Problem, TimeIndex};

pub use reachability::Reachability;

#[derive(
    Deref, Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash, Serialize,
)]
pub struct NodeIndex(usize);

#[derive(
    Deref, Debug, Display, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash, Serialize,
)]
pub struct ArcIndex(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NetworkNode {
    city: CityIndex,
    time: TimeIndex,
    index: NodeIndex,
}

impl NetworkNode {
    pub fn city(&self) -> CityIndex {
        self.city
    }

    pub fn time(&self) -> TimeIndex {
        self.time
    }

    pub fn index(&self) -> NodeIndex {
        self.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcKind {
    /// Staying at the same city for one time step
    Hold,
    /// A departure to a different city
    Flight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arc {
    from: NetworkNode,
    to: NetworkNode,
    kind: ArcKind,
    index: ArcIndex,
}

impl Arc {
    pub fn get_from(&self) -> &NetworkNode {
        &self.from
    }

    pub fn get_to(&self) -> &NetworkNode {
        &self.to
    }

    pub fn get_index(&self) -> ArcIndex {
        self.index
    }

    pub fn kind(&self) -> ArcKind {
        self.kind
    }

    pub fn is_flight(&self) -> bool {
        self.kind == ArcKind::Flight
    }

    /// The pair of (city, time) keys this arc connects
    pub fn key(&self) -> ((CityIndex, TimeIndex), (CityIndex, TimeIndex)) {
        (
            (self.from.city, self.from.time),
            (self.to.city, self.to.time),
        )
    }
}

#[derive(Debug, Clone)]
pub struct TimeExpandedNetwork {
    /// The last time step
    horizon: TimeIndex,
    /// Number of cities
    cities: usize,
    /// All nodes, ordered by city and then time
    nodes: TiVec<NodeIndex, NetworkNode>,
    /// All arcs. Hold arcs come first (by time, then city), followed by the flight arcs
    /// (by origin, destination and departure time)
    arcs: TiVec<ArcIndex, Arc>,
    /// Outgoing arcs of each node
    forward_star: TiVec<NodeIndex, Vec<ArcIndex>>,
    /// Incoming arcs of each node
    reverse_star: TiVec<NodeIndex, Vec<ArcIndex>>,
}

impl TimeExpandedNetwork {
    /// Builds the network for the cities, time discretization and plane speed of `problem`.
    pub fn build(problem: &Problem) -> Result<TimeExpandedNetwork> {
        let horizon = problem.timesteps();
        let cities = problem.cities().len();
        info!(
            "Building time-expanded network with {} cities and {} time steps",
            cities,
            horizon + 1
        );

        cities
            .checked_mul(horizon + 1)
            .filter(|&n| n <= isize::MAX as usize / std::mem::size_of::<NetworkNode>())
            .ok_or_else(|| {
                SndError::invalid(
                    "horizon",
                    format!("{cities} cities over {horizon} time steps do not fit in memory"),
                )
            })?;

        let nodes: TiVec<NodeIndex, NetworkNode> = iproduct!(0..cities, 0..=horizon)
            .enumerate()
            .map(|(index, (city, time))| NetworkNode {
                city: CityIndex::from(city),
                time,
                index: NodeIndex(index),
            })
            .collect();

        let mut network = TimeExpandedNetwork {
            horizon,
            cities,
            forward_star: vec![Vec::new(); nodes.len()].into(),
            reverse_star: vec![Vec::new(); nodes.len()].into(),
            nodes,
            arcs: TiVec::new(),
        };

        // hold arcs
        for (t, c) in iproduct!(0..horizon, 0..cities) {
            let city = CityIndex::from(c);
            network.add_arc(city, t, city, t + 1, ArcKind::Hold);
        }
        let holds = network.arcs.len();

        // flight arcs, as long as they arrive within the horizon
        for (a, b) in iproduct!(0..cities, 0..cities) {
            if a == b {
                continue;
            }
            let (from, to) = (CityIndex::from(a), CityIndex::from(b));
            let mut duration = problem.flight_duration(from, to)?;
            if duration == 0 {
                warn!(
                    "Cities {} and {} share a location, using a flight time of one step",
                    problem.city(from).name,
                    problem.city(to).name
                );
                duration = 1;
            }
            if duration > horizon {
                continue;
            }
            for t in 0..=(horizon - duration) {
                network.add_arc(from, t, to, t + duration, ArcKind::Flight);
            }
        }

        debug!(
            "Network has {} nodes, {} hold arcs and {} flight arcs",
            network.nodes.len(),
            holds,
            network.arcs.len() - holds
        );

        Ok(network)
    }

    fn add_arc(
        &mut self,
        from: CityIndex,
        t1: TimeIndex,
        to: CityIndex,
        t2: TimeIndex,
        kind: ArcKind,
    ) {
        let from = self.nodes[self.node_index(from, t1)];
        let to = self.nodes[self.node_index(to, t2)];
        let index = self.arcs.next_key();
        self.arcs.push(Arc {
            from,
            to,
            kind,
            index,
        });
        self.forward_star[from.index].push(index);
        self.reverse_star[to.index].push(index);
    }

    /// The last time step, `H`
    pub fn horizon(&self) -> TimeIndex {
        self.horizon
    }

    pub fn num_cities(&self) -> usize {
        self.cities
    }

    pub fn nodes(&self) -> &TiVec<NodeIndex, NetworkNode> {
        &self.nodes
    }

    pub fn arcs(&self) -> &TiVec<ArcIndex, Arc> {
        &self.arcs
    }

    pub fn arc(&self, arc: ArcIndex) -> &Arc {
        &self.arcs[arc]
    }

    pub fn flight_arcs(&self) -> impl Iterator<Item = &Arc> + '_ {
        self.arcs.iter().filter(|a| a.is_flight())
    }

    /// The index of the node of `city` at time `time`
    pub fn node_index(&self, city: CityIndex, time: TimeIndex) -> NodeIndex {
        debug_assert!(time <= self.horizon);
        NodeIndex(usize::from(city) * (self.horizon + 1) + time)
    }

    pub fn node(&self, city: CityIndex, time: TimeIndex) -> &NetworkNode {
        &self.nodes[self.node_index(city, time)]
    }

    /// All nodes at a given time step, ordered by city
    pub fn nodes_at(&self, time: TimeIndex) -> impl Iterator<Item = &NetworkNode> + '_ {
        (0..self.cities).map(move |c| self.node(CityIndex::from(c), time))
    }

    /// Outgoing arcs of a node
    pub fn forward_star(&self, node: NodeIndex) -> &[ArcIndex] {
        &self.forward_star[node]
    }

    /// Incoming arcs of a node
    pub fn reverse_star(&self, node: NodeIndex) -> &[ArcIndex] {
        &self.reverse_star[node]
    }
}
