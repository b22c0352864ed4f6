use bit_set::BitSet;
use log::{debug, trace};
use typed_index_collections::TiVec;

use super::{Arc, NodeIndex, TimeExpandedNetwork};
use crate::error::{Result, SndError};
use crate::problem::{CityIndex, Problem};

/// For every node of the network, the set of origin cities `c` such that there is a path
/// from `(c, 0)` to the node. A commodity can only ever use arcs whose tail it reaches.
#[derive(Debug, Clone)]
pub struct Reachability {
    origins: TiVec<NodeIndex, BitSet>,
}

impl Reachability {
    /// Computes the reachable origins with a single forward pass over the network.
    ///
    /// Time strictly increases along every arc, so processing the tails in ascending
    /// time order guarantees that a node's set is complete before it is propagated.
    pub fn sweep(network: &TimeExpandedNetwork) -> Reachability {
        let mut origins: TiVec<NodeIndex, BitSet> =
            vec![BitSet::with_capacity(network.num_cities()); network.nodes().len()].into();

        for node in network.nodes_at(0) {
            origins[node.index()].insert(node.city().into());
        }

        for t in 0..network.horizon() {
            for node in network.nodes_at(t) {
                let tail = node.index();
                if origins[tail].is_empty() {
                    continue;
                }
                let reached = origins[tail].clone();
                for &a in network.forward_star(tail) {
                    let head = network.arc(a).get_to().index();
                    debug_assert!(network.nodes()[head].time() > t);
                    origins[head].union_with(&reached);
                }
            }
        }

        let total: usize = origins.iter().map(|set| set.len()).sum();
        debug!(
            "Reachability sweep: {} (origin, node) pairs out of {}",
            total,
            network.nodes().len() * network.num_cities()
        );

        Reachability { origins }
    }

    /// Every origin reaches every node. Used when pruning is disabled.
    pub fn unrestricted(network: &TimeExpandedNetwork) -> Reachability {
        let all: BitSet = (0..network.num_cities()).collect();
        Reachability {
            origins: vec![all; network.nodes().len()].into(),
        }
    }

    /// Whether there is a path from `(origin, 0)` to `node`
    pub fn reaches(&self, origin: CityIndex, node: NodeIndex) -> bool {
        self.origins[node].contains(origin.into())
    }

    /// The origins reaching `node`, in ascending order
    pub fn origins(&self, node: NodeIndex) -> impl Iterator<Item = CityIndex> + '_ {
        self.origins[node].iter().map(CityIndex::from)
    }

    /// The commodities that can traverse `arc`, i.e. those reaching its tail
    pub fn commodities<'a>(&'a self, arc: &Arc) -> impl Iterator<Item = CityIndex> + 'a {
        self.origins(arc.get_from().index())
    }

    /// Fails with `UnreachableDemand` for the first demand pair whose destination can not be
    /// reached from the origin by the end of the horizon.
    pub fn check_demand(&self, problem: &Problem, network: &TimeExpandedNetwork) -> Result<()> {
        for (origin, destination, quantity) in problem.demand_pairs() {
            let sink = network.node_index(destination, network.horizon());
            trace!(
                "Checking demand {} -> {} ({})",
                problem.city(origin).name,
                problem.city(destination).name,
                quantity
            );
            if !self.reaches(origin, sink) {
                return Err(SndError::UnreachableDemand {
                    origin: problem.city(origin).name.clone(),
                    destination: problem.city(destination).name.clone(),
                });
            }
        }

        Ok(())
    }
}
