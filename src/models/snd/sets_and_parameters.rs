use log::trace;
use ndarray::Array2;
use typed_index_collections::TiVec;

use crate::config::TerminalPolicy;
use crate::network::{ArcIndex, NodeIndex, Reachability, TimeExpandedNetwork};
use crate::problem::{CityIndex, Cost, Problem, Quantity, TimeIndex};

/// Sets of the service network design model
#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Set of cities. Every city is also the origin of exactly one commodity
    pub C: Vec<CityIndex>,
    /// Set of terminal cities
    pub Ct: Vec<CityIndex>,
    /// Set of time steps, 0..=H
    pub T: Vec<TimeIndex>,
    /// Set of nodes
    pub N: Vec<NodeIndex>,
    /// Set of all arcs
    pub A: Vec<ArcIndex>,
    /// Set of flight arcs (between distinct cities)
    pub Af: Vec<ArcIndex>,
    /// Set of arcs leaving a node at time 0
    pub A0: Vec<ArcIndex>,
    /// Set of arcs entering a node at the horizon
    pub AH: Vec<ArcIndex>,
    /// The commodities that may use each arc
    pub K: TiVec<ArcIndex, Vec<CityIndex>>,
}

/// Parameters of the service network design model
#[allow(non_snake_case)]
pub struct Parameters {
    /// The last time step
    pub H: TimeIndex,
    /// Demand from origin to destination
    pub demand: Array2<Quantity>,
    /// Total demand of every commodity
    pub total_demand: Vec<Quantity>,
    /// Cost of a single plane traversing an arc (airport fee plus fuel), zero for hold arcs
    pub arc_cost: TiVec<ArcIndex, Cost>,
    /// Fixed cost for every plane that leaves a node at time 0
    pub plane_cost: Cost,
    /// Cargo capacity of a single plane
    pub weight_limit: Quantity,
    /// The number of planes available
    pub fleet_size: usize,
    /// Which flight arcs at terminals are closed to other commodities
    pub terminal_policy: TerminalPolicy,
}

#[allow(non_snake_case)]
impl Sets {
    pub fn new(
        problem: &Problem,
        network: &TimeExpandedNetwork,
        reachability: &Reachability,
    ) -> Sets {
        let C: Vec<CityIndex> = problem.cities().keys().collect();
        let Ct = problem
            .cities()
            .iter_enumerated()
            .filter(|(_, city)| city.is_terminal())
            .map(|(c, _)| c)
            .collect();
        let H = network.horizon();
        let A: Vec<ArcIndex> = network.arcs().keys().collect();
        let Af = network.flight_arcs().map(|a| a.get_index()).collect();
        let A0 = network
            .arcs()
            .iter()
            .filter(|a| a.get_from().time() == 0)
            .map(|a| a.get_index())
            .collect();
        let AH = network
            .arcs()
            .iter()
            .filter(|a| a.get_to().time() == H)
            .map(|a| a.get_index())
            .collect();
        let K: TiVec<ArcIndex, Vec<CityIndex>> = network
            .arcs()
            .iter()
            .map(|arc| reachability.commodities(arc).collect())
            .collect();

        trace!(
            "Commodities per arc: {:?}",
            K.iter().map(|k| k.len()).collect::<Vec<_>>()
        );

        Sets {
            C,
            Ct,
            T: (0..=H).collect(),
            N: network.nodes().keys().collect(),
            A,
            Af,
            A0,
            AH,
            K,
        }
    }

    /// The number of (commodity, arc) pairs, i.e. cargo variables
    pub fn commodity_arc_pairs(&self) -> usize {
        self.K.iter().map(|k| k.len()).sum()
    }
}

impl Parameters {
    pub fn new(
        problem: &Problem,
        network: &TimeExpandedNetwork,
        terminal_policy: TerminalPolicy,
    ) -> Parameters {
        let cities = problem.cities().len();
        let demand = Array2::from_shape_fn((cities, cities), |(o, d)| {
            problem.demand(CityIndex::from(o), CityIndex::from(d))
        });
        let total_demand = problem
            .cities()
            .keys()
            .map(|c| problem.total_demand(c))
            .collect();

        let arc_cost = network
            .arcs()
            .iter()
            .map(|arc| {
                let (from, to) = (arc.get_from().city(), arc.get_to().city());
                if arc.is_flight() {
                    problem.airport_cost() + problem.fuel_cost() * problem.distance(from, to)
                } else {
                    0.0
                }
            })
            .collect();

        Parameters {
            H: network.horizon(),
            demand,
            total_demand,
            arc_cost,
            plane_cost: problem.plane_cost(),
            weight_limit: problem.weight_limit(),
            fleet_size: problem.fleet_size(),
            terminal_policy,
        }
    }

    pub fn demand(&self, origin: CityIndex, destination: CityIndex) -> Quantity {
        self.demand[[origin.into(), destination.into()]]
    }
}
