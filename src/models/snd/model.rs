use std::collections::HashMap;

use itertools::iproduct;
use log::{debug, info};
use typed_index_collections::TiVec;

use super::objective;
use super::sets_and_parameters::{Parameters, Sets};
use crate::config::TerminalPolicy;
use crate::models::linear::{ConstrSense, Expression, Model, Variable};
use crate::models::utils::AddVars;
use crate::network::{Arc, ArcIndex, NetworkNode, TimeExpandedNetwork};
use crate::problem::{CityIndex, Problem};

pub struct Variables {
    /// Cargo of commodity c on arc a. Only present for the commodities that may use the arc
    pub x: HashMap<(CityIndex, ArcIndex), Variable>,
    /// Number of planes flying (or waiting) along arc a
    pub y: TiVec<ArcIndex, Variable>,
}

impl Variables {
    /// The cargo variable of commodity `c` on `arc`, if the commodity can use the arc
    pub fn cargo(&self, c: CityIndex, arc: ArcIndex) -> Option<Variable> {
        self.x.get(&(c, arc)).copied()
    }
}

/// Builds the flow model: variables plus flow balance, plane conservation, fleet,
/// capacity and terminal constraints, and the cost objective.
pub struct FlowModelBuilder<'a> {
    problem: &'a Problem,
    network: &'a TimeExpandedNetwork,
    sets: &'a Sets,
    parameters: &'a Parameters,
}

#[allow(non_snake_case)]
impl<'a> FlowModelBuilder<'a> {
    pub fn new(
        problem: &'a Problem,
        network: &'a TimeExpandedNetwork,
        sets: &'a Sets,
        parameters: &'a Parameters,
    ) -> Self {
        FlowModelBuilder {
            problem,
            network,
            sets,
            parameters,
        }
    }

    fn node_label(&self, node: &NetworkNode) -> String {
        format!(
            "({},{})",
            self.problem.city(node.city()).name,
            node.time()
        )
    }

    fn arc_label(&self, arc: &Arc) -> String {
        format!(
            "{}_{}",
            self.node_label(arc.get_from()),
            self.node_label(arc.get_to())
        )
    }

    fn city(&self, c: CityIndex) -> &str {
        &self.problem.city(c).name
    }

    pub fn build(&self) -> (Model, Variables) {
        info!("Building service network design model.");
        let sets = self.sets;
        let network = self.network;

        let mut model = Model::new("SND");

        //*****************CREATE VARIABLES*****************//

        // cargo of commodity c on arc a, for every commodity that can reach the arc
        let pairs = sets
            .A
            .iter()
            .flat_map(|&a| sets.K[a].iter().map(move |&c| (c, a)))
            .collect::<Vec<_>>();
        let x = pairs.cont(&mut model, |&(c, a)| {
            format!("x_{}_{}", self.city(c), self.arc_label(network.arc(a)))
        });

        // planes along arc a
        let fleet = self.parameters.fleet_size as f64;
        let y: TiVec<ArcIndex, Variable> = {
            let y = sets.A.iter().copied().int(
                &mut model,
                |&a| format!("y_{}", self.arc_label(network.arc(a))),
                &(0.0..fleet),
            );
            sets.A.iter().map(|a| y[a]).collect()
        };

        debug!(
            "Created {} cargo variables and {} plane variables",
            x.len(),
            y.len()
        );

        let vars = Variables { x, y };

        //*****************ADD CONSTRAINTS*****************//
        self.commodity_balance(&mut model, &vars);
        self.plane_conservation(&mut model, &vars);
        self.capacity(&mut model, &vars);
        self.terminals(&mut model, &vars);

        let cost = objective::total_cost(sets, self.parameters, &vars);
        model.set_objective(cost);

        info!(
            "Successfully built model with {} variables and {} constraints",
            model.num_vars(),
            model.num_constrs()
        );

        (model, vars)
    }

    /// What commodity `c` must inject at (or, if negative, absorb from) `node`
    fn supply(&self, c: CityIndex, node: &NetworkNode) -> f64 {
        let parameters = self.parameters;
        if node.city() == c && node.time() == 0 {
            parameters.total_demand[usize::from(c)]
        } else if node.time() == parameters.H && node.city() != c {
            -parameters.demand(c, node.city())
        } else {
            0.0
        }
    }

    /// Every commodity leaves its origin at time 0, arrives at each destination by the
    /// horizon, and is conserved everywhere else.
    fn commodity_balance(&self, model: &mut Model, vars: &Variables) {
        let network = self.network;

        for (&c, &n) in iproduct!(&self.sets.C, &self.sets.N) {
            let node = &network.nodes()[n];
            let cargo = |arcs: &[ArcIndex]| -> Vec<Variable> {
                arcs.iter().filter_map(|&a| vars.cargo(c, a)).collect()
            };
            let outflow = cargo(network.forward_star(n));
            let inflow = cargo(network.reverse_star(n));
            let rhs = self.supply(c, node);

            if outflow.is_empty() && inflow.is_empty() && rhs == 0.0 {
                continue;
            }

            let name = format!("flow_{}_{}", self.city(c), self.node_label(node));
            let lhs = outflow.into_iter().sum::<Expression>()
                - inflow.into_iter().sum::<Expression>();
            model.add_constr(&name, lhs, ConstrSense::Equal, rhs);
        }
    }

    /// Planes are conserved at every intermediate node, the planes in use at time 0 are
    /// the ones back at the horizon, and there are no more of them than the fleet.
    fn plane_conservation(&self, model: &mut Model, vars: &Variables) {
        let network = self.network;
        let sets = self.sets;
        let y = &vars.y;

        for node in network.nodes() {
            if node.time() == 0 || node.time() == self.parameters.H {
                continue;
            }
            let planes = |arcs: &[ArcIndex]| -> Expression { arcs.iter().map(|&a| y[a]).sum() };
            let outflow = planes(network.forward_star(node.index()));
            let inflow = planes(network.reverse_star(node.index()));

            let name = format!("planes_{}", self.node_label(node));
            model.add_constr(&name, outflow - inflow, ConstrSense::Equal, 0.0);
        }

        let departing: Expression = sets.A0.iter().map(|&a| y[a]).sum();
        let arriving: Expression = sets.AH.iter().map(|&a| y[a]).sum();
        model.add_constr(
            "fleet_cycle",
            departing.clone() - arriving,
            ConstrSense::Equal,
            0.0,
        );
        model.add_constr(
            "fleet_size",
            departing,
            ConstrSense::Less,
            self.parameters.fleet_size as f64,
        );
    }

    /// Cargo can only fly on planes
    fn capacity(&self, model: &mut Model, vars: &Variables) {
        let W = self.parameters.weight_limit;

        for &a in &self.sets.Af {
            let cargo: Expression = self.sets.K[a]
                .iter()
                .filter_map(|&c| vars.cargo(c, a))
                .sum();
            let name = format!("capacity_{}", self.arc_label(self.network.arc(a)));
            model.add_constr(&name, cargo - vars.y[a] * W, ConstrSense::Less, 0.0);
        }
    }

    /// Terminals do not forward other cities' cargo
    fn terminals(&self, model: &mut Model, vars: &Variables) {
        let network = self.network;
        let parameters = self.parameters;

        for &a in &self.sets.Af {
            let arc = network.arc(a);
            let (u, v) = (arc.get_from().city(), arc.get_to().city());

            for &c in &self.sets.K[a] {
                let x = match vars.cargo(c, a) {
                    Some(x) => x,
                    None => continue,
                };

                if self.problem.city(u).is_terminal() && c != u {
                    let name = format!("terminal_out_{}_{}", self.city(c), self.arc_label(arc));
                    model.add_constr(&name, Expression::from(x), ConstrSense::Equal, 0.0);
                }

                if parameters.terminal_policy == TerminalPolicy::Bidirectional
                    && self.problem.city(v).is_terminal()
                    && c != v
                    && parameters.demand(c, v) == 0.0
                {
                    let name = format!("terminal_in_{}_{}", self.city(c), self.arc_label(arc));
                    model.add_constr(&name, Expression::from(x), ConstrSense::Equal, 0.0);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::linear::VarType;
    use crate::network::Reachability;
    use crate::problem::tests::two_city_def;
    use crate::problem::{City, CityRole, DemandEntry, InstanceDef};

    fn build(def: InstanceDef, policy: TerminalPolicy) -> (Model, Variables) {
        let problem = Problem::try_from(def).unwrap();
        let network = TimeExpandedNetwork::build(&problem).unwrap();
        let reach = Reachability::sweep(&network);
        let sets = Sets::new(&problem, &network, &reach);
        let parameters = Parameters::new(&problem, &network, policy);
        FlowModelBuilder::new(&problem, &network, &sets, &parameters).build()
    }

    #[test]
    fn variables_follow_reachability() {
        let (model, vars) = build(two_city_def(), TerminalPolicy::Outbound);
        // 12 arcs; 4 leave time 0 and carry one commodity each, the other 8 carry both
        assert_eq!(vars.y.len(), 12);
        assert_eq!(vars.x.len(), 4 + 8 * 2);

        let y = model.var(vars.y[ArcIndex::from(0)]);
        assert_eq!(y.vtype, VarType::Integer);
        assert_eq!((y.lb, y.ub), (0.0, 1.0));
        assert!(model
            .vars()
            .any(|(_, v)| v.name == "x_A_(A,0)_(B,1)" && v.vtype == VarType::Continuous));
        assert!(model.var_by_name("x_B_(A,0)_(B,1)").is_none());
    }

    #[test]
    fn origin_and_destination_balance() {
        let (model, _) = build(two_city_def(), TerminalPolicy::Outbound);

        let origin = model.constr_by_name("flow_A_(A,0)").unwrap();
        assert_eq!(origin.sense, ConstrSense::Equal);
        assert_eq!(origin.rhs, 5.0);

        let sink = model.constr_by_name("flow_A_(B,3)").unwrap();
        assert_eq!(sink.rhs, -5.0);

        let own_sink = model.constr_by_name("flow_A_(A,3)").unwrap();
        assert_eq!(own_sink.rhs, 0.0);

        let middle = model.constr_by_name("flow_A_(B,2)").unwrap();
        assert_eq!(middle.rhs, 0.0);
        // B's commodity can not be at A at time 0
        assert!(model.constr_by_name("flow_B_(A,0)").is_none());
    }

    #[test]
    fn plane_constraints() {
        let (model, _) = build(two_city_def(), TerminalPolicy::Outbound);
        // interior nodes only: two cities, times 1 and 2
        let planes = model
            .constrs()
            .iter()
            .filter(|c| c.name.starts_with("planes_"))
            .count();
        assert_eq!(planes, 4);
        assert!(model.constr_by_name("planes_(A,0)").is_none());
        assert!(model.constr_by_name("planes_(B,3)").is_none());

        let fleet = model.constr_by_name("fleet_size").unwrap();
        assert_eq!(fleet.sense, ConstrSense::Less);
        assert_eq!(fleet.rhs, 1.0);
        assert_eq!(fleet.terms().len(), 4);
        assert!(model.constr_by_name("fleet_cycle").is_some());
    }

    #[test]
    fn capacity_only_on_flights() {
        let (model, _) = build(two_city_def(), TerminalPolicy::Outbound);
        let capacity: Vec<_> = model
            .constrs()
            .iter()
            .filter(|c| c.name.starts_with("capacity_"))
            .collect();
        assert_eq!(capacity.len(), 6);

        let first = model.constr_by_name("capacity_(A,0)_(B,1)").unwrap();
        // x_A - 5 y <= 0
        assert_eq!(first.terms().len(), 2);
        assert!(first.terms().iter().any(|&(_, c)| c == -5.0));
        assert_eq!(first.rhs, 0.0);
    }

    fn terminal_def() -> InstanceDef {
        let mut def = two_city_def();
        def.cities.push(City::new("T", 10.0, 0.0, CityRole::Terminal));
        def.speed = 20.0;
        def.demand.push(DemandEntry {
            origin: "B".into(),
            destination: "T".into(),
            quantity: 1.0,
        });
        def
    }

    #[test]
    fn terminals_do_not_forward() {
        let (model, _) = build(terminal_def(), TerminalPolicy::Outbound);
        let outbound: Vec<_> = model
            .constrs()
            .iter()
            .filter(|c| c.name.starts_with("terminal_out_"))
            .collect();
        assert!(!outbound.is_empty());
        for c in &outbound {
            assert!(c.name.contains("_(T,"));
            assert!(!c.name.starts_with("terminal_out_T_"));
            assert_eq!(c.rhs, 0.0);
            assert_eq!(c.sense, ConstrSense::Equal);
        }
        assert!(!model
            .constrs()
            .iter()
            .any(|c| c.name.starts_with("terminal_in_")));
    }

    #[test]
    fn bidirectional_policy_closes_arrivals() {
        let (model, _) = build(terminal_def(), TerminalPolicy::Bidirectional);
        let inbound: Vec<_> = model
            .constrs()
            .iter()
            .filter(|c| c.name.starts_with("terminal_in_"))
            .map(|c| c.name.clone())
            .collect();
        assert!(!inbound.is_empty());
        // A has no demand to T, B does
        assert!(inbound.iter().all(|n| n.starts_with("terminal_in_A_")));
        assert!(inbound
            .iter()
            .all(|n| n.rsplit_once("_(").unwrap().1.starts_with("T,")));
    }
}
