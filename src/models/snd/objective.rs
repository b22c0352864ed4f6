use super::model::Variables;
use super::sets_and_parameters::{Parameters, Sets};
use crate::models::linear::Expression;

/// Cost of operating the fleet: airport fee and fuel for every flight, plus the fixed
/// plane cost for every plane leaving a node at time 0. Waiting is free.
pub fn total_cost(sets: &Sets, parameters: &Parameters, vars: &Variables) -> Expression {
    let flights = sets
        .Af
        .iter()
        .map(|&a| vars.y[a] * parameters.arc_cost[a])
        .sum::<Expression>();

    let planes = sets
        .A0
        .iter()
        .map(|&a| vars.y[a] * parameters.plane_cost)
        .sum::<Expression>();

    flights + planes
}
