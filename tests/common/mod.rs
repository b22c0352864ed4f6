#![allow(dead_code)]

use snd::models::linear::{Assignment, Model};
use snd::problem::{City, CityRole, DemandEntry, InstanceDef};
use snd::{Result, SndError, Solution, SolveStatus, Solver, SolverOptions};

/// A(0,0) and B(0,10), one plane, five units from A to B
pub fn scenario() -> InstanceDef {
    InstanceDef {
        cities: vec![
            City::new("A", 0.0, 0.0, CityRole::Ordinary),
            City::new("B", 0.0, 10.0, CityRole::Ordinary),
        ],
        fleet_size: 1,
        horizon: 3.0,
        resolution: 1.0,
        fuel_cost: 1.0,
        airport_cost: 0.0,
        plane_cost: 100.0,
        speed: 10.0,
        weight_limit: 5.0,
        demand: vec![DemandEntry {
            origin: "A".into(),
            destination: "B".into(),
            quantity: 5.0,
        }],
    }
}

/// The optimal assignment of `scenario`: fly at time 0 and wait at B
pub fn scenario_optimum() -> Vec<(&'static str, f64)> {
    vec![
        ("y_(A,0)_(B,1)", 1.0),
        ("y_(B,1)_(B,2)", 1.0),
        ("y_(B,2)_(B,3)", 1.0),
        ("x_A_(A,0)_(B,1)", 5.0),
        ("x_A_(B,1)_(B,2)", 5.0),
        ("x_A_(B,2)_(B,3)", 5.0),
    ]
}

/// A, a terminal T ten units further and B ten units beyond T. The only fast route
/// from A to B passes through T.
pub fn terminal_line(role: CityRole) -> InstanceDef {
    InstanceDef {
        cities: vec![
            City::new("A", 0.0, 0.0, CityRole::Ordinary),
            City::new("T", 0.0, 10.0, role),
            City::new("B", 0.0, 20.0, CityRole::Ordinary),
        ],
        horizon: 4.0,
        ..scenario()
    }
}

/// Sets all variables to zero except the named ones
pub fn assignment(model: &Model, named: &[(&str, f64)]) -> Assignment {
    let mut values: Assignment = model.variables().iter().map(|&v| (v, 0.0)).collect();
    for &(name, value) in named {
        let var = model
            .var_by_name(name)
            .unwrap_or_else(|| panic!("no variable {name}"));
        values.insert(var, value);
    }
    values
}

/// Returns a fixed assignment, looked up by variable name
pub struct FixedSolver {
    pub named: Vec<(&'static str, f64)>,
    pub calls: usize,
}

impl FixedSolver {
    pub fn new(named: Vec<(&'static str, f64)>) -> Self {
        FixedSolver { named, calls: 0 }
    }
}

impl Solver for FixedSolver {
    fn solve(&mut self, model: &Model, _: &SolverOptions) -> Result<Solution> {
        self.calls += 1;
        let values = assignment(model, &self.named);
        Ok(Solution {
            status: SolveStatus::Optimal,
            objective: model.objective_value(&values),
            values,
        })
    }
}

/// Always fails with the given error
pub struct FailingSolver {
    pub error: fn() -> SndError,
    pub calls: usize,
}

impl Solver for FailingSolver {
    fn solve(&mut self, _: &Model, _: &SolverOptions) -> Result<Solution> {
        self.calls += 1;
        Err((self.error)())
    }
}
