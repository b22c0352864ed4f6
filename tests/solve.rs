mod common;

use std::collections::HashMap;

use common::*;
use snd::network::ArcKind;
use snd::problem::CityRole;
use snd::solver::MicroLpSolver;
use snd::utils::approx_eq;
use snd::{Config, Problem, SndError, SndModel, SolveStatus, SolvedNetwork, TerminalPolicy};

fn solve_scenario(config: &Config) -> (SolvedNetwork, usize) {
    let problem = Problem::try_from(scenario()).unwrap();
    let model = SndModel::build(&problem, config).unwrap();
    let mut solver = FixedSolver::new(scenario_optimum());
    let solved = model.solve(&problem, &mut solver, config).unwrap();
    (solved, solver.calls)
}

#[test]
fn scenario_optimum_costs_110() {
    let (solved, calls) = solve_scenario(&Config::default());
    assert_eq!(calls, 1);
    assert_eq!(solved.objective, 110.0);
    assert_eq!(solved.planes_in_use(), 1.0);

    let flights: Vec<_> = solved
        .used_arcs()
        .filter(|arc| arc.kind == ArcKind::Flight)
        .collect();
    assert_eq!(flights.len(), 1);
    assert_eq!(solved.node_label(flights[0].from), "(A,0)");
    assert_eq!(flights[0].cargo["A"], 5.0);
}

#[test]
fn scenario_optimum_satisfies_the_model() {
    let problem = Problem::try_from(scenario()).unwrap();
    let config = Config::default();
    let model = SndModel::build(&problem, &config).unwrap();
    let values = assignment(&model.model, &scenario_optimum());
    assert!(model.check(&values, config.tolerance).is_empty());

    // without the plane there is no capacity for the cargo
    let mut named = scenario_optimum();
    named.retain(|(name, _)| *name != "y_(A,0)_(B,1)");
    let values = assignment(&model.model, &named);
    let violated: Vec<_> = model
        .check(&values, config.tolerance)
        .into_iter()
        .map(|v| v.name)
        .collect();
    assert!(violated.contains(&"capacity_(A,0)_(B,1)".to_string()));
    assert!(violated.contains(&"fleet_cycle".to_string()));
}

#[test]
fn projected_flows_are_conserved() {
    let (solved, _) = solve_scenario(&Config::default());
    let horizon = solved.nodes.iter().map(|n| n.time).max().unwrap();

    // net outflow of commodity A per node
    let mut net: HashMap<usize, f64> = HashMap::new();
    for arc in &solved.arcs {
        let q = arc.cargo.get("A").copied().unwrap_or(0.0);
        *net.entry(arc.from).or_default() += q;
        *net.entry(arc.to).or_default() -= q;
        if arc.kind == ArcKind::Flight {
            assert!(arc.total_cargo() <= 5.0 * arc.planes + 1e-9);
        }
    }
    for (i, node) in solved.nodes.iter().enumerate() {
        let expected = match (node.city.as_str(), node.time) {
            ("A", 0) => 5.0,
            ("B", t) if t == horizon => -5.0,
            _ => 0.0,
        };
        assert_eq!(net.get(&i).copied().unwrap_or(0.0), expected, "{:?}", node);
    }

    let arriving: f64 = solved
        .arcs
        .iter()
        .filter(|arc| solved.nodes[arc.to].time == horizon)
        .map(|arc| arc.planes)
        .sum();
    assert_eq!(arriving, solved.planes_in_use());
}

#[test]
fn unpruned_model_accepts_the_same_assignment() {
    let config = Config {
        prune_unreachable: false,
        ..Config::default()
    };
    let problem = Problem::try_from(scenario()).unwrap();
    let pruned = SndModel::build(&problem, &Config::default()).unwrap();
    let full = SndModel::build(&problem, &config).unwrap();
    // every commodity on every arc
    assert_eq!(full.variables.x.len(), 2 * full.network.arcs().len());
    assert!(full.variables.x.len() > pruned.variables.x.len());

    let (solved, _) = solve_scenario(&config);
    assert_eq!(solved.objective, 110.0);
}

#[test]
fn unreachable_demand_is_reported_before_solving() {
    let mut def = scenario();
    def.speed = 1.0;
    let problem = Problem::try_from(def).unwrap();

    let err = SndModel::build(&problem, &Config::default())
        .err()
        .expect("the demand can not be routed");
    match err {
        SndError::UnreachableDemand {
            origin,
            destination,
        } => {
            assert_eq!(origin, "A");
            assert_eq!(destination, "B");
        }
        other => panic!("unexpected error {other}"),
    }

    let mut solver = FixedSolver::new(scenario_optimum());
    let result = snd::solve(&problem, &mut solver, &Config::default());
    assert!(matches!(result, Err(SndError::UnreachableDemand { .. })));
    assert_eq!(solver.calls, 0);
}

#[test]
fn solver_errors_are_passed_through_once() {
    let problem = Problem::try_from(scenario()).unwrap();
    let model = SndModel::build(&problem, &Config::default()).unwrap();

    let mut solver = FailingSolver {
        error: || SndError::SolverInfeasible("INFEASIBLE".to_string()),
        calls: 0,
    };
    let result = model.solve(&problem, &mut solver, &Config::default());
    assert!(matches!(result, Err(SndError::SolverInfeasible(_))));
    assert_eq!(solver.calls, 1);

    let mut solver = FailingSolver {
        error: || SndError::SolverTimeout(1.0),
        calls: 0,
    };
    let result = model.solve(&problem, &mut solver, &Config::default());
    assert!(matches!(result, Err(SndError::SolverTimeout(_))));
    assert_eq!(solver.calls, 1);
}

#[test]
fn invalid_parameters_abort_the_build() {
    let mut def = scenario();
    def.resolution = 0.0;
    assert!(matches!(
        Problem::try_from(def),
        Err(SndError::InvalidParameter { .. })
    ));

    // finite, but far too many time steps to build
    let mut def = scenario();
    def.horizon = 1e300;
    assert!(matches!(
        Problem::try_from(def),
        Err(SndError::InvalidParameter { .. })
    ));

    let mut def = scenario();
    def.cities[1].location = snd::geometry::Point(f64::NAN, 0.0);
    assert!(matches!(
        Problem::try_from(def),
        Err(SndError::InvalidParameter { .. })
    ));
}

/// Through T at times 1 and 2, then waiting at B
fn via_terminal() -> Vec<(&'static str, f64)> {
    vec![
        ("y_(A,0)_(T,1)", 1.0),
        ("y_(T,1)_(B,2)", 1.0),
        ("y_(B,2)_(B,3)", 1.0),
        ("y_(B,3)_(B,4)", 1.0),
        ("x_A_(A,0)_(T,1)", 5.0),
        ("x_A_(T,1)_(B,2)", 5.0),
        ("x_A_(B,2)_(B,3)", 5.0),
        ("x_A_(B,3)_(B,4)", 5.0),
    ]
}

/// Directly from A to B, then waiting
fn direct() -> Vec<(&'static str, f64)> {
    vec![
        ("y_(A,0)_(B,2)", 1.0),
        ("y_(B,2)_(B,3)", 1.0),
        ("y_(B,3)_(B,4)", 1.0),
        ("x_A_(A,0)_(B,2)", 5.0),
        ("x_A_(B,2)_(B,3)", 5.0),
        ("x_A_(B,3)_(B,4)", 5.0),
    ]
}

#[test]
fn terminals_do_not_transship() {
    let config = Config::default();
    let problem = Problem::try_from(terminal_line(CityRole::Terminal)).unwrap();
    let model = SndModel::build(&problem, &config).unwrap();

    let values = assignment(&model.model, &via_terminal());
    let violated: Vec<_> = model
        .check(&values, config.tolerance)
        .into_iter()
        .map(|v| v.name)
        .collect();
    assert_eq!(violated, vec!["terminal_out_A_(T,1)_(B,2)".to_string()]);

    let values = assignment(&model.model, &direct());
    assert!(model.check(&values, config.tolerance).is_empty());
    assert_eq!(model.model.objective_value(&values), 120.0);
}

#[test]
fn hubs_may_transship() {
    let config = Config::default();
    let problem = Problem::try_from(terminal_line(CityRole::Hub)).unwrap();
    let model = SndModel::build(&problem, &config).unwrap();

    let values = assignment(&model.model, &via_terminal());
    assert!(model.check(&values, config.tolerance).is_empty());
    assert_eq!(model.model.objective_value(&values), 120.0);
}

#[test]
fn bidirectional_policy_keeps_own_deliveries() {
    let config = Config {
        terminal_policy: TerminalPolicy::Bidirectional,
        ..Config::default()
    };
    let mut def = terminal_line(CityRole::Terminal);
    def.demand[0].destination = "T".into();
    let problem = Problem::try_from(def).unwrap();
    let model = SndModel::build(&problem, &config).unwrap();

    // A's cargo is allowed into T because T is its destination
    let values = assignment(
        &model.model,
        &[
            ("y_(A,0)_(T,1)", 1.0),
            ("y_(T,1)_(T,2)", 1.0),
            ("y_(T,2)_(T,3)", 1.0),
            ("y_(T,3)_(T,4)", 1.0),
            ("x_A_(A,0)_(T,1)", 5.0),
            ("x_A_(T,1)_(T,2)", 5.0),
            ("x_A_(T,2)_(T,3)", 5.0),
            ("x_A_(T,3)_(T,4)", 5.0),
        ],
    );
    assert!(model.check(&values, config.tolerance).is_empty());
    assert!(!model
        .model
        .constrs()
        .iter()
        .any(|c| c.name.starts_with("terminal_in_A_")));
}

fn solve_with_microlp(def: snd::InstanceDef, config: &Config) -> snd::Result<SolvedNetwork> {
    let problem = Problem::try_from(def).unwrap();
    snd::solve(&problem, MicroLpSolver, config)
}

#[test]
fn microlp_finds_the_scenario_optimum() {
    let solved = solve_with_microlp(scenario(), &Config::default()).unwrap();
    assert_eq!(solved.status, SolveStatus::Optimal);
    assert!(approx_eq(solved.objective, 110.0, 1e-6));
    assert!(approx_eq(solved.planes_in_use(), 1.0, 1e-6));

    // waiting at A before flying costs the same, but there is exactly one flight
    let flights: Vec<_> = solved
        .used_arcs()
        .filter(|arc| arc.kind == ArcKind::Flight)
        .collect();
    assert_eq!(flights.len(), 1);
    assert_eq!(solved.nodes[flights[0].from].city, "A");
    assert_eq!(solved.nodes[flights[0].to].city, "B");
    assert!(approx_eq(flights[0].cargo["A"], 5.0, 1e-6));
}

#[test]
fn microlp_flies_at_time_zero_when_it_must() {
    let mut def = scenario();
    def.horizon = 1.0;
    let solved = solve_with_microlp(def, &Config::default()).unwrap();

    assert!(approx_eq(solved.objective, 110.0, 1e-6));
    let used: Vec<_> = solved.used_arcs().collect();
    assert_eq!(used.len(), 1);
    assert_eq!(solved.node_label(used[0].from), "(A,0)");
    assert_eq!(solved.node_label(used[0].to), "(B,1)");
    assert!(approx_eq(used[0].planes, 1.0, 1e-6));
    assert!(approx_eq(used[0].cargo["A"], 5.0, 1e-6));
}

#[test]
fn microlp_respects_terminals() {
    let config = Config::default();
    let solved = solve_with_microlp(terminal_line(CityRole::Terminal), &config).unwrap();
    assert!(approx_eq(solved.objective, 120.0, 1e-6));
    for arc in &solved.arcs {
        if arc.kind == ArcKind::Flight && solved.nodes[arc.from].city == "T" {
            assert!(arc.cargo.get("A").copied().unwrap_or(0.0) < 1e-6);
        }
    }

    let hub = solve_with_microlp(terminal_line(CityRole::Hub), &Config::default()).unwrap();
    assert!(approx_eq(hub.objective, 120.0, 1e-6));
}

#[test]
fn microlp_matches_with_and_without_pruning() {
    let config = Config {
        prune_unreachable: false,
        ..Config::default()
    };
    let solved = solve_with_microlp(scenario(), &config).unwrap();
    assert!(approx_eq(solved.objective, 110.0, 1e-6));
}

#[test]
fn microlp_reports_infeasibility() {
    // one plane can only shuttle two loads of one unit within the horizon
    let mut def = scenario();
    def.weight_limit = 1.0;
    let result = solve_with_microlp(def, &Config::default());
    assert!(matches!(result, Err(SndError::SolverInfeasible(_))));
}
