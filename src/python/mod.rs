use std::fmt::Debug;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::Config;
use crate::models::SndModel;
use crate::parse::read_instance;

pub fn pyerr<D: Debug>(err: D) -> PyErr {
    PyErr::new::<PyValueError, _>(format!("{:?}", err))
}

fn config(json: Option<&str>) -> PyResult<Config> {
    match json {
        Some(json) => serde_json::from_str(json).map_err(pyerr),
        None => Ok(Config::default()),
    }
}

/// Solves the instance at `path` and returns the solved network as JSON
#[pyfunction]
pub fn solve(path: &str, config_json: Option<&str>) -> PyResult<String> {
    let config = config(config_json)?;
    let problem = read_instance(path).map_err(pyerr)?;
    let model = SndModel::build(&problem, &config).map_err(pyerr)?;
    let solver = config.solver.create().map_err(pyerr)?;
    let solved = model.solve(&problem, solver, &config).map_err(pyerr)?;
    serde_json::to_string(&solved).map_err(pyerr)
}

/// Builds the model for the instance at `path` and writes it to `out`, in the format
/// given by the extension of `out`
#[pyfunction]
pub fn write_model(path: &str, out: &str, config_json: Option<&str>) -> PyResult<()> {
    let config = config(config_json)?;
    let problem = read_instance(path).map_err(pyerr)?;
    let model = SndModel::build(&problem, &config).map_err(pyerr)?;

    #[cfg(feature = "gurobi")]
    {
        let solver = crate::solver::GurobiSolver::new().map_err(pyerr)?;
        solver.write(&model.model, out).map_err(pyerr)
    }

    #[cfg(not(feature = "gurobi"))]
    {
        let _ = (model, out);
        Err(PyValueError::new_err(
            "writing models needs Gurobi, rebuild with the `gurobi` feature",
        ))
    }
}

/// The name of this function must match the `lib.name` setting in the `Cargo.toml`,
/// else Python will not be able to import the module.
#[pymodule]
fn snd(_py: Python, m: &PyModule) -> PyResult<()> {
    pyo3_log::init();
    m.add_function(wrap_pyfunction!(solve, m)?)?;
    m.add_function(wrap_pyfunction!(write_model, m)?)?;
    Ok(())
}
