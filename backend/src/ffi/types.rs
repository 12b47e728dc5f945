//! Type conversion utilities for the FFI boundary
//!
//! Converts engine results into PyO3-compatible types (PyDict, PyList).
//! Tensors cross as flat row-major lists alongside their shape so Python
//! callers can reshape with numpy if they want to.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::engine::{EngineError, RunReport};
use crate::models::cost::{ResultSet, Totals};
use crate::models::history::HistoryStamp;
use crate::tensor::Tensor;

/// Flatten a tensor into a row-major list for Python
pub fn tensor_to_py(tensor: &Tensor) -> Vec<f64> {
    tensor.iter().copied().collect()
}

pub fn report_to_py(py: Python, report: &RunReport) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("run_id", report.run_id.to_string())?;
    dict.set_item("steps_requested", report.steps_requested)?;
    dict.set_item("steps_taken", report.steps_taken)?;
    dict.set_item("final_timestep", report.final_timestep)?;
    dict.set_item("total_population", report.total_population)?;
    Ok(dict.unbind())
}

pub fn stamp_to_py(py: Python, timestep: usize, stamp: &HistoryStamp) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("timestep", timestep)?;
    dict.set_item("state", tensor_to_py(&stamp.state))?;
    dict.set_item("overdoses", tensor_to_py(&stamp.overdoses))?;
    dict.set_item("fatal_overdoses", tensor_to_py(&stamp.fatal_overdoses))?;
    dict.set_item(
        "intervention_admissions",
        tensor_to_py(&stamp.intervention_admissions),
    )?;
    dict.set_item("mortality", tensor_to_py(&stamp.mortality))?;
    Ok(dict.unbind())
}

fn result_set_to_py(py: Python, results: &ResultSet) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("summed_costs", results.summed_costs.clone())?;
    dict.set_item("total_cost", results.total_cost())?;
    dict.set_item("summed_life_years", results.summed_life_years)?;
    dict.set_item("summed_utility", results.summed_utility)?;
    Ok(dict.unbind())
}

pub fn totals_to_py(py: Python, totals: &Totals) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("base", result_set_to_py(py, &totals.base)?)?;
    dict.set_item("discounted", result_set_to_py(py, &totals.discounted)?)?;
    Ok(dict.unbind())
}

/// Map engine failures onto RuntimeError for Python callers
pub fn engine_error(err: EngineError) -> PyErr {
    PyRuntimeError::new_err(format!("simulation failed: {err}"))
}

/// Map bad inputs (config, lookups) onto ValueError
pub fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}
