//! Python bindings for ElasticSim via PyO3.
//!
//! Exposes the scheduling policies, the online controller, and full
//! config-driven runs to Python scripts.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use elasticsim_core::config::SimConfig;
use elasticsim_core::metrics::ScheduleReport;
use elasticsim_scheduler::{FleetCapacity, LoadSample, OnlineSignal};

fn value_error<E: std::fmt::Display>(e: E) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn to_samples(loads: &[f64]) -> Vec<LoadSample> {
    loads.iter().copied().map(LoadSample::new).collect()
}

/// Python-accessible schedule report.
#[pyclass]
#[derive(Clone)]
struct Report {
    inner: ScheduleReport,
}

#[pymethods]
impl Report {
    #[getter]
    fn name(&self) -> String {
        self.inner.name.clone()
    }

    #[getter]
    fn policy(&self) -> String {
        self.inner.policy.clone()
    }

    #[getter]
    fn steps(&self) -> u64 {
        self.inner.steps
    }

    #[getter]
    fn total_servers(&self) -> u32 {
        self.inner.total_servers
    }

    #[getter]
    fn active_p50(&self) -> f64 {
        self.inner.active_servers.p50
    }

    #[getter]
    fn active_p90(&self) -> f64 {
        self.inner.active_servers.p90
    }

    #[getter]
    fn active_p99(&self) -> f64 {
        self.inner.active_servers.p99
    }

    #[getter]
    fn active_mean(&self) -> f64 {
        self.inner.active_servers.mean
    }

    #[getter]
    fn server_steps_saved(&self) -> u64 {
        self.inner.server_steps_saved
    }

    #[getter]
    fn transitions(&self) -> u64 {
        self.inner.transitions
    }

    #[getter]
    fn max_transition(&self) -> u32 {
        self.inner.max_transition
    }

    #[getter]
    fn budget_violations(&self) -> u64 {
        self.inner.budget_violations
    }

    #[getter]
    fn shortfall_events(&self) -> u64 {
        self.inner.shortfall_events
    }

    #[getter]
    fn total_deficit(&self) -> u64 {
        self.inner.total_deficit
    }

    #[getter]
    fn energy_savings(&self) -> f64 {
        self.inner.energy.savings
    }

    /// Pretty-print a summary table.
    fn summary(&self) -> String {
        elasticsim_core::metrics::format_table(&self.inner)
    }

    /// Serialize the report to JSON.
    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string_pretty(&self.inner).map_err(value_error)
    }

    fn __repr__(&self) -> String {
        format!(
            "Report(policy='{}', steps={}, active_p50={:.1}, transitions={}, shortfalls={})",
            self.inner.policy,
            self.inner.steps,
            self.inner.active_servers.p50,
            self.inner.transitions,
            self.inner.shortfall_events,
        )
    }
}

/// Online controller for step-by-step use from Python.
///
/// `step` never changes the active count; call `set_active` to apply an
/// adjustment before the next step.
#[pyclass(name = "OnlineController")]
struct PyOnlineController {
    inner: elasticsim_scheduler::OnlineController,
}

#[pymethods]
impl PyOnlineController {
    #[new]
    #[pyo3(signature = (total_servers, utilization_threshold, kappa, initial_active=None))]
    fn new(
        total_servers: u32,
        utilization_threshold: f64,
        kappa: f64,
        initial_active: Option<u32>,
    ) -> PyResult<Self> {
        let capacity =
            FleetCapacity::new(total_servers, utilization_threshold).map_err(value_error)?;
        let inner = elasticsim_scheduler::OnlineController::new(
            capacity,
            kappa,
            initial_active.unwrap_or(total_servers),
        )
        .map_err(value_error)?;
        Ok(Self { inner })
    }

    #[getter]
    fn current_active(&self) -> u32 {
        self.inner.current_active()
    }

    #[getter]
    fn spare_target(&self) -> u32 {
        self.inner.spare_target()
    }

    fn set_active(&mut self, active: u32) -> PyResult<()> {
        self.inner.set_active(active).map_err(value_error)
    }

    /// Feed one sample. Returns a dict with the demand and the signal.
    fn step<'py>(&self, py: Python<'py>, step: u64, load: f64) -> PyResult<Bound<'py, PyDict>> {
        let outcome = self
            .inner
            .step_online(step, LoadSample::new(load))
            .map_err(value_error)?;

        let dict = PyDict::new_bound(py);
        dict.set_item("step", outcome.time_index)?;
        dict.set_item("demand", outcome.demand)?;
        dict.set_item("active_servers", outcome.active_servers)?;
        dict.set_item("signal", outcome.signal.name())?;
        match outcome.signal {
            OnlineSignal::Shortfall { deficit } => dict.set_item("deficit", deficit)?,
            OnlineSignal::SpareRuleEnded { spare, target } => {
                dict.set_item("spare", spare)?;
                dict.set_item("target", target)?;
            }
            OnlineSignal::Hibernate { first, last } => {
                dict.set_item("first", first)?;
                dict.set_item("last", last)?;
            }
            OnlineSignal::Balanced => {}
        }
        Ok(dict)
    }
}

/// Active-server count per step for already-normalized loads.
#[pyfunction]
fn compute_schedule(loads: Vec<f64>, total_servers: u32, threshold: f64) -> PyResult<Vec<u32>> {
    let capacity = FleetCapacity::new(total_servers, threshold).map_err(value_error)?;
    let decisions = elasticsim_scheduler::compute_schedule(&to_samples(&loads), &capacity)
        .map_err(value_error)?;
    Ok(decisions.into_iter().map(|d| d.active_servers).collect())
}

/// Active-server counts and interior transition magnitudes.
#[pyfunction]
fn compute_transitions(
    loads: Vec<f64>,
    total_servers: u32,
    threshold: f64,
) -> PyResult<(Vec<u32>, Vec<u32>)> {
    let capacity = FleetCapacity::new(total_servers, threshold).map_err(value_error)?;
    let schedule =
        elasticsim_scheduler::compute_schedule_with_transitions(&to_samples(&loads), &capacity)
            .map_err(value_error)?;
    Ok((
        schedule.decisions.iter().map(|d| d.active_servers).collect(),
        schedule.transitions.iter().map(|t| t.delta).collect(),
    ))
}

fn load_inputs(config: &str, trace: &str) -> PyResult<(SimConfig, elasticsim_core::LoadTrace)> {
    let sim_config = SimConfig::from_file(std::path::Path::new(config)).map_err(value_error)?;
    let topology = sim_config.topology().map_err(value_error)?;
    let load = elasticsim_core::load_trace(
        std::path::Path::new(trace),
        &sim_config.trace.format,
        &topology,
    )
    .map_err(value_error)?;
    Ok((sim_config, load))
}

/// Run one policy from a config file and a trace file.
#[pyfunction]
#[pyo3(signature = (config, trace, policy="transitions"))]
fn run(config: &str, trace: &str, policy: &str) -> PyResult<Report> {
    let (sim_config, load) = load_inputs(config, trace)?;
    let policy = elasticsim_scheduler::policy_by_name(policy)
        .ok_or_else(|| PyValueError::new_err(format!("Unknown policy: {policy}")))?;
    let outcome = elasticsim_core::run_schedule(sim_config, &load, policy).map_err(value_error)?;
    Ok(Report {
        inner: outcome.report,
    })
}

/// Compare multiple policies on the same config and trace.
#[pyfunction]
fn compare(config: &str, trace: &str, policies: Vec<String>) -> PyResult<Vec<Report>> {
    let (sim_config, load) = load_inputs(config, trace)?;
    let names: Vec<&str> = policies.iter().map(|s| s.as_str()).collect();
    let reports =
        elasticsim_core::compare_policies(&sim_config, &load, &names).map_err(value_error)?;
    Ok(reports.into_iter().map(|r| Report { inner: r }).collect())
}

/// List available policy names.
#[pyfunction]
fn list_policies() -> Vec<String> {
    elasticsim_scheduler::available_policies()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Python module definition.
#[pymodule]
fn elasticsim(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compute_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(compute_transitions, m)?)?;
    m.add_function(wrap_pyfunction!(run, m)?)?;
    m.add_function(wrap_pyfunction!(compare, m)?)?;
    m.add_function(wrap_pyfunction!(list_policies, m)?)?;
    m.add_class::<Report>()?;
    m.add_class::<PyOnlineController>()?;
    Ok(())
}
