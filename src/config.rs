//! Run configuration, loadable from JSON.
use crate::problem::SineProblem;
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tpfa_sparse::solver::{Solver, SolverConfigError};

/// Name and string-keyed parameters of the linear solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub name: String,
    pub drop_tolerance: f64,
    pub absolute_tolerance: f64,
    pub relative_tolerance: f64,
    pub maximum_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            name: "bicgstab_ilu0".to_string(),
            drop_tolerance: 0.0,
            absolute_tolerance: 1e-14,
            relative_tolerance: 1e-10,
            maximum_iterations: 10000,
        }
    }
}

impl SolverConfig {
    /// The parameters in the form accepted by [`Solver::set_parameter`].
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("drop_tolerance", self.drop_tolerance.to_string()),
            ("absolute_tolerance", self.absolute_tolerance.to_string()),
            ("relative_tolerance", self.relative_tolerance.to_string()),
            ("maximum_iterations", self.maximum_iterations.to_string()),
        ]
    }

    pub fn build_solver(&self) -> Result<Solver, SolverConfigError> {
        let mut solver = Solver::new(&self.name)?;
        for (key, value) in self.parameters() {
            solver.set_parameter(key, &value)?;
        }
        Ok(solver)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub problem: SineProblem,
    pub solver: SolverConfig,
    /// Directory for result files. No files are written if `None`.
    pub output_dir: Option<PathBuf>,
    /// Continue with the remaining meshes of a batch after a failure.
    pub keep_going: bool,
}

impl RunConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents).wrap_err_with(|| format!("failed to parse config file {}", path.display()))
    }
}
