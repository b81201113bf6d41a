//! Solving a diffusion problem on a mesh and verifying the result against the analytical
//! solution.
use crate::assembly::{assemble_global_system, AssemblyError};
use crate::config::RunConfig;
use crate::error::{estimate_error_norms, ErrorNorms};
use crate::initialize::{initialize_fields, ProblemFields};
use crate::io::load_mesh;
use crate::io::vtk::PolyMeshDataSetBuilder;
use crate::mesh::{PolyMesh2d, TopologyError};
use crate::problem::DiffusionProblem;
use log::{debug, error, info};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use tpfa_sparse::solver::SolverConfigError;

#[derive(Debug)]
pub enum RunError {
    /// The mesh could not be loaded.
    Mesh(eyre::Report),
    Topology(TopologyError),
    Assembly(AssemblyError),
    Config(SolverConfigError),
    /// The linear solver did not converge.
    Solver {
        num_unknowns: usize,
        iterations: usize,
        residual: f64,
        reason: String,
    },
    /// The result file could not be written.
    Output(eyre::Report),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mesh(err) => write!(f, "failed to load mesh: {:#}", err),
            Self::Topology(err) => write!(f, "invalid mesh topology: {}", err),
            Self::Assembly(err) => write!(f, "assembly failed: {}", err),
            Self::Config(err) => write!(f, "invalid solver configuration: {}", err),
            Self::Solver { reason, .. } => write!(f, "Linear solver failed: {}", reason),
            Self::Output(err) => write!(f, "failed to write result: {:#}", err),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Topology(err) => Some(err),
            Self::Assembly(err) => Some(err),
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TopologyError> for RunError {
    fn from(err: TopologyError) -> Self {
        Self::Topology(err)
    }
}

impl From<AssemblyError> for RunError {
    fn from(err: AssemblyError) -> Self {
        Self::Assembly(err)
    }
}

impl From<SolverConfigError> for RunError {
    fn from(err: SolverConfigError) -> Self {
        Self::Config(err)
    }
}

/// Summary of a successful run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub name: String,
    pub num_unknowns: usize,
    pub iterations: usize,
    pub residual: f64,
    pub norms: ErrorNorms<f64>,
    pub output_path: Option<PathBuf>,
}

/// A diffusion problem posed on a mesh, together with its initialized fields.
pub struct Problem<P> {
    name: String,
    mesh: PolyMesh2d<f64>,
    problem: P,
    fields: ProblemFields<f64>,
}

impl<P: DiffusionProblem<f64>> Problem<P> {
    /// Initializes the fields of `problem` on `mesh`.
    ///
    /// The name is used for the result file.
    pub fn new(name: impl Into<String>, mesh: PolyMesh2d<f64>, problem: P) -> Result<Self, TopologyError> {
        let fields = initialize_fields(&mesh, &problem)?;
        Ok(Self {
            name: name.into(),
            mesh,
            problem,
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &PolyMesh2d<f64> {
        &self.mesh
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn fields(&self) -> &ProblemFields<f64> {
        &self.fields
    }

    pub fn num_unknowns(&self) -> usize {
        self.fields.num_unknowns
    }

    /// Assembles and solves the global system, then compares the solution with the
    /// analytical solution.
    ///
    /// The `Concentration` field is only written if the solver converges. If an output
    /// directory is configured, the mesh and all fields are saved to `<name>_res.vtk`.
    pub fn run(&mut self, config: &RunConfig) -> Result<RunReport, RunError> {
        let n = self.num_unknowns();
        info!("{}: N = {}", self.name, n);
        self.fields.concentration.clear();

        let (matrix, rhs) = assemble_global_system(&self.mesh, &self.fields)?;
        debug!("Assembled system with {} nonzeros", matrix.nnz());

        let solver = config.solver.build_solver()?;
        let mut solution = DVector::zeros(n);
        let report = solver.solve(&matrix, &rhs, &mut solution);
        info!(
            "{}: {} iterations, residual {:e}",
            self.name, report.iterations, report.residual
        );
        if !report.converged {
            return Err(RunError::Solver {
                num_unknowns: n,
                iterations: report.iterations,
                residual: report.residual,
                reason: report.reason.unwrap_or_else(|| "unknown reason".to_string()),
            });
        }

        for cell in 0..self.mesh.num_cells() {
            let value = solution[self.fields.global_index[cell]];
            self.fields.concentration.insert(cell, value);
        }
        let norms = estimate_error_norms(&self.mesh, &self.fields.concentration, &self.fields.analytical)
            .expect("Every cell must hold a computed value after write-back");
        info!(
            "{}: C-norm error {:e}, L2-norm error {:e}",
            self.name, norms.c_norm, norms.l2_norm
        );

        let output_path = match &config.output_dir {
            Some(dir) => {
                let path = dir.join(format!("{}_res.vtk", self.name));
                self.save_vtk(&path).map_err(RunError::Output)?;
                Some(path)
            }
            None => None,
        };

        Ok(RunReport {
            name: self.name.clone(),
            num_unknowns: n,
            iterations: report.iterations,
            residual: report.residual,
            norms,
            output_path,
        })
    }

    /// Saves the mesh with all cell and face fields as a legacy VTK file.
    pub fn save_vtk(&self, path: impl AsRef<Path>) -> eyre::Result<()> {
        let fields = &self.fields;
        let boundary_values = fields.boundary_values();
        PolyMeshDataSetBuilder::from_mesh(&self.mesh)
            .with_title(self.name.as_str())
            .with_cell_attribute(&fields.concentration)
            .with_cell_attribute(&fields.diffusion_tensor)
            .with_cell_attribute(&fields.source)
            .with_cell_attribute(&fields.analytical)
            .with_cell_attribute(&fields.global_index)
            .with_face_attribute(&fields.boundary_conditions)
            .with_face_attribute(&boundary_values)
            .with_face_attribute(&fields.conductivity)
            .try_export(path)
    }
}

/// Loads the mesh at `path` and runs the configured sine problem on it.
pub fn run_mesh_file(path: &Path, config: &RunConfig) -> Result<RunReport, RunError> {
    let mesh = load_mesh(path).map_err(RunError::Mesh)?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "mesh".to_string());
    let mut problem = Problem::new(name, mesh, config.problem)?;
    problem.run(config)
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub reports: Vec<RunReport>,
    /// Meshes that failed, with the error message.
    pub failures: Vec<(PathBuf, String)>,
    /// Meshes that were not attempted because an earlier mesh failed.
    pub num_skipped: usize,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.num_skipped == 0
    }
}

/// Processes meshes one after another, each with a freshly loaded mesh and fresh fields.
///
/// `on_result` is called after every mesh. The batch stops at the first failure unless
/// `config.keep_going` is set.
pub fn run_batch<F>(paths: &[PathBuf], config: &RunConfig, mut on_result: F) -> BatchSummary
where
    F: FnMut(&Path, &Result<RunReport, RunError>),
{
    let mut summary = BatchSummary::default();
    for (i, path) in paths.iter().enumerate() {
        info!("Processing mesh {}", path.display());
        let result = run_mesh_file(path, config);
        on_result(path, &result);
        match result {
            Ok(report) => summary.reports.push(report),
            Err(err) => {
                error!("{}: {}", path.display(), err);
                summary.failures.push((path.clone(), err.to_string()));
                if !config.keep_going {
                    summary.num_skipped = paths.len() - i - 1;
                    break;
                }
            }
        }
    }
    summary
}
