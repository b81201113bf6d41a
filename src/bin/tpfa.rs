//! Solves the manufactured sine problem with the two-point flux approximation on each given
//! mesh and reports the error with respect to the analytical solution.
use clap::Parser;
use env_logger::Env;
use eyre::{eyre, Context};
use log::warn;
use std::io::{self, Write};
use std::path::PathBuf;
use tpfa::config::RunConfig;
use tpfa::driver::{run_batch, BatchSummary, RunError, RunReport};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Mesh files (.msh or .vtk) to process one after another.
    #[arg(required = true, value_name = "MESH")]
    meshes: Vec<PathBuf>,

    /// JSON file with a run configuration. Command-line options take precedence.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Solver name: cg, cg_ilu0, bicgstab or bicgstab_ilu0.
    #[arg(long)]
    solver: Option<String>,

    #[arg(long)]
    drop_tolerance: Option<f64>,

    #[arg(long)]
    absolute_tolerance: Option<f64>,

    #[arg(long)]
    relative_tolerance: Option<f64>,

    #[arg(long = "max-iterations")]
    maximum_iterations: Option<usize>,

    #[arg(long)]
    dxx: Option<f64>,

    #[arg(long)]
    dyy: Option<f64>,

    #[arg(long)]
    dxy: Option<f64>,

    /// Wave number `a` of the analytical solution sin(ax) sin(ay).
    #[arg(long)]
    wave_number: Option<f64>,

    /// Directory for `<mesh>_res.vtk` result files [default: .]
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Do not write result files.
    #[arg(long)]
    no_output: bool,

    /// Continue with the remaining meshes after a failure.
    #[arg(long)]
    keep_going: bool,

    /// Write the reports of all successful runs to this JSON file.
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

impl Args {
    fn run_config(&self) -> eyre::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig::default(),
        };

        let solver = &mut config.solver;
        if let Some(name) = &self.solver {
            solver.name = name.clone();
        }
        let overrides = [
            (&mut solver.drop_tolerance, self.drop_tolerance),
            (&mut solver.absolute_tolerance, self.absolute_tolerance),
            (&mut solver.relative_tolerance, self.relative_tolerance),
        ];
        for (value, arg) in overrides {
            if let Some(arg) = arg {
                *value = arg;
            }
        }
        if let Some(max_iter) = self.maximum_iterations {
            solver.maximum_iterations = max_iter;
        }

        let problem = &mut config.problem;
        let overrides = [
            (&mut problem.dxx, self.dxx),
            (&mut problem.dyy, self.dyy),
            (&mut problem.dxy, self.dxy),
            (&mut problem.a, self.wave_number),
        ];
        for (value, arg) in overrides {
            if let Some(arg) = arg {
                *value = arg;
            }
        }

        if self.no_output {
            config.output_dir = None;
        } else if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        } else if config.output_dir.is_none() {
            config.output_dir = Some(PathBuf::from("."));
        }
        config.keep_going |= self.keep_going;

        // Fail early on an invalid solver configuration
        config.solver.build_solver()?;
        Ok(config)
    }
}

fn write_result(out: &mut impl Write, result: &Result<RunReport, RunError>) -> io::Result<()> {
    match result {
        Ok(report) => {
            writeln!(out, "N = {}", report.num_unknowns)?;
            writeln!(out, "Number of iterations: {}", report.iterations)?;
            writeln!(out, "Residual:             {:e}", report.residual)?;
            writeln!(out)?;
            writeln!(out, "Error C-norm:  {:e}", report.norms.c_norm)?;
            writeln!(out, "Error L2-norm: {:e}", report.norms.l2_norm)?;
            writeln!(out, "Success")?;
            writeln!(out)?;
        }
        Err(RunError::Solver {
            num_unknowns,
            iterations,
            residual,
            reason,
        }) => {
            writeln!(out, "N = {}", num_unknowns)?;
            writeln!(out, "Number of iterations: {}", iterations)?;
            writeln!(out, "Residual:             {:e}", residual)?;
            writeln!(out, "Linear solver failed: {}", reason)?;
        }
        // Logged by the driver
        Err(_) => {}
    }
    Ok(())
}

/// Turns the batch outcome into the process result, which is an error if any mesh failed.
fn batch_result(summary: &BatchSummary, num_meshes: usize) -> eyre::Result<()> {
    if summary.is_success() {
        return Ok(());
    }
    match summary.failures.first() {
        Some((path, message)) => Err(eyre!(
            "{} of {} meshes failed, first failure in {}: {}",
            summary.failures.len(),
            num_meshes,
            path.display(),
            message
        )),
        None => Err(eyre!("{} of {} meshes were skipped", summary.num_skipped, num_meshes)),
    }
}

fn main() -> eyre::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = args.run_config()?;
    let summary = run_batch(&args.meshes, &config, |_, result| {
        if let Err(err) = write_result(&mut io::stdout().lock(), result) {
            warn!("failed to write result to stdout: {}", err);
        }
    });

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&summary.reports)?;
        std::fs::write(path, json).wrap_err_with(|| format!("failed to write report {}", path.display()))?;
    }

    batch_result(&summary, args.meshes.len())
}
