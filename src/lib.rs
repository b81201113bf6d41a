//! Cell-centered finite volumes with a two-point flux approximation for steady anisotropic
//! diffusion on polygonal meshes in 2D.
//!
//! A run proceeds in the following steps:
//!
//! 1. [`initialize::initialize_fields`] evaluates the diffusion tensor, source and analytical
//!    solution on the cells, boundary conditions on the boundary faces and interface
//!    conductivities on the internal faces,
//! 2. [`assembly::assemble_global_system`] builds the sparse system,
//! 3. [`driver::Problem::run`] solves it with a [`tpfa_sparse`] solver and computes the error
//!    with respect to the analytical solution.
pub mod assembly;
pub mod config;
pub mod driver;
pub mod error;
pub mod field;
pub mod initialize;
pub mod io;
pub mod mesh;
pub mod problem;
pub mod tensor;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
pub extern crate tpfa_sparse;
pub extern crate vtkio;
