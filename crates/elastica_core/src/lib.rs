//! Core library for the elastica large-deflection beam solver.
//!
//! A slender elastic beam under self-weight is chained out of closed-form
//! elements: each element carries a constant-curvature circular arc (base
//! solution) plus a linearized perturbation for the distributed load
//! (correction solution), composed into the authoritative global state at
//! every node. A damped shooting controller searches for the initial tangent
//! angle that returns the far end to the support line.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction for f64/f32 pipelines).
//! - **Params**: the validated problem description.
//! - **Link**: per-element transfer functions (arc, perturbation, compose).
//! - **Solver**: the chain traverser owning the element array.
//! - **Fit**: the shooting controller driven at host cadence.
//! - **Session**: the persisted record an external host round-trips.

pub mod element;
pub mod error;
pub mod fit;
pub mod link;
pub mod params;
pub mod session;
pub mod solver;
pub mod traits;

pub use element::{BaseSolution, Basis, CorrSolution, Element, FullSolution};
pub use error::ParamsError;
pub use fit::{fit_update, FitController, FitSettings, FitStatus, FitStep};
pub use params::{CorrectionModel, ProblemParams};
pub use session::{SavedSession, SolverParams, VisualParams};
pub use solver::Solver;
pub use traits::Scalar;
