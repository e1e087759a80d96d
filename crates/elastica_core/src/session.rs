//! Saved-session record: everything an external host needs to resume a
//! solved or unsolved problem, in the JSON shape the companion plotting
//! tooling reads (`visual_params` / `solver_params` / `problem` / `solution`
//! plus an optional dense `solution_seg` polyline).

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::fit::FitSettings;
use crate::params::ProblemParams;
use crate::solver::Solver;
use crate::traits::Scalar;

/// Display-side parameters carried through the session but never read by the
/// solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualParams<T> {
    pub zoom: T,
    pub look_at: [T; 2],
    /// Line segments rendered per element.
    pub segments: usize,
}

impl<T: Scalar> Default for VisualParams<T> {
    fn default() -> Self {
        VisualParams {
            zoom: T::one(),
            look_at: [T::zero(), T::zero()],
            segments: 16,
        }
    }
}

/// Controller-side parameters of the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverParams<T> {
    pub fit: FitSettings<T>,
    /// Whether the host had auto-fit running.
    pub auto_fit: bool,
    /// Whether `solution` was fully traversed when captured.
    pub solved: bool,
}

/// Complete persisted state of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession<T> {
    pub visual_params: VisualParams<T>,
    pub solver_params: SolverParams<T>,
    pub problem: ProblemParams<T>,
    pub solution: Vec<Element<T>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_seg: Option<Vec<Vec<Element<T>>>>,
}

impl<T: Scalar + Serialize + DeserializeOwned + Default> SavedSession<T> {
    /// Snapshot a live solver. `segments` additionally samples each element
    /// into the dense polyline (requires a fully solved chain).
    pub fn capture(
        solver: &Solver<T>,
        visual_params: VisualParams<T>,
        fit: FitSettings<T>,
        auto_fit: bool,
        segments: Option<usize>,
    ) -> Result<Self> {
        let problem = *solver
            .params()
            .context("cannot capture a session from a solver that was never set up")?;
        let solution_seg = match segments {
            Some(n) => Some(solver.sample_segments(n)?),
            None => None,
        };
        tracing::debug!(elements = solver.elements().len(), "captured session");
        Ok(SavedSession {
            visual_params,
            solver_params: SolverParams {
                fit,
                auto_fit,
                solved: solver.is_solved(),
            },
            problem,
            solution: solver.elements().to_vec(),
            solution_seg,
        })
    }

    /// Rebuild a solver holding this session's chain.
    pub fn restore(&self) -> Result<Solver<T>> {
        let solver = Solver::restore(
            self.problem,
            self.solution.clone(),
            self.solver_params.solved,
        )?;
        tracing::debug!(solved = self.solver_params.solved, "restored session");
        Ok(solver)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize session")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse session")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CorrectionModel;
    use std::f64::consts::PI;

    fn solved_solver() -> Solver<f64> {
        let params = ProblemParams {
            flexural_rigidity: 1000.0,
            initial_angle: -0.4,
            total_weight: 400.0 * PI,
            total_length: 10.0,
            element_count: 10,
            correction_model: CorrectionModel::Linear,
            gap: 0.05,
        };
        let mut solver = Solver::new();
        solver.setup(params).unwrap();
        solver.solve().unwrap();
        solver
    }

    fn capture(solver: &Solver<f64>, segments: Option<usize>) -> SavedSession<f64> {
        SavedSession::capture(
            solver,
            VisualParams::default(),
            FitSettings::default(),
            false,
            segments,
        )
        .unwrap()
    }

    #[test]
    fn json_round_trip_reproduces_the_chain_exactly() {
        let solver = solved_solver();
        let session = capture(&solver, None);

        let json = session.to_json().unwrap();
        let back = SavedSession::<f64>::from_json(&json).unwrap();

        assert_eq!(back.problem, *solver.params().unwrap());
        assert_eq!(back.solution.len(), solver.elements().len());
        for (a, b) in back.solution.iter().zip(solver.elements()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn restored_solver_resumes_where_the_session_left_off() {
        let solver = solved_solver();
        let session = capture(&solver, None);
        let restored = session.restore().unwrap();

        assert!(restored.is_solved());
        assert_eq!(restored.deviation().unwrap(), solver.deviation().unwrap());
        assert_eq!(restored.elements(), solver.elements());
    }

    #[test]
    fn unsolved_session_restores_unsolved() {
        let params = *solved_solver().params().unwrap();
        let mut solver = Solver::new();
        solver.setup(params).unwrap();

        let session = capture(&solver, None);
        let restored = session.restore().unwrap();
        assert!(restored.was_setup());
        assert!(!restored.is_solved());
    }

    #[test]
    fn json_uses_the_documented_top_level_keys() {
        let solver = solved_solver();
        let session = capture(&solver, Some(4));
        let value: serde_json::Value =
            serde_json::from_str(&session.to_json().unwrap()).unwrap();

        for key in ["visual_params", "solver_params", "problem", "solution", "solution_seg"] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        let first = &value["solution"][0]["full"];
        for key in ["x", "y", "M", "T", "tn", "Fx", "Fy"] {
            assert!(first.get(key).is_some(), "missing full-state key {key}");
        }
        assert_eq!(value["solution"].as_array().unwrap().len(), 11);
        assert_eq!(value["solution_seg"].as_array().unwrap().len(), 10);
        assert_eq!(value["solution_seg"][0].as_array().unwrap().len(), 5);
    }

    #[test]
    fn sampled_polyline_is_only_available_when_solved() {
        let params = *solved_solver().params().unwrap();
        let mut solver = Solver::new();
        solver.setup(params).unwrap();
        let result = SavedSession::capture(
            &solver,
            VisualParams::default(),
            FitSettings::default(),
            false,
            Some(8),
        );
        assert!(result.is_err());
    }

    #[test]
    fn corrupt_json_is_reported_not_panicked() {
        let err = SavedSession::<f64>::from_json("{not json").expect_err("expected error");
        assert!(format!("{err}").contains("parse"));
    }
}
