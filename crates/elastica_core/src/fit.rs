//! Shooting controller: finds the initial tangent angle that brings the far
//! end of the chain back to the support line.
//!
//! The update is a damped heuristic fixed-point step, not a Newton method;
//! no convergence rate is guaranteed. The host drives it one traversal per
//! call so an interactive application stays responsive between steps.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::params::ProblemParams;
use crate::solver::Solver;
use crate::traits::Scalar;

/// Knobs of the auto-fit iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitSettings<T> {
    /// Damping of the angle update, in (0, 1].
    pub fit_rate: T,
    /// Far-end deviation below which the fit is declared achieved.
    pub threshold: T,
    /// Steps after which the controller reports an iteration limit instead
    /// of spinning forever on a pathological problem.
    pub max_steps: usize,
}

impl<T: Scalar> Default for FitSettings<T> {
    fn default() -> Self {
        FitSettings {
            fit_rate: T::from_f64(0.1).unwrap(),
            threshold: T::from_f64(1e-3).unwrap(),
            max_steps: 500,
        }
    }
}

/// Outcome of one controller step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitStatus {
    /// Deviation still above threshold; the angle was (or should be) nudged.
    Fitting,
    /// Deviation under threshold; the chain is fit.
    Converged,
    /// Step budget exhausted without convergence.
    IterationLimit,
}

/// The pure fit update: next angle and status for a measured deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitStep<T> {
    pub initial_angle: T,
    pub deviation: T,
    pub status: FitStatus,
}

/// Compute the next initial angle from the far-end deviation.
///
/// The correction is proportional to the deviation normalized by the beam
/// length, scaled to a quarter turn and damped by `fit_rate`.
pub fn fit_update<T: Scalar>(
    params: &ProblemParams<T>,
    deviation: T,
    settings: &FitSettings<T>,
) -> FitStep<T> {
    if deviation.abs() < settings.threshold {
        return FitStep {
            initial_angle: params.initial_angle,
            deviation,
            status: FitStatus::Converged,
        };
    }

    let quarter_turn = T::from_f64(std::f64::consts::FRAC_PI_2).unwrap();
    let correction = quarter_turn * (deviation / params.total_length) * settings.fit_rate;
    FitStep {
        initial_angle: params.initial_angle - correction,
        deviation,
        status: FitStatus::Fitting,
    }
}

/// Stateful wrapper counting steps across host invocations.
///
/// Re-arm it whenever any parameter affecting the solve changes; otherwise
/// the step counter keeps running toward the iteration limit.
#[derive(Debug, Clone)]
pub struct FitController<T> {
    settings: FitSettings<T>,
    steps: usize,
}

impl<T: Scalar> FitController<T> {
    pub fn new(settings: FitSettings<T>) -> Self {
        FitController { settings, steps: 0 }
    }

    pub fn settings(&self) -> &FitSettings<T> {
        &self.settings
    }

    /// Steps taken since the last re-arm.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Reset the step budget, e.g. after the host edits the problem.
    pub fn rearm(&mut self) {
        self.steps = 0;
    }

    /// One host-cadence iteration: solve the chain, measure the deviation,
    /// and nudge the initial angle unless converged or out of budget.
    pub fn step(&mut self, solver: &mut Solver<T>) -> Result<FitStep<T>> {
        let rate = self.settings.fit_rate;
        if !(rate > T::zero()) || rate > T::one() {
            bail!("fit_rate must lie in (0, 1], got {rate:?}");
        }
        if !(self.settings.threshold > T::zero()) {
            bail!("threshold must be positive, got {:?}", self.settings.threshold);
        }

        solver.solve()?;
        let deviation = solver.deviation()?;
        let Some(params) = solver.params().copied() else {
            bail!("solver has not been set up");
        };

        let update = fit_update(&params, deviation, &self.settings);
        tracing::debug!(step = self.steps, deviation = ?deviation, status = ?update.status, "fit step");

        match update.status {
            FitStatus::Converged => Ok(update),
            FitStatus::Fitting => {
                if self.steps >= self.settings.max_steps {
                    return Ok(FitStep {
                        status: FitStatus::IterationLimit,
                        ..update
                    });
                }
                self.steps += 1;
                let mut next = params;
                next.initial_angle = update.initial_angle;
                solver.setup(next)?;
                Ok(update)
            }
            FitStatus::IterationLimit => Ok(update),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CorrectionModel;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn params(weight: f64) -> ProblemParams<f64> {
        ProblemParams {
            flexural_rigidity: 1000.0,
            initial_angle: 0.0,
            total_weight: weight,
            total_length: 10.0,
            element_count: 10,
            correction_model: CorrectionModel::Linear,
            gap: 0.0,
        }
    }

    #[test]
    fn update_is_damped_and_signed_against_the_deviation() {
        let p = params(40.0 * PI);
        let settings = FitSettings {
            fit_rate: 0.5,
            threshold: 1e-6,
            max_steps: 500,
        };
        let step = fit_update(&p, 2.0, &settings);
        assert_eq!(step.status, FitStatus::Fitting);
        let expected = 0.0 - FRAC_PI_2 * (2.0 / 10.0) * 0.5;
        assert!((step.initial_angle - expected).abs() < 1e-15);

        let step = fit_update(&p, -2.0, &settings);
        assert!(step.initial_angle > 0.0);
    }

    #[test]
    fn update_converges_below_threshold_without_moving_the_angle() {
        let p = params(40.0 * PI);
        let settings = FitSettings::default();
        let step = fit_update(&p, 1e-4, &settings);
        assert_eq!(step.status, FitStatus::Converged);
        assert_eq!(step.initial_angle, p.initial_angle);
    }

    #[test]
    fn controller_rejects_bad_settings() {
        let mut solver = Solver::new();
        solver.setup(params(40.0 * PI)).unwrap();
        let mut ctl = FitController::new(FitSettings {
            fit_rate: 1.5,
            threshold: 1e-6,
            max_steps: 10,
        });
        let err = ctl.step(&mut solver).expect_err("expected error");
        assert!(format!("{err}").contains("fit_rate"));
    }

    #[test]
    fn mild_problem_converges_monotonically() {
        let mut solver = Solver::new();
        solver.setup(params(40.0 * PI)).unwrap();
        let mut ctl = FitController::new(FitSettings {
            fit_rate: 0.5,
            threshold: 1e-6,
            max_steps: 500,
        });

        let mut last = f64::INFINITY;
        let mut converged = false;
        for _ in 0..30 {
            let step = ctl.step(&mut solver).unwrap();
            let dev = step.deviation.abs();
            assert!(dev <= last + 1e-12, "deviation grew: {last} -> {dev}");
            last = dev;
            if step.status == FitStatus::Converged {
                converged = true;
                break;
            }
        }
        assert!(converged, "no convergence within 30 steps");
        assert!(solver.deviation().unwrap().abs() < 1e-6);
    }

    #[test]
    fn heavy_reference_scenario_converges_within_bound() {
        // EI = 1000, W = 400*pi, L = 10, 10 elements, rate 0.1, threshold 1e-3.
        let mut solver = Solver::new();
        solver.setup(params(400.0 * PI)).unwrap();
        let mut ctl = FitController::new(FitSettings {
            fit_rate: 0.1,
            threshold: 1e-3,
            max_steps: 500,
        });

        let mut converged_at = None;
        for host_call in 1..=500 {
            let step = ctl.step(&mut solver).unwrap();
            if step.status == FitStatus::Converged {
                converged_at = Some(host_call);
                break;
            }
            assert_eq!(step.status, FitStatus::Fitting);
        }
        let calls = converged_at.expect("auto-fit did not converge in 500 steps");
        assert!(calls <= 500);
        assert!(solver.deviation().unwrap().abs() < 1e-3);
        assert_eq!(solver.elements()[0].full.y, 0.0);
    }

    #[test]
    fn iteration_limit_is_reported_and_angle_left_alone() {
        let mut solver = Solver::new();
        solver.setup(params(400.0 * PI)).unwrap();
        let mut ctl = FitController::new(FitSettings {
            fit_rate: 0.1,
            threshold: 1e-30, // unreachable
            max_steps: 3,
        });

        for _ in 0..3 {
            assert_eq!(ctl.step(&mut solver).unwrap().status, FitStatus::Fitting);
        }
        let angle_before = solver.params().unwrap().initial_angle;
        let step = ctl.step(&mut solver).unwrap();
        assert_eq!(step.status, FitStatus::IterationLimit);
        assert_eq!(solver.params().unwrap().initial_angle, angle_before);

        ctl.rearm();
        assert_eq!(ctl.steps(), 0);
        assert_eq!(ctl.step(&mut solver).unwrap().status, FitStatus::Fitting);
    }
}
