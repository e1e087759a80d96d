use serde::{Deserialize, Serialize};

use crate::error::ParamsError;
use crate::traits::Scalar;

/// Selector for the correction formula family used by the perturbation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionModel {
    /// Linearized beam-column solution, truncated Maclaurin expansion.
    Linear,
    /// Declared second family; no coefficient set has been derived for it.
    // TODO: derive the exponential-family coefficients analogous to the
    // linear set before accepting this variant in `validate`.
    Exponential,
}

/// Physical and discretization parameters of one beam problem.
///
/// Immutable per solve: any field change invalidates the solved chain and
/// requires a fresh traversal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProblemParams<T> {
    /// Flexural rigidity EI.
    #[serde(rename = "EI")]
    pub flexural_rigidity: T,
    /// Tangent angle at the supported end, radians.
    pub initial_angle: T,
    /// Total self-weight of the beam, distributed uniformly along its length.
    pub total_weight: T,
    /// Unstretched beam length.
    pub total_length: T,
    /// Number of chained elements; the solved array holds one more node.
    pub element_count: usize,
    /// Which correction formula family propagates the distributed load.
    pub correction_model: CorrectionModel,
    /// Display spacing consumed by the renderer; no effect on the mechanics.
    pub gap: T,
}

impl<T: Scalar> ProblemParams<T> {
    /// Arc length of a single element.
    pub fn each_length(&self) -> T {
        self.total_length / T::from_usize(self.element_count).unwrap()
    }

    /// Self-weight carried by a single element.
    pub fn each_weight(&self) -> T {
        self.total_weight / T::from_usize(self.element_count).unwrap()
    }

    /// Fail-fast check that the problem is well posed.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.flexural_rigidity.is_finite() || !(self.flexural_rigidity > T::zero()) {
            return Err(ParamsError::invalid(
                "flexural_rigidity",
                format!("must be finite and positive, got {:?}", self.flexural_rigidity),
            ));
        }
        if !self.total_length.is_finite() || !(self.total_length > T::zero()) {
            return Err(ParamsError::invalid(
                "total_length",
                format!("must be finite and positive, got {:?}", self.total_length),
            ));
        }
        if !self.total_weight.is_finite() || !(self.total_weight >= T::zero()) {
            return Err(ParamsError::invalid(
                "total_weight",
                format!("must be finite and non-negative, got {:?}", self.total_weight),
            ));
        }
        if self.element_count == 0 {
            return Err(ParamsError::invalid("element_count", "must be at least 1"));
        }
        if !self.initial_angle.is_finite() {
            return Err(ParamsError::invalid("initial_angle", "must be finite"));
        }
        if !self.gap.is_finite() {
            return Err(ParamsError::invalid("gap", "must be finite"));
        }
        if self.correction_model == CorrectionModel::Exponential {
            return Err(ParamsError::UnsupportedModel {
                model: "Exponential".to_string(),
            });
        }
        Ok(())
    }
}
