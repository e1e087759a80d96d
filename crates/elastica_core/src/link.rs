//! Per-element transfer functions.
//!
//! Each element of the chain is solved in closed form: a constant-curvature
//! circular arc (the base solution, from the representative midpoint moment)
//! plus a linearized perturbation for the self-weight distributed across the
//! element (the correction solution). `link_full` composes the two into the
//! next node's authoritative global state.
//!
//! The correction integrals are evaluated as truncated Maclaurin expansions
//! in the arc curvature (5th order), never by numerical quadrature; the
//! coefficient blocks were derived with a CAS from the linearized
//! beam-column system
//!
//! ```text
//!     N(s) =  (N0 + s·Pt)·cos δ(s) + (Q0 + s·Pn)·sin δ(s)
//!     Q(s) = -(N0 + s·Pt)·sin δ(s) + (Q0 + s·Pn)·cos δ(s)
//!     M(s) = M0 + ∫ Q         T(s) = (1/EI) ∫ M
//!     u(s) = ∫ sin(K(s-σ))·T(σ) dσ      w(s) = ∫ cos(K(s-σ))·T(σ) dσ
//! ```
//!
//! where `δ(σ) = K·(σ - each/2)` is the frame angle relative to the midpoint
//! frame in which the node force and the load intensity are resolved. The
//! force pair transfers by exact trigonometry; every series below is finite
//! at `K = 0`.

use crate::element::{Basis, BaseSolution, CorrSolution, FullSolution};
use crate::params::ProblemParams;
use crate::traits::Scalar;

/// Known state at the supported end: hinge at the origin carrying half the
/// total self-weight, tangent at the configured initial angle.
pub fn setup_border<T: Scalar>(params: &ProblemParams<T>) -> FullSolution<T> {
    let half = T::from_f64(0.5).unwrap();
    let angle = params.initial_angle;
    FullSolution {
        x: T::zero(),
        y: T::zero(),
        m: T::zero(),
        t: angle,
        tn: Basis::from_angle(angle),
        fx: T::zero(),
        fy: half * params.total_weight,
    }
}

/// Representative constant-moment state for the element starting at `full`.
///
/// The moment is taken about the element midpoint with the beam assumed
/// straight over the element: `M = arm × F` with `arm = (each/2)·tangent`.
pub fn setup_base<T: Scalar>(
    params: &ProblemParams<T>,
    full: &FullSolution<T>,
) -> BaseSolution<T> {
    let half = T::from_f64(0.5).unwrap();
    let arm = half * params.each_length();
    let m = arm * (full.tn.t[0] * full.fy - full.tn.t[1] * full.fx);
    BaseSolution {
        u: full.x,
        w: full.y,
        m,
        t: full.t,
        tn: full.tn,
    }
}

/// Circular-arc propagation of a base solution to arc offset `s`.
///
/// `K = 0` must short-circuit to a straight segment: the trigonometric arc
/// formula divides by the curvature.
pub fn link_base<T: Scalar>(
    params: &ProblemParams<T>,
    base: &BaseSolution<T>,
    s: T,
) -> BaseSolution<T> {
    let k = base.m / params.flexural_rigidity;

    let (du, dw, phi) = if k == T::zero() {
        (s, T::zero(), T::zero())
    } else {
        let phi = s * k;
        let (sin, cos) = phi.sin_cos();
        (sin / k, (T::one() - cos) / k, phi)
    };

    let d = base.tn.assemble(du, dw);
    BaseSolution {
        u: base.u + d[0],
        w: base.w + d[1],
        m: base.m,
        t: base.t + phi,
        tn: base.tn.rotated(phi),
    }
}

/// Correction state at the start of the element anchored at `full`.
///
/// The start moment `full.M - base.M` cancels the representative moment, so
/// the composed total reproduces the node's true moment (zero at the hinge,
/// continuous across interior nodes). The node force and the distributed
/// load intensity are resolved once in the element's midpoint frame.
pub fn setup_corr<T: Scalar>(
    params: &ProblemParams<T>,
    full: &FullSolution<T>,
    base: &BaseSolution<T>,
) -> CorrSolution<T> {
    let half = T::from_f64(0.5).unwrap();
    let mid = link_base(params, base, half * params.each_length());

    let (n, q) = mid.tn.resolve([full.fx, full.fy]);

    // Per-element weight spread over the element's arc length, acting -y.
    let intensity = params.each_weight() / params.each_length();
    let (pt, pn) = mid.tn.resolve([T::zero(), -intensity]);

    CorrSolution {
        u: T::zero(),
        w: T::zero(),
        m: full.m - base.m,
        t: T::zero(),
        n,
        q,
        pt,
        pn,
    }
}

/// Perturbation propagation of a correction state to arc offset `s`.
pub fn link_corr<T: Scalar>(
    params: &ProblemParams<T>,
    base: &BaseSolution<T>,
    corr: &CorrSolution<T>,
    s: T,
) -> CorrSolution<T> {
    let c = |v: f64| T::from_f64(v).unwrap();

    let ei = params.flexural_rigidity;
    let l = params.each_length();
    let k = base.m / ei;

    let m0 = corr.m;
    let n0 = corr.n;
    let q0 = corr.q;
    let pt = corr.pt;
    let pn = corr.pn;

    // Force pair: exact rotation about the midpoint resolution frame, with
    // the accumulated load folded in.
    let delta = k * (s - c(0.5) * l);
    let (sd, cd) = delta.sin_cos();
    let n = (n0 + s * pt) * cd + (q0 + s * pn) * sd;
    let q = -(n0 + s * pt) * sd + (q0 + s * pn) * cd;

    let k2 = k * k;
    let k3 = k2 * k;
    let k4 = k2 * k2;
    let k5 = k4 * k;
    let s2 = s * s;
    let s3 = s2 * s;
    let s4 = s2 * s2;
    let s5 = s4 * s;
    let s6 = s4 * s2;
    let s7 = s6 * s;
    let s8 = s6 * s2;
    let s9 = s8 * s;
    let l2 = l * l;
    let l3 = l2 * l;
    let l4 = l2 * l2;
    let l5 = l4 * l;

    let mc_n0 = k * (-s2 + s * l) / c(2.0)
        + k3 * (c(2.0) * s4 - c(4.0) * s3 * l + c(3.0) * s2 * l2 - s * l3) / c(48.0)
        + k5 * (-c(16.0) * s6 + c(48.0) * s5 * l - c(60.0) * s4 * l2 + c(40.0) * s3 * l3 - c(15.0) * s2 * l4 + c(3.0) * s * l5) / c(11520.0);
    let mc_q0 = (s)
        + k2 * (-c(4.0) * s3 + c(6.0) * s2 * l - c(3.0) * s * l2) / c(24.0)
        + k4 * (c(16.0) * s5 - c(40.0) * s4 * l + c(40.0) * s3 * l2 - c(20.0) * s2 * l3 + c(5.0) * s * l4) / c(1920.0);
    let mc_pt = k * (-c(4.0) * s3 + c(3.0) * s2 * l) / c(12.0)
        + k3 * (c(16.0) * s5 - c(30.0) * s4 * l + c(20.0) * s3 * l2 - c(5.0) * s2 * l3) / c(480.0)
        + k5 * (-c(192.0) * s7 + c(560.0) * s6 * l - c(672.0) * s5 * l2 + c(420.0) * s4 * l3 - c(140.0) * s3 * l4 + c(21.0) * s2 * l5) / c(161280.0);
    let mc_pn = (s2) / c(2.0)
        + k2 * (-c(6.0) * s4 + c(8.0) * s3 * l - c(3.0) * s2 * l2) / c(48.0)
        + k4 * (c(80.0) * s6 - c(192.0) * s5 * l + c(180.0) * s4 * l2 - c(80.0) * s3 * l3 + c(15.0) * s2 * l4) / c(11520.0);
    let tc_n0 = k * (-c(2.0) * s3 + c(3.0) * s2 * l) / c(12.0)
        + k3 * (c(4.0) * s5 - c(10.0) * s4 * l + c(10.0) * s3 * l2 - c(5.0) * s2 * l3) / c(480.0)
        + k5 * (-c(32.0) * s7 + c(112.0) * s6 * l - c(168.0) * s5 * l2 + c(140.0) * s4 * l3 - c(70.0) * s3 * l4 + c(21.0) * s2 * l5) / c(161280.0);
    let tc_q0 = (s2) / c(2.0)
        + k2 * (-c(2.0) * s4 + c(4.0) * s3 * l - c(3.0) * s2 * l2) / c(48.0)
        + k4 * (c(16.0) * s6 - c(48.0) * s5 * l + c(60.0) * s4 * l2 - c(40.0) * s3 * l3 + c(15.0) * s2 * l4) / c(11520.0);
    let tc_pt = k * (-s4 + s3 * l) / c(12.0)
        + k3 * (c(8.0) * s6 - c(18.0) * s5 * l + c(15.0) * s4 * l2 - c(5.0) * s3 * l3) / c(1440.0)
        + k5 * (-c(24.0) * s8 + c(80.0) * s7 * l - c(112.0) * s6 * l2 + c(84.0) * s5 * l3 - c(35.0) * s4 * l4 + c(7.0) * s3 * l5) / c(161280.0);
    let tc_pn = (s3) / c(6.0)
        + k2 * (-c(6.0) * s5 + c(10.0) * s4 * l - c(5.0) * s3 * l2) / c(240.0)
        + k4 * (c(80.0) * s7 - c(224.0) * s6 * l + c(252.0) * s5 * l2 - c(140.0) * s4 * l3 + c(35.0) * s3 * l4) / c(80640.0);
    let u_m0 = k * (s3) / c(6.0)
        + k3 * (-s5) / c(120.0)
        + k5 * (s7) / c(5040.0);
    let u_n0 = k2 * (-c(2.0) * s5 + c(5.0) * s4 * l) / c(240.0)
        + k4 * (c(16.0) * s7 - c(56.0) * s6 * l + c(42.0) * s5 * l2 - c(35.0) * s4 * l3) / c(40320.0);
    let u_q0 = k * (s4) / c(24.0)
        + k3 * (-c(8.0) * s6 + c(12.0) * s5 * l - c(15.0) * s4 * l2) / c(2880.0)
        + k5 * (c(24.0) * s8 - c(64.0) * s7 * l + c(112.0) * s6 * l2 - c(56.0) * s5 * l3 + c(35.0) * s4 * l4) / c(322560.0);
    let u_pt = k2 * (-c(2.0) * s6 + c(3.0) * s5 * l) / c(720.0)
        + k4 * (c(6.0) * s8 - c(16.0) * s7 * l + c(14.0) * s6 * l2 - c(7.0) * s5 * l3) / c(40320.0);
    let u_pn = k * (s5) / c(120.0)
        + k3 * (-c(16.0) * s7 + c(28.0) * s6 * l - c(21.0) * s5 * l2) / c(20160.0)
        + k5 * (c(24.0) * s9 - c(72.0) * s8 * l + c(96.0) * s7 * l2 - c(56.0) * s6 * l3 + c(21.0) * s5 * l4) / c(967680.0);
    let w_m0 = (s2) / c(2.0)
        + k2 * (-s4) / c(24.0)
        + k4 * (s6) / c(720.0);
    let w_n0 = k * (-s4 + c(2.0) * s3 * l) / c(24.0)
        + k3 * (c(8.0) * s6 - c(24.0) * s5 * l + c(15.0) * s4 * l2 - c(10.0) * s3 * l3) / c(2880.0)
        + k5 * (-c(24.0) * s8 + c(96.0) * s7 * l - c(112.0) * s6 * l2 + c(112.0) * s5 * l3 - c(35.0) * s4 * l4 + c(14.0) * s3 * l5) / c(322560.0);
    let w_q0 = (s3) / c(6.0)
        + k2 * (-c(4.0) * s5 + c(5.0) * s4 * l - c(5.0) * s3 * l2) / c(240.0)
        + k4 * (c(48.0) * s7 - c(112.0) * s6 * l + c(168.0) * s5 * l2 - c(70.0) * s4 * l3 + c(35.0) * s3 * l4) / c(80640.0);
    let w_pt = k * (-c(4.0) * s5 + c(5.0) * s4 * l) / c(240.0)
        + k3 * (c(48.0) * s7 - c(112.0) * s6 * l + c(84.0) * s5 * l2 - c(35.0) * s4 * l3) / c(40320.0)
        + k5 * (-c(64.0) * s9 + c(216.0) * s8 * l - c(288.0) * s7 * l2 + c(224.0) * s6 * l3 - c(84.0) * s5 * l4 + c(21.0) * s4 * l5) / c(1935360.0);
    let w_pn = (s4) / c(24.0)
        + k2 * (-c(16.0) * s6 + c(24.0) * s5 * l - c(15.0) * s4 * l2) / c(2880.0)
        + k4 * (c(72.0) * s8 - c(192.0) * s7 * l + c(224.0) * s6 * l2 - c(112.0) * s5 * l3 + c(35.0) * s4 * l4) / c(322560.0);

    let m = m0 + n0 * mc_n0 + q0 * mc_q0 + pt * mc_pt + pn * mc_pn;
    let t = (m0 * s + n0 * tc_n0 + q0 * tc_q0 + pt * tc_pt + pn * tc_pn) / ei;
    let u = (m0 * u_m0 + n0 * u_n0 + q0 * u_q0 + pt * u_pt + pn * u_pn) / ei;
    let w = (m0 * w_m0 + n0 * w_n0 + q0 * w_q0 + pt * w_pt + pn * w_pn) / ei;

    CorrSolution {
        u,
        w,
        m,
        t,
        n,
        q,
        pt,
        pn,
    }
}

/// Compose base and correction at offset `s` into the emitted global state.
///
/// The output basis is the anchor basis rotated by the boundary-corrected
/// angle change (base rotation plus the correction's angular contribution),
/// and the force pair is resolved through the propagated base frame.
pub fn link_full<T: Scalar>(
    base0: &BaseSolution<T>,
    base_s: &BaseSolution<T>,
    corr_s: &CorrSolution<T>,
) -> FullSolution<T> {
    let d = base_s.tn.assemble(corr_s.u, corr_s.w);
    let t = base_s.t + corr_s.t;
    let f = base_s.tn.assemble(corr_s.n, corr_s.q);
    FullSolution {
        x: base_s.u + d[0],
        y: base_s.w + d[1],
        m: base_s.m + corr_s.m,
        t,
        tn: base0.tn.rotated(t - base0.t),
        fx: f[0],
        fy: f[1],
    }
}
