//! Per-node mechanical state records and the frames they live in.
//!
//! The layout of every struct here is `#[repr(C)]` and part of the public
//! contract: a solved chain may be mirrored verbatim into a GPU-resident
//! buffer of a parallel numeric type, so field order and count must stay
//! stable. Flattened, one [`Element`] is [`Element::FLOATS`] scalars in
//! declaration order.

use serde::{Deserialize, Serialize};

use crate::traits::Scalar;

/// Orthonormal local frame `{tangent, normal}` at a node.
///
/// Invariant: both vectors unit length, `normal` is `tangent` rotated +90°.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Basis<T> {
    pub t: [T; 2],
    pub n: [T; 2],
}

impl<T: Scalar> Basis<T> {
    /// Frame aligned with a tangent angle: `{(cos a, sin a), (-sin a, cos a)}`.
    pub fn from_angle(angle: T) -> Self {
        let (sin, cos) = angle.sin_cos();
        Basis {
            t: [cos, sin],
            n: [-sin, cos],
        }
    }

    /// This frame rotated by `phi`.
    pub fn rotated(&self, phi: T) -> Self {
        let (sin, cos) = phi.sin_cos();
        Basis {
            t: [
                cos * self.t[0] + sin * self.n[0],
                cos * self.t[1] + sin * self.n[1],
            ],
            n: [
                -sin * self.t[0] + cos * self.n[0],
                -sin * self.t[1] + cos * self.n[1],
            ],
        }
    }

    /// Components of a global vector in this frame: `(v·t, v·n)`.
    pub fn resolve(&self, v: [T; 2]) -> (T, T) {
        (
            v[0] * self.t[0] + v[1] * self.t[1],
            v[0] * self.n[0] + v[1] * self.n[1],
        )
    }

    /// Global vector assembled from local components: `a·t + b·n`.
    pub fn assemble(&self, a: T, b: T) -> [T; 2] {
        [
            a * self.t[0] + b * self.n[0],
            a * self.t[1] + b * self.n[1],
        ]
    }

    fn zeroed() -> Self {
        let z = T::zero();
        Basis {
            t: [z, z],
            n: [z, z],
        }
    }
}

/// Authoritative global-frame state at a node boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FullSolution<T> {
    /// Global position.
    pub x: T,
    pub y: T,
    /// Internal bending moment.
    #[serde(rename = "M")]
    pub m: T,
    /// Cumulative tangent angle.
    #[serde(rename = "T")]
    pub t: T,
    /// Local frame at the node; consistent with `t`.
    pub tn: Basis<T>,
    /// Resultant internal force, global frame.
    #[serde(rename = "Fx")]
    pub fx: T,
    #[serde(rename = "Fy")]
    pub fy: T,
}

/// Constant-moment circular-arc state of one element, anchored at its start
/// node. `(u, w)` is the arc position in the global frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseSolution<T> {
    pub u: T,
    pub w: T,
    /// Representative (midpoint) moment, held constant along the arc.
    #[serde(rename = "M")]
    pub m: T,
    #[serde(rename = "T")]
    pub t: T,
    pub tn: Basis<T>,
}

/// Perturbation state accounting for the distributed load across an element.
///
/// `(u, w)` are deflection corrections in the propagated arc frame; `(n, q)`
/// the axial/shear force pair; `(pt, pn)` the distributed load per unit arc
/// length resolved in the element's midpoint frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrSolution<T> {
    pub u: T,
    pub w: T,
    #[serde(rename = "M")]
    pub m: T,
    #[serde(rename = "T")]
    pub t: T,
    #[serde(rename = "N")]
    pub n: T,
    #[serde(rename = "Q")]
    pub q: T,
    #[serde(rename = "Pt")]
    pub pt: T,
    #[serde(rename = "Pn")]
    pub pn: T,
}

/// One node of the solved chain: the authoritative state plus the two
/// per-element partial solutions that produced the next node.
///
/// `base` and `corr` are zeroed at the final boundary node (there is no
/// element to the right of it).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Element<T> {
    pub full: FullSolution<T>,
    pub base: BaseSolution<T>,
    pub corr: CorrSolution<T>,
}

impl<T: Scalar> FullSolution<T> {
    pub const FLOATS: usize = 10;

    pub(crate) fn write_into(&self, out: &mut [T]) {
        out[0] = self.x;
        out[1] = self.y;
        out[2] = self.m;
        out[3] = self.t;
        out[4] = self.tn.t[0];
        out[5] = self.tn.t[1];
        out[6] = self.tn.n[0];
        out[7] = self.tn.n[1];
        out[8] = self.fx;
        out[9] = self.fy;
    }

    fn zeroed() -> Self {
        let z = T::zero();
        FullSolution {
            x: z,
            y: z,
            m: z,
            t: z,
            tn: Basis::zeroed(),
            fx: z,
            fy: z,
        }
    }
}

impl<T: Scalar> BaseSolution<T> {
    pub const FLOATS: usize = 8;

    pub(crate) fn write_into(&self, out: &mut [T]) {
        out[0] = self.u;
        out[1] = self.w;
        out[2] = self.m;
        out[3] = self.t;
        out[4] = self.tn.t[0];
        out[5] = self.tn.t[1];
        out[6] = self.tn.n[0];
        out[7] = self.tn.n[1];
    }

    pub(crate) fn zeroed() -> Self {
        let z = T::zero();
        BaseSolution {
            u: z,
            w: z,
            m: z,
            t: z,
            tn: Basis::zeroed(),
        }
    }
}

impl<T: Scalar> CorrSolution<T> {
    pub const FLOATS: usize = 8;

    pub(crate) fn write_into(&self, out: &mut [T]) {
        out[0] = self.u;
        out[1] = self.w;
        out[2] = self.m;
        out[3] = self.t;
        out[4] = self.n;
        out[5] = self.q;
        out[6] = self.pt;
        out[7] = self.pn;
    }

    pub(crate) fn zeroed() -> Self {
        let z = T::zero();
        CorrSolution {
            u: z,
            w: z,
            m: z,
            t: z,
            n: z,
            q: z,
            pt: z,
            pn: z,
        }
    }
}

impl<T: Scalar> Element<T> {
    /// Scalars per flattened element.
    pub const FLOATS: usize =
        FullSolution::<T>::FLOATS + BaseSolution::<T>::FLOATS + CorrSolution::<T>::FLOATS;

    /// A boundary node: known full state, no element to its right yet.
    pub fn at_border(full: FullSolution<T>) -> Self {
        Element {
            full,
            base: BaseSolution::zeroed(),
            corr: CorrSolution::zeroed(),
        }
    }

    pub(crate) fn zeroed() -> Self {
        Element::at_border(FullSolution::zeroed())
    }

    /// Flatten into `out` (length `FLOATS`) in the documented field order.
    pub fn write_into(&self, out: &mut [T]) {
        self.full.write_into(&mut out[0..10]);
        self.base.write_into(&mut out[10..18]);
        self.corr.write_into(&mut out[18..26]);
    }
}
