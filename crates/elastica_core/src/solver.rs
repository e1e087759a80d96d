//! Chain traverser: owns the element array and drives the per-element
//! transfer functions across it.

use anyhow::{bail, Result};

use crate::element::Element;
use crate::link;
use crate::params::ProblemParams;
use crate::traits::Scalar;

/// Owner of one beam problem and its solved element chain.
///
/// Lifecycle: `setup` validates parameters and sizes the array (reallocating
/// only when the element count changes), `traverse` populates a contiguous
/// range of elements left to right, `forget` drops everything. Any call to
/// `setup` logically invalidates the previous solution.
#[derive(Debug, Default)]
pub struct Solver<T: Scalar> {
    params: Option<ProblemParams<T>>,
    elements: Vec<Element<T>>,
    /// Highest node index holding a valid full state, if any.
    solved_through: Option<usize>,
}

impl<T: Scalar> Solver<T> {
    pub fn new() -> Self {
        Solver {
            params: None,
            elements: Vec::new(),
            solved_through: None,
        }
    }

    /// Install a validated problem; reallocate the chain iff its length
    /// changed. The previous solution is marked stale either way.
    pub fn setup(&mut self, params: ProblemParams<T>) -> Result<()> {
        params.validate()?;

        let node_count = params.element_count + 1;
        if self.elements.len() != node_count {
            tracing::debug!(
                old_len = self.elements.len(),
                new_len = node_count,
                "resizing element chain"
            );
            self.elements.clear();
            self.elements.resize(node_count, Element::zeroed());
        }

        self.params = Some(params);
        self.solved_through = None;
        Ok(())
    }

    /// Drop the problem and the chain, returning to the uninitialized state.
    pub fn forget(&mut self) {
        self.params = None;
        self.elements = Vec::new();
        self.solved_through = None;
    }

    pub fn was_setup(&self) -> bool {
        self.params.is_some()
    }

    /// The installed problem, if any.
    pub fn params(&self) -> Option<&ProblemParams<T>> {
        self.params.as_ref()
    }

    /// Read access to the chain. Meaningful up to the solved node index.
    pub fn elements(&self) -> &[Element<T>] {
        &self.elements
    }

    /// True once every element has been traversed.
    pub fn is_solved(&self) -> bool {
        match (&self.params, self.solved_through) {
            (Some(p), Some(through)) => through == p.element_count,
            _ => false,
        }
    }

    /// Solve elements `begin..=end` (inclusive), writing node `end + 1`.
    ///
    /// `begin == 0` re-derives the support boundary condition first; a
    /// nonzero `begin` requires the left prefix to be already solved, since
    /// the recurrence is strictly sequential.
    pub fn traverse(&mut self, begin: usize, end: usize) -> Result<()> {
        let Some(params) = self.params else {
            bail!("solver has not been set up");
        };
        if begin > end {
            bail!("invalid traversal range: begin {begin} > end {end}");
        }
        if end >= params.element_count {
            bail!(
                "traversal end {end} out of range for {} elements",
                params.element_count
            );
        }
        if begin > 0 && self.solved_through.map_or(true, |t| t < begin) {
            bail!("cannot traverse from element {begin}: left prefix is unsolved");
        }

        tracing::debug!(begin, end, "traversing chain");

        if begin == 0 {
            self.elements[0] = Element::at_border(link::setup_border(&params));
        }

        let each = params.each_length();
        for i in begin..=end {
            let full0 = self.elements[i].full;
            let base0 = link::setup_base(&params, &full0);
            let corr0 = link::setup_corr(&params, &full0, &base0);
            self.elements[i] = Element {
                full: full0,
                base: base0,
                corr: corr0,
            };

            let base_s = link::link_base(&params, &base0, each);
            let corr_s = link::link_corr(&params, &base0, &corr0, each);
            let full_s = link::link_full(&base0, &base_s, &corr_s);
            self.elements[i + 1] = Element::at_border(full_s);
        }

        let reached = end + 1;
        self.solved_through = Some(match self.solved_through {
            Some(t) if begin > 0 => t.max(reached),
            _ => reached,
        });
        Ok(())
    }

    /// Solve the whole chain.
    pub fn solve(&mut self) -> Result<()> {
        let Some(params) = self.params else {
            bail!("solver has not been set up");
        };
        self.traverse(0, params.element_count - 1)
    }

    /// Re-derive the state of element `element_i` at interior arc offset `s`
    /// without touching stored state. Agrees exactly with the stored node
    /// `element_i + 1` when `s` equals the element length.
    pub fn solution_at(&self, element_i: usize, s: T) -> Result<Element<T>> {
        let Some(params) = self.params else {
            bail!("solver has not been set up");
        };
        if element_i >= params.element_count {
            bail!(
                "element index {element_i} out of range for {} elements",
                params.element_count
            );
        }
        if self.solved_through.map_or(true, |t| t < element_i) {
            bail!("element {element_i} has no solved anchor node yet");
        }
        if s < T::zero() || s > params.each_length() {
            bail!("arc offset {s:?} outside element length");
        }

        let full0 = self.elements[element_i].full;
        let base0 = link::setup_base(&params, &full0);
        let corr0 = link::setup_corr(&params, &full0, &base0);
        let base_s = link::link_base(&params, &base0, s);
        let corr_s = link::link_corr(&params, &base0, &corr0, s);
        let full_s = link::link_full(&base0, &base_s, &corr_s);
        Ok(Element {
            full: full_s,
            base: base_s,
            corr: corr_s,
        })
    }

    /// Vertical position of the far end relative to the support line; the
    /// quantity the shooting controller drives to zero.
    pub fn deviation(&self) -> Result<T> {
        let Some(params) = self.params else {
            bail!("solver has not been set up");
        };
        if !self.is_solved() {
            bail!("chain is not fully solved");
        }
        Ok(self.elements[params.element_count].full.y)
    }

    /// Dense per-element samples (`segments + 1` states each) for rendering
    /// or export.
    pub fn sample_segments(&self, segments: usize) -> Result<Vec<Vec<Element<T>>>> {
        let Some(params) = self.params else {
            bail!("solver has not been set up");
        };
        if segments == 0 {
            bail!("segments must be at least 1");
        }
        if !self.is_solved() {
            bail!("chain is not fully solved");
        }

        let each = params.each_length();
        let mut out = Vec::with_capacity(params.element_count);
        for i in 0..params.element_count {
            let mut samples = Vec::with_capacity(segments + 1);
            for seg in 0..=segments {
                let frac = T::from_usize(seg).unwrap() / T::from_usize(segments).unwrap();
                samples.push(self.solution_at(i, frac * each)?);
            }
            out.push(samples);
        }
        Ok(out)
    }

    /// Rebuild a solver around a previously captured chain.
    pub(crate) fn restore(
        params: ProblemParams<T>,
        elements: Vec<Element<T>>,
        solved: bool,
    ) -> Result<Self> {
        params.validate()?;
        if elements.len() != params.element_count + 1 {
            bail!(
                "restored chain has {} nodes, expected {}",
                elements.len(),
                params.element_count + 1
            );
        }
        let solved_through = solved.then_some(params.element_count);
        Ok(Solver {
            params: Some(params),
            elements,
            solved_through,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CorrectionModel;
    use std::f64::consts::PI;

    fn params(count: usize) -> ProblemParams<f64> {
        ProblemParams {
            flexural_rigidity: 1000.0,
            initial_angle: 0.0,
            total_weight: 400.0 * PI,
            total_length: 10.0,
            element_count: count,
            correction_model: CorrectionModel::Linear,
            gap: 0.0,
        }
    }

    fn assert_err_contains<V: std::fmt::Debug>(result: Result<V>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn traverse_requires_setup() {
        let mut solver = Solver::<f64>::new();
        assert_err_contains(solver.traverse(0, 4), "not been set up");
        assert_err_contains(solver.solution_at(0, 0.5), "not been set up");
    }

    #[test]
    fn setup_sizes_chain_and_is_idempotent_on_length() {
        let mut solver = Solver::new();
        solver.setup(params(10)).unwrap();
        assert_eq!(solver.elements().len(), 11);

        // Same count: length untouched.
        solver.setup(params(10)).unwrap();
        assert_eq!(solver.elements().len(), 11);

        // Changed count: reallocated.
        solver.setup(params(4)).unwrap();
        assert_eq!(solver.elements().len(), 5);
    }

    #[test]
    fn setup_marks_previous_solution_stale() {
        let mut solver = Solver::new();
        solver.setup(params(10)).unwrap();
        solver.solve().unwrap();
        assert!(solver.is_solved());

        solver.setup(params(10)).unwrap();
        assert!(!solver.is_solved());
        assert_err_contains(solver.deviation(), "not fully solved");
    }

    #[test]
    fn forget_returns_to_uninitialized() {
        let mut solver = Solver::new();
        solver.setup(params(10)).unwrap();
        solver.solve().unwrap();
        solver.forget();
        assert!(!solver.was_setup());
        assert!(solver.elements().is_empty());
        assert_err_contains(solver.traverse(0, 0), "not been set up");
    }

    #[test]
    fn rejects_bad_ranges() {
        let mut solver = Solver::new();
        solver.setup(params(10)).unwrap();
        assert_err_contains(solver.traverse(3, 2), "begin 3 > end 2");
        assert_err_contains(solver.traverse(0, 10), "out of range");
        assert_err_contains(solver.traverse(2, 5), "left prefix is unsolved");
    }

    #[test]
    fn partial_traversal_extends_the_solved_prefix() {
        let mut solver = Solver::new();
        solver.setup(params(10)).unwrap();
        solver.traverse(0, 4).unwrap();
        assert!(!solver.is_solved());

        solver.traverse(5, 9).unwrap();
        assert!(solver.is_solved());

        // Matches a single full traversal bit for bit.
        let mut reference = Solver::new();
        reference.setup(params(10)).unwrap();
        reference.solve().unwrap();
        for (a, b) in solver.elements().iter().zip(reference.elements()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn support_boundary_condition_holds() {
        let mut solver = Solver::new();
        solver.setup(params(10)).unwrap();
        solver.solve().unwrap();
        let first = &solver.elements()[0].full;
        assert_eq!(first.x, 0.0);
        assert_eq!(first.y, 0.0);
        assert_eq!(first.m, 0.0);
        assert_eq!(first.t, 0.0);
        assert_eq!(first.fx, 0.0);
        assert_eq!(first.fy, 200.0 * PI);
    }

    #[test]
    fn traversal_is_deterministic() {
        let mut a = Solver::new();
        a.setup(params(10)).unwrap();
        a.solve().unwrap();
        let mut b = Solver::new();
        b.setup(params(10)).unwrap();
        b.solve().unwrap();
        assert_eq!(a.elements(), b.elements());

        // Re-traversing the same solver reproduces the same chain too.
        let snapshot = a.elements().to_vec();
        a.solve().unwrap();
        assert_eq!(a.elements(), snapshot.as_slice());
    }

    #[test]
    fn interior_samples_join_the_next_node() {
        let mut solver = Solver::new();
        let mut p = params(10);
        p.initial_angle = -0.6;
        solver.setup(p).unwrap();
        solver.solve().unwrap();

        let each = p.each_length();
        for i in 0..p.element_count {
            let sampled = solver.solution_at(i, each).unwrap().full;
            let stored = solver.elements()[i + 1].full;
            assert!((sampled.x - stored.x).abs() < 1e-12);
            assert!((sampled.y - stored.y).abs() < 1e-12);
            assert!((sampled.m - stored.m).abs() < 1e-12);
            assert!((sampled.t - stored.t).abs() < 1e-12);
            assert!((sampled.fx - stored.fx).abs() < 1e-12);
            assert!((sampled.fy - stored.fy).abs() < 1e-12);
        }
    }

    #[test]
    fn sampling_validates_its_inputs() {
        let mut solver = Solver::new();
        solver.setup(params(10)).unwrap();
        solver.solve().unwrap();
        assert_err_contains(solver.solution_at(10, 0.0), "out of range");
        assert_err_contains(solver.solution_at(0, -0.1), "outside element length");
        assert_err_contains(solver.solution_at(0, 1.5), "outside element length");
    }

    #[test]
    fn zero_weight_chain_is_a_straight_line() {
        let mut p = params(10);
        p.total_weight = 0.0;
        p.initial_angle = 0.3;
        let mut solver = Solver::new();
        solver.setup(p).unwrap();
        solver.solve().unwrap();

        let last = &solver.elements()[10].full;
        assert!((last.x - 10.0 * 0.3_f64.cos()).abs() < 1e-12);
        assert!((last.y - 10.0 * 0.3_f64.sin()).abs() < 1e-12);
        assert_eq!(last.m, 0.0);
        assert_eq!(last.t, 0.3);
    }

    #[test]
    fn sample_segments_covers_every_element() {
        let mut solver = Solver::new();
        solver.setup(params(4)).unwrap();
        solver.solve().unwrap();
        let seg = solver.sample_segments(8).unwrap();
        assert_eq!(seg.len(), 4);
        assert!(seg.iter().all(|samples| samples.len() == 9));

        // First sample of each element sits on the stored node.
        for (i, samples) in seg.iter().enumerate() {
            let node = solver.elements()[i].full;
            assert!((samples[0].full.x - node.x).abs() < 1e-12);
            assert!((samples[0].full.y - node.y).abs() < 1e-12);
        }
    }

    #[test]
    fn single_precision_chain_tracks_the_double_one() {
        let mut p64 = params(10);
        p64.total_weight = 40.0 * PI;
        let mut solver64 = Solver::<f64>::new();
        solver64.setup(p64).unwrap();
        solver64.solve().unwrap();

        let p32 = ProblemParams::<f32> {
            flexural_rigidity: 1000.0,
            initial_angle: 0.0,
            total_weight: 40.0 * std::f32::consts::PI,
            total_length: 10.0,
            element_count: 10,
            correction_model: CorrectionModel::Linear,
            gap: 0.0,
        };
        let mut solver32 = Solver::<f32>::new();
        solver32.setup(p32).unwrap();
        solver32.solve().unwrap();

        for (a, b) in solver64.elements().iter().zip(solver32.elements()) {
            assert!((a.full.x - f64::from(b.full.x)).abs() < 1e-2);
            assert!((a.full.y - f64::from(b.full.y)).abs() < 1e-2);
        }
    }
}
