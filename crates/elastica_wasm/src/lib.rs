//! WASM bridge for the elastica core solver.
//!
//! Exposes the solve/fit entry points and the flattened element buffer to a
//! JS host that owns rendering and interaction. Errors never cross the
//! boundary as panics; everything is mapped to a `JsValue` message.

use wasm_bindgen::prelude::*;

use elastica_core::element::Element;
use elastica_core::fit::{FitController, FitSettings, FitStatus};
use elastica_core::params::{CorrectionModel, ProblemParams};
use elastica_core::session::{SavedSession, VisualParams};
use elastica_core::solver::Solver;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

fn err_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}

/// One beam problem plus its fit controller, owned across JS calls.
#[wasm_bindgen]
pub struct WasmBeam {
    solver: Solver<f64>,
    controller: FitController<f64>,
    visual: VisualParams<f64>,
    auto_fit: bool,
}

#[wasm_bindgen]
impl WasmBeam {
    #[wasm_bindgen(constructor)]
    pub fn new(
        flexural_rigidity: f64,
        initial_angle: f64,
        total_weight: f64,
        total_length: f64,
        element_count: usize,
        gap: f64,
    ) -> Result<WasmBeam, JsValue> {
        let params = ProblemParams {
            flexural_rigidity,
            initial_angle,
            total_weight,
            total_length,
            element_count,
            correction_model: CorrectionModel::Linear,
            gap,
        };
        let mut solver = Solver::new();
        solver.setup(params).map_err(err_js)?;
        Ok(WasmBeam {
            solver,
            controller: FitController::new(FitSettings::default()),
            visual: VisualParams::default(),
            auto_fit: false,
        })
    }

    /// Replace the problem; re-arms the fit controller.
    pub fn set_problem(
        &mut self,
        flexural_rigidity: f64,
        initial_angle: f64,
        total_weight: f64,
        total_length: f64,
        element_count: usize,
        gap: f64,
    ) -> Result<(), JsValue> {
        let params = ProblemParams {
            flexural_rigidity,
            initial_angle,
            total_weight,
            total_length,
            element_count,
            correction_model: CorrectionModel::Linear,
            gap,
        };
        self.solver.setup(params).map_err(err_js)?;
        self.controller.rearm();
        Ok(())
    }

    pub fn set_fit(&mut self, fit_rate: f64, threshold: f64, max_steps: usize) {
        self.controller = FitController::new(FitSettings {
            fit_rate,
            threshold,
            max_steps,
        });
    }

    pub fn set_auto_fit(&mut self, enabled: bool) {
        self.auto_fit = enabled;
        if enabled {
            self.controller.rearm();
        }
    }

    /// Solve the whole chain.
    pub fn solve(&mut self) -> Result<(), JsValue> {
        self.solver.solve().map_err(err_js)
    }

    /// Solve elements `begin..=end`.
    pub fn traverse(&mut self, begin: usize, end: usize) -> Result<(), JsValue> {
        self.solver.traverse(begin, end).map_err(err_js)
    }

    /// One shooting-controller step; returns the resulting status.
    pub fn fit_step(&mut self) -> Result<String, JsValue> {
        let step = self.controller.step(&mut self.solver).map_err(err_js)?;
        Ok(match step.status {
            FitStatus::Fitting => "fitting",
            FitStatus::Converged => "converged",
            FitStatus::IterationLimit => "iteration_limit",
        }
        .to_string())
    }

    pub fn deviation(&self) -> Result<f64, JsValue> {
        self.solver.deviation().map_err(err_js)
    }

    pub fn initial_angle(&self) -> f64 {
        self.solver
            .params()
            .map_or(0.0, |params| params.initial_angle)
    }

    pub fn element_count(&self) -> usize {
        self.solver.params().map_or(0, |params| params.element_count)
    }

    pub fn is_solved(&self) -> bool {
        self.solver.is_solved()
    }

    /// Scalars per flattened element in the buffers below.
    pub fn element_floats() -> usize {
        Element::<f64>::FLOATS
    }

    /// The solved chain, flattened node by node in the documented layout.
    pub fn buffer_f64(&self) -> Vec<f64> {
        let stride = Element::<f64>::FLOATS;
        let elements = self.solver.elements();
        let mut out = vec![0.0; elements.len() * stride];
        for (i, element) in elements.iter().enumerate() {
            element.write_into(&mut out[i * stride..(i + 1) * stride]);
        }
        out
    }

    /// Single-precision mirror of `buffer_f64` for direct GPU upload.
    pub fn buffer_f32(&self) -> js_sys::Float32Array {
        let doubles = self.buffer_f64();
        let floats: Vec<f32> = doubles.iter().map(|&v| v as f32).collect();
        js_sys::Float32Array::from(floats.as_slice())
    }

    /// Per-vertex `(arc fraction, element index)` pairs for a line-strip
    /// renderer that expands each element into `segments` spans.
    pub fn vertex_params(&self, segments: usize) -> Vec<f32> {
        let count = self.element_count();
        let mut out = Vec::with_capacity(count * (segments + 1) * 2);
        for element in 0..count {
            for seg in 0..=segments {
                out.push(seg as f32 / segments as f32);
                out.push(element as f32);
            }
        }
        out
    }

    /// Flattened state of element `element_i` at arc offset `s`.
    pub fn sample(&self, element_i: usize, s: f64) -> Result<Vec<f64>, JsValue> {
        let element = self.solver.solution_at(element_i, s).map_err(err_js)?;
        let mut out = vec![0.0; Element::<f64>::FLOATS];
        element.write_into(&mut out);
        Ok(out)
    }

    pub fn set_visual(&mut self, zoom: f64, look_at_x: f64, look_at_y: f64, segments: usize) {
        self.visual = VisualParams {
            zoom,
            look_at: [look_at_x, look_at_y],
            segments,
        };
    }

    /// Capture the session (with the dense polyline when `with_segments`).
    pub fn export_session(&self, with_segments: bool) -> Result<JsValue, JsValue> {
        let segments = with_segments.then_some(self.visual.segments);
        let session = SavedSession::capture(
            &self.solver,
            self.visual,
            *self.controller.settings(),
            self.auto_fit,
            segments,
        )
        .map_err(err_js)?;
        serde_wasm_bindgen::to_value(&session).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Resume a previously exported session.
    pub fn import_session(value: JsValue) -> Result<WasmBeam, JsValue> {
        let session: SavedSession<f64> =
            serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let solver = session.restore().map_err(err_js)?;
        Ok(WasmBeam {
            solver,
            controller: FitController::new(session.solver_params.fit),
            visual: session.visual_params,
            auto_fit: session.solver_params.auto_fit,
        })
    }
}
