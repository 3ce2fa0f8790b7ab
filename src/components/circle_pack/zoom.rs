//! Animated pan and zoom between node viewports.
//!
//! Motion follows the smooth zoom path of van Wijk and Nuij ("Smooth and
//! efficient zooming and panning", 2003): the camera zooms out while it pans
//! and back in on arrival, so the apparent speed stays constant. The path
//! length also gives the animation its duration.

use std::f64::consts::SQRT_2;

use log::debug;

/// Zoom/pan trade-off of the interpolation path.
const RHO: f64 = SQRT_2;
const RHO2: f64 = 2.0;
const RHO4: f64 = 4.0;
const EPSILON2: f64 = 1e-12;
/// Pans shorter than this fraction of the larger span are treated as pure zooms.
const PAN_EPSILON: f64 = 1e-6;

/// Smallest span a viewport can have; keeps `scale` finite.
pub const MIN_SPAN: f64 = 1e-9;

/// Visible region of layout space: a center and the width that must fit the
/// base diameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub x: f64,
	pub y: f64,
	pub span: f64,
}

impl Viewport {
	pub fn new(x: f64, y: f64, span: f64) -> Self {
		Self {
			x,
			y,
			span: span.max(MIN_SPAN),
		}
	}
}

/// Mapping from layout space to screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub center_x: f64,
	pub center_y: f64,
	pub scale: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			center_x: 0.0,
			center_y: 0.0,
			scale: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn from_viewport(v: Viewport, base_diameter: f64) -> Self {
		Self {
			center_x: v.x,
			center_y: v.y,
			scale: base_diameter / v.span,
		}
	}

	/// Projects a layout-space point onto a screen whose center is `origin`.
	pub fn apply(&self, x: f64, y: f64, origin: (f64, f64)) -> (f64, f64) {
		(
			(x - self.center_x) * self.scale + origin.0,
			(y - self.center_y) * self.scale + origin.1,
		)
	}
}

/// Cubic ease-in-out; flat at both ends.
pub fn ease_cubic_in_out(t: f64) -> f64 {
	let t = t.clamp(0.0, 1.0) * 2.0;
	if t <= 1.0 {
		t * t * t / 2.0
	} else {
		let t = t - 2.0;
		(t * t * t + 2.0) / 2.0
	}
}

#[derive(Clone, Copy, Debug)]
enum PathShape {
	/// Start and end share a center; only the span changes.
	Scale { s: f64 },
	Pan { d1: f64, r0: f64, s: f64 },
}

/// Interpolation path between two viewports.
#[derive(Clone, Copy, Debug)]
pub struct ZoomPath {
	from: Viewport,
	to: Viewport,
	shape: PathShape,
}

impl ZoomPath {
	pub fn new(from: Viewport, to: Viewport) -> Self {
		let (dx, dy) = (to.x - from.x, to.y - from.y);
		let d2 = dx * dx + dy * dy;
		let (w0, w1) = (from.span, to.span);
		let scale = PathShape::Scale {
			s: (w1 / w0).ln() / RHO,
		};
		let d1 = d2.sqrt();
		// a pan too small against the spans loses r0/r1 to cancellation
		let shape = if d2 < EPSILON2 || d1 < PAN_EPSILON * w0.max(w1) {
			scale
		} else {
			let b0 = (w1 * w1 - w0 * w0 + RHO4 * d2) / (2.0 * w0 * RHO2 * d1);
			let b1 = (w1 * w1 - w0 * w0 - RHO4 * d2) / (2.0 * w1 * RHO2 * d1);
			let r0 = ((b0 * b0 + 1.0).sqrt() - b0).ln();
			let r1 = ((b1 * b1 + 1.0).sqrt() - b1).ln();
			if r0.is_finite() && r1.is_finite() {
				PathShape::Pan {
					d1,
					r0,
					s: (r1 - r0) / RHO,
				}
			} else {
				scale
			}
		};
		Self { from, to, shape }
	}

	/// Path length in the ρ-metric. Equals the suggested duration in seconds.
	pub fn length(&self) -> f64 {
		match self.shape {
			PathShape::Scale { s } | PathShape::Pan { s, .. } => s.abs(),
		}
	}

	pub fn target(&self) -> Viewport {
		self.to
	}

	/// Viewport at fraction `t` of the path. `t = 1` is exactly the target.
	pub fn at(&self, t: f64) -> Viewport {
		if t >= 1.0 {
			return self.to;
		}
		let Viewport { x: x0, y: y0, span: w0 } = self.from;
		let (dx, dy) = (self.to.x - x0, self.to.y - y0);
		match self.shape {
			PathShape::Scale { s } => Viewport::new(
				x0 + t * dx,
				y0 + t * dy,
				w0 * (RHO * t * s).exp(),
			),
			PathShape::Pan { d1, r0, s } => {
				let st = t * s;
				let cosh_r0 = r0.cosh();
				let u = w0 / (RHO2 * d1) * (cosh_r0 * (RHO * st + r0).tanh() - r0.sinh());
				Viewport::new(
					x0 + u * dx,
					y0 + u * dy,
					w0 * cosh_r0 / (RHO * st + r0).cosh(),
				)
			}
		}
	}
}

#[derive(Clone, Debug)]
struct Animation {
	path: ZoomPath,
	elapsed: f64,
	duration: f64,
}

/// Owns the live view transform and any zoom in flight.
#[derive(Clone, Debug)]
pub struct ZoomEngine {
	base_diameter: f64,
	fallback_duration: f64,
	viewport: Viewport,
	transform: ViewTransform,
	animation: Option<Animation>,
}

impl ZoomEngine {
	/// Starts idle at `viewport`. `fallback_duration` (seconds) is used when a
	/// path cannot produce a finite duration of its own.
	pub fn new(viewport: Viewport, base_diameter: f64, fallback_duration: f64) -> Self {
		let base_diameter = if base_diameter > 0.0 { base_diameter } else { 1.0 };
		Self {
			base_diameter,
			fallback_duration: fallback_duration.max(0.0),
			viewport,
			transform: ViewTransform::from_viewport(viewport, base_diameter),
			animation: None,
		}
	}

	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	pub fn base_diameter(&self) -> f64 {
		self.base_diameter
	}

	pub fn is_animating(&self) -> bool {
		self.animation.is_some()
	}

	/// Target of the animation in flight, if any.
	pub fn target(&self) -> Option<Viewport> {
		self.animation.as_ref().map(|a| a.path.target())
	}

	/// Total duration of the animation in flight, in seconds.
	pub fn duration(&self) -> Option<f64> {
		self.animation.as_ref().map(|a| a.duration)
	}

	/// Begins animating from the current viewport toward `target`, replacing
	/// any animation already running.
	pub fn zoom_to(&mut self, target: Viewport) {
		let path = ZoomPath::new(self.viewport, target);
		let length = path.length();
		let duration = if length.is_finite() {
			length
		} else {
			self.fallback_duration
		};
		debug!(
			"zoom to ({:.2}, {:.2}) span {:.2} over {:.3}s",
			target.x, target.y, target.span, duration
		);
		self.animation = Some(Animation {
			path,
			elapsed: 0.0,
			duration,
		});
	}

	/// Moves the animation forward by `dt` seconds. Returns `true` while an
	/// animation remains in flight.
	pub fn advance(&mut self, dt: f64) -> bool {
		let Some(anim) = self.animation.as_mut() else {
			return false;
		};
		anim.elapsed += dt.max(0.0);
		let next = if anim.elapsed >= anim.duration {
			let target = anim.path.target();
			self.animation = None;
			target
		} else {
			anim.path.at(ease_cubic_in_out(anim.elapsed / anim.duration))
		};
		self.set_viewport(next);
		self.animation.is_some()
	}

	fn set_viewport(&mut self, viewport: Viewport) {
		self.viewport = viewport;
		self.transform = ViewTransform::from_viewport(viewport, self.base_diameter);
	}
}
