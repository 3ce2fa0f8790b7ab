use super::error::Result;
use super::render::RenderMode;
use super::state::CirclePackState;
use super::surface::Surface;

/// Turns display-refresh timestamps into per-frame deltas.
#[derive(Clone, Debug, Default)]
pub struct FrameClock {
	last: Option<f64>,
}

impl FrameClock {
	/// Seconds since the previous timestamp (milliseconds). The first frame,
	/// and any timestamp that runs backwards, yields zero.
	pub fn delta(&mut self, timestamp_ms: f64) -> f64 {
		let dt = match self.last {
			Some(last) if timestamp_ms > last => (timestamp_ms - last) / 1000.0,
			_ => 0.0,
		};
		self.last = Some(timestamp_ms);
		dt
	}
}

impl CirclePackState {
	/// Advances any zoom in flight by `dt` seconds and repaints `visible`.
	///
	/// The hit-test surface is never drawn here; pointer handling redraws it
	/// when it is needed.
	pub fn tick<S: Surface + ?Sized>(&mut self, dt: f64, visible: &mut S) -> Result<()> {
		self.zoom.advance(dt);
		self.render(visible, RenderMode::Visual)
	}

	/// [`tick`](Self::tick) driven by a display-refresh timestamp in
	/// milliseconds, as passed to `requestAnimationFrame` callbacks.
	pub fn frame<S: Surface + ?Sized>(&mut self, timestamp_ms: f64, visible: &mut S) -> Result<()> {
		let dt = self.clock.delta(timestamp_ms);
		self.tick(dt, visible)
	}
}
