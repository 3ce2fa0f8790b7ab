use super::color::{ColorRegistry, HitKey};
use super::error::Result;
use super::registry::NodeId;
use super::surface::Surface;

/// Kind of pointer interaction being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
	Click,
	Move,
}

/// Looks up the node drawn at `(x, y)` on a hit-test surface.
///
/// The surface must have been redrawn for the current transform; a stale
/// surface answers for wherever the nodes used to be. Background and
/// unregistered colors resolve to `None`.
pub fn resolve<S: Surface + ?Sized>(
	surface: &S,
	colors: &ColorRegistry,
	x: f64,
	y: f64,
) -> Result<Option<NodeId>> {
	if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
		return Ok(None);
	}
	let Some([r, g, b, a]) = surface.read_pixel(x.floor() as u32, y.floor() as u32)? else {
		return Ok(None);
	};
	if a == 0 {
		return Ok(None);
	}
	Ok(colors.lookup(HitKey::from_rgb(r, g, b)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::circle_pack::surface::PixmapSurface;
	use crate::components::circle_pack::types::Color;

	#[test]
	fn resolves_registered_colors_only() {
		let mut colors = ColorRegistry::default();
		let key = HitKey::from_rgb(101, 0, 0);
		colors.insert(key, 4);

		let mut surface = PixmapSurface::hit_test(10, 10).unwrap();
		surface.clear(None);
		surface.fill_circle(3.0, 3.0, 2.5, key.color());
		surface.fill_circle(8.0, 8.0, 1.5, Color::rgb(7, 7, 7));

		assert_eq!(resolve(&surface, &colors, 3.2, 3.7).unwrap(), Some(4));
		assert_eq!(resolve(&surface, &colors, 8.0, 8.0).unwrap(), None);
		assert_eq!(resolve(&surface, &colors, 0.0, 9.0).unwrap(), None);
		assert_eq!(resolve(&surface, &colors, -1.0, 3.0).unwrap(), None);
		assert_eq!(resolve(&surface, &colors, 30.0, 3.0).unwrap(), None);
		assert_eq!(resolve(&surface, &colors, f64::NAN, 3.0).unwrap(), None);
	}

	#[test]
	fn pixels_past_the_right_edge_do_not_wrap() {
		let mut colors = ColorRegistry::default();
		let key = HitKey::from_rgb(1, 0, 0);
		colors.insert(key, 7);

		let mut surface = PixmapSurface::hit_test(10, 10).unwrap();
		surface.clear(None);
		// fills the start of row 6, where (12, 5) would land if rows wrapped
		surface.fill_circle(2.0, 6.0, 2.0, key.color());

		assert_eq!(resolve(&surface, &colors, 2.5, 6.5).unwrap(), Some(7));
		assert_eq!(resolve(&surface, &colors, 12.5, 5.5).unwrap(), None);
		assert_eq!(surface.read_pixel(12, 5).unwrap(), None);
	}
}
