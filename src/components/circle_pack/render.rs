use super::config::Palette;
use super::error::{CirclePackError, Result};
use super::registry::PackedNode;
use super::state::CirclePackState;
use super::surface::Surface;
use super::types::Color;

/// What a render pass encodes in its fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
	/// Palette colors for display.
	Visual,
	/// One unique key color per node, on a transparent background.
	HitTest,
}

/// Draws every node onto `surface` through the current view transform.
///
/// Geometry is validated (and, in hit-test mode, keys are assigned) before the
/// surface is touched, so a failed pass leaves the previous frame intact.
pub fn render<S: Surface + ?Sized>(
	state: &mut CirclePackState,
	surface: &mut S,
	mode: RenderMode,
) -> Result<()> {
	if let Some(bad) = state.registry.iter().find(|n| !n.has_valid_geometry()) {
		return Err(CirclePackError::MalformedNode {
			id: bad.id,
			x: bad.x,
			y: bad.y,
			r: bad.r,
		});
	}
	if mode == RenderMode::HitTest {
		assign_hit_keys(state)?;
	}

	surface.clear(match mode {
		RenderMode::Visual => Some(state.palette.background),
		RenderMode::HitTest => None,
	});

	let transform = state.zoom.transform();
	let origin = state.viewport_center();
	for node in state.registry.iter() {
		let fill = match mode {
			RenderMode::Visual => visual_fill(&state.palette, node),
			RenderMode::HitTest => match node.hit_key {
				Some(key) => key.color(),
				None => continue,
			},
		};
		let (x, y) = transform.apply(node.x, node.y, origin);
		surface.fill_circle(x, y, node.r * transform.scale, fill);
	}
	Ok(())
}

fn assign_hit_keys(state: &mut CirclePackState) -> Result<()> {
	for node in state.registry.iter_mut() {
		if node.hit_key.is_some() {
			continue;
		}
		let key = state.allocator.allocate()?;
		node.hit_key = Some(key);
		state.colors.insert(key, node.id);
	}
	Ok(())
}

fn visual_fill(palette: &Palette, node: &PackedNode) -> Color {
	if let Some(c) = node.highlight {
		c
	} else if node.is_leaf() {
		palette.leaf
	} else {
		palette.depth_color(node.depth)
	}
}
