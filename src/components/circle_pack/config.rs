use std::rc::Rc;

use super::color::DEFAULT_STRIDE;
use super::error::Result;
use super::pack::{SortFn, ValueFn, descending_value, size_value};
use super::types::Color;

/// Fill colors by depth for internal nodes.
pub const DEFAULT_COLOR_RANGE: &[&str] = &[
	"#9677FF", "#CFC1FB", "#655E7A", "#765DC7", "#4A3A7A", "#A599C7", "#9475FA", "#FFFFFF",
];

/// Ratio of a focused node's diameter to the visible span.
pub const DEFAULT_MARGIN: f64 = 2.05;

/// Share of the smaller surface side the whole diagram occupies.
pub const FIT_RATIO: f64 = 0.9;

/// Options for building a [`CirclePackState`](super::state::CirclePackState).
#[derive(Clone)]
pub struct CirclePackOptions {
	/// Gap between sibling circles.
	pub padding: f64,
	/// Internal node fill, indexed by depth (cycled).
	pub color_range: Vec<String>,
	pub leaf_color: String,
	pub background: String,
	/// Highlight applied to the node under the pointer, if any.
	pub hover_color: Option<String>,
	pub value: ValueFn,
	pub sort: Option<SortFn>,
	/// Seconds; used when a zoom path cannot produce its own duration.
	pub initial_duration: f64,
	/// Must exceed 2.0 so the focused circle is fully visible.
	pub margin: f64,
	pub hit_color_stride: u32,
}

impl Default for CirclePackOptions {
	fn default() -> Self {
		Self {
			padding: 1.0,
			color_range: DEFAULT_COLOR_RANGE.iter().map(|c| c.to_string()).collect(),
			leaf_color: "#FFFFFF".into(),
			background: "#FFFFFF".into(),
			hover_color: None,
			value: Rc::new(size_value),
			sort: Some(Rc::new(descending_value)),
			initial_duration: 2.0,
			margin: DEFAULT_MARGIN,
			hit_color_stride: DEFAULT_STRIDE,
		}
	}
}

/// Parsed visual colors.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
	pub range: Vec<Color>,
	pub leaf: Color,
	pub background: Color,
	pub hover: Option<Color>,
}

impl Palette {
	pub fn from_options(options: &CirclePackOptions) -> Result<Self> {
		Ok(Self {
			range: options
				.color_range
				.iter()
				.map(|c| c.parse::<Color>())
				.collect::<Result<_>>()?,
			leaf: options.leaf_color.parse()?,
			background: options.background.parse()?,
			hover: options.hover_color.as_deref().map(str::parse::<Color>).transpose()?,
		})
	}

	/// Fill of an internal node at `depth`.
	pub fn depth_color(&self, depth: usize) -> Color {
		if self.range.is_empty() {
			return self.leaf;
		}
		self.range[depth % self.range.len()]
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::circle_pack::error::CirclePackError;

	#[test]
	fn default_palette_parses() {
		let p = Palette::from_options(&CirclePackOptions::default()).unwrap();
		assert_eq!(p.range.len(), 8);
		assert_eq!(p.depth_color(0), Color::rgb(0x96, 0x77, 0xFF));
		assert_eq!(p.depth_color(9), p.depth_color(1));
		assert_eq!(p.leaf, Color::WHITE);
		assert!(p.hover.is_none());
	}

	#[test]
	fn bad_color_is_reported() {
		let options = CirclePackOptions {
			hover_color: Some("not-a-color".into()),
			..CirclePackOptions::default()
		};
		match Palette::from_options(&options) {
			Err(CirclePackError::InvalidColor(c)) => assert_eq!(c, "not-a-color"),
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn empty_range_falls_back_to_leaf_color() {
		let options = CirclePackOptions {
			color_range: Vec::new(),
			..CirclePackOptions::default()
		};
		let p = Palette::from_options(&options).unwrap();
		assert_eq!(p.depth_color(3), p.leaf);
	}
}
