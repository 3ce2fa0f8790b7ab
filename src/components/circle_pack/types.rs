use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{CirclePackError, Result};
use super::registry::{NodeId, PackedNode};

/// One element of the input hierarchy.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Datum {
	pub name: String,
	#[serde(default, alias = "ID")]
	pub id: Option<u64>,
	#[serde(default)]
	pub size: Option<f64>,
	#[serde(default)]
	pub children: Vec<Datum>,
}

impl Datum {
	pub fn leaf(name: impl Into<String>, size: f64) -> Self {
		Self {
			name: name.into(),
			size: Some(size),
			..Self::default()
		}
	}

	pub fn branch(name: impl Into<String>, children: Vec<Datum>) -> Self {
		Self {
			name: name.into(),
			children,
			..Self::default()
		}
	}

	/// Parses a dataset from its JSON form.
	pub fn from_json(text: &str) -> Result<Self> {
		Ok(serde_json::from_str(text)?)
	}
}

/// Summary of a packed node handed to component callbacks.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeInfo {
	pub id: NodeId,
	pub name: String,
	pub depth: usize,
	pub value: f64,
}

impl From<&PackedNode> for NodeInfo {
	fn from(node: &PackedNode) -> Self {
		Self {
			id: node.id,
			name: node.name.clone(),
			depth: node.depth,
			value: node.value,
		}
	}
}

/// Opaque-or-transparent 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: u8,
}

impl Color {
	pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
	pub const WHITE: Color = Color::rgb(255, 255, 255);

	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 255 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
		Self { r, g, b, a }
	}

	/// CSS form accepted by `CanvasRenderingContext2d::set_fill_style_str`.
	pub fn to_css(self) -> String {
		if self.a == 255 {
			format!("rgb({},{},{})", self.r, self.g, self.b)
		} else {
			format!(
				"rgba({},{},{},{})",
				self.r,
				self.g,
				self.b,
				f64::from(self.a) / 255.0
			)
		}
	}
}

impl FromStr for Color {
	type Err = CirclePackError;

	fn from_str(s: &str) -> Result<Self> {
		let invalid = || CirclePackError::InvalidColor(s.to_string());
		let trimmed = s.trim();
		match trimmed.to_ascii_lowercase().as_str() {
			"white" => return Ok(Color::WHITE),
			"black" => return Ok(Color::rgb(0, 0, 0)),
			"transparent" => return Ok(Color::TRANSPARENT),
			_ => {}
		}
		let hex = trimmed.strip_prefix('#').ok_or_else(invalid)?;
		if !hex.is_ascii() {
			return Err(invalid());
		}
		let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| invalid());
		match hex.len() {
			3 => {
				let expand = |i: usize| channel(&hex[i..=i].repeat(2));
				Ok(Color::rgb(expand(0)?, expand(1)?, expand(2)?))
			}
			6 => Ok(Color::rgb(
				channel(&hex[0..2])?,
				channel(&hex[2..4])?,
				channel(&hex[4..6])?,
			)),
			_ => Err(invalid()),
		}
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
	}
}
