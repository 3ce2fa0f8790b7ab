use thiserror::Error;

use super::registry::NodeId;

/// Errors raised by the circle-pack core.
#[derive(Debug, Error)]
pub enum CirclePackError {
	/// The hit-test color space cannot encode another node.
	#[error("hit-test color space exhausted after {assigned} nodes")]
	CapacityExceeded { assigned: usize },
	/// A node reached the renderer with unusable geometry.
	#[error("node {id} has malformed geometry (x={x}, y={y}, r={r})")]
	MalformedNode { id: NodeId, x: f64, y: f64, r: f64 },
	/// A configured color could not be parsed.
	#[error("invalid color {0:?}")]
	InvalidColor(String),
	/// A raster backend failed.
	#[error("surface error: {0}")]
	Surface(String),
	/// The dataset could not be decoded.
	#[error("invalid dataset: {0}")]
	Dataset(#[from] serde_json::Error),
}

/// Result alias for circle-pack operations.
pub type Result<T> = std::result::Result<T, CirclePackError>;
