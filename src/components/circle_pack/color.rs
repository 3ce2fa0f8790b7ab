//! Hit-test color keys.
//!
//! Every node drawn to the hidden surface is filled with a color that no
//! other node uses. Reading a pixel back and looking its color up in the
//! [`ColorRegistry`] yields the node under that pixel.

use std::collections::HashMap;

use super::error::{CirclePackError, Result};
use super::registry::NodeId;
use super::types::Color;

/// Number of distinct keys three 8-bit channels can hold.
pub const KEY_SPACE: u32 = 1 << 24;

/// Default distance between consecutive keys.
pub const DEFAULT_STRIDE: u32 = 100;

/// A 24-bit color key: red is the low byte, then green, then blue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HitKey(u32);

impl HitKey {
	/// Key for an RGB triple sampled from a surface.
	pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
		Self(u32::from(r) | (u32::from(g) << 8) | (u32::from(b) << 16))
	}

	pub fn value(self) -> u32 {
		self.0
	}

	/// The opaque fill color that encodes this key.
	pub fn color(self) -> Color {
		let [r, g, b, _] = self.0.to_le_bytes();
		Color::rgb(r, g, b)
	}
}

/// Hands out unique keys from a monotonically increasing counter.
#[derive(Clone, Debug)]
pub struct ColorAllocator {
	next: u32,
	stride: u32,
	assigned: usize,
}

impl Default for ColorAllocator {
	fn default() -> Self {
		Self::with_stride(DEFAULT_STRIDE)
	}
}

impl ColorAllocator {
	/// A stride of zero is treated as one.
	pub fn with_stride(stride: u32) -> Self {
		Self {
			next: 1,
			stride: stride.max(1),
			assigned: 0,
		}
	}

	/// Produces the next key, or fails once the key space is exhausted.
	pub fn allocate(&mut self) -> Result<HitKey> {
		if self.next >= KEY_SPACE {
			return Err(CirclePackError::CapacityExceeded {
				assigned: self.assigned,
			});
		}
		let key = HitKey(self.next);
		self.next = self.next.saturating_add(self.stride);
		self.assigned += 1;
		Ok(key)
	}

	/// Number of keys handed out so far.
	pub fn assigned(&self) -> usize {
		self.assigned
	}
}

/// Reverse index from hit-test key to node. Entries are never removed.
#[derive(Clone, Debug, Default)]
pub struct ColorRegistry {
	by_key: HashMap<HitKey, NodeId>,
}

impl ColorRegistry {
	pub fn insert(&mut self, key: HitKey, node: NodeId) {
		self.by_key.insert(key, node);
	}

	pub fn lookup(&self, key: HitKey) -> Option<NodeId> {
		self.by_key.get(&key).copied()
	}

	pub fn len(&self) -> usize {
		self.by_key.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_key.is_empty()
	}
}
