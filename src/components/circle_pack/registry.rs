use super::color::HitKey;
use super::types::Color;

/// Index of a node inside its [`NodeRegistry`].
pub type NodeId = usize;

/// A node positioned by the pack layout.
///
/// Geometry is in layout space and never changes after layout. Only the
/// highlight override and the hit-test key are written afterwards.
#[derive(Clone, Debug)]
pub struct PackedNode {
	pub id: NodeId,
	pub name: String,
	pub value: f64,
	pub x: f64,
	pub y: f64,
	pub r: f64,
	pub depth: usize,
	pub parent: Option<NodeId>,
	pub children: Vec<NodeId>,
	pub highlight: Option<Color>,
	pub(crate) hit_key: Option<HitKey>,
}

impl PackedNode {
	/// A detached node for layouts produced outside [`pack`](super::pack::pack).
	/// Hierarchy fields are filled in by the caller.
	pub fn new(name: impl Into<String>, x: f64, y: f64, r: f64) -> Self {
		Self {
			id: 0,
			name: name.into(),
			value: 0.0,
			x,
			y,
			r,
			depth: 0,
			parent: None,
			children: Vec::new(),
			highlight: None,
			hit_key: None,
		}
	}

	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// The key this node was drawn with on the hit-test surface, if any yet.
	pub fn hit_key(&self) -> Option<HitKey> {
		self.hit_key
	}

	pub(crate) fn has_valid_geometry(&self) -> bool {
		self.x.is_finite() && self.y.is_finite() && self.r.is_finite() && self.r >= 0.0
	}
}

/// Flat arena of packed nodes in layout (pre-order) order.
#[derive(Clone, Debug, Default)]
pub struct NodeRegistry {
	nodes: Vec<PackedNode>,
}

impl NodeRegistry {
	/// Wraps layout output. Ids are rewritten to match arena positions.
	pub fn new(mut nodes: Vec<PackedNode>) -> Self {
		for (i, node) in nodes.iter_mut().enumerate() {
			node.id = i;
		}
		Self { nodes }
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// The top of the hierarchy.
	pub fn root(&self) -> Option<&PackedNode> {
		self.nodes.first()
	}

	pub fn get(&self, id: NodeId) -> Option<&PackedNode> {
		self.nodes.get(id)
	}

	pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut PackedNode> {
		self.nodes.get_mut(id)
	}

	pub fn parent(&self, id: NodeId) -> Option<&PackedNode> {
		self.get(id)?.parent.and_then(|p| self.get(p))
	}

	pub fn children(&self, id: NodeId) -> impl Iterator<Item = &PackedNode> + '_ {
		self.get(id)
			.map(|n| n.children.as_slice())
			.unwrap_or_default()
			.iter()
			.filter_map(|&c| self.get(c))
	}

	/// Nodes in draw order.
	pub fn iter(&self) -> std::slice::Iter<'_, PackedNode> {
		self.nodes.iter()
	}

	pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, PackedNode> {
		self.nodes.iter_mut()
	}

	pub fn find_by_name(&self, name: &str) -> Option<&PackedNode> {
		self.nodes.iter().find(|n| n.name == name)
	}
}
