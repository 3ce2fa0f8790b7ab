use log::{info, warn};

use super::color::{ColorAllocator, ColorRegistry};
use super::config::{CirclePackOptions, DEFAULT_MARGIN, FIT_RATIO, Palette};
use super::driver::FrameClock;
use super::error::{CirclePackError, Result};
use super::hit::{self, PointerKind};
use super::pack::{PackOptions, pack};
use super::registry::{NodeId, NodeRegistry, PackedNode};
use super::render::{self, RenderMode};
use super::surface::Surface;
use super::types::{Color, Datum};
use super::zoom::{ViewTransform, Viewport, ZoomEngine};

/// Receives the node resolved by a pointer event, or `None` for background.
pub type NodeCallback = Box<dyn FnMut(Option<&PackedNode>)>;

/// Everything one circle-pack view needs between frames.
pub struct CirclePackState {
	pub(super) registry: NodeRegistry,
	pub(super) palette: Palette,
	pub(super) allocator: ColorAllocator,
	pub(super) colors: ColorRegistry,
	pub(super) zoom: ZoomEngine,
	pub(super) clock: FrameClock,
	margin: f64,
	focus: Option<NodeId>,
	hovered: Option<NodeId>,
	width: f64,
	height: f64,
	click_handlers: Vec<NodeCallback>,
	hover_handlers: Vec<NodeCallback>,
}

impl CirclePackState {
	/// Lays out `dataset` to fit a `width` x `height` viewport.
	pub fn new(
		dataset: &Datum,
		options: &CirclePackOptions,
		width: f64,
		height: f64,
	) -> Result<Self> {
		let diameter = base_diameter(width, height);
		let nodes = pack(
			dataset,
			&PackOptions {
				padding: options.padding,
				size: (diameter, diameter),
				value: options.value.clone(),
				sort: options.sort.clone(),
			},
		);
		info!("circle pack: {} nodes", nodes.len());
		Self::from_layout(nodes, options, width, height)
	}

	/// Builds the view from nodes laid out elsewhere. The list must be in
	/// pre-order with the root first; it may be empty.
	pub fn from_layout(
		nodes: Vec<PackedNode>,
		options: &CirclePackOptions,
		width: f64,
		height: f64,
	) -> Result<Self> {
		let palette = Palette::from_options(options)?;
		let registry = NodeRegistry::new(nodes);
		let margin = if options.margin > 2.0 {
			options.margin
		} else {
			warn!("margin {} would clip the focused circle; using 2.05", options.margin);
			DEFAULT_MARGIN
		};
		let diameter = base_diameter(width, height);
		let home = registry
			.root()
			.filter(|r| r.has_valid_geometry())
			.map(|r| Viewport::new(r.x, r.y, r.r * margin))
			.unwrap_or_else(|| Viewport::new(0.0, 0.0, diameter));
		Ok(Self {
			focus: registry.root().map(|r| r.id),
			registry,
			palette,
			allocator: ColorAllocator::with_stride(options.hit_color_stride),
			colors: ColorRegistry::default(),
			zoom: ZoomEngine::new(home, diameter, options.initial_duration),
			clock: FrameClock::default(),
			margin,
			hovered: None,
			width,
			height,
			click_handlers: Vec::new(),
			hover_handlers: Vec::new(),
		})
	}

	pub fn registry(&self) -> &NodeRegistry {
		&self.registry
	}

	pub fn node(&self, id: NodeId) -> Option<&PackedNode> {
		self.registry.get(id)
	}

	pub fn root(&self) -> Option<&PackedNode> {
		self.registry.root()
	}

	pub fn palette(&self) -> &Palette {
		&self.palette
	}

	pub fn color_registry(&self) -> &ColorRegistry {
		&self.colors
	}

	pub fn zoom_engine(&self) -> &ZoomEngine {
		&self.zoom
	}

	pub fn transform(&self) -> ViewTransform {
		self.zoom.transform()
	}

	pub fn is_animating(&self) -> bool {
		self.zoom.is_animating()
	}

	/// Node the view is framing, or heading toward.
	pub fn focus(&self) -> Option<NodeId> {
		self.focus
	}

	pub fn is_focus(&self, id: NodeId) -> bool {
		self.focus == Some(id)
	}

	pub fn hovered(&self) -> Option<NodeId> {
		self.hovered
	}

	pub fn width(&self) -> f64 {
		self.width
	}

	pub fn height(&self) -> f64 {
		self.height
	}

	/// Screen position that layout-space center of the view maps to.
	pub fn viewport_center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}

	/// Viewport that frames `id` with the configured margin.
	pub fn viewport_for(&self, id: NodeId) -> Option<Viewport> {
		let node = self.registry.get(id)?;
		Some(Viewport::new(node.x, node.y, node.r * self.margin))
	}

	/// Starts animating toward `id`. Unknown ids are ignored.
	pub fn zoom_to(&mut self, id: NodeId) -> Result<()> {
		let Some(node) = self.registry.get(id) else {
			warn!("zoom to unknown node {id}");
			return Ok(());
		};
		if !node.has_valid_geometry() {
			return Err(CirclePackError::MalformedNode {
				id,
				x: node.x,
				y: node.y,
				r: node.r,
			});
		}
		let target = Viewport::new(node.x, node.y, node.r * self.margin);
		self.zoom.zoom_to(target);
		self.focus = Some(id);
		Ok(())
	}

	/// Zooms back to the root. No-op on an empty registry.
	pub fn zoom_reset(&mut self) -> Result<()> {
		match self.registry.root().map(|r| r.id) {
			Some(root) => self.zoom_to(root),
			None => Ok(()),
		}
	}

	/// Draws the current state onto `surface`.
	pub fn render<S: Surface + ?Sized>(&mut self, surface: &mut S, mode: RenderMode) -> Result<()> {
		render::render(self, surface, mode)
	}

	/// Redraws `hidden` and returns the node under `(x, y)`.
	pub fn node_at_pixel<S: Surface + ?Sized>(
		&mut self,
		hidden: &mut S,
		x: f64,
		y: f64,
	) -> Result<Option<NodeId>> {
		self.render(hidden, RenderMode::HitTest)?;
		hit::resolve(hidden, &self.colors, x, y)
	}

	/// Handles a pointer event: redraws the hit surface, resolves the pixel,
	/// applies the built-in behaviour and then runs the registered callbacks.
	///
	/// A click on a node zooms to it, or back to the root when it already is
	/// the focus. Moving sets the hovered node.
	pub fn pointer<S: Surface + ?Sized>(
		&mut self,
		hidden: &mut S,
		kind: PointerKind,
		x: f64,
		y: f64,
	) -> Result<Option<NodeId>> {
		let hit = self.node_at_pixel(hidden, x, y)?;
		match kind {
			PointerKind::Click => {
				if let Some(id) = hit {
					if self.is_focus(id) {
						self.zoom_reset()?;
					} else {
						self.zoom_to(id)?;
					}
				}
				let node = hit.and_then(|id| self.registry.get(id));
				for cb in &mut self.click_handlers {
					cb(node);
				}
			}
			PointerKind::Move => {
				self.set_hovered(hit);
				let node = hit.and_then(|id| self.registry.get(id));
				for cb in &mut self.hover_handlers {
					cb(node);
				}
			}
		}
		Ok(hit)
	}

	pub fn on_click(&mut self, cb: impl FnMut(Option<&PackedNode>) + 'static) {
		self.click_handlers.push(Box::new(cb));
	}

	pub fn on_hover(&mut self, cb: impl FnMut(Option<&PackedNode>) + 'static) {
		self.hover_handlers.push(Box::new(cb));
	}

	/// Sets or clears the transient fill override of `id`.
	pub fn set_highlight(&mut self, id: NodeId, color: Option<Color>) {
		if let Some(node) = self.registry.get_mut(id) {
			node.highlight = color;
		}
	}

	pub fn clear_highlights(&mut self) {
		for node in self.registry.iter_mut() {
			node.highlight = None;
		}
	}

	fn set_hovered(&mut self, hit: Option<NodeId>) {
		if self.hovered == hit {
			return;
		}
		if let Some(color) = self.palette.hover {
			if let Some(prev) = self.hovered {
				self.set_highlight(prev, None);
			}
			if let Some(id) = hit {
				self.set_highlight(id, Some(color));
			}
		}
		self.hovered = hit;
	}

	/// Updates the viewport size. The layout keeps its scale.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

fn base_diameter(width: f64, height: f64) -> f64 {
	(width * FIT_RATIO).min(height * FIT_RATIO)
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::components::circle_pack::surface::PixmapSurface;

	fn sample() -> CirclePackState {
		let data = Datum::branch(
			"root",
			vec![
				Datum::branch("group", vec![Datum::leaf("a", 4.0), Datum::leaf("b", 6.0)]),
				Datum::leaf("c", 5.0),
			],
		);
		CirclePackState::new(&data, &CirclePackOptions::default(), 200.0, 200.0).unwrap()
	}

	fn screen_center(s: &CirclePackState, id: NodeId) -> (f64, f64) {
		let n = s.node(id).unwrap();
		s.transform().apply(n.x, n.y, s.viewport_center())
	}

	#[test]
	fn starts_on_the_root_fitting_the_viewport() {
		let s = sample();
		let root = s.root().unwrap();
		let t = s.transform();
		assert_eq!((t.center_x, t.center_y), (root.x, root.y));
		assert!(root.r * t.scale <= 90.0);
		assert!(s.is_focus(0));
		assert!(!s.is_animating());
	}

	#[test]
	fn click_toggles_between_node_and_root() {
		let mut s = sample();
		let mut hidden = PixmapSurface::hit_test(200, 200).unwrap();
		let home = s.transform();
		let c = s.registry().find_by_name("c").unwrap().id;

		let (x, y) = screen_center(&s, c);
		assert_eq!(s.pointer(&mut hidden, PointerKind::Click, x, y).unwrap(), Some(c));
		assert!(s.is_focus(c));
		while s.zoom.advance(1.0 / 60.0) {}
		assert_eq!(s.zoom.viewport(), s.viewport_for(c).unwrap());

		let (x, y) = screen_center(&s, c);
		assert_eq!(s.pointer(&mut hidden, PointerKind::Click, x, y).unwrap(), Some(c));
		assert!(s.is_focus(0));
		while s.zoom.advance(1.0 / 60.0) {}
		assert_eq!(s.transform(), home);
	}

	#[test]
	fn background_click_changes_nothing() {
		let mut s = sample();
		let mut hidden = PixmapSurface::hit_test(200, 200).unwrap();
		assert_eq!(s.pointer(&mut hidden, PointerKind::Click, 1.0, 1.0).unwrap(), None);
		assert!(!s.is_animating());
		assert!(s.is_focus(0));
	}

	#[test]
	fn callbacks_run_after_resolution() {
		let mut s = sample();
		let mut hidden = PixmapSurface::hit_test(200, 200).unwrap();
		let seen: Rc<RefCell<Vec<Option<String>>>> = Rc::default();
		let sink = seen.clone();
		s.on_hover(move |n| sink.borrow_mut().push(n.map(|n| n.name.clone())));
		let a = s.registry().find_by_name("a").unwrap().id;
		let (x, y) = screen_center(&s, a);
		s.pointer(&mut hidden, PointerKind::Move, x, y).unwrap();
		s.pointer(&mut hidden, PointerKind::Move, 0.0, 0.0).unwrap();
		assert_eq!(*seen.borrow(), vec![Some("a".to_string()), None]);
		assert_eq!(s.hovered(), None);
	}

	#[test]
	fn hover_color_follows_the_pointer() {
		let data = Datum::branch("root", vec![Datum::leaf("a", 1.0), Datum::leaf("b", 1.0)]);
		let options = CirclePackOptions {
			hover_color: Some("#FF0000".into()),
			..CirclePackOptions::default()
		};
		let mut s = CirclePackState::new(&data, &options, 100.0, 100.0).unwrap();
		let mut hidden = PixmapSurface::hit_test(100, 100).unwrap();
		let (a, b) = (1, 2);
		let (x, y) = screen_center(&s, a);
		s.pointer(&mut hidden, PointerKind::Move, x, y).unwrap();
		assert_eq!(s.node(a).unwrap().highlight, Some(Color::rgb(255, 0, 0)));
		let (x, y) = screen_center(&s, b);
		s.pointer(&mut hidden, PointerKind::Move, x, y).unwrap();
		assert_eq!(s.node(a).unwrap().highlight, None);
		assert_eq!(s.node(b).unwrap().highlight, Some(Color::rgb(255, 0, 0)));
		s.clear_highlights();
		assert!(s.registry().iter().all(|n| n.highlight.is_none()));
	}

	#[test]
	fn empty_layout_is_inert() {
		let mut s =
			CirclePackState::from_layout(Vec::new(), &CirclePackOptions::default(), 50.0, 50.0)
				.unwrap();
		let before = s.transform();
		s.zoom_reset().unwrap();
		assert!(!s.is_animating());
		assert_eq!(s.transform(), before);
		let mut hidden = PixmapSurface::hit_test(50, 50).unwrap();
		assert_eq!(s.node_at_pixel(&mut hidden, 25.0, 25.0).unwrap(), None);
		assert!(s.focus().is_none());
	}

	#[test]
	fn resize_keeps_the_root_centered() {
		let mut s = sample();
		let scale = s.transform().scale;
		s.resize(400.0, 300.0);
		assert_eq!((s.width(), s.height()), (400.0, 300.0));
		assert_eq!(s.viewport_center(), (200.0, 150.0));
		assert_eq!(screen_center(&s, 0), (200.0, 150.0));
		assert_eq!(s.transform().scale, scale);

		let mut hidden = PixmapSurface::hit_test(400, 300).unwrap();
		let c = s.registry().find_by_name("c").unwrap().id;
		let (x, y) = screen_center(&s, c);
		assert_eq!(s.node_at_pixel(&mut hidden, x, y).unwrap(), Some(c));
	}

	#[test]
	fn zoom_to_unknown_node_is_ignored() {
		let mut s = sample();
		s.zoom_to(999).unwrap();
		assert!(!s.is_animating());
	}

	#[test]
	fn invalid_palette_is_rejected() {
		let options = CirclePackOptions {
			background: "#12".into(),
			..CirclePackOptions::default()
		};
		assert!(matches!(
			CirclePackState::from_layout(Vec::new(), &options, 10.0, 10.0),
			Err(CirclePackError::InvalidColor(_))
		));
	}
}
