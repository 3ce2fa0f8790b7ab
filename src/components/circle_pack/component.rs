use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, MouseEvent, Window};

use super::config::CirclePackOptions;
use super::error::Result;
use super::hit::PointerKind;
use super::state::CirclePackState;
use super::surface::CanvasSurface;
use super::types::{Datum, NodeInfo};

struct View {
	state: CirclePackState,
	visible: CanvasSurface,
	hidden: CanvasSurface,
}

type SharedView = Rc<RefCell<Option<View>>>;

/// Zoomable circle-packing diagram on a canvas.
///
/// Clicking a circle zooms to it; clicking the focused circle zooms back out.
/// A second, hidden canvas holds the hit-test colors.
#[component]
pub fn CirclePackCanvas(
	#[prop(into)] data: Signal<Datum>,
	#[prop(optional)] options: Option<CirclePackOptions>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional)] on_click: Option<Callback<Option<NodeInfo>>>,
	#[prop(optional)] on_hover: Option<Callback<Option<NodeInfo>>>,
) -> impl IntoView {
	let options = options.unwrap_or_default();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let hidden_ref = NodeRef::<leptos::html::Canvas>::new();
	let (tooltip, set_tooltip) = signal(String::new());
	let view: SharedView = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (view_init, animate_init, resize_cb_init) =
		(view.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let dataset = data.get();
		let (Some(canvas), Some(hidden)) = (canvas_ref.get(), hidden_ref.get()) else {
			return;
		};
		let (canvas, hidden): (HtmlCanvasElement, HtmlCanvasElement) = (canvas.into(), hidden.into());
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = canvas_size(&canvas, &window, fullscreen, width, height);
		for c in [&canvas, &hidden] {
			c.set_width(w as u32);
			c.set_height(h as u32);
		}

		match build_view(&dataset, &options, &canvas, &hidden, w, h, on_click, on_hover) {
			Ok(v) => *view_init.borrow_mut() = Some(v),
			Err(e) => {
				warn!("circle pack: cannot initialise canvas: {e}");
				return;
			}
		}

		if fullscreen && resize_cb_init.borrow().is_none() {
			let (view_resize, canvas_resize, hidden_resize) =
				(view_init.clone(), canvas.clone(), hidden.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				for c in [&canvas_resize, &hidden_resize] {
					c.set_width(nw as u32);
					c.set_height(nh as u32);
				}
				if let Some(ref mut v) = *view_resize.borrow_mut() {
					v.state.resize(nw, nh);
					v.visible.resize(nw, nh);
					v.hidden.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		// the frame loop survives dataset changes; it always draws the current view
		if animate_init.borrow().is_some() {
			return;
		}
		let (view_anim, animate_inner) = (view_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			if let Some(ref mut v) = *view_anim.borrow_mut() {
				let View { state, visible, .. } = v;
				if let Err(e) = state.frame(timestamp, visible) {
					warn!("circle pack: frame skipped: {e}");
				}
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let view_click = view.clone();
	let on_canvas_click = move |ev: MouseEvent| {
		if let Some((x, y)) = event_position(canvas_ref, &ev) {
			handle_pointer(&view_click, PointerKind::Click, x, y, set_tooltip);
		}
	};

	let view_move = view.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = event_position(canvas_ref, &ev) {
			handle_pointer(&view_move, PointerKind::Move, x, y, set_tooltip);
		}
	};

	let view_leave = view.clone();
	let on_mouseleave = move |_: MouseEvent| {
		handle_pointer(&view_leave, PointerKind::Move, -1.0, -1.0, set_tooltip);
	};

	view! {
		<div class="circle-pack" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="circle-pack-canvas"
				on:click=on_canvas_click
				on:mousemove=on_mousemove
				on:mouseleave=on_mouseleave
				style="display: block; cursor: pointer;"
			/>
			<canvas node_ref=hidden_ref class="circle-pack-hidden" style="display: none;" />
			<span class="circle-pack-tooltip">{move || tooltip.get()}</span>
		</div>
	}
}

fn build_view(
	dataset: &Datum,
	options: &CirclePackOptions,
	canvas: &HtmlCanvasElement,
	hidden: &HtmlCanvasElement,
	w: f64,
	h: f64,
	on_click: Option<Callback<Option<NodeInfo>>>,
	on_hover: Option<Callback<Option<NodeInfo>>>,
) -> Result<View> {
	let visible = CanvasSurface::new(canvas, false)?;
	let hidden = CanvasSurface::new(hidden, true)?;
	let mut state = CirclePackState::new(dataset, options, w, h)?;
	if let Some(cb) = on_click {
		state.on_click(move |node| cb.run(node.map(NodeInfo::from)));
	}
	if let Some(cb) = on_hover {
		state.on_hover(move |node| cb.run(node.map(NodeInfo::from)));
	}
	info!("circle pack: canvas ready at {w}x{h}");
	Ok(View {
		state,
		visible,
		hidden,
	})
}

/// Redraws the hidden canvas, resolves the pointer and updates the tooltip.
fn handle_pointer(
	view: &SharedView,
	kind: PointerKind,
	x: f64,
	y: f64,
	set_tooltip: WriteSignal<String>,
) {
	let mut guard = view.borrow_mut();
	let Some(View { state, hidden, .. }) = guard.as_mut() else {
		return;
	};
	match state.pointer(hidden, kind, x, y) {
		Ok(hit) if kind == PointerKind::Move => {
			let label = hit
				.filter(|&id| !state.is_focus(id))
				.and_then(|id| state.node(id))
				.map(|n| n.name.clone())
				.unwrap_or_default();
			set_tooltip.set(label);
		}
		Ok(_) => {}
		Err(e) => warn!("circle pack: pointer event dropped: {e}"),
	}
}

fn event_position(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	ev: &MouseEvent,
) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		f64::from(ev.client_x()) - rect.left(),
		f64::from(ev.client_y()) - rect.top(),
	))
}

fn window_size(window: &Window) -> (f64, f64) {
	let dim = |v: std::result::Result<JsValue, JsValue>, fallback: f64| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(
		dim(window.inner_width(), 800.0),
		dim(window.inner_height(), 600.0),
	)
}

fn canvas_size(
	canvas: &HtmlCanvasElement,
	window: &Window,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		return window_size(window);
	}
	(
		width.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| f64::from(p.client_width()))
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| f64::from(p.client_height()))
				.unwrap_or(600.0)
		}),
	)
}
