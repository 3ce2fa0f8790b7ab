use std::collections::HashSet;

use circle_pack_canvas::{
	CirclePackError, CirclePackOptions, CirclePackState, Datum, KEY_SPACE, NodeId, PixmapSurface,
	PointerKind, RenderMode, Surface, resolve,
};

const FRAME: f64 = 1.0 / 60.0;

fn three_nodes() -> CirclePackState {
	let data = Datum::branch("root", vec![Datum::leaf("small", 10.0), Datum::leaf("large", 20.0)]);
	let options = CirclePackOptions {
		padding: 1.0,
		..CirclePackOptions::default()
	};
	CirclePackState::new(&data, &options, 100.0, 100.0).unwrap()
}

fn nested() -> CirclePackState {
	let data = Datum::branch(
		"flare",
		vec![
			Datum::branch(
				"analytics",
				vec![
					Datum::branch("cluster", vec![Datum::leaf("a", 38.0), Datum::leaf("b", 31.0)]),
					Datum::leaf("graph", 24.0),
					Datum::leaf("optim", 17.0),
				],
			),
			Datum::branch(
				"animate",
				vec![
					Datum::leaf("easing", 17.0),
					Datum::leaf("tween", 61.0),
					Datum::leaf("pause", 4.0),
				],
			),
			Datum::leaf("flex", 42.0),
			Datum::leaf("util", 9.0),
		],
	);
	CirclePackState::new(&data, &CirclePackOptions::default(), 240.0, 200.0).unwrap()
}

fn screen_disc(s: &CirclePackState, id: NodeId) -> (f64, f64, f64) {
	let n = s.node(id).unwrap();
	let t = s.transform();
	let (x, y) = t.apply(n.x, n.y, s.viewport_center());
	(x, y, n.r * t.scale)
}

fn run_to_end(s: &mut CirclePackState, visible: &mut PixmapSurface) {
	let mut frames = 0;
	while s.is_animating() {
		s.tick(FRAME, visible).unwrap();
		frames += 1;
		assert!(frames < 100_000, "animation never finished");
	}
}

#[test]
fn centroid_of_the_larger_leaf_resolves_to_it() {
	let mut s = three_nodes();
	let mut visible = PixmapSurface::new(100, 100).unwrap();
	let mut hidden = PixmapSurface::hit_test(100, 100).unwrap();
	s.tick(0.0, &mut visible).unwrap();

	let large = s.registry().find_by_name("large").unwrap().id;
	let (x, y, _) = screen_disc(&s, large);
	let hit = s.node_at_pixel(&mut hidden, x, y).unwrap();
	assert_eq!(hit.and_then(|id| s.node(id)).map(|n| n.name.as_str()), Some("large"));

	assert_eq!(s.node_at_pixel(&mut hidden, 0.0, 0.0).unwrap(), None);
	assert_eq!(s.node_at_pixel(&mut hidden, 99.0, 99.0).unwrap(), None);
}

#[test]
fn clicking_the_focused_leaf_returns_to_the_root() {
	let mut s = three_nodes();
	let mut visible = PixmapSurface::new(100, 100).unwrap();
	let mut hidden = PixmapSurface::hit_test(100, 100).unwrap();
	let home = s.transform();
	let large = s.registry().find_by_name("large").unwrap().id;

	let (x, y, _) = screen_disc(&s, large);
	assert_eq!(s.pointer(&mut hidden, PointerKind::Click, x, y).unwrap(), Some(large));
	run_to_end(&mut s, &mut visible);
	assert!(s.is_focus(large));
	assert_eq!(s.zoom_engine().viewport(), s.viewport_for(large).unwrap());

	// the focused leaf now sits in the middle of the viewport
	let (x, y, r) = screen_disc(&s, large);
	assert!((x - 50.0).abs() < 1e-9 && (y - 50.0).abs() < 1e-9);
	assert!(r * 2.0 < 100.0);
	assert_eq!(s.pointer(&mut hidden, PointerKind::Click, x, y).unwrap(), Some(large));
	run_to_end(&mut s, &mut visible);
	assert_eq!(s.transform(), home);
	assert!(s.is_focus(s.root().unwrap().id));
}

#[test]
fn every_node_owns_the_pixels_only_it_covers() {
	let mut s = nested();
	let (w, h) = (240u32, 200u32);
	let mut hidden = PixmapSurface::hit_test(w, h).unwrap();
	s.render(&mut hidden, RenderMode::HitTest).unwrap();

	let discs: Vec<_> = s.registry().iter().map(|n| screen_disc(&s, n.id)).collect();
	let mut owners = HashSet::new();
	for py in 0..h {
		for px in 0..w {
			let (cx, cy) = (f64::from(px) + 0.5, f64::from(py) + 0.5);
			let dist = |&(x, y, _): &(f64, f64, f64)| ((cx - x).powi(2) + (cy - y).powi(2)).sqrt();
			// skip pixels within a pixel of any edge
			if discs.iter().any(|d| (dist(d) - d.2).abs() < 1.5) {
				continue;
			}
			let expected = discs.iter().rposition(|d| dist(d) < d.2);
			let got = resolve(&hidden, s.color_registry(), cx, cy).unwrap();
			assert_eq!(got, expected, "pixel ({px}, {py})");
			if let Some(id) = got {
				owners.insert(id);
			}
		}
	}
	assert_eq!(owners.len(), s.registry().len());
}

#[test]
fn hit_keys_are_unique_and_stable() {
	let mut s = nested();
	let mut hidden = PixmapSurface::hit_test(240, 200).unwrap();
	s.render(&mut hidden, RenderMode::HitTest).unwrap();
	let first: Vec<_> = s.registry().iter().map(|n| n.hit_key().unwrap()).collect();
	let unique: HashSet<_> = first.iter().collect();
	assert_eq!(unique.len(), first.len());

	let mut visible = PixmapSurface::new(240, 200).unwrap();
	s.zoom_to(3).unwrap();
	for _ in 0..5 {
		s.tick(0.05, &mut visible).unwrap();
		s.render(&mut hidden, RenderMode::HitTest).unwrap();
	}
	let later: Vec<_> = s.registry().iter().map(|n| n.hit_key().unwrap()).collect();
	assert_eq!(first, later);
	assert_eq!(s.color_registry().len(), s.registry().len());
}

#[test]
fn reset_round_trips_to_the_initial_transform() {
	let mut s = nested();
	let mut visible = PixmapSurface::new(240, 200).unwrap();
	let home = s.transform();
	let leaf = s.registry().find_by_name("pause").unwrap().id;
	s.zoom_to(leaf).unwrap();
	run_to_end(&mut s, &mut visible);
	assert_ne!(s.transform(), home);
	s.zoom_reset().unwrap();
	run_to_end(&mut s, &mut visible);
	assert_eq!(s.transform(), home);
}

#[test]
fn scale_stays_positive_throughout_animations() {
	let mut s = nested();
	let mut visible = PixmapSurface::new(240, 200).unwrap();
	let targets: Vec<NodeId> = s.registry().iter().map(|n| n.id).rev().collect();
	for id in targets {
		s.zoom_to(id).unwrap();
		// interrupt half of the animations midway
		for _ in 0..(id % 2 + 1) * 7 {
			s.tick(FRAME, &mut visible).unwrap();
			let scale = s.transform().scale;
			assert!(scale > 0.0 && scale.is_finite(), "scale {scale} toward {id}");
		}
	}
	run_to_end(&mut s, &mut visible);
}

#[test]
fn retargeting_ends_on_the_latest_target() {
	let mut s = nested();
	let mut visible = PixmapSurface::new(240, 200).unwrap();
	let a = s.registry().find_by_name("tween").unwrap().id;
	let b = s.registry().find_by_name("graph").unwrap().id;
	s.zoom_to(a).unwrap();
	s.tick(FRAME, &mut visible).unwrap();
	s.zoom_to(b).unwrap();
	run_to_end(&mut s, &mut visible);
	assert_eq!(s.zoom_engine().viewport(), s.viewport_for(b).unwrap());
	assert!(s.is_focus(b));
}

#[test]
fn zooming_to_the_root_twice_is_seamless() {
	let mut s = three_nodes();
	let mut visible = PixmapSurface::new(100, 100).unwrap();
	let home = s.transform();
	let root = s.root().unwrap().id;
	for _ in 0..2 {
		s.zoom_to(root).unwrap();
		s.tick(FRAME, &mut visible).unwrap();
		assert_eq!(s.transform(), home);
		assert!(!s.is_animating());
	}
}

#[test]
fn frames_never_touch_the_hit_surface() {
	let mut s = three_nodes();
	let mut visible = PixmapSurface::new(100, 100).unwrap();
	let mut hidden = PixmapSurface::hit_test(100, 100).unwrap();
	let large = s.registry().find_by_name("large").unwrap().id;
	let (x, y, _) = screen_disc(&s, large);
	s.node_at_pixel(&mut hidden, x, y).unwrap();
	let snapshot = hidden.pixmap().data().to_vec();

	s.zoom_to(large).unwrap();
	run_to_end(&mut s, &mut visible);
	assert_eq!(hidden.pixmap().data(), snapshot.as_slice());
	// the stale surface still answers for the old geometry
	assert_eq!(resolve(&hidden, s.color_registry(), x, y).unwrap(), Some(large));
}

#[test]
fn exhausted_key_space_is_reported_without_drawing() {
	let data = Datum::branch("root", vec![Datum::leaf("a", 1.0), Datum::leaf("b", 2.0)]);
	let options = CirclePackOptions {
		hit_color_stride: KEY_SPACE / 2,
		..CirclePackOptions::default()
	};
	let mut s = CirclePackState::new(&data, &options, 50.0, 50.0).unwrap();
	let before = s.transform();
	let mut hidden = PixmapSurface::hit_test(50, 50).unwrap();
	hidden.clear(None);
	let err = s.render(&mut hidden, RenderMode::HitTest).unwrap_err();
	assert!(matches!(err, CirclePackError::CapacityExceeded { assigned: 2 }));
	assert_eq!(hidden.read_pixel(25, 25).unwrap(), Some([0, 0, 0, 0]));
	assert_eq!(s.transform(), before);
	assert_eq!(s.color_registry().len(), 2);
}

#[test]
fn click_callbacks_see_background_and_nodes() {
	let mut s = three_nodes();
	let mut hidden = PixmapSurface::hit_test(100, 100).unwrap();
	let clicks = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
	let sink = clicks.clone();
	s.on_click(move |n| sink.borrow_mut().push(n.map(|n| n.name.clone())));

	let small = s.registry().find_by_name("small").unwrap().id;
	let (x, y, _) = screen_disc(&s, small);
	s.pointer(&mut hidden, PointerKind::Click, 1.0, 1.0).unwrap();
	s.pointer(&mut hidden, PointerKind::Click, x, y).unwrap();
	assert_eq!(*clicks.borrow(), vec![None, Some("small".to_string())]);
	assert!(s.is_focus(small));
}
