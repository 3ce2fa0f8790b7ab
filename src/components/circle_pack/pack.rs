//! Circle-packing layout.
//!
//! Leaves get a radius of `√value`; siblings are packed with the front-chain
//! algorithm (Wang et al., "Visualization of large hierarchical data by
//! circle packing", 2006) and each parent becomes the smallest circle
//! enclosing its children (Welzl's algorithm).

use std::cmp::Ordering;
use std::rc::Rc;

use log::warn;

use super::registry::{NodeId, PackedNode};
use super::types::Datum;

/// Extracts the sizing value of a leaf.
pub type ValueFn = Rc<dyn Fn(&Datum) -> f64>;

/// Orders siblings. Receives the data and their summed values.
pub type SortFn = Rc<dyn Fn((&Datum, f64), (&Datum, f64)) -> Ordering>;

/// Layout parameters.
#[derive(Clone)]
pub struct PackOptions {
	/// Gap between sibling circles, in output units.
	pub padding: f64,
	/// Width and height of the box the root circle is fit into.
	pub size: (f64, f64),
	pub value: ValueFn,
	/// `None` keeps the dataset's child order.
	pub sort: Option<SortFn>,
}

impl Default for PackOptions {
	fn default() -> Self {
		Self {
			padding: 1.0,
			size: (1.0, 1.0),
			value: Rc::new(size_value),
			sort: Some(Rc::new(descending_value)),
		}
	}
}

/// Reads `Datum::size`, treating a missing size as zero.
pub fn size_value(d: &Datum) -> f64 {
	d.size.unwrap_or(0.0)
}

/// Larger values first; ties broken by id, then by name.
pub fn descending_value(a: (&Datum, f64), b: (&Datum, f64)) -> Ordering {
	b.1.total_cmp(&a.1)
		.then_with(|| a.0.id.cmp(&b.0.id))
		.then_with(|| a.0.name.cmp(&b.0.name))
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Circle {
	x: f64,
	y: f64,
	r: f64,
}

/// Lays out `root` and returns every node in pre-order, root first.
pub fn pack(root: &Datum, options: &PackOptions) -> Vec<PackedNode> {
	let mut nodes = Vec::new();
	flatten(root, None, 0, options, &mut nodes);

	let (w, h) = options.size;
	let extent = w.min(h);

	for i in (0..nodes.len()).rev() {
		if nodes[i].children.is_empty() {
			nodes[i].r = nodes[i].value.max(0.0).sqrt();
		} else {
			pack_children(&mut nodes, i, 0.0);
		}
	}

	let padding = options.padding.max(0.0);
	if padding > 0.0 && nodes[0].r > 0.0 && extent > 0.0 {
		let pad = padding * nodes[0].r / extent;
		for i in (0..nodes.len()).rev() {
			if !nodes[i].children.is_empty() {
				pack_children(&mut nodes, i, pad);
			}
		}
	}

	let k = if nodes[0].r > 0.0 {
		extent / (2.0 * nodes[0].r)
	} else {
		0.0
	};
	nodes[0].x = w / 2.0;
	nodes[0].y = h / 2.0;
	nodes[0].r *= k;
	for i in 1..nodes.len() {
		let Some(p) = nodes[i].parent else {
			continue;
		};
		let (px, py) = (nodes[p].x, nodes[p].y);
		let node = &mut nodes[i];
		node.x = px + k * node.x;
		node.y = py + k * node.y;
		node.r *= k;
	}
	nodes
}

/// Appends `datum` and its subtree in pre-order. Returns the subtree value.
fn flatten(
	datum: &Datum,
	parent: Option<NodeId>,
	depth: usize,
	options: &PackOptions,
	out: &mut Vec<PackedNode>,
) -> f64 {
	let id = out.len();
	let mut node = PackedNode::new(datum.name.clone(), 0.0, 0.0, 0.0);
	node.id = id;
	node.depth = depth;
	node.parent = parent;
	out.push(node);

	let value = if datum.children.is_empty() {
		leaf_value(datum, options)
	} else {
		let mut order: Vec<(&Datum, f64)> =
			datum.children.iter().map(|c| (c, subtree_value(c, options))).collect();
		if let Some(sort) = &options.sort {
			order.sort_by(|a, b| sort(*a, *b));
		}
		let mut total = 0.0;
		for (child, _) in order {
			let child_id = out.len();
			out[id].children.push(child_id);
			total += flatten(child, Some(id), depth + 1, options, out);
		}
		total
	};
	out[id].value = value;
	value
}

/// Value of a leaf; negative and non-finite values count as zero.
fn leaf_value(datum: &Datum, options: &PackOptions) -> f64 {
	let v = (options.value)(datum);
	if v.is_finite() { v.max(0.0) } else { 0.0 }
}

fn subtree_value(datum: &Datum, options: &PackOptions) -> f64 {
	if datum.children.is_empty() {
		leaf_value(datum, options)
	} else {
		datum.children.iter().map(|c| subtree_value(c, options)).sum()
	}
}

/// Packs the children of `parent` around the origin of the parent's frame and
/// sets the parent's radius. Children positions are relative to the parent.
fn pack_children(nodes: &mut [PackedNode], parent: NodeId, pad: f64) {
	let ids = nodes[parent].children.clone();
	let mut circles: Vec<Circle> = ids
		.iter()
		.map(|&c| Circle {
			x: 0.0,
			y: 0.0,
			r: nodes[c].r + pad,
		})
		.collect();
	let r = pack_siblings(&mut circles);
	for (&c, circle) in ids.iter().zip(&circles) {
		nodes[c].x = circle.x;
		nodes[c].y = circle.y;
	}
	nodes[parent].r = r + pad;
}

/// Places `circles` tangent to one another around the origin and returns the
/// radius of the enclosing circle.
fn pack_siblings(circles: &mut [Circle]) -> f64 {
	let n = circles.len();
	if n == 0 {
		return 0.0;
	}
	circles[0].x = 0.0;
	circles[0].y = 0.0;
	if n == 1 {
		return circles[0].r;
	}
	circles[0].x = -circles[1].r;
	circles[1].x = circles[0].r;
	circles[1].y = 0.0;
	if n == 2 {
		return circles[0].r + circles[1].r;
	}
	circles[2] = place(circles[1], circles[0], circles[2]);

	// front chain as a circular doubly linked list over circle indices
	let mut next = vec![0usize; n];
	let mut prev = vec![0usize; n];
	let (mut a, mut b) = (0usize, 1usize);
	next[0] = 1;
	next[1] = 2;
	next[2] = 0;
	prev[1] = 0;
	prev[2] = 1;
	prev[0] = 2;

	let mut i = 3;
	'pack: while i < n {
		circles[i] = place(circles[a], circles[b], circles[i]);
		let c = i;

		let (mut j, mut k) = (next[b], prev[a]);
		let (mut sj, mut sk) = (circles[b].r, circles[a].r);
		loop {
			if sj <= sk {
				if intersects(circles[j], circles[c]) {
					b = j;
					next[a] = b;
					prev[b] = a;
					continue 'pack;
				}
				sj += circles[j].r;
				j = next[j];
			} else {
				if intersects(circles[k], circles[c]) {
					a = k;
					next[a] = b;
					prev[b] = a;
					continue 'pack;
				}
				sk += circles[k].r;
				k = prev[k];
			}
			if j == next[k] {
				break;
			}
		}

		prev[c] = a;
		next[c] = b;
		next[a] = c;
		prev[b] = c;
		b = c;

		let mut best = score(circles, &next, a);
		let mut cur = next[c];
		while cur != b {
			let s = score(circles, &next, cur);
			if s < best {
				a = cur;
				best = s;
			}
			cur = next[cur];
		}
		b = next[a];
		i += 1;
	}

	let mut chain = vec![circles[b]];
	let mut cur = next[b];
	while cur != b {
		chain.push(circles[cur]);
		cur = next[cur];
	}
	let e = enclose(&chain);
	for c in circles.iter_mut() {
		c.x -= e.x;
		c.y -= e.y;
	}
	e.r
}

/// Positions `c` tangent to both `a` and `b`.
fn place(b: Circle, a: Circle, mut c: Circle) -> Circle {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let d2 = dx * dx + dy * dy;
	if d2 > 0.0 {
		let a2 = (a.r + c.r).powi(2);
		let b2 = (b.r + c.r).powi(2);
		if a2 > b2 {
			let x = (d2 + b2 - a2) / (2.0 * d2);
			let y = (b2 / d2 - x * x).max(0.0).sqrt();
			c.x = b.x - x * dx - y * dy;
			c.y = b.y - x * dy + y * dx;
		} else {
			let x = (d2 + a2 - b2) / (2.0 * d2);
			let y = (a2 / d2 - x * x).max(0.0).sqrt();
			c.x = a.x + x * dx - y * dy;
			c.y = a.y + x * dy + y * dx;
		}
	} else {
		c.x = a.x + c.r;
		c.y = a.y;
	}
	c
}

fn intersects(a: Circle, b: Circle) -> bool {
	let dr = a.r + b.r - 1e-6;
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	dr > 0.0 && dr * dr > dx * dx + dy * dy
}

/// Squared distance from the origin to the weighted midpoint of `node` and
/// its successor in the chain.
fn score(circles: &[Circle], next: &[usize], node: usize) -> f64 {
	let a = circles[node];
	let b = circles[next[node]];
	let ab = a.r + b.r;
	if ab <= 0.0 {
		return a.x * a.x + a.y * a.y;
	}
	let dx = (a.x * b.r + b.x * a.r) / ab;
	let dy = (a.y * b.r + b.y * a.r) / ab;
	dx * dx + dy * dy
}

/// Smallest circle enclosing all of `circles`.
fn enclose(circles: &[Circle]) -> Circle {
	let mut basis: Vec<Circle> = Vec::new();
	let mut e: Option<Circle> = None;
	let mut i = 0;
	// every basis change restarts the scan
	let mut restarts = 0usize;
	let limit = circles.len().saturating_pow(3).saturating_add(64);
	while i < circles.len() {
		let p = circles[i];
		if e.is_some_and(|e| encloses_weak(e, p)) {
			i += 1;
			continue;
		}
		match extend_basis(&basis, p) {
			Some(next) => {
				e = Some(enclose_basis(&next));
				basis = next;
				i = 0;
			}
			None => break,
		}
		restarts += 1;
		if restarts > limit {
			break;
		}
	}
	match e {
		Some(e) if circles.iter().all(|&c| encloses_weak(e, c)) => e,
		_ => {
			warn!("enclosing circle did not converge; using bounding fallback");
			bounding_circle(circles)
		}
	}
}

fn extend_basis(basis: &[Circle], p: Circle) -> Option<Vec<Circle>> {
	if encloses_weak_all(p, basis) {
		return Some(vec![p]);
	}
	for &bi in basis {
		if encloses_not(p, bi) && encloses_weak_all(enclose2(bi, p), basis) {
			return Some(vec![bi, p]);
		}
	}
	for i in 0..basis.len().saturating_sub(1) {
		for j in i + 1..basis.len() {
			let (bi, bj) = (basis[i], basis[j]);
			if encloses_not(enclose2(bi, bj), p)
				&& encloses_not(enclose2(bi, p), bj)
				&& encloses_not(enclose2(bj, p), bi)
				&& encloses_weak_all(enclose3(bi, bj, p), basis)
			{
				return Some(vec![bi, bj, p]);
			}
		}
	}
	None
}

fn encloses_not(a: Circle, b: Circle) -> bool {
	let dr = a.r - b.r;
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	dr < 0.0 || dr * dr < dx * dx + dy * dy
}

fn encloses_weak(a: Circle, b: Circle) -> bool {
	let dr = a.r - b.r + a.r.max(b.r).max(1.0) * 1e-9;
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	dr > 0.0 && dr * dr > dx * dx + dy * dy
}

fn encloses_weak_all(a: Circle, basis: &[Circle]) -> bool {
	basis.iter().all(|&b| encloses_weak(a, b))
}

fn enclose_basis(basis: &[Circle]) -> Circle {
	match *basis {
		[a] => a,
		[a, b] => enclose2(a, b),
		[a, b, c] => enclose3(a, b, c),
		_ => bounding_circle(basis),
	}
}

fn enclose2(a: Circle, b: Circle) -> Circle {
	let (x21, y21, r21) = (b.x - a.x, b.y - a.y, b.r - a.r);
	let l = (x21 * x21 + y21 * y21).sqrt();
	if l == 0.0 {
		return if a.r >= b.r { a } else { b };
	}
	Circle {
		x: (a.x + b.x + x21 / l * r21) / 2.0,
		y: (a.y + b.y + y21 / l * r21) / 2.0,
		r: (l + a.r + b.r) / 2.0,
	}
}

fn enclose3(a: Circle, b: Circle, c: Circle) -> Circle {
	let (x1, y1, r1) = (a.x, a.y, a.r);
	let (a2, a3) = (x1 - b.x, x1 - c.x);
	let (b2, b3) = (y1 - b.y, y1 - c.y);
	let (c2, c3) = (b.r - r1, c.r - r1);
	let d1 = x1 * x1 + y1 * y1 - r1 * r1;
	let d2 = d1 - b.x * b.x - b.y * b.y + b.r * b.r;
	let d3 = d1 - c.x * c.x - c.y * c.y + c.r * c.r;
	let ab = a3 * b2 - a2 * b3;
	let xa = (b2 * d3 - b3 * d2) / (ab * 2.0) - x1;
	let xb = (b3 * c2 - b2 * c3) / ab;
	let ya = (a3 * d2 - a2 * d3) / (ab * 2.0) - y1;
	let yb = (a2 * c3 - a3 * c2) / ab;
	let qa = xb * xb + yb * yb - 1.0;
	let qb = 2.0 * (r1 + xa * xb + ya * yb);
	let qc = xa * xa + ya * ya - r1 * r1;
	let r = -(if qa.abs() > 1e-6 {
		(qb + (qb * qb - 4.0 * qa * qc).sqrt()) / (2.0 * qa)
	} else {
		qc / qb
	});
	Circle {
		x: x1 + xa + xb * r,
		y: y1 + ya + yb * r,
		r,
	}
}

/// Circle around the bounding box of `circles`; not minimal.
fn bounding_circle(circles: &[Circle]) -> Circle {
	let (mut x0, mut y0) = (f64::INFINITY, f64::INFINITY);
	let (mut x1, mut y1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
	for c in circles {
		x0 = x0.min(c.x - c.r);
		y0 = y0.min(c.y - c.r);
		x1 = x1.max(c.x + c.r);
		y1 = y1.max(c.y + c.r);
	}
	if !x0.is_finite() {
		return Circle {
			x: 0.0,
			y: 0.0,
			r: 0.0,
		};
	}
	let (x, y) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
	let r = circles
		.iter()
		.map(|c| ((c.x - x).powi(2) + (c.y - y).powi(2)).sqrt() + c.r)
		.fold(0.0, f64::max);
	Circle { x, y, r }
}
