//! Raster targets the renderer can draw on and the hit resolver can sample.

use std::f64::consts::PI;

use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::error::{CirclePackError, Result};
use super::types::Color;

/// A 2D raster the circle pack can be drawn onto.
pub trait Surface {
	fn width(&self) -> f64;
	fn height(&self) -> f64;

	/// Replaces every pixel. `None` clears to fully transparent.
	fn clear(&mut self, background: Option<Color>);

	/// Fills a disc given in surface pixels.
	fn fill_circle(&mut self, x: f64, y: f64, r: f64, color: Color);

	/// Reads one pixel as straight (non-premultiplied) RGBA.
	/// Out-of-bounds positions yield `Ok(None)`.
	fn read_pixel(&self, x: u32, y: u32) -> Result<Option<[u8; 4]>>;
}

/// In-memory surface backed by a `tiny-skia` pixmap.
pub struct PixmapSurface {
	pixmap: Pixmap,
	anti_alias: bool,
}

impl PixmapSurface {
	/// Anti-aliased surface for display output.
	pub fn new(width: u32, height: u32) -> Result<Self> {
		Self::build(width, height, true)
	}

	/// Surface for hit-test keys. Anti-aliasing is off so that edge pixels
	/// never blend two keys into a third.
	pub fn hit_test(width: u32, height: u32) -> Result<Self> {
		Self::build(width, height, false)
	}

	fn build(width: u32, height: u32, anti_alias: bool) -> Result<Self> {
		let pixmap = Pixmap::new(width, height).ok_or_else(|| {
			CirclePackError::Surface(format!("cannot allocate a {width}x{height} pixmap"))
		})?;
		Ok(Self { pixmap, anti_alias })
	}

	pub fn pixmap(&self) -> &Pixmap {
		&self.pixmap
	}

	fn paint(&self, color: Color) -> Paint<'static> {
		let mut paint = Paint::default();
		paint.set_color_rgba8(color.r, color.g, color.b, color.a);
		paint.anti_alias = self.anti_alias;
		paint
	}

	fn covers_surface(&self, x: f64, y: f64, r: f64) -> bool {
		let (w, h) = (self.width(), self.height());
		[(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)]
			.iter()
			.all(|&(cx, cy)| (cx - x).powi(2) + (cy - y).powi(2) <= r * r)
	}

	fn misses_surface(&self, x: f64, y: f64, r: f64) -> bool {
		x + r < 0.0 || y + r < 0.0 || x - r > self.width() || y - r > self.height()
	}
}

impl Surface for PixmapSurface {
	fn width(&self) -> f64 {
		f64::from(self.pixmap.width())
	}

	fn height(&self) -> f64 {
		f64::from(self.pixmap.height())
	}

	fn clear(&mut self, background: Option<Color>) {
		let c = background.unwrap_or(Color::TRANSPARENT);
		self.pixmap
			.fill(tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a));
	}

	fn fill_circle(&mut self, x: f64, y: f64, r: f64, color: Color) {
		if r <= 0.0 || self.misses_surface(x, y, r) {
			return;
		}
		let paint = self.paint(color);
		// deep zooms: disc radius can exceed the rasterizer's coordinate range
		if self.covers_surface(x, y, r) {
			if let Some(rect) = Rect::from_xywh(0.0, 0.0, self.width() as f32, self.height() as f32) {
				self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
			}
			return;
		}
		if let Some(path) = PathBuilder::from_circle(x as f32, y as f32, r as f32) {
			self.pixmap
				.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
		}
	}

	fn read_pixel(&self, x: u32, y: u32) -> Result<Option<[u8; 4]>> {
		// `Pixmap::pixel` only bounds-checks the flat index
		if x >= self.pixmap.width() || y >= self.pixmap.height() {
			return Ok(None);
		}
		Ok(self.pixmap.pixel(x, y).map(|p| {
			let c = p.demultiply();
			[c.red(), c.green(), c.blue(), c.alpha()]
		}))
	}
}

/// Surface backed by a browser canvas 2D context.
pub struct CanvasSurface {
	ctx: CanvasRenderingContext2d,
	width: f64,
	height: f64,
}

impl CanvasSurface {
	/// Wraps the canvas's 2D context. `read_often` hints the browser to keep
	/// the backing store on the CPU, which suits the hidden hit-test canvas.
	pub fn new(canvas: &HtmlCanvasElement, read_often: bool) -> Result<Self> {
		let context = if read_often {
			let options = js_sys::Object::new();
			js_sys::Reflect::set(&options, &JsValue::from("willReadFrequently"), &JsValue::TRUE)
				.map_err(js_error)?;
			canvas.get_context_with_context_options("2d", &options)
		} else {
			canvas.get_context("2d")
		};
		let ctx = context
			.map_err(js_error)?
			.ok_or_else(|| CirclePackError::Surface("canvas has no 2d context".into()))?
			.dyn_into::<CanvasRenderingContext2d>()
			.map_err(|_| CirclePackError::Surface("context is not 2d".into()))?;
		Ok(Self {
			ctx,
			width: f64::from(canvas.width()),
			height: f64::from(canvas.height()),
		})
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

impl Surface for CanvasSurface {
	fn width(&self) -> f64 {
		self.width
	}

	fn height(&self) -> f64 {
		self.height
	}

	fn clear(&mut self, background: Option<Color>) {
		self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
		if let Some(bg) = background {
			self.ctx.set_fill_style_str(&bg.to_css());
			self.ctx.fill_rect(0.0, 0.0, self.width, self.height);
		}
	}

	fn fill_circle(&mut self, x: f64, y: f64, r: f64, color: Color) {
		if r <= 0.0 {
			return;
		}
		self.ctx.set_fill_style_str(&color.to_css());
		self.ctx.begin_path();
		let _ = self.ctx.arc(x, y, r, 0.0, 2.0 * PI);
		self.ctx.fill();
	}

	fn read_pixel(&self, x: u32, y: u32) -> Result<Option<[u8; 4]>> {
		if f64::from(x) >= self.width || f64::from(y) >= self.height {
			return Ok(None);
		}
		let data = self
			.ctx
			.get_image_data(f64::from(x), f64::from(y), 1.0, 1.0)
			.map_err(js_error)?
			.data();
		match data.0.as_slice() {
			[r, g, b, a, ..] => Ok(Some([*r, *g, *b, *a])),
			_ => Ok(None),
		}
	}
}

fn js_error(err: JsValue) -> CirclePackError {
	CirclePackError::Surface(format!("{err:?}"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hit_surface_keeps_exact_colors() {
		let mut s = PixmapSurface::hit_test(20, 20).unwrap();
		s.clear(None);
		s.fill_circle(10.0, 10.0, 6.0, Color::rgb(1, 2, 3));
		assert_eq!(s.read_pixel(10, 10).unwrap(), Some([1, 2, 3, 255]));
		assert_eq!(s.read_pixel(0, 0).unwrap(), Some([0, 0, 0, 0]));
		assert_eq!(s.read_pixel(20, 0).unwrap(), None);
	}

	#[test]
	fn huge_discs_fill_the_surface() {
		let mut s = PixmapSurface::hit_test(8, 8).unwrap();
		s.clear(None);
		s.fill_circle(4.0, 4.0, 1.0e9, Color::rgb(9, 9, 9));
		assert_eq!(s.read_pixel(0, 0).unwrap(), Some([9, 9, 9, 255]));
		assert_eq!(s.read_pixel(7, 7).unwrap(), Some([9, 9, 9, 255]));
	}

	#[test]
	fn off_surface_discs_are_skipped() {
		let mut s = PixmapSurface::new(8, 8).unwrap();
		s.clear(Some(Color::WHITE));
		s.fill_circle(-50.0, -50.0, 4.0, Color::rgb(0, 0, 0));
		assert_eq!(s.read_pixel(0, 0).unwrap(), Some([255, 255, 255, 255]));
	}

	#[test]
	fn zero_sized_pixmap_is_an_error() {
		assert!(matches!(
			PixmapSurface::new(0, 10),
			Err(CirclePackError::Surface(_))
		));
	}
}
