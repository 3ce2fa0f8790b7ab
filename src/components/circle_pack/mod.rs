mod color;
mod component;
mod config;
mod driver;
mod error;
mod hit;
mod pack;
mod registry;
mod render;
mod state;
mod surface;
mod types;
mod zoom;

pub use color::{ColorAllocator, ColorRegistry, HitKey, KEY_SPACE};
pub use component::CirclePackCanvas;
pub use config::{CirclePackOptions, DEFAULT_COLOR_RANGE, Palette};
pub use driver::FrameClock;
pub use error::{CirclePackError, Result};
pub use hit::{PointerKind, resolve};
pub use pack::{PackOptions, SortFn, ValueFn, descending_value, pack, size_value};
pub use registry::{NodeId, NodeRegistry, PackedNode};
pub use render::RenderMode;
pub use state::{CirclePackState, NodeCallback};
pub use surface::{CanvasSurface, PixmapSurface, Surface};
pub use types::{Color, Datum, NodeInfo};
pub use zoom::{ViewTransform, Viewport, ZoomEngine, ZoomPath, ease_cubic_in_out};
