//! Rendu des beats en images : tracé anti-aliasé, réduction Catmull-Rom, écriture PNG atomique.

pub mod error;
pub mod persist;
pub mod rasterizer;
pub mod renderer;
pub mod resize;

pub use error::RenderError;
pub use renderer::{BeatRenderer, beat_image_path};
