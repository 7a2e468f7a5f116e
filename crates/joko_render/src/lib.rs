//! Everything between world positions and pixels.
//!
//! [camera::Camera] turns the link's camera into a view-projection matrix every frame.
//! Systems then build a [draw::DrawList] which is painted with egui.
//! Sprite sheets are loaded lazily through [texture::TextureCache].

pub mod camera;
pub mod draw;
pub mod panels;
pub mod texture;

pub use camera::Camera;
pub use draw::{DrawCommand, DrawList, MarkerLayer};
pub use panels::{covering_panel, Panel};
pub use texture::{EguiSpriteLoader, SpriteHandle, SpriteLoader, TextureCache};
