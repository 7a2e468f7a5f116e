use std::collections::HashMap;

use cap_std::fs_utf8::Dir;
use egui::{ColorImage, TextureHandle, TextureId};
use tracing::{debug, warn};

/// A loaded sprite sheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteHandle {
    pub texture: TextureId,
    /// pixel size of the whole sheet
    pub size: egui::Vec2,
}

/// The asset provider. Returns `None` when a sheet can't be loaded.
pub trait SpriteLoader {
    fn load_sprite(&mut self, file: &str) -> Option<SpriteHandle>;
}

/// Sprite handles by file name, for the lifetime of the process.
/// Failed loads are remembered too, so a missing sheet is reported once and never retried.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<String, Option<SpriteHandle>>,
}

impl TextureCache {
    pub fn get_or_load(&mut self, file: &str, loader: &mut dyn SpriteLoader) -> Option<SpriteHandle> {
        if let Some(entry) = self.entries.get(file) {
            return *entry;
        }
        let handle = loader.load_sprite(file);
        match handle {
            Some(handle) => debug!(file, ?handle, "loaded sprite sheet"),
            None => warn!(file, "sprite sheet unavailable. skipping it for the rest of the session"),
        }
        self.entries.insert(file.to_owned(), handle);
        handle
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads png sheets from a directory into egui managed textures.
pub struct EguiSpriteLoader {
    etx: egui::Context,
    dir: Dir,
    /// The textures that are being used by the markers, so must be kept alive by this vec
    handles: Vec<TextureHandle>,
}

impl EguiSpriteLoader {
    pub fn new(etx: egui::Context, dir: Dir) -> Self {
        Self {
            etx,
            dir,
            handles: Vec::new(),
        }
    }
}

impl SpriteLoader for EguiSpriteLoader {
    fn load_sprite(&mut self, file: &str) -> Option<SpriteHandle> {
        let bytes = match self.dir.read(file) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(?e, file, "failed to read sprite sheet");
                return None;
            }
        };
        let img = match image::load_from_memory(&bytes) {
            Ok(img) => img.into_rgba8(),
            Err(e) => {
                debug!(?e, file, "failed to decode sprite sheet");
                return None;
            }
        };
        let handle = self.etx.load_texture(
            file,
            ColorImage::from_rgba_unmultiplied(
                [img.width() as _, img.height() as _],
                img.as_raw(),
            ),
            Default::default(),
        );
        let sprite = SpriteHandle {
            texture: handle.id(),
            size: handle.size_vec2(),
        };
        self.handles.push(handle);
        Some(sprite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingLoader {
        calls: usize,
    }
    impl SpriteLoader for CountingLoader {
        fn load_sprite(&mut self, file: &str) -> Option<SpriteHandle> {
            self.calls += 1;
            (file == "ring.png").then_some(SpriteHandle {
                texture: TextureId::Managed(7),
                size: egui::vec2(64.0, 64.0),
            })
        }
    }

    #[test]
    fn loads_each_file_once() {
        let mut cache = TextureCache::default();
        let mut loader = CountingLoader::default();
        for _ in 0..3 {
            assert!(cache.get_or_load("ring.png", &mut loader).is_some());
            assert!(cache.get_or_load("missing.png", &mut loader).is_none());
        }
        assert_eq!(loader.calls, 2);
        assert_eq!(cache.len(), 2);
    }
}
