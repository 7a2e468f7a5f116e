use egui::{pos2, vec2, Color32, Rect};
use serde::{Deserialize, Serialize};

use crate::marker::MarkerType;

/// Colors of basic pings, picked by their letter. `A` is red, `B` orange and so on.
pub const LETTER_PALETTE: [Color32; 8] = [
    Color32::from_rgb(235, 64, 52),
    Color32::from_rgb(245, 150, 40),
    Color32::from_rgb(250, 215, 50),
    Color32::from_rgb(90, 200, 90),
    Color32::from_rgb(60, 200, 210),
    Color32::from_rgb(70, 130, 245),
    Color32::from_rgb(160, 90, 230),
    Color32::from_rgb(240, 110, 180),
];

pub const MIN_LETTER_FONT_SIZE: f32 = 10.0;
pub const MAX_LETTER_FONT_SIZE: f32 = 32.0;
pub const AUTHOR_TAG_FONT_SIZE: f32 = 13.0;

/// tint of a basic ping's letter. cycles after the eighth letter
pub fn letter_tint(letter: char) -> Color32 {
    let offset = (letter.to_ascii_uppercase() as u32).wrapping_sub('A' as u32);
    LETTER_PALETTE[offset as usize % LETTER_PALETTE.len()]
}

/// A grid of equally sized frames inside one image. frames go left to right, top to bottom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub file: String,
    pub columns: u32,
    pub rows: u32,
    pub frame_count: u32,
}

impl SpriteSheet {
    pub fn new(file: impl Into<String>, columns: u32, rows: u32, frame_count: u32) -> Self {
        Self {
            file: file.into(),
            columns,
            rows,
            frame_count,
        }
    }
    /// a sheet with just one frame
    pub fn single(file: impl Into<String>) -> Self {
        Self::new(file, 1, 1, 1)
    }
    /// uv rect of a frame. indices past the end are clamped to the last frame.
    /// None for an empty/malformed sheet
    pub fn frame_uv(&self, index: u32) -> Option<Rect> {
        if self.columns == 0 || self.rows == 0 || self.frame_count == 0 {
            return None;
        }
        let index = index.min(self.frame_count - 1);
        let column = index % self.columns;
        let row = index / self.columns;
        if row >= self.rows {
            return None;
        }
        let width = 1.0 / self.columns as f32;
        let height = 1.0 / self.rows as f32;
        Some(Rect::from_min_size(
            pos2(column as f32 * width, row as f32 * height),
            vec2(width, height),
        ))
    }
}

/// How one kind of marker looks and animates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerAnimation {
    /// the animated ground ring
    pub ring: SpriteSheet,
    /// the icon dropping into place. only its first frame is ever drawn
    pub pin: SpriteSheet,
    pub frames_per_second: f32,
    /// half width of the ring on the ground, in world units
    pub world_scale: f32,
    /// the ring must not be smaller than this in pixels (before ui scale)
    pub min_ring_size: f32,
    /// the ring must not be bigger than this in pixels (before ui scale)
    pub max_ring_size: f32,
    /// pin width relative to the ring width
    pub pin_scale: f32,
    /// the point of the pin that touches the ring center, in fractions of the pin size
    pub pin_pivot: [f32; 2],
    pub tint: Color32,
    /// seconds the pin takes to fall into place
    pub drop_duration: f32,
    /// pixels above its resting place the pin starts from (before ui scale)
    pub drop_height: f32,
    /// the author tag is shown for this many ring frames
    pub tag_frames: u32,
}

impl MarkerAnimation {
    fn builtin(kind: &str, tint: Color32, world_scale: f32, max_ring_size: f32) -> Self {
        Self {
            ring: SpriteSheet::new(format!("ring_{kind}.png"), 10, 9, 90),
            pin: SpriteSheet::single(format!("pin_{kind}.png")),
            frames_per_second: 30.0,
            world_scale,
            min_ring_size: 24.0,
            max_ring_size,
            pin_scale: 0.5,
            pin_pivot: [0.5, 1.0],
            tint,
            drop_duration: 0.35,
            drop_height: 40.0,
            tag_frames: 120,
        }
    }
    /// seconds until the ring animation ends
    pub fn ring_duration(&self) -> f64 {
        self.frames_to_seconds(self.ring.frame_count)
    }
    /// seconds the author tag stays visible
    pub fn tag_lifetime(&self) -> f64 {
        self.frames_to_seconds(self.tag_frames)
    }
    /// seconds after which the marker is retired. it is no longer drawn, but stays in the store
    pub fn lifetime(&self) -> f64 {
        self.ring_duration()
            .max(self.tag_lifetime())
            .max(self.drop_duration as f64)
    }
    fn frames_to_seconds(&self, frames: u32) -> f64 {
        if self.frames_per_second > 0.0 && self.frames_per_second.is_finite() {
            frames as f64 / self.frames_per_second as f64
        } else {
            0.0
        }
    }
}

/// The animation table for every marker type. Built once at startup and shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    pub basic: MarkerAnimation,
    pub question: MarkerAnimation,
    pub danger: MarkerAnimation,
    pub assist: MarkerAnimation,
    pub on_my_way: MarkerAnimation,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            basic: MarkerAnimation::builtin("basic", Color32::WHITE, 1.5, 140.0),
            question: MarkerAnimation::builtin(
                "question",
                Color32::from_rgb(250, 215, 50),
                1.5,
                140.0,
            ),
            danger: MarkerAnimation::builtin("danger", Color32::from_rgb(235, 64, 52), 2.0, 180.0),
            assist: MarkerAnimation::builtin("assist", Color32::from_rgb(90, 200, 120), 1.5, 140.0),
            on_my_way: MarkerAnimation::builtin(
                "on_my_way",
                Color32::from_rgb(70, 150, 255),
                1.5,
                140.0,
            ),
        }
    }
}

impl SpriteConfig {
    pub fn get(&self, marker_type: MarkerType) -> &MarkerAnimation {
        match marker_type {
            MarkerType::Basic => &self.basic,
            MarkerType::Question => &self.question,
            MarkerType::Danger => &self.danger,
            MarkerType::Assist => &self.assist,
            MarkerType::OnMyWay => &self.on_my_way,
        }
    }
}
