use egui::{vec2, Pos2};
use glam::Vec3;
use joko_link::{RaycastResult, WorldCollision};
use joko_render::{covering_panel, Camera, Panel};

use crate::marker::PingMarker;
use crate::settings::PingSettings;
use crate::sprite::MarkerAnimation;

/// Where and how big a marker's ring is on screen this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedMarker {
    pub center: Pos2,
    /// ring size in pixels, already clamped and ui scaled
    pub size: egui::Vec2,
    /// distance from the camera, for depth sorting
    pub distance: f32,
}

/// Why a marker is (not) drawn this frame. Only affects this frame, markers stay in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Visibility {
    Visible(ProjectedMarker),
    /// farther from the player than `max_distance`
    TooFar,
    /// world geometry between the camera and the marker
    WorldOccluded,
    /// behind the camera or outside the frustum
    OffScreen,
    /// under an opaque panel with this name
    BehindPanel(String),
}

/// Everything the visibility checks need for one frame
pub struct ViewContext<'a> {
    pub camera: &'a Camera,
    /// the local player. distance culling is measured from here, not from the camera
    pub viewer: Vec3,
    pub collision: &'a dyn WorldCollision,
    pub panels: &'a [Panel],
    pub settings: &'a PingSettings,
}

impl<'a> ViewContext<'a> {
    /// The checks run cheapest first and stop at the first one that hides the marker.
    /// Anything that can't be answered (no collision data, degenerate sizes) counts as visible.
    pub fn visibility(&self, marker: &PingMarker, animation: &MarkerAnimation) -> Visibility {
        let position = marker.world_position;
        let distance = self.viewer.distance(position);
        if !(distance <= self.settings.max_distance) {
            return Visibility::TooFar;
        }

        let target = position + Vec3::Y * self.settings.target_height;
        if let RaycastResult::Blocked { .. } = self.collision.raycast(self.camera.position, target) {
            return Visibility::WorldOccluded;
        }

        let Some(center) = self.camera.world_to_screen(position) else {
            return Visibility::OffScreen;
        };

        if let Some(panel) = covering_panel(
            self.panels,
            center,
            &self.settings.ui_occlusion_allow_list,
        ) {
            return Visibility::BehindPanel(panel.name.clone());
        }

        let raw = ring_size(self.camera, position, animation.world_scale)
            .unwrap_or(vec2(animation.min_ring_size, animation.min_ring_size));
        Visibility::Visible(ProjectedMarker {
            center,
            size: clamp_size(
                raw,
                animation.min_ring_size,
                animation.max_ring_size,
                self.settings.scale(),
            ),
            distance: self.camera.position.distance(position),
        })
    }
}

/// Unclamped screen size of a disc with radius `world_scale` lying on the ground at `position`.
/// Width comes from the camera's right vector, height from its (horizontal) forward vector.
pub fn ring_size(camera: &Camera, position: Vec3, world_scale: f32) -> Option<egui::Vec2> {
    let (forward, right) = camera.horizontal_basis();
    let extent = |axis: Vec3| -> Option<f32> {
        let a = camera.world_to_screen_unclipped(position + axis * world_scale)?;
        let b = camera.world_to_screen_unclipped(position - axis * world_scale)?;
        Some(a.distance(b))
    };
    let size = vec2(extent(right)?, extent(forward)?);
    (size.x.is_finite() && size.y.is_finite()).then_some(size)
}

/// Fits `size` into `[min, max]` keeping the aspect ratio, then applies the ui scale.
/// Very flat sizes can't keep their aspect and have their short side raised to `min`.
pub fn clamp_size(size: egui::Vec2, min: f32, max: f32, ui_scale: f32) -> egui::Vec2 {
    let min = if min.is_finite() { min.max(0.0) } else { 0.0 };
    let max = if max.is_finite() { max.max(min) } else { min };
    let largest = size.x.max(size.y);
    let size = if !(largest.is_finite() && largest > 0.0) || !size.x.is_finite() || !size.y.is_finite() {
        vec2(min, min)
    } else if largest > max {
        size * (max / largest)
    } else if largest < min {
        size * (min / largest)
    } else {
        size
    };
    vec2(size.x.clamp(min, max), size.y.clamp(min, max)) * ui_scale
}
