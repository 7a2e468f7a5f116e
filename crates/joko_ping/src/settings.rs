use serde::{Deserialize, Serialize};

/// Settings of the ping overlay.
/// The overlay reads these every frame, so a change takes effect on the next tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingSettings {
    pub enabled: bool,
    /// name of the key which arms (hold) and exits (press) ping mode
    pub ping_key: String,
    /// multiplier for every pixel size we draw
    pub ui_scale: f32,
    /// 0.0 to 1.0
    pub opacity: f32,
    /// markers farther than this from the player are not drawn (world units)
    pub max_distance: f32,
    pub show_author_names: bool,
    /// seconds the ping key must be held to enter ping mode
    pub arm_duration: f64,
    /// seconds the primary button must be held to open the radial menu
    pub hold_threshold: f64,
    /// pixels the pointer may wander during a quick click
    pub drag_radius: f32,
    /// pixels. radius of the radial menu
    pub menu_radius: f32,
    /// fraction of `menu_radius` around the origin which cancels the menu
    pub dead_zone_fraction: f32,
    /// pixels. clicking this close to one of our own markers removes it
    pub self_hit_radius: f32,
    /// leave ping mode after every placement or removal
    pub exit_after_placement: bool,
    /// seconds. markers older than this are removed from the store, whatever territory they are in
    pub marker_ttl: f64,
    /// world units above the marker that line of sight checks aim at
    pub target_height: f32,
    /// panels that never hide markers
    pub ui_occlusion_allow_list: Vec<String>,
}

impl Default for PingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ping_key: "Tab".to_owned(),
            ui_scale: 1.0,
            opacity: 1.0,
            max_distance: 250.0,
            show_author_names: true,
            arm_duration: 1.0,
            hold_threshold: 0.4,
            drag_radius: 8.0,
            menu_radius: 90.0,
            dead_zone_fraction: 0.3,
            self_hit_radius: 24.0,
            exit_after_placement: true,
            marker_ttl: 60.0,
            target_height: 1.5,
            ui_occlusion_allow_list: vec![
                "hud_chrome".to_owned(),
                "chat_log".to_owned(),
                "minimap".to_owned(),
            ],
        }
    }
}

impl PingSettings {
    /// ui scale, sanitized. zero, negative or NaN scales fall back to 1.0
    pub fn scale(&self) -> f32 {
        if self.ui_scale.is_finite() && self.ui_scale > 0.0 {
            self.ui_scale
        } else {
            1.0
        }
    }
    pub fn opacity(&self) -> f32 {
        if self.opacity.is_finite() {
            self.opacity.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
    /// scaled radius of the radial menu
    pub fn menu_radius(&self) -> f32 {
        self.menu_radius * self.scale()
    }
    /// scaled dead zone radius of the radial menu
    pub fn dead_zone(&self) -> f32 {
        self.menu_radius() * self.dead_zone_fraction.clamp(0.0, 1.0)
    }
}
