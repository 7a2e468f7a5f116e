use egui::{pos2, vec2, Color32, Pos2, Rect};
use joko_render::{DrawCommand, MarkerLayer, SpriteLoader, TextureCache};

use crate::gesture::{GestureMachine, GestureState, Sector};
use crate::input::PingInput;
use crate::marker::{MarkerType, PingMarker};
use crate::projection::ProjectedMarker;
use crate::settings::PingSettings;
use crate::sprite::{
    letter_tint, MarkerAnimation, SpriteConfig, AUTHOR_TAG_FONT_SIZE, MAX_LETTER_FONT_SIZE,
    MIN_LETTER_FONT_SIZE,
};

pub fn ease_out_cubic(t: f32) -> f32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 1.0 };
    1.0 - (1.0 - t).powi(3)
}

/// 0 when the pin starts falling, exactly 1 from `drop_duration` on
pub fn drop_progress(elapsed: f64, drop_duration: f32) -> f32 {
    if !(drop_duration > 0.0 && drop_duration.is_finite()) {
        return 1.0;
    }
    ease_out_cubic((elapsed / drop_duration as f64) as f32)
}

/// Frame of the ring sheet to show. None once the ring animation is over.
pub fn ring_frame(elapsed: f64, animation: &MarkerAnimation) -> Option<u32> {
    let fps = animation.frames_per_second as f64;
    if !(fps > 0.0 && fps.is_finite()) || !(elapsed >= 0.0) {
        return None;
    }
    let frame = (elapsed * fps).floor();
    (frame < animation.ring.frame_count as f64).then_some(frame as u32)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinPose {
    /// pixels above the resting place
    pub offset: f32,
    pub alpha: f32,
}

pub fn pin_pose(elapsed: f64, animation: &MarkerAnimation, ui_scale: f32) -> PinPose {
    let progress = drop_progress(elapsed, animation.drop_duration);
    PinPose {
        offset: (1.0 - progress) * animation.drop_height * ui_scale,
        alpha: progress,
    }
}

/// rough pixel width of a proportional font string. good enough for a background box
fn estimate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.55
}

/// Turns markers (and the gesture ui) into draw commands.
/// Borrowed for one frame. A missing sprite only removes the element that needed it.
pub struct MarkerPainter<'a> {
    pub sprites: &'a SpriteConfig,
    pub settings: &'a PingSettings,
    pub textures: &'a mut TextureCache,
    pub loader: &'a mut dyn SpriteLoader,
}

impl<'a> MarkerPainter<'a> {
    /// ring, pin, letter and author tag of one marker
    pub fn paint(&mut self, marker: &PingMarker, projected: &ProjectedMarker, now: f64) -> MarkerLayer {
        let sprites = self.sprites;
        let animation = sprites.get(marker.marker_type);
        let elapsed = marker.elapsed(now);
        let scale = self.settings.scale();
        let opacity = self.settings.opacity();
        let tint = marker.tint(sprites);
        let ring_rect = Rect::from_center_size(projected.center, projected.size);
        let mut commands = vec![];

        if let Some(frame) = ring_frame(elapsed, animation) {
            if let Some(command) = self.sprite(
                &animation.ring.file,
                animation.ring.frame_uv(frame),
                ring_rect,
                tint.gamma_multiply(opacity),
            ) {
                commands.push(command);
            }
        }

        let pose = pin_pose(elapsed, animation, scale);
        let pin_rect = self.pin_rect(animation, projected, pose);
        let pin_tint = tint.gamma_multiply(opacity * pose.alpha);
        if let Some(command) = self.sprite(&animation.pin.file, animation.pin.frame_uv(0), pin_rect, pin_tint) {
            commands.push(command);
        }

        if let (MarkerType::Basic, Some(letter)) = (marker.marker_type, marker.label) {
            let size = (pin_rect.width() * 0.6).clamp(MIN_LETTER_FONT_SIZE, MAX_LETTER_FONT_SIZE);
            let alpha = opacity * pose.alpha;
            let shadow_offset = vec2(1.0, 1.0) * scale;
            commands.push(DrawCommand::Text {
                pos: pin_rect.center() + shadow_offset,
                text: letter.to_string(),
                size,
                color: Color32::BLACK.gamma_multiply(alpha),
            });
            commands.push(DrawCommand::Text {
                pos: pin_rect.center(),
                text: letter.to_string(),
                size,
                color: letter_tint(letter).gamma_multiply(alpha),
            });
        }

        if self.settings.show_author_names
            && !marker.sender_display_name.is_empty()
            && elapsed <= animation.tag_lifetime()
        {
            let size = AUTHOR_TAG_FONT_SIZE * scale;
            let pos = projected.center + vec2(0.0, projected.size.y * 0.5 + size);
            let padding = vec2(6.0, 3.0) * scale;
            let text_size = vec2(estimate_text_width(&marker.sender_display_name, size), size);
            commands.push(DrawCommand::RectFilled {
                rect: Rect::from_center_size(pos, text_size + padding * 2.0),
                rounding: 3.0 * scale,
                color: Color32::from_black_alpha(160).gamma_multiply(opacity),
            });
            commands.push(DrawCommand::Text {
                pos,
                text: marker.sender_display_name.clone(),
                size,
                color: Color32::WHITE.gamma_multiply(opacity),
            });
        }

        MarkerLayer {
            commands,
            distance: projected.distance,
        }
    }

    /// arming arc, reticle, hold progress and radial menu
    pub fn paint_gesture(&mut self, gesture: &GestureMachine, input: &PingInput) -> Vec<DrawCommand> {
        let scale = self.settings.scale();
        let opacity = self.settings.opacity();
        let white = Color32::WHITE.gamma_multiply(opacity);
        let mut commands = vec![];
        match gesture.state() {
            GestureState::Idle => {}
            GestureState::Arming { .. } => {
                if let (Some(pointer), Some(progress)) =
                    (input.pointer, gesture.arming_progress(input.time, self.settings))
                {
                    commands.push(DrawCommand::Circle {
                        center: pointer,
                        radius: 18.0 * scale,
                        stroke_width: 3.0 * scale,
                        color: Color32::from_black_alpha(120).gamma_multiply(opacity),
                    });
                    commands.push(DrawCommand::Arc {
                        center: pointer,
                        radius: 18.0 * scale,
                        fraction: progress,
                        stroke_width: 3.0 * scale,
                        color: white,
                    });
                }
            }
            GestureState::Active => {
                if let Some(pointer) = input.pointer {
                    commands.extend(reticle(pointer, scale, white));
                }
            }
            GestureState::Pressing { origin, since } => {
                let threshold = self.settings.hold_threshold;
                let progress = if threshold > 0.0 {
                    ((input.time - since) / threshold).clamp(0.0, 1.0) as f32
                } else {
                    1.0
                };
                commands.extend(reticle(origin, scale, white));
                commands.push(DrawCommand::Arc {
                    center: origin,
                    radius: 14.0 * scale,
                    fraction: progress,
                    stroke_width: 2.0 * scale,
                    color: white,
                });
            }
            GestureState::RadialMenu { origin, sector } => {
                commands.extend(self.radial_menu(origin, sector));
            }
        }
        commands
    }

    fn radial_menu(&mut self, origin: Pos2, selected: Sector) -> Vec<DrawCommand> {
        let scale = self.settings.scale();
        let opacity = self.settings.opacity();
        let radius = self.settings.menu_radius();
        let sprites = self.sprites;
        let mut commands = vec![
            DrawCommand::Circle {
                center: origin,
                radius,
                stroke_width: 0.0,
                color: Color32::from_black_alpha(110).gamma_multiply(opacity),
            },
            DrawCommand::Circle {
                center: origin,
                radius: self.settings.dead_zone(),
                stroke_width: 1.5 * scale,
                color: Color32::from_white_alpha(90).gamma_multiply(opacity),
            },
        ];
        for sector in Sector::DIRECTIONS {
            let Some(marker_type) = sector.marker_type() else {
                continue;
            };
            let animation = sprites.get(marker_type);
            let highlighted = sector == selected;
            let center = origin + sector.direction() * radius * 0.65;
            let icon = (if highlighted { 40.0 } else { 32.0 }) * scale;
            if highlighted {
                commands.push(DrawCommand::Circle {
                    center,
                    radius: icon * 0.75,
                    stroke_width: 0.0,
                    color: animation.tint.gamma_multiply(0.35 * opacity),
                });
            }
            let alpha = if highlighted { 1.0 } else { 0.7 };
            if let Some(command) = self.sprite(
                &animation.pin.file,
                animation.pin.frame_uv(0),
                Rect::from_center_size(center, vec2(icon, icon)),
                animation.tint.gamma_multiply(alpha * opacity),
            ) {
                commands.push(command);
            }
        }
        commands
    }

    /// pin keeps its sprite's aspect ratio, is `pin_scale` times as wide as the ring,
    /// and its pivot sits on the ring center once it has landed
    fn pin_rect(&mut self, animation: &MarkerAnimation, projected: &ProjectedMarker, pose: PinPose) -> Rect {
        let width = projected.size.x * animation.pin_scale;
        let aspect = self
            .textures
            .get_or_load(&animation.pin.file, &mut *self.loader)
            .and_then(|handle| {
                let columns = animation.pin.columns.max(1) as f32;
                let rows = animation.pin.rows.max(1) as f32;
                let aspect = (handle.size.y / rows) / (handle.size.x / columns);
                (aspect.is_finite() && aspect > 0.0).then_some(aspect)
            })
            .unwrap_or(1.0);
        let size = vec2(width, width * aspect);
        let [pivot_x, pivot_y] = animation.pin_pivot;
        let min = pos2(
            projected.center.x - size.x * pivot_x,
            projected.center.y - size.y * pivot_y - pose.offset,
        );
        Rect::from_min_size(min, size)
    }

    fn sprite(&mut self, file: &str, uv: Option<Rect>, rect: Rect, tint: Color32) -> Option<DrawCommand> {
        let uv = uv?;
        let handle = self.textures.get_or_load(file, &mut *self.loader)?;
        Some(DrawCommand::Image {
            texture: handle.texture,
            rect,
            uv,
            tint,
        })
    }
}

fn reticle(center: Pos2, scale: f32, color: Color32) -> [DrawCommand; 2] {
    [
        DrawCommand::Circle {
            center,
            radius: 10.0 * scale,
            stroke_width: 2.0 * scale,
            color,
        },
        DrawCommand::Circle {
            center,
            radius: 2.0 * scale,
            stroke_width: 0.0,
            color,
        },
    ]
}
