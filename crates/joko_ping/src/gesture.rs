//! The ping mode state machine.
//!
//! ```text
//! Idle -> Arming (ping key held) -> Active (ping mode)
//! Active -> Pressing (primary pressed) -> Active/Idle (quick click: basic ping at the release point)
//!                                      -> RadialMenu (held or dragged) -> Active/Idle (sector ping at the origin)
//! ```
//! All timings are measured against [PingInput::time], so the frame rate doesn't matter.

use egui::{vec2, Pos2, Vec2};
use tracing::{debug, info};

use crate::input::PingInput;
use crate::marker::{MarkerId, MarkerType};
use crate::settings::PingSettings;

/// A slice of the radial menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sector {
    /// the dead zone. releasing here cancels
    Center,
    Right,
    Down,
    Up,
    Left,
}

impl Sector {
    pub const DIRECTIONS: [Sector; 4] = [Sector::Right, Sector::Down, Sector::Up, Sector::Left];

    /// Screen space, y points down.
    /// Each diagonal belongs to exactly one side: both right diagonals are `Right`,
    /// the lower left one is `Down` and the upper left one is `Up`.
    pub fn resolve(origin: Pos2, pointer: Pos2, dead_zone: f32) -> Self {
        let delta = pointer - origin;
        if delta.length() <= dead_zone {
            return Sector::Center;
        }
        let (dx, dy) = (delta.x, delta.y);
        if dx >= dy.abs() {
            Sector::Right
        } else if dy > 0.0 && dy > dx && dy >= -dx {
            Sector::Down
        } else if dy < 0.0 && -dy > dx && -dy >= -dx {
            Sector::Up
        } else {
            Sector::Left
        }
    }
    pub fn marker_type(self) -> Option<MarkerType> {
        match self {
            Sector::Center => None,
            Sector::Right => Some(MarkerType::Assist),
            Sector::Down => Some(MarkerType::OnMyWay),
            Sector::Up => Some(MarkerType::Danger),
            Sector::Left => Some(MarkerType::Question),
        }
    }
    /// unit vector pointing at the sector, in screen space
    pub fn direction(self) -> Vec2 {
        match self {
            Sector::Center => Vec2::ZERO,
            Sector::Right => vec2(1.0, 0.0),
            Sector::Down => vec2(0.0, 1.0),
            Sector::Up => vec2(0.0, -1.0),
            Sector::Left => vec2(-1.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    /// ping key is being held
    Arming { since: f64 },
    /// ping mode. waiting for a click
    Active,
    /// primary button is down, not yet decided between a click and the menu
    Pressing { origin: Pos2, since: f64 },
    RadialMenu { origin: Pos2, sector: Sector },
}

/// What the overlay must do after this frame's input
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    EnteredPingMode,
    ExitedPingMode,
    /// commit a new marker at this screen position
    Place {
        marker_type: MarkerType,
        screen_pos: Pos2,
    },
    /// delete one of our own markers
    RemoveOwn(MarkerId),
    /// an in-flight gesture was dropped without placing anything
    Cancelled,
}

/// What the machine needs to know about the rest of the world this frame
#[derive(Debug, Clone, Copy)]
pub struct GestureContext<'a> {
    /// false when logged out, disabled, typing, or in a ping forbidding instance
    pub allowed: bool,
    /// our own markers that are on screen right now
    pub own_markers: &'a [(MarkerId, Pos2)],
}

#[derive(Debug)]
pub struct GestureMachine {
    state: GestureState,
    /// set after leaving ping mode with the ping key, so that keeping it held doesn't re-arm
    wait_for_key_release: bool,
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureMachine {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
            wait_for_key_release: false,
        }
    }
    pub fn state(&self) -> GestureState {
        self.state
    }
    pub fn in_ping_mode(&self) -> bool {
        matches!(
            self.state,
            GestureState::Active | GestureState::Pressing { .. } | GestureState::RadialMenu { .. }
        )
    }
    /// while in ping mode, the host should hide its cursor and route all clicks to us
    pub fn wants_pointer_capture(&self) -> bool {
        self.in_ping_mode()
    }
    /// 0..=1 while the ping key is being held
    pub fn arming_progress(&self, now: f64, settings: &PingSettings) -> Option<f32> {
        match self.state {
            GestureState::Arming { since } => {
                if settings.arm_duration <= 0.0 {
                    return Some(1.0);
                }
                Some(((now - since) / settings.arm_duration).clamp(0.0, 1.0) as f32)
            }
            _ => None,
        }
    }
    /// drops whatever we are doing and goes back to idle. never leaves anything behind.
    pub fn cancel(&mut self) -> Vec<GestureEvent> {
        let events = match self.state {
            GestureState::Idle | GestureState::Arming { .. } => vec![],
            GestureState::Active => vec![GestureEvent::ExitedPingMode],
            GestureState::Pressing { .. } | GestureState::RadialMenu { .. } => {
                vec![GestureEvent::Cancelled, GestureEvent::ExitedPingMode]
            }
        };
        if self.in_ping_mode() {
            info!("left ping mode");
        }
        self.state = GestureState::Idle;
        events
    }
    /// For frames where nothing can be placed (no camera).
    /// The ping key is still watched, so letting go of it in such a frame breaks the arming hold.
    pub fn watch_keys(&mut self, input: &PingInput, settings: &PingSettings) {
        let key = settings.ping_key.as_str();
        if self.wait_for_key_release && !input.key_down(key) {
            self.wait_for_key_release = false;
        }
        if matches!(self.state, GestureState::Arming { .. })
            && (!input.key_down(key) || input.text_input_active)
        {
            debug!("arming interrupted");
            self.state = GestureState::Idle;
        }
    }

    pub fn update(
        &mut self,
        input: &PingInput,
        ctx: &GestureContext,
        settings: &PingSettings,
    ) -> Vec<GestureEvent> {
        if !ctx.allowed {
            if self.state != GestureState::Idle {
                debug!(state = ?self.state, "pings not allowed right now. cancelling");
            }
            return self.cancel();
        }
        let key = settings.ping_key.as_str();
        if self.wait_for_key_release && !input.key_down(key) {
            self.wait_for_key_release = false;
        }
        if self.in_ping_mode() && (input.escape_pressed || input.secondary_clicked) {
            return self.cancel();
        }
        if self.in_ping_mode() && input.key_pressed(key) {
            self.wait_for_key_release = true;
            return self.cancel();
        }

        let mut events = Vec::new();
        if self.state == GestureState::Idle
            && !self.wait_for_key_release
            && !input.text_input_active
            && input.key_down(key)
        {
            self.state = GestureState::Arming { since: input.time };
        }
        if let GestureState::Arming { since } = self.state {
            if !input.key_down(key) || input.text_input_active {
                // progress is not kept
                self.state = GestureState::Idle;
            } else if input.time - since >= settings.arm_duration {
                info!("entered ping mode");
                self.state = GestureState::Active;
                events.push(GestureEvent::EnteredPingMode);
                return events;
            }
        }

        if self.state == GestureState::Active && input.primary_pressed {
            if let Some(pointer) = input.pointer {
                if let Some(id) = self.own_marker_near(pointer, ctx, settings) {
                    debug!(%id, "removing own marker");
                    events.push(GestureEvent::RemoveOwn(id));
                    self.after_commit(settings, &mut events);
                    return events;
                }
                self.state = GestureState::Pressing {
                    origin: pointer,
                    since: input.time,
                };
            }
        }
        let released = input.primary_released || !input.primary_down;
        if let GestureState::Pressing { origin, since } = self.state {
            let pointer = input.pointer.unwrap_or(origin);
            let moved = (pointer - origin).length() > settings.drag_radius * settings.scale();
            let held = input.time - since >= settings.hold_threshold;
            if held || moved {
                debug!(held, moved, "opening radial menu");
                self.state = GestureState::RadialMenu {
                    origin,
                    sector: Sector::resolve(origin, pointer, settings.dead_zone()),
                };
            } else if released {
                events.push(GestureEvent::Place {
                    marker_type: MarkerType::Basic,
                    screen_pos: pointer,
                });
                self.after_commit(settings, &mut events);
                return events;
            }
        }
        if let GestureState::RadialMenu { origin, sector } = self.state {
            let sector = input
                .pointer
                .map(|pointer| Sector::resolve(origin, pointer, settings.dead_zone()))
                .unwrap_or(sector);
            self.state = GestureState::RadialMenu { origin, sector };
            if released {
                match sector.marker_type() {
                    Some(marker_type) => {
                        events.push(GestureEvent::Place {
                            marker_type,
                            screen_pos: origin,
                        });
                        self.after_commit(settings, &mut events);
                    }
                    None => {
                        debug!("radial menu released in the dead zone");
                        events.push(GestureEvent::Cancelled);
                        self.state = GestureState::Active;
                    }
                }
            }
        }
        events
    }

    fn after_commit(&mut self, settings: &PingSettings, events: &mut Vec<GestureEvent>) {
        if settings.exit_after_placement {
            info!("left ping mode");
            self.state = GestureState::Idle;
            events.push(GestureEvent::ExitedPingMode);
        } else {
            self.state = GestureState::Active;
        }
    }

    fn own_marker_near(
        &self,
        pointer: Pos2,
        ctx: &GestureContext,
        settings: &PingSettings,
    ) -> Option<MarkerId> {
        let radius = settings.self_hit_radius * settings.scale();
        ctx.own_markers
            .iter()
            .map(|(id, pos)| (id, pos.distance(pointer)))
            .filter(|(_, distance)| *distance <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| *id)
    }
}
