use std::sync::Arc;

use egui::Pos2;
use glam::Vec3;
use joko_link::{LinkChanges, WorldCollision, WorldLink};
use joko_render::{Camera, DrawList, Panel, SpriteLoader, TextureCache};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::animator::MarkerPainter;
use crate::bridge::PingBridge;
use crate::gesture::{GestureContext, GestureEvent, GestureMachine};
use crate::input::PingInput;
use crate::marker::{GroupId, LabelAllocator, MarkerId, MarkerType, PingMarker};
use crate::projection::{ProjectedMarker, ViewContext, Visibility};
use crate::settings::PingSettings;
use crate::sprite::SpriteConfig;
use crate::store::MarkerStore;

/// Everything the host hands us for one frame
pub struct FrameContext<'a> {
    pub input: &'a PingInput,
    /// None when the host has no link (game closed, logged out)
    pub link: Option<&'a WorldLink>,
    pub collision: &'a dyn WorldCollision,
    /// visible ui panels of the host
    pub panels: &'a [Panel],
    /// groups we may broadcast to right now. empty means our pings stay local
    pub groups: &'a [GroupId],
    pub loader: &'a mut dyn SpriteLoader,
}

#[derive(Debug, Default)]
pub struct FrameOutput {
    pub draw_list: DrawList,
    /// the host should hide its cursor and send clicks only to us
    pub pointer_capture: bool,
    pub events: Vec<GestureEvent>,
}

/// The ping overlay. Call [PingOverlay::tick] once per frame from the render loop.
pub struct PingOverlay {
    settings: Arc<PingSettings>,
    sprites: Arc<SpriteConfig>,
    store: MarkerStore,
    bridge: PingBridge,
    gesture: GestureMachine,
    labels: LabelAllocator,
    textures: TextureCache,
}

impl PingOverlay {
    pub fn new(
        settings: Arc<PingSettings>,
        sprites: Arc<SpriteConfig>,
        store: MarkerStore,
        bridge: PingBridge,
    ) -> Self {
        Self {
            settings,
            sprites,
            store,
            bridge,
            gesture: GestureMachine::new(),
            labels: LabelAllocator::default(),
            textures: TextureCache::default(),
        }
    }
    /// takes effect on the next tick
    pub fn set_settings(&mut self, settings: Arc<PingSettings>) {
        self.settings = settings;
    }
    pub fn settings(&self) -> &PingSettings {
        &self.settings
    }
    pub fn store(&self) -> &MarkerStore {
        &self.store
    }
    pub fn gesture(&self) -> &GestureMachine {
        &self.gesture
    }

    pub fn tick(&mut self, frame: FrameContext) -> FrameOutput {
        let FrameContext {
            input,
            link,
            collision,
            panels,
            groups,
            loader,
        } = frame;
        let settings = self.settings.clone();
        let sprites = self.sprites.clone();
        let now = input.time;
        let mut output = FrameOutput::default();

        self.store.sweep_expired(now, settings.marker_ttl);

        let link = match link {
            Some(link) if settings.enabled && link.is_logged_in() => link,
            _ => {
                output.events = self.gesture.cancel();
                return output;
            }
        };
        if link
            .changes
            .intersects(LinkChanges::Territory | LinkChanges::Character)
        {
            output.events.extend(self.gesture.cancel());
        }
        let Some(camera) = Camera::from_link(link) else {
            debug!(ui_tick = link.ui_tick, "no usable camera this frame");
            self.gesture.watch_keys(input, &settings);
            return output;
        };
        let view = ViewContext {
            camera: &camera,
            viewer: link.player_pos,
            collision,
            panels,
            settings: &settings,
        };

        let mut visible = self.visible_markers(&view, &sprites, link.territory_id, now);
        let own_markers: Vec<(MarkerId, Pos2)> = visible
            .iter()
            .filter(|(marker, _)| marker.is_authored_by(&link.player_id))
            .map(|(marker, projected)| (marker.id, projected.center))
            .collect();
        let ctx = GestureContext {
            allowed: !link.blocks_pings(),
            own_markers: &own_markers,
        };
        let events = self.gesture.update(input, &ctx, &settings);

        let mut store_changed = false;
        for event in &events {
            match event {
                GestureEvent::Place {
                    marker_type,
                    screen_pos,
                } => {
                    store_changed |=
                        self.place(*marker_type, *screen_pos, &camera, link, collision, groups, now);
                }
                GestureEvent::RemoveOwn(id) => {
                    store_changed |= self.remove_own(*id);
                }
                GestureEvent::EnteredPingMode
                | GestureEvent::ExitedPingMode
                | GestureEvent::Cancelled => {}
            }
        }
        output.events.extend(events);
        if store_changed {
            visible = self.visible_markers(&view, &sprites, link.territory_id, now);
        }

        let mut painter = MarkerPainter {
            sprites: &sprites,
            settings: &settings,
            textures: &mut self.textures,
            loader,
        };
        for (marker, projected) in &visible {
            output
                .draw_list
                .add_marker(painter.paint(marker, projected, now));
        }
        output
            .draw_list
            .add_overlay(painter.paint_gesture(&self.gesture, input));
        output.pointer_capture = self.gesture.wants_pointer_capture();
        output
    }

    /// markers of the territory that are still animating and pass every visibility check
    fn visible_markers(
        &self,
        view: &ViewContext,
        sprites: &SpriteConfig,
        territory_id: u32,
        now: f64,
    ) -> Vec<(Arc<PingMarker>, ProjectedMarker)> {
        self.store
            .query(territory_id)
            .into_iter()
            .filter_map(|marker| {
                let animation = sprites.get(marker.marker_type);
                if marker.elapsed(now) > animation.lifetime() {
                    return None;
                }
                match view.visibility(&marker, animation) {
                    Visibility::Visible(projected) => Some((marker, projected)),
                    hidden => {
                        trace!(id = %marker.id, ?hidden, "marker hidden");
                        None
                    }
                }
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &mut self,
        marker_type: MarkerType,
        screen_pos: Pos2,
        camera: &Camera,
        link: &WorldLink,
        collision: &dyn WorldCollision,
        groups: &[GroupId],
        now: f64,
    ) -> bool {
        let Some(world_position) =
            screen_to_world(camera, link, collision, screen_pos, self.settings.max_distance)
        else {
            warn!(?screen_pos, "no ground under the cursor. ping dropped");
            return false;
        };
        let label = (marker_type == MarkerType::Basic).then(|| {
            let active: Vec<char> = self
                .store
                .query(link.territory_id)
                .iter()
                .filter(|m| m.elapsed(now) <= self.sprites.get(m.marker_type).lifetime())
                .filter_map(|m| m.label)
                .collect();
            self.labels.allocate(&active)
        });
        let marker = PingMarker {
            id: Uuid::new_v4(),
            marker_type,
            world_position,
            territory_id: link.territory_id,
            map_id: link.map_id,
            created_at: now,
            sender_id: link.player_id.clone(),
            sender_display_name: link.name.clone(),
            groups: groups.to_vec(),
            label,
        };
        info!(id = %marker.id, ?marker_type, ?label, ?world_position, "placed ping");
        if marker.is_local_only() {
            info!(id = %marker.id, "no group to share the ping with. keeping it local");
        }
        for group in groups {
            self.bridge.publish(group, &marker);
        }
        self.store.add(marker)
    }

    fn remove_own(&mut self, id: MarkerId) -> bool {
        let Some(marker) = self.store.take(&id) else {
            debug!(%id, "marker to remove is already gone");
            return false;
        };
        info!(%id, "removed own ping");
        for group in &marker.groups {
            self.bridge.publish_removal(group, id);
        }
        true
    }
}

/// The world point under a screen position.
/// World geometry first, then the horizontal plane at the player's height.
pub fn screen_to_world(
    camera: &Camera,
    link: &WorldLink,
    collision: &dyn WorldCollision,
    screen_pos: Pos2,
    max_distance: f32,
) -> Option<Vec3> {
    let (origin, direction) = camera.screen_ray(screen_pos)?;
    if let Some(hit) = collision.pick(origin, direction, max_distance) {
        return Some(hit);
    }
    if direction.y.abs() < 1e-6 {
        return None;
    }
    let t = (link.player_pos.y - origin.y) / direction.y;
    (t > 0.0 && t <= max_distance).then(|| origin + direction * t)
}
