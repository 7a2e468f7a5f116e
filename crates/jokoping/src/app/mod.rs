//! The jokoping binary drives the overlay from a replay file instead of a live game.
//! Every frame goes through the same path a game integration would take:
//! link manager -> overlay tick -> egui painter.

mod replay;

use std::thread::JoinHandle;

use egui::{Id, LayerId, Order, Pos2, RawInput, Rect};
use joko_core::prelude::*;
use joko_link::{HeightmapCollision, LinkManager};
use joko_ping::{
    apply_inbound, pump_outbound, spawn_inbound, FrameContext, GestureEvent, GroupId, ManualClock,
    MarkerStore, PingBridge, PingOverlay, PingSettings, SpriteConfig,
};
use joko_render::EguiSpriteLoader;

pub use replay::{LoopbackTransport, Replay, ReplayError, ReplayFrame, ReplayWorld};

const PING_SETTINGS: &str = "ping_settings";
const SPRITE_CONFIG: &str = "sprite_config";
const SPRITES_DIR: &str = "sprites";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub placements: usize,
    pub removals: usize,
    /// most markers drawn in a single frame
    pub peak_markers: usize,
    /// frames where the overlay owned the pointer
    pub captured_frames: usize,
    /// markers left in our store at the end
    pub local_markers: usize,
    /// markers a peer in our groups ended up with
    pub peer_markers: usize,
}

pub struct Jokoping {
    etx: egui::Context,
    overlay: PingOverlay,
    links: LinkManager,
    world: HeightmapCollision,
    loader: EguiSpriteLoader,
    groups: Vec<GroupId>,
    clock: Arc<ManualClock>,
    /// what a peer sees of our pings
    peer_store: MarkerStore,
    pump: JoinHandle<()>,
    peer: JoinHandle<()>,
}

impl Jokoping {
    pub fn new(
        settings: PingSettings,
        sprites: SpriteConfig,
        sprites_dir: Dir,
        replay: &Replay,
    ) -> Result<Self> {
        let world = replay.world.to_collision()?;
        let etx = egui::Context::default();
        let loader = EguiSpriteLoader::new(etx.clone(), sprites_dir);
        let start = replay.frames.first().map(|f| f.input.time).unwrap_or_default();
        let clock = Arc::new(ManualClock::new(start));

        let (bridge, outbound) = PingBridge::new();
        let (peer_sender, peer_receiver) = flume::unbounded();
        let pump = pump_outbound(outbound, LoopbackTransport { peer: peer_sender });
        let peer_store = MarkerStore::new();
        let peer = spawn_inbound(peer_store.clone(), peer_receiver, clock.clone());

        let overlay = PingOverlay::new(
            Arc::new(settings),
            Arc::new(sprites),
            MarkerStore::new(),
            bridge,
        );
        Ok(Self {
            etx,
            overlay,
            links: LinkManager::new(),
            world,
            loader,
            groups: replay.groups.clone(),
            clock,
            peer_store,
            pump,
            peer,
        })
    }

    pub fn run(mut self, frames: Vec<ReplayFrame>) -> Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();
        for frame in frames {
            self.frame(frame, &mut summary);
        }
        summary.local_markers = self.overlay.store().len();

        let Self {
            overlay,
            pump,
            peer,
            peer_store,
            ..
        } = self;
        // closes the outbound queue, which in turn closes the peer's inbound queue
        drop(overlay);
        pump.join()
            .map_err(|_| miette::miette!("outbound ping pump panicked"))?;
        peer.join()
            .map_err(|_| miette::miette!("peer inbound thread panicked"))?;
        summary.peer_markers = peer_store.len();
        Ok(summary)
    }

    fn frame(&mut self, frame: ReplayFrame, summary: &mut ReplaySummary) {
        let ReplayFrame {
            input,
            link,
            panels,
            inbound,
        } = frame;
        self.clock.set(input.time);
        let link = self.links.tick(link);
        for event in inbound {
            apply_inbound(self.overlay.store(), event, input.time);
        }
        let output = self.overlay.tick(FrameContext {
            input: &input,
            link: link.as_deref(),
            collision: &self.world,
            panels: &panels,
            groups: &self.groups,
            loader: &mut self.loader,
        });

        let screen_rect = link.as_ref().map(|link| {
            Rect::from_min_size(Pos2::ZERO, link.client_size.as_vec2().to_array().into())
        });
        let raw_input = RawInput {
            screen_rect,
            time: Some(input.time),
            ..Default::default()
        };
        let full_output = self.etx.run(raw_input, |etx| {
            let painter = etx.layer_painter(LayerId::new(Order::Foreground, Id::new("ping_overlay")));
            output.draw_list.paint(&painter);
        });

        for event in &output.events {
            match event {
                GestureEvent::Place { marker_type, .. } => {
                    debug!(?marker_type, "placement");
                    summary.placements += 1;
                }
                GestureEvent::RemoveOwn(id) => {
                    debug!(%id, "removal");
                    summary.removals += 1;
                }
                GestureEvent::EnteredPingMode
                | GestureEvent::ExitedPingMode
                | GestureEvent::Cancelled => {
                    debug!(?event, "gesture");
                }
            }
        }
        summary.frames += 1;
        summary.peak_markers = summary.peak_markers.max(output.draw_list.markers.len());
        if output.pointer_capture {
            summary.captured_frames += 1;
        }
        trace!(
            time = input.time,
            markers = output.draw_list.markers.len(),
            overlay = output.draw_list.overlay.len(),
            shapes = full_output.shapes.len(),
            capture = output.pointer_capture,
            "frame done"
        );
    }
}

/// loads configs from the data dir and plays the replay given on the command line
fn run_replay(jdir: &Dir) -> Result<ReplaySummary> {
    let settings: PingSettings = load_or_create_json(jdir, PING_SETTINGS)?;
    let sprites: SpriteConfig = load_or_create_json(jdir, SPRITE_CONFIG)?;
    let sprites_dir = open_sub_dir(jdir, SPRITES_DIR)?;
    let mut replay = Replay::load(std::env::args().nth(1))?;
    info!(
        frames = replay.frames.len(),
        groups = replay.groups.len(),
        "loaded replay"
    );
    let frames = std::mem::take(&mut replay.frames);
    Jokoping::new(settings, sprites, sprites_dir, &replay)?.run(frames)
}

pub fn start_jokoping() {
    let jdir = match get_jokoping_dir() {
        Ok(jdir) => jdir,
        Err(e) => {
            eprintln!("failed to create jokoping dir: {e:#?}");
            panic!("failed to create jokoping_dir: {e:#?}");
        }
    };
    let log_file_flush_guard = match install_tracing(&jdir) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("failed to install tracing: {e:#?}");
            panic!("failed to install tracing: {e:#?}");
        }
    };
    install_panic_hook();

    match run_replay(&jdir) {
        Ok(summary) => {
            info!(?summary, "replay finished");
        }
        Err(e) => {
            error!(?e, "failed to run replay");
            eprintln!("{e:?}");
        }
    }
    std::mem::drop(log_file_flush_guard);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{IVec2, Vec3};
    use joko_link::WorldLink;
    use joko_ping::PingInput;

    fn empty_dir(name: &str) -> Dir {
        let path = std::env::temp_dir().join(format!("jokoping_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        Dir::open_ambient_dir(path.to_str().unwrap(), cap_std::ambient_authority()).unwrap()
    }

    fn link() -> WorldLink {
        WorldLink {
            ui_tick: 1,
            player_pos: Vec3::ZERO,
            cam_pos: Vec3::new(0.0, 10.0, -15.0),
            f_camera_front: Vec3::new(0.0, -0.5, 1.0).normalize(),
            fov: 1.0,
            player_id: "me".to_owned(),
            name: "Me".to_owned(),
            territory_id: 7,
            map_id: 7,
            client_size: IVec2::new(1920, 1080),
            ..Default::default()
        }
    }

    fn frame(time: f64, input: PingInput) -> ReplayFrame {
        let mut link = link();
        link.ui_tick = (time * 60.0) as u32 + 1;
        ReplayFrame {
            input: PingInput { time, ..input },
            link: Some(link),
            ..Default::default()
        }
    }

    fn holding_tab() -> PingInput {
        PingInput {
            keys_down: vec!["Tab".to_owned()],
            pointer: Some(Pos2::new(960.0, 540.0)),
            ..Default::default()
        }
    }

    fn quick_click_replay() -> Replay {
        let pointer = Some(Pos2::new(960.0, 540.0));
        Replay {
            world: ReplayWorld::default(),
            groups: vec![GroupId::new("party")],
            frames: vec![
                frame(1.0, holding_tab()),
                frame(2.25, holding_tab()),
                frame(
                    2.5,
                    PingInput {
                        pointer,
                        primary_down: true,
                        primary_pressed: true,
                        ..Default::default()
                    },
                ),
                frame(
                    2.55,
                    PingInput {
                        pointer,
                        primary_released: true,
                        ..Default::default()
                    },
                ),
                frame(2.6, PingInput { pointer, ..Default::default() }),
            ],
        }
    }

    #[test]
    fn quick_click_reaches_the_peer() {
        let mut replay = quick_click_replay();
        let frames = std::mem::take(&mut replay.frames);
        let app = Jokoping::new(
            PingSettings::default(),
            SpriteConfig::default(),
            empty_dir("quick_click"),
            &replay,
        )
        .unwrap();
        let summary = app.run(frames).unwrap();
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.placements, 1);
        assert_eq!(summary.removals, 0);
        assert_eq!(summary.peak_markers, 1);
        assert_eq!(summary.local_markers, 1);
        assert_eq!(summary.peer_markers, 1);
    }

    #[test]
    fn local_only_pings_never_reach_the_peer() {
        let mut replay = quick_click_replay();
        replay.groups.clear();
        let frames = std::mem::take(&mut replay.frames);
        let app = Jokoping::new(
            PingSettings::default(),
            SpriteConfig::default(),
            empty_dir("local_only"),
            &replay,
        )
        .unwrap();
        let summary = app.run(frames).unwrap();
        assert_eq!(summary.local_markers, 1);
        assert_eq!(summary.peer_markers, 0);
    }

    #[test]
    fn logged_out_frames_draw_nothing() {
        let replay = Replay {
            world: ReplayWorld::default(),
            groups: vec![],
            frames: vec![ReplayFrame {
                input: holding_tab(),
                ..Default::default()
            }],
        };
        let app = Jokoping::new(
            PingSettings::default(),
            SpriteConfig::default(),
            empty_dir("logged_out"),
            &replay,
        )
        .unwrap();
        let summary = app.run(replay.frames.clone()).unwrap();
        assert_eq!(summary, ReplaySummary { frames: 1, ..Default::default() });
    }
}
