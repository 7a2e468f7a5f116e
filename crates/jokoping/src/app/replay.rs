use flume::Sender;
use glam::Vec2;
use joko_core::prelude::*;
use joko_link::{HeightmapCollision, WorldLink};
use joko_ping::{GroupId, InboundPing, OutboundPing, PingInput, PingTransport, TransportError};
use joko_render::Panel;

/// A recorded (or hand written) session: the world, and what the host saw every frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    #[serde(default)]
    pub world: ReplayWorld,
    /// groups we may broadcast to
    #[serde(default)]
    pub groups: Vec<GroupId>,
    pub frames: Vec<ReplayFrame>,
}

/// A flat heightmap. Good enough for placing pings on and occluding them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayWorld {
    /// world xz of the first sample
    pub origin: [f32; 2],
    pub cell_size: f32,
    pub width: usize,
    pub depth: usize,
    pub ground_height: f32,
    /// `[x, z, height]` overrides of single samples. hills, walls etc..
    pub bumps: Vec<(usize, usize, f32)>,
}

impl Default for ReplayWorld {
    fn default() -> Self {
        Self {
            origin: [-500.0, -500.0],
            cell_size: 2.0,
            width: 501,
            depth: 501,
            ground_height: 0.0,
            bumps: vec![],
        }
    }
}

impl ReplayWorld {
    pub fn to_collision(&self) -> Result<HeightmapCollision, ReplayError> {
        let mut collision = HeightmapCollision::flat(
            Vec2::from(self.origin),
            self.cell_size,
            self.width,
            self.depth,
            self.ground_height,
        )
        .ok_or(ReplayError::InvalidWorld {
            width: self.width,
            depth: self.depth,
            cell_size: self.cell_size,
        })?;
        for &(x, z, height) in &self.bumps {
            collision.set_height(x, z, height);
        }
        Ok(collision)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayFrame {
    pub input: PingInput,
    /// None while logged out
    pub link: Option<WorldLink>,
    /// opaque ui windows of the host this frame
    pub panels: Vec<Panel>,
    /// pings from other players that arrived right before this frame
    pub inbound: Vec<InboundPing>,
}

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ReplayError {
    #[error("no replay file given")]
    #[diagnostic(
        code(jokoping::replay::missing_path),
        help("pass the path of a replay json file as the first argument, or set JOKOPING_REPLAY")
    )]
    MissingPath,
    #[error("replay has no frames")]
    #[diagnostic(code(jokoping::replay::empty))]
    Empty,
    #[error("frame {index} goes back in time: {time} < {previous}")]
    #[diagnostic(code(jokoping::replay::time))]
    TimeWentBackwards { index: usize, time: f64, previous: f64 },
    #[error("invalid world grid: {width}x{depth} samples with cell size {cell_size}")]
    #[diagnostic(code(jokoping::replay::world))]
    InvalidWorld {
        width: usize,
        depth: usize,
        cell_size: f32,
    },
}

impl Replay {
    pub const ENV: &'static str = "JOKOPING_REPLAY";

    pub fn from_json(json: &str) -> Result<Self> {
        let replay: Self = serde_json::from_str(json)
            .into_diagnostic()
            .wrap_err("failed to deserialize replay")?;
        replay.validate()?;
        Ok(replay)
    }
    /// `path` (or the `JOKOPING_REPLAY` env var)
    pub fn load(path: Option<String>) -> Result<Self> {
        let path = path
            .or_else(|| std::env::var(Self::ENV).ok())
            .ok_or(ReplayError::MissingPath)?;
        let json = std::fs::read_to_string(&path)
            .into_diagnostic()
            .wrap_err(path.clone())
            .wrap_err("failed to read replay file")?;
        Self::from_json(&json).wrap_err(path)
    }
    pub fn validate(&self) -> Result<(), ReplayError> {
        if self.frames.is_empty() {
            return Err(ReplayError::Empty);
        }
        let mut previous = f64::NEG_INFINITY;
        for (index, frame) in self.frames.iter().enumerate() {
            let time = frame.input.time;
            if !(time >= previous) {
                return Err(ReplayError::TimeWentBackwards {
                    index,
                    time,
                    previous,
                });
            }
            previous = time;
        }
        self.world.to_collision().map(|_| ())
    }
}

/// Plays the role of a peer: everything we publish is delivered back as inbound pings.
pub struct LoopbackTransport {
    pub peer: Sender<InboundPing>,
}

impl PingTransport for LoopbackTransport {
    fn send(&mut self, message: OutboundPing) -> Result<(), TransportError> {
        let inbound = match message {
            OutboundPing::Publish { marker, .. } => InboundPing::Placed(marker),
            OutboundPing::Remove { id, .. } => InboundPing::Removed(id),
        };
        self.peer.send(inbound).map_err(|_| TransportError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[test]
    fn minimal_replay() {
        let replay = Replay::from_json(r#"{ "frames": [ { "input": { "time": 0.5 } } ] }"#).unwrap();
        assert_eq!(replay.frames.len(), 1);
        assert!(replay.frames[0].link.is_none());
        assert!(replay.groups.is_empty());
    }

    #[rstest]
    #[case::empty(r#"{ "frames": [] }"#)]
    #[case::backwards(r#"{ "frames": [ { "input": { "time": 2.0 } }, { "input": { "time": 1.0 } } ] }"#)]
    #[case::world(r#"{ "world": { "width": 1 }, "frames": [ { "input": { "time": 0.0 } } ] }"#)]
    fn invalid_replays(#[case] json: &str) {
        assert!(Replay::from_json(json).is_err());
    }

    #[test]
    fn bumps_raise_the_ground() {
        let world = ReplayWorld {
            bumps: vec![(10, 10, 7.0)],
            ..Default::default()
        };
        let collision = world.to_collision().unwrap();
        assert_eq!(collision.height_at(-480.0, -480.0), Some(7.0));
        assert_eq!(collision.height_at(0.0, 0.0), Some(0.0));
    }

    #[test]
    fn loopback_echoes_publishes() {
        let (peer, inbound) = flume::unbounded();
        let mut transport = LoopbackTransport { peer };
        let id = uuid_like();
        transport
            .send(OutboundPing::Remove {
                group: GroupId::new("party"),
                id,
            })
            .unwrap();
        assert_eq!(inbound.try_recv().unwrap(), InboundPing::Removed(id));
        drop(inbound);
        assert!(matches!(
            transport.send(OutboundPing::Remove {
                group: GroupId::new("party"),
                id,
            }),
            Err(TransportError::Closed)
        ));
    }

    fn uuid_like() -> joko_ping::MarkerId {
        joko_ping::MarkerId::from_u128(0x1234)
    }
}
