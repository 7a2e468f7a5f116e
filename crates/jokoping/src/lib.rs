mod app;

pub use app::{
    start_jokoping, Jokoping, LoopbackTransport, Replay, ReplayError, ReplayFrame, ReplaySummary,
    ReplayWorld,
};
