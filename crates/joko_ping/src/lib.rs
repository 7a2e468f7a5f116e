//! Pings are short lived, animated markers placed on the world, shared with the player's groups.
//!
//! Every frame the host calls [PingOverlay::tick] with the input, the [joko_link::WorldLink] and the visible panels.
//! 1. the [gesture::GestureMachine] turns input into placements/removals
//! 2. placements go into the [store::MarkerStore] and out through the [bridge::PingBridge]
//! 3. markers of the current territory are culled and projected by [projection::ViewContext]
//! 4. [animator::MarkerPainter] turns them into a [joko_render::DrawList]
//!
//! Pings from other players arrive on another thread and go straight into the store
//! (see [bridge::spawn_inbound]).

pub mod animator;
pub mod bridge;
pub mod clock;
pub mod gesture;
pub mod input;
pub mod marker;
pub mod overlay;
pub mod projection;
pub mod settings;
pub mod sprite;
pub mod store;

pub use bridge::{
    apply_inbound, pump_outbound, spawn_inbound, InboundPing, OutboundPing, PingBridge,
    PingTransport, TransportError,
};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use gesture::{GestureEvent, GestureMachine, GestureState, Sector};
pub use input::PingInput;
pub use marker::{GroupId, LabelAllocator, MarkerId, MarkerType, PingMarker};
pub use overlay::{FrameContext, FrameOutput, PingOverlay};
pub use settings::PingSettings;
pub use sprite::{MarkerAnimation, SpriteConfig, SpriteSheet};
pub use store::MarkerStore;
