use enumflags2::{bitflags, BitFlags};
use glam::{IVec2, Vec3};
use serde::{Deserialize, Serialize};

/// The world as the host sees it this frame.
/// Filled by the game integration (or a replay) and handed to [crate::LinkManager::tick].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldLink {
    /// ui tick. (more or less represents the frame number of the host)
    /// zero means the host hasn't produced any data yet
    pub ui_tick: u32,
    /// character position
    pub player_pos: Vec3,
    /// camera position
    pub cam_pos: Vec3,
    /// direction camera is facing
    pub f_camera_front: Vec3,
    /// Vertical field-of-view in radians
    pub fov: f32,
    /// stable id of the local player. pings are tagged with this as their sender
    pub player_id: String,
    /// The name of the character
    pub name: String,
    /// the zone the player is in. pings never leave the territory they were placed in
    pub territory_id: u32,
    pub map_id: u32,
    /// refer to [UIState]
    pub ui_state: BitFlags<UIState>,
    /// This is the size of the host's viewport (width/height) in pixels
    pub client_size: IVec2,
    /// changes since last link update
    #[serde(skip)]
    pub changes: BitFlags<LinkChanges>,
}

impl WorldLink {
    /// territory zero is the login screen / loading screen
    pub fn is_logged_in(&self) -> bool {
        self.ui_tick != 0 && self.territory_id != 0
    }
    /// text entry, an open world map or an instance that forbids pings
    pub fn blocks_pings(&self) -> bool {
        self.ui_state
            .intersects(UIState::TextboxFocus | UIState::IsMapOpen | UIState::PingsForbidden)
    }
}

/// These flags represent the changes in the link compared to previous values
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChanges {
    UiTick = 1,
    Territory = 1 << 1,
    Map = 1 << 2,
    Character = 1 << 3,
    ViewportSize = 1 << 4,
}

#[bitflags]
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
/// The Uistate enum to represent the status of the UI in game
pub enum UIState {
    IsMapOpen = 0b00000001,
    GameHasFocus = 0b00000010,
    TextboxFocus = 0b00000100,
    IsInCombat = 0b00001000,
    /// the current instance doesn't allow placing pings (eg: competitive modes)
    PingsForbidden = 0b00010000,
}
