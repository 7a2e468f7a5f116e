use egui::Color32;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sprite::{letter_tint, SpriteConfig};

pub type MarkerId = Uuid;

/// The closed set of ping kinds. Decides the animation and the tint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerType {
    Basic,
    Question,
    Danger,
    Assist,
    OnMyWay,
}

impl MarkerType {
    pub const ALL: [MarkerType; 5] = [
        MarkerType::Basic,
        MarkerType::Question,
        MarkerType::Danger,
        MarkerType::Assist,
        MarkerType::OnMyWay,
    ];
}

/// A replication group (party, alliance, linkshell ..) that pings can be broadcast to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A ping placed in the world. Immutable once created, shared as `Arc<PingMarker>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingMarker {
    pub id: MarkerId,
    pub marker_type: MarkerType,
    pub world_position: Vec3,
    pub territory_id: u32,
    pub map_id: u32,
    /// seconds on the overlay's clock. remote markers are stamped when they arrive,
    /// so that a peer's clock never rewinds our animations
    pub created_at: f64,
    pub sender_id: String,
    pub sender_display_name: String,
    /// groups this marker was broadcast to. empty means local only
    pub groups: Vec<GroupId>,
    /// letter of basic markers
    pub label: Option<char>,
}

impl PingMarker {
    /// seconds since creation. never negative
    pub fn elapsed(&self, now: f64) -> f64 {
        let elapsed = now - self.created_at;
        if elapsed.is_finite() {
            elapsed.max(0.0)
        } else {
            0.0
        }
    }
    pub fn is_local_only(&self) -> bool {
        self.groups.is_empty()
    }
    pub fn is_authored_by(&self, player_id: &str) -> bool {
        !player_id.is_empty() && self.sender_id == player_id
    }
    /// basic markers are colored by their letter, everything else by type
    pub fn tint(&self, sprites: &SpriteConfig) -> Color32 {
        match (self.marker_type, self.label) {
            (MarkerType::Basic, Some(letter)) => letter_tint(letter),
            (marker_type, _) => sprites.get(marker_type).tint,
        }
    }
}

/// Hands out letters for basic markers, A to Z, then around again.
#[derive(Debug, Clone, Default)]
pub struct LabelAllocator {
    /// offset from 'A' of the next letter to try
    next: u8,
}

impl LabelAllocator {
    const LETTERS: u8 = 26;

    /// the next letter in rotation which is not held by an active marker.
    /// If all letters are taken, the rotation just continues.
    pub fn allocate(&mut self, active: &[char]) -> char {
        let offset = (0..Self::LETTERS)
            .map(|step| (self.next + step) % Self::LETTERS)
            .find(|offset| !active.contains(&Self::letter(*offset)))
            .unwrap_or(self.next);
        self.next = (offset + 1) % Self::LETTERS;
        Self::letter(offset)
    }
    fn letter(offset: u8) -> char {
        (b'A' + offset) as char
    }
}
