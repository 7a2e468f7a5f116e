//! Joko link is the overlay's view of the world it is drawn on top of.
//!
//! The host fills a [WorldLink] every frame (camera, player, territory, ui state).
//! [LinkManager] keeps the previous link around, so that it can tell which parts changed
//! since the last frame. Systems that care (eg: the ping overlay cancelling gestures on a
//! territory change) just check the `changes` flags instead of caching the old values themselves.
//!
//! Line of sight and picking queries against world geometry go through [WorldCollision].

mod collision;
mod link;
pub use collision::*;
pub use link::*;

use enumflags2::BitFlags;
use std::sync::Arc;
use tracing::info;

/// Caches the previous link and sets the change flags on the latest one.
#[derive(Debug, Default)]
pub struct LinkManager {
    /// latest link
    link: Arc<WorldLink>,
}

impl LinkManager {
    pub fn new() -> Self {
        Self::default()
    }
    /// `latest` is `None` when the host has nothing for us this frame (game closed, logged out etc..)
    pub fn tick(&mut self, latest: Option<WorldLink>) -> Option<Arc<WorldLink>> {
        let mut latest = match latest {
            Some(latest) => latest,
            None => {
                // reset link
                if self.link.ui_tick != 0 {
                    info!("world link lost");
                    self.link = Arc::new(Default::default());
                }
                return None;
            }
        };
        if latest.ui_tick == 0 {
            return None;
        }
        let mut changes: BitFlags<LinkChanges> = Default::default();
        if self.link.ui_tick != latest.ui_tick {
            changes.insert(LinkChanges::UiTick);
        }
        if self.link.territory_id != latest.territory_id {
            info!(
                from = self.link.territory_id,
                to = latest.territory_id,
                "territory changed"
            );
            changes.insert(LinkChanges::Territory);
        }
        if self.link.map_id != latest.map_id {
            changes.insert(LinkChanges::Map);
        }
        if self.link.player_id != latest.player_id || self.link.name != latest.name {
            changes.insert(LinkChanges::Character);
        }
        if self.link.client_size != latest.client_size {
            changes.insert(LinkChanges::ViewportSize);
        }
        latest.changes = changes;
        let link = Arc::new(latest);
        self.link = link.clone();
        Some(link)
    }
    /// the link from the last successful tick
    pub fn current(&self) -> Option<Arc<WorldLink>> {
        (self.link.ui_tick != 0).then(|| self.link.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec2;

    fn link(tick: u32, territory: u32) -> WorldLink {
        WorldLink {
            ui_tick: tick,
            territory_id: territory,
            map_id: territory,
            player_id: "player".to_owned(),
            name: "Character".to_owned(),
            client_size: IVec2::new(1920, 1080),
            ..Default::default()
        }
    }

    #[test]
    fn first_link_reports_everything_as_changed() {
        let mut manager = LinkManager::new();
        let link = manager.tick(Some(link(1, 15))).unwrap();
        assert!(link.changes.contains(LinkChanges::Territory));
        assert!(link.changes.contains(LinkChanges::Character));
        assert!(link.changes.contains(LinkChanges::ViewportSize));
    }

    #[test]
    fn territory_change_is_flagged_once() {
        let mut manager = LinkManager::new();
        manager.tick(Some(link(1, 15)));
        let same = manager.tick(Some(link(2, 15))).unwrap();
        assert!(!same.changes.contains(LinkChanges::Territory));
        assert!(same.changes.contains(LinkChanges::UiTick));
        let moved = manager.tick(Some(link(3, 50))).unwrap();
        assert!(moved.changes.contains(LinkChanges::Territory));
        assert!(moved.changes.contains(LinkChanges::Map));
        assert!(!moved.changes.contains(LinkChanges::Character));
    }

    #[test]
    fn losing_the_link_resets_state() {
        let mut manager = LinkManager::new();
        manager.tick(Some(link(1, 15)));
        assert!(manager.current().is_some());
        assert!(manager.tick(None).is_none());
        assert!(manager.current().is_none());
        // zero tick means the host isn't ready yet
        assert!(manager.tick(Some(link(0, 15))).is_none());
    }

    #[test]
    fn blocking_ui_states() {
        let mut link = link(1, 15);
        assert!(link.is_logged_in());
        assert!(!link.blocks_pings());
        link.ui_state = UIState::GameHasFocus | UIState::IsInCombat;
        assert!(!link.blocks_pings());
        link.ui_state.insert(UIState::TextboxFocus);
        assert!(link.blocks_pings());
        link.ui_state = UIState::PingsForbidden.into();
        assert!(link.blocks_pings());
        link.territory_id = 0;
        assert!(!link.is_logged_in());
    }
}
