use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::marker::{MarkerId, PingMarker};

/// All known markers, of every territory.
///
/// Cheap to clone. Clones share the same markers, so the network thread and the render loop
/// can each hold one. Markers are stored behind `Arc`s and inserted whole, so a reader never sees
/// a half written marker. The lock is only held for the duration of a single call.
#[derive(Debug, Clone, Default)]
pub struct MarkerStore {
    markers: Arc<RwLock<IndexMap<MarkerId, Arc<PingMarker>>>>,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }
    /// false if a marker with the same id is already stored. duplicate deliveries are harmless.
    pub fn add(&self, marker: PingMarker) -> bool {
        let mut markers = self.markers.write();
        if markers.contains_key(&marker.id) {
            debug!(id = %marker.id, "ignoring duplicate marker");
            return false;
        }
        markers.insert(marker.id, Arc::new(marker));
        true
    }
    /// false if there was no such marker
    pub fn remove(&self, id: &MarkerId) -> bool {
        self.take(id).is_some()
    }
    /// removes and returns the marker
    pub fn take(&self, id: &MarkerId) -> Option<Arc<PingMarker>> {
        self.markers.write().shift_remove(id)
    }
    pub fn get(&self, id: &MarkerId) -> Option<Arc<PingMarker>> {
        self.markers.read().get(id).cloned()
    }
    /// snapshot of the markers of a territory, in insertion order
    pub fn query(&self, territory_id: u32) -> Vec<Arc<PingMarker>> {
        self.markers
            .read()
            .values()
            .filter(|marker| marker.territory_id == territory_id)
            .cloned()
            .collect()
    }
    /// removes markers older than `ttl` seconds, in any territory. returns how many were removed.
    pub fn sweep_expired(&self, now: f64, ttl: f64) -> usize {
        if !(ttl >= 0.0) {
            return 0;
        }
        let mut markers = self.markers.write();
        let before = markers.len();
        markers.retain(|_, marker| marker.elapsed(now) <= ttl);
        let removed = before - markers.len();
        if removed != 0 {
            debug!(removed, "swept expired markers");
        }
        removed
    }
    pub fn len(&self) -> usize {
        self.markers.read().len()
    }
    pub fn is_empty(&self) -> bool {
        self.markers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerType;
    use glam::Vec3;
    use rstest::*;
    use uuid::Uuid;

    fn marker(territory_id: u32, created_at: f64) -> PingMarker {
        PingMarker {
            id: Uuid::new_v4(),
            marker_type: MarkerType::Danger,
            world_position: Vec3::new(1.0, 2.0, 3.0),
            territory_id,
            map_id: territory_id,
            created_at,
            sender_id: "peer".to_owned(),
            sender_display_name: "Peer".to_owned(),
            groups: vec![],
            label: None,
        }
    }

    #[fixture]
    fn store() -> MarkerStore {
        MarkerStore::new()
    }

    #[rstest]
    fn add_is_idempotent(store: MarkerStore) {
        let m = marker(1, 0.0);
        assert!(store.add(m.clone()));
        assert!(!store.add(m.clone()));
        assert_eq!(store.len(), 1);
        similar_asserts::assert_eq!(*store.get(&m.id).unwrap(), m);
    }

    #[rstest]
    fn remove_reports_presence(store: MarkerStore) {
        let m = marker(1, 0.0);
        assert!(!store.remove(&m.id));
        store.add(m.clone());
        assert!(store.remove(&m.id));
        assert!(!store.remove(&m.id));
        assert!(store.is_empty());
    }

    #[rstest]
    fn query_is_scoped_to_a_territory(store: MarkerStore) {
        let here = marker(1, 0.0);
        store.add(here.clone());
        store.add(marker(2, 0.0));
        let snapshot = store.query(1);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, here.id);
        // snapshots don't follow later mutations
        store.remove(&here.id);
        assert_eq!(snapshot.len(), 1);
        assert!(store.query(1).is_empty());
    }

    #[rstest]
    fn sweep_ignores_territories(store: MarkerStore) {
        store.add(marker(1, 0.0));
        store.add(marker(2, 5.0));
        let fresh = marker(3, 50.0);
        store.add(fresh.clone());
        assert_eq!(store.sweep_expired(61.0, 60.0), 1);
        assert_eq!(store.sweep_expired(61.0, 60.0), 0);
        assert_eq!(store.len(), 2);
        assert_eq!(store.sweep_expired(200.0, 60.0), 2);
        assert!(store.get(&fresh.id).is_none());
    }

    #[rstest]
    fn concurrent_writers_and_readers(store: MarkerStore) {
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..250 {
                        let m = marker(1, i as f64);
                        assert!(store.add(m.clone()));
                        if i % 2 == 0 {
                            assert!(store.remove(&m.id));
                        }
                    }
                })
            })
            .collect();
        let reader = {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..500 {
                    for m in store.query(1) {
                        assert_eq!(m.world_position, Vec3::new(1.0, 2.0, 3.0));
                    }
                }
            })
        };
        for writer in writers {
            writer.join().unwrap();
        }
        reader.join().unwrap();
        assert_eq!(store.len(), 4 * 125);
    }
}
