//! Marker registry
//!
//! Owns the ordered marker collection. After every structural change the
//! markers are renumbered so their ids are exactly `1..=N` in current
//! order; "marker 3" always means the third marker on screen.
//!
//! Every mutation is written through to the store before the call
//! returns. A failed write is logged and the in-memory list stays
//! authoritative for the rest of the session.

use crate::error::MarkerError;
use crate::marker::{check_point, Marker, MAX_MARKERS};
use crate::store::MarkerStore;

/// Ordered, persisted collection of markers
pub struct MarkerRegistry {
    markers: Vec<Marker>,
    store: Box<dyn MarkerStore>,
    /// Whether the last write reached the store
    durable: bool,
}

impl MarkerRegistry {
    /// Create an empty registry; call `load()` to read persisted markers
    pub fn new(store: Box<dyn MarkerStore>) -> Self {
        Self {
            markers: Vec::new(),
            store,
            durable: true,
        }
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// Stale or duplicate ids are renumbered and the correction is written
    /// back immediately. Returns the number of markers loaded.
    pub fn load(&mut self) -> usize {
        self.markers = match self.store.load_markers() {
            Ok(markers) => markers,
            Err(e) => {
                tracing::error!(
                    "Failed to load markers from {}: {}",
                    self.store.describe(),
                    e
                );
                Vec::new()
            }
        };

        if self.markers.len() > MAX_MARKERS {
            tracing::warn!(
                "Store holds {} markers, keeping the first {}",
                self.markers.len(),
                MAX_MARKERS
            );
            self.markers.truncate(MAX_MARKERS);
            self.renumber();
            self.persist();
        } else if !self.is_sequential() {
            tracing::warn!(
                "Stored marker ids {:?} are not sequential, renumbering",
                self.ids()
            );
            self.renumber();
            self.persist();
        }

        tracing::info!("Loaded {} markers", self.markers.len());
        self.markers.len()
    }

    /// Append a marker at the given point
    pub fn add(&mut self, x: f32, y: f32) -> Result<Marker, MarkerError> {
        check_point(x, y)?;
        if self.markers.len() >= MAX_MARKERS {
            tracing::debug!("Rejecting marker at ({:.0}, {:.0}): registry full", x, y);
            return Err(MarkerError::CapacityExceeded(MAX_MARKERS));
        }

        // Ids must be sequential before the next one is derived from the count
        self.renumber();

        let marker = Marker::new(self.next_id(), x, y);
        self.markers.push(marker);
        self.persist();

        tracing::debug!("Added marker {}", marker);
        Ok(marker)
    }

    /// Remove the highest-numbered marker
    pub fn remove_last(&mut self) -> Option<Marker> {
        let removed = self.markers.pop()?;
        self.renumber();
        self.persist();

        tracing::debug!("Removed last marker {}", removed);
        Some(removed)
    }

    /// Remove the marker whose center is closest to the point.
    /// Ties go to the earliest marker; a non-finite point removes nothing.
    pub fn remove_nearest(&mut self, x: f32, y: f32) -> Option<Marker> {
        check_point(x, y).ok()?;
        let index = self
            .markers
            .iter()
            .enumerate()
            .map(|(i, m)| (i, m.distance_sq(x, y)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)?;

        let removed = self.markers.remove(index);
        self.renumber();
        self.persist();

        tracing::debug!("Removed marker {} nearest to ({:.0}, {:.0})", removed, x, y);
        Some(removed)
    }

    /// Remove the marker with the given id, if present
    pub fn remove_by_id(&mut self, id: u32) -> Option<Marker> {
        let index = self.markers.iter().position(|m| m.id == id)?;

        let removed = self.markers.remove(index);
        self.renumber();
        self.persist();

        tracing::debug!("Removed marker {}", removed);
        Some(removed)
    }

    /// Move a marker without changing its id or position in the order
    pub fn reposition(&mut self, id: u32, x: f32, y: f32) -> Result<Marker, MarkerError> {
        check_point(x, y)?;
        let marker = self
            .markers
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(MarkerError::NotFound(id))?;

        marker.x = x;
        marker.y = y;
        let moved = *marker;
        self.persist();

        tracing::debug!("Moved marker {}", moved);
        Ok(moved)
    }

    /// Remove all markers; returns how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.markers.len();
        self.markers.clear();
        self.persist();

        tracing::debug!("Cleared {} markers", removed);
        removed
    }

    /// Number of markers
    pub fn count(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Markers in current order
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Look up a marker by id
    pub fn get(&self, id: u32) -> Option<Marker> {
        self.markers.iter().find(|m| m.id == id).copied()
    }

    /// Current ids in order
    pub fn ids(&self) -> Vec<u32> {
        self.markers.iter().map(|m| m.id).collect()
    }

    /// False if the most recent write to the store failed
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// The backing store (display settings live next to the markers)
    pub fn store(&self) -> &dyn MarkerStore {
        self.store.as_ref()
    }

    fn next_id(&self) -> u32 {
        self.markers.len() as u32 + 1
    }

    fn is_sequential(&self) -> bool {
        self.markers
            .iter()
            .enumerate()
            .all(|(i, m)| m.id == i as u32 + 1)
    }

    fn renumber(&mut self) {
        for (i, marker) in self.markers.iter_mut().enumerate() {
            marker.id = i as u32 + 1;
        }
    }

    fn persist(&mut self) {
        match self.store.save_markers(&self.markers) {
            Ok(()) => self.durable = true,
            Err(e) => {
                // In-memory state stays authoritative for this session
                tracing::error!("{} ({} markers kept in memory)", e, self.markers.len());
                self.durable = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registry_with(store: &MemoryStore) -> MarkerRegistry {
        let mut registry = MarkerRegistry::new(Box::new(store.clone()));
        registry.load();
        registry
    }

    fn assert_sequential(registry: &MarkerRegistry) {
        let expected: Vec<u32> = (1..=registry.count() as u32).collect();
        assert_eq!(registry.ids(), expected);
    }

    #[test]
    fn test_add_assigns_next_id_and_persists() {
        let store = MemoryStore::new();
        let mut registry = registry_with(&store);

        let first = registry.add(10.0, 20.0).unwrap();
        let second = registry.add(30.0, 40.0).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.saved_markers(), registry.markers());
    }

    #[test]
    fn test_capacity_exceeded_leaves_registry_unchanged() {
        let store = MemoryStore::new();
        let mut registry = registry_with(&store);
        for i in 0..MAX_MARKERS {
            registry.add(i as f32, i as f32).unwrap();
        }
        let before = registry.markers().to_vec();
        let writes = store.write_count();

        assert_eq!(
            registry.add(99.0, 99.0),
            Err(MarkerError::CapacityExceeded(MAX_MARKERS))
        );
        assert_eq!(registry.markers(), before.as_slice());
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn test_remove_nearest_renumbers() {
        let store = MemoryStore::new();
        let mut registry = registry_with(&store);
        registry.add(0.0, 0.0).unwrap();
        registry.add(10.0, 10.0).unwrap();

        let removed = registry.remove_nearest(1.0, 1.0).unwrap();

        assert_eq!(removed, Marker::new(1, 0.0, 0.0));
        assert_eq!(registry.markers(), &[Marker::new(1, 10.0, 10.0)]);
        assert_eq!(store.saved_markers(), vec![Marker::new(1, 10.0, 10.0)]);
    }

    #[test]
    fn test_remove_nearest_tie_prefers_first() {
        let store = MemoryStore::new();
        let mut registry = registry_with(&store);
        registry.add(0.0, 0.0).unwrap();
        registry.add(10.0, 0.0).unwrap();

        let removed = registry.remove_nearest(5.0, 0.0).unwrap();
        assert_eq!(removed.x, 0.0);
    }

    #[test]
    fn test_removals_on_empty_are_noops() {
        let store = MemoryStore::new();
        let mut registry = registry_with(&store);

        assert!(registry.remove_last().is_none());
        assert!(registry.remove_nearest(1.0, 1.0).is_none());
        assert!(registry.remove_by_id(1).is_none());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_remove_by_id_middle() {
        let store = MemoryStore::new();
        let mut registry = registry_with(&store);
        registry.add(1.0, 1.0).unwrap();
        registry.add(2.0, 2.0).unwrap();
        registry.add(3.0, 3.0).unwrap();

        let removed = registry.remove_by_id(2).unwrap();
        assert_eq!(removed.x, 2.0);
        assert_sequential(&registry);
        assert_eq!(registry.get(2).unwrap().x, 3.0);

        assert!(registry.remove_by_id(7).is_none());
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_remove_last() {
        let store = MemoryStore::new();
        let mut registry = registry_with(&store);
        registry.add(1.0, 1.0).unwrap();
        registry.add(2.0, 2.0).unwrap();

        assert_eq!(registry.remove_last().unwrap().id, 2);
        assert_eq!(registry.ids(), vec![1]);
    }

    #[test]
    fn test_reposition_keeps_identity() {
        let store = MemoryStore::new();
        let mut registry = registry_with(&store);
        registry.add(1.0, 1.0).unwrap();
        registry.add(2.0, 2.0).unwrap();

        let moved = registry.reposition(1, 50.0, 60.0).unwrap();
        assert_eq!(moved, Marker::new(1, 50.0, 60.0));
        assert_eq!(registry.markers()[0], moved);
        assert_eq!(store.saved_markers()[0], moved);

        assert_eq!(
            registry.reposition(9, 0.0, 0.0),
            Err(MarkerError::NotFound(9))
        );
    }

    #[test]
    fn test_clear_persists_empty_list() {
        let store = MemoryStore::new();
        let mut registry = registry_with(&store);
        registry.add(1.0, 1.0).unwrap();

        assert_eq!(registry.clear(), 1);
        assert!(registry.is_empty());
        assert!(store.saved_markers().is_empty());
    }

    #[test]
    fn test_load_heals_corrupt_ids() {
        let store = MemoryStore::with_markers(vec![
            Marker::new(2, 1.0, 1.0),
            Marker::new(2, 2.0, 2.0),
            Marker::new(5, 3.0, 3.0),
        ]);
        let registry = registry_with(&store);

        assert_eq!(registry.ids(), vec![1, 2, 3]);
        let xs: Vec<f32> = registry.markers().iter().map(|m| m.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
        assert_eq!(store.saved_markers(), registry.markers());
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_load_sequential_ids_does_not_rewrite() {
        let markers = vec![Marker::new(1, 1.0, 1.0), Marker::new(2, 2.0, 2.0)];
        let store = MemoryStore::with_markers(markers.clone());
        let registry = registry_with(&store);

        assert_eq!(registry.markers(), markers.as_slice());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_load_truncates_oversized_store() {
        let markers = (1..=12).map(|i| Marker::new(i, i as f32, 0.0)).collect();
        let store = MemoryStore::with_markers(markers);
        let registry = registry_with(&store);

        assert_eq!(registry.count(), MAX_MARKERS);
        assert_sequential(&registry);
    }

    #[test]
    fn test_write_failure_keeps_memory_authoritative() {
        let store = MemoryStore::new();
        let mut registry = registry_with(&store);
        store.set_fail_writes(true);

        let marker = registry.add(5.0, 5.0).unwrap();
        assert_eq!(registry.get(1), Some(marker));
        assert!(!registry.is_durable());
        assert!(store.saved_markers().is_empty());

        store.set_fail_writes(false);
        registry.add(6.0, 6.0).unwrap();
        assert!(registry.is_durable());
        assert_eq!(store.saved_markers().len(), 2);
    }

    #[test]
    fn test_non_finite_points_are_rejected() {
        let store = MemoryStore::new();
        let mut registry = registry_with(&store);
        registry.add(10.0, 10.0).unwrap();
        let writes = store.write_count();

        assert!(matches!(
            registry.add(f32::NAN, 5.0),
            Err(MarkerError::InvalidPoint(_))
        ));
        assert!(matches!(
            registry.add(1.0, f32::NEG_INFINITY),
            Err(MarkerError::InvalidPoint(_))
        ));
        assert!(matches!(
            registry.reposition(1, f32::INFINITY, 0.0),
            Err(MarkerError::InvalidPoint(_))
        ));
        assert!(registry.remove_nearest(f32::NAN, f32::NAN).is_none());

        assert_eq!(registry.markers(), &[Marker::new(1, 10.0, 10.0)]);
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn test_ids_stay_sequential_across_mixed_operations() {
        let store = MemoryStore::new();
        let mut registry = registry_with(&store);
        let ops: &[(u8, f32)] = &[
            (0, 1.0),
            (0, 2.0),
            (0, 3.0),
            (1, 2.0),
            (0, 4.0),
            (2, 0.0),
            (0, 5.0),
            (3, 1.0),
            (0, 6.0),
            (1, 100.0),
        ];

        for &(op, v) in ops {
            match op {
                0 => {
                    registry.add(v * 10.0, v * 10.0).unwrap();
                }
                1 => {
                    registry.remove_nearest(v * 10.0, v * 10.0);
                }
                2 => {
                    registry.remove_last();
                }
                _ => {
                    registry.remove_by_id(v as u32);
                }
            }
            assert_sequential(&registry);
            assert_eq!(store.saved_markers(), registry.markers());
        }
    }
}
