use std::sync::{Arc, PoisonError, RwLock};

use shipsync_core::DomainResult;

use crate::snapshot::StateSnapshot;

/// Holder of the current snapshot.
///
/// Readers clone the `Arc` and work on that version for the whole call; writers swap
/// in a complete replacement. A reader therefore never observes a partially updated
/// view, and it never holds the lock while computing.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<StateSnapshot>>,
}

impl SnapshotStore {
    pub fn new(snapshot: StateSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot in effect right now.
    pub fn current(&self) -> Arc<StateSnapshot> {
        // The guarded value is a single Arc; a panicking writer cannot leave it half-written.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    pub fn replace(&self, snapshot: StateSnapshot) {
        let version = snapshot.version();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
        tracing::debug!(version, "snapshot replaced");
    }

    /// Derive the next snapshot from the current one under the write lock.
    pub fn update<F>(&self, f: F) -> DomainResult<Arc<StateSnapshot>>
    where
        F: FnOnce(&StateSnapshot) -> DomainResult<StateSnapshot>,
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(f(&**guard)?);
        *guard = Arc::clone(&next);
        tracing::debug!(version = next.version(), "snapshot updated");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{InventoryRecord, Location, Sku, SnapshotData, Warehouse};
    use shipsync_core::{SkuId, WarehouseId};

    fn two_warehouses() -> StateSnapshot {
        let wh = |id: &str| Warehouse {
            id: WarehouseId::new(id),
            name: id.to_string(),
            location: Location {
                city: id.to_string(),
                latitude: 0.0,
                longitude: 0.0,
            },
        };
        StateSnapshot::try_from(SnapshotData {
            version: 1,
            warehouses: vec![wh("A"), wh("B")],
            skus: vec![Sku {
                id: SkuId::new("S"),
                name: "s".to_string(),
            }],
            inventory: vec![InventoryRecord {
                warehouse: WarehouseId::new("A"),
                sku: SkuId::new("S"),
                qty: 10,
            }],
            ..SnapshotData::default()
        })
        .unwrap()
    }

    #[test]
    fn held_snapshot_is_unaffected_by_replacement() {
        let store = SnapshotStore::new(two_warehouses());
        let held = store.current();

        store.replace(StateSnapshot::default());

        assert_eq!(held.version(), 1);
        assert!(held.has_warehouse(&WarehouseId::new("A")));
        assert!(!store.current().has_warehouse(&WarehouseId::new("A")));
    }

    #[test]
    fn failed_update_keeps_current_snapshot() {
        let store = SnapshotStore::new(two_warehouses());
        let (a, b, s) = (WarehouseId::new("A"), WarehouseId::new("B"), SkuId::new("S"));

        assert!(store.update(|snap| snap.with_transfer(&a, &b, &s, 11)).is_err());
        assert_eq!(store.current().version(), 1);

        let next = store.update(|snap| snap.with_transfer(&a, &b, &s, 4)).unwrap();
        assert_eq!(next.quantity(&b, &s), 4);
        assert_eq!(store.current().version(), 2);
    }
}
