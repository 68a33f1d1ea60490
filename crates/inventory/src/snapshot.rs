use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use shipsync_core::{DomainError, DomainResult, ShipmentId, SkuId, WarehouseId};
use shipsync_events::NewEvent;

use crate::order::{Order, Shipment, ShipmentStatus};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Great-circle (haversine) distance in kilometres.
    pub fn distance_km(&self, other: &Location) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sku {
    pub id: SkuId,
    pub name: String,
}

/// Quantity on hand of one SKU at one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub warehouse: WarehouseId,
    pub sku: SkuId,
    pub qty: u64,
}

/// Plain serde shape of a snapshot, as handed over by the upstream collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    #[serde(default)]
    pub version: u64,
    pub warehouses: Vec<Warehouse>,
    pub skus: Vec<Sku>,
    pub inventory: Vec<InventoryRecord>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub shipments: Vec<Shipment>,
}

/// Validated, indexed, immutable view of the network.
///
/// All maps are ordered by identifier, so iteration order is deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateSnapshot {
    version: u64,
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    skus: BTreeMap<SkuId, Sku>,
    stock: BTreeMap<(SkuId, WarehouseId), u64>,
    orders: Vec<Order>,
    shipments: Vec<Shipment>,
}

impl TryFrom<SnapshotData> for StateSnapshot {
    type Error = DomainError;

    fn try_from(data: SnapshotData) -> DomainResult<Self> {
        let mut snapshot = StateSnapshot {
            version: data.version,
            ..StateSnapshot::default()
        };

        for warehouse in data.warehouses {
            if snapshot.warehouses.contains_key(&warehouse.id) {
                return Err(DomainError::validation(format!("duplicate warehouse {}", warehouse.id)));
            }
            snapshot.warehouses.insert(warehouse.id.clone(), warehouse);
        }
        for sku in data.skus {
            if snapshot.skus.contains_key(&sku.id) {
                return Err(DomainError::validation(format!("duplicate sku {}", sku.id)));
            }
            snapshot.skus.insert(sku.id.clone(), sku);
        }

        for record in data.inventory {
            snapshot.ensure_known(&record.warehouse, &record.sku)?;
            let key = (record.sku, record.warehouse);
            if snapshot.stock.insert(key.clone(), record.qty).is_some() {
                return Err(DomainError::validation(format!(
                    "duplicate inventory record for {} at {}",
                    key.0, key.1
                )));
            }
        }

        for order in &data.orders {
            snapshot.ensure_known(&order.warehouse, &order.sku)?;
        }
        snapshot.orders = data.orders;
        snapshot.shipments = data.shipments;

        Ok(snapshot)
    }
}

impl StateSnapshot {
    fn ensure_known(&self, warehouse: &WarehouseId, sku: &SkuId) -> DomainResult<()> {
        if !self.has_warehouse(warehouse) {
            return Err(DomainError::validation(format!("unknown warehouse {warehouse}")));
        }
        if !self.has_sku(sku) {
            return Err(DomainError::validation(format!("unknown sku {sku}")));
        }
        Ok(())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn has_warehouse(&self, id: &WarehouseId) -> bool {
        self.warehouses.contains_key(id)
    }

    pub fn has_sku(&self, id: &SkuId) -> bool {
        self.skus.contains_key(id)
    }

    pub fn warehouse(&self, id: &WarehouseId) -> Option<&Warehouse> {
        self.warehouses.get(id)
    }

    /// Warehouses in identifier order.
    pub fn warehouses(&self) -> impl Iterator<Item = &Warehouse> {
        self.warehouses.values()
    }

    /// SKUs in identifier order.
    pub fn skus(&self) -> impl Iterator<Item = &Sku> {
        self.skus.values()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn shipments(&self) -> &[Shipment] {
        &self.shipments
    }

    /// Quantity on hand; zero when no record exists.
    pub fn quantity(&self, warehouse: &WarehouseId, sku: &SkuId) -> u64 {
        self.stock
            .get(&(sku.clone(), warehouse.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Every warehouse paired with its quantity of `sku`, in warehouse order.
    pub fn stock_of<'a>(&'a self, sku: &'a SkuId) -> impl Iterator<Item = (&'a Warehouse, u64)> + 'a {
        self.warehouses
            .values()
            .map(move |warehouse| (warehouse, self.quantity(&warehouse.id, sku)))
    }

    /// Units of `sku` promised by open (not yet shipped) orders at `warehouse`.
    pub fn open_backlog(&self, warehouse: &WarehouseId, sku: &SkuId) -> u64 {
        self.orders
            .iter()
            .filter(|o| o.status.is_open() && &o.warehouse == warehouse && &o.sku == sku)
            .fold(0u64, |total, o| total.saturating_add(o.qty))
    }

    /// Kilometres between two warehouses, if both exist.
    pub fn distance_km(&self, from: &WarehouseId, to: &WarehouseId) -> Option<f64> {
        let from = self.warehouse(from)?;
        let to = self.warehouse(to)?;
        Some(from.location.distance_km(&to.location))
    }

    /// Next version of the snapshot with a completed transfer applied to both records.
    pub fn with_transfer(&self, from: &WarehouseId, to: &WarehouseId, sku: &SkuId, qty: u64) -> DomainResult<Self> {
        self.ensure_known(from, sku)?;
        self.ensure_known(to, sku)?;
        if from == to {
            return Err(DomainError::validation("transfer source and destination must differ"));
        }

        let available = self.quantity(from, sku);
        let remaining = available.checked_sub(qty).ok_or_else(|| {
            DomainError::insufficient_stock(format!("{from} holds {available} of {sku}, {qty} requested"))
        })?;

        let mut next = self.clone();
        next.version += 1;
        next.stock.insert((sku.clone(), from.clone()), remaining);
        let received = next.stock.entry((sku.clone(), to.clone())).or_insert(0);
        *received = received.saturating_add(qty);

        tracing::debug!(%from, %to, %sku, qty, version = next.version, "transfer applied to snapshot");
        Ok(next)
    }

    /// Draft a `SHIPMENT_UPDATE` for `shipment`, tagged with the warehouse of its order.
    pub fn shipment_update(&self, shipment: &ShipmentId, next: ShipmentStatus) -> DomainResult<NewEvent> {
        let shipment = self
            .shipments
            .iter()
            .find(|s| &s.id == shipment)
            .ok_or_else(|| DomainError::validation(format!("unknown shipment {shipment}")))?;
        let warehouse = self
            .orders
            .iter()
            .find(|o| o.id == shipment.order_id)
            .map(|o| &o.warehouse);
        shipment.status_change(next, warehouse)
    }
}
