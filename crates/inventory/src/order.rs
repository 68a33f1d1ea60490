use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use shipsync_core::{DomainError, DomainResult, OrderId, ShipmentId, SkuId, WarehouseId};
use shipsync_events::{EntityKind, EventKind, NewEvent};

/// Order lifecycle. Variants are declared in lifecycle order, so `Ord` follows it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Scheduled,
    Allocated,
    Picking,
    Shipped,
}

impl OrderStatus {
    /// Status only ever moves forward.
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        next > self
    }

    /// Whether units for this order still have to leave the warehouse.
    pub fn is_open(self) -> bool {
        self != OrderStatus::Shipped
    }
}

/// Shipment lifecycle, in order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Tendered,
    InTransit,
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub warehouse: WarehouseId,
    pub sku: SkuId,
    pub qty: u64,
    pub promise: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    /// Draft an `ORDER_STATUS_CHANGE` event moving this order to `next`.
    ///
    /// Rejects transitions that do not move forward in the lifecycle.
    pub fn status_change(&self, next: OrderStatus) -> DomainResult<NewEvent> {
        if !self.status.can_advance_to(next) {
            return Err(DomainError::validation(format!(
                "order {}: cannot move from {:?} to {:?}",
                self.id, self.status, next
            )));
        }
        Ok(NewEvent::new(
            EventKind::OrderStatusChange,
            EntityKind::Order,
            json!({
                "orderId": self.id,
                "warehouseId": self.warehouse,
                "sku": self.sku,
                "previousStatus": self.status,
                "status": next,
            }),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub carrier: String,
    pub eta: DateTime<Utc>,
    pub status: ShipmentStatus,
}

impl Shipment {
    /// Draft a `SHIPMENT_UPDATE` event. `warehouse` is the shipping warehouse, when known,
    /// so warehouse-filtered observers see it.
    pub fn status_change(&self, next: ShipmentStatus, warehouse: Option<&WarehouseId>) -> DomainResult<NewEvent> {
        if next <= self.status {
            return Err(DomainError::validation(format!(
                "shipment {}: cannot move from {:?} to {:?}",
                self.id, self.status, next
            )));
        }
        let mut payload = json!({
            "shipmentId": self.id,
            "orderId": self.order_id,
            "carrier": self.carrier,
            "eta": self.eta,
            "previousStatus": self.status,
            "status": next,
        });
        if let (Some(warehouse), Some(obj)) = (warehouse, payload.as_object_mut()) {
            obj.insert("warehouseId".to_string(), json!(warehouse));
        }
        Ok(NewEvent::new(EventKind::ShipmentUpdate, EntityKind::Shipment, payload))
    }
}
