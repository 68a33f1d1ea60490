use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use shipsync_core::{DomainError, RecommendationId, SkuId, WarehouseId};

use crate::bus::WarehouseScoped;

/// Log-assigned event identifier.
///
/// Strictly increasing in append order. Rendered as `evt_<n>` on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EventId(u64);

impl EventId {
    pub fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    pub fn sequence(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "evt_{}", self.0)
    }
}

impl From<EventId> for String {
    fn from(value: EventId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for EventId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for EventId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("evt_")
            .and_then(|n| n.parse::<u64>().ok())
            .map(Self)
            .ok_or_else(|| DomainError::validation(format!("EventId: malformed '{s}'")))
    }
}

/// What happened.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    InventoryUpdate,
    OrderStatusChange,
    ShipmentUpdate,
    SystemAlert,
    ActionApplied,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::InventoryUpdate => "INVENTORY_UPDATE",
            EventKind::OrderStatusChange => "ORDER_STATUS_CHANGE",
            EventKind::ShipmentUpdate => "SHIPMENT_UPDATE",
            EventKind::SystemAlert => "SYSTEM_ALERT",
            EventKind::ActionApplied => "ACTION_APPLIED",
        }
    }
}

/// Which aggregate an event concerns.
///
/// `System` events are global: they are visible to every warehouse filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Inventory,
    Order,
    Shipment,
    System,
    Recommendation,
}

/// An event as stored in the [`EventLog`](crate::EventLog).
///
/// Immutable once appended: there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    #[serde(rename = "type")]
    kind: EventKind,
    entity: EntityKind,
    payload: JsonValue,
    ts: DateTime<Utc>,
}

impl Event {
    pub(crate) fn from_draft(id: EventId, draft: NewEvent) -> Self {
        Self {
            id,
            kind: draft.kind,
            entity: draft.entity,
            payload: draft.payload,
            ts: draft.occurred_at.unwrap_or_else(Utc::now),
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }

    pub fn ts(&self) -> DateTime<Utc> {
        self.ts
    }

    pub fn is_global(&self) -> bool {
        self.entity == EntityKind::System
    }
}

const WAREHOUSE_KEYS: [&str; 3] = ["warehouseId", "from", "to"];

fn payload_mentions(payload: &JsonValue, warehouse: &WarehouseId) -> bool {
    let Some(obj) = payload.as_object() else {
        return false;
    };
    let direct = WAREHOUSE_KEYS
        .iter()
        .any(|key| obj.get(*key).and_then(JsonValue::as_str) == Some(warehouse.as_str()));
    direct || obj.get("params").is_some_and(|params| payload_mentions(params, warehouse))
}

impl WarehouseScoped for Event {
    fn concerns(&self, warehouse: &WarehouseId) -> bool {
        self.is_global() || payload_mentions(&self.payload, warehouse)
    }
}

/// Draft of an event, before the log assigns its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub kind: EventKind,
    pub entity: EntityKind,
    pub payload: JsonValue,
    /// Business time; the log stamps append time when absent.
    pub occurred_at: Option<DateTime<Utc>>,
}

impl NewEvent {
    pub fn new(kind: EventKind, entity: EntityKind, payload: JsonValue) -> Self {
        Self {
            kind,
            entity,
            payload,
            occurred_at: None,
        }
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    /// On-hand quantity of `sku` at `warehouse` changed by `delta`, now `quantity`.
    pub fn inventory_update(warehouse: &WarehouseId, sku: &SkuId, quantity: u64, delta: i64) -> Self {
        Self::new(
            EventKind::InventoryUpdate,
            EntityKind::Inventory,
            json!({
                "warehouseId": warehouse,
                "sku": sku,
                "qty": quantity,
                "delta": delta,
            }),
        )
    }

    /// Network-wide alert, delivered to every observer regardless of filter.
    pub fn system_alert(message: impl Into<String>) -> Self {
        Self::new(
            EventKind::SystemAlert,
            EntityKind::System,
            json!({ "message": message.into() }),
        )
    }

    /// Audit record: an action of `recommendation_id` was carried out.
    pub fn action_applied(recommendation_id: &RecommendationId, action_type: &str, params: JsonValue) -> Self {
        Self::new(
            EventKind::ActionApplied,
            EntityKind::Recommendation,
            json!({
                "recommendationId": recommendation_id,
                "actionType": action_type,
                "params": params,
                "status": "completed",
            }),
        )
    }
}
