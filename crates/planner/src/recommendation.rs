use core::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use shipsync_core::{DomainError, RecommendationId, SkuId, ValueObject, WarehouseId};
use shipsync_events::WarehouseScoped;

use crate::carrier::CarrierOption;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    CreateTransfer,
    CreateShipment,
    CreatePurchaseOrder,
    ConsolidateShipments,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateTransfer => "CREATE_TRANSFER",
            ActionType::CreateShipment => "CREATE_SHIPMENT",
            ActionType::CreatePurchaseOrder => "CREATE_PURCHASE_ORDER",
            ActionType::ConsolidateShipments => "CONSOLIDATE_SHIPMENTS",
        }
    }
}

impl core::fmt::Display for ActionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE_TRANSFER" => Ok(ActionType::CreateTransfer),
            "CREATE_SHIPMENT" => Ok(ActionType::CreateShipment),
            "CREATE_PURCHASE_ORDER" => Ok(ActionType::CreatePurchaseOrder),
            "CONSOLIDATE_SHIPMENTS" => Ok(ActionType::ConsolidateShipments),
            other => Err(DomainError::validation(format!("unknown action type '{other}'"))),
        }
    }
}

/// Shipment urgency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    High,
    Urgent,
}

/// Parameters of a `CREATE_TRANSFER` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParams {
    pub from: WarehouseId,
    pub to: WarehouseId,
    pub sku: SkuId,
    pub qty: u64,
}

/// A typed, parameterised instruction. Carries no identity of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionType,
    pub params: JsonValue,
}

impl ValueObject for Action {}

impl Action {
    pub fn transfer(params: &TransferParams) -> Self {
        Self {
            kind: ActionType::CreateTransfer,
            params: json!({
                "from": params.from,
                "to": params.to,
                "sku": params.sku,
                "qty": params.qty,
            }),
        }
    }

    pub fn shipment(carrier: &CarrierOption, priority: Priority) -> Self {
        Self {
            kind: ActionType::CreateShipment,
            params: json!({
                "carrier": carrier.name,
                "priority": priority,
                "etaHours": carrier.eta_hours,
            }),
        }
    }

    pub fn purchase_order(sku: &SkuId, qty: u64, supplier: &str, warehouse: &WarehouseId) -> Self {
        Self {
            kind: ActionType::CreatePurchaseOrder,
            params: json!({
                "sku": sku,
                "qty": qty,
                "supplier": supplier,
                "warehouse": warehouse,
            }),
        }
    }

    /// Decoded transfer parameters, for `CREATE_TRANSFER` actions.
    pub fn transfer_params(&self) -> Option<TransferParams> {
        if self.kind != ActionType::CreateTransfer {
            return None;
        }
        serde_json::from_value(self.params.clone()).ok()
    }

    fn mentions(&self, warehouse: &WarehouseId) -> bool {
        ["from", "to", "warehouse"]
            .iter()
            .any(|key| self.params.get(*key).and_then(JsonValue::as_str) == Some(warehouse.as_str()))
    }
}

/// Scored, actionable suggestion. Actions are ordered: execute them front to back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: RecommendationId,
    pub title: String,
    /// In \[0, 1\]; higher is more urgent/valuable.
    pub score: f64,
    pub rationale: String,
    pub actions: Vec<Action>,
}

impl Recommendation {
    /// The first `CREATE_TRANSFER` action, if any.
    pub fn transfer(&self) -> Option<TransferParams> {
        self.actions.iter().find_map(Action::transfer_params)
    }
}

impl WarehouseScoped for Recommendation {
    fn concerns(&self, warehouse: &WarehouseId) -> bool {
        self.actions.iter().any(|action| action.mentions(warehouse))
    }
}
