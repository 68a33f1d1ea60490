//! Just-in-time transfer planning.
//!
//! Source selection: among warehouses other than the destination holding at least
//! the requested quantity, pick the one with the **most** stock; ties go to the
//! lowest warehouse id.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shipsync_core::{DomainError, DomainResult, RecommendationId, SkuId, WarehouseId};
use shipsync_inventory::{StateSnapshot, Warehouse};

use crate::carrier::CarrierOption;
use crate::config::EngineConfig;
use crate::recommendation::{Action, Priority, Recommendation, TransferParams};

/// A JIT recommendation with the carrier alternatives it was chosen from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JitPlan {
    pub recommendation: Recommendation,
    /// Every known carrier, cheapest first.
    pub carriers: Vec<CarrierOption>,
    pub explanation: String,
}

/// Single-shot planner for explicit (sku, qty, destination) requests.
///
/// Planning only proposes: neither the snapshot nor the event log is touched.
#[derive(Debug, Clone, Default)]
pub struct JitPlanner {
    config: EngineConfig,
}

fn by_stock_then_id(a: &(&Warehouse, u64), b: &(&Warehouse, u64)) -> Ordering {
    a.1.cmp(&b.1).then_with(|| b.0.id.cmp(&a.0.id))
}

impl JitPlanner {
    pub fn new(config: EngineConfig) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn plan_transfer(
        &self,
        snapshot: &StateSnapshot,
        sku: &SkuId,
        qty: i64,
        destination: &WarehouseId,
    ) -> DomainResult<Recommendation> {
        if qty <= 0 {
            return Err(DomainError::validation(format!("qty must be positive, got {qty}")));
        }
        if !snapshot.has_warehouse(destination) {
            return Err(DomainError::validation(format!("unknown destination warehouse {destination}")));
        }
        if !snapshot.has_sku(sku) {
            return Err(DomainError::validation(format!("unknown sku {sku}")));
        }
        let qty = qty.unsigned_abs();

        let (source, available) = snapshot
            .stock_of(sku)
            .filter(|(warehouse, on_hand)| &warehouse.id != destination && *on_hand >= qty)
            .max_by(by_stock_then_id)
            .ok_or_else(|| {
                tracing::debug!(%sku, qty, %destination, "no source with sufficient stock");
                DomainError::insufficient_stock(format!("No available stock for {sku} in sufficient quantity"))
            })?;

        tracing::debug!(%sku, qty, source = %source.id, available, %destination, "jit source selected");

        let params = TransferParams {
            from: source.id.clone(),
            to: destination.clone(),
            sku: sku.clone(),
            qty,
        };
        Ok(Recommendation {
            id: RecommendationId::new(format!("jit_{}", Uuid::now_v7())),
            title: format!("JIT Transfer: {sku}"),
            score: self.config.jit_score,
            rationale: format!("Transfer {qty} units of {sku} from {} to {destination}", source.id),
            actions: vec![
                Action::transfer(&params),
                Action::shipment(self.config.carriers.for_priority(Priority::Urgent), Priority::Urgent),
            ],
        })
    }

    /// [`plan_transfer`](Self::plan_transfer) plus ranked carrier options and a readable summary.
    pub fn plan(
        &self,
        snapshot: &StateSnapshot,
        sku: &SkuId,
        qty: i64,
        destination: &WarehouseId,
    ) -> DomainResult<JitPlan> {
        let recommendation = self.plan_transfer(snapshot, sku, qty, destination)?;
        let carriers: Vec<CarrierOption> = self.config.carriers.by_cost().into_iter().cloned().collect();

        let chosen = self.config.carriers.for_priority(Priority::Urgent);
        let mut explanation = format!(
            "JIT transfer plan for {sku}: {}. Ship with {} (cost {}, ETA {}h).",
            recommendation.rationale, chosen.name, chosen.cost, chosen.eta_hours
        );
        if carriers.len() > 1 {
            explanation.push_str(&format!(
                " {} alternative carriers trade cost against speed.",
                carriers.len() - 1
            ));
        }

        Ok(JitPlan {
            recommendation,
            carriers,
            explanation,
        })
    }
}
