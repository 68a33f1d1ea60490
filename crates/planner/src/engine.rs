//! Rebalancing scan.
//!
//! Model, per SKU and warehouse:
//! - `backlog`   = units promised by open orders
//! - `buffer`    = `backlog + low_stock_threshold`
//! - `shortfall` = `buffer - on_hand` when positive (demand signal)
//! - `surplus`   = `on_hand - buffer` when positive (available to give away)
//!
//! Every (surplus source, shortfall destination) pair yields one transfer
//! recommendation moving `min(shortfall, surplus)` units. Results are sorted by
//! score descending, ties by recommendation id.

use shipsync_core::{RecommendationId, SkuId, WarehouseId};
use shipsync_inventory::{StateSnapshot, Warehouse};

use crate::config::EngineConfig;
use crate::recommendation::{Action, Priority, Recommendation, TransferParams};

const REORDER_IMPACT: f64 = 0.2;
const REORDER_EFFORT: f64 = 0.3;
const REORDER_CONFIDENCE: f64 = 0.2;

/// Additive urgency/impact/effort/confidence combination, clamped to \[0, 1\].
pub fn combine_score(urgency: f64, impact: f64, effort: f64, confidence: f64) -> f64 {
    (urgency + impact - effort + confidence).clamp(0.0, 1.0)
}

/// Score of moving stock from a source with `surplus` to a destination with
/// `shortfall`, `distance_km` apart.
///
/// Non-decreasing in `shortfall / surplus`, non-increasing in distance.
pub fn transfer_score(config: &EngineConfig, shortfall: u64, surplus: u64, distance_km: f64) -> f64 {
    let ratio = shortfall as f64 / surplus.max(1) as f64;
    let demand_term = ratio / (1.0 + ratio);

    let cost = distance_km.max(0.0) / config.cost_scale_km;
    let cost_term = 1.0 / (1.0 + cost);

    let total_weight = config.demand_weight + config.cost_weight;
    ((config.demand_weight * demand_term + config.cost_weight * cost_term) / total_weight).clamp(0.0, 1.0)
}

#[derive(Debug)]
struct Position<'a> {
    warehouse: &'a Warehouse,
    on_hand: u64,
    backlog: u64,
    shortfall: u64,
    surplus: u64,
}

/// Deterministic scanner: same snapshot in, same recommendations out.
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: EngineConfig,
}

impl RecommendationEngine {
    pub fn new(config: EngineConfig) -> shipsync_core::DomainResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scan(&self, snapshot: &StateSnapshot) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        for sku in snapshot.skus() {
            let positions = self.positions(snapshot, &sku.id);
            let before = recommendations.len();

            let sources: Vec<&Position> = positions.iter().filter(|p| p.surplus > 0).collect();
            for dest in positions.iter().filter(|p| p.shortfall > 0) {
                for src in &sources {
                    if let Some(rec) = self.transfer(snapshot, &sku.id, src, dest) {
                        recommendations.push(rec);
                    }
                }
                if sources.is_empty() && self.config.reorder_enabled {
                    recommendations.push(self.reorder(&sku.id, dest));
                }
            }

            tracing::debug!(
                sku = %sku.id,
                warehouses = positions.len(),
                emitted = recommendations.len() - before,
                "scanned sku"
            );
        }

        recommendations.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        recommendations
    }

    fn positions<'a>(&self, snapshot: &'a StateSnapshot, sku: &'a SkuId) -> Vec<Position<'a>> {
        snapshot
            .stock_of(sku)
            .map(|(warehouse, on_hand)| {
                let backlog = snapshot.open_backlog(&warehouse.id, sku);
                let buffer = backlog.saturating_add(self.config.low_stock_threshold);
                Position {
                    warehouse,
                    on_hand,
                    backlog,
                    shortfall: buffer.saturating_sub(on_hand),
                    surplus: on_hand.saturating_sub(buffer),
                }
            })
            .collect()
    }

    fn transfer(&self, snapshot: &StateSnapshot, sku: &SkuId, src: &Position, dest: &Position) -> Option<Recommendation> {
        let (from, to) = (&src.warehouse.id, &dest.warehouse.id);
        let qty = dest.shortfall.min(src.surplus);
        if from == to || qty == 0 {
            return None;
        }

        let distance = snapshot.distance_km(from, to).unwrap_or(0.0);
        let score = transfer_score(&self.config, dest.shortfall, src.surplus, distance);
        let priority = if score >= self.config.high_priority_score {
            Priority::High
        } else {
            Priority::Normal
        };

        let params = TransferParams {
            from: from.clone(),
            to: to.clone(),
            sku: sku.clone(),
            qty,
        };
        Some(Recommendation {
            id: RecommendationId::new(format!("rec_{sku}_{from}_{to}")),
            title: format!("Optimize {sku} Transfer: {from} → {to}"),
            score,
            rationale: format!(
                "High demand in {to} warehouse ({} on hand, {} on open orders), excess stock in {from} ({} units above buffer, {distance:.0} km away)",
                dest.on_hand, dest.backlog, src.surplus
            ),
            actions: vec![
                Action::transfer(&params),
                Action::shipment(self.config.carriers.for_priority(priority), priority),
            ],
        })
    }

    fn reorder(&self, sku: &SkuId, dest: &Position) -> Recommendation {
        let batch = self.config.reorder_batch.max(1);
        let qty = dest.shortfall.div_ceil(batch).saturating_mul(batch);
        let urgency = dest.shortfall as f64 / dest.shortfall.saturating_add(dest.on_hand) as f64;
        let warehouse = &dest.warehouse.id;

        Recommendation {
            id: RecommendationId::new(format!("po_{sku}_{warehouse}")),
            title: format!("Reorder {sku}"),
            score: combine_score(urgency, REORDER_IMPACT, REORDER_EFFORT, REORDER_CONFIDENCE),
            rationale: format!(
                "Low stock of {sku} at {warehouse} ({} on hand, {} on open orders) and no surplus elsewhere in the network",
                dest.on_hand, dest.backlog
            ),
            actions: vec![Action::purchase_order(sku, qty, &self.config.default_supplier, warehouse)],
        }
    }

    /// Keep only recommendations relevant to `warehouse`.
    pub fn for_warehouse(recommendations: Vec<Recommendation>, warehouse: &WarehouseId) -> Vec<Recommendation> {
        use shipsync_events::WarehouseScoped;
        recommendations.into_iter().filter(|r| r.concerns(warehouse)).collect()
    }
}
