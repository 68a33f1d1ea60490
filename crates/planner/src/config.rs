use serde::{Deserialize, Serialize};

use shipsync_core::{DomainError, DomainResult};

use crate::carrier::CarrierCatalog;

/// Tunables of the recommendation engine and JIT planner.
///
/// Only the monotonicity and determinism of scoring are contractual; the weights
/// below are starting points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Units every warehouse keeps of each SKU on top of its open-order backlog.
    pub low_stock_threshold: u64,
    /// Weight of the demand-to-surplus term in transfer scores.
    pub demand_weight: f64,
    /// Weight of the (inverse) transfer distance term in transfer scores.
    pub cost_weight: f64,
    /// Distance at which the cost term has dropped to one half.
    pub cost_scale_km: f64,
    /// Transfers scoring at least this ship with `high` priority.
    pub high_priority_score: f64,
    /// Fixed score of JIT recommendations.
    pub jit_score: f64,
    /// Emit purchase-order recommendations when no warehouse can cover a shortfall.
    pub reorder_enabled: bool,
    /// Purchase orders are rounded up to a multiple of this.
    pub reorder_batch: u64,
    pub default_supplier: String,
    pub carriers: CarrierCatalog,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 20,
            demand_weight: 0.6,
            cost_weight: 0.4,
            cost_scale_km: 1000.0,
            high_priority_score: 0.7,
            jit_score: 0.9,
            reorder_enabled: false,
            reorder_batch: 100,
            default_supplier: "Supplier A".to_string(),
            carriers: CarrierCatalog::default(),
        }
    }
}

fn unit_interval(name: &str, value: f64) -> DomainResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DomainError::validation(format!("{name} must be within [0, 1], got {value}")))
    }
}

impl EngineConfig {
    pub fn validate(&self) -> DomainResult<()> {
        let weights_ok = [self.demand_weight, self.cost_weight]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0);
        if !weights_ok || self.demand_weight + self.cost_weight <= 0.0 {
            return Err(DomainError::validation(
                "score weights must be finite, non-negative and not both zero",
            ));
        }
        if !(self.cost_scale_km.is_finite() && self.cost_scale_km > 0.0) {
            return Err(DomainError::validation("cost_scale_km must be a finite positive number"));
        }
        unit_interval("high_priority_score", self.high_priority_score)?;
        unit_interval("jit_score", self.jit_score)?;
        if self.reorder_batch == 0 {
            return Err(DomainError::validation("reorder_batch must be positive"));
        }
        if self.default_supplier.trim().is_empty() {
            return Err(DomainError::validation("default_supplier cannot be empty"));
        }
        Ok(())
    }
}
