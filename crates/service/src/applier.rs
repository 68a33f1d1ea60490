//! Audit step recording that an action of a recommendation was carried out.
//!
//! The applier does not perform the transfer or shipment itself, and it does not
//! check that the recommendation still exists; the external system that executes
//! actions owns that. It only appends an `ACTION_APPLIED` event.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use shipsync_core::{DomainError, RecommendationId};
use shipsync_events::{Event, EventLog, NewEvent};
use shipsync_planner::ActionType;

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct ActionApplier {
    log: Arc<EventLog>,
}

impl ActionApplier {
    pub fn new(log: Arc<EventLog>) -> Self {
        Self { log }
    }

    /// Append exactly one `ACTION_APPLIED` event and return it.
    ///
    /// Fails only on malformed input: a blank recommendation id, an unknown action
    /// type, or params that are not a JSON object.
    pub fn apply(&self, recommendation_id: &str, action_type: &str, params: JsonValue) -> Result<Event, CoreError> {
        let recommendation_id: RecommendationId = recommendation_id.parse()?;
        let action_type: ActionType = action_type.parse()?;
        if !params.is_object() {
            return Err(DomainError::validation("action params must be a JSON object").into());
        }

        let event = self
            .log
            .append(NewEvent::action_applied(&recommendation_id, action_type.as_str(), params))?;

        tracing::info!(
            recommendation = %recommendation_id,
            action = action_type.as_str(),
            event_id = %event.id(),
            "action applied"
        );
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shipsync_events::{EntityKind, EventKind};

    fn applier() -> (ActionApplier, Arc<EventLog>) {
        let log = Arc::new(EventLog::new());
        (ActionApplier::new(Arc::clone(&log)), log)
    }

    #[test]
    fn apply_appends_exactly_one_event() {
        let (applier, log) = applier();
        let params = json!({ "from": "DAL", "to": "CHI", "sku": "SKU-004", "qty": 20 });

        let event = applier.apply("rec_001", "CREATE_TRANSFER", params.clone()).unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(event.kind(), EventKind::ActionApplied);
        assert_eq!(event.entity(), EntityKind::Recommendation);
        assert_eq!(event.payload()["recommendationId"], "rec_001");
        assert_eq!(event.payload()["actionType"], "CREATE_TRANSFER");
        assert_eq!(event.payload()["params"], params);
        assert_eq!(event.payload()["status"], "completed");
        assert_eq!(log.query(None, 10).unwrap(), vec![event]);
    }

    #[test]
    fn unknown_action_type_is_rejected_without_append() {
        let (applier, log) = applier();
        let err = applier.apply("rec_001", "TELEPORT", json!({})).unwrap_err();
        assert!(err.is_validation());
        assert!(log.is_empty());
    }

    #[test]
    fn malformed_params_and_blank_ids_are_rejected() {
        let (applier, log) = applier();
        assert!(applier.apply("rec_001", "CREATE_SHIPMENT", json!(42)).unwrap_err().is_validation());
        assert!(applier.apply("  ", "CREATE_SHIPMENT", json!({})).unwrap_err().is_validation());
        assert!(log.is_empty());
    }

    #[test]
    fn applier_does_not_require_a_known_recommendation() {
        let (applier, _log) = applier();
        let event = applier
            .apply("rec_never_issued", "CREATE_PURCHASE_ORDER", json!({ "sku": "SKU-010", "qty": 100 }))
            .unwrap();
        assert_eq!(event.payload()["recommendationId"], "rec_never_issued");
    }
}
