//! Wiring of log, buses, snapshot store and planners behind one operation surface.
//!
//! ```text
//! producers ──ingest──▶ EventLog ──▶ event bus ──▶ observers
//!                          ▲
//! apply_action ────────────┘
//!
//! SnapshotStore ──▶ RecommendationEngine ──▶ recommendation bus ──▶ observers
//!               └─▶ JitPlanner ──▶ caller
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value as JsonValue;

use shipsync_core::{SkuId, WarehouseId};
use shipsync_events::{Event, EventBus, EventLog, InMemoryEventBus, NewEvent, Subscription};
use shipsync_inventory::{SnapshotStore, StateSnapshot};
use shipsync_planner::{JitPlan, JitPlanner, Recommendation, RecommendationEngine};

use crate::applier::ActionApplier;
use crate::config::CoreConfig;
use crate::error::CoreError;

/// The redistribution core.
///
/// Generic over the two broadcast channels so a transport layer can plug in its own
/// bus; [`ShipSyncCore::new`] uses in-memory buses.
#[derive(Debug)]
pub struct ShipSyncCore<E = InMemoryEventBus<Event>, R = InMemoryEventBus<Recommendation>> {
    config: CoreConfig,
    snapshots: SnapshotStore,
    log: Arc<EventLog>,
    /// Held from append through broadcast, so observers receive events in id order.
    sequencer: Mutex<()>,
    events: E,
    recommendations: R,
    engine: RecommendationEngine,
    planner: JitPlanner,
    applier: ActionApplier,
}

impl ShipSyncCore {
    pub fn new(config: CoreConfig, snapshot: StateSnapshot) -> Result<Self, CoreError> {
        Self::with_buses(config, snapshot, InMemoryEventBus::new(), InMemoryEventBus::new())
    }
}

impl<E, R> ShipSyncCore<E, R>
where
    E: EventBus<Event>,
    R: EventBus<Recommendation>,
{
    pub fn with_buses(config: CoreConfig, snapshot: StateSnapshot, events: E, recommendations: R) -> Result<Self, CoreError> {
        let engine = RecommendationEngine::new(config.engine.clone())?;
        let planner = JitPlanner::new(config.engine.clone())?;
        let log = Arc::new(EventLog::with_capacity(config.event_log_capacity));

        tracing::info!(
            capacity = log.capacity(),
            snapshot_version = snapshot.version(),
            "redistribution core started"
        );

        Ok(Self {
            applier: ActionApplier::new(Arc::clone(&log)),
            snapshots: SnapshotStore::new(snapshot),
            log,
            sequencer: Mutex::new(()),
            events,
            recommendations,
            engine,
            planner,
            config,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Where the upstream collaborator publishes refreshed snapshots.
    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    fn sequenced(&self) -> MutexGuard<'_, ()> {
        // Guards no data, so a poisoned lock is still usable.
        self.sequencer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn broadcast(&self, event: &Event) -> Result<(), CoreError> {
        let delivered = self
            .events
            .publish(event.clone())
            .map_err(|e| CoreError::Publish(format!("{e:?}")))?;
        tracing::debug!(event_id = %event.id(), delivered, "event broadcast");
        Ok(())
    }

    /// Append a producer's event to the log and deliver it to event subscribers.
    pub fn ingest(&self, draft: NewEvent) -> Result<Event, CoreError> {
        let _order = self.sequenced();
        let event = self.log.append(draft)?;
        self.broadcast(&event)?;
        Ok(event)
    }

    /// Most recent events, optionally restricted to one warehouse (global events always pass).
    pub fn feed(&self, warehouse: Option<&WarehouseId>, limit: Option<usize>) -> Result<Vec<Event>, CoreError> {
        let limit = limit.unwrap_or(self.config.feed_default_limit);
        Ok(self.log.query(warehouse, limit)?)
    }

    /// Scan the current snapshot. Sorted by score descending, ties by id.
    pub fn recommendations(&self, warehouse: Option<&WarehouseId>) -> Vec<Recommendation> {
        let snapshot = self.snapshots.current();
        let recommendations = self.engine.scan(&snapshot);
        match warehouse {
            Some(warehouse) => RecommendationEngine::for_warehouse(recommendations, warehouse),
            None => recommendations,
        }
    }

    /// Run a scan and broadcast every result. Returns how many were produced.
    pub fn publish_recommendations(&self) -> Result<usize, CoreError> {
        let recommendations = self.recommendations(None);
        let produced = recommendations.len();
        for recommendation in recommendations {
            self.recommendations
                .publish(recommendation)
                .map_err(|e| CoreError::Publish(format!("{e:?}")))?;
        }
        tracing::info!(produced, "recommendations published");
        Ok(produced)
    }

    /// Propose an urgent transfer of `qty` units of `sku` into `destination`, with the
    /// carrier alternatives ranked cheapest first.
    pub fn plan_jit(&self, sku: &str, qty: i64, destination: &str) -> Result<JitPlan, CoreError> {
        let sku: SkuId = sku.parse()?;
        let destination: WarehouseId = destination.parse()?;
        let snapshot = self.snapshots.current();

        match self.planner.plan(&snapshot, &sku, qty, &destination) {
            Ok(plan) => {
                tracing::info!(recommendation = %plan.recommendation.id, %sku, qty, %destination, "jit plan proposed");
                Ok(plan)
            }
            Err(e) => {
                tracing::info!(%sku, qty, %destination, error = %e, "jit plan rejected");
                Err(e.into())
            }
        }
    }

    /// Record an executed action and deliver the resulting event to subscribers.
    pub fn apply_action(&self, recommendation_id: &str, action_type: &str, params: JsonValue) -> Result<Event, CoreError> {
        let _order = self.sequenced();
        let event = self.applier.apply(recommendation_id, action_type, params)?;
        self.broadcast(&event)?;
        Ok(event)
    }

    /// Live events from now on. History is available through [`feed`](Self::feed).
    pub fn subscribe_events(&self, warehouse: Option<WarehouseId>) -> Subscription<Event> {
        self.events.subscribe(warehouse)
    }

    pub fn subscribe_recommendations(&self, warehouse: Option<WarehouseId>) -> Subscription<Recommendation> {
        self.recommendations.subscribe(warehouse)
    }
}
