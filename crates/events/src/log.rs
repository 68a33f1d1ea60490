//! Bounded, append-only event log.

use std::collections::VecDeque;
use std::sync::RwLock;

use shipsync_core::WarehouseId;
use thiserror::Error;

use crate::bus::passes_filter;
use crate::event::{Event, EventId, NewEvent};

/// Number of events retained when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventLogError {
    #[error("event log lock poisoned")]
    Poisoned,
}

#[derive(Debug)]
struct LogState {
    events: VecDeque<Event>,
    last_id: u64,
    evicted: u64,
}

/// Ring buffer of the most recent events.
///
/// - Identifiers are assigned here and strictly increase in append order.
/// - When full, appending evicts the oldest event (FIFO). Eviction is informational
///   only: it is logged and counted, never reported as an error.
/// - Appends take the write lock; queries take the read lock.
#[derive(Debug)]
pub struct EventLog {
    state: RwLock<LogState>,
    capacity: usize,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A log retaining at most `capacity` events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: RwLock::new(LogState {
                events: VecDeque::with_capacity(capacity),
                last_id: 0,
                evicted: 0,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Assign the next identifier, store the event and return the stored copy.
    pub fn append(&self, draft: NewEvent) -> Result<Event, EventLogError> {
        let mut state = self.state.write().map_err(|_| EventLogError::Poisoned)?;

        state.last_id += 1;
        let event = Event::from_draft(EventId::new(state.last_id), draft);

        if state.events.len() == self.capacity {
            if let Some(oldest) = state.events.pop_front() {
                state.evicted += 1;
                tracing::debug!(evicted = %oldest.id(), capacity = self.capacity, "event log full, evicted oldest");
            }
        }
        state.events.push_back(event.clone());

        tracing::debug!(event_id = %event.id(), kind = event.kind().as_str(), "event appended");
        Ok(event)
    }

    /// The most recent `limit` events matching `warehouse`, oldest first.
    ///
    /// With a filter, an event matches when it concerns that warehouse or is global.
    pub fn query(&self, warehouse: Option<&WarehouseId>, limit: usize) -> Result<Vec<Event>, EventLogError> {
        let state = self.state.read().map_err(|_| EventLogError::Poisoned)?;

        let mut recent: Vec<Event> = state
            .events
            .iter()
            .rev()
            .filter(|event| passes_filter(warehouse, *event))
            .take(limit)
            .cloned()
            .collect();
        recent.reverse();
        Ok(recent)
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifier of the most recently appended event, if any.
    pub fn last_id(&self) -> Option<EventId> {
        self.state
            .read()
            .ok()
            .and_then(|s| (s.last_id > 0).then(|| EventId::new(s.last_id)))
    }

    /// How many events have been evicted for capacity since creation.
    pub fn evicted_total(&self) -> u64 {
        self.state.read().map(|s| s.evicted).unwrap_or(0)
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
