//! `shipsync-planner`
//!
//! **Responsibility:** turn a [`StateSnapshot`](shipsync_inventory::StateSnapshot) into
//! scored, actionable recommendations.
//!
//! Everything here is speculative: planning never mutates the snapshot or the event
//! log. A recommendation only becomes a fact once an action of it is applied.

pub mod carrier;
pub mod config;
pub mod engine;
pub mod jit;
pub mod recommendation;

pub use carrier::{CarrierCatalog, CarrierOption};
pub use config::EngineConfig;
pub use engine::{RecommendationEngine, combine_score, transfer_score};
pub use jit::{JitPlan, JitPlanner};
pub use recommendation::{Action, ActionType, Priority, Recommendation, TransferParams};
