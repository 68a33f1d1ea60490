//! `shipsync-scan`: read a snapshot as JSON on stdin, print recommendations as JSON.
//!
//! Usage: `shipsync-scan [WAREHOUSE_ID] < snapshot.json`

use std::io::Read;

use anyhow::Context;

use shipsync_core::WarehouseId;
use shipsync_inventory::{SnapshotData, StateSnapshot};
use shipsync_service::{CoreConfig, ShipSyncCore};

fn main() -> anyhow::Result<()> {
    shipsync_observability::init();

    let warehouse = std::env::args()
        .nth(1)
        .map(|raw| raw.parse::<WarehouseId>())
        .transpose()
        .context("invalid warehouse argument")?;

    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read snapshot from stdin")?;
    let data: SnapshotData = serde_json::from_str(&raw).context("snapshot is not valid JSON")?;
    let snapshot = StateSnapshot::try_from(data).context("snapshot failed validation")?;

    let core = ShipSyncCore::new(CoreConfig::from_env(), snapshot)?;
    let recommendations = core.recommendations(warehouse.as_ref());
    tracing::info!(count = recommendations.len(), "scan complete");

    println!("{}", serde_json::to_string_pretty(&recommendations)?);
    Ok(())
}
