//! End-to-end behaviour of the redistribution core through its operation surface.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use proptest::prelude::*;
use serde_json::json;

use shipsync_core::{OrderId, SkuId, WarehouseId};
use shipsync_events::{EventKind, NewEvent};
use shipsync_inventory::{InventoryRecord, Location, Order, OrderStatus, Sku, SnapshotData, StateSnapshot, Warehouse};
use shipsync_service::{CoreConfig, ShipSyncCore};

fn warehouse(id: &str, city: &str, latitude: f64, longitude: f64) -> Warehouse {
    Warehouse {
        id: WarehouseId::new(id),
        name: format!("{city} DC"),
        location: Location {
            city: city.to_string(),
            latitude,
            longitude,
        },
    }
}

fn record(warehouse: &str, sku: &str, qty: u64) -> InventoryRecord {
    InventoryRecord {
        warehouse: WarehouseId::new(warehouse),
        sku: SkuId::new(sku),
        qty,
    }
}

fn snapshot(inventory: Vec<InventoryRecord>) -> StateSnapshot {
    StateSnapshot::try_from(SnapshotData {
        version: 1,
        warehouses: vec![
            warehouse("CHI", "Chicago", 41.88, -87.63),
            warehouse("DAL", "Dallas", 32.78, -96.80),
        ],
        skus: vec![
            Sku {
                id: SkuId::new("SKU-001"),
                name: "Widget".to_string(),
            },
            Sku {
                id: SkuId::new("SKU-004"),
                name: "Pallet jack".to_string(),
            },
        ],
        inventory,
        orders: vec![Order {
            id: OrderId::new("ORD-1001"),
            warehouse: WarehouseId::new("CHI"),
            sku: SkuId::new("SKU-004"),
            qty: 25,
            promise: Utc::now(),
            status: OrderStatus::Allocated,
        }],
        shipments: vec![],
    })
    .unwrap()
}

fn seeded_core() -> ShipSyncCore {
    shipsync_observability::init_for_tests();
    let inventory = vec![
        record("DAL", "SKU-004", 75),
        record("CHI", "SKU-004", 6),
        record("CHI", "SKU-001", 30),
        record("DAL", "SKU-001", 30),
    ];
    ShipSyncCore::new(CoreConfig::default(), snapshot(inventory)).unwrap()
}

fn inventory_event(warehouse: &str, qty: u64) -> NewEvent {
    NewEvent::inventory_update(&WarehouseId::new(warehouse), &SkuId::new("SKU-001"), qty, 1)
}

#[test]
fn plan_jit_moves_sku_004_from_dal_to_chi() {
    let core = seeded_core();

    let plan = core.plan_jit("SKU-004", 20, "CHI").unwrap();
    let rec = &plan.recommendation;

    let first = rec.actions[0].transfer_params().unwrap();
    assert_eq!(first.from, "DAL");
    assert_eq!(first.to, "CHI");
    assert_eq!(first.sku, "SKU-004");
    assert_eq!(first.qty, 20);
    assert_eq!(rec.actions[1].params["priority"], "urgent");
    assert_eq!(plan.carriers[0].name, "Econo STD");
    assert!(plan.carriers.windows(2).all(|w| w[0].cost <= w[1].cost));

    // Planning only proposes.
    assert!(core.log().is_empty());
    assert_eq!(core.snapshots().current().version(), 1);
}

#[test]
fn plan_jit_failures_are_classified() {
    let core = seeded_core();

    assert!(core.plan_jit("SKU-004", 0, "CHI").unwrap_err().is_validation());
    assert!(core.plan_jit("SKU-004", -5, "CHI").unwrap_err().is_validation());
    assert!(core.plan_jit("SKU-004", 5, "MIA").unwrap_err().is_validation());
    assert!(core.plan_jit("", 5, "CHI").unwrap_err().is_validation());
    assert!(core.plan_jit("SKU-004", 500, "CHI").unwrap_err().is_insufficient_stock());
    assert!(core.log().is_empty());
}

#[test]
fn apply_action_records_one_event_and_broadcasts_it() {
    let core = seeded_core();
    let observer = core.subscribe_events(Some(WarehouseId::new("CHI")));

    let params = json!({ "from": "DAL", "to": "CHI", "sku": "SKU-004", "qty": 20 });
    let event = core.apply_action("rec_001", "CREATE_TRANSFER", params).unwrap();

    assert_eq!(event.kind(), EventKind::ActionApplied);
    assert_eq!(event.payload()["recommendationId"], "rec_001");
    assert_eq!(core.feed(None, None).unwrap(), vec![event.clone()]);
    assert_eq!(observer.recv_timeout(Duration::from_secs(1)).unwrap(), event);

    assert!(core.apply_action("rec_001", "NOT_AN_ACTION", json!({})).unwrap_err().is_validation());
    assert_eq!(core.log().len(), 1);
}

#[test]
fn log_keeps_the_latest_hundred_events() {
    let core = seeded_core();
    for n in 0..150 {
        core.ingest(inventory_event("CHI", n)).unwrap();
    }

    let kept = core.feed(None, Some(1_000)).unwrap();
    assert_eq!(kept.len(), 100);
    assert_eq!(kept[0].payload()["qty"], 50);
    assert_eq!(kept[99].payload()["qty"], 149);
    assert!(kept.windows(2).all(|w| w[0].id() < w[1].id()));

    // Default feed limit.
    assert_eq!(core.feed(None, None).unwrap().len(), 50);
}

#[test]
fn filtered_subscribers_only_see_their_warehouse_plus_globals() {
    let core = Arc::new(seeded_core());
    let chi = core.subscribe_events(Some(WarehouseId::new("CHI")));
    let dal = core.subscribe_events(Some(WarehouseId::new("DAL")));

    let producer = {
        let core = Arc::clone(&core);
        thread::spawn(move || {
            core.ingest(inventory_event("CHI", 1)).unwrap();
            core.ingest(inventory_event("DAL", 2)).unwrap();
            core.ingest(NewEvent::system_alert("carrier delay")).unwrap();
            core.ingest(inventory_event("CHI", 3)).unwrap();
        })
    };

    let chi_consumer = thread::spawn(move || {
        (0..3)
            .map(|_| chi.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect::<Vec<_>>()
    });
    let dal_consumer = thread::spawn(move || {
        (0..2)
            .map(|_| dal.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect::<Vec<_>>()
    });

    producer.join().unwrap();
    let chi_seen = chi_consumer.join().unwrap();
    let dal_seen = dal_consumer.join().unwrap();

    let chi_ids: Vec<String> = chi_seen.iter().map(|e| e.id().to_string()).collect();
    let dal_ids: Vec<String> = dal_seen.iter().map(|e| e.id().to_string()).collect();
    assert_eq!(chi_ids, vec!["evt_1", "evt_3", "evt_4"]);
    assert_eq!(dal_ids, vec!["evt_2", "evt_3"]);
}

#[test]
fn concurrent_ingest_and_apply_deliver_in_id_order() {
    for _ in 0..20 {
        let core = Arc::new(seeded_core());
        let observer = core.subscribe_events(None);

        let producer = {
            let core = Arc::clone(&core);
            thread::spawn(move || {
                for n in 0..200 {
                    core.ingest(inventory_event("CHI", n)).unwrap();
                }
            })
        };
        let applier = {
            let core = Arc::clone(&core);
            thread::spawn(move || {
                for _ in 0..200 {
                    core.apply_action("rec_001", "CREATE_SHIPMENT", json!({ "carrier": "FastX EXP" }))
                        .unwrap();
                }
            })
        };
        producer.join().unwrap();
        applier.join().unwrap();

        let seen = observer.drain();
        assert_eq!(seen.len(), 400);
        assert!(seen.windows(2).all(|w| w[0].id() < w[1].id()));
    }
}

#[test]
fn detached_subscriber_receives_nothing_further() {
    let core = seeded_core();
    let leaving = core.subscribe_events(None);
    let staying = core.subscribe_events(None);

    core.ingest(inventory_event("CHI", 1)).unwrap();
    assert_eq!(leaving.drain().len(), 1);
    leaving.detach();

    core.ingest(inventory_event("CHI", 2)).unwrap();
    core.ingest(inventory_event("CHI", 3)).unwrap();
    assert_eq!(staying.drain().len(), 3);
}

#[test]
fn subscriptions_do_not_replay_history() {
    let core = seeded_core();
    core.ingest(inventory_event("CHI", 1)).unwrap();

    let late = core.subscribe_events(None);
    assert!(late.try_recv().is_err());
    assert_eq!(core.feed(None, None).unwrap().len(), 1);
}

#[test]
fn recommendations_are_deterministic_and_filterable() {
    let core = seeded_core();

    let first = core.recommendations(None);
    let second = core.recommendations(None);
    assert_eq!(first, second);

    // CHI: backlog 25 + buffer 20 - on hand 6 = 39 short. DAL: 75 - 20 = 55 spare.
    assert_eq!(first.len(), 1);
    let transfer = first[0].transfer().unwrap();
    assert_eq!((transfer.from.as_str(), transfer.to.as_str(), transfer.qty), ("DAL", "CHI", 39));

    assert_eq!(core.recommendations(Some(&WarehouseId::new("CHI"))).len(), 1);
    assert!(core.recommendations(Some(&WarehouseId::new("ATL"))).is_empty());
}

#[test]
fn published_recommendations_reach_filtered_observers() {
    let core = seeded_core();
    let chi = core.subscribe_recommendations(Some(WarehouseId::new("CHI")));
    let atl = core.subscribe_recommendations(Some(WarehouseId::new("ATL")));

    assert_eq!(core.publish_recommendations().unwrap(), 1);

    assert_eq!(chi.drain().len(), 1);
    assert!(atl.drain().is_empty());
}

#[test]
fn scans_follow_snapshot_replacement() {
    let core = seeded_core();
    assert_eq!(core.recommendations(None).len(), 1);

    core.snapshots()
        .update(|s| s.with_transfer(&WarehouseId::new("DAL"), &WarehouseId::new("CHI"), &SkuId::new("SKU-004"), 39))
        .unwrap();

    assert!(core.recommendations(None).is_empty());
    assert_eq!(core.snapshots().current().version(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        ..ProptestConfig::default()
    })]

    /// Property: the feed never exceeds its limit and always ends at the newest event.
    #[test]
    fn feed_is_a_bounded_suffix(appends in 1usize..250, limit in 1usize..150) {
        let core = seeded_core();
        for n in 0..appends {
            core.ingest(inventory_event(if n % 2 == 0 { "CHI" } else { "DAL" }, n as u64)).unwrap();
        }

        let feed = core.feed(None, Some(limit)).unwrap();
        prop_assert_eq!(feed.len(), limit.min(appends).min(100));
        prop_assert_eq!(feed.last().map(|e| e.id()), core.log().last_id());
    }
}
