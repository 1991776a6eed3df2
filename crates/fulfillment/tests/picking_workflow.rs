//! End-to-end outbound workflows against the in-memory store.

mod common;

use common::{day, Warehouse};

use rust_decimal::Decimal;

use depot_core::{DocumentKind, TenantId};
use depot_fulfillment::{ErrorKind, FulfillmentError, LineInput};
use depot_inventory::{InventoryStatus, ItemId, LocationId};
use depot_sales::{CustomerId, PickRequest, PickingLineStatus, PickingStatus, SalesOrderId, SalesOrderStatus};

struct Scenario {
    w: Warehouse,
    item: ItemId,
    a: LocationId,
    b: LocationId,
    dock: LocationId,
    order: SalesOrderId,
}

/// A holds 100 (day 1), B holds 80 (day 2); one order line for `quantity`.
fn scenario(quantity: i64) -> Scenario {
    let w = Warehouse::new();
    let item = w.item("SKU-100");
    let a = w.storage("A", 500);
    let b = w.storage("B", 500);
    let dock = w.holding("H-1", 1000);
    w.seed(item, a, 100, day(1));
    w.seed(item, b, 80, day(2));
    let order = w.sales_order(&[(item, quantity)], Some(dock));
    Scenario {
        w,
        item,
        a,
        b,
        dock,
        order,
    }
}

fn pick(line_no: u32, quantity: i64, source: LocationId) -> PickRequest {
    PickRequest {
        line_no,
        quantity,
        source_location_id: source,
    }
}

#[test]
fn fifo_picking_scenario_completes_order() {
    let s = scenario(150);
    let w = &s.w;

    let created = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();
    let picking = w.engine.picking(w.tenant, created.id).unwrap();
    let plan: Vec<_> = picking
        .lines()
        .iter()
        .map(|l| (l.source_location_id(), l.quantity_required()))
        .collect();
    assert_eq!(plan, vec![(s.a, 100), (s.b, 50)]);
    assert_eq!(
        w.engine.sales_order(w.tenant, s.order).unwrap().status(),
        SalesOrderStatus::InProgress
    );

    let done = w
        .engine
        .process_picking(w.tenant, created.id, &[pick(1, 100, s.a), pick(2, 50, s.b)])
        .unwrap();

    assert_eq!(done.status(), PickingStatus::Completed);
    assert!(done.completed_at().is_some());
    assert!(done.lines().iter().all(|l| l.status() == PickingLineStatus::Picked));

    let row_a = w.row(s.item, s.a).unwrap();
    assert_eq!(row_a.quantity(), 0);
    assert_eq!(row_a.status(), InventoryStatus::Empty);
    assert_eq!(w.quantity(s.item, s.b), 30);
    assert_eq!(w.quantity(s.item, s.dock), 150);

    assert_eq!((w.used(s.a), w.used(s.b), w.used(s.dock)), (0, 30, 150));
    assert_eq!(
        w.engine.sales_order(w.tenant, s.order).unwrap().status(),
        SalesOrderStatus::Picked
    );
}

#[test]
fn small_order_only_touches_oldest_stock() {
    let s = scenario(60);
    let w = &s.w;

    let created = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();
    let picking = w.engine.picking(w.tenant, created.id).unwrap();
    assert_eq!(picking.lines().len(), 1);
    assert_eq!(picking.lines()[0].source_location_id(), s.a);
}

#[test]
fn partial_pick_leaves_picking_in_progress() {
    let s = scenario(150);
    let w = &s.w;
    let created = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();

    let picking = w
        .engine
        .process_picking(w.tenant, created.id, &[pick(1, 40, s.a)])
        .unwrap();

    assert_eq!(picking.status(), PickingStatus::InProgress);
    assert_eq!(picking.lines()[0].status(), PickingLineStatus::Short);
    assert_eq!(picking.lines()[0].remaining_quantity(), 60);
    assert_eq!(picking.lines()[1].status(), PickingLineStatus::Pending);
    assert_eq!(
        w.engine.sales_order(w.tenant, s.order).unwrap().status(),
        SalesOrderStatus::InProgress
    );
}

#[test]
fn over_remaining_quantity_changes_nothing() {
    let s = scenario(150);
    let w = &s.w;
    let created = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();

    let err = w
        .engine
        .process_picking(w.tenant, created.id, &[pick(1, 101, s.a)])
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(w.quantity(s.item, s.a), 100);
    assert_eq!(w.quantity(s.item, s.dock), 0);
    let picking = w.engine.picking(w.tenant, created.id).unwrap();
    assert_eq!(picking.status(), PickingStatus::Pending);
    assert_eq!(picking.lines()[0].quantity_picked(), 0);
}

#[test]
fn one_bad_entry_rolls_back_the_whole_batch() {
    let s = scenario(150);
    let w = &s.w;
    let created = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();

    let err = w
        .engine
        .process_picking(w.tenant, created.id, &[pick(1, 100, s.a), pick(2, 60, s.b)])
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(w.quantity(s.item, s.a), 100);
    assert_eq!(w.used(s.a), 100);
    assert_eq!(w.used(s.dock), 0);
    assert_eq!(
        w.engine.picking(w.tenant, created.id).unwrap().status(),
        PickingStatus::Pending
    );
}

#[test]
fn picking_from_unplanned_location_is_rejected() {
    let s = scenario(150);
    let w = &s.w;
    let created = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();

    let err = w
        .engine
        .process_picking(w.tenant, created.id, &[pick(1, 10, s.b)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(w.quantity(s.item, s.b), 80);
}

#[test]
fn second_active_picking_is_a_state_conflict() {
    let s = scenario(50);
    let w = &s.w;
    w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();

    let err = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
}

#[test]
fn shortfall_reports_required_and_available() {
    let s = scenario(200);
    let w = &s.w;

    let err = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap_err();
    assert_eq!(
        err,
        FulfillmentError::InsufficientStock {
            item: "SKU-100".into(),
            location: None,
            available: 180,
            requested: 200,
        }
    );
    assert_eq!(
        w.engine.sales_order(w.tenant, s.order).unwrap().status(),
        SalesOrderStatus::Pending
    );
    assert!(w.engine.get_picking_by_sales_order(w.tenant, s.order).unwrap().is_none());
}

#[test]
fn holding_location_is_required() {
    let w = Warehouse::new();
    let item = w.item("SKU-1");
    let rack = w.storage("A", 100);
    w.seed(item, rack, 10, day(1));
    let order = w.sales_order(&[(item, 5)], None);

    let err = w.engine.create_picking(w.tenant, w.user, order, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
}

#[test]
fn holding_stock_is_not_pickable() {
    let w = Warehouse::new();
    let item = w.item("SKU-1");
    let dock = w.holding("H-1", 100);
    w.seed(item, dock, 50, day(1));
    let order = w.sales_order(&[(item, 5)], Some(dock));

    let err = w.engine.create_picking(w.tenant, w.user, order, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientStock);
}

#[test]
fn inactive_items_cannot_be_picked() {
    let s = scenario(10);
    let w = &s.w;
    w.engine.deactivate_item(w.tenant, s.item).unwrap();

    let err = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn cancel_picking_returns_stock_and_reopens_order() {
    let s = scenario(150);
    let w = &s.w;
    let first = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();
    w.engine
        .process_picking(w.tenant, first.id, &[pick(1, 100, s.a), pick(2, 20, s.b)])
        .unwrap();

    let cancelled = w.engine.cancel_picking(w.tenant, first.id).unwrap();

    assert_eq!(cancelled.status(), PickingStatus::Cancelled);
    assert_eq!(w.quantity(s.item, s.a), 100);
    assert_eq!(w.quantity(s.item, s.b), 80);
    assert_eq!(w.quantity(s.item, s.dock), 0);
    assert_eq!(w.row(s.item, s.a).unwrap().status(), InventoryStatus::Available);
    assert_eq!((w.used(s.a), w.used(s.b), w.used(s.dock)), (100, 80, 0));
    assert_eq!(
        w.engine.sales_order(w.tenant, s.order).unwrap().status(),
        SalesOrderStatus::Pending
    );

    // Latest (cancelled) picking is reported until a new one exists.
    let latest = w.engine.get_picking_by_sales_order(w.tenant, s.order).unwrap().unwrap();
    assert_eq!(latest.number(), first.number);

    let second = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();
    let active = w.engine.get_picking_by_sales_order(w.tenant, s.order).unwrap().unwrap();
    assert_eq!(active.number(), second.number);
    assert!(active.is_active());
}

#[test]
fn completed_picking_cannot_be_cancelled() {
    let s = scenario(50);
    let w = &s.w;
    let created = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();
    w.engine
        .process_picking(w.tenant, created.id, &[pick(1, 50, s.a)])
        .unwrap();

    let err = w.engine.cancel_picking(w.tenant, created.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
    assert_eq!(w.quantity(s.item, s.dock), 50);
}

#[test]
fn cancel_sales_order_reverts_active_picking() {
    let s = scenario(150);
    let w = &s.w;
    let created = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();
    w.engine
        .process_picking(w.tenant, created.id, &[pick(1, 30, s.a)])
        .unwrap();

    let order = w.engine.cancel_sales_order(w.tenant, s.order).unwrap();

    assert_eq!(order.status(), SalesOrderStatus::Cancelled);
    assert_eq!(w.quantity(s.item, s.a), 100);
    assert_eq!(w.quantity(s.item, s.dock), 0);
    assert_eq!(
        w.engine.picking(w.tenant, created.id).unwrap().status(),
        PickingStatus::Cancelled
    );

    let err = w
        .engine
        .process_picking(w.tenant, created.id, &[pick(1, 10, s.a)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
    let err = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
}

#[test]
fn ship_dispatches_picked_goods() {
    let s = scenario(150);
    let w = &s.w;

    let err = w.engine.ship_sales_order(w.tenant, s.order).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);

    let created = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();
    w.engine
        .process_picking(w.tenant, created.id, &[pick(1, 100, s.a), pick(2, 50, s.b)])
        .unwrap();
    let shipped = w.engine.ship_sales_order(w.tenant, s.order).unwrap();

    assert_eq!(shipped.status(), SalesOrderStatus::Shipped);
    assert!(shipped.shipped_at().is_some());
    assert_eq!(w.quantity(s.item, s.dock), 0);
    assert_eq!(w.used(s.dock), 0);
    assert_eq!(w.quantity(s.item, s.b), 30);

    let err = w.engine.cancel_sales_order(w.tenant, s.order).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StateConflict);
}

#[test]
fn multi_line_order_plans_each_line() {
    let w = Warehouse::new();
    let bolts = w.item("BOLT");
    let nuts = w.item("NUT");
    let a = w.storage("A", 500);
    let b = w.storage("B", 500);
    let dock = w.holding("H-1", 500);
    w.seed(bolts, a, 40, day(1));
    w.seed(nuts, b, 40, day(1));
    let order = w.sales_order(&[(bolts, 10), (nuts, 15)], Some(dock));

    let created = w.engine.create_picking(w.tenant, w.user, order, None).unwrap();
    let picking = w.engine.picking(w.tenant, created.id).unwrap();
    let lines: Vec<_> = picking
        .lines()
        .iter()
        .map(|l| (l.sales_order_line(), l.item_id(), l.source_location_id(), l.quantity_required()))
        .collect();
    assert_eq!(lines, vec![(1, bolts, a, 10), (2, nuts, b, 15)]);
}

/// A holds 100 (day 1), B holds 50 (day 2); the order has one line per quantity.
fn repeated_item(quantities: &[i64]) -> Scenario {
    let w = Warehouse::new();
    let item = w.item("SKU-X");
    let a = w.storage("A", 500);
    let b = w.storage("B", 500);
    let dock = w.holding("H-1", 1000);
    w.seed(item, a, 100, day(1));
    w.seed(item, b, 50, day(2));
    let lines: Vec<_> = quantities.iter().map(|&q| (item, q)).collect();
    let order = w.sales_order(&lines, Some(dock));
    Scenario {
        w,
        item,
        a,
        b,
        dock,
        order,
    }
}

#[test]
fn lines_for_the_same_item_share_its_stock() {
    let s = repeated_item(&[100, 50]);
    let w = &s.w;

    let created = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();
    let picking = w.engine.picking(w.tenant, created.id).unwrap();
    let plan: Vec<_> = picking
        .lines()
        .iter()
        .map(|l| (l.sales_order_line(), l.source_location_id(), l.quantity_required()))
        .collect();
    assert_eq!(plan, vec![(1, s.a, 100), (2, s.b, 50)]);

    let done = w
        .engine
        .process_picking(w.tenant, created.id, &[pick(1, 100, s.a), pick(2, 50, s.b)])
        .unwrap();
    assert_eq!(done.status(), PickingStatus::Completed);
    assert_eq!((w.quantity(s.item, s.a), w.quantity(s.item, s.b)), (0, 0));
    assert_eq!(w.quantity(s.item, s.dock), 150);
    assert_eq!(
        w.engine.sales_order(w.tenant, s.order).unwrap().status(),
        SalesOrderStatus::Picked
    );
}

#[test]
fn lines_for_the_same_item_cannot_overdraw_it() {
    let s = repeated_item(&[100, 100]);
    let w = &s.w;

    let err = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap_err();
    assert_eq!(
        err,
        FulfillmentError::InsufficientStock {
            item: "SKU-X".into(),
            location: None,
            available: 150,
            requested: 200,
        }
    );

    assert!(w.engine.get_picking_by_sales_order(w.tenant, s.order).unwrap().is_none());
    assert_eq!(
        w.engine.sales_order(w.tenant, s.order).unwrap().status(),
        SalesOrderStatus::Pending
    );
    assert_eq!((w.quantity(s.item, s.a), w.quantity(s.item, s.b)), (100, 50));
}

#[test]
fn available_locations_are_listed_in_fifo_order() {
    let s = scenario(1);
    let w = &s.w;
    let c = w.storage("C", 50);
    w.seed(s.item, c, 5, day(3));

    let all = w.engine.get_available_locations(w.tenant, s.item, None).unwrap();
    let codes: Vec<_> = all.iter().map(|l| l.code.as_str()).collect();
    assert_eq!(codes, vec!["A", "B", "C"]);
    assert_eq!(all[0].available_stock, 100);
    assert_eq!(all[0].available_capacity, 400);
    assert_eq!(all[0].max_capacity, 500);

    let big = w.engine.get_available_locations(w.tenant, s.item, Some(50)).unwrap();
    let codes: Vec<_> = big.iter().map(|l| l.code.as_str()).collect();
    assert_eq!(codes, vec!["A", "B"]);

    let json = serde_json::to_value(&all[2]).unwrap();
    assert_eq!(json["availableStock"], 5);
    assert_eq!(json["currentCapacity"], 5);
    assert_eq!(json["availableCapacity"], 45);
}

#[test]
fn document_numbers_follow_prefix_date_sequence() {
    let w = Warehouse::new();
    let item = w.item("SKU-1");
    let first = w
        .engine
        .create_sales_order(w.tenant, w.user, CustomerId::generate(), &[])
        .unwrap();
    let second = w
        .engine
        .create_sales_order(
            w.tenant,
            w.user,
            CustomerId::generate(),
            &[LineInput::new(item, 1, Decimal::ONE)],
        )
        .unwrap();

    assert_eq!(first.number.kind, DocumentKind::SalesOrder);
    assert_eq!(first.number.sequence, 1);
    assert_eq!(second.number.sequence, 2);
    let text = second.number.to_string();
    assert!(text.starts_with("SO-"));
    assert!(text.ends_with("-0002"));
    assert_eq!(text.len(), "SO-20240601-0002".len());

    // Sequences are per tenant.
    let other = w
        .engine
        .create_sales_order(TenantId::new(), w.user, CustomerId::generate(), &[])
        .unwrap();
    assert_eq!(other.number.sequence, 1);
}

#[test]
fn documents_are_invisible_to_other_tenants() {
    let s = scenario(10);
    let w = &s.w;
    let created = w.engine.create_picking(w.tenant, w.user, s.order, None).unwrap();

    let err = w.engine.picking(TenantId::new(), created.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = w
        .engine
        .process_picking(TenantId::new(), created.id, &[pick(1, 10, s.a)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
