use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use chrono::NaiveDate;

use depot_core::{AggregateRoot, DocumentKind, ExpectedVersion, TenantId};
use depot_inventory::{InventoryRecord, Item, ItemId, Location, LocationId, StockKey};
use depot_purchasing::{InboundShipment, PurchaseOrder, PurchaseOrderId, Putaway, PutawayId, ShipmentId};
use depot_sales::{Picking, PickingId, SalesOrder, SalesOrderId};

use super::r#trait::{StoreError, StoreResult, WarehouseStore, WarehouseTx};

#[derive(Debug, Clone)]
struct Versioned<V> {
    version: u64,
    value: V,
}

#[derive(Debug)]
struct Table<K, V> {
    rows: HashMap<(TenantId, K), Versioned<V>>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self { rows: HashMap::new() }
    }
}

type SequenceKey = (DocumentKind, NaiveDate);

#[derive(Debug, Default)]
struct State {
    items: Table<ItemId, Item>,
    locations: Table<LocationId, Location>,
    inventory: Table<StockKey, InventoryRecord>,
    purchase_orders: Table<PurchaseOrderId, PurchaseOrder>,
    shipments: Table<ShipmentId, InboundShipment>,
    putaways: Table<PutawayId, Putaway>,
    sales_orders: Table<SalesOrderId, SalesOrder>,
    pickings: Table<PickingId, Picking>,
    sequences: Table<SequenceKey, u32>,
}

/// In-memory transactional store with optimistic row versions.
///
/// Intended for tests/dev. Scans are linear over the table. Clones share
/// the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWarehouseStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryWarehouseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WarehouseStore for InMemoryWarehouseStore {
    type Tx = InMemoryTx;

    fn begin(&self, tenant_id: TenantId) -> StoreResult<InMemoryTx> {
        Ok(InMemoryTx {
            state: Arc::clone(&self.state),
            tenant_id,
            items: Staged::default(),
            locations: Staged::default(),
            inventory: Staged::default(),
            purchase_orders: Staged::default(),
            shipments: Staged::default(),
            putaways: Staged::default(),
            sales_orders: Staged::default(),
            pickings: Staged::default(),
            sequences: Staged::default(),
        })
    }
}

/// Observed versions plus staged writes for one table.
#[derive(Debug)]
struct Staged<K, V> {
    /// `None` records that the row was observed as absent.
    reads: HashMap<K, Option<u64>>,
    writes: HashMap<K, V>,
}

impl<K, V> Default for Staged<K, V> {
    fn default() -> Self {
        Self {
            reads: HashMap::new(),
            writes: HashMap::new(),
        }
    }
}

impl<K, V> Staged<K, V>
where
    K: Copy + Eq + Hash + Debug,
    V: Clone,
{
    fn get(&mut self, table: &Table<K, V>, tenant_id: TenantId, key: K) -> Option<V> {
        if let Some(staged) = self.writes.get(&key) {
            return Some(staged.clone());
        }
        let row = table.rows.get(&(tenant_id, key));
        self.reads.entry(key).or_insert(row.map(|r| r.version));
        row.map(|r| r.value.clone())
    }

    fn scan(&mut self, table: &Table<K, V>, tenant_id: TenantId, keep: impl Fn(&V) -> bool) -> Vec<V> {
        let mut out = Vec::new();
        for ((tenant, key), row) in &table.rows {
            if *tenant != tenant_id || self.writes.contains_key(key) || !keep(&row.value) {
                continue;
            }
            self.reads.entry(*key).or_insert(Some(row.version));
            out.push(row.value.clone());
        }
        out.extend(self.writes.values().filter(|v| keep(v)).cloned());
        out
    }

    fn put(&mut self, key: K, value: V) {
        self.writes.insert(key, value);
    }

    fn expected(&self, key: &K) -> ExpectedVersion {
        match self.reads.get(key) {
            Some(Some(version)) => ExpectedVersion::Exact(*version),
            Some(None) => ExpectedVersion::Absent,
            None => ExpectedVersion::Any,
        }
    }

    /// Every observed row must still be at the observed version.
    fn validate(&self, table: &Table<K, V>, tenant_id: TenantId, name: &str) -> StoreResult<()> {
        for key in self.reads.keys().chain(self.writes.keys()) {
            let actual = table.rows.get(&(tenant_id, *key)).map(|r| r.version);
            let expected = self.expected(key);
            if !expected.matches(actual) {
                return Err(StoreError::Concurrency(format!(
                    "{name} {key:?}: expected {expected:?}, found {actual:?}"
                )));
            }
        }
        Ok(())
    }

    fn apply(self, table: &mut Table<K, V>, tenant_id: TenantId) {
        for (key, value) in self.writes {
            let version = table
                .rows
                .get(&(tenant_id, key))
                .map(|r| r.version + 1)
                .unwrap_or(1);
            table.rows.insert((tenant_id, key), Versioned { version, value });
        }
    }
}

/// Transaction over [`InMemoryWarehouseStore`].
#[derive(Debug)]
pub struct InMemoryTx {
    state: Arc<RwLock<State>>,
    tenant_id: TenantId,
    items: Staged<ItemId, Item>,
    locations: Staged<LocationId, Location>,
    inventory: Staged<StockKey, InventoryRecord>,
    purchase_orders: Staged<PurchaseOrderId, PurchaseOrder>,
    shipments: Staged<ShipmentId, InboundShipment>,
    putaways: Staged<PutawayId, Putaway>,
    sales_orders: Staged<SalesOrderId, SalesOrder>,
    pickings: Staged<PickingId, Picking>,
    sequences: Staged<SequenceKey, u32>,
}

fn read(state: &RwLock<State>) -> StoreResult<RwLockReadGuard<'_, State>> {
    state
        .read()
        .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
}

impl WarehouseTx for InMemoryTx {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn item(&mut self, id: ItemId) -> StoreResult<Option<Item>> {
        let state = read(&self.state)?;
        Ok(self.items.get(&state.items, self.tenant_id, id))
    }

    fn put_item(&mut self, item: Item) -> StoreResult<()> {
        self.items.put(item.id(), item);
        Ok(())
    }

    fn location(&mut self, id: LocationId) -> StoreResult<Option<Location>> {
        let state = read(&self.state)?;
        Ok(self.locations.get(&state.locations, self.tenant_id, id))
    }

    fn locations(&mut self) -> StoreResult<Vec<Location>> {
        let state = read(&self.state)?;
        Ok(self.locations.scan(&state.locations, self.tenant_id, |_| true))
    }

    fn put_location(&mut self, location: Location) -> StoreResult<()> {
        self.locations.put(location.id(), location);
        Ok(())
    }

    fn inventory(&mut self, key: StockKey) -> StoreResult<Option<InventoryRecord>> {
        let state = read(&self.state)?;
        Ok(self.inventory.get(&state.inventory, self.tenant_id, key))
    }

    fn inventory_for_item(&mut self, item_id: ItemId) -> StoreResult<Vec<InventoryRecord>> {
        let state = read(&self.state)?;
        Ok(self
            .inventory
            .scan(&state.inventory, self.tenant_id, |r| r.item_id() == item_id))
    }

    fn inventory_at(&mut self, location_id: LocationId) -> StoreResult<Vec<InventoryRecord>> {
        let state = read(&self.state)?;
        Ok(self
            .inventory
            .scan(&state.inventory, self.tenant_id, |r| r.location_id() == location_id))
    }

    fn put_inventory(&mut self, record: InventoryRecord) -> StoreResult<()> {
        self.inventory.put(record.key(), record);
        Ok(())
    }

    fn purchase_order(&mut self, id: PurchaseOrderId) -> StoreResult<Option<PurchaseOrder>> {
        let state = read(&self.state)?;
        Ok(self.purchase_orders.get(&state.purchase_orders, self.tenant_id, id))
    }

    fn put_purchase_order(&mut self, order: PurchaseOrder) -> StoreResult<()> {
        self.purchase_orders.put(order.id(), order);
        Ok(())
    }

    fn shipment(&mut self, id: ShipmentId) -> StoreResult<Option<InboundShipment>> {
        let state = read(&self.state)?;
        Ok(self.shipments.get(&state.shipments, self.tenant_id, id))
    }

    fn put_shipment(&mut self, shipment: InboundShipment) -> StoreResult<()> {
        self.shipments.put(shipment.id(), shipment);
        Ok(())
    }

    fn putaway(&mut self, id: PutawayId) -> StoreResult<Option<Putaway>> {
        let state = read(&self.state)?;
        Ok(self.putaways.get(&state.putaways, self.tenant_id, id))
    }

    fn putaways_for_shipment(&mut self, shipment_id: ShipmentId) -> StoreResult<Vec<Putaway>> {
        let state = read(&self.state)?;
        Ok(self
            .putaways
            .scan(&state.putaways, self.tenant_id, |p| p.shipment_id() == shipment_id))
    }

    fn put_putaway(&mut self, putaway: Putaway) -> StoreResult<()> {
        self.putaways.put(putaway.id(), putaway);
        Ok(())
    }

    fn sales_order(&mut self, id: SalesOrderId) -> StoreResult<Option<SalesOrder>> {
        let state = read(&self.state)?;
        Ok(self.sales_orders.get(&state.sales_orders, self.tenant_id, id))
    }

    fn put_sales_order(&mut self, order: SalesOrder) -> StoreResult<()> {
        self.sales_orders.put(order.id(), order);
        Ok(())
    }

    fn picking(&mut self, id: PickingId) -> StoreResult<Option<Picking>> {
        let state = read(&self.state)?;
        Ok(self.pickings.get(&state.pickings, self.tenant_id, id))
    }

    fn pickings_for_sales_order(&mut self, sales_order_id: SalesOrderId) -> StoreResult<Vec<Picking>> {
        let state = read(&self.state)?;
        Ok(self
            .pickings
            .scan(&state.pickings, self.tenant_id, |p| p.sales_order_id() == sales_order_id))
    }

    fn put_picking(&mut self, picking: Picking) -> StoreResult<()> {
        self.pickings.put(picking.id(), picking);
        Ok(())
    }

    fn next_sequence(&mut self, kind: DocumentKind, date: NaiveDate) -> StoreResult<u32> {
        let state = read(&self.state)?;
        let next = self
            .sequences
            .get(&state.sequences, self.tenant_id, (kind, date))
            .unwrap_or(0)
            + 1;
        self.sequences.put((kind, date), next);
        Ok(next)
    }

    fn commit(self) -> StoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        let tenant = self.tenant_id;

        // Validate everything before applying anything.
        self.items.validate(&state.items, tenant, "item")?;
        self.locations.validate(&state.locations, tenant, "location")?;
        self.inventory.validate(&state.inventory, tenant, "inventory")?;
        self.purchase_orders
            .validate(&state.purchase_orders, tenant, "purchase order")?;
        self.shipments.validate(&state.shipments, tenant, "shipment")?;
        self.putaways.validate(&state.putaways, tenant, "putaway")?;
        self.sales_orders.validate(&state.sales_orders, tenant, "sales order")?;
        self.pickings.validate(&state.pickings, tenant, "picking")?;
        self.sequences.validate(&state.sequences, tenant, "sequence")?;

        self.items.apply(&mut state.items, tenant);
        self.locations.apply(&mut state.locations, tenant);
        self.inventory.apply(&mut state.inventory, tenant);
        self.purchase_orders.apply(&mut state.purchase_orders, tenant);
        self.shipments.apply(&mut state.shipments, tenant);
        self.putaways.apply(&mut state.putaways, tenant);
        self.sales_orders.apply(&mut state.sales_orders, tenant);
        self.pickings.apply(&mut state.pickings, tenant);
        self.sequences.apply(&mut state.sequences, tenant);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_inventory::LocationCategory;

    fn rack(tenant: TenantId, code: &str) -> Location {
        Location::new(tenant, LocationId::generate(), code, LocationCategory::Storage, 100).unwrap()
    }

    #[test]
    fn writes_are_invisible_until_commit() {
        let store = InMemoryWarehouseStore::new();
        let tenant = TenantId::new();
        let loc = rack(tenant, "A-01");
        let id = loc.id();

        let mut tx = store.begin(tenant).unwrap();
        tx.put_location(loc).unwrap();
        assert!(tx.location(id).unwrap().is_some(), "read-your-writes");

        let mut other = store.begin(tenant).unwrap();
        assert!(other.location(id).unwrap().is_none());

        tx.commit().unwrap();
        let mut after = store.begin(tenant).unwrap();
        assert!(after.location(id).unwrap().is_some());
    }

    #[test]
    fn dropped_transaction_is_rolled_back() {
        let store = InMemoryWarehouseStore::new();
        let tenant = TenantId::new();
        let loc = rack(tenant, "A-01");
        let id = loc.id();
        {
            let mut tx = store.begin(tenant).unwrap();
            tx.put_location(loc).unwrap();
        }
        assert!(store.begin(tenant).unwrap().location(id).unwrap().is_none());
    }

    #[test]
    fn rows_are_tenant_scoped() {
        let store = InMemoryWarehouseStore::new();
        let tenant_a = TenantId::new();
        let loc = rack(tenant_a, "A-01");
        let id = loc.id();

        let mut tx = store.begin(tenant_a).unwrap();
        tx.put_location(loc).unwrap();
        tx.commit().unwrap();

        let mut tx_b = store.begin(TenantId::new()).unwrap();
        assert!(tx_b.location(id).unwrap().is_none());
        assert!(tx_b.locations().unwrap().is_empty());
    }

    #[test]
    fn stale_read_aborts_commit() {
        let store = InMemoryWarehouseStore::new();
        let tenant = TenantId::new();
        let loc = rack(tenant, "A-01");
        let id = loc.id();
        let mut seed = store.begin(tenant).unwrap();
        seed.put_location(loc).unwrap();
        seed.commit().unwrap();

        let mut first = store.begin(tenant).unwrap();
        let mut second = store.begin(tenant).unwrap();

        let mut a = first.location(id).unwrap().unwrap();
        let mut b = second.location(id).unwrap().unwrap();
        a.apply(10);
        b.apply(20);
        first.put_location(a).unwrap();
        second.put_location(b).unwrap();

        first.commit().unwrap();
        let err = second.commit().unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));

        let stored = store.begin(tenant).unwrap().location(id).unwrap().unwrap();
        assert_eq!(stored.current_capacity(), 10);
    }

    #[test]
    fn concurrent_inserts_of_same_absent_row_conflict() {
        let store = InMemoryWarehouseStore::new();
        let tenant = TenantId::new();
        let loc = rack(tenant, "A-01");
        let id = loc.id();

        let mut first = store.begin(tenant).unwrap();
        let mut second = store.begin(tenant).unwrap();
        assert!(first.location(id).unwrap().is_none());
        assert!(second.location(id).unwrap().is_none());
        first.put_location(loc.clone()).unwrap();
        second.put_location(loc).unwrap();

        first.commit().unwrap();
        assert!(matches!(second.commit(), Err(StoreError::Concurrency(_))));
    }

    #[test]
    fn sequences_are_per_kind_and_day() {
        let store = InMemoryWarehouseStore::new();
        let tenant = TenantId::new();
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let next_day = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();

        let mut tx = store.begin(tenant).unwrap();
        assert_eq!(tx.next_sequence(DocumentKind::Picking, day).unwrap(), 1);
        assert_eq!(tx.next_sequence(DocumentKind::Picking, day).unwrap(), 2);
        assert_eq!(tx.next_sequence(DocumentKind::SalesOrder, day).unwrap(), 1);
        assert_eq!(tx.next_sequence(DocumentKind::Picking, next_day).unwrap(), 1);
        tx.commit().unwrap();

        let mut tx = store.begin(tenant).unwrap();
        assert_eq!(tx.next_sequence(DocumentKind::Picking, day).unwrap(), 3);
    }

    #[test]
    fn racing_sequence_draws_cannot_both_commit() {
        let store = InMemoryWarehouseStore::new();
        let tenant = TenantId::new();
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let mut first = store.begin(tenant).unwrap();
        let mut second = store.begin(tenant).unwrap();
        assert_eq!(first.next_sequence(DocumentKind::SalesOrder, day).unwrap(), 1);
        assert_eq!(second.next_sequence(DocumentKind::SalesOrder, day).unwrap(), 1);

        first.commit().unwrap();
        assert!(second.commit().is_err());
    }
}
