#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use depot_core::{TenantId, UserId};
use depot_fulfillment::{
    ledger, FulfillmentConfig, FulfillmentEngine, InMemoryWarehouseStore, LineInput, WarehouseStore, WarehouseTx,
};
use depot_inventory::{ItemId, LocationCategory, LocationId, StockKey};
use depot_sales::{CustomerId, SalesOrderId};

pub struct Warehouse {
    pub engine: FulfillmentEngine<InMemoryWarehouseStore>,
    /// Shares state with the engine's store.
    pub store: InMemoryWarehouseStore,
    pub tenant: TenantId,
    pub user: UserId,
}

impl Warehouse {
    pub fn new() -> Self {
        Self::with_config(FulfillmentConfig::default())
    }

    pub fn with_config(config: FulfillmentConfig) -> Self {
        depot_observability::init_for_tests();
        let store = InMemoryWarehouseStore::new();
        Self {
            engine: FulfillmentEngine::new(store.clone(), config),
            store,
            tenant: TenantId::new(),
            user: UserId::new(),
        }
    }

    pub fn item(&self, sku: &str) -> ItemId {
        self.engine.register_item(self.tenant, sku, sku, "ea").unwrap()
    }

    pub fn storage(&self, code: &str, max: i64) -> LocationId {
        self.engine
            .register_location(self.tenant, code, LocationCategory::Storage, max)
            .unwrap()
    }

    pub fn holding(&self, code: &str, max: i64) -> LocationId {
        self.engine
            .register_location(self.tenant, code, LocationCategory::Holding, max)
            .unwrap()
    }

    /// Put stock straight onto a location with a chosen arrival time.
    pub fn seed(&self, item_id: ItemId, location_id: LocationId, quantity: i64, at: DateTime<Utc>) {
        let item = self.engine.item(self.tenant, item_id).unwrap();
        let mut tx = self.store.begin(self.tenant).unwrap();
        let mut location = tx.location(location_id).unwrap().unwrap();
        ledger::upsert_add(&mut tx, &item, &mut location, quantity, dec!(10), None, at).unwrap();
        tx.commit().unwrap();
    }

    pub fn quantity(&self, item_id: ItemId, location_id: LocationId) -> i64 {
        self.engine
            .inventory(self.tenant, item_id, location_id)
            .unwrap()
            .map(|r| r.quantity())
            .unwrap_or(0)
    }

    pub fn used(&self, location_id: LocationId) -> i64 {
        self.engine
            .location(self.tenant, location_id)
            .unwrap()
            .current_capacity()
    }

    pub fn row(&self, item_id: ItemId, location_id: LocationId) -> Option<depot_inventory::InventoryRecord> {
        let mut tx = self.store.begin(self.tenant).unwrap();
        tx.inventory(StockKey::new(item_id, location_id)).unwrap()
    }

    /// Sales order with one line per `(item, quantity)` and a holding location.
    pub fn sales_order(&self, lines: &[(ItemId, i64)], holding: Option<LocationId>) -> SalesOrderId {
        let inputs: Vec<_> = lines
            .iter()
            .map(|&(item, quantity)| LineInput::new(item, quantity, dec!(25)))
            .collect();
        let created = self
            .engine
            .create_sales_order(self.tenant, self.user, CustomerId::generate(), &inputs)
            .unwrap();
        if let Some(holding) = holding {
            self.engine
                .assign_holding_location(self.tenant, created.id, holding)
                .unwrap();
        }
        created.id
    }
}

pub fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, n, 9, 0, 0).unwrap()
}
