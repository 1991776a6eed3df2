//! Master-data seeding. Full item/location maintenance lives outside the
//! engine; these only create the rows workflows need.

use tracing::instrument;

use depot_core::{AggregateRoot, TenantId};
use depot_inventory::{Item, ItemId, Location, LocationCategory, LocationId};

use super::{load_item, FulfillmentEngine};
use crate::error::{FulfillmentError, FulfillmentResult};
use crate::store::{WarehouseStore, WarehouseTx};

impl<S: WarehouseStore> FulfillmentEngine<S> {
    #[instrument(skip(self))]
    pub fn register_item(
        &self,
        tenant_id: TenantId,
        sku: &str,
        name: &str,
        unit_of_measure: &str,
    ) -> FulfillmentResult<ItemId> {
        let item = Item::new(tenant_id, ItemId::generate(), sku, name, unit_of_measure)?;
        self.run("register_item", tenant_id, |tx| {
            tx.put_item(item.clone())?;
            Ok(item.id())
        })
    }

    /// Inactive items can no longer be ordered, received or picked.
    #[instrument(skip(self))]
    pub fn deactivate_item(&self, tenant_id: TenantId, item_id: ItemId) -> FulfillmentResult<()> {
        self.run("deactivate_item", tenant_id, |tx| {
            let mut item = load_item(tx, item_id)?;
            item.deactivate();
            tx.put_item(item)?;
            Ok(())
        })
    }

    /// Location codes are unique per tenant.
    #[instrument(skip(self))]
    pub fn register_location(
        &self,
        tenant_id: TenantId,
        code: &str,
        category: LocationCategory,
        max_capacity: i64,
    ) -> FulfillmentResult<LocationId> {
        let location = Location::new(tenant_id, LocationId::generate(), code, category, max_capacity)?;
        self.run("register_location", tenant_id, |tx| {
            if tx.locations()?.iter().any(|l| l.code() == location.code()) {
                return Err(FulfillmentError::Validation(format!(
                    "location code {} is already in use",
                    location.code()
                )));
            }
            tx.put_location(location.clone())?;
            Ok(location.id())
        })
    }
}
