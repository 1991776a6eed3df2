use tracing::{info, instrument, warn};

use depot_core::{AggregateRoot, TenantId};
use depot_inventory::CapacityDrift;

use super::FulfillmentEngine;
use crate::error::FulfillmentResult;
use crate::store::{WarehouseStore, WarehouseTx};

impl<S: WarehouseStore> FulfillmentEngine<S> {
    /// Rebuild every location's used capacity from the ledger.
    ///
    /// Returns the locations whose stored capacity disagreed with the ledger,
    /// with the values before repair.
    #[instrument(skip(self))]
    pub fn repair_capacity(&self, tenant_id: TenantId) -> FulfillmentResult<Vec<CapacityDrift>> {
        self.run("repair_capacity", tenant_id, |tx| {
            let mut drifts = Vec::new();
            for mut location in tx.locations()? {
                let total: i64 = tx.inventory_at(location.id())?.iter().map(|r| r.quantity()).sum();
                if let Some(drift) = location.reconcile(total) {
                    warn!(
                        location = %drift.code,
                        recorded = drift.recorded,
                        actual = drift.actual,
                        "capacity drift repaired"
                    );
                    tx.put_location(location)?;
                    drifts.push(drift);
                }
            }
            drifts.sort_by(|a, b| a.code.cmp(&b.code));
            info!(repaired = drifts.len(), "capacity repair finished");
            Ok(drifts)
        })
    }
}
