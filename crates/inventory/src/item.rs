use serde::{Deserialize, Serialize};

use depot_core::{AggregateRoot, DomainError, DomainResult, TenantId};

depot_core::aggregate_id!(
    /// Stock-keeping item identifier (tenant-scoped via `tenant_id`).
    ItemId
);

/// Master-data item as seen by the fulfillment engine.
///
/// Item CRUD belongs to an external collaborator; the engine only needs the
/// identity, a display code and whether the item may still move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    tenant_id: TenantId,
    sku: String,
    name: String,
    unit_of_measure: String,
    active: bool,
}

impl Item {
    pub fn new(
        tenant_id: TenantId,
        id: ItemId,
        sku: impl Into<String>,
        name: impl Into<String>,
        unit_of_measure: impl Into<String>,
    ) -> DomainResult<Self> {
        let sku = sku.into();
        if sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        let unit_of_measure = unit_of_measure.into();
        if unit_of_measure.trim().is_empty() {
            return Err(DomainError::validation("unit_of_measure cannot be empty"));
        }

        Ok(Self {
            id,
            tenant_id,
            sku,
            name: name.into(),
            unit_of_measure,
            active: true,
        })
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_of_measure(&self) -> &str {
        &self.unit_of_measure
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn ensure_active(&self) -> DomainResult<()> {
        if self.active {
            Ok(())
        } else {
            Err(DomainError::validation(format!("item {} is inactive", self.sku)))
        }
    }
}

impl AggregateRoot for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_sku_is_rejected() {
        let err = Item::new(TenantId::new(), ItemId::generate(), "  ", "Bolt", "pcs").unwrap_err();
        assert_eq!(err, DomainError::validation("sku cannot be empty"));
    }

    #[test]
    fn deactivated_item_fails_activity_check() {
        let mut item = Item::new(TenantId::new(), ItemId::generate(), "BOLT-10", "Bolt", "pcs").unwrap();
        assert!(item.ensure_active().is_ok());

        item.deactivate();
        let err = item.ensure_active().unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("BOLT-10")));
    }
}
