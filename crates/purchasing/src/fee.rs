//! Warehouse handling fee: a step function of the inbound unit price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use depot_core::{DomainError, DomainResult};

/// Price thresholds and the rate charged in each band.
///
/// `price <= tier1_max` pays `tier1_rate`, `price <= tier2_max` pays
/// `tier2_rate`, anything above pays `tier3_rate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub tier1_max: Decimal,
    pub tier2_max: Decimal,
    pub tier1_rate: Decimal,
    pub tier2_rate: Decimal,
    pub tier3_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAssessment {
    pub rate: Decimal,
    pub amount: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            tier1_max: Decimal::from(100),
            tier2_max: Decimal::from(1000),
            tier1_rate: Decimal::new(5, 2),
            tier2_rate: Decimal::new(3, 2),
            tier3_rate: Decimal::new(2, 2),
        }
    }
}

impl FeeSchedule {
    pub fn validate(&self) -> DomainResult<()> {
        if self.tier1_max.is_sign_negative() || self.tier1_max >= self.tier2_max {
            return Err(DomainError::validation(
                "fee thresholds must satisfy 0 <= tier1_max < tier2_max",
            ));
        }
        for rate in [self.tier1_rate, self.tier2_rate, self.tier3_rate] {
            if rate.is_sign_negative() || rate > Decimal::ONE {
                return Err(DomainError::validation(format!(
                    "fee rate {rate} must be within [0, 1]"
                )));
            }
        }
        Ok(())
    }

    pub fn rate_for(&self, unit_price: Decimal) -> Decimal {
        if unit_price <= self.tier1_max {
            self.tier1_rate
        } else if unit_price <= self.tier2_max {
            self.tier2_rate
        } else {
            self.tier3_rate
        }
    }

    pub fn assess(&self, unit_price: Decimal) -> FeeAssessment {
        let rate = self.rate_for(unit_price);
        FeeAssessment {
            rate,
            amount: unit_price * rate,
        }
    }
}
