//! Engine configuration: fee schedule and the retry budget for conflicting
//! transactions.

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use depot_purchasing::FeeSchedule;

use crate::error::{FulfillmentError, FulfillmentResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FulfillmentConfig {
    pub fees: FeeSchedule,
    /// Deadline for one workflow including its retries.
    #[serde(with = "millis")]
    pub operation_timeout: Duration,
    /// Total attempts per workflow (first try included).
    pub max_attempts: u32,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            operation_timeout: Duration::from_millis(5000),
            max_attempts: 2,
        }
    }
}

impl FulfillmentConfig {
    /// Read `DEPOT_*` variables; anything missing or unparsable keeps its default.
    pub fn from_env() -> FulfillmentResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> FulfillmentResult<Self> {
        let defaults = Self::default();
        let read = |key: &str, default: Decimal| parse_or(&lookup, key, default);

        let config = Self {
            fees: FeeSchedule {
                tier1_max: read("DEPOT_FEE_TIER1_MAX", defaults.fees.tier1_max),
                tier2_max: read("DEPOT_FEE_TIER2_MAX", defaults.fees.tier2_max),
                tier1_rate: read("DEPOT_FEE_RATE_TIER1", defaults.fees.tier1_rate),
                tier2_rate: read("DEPOT_FEE_RATE_TIER2", defaults.fees.tier2_rate),
                tier3_rate: read("DEPOT_FEE_RATE_TIER3", defaults.fees.tier3_rate),
            },
            operation_timeout: Duration::from_millis(parse_or(
                &lookup,
                "DEPOT_OPERATION_TIMEOUT_MS",
                defaults.operation_timeout.as_millis() as u64,
            )),
            max_attempts: parse_or(&lookup, "DEPOT_MAX_ATTEMPTS", defaults.max_attempts),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FulfillmentResult<()> {
        self.fees.validate()?;
        if self.max_attempts == 0 {
            return Err(FulfillmentError::Validation("max_attempts must be at least 1".into()));
        }
        if self.operation_timeout.is_zero() {
            return Err(FulfillmentError::Validation("operation_timeout must be positive".into()));
        }
        Ok(())
    }

    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, fallback = %default, "unparsable config value, using default");
                default
            }
        },
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
