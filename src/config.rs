use std::{fs, path::Path};

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use thiserror::Error;

pub const TRANSFER_FEE_RATE: Decimal = dec!(0.01);
pub const SAVINGS_WITHDRAWAL_FEE: Decimal = dec!(5);
pub const INTEREST_BONUS: Decimal = dec!(1.05);
pub const PREMIUM_INTEREST_BONUS: Decimal = dec!(1.10);
pub const PREMIUM_PERIOD_DAYS: i64 = 30;
pub const MAX_PREMIUM_PERIOD_DAYS: i64 = 3650;
pub const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config `{path}`: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config `{path}`: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Rates and flat fees applied by account variants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Nominal fee rate on transfers from non-premium senders, also charged on
    /// savings withdrawals of non-premium owners.
    pub transfer_fee_rate: Decimal,
    /// Flat fee charged on every savings withdrawal.
    pub savings_withdrawal_fee: Decimal,
    /// Deposit multiplier for interest-bearing accounts.
    pub interest_bonus: Decimal,
    pub premium_interest_bonus: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            transfer_fee_rate: TRANSFER_FEE_RATE,
            savings_withdrawal_fee: SAVINGS_WITHDRAWAL_FEE,
            interest_bonus: INTEREST_BONUS,
            premium_interest_bonus: PREMIUM_INTEREST_BONUS,
        }
    }
}

impl FeeSchedule {
    pub fn interest_multiplier(&self, premium: bool) -> Decimal {
        if premium {
            self.premium_interest_bonus
        } else {
            self.interest_bonus
        }
    }

    /// Fee on top of `amount` that premium owners don't pay. `None` on overflow.
    pub fn percentage_fee(&self, amount: Decimal, premium: bool) -> Option<Decimal> {
        if premium {
            Some(Decimal::ZERO)
        } else {
            amount.checked_mul(self.transfer_fee_rate)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub fees: FeeSchedule,
    pub premium_period_days: i64,
    pub history_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            premium_period_days: PREMIUM_PERIOD_DAYS,
            history_limit: HISTORY_LIMIT,
        }
    }
}

impl LedgerConfig {
    /// Reads a JSON config file. Missing fields fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_PREMIUM_PERIOD_DAYS).contains(&self.premium_period_days) {
            return Err(ConfigError::Invalid(format!(
                "premium_period_days must be between 1 and {MAX_PREMIUM_PERIOD_DAYS}, got {}",
                self.premium_period_days
            )));
        }
        let fees = [
            ("transfer_fee_rate", self.fees.transfer_fee_rate),
            ("savings_withdrawal_fee", self.fees.savings_withdrawal_fee),
            ("interest_bonus", self.fees.interest_bonus),
            ("premium_interest_bonus", self.fees.premium_interest_bonus),
        ];
        for (name, value) in fees {
            if value < Decimal::ZERO {
                return Err(ConfigError::Invalid(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Length of a premium membership.
    pub fn premium_period(&self) -> Result<Duration, ConfigError> {
        self.validate()?;
        Duration::try_days(self.premium_period_days).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "premium_period_days out of range: {}",
                self.premium_period_days
            ))
        })
    }
}
