use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

/// loan subsystem configuration
///
/// Loaded once by the host service and treated as immutable for the
/// process lifetime. `interest_rate` is the repayment multiplier applied
/// to every accepted principal; `max_loan` is the cap on a single
/// player's outstanding loan balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanConfig {
    pub interest_rate: Rate,
    pub max_loan: Money,
}

impl LoanConfig {
    /// create a validated configuration
    pub fn new(interest_rate: Rate, max_loan: Money) -> Result<Self> {
        let config = Self {
            interest_rate,
            max_loan,
        };
        config.validate()?;
        Ok(config)
    }

    /// load from a JSON document, revalidating the deserialized values
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LoanError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// check rate and cap bounds
    pub fn validate(&self) -> Result<()> {
        if !self.interest_rate.is_valid_interest() {
            return Err(LoanError::InvalidConfiguration {
                message: format!("interest rate must exceed 1.0, got {}", self.interest_rate),
            });
        }
        if !self.max_loan.is_positive() {
            return Err(LoanError::InvalidConfiguration {
                message: format!("loan cap must be positive, got {}", self.max_loan),
            });
        }
        Ok(())
    }
}

impl Default for LoanConfig {
    /// 10% interest with a 1000 cap
    fn default() -> Self {
        Self {
            interest_rate: Rate::from_decimal(dec!(1.10)),
            max_loan: Money::from_major(1000),
        }
    }
}
