use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};

/// unique identifier for a player
pub type PlayerId = Uuid;

/// a computed, not-yet-accepted loan held per player until resolved
///
/// `repayment` is always `principal * rate` at the rate in force when the
/// offer was quoted; offers are replaced whole, never mutated, so the two
/// amounts cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOffer {
    pub principal: Money,
    pub repayment: Money,
}

impl PendingOffer {
    /// build an offer for a principal at the given rate
    pub fn quote(principal: Money, rate: Rate) -> Self {
        Self {
            principal,
            repayment: principal * rate,
        }
    }
}

/// outcome of a loan request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanQuote {
    /// no remaining loan headroom; nothing was offered
    AtCap,
    /// an offer was recorded and awaits accept or deny
    Offered {
        principal: Money,
        repayment: Money,
        /// true when the request was downgraded to the maximum allowed
        downgraded: bool,
    },
}

/// result of accepting a pending offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedLoan {
    pub principal: Money,
    pub repayment: Money,
    /// outstanding loan balance after the grant
    pub outstanding: Money,
}

/// the offer discarded by a deny
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclinedOffer {
    pub principal: Money,
    pub repayment: Money,
}

/// result of a repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPayment {
    /// amount actually debited, clamped to the outstanding balance
    pub paid: Money,
    /// outstanding loan balance after the payment
    pub remaining: Money,
}
