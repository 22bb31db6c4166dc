use crate::config::LoanConfig;
use crate::decimal::Money;
use crate::types::PendingOffer;

/// decision produced for a loan request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanDecision {
    /// the account is at or over its cap; no offer is produced
    NoCapacity,
    /// the request exceeded remaining capacity and was downgraded
    Partial {
        offer: PendingOffer,
    },
    /// the request fits as asked
    Full {
        offer: PendingOffer,
    },
}

impl LoanDecision {
    /// the offer carried by a partial or full decision
    pub fn offer(&self) -> Option<PendingOffer> {
        match self {
            LoanDecision::NoCapacity => None,
            LoanDecision::Partial { offer } | LoanDecision::Full { offer } => Some(*offer),
        }
    }
}

/// remaining offerable principal before the cap, pre-interest
///
/// The cap bounds the repayment-adjusted exposure, so capacity left under
/// it is divided by the rate to express what can still be handed out.
pub fn headroom(outstanding: Money, config: &LoanConfig) -> Money {
    (config.max_loan - outstanding) / config.interest_rate
}

/// quote a loan request against the configured rate and cap
///
/// Pure and deterministic; safe to call concurrently. Callers guarantee
/// `requested > 0` and `outstanding >= 0`; the config guarantees rate and
/// cap bounds.
pub fn quote(outstanding: Money, requested: Money, config: &LoanConfig) -> LoanDecision {
    let headroom = headroom(outstanding, config);

    if !headroom.is_positive() {
        return LoanDecision::NoCapacity;
    }

    if headroom < requested {
        LoanDecision::Partial {
            offer: PendingOffer::quote(headroom, config.interest_rate),
        }
    } else {
        LoanDecision::Full {
            offer: PendingOffer::quote(requested, config.interest_rate),
        }
    }
}
