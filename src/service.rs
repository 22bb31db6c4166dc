use chrono::Utc;
use tracing::{debug, info, warn};

use crate::balance::BalanceStore;
use crate::calculator::{self, LoanDecision};
use crate::config::LoanConfig;
use crate::decimal::Money;
use crate::errors::{BalanceError, LoanError, Result};
use crate::events::{EventLog, LoanEvent};
use crate::ledger::LoanLedger;
use crate::types::{AcceptedLoan, DeclinedOffer, LoanPayment, LoanQuote, PlayerId};

/// orchestrates the loan lifecycle against the ledger and balance store
///
/// Operations take `&self` and are safe to call from any thread. The
/// ledger serializes mutations per player; the host command layer is
/// expected to serialize a single player's request/accept/deny calls
/// against each other, as it owns their dispatch.
pub struct LoanService<S: BalanceStore> {
    pub config: LoanConfig,
    pub ledger: LoanLedger,
    pub balances: S,
    pub events: EventLog,
}

impl<S: BalanceStore> LoanService<S> {
    pub fn new(config: LoanConfig, balances: S) -> Self {
        Self {
            config,
            ledger: LoanLedger::new(),
            balances,
            events: EventLog::new(),
        }
    }

    /// quote a loan and record it as the player's pending offer
    ///
    /// At or over the cap the request terminates with `LoanQuote::AtCap`
    /// and nothing is recorded. A request larger than the remaining
    /// headroom is downgraded to the maximum and flagged; a new request
    /// always replaces any offer already pending.
    pub fn request_loan(&self, player: PlayerId, requested: Money) -> Result<LoanQuote> {
        if !requested.is_positive() {
            return Err(LoanError::InvalidAmount { amount: requested });
        }

        let outstanding = self.ledger.outstanding(player);

        match calculator::quote(outstanding, requested, &self.config) {
            LoanDecision::NoCapacity => {
                debug!(%player, %outstanding, "loan request at cap");
                self.events.emit(LoanEvent::LoanRequestAtCap {
                    player,
                    outstanding,
                    timestamp: Utc::now(),
                });
                Ok(LoanQuote::AtCap)
            }
            LoanDecision::Partial { offer } => {
                self.ledger.set_pending_offer(player, offer);
                debug!(
                    %player, principal = %offer.principal, repayment = %offer.repayment,
                    "partial loan offered"
                );
                self.events.emit(LoanEvent::LoanQuoted {
                    player,
                    principal: offer.principal,
                    repayment: offer.repayment,
                    downgraded: true,
                    timestamp: Utc::now(),
                });
                Ok(LoanQuote::Offered {
                    principal: offer.principal,
                    repayment: offer.repayment,
                    downgraded: true,
                })
            }
            LoanDecision::Full { offer } => {
                self.ledger.set_pending_offer(player, offer);
                debug!(
                    %player, principal = %offer.principal, repayment = %offer.repayment,
                    "loan offered"
                );
                self.events.emit(LoanEvent::LoanQuoted {
                    player,
                    principal: offer.principal,
                    repayment: offer.repayment,
                    downgraded: false,
                    timestamp: Utc::now(),
                });
                Ok(LoanQuote::Offered {
                    principal: offer.principal,
                    repayment: offer.repayment,
                    downgraded: false,
                })
            }
        }
    }

    /// accept the pending offer, crediting funds and recording the debt
    ///
    /// The balance credit and the ledger update happen as one unit inside
    /// the player's critical section; a failed credit leaves the offer
    /// pending and both stores unchanged, and the caller may retry.
    pub fn accept_loan(&self, player: PlayerId) -> Result<AcceptedLoan> {
        let (offer, outstanding) = self.ledger.commit_pending_offer(player, |offer| {
            self.balances
                .credit(player, offer.principal)
                .map_err(|e| {
                    warn!(%player, error = %e, "loan credit failed, offer kept pending");
                    LoanError::Persistence(e)
                })
        })?;

        info!(
            %player, principal = %offer.principal, %outstanding,
            "loan accepted"
        );
        self.events.emit(LoanEvent::LoanAccepted {
            player,
            principal: offer.principal,
            repayment: offer.repayment,
            new_outstanding: outstanding,
            timestamp: Utc::now(),
        });

        Ok(AcceptedLoan {
            principal: offer.principal,
            repayment: offer.repayment,
            outstanding,
        })
    }

    /// discard the pending offer without granting it
    pub fn deny_loan(&self, player: PlayerId) -> Result<DeclinedOffer> {
        let offer = self
            .ledger
            .take_pending_offer(player)
            .ok_or(LoanError::NoPendingOffer)?;

        info!(%player, principal = %offer.principal, "loan denied");
        self.events.emit(LoanEvent::LoanDenied {
            player,
            principal: offer.principal,
            timestamp: Utc::now(),
        });

        Ok(DeclinedOffer {
            principal: offer.principal,
            repayment: offer.repayment,
        })
    }

    /// pay down the outstanding loan balance
    ///
    /// The payment is clamped to the outstanding debt. The balance debit
    /// runs first and a failed debit leaves the ledger untouched.
    pub fn repay_loan(&self, player: PlayerId, amount: Money) -> Result<LoanPayment> {
        if !amount.is_positive() {
            return Err(LoanError::InvalidAmount { amount });
        }

        let outstanding = self.ledger.outstanding(player);
        if outstanding.is_zero() {
            return Err(LoanError::NothingOutstanding);
        }

        let payment = amount.min(outstanding);
        self.balances.debit(player, payment).map_err(|e| match e {
            BalanceError::InsufficientFunds {
                available,
                requested,
            } => LoanError::InsufficientFunds {
                available,
                requested,
            },
            other => {
                warn!(%player, error = %other, "loan repayment debit failed");
                LoanError::Persistence(other)
            }
        })?;

        let paid = self.ledger.decrease_outstanding(player, payment);
        let remaining = self.ledger.outstanding(player);

        info!(%player, %paid, %remaining, "loan repaid");
        self.events.emit(LoanEvent::LoanRepaid {
            player,
            paid,
            remaining,
            timestamp: Utc::now(),
        });

        Ok(LoanPayment { paid, remaining })
    }

    /// outstanding loan balance for display
    pub fn outstanding(&self, player: PlayerId) -> Money {
        self.ledger.outstanding(player)
    }

    /// remaining offerable principal for display, pre-interest
    pub fn headroom(&self, player: PlayerId) -> Money {
        calculator::headroom(self.ledger.outstanding(player), &self.config).max(Money::ZERO)
    }

    /// drain buffered audit events for the host to persist
    pub fn drain_events(&self) -> Vec<LoanEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::MemoryBalanceStore;
    use crate::decimal::Rate;
    use rust_decimal_macros::dec;

    fn service() -> LoanService<MemoryBalanceStore> {
        let config =
            LoanConfig::new(Rate::from_decimal(dec!(1.10)), Money::from_major(1000)).unwrap();
        LoanService::new(config, MemoryBalanceStore::new())
    }

    /// balance store that refuses every write
    struct OfflineStore;

    impl BalanceStore for OfflineStore {
        fn balance(&self, _player: PlayerId) -> std::result::Result<Money, BalanceError> {
            Ok(Money::ZERO)
        }

        fn credit(&self, _player: PlayerId, _amount: Money) -> std::result::Result<(), BalanceError> {
            Err(BalanceError::Unavailable {
                message: "store offline".to_string(),
            })
        }

        fn debit(&self, _player: PlayerId, _amount: Money) -> std::result::Result<(), BalanceError> {
            Err(BalanceError::Unavailable {
                message: "store offline".to_string(),
            })
        }
    }

    #[test]
    fn test_full_quote_and_accept() {
        let service = service();
        let player = PlayerId::new_v4();

        let quote = service.request_loan(player, Money::from_major(500)).unwrap();
        assert_eq!(
            quote,
            LoanQuote::Offered {
                principal: Money::from_major(500),
                repayment: Money::from_major(550),
                downgraded: false,
            }
        );

        let accepted = service.accept_loan(player).unwrap();
        assert_eq!(accepted.principal, Money::from_major(500));
        assert_eq!(accepted.repayment, Money::from_major(550));
        assert_eq!(accepted.outstanding, Money::from_major(500));

        assert_eq!(service.outstanding(player), Money::from_major(500));
        assert_eq!(
            service.balances.balance(player).unwrap(),
            Money::from_major(500)
        );
    }

    #[test]
    fn test_partial_quote_against_existing_debt() {
        let service = service();
        let player = PlayerId::new_v4();
        service.ledger.increase_outstanding(player, Money::from_major(700));

        let quote = service.request_loan(player, Money::from_major(500)).unwrap();
        assert_eq!(
            quote,
            LoanQuote::Offered {
                principal: Money::from_str_exact("272.7273").unwrap(),
                repayment: Money::from_major(300),
                downgraded: true,
            }
        );
    }

    #[test]
    fn test_non_positive_request_rejected() {
        let service = service();
        let player = PlayerId::new_v4();

        assert!(matches!(
            service.request_loan(player, Money::ZERO),
            Err(LoanError::InvalidAmount { .. })
        ));
        assert!(matches!(
            service.request_loan(player, Money::from_major(-5)),
            Err(LoanError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_at_cap_is_terminal_and_records_nothing() {
        let service = service();
        let player = PlayerId::new_v4();
        service.ledger.increase_outstanding(player, Money::from_major(1000));

        let quote = service.request_loan(player, Money::from_major(100)).unwrap();
        assert_eq!(quote, LoanQuote::AtCap);

        // no offer was stored, so accept has nothing to resolve
        assert!(matches!(
            service.accept_loan(player),
            Err(LoanError::NoPendingOffer)
        ));
    }

    #[test]
    fn test_new_request_replaces_pending_offer() {
        let service = service();
        let player = PlayerId::new_v4();

        service.request_loan(player, Money::from_major(300)).unwrap();
        service.request_loan(player, Money::from_major(100)).unwrap();

        let accepted = service.accept_loan(player).unwrap();
        assert_eq!(accepted.principal, Money::from_major(100));
        assert_eq!(service.outstanding(player), Money::from_major(100));
        assert_eq!(
            service.balances.balance(player).unwrap(),
            Money::from_major(100)
        );
    }

    #[test]
    fn test_deny_is_resolved_exactly_once() {
        let service = service();
        let player = PlayerId::new_v4();

        service.request_loan(player, Money::from_major(200)).unwrap();

        let declined = service.deny_loan(player).unwrap();
        assert_eq!(declined.principal, Money::from_major(200));
        assert_eq!(declined.repayment, Money::from_major(220));

        assert!(matches!(
            service.deny_loan(player),
            Err(LoanError::NoPendingOffer)
        ));
        // deny mutated neither ledger nor balance
        assert_eq!(service.outstanding(player), Money::ZERO);
        assert_eq!(service.balances.balance(player).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_accept_without_offer_fails() {
        let service = service();
        assert!(matches!(
            service.accept_loan(PlayerId::new_v4()),
            Err(LoanError::NoPendingOffer)
        ));
    }

    #[test]
    fn test_failed_credit_keeps_offer_and_ledger() {
        let config =
            LoanConfig::new(Rate::from_decimal(dec!(1.10)), Money::from_major(1000)).unwrap();
        let service = LoanService::new(config, OfflineStore);
        let player = PlayerId::new_v4();

        service.request_loan(player, Money::from_major(400)).unwrap();

        assert!(matches!(
            service.accept_loan(player),
            Err(LoanError::Persistence(_))
        ));
        assert_eq!(service.outstanding(player), Money::ZERO);

        // the offer survived the failure; denying it still works
        let declined = service.deny_loan(player).unwrap();
        assert_eq!(declined.principal, Money::from_major(400));
    }

    #[test]
    fn test_outstanding_never_exceeds_cap() {
        let service = service();
        let player = PlayerId::new_v4();

        for _ in 0..20 {
            match service.request_loan(player, Money::from_major(5000)).unwrap() {
                LoanQuote::Offered { .. } => {
                    service.accept_loan(player).unwrap();
                }
                LoanQuote::AtCap => break,
            }
            assert!(service.outstanding(player) <= service.config.max_loan);
        }

        assert!(service.outstanding(player) <= service.config.max_loan);
    }

    #[test]
    fn test_repay_partial_then_full() {
        let service = service();
        let player = PlayerId::new_v4();

        service.request_loan(player, Money::from_major(500)).unwrap();
        service.accept_loan(player).unwrap();

        let payment = service.repay_loan(player, Money::from_major(200)).unwrap();
        assert_eq!(payment.paid, Money::from_major(200));
        assert_eq!(payment.remaining, Money::from_major(300));

        // paying more than the debt clamps to the debt
        let payment = service.repay_loan(player, Money::from_major(1000)).unwrap();
        assert_eq!(payment.paid, Money::from_major(300));
        assert_eq!(payment.remaining, Money::ZERO);
        assert_eq!(service.balances.balance(player).unwrap(), Money::ZERO);

        assert!(matches!(
            service.repay_loan(player, Money::from_major(10)),
            Err(LoanError::NothingOutstanding)
        ));
    }

    #[test]
    fn test_repay_with_insufficient_funds_leaves_ledger() {
        let service = service();
        let player = PlayerId::new_v4();

        service.request_loan(player, Money::from_major(500)).unwrap();
        service.accept_loan(player).unwrap();
        service.balances.debit(player, Money::from_major(400)).unwrap();

        let result = service.repay_loan(player, Money::from_major(300));
        assert!(matches!(
            result,
            Err(LoanError::InsufficientFunds { .. })
        ));
        assert_eq!(service.outstanding(player), Money::from_major(500));
    }

    #[test]
    fn test_headroom_query() {
        let service = service();
        let player = PlayerId::new_v4();

        assert_eq!(
            service.headroom(player),
            Money::from_str_exact("909.0909").unwrap()
        );

        service.ledger.increase_outstanding(player, Money::from_major(1000));
        assert_eq!(service.headroom(player), Money::ZERO);
    }

    #[test]
    fn test_lifecycle_emits_audit_events() {
        let service = service();
        let player = PlayerId::new_v4();

        service.request_loan(player, Money::from_major(500)).unwrap();
        service.accept_loan(player).unwrap();
        service.repay_loan(player, Money::from_major(500)).unwrap();

        let events = service.drain_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], LoanEvent::LoanQuoted { downgraded: false, .. }));
        assert!(matches!(events[1], LoanEvent::LoanAccepted { .. }));
        assert!(matches!(events[2], LoanEvent::LoanRepaid { .. }));
        assert!(service.events.is_empty());
    }
}
