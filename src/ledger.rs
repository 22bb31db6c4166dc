use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::{PendingOffer, PlayerId};

/// per-player loan state
///
/// Offer sub-state machine: no offer -> (request) -> offered ->
/// (accept | deny) -> no offer. A request while an offer is pending
/// replaces it in place; the old terms are discarded, never resolved.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LoanAccount {
    pub outstanding: Money,
    pub pending_offer: Option<PendingOffer>,
}

impl LoanAccount {
    /// replace any pending offer with new terms
    pub fn set_pending_offer(&mut self, offer: PendingOffer) {
        self.pending_offer = Some(offer);
    }

    /// read and clear the pending offer
    pub fn take_pending_offer(&mut self) -> Option<PendingOffer> {
        self.pending_offer.take()
    }

    /// add an accepted principal to the outstanding balance
    pub fn increase_outstanding(&mut self, amount: Money) {
        self.outstanding += amount;
    }

    /// apply a repayment, clamped to the outstanding balance
    pub fn decrease_outstanding(&mut self, amount: Money) -> Money {
        let applied = amount.min(self.outstanding);
        self.outstanding -= applied;
        applied
    }
}

/// authoritative per-player loan records
///
/// Accounts live in a concurrent map keyed by player; every operation for
/// one player runs under that player's entry lock, so a single player's
/// history of offer and balance mutations is linearizable. Accounts are
/// created lazily on first use and never removed.
#[derive(Debug, Default)]
pub struct LoanLedger {
    accounts: DashMap<PlayerId, LoanAccount>,
}

impl LoanLedger {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// outstanding loan balance, zero if the account is absent
    pub fn outstanding(&self, player: PlayerId) -> Money {
        self.accounts
            .get(&player)
            .map(|account| account.outstanding)
            .unwrap_or(Money::ZERO)
    }

    /// copy of the account record, for host persistence
    pub fn account(&self, player: PlayerId) -> Option<LoanAccount> {
        self.accounts.get(&player).map(|account| *account)
    }

    /// unconditionally replace any pending offer (last request wins)
    pub fn set_pending_offer(&self, player: PlayerId, offer: PendingOffer) {
        self.accounts
            .entry(player)
            .or_default()
            .set_pending_offer(offer);
    }

    /// atomically read and clear the pending offer
    ///
    /// Both accept and deny resolve through this, so a given offer is
    /// resolved exactly once: two racing calls see one `Some` and one
    /// `None`.
    pub fn take_pending_offer(&self, player: PlayerId) -> Option<PendingOffer> {
        self.accounts
            .get_mut(&player)
            .and_then(|mut account| account.take_pending_offer())
    }

    /// add an accepted principal to the outstanding balance
    ///
    /// The caller guarantees the cap invariant: the amount must come from
    /// an offer that was quoted against this account's headroom.
    pub fn increase_outstanding(&self, player: PlayerId, amount: Money) {
        self.accounts
            .entry(player)
            .or_default()
            .increase_outstanding(amount);
    }

    /// apply a repayment, clamped to the outstanding balance
    ///
    /// Returns the amount actually applied; zero if the account is absent
    /// or debt-free.
    pub fn decrease_outstanding(&self, player: PlayerId, amount: Money) -> Money {
        self.accounts
            .get_mut(&player)
            .map(|mut account| account.decrease_outstanding(amount))
            .unwrap_or(Money::ZERO)
    }

    /// resolve the pending offer into a grant, as one atomic step
    ///
    /// Under the player's entry lock: fails with `NoPendingOffer` if no
    /// offer exists, otherwise runs `apply` (the external balance credit)
    /// against the offer. Only when `apply` succeeds is the offer cleared
    /// and the outstanding balance increased; on failure the offer stays
    /// pending and the account is untouched, so the caller can retry.
    /// Returns the granted offer and the new outstanding balance.
    ///
    /// `apply` runs while the entry lock is held and must not call back
    /// into this ledger.
    pub fn commit_pending_offer(
        &self,
        player: PlayerId,
        apply: impl FnOnce(&PendingOffer) -> Result<()>,
    ) -> Result<(PendingOffer, Money)> {
        let mut account = self
            .accounts
            .get_mut(&player)
            .ok_or(LoanError::NoPendingOffer)?;

        let offer = *account
            .pending_offer
            .as_ref()
            .ok_or(LoanError::NoPendingOffer)?;

        apply(&offer)?;

        account.pending_offer = None;
        account.increase_outstanding(offer.principal);
        Ok((offer, account.outstanding))
    }
}
