use dashmap::DashMap;

use crate::decimal::Money;
use crate::errors::BalanceError;
use crate::types::PlayerId;

/// the economy's per-player balance ledger, consumed behind this seam
///
/// Implementations are expected to be durable in the host service; the
/// loan subsystem only requires that `credit` and `debit` report failure
/// instead of partially applying, and that `debit` distinguishes
/// insufficient funds from storage failure.
pub trait BalanceStore: Send + Sync {
    /// current balance, zero for an unknown player
    fn balance(&self, player: PlayerId) -> Result<Money, BalanceError>;

    /// add funds to the player's balance
    fn credit(&self, player: PlayerId, amount: Money) -> Result<(), BalanceError>;

    /// remove funds from the player's balance
    fn debit(&self, player: PlayerId, amount: Money) -> Result<(), BalanceError>;
}

/// in-memory balance store for tests and demos
#[derive(Debug, Default)]
pub struct MemoryBalanceStore {
    balances: DashMap<PlayerId, Money>,
}

impl MemoryBalanceStore {
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }

    /// seed a starting balance
    pub fn with_balance(self, player: PlayerId, amount: Money) -> Self {
        self.balances.insert(player, amount);
        self
    }
}

impl BalanceStore for MemoryBalanceStore {
    fn balance(&self, player: PlayerId) -> Result<Money, BalanceError> {
        Ok(self
            .balances
            .get(&player)
            .map(|balance| *balance)
            .unwrap_or(Money::ZERO))
    }

    fn credit(&self, player: PlayerId, amount: Money) -> Result<(), BalanceError> {
        *self.balances.entry(player).or_default() += amount;
        Ok(())
    }

    fn debit(&self, player: PlayerId, amount: Money) -> Result<(), BalanceError> {
        let mut balance = self.balances.entry(player).or_default();
        if *balance < amount {
            return Err(BalanceError::InsufficientFunds {
                available: *balance,
                requested: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_player_has_zero_balance() {
        let store = MemoryBalanceStore::new();
        assert_eq!(store.balance(PlayerId::new_v4()).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_credit_then_debit() {
        let store = MemoryBalanceStore::new();
        let player = PlayerId::new_v4();

        store.credit(player, Money::from_major(100)).unwrap();
        store.debit(player, Money::from_major(40)).unwrap();

        assert_eq!(store.balance(player).unwrap(), Money::from_major(60));
    }

    #[test]
    fn test_debit_beyond_balance_fails_without_applying() {
        let store = MemoryBalanceStore::new().with_balance(PlayerId::nil(), Money::from_major(10));

        let result = store.debit(PlayerId::nil(), Money::from_major(25));
        assert!(matches!(
            result,
            Err(BalanceError::InsufficientFunds { .. })
        ));
        assert_eq!(store.balance(PlayerId::nil()).unwrap(), Money::from_major(10));
    }
}
