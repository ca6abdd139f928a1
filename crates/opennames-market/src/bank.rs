//! The balance-escrow boundary.
//!
//! The real debit/credit primitives belong to the host application's bank
//! module; the engines only ever see the [`BankKeeper`] trait. Escrowed
//! funds conceptually sit in a module-held account: a bid or offer moves
//! coins from the actor into the pool, and settlement or refund moves
//! them back out. Registration fees go to a separate sink and are final.

use std::collections::HashMap;

use opennames_types::{Addr, Coin, NamesError, Result};
use rust_decimal::Decimal;

/// Balance operations the engines need from the host.
pub trait BankKeeper {
    /// Move `coin` from `from` into the module escrow pool.
    fn escrow(&mut self, from: &Addr, coin: &Coin) -> Result<()>;

    /// Move `coin` from the module escrow pool to `to` (refund or payout).
    fn release(&mut self, to: &Addr, coin: &Coin) -> Result<()>;

    /// Charge `payer` a fee. Fees do not enter the escrow pool and are
    /// never refunded.
    fn charge(&mut self, payer: &Addr, coin: &Coin) -> Result<()>;
}

/// In-memory [`BankKeeper`] with full conservation accounting. The test
/// double for the host bank, and the reference semantics for escrow.
#[derive(Debug, Default)]
pub struct ModuleBank {
    /// Per-(account, denom) available balances.
    balances: HashMap<(String, String), Decimal>,
    /// Escrow held by the module, per denom.
    escrowed: HashMap<String, Decimal>,
    /// Fees collected, per denom.
    fees: HashMap<String, Decimal>,
    /// Total deposits per denom since genesis, for conservation checks.
    deposits: HashMap<String, Decimal>,
}

impl ModuleBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposit funds into an account (test setup / host faucet).
    pub fn deposit(&mut self, account: &Addr, coin: &Coin) {
        *self
            .balances
            .entry((account.to_string(), coin.denom.clone()))
            .or_insert(Decimal::ZERO) += coin.amount;
        *self
            .deposits
            .entry(coin.denom.clone())
            .or_insert(Decimal::ZERO) += coin.amount;
    }

    /// Seed the escrow pool directly. Used at genesis import, where the
    /// module account arrives funded with the escrow it must refund.
    pub fn fund_escrow(&mut self, coin: &Coin) {
        *self
            .escrowed
            .entry(coin.denom.clone())
            .or_insert(Decimal::ZERO) += coin.amount;
        *self
            .deposits
            .entry(coin.denom.clone())
            .or_insert(Decimal::ZERO) += coin.amount;
    }

    /// Available balance of an account in a denom.
    #[must_use]
    pub fn balance_of(&self, account: &Addr, denom: &str) -> Decimal {
        self.balances
            .get(&(account.to_string(), denom.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Escrow currently held by the module in a denom.
    #[must_use]
    pub fn escrowed(&self, denom: &str) -> Decimal {
        self.escrowed.get(denom).copied().unwrap_or(Decimal::ZERO)
    }

    /// Fees collected in a denom.
    #[must_use]
    pub fn fees_collected(&self, denom: &str) -> Decimal {
        self.fees.get(denom).copied().unwrap_or(Decimal::ZERO)
    }

    /// Verify conservation for a denom:
    /// `Σ balances + escrowed + fees == Σ deposits`.
    pub fn verify_conservation(&self, denom: &str) -> Result<()> {
        let held: Decimal = self
            .balances
            .iter()
            .filter(|((_, d), _)| d == denom)
            .map(|(_, amount)| *amount)
            .sum();
        let actual = held + self.escrowed(denom) + self.fees_collected(denom);
        let expected = self.deposits.get(denom).copied().unwrap_or(Decimal::ZERO);
        if actual != expected {
            return Err(NamesError::Internal(format!(
                "conservation violated for {denom}: have {actual}, expected {expected}"
            )));
        }
        Ok(())
    }

    fn debit(&mut self, account: &Addr, coin: &Coin) -> Result<()> {
        let entry = self
            .balances
            .get_mut(&(account.to_string(), coin.denom.clone()))
            .ok_or(NamesError::InsufficientBalance {
                needed: coin.amount,
                available: Decimal::ZERO,
            })?;
        if *entry < coin.amount {
            return Err(NamesError::InsufficientBalance {
                needed: coin.amount,
                available: *entry,
            });
        }
        *entry -= coin.amount;
        Ok(())
    }
}

impl BankKeeper for ModuleBank {
    fn escrow(&mut self, from: &Addr, coin: &Coin) -> Result<()> {
        coin.validate()?;
        self.debit(from, coin)?;
        *self
            .escrowed
            .entry(coin.denom.clone())
            .or_insert(Decimal::ZERO) += coin.amount;
        Ok(())
    }

    fn release(&mut self, to: &Addr, coin: &Coin) -> Result<()> {
        coin.validate()?;
        let pool = self
            .escrowed
            .get_mut(&coin.denom)
            .ok_or(NamesError::InsufficientEscrow)?;
        if *pool < coin.amount {
            return Err(NamesError::InsufficientEscrow);
        }
        *pool -= coin.amount;
        *self
            .balances
            .entry((to.to_string(), coin.denom.clone()))
            .or_insert(Decimal::ZERO) += coin.amount;
        Ok(())
    }

    fn charge(&mut self, payer: &Addr, coin: &Coin) -> Result<()> {
        coin.validate()?;
        self.debit(payer, coin)?;
        *self
            .fees
            .entry(coin.denom.clone())
            .or_insert(Decimal::ZERO) += coin.amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(amount: i64) -> Coin {
        Coin::new("uopen", Decimal::new(amount, 0))
    }

    #[test]
    fn escrow_moves_funds_into_pool() {
        let mut bank = ModuleBank::new();
        let alice = Addr::dummy("alice");
        bank.deposit(&alice, &coin(1000));

        bank.escrow(&alice, &coin(400)).unwrap();
        assert_eq!(bank.balance_of(&alice, "uopen"), Decimal::new(600, 0));
        assert_eq!(bank.escrowed("uopen"), Decimal::new(400, 0));
        bank.verify_conservation("uopen").unwrap();
    }

    #[test]
    fn escrow_insufficient_fails_cleanly() {
        let mut bank = ModuleBank::new();
        let alice = Addr::dummy("alice");
        bank.deposit(&alice, &coin(100));

        let err = bank.escrow(&alice, &coin(200)).unwrap_err();
        assert!(matches!(err, NamesError::InsufficientBalance { .. }));
        assert_eq!(bank.balance_of(&alice, "uopen"), Decimal::new(100, 0));
        assert_eq!(bank.escrowed("uopen"), Decimal::ZERO);
    }

    #[test]
    fn release_pays_out_of_pool() {
        let mut bank = ModuleBank::new();
        let alice = Addr::dummy("alice");
        let bob = Addr::dummy("bob");
        bank.deposit(&alice, &coin(1000));
        bank.escrow(&alice, &coin(400)).unwrap();

        bank.release(&bob, &coin(400)).unwrap();
        assert_eq!(bank.balance_of(&bob, "uopen"), Decimal::new(400, 0));
        assert_eq!(bank.escrowed("uopen"), Decimal::ZERO);
        bank.verify_conservation("uopen").unwrap();
    }

    #[test]
    fn release_beyond_pool_fails() {
        let mut bank = ModuleBank::new();
        let bob = Addr::dummy("bob");
        let err = bank.release(&bob, &coin(1)).unwrap_err();
        assert!(matches!(err, NamesError::InsufficientEscrow));
    }

    #[test]
    fn fees_are_not_escrow() {
        let mut bank = ModuleBank::new();
        let alice = Addr::dummy("alice");
        bank.deposit(&alice, &coin(1000));

        bank.charge(&alice, &coin(250)).unwrap();
        assert_eq!(bank.fees_collected("uopen"), Decimal::new(250, 0));
        assert_eq!(bank.escrowed("uopen"), Decimal::ZERO);
        bank.verify_conservation("uopen").unwrap();
    }

    #[test]
    fn fund_escrow_seeds_pool_for_genesis() {
        let mut bank = ModuleBank::new();
        let bidder = Addr::dummy("bidder");
        bank.fund_escrow(&coin(150));
        bank.release(&bidder, &coin(150)).unwrap();
        assert_eq!(bank.balance_of(&bidder, "uopen"), Decimal::new(150, 0));
        bank.verify_conservation("uopen").unwrap();
    }
}
