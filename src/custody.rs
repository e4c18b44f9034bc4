// 9.0 custody.rs: account collateral vault. plain balance bookkeeping; the
// real asset transfers happen at the host boundary, this ledger mirrors them.
// every value-moving engine operation touches an account here exactly once.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::types::{AccountId, Amount};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u128, requested: u128 },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vault {
    balances: HashMap<AccountId, Amount>,
    // Lifetime external flows, for the stats surface. Internal debits and
    // credits (margin, payouts, funding) do not move these.
    total_deposited: Amount,
    total_withdrawn: Amount,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    /// External funds arriving for an account.
    pub fn deposit(&mut self, account: AccountId, amount: Amount) -> Result<Amount, CustodyError> {
        if amount == 0 {
            return Err(CustodyError::InvalidAmount);
        }
        self.credit(account, amount);
        self.total_deposited = self.total_deposited.saturating_add(amount);
        Ok(self.balance_of(&account))
    }

    /// External funds leaving an account.
    pub fn withdraw(&mut self, account: AccountId, amount: Amount) -> Result<Amount, CustodyError> {
        if amount == 0 {
            return Err(CustodyError::InvalidAmount);
        }
        self.debit(account, amount)?;
        self.total_withdrawn = self.total_withdrawn.saturating_add(amount);
        Ok(self.balance_of(&account))
    }

    // 9.1: engine-side transfer legs. debit funds a position's margin and
    // fee on open, credit returns payouts on close and force-close.
    pub fn debit(&mut self, account: AccountId, amount: Amount) -> Result<(), CustodyError> {
        let balance = self.balances.entry(account).or_insert(0);
        if *balance < amount {
            return Err(CustodyError::InsufficientBalance {
                available: *balance,
                requested: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }

    pub fn credit(&mut self, account: AccountId, amount: Amount) {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    pub fn total_withdrawn(&self) -> Amount {
        self.total_withdrawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::SCALE;

    const ALICE: AccountId = AccountId(1);
    const BOB: AccountId = AccountId(2);

    #[test]
    fn deposit_withdraw_flow() {
        let mut vault = Vault::new();
        assert_eq!(vault.deposit(ALICE, 1_000 * SCALE).unwrap(), 1_000 * SCALE);
        assert_eq!(vault.withdraw(ALICE, 400 * SCALE).unwrap(), 600 * SCALE);
        assert_eq!(vault.balance_of(&ALICE), 600 * SCALE);
        assert_eq!(vault.total_deposited(), 1_000 * SCALE);
        assert_eq!(vault.total_withdrawn(), 400 * SCALE);
    }

    #[test]
    fn rejects_zero_and_overdraw() {
        let mut vault = Vault::new();
        assert_eq!(vault.deposit(ALICE, 0), Err(CustodyError::InvalidAmount));
        assert!(matches!(
            vault.withdraw(ALICE, 1),
            Err(CustodyError::InsufficientBalance { available: 0, requested: 1 })
        ));
        vault.deposit(ALICE, 100).unwrap();
        assert!(vault.withdraw(ALICE, 101).is_err());
        // failed withdrawal leaves the balance alone
        assert_eq!(vault.balance_of(&ALICE), 100);
    }

    #[test]
    fn debit_credit_do_not_touch_external_totals() {
        let mut vault = Vault::new();
        vault.deposit(ALICE, 500 * SCALE).unwrap();
        vault.debit(ALICE, 200 * SCALE).unwrap();
        vault.credit(BOB, 200 * SCALE);
        assert_eq!(vault.balance_of(&ALICE), 300 * SCALE);
        assert_eq!(vault.balance_of(&BOB), 200 * SCALE);
        assert_eq!(vault.total_deposited(), 500 * SCALE);
        assert_eq!(vault.total_withdrawn(), 0);
    }
}
