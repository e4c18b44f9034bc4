// 6.0: proportional liquidity-share accounting. LPs hold shares, the pool
// holds value; deposits and withdrawals preserve the value-per-share ratio
// exactly. only fee accrual and funding settlement move the ratio.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::fixed::{apply_signed, muldiv};
use crate::types::{AccountId, Amount, SignedAmount};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("amount must be positive")]
    ZeroAmount,
    #[error("insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: u128, held: u128 },
    #[error("pool drained: {total_shares} shares outstanding with zero liquidity")]
    Drained { total_shares: u128 },
    #[error("insufficient pool funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u128, available: u128 },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiquidityPool {
    pub total_liquidity: Amount,
    pub total_shares: Amount,
    // Lifetime trading fees folded into the pool. Tracked separately so the
    // stats surface can report fee income apart from funding flow.
    pub accumulated_fees: Amount,
    shares: HashMap<AccountId, Amount>,
}

impl LiquidityPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that a deposit of `amount` would be accepted, without
    /// performing it. `mint` runs exactly these checks first.
    pub fn check_mint(&self, amount: Amount) -> Result<(), PoolError> {
        if amount == 0 {
            return Err(PoolError::ZeroAmount);
        }
        if self.total_shares > 0 && self.total_liquidity == 0 {
            // funding drained the pool to zero with shares still outstanding;
            // the ratio is undefined, so new deposits are refused until the
            // remaining holders burn out.
            return Err(PoolError::Drained {
                total_shares: self.total_shares,
            });
        }
        Ok(())
    }

    // 6.1: mint shares for a deposit. first deposit is 1:1; afterwards
    // amount * total_shares / total_liquidity, flooring, so a deposit can
    // never mint more value than it brought.
    pub fn mint(&mut self, provider: AccountId, amount: Amount) -> Result<Amount, PoolError> {
        self.check_mint(amount)?;
        let minted = if self.total_shares == 0 {
            amount
        } else {
            muldiv(amount, self.total_shares, self.total_liquidity)
        };
        self.total_liquidity = self.total_liquidity.saturating_add(amount);
        self.total_shares = self.total_shares.saturating_add(minted);
        *self.shares.entry(provider).or_insert(0) += minted;
        Ok(minted)
    }

    // 6.2: burn shares for a payout of shares * total_liquidity / total_shares.
    // flooring leaves dust in the pool rather than overdrawing it.
    pub fn burn(&mut self, provider: AccountId, shares: Amount) -> Result<Amount, PoolError> {
        if shares == 0 {
            return Err(PoolError::ZeroAmount);
        }
        let held = self.shares_of(&provider);
        if shares > held {
            return Err(PoolError::InsufficientShares {
                requested: shares,
                held,
            });
        }
        let payout = muldiv(shares, self.total_liquidity, self.total_shares);
        self.total_liquidity -= payout;
        self.total_shares -= shares;
        let remaining = held - shares;
        if remaining == 0 {
            self.shares.remove(&provider);
        } else {
            self.shares.insert(provider, remaining);
        }
        Ok(payout)
    }

    /// Trading fees raise pool value without minting shares, so every
    /// holder's redeemable value rises pro rata.
    pub fn accrue_fee(&mut self, amount: Amount) {
        self.total_liquidity = self.total_liquidity.saturating_add(amount);
        self.accumulated_fees = self.accumulated_fees.saturating_add(amount);
    }

    // 6.3: funding settlement flow. positive credits the pool, negative
    // drains it. the coordinator pre-checks headroom, this is the backstop.
    pub fn apply_funding(&mut self, delta: SignedAmount) -> Result<(), PoolError> {
        match apply_signed(self.total_liquidity, delta) {
            Some(next) => {
                self.total_liquidity = next;
                Ok(())
            }
            None => Err(PoolError::InsufficientFunds {
                requested: delta.unsigned_abs(),
                available: self.total_liquidity,
            }),
        }
    }

    pub fn shares_of(&self, provider: &AccountId) -> Amount {
        self.shares.get(provider).copied().unwrap_or(0)
    }

    /// Redeemable value of a provider's full share balance right now.
    pub fn share_value(&self, provider: &AccountId) -> Amount {
        let held = self.shares_of(provider);
        if held == 0 || self.total_shares == 0 {
            return 0;
        }
        muldiv(held, self.total_liquidity, self.total_shares)
    }

    pub fn provider_count(&self) -> usize {
        self.shares.len()
    }
}
