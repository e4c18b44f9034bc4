//! Per-team market state.
//!
//! One market per team: curve parameters, signed trader imbalance, the
//! liquidity pool, and the open-position index. Price is always derived,
//! never stored, so replicas cannot disagree about it.

use serde::{Deserialize, Serialize};

use crate::curve::price_for_imbalance;
use crate::params::MarketParams;
use crate::pool::LiquidityPool;
use crate::types::{MarketId, PositionId, Price, SignedAmount, TeamId, Timestamp};

/// Trading status. Paused markets reject every state-mutating trade
/// while reads and governance stay available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStatus {
    Active,
    Paused,
}

impl Default for MarketStatus {
    fn default() -> Self {
        Self::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub team: TeamId,
    /// Human-readable handle, e.g. "BOS-WINPCT".
    pub name: String,
    pub status: MarketStatus,
    pub params: MarketParams,
    /// Signed sum of all open position sizes. The curve input.
    pub net_imbalance: SignedAmount,
    pub pool: LiquidityPool,
    /// Open position ids for this market. Removal swaps with the last
    /// entry, so ordering is unspecified; membership is the contract.
    pub open_positions: Vec<PositionId>,
    pub created_at: Timestamp,
}

impl Market {
    pub fn new(
        id: MarketId,
        team: TeamId,
        name: impl Into<String>,
        params: MarketParams,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id,
            team,
            name: name.into(),
            status: MarketStatus::Active,
            params,
            net_imbalance: 0,
            pool: LiquidityPool::new(),
            open_positions: Vec::new(),
            created_at: timestamp,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MarketStatus::Active
    }

    /// Live mark price from the current imbalance and liquidity.
    pub fn current_price(&self) -> Price {
        price_for_imbalance(
            self.params.sensitivity,
            self.net_imbalance,
            self.pool.total_liquidity,
        )
    }

    /// Hypothetical price after a size lands, without mutating anything.
    pub fn price_after(&self, size_delta: SignedAmount) -> Price {
        price_for_imbalance(
            self.params.sensitivity,
            self.net_imbalance.saturating_add(size_delta),
            self.pool.total_liquidity,
        )
    }

    pub fn apply_open(&mut self, size: SignedAmount, id: PositionId) {
        self.net_imbalance = self.net_imbalance.saturating_add(size);
        self.open_positions.push(id);
    }

    /// Remove a closing position's contribution. Returns false if the id
    /// was not in the open index (already de-indexed).
    pub fn apply_close(&mut self, size: SignedAmount, id: PositionId) -> bool {
        match self.open_positions.iter().position(|p| *p == id) {
            Some(at) => {
                self.open_positions.swap_remove(at);
                self.net_imbalance = self.net_imbalance.saturating_sub(size);
                true
            }
            None => false,
        }
    }

    pub fn open_position_count(&self) -> usize {
        self.open_positions.len()
    }
}
