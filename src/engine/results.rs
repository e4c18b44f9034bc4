// 12.2: result types and errors for engine operations.

use serde::{Deserialize, Serialize};

use crate::custody::CustodyError;
use crate::market::MarketStatus;
use crate::params::ParamError;
use crate::pool::PoolError;
use crate::types::{AccountId, Amount, Leverage, MarketId, Price, SignedAmount, Timestamp};

/// Preview of an `open_position` call at the current market state.
///
/// All fields are computed from the would-be fill: `avg_price` is the
/// midpoint of the pre- and post-trade prices and is the entry price the
/// position would be booked at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenQuote {
    /// Market price before the trade.
    pub current_price: Price,
    /// Market price after the imbalance shift.
    pub new_price: Price,
    /// Execution price: midpoint of current and new.
    pub avg_price: Price,
    /// Absolute tick distance between current and new price.
    pub price_impact: u32,
    /// Position notional at the execution price.
    pub notional: Amount,
    /// Minimum margin the engine will accept for this fill.
    pub required_margin: Amount,
    /// Opening fee debited alongside the margin.
    pub fee: Amount,
    /// Price at which the position would become liquidatable.
    pub liquidation_price: Price,
}

/// Outcome of one funding settlement pass over a market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingExecution {
    /// Net signed flow into positions. Positive means the pool paid out.
    pub total_payments: SignedAmount,
    /// Pool-side delta, always the negation of `total_payments`.
    pub lp_funding: SignedAmount,
    /// Open positions processed, including any force-closed.
    pub position_count: usize,
    /// True when cap headroom truncated the credit side.
    pub cap_reached: bool,
    /// Engine time at which the pass ran.
    pub execution_time: Timestamp,
}

/// Read-only snapshot of one market for dashboards and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketStats {
    pub market_id: MarketId,
    pub status: MarketStatus,
    pub price: Price,
    pub net_imbalance: SignedAmount,
    pub total_liquidity: Amount,
    pub total_shares: Amount,
    pub accumulated_fees: Amount,
    pub open_positions: usize,
    pub bad_debt: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("leverage {requested} exceeds market maximum {max}")]
    InvalidLeverage { requested: Leverage, max: Leverage },

    #[error("insufficient margin: offered {offered}, required {required}")]
    InsufficientMargin { offered: Amount, required: Amount },

    #[error("position {0:?} not found")]
    PositionNotFound(crate::types::PositionId),

    #[error("position {0:?} is already closed")]
    PositionAlreadyClosed(crate::types::PositionId),

    #[error("caller {caller:?} is not authorized for this operation")]
    UnauthorizedCaller { caller: AccountId },

    #[error("market {0:?} not found")]
    MarketNotFound(MarketId),

    #[error("market {0:?} is paused")]
    MarketPaused(MarketId),

    #[error("funding is paused for market {0:?}")]
    FundingPaused(MarketId),

    #[error("no funding configuration registered for market {0:?}")]
    FundingNotRegistered(MarketId),

    #[error("insufficient LP funds: required {required}, available {available}")]
    InsufficientLpFunds { required: Amount, available: Amount },

    #[error(transparent)]
    Params(#[from] ParamError),

    #[error(transparent)]
    Custody(#[from] CustodyError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}
