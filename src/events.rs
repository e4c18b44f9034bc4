// 11.0: every state change produces an event. the engine's event log doubles
// as the audit history the ephemeral FundingRecord does not keep: rate
// updates and executions are replayable from here. EventPayload lists all
// event types.

use serde::{Deserialize, Serialize};

use crate::market::MarketStatus;
use crate::types::{
    AccountId, Amount, Leverage, MarketId, PositionId, Price, Side, SignedAmount, TeamId, Timestamp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Custody events
    Deposit(DepositEvent),
    Withdrawal(WithdrawalEvent),

    // Position events
    PositionOpened(PositionOpenedEvent),
    PositionClosed(PositionClosedEvent),

    // Liquidity events
    LiquidityAdded(LiquidityAddedEvent),
    LiquidityRemoved(LiquidityRemovedEvent),

    // Funding events
    FundingRegistered(FundingRegisteredEvent),
    FundingRateUpdated(FundingRateUpdatedEvent),
    FundingExecuted(FundingExecutedEvent),
    FundingPauseSet(FundingPauseSetEvent),
    EmergencyLevelChanged(EmergencyLevelChangedEvent),

    // Governance events
    MarketCreated(MarketCreatedEvent),
    MarketStatusChanged(MarketStatusChangedEvent),
    ParamUpdated(ParamUpdatedEvent),

    // Risk events
    BadDebt(BadDebtEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositEvent {
    pub account_id: AccountId,
    pub amount: Amount,
    pub new_balance: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalEvent {
    pub account_id: AccountId,
    pub amount: Amount,
    pub new_balance: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub market_id: MarketId,
    pub position_id: PositionId,
    pub account_id: AccountId,
    pub side: Side,
    pub size: SignedAmount,
    pub entry_price: Price,
    pub margin: Amount,
    pub fee: Amount,
    pub leverage: Leverage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub market_id: MarketId,
    pub position_id: PositionId,
    pub account_id: AccountId,
    pub exit_price: Price,
    pub pnl: SignedAmount,
    pub fee: Amount,
    pub payout: Amount,
    pub reason: CloseReason,
}

/// How a position left the book. Margin-inadequacy liquidation executes
/// outside this core and never produces a close here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    UserClosed,
    ForceFunding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityAddedEvent {
    pub market_id: MarketId,
    pub provider: AccountId,
    pub amount: Amount,
    pub shares_minted: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityRemovedEvent {
    pub market_id: MarketId,
    pub provider: AccountId,
    pub shares_burned: Amount,
    pub payout: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRegisteredEvent {
    pub market_id: MarketId,
    pub daily_cap_percent: u128,
    pub cumulative_cap_percent: u128,
    pub emergency_threshold: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRateUpdatedEvent {
    pub market_id: MarketId,
    pub rate: SignedAmount,
    pub premium: SignedAmount,
    pub oracle_price: Price,
    pub mark_price: Price,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingExecutedEvent {
    pub market_id: MarketId,
    pub total_payments: SignedAmount,
    pub lp_funding: SignedAmount,
    pub position_count: usize,
    pub force_closed: usize,
    pub cap_reached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingPauseSetEvent {
    pub market_id: MarketId,
    pub paused: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyLevelChangedEvent {
    pub market_id: MarketId,
    pub previous: u8,
    pub level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketCreatedEvent {
    pub market_id: MarketId,
    pub team: TeamId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketStatusChangedEvent {
    pub market_id: MarketId,
    pub status: MarketStatus,
}

/// Before/after audit record for one governance dial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamUpdatedEvent {
    pub market_id: MarketId,
    pub field: String,
    pub before: u128,
    pub after: u128,
}

/// A clamped close payout forfeited this much trader deficit. The amount is
/// absorbed, never socialized to LP shares; this record is the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadDebtEvent {
    pub market_id: MarketId,
    pub position_id: PositionId,
    pub account_id: AccountId,
    pub deficit: Amount,
}
