// 12.3 engine/core.rs: the engine struct and its housekeeping surface.
// markets, the position arena, the custody vault, funding state and the
// event log all live here; sibling modules add the trading, liquidity,
// funding and governance operations on top.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::config::EngineConfig;
use super::results::{EngineError, MarketStats};
use crate::custody::Vault;
use crate::events::{
    DepositEvent, Event, EventId, EventPayload, MarketCreatedEvent, MarketStatusChangedEvent,
    WithdrawalEvent,
};
use crate::funding::FundingState;
use crate::market::{Market, MarketStatus};
use crate::params::MarketParams;
use crate::position::Position;
use crate::types::{AccountId, Amount, MarketId, PositionId, TeamId, Timestamp};

/** 12.3.1: all state lives here. `&mut self` on every mutating operation
is the re-entrancy guard: the borrow checker serializes invocations.
Serializable end to end, so a host can snapshot and restore the ledger. */
#[derive(Debug, Serialize, Deserialize)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) markets: HashMap<MarketId, Market>,
    pub(super) funding: HashMap<MarketId, FundingState>,
    // Arena of every position ever opened, live and closed alike.
    // PositionId(n) sits at index n-1; ids are never reused, so closed
    // records stay queryable forever.
    pub(super) positions: Vec<Position>,
    pub(super) owner_positions: HashMap<AccountId, Vec<PositionId>>,
    pub(super) vault: Vault,
    pub(super) bad_debt: HashMap<MarketId, Amount>,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) next_position_id: u64,
    pub(super) next_market_id: u32,
    pub(super) current_time: Timestamp,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            markets: HashMap::new(),
            funding: HashMap::new(),
            positions: Vec::new(),
            owner_positions: HashMap::new(),
            vault: Vault::new(),
            bad_debt: HashMap::new(),
            events: Vec::new(),
            next_event_id: 1,
            next_position_id: 1,
            next_market_id: 1,
            current_time: Timestamp::from_secs(0),
        }
    }

    // 12.3.2: ledger time. the host sets it before each batch of calls;
    // nothing in the engine ever reads a clock.
    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.current_time = Timestamp::from_secs(self.current_time.as_secs() + secs);
    }

    // 12.3.3: market lifecycle.
    pub fn add_market(
        &mut self,
        caller: AccountId,
        team: TeamId,
        name: impl Into<String>,
        params: MarketParams,
    ) -> Result<MarketId, EngineError> {
        self.require_admin(caller)?;
        params.validate()?;
        let market_id = MarketId(self.next_market_id);
        self.next_market_id += 1;
        let name = name.into();
        let market = Market::new(market_id, team, name.clone(), params, self.current_time);
        self.markets.insert(market_id, market);
        self.emit_event(EventPayload::MarketCreated(MarketCreatedEvent {
            market_id,
            team,
            name,
        }));
        Ok(market_id)
    }

    pub fn pause_market(&mut self, caller: AccountId, market_id: MarketId) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.set_market_status(market_id, MarketStatus::Paused)
    }

    pub fn resume_market(&mut self, caller: AccountId, market_id: MarketId) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.set_market_status(market_id, MarketStatus::Active)
    }

    pub(super) fn set_market_status(
        &mut self,
        market_id: MarketId,
        status: MarketStatus,
    ) -> Result<(), EngineError> {
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        if market.status == status {
            return Ok(());
        }
        market.status = status;
        self.emit_event(EventPayload::MarketStatusChanged(MarketStatusChangedEvent {
            market_id,
            status,
        }));
        Ok(())
    }

    pub fn market(&self, market_id: MarketId) -> Option<&Market> {
        self.markets.get(&market_id)
    }

    // 12.3.4: custody entry points. external deposits and withdrawals;
    // internal legs (margin debits, payouts) go through the vault directly
    // from the trading operations.
    pub fn deposit(&mut self, account_id: AccountId, amount: Amount) -> Result<Amount, EngineError> {
        let new_balance = self.vault.deposit(account_id, amount)?;
        self.emit_event(EventPayload::Deposit(DepositEvent {
            account_id,
            amount,
            new_balance,
        }));
        Ok(new_balance)
    }

    pub fn withdraw(&mut self, account_id: AccountId, amount: Amount) -> Result<Amount, EngineError> {
        let new_balance = self.vault.withdraw(account_id, amount)?;
        self.emit_event(EventPayload::Withdrawal(WithdrawalEvent {
            account_id,
            amount,
            new_balance,
        }));
        Ok(new_balance)
    }

    pub fn balance_of(&self, account_id: AccountId) -> Amount {
        self.vault.balance_of(&account_id)
    }

    // 12.3.5: position arena accessors. ids are 1-based and dense.
    pub fn position(&self, id: PositionId) -> Option<&Position> {
        if id.0 == 0 {
            return None;
        }
        self.positions.get(id.0 as usize - 1)
    }

    pub(super) fn position_mut(&mut self, id: PositionId) -> Option<&mut Position> {
        if id.0 == 0 {
            return None;
        }
        self.positions.get_mut(id.0 as usize - 1)
    }

    /// Ids of the caller's open positions, oldest first.
    pub fn open_positions_of(&self, owner: AccountId) -> &[PositionId] {
        self.owner_positions
            .get(&owner)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // 12.3.6: read surface for dashboards and hosts.
    pub fn market_stats(&self, market_id: MarketId) -> Result<MarketStats, EngineError> {
        let market = self
            .markets
            .get(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        Ok(MarketStats {
            market_id,
            status: market.status,
            price: market.current_price(),
            net_imbalance: market.net_imbalance,
            total_liquidity: market.pool.total_liquidity,
            total_shares: market.pool.total_shares,
            accumulated_fees: market.pool.accumulated_fees,
            open_positions: market.open_position_count(),
            bad_debt: self.bad_debt_of(market_id),
        })
    }

    /// Cumulative deficit absorbed on this market from closes whose losses
    /// exceeded margin. Surfaced for audit; never charged to LP shares.
    pub fn bad_debt_of(&self, market_id: MarketId) -> Amount {
        self.bad_debt.get(&market_id).copied().unwrap_or(0)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    // 12.3.7: role gates. the admin may also act as the funding trigger.
    pub(super) fn require_admin(&self, caller: AccountId) -> Result<(), EngineError> {
        if caller != self.config.admin {
            return Err(EngineError::UnauthorizedCaller { caller });
        }
        Ok(())
    }

    pub(super) fn require_funding_trigger(&self, caller: AccountId) -> Result<(), EngineError> {
        if caller != self.config.funding_trigger && caller != self.config.admin {
            return Err(EngineError::UnauthorizedCaller { caller });
        }
        Ok(())
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            println!("[Event {}] {:?}", event.id.0, event.payload);
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }

    pub(super) fn record_bad_debt(&mut self, market_id: MarketId, deficit: Amount) {
        let entry = self.bad_debt.entry(market_id).or_insert(0);
        *entry = entry.saturating_add(deficit);
    }
}
