// 12.7 engine/governance.rs: admin parameter surface. six named setters
// plus an atomic batch; every applied change emits a before/after record.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{EventPayload, ParamUpdatedEvent};
use crate::params::ParamUpdate;
use crate::types::{AccountId, MarketId};

impl Engine {
    // 12.7.1: batch update, all-or-nothing. every update is bounds-checked
    // before any is applied; one bad value rejects the whole batch.
    pub fn update_params(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        updates: &[ParamUpdate],
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        if !self.markets.contains_key(&market_id) {
            return Err(EngineError::MarketNotFound(market_id));
        }
        for update in updates {
            update.validate()?;
        }

        let market = self.markets.get_mut(&market_id).unwrap();
        let mut events = Vec::with_capacity(updates.len());
        for update in updates {
            let before = market.params.current(update);
            market.params.apply(*update);
            events.push(EventPayload::ParamUpdated(ParamUpdatedEvent {
                market_id,
                field: update.field().to_string(),
                before,
                after: update.value(),
            }));
        }
        for event in events {
            self.emit_event(event);
        }
        Ok(())
    }

    pub fn update_sensitivity(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        value: u128,
    ) -> Result<(), EngineError> {
        self.update_params(caller, market_id, &[ParamUpdate::Sensitivity(value)])
    }

    pub fn update_funding_factor(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        value: u128,
    ) -> Result<(), EngineError> {
        self.update_params(caller, market_id, &[ParamUpdate::FundingFactor(value)])
    }

    pub fn update_min_margin_ratio(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        value: u128,
    ) -> Result<(), EngineError> {
        self.update_params(caller, market_id, &[ParamUpdate::MinMarginRatio(value)])
    }

    pub fn update_trading_fee_rate(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        value: u128,
    ) -> Result<(), EngineError> {
        self.update_params(caller, market_id, &[ParamUpdate::TradingFeeRate(value)])
    }

    pub fn update_max_leverage(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        value: u32,
    ) -> Result<(), EngineError> {
        self.update_params(caller, market_id, &[ParamUpdate::MaxLeverage(value)])
    }

    pub fn update_maintenance_ratio(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        value: u128,
    ) -> Result<(), EngineError> {
        self.update_params(caller, market_id, &[ParamUpdate::MaintenanceRatio(value)])
    }
}
