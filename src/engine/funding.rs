// 12.6 engine/funding.rs: the funding cycle. cap registration, oracle-driven
// rate updates, the two-phase settlement pass with pro-rata cap truncation
// and force-closes, and the pause / emergency controls.

use super::core::Engine;
use super::results::{EngineError, FundingExecution};
use crate::events::{
    BadDebtEvent, CloseReason, EmergencyLevelChangedEvent, EventPayload, FundingExecutedEvent,
    FundingPauseSetEvent, FundingRateUpdatedEvent, FundingRegisteredEvent, PositionClosedEvent,
};
use crate::fixed::{apply_signed, muldiv};
use crate::funding::{position_payment, premium_fixed, rate_from_premium, FundingCap, FundingRecord};
use crate::market::MarketStatus;
use crate::oracle::WinPctOracle;
use crate::params::ParamError;
use crate::types::{AccountId, Amount, MarketId, PositionId, SignedAmount};

/// Highest admin-triggerable emergency severity.
const EMERGENCY_LEVEL_MAX: u8 = 3;

// Planned force-close, computed in phase 1 and applied verbatim in phase 2.
struct ForcedClose {
    id: PositionId,
    owner: AccountId,
    size: SignedAmount,
    pnl: SignedAmount,
    payout: Amount,
    deficit: Amount,
}

impl Engine {
    // 12.6.1: register (or re-register) a market with the coordinator.
    // Re-registration replaces the cap but keeps accumulated usage, so
    // governance cannot reset the windows by re-registering.
    pub fn register_funding(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        cap: FundingCap,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        if !self.markets.contains_key(&market_id) {
            return Err(EngineError::MarketNotFound(market_id));
        }
        cap.validate()?;
        match self.funding.get_mut(&market_id) {
            Some(state) => state.cap = cap,
            None => {
                self.funding
                    .insert(market_id, crate::funding::FundingState::new(cap));
            }
        }
        self.emit_event(EventPayload::FundingRegistered(FundingRegisteredEvent {
            market_id,
            daily_cap_percent: cap.daily_cap_percent,
            cumulative_cap_percent: cap.cumulative_cap_percent,
            emergency_threshold: cap.emergency_threshold,
        }));
        Ok(())
    }

    // 12.6.2: recompute the rate from the live mark and the oracle truth.
    // Overwrites the market's FundingRecord; the event log keeps history.
    pub fn update_funding_rate(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        oracle: &dyn WinPctOracle,
    ) -> Result<SignedAmount, EngineError> {
        self.require_funding_trigger(caller)?;
        if !self.funding.contains_key(&market_id) {
            return Err(EngineError::FundingNotRegistered(market_id));
        }
        let market = self
            .markets
            .get(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let mark_price = market.current_price();
        let oracle_price = oracle.team_win_pct(market.team);
        let premium = premium_fixed(mark_price, oracle_price);
        let rate = rate_from_premium(premium, market.params.funding_factor);

        let state = self.funding.get_mut(&market_id).unwrap();
        state.record = Some(FundingRecord {
            rate,
            premium,
            oracle_price,
            mark_price,
            timestamp: self.current_time,
        });
        self.emit_event(EventPayload::FundingRateUpdated(FundingRateUpdatedEvent {
            market_id,
            rate,
            premium,
            oracle_price,
            mark_price,
        }));
        Ok(rate)
    }

    /// Read-only projection of one position's flow at the stored rate.
    /// Positive credits the position. Zero before the first rate update.
    pub fn position_funding(&self, id: PositionId) -> Result<SignedAmount, EngineError> {
        let position = self
            .position(id)
            .ok_or(EngineError::PositionNotFound(id))?;
        if !position.is_open {
            return Err(EngineError::PositionAlreadyClosed(id));
        }
        let state = self
            .funding
            .get(&position.market_id)
            .ok_or(EngineError::FundingNotRegistered(position.market_id))?;
        let rate = state.record.map(|r| r.rate).unwrap_or(0);
        let notional = i128::try_from(position.entry_notional()).unwrap_or(i128::MAX);
        Ok(position_payment(position.side().sign() * notional, rate))
    }

    // 12.6.3: the settlement pass.
    //
    // Phase 1 is read-only: every open position's payment is computed at the
    // stored rate against its entry notional; a debit past the position's
    // margin marks it for force-close at the pre-execution price snapshot.
    // Net pool outflow above cap headroom truncates the credit side pro-rata
    // (cap_reached reports it, execution proceeds); outflow past the pool's
    // whole liquidity is the one hard failure, raised before any mutation.
    //
    // Phase 2 applies the plan: the pool transfer, margin deltas,
    // force-closes, cap usage, and the emergency level.
    pub fn execute_funding(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
    ) -> Result<FundingExecution, EngineError> {
        self.require_funding_trigger(caller)?;
        let state = self
            .funding
            .get(&market_id)
            .ok_or(EngineError::FundingNotRegistered(market_id))?;
        if state.paused {
            return Err(EngineError::FundingPaused(market_id));
        }
        let rate = state.record.map(|r| r.rate).unwrap_or(0);
        let day = self.current_time.day_index();

        let market = self
            .markets
            .get(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        let price = market.current_price();
        let pool_value = market.pool.total_liquidity;
        let headroom = state.headroom(pool_value, day);

        let mut deltas: Vec<(PositionId, SignedAmount)> = Vec::new();
        let mut forced: Vec<ForcedClose> = Vec::new();
        let mut credits_total: u128 = 0;
        let mut debits_total: u128 = 0;
        for id in &market.open_positions {
            let position = match self.position(*id) {
                Some(p) => p,
                None => continue,
            };
            let notional = i128::try_from(position.entry_notional()).unwrap_or(i128::MAX);
            let payment = position_payment(position.side().sign() * notional, rate);
            let margin_i = i128::try_from(position.margin).unwrap_or(i128::MAX);
            if payment < 0 && payment.saturating_neg() > margin_i {
                let pnl = position.value_at(price);
                let raw = margin_i.saturating_add(pnl);
                forced.push(ForcedClose {
                    id: *id,
                    owner: position.owner,
                    size: position.size,
                    pnl,
                    payout: if raw > 0 { raw as u128 } else { 0 },
                    deficit: if raw < 0 { raw.unsigned_abs() } else { 0 },
                });
            } else {
                if payment > 0 {
                    credits_total = credits_total.saturating_add(payment.unsigned_abs());
                } else {
                    debits_total = debits_total.saturating_add(payment.unsigned_abs());
                }
                deltas.push((*id, payment));
            }
        }
        let position_count = deltas.len() + forced.len();

        let mut cap_reached = false;
        if credits_total.saturating_sub(debits_total) > headroom {
            cap_reached = true;
            let target = debits_total.saturating_add(headroom);
            let original = credits_total;
            credits_total = 0;
            for (_, payment) in deltas.iter_mut() {
                if *payment > 0 {
                    let scaled = muldiv(payment.unsigned_abs(), target, original);
                    *payment = i128::try_from(scaled).unwrap_or(i128::MAX);
                    credits_total = credits_total.saturating_add(scaled);
                }
            }
        }

        let total_payments = i128::try_from(credits_total)
            .unwrap_or(i128::MAX)
            .saturating_sub(i128::try_from(debits_total).unwrap_or(i128::MAX));
        let lp_funding = total_payments.saturating_neg();

        if total_payments > 0 && total_payments.unsigned_abs() > pool_value {
            return Err(EngineError::InsufficientLpFunds {
                required: total_payments.unsigned_abs(),
                available: pool_value,
            });
        }

        // phase 2. pool transfer first; everything below cannot fail.
        let market = self.markets.get_mut(&market_id).unwrap();
        market.pool.apply_funding(lp_funding)?;

        for (id, payment) in &deltas {
            if let Some(position) = self.position_mut(*id) {
                // debits never exceed margin here (those were force-closed),
                // so None only means credit overflow: saturate.
                position.margin = apply_signed(position.margin, *payment).unwrap_or(u128::MAX);
            }
        }

        for fc in &forced {
            let market = self.markets.get_mut(&market_id).unwrap();
            market.apply_close(fc.size, fc.id);
            self.deindex_owner(fc.owner, fc.id);
            if let Some(position) = self.position_mut(fc.id) {
                position.is_open = false;
            }
            self.vault.credit(fc.owner, fc.payout);
            if fc.deficit > 0 {
                self.record_bad_debt(market_id, fc.deficit);
                self.emit_event(EventPayload::BadDebt(BadDebtEvent {
                    market_id,
                    position_id: fc.id,
                    account_id: fc.owner,
                    deficit: fc.deficit,
                }));
            }
            self.emit_event(EventPayload::PositionClosed(PositionClosedEvent {
                market_id,
                position_id: fc.id,
                account_id: fc.owner,
                exit_price: price,
                pnl: fc.pnl,
                fee: 0,
                payout: fc.payout,
                reason: CloseReason::ForceFunding,
            }));
        }

        let outflow = if total_payments > 0 {
            total_payments.unsigned_abs()
        } else {
            0
        };
        let pool_value_after = self.markets.get(&market_id).unwrap().pool.total_liquidity;
        let state = self.funding.get_mut(&market_id).unwrap();
        if outflow > 0 {
            state.usage.record(day, outflow);
        }
        let previous = state.emergency_level;
        let level = state.evaluate_emergency(pool_value_after, day);
        state.emergency_level = level;
        if level != previous {
            self.emit_event(EventPayload::EmergencyLevelChanged(
                EmergencyLevelChangedEvent {
                    market_id,
                    previous,
                    level,
                },
            ));
        }

        self.emit_event(EventPayload::FundingExecuted(FundingExecutedEvent {
            market_id,
            total_payments,
            lp_funding,
            position_count,
            force_closed: forced.len(),
            cap_reached,
        }));

        Ok(FundingExecution {
            total_payments,
            lp_funding,
            position_count,
            cap_reached,
            execution_time: self.current_time,
        })
    }

    // 12.6.4: pause toggle. a paused coordinator still accepts rate updates;
    // only execute_funding is blocked.
    pub fn pause_funding(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        paused: bool,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        let state = self
            .funding
            .get_mut(&market_id)
            .ok_or(EngineError::FundingNotRegistered(market_id))?;
        if state.paused == paused {
            return Ok(());
        }
        state.paused = paused;
        self.emit_event(EventPayload::FundingPauseSet(FundingPauseSetEvent {
            market_id,
            paused,
        }));
        Ok(())
    }

    /// Live severity from the rolling cap usage, 0 to 3. Does not mutate;
    /// the stored level moves on execution or an explicit trigger.
    pub fn emergency_level(&self, market_id: MarketId) -> Result<u8, EngineError> {
        let state = self
            .funding
            .get(&market_id)
            .ok_or(EngineError::FundingNotRegistered(market_id))?;
        let market = self
            .markets
            .get(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        Ok(state.evaluate_emergency(market.pool.total_liquidity, self.current_time.day_index()))
    }

    // 12.6.5: explicit admin escalation. level 2 halts the funding cycle,
    // level 3 halts the market's trading surface as well. Level 0 stands
    // the coordinator down; resuming paused surfaces stays a manual step.
    pub fn trigger_emergency(
        &mut self,
        caller: AccountId,
        market_id: MarketId,
        level: u8,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        if level > EMERGENCY_LEVEL_MAX {
            return Err(EngineError::Params(ParamError::OutOfBounds {
                field: "emergency_level",
                value: level as u128,
                min: 0,
                max: EMERGENCY_LEVEL_MAX as u128,
            }));
        }
        let state = self
            .funding
            .get_mut(&market_id)
            .ok_or(EngineError::FundingNotRegistered(market_id))?;
        let previous = state.emergency_level;
        let was_paused = state.paused;
        state.emergency_level = level;
        if level >= 2 {
            state.paused = true;
        }
        let now_paused = state.paused;

        if level != previous {
            self.emit_event(EventPayload::EmergencyLevelChanged(
                EmergencyLevelChangedEvent {
                    market_id,
                    previous,
                    level,
                },
            ));
        }
        if now_paused != was_paused {
            self.emit_event(EventPayload::FundingPauseSet(FundingPauseSetEvent {
                market_id,
                paused: true,
            }));
        }
        if level >= EMERGENCY_LEVEL_MAX {
            self.set_market_status(market_id, MarketStatus::Paused)?;
        }
        Ok(())
    }
}
