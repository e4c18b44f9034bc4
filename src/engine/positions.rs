// 12.4 engine/positions.rs: the trading surface. quoting, opening, closing,
// and the read-only margin predicates the external liquidation engine polls.

use super::core::Engine;
use super::results::{EngineError, OpenQuote};
use crate::events::{
    BadDebtEvent, CloseReason, EventPayload, PositionClosedEvent, PositionOpenedEvent,
};
use crate::fixed::{muldiv, SCALE};
use crate::market::Market;
use crate::position::{liquidation_price_for, MarginStatus, Position};
use crate::types::{
    AccountId, Amount, Leverage, MarketId, PositionId, Price, Side, SignedAmount,
};

impl Engine {
    /// Quote at the default 1x leverage.
    pub fn quote(&self, market_id: MarketId, size: SignedAmount) -> Result<OpenQuote, EngineError> {
        self.quote_with_leverage(market_id, size, Leverage::MIN)
    }

    // 12.4.1: preview an open without touching state. open_position re-derives
    // the same quote, so a caller acting on a fresh quote sees identical terms.
    pub fn quote_with_leverage(
        &self,
        market_id: MarketId,
        size: SignedAmount,
        leverage: Leverage,
    ) -> Result<OpenQuote, EngineError> {
        let market = self
            .markets
            .get(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        quote_for(market, size, leverage)
    }

    // 12.4.2: open. validations run first; the single custody debit for
    // margin + fee is the last fallible step, everything after it is
    // infallible bookkeeping.
    pub fn open_position(
        &mut self,
        trader: AccountId,
        market_id: MarketId,
        size: SignedAmount,
        margin: Amount,
        leverage: Leverage,
    ) -> Result<PositionId, EngineError> {
        let quote = {
            let market = self
                .markets
                .get(&market_id)
                .ok_or(EngineError::MarketNotFound(market_id))?;
            if !market.is_active() {
                return Err(EngineError::MarketPaused(market_id));
            }
            quote_for(market, size, leverage)?
        };
        if margin == 0 {
            return Err(EngineError::ZeroAmount);
        }
        if margin < quote.required_margin {
            return Err(EngineError::InsufficientMargin {
                offered: margin,
                required: quote.required_margin,
            });
        }

        let debit = margin.saturating_add(quote.fee);
        self.vault.debit(trader, debit)?;

        let id = PositionId(self.next_position_id);
        self.next_position_id += 1;
        let position = Position {
            id,
            owner: trader,
            market_id,
            size,
            entry_price: quote.avg_price,
            margin,
            leverage,
            opened_at: self.current_time,
            is_open: true,
        };
        let side = position.side();
        self.positions.push(position);
        self.owner_positions.entry(trader).or_default().push(id);

        let market = self.markets.get_mut(&market_id).unwrap();
        market.apply_open(size, id);
        market.pool.accrue_fee(quote.fee);

        self.emit_event(EventPayload::PositionOpened(PositionOpenedEvent {
            market_id,
            position_id: id,
            account_id: trader,
            side,
            size,
            entry_price: quote.avg_price,
            margin,
            fee: quote.fee,
            leverage,
        }));

        Ok(id)
    }

    // 12.4.3: close. pnl and fee are read at the pre-close price, before the
    // position's size leaves the imbalance. payout clamps at zero; a loss
    // past the margin is absorbed as bad debt, never passed to the pool ratio.
    pub fn close_position(
        &mut self,
        caller: AccountId,
        position_id: PositionId,
    ) -> Result<Amount, EngineError> {
        let position = self
            .position(position_id)
            .ok_or(EngineError::PositionNotFound(position_id))?
            .clone();
        if !position.is_open {
            return Err(EngineError::PositionAlreadyClosed(position_id));
        }
        if position.owner != caller {
            return Err(EngineError::UnauthorizedCaller { caller });
        }
        let market_id = position.market_id;
        let market = self
            .markets
            .get(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        if !market.is_active() {
            return Err(EngineError::MarketPaused(market_id));
        }

        let exit_price = market.current_price();
        let pnl = position.value_at(exit_price);
        let fee = muldiv(
            position.notional_at(exit_price),
            market.params.trading_fee_rate,
            SCALE,
        );
        let margin_i = i128::try_from(position.margin).unwrap_or(i128::MAX);
        let fee_i = i128::try_from(fee).unwrap_or(i128::MAX);
        let raw = margin_i.saturating_add(pnl).saturating_sub(fee_i);
        let payout = if raw > 0 { raw as u128 } else { 0 };
        let deficit = if raw < 0 { raw.unsigned_abs() } else { 0 };

        let market = self.markets.get_mut(&market_id).unwrap();
        market.apply_close(position.size, position_id);
        // the fee accrues whether or not the payout could cover it; an
        // uncovered fee is part of the recorded deficit.
        market.pool.accrue_fee(fee);
        self.deindex_owner(caller, position_id);
        if let Some(record) = self.position_mut(position_id) {
            record.is_open = false;
        }
        self.vault.credit(caller, payout);

        if deficit > 0 {
            self.record_bad_debt(market_id, deficit);
            self.emit_event(EventPayload::BadDebt(BadDebtEvent {
                market_id,
                position_id,
                account_id: caller,
                deficit,
            }));
        }
        self.emit_event(EventPayload::PositionClosed(PositionClosedEvent {
            market_id,
            position_id,
            account_id: caller,
            exit_price,
            pnl,
            fee,
            payout,
            reason: CloseReason::UserClosed,
        }));

        Ok(payout)
    }

    // 12.4.4: read surface. missing and closed ids value to zero rather
    // than erroring, so dashboards can sweep id ranges blindly.
    pub fn position_value(&self, id: PositionId) -> SignedAmount {
        let position = match self.position(id) {
            Some(p) if p.is_open => p,
            _ => return 0,
        };
        let market = match self.markets.get(&position.market_id) {
            Some(m) => m,
            None => return 0,
        };
        position.value_at(market.current_price())
    }

    /// Adequacy predicate for the external liquidation engine.
    pub fn has_adequate_margin(&self, id: PositionId) -> Result<bool, EngineError> {
        let (position, market) = self.open_position_and_market(id)?;
        Ok(position.has_adequate_margin_at(market.current_price(), &market.params))
    }

    pub fn margin_status(&self, id: PositionId) -> Result<MarginStatus, EngineError> {
        let (position, market) = self.open_position_and_market(id)?;
        Ok(position.margin_status_at(market.current_price(), &market.params))
    }

    pub fn liquidation_price(&self, id: PositionId) -> Result<Price, EngineError> {
        let (position, market) = self.open_position_and_market(id)?;
        Ok(position.liquidation_price(&market.params))
    }

    fn open_position_and_market(
        &self,
        id: PositionId,
    ) -> Result<(&Position, &Market), EngineError> {
        let position = self
            .position(id)
            .ok_or(EngineError::PositionNotFound(id))?;
        if !position.is_open {
            return Err(EngineError::PositionAlreadyClosed(id));
        }
        let market = self
            .markets
            .get(&position.market_id)
            .ok_or(EngineError::MarketNotFound(position.market_id))?;
        Ok((position, market))
    }

    pub(super) fn deindex_owner(&mut self, owner: AccountId, id: PositionId) {
        if let Some(list) = self.owner_positions.get_mut(&owner) {
            if let Some(at) = list.iter().position(|p| *p == id) {
                list.swap_remove(at);
            }
        }
    }
}

// 12.4.5: quote arithmetic, shared by the preview and the open path.
fn quote_for(
    market: &Market,
    size: SignedAmount,
    leverage: Leverage,
) -> Result<OpenQuote, EngineError> {
    if size == 0 {
        return Err(EngineError::ZeroAmount);
    }
    let max = market.params.max_leverage;
    if leverage > max {
        return Err(EngineError::InvalidLeverage {
            requested: leverage,
            max,
        });
    }
    let current_price = market.current_price();
    let new_price = market.price_after(size);
    let avg_price = current_price.midpoint(new_price);
    let price_impact = new_price.abs_diff(current_price);
    let notional = muldiv(
        size.unsigned_abs(),
        avg_price.value() as u128,
        Price::TICKS as u128,
    );
    let required_margin = muldiv(
        notional,
        market.params.min_margin_ratio,
        SCALE * leverage.value() as u128,
    );
    let fee = muldiv(notional, market.params.trading_fee_rate, SCALE);
    let side = if size > 0 { Side::Long } else { Side::Short };
    let liquidation_price = liquidation_price_for(side, avg_price, leverage, &market.params);
    Ok(OpenQuote {
        current_price,
        new_price,
        avg_price,
        price_impact,
        notional,
        required_margin,
        fee,
        liquidation_price,
    })
}
