// 12.5 engine/liquidity.rs: LP entry and exit. share math lives in pool.rs;
// this layer orders custody against pool mutation and emits the audit trail.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{EventPayload, LiquidityAddedEvent, LiquidityRemovedEvent};
use crate::types::{AccountId, Amount, MarketId};

impl Engine {
    // 12.5.1: deposit into a market's pool. the custody debit is the last
    // fallible step; check_mint runs the mint preconditions beforehand so
    // the mint after the debit cannot reject.
    pub fn add_liquidity(
        &mut self,
        provider: AccountId,
        market_id: MarketId,
        amount: Amount,
    ) -> Result<Amount, EngineError> {
        {
            let market = self
                .markets
                .get(&market_id)
                .ok_or(EngineError::MarketNotFound(market_id))?;
            if !market.is_active() {
                return Err(EngineError::MarketPaused(market_id));
            }
            market.pool.check_mint(amount)?;
        }

        self.vault.debit(provider, amount)?;

        let market = self.markets.get_mut(&market_id).unwrap();
        let shares_minted = market.pool.mint(provider, amount)?;

        self.emit_event(EventPayload::LiquidityAdded(LiquidityAddedEvent {
            market_id,
            provider,
            amount,
            shares_minted,
        }));

        Ok(shares_minted)
    }

    // 12.5.2: burn shares for a proportional payout. burn is all-or-nothing
    // on the pool, so the custody credit only runs once it has succeeded.
    pub fn remove_liquidity(
        &mut self,
        provider: AccountId,
        market_id: MarketId,
        shares: Amount,
    ) -> Result<Amount, EngineError> {
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        if !market.is_active() {
            return Err(EngineError::MarketPaused(market_id));
        }

        let payout = market.pool.burn(provider, shares)?;
        self.vault.credit(provider, payout);

        self.emit_event(EventPayload::LiquidityRemoved(LiquidityRemovedEvent {
            market_id,
            provider,
            shares_burned: shares,
            payout,
        }));

        Ok(payout)
    }

    pub fn lp_shares(&self, provider: AccountId, market_id: MarketId) -> Result<Amount, EngineError> {
        let market = self
            .markets
            .get(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        Ok(market.pool.shares_of(&provider))
    }

    /// Value the provider's full share balance would redeem for right now.
    pub fn lp_share_value(
        &self,
        provider: AccountId,
        market_id: MarketId,
    ) -> Result<Amount, EngineError> {
        let market = self
            .markets
            .get(&market_id)
            .ok_or(EngineError::MarketNotFound(market_id))?;
        Ok(market.pool.share_value(&provider))
    }
}
