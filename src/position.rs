// 5.0: leveraged position records. pnl = size * (price - entry) / 1000 * leverage.
// positions are created by open, mutated only by close, force-close, and
// funding margin deltas. once is_open flips false the record is frozen.

use serde::{Deserialize, Serialize};

use crate::fixed::{muldiv, muldiv_signed, SCALE};
use crate::params::MarketParams;
use crate::types::{AccountId, Amount, Leverage, MarketId, Price, PositionId, Side, SignedAmount, Timestamp};

// Warning band sits 20% above the maintenance requirement.
const WARNING_NUM: u128 = 12;
const WARNING_DEN: u128 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub owner: AccountId,
    pub market_id: MarketId,
    // Signed, nonzero, SCALE-scaled. Positive = long.
    pub size: SignedAmount,
    pub entry_price: Price,
    pub margin: Amount,
    pub leverage: Leverage,
    pub opened_at: Timestamp,
    pub is_open: bool,
}

// 5.1: margin health buckets. Warning is advisory; only Liquidatable
// fails the adequacy predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarginStatus {
    Healthy,
    Warning,
    Liquidatable,
}

impl Position {
    // size is nonzero by construction, so the zero arm never fires.
    pub fn side(&self) -> Side {
        if self.size >= 0 {
            Side::Long
        } else {
            Side::Short
        }
    }

    pub fn abs_size(&self) -> Amount {
        self.size.unsigned_abs()
    }

    /// Exposure in value terms at the given price: |size| * price / 1000.
    pub fn notional_at(&self, price: Price) -> Amount {
        muldiv(self.abs_size(), price.value() as u128, Price::TICKS as u128)
    }

    /// Exposure at the entry price. Margin, maintenance and funding all
    /// key off this stable basis rather than the moving mark.
    pub fn entry_notional(&self) -> Amount {
        self.notional_at(self.entry_price)
    }

    // 5.2: leveraged unrealized pnl at a price.
    pub fn value_at(&self, price: Price) -> SignedAmount {
        let delta = price.delta_from(self.entry_price);
        let base = muldiv_signed(self.size, delta, Price::TICKS as u128);
        base.saturating_mul(self.leverage.value() as i128)
    }

    pub fn equity_at(&self, price: Price) -> SignedAmount {
        let margin = i128::try_from(self.margin).unwrap_or(i128::MAX);
        margin.saturating_add(self.value_at(price))
    }

    // 5.3: maintenance requirement. two SCALE-scaled ratios stack, so the
    // product divides by SCALE twice (once here, once with leverage).
    pub fn maintenance_margin(&self, params: &MarketParams) -> Amount {
        let initial = muldiv(self.entry_notional(), params.min_margin_ratio, SCALE);
        muldiv(
            initial,
            params.maintenance_ratio,
            SCALE * self.leverage.value() as u128,
        )
    }

    /// The sole predicate an external liquidation engine consumes.
    pub fn has_adequate_margin_at(&self, price: Price, params: &MarketParams) -> bool {
        let maintenance = i128::try_from(self.maintenance_margin(params)).unwrap_or(i128::MAX);
        self.equity_at(price) >= maintenance
    }

    pub fn margin_status_at(&self, price: Price, params: &MarketParams) -> MarginStatus {
        let maintenance = self.maintenance_margin(params);
        let warning = muldiv(maintenance, WARNING_NUM, WARNING_DEN);
        let equity = self.equity_at(price);
        if equity < i128::try_from(maintenance).unwrap_or(i128::MAX) {
            MarginStatus::Liquidatable
        } else if equity < i128::try_from(warning).unwrap_or(i128::MAX) {
            MarginStatus::Warning
        } else {
            MarginStatus::Healthy
        }
    }

    // 5.4: the price at which maintenance is breached.
    pub fn liquidation_price(&self, params: &MarketParams) -> Price {
        liquidation_price_for(self.side(), self.entry_price, self.leverage, params)
    }
}

/// Liquidation price from raw terms: entry shifted by
/// entry * maintenance_ratio * min_margin_ratio / leverage, toward 0 for
/// longs and toward 1000 for shorts. Quoting uses this before any
/// position exists.
pub fn liquidation_price_for(
    side: Side,
    entry_price: Price,
    leverage: Leverage,
    params: &MarketParams,
) -> Price {
    let ratio = muldiv(params.maintenance_ratio, params.min_margin_ratio, SCALE);
    let shift = muldiv(
        entry_price.value() as u128,
        ratio,
        SCALE * leverage.value() as u128,
    ) as i128;
    let entry = entry_price.value() as i128;
    match side {
        Side::Long => Price::clamped(entry - shift),
        Side::Short => Price::clamped(entry + shift),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::SCALE_I;

    fn params() -> MarketParams {
        MarketParams {
            min_margin_ratio: SCALE / 10,  // 10%
            maintenance_ratio: SCALE / 2,  // 50% of initial
            ..MarketParams::default()
        }
    }

    fn long_position() -> Position {
        Position {
            id: PositionId(1),
            owner: AccountId(7),
            market_id: MarketId(1),
            size: 100 * SCALE_I, // long 100 units
            entry_price: Price::new_unchecked(500),
            margin: 2 * SCALE,
            leverage: Leverage::new_unchecked(5),
            opened_at: Timestamp::from_secs(0),
            is_open: true,
        }
    }

    fn short_position() -> Position {
        Position {
            size: -100 * SCALE_I,
            ..long_position()
        }
    }

    #[test]
    fn sides() {
        assert_eq!(long_position().side(), Side::Long);
        assert_eq!(short_position().side(), Side::Short);
    }

    #[test]
    fn notional_scales_with_price() {
        let pos = long_position();
        assert_eq!(pos.entry_notional(), 50 * SCALE); // 100 * 500/1000
        assert_eq!(pos.notional_at(Price::new_unchecked(600)), 60 * SCALE);
        assert_eq!(pos.notional_at(Price::FLOOR), 0);
    }

    #[test]
    fn value_amplified_by_leverage() {
        let pos = long_position();
        // +20 ticks = +2 units base pnl, 5x leverage
        assert_eq!(pos.value_at(Price::new_unchecked(520)), 10 * SCALE_I);
        assert_eq!(pos.value_at(Price::new_unchecked(480)), -10 * SCALE_I);
        assert_eq!(pos.value_at(Price::new_unchecked(500)), 0);
    }

    #[test]
    fn short_value_mirrors_long() {
        let pos = short_position();
        assert_eq!(pos.value_at(Price::new_unchecked(480)), 10 * SCALE_I);
        assert_eq!(pos.value_at(Price::new_unchecked(520)), -10 * SCALE_I);
    }

    #[test]
    fn maintenance_margin_formula() {
        let pos = long_position();
        // 50 * 10% * 50% / 5 = 0.5
        assert_eq!(pos.maintenance_margin(&params()), SCALE / 2);
    }

    #[test]
    fn adequacy_thresholds() {
        let pos = long_position();
        let p = params();
        // equity = 2 + 0.5 * delta_ticks
        assert!(pos.has_adequate_margin_at(Price::new_unchecked(497), &p));
        assert!(!pos.has_adequate_margin_at(Price::new_unchecked(496), &p));
    }

    #[test]
    fn margin_status_bands() {
        let pos = long_position();
        let p = params();
        assert_eq!(
            pos.margin_status_at(Price::new_unchecked(498), &p),
            MarginStatus::Healthy
        );
        // equity exactly at maintenance: adequate but inside the 120% band
        assert_eq!(
            pos.margin_status_at(Price::new_unchecked(497), &p),
            MarginStatus::Warning
        );
        assert_eq!(
            pos.margin_status_at(Price::new_unchecked(496), &p),
            MarginStatus::Liquidatable
        );
    }

    #[test]
    fn liquidation_price_long_and_short() {
        let p = params();
        // shift = 500 * (0.5 * 0.1) / 5 = 5 ticks
        assert_eq!(long_position().liquidation_price(&p).value(), 495);
        assert_eq!(short_position().liquidation_price(&p).value(), 505);
    }

    #[test]
    fn liquidation_price_clamps_to_axis() {
        let mut pos = long_position();
        pos.leverage = Leverage::new_unchecked(1);
        pos.entry_price = Price::new_unchecked(10);
        let mut p = params();
        p.min_margin_ratio = SCALE; // 100%
        p.maintenance_ratio = SCALE; // shift = entry * 1.0
        assert_eq!(pos.liquidation_price(&p), Price::FLOOR);

        let mut short = short_position();
        short.leverage = Leverage::new_unchecked(1);
        short.entry_price = Price::new_unchecked(990);
        assert_eq!(short.liquidation_price(&p), Price::CEIL);
    }
}
