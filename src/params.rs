// 4.0: governance parameters. six dials per market, each pinned inside fixed
// bounds. out-of-range updates are rejected; batch updates apply all or nothing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fixed::SCALE;
use crate::types::Leverage;

// 4.1: parameter bounds. ratios are SCALE-scaled fractions.
pub const SENSITIVITY_MIN: u128 = SCALE / 100;
pub const SENSITIVITY_MAX: u128 = 100 * SCALE;
pub const FUNDING_FACTOR_MIN: u128 = 0;
pub const FUNDING_FACTOR_MAX: u128 = SCALE;
pub const MIN_MARGIN_RATIO_MIN: u128 = SCALE / 100;
pub const MIN_MARGIN_RATIO_MAX: u128 = SCALE;
pub const TRADING_FEE_RATE_MIN: u128 = 0;
pub const TRADING_FEE_RATE_MAX: u128 = SCALE / 10;
pub const MAX_LEVERAGE_FLOOR: u32 = 1;
pub const MAX_LEVERAGE_CEIL: u32 = 100;
pub const MAINTENANCE_RATIO_MIN: u128 = SCALE / 10;
pub const MAINTENANCE_RATIO_MAX: u128 = SCALE;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("{field} out of bounds: {value} not in [{min}, {max}]")]
    OutOfBounds {
        field: &'static str,
        value: u128,
        min: u128,
        max: u128,
    },
}

// Tunable knobs of one market. All ratios are SCALE-scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParams {
    // Curve steepness beta: how hard price leans per unit of imbalance
    pub sensitivity: u128,
    // Fraction of the oracle premium charged per funding round
    pub funding_factor: u128,
    // Initial margin as a fraction of notional (before leverage division)
    pub min_margin_ratio: u128,
    // Fee charged on notional at open and close
    pub trading_fee_rate: u128,
    // Hard ceiling on position leverage
    pub max_leverage: Leverage,
    // Maintenance margin as a fraction of the initial requirement
    pub maintenance_ratio: u128,
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            sensitivity: 2 * SCALE,           // 2.0
            funding_factor: SCALE / 100,      // 1% of premium
            min_margin_ratio: SCALE / 10,     // 10%
            trading_fee_rate: SCALE / 1000,   // 0.1%
            max_leverage: Leverage::new_unchecked(20),
            maintenance_ratio: SCALE / 2,     // 50% of initial margin
        }
    }
}

impl MarketParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        for update in self.as_updates() {
            update.validate()?;
        }
        Ok(())
    }

    // Before-value of the field an update targets, for the audit record.
    pub fn current(&self, update: &ParamUpdate) -> u128 {
        match update {
            ParamUpdate::Sensitivity(_) => self.sensitivity,
            ParamUpdate::FundingFactor(_) => self.funding_factor,
            ParamUpdate::MinMarginRatio(_) => self.min_margin_ratio,
            ParamUpdate::TradingFeeRate(_) => self.trading_fee_rate,
            ParamUpdate::MaxLeverage(_) => self.max_leverage.value() as u128,
            ParamUpdate::MaintenanceRatio(_) => self.maintenance_ratio,
        }
    }

    // Caller must have validated the update first.
    pub fn apply(&mut self, update: ParamUpdate) {
        match update {
            ParamUpdate::Sensitivity(v) => self.sensitivity = v,
            ParamUpdate::FundingFactor(v) => self.funding_factor = v,
            ParamUpdate::MinMarginRatio(v) => self.min_margin_ratio = v,
            ParamUpdate::TradingFeeRate(v) => self.trading_fee_rate = v,
            ParamUpdate::MaxLeverage(v) => self.max_leverage = Leverage::new_unchecked(v),
            ParamUpdate::MaintenanceRatio(v) => self.maintenance_ratio = v,
        }
    }

    fn as_updates(&self) -> [ParamUpdate; 6] {
        [
            ParamUpdate::Sensitivity(self.sensitivity),
            ParamUpdate::FundingFactor(self.funding_factor),
            ParamUpdate::MinMarginRatio(self.min_margin_ratio),
            ParamUpdate::TradingFeeRate(self.trading_fee_rate),
            ParamUpdate::MaxLeverage(self.max_leverage.value()),
            ParamUpdate::MaintenanceRatio(self.maintenance_ratio),
        ]
    }
}

// 4.2: one pending parameter change. carries the new value; the bounds check
// lives here so single and batch setters share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamUpdate {
    Sensitivity(u128),
    FundingFactor(u128),
    MinMarginRatio(u128),
    TradingFeeRate(u128),
    MaxLeverage(u32),
    MaintenanceRatio(u128),
}

impl ParamUpdate {
    pub fn validate(&self) -> Result<(), ParamError> {
        let (field, value, min, max) = match *self {
            ParamUpdate::Sensitivity(v) => {
                ("sensitivity", v, SENSITIVITY_MIN, SENSITIVITY_MAX)
            }
            ParamUpdate::FundingFactor(v) => {
                ("funding_factor", v, FUNDING_FACTOR_MIN, FUNDING_FACTOR_MAX)
            }
            ParamUpdate::MinMarginRatio(v) => {
                ("min_margin_ratio", v, MIN_MARGIN_RATIO_MIN, MIN_MARGIN_RATIO_MAX)
            }
            ParamUpdate::TradingFeeRate(v) => {
                ("trading_fee_rate", v, TRADING_FEE_RATE_MIN, TRADING_FEE_RATE_MAX)
            }
            ParamUpdate::MaxLeverage(v) => (
                "max_leverage",
                v as u128,
                MAX_LEVERAGE_FLOOR as u128,
                MAX_LEVERAGE_CEIL as u128,
            ),
            ParamUpdate::MaintenanceRatio(v) => {
                ("maintenance_ratio", v, MAINTENANCE_RATIO_MIN, MAINTENANCE_RATIO_MAX)
            }
        };
        if value < min || value > max {
            return Err(ParamError::OutOfBounds { field, value, min, max });
        }
        Ok(())
    }

    pub fn field(&self) -> &'static str {
        match self {
            ParamUpdate::Sensitivity(_) => "sensitivity",
            ParamUpdate::FundingFactor(_) => "funding_factor",
            ParamUpdate::MinMarginRatio(_) => "min_margin_ratio",
            ParamUpdate::TradingFeeRate(_) => "trading_fee_rate",
            ParamUpdate::MaxLeverage(_) => "max_leverage",
            ParamUpdate::MaintenanceRatio(_) => "maintenance_ratio",
        }
    }

    pub fn value(&self) -> u128 {
        match *self {
            ParamUpdate::Sensitivity(v)
            | ParamUpdate::FundingFactor(v)
            | ParamUpdate::MinMarginRatio(v)
            | ParamUpdate::TradingFeeRate(v)
            | ParamUpdate::MaintenanceRatio(v) => v,
            ParamUpdate::MaxLeverage(v) => v as u128,
        }
    }
}
