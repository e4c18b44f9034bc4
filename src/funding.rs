// 7.0: funding machinery. premium and rate arithmetic, the per-market rate
// record, outflow caps over daily and 30-day rolling windows, and the
// emergency severity ladder. value transfer itself happens in the engine.

use serde::{Deserialize, Serialize};

use crate::fixed::{muldiv, muldiv_signed, SCALE, SCALE_I};
use crate::params::ParamError;
use crate::types::{Amount, Price, SignedAmount, Timestamp};

// Cap percents are SCALE fractions of pool value. They may exceed 100%:
// a cap is a rate limiter, solvency has its own check at execution time.
pub const CAP_PERCENT_MIN: u128 = SCALE / 1000;
pub const CAP_PERCENT_MAX: u128 = 10 * SCALE;

const EMERGENCY_L1_PCT: u128 = 60;
const EMERGENCY_L2_PCT: u128 = 80;

/// Days covered by the rolling cumulative window.
pub const ROLLING_WINDOW_DAYS: u64 = 30;

// 7.1: premium = (mark - oracle) * SCALE / oracle. the divisor floors at 1
// so an oracle price of 0 (team yet to win a game) yields a huge but
// well-defined premium instead of a crash.
pub fn premium_fixed(mark: Price, oracle: Price) -> SignedAmount {
    let spread = mark.delta_from(oracle);
    let divisor = (oracle.value() as u128).max(1);
    muldiv_signed(spread, SCALE_I, divisor)
}

/// rate = premium * funding_factor / SCALE, keeping the premium's sign.
pub fn rate_from_premium(premium: SignedAmount, funding_factor: u128) -> SignedAmount {
    muldiv_signed(premium, funding_factor as i128, SCALE)
}

// 7.2: a position's funding flow at the stored rate. signed_notional is
// sign(size) * entry notional; positive rate therefore credits longs and
// debits shorts, pulling a rich mark back toward oracle truth.
pub fn position_payment(signed_notional: SignedAmount, rate: SignedAmount) -> SignedAmount {
    muldiv_signed(signed_notional, rate, SCALE)
}

/// Latest rate computation for one market. Overwritten on every update;
/// the engine's event log is the durable history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FundingRecord {
    pub rate: SignedAmount,
    pub premium: SignedAmount,
    pub oracle_price: Price,
    pub mark_price: Price,
    pub timestamp: Timestamp,
}

// 7.3: governance-set outflow limits, all SCALE fractions of pool value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingCap {
    pub daily_cap_percent: u128,
    pub cumulative_cap_percent: u128,
    pub emergency_threshold: u128,
}

impl Default for FundingCap {
    fn default() -> Self {
        Self {
            daily_cap_percent: SCALE / 20,      // 5% of pool per day
            cumulative_cap_percent: SCALE / 5,  // 20% per rolling 30 days
            emergency_threshold: SCALE / 10,    // alarms from 6% usage up
        }
    }
}

impl FundingCap {
    pub fn validate(&self) -> Result<(), ParamError> {
        for (field, value) in [
            ("daily_cap_percent", self.daily_cap_percent),
            ("cumulative_cap_percent", self.cumulative_cap_percent),
            ("emergency_threshold", self.emergency_threshold),
        ] {
            if value < CAP_PERCENT_MIN || value > CAP_PERCENT_MAX {
                return Err(ParamError::OutOfBounds {
                    field,
                    value,
                    min: CAP_PERCENT_MIN,
                    max: CAP_PERCENT_MAX,
                });
            }
        }
        Ok(())
    }
}

// 7.4: ring of per-day outflow usage, slot = day % 30. a slot left over
// from a previous cycle is reset on first touch of the new day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct DayUsage {
    day: u64,
    used: Amount,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CapUsage {
    days: [DayUsage; ROLLING_WINDOW_DAYS as usize],
}

impl CapUsage {
    pub fn record(&mut self, day: u64, amount: Amount) {
        let slot = &mut self.days[(day % ROLLING_WINDOW_DAYS) as usize];
        if slot.day != day {
            *slot = DayUsage { day, used: 0 };
        }
        slot.used = slot.used.saturating_add(amount);
    }

    pub fn used_on(&self, day: u64) -> Amount {
        let slot = &self.days[(day % ROLLING_WINDOW_DAYS) as usize];
        if slot.day == day {
            slot.used
        } else {
            0
        }
    }

    /// Total outflow over the window ending at `day`, inclusive.
    pub fn used_in_window(&self, day: u64) -> Amount {
        let cutoff = day.saturating_sub(ROLLING_WINDOW_DAYS - 1);
        self.days
            .iter()
            .filter(|slot| slot.day >= cutoff && slot.day <= day)
            .fold(0u128, |acc, slot| acc.saturating_add(slot.used))
    }
}

// 7.5: per-market coordinator state. one of these exists per registered
// market; calling funding ops against an unregistered market is an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingState {
    pub cap: FundingCap,
    pub usage: CapUsage,
    pub record: Option<FundingRecord>,
    pub paused: bool,
    pub emergency_level: u8,
}

impl FundingState {
    pub fn new(cap: FundingCap) -> Self {
        Self {
            cap,
            usage: CapUsage::default(),
            record: None,
            paused: false,
            emergency_level: 0,
        }
    }

    /// Remaining pool outflow allowed today, the tighter of the daily and
    /// rolling windows against the current pool value.
    pub fn headroom(&self, pool_value: Amount, day: u64) -> Amount {
        let daily_cap = muldiv(pool_value, self.cap.daily_cap_percent, SCALE);
        let rolling_cap = muldiv(pool_value, self.cap.cumulative_cap_percent, SCALE);
        let daily = daily_cap.saturating_sub(self.usage.used_on(day));
        let rolling = rolling_cap.saturating_sub(self.usage.used_in_window(day));
        daily.min(rolling)
    }

    // 7.6: severity from rolling usage against the emergency threshold:
    // level 1 at 60%, 2 at 80%, 3 at or past the threshold itself.
    pub fn evaluate_emergency(&self, pool_value: Amount, day: u64) -> u8 {
        let threshold = muldiv(pool_value, self.cap.emergency_threshold, SCALE);
        if threshold == 0 {
            return 0;
        }
        let used = self.usage.used_in_window(day);
        if used >= threshold {
            3
        } else if used >= muldiv(threshold, EMERGENCY_L2_PCT, 100) {
            2
        } else if used >= muldiv(threshold, EMERGENCY_L1_PCT, 100) {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premium_matches_spread_over_oracle() {
        let mark = Price::new_unchecked(650);
        let oracle = Price::new_unchecked(600);
        // 50/600 of SCALE
        assert_eq!(premium_fixed(mark, oracle), 50 * SCALE_I / 600);
        assert_eq!(premium_fixed(oracle, mark), -(50 * SCALE_I / 650));
        assert_eq!(premium_fixed(oracle, oracle), 0);
    }

    #[test]
    fn premium_survives_zero_oracle() {
        let premium = premium_fixed(Price::new_unchecked(500), Price::FLOOR);
        assert_eq!(premium, 500 * SCALE_I);
    }

    #[test]
    fn rate_scales_premium_by_factor() {
        let premium = 50 * SCALE_I / 600;
        let rate = rate_from_premium(premium, SCALE / 100);
        assert_eq!(rate, premium / 100);
        assert_eq!(rate_from_premium(-premium, SCALE / 100), -(premium / 100));
        assert_eq!(rate_from_premium(premium, 0), 0);
    }

    #[test]
    fn payment_credits_longs_on_positive_rate() {
        let rate = SCALE_I / 1000; // 0.1%
        let long = position_payment(100 * SCALE_I, rate);
        let short = position_payment(-100 * SCALE_I, rate);
        assert_eq!(long, SCALE_I / 10);
        assert_eq!(short, -SCALE_I / 10);
        // negative rate flips both
        assert_eq!(position_payment(100 * SCALE_I, -rate), -SCALE_I / 10);
    }

    #[test]
    fn cap_validation_bounds() {
        assert!(FundingCap::default().validate().is_ok());
        let too_small = FundingCap {
            daily_cap_percent: 0,
            ..FundingCap::default()
        };
        assert!(too_small.validate().is_err());
        let too_big = FundingCap {
            cumulative_cap_percent: 11 * SCALE,
            ..FundingCap::default()
        };
        assert!(too_big.validate().is_err());
    }

    #[test]
    fn usage_ring_tracks_days() {
        let mut usage = CapUsage::default();
        usage.record(0, 10);
        usage.record(0, 5);
        usage.record(29, 7);
        assert_eq!(usage.used_on(0), 15);
        assert_eq!(usage.used_on(29), 7);
        assert_eq!(usage.used_on(1), 0);
        assert_eq!(usage.used_in_window(29), 22);
    }

    #[test]
    fn usage_ring_evicts_after_thirty_days() {
        let mut usage = CapUsage::default();
        usage.record(0, 100);
        usage.record(29, 1);
        // day 30 reuses slot 0 and the window drops day 0
        usage.record(30, 2);
        assert_eq!(usage.used_on(0), 0);
        assert_eq!(usage.used_in_window(30), 3);
    }

    #[test]
    fn headroom_is_tighter_window() {
        let state = FundingState::new(FundingCap::default());
        let pool = 1_000 * SCALE;
        // untouched: daily 5% binds before rolling 20%
        assert_eq!(state.headroom(pool, 0), 50 * SCALE);

        let mut used = state.clone();
        used.usage.record(0, 40 * SCALE);
        assert_eq!(used.headroom(pool, 0), 10 * SCALE);

        // pile up usage on prior days until the rolling cap binds
        let mut rolling = state;
        for day in 0..5 {
            rolling.usage.record(day, 40 * SCALE);
        }
        // rolling: 200 capacity - 200 used = 0 even though today is fresh
        assert_eq!(rolling.headroom(pool, 5), 0);
    }

    #[test]
    fn emergency_ladder() {
        let mut state = FundingState::new(FundingCap::default());
        let pool = 1_000 * SCALE;
        // threshold value = 100; rungs at 60, 80, 100
        assert_eq!(state.evaluate_emergency(pool, 3), 0);
        state.usage.record(1, 59 * SCALE);
        assert_eq!(state.evaluate_emergency(pool, 3), 0);
        state.usage.record(2, SCALE);
        assert_eq!(state.evaluate_emergency(pool, 3), 1);
        state.usage.record(3, 20 * SCALE);
        assert_eq!(state.evaluate_emergency(pool, 3), 2);
        state.usage.record(3, 20 * SCALE);
        assert_eq!(state.evaluate_emergency(pool, 3), 3);
    }
}
