// 2.0: fixed-point arithmetic over u128/i128 at a 1e18 scale.
// everything routes through U256 intermediates so a*b never overflows mid-flight.
// all results are deterministic: same inputs, same bits, on every replica.

use primitive_types::U256;

/// 1e18 scale for ratios, rates and amounts.
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// Signed twin of [`SCALE`] for rate and pnl math.
pub const SCALE_I: i128 = 1_000_000_000_000_000_000;

const I128_MAX_U: u128 = i128::MAX as u128;

// 2.1: a * b / c with a 256-bit intermediate, flooring.
// saturates at u128::MAX if the quotient itself overflows, which no reachable
// state produces (ratios stay <= SCALE, prices <= 1000). caller guarantees c != 0.
pub fn muldiv(a: u128, b: u128, c: u128) -> u128 {
    debug_assert!(c != 0);
    if c == 0 {
        return 0;
    }
    let wide = U256::from(a) * U256::from(b) / U256::from(c);
    if wide > U256::from(u128::MAX) {
        u128::MAX
    } else {
        wide.low_u128()
    }
}

// 2.2: signed a * b / c, truncating toward zero. the magnitude goes through
// muldiv, the sign is recombined after, so -7/2 yields -3 and never -4.
pub fn muldiv_signed(a: i128, b: i128, c: u128) -> i128 {
    let negative = (a < 0) != (b < 0);
    let mag = muldiv(a.unsigned_abs(), b.unsigned_abs(), c);
    if negative {
        if mag > I128_MAX_U {
            i128::MIN
        } else {
            -(mag as i128)
        }
    } else if mag > I128_MAX_U {
        i128::MAX
    } else {
        mag as i128
    }
}

// 2.3: add a signed delta to an unsigned balance. None on underflow or overflow;
// callers turn that into their own error rather than wrapping.
pub fn apply_signed(base: u128, delta: i128) -> Option<u128> {
    if delta >= 0 {
        base.checked_add(delta as u128)
    } else {
        base.checked_sub(delta.unsigned_abs())
    }
}
