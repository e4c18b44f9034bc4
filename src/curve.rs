// 3.0: the pricing curve. maps pool imbalance to a win-probability price.
// price = 500 + 500 * tanh(beta * net_imbalance / total_liquidity), clamped
// to the [0, 1000] axis. total functions, no failure path, no mutation.

use crate::fixed::{muldiv, muldiv_signed, SCALE, SCALE_I};
use crate::types::Price;

/// Saturation bound for the tanh argument. Beyond this the hyperbolic
/// tangent is within 1e-4 of its asymptote, so we pin it outright.
pub const TANH_SATURATION: i128 = 5 * SCALE_I;

// 3.1: fixed-point tanh via the rational form z*(27 + z^2) / (27 + 9*z^2),
// all terms SCALE-scaled. exact at 0 and +-3*SCALE; above 3*SCALE the form
// overshoots 1.0 slightly, and the price layer clamps, not this function.
// numerically compatible replicas must keep this exact form and bound.
pub fn tanh_fixed(z: i128) -> i128 {
    let a = z.unsigned_abs();
    if a >= TANH_SATURATION as u128 {
        return if z < 0 { -SCALE_I } else { SCALE_I };
    }
    // w = z^2 / SCALE keeps every product inside u128: a <= 5e18 so
    // a * (27*SCALE + w) tops out near 2.6e38.
    let w = muldiv(a, a, SCALE);
    let mag = muldiv(a, 27 * SCALE + w, 27 * SCALE + 9 * w);
    if z < 0 {
        -(mag as i128)
    } else {
        mag as i128
    }
}

// 3.2: price for a hypothetical imbalance. the live price is just this with
// the market's current net imbalance plugged in.
pub fn price_for_imbalance(
    sensitivity: u128,
    net_imbalance: i128,
    total_liquidity: u128,
) -> Price {
    if total_liquidity == 0 {
        return Price::CENTER;
    }
    // z = beta * imbalance / liquidity, SCALE-scaled. a saturated z just
    // saturates the tanh, so extreme imbalances stay well-defined.
    let z = muldiv_signed(sensitivity as i128, net_imbalance, total_liquidity);
    let t = tanh_fixed(z);
    let offset = muldiv_signed(Price::CENTER.value() as i128, t, SCALE);
    Price::clamped(Price::CENTER.value() as i128 + offset)
}
