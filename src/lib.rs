// winperp-core: win-percentage perpetuals engine.
// deterministic state machine for a replicated ledger: fixed-point math only,
// host-supplied time, no external I/O. same calls + same prior state produce
// byte-identical state on every replica.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: MarketId, PositionId, Side, Price, Leverage
//   2.x  fixed.rs: 1e18 fixed point, U256-widened muldiv
//   3.x  curve.rs: tanh price curve over pool imbalance
//   4.x  params.rs: bounded governance parameters
//   5.x  position.rs: leveraged positions, margin health, liquidation price
//   6.x  pool.rs: proportional LP share accounting
//   7.x  funding.rs: premium/rate math, outflow caps, emergency ladder
//   8.x  market.rs: per-team market aggregate
//   9.x  custody.rs: account collateral vault
//   10.x oracle.rs: win-percentage feed boundary
//   11.x events.rs: typed state-transition records, the audit log
//   12.x engine/: the engine: trading, liquidity, funding, governance

// math and state modules
pub mod curve;
pub mod fixed;
pub mod funding;
pub mod market;
pub mod params;
pub mod pool;
pub mod position;
pub mod types;

// integration modules
pub mod custody;
pub mod engine;
pub mod events;
pub mod oracle;

// re exports for convenience
pub use curve::*;
pub use engine::*;
pub use events::*;
pub use market::*;
pub use position::*;
pub use types::*;
pub use custody::{CustodyError, Vault};
pub use fixed::{apply_signed, muldiv, muldiv_signed, SCALE, SCALE_I};
pub use funding::{
    position_payment, premium_fixed, rate_from_premium, FundingCap, FundingRecord, FundingState,
    CAP_PERCENT_MAX, CAP_PERCENT_MIN,
};
pub use oracle::{TableOracle, WinPctOracle};
pub use params::{MarketParams, ParamError, ParamUpdate};
pub use pool::{LiquidityPool, PoolError};
