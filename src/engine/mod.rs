// 12.0: the engine. owns every market, the position arena, the custody
// vault, and the funding coordinator state; exposes the whole operation
// surface. deterministic and event-logged with no external I/O.

mod config;
mod core;
mod positions;
mod liquidity;
mod funding;
mod governance;
mod results;

pub use config::EngineConfig;
pub use core::Engine;
pub use results::{EngineError, FundingExecution, MarketStats, OpenQuote};
