//! Solvency invariant tests.
//!
//! These tests verify the ledger invariants that keep the system solvent:
//! the curve input tracks the open book exactly, custody moves match the
//! quoted amounts to the unit, failed operations leave no trace, and bad
//! debt is absorbed by the house rather than socialized onto the pool.

use proptest::prelude::*;
use winperp_core::*;

const ADMIN: AccountId = AccountId(0);
const LP: AccountId = AccountId(10);
const TRADER: AccountId = AccountId(20);
const WHALE: AccountId = AccountId(21);

fn seeded_engine(liquidity: Amount) -> (Engine, MarketId) {
    let mut engine = Engine::new(EngineConfig::default());
    let market_id = engine
        .add_market(ADMIN, TeamId(1), "Harbor City Gulls", MarketParams::default())
        .unwrap();
    engine.deposit(LP, liquidity).unwrap();
    engine.add_liquidity(LP, market_id, liquidity).unwrap();
    (engine, market_id)
}

fn open_book_size(engine: &Engine, owner: AccountId) -> i128 {
    engine
        .open_positions_of(owner)
        .iter()
        .map(|id| engine.position(*id).unwrap().size)
        .sum()
}

proptest! {
    /// The curve input is exactly the sum of open sizes, through any
    /// sequence of opens and closes.
    #[test]
    fn net_imbalance_tracks_the_open_book(
        trades in proptest::collection::vec(
            (1i64..=1_000, any::<bool>(), any::<bool>()),
            1..=20,
        ),
    ) {
        let (mut engine, market_id) = seeded_engine(10_000_000 * SCALE);
        engine.deposit(TRADER, 100_000_000 * SCALE).unwrap();

        let mut opened = Vec::new();
        for (units, long, close_later) in trades {
            let size = if long { units as i128 * SCALE_I } else { -(units as i128) * SCALE_I };
            let id = engine
                .open_position(TRADER, market_id, size, 10_000 * SCALE, Leverage::MIN)
                .unwrap();
            opened.push((id, size, close_later));
        }

        let all: i128 = opened.iter().map(|(_, size, _)| size).sum();
        prop_assert_eq!(engine.market(market_id).unwrap().net_imbalance, all);
        prop_assert_eq!(open_book_size(&engine, TRADER), all);

        let mut surviving = 0i128;
        for (id, size, close_later) in &opened {
            if *close_later {
                engine.close_position(TRADER, *id).unwrap();
            } else {
                surviving += size;
            }
        }

        let market = engine.market(market_id).unwrap();
        prop_assert_eq!(
            market.net_imbalance, surviving,
            "imbalance diverged from the open book after closes"
        );
        prop_assert_eq!(open_book_size(&engine, TRADER), surviving);
        prop_assert_eq!(
            market.open_positions.len(),
            opened.iter().filter(|(_, _, close)| !close).count()
        );
    }

    /// Every custody move matches the quote to the unit: opens debit
    /// margin plus fee, closes credit exactly the clamped equity, and
    /// the pool ends up holding precisely the fees.
    #[test]
    fn custody_moves_match_quotes(
        trades in proptest::collection::vec(
            (1i64..=1_000, any::<bool>(), any::<bool>()),
            1..=10,
        ),
    ) {
        let (mut engine, market_id) = seeded_engine(10_000_000 * SCALE);
        engine.deposit(TRADER, 100_000_000 * SCALE).unwrap();
        let pool_start = engine.market(market_id).unwrap().pool.total_liquidity;

        let mut fee_total = 0u128;
        let mut opened = Vec::new();
        for (units, long, close_later) in trades {
            let size = if long { units as i128 * SCALE_I } else { -(units as i128) * SCALE_I };
            let quote = engine.quote(market_id, size).unwrap();
            let before = engine.balance_of(TRADER);
            let id = engine
                .open_position(TRADER, market_id, size, quote.required_margin, Leverage::MIN)
                .unwrap();
            prop_assert_eq!(
                before - engine.balance_of(TRADER),
                quote.required_margin + quote.fee,
                "open debited something other than margin + fee"
            );
            fee_total += quote.fee;
            if close_later {
                opened.push(id);
            }
        }

        for id in opened {
            let market = engine.market(market_id).unwrap();
            let price = market.current_price();
            let fee_rate = market.params.trading_fee_rate;
            let position = engine.position(id).unwrap().clone();
            let fee = muldiv(position.notional_at(price), fee_rate, SCALE);
            let equity = position.equity_at(price) - fee as i128;
            let expected = if equity > 0 { equity as u128 } else { 0 };

            let before = engine.balance_of(TRADER);
            let payout = engine.close_position(TRADER, id).unwrap();
            prop_assert_eq!(payout, expected, "close paid off-quote");
            prop_assert_eq!(engine.balance_of(TRADER), before + payout);
            fee_total += fee;
        }

        prop_assert_eq!(
            engine.market(market_id).unwrap().pool.total_liquidity,
            pool_start + fee_total,
            "pool liquidity drifted from the accrued fees"
        );
    }

    /// Funding settles position margins strictly against the pool:
    /// the sum of margin deltas equals the reported flow, and the pool
    /// absorbs exactly the opposite side.
    #[test]
    fn funding_settles_against_the_pool(
        longs in proptest::collection::vec(1i64..=1_000, 1..=5),
        shorts in proptest::collection::vec(1i64..=1_000, 1..=5),
        oracle_tick in 0u32..=1_000,
    ) {
        let (mut engine, market_id) = seeded_engine(10_000_000 * SCALE);
        engine.register_funding(ADMIN, market_id, FundingCap::default()).unwrap();

        let mut ids = Vec::new();
        for (offset, units) in longs.iter().chain(shorts.iter()).enumerate() {
            let account = AccountId(100 + offset as u64);
            let size = if offset < longs.len() {
                *units as i128 * SCALE_I
            } else {
                -(*units as i128) * SCALE_I
            };
            engine.deposit(account, 2_000_000 * SCALE).unwrap();
            let id = engine
                .open_position(account, market_id, size, 1_000_000 * SCALE, Leverage::MIN)
                .unwrap();
            ids.push(id);
        }

        let oracle = TableOracle::new().with_pct(TeamId(1), Price::new_unchecked(oracle_tick));
        engine.update_funding_rate(ADMIN, market_id, &oracle).unwrap();

        let margins_before: Vec<u128> =
            ids.iter().map(|id| engine.position(*id).unwrap().margin).collect();
        let pool_before = engine.market(market_id).unwrap().pool.total_liquidity;

        let result = engine.execute_funding(ADMIN, market_id).unwrap();

        prop_assert_eq!(result.position_count, ids.len());
        let margin_flow: i128 = ids
            .iter()
            .zip(&margins_before)
            .map(|(id, before)| engine.position(*id).unwrap().margin as i128 - *before as i128)
            .sum();
        prop_assert_eq!(
            margin_flow, result.total_payments,
            "margin deltas diverged from the reported flow"
        );

        let pool_after = engine.market(market_id).unwrap().pool.total_liquidity;
        prop_assert_eq!(
            pool_after as i128 - pool_before as i128,
            result.lp_funding,
            "pool did not absorb the opposite side of the flow"
        );
        for id in &ids {
            prop_assert!(engine.position(*id).unwrap().is_open, "ample margin got force-closed");
        }
    }
}

/// Deterministic scenarios with hand-worked expected values.
#[cfg(test)]
mod deterministic_solvency {
    use super::*;

    #[test]
    fn bad_debt_is_absorbed_not_socialized() {
        let (mut engine, market_id) = seeded_engine(10_000 * SCALE);

        // 20x long at the margin floor: entry notional 549, margin 2.745
        let quote = engine
            .quote_with_leverage(market_id, 1_000 * SCALE_I, Leverage::new_unchecked(20))
            .unwrap();
        engine.deposit(TRADER, quote.required_margin + quote.fee).unwrap();
        let id = engine
            .open_position(
                TRADER,
                market_id,
                1_000 * SCALE_I,
                quote.required_margin,
                Leverage::new_unchecked(20),
            )
            .unwrap();
        assert_eq!(engine.balance_of(TRADER), 0);

        // a whale short drives the mark from 598 down to 310
        engine.deposit(WHALE, 1_000 * SCALE).unwrap();
        engine
            .open_position(WHALE, market_id, -3_000 * SCALE_I, 500 * SCALE, Leverage::MIN)
            .unwrap();
        assert_eq!(
            engine.market(market_id).unwrap().current_price(),
            Price::new_unchecked(310)
        );

        // 239 ticks against a 20x position: pnl -4780 swamps the margin
        let payout = engine.close_position(TRADER, id).unwrap();
        assert_eq!(payout, 0);
        assert_eq!(engine.balance_of(TRADER), 0);
        assert!(!engine.position(id).unwrap().is_open);

        // margin 2.745 + pnl -4780 - fee 0.31 leaves a 4777.565 hole
        let deficit = 4_777_565 * (SCALE / 1000);
        assert_eq!(engine.bad_debt_of(market_id), deficit);
        assert!(engine.events().iter().any(|event| matches!(
            &event.payload,
            EventPayload::BadDebt(bad) if bad.position_id == id && bad.deficit == deficit
        )));

        // the pool holds its deposits plus every fee; the hole never
        // touches the share ratio
        let fees = (549 + 1_362 + 310) * (SCALE / 1000);
        let market = engine.market(market_id).unwrap();
        assert_eq!(market.pool.total_liquidity, 10_000 * SCALE + fees);
        assert_eq!(engine.lp_share_value(LP, market_id).unwrap(), 10_000 * SCALE + fees);
    }

    #[test]
    fn locked_margin_is_untouchable() {
        let (mut engine, market_id) = seeded_engine(10_000 * SCALE);
        engine.deposit(TRADER, 100 * SCALE).unwrap();
        engine
            .open_position(TRADER, market_id, 10 * SCALE_I, 50 * SCALE, Leverage::MIN)
            .unwrap();

        // 10 units at avg 500 cost 0.005 in fees on top of the margin
        let free = 49_995 * (SCALE / 1000);
        assert_eq!(engine.balance_of(TRADER), free);
        engine.withdraw(TRADER, free).unwrap();
        assert!(matches!(
            engine.withdraw(TRADER, 1),
            Err(EngineError::Custody(_))
        ));
        assert_eq!(engine.balance_of(TRADER), 0);
    }

    #[test]
    fn paused_market_blocks_trading_but_not_reads() {
        let (mut engine, market_id) = seeded_engine(10_000 * SCALE);
        engine.deposit(TRADER, 1_000 * SCALE).unwrap();
        let id = engine
            .open_position(TRADER, market_id, 100 * SCALE_I, 100 * SCALE, Leverage::MIN)
            .unwrap();

        engine.pause_market(ADMIN, market_id).unwrap();
        assert!(matches!(
            engine.open_position(TRADER, market_id, 10 * SCALE_I, 10 * SCALE, Leverage::MIN),
            Err(EngineError::MarketPaused(_))
        ));
        assert!(matches!(
            engine.close_position(TRADER, id),
            Err(EngineError::MarketPaused(_))
        ));
        assert!(matches!(
            engine.add_liquidity(TRADER, market_id, 10 * SCALE),
            Err(EngineError::MarketPaused(_))
        ));
        assert!(matches!(
            engine.remove_liquidity(LP, market_id, 10 * SCALE),
            Err(EngineError::MarketPaused(_))
        ));

        // pricing and stats stay readable while trading is dark
        assert!(engine.quote(market_id, 10 * SCALE_I).is_ok());
        let stats = engine.market_stats(market_id).unwrap();
        assert_eq!(stats.status, MarketStatus::Paused);

        engine.resume_market(ADMIN, market_id).unwrap();
        engine.close_position(TRADER, id).unwrap();
    }

    #[test]
    fn failed_operations_leave_no_trace() {
        let (mut engine, market_id) = seeded_engine(10_000 * SCALE);
        engine.deposit(TRADER, 100 * SCALE).unwrap();
        let quote = engine.quote(market_id, 1_000 * SCALE_I).unwrap();

        let snapshot = serde_json::to_string(&engine).unwrap();

        // rejected for margin below the floor
        assert!(engine
            .open_position(
                TRADER,
                market_id,
                1_000 * SCALE_I,
                quote.required_margin - 1,
                Leverage::MIN,
            )
            .is_err());
        // rejected for a zero size
        assert!(engine
            .open_position(TRADER, market_id, 0, 10 * SCALE, Leverage::MIN)
            .is_err());
        // rejected for leverage past the market cap
        assert!(engine
            .open_position(
                TRADER,
                market_id,
                10 * SCALE_I,
                10 * SCALE,
                Leverage::new_unchecked(21),
            )
            .is_err());
        // rejected in custody: margin clears the floor but not the balance
        assert!(engine
            .open_position(
                TRADER,
                market_id,
                1_000 * SCALE_I,
                1_000 * SCALE,
                Leverage::MIN,
            )
            .is_err());
        // rejected withdrawal past the balance
        assert!(engine.withdraw(TRADER, 200 * SCALE).is_err());

        assert_eq!(serde_json::to_string(&engine).unwrap(), snapshot);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let (mut engine, market_id) = seeded_engine(10_000 * SCALE);
        engine.register_funding(ADMIN, market_id, FundingCap::default()).unwrap();
        engine.deposit(TRADER, 1_000 * SCALE).unwrap();
        let id = engine
            .open_position(TRADER, market_id, 500 * SCALE_I, 100 * SCALE, Leverage::MIN)
            .unwrap();
        let oracle = TableOracle::new().with_pct(TeamId(1), Price::CENTER);
        engine.update_funding_rate(ADMIN, market_id, &oracle).unwrap();

        let json = serde_json::to_string(&engine).unwrap();
        let restored: Engine = serde_json::from_str(&json).unwrap();

        assert_eq!(
            restored.market(market_id).unwrap().current_price(),
            engine.market(market_id).unwrap().current_price()
        );
        assert_eq!(restored.balance_of(TRADER), engine.balance_of(TRADER));
        assert_eq!(
            restored.position(id).unwrap().margin,
            engine.position(id).unwrap().margin
        );
        assert_eq!(restored.events().len(), engine.events().len());
        assert_eq!(
            restored.market(market_id).unwrap().pool.total_liquidity,
            engine.market(market_id).unwrap().pool.total_liquidity
        );

        // the restored ledger keeps working where the old one left off
        let mut restored = restored;
        let payout = restored.close_position(TRADER, id).unwrap();
        assert!(payout > 0);
    }

    #[test]
    fn event_log_orders_the_audit_trail() {
        let mut engine = Engine::new(EngineConfig::default());
        let market_id = engine
            .add_market(ADMIN, TeamId(1), "Harbor City Gulls", MarketParams::default())
            .unwrap();
        engine.deposit(LP, 10_000 * SCALE).unwrap();
        engine.add_liquidity(LP, market_id, 10_000 * SCALE).unwrap();
        engine.deposit(TRADER, 1_000 * SCALE).unwrap();
        let id = engine
            .open_position(TRADER, market_id, 100 * SCALE_I, 100 * SCALE, Leverage::MIN)
            .unwrap();
        engine.close_position(TRADER, id).unwrap();
        engine.withdraw(TRADER, SCALE).unwrap();

        let events = engine.events();
        assert_eq!(events.len(), 7);
        assert!(matches!(events[0].payload, EventPayload::MarketCreated(_)));
        assert!(matches!(events[1].payload, EventPayload::Deposit(_)));
        assert!(matches!(events[2].payload, EventPayload::LiquidityAdded(_)));
        assert!(matches!(events[3].payload, EventPayload::Deposit(_)));
        assert!(matches!(events[4].payload, EventPayload::PositionOpened(_)));
        assert!(matches!(events[5].payload, EventPayload::PositionClosed(_)));
        assert!(matches!(events[6].payload, EventPayload::Withdrawal(_)));
        for (index, event) in events.iter().enumerate() {
            assert_eq!(event.id, EventId(index as u64 + 1), "event ids must be sequential");
        }
    }
}
