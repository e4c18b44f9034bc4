//! Win-percentage perpetuals simulation.
//!
//! Walks the full engine lifecycle: market bootstrap, leveraged trading
//! against the tanh curve, LP economics, the funding cycle with caps and
//! force-closes, and the margin health surface.

use winperp_core::*;

const ADMIN: AccountId = AccountId(0);

fn main() {
    println!("Win-Percentage Perpetuals Engine Simulation");
    println!("One market per team, pooled liquidity, oracle-anchored funding\n");

    scenario_1_bootstrap_and_pricing();
    scenario_2_position_lifecycle();
    scenario_3_lp_economics();
    scenario_4_funding_cycle();
    scenario_5_funding_stress();
    scenario_6_margin_health();

    println!("\nAll simulations completed successfully.");
}

/// Scaled u128 rendered with two decimals.
fn fmt(v: Amount) -> String {
    format!("{}.{:02}", v / SCALE, (v % SCALE) / (SCALE / 100))
}

fn fmt_signed(v: SignedAmount) -> String {
    let sign = if v < 0 { "-" } else { "" };
    format!("{}{}", sign, fmt(v.unsigned_abs()))
}

/// SCALE-scaled ratio rendered as a percentage with four decimals.
fn fmt_pct(v: SignedAmount) -> String {
    let sign = if v < 0 { "-" } else { "" };
    let scaled = v.unsigned_abs() * 1_000_000 / SCALE;
    format!("{}{}.{:04}%", sign, scaled / 10_000, scaled % 10_000)
}

fn setup() -> (Engine, MarketId) {
    let mut engine = Engine::new(EngineConfig::default());
    let market_id = engine
        .add_market(ADMIN, TeamId(7), "Seattle Cascades", MarketParams::default())
        .unwrap();
    engine.set_time(Timestamp::from_secs(1_000_000));
    (engine, market_id)
}

/// Pool bootstrap and the imbalance-driven price.
fn scenario_1_bootstrap_and_pricing() {
    println!("Scenario 1: Bootstrap and Pricing\n");

    let (mut engine, market_id) = setup();
    println!("  Empty market price: {} (no liquidity, coin flip)", engine.market(market_id).unwrap().current_price());

    let lp = AccountId(10);
    engine.deposit(lp, 10_000 * SCALE).unwrap();
    engine.add_liquidity(lp, market_id, 10_000 * SCALE).unwrap();
    println!("  LP seeds 10,000.00 liquidity; price still {}", engine.market(market_id).unwrap().current_price());

    let alice = AccountId(1);
    engine.deposit(alice, 1_000 * SCALE).unwrap();
    let quote = engine.quote(market_id, 2_000 * SCALE_I).unwrap();
    println!(
        "  Quote for a 2,000 long: avg price {}, impact {} ticks, fee {}",
        quote.avg_price,
        quote.price_impact,
        fmt(quote.fee)
    );

    engine
        .open_position(alice, market_id, 2_000 * SCALE_I, 200 * SCALE, Leverage::new_unchecked(1))
        .unwrap();
    println!("  Long lands; mark moves to {}", engine.market(market_id).unwrap().current_price());

    let bob = AccountId(2);
    engine.deposit(bob, 1_000 * SCALE).unwrap();
    engine
        .open_position(bob, market_id, -2_000 * SCALE_I, 200 * SCALE, Leverage::new_unchecked(1))
        .unwrap();
    println!(
        "  Equal short flattens imbalance; mark back to {}\n",
        engine.market(market_id).unwrap().current_price()
    );
}

/// Open, watch pnl move, close with payout.
fn scenario_2_position_lifecycle() {
    println!("Scenario 2: Position Lifecycle\n");

    let (mut engine, market_id) = setup();
    let lp = AccountId(10);
    engine.deposit(lp, 50_000 * SCALE).unwrap();
    engine.add_liquidity(lp, market_id, 50_000 * SCALE).unwrap();

    let trader = AccountId(1);
    let herd = AccountId(2);
    engine.deposit(trader, 2_000 * SCALE).unwrap();
    engine.deposit(herd, 20_000 * SCALE).unwrap();

    let id = engine
        .open_position(trader, market_id, 1_000 * SCALE_I, 100 * SCALE, Leverage::new_unchecked(5))
        .unwrap();
    let entry = engine.position(id).unwrap().entry_price;
    println!("  Opened 1,000 long at {} with 100.00 margin, 5x", entry);
    println!("  Unrealized pnl: {}", fmt_signed(engine.position_value(id)));

    // a wave of longs pushes the mark up and the first long into profit
    engine
        .open_position(herd, market_id, 8_000 * SCALE_I, 2_000 * SCALE, Leverage::new_unchecked(1))
        .unwrap();
    let mark = engine.market(market_id).unwrap().current_price();
    println!("  Herd buys 8,000; mark now {}", mark);
    println!("  Unrealized pnl: {}", fmt_signed(engine.position_value(id)));

    let balance_before = engine.balance_of(trader);
    let payout = engine.close_position(trader, id).unwrap();
    println!(
        "  Closed: payout {} (balance {} -> {})",
        fmt(payout),
        fmt(balance_before),
        fmt(engine.balance_of(trader))
    );
    println!("  Closed ids value to zero: {}\n", engine.position_value(id));
}

/// Fees lift share value; proportional exits.
fn scenario_3_lp_economics() {
    println!("Scenario 3: LP Economics\n");

    let (mut engine, market_id) = setup();
    let lp1 = AccountId(10);
    let lp2 = AccountId(11);
    engine.deposit(lp1, 1_000 * SCALE).unwrap();
    engine.deposit(lp2, 500 * SCALE).unwrap();

    let s1 = engine.add_liquidity(lp1, market_id, 1_000 * SCALE).unwrap();
    let s2 = engine.add_liquidity(lp2, market_id, 500 * SCALE).unwrap();
    println!("  LP1 mints {} shares, LP2 mints {}", fmt(s1), fmt(s2));

    // churn generates fees for the pool
    let churner = AccountId(1);
    engine.deposit(churner, 10_000 * SCALE).unwrap();
    for _ in 0..5 {
        let id = engine
            .open_position(churner, market_id, 500 * SCALE_I, 100 * SCALE, Leverage::new_unchecked(1))
            .unwrap();
        engine.close_position(churner, id).unwrap();
    }

    let stats = engine.market_stats(market_id).unwrap();
    println!(
        "  After churn: pool {}, lifetime fees {}",
        fmt(stats.total_liquidity),
        fmt(stats.accumulated_fees)
    );
    println!(
        "  LP1 redeemable {}, LP2 redeemable {}",
        fmt(engine.lp_share_value(lp1, market_id).unwrap()),
        fmt(engine.lp_share_value(lp2, market_id).unwrap())
    );

    let payout = engine.remove_liquidity(lp2, market_id, s2).unwrap();
    println!("  LP2 exits fully for {} (deposited 500.00)\n", fmt(payout));
}

/// Rate update from the oracle spread, then settlement.
fn scenario_4_funding_cycle() {
    println!("Scenario 4: Funding Cycle\n");

    let (mut engine, market_id) = setup();
    let lp = AccountId(10);
    engine.deposit(lp, 20_000 * SCALE).unwrap();
    engine.add_liquidity(lp, market_id, 20_000 * SCALE).unwrap();
    engine.register_funding(ADMIN, market_id, FundingCap::default()).unwrap();

    let long = AccountId(1);
    let short = AccountId(2);
    engine.deposit(long, 5_000 * SCALE).unwrap();
    engine.deposit(short, 5_000 * SCALE).unwrap();
    // net long imbalance drags the mark above the oracle truth
    engine
        .open_position(long, market_id, 6_000 * SCALE_I, 1_500 * SCALE, Leverage::new_unchecked(1))
        .unwrap();
    let short_id = engine
        .open_position(short, market_id, -1_000 * SCALE_I, 250 * SCALE, Leverage::new_unchecked(1))
        .unwrap();

    let oracle = TableOracle::new().with_pct(TeamId(7), Price::new_unchecked(500));
    let mark = engine.market(market_id).unwrap().current_price();
    let rate = engine.update_funding_rate(ADMIN, market_id, &oracle).unwrap();
    println!("  Mark {} vs oracle 500; rate {} (positive: longs credited)", mark, fmt_pct(rate));
    println!(
        "  Short's projected flow: {}",
        fmt_signed(engine.position_funding(short_id).unwrap())
    );

    let margin_before = engine.position(short_id).unwrap().margin;
    let result = engine.execute_funding(ADMIN, market_id).unwrap();
    let margin_after = engine.position(short_id).unwrap().margin;
    println!(
        "  Executed over {} positions: net payments {}, lp side {}",
        result.position_count,
        fmt_signed(result.total_payments),
        fmt_signed(result.lp_funding)
    );
    println!(
        "  Short margin {} -> {} (debited)\n",
        fmt(margin_before),
        fmt(margin_after)
    );
}

/// Cap truncation, force-closes, and the emergency ladder.
fn scenario_5_funding_stress() {
    println!("Scenario 5: Funding Stress\n");

    let (mut engine, market_id) = setup();
    let lp = AccountId(10);
    engine.deposit(lp, 1_000 * SCALE).unwrap();
    engine.add_liquidity(lp, market_id, 1_000 * SCALE).unwrap();
    // tight caps so a single round saturates them
    let cap = FundingCap {
        daily_cap_percent: SCALE / 1000,
        cumulative_cap_percent: SCALE / 500,
        emergency_threshold: SCALE / 1000,
    };
    engine.register_funding(ADMIN, market_id, cap).unwrap();
    // crank the premium: large factor, heavy one-sided book
    engine.update_funding_factor(ADMIN, market_id, SCALE).unwrap();

    let whale = AccountId(1);
    engine.deposit(whale, 10_000 * SCALE).unwrap();
    engine
        .open_position(whale, market_id, 3_000 * SCALE_I, 750 * SCALE, Leverage::new_unchecked(1))
        .unwrap();
    // a thin short rides against the flow on the minimum margin
    let minnow = AccountId(2);
    engine.deposit(minnow, 1_000 * SCALE).unwrap();
    let thin_id = engine
        .open_position(minnow, market_id, -800 * SCALE_I, 80 * SCALE, Leverage::new_unchecked(1))
        .unwrap();

    let oracle = TableOracle::new().with_pct(TeamId(7), Price::new_unchecked(500));
    engine.update_funding_rate(ADMIN, market_id, &oracle).unwrap();
    let result = engine.execute_funding(ADMIN, market_id).unwrap();
    println!(
        "  Round 1: cap_reached={}, net payments {} (credits truncated pro-rata)",
        result.cap_reached,
        fmt_signed(result.total_payments)
    );
    println!(
        "  Thin short force-closed: {} (funding debit exceeded its margin)",
        !engine.position(thin_id).unwrap().is_open
    );
    println!("  Emergency level now {}", engine.emergency_level(market_id).unwrap());

    engine.pause_funding(ADMIN, market_id, true).unwrap();
    let paused = engine.execute_funding(ADMIN, market_id);
    println!("  While paused, execution fails: {}\n", paused.unwrap_err());
}

/// Margin status bands and liquidation prices across the leverage ladder.
fn scenario_6_margin_health() {
    println!("Scenario 6: Margin Health\n");

    let (mut engine, market_id) = setup();
    let lp = AccountId(10);
    engine.deposit(lp, 100_000 * SCALE).unwrap();
    engine.add_liquidity(lp, market_id, 100_000 * SCALE).unwrap();

    for (account, leverage) in [(AccountId(1), 2), (AccountId(2), 10), (AccountId(3), 20)] {
        engine.deposit(account, 5_000 * SCALE).unwrap();
        let quote = engine
            .quote_with_leverage(market_id, 1_000 * SCALE_I, Leverage::new_unchecked(leverage))
            .unwrap();
        let id = engine
            .open_position(
                account,
                market_id,
                1_000 * SCALE_I,
                quote.required_margin,
                Leverage::new_unchecked(leverage),
            )
            .unwrap();
        println!(
            "  {}x long: margin {}, liquidation at {}, status {:?}",
            leverage,
            fmt(quote.required_margin),
            engine.liquidation_price(id).unwrap(),
            engine.margin_status(id).unwrap()
        );
    }

    // a sell wave drags the mark a handful of ticks below the entries,
    // enough to break the leveraged longs but not the 2x
    let bear = AccountId(9);
    engine.deposit(bear, 1_000 * SCALE).unwrap();
    engine
        .open_position(bear, market_id, -2_200 * SCALE_I, 300 * SCALE, Leverage::new_unchecked(1))
        .unwrap();
    let mark = engine.market(market_id).unwrap().current_price();
    println!("  Sell wave lands; mark {}", mark);

    for (account, leverage) in [(AccountId(1), 2u32), (AccountId(2), 10), (AccountId(3), 20)] {
        let id = engine.open_positions_of(account)[0];
        println!(
            "  {}x long: adequate={}, status {:?}",
            leverage,
            engine.has_adequate_margin(id).unwrap(),
            engine.margin_status(id).unwrap()
        );
    }
    println!("  Events generated: {}", engine.events().len());
}
