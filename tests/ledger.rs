use marketbot::{
    error::MarketBotError,
    trading::{
        ledger::Ledger,
        position::{CloseReason, Side},
        TradingConfig,
    },
    util::test_util::setup_test_tracing,
};

fn ledger() -> Ledger {
    Ledger::new(TradingConfig {
        initial_balance: 100.0,
        risk_pct: 1.0,
        fee_pct: 0.0004,
        leverage: 3.0,
    })
}

#[test]
fn test_take_profit_2_wins_tie_break() {
    let _guards = setup_test_tracing("test_take_profit_2_wins_tie_break");
    let mut ledger = ledger();
    ledger
        .open_position(Side::Long, 100.0, 110.0, 120.0, 90.0)
        .unwrap();
    let outcome = ledger.evaluate_tick(125.0, 100.0).unwrap();
    assert_eq!(outcome.reason, CloseReason::TakeProfit2);
    assert_eq!(ledger.account().trades[0].exit_price, 125.0);
}

#[test]
fn test_sizing_from_risk_and_leverage() {
    let mut ledger = ledger();
    let position = ledger
        .open_position(Side::Long, 100.0, 105.0, 110.0, 95.0)
        .unwrap();
    assert_eq!(position.quantity, 0.6);
    assert!((position.entry_fee - 100.0 * 0.6 * 0.0004).abs() < 1e-12);
}

#[test]
fn test_non_matching_tick_only_moves_peak() {
    let _guards = setup_test_tracing("test_non_matching_tick_only_moves_peak");
    let mut ledger = ledger();
    ledger
        .open_position(Side::Long, 100.0, 110.0, 120.0, 90.0)
        .unwrap();
    let before = ledger.account().clone();

    assert!(ledger.evaluate_tick(105.0, 150.0).is_none());

    let after = ledger.account();
    assert_eq!(after.balance, before.balance);
    assert_eq!(after.equity, before.equity);
    assert_eq!(after.trades, before.trades);
    let open = after.open.as_ref().unwrap();
    assert_eq!(open.peak_equity, 150.0);
    assert_eq!(open.entry_price, 100.0);
}

#[test]
fn test_flat_tick_is_a_no_op() {
    let mut ledger = ledger();
    let before = ledger.clone();
    assert!(ledger.evaluate_tick(1.0, 1_000.0).is_none());
    assert_eq!(ledger, before);
}

#[test]
fn test_balance_moves_only_on_close() {
    let mut ledger = ledger();
    ledger
        .open_position(Side::Short, 100.0, 95.0, 90.0, 105.0)
        .unwrap();
    assert_eq!(ledger.account().balance, 100.0);
    ledger.evaluate_tick(101.0, 100.0);
    assert_eq!(ledger.account().balance, 100.0);

    let outcome = ledger.evaluate_tick(94.0, 100.0).unwrap();
    assert_eq!(outcome.reason, CloseReason::TakeProfit1);
    assert!(ledger.account().balance > 100.0);
    assert_eq!(ledger.account().equity, ledger.account().balance);
}

#[test]
fn test_two_opens_without_close() {
    let mut ledger = ledger();
    ledger
        .open_position(Side::Long, 100.0, 105.0, 110.0, 95.0)
        .unwrap();
    let err = ledger
        .open_position(Side::Long, 101.0, 106.0, 111.0, 96.0)
        .unwrap_err();
    assert!(matches!(err, MarketBotError::PositionAlreadyOpen { .. }));
    assert_eq!(ledger.account().open.as_ref().unwrap().entry_price, 100.0);
}

#[test]
fn test_stats_after_round_trips() {
    let _guards = setup_test_tracing("test_stats_after_round_trips");
    let mut ledger = Ledger::new(TradingConfig {
        fee_pct: 0.0,
        leverage: 1.0,
        ..TradingConfig::default()
    });

    // qty 1 each: +5 then -5
    ledger
        .open_position(Side::Long, 100.0, 105.0, 110.0, 99.0)
        .unwrap();
    ledger.evaluate_tick(105.0, 100.0).unwrap();
    ledger
        .open_position(Side::Long, 100.0, 105.0, 110.0, 98.95)
        .unwrap();
    ledger.close_position(95.0, CloseReason::Manual).unwrap();

    let stats = ledger.stats();
    assert_eq!(stats.trade_count, 2);
    assert_eq!(stats.win_rate, 50.0);
    assert!(stats.open.is_none());
    assert_eq!(stats.balance, ledger.account().balance);
    assert!(stats.max_drawdown > 0.0);
}
