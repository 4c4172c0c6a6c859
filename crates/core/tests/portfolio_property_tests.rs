//! Property-based integration tests for the portfolio valuation cascade.
//!
//! Random sequences of quotes, trades and cash changes are applied to a
//! portfolio; after every step the derived totals must agree with cash and
//! holdings, and rejected operations must leave no trace.

use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use stockfolio_core::events::MockPortfolioEventSink;
use stockfolio_core::{Holding, Money, Portfolio, Quote};

const SYMBOLS: [&str; 4] = ["AAPL", "MSFT", "IBM", "GOOG"];

// =============================================================================
// Generators
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Quote { symbol: usize, cents: i64 },
    Buy { symbol: usize, quantity: u64 },
    Sell { symbol: usize, quantity: u64 },
    SetCash { cents: i64 },
}

fn arb_op() -> impl Strategy<Value = Op> {
    let symbol = 0..SYMBOLS.len();
    prop_oneof![
        (symbol.clone(), 1i64..50_000).prop_map(|(symbol, cents)| Op::Quote { symbol, cents }),
        (symbol.clone(), 0u64..40).prop_map(|(symbol, quantity)| Op::Buy { symbol, quantity }),
        (symbol, 0u64..40).prop_map(|(symbol, quantity)| Op::Sell { symbol, quantity }),
        (0i64..2_000_000).prop_map(|cents| Op::SetCash { cents }),
    ]
}

fn apply(portfolio: &Portfolio, op: &Op) -> bool {
    match *op {
        Op::Quote { symbol, cents } => {
            let quote = Quote::partial(SYMBOLS[symbol], "Test", Money::from_minor(cents)).unwrap();
            portfolio.apply_quote(&quote).is_ok()
        }
        Op::Buy { symbol, quantity } => portfolio.buy_shares(SYMBOLS[symbol], quantity).is_ok(),
        Op::Sell { symbol, quantity } => portfolio.sell_shares(SYMBOLS[symbol], quantity).is_ok(),
        Op::SetCash { cents } => portfolio
            .set_cash_balance(Money::from_minor(cents))
            .is_ok(),
    }
}

fn check_cascade(portfolio: &Portfolio) -> Result<(), TestCaseError> {
    let snapshot = portfolio.snapshot().unwrap();
    let stock_value: Money = snapshot.holdings.iter().map(|h| h.total_value).sum();

    prop_assert_eq!(snapshot.total_stock_value, stock_value);
    prop_assert_eq!(snapshot.net_worth, snapshot.cash_balance + stock_value);
    prop_assert_eq!(
        snapshot.change_in_net_worth,
        snapshot.net_worth - snapshot.initial_value
    );
    for holding in &snapshot.holdings {
        prop_assert!(holding.quantity > 0);
        prop_assert!(!holding.principle.is_negative());
        prop_assert_eq!(holding.net, holding.total_value - holding.principle);
    }
    Ok(())
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Derived totals stay consistent after every operation.
    #[test]
    fn prop_cascade_holds_after_every_step(ops in prop::collection::vec(arb_op(), 1..60)) {
        let portfolio = Portfolio::new("Prop");
        portfolio.initialize(Money::from_major(10_000)).unwrap();

        for op in &ops {
            apply(&portfolio, op);
            check_cascade(&portfolio)?;
        }
    }

    /// A rejected operation changes nothing and notifies nobody.
    #[test]
    fn prop_rejected_operations_leave_no_trace(ops in prop::collection::vec(arb_op(), 1..60)) {
        let sink = MockPortfolioEventSink::new();
        let portfolio = Portfolio::new("Prop").with_event_sink(Arc::new(sink.clone()));
        portfolio.initialize(Money::from_major(1_000)).unwrap();

        for op in &ops {
            let before = portfolio.snapshot().unwrap();
            sink.clear();
            if !apply(&portfolio, op) {
                prop_assert_eq!(portfolio.snapshot().unwrap(), before);
                prop_assert!(sink.is_empty());
            }
        }
    }

    /// Event versions increase by one across the life of the portfolio.
    #[test]
    fn prop_event_versions_are_contiguous(ops in prop::collection::vec(arb_op(), 1..40)) {
        let sink = MockPortfolioEventSink::new();
        let portfolio = Portfolio::new("Prop").with_event_sink(Arc::new(sink.clone()));
        portfolio.initialize(Money::from_major(10_000)).unwrap();

        for op in &ops {
            apply(&portfolio, op);
        }

        let versions: Vec<u64> = sink.events().iter().map(|e| e.version).collect();
        let expected: Vec<u64> = (1..=versions.len() as u64).collect();
        prop_assert_eq!(versions, expected);
    }

    /// Buying and then selling everything at one price returns the cash.
    #[test]
    fn prop_round_trip_at_constant_price_is_neutral(
        cents in 1i64..100_000,
        lots in prop::collection::vec(1u64..20, 1..6),
    ) {
        let portfolio = Portfolio::new("Prop");
        portfolio.initialize(Money::from_major(1_000_000)).unwrap();
        portfolio
            .apply_quote(&Quote::partial("AAPL", "Apple", Money::from_minor(cents)).unwrap())
            .unwrap();

        for lot in &lots {
            portfolio.buy_shares("AAPL", *lot).unwrap();
        }
        let held: u64 = lots.iter().sum();
        portfolio.sell_shares("AAPL", held).unwrap();

        prop_assert_eq!(portfolio.cash_balance().unwrap(), Money::from_major(1_000_000));
        prop_assert!(portfolio.holdings().unwrap().is_empty());
        prop_assert_eq!(portfolio.change_in_net_worth().unwrap(), Money::ZERO);
    }

    /// Partial sells never release more cost basis than was paid.
    #[test]
    fn prop_partial_sells_conserve_principle(
        cents in 1i64..100_000,
        bought in 1u64..200,
        sells in prop::collection::vec(1u64..50, 1..8),
    ) {
        let mut holding = Holding::from_quote(
            &Quote::partial("AAPL", "Apple", Money::from_minor(cents)).unwrap(),
        );
        let paid = holding.buy(bought).unwrap();

        for quantity in sells {
            if quantity > holding.quantity() {
                break;
            }
            holding.sell(quantity).unwrap();
            prop_assert!(!holding.principle().is_negative());
            prop_assert!(holding.principle() <= paid);
        }
        if holding.quantity() == 0 {
            prop_assert_eq!(holding.principle(), Money::ZERO);
        }
    }
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn concurrent_trades_keep_totals_consistent() {
    let portfolio = Arc::new(Portfolio::new("Shared"));
    portfolio.initialize(Money::from_major(100_000)).unwrap();
    for symbol in SYMBOLS {
        portfolio
            .apply_quote(&Quote::partial(symbol, symbol, Money::from_major(10)).unwrap())
            .unwrap();
    }

    let handles: Vec<_> = SYMBOLS
        .into_iter()
        .map(|symbol| {
            let portfolio = Arc::clone(&portfolio);
            thread::spawn(move || {
                for _ in 0..100 {
                    portfolio.buy_shares(symbol, 2).unwrap();
                    portfolio.sell_shares(symbol, 1).unwrap();
                    let snapshot = portfolio.snapshot().unwrap();
                    assert_eq!(
                        snapshot.net_worth,
                        snapshot.cash_balance + snapshot.total_stock_value
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for symbol in SYMBOLS {
        assert_eq!(portfolio.holding(symbol).unwrap().unwrap().quantity(), 100);
    }
    assert_eq!(
        portfolio.cash_balance().unwrap(),
        Money::from_major(100_000 - 4 * 100 * 10)
    );
    assert_eq!(portfolio.net_worth().unwrap(), Money::from_major(100_000));
}
