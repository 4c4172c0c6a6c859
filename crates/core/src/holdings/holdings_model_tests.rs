//! Tests for the holding cost-basis engine.

#[cfg(test)]
mod tests {
    use crate::errors::{Error, TradeError, ValidationError};
    use crate::holdings::Holding;
    use crate::money::Money;
    use crate::quotes::{Quote, QuoteStatistics};
    use chrono::NaiveDate;

    fn quote(symbol: &str, price_minor: i64) -> Quote {
        Quote::partial(symbol, "Test Corp", Money::from_minor(price_minor)).unwrap()
    }

    fn priced(symbol: &str, price_minor: i64) -> Holding {
        Holding::from_quote(&quote(symbol, price_minor))
    }

    fn full_statistics() -> QuoteStatistics {
        QuoteStatistics {
            open: Some(Money::from_major(44)),
            previous_close: Some(Money::from_major(44)),
            day_low: Some(Money::from_major(43)),
            day_high: Some(Money::from_major(46)),
            year_low: Some(Money::from_major(30)),
            year_high: Some(Money::from_major(50)),
            change_from_year_low: Some(Money::from_major(15)),
            percent_change_from_year_low: Some(50.into()),
            change_from_year_high: Some(Money::from_major(-5)),
            percent_change_from_year_high: Some((-10).into()),
            fifty_day_average: Some(Money::from_major(42)),
            change_from_fifty_day_average: Some(Money::from_major(3)),
            percent_change_from_fifty_day_average: Some(7.into()),
            two_hundred_day_average: Some(Money::from_major(40)),
            change_from_two_hundred_day_average: Some(Money::from_major(5)),
            percent_change_from_two_hundred_day_average: Some(12.into()),
            volume: Some(1_000_000),
            last_trade_date: NaiveDate::from_ymd_opt(2024, 6, 14),
            last_trade_time: chrono::NaiveTime::from_hms_opt(16, 0, 0),
        }
    }

    fn assert_zeroed(holding: &Holding) {
        assert_eq!(holding.quantity(), 0);
        assert_eq!(holding.principle(), Money::ZERO);
        assert_eq!(holding.total_value(), Money::ZERO);
        assert_eq!(holding.net(), Money::ZERO);
    }

    // ==================== Construction ====================

    #[test]
    fn test_symbol_is_normalized() {
        let holding = Holding::new(" aapl ");
        assert_eq!(holding.symbol(), "AAPL");
        assert!(holding.is_same_position(&Holding::new("AAPL")));
        assert!(!holding.is_same_position(&Holding::new("MSFT")));
        assert_zeroed(&holding);
        assert_eq!(holding.price(), None);
    }

    #[test]
    fn test_restore_rejects_inconsistent_positions() {
        assert!(Holding::restore("AAPL", 0, Money::from_major(1), Money::ZERO).is_err());
        assert!(Holding::restore("AAPL", 5, Money::from_major(-1), Money::ZERO).is_err());

        let holding =
            Holding::restore("aapl", 10, Money::from_major(450), Money::from_major(500)).unwrap();
        assert_eq!(holding.symbol(), "AAPL");
        assert_eq!(holding.total_value(), Money::from_major(500));
        assert_eq!(holding.net(), Money::from_major(50));
        assert_eq!(holding.price(), None);
    }

    // ==================== Buy ====================

    #[test]
    fn test_buy_accumulates_principle() {
        let mut holding = priced("AAPL", 4500);
        let cost = holding.buy(20).unwrap();

        assert_eq!(cost, Money::from_major(900));
        assert_eq!(holding.quantity(), 20);
        assert_eq!(holding.principle(), Money::from_major(900));
        assert_eq!(holding.total_value(), Money::from_major(900));
        assert_eq!(holding.net(), Money::ZERO);

        holding.apply_quote(&quote("AAPL", 5000)).unwrap();
        let cost = holding.buy(5).unwrap();

        assert_eq!(cost, Money::from_major(250));
        assert_eq!(holding.quantity(), 25);
        assert_eq!(holding.principle(), Money::from_major(1150));
        assert_eq!(holding.total_value(), Money::from_major(1250));
        assert_eq!(holding.net(), Money::from_major(100));
        assert_eq!(holding.average_cost(), Some(Money::from_major(46)));
    }

    #[test]
    fn test_buy_without_price_is_stale() {
        let mut holding = Holding::new("AAPL");
        let err = holding.buy(1).unwrap_err();
        assert!(matches!(err, Error::Trade(TradeError::StaleQuote(ref s)) if s == "AAPL"));
        assert_zeroed(&holding);
    }

    #[test]
    fn test_zero_quantity_is_a_no_op() {
        let mut holding = priced("AAPL", 4500);
        holding.buy(10).unwrap();
        let before = holding.clone();

        assert_eq!(holding.buy(0).unwrap(), Money::ZERO);
        assert_eq!(holding.sell(0).unwrap(), Money::ZERO);
        assert_eq!(holding, before);

        // Even an unpriced holding accepts a zero-share trade.
        let mut unpriced = Holding::new("MSFT");
        assert_eq!(unpriced.buy(0).unwrap(), Money::ZERO);
    }

    // ==================== Sell ====================

    #[test]
    fn test_sell_releases_basis_proportionally() {
        let mut holding = priced("AAPL", 4500);
        holding.buy(20).unwrap();
        holding.apply_quote(&quote("AAPL", 5000)).unwrap();
        holding.buy(5).unwrap();

        let proceeds = holding.sell(5).unwrap();

        assert_eq!(proceeds, Money::from_major(250));
        assert_eq!(holding.quantity(), 20);
        // 1150 × 5 / 25 = 230 released
        assert_eq!(holding.principle(), Money::from_major(920));
        assert_eq!(holding.total_value(), Money::from_major(1000));
        assert_eq!(holding.net(), Money::from_major(80));
    }

    #[test]
    fn test_partial_sell_does_not_truncate_ratio() {
        let mut holding = priced("XYZ", 1000);
        holding.buy(4).unwrap();

        holding.sell(1).unwrap();

        // An integer ratio of 1 / 4 would release nothing.
        assert_eq!(holding.principle(), Money::from_major(30));
    }

    #[test]
    fn test_partial_sell_rounds_once_half_even() {
        let mut holding = priced("XYZ", 3333);
        holding.buy(3).unwrap();
        holding.apply_quote(&quote("XYZ", 1)).unwrap();
        holding.buy(1).unwrap();
        // principle 100.00 over 4 shares; selling one releases 25.00
        holding.sell(1).unwrap();
        assert_eq!(holding.principle(), Money::from_major(75));

        // 75.00 × 1 / 3 = 25.00
        holding.sell(1).unwrap();
        assert_eq!(holding.principle(), Money::from_major(50));

        let mut odd = priced("ODD", 1);
        odd.buy(1).unwrap();
        odd.apply_quote(&quote("ODD", 4)).unwrap();
        odd.buy(1).unwrap();
        // principle 0.05 over 2 shares; selling one releases 0.025 → 0.02
        odd.sell(1).unwrap();
        assert_eq!(odd.principle(), Money::from_minor(3));
    }

    #[test]
    fn test_sell_all_zeroes_exactly() {
        let mut holding = priced("XYZ", 3333);
        holding.buy(3).unwrap();
        holding.apply_quote(&quote("XYZ", 1717)).unwrap();
        holding.sell(1).unwrap();

        let proceeds = holding.sell(2).unwrap();
        assert_eq!(proceeds, Money::from_minor(3434));
        assert_zeroed(&holding);
    }

    #[test]
    fn test_sell_more_than_held_is_rejected() {
        let mut holding = priced("AAPL", 4500);
        holding.buy(3).unwrap();
        let before = holding.clone();

        let err = holding.sell(4).unwrap_err();
        assert_eq!(
            err.as_trade_error(),
            Some(&TradeError::InsufficientShares {
                symbol: "AAPL".to_string(),
                requested: 4,
                held: 3,
            })
        );
        assert_eq!(holding, before);
    }

    #[test]
    fn test_sell_without_price_is_stale() {
        let mut holding =
            Holding::restore("AAPL", 10, Money::from_major(450), Money::from_major(500)).unwrap();
        let before = holding.clone();

        let err = holding.sell(1).unwrap_err();
        assert!(matches!(err, Error::Trade(TradeError::StaleQuote(_))));
        assert_eq!(holding, before);
    }

    #[test]
    fn test_buy_then_sell_round_trip_is_exact() {
        let mut holding = priced("AAPL", 4517);
        let before = holding.clone();

        let cost = holding.buy(7).unwrap();
        let proceeds = holding.sell(7).unwrap();

        assert_eq!(proceeds, Money::from_minor(4517).times(7).unwrap());
        assert_eq!(cost, proceeds);
        assert_eq!(holding.quantity(), before.quantity());
        assert_eq!(holding.principle(), before.principle());
        assert_eq!(holding.net(), before.net());
    }

    #[test]
    fn test_round_trip_at_average_cost_restores_position() {
        let mut holding = priced("AAPL", 4500);
        holding.buy(10).unwrap();
        let before = holding.clone();

        holding.buy(6).unwrap();
        holding.sell(6).unwrap();

        assert_eq!(holding.quantity(), before.quantity());
        assert_eq!(holding.principle(), before.principle());
        assert_eq!(holding.net(), before.net());
    }

    // ==================== Quotes ====================

    #[test]
    fn test_apply_quote_revalues_without_touching_basis() {
        let mut holding = priced("AAPL", 4500);
        holding.buy(10).unwrap();

        holding.apply_quote(&quote("AAPL", 4000)).unwrap();

        assert_eq!(holding.principle(), Money::from_major(450));
        assert_eq!(holding.total_value(), Money::from_major(400));
        assert_eq!(holding.net(), Money::from_major(-50));
    }

    #[test]
    fn test_apply_quote_is_idempotent() {
        let mut holding = priced("AAPL", 4500);
        holding.buy(10).unwrap();
        let full = quote("AAPL", 4700).with_statistics(full_statistics());

        holding.apply_quote(&full).unwrap();
        let once = holding.clone();
        holding.apply_quote(&full).unwrap();

        assert_eq!(holding, once);
    }

    #[test]
    fn test_partial_quote_keeps_statistics() {
        let mut holding = Holding::new("AAPL");
        holding
            .apply_quote(&quote("AAPL", 4500).with_statistics(full_statistics()))
            .unwrap();
        holding.apply_quote(&quote("AAPL", 4600)).unwrap();

        let current = holding.quote().unwrap();
        assert_eq!(current.price(), Money::from_major(46));
        assert!(current.is_full());
        assert_eq!(current.statistics().year_high, Some(Money::from_major(50)));
    }

    #[test]
    fn test_quote_for_other_symbol_is_ignored() {
        let mut holding = priced("AAPL", 4500);
        holding.apply_quote(&quote("MSFT", 30000)).unwrap();
        assert_eq!(holding.price(), Some(Money::from_major(45)));
    }

    // ==================== Merge ====================

    #[test]
    fn test_merge_from_refresh_takes_price_keeps_position() {
        let mut saved =
            Holding::restore("AAPL", 10, Money::from_major(450), Money::from_major(450)).unwrap();
        let fresh = priced("aapl", 5200);

        saved.merge_from_refresh(&fresh).unwrap();

        assert_eq!(saved.quantity(), 10);
        assert_eq!(saved.principle(), Money::from_major(450));
        assert_eq!(saved.total_value(), Money::from_major(520));
        assert_eq!(saved.net(), Money::from_major(70));
    }

    #[test]
    fn test_merge_from_refresh_rejects_other_symbol() {
        let mut saved = priced("AAPL", 4500);
        let before = saved.clone();

        let err = saved.merge_from_refresh(&priced("MSFT", 100)).unwrap_err();
        assert_eq!(
            err.as_trade_error(),
            Some(&TradeError::SymbolMismatch {
                expected: "AAPL".to_string(),
                actual: "MSFT".to_string(),
            })
        );
        assert_eq!(saved, before);
    }

    // ==================== Limits ====================

    #[test]
    fn test_share_count_overflow_is_rejected_at_zero_price() {
        let mut holding = priced("FREE", 0);
        assert_eq!(holding.buy(u64::MAX).unwrap(), Money::ZERO);
        let before = holding.clone();

        let err = holding.buy(1).unwrap_err();

        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidInput(_))
        ));
        assert_eq!(holding, before);
    }

    #[test]
    fn test_market_value_overflow_leaves_holding_unchanged() {
        let mut holding = priced("FREE", 0);
        holding.buy(u64::MAX).unwrap();
        let before = holding.clone();

        let err = holding
            .apply_quote(&quote("FREE", i64::MAX))
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidAmount(_))
        ));
        assert_eq!(holding, before);
    }

    // ==================== Serde ====================

    #[test]
    fn test_deserialize_normalizes_symbol() {
        let json = r#"{"symbol":" aapl ","quantity":3,"principle":"135.00","totalValue":"150.00","net":"0"}"#;

        let holding: Holding = serde_json::from_str(json).unwrap();

        assert_eq!(holding.symbol(), "AAPL");
        assert!(holding.is_same_position(&priced("AAPL", 4500)));
        assert_eq!(holding.net(), Money::from_major(15));
    }

    #[test]
    fn test_deserialize_rejects_invalid_positions() {
        for json in [
            r#"{"symbol":"AAPL","quantity":3,"principle":"-50.00","totalValue":"150.00","net":"0"}"#,
            r#"{"symbol":"AAPL","quantity":0,"principle":"10.00","totalValue":"0","net":"0"}"#,
            r#"{"symbol":"  ","quantity":1,"principle":"1.00","totalValue":"1.00","net":"0"}"#,
        ] {
            assert!(
                serde_json::from_str::<Holding>(json).is_err(),
                "accepted {}",
                json
            );
        }
    }

    #[test]
    fn test_serde_round_trip_keeps_quote() {
        let mut holding = priced("AAPL", 4500);
        holding.buy(4).unwrap();

        let json = serde_json::to_string(&holding).unwrap();
        let restored: Holding = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, holding);
    }

    #[test]
    fn test_deserialize_rejects_quote_for_other_symbol() {
        let mut value = serde_json::to_value(priced("AAPL", 4500)).unwrap();
        value["symbol"] = serde_json::json!("MSFT");

        assert!(serde_json::from_value::<Holding>(value).is_err());
    }
}
