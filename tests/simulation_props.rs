//! Account invariants over random price paths.

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use sweeptrader::domain::combination::{Combination, TradingCosts};
use sweeptrader::domain::event::{EventKind, SimulationEvent};
use sweeptrader::domain::lot::total_amount;
use sweeptrader::domain::simulation::{Action, Simulation};
use sweeptrader::domain::strategy::{SellCondition, StrategyVariant};

fn combination(min_return: f64, percent_drop: f64, reinvest: f64, tripwire: f64) -> Combination {
    Combination {
        asset: "BTC".into(),
        strategy: StrategyVariant::Macd,
        sell_condition: SellCondition::MinReturn,
        ema_period: 50,
        reinvest_percentage: reinvest,
        min_return,
        percent_drop,
        balance_tripwire: tripwire,
    }
}

fn series(path: &[(f64, bool)]) -> PriceSeries {
    let rows = path
        .iter()
        .enumerate()
        .map(|(i, (close, signal))| {
            let macd = if *signal { 1.0 } else { -1.0 };
            make_row(i as i64, *close, macd, 0.0)
        })
        .collect();
    PriceSeries::new("BTC", rows, "BTC.csv")
}

fn price_path() -> impl Strategy<Value = Vec<(f64, bool)>> {
    prop::collection::vec((1.0f64..1000.0, any::<bool>()), 1..120)
}

proptest! {
    #[test]
    fn account_never_goes_negative(
        path in price_path(),
        min_return in 0.0f64..0.3,
        percent_drop in 0.0f64..0.5,
        reinvest in 0.0f64..=1.0,
        tripwire in 0.5f64..4.0,
    ) {
        let c = combination(min_return, percent_drop, reinvest, tripwire);
        let costs = TradingCosts { investment: 1000.0, tax_rate: 0.2, fee_rate: 0.001 };
        let series = series(&path);
        let mut sim = Simulation::new(&c, costs, &series).unwrap();
        let mut events: Vec<SimulationEvent> = Vec::new();

        while !sim.is_finished() {
            let action = sim.step(&mut events).unwrap();
            let state = sim.state();
            prop_assert!(state.capital >= 0.0, "capital {}", state.capital);
            prop_assert!(state.reserves >= 0.0, "reserves {}", state.reserves);
            prop_assert!(state.asset >= 0.0, "asset {}", state.asset);
            prop_assert!(state.lots.iter().all(|l| l.amount > 0.0));
            if action == Action::Buy {
                prop_assert_eq!(state.capital, 0.0);
            }
        }

        let state = sim.state();
        let held = total_amount(&state.lots);
        prop_assert!((held - state.asset).abs() <= 1e-9 * state.asset.max(1.0));
    }

    #[test]
    fn event_log_mirrors_action_indices(path in price_path()) {
        let c = combination(0.05, 0.1, 0.5, 2.0);
        let costs = TradingCosts { investment: 1000.0, tax_rate: 0.2, fee_rate: 0.001 };
        let series = series(&path);
        let mut sim = Simulation::new(&c, costs, &series).unwrap();
        let mut events: Vec<SimulationEvent> = Vec::new();
        while !sim.is_finished() {
            sim.step(&mut events).unwrap();
        }
        let state = sim.state().clone();

        let indices = |kind: EventKind| -> Vec<usize> {
            events.iter().filter(|e| e.kind == kind).map(|e| e.index).collect()
        };
        prop_assert_eq!(indices(EventKind::Buy), state.buys.clone());
        prop_assert_eq!(indices(EventKind::Sell), state.sells.clone());
        prop_assert_eq!(indices(EventKind::Balance), state.balances.clone());
        prop_assert_eq!(indices(EventKind::OpenReserve), state.open_reserves.clone());
        prop_assert_eq!(state.transactions, state.buys.len() + state.sells.len());
        prop_assert!(events.iter().all(|e| (e.kind == EventKind::Sell) == e.amount.is_some()));
    }
}

#[test]
fn flat_prices_never_sell() {
    let path: Vec<(f64, bool)> = (0..50).map(|_| (100.0, true)).collect();
    let c = combination(0.01, 0.1, 0.5, 2.0);
    let costs = TradingCosts {
        investment: 1000.0,
        tax_rate: 0.2,
        fee_rate: 0.001,
    };
    let series = series(&path);
    let mut events: Vec<SimulationEvent> = Vec::new();
    let result = Simulation::new(&c, costs, &series)
        .unwrap()
        .run(&mut events)
        .unwrap();

    assert_eq!(result.buys, vec![0]);
    assert!(result.sells.is_empty());
    assert_eq!(result.transactions, 1);
    // 500 invested less the fee, plus 500 untouched reserves
    assert_relative_eq!(result.final_value, 999.5, epsilon = 1e-9);
    assert_relative_eq!(result.fees, 0.5, epsilon = 1e-12);
}
