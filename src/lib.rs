//! sweeptrader: parameter-sweep backtester for lot-based trading strategies.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], the parallel driver in
//! [`orchestrator`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod orchestrator;
pub mod cli;
