//! Core domain types and logic.

pub mod error;
pub mod price_row;
pub mod lot;
pub mod strategy;
pub mod market_data;
pub mod combination;
pub mod event;
pub mod result;
pub mod simulation;
pub mod sweep;
pub mod config_validation;
