//! Core domain types and logic.

pub mod bar;
pub mod session;
pub mod indicator;
pub mod position;
pub mod risk;
pub mod engine;
pub mod backtest;
pub mod summary;
pub mod error;
