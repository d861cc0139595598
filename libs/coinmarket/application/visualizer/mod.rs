//! Market Terminal
//!
//! Terminal UI showing the market treemap next to the selected coin's chart,
//! quotes and live trades.

pub mod app;
pub mod ui;

pub use app::App;
