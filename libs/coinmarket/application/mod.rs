//! Application Layer
//!
//! Views over the domain: the single-coin session, the market overview, the
//! live feed that drives them, and the terminal visualizer hosting it all.
//! This layer depends on domain and infrastructure layers.

pub mod coin_view;
pub mod feed;
pub mod market_view;
pub mod visualizer;

pub use coin_view::CoinSession;
pub use feed::CoinFeed;
pub use market_view::MarketOverview;
