//! API clients for market data providers

pub mod yahoo;

pub use yahoo::{NewsArticle, PriceBar, YahooFinanceClient};
