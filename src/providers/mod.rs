pub mod yahoo_finance;

// Re-export the provider trait so callers can name it from here
pub use crate::core::price::DailyPriceProvider;
