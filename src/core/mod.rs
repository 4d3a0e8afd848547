//! Core price-series abstractions

pub mod align;
pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod log;
pub mod price;
pub mod symbol;

// Re-export main types for cleaner imports
pub use align::{Alignment, Column, Record, SeriesAligner};
pub use cache::ResultCache;
pub use error::{AlignError, HistoryError, ProviderError, RowConversionError};
pub use price::{DailyPriceProvider, PriceTable};
