//! Rate model, normalization, caching and configuration

pub mod cache;
pub mod config;
pub mod convert;
pub mod currency;
pub mod error;
pub mod log;
pub mod normalize;
pub mod rates;

// Re-export main types for cleaner imports
pub use cache::RateCache;
pub use config::AppConfig;
pub use convert::Conversion;
pub use error::{ConversionError, SourceError};
pub use rates::{DataQuality, RateEntry, RateSet, RateSource};
