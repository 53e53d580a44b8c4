//! Terminal front end: rate tables, one-off conversions and setup.

pub mod convert;
pub mod rates;
pub mod setup;
pub mod ui;
