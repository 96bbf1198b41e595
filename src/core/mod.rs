//! Core module - Data model, config, and error handling

pub mod config;
pub mod error;
pub mod types;

pub use config::{ExecutionConfig, PriceConfig, QuoteConfig, SignalConfig, SimConfig, WeightedSignal};
pub use error::{Error, Result};
pub use types::*;
