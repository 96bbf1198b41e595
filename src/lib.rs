//! mm-sim - Core Library
//! Discrete-time, single-agent market-making simulator

// Public modules
pub mod batch;
pub mod config;
pub mod core;
pub mod execution;
pub mod metrics;
pub mod price;
pub mod quote;
pub mod risk;
pub mod signal;
pub mod sim;

// Re-exports
pub use core::{Error, Result, SimConfig, StepRecord};
pub use metrics::PerformanceSummary;
pub use sim::{Simulation, SimulationRun};
