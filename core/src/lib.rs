//! Helpdesk analytics core.
//!
//! Pure, synchronous aggregation and scoring over a batch of support tickets.
//! The only fallible edges are the ticket source (`store`) and config loading.

pub mod bucketer;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod rng;
pub mod score;
pub mod store;
pub mod synthetic;
pub mod ticket;
pub mod trend;
pub mod types;
pub mod window;
