//! Tariff Advisor - the analytical core of an energy-plan recommendation
//! system.
//!
//! Turns a customer's monthly consumption history and stated preferences
//! into a characterized usage profile with a 12-month projection, a ranked
//! shortlist of candidate plans, per-plan savings and break-even analysis,
//! and a rule-based risk report with a stay-vs-switch recommendation.
//!
//! The crate is a pure library: callers hand it in-memory usage and catalog
//! data and get in-memory results back. Persistence, HTTP, caching and
//! explanation generation all live outside. Every entry point is a
//! synchronous, side-effect-free function of its inputs, so concurrent use
//! needs no coordination.

pub mod config;
pub mod cost;
pub mod domain;
pub mod engine;
pub mod error;
pub mod profile;
pub mod risk;
pub mod savings;
pub mod scoring;

pub use config::AnalysisConfig;
pub use engine::RecommendationEngine;
pub use error::AdvisorError;
