//! # queryloom-types
//!
//! Core domain types and traits for queryloom.
//!
//! This crate provides the foundational types shared across the queryloom crates:
//! - Query definitions and execution modes
//! - Time-series payloads returned by plugins
//! - Variable state consumed when planning fetches
//! - Datasource lookup traits
//! - Error types
//!
//! ## Design Philosophy
//!
//! This crate intentionally has minimal dependencies to:
//! 1. Keep plugin implementations lightweight
//! 2. Allow mock implementations for testing
//! 3. Provide clear separation between domain types and the engine

pub mod datasource;
pub mod error;
pub mod query;
pub mod series;
pub mod variables;

// Re-exports for convenience
pub use datasource::{DatasourceStore, StaticDatasourceStore};
pub use error::QueryError;
pub use query::{DatasourceSelector, QueryMode, TimeSeriesQueryDefinition};
pub use series::{AbsoluteTimeRange, TimeSeries, TimeSeriesData};
pub use variables::{VariableState, VariableStateMap, VariableValue};
