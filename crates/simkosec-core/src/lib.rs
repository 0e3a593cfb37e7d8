//! File-based adapter around an external obstacle-flow simulator.
//!
//! The adapter fills a templated input file from an optimizer parameter
//! vector, runs the simulator executable on it and reads back the result
//! vector the simulator writes as CSV.

pub mod adapter;
pub mod common;
pub mod document;
pub mod domain;
pub mod fields;
pub mod mapping;
pub mod results;
pub mod runner;
pub mod serialization;
pub mod variants;

pub use adapter::SimulatorAdapter;
pub use common::config::{AdapterConfig, InputArgumentStyle};
pub use domain::{SimError, SimErrorCategory, SimResult};
pub use fields::FieldDefinition;
pub use results::OutputRead;
pub use variants::{SimulatorVariant, VariantKind};
