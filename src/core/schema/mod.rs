// Declarative schema for the per-guild configuration tables.
// The registry is the single source of truth consumed by the
// persistence layer's migration routine.

pub mod schema_models;
pub mod schema_registry;

pub use schema_models::*;
pub use schema_registry::*;
