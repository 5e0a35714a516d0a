//! ealgis-schema - per-namespace table definitions for EAlGIS datasets
//!
//! A namespace (PostgreSQL schema) holds one instance of every dataset
//! table: metadata, loaded tables and their columns, geometry sources,
//! reprojections, attribute-to-geometry linkages and overlap relations.
//! [`schema::SchemaRegistry`] builds each namespace's definitions once and
//! shares them; [`store::MemoryStore`] enforces them over in-memory rows.

pub mod config;
pub mod observability;
pub mod schema;
pub mod store;

pub use config::RegistryConfig;
pub use schema::{get_schema, SchemaBundle, SchemaError, SchemaRegistry};
