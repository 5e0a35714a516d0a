//! Schema registry subsystem
//!
//! Builds, per namespace, the fixed set of EAlGIS dataset tables:
//! metadata, table/column info, geometry sources and their reprojections,
//! attribute-to-geometry linkages, and geometry overlap relations.
//!
//! # Design Principles
//!
//! - Templates are static data; a namespace is threaded through as a value
//! - Foreign keys never leave the namespace they were built in
//! - One bundle per namespace per registry, shared by reference
//! - Only invalid namespace names fail

pub mod ddl;
mod bundle;
mod errors;
mod namespace;
mod registry;
mod templates;
mod types;

pub use bundle::{SchemaBundle, SCHEMA_VERSION};
pub use errors::{ErrorClass, SchemaError, SchemaErrorCode, SchemaResult};
pub use namespace::{Namespace, MAX_NAMESPACE_LEN};
pub use registry::{configure_global, get_schema, global, SchemaRegistry};
pub use types::{
    Cardinality, ColumnDef, ColumnDefault, ColumnType, EntityKind, ForeignKey, Loading, OnDelete,
    Relationship, TableDef, UniqueConstraint,
};
