//! Table descriptor types
//!
//! Every descriptor is static-shaped; the namespace is threaded through as
//! data rather than baked into a generated type.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::namespace::Namespace;

/// The fixed set of entities instantiated for every namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    SchemaMetadata,
    TableInfo,
    ColumnInfo,
    GeometrySource,
    GeometrySourceProjected,
    GeometryLinkage,
    GeometryRelation,
}

impl EntityKind {
    /// All entities, parents before children.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::SchemaMetadata,
        EntityKind::TableInfo,
        EntityKind::ColumnInfo,
        EntityKind::GeometrySource,
        EntityKind::GeometrySourceProjected,
        EntityKind::GeometryLinkage,
        EntityKind::GeometryRelation,
    ];

    /// Entity type name, e.g. `TableInfo`
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::SchemaMetadata => "SchemaMetadata",
            EntityKind::TableInfo => "TableInfo",
            EntityKind::ColumnInfo => "ColumnInfo",
            EntityKind::GeometrySource => "GeometrySource",
            EntityKind::GeometrySourceProjected => "GeometrySourceProjected",
            EntityKind::GeometryLinkage => "GeometryLinkage",
            EntityKind::GeometryRelation => "GeometryRelation",
        }
    }

    /// Unqualified table name, e.g. `table_info`
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::SchemaMetadata => "ealgis_metadata",
            EntityKind::TableInfo => "table_info",
            EntityKind::ColumnInfo => "column_info",
            EntityKind::GeometrySource => "geometry_source",
            EntityKind::GeometrySourceProjected => "geometry_source_projected",
            EntityKind::GeometryLinkage => "geometry_linkage",
            EntityKind::GeometryRelation => "geometry_relation",
        }
    }

    /// Position in [`EntityKind::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Looks up an entity by type name. `EALGISMetadata` is accepted as an
    /// alias for `SchemaMetadata`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "EALGISMetadata" {
            return Some(EntityKind::SchemaMetadata);
        }
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnType {
    /// Auto-assigned integer primary key
    Serial,
    Integer,
    /// Double precision float
    Float,
    /// Bounded string
    String { max_len: usize },
    /// Unbounded text
    Text,
    /// Timestamp with time zone
    Timestamp,
}

impl ColumnType {
    /// PostgreSQL type name
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::Serial => "SERIAL".into(),
            ColumnType::Integer => "INTEGER".into(),
            ColumnType::Float => "DOUBLE PRECISION".into(),
            ColumnType::String { max_len } => format!("VARCHAR({})", max_len),
            ColumnType::Text => "TEXT".into(),
            ColumnType::Timestamp => "TIMESTAMP WITH TIME ZONE".into(),
        }
    }

    /// Type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::Serial | ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::String { .. } | ColumnType::Text => "string",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

/// Server-side column default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDefault {
    /// Current UTC time at insert
    CurrentTimestamp,
}

/// Referential action on parent delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    /// Reject deleting a parent that still has children
    NoAction,
    /// Delete children along with the parent
    Cascade,
}

impl OnDelete {
    pub fn sql(&self) -> &'static str {
        match self {
            OnDelete::NoAction => "NO ACTION",
            OnDelete::Cascade => "CASCADE",
        }
    }
}

/// Foreign key from a column to another table's primary key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Namespace of the target table
    pub target_namespace: Namespace,
    /// Target entity
    pub target_entity: EntityKind,
    /// Unqualified target table name
    pub target_table: String,
    /// Target column (always the primary key)
    pub target_column: String,
    pub on_delete: OnDelete,
}

impl ForeignKey {
    /// `<namespace>.<table>`
    pub fn qualified_target(&self) -> String {
        self.target_namespace.qualify(&self.target_table)
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub indexed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ColumnDefault>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKey>,
}

/// Multi-column uniqueness constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub columns: Vec<String>,
}

/// A table definition bound to one namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub namespace: Namespace,
    pub entity: EntityKind,
    /// Namespaced entity type name, e.g. `SURVEY2016TableInfo`
    pub type_name: String,
    /// Unqualified table name
    pub name: String,
    pub description: String,
    pub columns: Vec<ColumnDef>,
    pub unique_constraints: Vec<UniqueConstraint>,
}

impl TableDef {
    /// `<namespace>.<table>`
    pub fn qualified_name(&self) -> String {
        self.namespace.qualify(&self.name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Columns carrying a foreign key, with the key
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&ColumnDef, &ForeignKey)> {
        self.columns
            .iter()
            .filter_map(|c| c.foreign_key.as_ref().map(|fk| (c, fk)))
    }

    pub fn indexed_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.indexed)
    }
}

/// Relationship cardinality, from the parent's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
}

/// How children are loaded when navigating from the parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loading {
    Eager,
    /// Children are queried on access rather than materialised with the parent
    Lazy,
}

/// Parent-to-child navigation backed by a child foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Attribute name on the parent, e.g. `column_info`
    pub name: String,
    pub parent: EntityKind,
    pub child: EntityKind,
    /// Column on the child pointing at the parent
    pub foreign_key_column: String,
    /// Attribute name on the child pointing back at the parent
    pub backref: String,
    pub cardinality: Cardinality,
    pub loading: Loading,
    pub cascade_delete: bool,
}
