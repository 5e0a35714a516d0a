//! Namespace-free table and relationship templates
//!
//! One template per entity. Instantiating a template against a namespace
//! yields a [`TableDef`] whose foreign keys all point into that namespace.

use crate::config::RegistryConfig;

use super::namespace::Namespace;
use super::types::{
    Cardinality, ColumnDef, ColumnDefault, ColumnType, EntityKind, ForeignKey, Loading, OnDelete,
    Relationship, TableDef, UniqueConstraint,
};

/// Column storage class; bounded widths are resolved from config.
#[derive(Debug, Clone, Copy)]
enum Kind {
    Serial,
    Integer,
    Float,
    /// Bounded name/identifier string
    Name,
    /// Bounded metadata blob
    Metadata,
    Text,
    Timestamp,
}

#[derive(Debug, Clone, Copy)]
struct ColumnTemplate {
    name: &'static str,
    kind: Kind,
    nullable: bool,
    unique: bool,
    indexed: bool,
    default: Option<ColumnDefault>,
    references: Option<EntityKind>,
}

impl ColumnTemplate {
    const fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
            unique: false,
            indexed: false,
            default: None,
            references: None,
        }
    }

    const fn id() -> Self {
        Self::new("id", Kind::Serial).not_null()
    }

    const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    const fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    const fn default_now(mut self) -> Self {
        self.default = Some(ColumnDefault::CurrentTimestamp);
        self
    }

    /// Required foreign key to `target.id`, cascading on delete.
    const fn references(mut self, target: EntityKind) -> Self {
        self.references = Some(target);
        self.nullable = false;
        self
    }

    fn instantiate(&self, namespace: &Namespace, config: &RegistryConfig) -> ColumnDef {
        let column_type = match self.kind {
            Kind::Serial => ColumnType::Serial,
            Kind::Integer => ColumnType::Integer,
            Kind::Float => ColumnType::Float,
            Kind::Name => ColumnType::String {
                max_len: config.name_length,
            },
            Kind::Metadata => ColumnType::String {
                max_len: config.metadata_length,
            },
            Kind::Text => ColumnType::Text,
            Kind::Timestamp => ColumnType::Timestamp,
        };

        ColumnDef {
            name: self.name.to_string(),
            column_type,
            nullable: self.nullable,
            primary_key: matches!(self.kind, Kind::Serial),
            unique: self.unique,
            indexed: self.indexed,
            default: self.default,
            foreign_key: self.references.map(|target| ForeignKey {
                target_namespace: namespace.clone(),
                target_entity: target,
                target_table: target.table_name().to_string(),
                target_column: "id".to_string(),
                on_delete: OnDelete::Cascade,
            }),
        }
    }
}

struct TableTemplate {
    entity: EntityKind,
    description: &'static str,
    columns: &'static [ColumnTemplate],
    unique: &'static [&'static [&'static str]],
}

impl TableTemplate {
    fn instantiate(&self, namespace: &Namespace, config: &RegistryConfig) -> TableDef {
        TableDef {
            namespace: namespace.clone(),
            entity: self.entity,
            type_name: format!("{}{}", namespace.type_prefix(), self.entity.name()),
            name: self.entity.table_name().to_string(),
            description: self.description.to_string(),
            columns: self
                .columns
                .iter()
                .map(|c| c.instantiate(namespace, config))
                .collect(),
            unique_constraints: self
                .unique
                .iter()
                .map(|cols| UniqueConstraint {
                    columns: cols.iter().map(|c| c.to_string()).collect(),
                })
                .collect(),
        }
    }
}

struct RelationshipTemplate {
    name: &'static str,
    parent: EntityKind,
    child: EntityKind,
    foreign_key_column: &'static str,
    backref: &'static str,
    cardinality: Cardinality,
    loading: Loading,
}

impl RelationshipTemplate {
    fn instantiate(&self) -> Relationship {
        Relationship {
            name: self.name.to_string(),
            parent: self.parent,
            child: self.child,
            foreign_key_column: self.foreign_key_column.to_string(),
            backref: self.backref.to_string(),
            cardinality: self.cardinality,
            loading: self.loading,
            cascade_delete: true,
        }
    }
}

// =============================================================================
// Tables, in EntityKind::ALL order
// =============================================================================

static TABLES: [TableTemplate; 7] = [
    TableTemplate {
        entity: EntityKind::SchemaMetadata,
        description: "metadata table for a given set of datasets in a schema",
        columns: &[
            ColumnTemplate::id(),
            ColumnTemplate::new("name", Kind::Name),
            ColumnTemplate::new("version", Kind::Float),
            ColumnTemplate::new("description", Kind::Text),
            ColumnTemplate::new("date", Kind::Timestamp).default_now(),
        ],
        unique: &[],
    },
    TableTemplate {
        entity: EntityKind::TableInfo,
        description: "metadata for each table that has been loaded into the system",
        columns: &[
            ColumnTemplate::id(),
            ColumnTemplate::new("name", Kind::Name).unique().indexed(),
            ColumnTemplate::new("metadata_json", Kind::Metadata),
        ],
        unique: &[],
    },
    TableTemplate {
        entity: EntityKind::ColumnInfo,
        description: "metadata for columns in the tables",
        columns: &[
            ColumnTemplate::id(),
            ColumnTemplate::new("name", Kind::Name).indexed(),
            ColumnTemplate::new("metadata_json", Kind::Metadata),
            ColumnTemplate::new("tableinfo_id", Kind::Integer)
                .references(EntityKind::TableInfo)
                .indexed(),
        ],
        unique: &[&["name", "tableinfo_id"]],
    },
    TableTemplate {
        entity: EntityKind::GeometrySource,
        description: "sources of geometry information: the table, and the column",
        columns: &[
            ColumnTemplate::id(),
            ColumnTemplate::new("geometry_type", Kind::Name).not_null(),
            ColumnTemplate::new("column", Kind::Name).not_null(),
            ColumnTemplate::new("srid", Kind::Integer).not_null(),
            ColumnTemplate::new("gid", Kind::Name).not_null(),
            ColumnTemplate::new("tableinfo_id", Kind::Integer)
                .references(EntityKind::TableInfo)
                .indexed()
                .unique(),
        ],
        unique: &[],
    },
    TableTemplate {
        entity: EntityKind::GeometrySourceProjected,
        description: "an additional column on the source table holding the geometry reprojected to this srid",
        columns: &[
            ColumnTemplate::id(),
            ColumnTemplate::new("srid", Kind::Integer).not_null(),
            ColumnTemplate::new("column", Kind::Name).not_null(),
            ColumnTemplate::new("geometry_source_id", Kind::Integer)
                .references(EntityKind::GeometrySource)
                .indexed(),
        ],
        unique: &[],
    },
    TableTemplate {
        entity: EntityKind::GeometryLinkage,
        description: "links tying rows of an attribute table to rows of a geometry table",
        columns: &[
            ColumnTemplate::id(),
            ColumnTemplate::new("geo_column", Kind::Name),
            ColumnTemplate::new("attr_table_info_id", Kind::Integer)
                .references(EntityKind::TableInfo),
            ColumnTemplate::new("geo_source_id", Kind::Integer)
                .references(EntityKind::GeometrySource)
                .indexed(),
            ColumnTemplate::new("attr_column", Kind::Name),
        ],
        unique: &[],
    },
    TableTemplate {
        entity: EntityKind::GeometryRelation,
        description: "overlap relation between two geometry sources",
        columns: &[
            ColumnTemplate::id(),
            ColumnTemplate::new("geo_source_id", Kind::Integer)
                .references(EntityKind::GeometrySource)
                .indexed(),
            ColumnTemplate::new("overlaps_with_id", Kind::Integer)
                .references(EntityKind::GeometrySource)
                .indexed(),
        ],
        unique: &[],
    },
];

// =============================================================================
// Relationships
// =============================================================================

static RELATIONSHIPS: [RelationshipTemplate; 7] = [
    RelationshipTemplate {
        name: "geometry_source",
        parent: EntityKind::TableInfo,
        child: EntityKind::GeometrySource,
        foreign_key_column: "tableinfo_id",
        backref: "table_info",
        cardinality: Cardinality::OneToOne,
        loading: Loading::Eager,
    },
    RelationshipTemplate {
        name: "column_info",
        parent: EntityKind::TableInfo,
        child: EntityKind::ColumnInfo,
        foreign_key_column: "tableinfo_id",
        backref: "table_info",
        cardinality: Cardinality::OneToMany,
        loading: Loading::Lazy,
    },
    RelationshipTemplate {
        name: "linkages",
        parent: EntityKind::TableInfo,
        child: EntityKind::GeometryLinkage,
        foreign_key_column: "attr_table_info_id",
        backref: "attribute_table",
        cardinality: Cardinality::OneToMany,
        loading: Loading::Lazy,
    },
    RelationshipTemplate {
        name: "linkages",
        parent: EntityKind::GeometrySource,
        child: EntityKind::GeometryLinkage,
        foreign_key_column: "geo_source_id",
        backref: "geometry_source",
        cardinality: Cardinality::OneToMany,
        loading: Loading::Lazy,
    },
    RelationshipTemplate {
        name: "reprojections",
        parent: EntityKind::GeometrySource,
        child: EntityKind::GeometrySourceProjected,
        foreign_key_column: "geometry_source_id",
        backref: "geometry_source",
        cardinality: Cardinality::OneToMany,
        loading: Loading::Lazy,
    },
    RelationshipTemplate {
        name: "from_relations",
        parent: EntityKind::GeometrySource,
        child: EntityKind::GeometryRelation,
        foreign_key_column: "geo_source_id",
        backref: "geometry_source",
        cardinality: Cardinality::OneToMany,
        loading: Loading::Lazy,
    },
    RelationshipTemplate {
        name: "with_relations",
        parent: EntityKind::GeometrySource,
        child: EntityKind::GeometryRelation,
        foreign_key_column: "overlaps_with_id",
        backref: "overlaps_geometry_source",
        cardinality: Cardinality::OneToMany,
        loading: Loading::Lazy,
    },
];

/// Instantiates every table template for `namespace`, in [`EntityKind::ALL`] order.
pub(crate) fn instantiate_tables(namespace: &Namespace, config: &RegistryConfig) -> Vec<TableDef> {
    TABLES
        .iter()
        .map(|t| t.instantiate(namespace, config))
        .collect()
}

/// Instantiates every relationship template.
pub(crate) fn instantiate_relationships() -> Vec<Relationship> {
    RELATIONSHIPS.iter().map(|r| r.instantiate()).collect()
}
