//! Schema bundle: one namespace's instantiation of every entity template

use serde::{Deserialize, Serialize};

use crate::config::RegistryConfig;

use super::errors::SchemaError;
use super::namespace::Namespace;
use super::templates;
use super::types::{EntityKind, Relationship, TableDef};

/// Version tag of the table shapes produced by this crate.
///
/// v1: metadata blobs are bounded strings in `metadata_json`; reprojections
/// live in `geometry_source_projected`.
pub const SCHEMA_VERSION: &str = "v1";

/// Every table and relationship definition for one namespace.
///
/// Bundles are immutable once built. The registry hands out shared
/// references so that all callers asking for the same namespace observe the
/// same instance.
///
/// Deserialization checks the same shape `build` produces: one table per
/// entity in `EntityKind::ALL` order, all in the bundle's namespace, with
/// foreign keys that stay inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBundle")]
pub struct SchemaBundle {
    namespace: Namespace,
    version: String,
    /// Indexed by `EntityKind::index()`
    tables: Vec<TableDef>,
    relationships: Vec<Relationship>,
}

#[derive(Deserialize)]
struct RawBundle {
    namespace: Namespace,
    version: String,
    tables: Vec<TableDef>,
    relationships: Vec<Relationship>,
}

impl TryFrom<RawBundle> for SchemaBundle {
    type Error = SchemaError;

    fn try_from(raw: RawBundle) -> Result<Self, Self::Error> {
        let invalid = |reason: String| SchemaError::invalid_bundle(raw.namespace.as_str(), reason);

        if raw.version != SCHEMA_VERSION {
            return Err(invalid(format!(
                "version '{}' (expected '{}')",
                raw.version, SCHEMA_VERSION
            )));
        }
        if raw.tables.len() != EntityKind::ALL.len() {
            return Err(invalid(format!(
                "{} tables (expected {})",
                raw.tables.len(),
                EntityKind::ALL.len()
            )));
        }

        for (table, kind) in raw.tables.iter().zip(EntityKind::ALL) {
            if table.entity != kind {
                return Err(invalid(format!(
                    "table {} holds {} (expected {})",
                    kind.index(),
                    table.entity,
                    kind
                )));
            }
            if table.namespace != raw.namespace {
                return Err(invalid(format!(
                    "{} is in namespace {}",
                    table.name, table.namespace
                )));
            }
            for (column, fk) in table.foreign_keys() {
                if fk.target_namespace != raw.namespace {
                    return Err(invalid(format!(
                        "{}.{} references {}",
                        table.name,
                        column.name,
                        fk.qualified_target()
                    )));
                }
            }
        }

        Ok(Self {
            namespace: raw.namespace,
            version: raw.version,
            tables: raw.tables,
            relationships: raw.relationships,
        })
    }
}

impl SchemaBundle {
    /// Instantiates every template for `namespace`.
    pub fn build(namespace: Namespace, config: &RegistryConfig) -> Self {
        let tables = templates::instantiate_tables(&namespace, config);
        Self {
            namespace,
            version: SCHEMA_VERSION.to_string(),
            tables,
            relationships: templates::instantiate_relationships(),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The (namespace, entity definitions) pair.
    pub fn parts(&self) -> (&Namespace, &[TableDef]) {
        (&self.namespace, &self.tables)
    }

    /// Definition for one entity.
    pub fn table(&self, kind: EntityKind) -> &TableDef {
        &self.tables[kind.index()]
    }

    /// Definition by entity type name (`TableInfo`), or by namespaced type
    /// name (`SURVEY2016TableInfo`).
    pub fn entity(&self, name: &str) -> Option<&TableDef> {
        if let Some(kind) = EntityKind::from_name(name) {
            return Some(self.table(kind));
        }
        self.tables.iter().find(|t| t.type_name == name)
    }

    /// Definition by unqualified table name (`column_info`).
    pub fn table_by_name(&self, table: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == table)
    }

    /// All tables, parents before children.
    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.iter()
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Relationships navigated from `parent`.
    pub fn relationships_from(&self, parent: EntityKind) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(move |r| r.parent == parent)
    }

    /// A relationship by parent entity and attribute name.
    pub fn relationship(&self, parent: EntityKind, name: &str) -> Option<&Relationship> {
        self.relationships_from(parent).find(|r| r.name == name)
    }

    /// Every distinct qualified foreign-key target, sorted.
    pub fn foreign_key_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self
            .tables
            .iter()
            .flat_map(|t| t.foreign_keys().map(|(_, fk)| fk.qualified_target()))
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }

    /// Pretty JSON export of the whole bundle.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(name: &str) -> SchemaBundle {
        SchemaBundle::build(Namespace::new(name).unwrap(), &RegistryConfig::default())
    }

    #[test]
    fn test_bundle_has_every_entity() {
        let b = bundle("survey_2016");
        for kind in EntityKind::ALL {
            let table = b.table(kind);
            assert_eq!(table.entity, kind);
            assert_eq!(table.namespace.as_str(), "survey_2016");
        }
        assert_eq!(b.version(), SCHEMA_VERSION);
    }

    #[test]
    fn test_entity_lookup() {
        let b = bundle("survey_2016");
        assert_eq!(b.entity("TableInfo").unwrap().name, "table_info");
        assert_eq!(b.entity("SURVEY2016ColumnInfo").unwrap().name, "column_info");
        assert_eq!(b.entity("EALGISMetadata").unwrap().name, "ealgis_metadata");
        assert!(b.entity("Unknown").is_none());
        assert_eq!(
            b.table_by_name("geometry_linkage").unwrap().entity,
            EntityKind::GeometryLinkage
        );
    }

    #[test]
    fn test_foreign_keys_stay_in_namespace() {
        let b = bundle("abs_2011");
        assert_eq!(
            b.foreign_key_targets(),
            vec!["abs_2011.geometry_source".to_string(), "abs_2011.table_info".to_string()]
        );
    }

    #[test]
    fn test_geometry_source_has_two_relation_roles() {
        let b = bundle("abs_2011");
        let from = b.relationship(EntityKind::GeometrySource, "from_relations").unwrap();
        let with = b.relationship(EntityKind::GeometrySource, "with_relations").unwrap();
        assert_eq!(from.child, EntityKind::GeometryRelation);
        assert_eq!(with.child, EntityKind::GeometryRelation);
        assert_ne!(from.foreign_key_column, with.foreign_key_column);
    }

    #[test]
    fn test_json_export() {
        let json = bundle("abs_2011").to_json().unwrap();
        let back: SchemaBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(back.namespace().as_str(), "abs_2011");
        assert_eq!(back.tables().count(), EntityKind::ALL.len());
    }

    fn tampered(edit: impl FnOnce(&mut serde_json::Value)) -> Result<SchemaBundle, serde_json::Error> {
        let mut value = serde_json::to_value(bundle("abs_2011")).unwrap();
        edit(&mut value);
        serde_json::from_value(value)
    }

    #[test]
    fn test_untouched_json_round_trips() {
        let back = tampered(|_| {}).unwrap();
        assert_eq!(back, bundle("abs_2011"));
    }

    #[test]
    fn test_truncated_tables_rejected() {
        let err = tampered(|v| {
            v["tables"].as_array_mut().unwrap().truncate(2);
        })
        .unwrap_err();
        assert!(err.to_string().contains("EALGIS_INVALID_BUNDLE"), "{}", err);
    }

    #[test]
    fn test_reordered_tables_rejected() {
        let err = tampered(|v| {
            v["tables"].as_array_mut().unwrap().swap(1, 2);
        })
        .unwrap_err();
        assert!(err.to_string().contains("EALGIS_INVALID_BUNDLE"), "{}", err);
    }

    #[test]
    fn test_foreign_namespace_reference_rejected() {
        let err = tampered(|v| {
            let column_info = &mut v["tables"][EntityKind::ColumnInfo.index()];
            for column in column_info["columns"].as_array_mut().unwrap() {
                if column["name"] == "tableinfo_id" {
                    column["foreign_key"]["target_namespace"] = "abs_2016".into();
                }
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("abs_2016.table_info"), "{}", err);
    }

    #[test]
    fn test_table_in_other_namespace_rejected() {
        let err = tampered(|v| {
            v["tables"][0]["namespace"] = "abs_2016".into();
        })
        .unwrap_err();
        assert!(err.to_string().contains("EALGIS_INVALID_BUNDLE"), "{}", err);
    }

    #[test]
    fn test_unknown_version_rejected() {
        assert!(tampered(|v| v["version"] = "v2".into()).is_err());
    }
}
