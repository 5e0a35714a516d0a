//! In-memory reference store for one namespace
//!
//! Enforces the constraints a bundle declares, the way the relational
//! backend would: NOT NULL, string widths, unique and composite-unique
//! constraints, foreign-key existence, and ON DELETE CASCADE.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::observability::{log_event_with_fields, Event};
use crate::schema::{ColumnDefault, ColumnType, EntityKind, OnDelete, SchemaBundle, TableDef};

use super::errors::{IntegrityKind, StoreError, StoreResult};
use super::value::{Row, Value};

/// Largest id a SERIAL (INT4) primary key can hold.
pub const MAX_SERIAL_ID: i64 = i32::MAX as i64;

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) rows: HashMap<EntityKind, BTreeMap<i64, Row>>,
    next_id: HashMap<EntityKind, i64>,
}

impl Tables {
    pub(crate) fn table(&self, kind: EntityKind) -> impl Iterator<Item = &Row> {
        self.rows.get(&kind).into_iter().flat_map(|t| t.values())
    }

    fn get(&self, kind: EntityKind, id: i64) -> Option<&Row> {
        self.rows.get(&kind).and_then(|t| t.get(&id))
    }
}

/// Row storage for the tables of one schema bundle.
#[derive(Debug)]
pub struct MemoryStore {
    bundle: Arc<SchemaBundle>,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new(bundle: Arc<SchemaBundle>) -> Self {
        Self {
            bundle,
            tables: RwLock::new(Tables::default()),
        }
    }

    pub fn bundle(&self) -> &Arc<SchemaBundle> {
        &self.bundle
    }

    pub(crate) fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))
    }

    /// Inserts a row and returns its id.
    ///
    /// An absent `id` is assigned from the table's sequence. Absent columns
    /// take their default, or NULL.
    pub fn insert(&self, kind: EntityKind, row: Row) -> StoreResult<i64> {
        let table = self.bundle.table(kind);
        let mut tables = self.write()?;

        let result = prepare_row(table, row).and_then(|mut row| {
            let id = match row.id() {
                Some(id) => id,
                None => tables.next_id.get(&kind).copied().unwrap_or(1),
            };
            let next_id = check_id(table, id)?;
            row.set("id", id);

            check_unique(table, &tables, kind, &row)?;
            check_references(table, &tables, &row)?;
            Ok((id, next_id, row))
        });

        let (id, next_id, row) = match result {
            Ok(prepared) => prepared,
            Err(e) => {
                if e.is_integrity() {
                    log_event_with_fields(
                        Event::IntegrityViolation,
                        &[("table", table.qualified_name().as_str()), ("error", e.to_string().as_str())],
                    );
                }
                return Err(e);
            }
        };

        tables.rows.entry(kind).or_default().insert(id, row);
        let next = tables.next_id.entry(kind).or_insert(1);
        *next = (*next).max(next_id);

        let id_str = id.to_string();
        log_event_with_fields(
            Event::RowInserted,
            &[("id", id_str.as_str()), ("table", table.qualified_name().as_str())],
        );
        Ok(id)
    }

    /// Returns a copy of one row.
    pub fn get(&self, kind: EntityKind, id: i64) -> StoreResult<Row> {
        self.read()?
            .get(kind, id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", kind, id)))
    }

    /// All rows of a table, ordered by id.
    pub fn rows(&self, kind: EntityKind) -> StoreResult<Vec<Row>> {
        Ok(self.read()?.table(kind).cloned().collect())
    }

    pub fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        Ok(self.read()?.rows.get(&kind).map_or(0, |t| t.len()))
    }

    /// Deletes a row and every row that cascades from it.
    ///
    /// Returns every removed `(entity, id)`, the requested row first. Nothing
    /// is removed if a non-cascading foreign key still references a doomed row.
    pub fn delete(&self, kind: EntityKind, id: i64) -> StoreResult<Vec<(EntityKind, i64)>> {
        let mut tables = self.write()?;
        if tables.get(kind, id).is_none() {
            return Err(StoreError::NotFound(format!("{} {}", kind, id)));
        }

        let doomed = self.cascade_closure(&tables, kind, id)?;

        for (k, i) in &doomed {
            if let Some(t) = tables.rows.get_mut(k) {
                t.remove(i);
            }
        }

        let id_str = id.to_string();
        let cascaded = (doomed.len() - 1).to_string();
        log_event_with_fields(
            Event::RowDeleted,
            &[
                ("cascaded", cascaded.as_str()),
                ("entity", kind.name()),
                ("id", id_str.as_str()),
            ],
        );
        for (k, i) in doomed.iter().skip(1) {
            let i_str = i.to_string();
            log_event_with_fields(Event::CascadeDelete, &[("entity", k.name()), ("id", i_str.as_str())]);
        }

        Ok(doomed)
    }

    /// Breadth-first walk over rows whose foreign keys point at a doomed row.
    fn cascade_closure(
        &self,
        tables: &Tables,
        kind: EntityKind,
        id: i64,
    ) -> StoreResult<Vec<(EntityKind, i64)>> {
        let mut order = vec![(kind, id)];
        let mut seen: BTreeSet<(EntityKind, i64)> = BTreeSet::from([(kind, id)]);
        let mut cursor = 0;

        while cursor < order.len() {
            let (parent_kind, parent_id) = order[cursor];
            cursor += 1;

            for child in self.bundle.tables() {
                for (column, fk) in child.foreign_keys() {
                    if fk.target_entity != parent_kind {
                        continue;
                    }
                    for row in tables.table(child.entity) {
                        if row.get_i64(&column.name) != Some(parent_id) {
                            continue;
                        }
                        let Some(child_id) = row.id() else { continue };
                        let key = (child.entity, child_id);
                        if seen.contains(&key) {
                            continue;
                        }
                        if fk.on_delete != OnDelete::Cascade {
                            return Err(StoreError::integrity(
                                IntegrityKind::ForeignKey,
                                child.qualified_name(),
                                format!(
                                    "{} {} is still referenced by {} {} via {}",
                                    parent_kind, parent_id, child.entity, child_id, column.name
                                ),
                            ));
                        }
                        seen.insert(key);
                        order.push(key);
                    }
                }
            }
        }

        Ok(order)
    }
}

/// Rejects ids a SERIAL column cannot hold. Returns the id that follows.
fn check_id(table: &TableDef, id: i64) -> StoreResult<i64> {
    let out_of_range = || StoreError::IdOutOfRange {
        table: table.qualified_name(),
        id,
        max: MAX_SERIAL_ID,
    };
    if !(1..=MAX_SERIAL_ID).contains(&id) {
        return Err(out_of_range());
    }
    id.checked_add(1).ok_or_else(out_of_range)
}

/// Checks columns, types, widths and NOT NULL; fills defaults.
fn prepare_row(table: &TableDef, row: Row) -> StoreResult<Row> {
    let mut values = row.into_columns();

    if let Some(unknown) = values.keys().find(|k| table.column(k).is_none()) {
        return Err(StoreError::UnknownColumn {
            table: table.qualified_name(),
            column: unknown.clone(),
        });
    }

    let mut prepared = Row::new();
    for column in &table.columns {
        let raw = match values.remove(&column.name) {
            Some(v) => v,
            None => match column.default {
                Some(ColumnDefault::CurrentTimestamp) => Value::Timestamp(Utc::now()),
                None => Value::Null,
            },
        };

        let actual = raw.type_name();
        let value = raw
            .conform(column.column_type)
            .ok_or_else(|| StoreError::TypeMismatch {
                table: table.qualified_name(),
                column: column.name.clone(),
                expected: column.column_type.type_name(),
                actual,
            })?;

        if value.is_null() {
            if !column.nullable && !column.primary_key {
                return Err(StoreError::integrity(
                    IntegrityKind::NotNull,
                    table.qualified_name(),
                    format!("column '{}' must not be null", column.name),
                ));
            }
            continue;
        }

        if let (ColumnType::String { max_len }, Some(s)) = (column.column_type, value.as_str()) {
            let len = s.chars().count();
            if len > max_len {
                return Err(StoreError::ValueTooLong {
                    table: table.qualified_name(),
                    column: column.name.clone(),
                    len,
                    max: max_len,
                });
            }
        }

        prepared.set(&column.name, value);
    }

    Ok(prepared)
}

/// Single-column and composite uniqueness. NULLs never collide.
fn check_unique(table: &TableDef, tables: &Tables, kind: EntityKind, row: &Row) -> StoreResult<()> {
    let mut constraints: Vec<Vec<&str>> = table
        .columns
        .iter()
        .filter(|c| c.unique || c.primary_key)
        .map(|c| vec![c.name.as_str()])
        .collect();
    constraints.extend(
        table
            .unique_constraints
            .iter()
            .map(|u| u.columns.iter().map(String::as_str).collect()),
    );

    for columns in constraints {
        if columns.iter().any(|c| row.get(c).is_null()) {
            continue;
        }
        let clash = tables
            .table(kind)
            .any(|existing| columns.iter().all(|c| existing.get(c) == row.get(c)));
        if clash {
            return Err(StoreError::integrity(
                IntegrityKind::Unique,
                table.qualified_name(),
                format!("duplicate value for ({})", columns.join(", ")),
            ));
        }
    }

    Ok(())
}

/// Every non-null foreign key must name an existing row in the same namespace.
fn check_references(table: &TableDef, tables: &Tables, row: &Row) -> StoreResult<()> {
    for (column, fk) in table.foreign_keys() {
        let Some(target_id) = row.get_i64(&column.name) else {
            continue;
        };
        if fk.target_namespace != table.namespace {
            return Err(StoreError::integrity(
                IntegrityKind::ForeignKey,
                table.qualified_name(),
                format!("{} references foreign namespace {}", column.name, fk.target_namespace),
            ));
        }
        if tables.get(fk.target_entity, target_id).is_none() {
            return Err(StoreError::integrity(
                IntegrityKind::ForeignKey,
                table.qualified_name(),
                format!("{} = {} has no row in {}", column.name, target_id, fk.qualified_target()),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::schema::Namespace;

    fn store() -> MemoryStore {
        let bundle = SchemaBundle::build(Namespace::new("unit").unwrap(), &RegistryConfig::default());
        MemoryStore::new(Arc::new(bundle))
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let store = store();
        let a = store.insert(EntityKind::TableInfo, Row::new().with("name", "a")).unwrap();
        let b = store.insert(EntityKind::TableInfo, Row::new().with("name", "b")).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.get(EntityKind::TableInfo, 2).unwrap().get_str("name"), Some("b"));
    }

    #[test]
    fn test_explicit_id_advances_sequence() {
        let store = store();
        store.insert(EntityKind::TableInfo, Row::new().with("id", 10).with("name", "a")).unwrap();
        let next = store.insert(EntityKind::TableInfo, Row::new().with("name", "b")).unwrap();
        assert_eq!(next, 11);

        let err = store
            .insert(EntityKind::TableInfo, Row::new().with("id", 10).with("name", "c"))
            .unwrap_err();
        assert_eq!(err.integrity_kind(), Some(IntegrityKind::Unique));
    }

    #[test]
    fn test_id_outside_serial_range_rejected() {
        let store = store();
        for id in [0, -1, MAX_SERIAL_ID + 1, i64::MAX] {
            let err = store
                .insert(EntityKind::TableInfo, Row::new().with("id", id).with("name", "a"))
                .unwrap_err();
            assert!(matches!(err, StoreError::IdOutOfRange { .. }), "{}", id);
        }
        assert_eq!(store.count(EntityKind::TableInfo).unwrap(), 0);

        // the store stays usable after a rejected id
        let id = store.insert(EntityKind::TableInfo, Row::new().with("name", "b")).unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn test_sequence_stops_at_serial_max() {
        let store = store();
        store
            .insert(EntityKind::TableInfo, Row::new().with("id", MAX_SERIAL_ID).with("name", "last"))
            .unwrap();
        let err = store.insert(EntityKind::TableInfo, Row::new().with("name", "next")).unwrap_err();
        assert!(matches!(err, StoreError::IdOutOfRange { .. }));
        assert_eq!(store.count(EntityKind::TableInfo).unwrap(), 1);
    }

    #[test]
    fn test_metadata_date_defaults_to_now() {
        let store = store();
        let before = Utc::now();
        let id = store
            .insert(EntityKind::SchemaMetadata, Row::new().with("name", "abs").with("version", 1))
            .unwrap();
        let row = store.get(EntityKind::SchemaMetadata, id).unwrap();

        assert_eq!(row.get("version").as_f64(), Some(1.0));
        assert!(row.get("date").as_timestamp().unwrap() >= before);
    }

    #[test]
    fn test_not_null_rejected() {
        let store = store();
        let err = store.insert(EntityKind::ColumnInfo, Row::new().with("name", "pop")).unwrap_err();
        assert_eq!(err.integrity_kind(), Some(IntegrityKind::NotNull));
    }

    #[test]
    fn test_unknown_column_and_type_mismatch() {
        let store = store();
        let err = store.insert(EntityKind::TableInfo, Row::new().with("colour", "red")).unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));

        let err = store.insert(EntityKind::TableInfo, Row::new().with("name", 5)).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { expected: "string", actual: "integer", .. }));
    }

    #[test]
    fn test_value_too_long() {
        let store = store();
        let err = store
            .insert(EntityKind::TableInfo, Row::new().with("name", "x".repeat(257)))
            .unwrap_err();
        assert!(matches!(err, StoreError::ValueTooLong { len: 257, max: 256, .. }));
    }

    #[test]
    fn test_dangling_foreign_key_rejected() {
        let store = store();
        let err = store
            .insert(EntityKind::ColumnInfo, Row::new().with("name", "pop").with("tableinfo_id", 99))
            .unwrap_err();
        assert_eq!(err.integrity_kind(), Some(IntegrityKind::ForeignKey));
        assert_eq!(store.count(EntityKind::ColumnInfo).unwrap(), 0);
    }

    /// Store whose `column_info.tableinfo_id` key refuses parent deletes.
    fn store_with_no_action_key() -> MemoryStore {
        let bundle = SchemaBundle::build(Namespace::new("unit").unwrap(), &RegistryConfig::default());
        let mut value = serde_json::to_value(bundle).unwrap();
        let column_info = &mut value["tables"][EntityKind::ColumnInfo.index()];
        for column in column_info["columns"].as_array_mut().unwrap() {
            if column["name"] == "tableinfo_id" {
                column["foreign_key"]["on_delete"] = "no_action".into();
            }
        }
        let bundle: SchemaBundle = serde_json::from_value(value).unwrap();
        MemoryStore::new(Arc::new(bundle))
    }

    #[test]
    fn test_no_action_key_refuses_delete() {
        let store = store_with_no_action_key();
        let table = store.insert(EntityKind::TableInfo, Row::new().with("name", "g01")).unwrap();
        store
            .insert(
                EntityKind::GeometrySource,
                Row::new()
                    .with("geometry_type", "POINT")
                    .with("column", "geom")
                    .with("srid", 4326)
                    .with("gid", "gid")
                    .with("tableinfo_id", table),
            )
            .unwrap();
        store
            .insert(EntityKind::ColumnInfo, Row::new().with("name", "pop").with("tableinfo_id", table))
            .unwrap();

        let err = store.delete(EntityKind::TableInfo, table).unwrap_err();
        assert_eq!(err.integrity_kind(), Some(IntegrityKind::ForeignKey));

        // nothing removed, not even the cascading geometry source
        assert_eq!(store.count(EntityKind::TableInfo).unwrap(), 1);
        assert_eq!(store.count(EntityKind::GeometrySource).unwrap(), 1);
        assert_eq!(store.count(EntityKind::ColumnInfo).unwrap(), 1);
    }

    #[test]
    fn test_no_action_key_allows_delete_once_unreferenced() {
        let store = store_with_no_action_key();
        let table = store.insert(EntityKind::TableInfo, Row::new().with("name", "g01")).unwrap();
        let column = store
            .insert(EntityKind::ColumnInfo, Row::new().with("name", "pop").with("tableinfo_id", table))
            .unwrap();

        store.delete(EntityKind::ColumnInfo, column).unwrap();
        let removed = store.delete(EntityKind::TableInfo, table).unwrap();
        assert_eq!(removed, vec![(EntityKind::TableInfo, table)]);
    }

    #[test]
    fn test_delete_missing_row() {
        let store = store();
        assert!(store.delete(EntityKind::TableInfo, 1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_null_does_not_collide_on_unique() {
        let store = store();
        store.insert(EntityKind::TableInfo, Row::new()).unwrap();
        store.insert(EntityKind::TableInfo, Row::new()).unwrap();
        assert_eq!(store.count(EntityKind::TableInfo).unwrap(), 2);
    }
}
