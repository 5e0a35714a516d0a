//! Relationship accessors
//!
//! Parent/child navigation is explicit: each accessor takes an entity id and
//! looks the related rows up by foreign key.

use crate::schema::EntityKind;

use super::errors::{IntegrityKind, StoreError, StoreResult};
use super::memory::MemoryStore;
use super::value::Row;

impl MemoryStore {
    /// Rows of `child` whose `column` equals `parent_id`, ordered by id.
    fn children(&self, child: EntityKind, column: &str, parent_id: i64) -> StoreResult<Vec<Row>> {
        Ok(self
            .read()?
            .table(child)
            .filter(|row| row.get_i64(column) == Some(parent_id))
            .cloned()
            .collect())
    }

    /// Parent row referenced by `child_row.column`.
    fn parent(&self, parent: EntityKind, child_row: &Row, column: &str) -> StoreResult<Row> {
        let id = child_row
            .get_i64(column)
            .ok_or_else(|| StoreError::NotFound(format!("{} for {}", parent, column)))?;
        self.get(parent, id)
    }

    /// A table by its unique name.
    pub fn table_by_name(&self, name: &str) -> StoreResult<Row> {
        self.read()?
            .table(EntityKind::TableInfo)
            .find(|row| row.get_str("name") == Some(name))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("TableInfo '{}'", name)))
    }

    /// `table_info.column_info`
    pub fn columns_of(&self, table_id: i64) -> StoreResult<Vec<Row>> {
        self.children(EntityKind::ColumnInfo, "tableinfo_id", table_id)
    }

    /// `table_info.geometry_source`; `None` for attribute-only tables.
    pub fn geometry_source_of(&self, table_id: i64) -> StoreResult<Option<Row>> {
        Ok(self
            .children(EntityKind::GeometrySource, "tableinfo_id", table_id)?
            .into_iter()
            .next())
    }

    /// `geometry_source.table_info`
    pub fn table_info_of(&self, geometry_source_id: i64) -> StoreResult<Row> {
        let source = self.get(EntityKind::GeometrySource, geometry_source_id)?;
        self.parent(EntityKind::TableInfo, &source, "tableinfo_id")
    }

    /// `table_info.linkages`: linkages where the table is the attribute side.
    pub fn attribute_linkages_of(&self, table_id: i64) -> StoreResult<Vec<Row>> {
        self.children(EntityKind::GeometryLinkage, "attr_table_info_id", table_id)
    }

    /// `geometry_source.linkages`
    pub fn geometry_linkages_of(&self, geometry_source_id: i64) -> StoreResult<Vec<Row>> {
        self.children(EntityKind::GeometryLinkage, "geo_source_id", geometry_source_id)
    }

    /// `geometry_linkage.attribute_table`
    pub fn attribute_table_of(&self, linkage_id: i64) -> StoreResult<Row> {
        let linkage = self.get(EntityKind::GeometryLinkage, linkage_id)?;
        self.parent(EntityKind::TableInfo, &linkage, "attr_table_info_id")
    }

    /// `geometry_source.reprojections`
    pub fn reprojections_of(&self, geometry_source_id: i64) -> StoreResult<Vec<Row>> {
        self.children(EntityKind::GeometrySourceProjected, "geometry_source_id", geometry_source_id)
    }

    /// `geometry_source.from_relations`
    pub fn relations_from(&self, geometry_source_id: i64) -> StoreResult<Vec<Row>> {
        self.children(EntityKind::GeometryRelation, "geo_source_id", geometry_source_id)
    }

    /// `geometry_source.with_relations`
    pub fn relations_with(&self, geometry_source_id: i64) -> StoreResult<Vec<Row>> {
        self.children(EntityKind::GeometryRelation, "overlaps_with_id", geometry_source_id)
    }

    /// Name of the column holding a geometry source's geometry in `srid`.
    ///
    /// The native column answers its own srid; any other srid must match
    /// exactly one reprojection.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the source does not exist or no reprojection matches
    /// - `Integrity` (`AmbiguousProjection`) if several reprojections match
    pub fn srid_column(&self, geometry_source_id: i64, srid: i64) -> StoreResult<String> {
        let source = self.get(EntityKind::GeometrySource, geometry_source_id)?;
        if source.get_i64("srid") == Some(srid) {
            if let Some(column) = source.get_str("column") {
                return Ok(column.to_string());
            }
        }

        let matches: Vec<Row> = self
            .reprojections_of(geometry_source_id)?
            .into_iter()
            .filter(|p| p.get_i64("srid") == Some(srid))
            .collect();

        match matches.as_slice() {
            [only] => only
                .get_str("column")
                .map(str::to_string)
                .ok_or_else(|| StoreError::NotFound(format!("column for srid {}", srid))),
            [] => Err(StoreError::NotFound(format!(
                "GeometrySource {} has no column in srid {}",
                geometry_source_id, srid
            ))),
            many => Err(StoreError::integrity(
                IntegrityKind::AmbiguousProjection,
                self.bundle().table(EntityKind::GeometrySourceProjected).qualified_name(),
                format!(
                    "{} reprojections of GeometrySource {} in srid {}",
                    many.len(),
                    geometry_source_id,
                    srid
                ),
            )),
        }
    }

    /// `GeometrySource<table_name.column>`
    pub fn geometry_source_label(&self, geometry_source_id: i64) -> StoreResult<String> {
        let source = self.get(EntityKind::GeometrySource, geometry_source_id)?;
        let table = self.table_info_of(geometry_source_id)?;
        Ok(format!(
            "GeometrySource<{}.{}>",
            table.get_str("name").unwrap_or(""),
            source.get_str("column").unwrap_or("")
        ))
    }
}
