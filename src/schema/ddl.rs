//! PostgreSQL DDL for a schema bundle
//!
//! Emits `CREATE SCHEMA`, then one `CREATE TABLE` per entity (parents before
//! children), then one `CREATE INDEX` per indexed column. Every reference is
//! qualified with the bundle's namespace.

use std::fmt::Write;

use super::bundle::SchemaBundle;
use super::types::{ColumnDef, ColumnDefault, TableDef};

/// Column names in the templates that collide with SQL keywords.
const QUOTED_IDENTIFIERS: &[&str] = &["column", "date"];

fn ident(name: &str) -> String {
    if QUOTED_IDENTIFIERS.contains(&name) {
        format!("\"{}\"", name)
    } else {
        name.to_string()
    }
}

fn column_sql(column: &ColumnDef) -> String {
    let mut sql = format!("{} {}", ident(&column.name), column.column_type.sql_type());
    if column.primary_key {
        sql.push_str(" PRIMARY KEY");
    } else if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    match column.default {
        Some(ColumnDefault::CurrentTimestamp) => sql.push_str(" DEFAULT now()"),
        None => {}
    }
    sql
}

/// `CREATE TABLE` statement for one table.
pub fn create_table(table: &TableDef) -> String {
    let mut lines: Vec<String> = table.columns.iter().map(column_sql).collect();

    for constraint in &table.unique_constraints {
        let cols: Vec<String> = constraint.columns.iter().map(|c| ident(c)).collect();
        lines.push(format!("UNIQUE ({})", cols.join(", ")));
    }

    for (column, fk) in table.foreign_keys() {
        lines.push(format!(
            "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
            ident(&column.name),
            fk.qualified_target(),
            fk.target_column,
            fk.on_delete.sql()
        ));
    }

    let mut sql = format!("CREATE TABLE {} (\n", table.qualified_name());
    sql.push_str(
        &lines
            .iter()
            .map(|l| format!("    {}", l))
            .collect::<Vec<_>>()
            .join(",\n"),
    );
    sql.push_str("\n);\n");
    sql
}

/// `CREATE INDEX` statements for a table's indexed columns.
pub fn create_indexes(table: &TableDef) -> Vec<String> {
    table
        .indexed_columns()
        .map(|column| {
            format!(
                "CREATE INDEX ix_{}_{}_{} ON {} ({});",
                table.namespace, table.name, column.name,
                table.qualified_name(),
                ident(&column.name)
            )
        })
        .collect()
}

/// Full DDL script for a bundle.
pub fn render(bundle: &SchemaBundle) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "CREATE SCHEMA IF NOT EXISTS {};", bundle.namespace());

    for table in bundle.tables() {
        out.push('\n');
        out.push_str(&create_table(table));
    }

    let indexes: Vec<String> = bundle.tables().flat_map(create_indexes).collect();
    if !indexes.is_empty() {
        out.push('\n');
        for index in indexes {
            out.push_str(&index);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::schema::namespace::Namespace;
    use crate::schema::types::EntityKind;

    fn bundle() -> SchemaBundle {
        SchemaBundle::build(Namespace::new("survey_2016").unwrap(), &RegistryConfig::default())
    }

    #[test]
    fn test_column_info_table() {
        let b = bundle();
        let sql = create_table(b.table(EntityKind::ColumnInfo));

        assert!(sql.starts_with("CREATE TABLE survey_2016.column_info ("));
        assert!(sql.contains("id SERIAL PRIMARY KEY"));
        assert!(sql.contains("name VARCHAR(256)"));
        assert!(sql.contains("metadata_json VARCHAR(2048)"));
        assert!(sql.contains("tableinfo_id INTEGER NOT NULL"));
        assert!(sql.contains("UNIQUE (name, tableinfo_id)"));
        assert!(sql.contains(
            "FOREIGN KEY (tableinfo_id) REFERENCES survey_2016.table_info (id) ON DELETE CASCADE"
        ));
    }

    #[test]
    fn test_keyword_columns_are_quoted() {
        let b = bundle();
        let source = create_table(b.table(EntityKind::GeometrySource));
        assert!(source.contains("\"column\" VARCHAR(256) NOT NULL"));

        let metadata = create_table(b.table(EntityKind::SchemaMetadata));
        assert!(metadata.contains("\"date\" TIMESTAMP WITH TIME ZONE DEFAULT now()\n);"));
        assert!(!metadata.contains("AT TIME ZONE"));
    }

    #[test]
    fn test_indexes() {
        let b = bundle();
        let indexes = create_indexes(b.table(EntityKind::TableInfo));
        assert_eq!(
            indexes,
            vec!["CREATE INDEX ix_survey_2016_table_info_name ON survey_2016.table_info (name);"]
        );
    }

    #[test]
    fn test_render_orders_parents_first() {
        let sql = render(&bundle());
        assert!(sql.starts_with("CREATE SCHEMA IF NOT EXISTS survey_2016;"));

        let table_info = sql.find("CREATE TABLE survey_2016.table_info").unwrap();
        let source = sql.find("CREATE TABLE survey_2016.geometry_source (").unwrap();
        let relation = sql.find("CREATE TABLE survey_2016.geometry_relation").unwrap();
        assert!(table_info < source);
        assert!(source < relation);
        assert!(!sql.contains("public."));
    }
}
