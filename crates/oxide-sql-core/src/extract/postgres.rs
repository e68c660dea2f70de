//! PostgreSQL catalog queries over `pg_catalog` and `information_schema`.

use std::borrow::Cow;

use super::decode::BooleanEncoding;
use super::error::{ExtractError, Result};
use super::row::CatalogValue;
use super::{CatalogDialect, ColumnType, ExtractionTarget};
use crate::dialect::DialectKind;
use crate::model::{SqlType, SqlValueType, TableKind};

const USER_SCHEMAS: &str = "NOT IN ('pg_catalog', 'information_schema')";

const TABLES: &str = r"
SELECT n.nspname, c.relname, c.relkind
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE c.relkind IN ('r', 'p')
  AND n.nspname {schemas}
  AND n.nspname NOT LIKE 'pg_toast%'
  AND n.nspname NOT LIKE 'pg_temp%'
ORDER BY n.nspname, c.relname";

const COLUMNS: &str = r"
SELECT c.table_schema, c.table_name, c.ordinal_position, c.column_name,
       NULL, NULL,
       CASE WHEN c.data_type = 'USER-DEFINED' THEN c.udt_name ELSE c.data_type END,
       c.numeric_precision, c.numeric_scale, c.character_maximum_length,
       c.is_nullable, c.column_default, c.collation_name, c.is_identity
FROM information_schema.columns c
JOIN information_schema.tables t
  ON t.table_schema = c.table_schema AND t.table_name = c.table_name
WHERE t.table_type = 'BASE TABLE'
  AND c.table_schema {schemas}
ORDER BY c.table_schema, c.table_name, c.ordinal_position";

const VIEWS: &str = r"
SELECT v.schemaname, v.viewname, rtrim(btrim(v.definition), ';')
FROM pg_catalog.pg_views v
WHERE v.schemaname {schemas}
ORDER BY v.schemaname, v.viewname";

const VIEW_COLUMNS: &str = r"
SELECT c.table_schema, c.table_name, c.ordinal_position, c.column_name
FROM information_schema.columns c
JOIN information_schema.views v
  ON v.table_schema = c.table_schema AND v.table_name = c.table_name
WHERE c.table_schema {schemas}
ORDER BY c.table_schema, c.table_name, c.ordinal_position";

const INDEXES: &str = r"
SELECT n.nspname, t.relname, i.relname, k.ord, a.attname,
       CASE WHEN k.attnum = 0 THEN pg_catalog.pg_get_indexdef(ix.indexrelid, k.ord::int, true) END,
       CASE WHEN ix.indoption[k.ord - 1] & 1 = 1 THEN 'YES' ELSE 'NO' END,
       CASE WHEN ix.indisunique THEN 'YES' ELSE 'NO' END,
       pg_catalog.pg_get_expr(ix.indpred, ix.indrelid),
       CASE WHEN ix.indisclustered THEN 'YES' ELSE 'NO' END,
       (SELECT substring(o FROM 'fillfactor=([0-9]+)')::int
          FROM unnest(i.reloptions) AS o WHERE o LIKE 'fillfactor=%')
FROM pg_catalog.pg_index ix
JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
JOIN pg_catalog.pg_class t ON t.oid = ix.indrelid
JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
LEFT JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
WHERE t.relkind IN ('r', 'p')
  AND n.nspname {schemas}
  AND k.ord <= ix.indnkeyatts
  AND NOT EXISTS (
      SELECT 1 FROM pg_catalog.pg_constraint con
      WHERE con.conindid = ix.indexrelid AND con.contype IN ('p', 'u'))
ORDER BY n.nspname, t.relname, i.relname, k.ord";

const FOREIGN_KEYS: &str = r"
SELECT n.nspname, t.relname, con.conname, k.ord, a.attname,
       rn.nspname, rt.relname, ra.attname,
       CASE con.confdeltype WHEN 'r' THEN 'RESTRICT' WHEN 'c' THEN 'CASCADE'
            WHEN 'n' THEN 'SET NULL' WHEN 'd' THEN 'SET DEFAULT' ELSE 'NO ACTION' END,
       CASE con.confupdtype WHEN 'r' THEN 'RESTRICT' WHEN 'c' THEN 'CASCADE'
            WHEN 'n' THEN 'SET NULL' WHEN 'd' THEN 'SET DEFAULT' ELSE 'NO ACTION' END,
       CASE WHEN con.condeferrable THEN 'YES' ELSE 'NO' END,
       CASE WHEN con.condeferred THEN 'YES' ELSE 'NO' END
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class t ON t.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
JOIN pg_catalog.pg_class rt ON rt.oid = con.confrelid
JOIN pg_catalog.pg_namespace rn ON rn.oid = rt.relnamespace
CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(attnum, refnum, ord)
JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
JOIN pg_catalog.pg_attribute ra ON ra.attrelid = con.confrelid AND ra.attnum = k.refnum
WHERE con.contype = 'f'
  AND n.nspname {schemas}
ORDER BY n.nspname, t.relname, con.conname, k.ord";

const CHECKS: &str = r"
SELECT n.nspname, t.relname, con.conname, pg_catalog.pg_get_constraintdef(con.oid, true)
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class t ON t.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
WHERE con.contype = 'c'
  AND n.nspname {schemas}
ORDER BY n.nspname, t.relname, con.conname";

const KEYS: &str = r"
SELECT n.nspname, t.relname, con.conname,
       CASE con.contype WHEN 'p' THEN 'PRIMARY KEY' ELSE 'UNIQUE' END,
       k.ord, a.attname
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class t ON t.oid = con.conrelid
JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
WHERE con.contype IN ('p', 'u')
  AND n.nspname {schemas}
ORDER BY n.nspname, t.relname, con.conname, k.ord";

const SEQUENCES: &str = r"
SELECT s.schemaname, s.sequencename, s.start_value, s.increment_by,
       s.min_value, s.max_value, CASE WHEN s.cycle THEN 'YES' ELSE 'NO' END, s.last_value
FROM pg_catalog.pg_sequences s
JOIN pg_catalog.pg_namespace n ON n.nspname = s.schemaname
JOIN pg_catalog.pg_class c ON c.relnamespace = n.oid AND c.relname = s.sequencename
WHERE s.schemaname {schemas}
  AND NOT EXISTS (
      SELECT 1 FROM pg_catalog.pg_depend d
      WHERE d.objid = c.oid AND d.deptype IN ('a', 'i'))
ORDER BY s.schemaname, s.sequencename";

/// PostgreSQL catalog configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresCatalog;

impl CatalogDialect for PostgresCatalog {
    fn kind(&self) -> DialectKind {
        DialectKind::PostgreSql
    }

    fn default_schema(&self) -> &str {
        "public"
    }

    fn query(&self, target: ExtractionTarget) -> Option<Cow<'static, str>> {
        let template = match target {
            ExtractionTarget::Tables => TABLES,
            ExtractionTarget::Columns => COLUMNS,
            ExtractionTarget::Views => VIEWS,
            ExtractionTarget::ViewColumns => VIEW_COLUMNS,
            ExtractionTarget::Indexes => INDEXES,
            ExtractionTarget::ForeignKeys => FOREIGN_KEYS,
            ExtractionTarget::CheckConstraints => CHECKS,
            ExtractionTarget::KeyConstraints => KEYS,
            ExtractionTarget::Sequences => SEQUENCES,
        };
        Some(Cow::Owned(template.trim().replace("{schemas}", USER_SCHEMAS)))
    }

    fn boolean_encoding(&self) -> BooleanEncoding {
        BooleanEncoding::YesNo
    }

    fn value_type(&self, column: &ColumnType) -> Result<SqlValueType> {
        let Some(name) = column.name.as_deref() else {
            return Err(ExtractError::UnexpectedValue {
                column: 6,
                expected: "type name",
            });
        };
        let code = match name {
            "boolean" => SqlType::Boolean,
            "smallint" => SqlType::Int16,
            "integer" => SqlType::Int32,
            "bigint" => SqlType::Int64,
            "numeric" => SqlType::Decimal,
            "real" => SqlType::Float,
            "double precision" => SqlType::Double,
            "character" => SqlType::Char,
            "character varying" if column.length.is_none() => SqlType::VarCharMax,
            "character varying" => SqlType::VarChar,
            "text" => SqlType::VarCharMax,
            "bytea" => SqlType::VarBinaryMax,
            "date" => SqlType::Date,
            "time without time zone" => SqlType::Time,
            "timestamp without time zone" => SqlType::DateTime,
            "timestamp with time zone" => SqlType::DateTimeOffset,
            "interval" => SqlType::Interval,
            "uuid" => SqlType::Guid,
            other => return Ok(SqlValueType::custom(other)),
        };
        let mut data_type = SqlValueType::new(code);
        match code {
            SqlType::Char | SqlType::VarChar => data_type.length = column.length,
            SqlType::Decimal => {
                data_type.precision = column.precision;
                data_type.scale = column.scale;
            }
            _ => {}
        }
        Ok(data_type)
    }

    fn table_kind(&self, value: &CatalogValue) -> Result<TableKind> {
        match value {
            CatalogValue::Text(kind) if matches!(kind.as_str(), "r" | "p") => {
                Ok(TableKind::Regular)
            }
            other => Err(ExtractError::UnknownTableKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> ColumnType {
        ColumnType {
            name: Some(name.to_string()),
            ..ColumnType::default()
        }
    }

    #[test]
    fn every_target_has_a_query_without_placeholders() {
        for target in ExtractionTarget::ALL {
            let sql = PostgresCatalog.query(target).unwrap();
            assert!(!sql.contains("{schemas}"), "{target}");
            assert!(sql.starts_with("SELECT"), "{target}");
            assert!(sql.contains("ORDER BY"), "{target}");
        }
    }

    #[test]
    fn information_schema_type_names_map_to_canonical_types() {
        let catalog = PostgresCatalog;
        assert_eq!(
            catalog.value_type(&named("integer")).unwrap(),
            SqlValueType::new(SqlType::Int32)
        );
        let varchar = ColumnType {
            length: Some(40),
            ..named("character varying")
        };
        assert_eq!(catalog.value_type(&varchar).unwrap(), SqlValueType::varchar(40));
        let numeric = ColumnType {
            precision: Some(10),
            scale: Some(2),
            ..named("numeric")
        };
        assert_eq!(catalog.value_type(&numeric).unwrap(), SqlValueType::decimal(10, 2));
        assert_eq!(
            catalog.value_type(&named("citext")).unwrap(),
            SqlValueType::custom("citext")
        );
    }

    #[test]
    fn only_ordinary_and_partitioned_tables_are_accepted() {
        assert_eq!(
            PostgresCatalog.table_kind(&"r".into()).unwrap(),
            TableKind::Regular
        );
        assert!(matches!(
            PostgresCatalog.table_kind(&"v".into()),
            Err(ExtractError::UnknownTableKind(_))
        ));
    }
}
