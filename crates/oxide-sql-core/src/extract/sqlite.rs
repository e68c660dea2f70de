//! SQLite catalog queries over `sqlite_master` and the table-valued pragmas.
//!
//! SQLite keeps no names for primary keys or foreign keys; they are
//! synthesized as `PK_<table>` and `FK_<table>_<id>`. Check constraints and
//! sequences are not exposed by the catalog.

use std::borrow::Cow;

use super::decode::BooleanEncoding;
use super::error::{ExtractError, Result};
use super::row::CatalogValue;
use super::{CatalogDialect, ColumnType, ExtractionTarget};
use crate::dialect::DialectKind;
use crate::model::{SqlType, SqlValueType, TableKind};

const TABLES: &str = r"
SELECT 'main', m.name, m.type
FROM sqlite_master m
WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%'
ORDER BY m.name";

const COLUMNS: &str = r#"
SELECT 'main', m.name, p.cid, p.name, NULL, NULL, p.type, NULL, NULL, NULL,
       CASE WHEN p."notnull" = 0 AND p.pk = 0 THEN 1 ELSE 0 END,
       p.dflt_value, NULL,
       CASE WHEN p.pk = 1 AND upper(p.type) = 'INTEGER'
             AND instr(upper(m.sql), 'AUTOINCREMENT') > 0 THEN 1 ELSE 0 END
FROM sqlite_master m
JOIN pragma_table_info(m.name) p
WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%'
ORDER BY m.name, p.cid"#;

const VIEWS: &str = r"
SELECT 'main', m.name, trim(substr(m.sql, instr(upper(m.sql), ' AS ') + 4))
FROM sqlite_master m
WHERE m.type = 'view'
ORDER BY m.name";

const VIEW_COLUMNS: &str = r"
SELECT 'main', m.name, p.cid, p.name
FROM sqlite_master m
JOIN pragma_table_info(m.name) p
WHERE m.type = 'view'
ORDER BY m.name, p.cid";

const INDEXES: &str = r#"
SELECT 'main', m.name, l.name, x.seqno, x.name, NULL, x."desc", l."unique",
       CASE WHEN l.partial = 1 THEN substr(i.sql, instr(upper(i.sql), ' WHERE ') + 7) END,
       0, NULL
FROM sqlite_master m
JOIN pragma_index_list(m.name) l
JOIN pragma_index_xinfo(l.name) x
JOIN sqlite_master i ON i.type = 'index' AND i.name = l.name
WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%'
  AND l.origin = 'c' AND x.key = 1
  AND NOT EXISTS (SELECT 1 FROM pragma_index_xinfo(l.name) e WHERE e.cid = -2)
ORDER BY m.name, l.name, x.seqno"#;

const FOREIGN_KEYS: &str = r#"
SELECT 'main', m.name, 'FK_' || m.name || '_' || f.id, f.seq, f."from",
       'main', f."table",
       COALESCE(f."to", (SELECT p.name FROM pragma_table_info(f."table") p
                         WHERE p.pk = f.seq + 1)),
       f.on_delete, f.on_update, 0, 0
FROM sqlite_master m
JOIN pragma_foreign_key_list(m.name) f
WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%'
ORDER BY m.name, f.id, f.seq"#;

const KEYS: &str = r"
SELECT 'main', m.name, 'PK_' || m.name, 'PRIMARY KEY', p.pk, p.name
FROM sqlite_master m
JOIN pragma_table_info(m.name) p
WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%' AND p.pk > 0
UNION ALL
SELECT 'main', m.name, l.name, 'UNIQUE', x.seqno, x.name
FROM sqlite_master m
JOIN pragma_index_list(m.name) l
JOIN pragma_index_info(l.name) x
WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%' AND l.origin = 'u'
ORDER BY 2, 3, 5";

/// SQLite catalog configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteCatalog;

impl CatalogDialect for SqliteCatalog {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn default_schema(&self) -> &str {
        "main"
    }

    fn query(&self, target: ExtractionTarget) -> Option<Cow<'static, str>> {
        let sql = match target {
            ExtractionTarget::Tables => TABLES,
            ExtractionTarget::Columns => COLUMNS,
            ExtractionTarget::Views => VIEWS,
            ExtractionTarget::ViewColumns => VIEW_COLUMNS,
            ExtractionTarget::Indexes => INDEXES,
            ExtractionTarget::ForeignKeys => FOREIGN_KEYS,
            ExtractionTarget::KeyConstraints => KEYS,
            ExtractionTarget::CheckConstraints | ExtractionTarget::Sequences => return None,
        };
        Some(Cow::Borrowed(sql.trim()))
    }

    fn boolean_encoding(&self) -> BooleanEncoding {
        BooleanEncoding::Numeric
    }

    fn value_type(&self, column: &ColumnType) -> Result<SqlValueType> {
        Ok(declared_type(column.name.as_deref().unwrap_or_default()))
    }

    fn table_kind(&self, value: &CatalogValue) -> Result<TableKind> {
        match value {
            CatalogValue::Text(kind) if kind == "table" => Ok(TableKind::Regular),
            other => Err(ExtractError::UnknownTableKind(other.to_string())),
        }
    }
}

/// Parses a declared column type such as `VARCHAR(40)` or `DECIMAL(10, 2)`.
///
/// Names the compiler emits map back exactly; anything else falls back to
/// SQLite's affinity rules.
fn declared_type(declared: &str) -> SqlValueType {
    let declared = declared.trim();
    let (base, args) = match declared.split_once('(') {
        Some((base, rest)) => (base.trim(), rest.trim_end_matches(')')),
        None => (declared, ""),
    };
    let args: Vec<u32> = args
        .split(',')
        .filter_map(|arg| arg.trim().parse().ok())
        .collect();
    let base = base.to_ascii_uppercase();
    let length = args.first().copied();

    let code = match base.as_str() {
        "" | "BLOB" => SqlType::VarBinaryMax,
        "BOOLEAN" | "BOOL" => SqlType::Boolean,
        "TINYINT" => SqlType::Int8,
        "SMALLINT" => SqlType::Int16,
        "INT" | "MEDIUMINT" => SqlType::Int32,
        "INTEGER" | "BIGINT" => SqlType::Int64,
        "DECIMAL" | "NUMERIC" => {
            let precision = length.and_then(|p| u8::try_from(p).ok());
            let scale = args.get(1).and_then(|s| u8::try_from(*s).ok());
            return SqlValueType {
                precision,
                scale: precision.map(|_| scale.unwrap_or(0)),
                ..SqlValueType::new(SqlType::Decimal)
            };
        }
        "FLOAT" => SqlType::Float,
        "REAL" | "DOUBLE" | "DOUBLE PRECISION" => SqlType::Double,
        "CHAR" | "CHARACTER" | "NCHAR" => SqlType::Char,
        "VARCHAR" | "NVARCHAR" | "CHARACTER VARYING" if length.is_some() => SqlType::VarChar,
        "VARCHAR" | "NVARCHAR" | "CHARACTER VARYING" | "TEXT" | "CLOB" => SqlType::VarCharMax,
        "BINARY" => SqlType::Binary,
        "VARBINARY" if length.is_some() => SqlType::VarBinary,
        "VARBINARY" => SqlType::VarBinaryMax,
        "DATE" => SqlType::Date,
        "TIME" => SqlType::Time,
        "DATETIME" | "TIMESTAMP" => SqlType::DateTime,
        "DATETIMEOFFSET" => SqlType::DateTimeOffset,
        "INTERVAL" => SqlType::Interval,
        "UUID" | "GUID" => SqlType::Guid,
        other if other.contains("INT") => SqlType::Int64,
        other if ["CHAR", "CLOB", "TEXT"].iter().any(|a| other.contains(a)) => {
            SqlType::VarCharMax
        }
        other if other.contains("BLOB") => SqlType::VarBinaryMax,
        other if ["REAL", "FLOA", "DOUB"].iter().any(|a| other.contains(a)) => SqlType::Double,
        _ => return SqlValueType::custom(declared),
    };
    let data_type = SqlValueType::new(code);
    match (code, length) {
        (SqlType::Char | SqlType::VarChar | SqlType::Binary | SqlType::VarBinary, Some(length)) => {
            data_type.with_length(length)
        }
        _ => data_type,
    }
}
