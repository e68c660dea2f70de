//! Firebird catalog queries over the `RDB$` system tables.
//!
//! Firebird has no schemas; every row carries a NULL schema and lands in
//! the catalog's default schema. Names are blank-padded `CHAR(31)` values
//! and are trimmed on read.

use std::borrow::Cow;

use super::decode::{self, BooleanEncoding};
use super::error::{ExtractError, Result};
use super::row::CatalogValue;
use super::{CatalogDialect, ColumnType, ExtractionTarget};
use crate::ast::SqlExpression;
use crate::dialect::{DialectKind, ServerVersion};
use crate::model::{SqlType, SqlValueType, TableKind};

const TABLES: &str = r"
SELECT CAST(NULL AS VARCHAR(31)), TRIM(r.RDB$RELATION_NAME), r.RDB$RELATION_TYPE
FROM RDB$RELATIONS r
WHERE r.RDB$RELATION_TYPE IN (0, 4, 5) AND COALESCE(r.RDB$SYSTEM_FLAG, 0) = 0
ORDER BY r.RDB$RELATION_NAME";

const COLUMNS: &str = r"
SELECT CAST(NULL AS VARCHAR(31)), TRIM(rf.RDB$RELATION_NAME), rf.RDB$FIELD_POSITION,
       TRIM(rf.RDB$FIELD_NAME), f.RDB$FIELD_TYPE, f.RDB$FIELD_SUB_TYPE,
       CAST(NULL AS VARCHAR(31)), f.RDB$FIELD_PRECISION, -f.RDB$FIELD_SCALE,
       f.RDB$CHARACTER_LENGTH,
       1 - COALESCE(rf.RDB$NULL_FLAG, f.RDB$NULL_FLAG, 0),
       COALESCE(rf.RDB$DEFAULT_SOURCE, f.RDB$DEFAULT_SOURCE),
       TRIM(co.RDB$COLLATION_NAME),
       CASE WHEN rf.RDB$IDENTITY_TYPE IS NULL THEN 0 ELSE 1 END
FROM RDB$RELATION_FIELDS rf
JOIN RDB$RELATIONS r ON r.RDB$RELATION_NAME = rf.RDB$RELATION_NAME
JOIN RDB$FIELDS f ON f.RDB$FIELD_NAME = rf.RDB$FIELD_SOURCE
LEFT JOIN RDB$COLLATIONS co
  ON co.RDB$COLLATION_ID = rf.RDB$COLLATION_ID
 AND co.RDB$CHARACTER_SET_ID = f.RDB$CHARACTER_SET_ID
 AND rf.RDB$COLLATION_ID > 0
WHERE r.RDB$RELATION_TYPE IN (0, 4, 5) AND COALESCE(r.RDB$SYSTEM_FLAG, 0) = 0
ORDER BY rf.RDB$RELATION_NAME, rf.RDB$FIELD_POSITION";

const VIEWS: &str = r"
SELECT CAST(NULL AS VARCHAR(31)), TRIM(r.RDB$RELATION_NAME), r.RDB$VIEW_SOURCE
FROM RDB$RELATIONS r
WHERE r.RDB$RELATION_TYPE = 1 AND COALESCE(r.RDB$SYSTEM_FLAG, 0) = 0
ORDER BY r.RDB$RELATION_NAME";

const VIEW_COLUMNS: &str = r"
SELECT CAST(NULL AS VARCHAR(31)), TRIM(rf.RDB$RELATION_NAME), rf.RDB$FIELD_POSITION,
       TRIM(rf.RDB$FIELD_NAME)
FROM RDB$RELATION_FIELDS rf
JOIN RDB$RELATIONS r ON r.RDB$RELATION_NAME = rf.RDB$RELATION_NAME
WHERE r.RDB$RELATION_TYPE = 1 AND COALESCE(r.RDB$SYSTEM_FLAG, 0) = 0
ORDER BY rf.RDB$RELATION_NAME, rf.RDB$FIELD_POSITION";

const INDEXES: &str = r"
SELECT CAST(NULL AS VARCHAR(31)), TRIM(i.RDB$RELATION_NAME), TRIM(i.RDB$INDEX_NAME),
       COALESCE(s.RDB$FIELD_POSITION, 0), TRIM(s.RDB$FIELD_NAME), i.RDB$EXPRESSION_SOURCE,
       COALESCE(i.RDB$INDEX_TYPE, 0), COALESCE(i.RDB$UNIQUE_FLAG, 0), {condition},
       0, CAST(NULL AS INTEGER)
FROM RDB$INDICES i
LEFT JOIN RDB$INDEX_SEGMENTS s ON s.RDB$INDEX_NAME = i.RDB$INDEX_NAME
WHERE COALESCE(i.RDB$SYSTEM_FLAG, 0) = 0
  AND NOT EXISTS (
      SELECT 1 FROM RDB$RELATION_CONSTRAINTS rc
      WHERE rc.RDB$INDEX_NAME = i.RDB$INDEX_NAME)
ORDER BY i.RDB$RELATION_NAME, i.RDB$INDEX_NAME, s.RDB$FIELD_POSITION";

const FOREIGN_KEYS: &str = r"
SELECT CAST(NULL AS VARCHAR(31)), TRIM(rc.RDB$RELATION_NAME), TRIM(rc.RDB$CONSTRAINT_NAME),
       s.RDB$FIELD_POSITION, TRIM(s.RDB$FIELD_NAME),
       CAST(NULL AS VARCHAR(31)), TRIM(rrc.RDB$RELATION_NAME), TRIM(rs.RDB$FIELD_NAME),
       TRIM(ref.RDB$DELETE_RULE), TRIM(ref.RDB$UPDATE_RULE),
       CASE WHEN TRIM(rc.RDB$DEFERRABLE) = 'YES' THEN 1 ELSE 0 END,
       CASE WHEN TRIM(rc.RDB$INITIALLY_DEFERRED) = 'YES' THEN 1 ELSE 0 END
FROM RDB$RELATION_CONSTRAINTS rc
JOIN RDB$REF_CONSTRAINTS ref ON ref.RDB$CONSTRAINT_NAME = rc.RDB$CONSTRAINT_NAME
JOIN RDB$RELATION_CONSTRAINTS rrc ON rrc.RDB$CONSTRAINT_NAME = ref.RDB$CONST_NAME_UQ
JOIN RDB$INDEX_SEGMENTS s ON s.RDB$INDEX_NAME = rc.RDB$INDEX_NAME
JOIN RDB$INDEX_SEGMENTS rs
  ON rs.RDB$INDEX_NAME = rrc.RDB$INDEX_NAME
 AND rs.RDB$FIELD_POSITION = s.RDB$FIELD_POSITION
WHERE rc.RDB$CONSTRAINT_TYPE = 'FOREIGN KEY'
ORDER BY rc.RDB$RELATION_NAME, rc.RDB$CONSTRAINT_NAME, s.RDB$FIELD_POSITION";

const CHECKS: &str = r"
SELECT CAST(NULL AS VARCHAR(31)), TRIM(rc.RDB$RELATION_NAME), TRIM(rc.RDB$CONSTRAINT_NAME),
       t.RDB$TRIGGER_SOURCE
FROM RDB$RELATION_CONSTRAINTS rc
JOIN RDB$CHECK_CONSTRAINTS cc ON cc.RDB$CONSTRAINT_NAME = rc.RDB$CONSTRAINT_NAME
JOIN RDB$TRIGGERS t ON t.RDB$TRIGGER_NAME = cc.RDB$TRIGGER_NAME
WHERE rc.RDB$CONSTRAINT_TYPE = 'CHECK' AND t.RDB$TRIGGER_TYPE = 1
ORDER BY rc.RDB$RELATION_NAME, rc.RDB$CONSTRAINT_NAME";

const KEYS: &str = r"
SELECT CAST(NULL AS VARCHAR(31)), TRIM(rc.RDB$RELATION_NAME), TRIM(rc.RDB$CONSTRAINT_NAME),
       TRIM(rc.RDB$CONSTRAINT_TYPE), s.RDB$FIELD_POSITION, TRIM(s.RDB$FIELD_NAME)
FROM RDB$RELATION_CONSTRAINTS rc
JOIN RDB$INDEX_SEGMENTS s ON s.RDB$INDEX_NAME = rc.RDB$INDEX_NAME
WHERE rc.RDB$CONSTRAINT_TYPE IN ('PRIMARY KEY', 'UNIQUE')
ORDER BY rc.RDB$RELATION_NAME, rc.RDB$CONSTRAINT_NAME, s.RDB$FIELD_POSITION";

const SEQUENCES: &str = r"
SELECT CAST(NULL AS VARCHAR(31)), TRIM(g.RDB$GENERATOR_NAME), g.RDB$INITIAL_VALUE,
       g.RDB$GENERATOR_INCREMENT, CAST(NULL AS BIGINT), CAST(NULL AS BIGINT), 0,
       CAST(NULL AS BIGINT)
FROM RDB$GENERATORS g
WHERE COALESCE(g.RDB$SYSTEM_FLAG, 0) = 0
ORDER BY g.RDB$GENERATOR_NAME";

const BLR_SHORT: i64 = 7;
const BLR_LONG: i64 = 8;
const BLR_FLOAT: i64 = 10;
const BLR_DATE: i64 = 12;
const BLR_TIME: i64 = 13;
const BLR_TEXT: i64 = 14;
const BLR_INT64: i64 = 16;
const BLR_BOOL: i64 = 23;
const BLR_DOUBLE: i64 = 27;
const BLR_TIME_TZ: i64 = 28;
const BLR_TIMESTAMP_TZ: i64 = 29;
const BLR_TIMESTAMP: i64 = 35;
const BLR_VARYING: i64 = 37;
const BLR_BLOB: i64 = 261;

/// Firebird catalog configuration.
#[derive(Debug, Clone, Copy)]
pub struct FirebirdCatalog {
    version: ServerVersion,
}

impl FirebirdCatalog {
    /// Creates the catalog configuration for a server version.
    #[must_use]
    pub const fn new(version: ServerVersion) -> Self {
        Self { version }
    }
}

impl Default for FirebirdCatalog {
    fn default() -> Self {
        Self::new(DialectKind::Firebird.default_version())
    }
}

impl CatalogDialect for FirebirdCatalog {
    fn kind(&self) -> DialectKind {
        DialectKind::Firebird
    }

    fn default_schema(&self) -> &str {
        "MAIN"
    }

    fn query(&self, target: ExtractionTarget) -> Option<Cow<'static, str>> {
        let sql = match target {
            ExtractionTarget::Tables => TABLES,
            ExtractionTarget::Columns => COLUMNS,
            ExtractionTarget::Views => VIEWS,
            ExtractionTarget::ViewColumns => VIEW_COLUMNS,
            ExtractionTarget::Indexes => {
                // Partial indexes arrived in Firebird 5.
                let condition = if self.version >= ServerVersion::new(5, 0, 0) {
                    "i.RDB$CONDITION_SOURCE"
                } else {
                    "CAST(NULL AS VARCHAR(1))"
                };
                return Some(Cow::Owned(INDEXES.trim().replace("{condition}", condition)));
            }
            ExtractionTarget::ForeignKeys => FOREIGN_KEYS,
            ExtractionTarget::CheckConstraints => CHECKS,
            ExtractionTarget::KeyConstraints => KEYS,
            ExtractionTarget::Sequences => SEQUENCES,
        };
        Some(Cow::Borrowed(sql.trim()))
    }

    fn boolean_encoding(&self) -> BooleanEncoding {
        BooleanEncoding::Numeric
    }

    fn value_type(&self, column: &ColumnType) -> Result<SqlValueType> {
        let code = column.code.ok_or(ExtractError::UnexpectedValue {
            column: 4,
            expected: "Firebird field type",
        })?;
        let subcode = column.subcode.unwrap_or_default();
        let exact = |integer: SqlType| match subcode {
            1 | 2 => SqlValueType {
                precision: column.precision,
                scale: Some(column.scale.unwrap_or(0)),
                ..SqlValueType::new(SqlType::Decimal)
            },
            _ if column.scale.is_some_and(|s| s > 0) => SqlValueType {
                precision: column.precision,
                scale: column.scale,
                ..SqlValueType::new(SqlType::Decimal)
            },
            _ => SqlValueType::new(integer),
        };
        let sized = |code: SqlType| SqlValueType {
            length: column.length,
            ..SqlValueType::new(code)
        };
        Ok(match code {
            BLR_SHORT => exact(SqlType::Int16),
            BLR_LONG => exact(SqlType::Int32),
            BLR_INT64 => exact(SqlType::Int64),
            BLR_FLOAT => SqlValueType::new(SqlType::Float),
            BLR_DOUBLE => SqlValueType::new(SqlType::Double),
            BLR_BOOL => SqlValueType::new(SqlType::Boolean),
            BLR_DATE => SqlValueType::new(SqlType::Date),
            BLR_TIME | BLR_TIME_TZ => SqlValueType::new(SqlType::Time),
            BLR_TIMESTAMP => SqlValueType::new(SqlType::DateTime),
            BLR_TIMESTAMP_TZ => SqlValueType::new(SqlType::DateTimeOffset),
            BLR_TEXT if subcode == 1 => sized(SqlType::Binary),
            BLR_TEXT => sized(SqlType::Char),
            BLR_VARYING if subcode == 1 => sized(SqlType::VarBinary),
            BLR_VARYING => sized(SqlType::VarChar),
            BLR_BLOB if subcode == 0 => SqlValueType::new(SqlType::VarCharMax),
            BLR_BLOB if subcode == 1 => SqlValueType::new(SqlType::VarBinaryMax),
            other => SqlValueType::custom(format!("BLR {other}/{subcode}")),
        })
    }

    fn table_kind(&self, value: &CatalogValue) -> Result<TableKind> {
        match value {
            CatalogValue::Integer(0) => Ok(TableKind::Regular),
            CatalogValue::Integer(kind @ (4 | 5)) => Ok(TableKind::Temporary {
                is_global: true,
                preserve_rows: *kind == 4,
            }),
            other => Err(ExtractError::UnknownTableKind(other.to_string())),
        }
    }

    fn index_expression(&self, text: &str) -> SqlExpression {
        SqlExpression::native(decode::strip_keyword(text, "COMPUTED BY"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coded(code: i64, subcode: i64) -> ColumnType {
        ColumnType {
            code: Some(code),
            subcode: Some(subcode),
            ..ColumnType::default()
        }
    }

    #[test]
    fn scaled_integers_decode_as_decimal() {
        let catalog = FirebirdCatalog::default();
        let numeric = ColumnType {
            precision: Some(18),
            scale: Some(4),
            ..coded(BLR_INT64, 1)
        };
        assert_eq!(catalog.value_type(&numeric).unwrap(), SqlValueType::decimal(18, 4));
        assert_eq!(
            catalog.value_type(&coded(BLR_INT64, 0)).unwrap(),
            SqlValueType::new(SqlType::Int64)
        );
        assert_eq!(
            catalog.value_type(&coded(BLR_SHORT, 0)).unwrap(),
            SqlValueType::new(SqlType::Int16)
        );
    }

    #[test]
    fn blob_subtypes() {
        let catalog = FirebirdCatalog::default();
        assert_eq!(
            catalog.value_type(&coded(BLR_BLOB, 0)).unwrap(),
            SqlValueType::new(SqlType::VarCharMax)
        );
        assert_eq!(
            catalog.value_type(&coded(BLR_BLOB, 1)).unwrap(),
            SqlValueType::new(SqlType::VarBinaryMax)
        );
    }

    #[test]
    fn octet_strings_decode_as_binary() {
        let catalog = FirebirdCatalog::default();
        let guid = ColumnType {
            length: Some(16),
            ..coded(BLR_TEXT, 1)
        };
        assert_eq!(
            catalog.value_type(&guid).unwrap(),
            SqlValueType::new(SqlType::Binary).with_length(16)
        );
        let name = ColumnType {
            length: Some(30),
            ..coded(BLR_VARYING, 0)
        };
        assert_eq!(catalog.value_type(&name).unwrap(), SqlValueType::varchar(30));
    }

    #[test]
    fn global_temporary_relation_types() {
        let catalog = FirebirdCatalog::default();
        assert_eq!(
            catalog.table_kind(&CatalogValue::Integer(4)).unwrap(),
            TableKind::Temporary {
                is_global: true,
                preserve_rows: true
            }
        );
        assert_eq!(
            catalog.table_kind(&CatalogValue::Integer(5)).unwrap(),
            TableKind::Temporary {
                is_global: true,
                preserve_rows: false
            }
        );
        assert!(catalog.table_kind(&CatalogValue::Integer(1)).is_err());
    }

    #[test]
    fn partial_index_predicates_need_firebird_5() {
        let v4 = FirebirdCatalog::new(ServerVersion::new(4, 0, 0));
        let v5 = FirebirdCatalog::new(ServerVersion::new(5, 0, 0));
        let old = v4.query(ExtractionTarget::Indexes).unwrap();
        let new = v5.query(ExtractionTarget::Indexes).unwrap();
        assert!(!old.contains("RDB$CONDITION_SOURCE"));
        assert!(new.contains("i.RDB$CONDITION_SOURCE"));
    }

    #[test]
    fn default_sources_lose_their_keyword() {
        let catalog = FirebirdCatalog::default();
        assert_eq!(
            catalog.default_value("DEFAULT 'new'"),
            Some(SqlExpression::native("'new'"))
        );
        assert_eq!(
            catalog.index_expression("COMPUTED BY (UPPER(NAME))"),
            SqlExpression::native("(UPPER(NAME))")
        );
    }
}
