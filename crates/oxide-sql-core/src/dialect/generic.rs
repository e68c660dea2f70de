//! Generic SQL dialect.

use super::{Dialect, DialectKind, Feature, FeatureSet, ServerVersion};
use crate::compiler::{CompileError, Result};
use crate::model::{SqlType, SqlValueType};

const FEATURES: &[Feature] = &[
    Feature::Schemas,
    Feature::BooleanType,
    Feature::IdentityColumns,
    Feature::Sequences,
    Feature::RenameColumn,
    Feature::DropColumn,
    Feature::AlterColumn,
    Feature::AlterConstraints,
    Feature::DeferrableConstraints,
    Feature::CascadeDrop,
    Feature::MultiRowValues,
    Feature::Collations,
    Feature::CharacterSets,
    Feature::TemporaryTables,
    Feature::MathFunctions,
    Feature::DateTimeOffset,
    Feature::IntervalType,
    Feature::MoveTable,
];

/// A generic SQL dialect using ANSI SQL standards.
#[derive(Debug, Clone)]
pub struct GenericDialect {
    features: FeatureSet,
}

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub fn new() -> Self {
        Self {
            features: FeatureSet::for_version(ServerVersion::default(), FEATURES, &[]),
        }
    }
}

impl Default for GenericDialect {
    fn default() -> Self {
        Self::new()
    }
}

/// `NAME(length)`, or `NAME` without a length.
pub(crate) fn sized(name: &str, length: Option<u32>) -> String {
    length.map_or_else(|| name.to_string(), |length| format!("{name}({length})"))
}

/// `NAME(precision,scale)`, or `NAME` without a precision.
pub(crate) fn exact(name: &str, data_type: &SqlValueType) -> String {
    match data_type.precision {
        Some(precision) => format!("{name}({precision},{})", data_type.scale.unwrap_or(0)),
        None => name.to_string(),
    }
}

/// The vendor name of an [`SqlType::Unknown`] type.
pub(crate) fn custom<D: Dialect + ?Sized>(dialect: &D, data_type: &SqlValueType) -> Result<String> {
    data_type.type_name.clone().ok_or_else(|| {
        CompileError::unsupported(dialect.name(), "a type without code or name")
    })
}

impl Dialect for GenericDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Generic
    }

    fn version(&self) -> ServerVersion {
        ServerVersion::default()
    }

    fn features(&self) -> &FeatureSet {
        &self.features
    }

    fn type_name(&self, data_type: &SqlValueType) -> Result<String> {
        Ok(match data_type.type_code {
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Int8 | SqlType::Int16 => "SMALLINT".to_string(),
            SqlType::Int32 => "INTEGER".to_string(),
            SqlType::Int64 => "BIGINT".to_string(),
            SqlType::Decimal => exact("DECIMAL", data_type),
            SqlType::Float => "REAL".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            SqlType::Char => sized("CHAR", data_type.length),
            SqlType::VarChar => sized("VARCHAR", data_type.length),
            SqlType::VarCharMax => "CLOB".to_string(),
            SqlType::Binary => sized("BINARY", data_type.length),
            SqlType::VarBinary => sized("VARBINARY", data_type.length),
            SqlType::VarBinaryMax => "BLOB".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::DateTime => "TIMESTAMP".to_string(),
            SqlType::DateTimeOffset => "TIMESTAMP WITH TIME ZONE".to_string(),
            SqlType::Interval => "INTERVAL DAY TO SECOND".to_string(),
            SqlType::Guid => "CHAR(36)".to_string(),
            SqlType::Unknown => custom(self, data_type)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SqlLiteral;
    use crate::model::QualifiedName;

    #[test]
    fn test_generic_dialect() {
        let dialect = GenericDialect::new();
        assert_eq!(dialect.name(), "generic");
        assert_eq!(dialect.placeholder(3), "?");
        assert_eq!(dialect.quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(
            dialect.qualified_name(&QualifiedName::new("dbo", "t")),
            "\"dbo\".\"t\""
        );
        assert_eq!(
            dialect.literal(&SqlLiteral::Boolean(true)).as_deref(),
            Ok("TRUE")
        );
    }

    #[test]
    fn test_generic_types() {
        let dialect = GenericDialect::new();
        assert_eq!(
            dialect.type_name(&SqlValueType::decimal(10, 2)).as_deref(),
            Ok("DECIMAL(10,2)")
        );
        assert_eq!(
            dialect.type_name(&SqlValueType::varchar(50)).as_deref(),
            Ok("VARCHAR(50)")
        );
        assert_eq!(
            dialect.type_name(&SqlValueType::custom("GEOMETRY")).as_deref(),
            Ok("GEOMETRY")
        );
    }
}
