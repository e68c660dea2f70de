//! Catalog rows and the sources that produce them.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use super::error::{ExtractError, Result, SourceError};

/// A single value read from a catalog query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogValue {
    /// SQL NULL.
    Null,
    /// Any integer column.
    Integer(i64),
    /// Any floating point column.
    Real(f64),
    /// Any character column.
    Text(String),
}

impl fmt::Display for CatalogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for CatalogValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for CatalogValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for CatalogValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for CatalogValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CatalogValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for CatalogValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One row of a catalog query, in the query's projected column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogRow(Vec<CatalogValue>);

impl CatalogRow {
    /// Creates a row from its values.
    #[must_use]
    pub const fn new(values: Vec<CatalogValue>) -> Self {
        Self(values)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for a row without values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw value at `column`; missing trailing columns read as NULL.
    #[must_use]
    pub fn value(&self, column: usize) -> &CatalogValue {
        self.0.get(column).unwrap_or(&CatalogValue::Null)
    }

    /// Trimmed text, with NULL and blank values read as `None`.
    ///
    /// Fixed-width catalogs (Firebird pads names with spaces) need the trim.
    pub fn text(&self, column: usize) -> Result<Option<String>> {
        match self.value(column) {
            CatalogValue::Null => Ok(None),
            CatalogValue::Text(v) => {
                let v = v.trim();
                Ok((!v.is_empty()).then(|| v.to_string()))
            }
            CatalogValue::Integer(v) => Ok(Some(v.to_string())),
            CatalogValue::Real(_) => Err(ExtractError::UnexpectedValue {
                column,
                expected: "text",
            }),
        }
    }

    /// Trimmed text that must be present.
    pub fn required_text(&self, column: usize) -> Result<String> {
        self.text(column)?.ok_or(ExtractError::UnexpectedValue {
            column,
            expected: "non-empty text",
        })
    }

    /// An integer, accepting numeric text.
    pub fn integer(&self, column: usize) -> Result<Option<i64>> {
        let unexpected = ExtractError::UnexpectedValue {
            column,
            expected: "integer",
        };
        match self.value(column) {
            CatalogValue::Null => Ok(None),
            CatalogValue::Integer(v) => Ok(Some(*v)),
            CatalogValue::Real(_) => Err(unexpected),
            CatalogValue::Text(v) if v.trim().is_empty() => Ok(None),
            CatalogValue::Text(v) => v.trim().parse().map(Some).map_err(|_| unexpected),
        }
    }

    /// A small non-negative integer such as a length or a precision.
    pub fn unsigned<T: TryFrom<i64>>(&self, column: usize) -> Result<Option<T>> {
        self.integer(column)?
            .map(|v| {
                T::try_from(v).map_err(|_| ExtractError::UnexpectedValue {
                    column,
                    expected: "small non-negative integer",
                })
            })
            .transpose()
    }
}

impl From<Vec<CatalogValue>> for CatalogRow {
    fn from(values: Vec<CatalogValue>) -> Self {
        Self(values)
    }
}

impl FromIterator<CatalogValue> for CatalogRow {
    fn from_iter<I: IntoIterator<Item = CatalogValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Builds a [`CatalogRow`] from heterogeneous values.
///
/// ```rust
/// use oxide_sql_core::catalog_row;
///
/// let row = catalog_row!["main", "orders", 1, None::<&str>];
/// assert_eq!(row.len(), 4);
/// ```
#[macro_export]
macro_rules! catalog_row {
    ($($value:expr),* $(,)?) => {
        $crate::extract::CatalogRow::new(vec![$($crate::extract::CatalogValue::from($value)),*])
    };
}

/// Synchronous access to a live catalog.
///
/// Implemented by driver crates; each call runs one read-only metadata
/// query and returns its rows in order.
pub trait CatalogSource {
    /// Runs `sql` and returns all rows.
    fn fetch(&mut self, sql: &str) -> std::result::Result<Vec<CatalogRow>, SourceError>;
}

/// Asynchronous access to a live catalog.
///
/// The extractor suspends only while a batch is being fetched.
pub trait AsyncCatalogSource {
    /// Runs `sql` and resolves to all rows.
    fn fetch(
        &mut self,
        sql: &str,
    ) -> impl Future<Output = std::result::Result<Vec<CatalogRow>, SourceError>> + Send;
}
