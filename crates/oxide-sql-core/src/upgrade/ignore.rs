//! Ignore rules: glob patterns that hide externally managed objects.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Catalog, Named};

/// A `(database, schema, table, column)` glob tuple; `*` matches any run
/// of characters and `?` a single one. Unset trailing parts match anything,
/// and the deepest set part decides what is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRule {
    /// Catalog name pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Schema name pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Table name pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Column name pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl IgnoreRule {
    /// Ignores tables matching `pattern` in every schema.
    #[must_use]
    pub fn table(pattern: impl Into<String>) -> Self {
        Self {
            table: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Ignores columns matching `column` in tables matching `table`.
    #[must_use]
    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            ..Self::table(table)
        }
    }

    /// Restricts the rule to schemas matching `pattern`.
    #[must_use]
    pub fn in_schema(mut self, pattern: impl Into<String>) -> Self {
        self.schema = Some(pattern.into());
        self
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    database: Option<Regex>,
    schema: Option<Regex>,
    table: Option<Regex>,
    column: Option<Regex>,
}

fn matches(pattern: Option<&Regex>, name: &str) -> bool {
    pattern.is_none_or(|p| p.is_match(name))
}

/// Compiles a glob into an anchored, case-insensitive regex.
fn glob(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::from("(?i)^");
    for c in pattern.chars() {
        match c {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            c => source.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    Regex::new(&source)
}

fn compile(pattern: Option<&String>) -> Result<Option<Regex>, regex::Error> {
    pattern.map(|p| glob(p)).transpose()
}

/// A compiled set of ignore rules.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<CompiledRule>,
}

impl IgnoreRules {
    /// Compiles rules.
    pub fn new(rules: &[IgnoreRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| {
                Ok(CompiledRule {
                    database: compile(rule.database.as_ref())?,
                    schema: compile(rule.schema.as_ref())?,
                    table: compile(rule.table.as_ref())?,
                    column: compile(rule.column.as_ref())?,
                })
            })
            .collect::<Result<_, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Returns true when no rule is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Removes every matched node from `catalog`.
    pub fn apply(&self, catalog: &mut Catalog) {
        for rule in &self.rules {
            if !matches(rule.database.as_ref(), catalog.name()) {
                continue;
            }
            let schemas: Vec<String> = catalog
                .schemas()
                .names()
                .filter(|name| matches(rule.schema.as_ref(), name))
                .map(str::to_string)
                .collect();
            for schema_name in schemas {
                if rule.table.is_none() && rule.column.is_none() {
                    debug!(schema = %schema_name, "Ignoring schema");
                    catalog.remove_schema(&schema_name);
                    continue;
                }
                let Some(schema) = catalog.schema_mut(&schema_name) else {
                    continue;
                };
                let tables: Vec<String> = schema
                    .tables()
                    .names()
                    .filter(|name| matches(rule.table.as_ref(), name))
                    .map(str::to_string)
                    .collect();
                for table_name in tables {
                    if rule.column.is_none() {
                        debug!(schema = %schema_name, table = %table_name, "Ignoring table");
                        schema.remove_table(&table_name);
                        continue;
                    }
                    let Some(table) = schema.table_mut(&table_name) else {
                        continue;
                    };
                    let columns: Vec<String> = table
                        .columns()
                        .iter()
                        .map(Named::name)
                        .filter(|name| matches(rule.column.as_ref(), name))
                        .map(str::to_string)
                        .collect();
                    for column in columns {
                        debug!(table = %table_name, column = %column, "Ignoring column");
                        table.remove_column(&column);
                    }
                }
            }
        }
    }
}
