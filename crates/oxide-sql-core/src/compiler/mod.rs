//! Dialect compiler.
//!
//! [`SqlCompiler`] walks a statement tree and asks its [`Dialect`] for every
//! vendor-specific token or fragment. Before rendering an expression it
//! offers the node to [`Dialect::lower`]; a dialect that lacks a construct
//! returns an equivalent tree built from primitives it does support, and
//! the compiler renders that tree instead.
//!
//! ```rust
//! use oxide_sql_core::ast::{SqlExpression, SqlSelect, SqlTableRef};
//! use oxide_sql_core::compiler::SqlCompiler;
//! use oxide_sql_core::dialect::{PostgresDialect, ServerVersion};
//! use oxide_sql_core::model::QualifiedName;
//!
//! let users = SqlTableRef::new(QualifiedName::new("public", "users"));
//! let query = SqlSelect::from_source(users.clone())
//!     .column(users.column("id"))
//!     .filter(users.column("name").eq(SqlExpression::parameter("alice")));
//!
//! let dialect = PostgresDialect::new(ServerVersion::new(16, 0, 0));
//! let command = SqlCompiler::new(&dialect).compile(&query.into()).unwrap();
//! assert_eq!(
//!     command.text,
//!     r#"SELECT "users"."id" FROM "public"."users" WHERE "users"."name" = $1"#
//! );
//! assert_eq!(command.parameters.len(), 1);
//! ```

mod ddl;
mod error;
mod expression;
pub(crate) mod lower;
mod statement;
pub mod temporal;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use error::{CompileError, Result};

use crate::ast::{
    Accept, SqlDdl, SqlDelete, SqlExpression, SqlInsert, SqlLiteral, SqlParameter, SqlSelect,
    SqlStatement, SqlUpdate, SqlVisitor, TableRefId,
};
use crate::dialect::Dialect;

/// Delimits parameter markers in partially rendered text. Markers are
/// replaced by dialect placeholders once the whole statement is rendered,
/// so placeholder numbering follows the final text order.
pub(crate) const PARAMETER_MARK: char = '\u{1}';

fn reserved_character() -> CompileError {
    CompileError::InvalidNode("text contains a reserved control character".to_string())
}

/// Rejects caller-supplied text that carries [`PARAMETER_MARK`].
pub(crate) fn plain_text(text: &str) -> Result<&str> {
    if text.contains(PARAMETER_MARK) {
        Err(reserved_character())
    } else {
        Ok(text)
    }
}

/// A parameter of a compiled command, in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBinding {
    /// 1-based placeholder position.
    pub position: usize,
    /// Parameter name, if the tree named it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Bound value; `None` when the caller supplies it at execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SqlLiteral>,
}

/// Dialect SQL text plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledCommand {
    /// SQL text.
    pub text: String,
    /// Parameters in placeholder order.
    pub parameters: Vec<ParameterBinding>,
}

/// Compiles trees for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct SqlCompiler<'d> {
    dialect: &'d dyn Dialect,
}

impl<'d> SqlCompiler<'d> {
    /// Creates a compiler for a dialect.
    #[must_use]
    pub const fn new(dialect: &'d dyn Dialect) -> Self {
        Self { dialect }
    }

    /// The target dialect.
    #[must_use]
    pub const fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Compiles a statement.
    pub fn compile(&self, statement: &SqlStatement) -> Result<CompiledCommand> {
        let mut context = CompilerContext::new(self.dialect);
        let text = statement.accept(&mut context)?;
        let command = context.finish(&text)?;
        debug!(
            dialect = self.dialect.name(),
            parameters = command.parameters.len(),
            "Compiled statement"
        );
        Ok(command)
    }

    /// Compiles a DDL statement.
    pub fn compile_ddl(&self, ddl: &SqlDdl) -> Result<CompiledCommand> {
        let mut context = CompilerContext::new(self.dialect);
        let text = ddl.accept(&mut context)?;
        context.finish(&text)
    }

    /// Compiles a free-standing expression with unqualified columns.
    pub fn compile_expression(&self, expression: &SqlExpression) -> Result<CompiledCommand> {
        let mut context = CompilerContext::new(self.dialect);
        let text = expression.accept(&mut context)?;
        context.finish(&text)
    }
}

/// Table references visible in one query level.
#[derive(Debug, Default)]
struct Scope {
    qualifiers: HashMap<TableRefId, String>,
    aliases: HashMap<TableRefId, String>,
    names: HashSet<String>,
}

/// State of one compilation.
pub(crate) struct CompilerContext<'d> {
    dialect: &'d dyn Dialect,
    parameters: Vec<SqlParameter>,
    scopes: Vec<Scope>,
    generated_aliases: usize,
}

impl<'d> CompilerContext<'d> {
    fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            parameters: Vec::new(),
            scopes: Vec::new(),
            generated_aliases: 0,
        }
    }

    /// Registers a parameter and returns its marker.
    fn parameter(&mut self, parameter: &SqlParameter) -> String {
        let index = self.parameters.len();
        self.parameters.push(parameter.clone());
        format!("{PARAMETER_MARK}{index}{PARAMETER_MARK}")
    }

    /// Replaces parameter markers with placeholders, numbering them in text
    /// order. A marker that appears twice binds twice. A marker that no
    /// parameter produced means caller text carried the reserved character.
    fn finish(self, text: &str) -> Result<CompiledCommand> {
        let mut output = String::with_capacity(text.len());
        let mut parameters = Vec::new();
        let mut pieces = text.split(PARAMETER_MARK);
        if let Some(head) = pieces.next() {
            output.push_str(head);
        }
        while let Some(marker) = pieces.next() {
            let parameter = marker
                .parse::<usize>()
                .ok()
                .and_then(|index| self.parameters.get(index))
                .ok_or_else(reserved_character)?;
            let position = parameters.len() + 1;
            output.push_str(&self.dialect.placeholder(position));
            parameters.push(ParameterBinding {
                position,
                name: parameter.name.clone(),
                value: parameter.value.clone(),
            });
            output.push_str(pieces.next().ok_or_else(reserved_character)?);
        }
        Ok(CompiledCommand {
            text: output,
            parameters,
        })
    }

    fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Makes `id` resolvable in the innermost scope. A table name seen
    /// twice in one scope without an alias gets a generated alias.
    fn bind(&mut self, id: TableRefId, name: &str, alias: Option<&str>) {
        let dialect = self.dialect;
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        let visible = match alias {
            Some(alias) => alias.to_string(),
            None if scope.names.contains(name) => {
                self.generated_aliases += 1;
                let generated = format!("t{}", self.generated_aliases);
                scope.aliases.insert(id, generated.clone());
                generated
            }
            None => name.to_string(),
        };
        scope.qualifiers.insert(id, dialect.quote_identifier(&visible));
        scope.names.insert(visible);
    }

    /// Alias generated for `id` by [`Self::bind`].
    fn generated_alias(&self, id: TableRefId) -> Option<&str> {
        self.scopes
            .last()
            .and_then(|scope| scope.aliases.get(&id))
            .map(String::as_str)
    }

    /// Qualifier for a column of `id`, searching outward for correlated
    /// references.
    fn qualifier(&self, id: TableRefId) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.qualifiers.get(&id))
            .map(String::as_str)
    }
}

impl SqlVisitor for CompilerContext<'_> {
    type Output = String;
    type Error = CompileError;

    fn visit_expression(&mut self, node: &SqlExpression) -> Result<String> {
        self.expression(node)
    }

    fn visit_select(&mut self, node: &SqlSelect) -> Result<String> {
        self.select(node)
    }

    fn visit_insert(&mut self, node: &SqlInsert) -> Result<String> {
        self.insert(node)
    }

    fn visit_update(&mut self, node: &SqlUpdate) -> Result<String> {
        self.update(node)
    }

    fn visit_delete(&mut self, node: &SqlDelete) -> Result<String> {
        self.delete(node)
    }

    fn visit_ddl(&mut self, node: &SqlDdl) -> Result<String> {
        self.ddl(node)
    }

    fn visit_batch(&mut self, nodes: &[SqlStatement]) -> Result<String> {
        let parts = nodes
            .iter()
            .map(|node| node.accept(self))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(";\n"))
    }
}
