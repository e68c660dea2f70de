//! SELECT, INSERT, UPDATE and DELETE rendering.

use core::fmt::Write as _;

use super::{CompileError, CompilerContext, Result};
use crate::ast::{
    Accept, InsertSource, OrderDirection, SqlDelete, SqlFrom, SqlInsert, SqlSelect, SqlTableRef,
    SqlUpdate,
};
use crate::dialect::{Feature, LimitClause};

impl CompilerContext<'_> {
    pub(super) fn select(&mut self, select: &SqlSelect) -> Result<String> {
        self.push_scope();
        let text = self.select_in_scope(select);
        self.pop_scope();
        text
    }

    fn select_in_scope(&mut self, select: &SqlSelect) -> Result<String> {
        if let Some(from) = &select.from {
            self.bind_from(from);
        }
        let limit = select
            .limit
            .as_ref()
            .map(|limit| self.expression(limit))
            .transpose()?;
        let offset = select
            .offset
            .as_ref()
            .map(|offset| self.expression(offset))
            .transpose()?;
        let limit = self.dialect.limit_clause(
            limit.as_deref(),
            offset.as_deref(),
            !select.order_by.is_empty(),
        )?;

        let mut text = "SELECT".to_string();
        if let LimitClause::Head(head) = &limit {
            let _ = write!(text, " {head}");
        }
        if select.distinct {
            text.push_str(" DISTINCT");
        }
        if let LimitClause::HeadAfterDistinct(head) = &limit {
            let _ = write!(text, " {head}");
        }

        if select.columns.is_empty() {
            text.push_str(" *");
        } else {
            let mut columns = Vec::with_capacity(select.columns.len());
            for item in &select.columns {
                let mut column = self.expression(&item.expression)?;
                if let Some(alias) = &item.alias {
                    let _ = write!(column, " AS {}", self.dialect.quote_identifier(alias));
                }
                columns.push(column);
            }
            let _ = write!(text, " {}", columns.join(", "));
        }

        if let Some(from) = &select.from {
            let from = self.from(from)?;
            let _ = write!(text, " FROM {from}");
        }
        if let Some(filter) = &select.filter {
            let filter = self.expression(filter)?;
            let _ = write!(text, " WHERE {filter}");
        }
        if !select.group_by.is_empty() {
            let keys = select
                .group_by
                .iter()
                .map(|key| self.expression(key))
                .collect::<Result<Vec<_>>>()?;
            let _ = write!(text, " GROUP BY {}", keys.join(", "));
        }
        if let Some(having) = &select.having {
            let having = self.expression(having)?;
            let _ = write!(text, " HAVING {having}");
        }
        if !select.order_by.is_empty() {
            let mut orders = Vec::with_capacity(select.order_by.len());
            for order in &select.order_by {
                let mut entry = self.expression(&order.expression)?;
                if order.direction == OrderDirection::Desc {
                    entry.push_str(" DESC");
                }
                orders.push(entry);
            }
            let _ = write!(text, " ORDER BY {}", orders.join(", "));
        }
        if let LimitClause::Tail(tail) = &limit {
            let _ = write!(text, " {tail}");
        }
        if !select.hints.is_empty() {
            if let Some(hints) = self.dialect.query_hints(&select.hints) {
                let _ = write!(text, " {hints}");
            }
        }
        Ok(text)
    }

    fn bind_from(&mut self, from: &SqlFrom) {
        match from {
            SqlFrom::Table(table) => self.bind_table(table),
            SqlFrom::Join { left, right, .. } => {
                self.bind_from(left);
                self.bind_from(right);
            }
            SqlFrom::Query { id, alias, .. } => self.bind(*id, alias, Some(alias)),
        }
    }

    fn bind_table(&mut self, table: &SqlTableRef) {
        self.bind(table.id, &table.table.name, table.alias.as_deref());
    }

    /// `"schema"."table" AS "alias"`, with a generated alias when needed.
    fn table_source(&self, table: &SqlTableRef) -> String {
        let name = self.dialect.qualified_name(&table.table);
        match table
            .alias
            .as_deref()
            .or_else(|| self.generated_alias(table.id))
        {
            Some(alias) => format!("{name} AS {}", self.dialect.quote_identifier(alias)),
            None => name,
        }
    }

    fn from(&mut self, from: &SqlFrom) -> Result<String> {
        match from {
            SqlFrom::Table(table) => Ok(self.table_source(table)),
            SqlFrom::Join {
                kind,
                left,
                right,
                on,
            } => {
                let left = self.from(left)?;
                let right = self.from(right)?;
                let mut text = format!("{left} {} {right}", kind.as_str());
                if let Some(on) = on {
                    let on = self.expression(on)?;
                    let _ = write!(text, " ON {on}");
                }
                Ok(text)
            }
            SqlFrom::Query { select, alias, .. } => {
                let select = select.accept(self)?;
                Ok(format!(
                    "({select}) AS {}",
                    self.dialect.quote_identifier(alias)
                ))
            }
        }
    }

    pub(super) fn insert(&mut self, insert: &SqlInsert) -> Result<String> {
        self.push_scope();
        let text = self.insert_in_scope(insert);
        self.pop_scope();
        text
    }

    fn insert_in_scope(&mut self, insert: &SqlInsert) -> Result<String> {
        self.bind_table(&insert.table);
        let mut text = format!(
            "INSERT INTO {}",
            self.dialect.qualified_name(&insert.table.table)
        );
        if !insert.columns.is_empty() {
            let columns = insert
                .columns
                .iter()
                .map(|column| self.dialect.quote_identifier(column))
                .collect::<Vec<_>>();
            let _ = write!(text, " ({})", columns.join(", "));
        }
        match &insert.source {
            InsertSource::Values(rows) => {
                if rows.is_empty() {
                    return Err(CompileError::InvalidNode(
                        "INSERT without rows".to_string(),
                    ));
                }
                if rows.len() > 1 {
                    self.dialect
                        .require(Feature::MultiRowValues, "multi-row VALUES")?;
                }
                let mut rendered = Vec::with_capacity(rows.len());
                for row in rows {
                    let values = row
                        .iter()
                        .map(|value| self.expression(value))
                        .collect::<Result<Vec<_>>>()?;
                    rendered.push(format!("({})", values.join(", ")));
                }
                let _ = write!(text, " VALUES {}", rendered.join(", "));
            }
            InsertSource::Select(select) => {
                let select = select.accept(self)?;
                let _ = write!(text, " {select}");
            }
            InsertSource::DefaultValues => text.push_str(" DEFAULT VALUES"),
        }
        Ok(text)
    }

    pub(super) fn update(&mut self, update: &SqlUpdate) -> Result<String> {
        self.push_scope();
        let text = self.update_in_scope(update);
        self.pop_scope();
        text
    }

    fn update_in_scope(&mut self, update: &SqlUpdate) -> Result<String> {
        if update.assignments.is_empty() {
            return Err(CompileError::InvalidNode(
                "UPDATE without assignments".to_string(),
            ));
        }
        self.bind_table(&update.table);
        let mut assignments = Vec::with_capacity(update.assignments.len());
        for assignment in &update.assignments {
            let value = self.expression(&assignment.value)?;
            assignments.push(format!(
                "{} = {value}",
                self.dialect.quote_identifier(&assignment.column)
            ));
        }
        let mut text = format!(
            "UPDATE {} SET {}",
            self.table_source(&update.table),
            assignments.join(", ")
        );
        if let Some(filter) = &update.filter {
            let filter = self.expression(filter)?;
            let _ = write!(text, " WHERE {filter}");
        }
        Ok(text)
    }

    pub(super) fn delete(&mut self, delete: &SqlDelete) -> Result<String> {
        self.push_scope();
        self.bind_table(&delete.table);
        let text = format!("DELETE FROM {}", self.table_source(&delete.table));
        let text = match &delete.filter {
            Some(filter) => self
                .expression(filter)
                .map(|filter| format!("{text} WHERE {filter}")),
            None => Ok(text),
        };
        self.pop_scope();
        text
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{
        InsertSource, JoinType, OrderDirection, SqlDelete, SqlExpression, SqlFrom, SqlInsert,
        SqlSelect, SqlStatement, SqlTableRef, SqlUpdate,
    };
    use crate::compiler::{CompileError, SqlCompiler};
    use crate::dialect::GenericDialect;
    use crate::model::QualifiedName;

    fn compile(statement: impl Into<SqlStatement>) -> Result<String, CompileError> {
        let dialect = GenericDialect::new();
        SqlCompiler::new(&dialect)
            .compile(&statement.into())
            .map(|command| command.text)
    }

    fn table(name: &str) -> SqlTableRef {
        SqlTableRef::new(QualifiedName::new("app", name))
    }

    #[test]
    fn test_select_with_join_and_order() {
        let users = table("users");
        let orders = table("orders").alias("o");
        let source = SqlFrom::from(users.clone()).join(
            JoinType::Left,
            orders.clone(),
            orders.column("user_id").eq(users.column("id")),
        );
        let query = SqlSelect::from_source(source)
            .column(users.column("name"))
            .column_as(SqlExpression::count_all(), "total")
            .group_by(users.column("name"))
            .order_by(users.column("name"), OrderDirection::Desc)
            .limit(10)
            .offset(20);
        assert_eq!(
            compile(query).unwrap(),
            r#"SELECT "users"."name", COUNT(*) AS "total" FROM "app"."users" LEFT JOIN "app"."orders" AS "o" ON "o"."user_id" = "users"."id" GROUP BY "users"."name" ORDER BY "users"."name" DESC OFFSET 20 ROWS FETCH FIRST 10 ROWS ONLY"#
        );
    }

    #[test]
    fn test_self_join_gets_generated_alias() {
        let parent = table("nodes");
        let child = table("nodes");
        let source = SqlFrom::from(parent.clone()).join(
            JoinType::Inner,
            child.clone(),
            child.column("parent_id").eq(parent.column("id")),
        );
        let query = SqlSelect::from_source(source).column(child.column("id"));
        assert_eq!(
            compile(query).unwrap(),
            r#"SELECT "t1"."id" FROM "app"."nodes" INNER JOIN "app"."nodes" AS "t1" ON "t1"."parent_id" = "nodes"."id""#
        );
    }

    #[test]
    fn test_derived_table() {
        let users = table("users");
        let inner = SqlSelect::from_source(users.clone()).column(users.column("id"));
        let derived = SqlFrom::query(inner, "u");
        let SqlFrom::Query { id, .. } = &derived else {
            unreachable!()
        };
        let column = SqlExpression::Column(crate::ast::SqlColumnRef {
            table: Some(*id),
            name: "id".to_string(),
        });
        let query = SqlSelect::from_source(derived.clone()).column(column);
        assert_eq!(
            compile(query).unwrap(),
            r#"SELECT "u"."id" FROM (SELECT "users"."id" FROM "app"."users") AS "u""#
        );
    }

    #[test]
    fn test_insert_forms() {
        let users = table("users");
        let insert = SqlInsert::values(
            users.clone(),
            vec![
                ("id", SqlExpression::literal(1)),
                ("name", SqlExpression::literal("O'Hara")),
            ],
        );
        assert_eq!(
            compile(insert).unwrap(),
            r#"INSERT INTO "app"."users" ("id", "name") VALUES (1, 'O''Hara')"#
        );

        let defaults = SqlInsert {
            table: users.clone(),
            columns: Vec::new(),
            source: InsertSource::DefaultValues,
        };
        assert_eq!(
            compile(defaults).unwrap(),
            r#"INSERT INTO "app"."users" DEFAULT VALUES"#
        );

        let empty = SqlInsert {
            table: users,
            columns: vec!["id".to_string()],
            source: InsertSource::Values(Vec::new()),
        };
        assert!(matches!(compile(empty), Err(CompileError::InvalidNode(_))));
    }

    #[test]
    fn test_update_and_delete() {
        let users = table("users");
        let update = SqlUpdate::new(users.clone())
            .set("name", SqlExpression::literal("x"))
            .filter(users.column("id").eq(SqlExpression::literal(1)));
        assert_eq!(
            compile(update).unwrap(),
            r#"UPDATE "app"."users" SET "name" = 'x' WHERE "users"."id" = 1"#
        );

        let delete = SqlDelete {
            table: users.clone(),
            filter: Some(users.column("id").gt(SqlExpression::literal(5))),
        };
        assert_eq!(
            compile(delete).unwrap(),
            r#"DELETE FROM "app"."users" WHERE "users"."id" > 5"#
        );

        assert!(matches!(
            compile(SqlUpdate::new(users)),
            Err(CompileError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_parameters_follow_text_order() {
        let users = table("users");
        let query = SqlSelect::from_source(users.clone())
            .column(users.column("id"))
            .filter(users.column("name").eq(SqlExpression::parameter("bob")))
            .limit(5);
        let dialect = GenericDialect::new();
        let command = SqlCompiler::new(&dialect).compile(&query.into()).unwrap();
        assert_eq!(
            command.text,
            r#"SELECT "users"."id" FROM "app"."users" WHERE "users"."name" = ? FETCH FIRST 5 ROWS ONLY"#
        );
        assert_eq!(command.parameters.len(), 1);
        assert_eq!(command.parameters[0].position, 1);
    }

    #[test]
    fn test_batch_joins_statements() {
        let users = table("users");
        let batch = SqlStatement::Batch(vec![
            SqlDelete {
                table: users.clone(),
                filter: None,
            }
            .into(),
            SqlUpdate::new(users)
                .set("name", SqlExpression::null())
                .into(),
        ]);
        assert_eq!(
            compile(batch).unwrap(),
            "DELETE FROM \"app\".\"users\";\nUPDATE \"app\".\"users\" SET \"name\" = NULL"
        );
    }
}
