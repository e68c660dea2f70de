//! Schema definition rendering.

use core::fmt::Write as _;

use super::{plain_text, CompileError, CompilerContext, Result};
use crate::ast::{Accept, ColumnChange, SqlAlterAction, SqlDdl};
use crate::dialect::{AlterColumnSql, CreateIndexSql, Feature, IndexKeySql};
use crate::model::{
    CharacterSet, Constraint, ConstraintKind, Index, IndexTarget, Named, PartitionBoundary,
    PartitionFunction, QualifiedName, ReferentialAction, Sequence, Table, TableColumn, TableKind,
    View, ViewDefinition,
};

impl CompilerContext<'_> {
    pub(super) fn ddl(&mut self, ddl: &SqlDdl) -> Result<String> {
        match ddl {
            SqlDdl::CreateSchema { name } => {
                self.dialect.require(Feature::Schemas, "schemas")?;
                Ok(format!("CREATE SCHEMA {}", self.dialect.quote_identifier(name)))
            }
            SqlDdl::DropSchema { name, cascade } => {
                self.dialect.require(Feature::Schemas, "schemas")?;
                let cascade = self.cascade(*cascade)?;
                Ok(format!(
                    "DROP SCHEMA {}{cascade}",
                    self.dialect.quote_identifier(name)
                ))
            }
            SqlDdl::CreateTable { schema, table } => self.create_table(schema, table),
            SqlDdl::DropTable { table, cascade } => {
                let cascade = self.cascade(*cascade)?;
                Ok(format!(
                    "DROP TABLE {}{cascade}",
                    self.dialect.qualified_name(table)
                ))
            }
            SqlDdl::RenameTable { table, new_name } => self.dialect.rename_table(table, new_name),
            SqlDdl::MoveTable { table, new_schema } => self.dialect.move_table(table, new_schema),
            SqlDdl::AlterTable { table, action } => self.alter_table(table, action),
            SqlDdl::CreateIndex { table, index } => self.create_index(table, index),
            SqlDdl::DropIndex { table, name } => self.dialect.drop_index(table, name),
            SqlDdl::CreateView { schema, view } => self.create_view(schema, view),
            SqlDdl::DropView { view } => {
                Ok(format!("DROP VIEW {}", self.dialect.qualified_name(view)))
            }
            SqlDdl::CreateSequence { schema, sequence } => self.create_sequence(schema, sequence),
            SqlDdl::AlterSequence {
                sequence,
                descriptor,
            } => {
                self.dialect.require(Feature::Sequences, "sequences")?;
                let options = self.dialect.sequence_options(descriptor, true)?;
                if options.is_empty() {
                    return Err(CompileError::InvalidNode(format!(
                        "ALTER SEQUENCE {} without changes",
                        sequence.name
                    )));
                }
                Ok(format!(
                    "ALTER SEQUENCE {} {options}",
                    self.dialect.qualified_name(sequence)
                ))
            }
            SqlDdl::DropSequence { sequence } => {
                self.dialect.require(Feature::Sequences, "sequences")?;
                Ok(format!(
                    "DROP SEQUENCE {}",
                    self.dialect.qualified_name(sequence)
                ))
            }
            SqlDdl::CreateCharacterSet {
                schema,
                character_set,
            } => self.create_character_set(schema, character_set),
            SqlDdl::DropCharacterSet { name } => {
                self.dialect.require(Feature::CharacterSets, "character sets")?;
                Ok(format!(
                    "DROP CHARACTER SET {}",
                    self.dialect.qualified_name(name)
                ))
            }
            SqlDdl::CreateCollation { schema, collation } => {
                let name = self
                    .dialect
                    .qualified_name(&QualifiedName::new(schema.as_str(), collation.name()));
                self.dialect.create_collation(&name, collation)
            }
            SqlDdl::DropCollation { name } => {
                self.dialect.require(Feature::Collations, "collations")?;
                Ok(format!(
                    "DROP COLLATION {}",
                    self.dialect.qualified_name(name)
                ))
            }
            SqlDdl::CreatePartitionFunction { function, .. } => {
                self.create_partition_function(function)
            }
            SqlDdl::DropPartitionFunction { name } => {
                self.dialect
                    .require(Feature::PartitionFunctions, "partition functions")?;
                Ok(format!(
                    "DROP PARTITION FUNCTION {}",
                    self.dialect.quote_identifier(&name.name)
                ))
            }
        }
    }

    fn cascade(&self, cascade: bool) -> Result<&'static str> {
        if cascade {
            self.dialect.require(Feature::CascadeDrop, "CASCADE")?;
            Ok(" CASCADE")
        } else {
            Ok("")
        }
    }

    /// `"name" type [COLLATE c] [DEFAULT v] [identity] [NOT NULL]`.
    fn column_definition(&mut self, table_name: &str, column: &TableColumn) -> Result<String> {
        let mut text = format!(
            "{} {}",
            self.dialect.quote_identifier(column.name()),
            self.dialect.type_name(&column.data_type)?
        );
        if let Some(collation) = &column.collation {
            let _ = write!(text, " COLLATE {}", self.dialect.collation_name(collation));
        }
        if let Some(default) = &column.default_value {
            let value = self.expression(default)?;
            let clause = self.dialect.column_default(table_name, column.name(), &value);
            let _ = write!(text, " {clause}");
        }
        if let Some(identity) = &column.identity {
            let _ = write!(text, " {}", self.dialect.identity_clause(identity)?);
        }
        if !column.is_nullable {
            text.push_str(" NOT NULL");
        }
        Ok(text)
    }

    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|column| self.dialect.quote_identifier(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `CONSTRAINT "name" ...` as used inside CREATE TABLE and ADD.
    fn constraint(&mut self, constraint: &Constraint) -> Result<String> {
        let mut text = format!(
            "CONSTRAINT {} ",
            self.dialect.quote_identifier(constraint.name())
        );
        match &constraint.kind {
            ConstraintKind::PrimaryKey { columns } => {
                let _ = write!(text, "PRIMARY KEY ({})", self.column_list(columns));
            }
            ConstraintKind::Unique { columns } => {
                let _ = write!(text, "UNIQUE ({})", self.column_list(columns));
            }
            ConstraintKind::Check { condition } => {
                let condition = self.expression(condition)?;
                let _ = write!(text, "CHECK ({condition})");
            }
            ConstraintKind::ForeignKey(foreign_key) => {
                let _ = write!(
                    text,
                    "FOREIGN KEY ({}) REFERENCES {} ({})",
                    self.column_list(foreign_key.columns()),
                    self.dialect.qualified_name(&foreign_key.referenced_table),
                    self.column_list(foreign_key.referenced_columns())
                );
                if foreign_key.on_delete != ReferentialAction::NoAction {
                    let _ = write!(text, " ON DELETE {}", foreign_key.on_delete.as_sql());
                }
                if foreign_key.on_update != ReferentialAction::NoAction {
                    let _ = write!(text, " ON UPDATE {}", foreign_key.on_update.as_sql());
                }
            }
        }
        if constraint.is_deferrable {
            self.dialect
                .require(Feature::DeferrableConstraints, "deferrable constraints")?;
            let initially = if constraint.is_initially_deferred {
                "DEFERRED"
            } else {
                "IMMEDIATE"
            };
            let _ = write!(text, " DEFERRABLE INITIALLY {initially}");
        }
        Ok(text)
    }

    /// The single integer key column that the engine declares inline, if
    /// the table has one.
    fn auto_increment_column<'t>(&self, table: &'t Table) -> Option<(&'t TableColumn, &'t str)> {
        if !self.dialect.supports(Feature::AutoIncrementKey) {
            return None;
        }
        let key = table.primary_key()?;
        let [column] = key.local_columns() else {
            return None;
        };
        let column = table.column(column)?;
        (column.identity.is_some() && column.data_type.type_code.is_integer())
            .then_some((column, key.name()))
    }

    fn create_table(&mut self, schema: &str, table: &Table) -> Result<String> {
        if table.columns().is_empty() {
            return Err(CompileError::InvalidNode(format!(
                "table {} has no columns",
                table.name()
            )));
        }
        let name = QualifiedName::new(schema, table.name());
        let (head, name, tail) = match table.kind {
            TableKind::Regular => (
                "CREATE TABLE".to_string(),
                self.dialect.qualified_name(&name),
                String::new(),
            ),
            TableKind::Temporary {
                is_global,
                preserve_rows,
            } => {
                let (head, tail) = self.dialect.temporary_table(is_global, preserve_rows)?;
                (head, self.dialect.temporary_table_name(&name, is_global), tail)
            }
        };

        let inline_key = self.auto_increment_column(table);
        let mut definitions = Vec::with_capacity(table.columns().len());
        for column in table.columns() {
            let definition = match inline_key {
                Some((key_column, constraint)) if key_column.name() == column.name() => format!(
                    "{} {}",
                    self.dialect.quote_identifier(column.name()),
                    self.dialect.auto_increment_key(column, constraint)?
                ),
                _ => self.column_definition(table.name(), column)?,
            };
            definitions.push(definition);
        }
        for constraint in table.constraints() {
            let inlined = inline_key.is_some_and(|(_, key)| key == constraint.name());
            if !inlined {
                definitions.push(self.constraint(constraint)?);
            }
        }
        Ok(format!("{head} {name} ({}){tail}", definitions.join(", ")))
    }

    fn alter_table(&mut self, table: &QualifiedName, action: &SqlAlterAction) -> Result<String> {
        let qualified = self.dialect.qualified_name(table);
        match action {
            SqlAlterAction::AddColumn(column) => {
                let definition = self.column_definition(&table.name, column)?;
                Ok(format!(
                    "ALTER TABLE {qualified} {} {definition}",
                    self.dialect.add_column_keyword()
                ))
            }
            SqlAlterAction::DropColumn { column, cascade } => {
                self.dialect.require(Feature::DropColumn, "column drop")?;
                let cascade = self.cascade(*cascade)?;
                Ok(format!(
                    "ALTER TABLE {qualified} {} {}{cascade}",
                    self.dialect.drop_column_keyword(),
                    self.dialect.quote_identifier(column)
                ))
            }
            SqlAlterAction::RenameColumn { column, new_name } => {
                self.dialect.rename_column(table, column, new_name)
            }
            SqlAlterAction::AlterColumn { column, change } => {
                self.alter_column(table, &qualified, column, change)
            }
            SqlAlterAction::AddConstraint(constraint) => {
                self.dialect
                    .require(Feature::AlterConstraints, "adding constraints")?;
                let constraint = self.constraint(constraint)?;
                Ok(format!("ALTER TABLE {qualified} ADD {constraint}"))
            }
            SqlAlterAction::DropConstraint { name, cascade } => {
                self.dialect
                    .require(Feature::AlterConstraints, "dropping constraints")?;
                let cascade = self.cascade(*cascade)?;
                Ok(format!(
                    "ALTER TABLE {qualified} DROP CONSTRAINT {}{cascade}",
                    self.dialect.quote_identifier(name)
                ))
            }
        }
    }

    fn alter_column(
        &mut self,
        table: &QualifiedName,
        qualified: &str,
        column: &TableColumn,
        change: &ColumnChange,
    ) -> Result<String> {
        let data_type = match change {
            ColumnChange::DataType(data_type) => self.dialect.type_name(data_type)?,
            _ => self.dialect.type_name(&column.data_type)?,
        };
        let is_nullable = match change {
            ColumnChange::Nullability(is_nullable) => *is_nullable,
            _ => column.is_nullable,
        };
        let default_value = match (&column.default_value, change) {
            (_, ColumnChange::DropDefault) | (None, _) => None,
            (Some(default), _) => Some(self.expression(default)?),
        };
        let quoted = self.dialect.quote_identifier(column.name());
        let sql = AlterColumnSql {
            table: qualified,
            table_name: &table.name,
            column: &quoted,
            column_name: column.name(),
            data_type: &data_type,
            is_nullable,
            default_value: default_value.as_deref(),
        };
        match change {
            ColumnChange::DataType(_) => self.dialect.alter_column_type(&sql),
            ColumnChange::Nullability(_) => self.dialect.alter_column_nullability(&sql),
            ColumnChange::SetDefault if sql.default_value.is_none() => {
                Err(CompileError::InvalidNode(format!(
                    "column {} has no default to set",
                    column.name()
                )))
            }
            ColumnChange::SetDefault | ColumnChange::DropDefault => {
                self.dialect.alter_column_default(&sql)
            }
        }
    }

    fn create_index(&mut self, table: &QualifiedName, index: &Index) -> Result<String> {
        if index.is_bitmap {
            return Err(CompileError::unsupported(
                self.dialect.name(),
                "bitmap indexes",
            ));
        }
        let mut keys = Vec::with_capacity(index.columns().len());
        for column in index.columns() {
            let (text, is_expression) = match &column.target {
                IndexTarget::Column(name) => (self.dialect.quote_identifier(name), false),
                IndexTarget::Expression(expression) => (self.expression(expression)?, true),
            };
            keys.push(IndexKeySql {
                text,
                is_expression,
                descending: !column.ascending,
            });
        }
        let filter = index
            .filter
            .as_ref()
            .map(|filter| self.expression(filter))
            .transpose()?;
        let name = self.dialect.quote_identifier(index.name());
        let qualified = self.dialect.qualified_name(table);
        self.dialect.create_index(&CreateIndexSql {
            name: &name,
            table: &qualified,
            unique: index.is_unique,
            clustered: index.is_clustered,
            keys: &keys,
            filter: filter.as_deref(),
            fill_factor: index.fill_factor,
        })
    }

    fn create_view(&mut self, schema: &str, view: &View) -> Result<String> {
        let name = self
            .dialect
            .qualified_name(&QualifiedName::new(schema, view.name()));
        let definition = match &view.definition {
            Some(ViewDefinition::Native(text)) => plain_text(text)?.to_string(),
            Some(ViewDefinition::Query(select)) => select.accept(self)?,
            None => {
                return Err(CompileError::InvalidNode(format!(
                    "view {} has no definition",
                    view.name()
                )))
            }
        };
        let mut text = format!("CREATE VIEW {name}");
        if !view.columns().is_empty() {
            let columns = view
                .columns()
                .iter()
                .map(|column| self.dialect.quote_identifier(column.name()))
                .collect::<Vec<_>>();
            let _ = write!(text, " ({})", columns.join(", "));
        }
        let _ = write!(text, " AS {definition}");
        Ok(text)
    }

    fn create_sequence(&self, schema: &str, sequence: &Sequence) -> Result<String> {
        self.dialect.require(Feature::Sequences, "sequences")?;
        let name = self
            .dialect
            .qualified_name(&QualifiedName::new(schema, sequence.name()));
        let options = self.dialect.sequence_options(&sequence.descriptor, false)?;
        if options.is_empty() {
            Ok(format!("CREATE SEQUENCE {name}"))
        } else {
            Ok(format!("CREATE SEQUENCE {name} {options}"))
        }
    }

    fn create_character_set(&self, schema: &str, character_set: &CharacterSet) -> Result<String> {
        self.dialect
            .require(Feature::CharacterSets, "character sets")?;
        let Some(source) = &character_set.source else {
            return Err(CompileError::InvalidNode(format!(
                "character set {} has no source",
                character_set.name()
            )));
        };
        Ok(format!(
            "CREATE CHARACTER SET {} AS GET {}",
            self.dialect
                .qualified_name(&QualifiedName::new(schema, character_set.name())),
            self.dialect.quote_identifier(source)
        ))
    }

    fn create_partition_function(&self, function: &PartitionFunction) -> Result<String> {
        self.dialect
            .require(Feature::PartitionFunctions, "partition functions")?;
        let boundary = match function.boundary {
            PartitionBoundary::Left => "LEFT",
            PartitionBoundary::Right => "RIGHT",
        };
        Ok(format!(
            "CREATE PARTITION FUNCTION {} ({}) AS RANGE {boundary} FOR VALUES ({})",
            self.dialect.quote_identifier(function.name()),
            self.dialect.type_name(&function.data_type)?,
            function.boundary_values.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{ColumnChange, SqlAlterAction, SqlDdl, SqlExpression};
    use crate::compiler::{CompileError, SqlCompiler};
    use crate::dialect::GenericDialect;
    use crate::model::{
        Constraint, ForeignKey, Index, IndexColumn, QualifiedName, ReferentialAction, Sequence,
        SequenceDescriptor, SqlType, SqlValueType, Table, TableColumn, View, ViewDefinition,
    };

    fn compile(ddl: &SqlDdl) -> Result<String, CompileError> {
        let dialect = GenericDialect::new();
        SqlCompiler::new(&dialect).compile_ddl(ddl).map(|command| command.text)
    }

    fn orders() -> Table {
        let mut table = Table::new("orders");
        table
            .add_column(TableColumn::new("id", SqlType::Int64).not_null())
            .unwrap();
        table
            .add_column(
                TableColumn::new("status", SqlValueType::varchar(20))
                    .default_value(SqlExpression::literal("new")),
            )
            .unwrap();
        table
            .add_column(TableColumn::new("customer_id", SqlType::Int32))
            .unwrap();
        table
            .add_constraint(Constraint::primary_key("pk_orders", &["id"]))
            .unwrap();
        table
            .add_constraint(Constraint::foreign_key(
                "fk_orders_customer",
                ForeignKey::new(QualifiedName::new("app", "customers"))
                    .with_columns("customer_id", "id")
                    .on_delete(ReferentialAction::Cascade),
            ))
            .unwrap();
        table
    }

    #[test]
    fn test_create_table() {
        let ddl = SqlDdl::CreateTable {
            schema: "app".to_string(),
            table: orders(),
        };
        assert_eq!(
            compile(&ddl).unwrap(),
            concat!(
                r#"CREATE TABLE "app"."orders" ("id" BIGINT NOT NULL, "#,
                r#""status" VARCHAR(20) DEFAULT 'new', "customer_id" INTEGER, "#,
                r#"CONSTRAINT "pk_orders" PRIMARY KEY ("id"), "#,
                r#"CONSTRAINT "fk_orders_customer" FOREIGN KEY ("customer_id") "#,
                r#"REFERENCES "app"."customers" ("id") ON DELETE CASCADE)"#
            )
        );
    }

    #[test]
    fn test_create_table_without_columns_is_invalid() {
        let ddl = SqlDdl::CreateTable {
            schema: "app".to_string(),
            table: Table::new("empty"),
        };
        assert!(matches!(compile(&ddl), Err(CompileError::InvalidNode(_))));
    }

    #[test]
    fn test_deferrable_constraint() {
        let ddl = SqlDdl::alter(
            QualifiedName::new("app", "orders"),
            SqlAlterAction::AddConstraint(
                Constraint::unique("uq_orders_status", &["status"]).deferrable(true),
            ),
        );
        assert_eq!(
            compile(&ddl).unwrap(),
            r#"ALTER TABLE "app"."orders" ADD CONSTRAINT "uq_orders_status" UNIQUE ("status") DEFERRABLE INITIALLY DEFERRED"#
        );
    }

    #[test]
    fn test_alter_column_changes() {
        let table = QualifiedName::new("app", "orders");
        let column = TableColumn::new("status", SqlValueType::varchar(40));
        let retype = SqlDdl::alter(
            table.clone(),
            SqlAlterAction::AlterColumn {
                column: column.clone(),
                change: ColumnChange::DataType(SqlValueType::varchar(40)),
            },
        );
        assert_eq!(
            compile(&retype).unwrap(),
            r#"ALTER TABLE "app"."orders" ALTER COLUMN "status" SET DATA TYPE VARCHAR(40)"#
        );
        let drop_default = SqlDdl::alter(
            table.clone(),
            SqlAlterAction::AlterColumn {
                column: column.clone(),
                change: ColumnChange::DropDefault,
            },
        );
        assert_eq!(
            compile(&drop_default).unwrap(),
            r#"ALTER TABLE "app"."orders" ALTER COLUMN "status" DROP DEFAULT"#
        );
        let set_missing = SqlDdl::alter(
            table,
            SqlAlterAction::AlterColumn {
                column,
                change: ColumnChange::SetDefault,
            },
        );
        assert!(matches!(
            compile(&set_missing),
            Err(CompileError::InvalidNode(_))
        ));
    }

    #[test]
    fn test_drop_with_cascade() {
        let ddl = SqlDdl::DropTable {
            table: QualifiedName::new("app", "orders"),
            cascade: true,
        };
        assert_eq!(compile(&ddl).unwrap(), r#"DROP TABLE "app"."orders" CASCADE"#);
    }

    #[test]
    fn test_index_and_view() {
        let index = Index::new("ix_orders_status")
            .unique()
            .with_column(IndexColumn::column("status").descending());
        let ddl = SqlDdl::CreateIndex {
            table: QualifiedName::new("app", "orders"),
            index,
        };
        assert_eq!(
            compile(&ddl).unwrap(),
            r#"CREATE UNIQUE INDEX "ix_orders_status" ON "app"."orders" ("status" DESC)"#
        );

        let mut view = View::new("open_orders")
            .with_definition(ViewDefinition::Native("SELECT 1".to_string()));
        view.create_column("one").unwrap();
        let ddl = SqlDdl::CreateView {
            schema: "app".to_string(),
            view,
        };
        assert_eq!(
            compile(&ddl).unwrap(),
            r#"CREATE VIEW "app"."open_orders" ("one") AS SELECT 1"#
        );
    }

    #[test]
    fn test_filtered_index_is_unsupported_without_feature() {
        let index = Index::new("ix_open")
            .with_column(IndexColumn::column("status"))
            .filtered(SqlExpression::column("status").eq(SqlExpression::literal("open")));
        let ddl = SqlDdl::CreateIndex {
            table: QualifiedName::new("app", "orders"),
            index,
        };
        assert!(matches!(
            compile(&ddl),
            Err(CompileError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_sequences() {
        let sequence =
            Sequence::new("order_seq").with_descriptor(SequenceDescriptor::new(100, 5));
        let ddl = SqlDdl::CreateSequence {
            schema: "app".to_string(),
            sequence,
        };
        assert_eq!(
            compile(&ddl).unwrap(),
            r#"CREATE SEQUENCE "app"."order_seq" START WITH 100 INCREMENT BY 5"#
        );

        let alter = SqlDdl::AlterSequence {
            sequence: QualifiedName::new("app", "order_seq"),
            descriptor: SequenceDescriptor::default(),
        };
        assert!(matches!(compile(&alter), Err(CompileError::InvalidNode(_))));
    }
}
