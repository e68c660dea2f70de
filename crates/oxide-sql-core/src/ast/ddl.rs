//! Schema definition nodes.
//!
//! DDL nodes carry schema model objects by value, so each node compiles on
//! its own without looking anything up in a catalog.

use serde::{Deserialize, Serialize};

use crate::model::{
    CharacterSet, Collation, Constraint, Index, PartitionFunction, QualifiedName, Sequence,
    SequenceDescriptor, SqlValueType, Table, TableColumn, View,
};

/// What an `ALTER COLUMN` changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnChange {
    /// New data type.
    DataType(SqlValueType),
    /// New nullability.
    Nullability(bool),
    /// New default value, taken from the column definition.
    SetDefault,
    /// Remove the default value.
    DropDefault,
}

/// A sub-action of `ALTER TABLE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlAlterAction {
    /// `ADD COLUMN`.
    AddColumn(TableColumn),
    /// `DROP COLUMN`.
    DropColumn {
        /// Dropped column.
        column: String,
        /// Drop dependent objects too.
        cascade: bool,
    },
    /// Column rename.
    RenameColumn {
        /// Current name.
        column: String,
        /// New name.
        new_name: String,
    },
    /// Type, nullability or default change.
    AlterColumn {
        /// The column as it should be after the change.
        column: TableColumn,
        /// The changed property.
        change: ColumnChange,
    },
    /// `ADD CONSTRAINT`.
    AddConstraint(Constraint),
    /// `DROP CONSTRAINT`.
    DropConstraint {
        /// Constraint name.
        name: String,
        /// Drop dependent objects too.
        cascade: bool,
    },
}

/// A schema definition statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlDdl {
    /// `CREATE SCHEMA`.
    CreateSchema {
        /// Schema name.
        name: String,
    },
    /// `DROP SCHEMA`.
    DropSchema {
        /// Schema name.
        name: String,
        /// Drop contained objects too.
        cascade: bool,
    },
    /// `CREATE TABLE` with columns and constraints inline.
    CreateTable {
        /// Owning schema.
        schema: String,
        /// Table definition.
        table: Table,
    },
    /// `DROP TABLE`.
    DropTable {
        /// Dropped table.
        table: QualifiedName,
        /// Drop dependent objects too.
        cascade: bool,
    },
    /// Table rename within its schema.
    RenameTable {
        /// Current name.
        table: QualifiedName,
        /// New unqualified name.
        new_name: String,
    },
    /// Moves a table to another schema.
    MoveTable {
        /// Current name.
        table: QualifiedName,
        /// Target schema.
        new_schema: String,
    },
    /// `ALTER TABLE`.
    AlterTable {
        /// Altered table.
        table: QualifiedName,
        /// The change.
        action: SqlAlterAction,
    },
    /// `CREATE INDEX`.
    CreateIndex {
        /// Indexed table.
        table: QualifiedName,
        /// Index definition.
        index: Index,
    },
    /// `DROP INDEX`.
    DropIndex {
        /// Indexed table.
        table: QualifiedName,
        /// Index name.
        name: String,
    },
    /// `CREATE VIEW`.
    CreateView {
        /// Owning schema.
        schema: String,
        /// View definition.
        view: View,
    },
    /// `DROP VIEW`.
    DropView {
        /// Dropped view.
        view: QualifiedName,
    },
    /// `CREATE SEQUENCE`.
    CreateSequence {
        /// Owning schema.
        schema: String,
        /// Sequence definition.
        sequence: Sequence,
    },
    /// `ALTER SEQUENCE`.
    AlterSequence {
        /// Altered sequence.
        sequence: QualifiedName,
        /// Settings to apply; unset fields stay as they are.
        descriptor: SequenceDescriptor,
    },
    /// `DROP SEQUENCE`.
    DropSequence {
        /// Dropped sequence.
        sequence: QualifiedName,
    },
    /// `CREATE CHARACTER SET`.
    CreateCharacterSet {
        /// Owning schema.
        schema: String,
        /// Definition.
        character_set: CharacterSet,
    },
    /// `DROP CHARACTER SET`.
    DropCharacterSet {
        /// Dropped character set.
        name: QualifiedName,
    },
    /// `CREATE COLLATION`.
    CreateCollation {
        /// Owning schema.
        schema: String,
        /// Definition.
        collation: Collation,
    },
    /// `DROP COLLATION`.
    DropCollation {
        /// Dropped collation.
        name: QualifiedName,
    },
    /// `CREATE PARTITION FUNCTION`.
    CreatePartitionFunction {
        /// Owning schema.
        schema: String,
        /// Definition.
        function: PartitionFunction,
    },
    /// `DROP PARTITION FUNCTION`.
    DropPartitionFunction {
        /// Dropped function.
        name: QualifiedName,
    },
}

impl SqlDdl {
    /// `ALTER TABLE table action`.
    #[must_use]
    pub const fn alter(table: QualifiedName, action: SqlAlterAction) -> Self {
        Self::AlterTable { table, action }
    }

    /// A short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CreateSchema { .. } => "create schema",
            Self::DropSchema { .. } => "drop schema",
            Self::CreateTable { .. } => "create table",
            Self::DropTable { .. } => "drop table",
            Self::RenameTable { .. } => "rename table",
            Self::MoveTable { .. } => "move table",
            Self::AlterTable { action, .. } => match action {
                SqlAlterAction::AddColumn(_) => "add column",
                SqlAlterAction::DropColumn { .. } => "drop column",
                SqlAlterAction::RenameColumn { .. } => "rename column",
                SqlAlterAction::AlterColumn { .. } => "alter column",
                SqlAlterAction::AddConstraint(_) => "add constraint",
                SqlAlterAction::DropConstraint { .. } => "drop constraint",
            },
            Self::CreateIndex { .. } => "create index",
            Self::DropIndex { .. } => "drop index",
            Self::CreateView { .. } => "create view",
            Self::DropView { .. } => "drop view",
            Self::CreateSequence { .. } => "create sequence",
            Self::AlterSequence { .. } => "alter sequence",
            Self::DropSequence { .. } => "drop sequence",
            Self::CreateCharacterSet { .. } => "create character set",
            Self::DropCharacterSet { .. } => "drop character set",
            Self::CreateCollation { .. } => "create collation",
            Self::DropCollation { .. } => "drop collation",
            Self::CreatePartitionFunction { .. } => "create partition function",
            Self::DropPartitionFunction { .. } => "drop partition function",
        }
    }
}
