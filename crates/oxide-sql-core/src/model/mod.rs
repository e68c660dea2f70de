//! Schema object model.
//!
//! A [`Catalog`] owns [`Schema`]s, which own tables, views, sequences and
//! the smaller vendor objects (character sets, collations, partition
//! functions). Child names are unique within their parent collection and
//! the `create_*`/`add_*` factory methods enforce it.
//!
//! Cross references, such as the table a foreign key points at, are stored
//! as names and resolved against the catalog that owns them. A cloned
//! catalog therefore always resolves into itself.
//!
//! ```rust
//! use oxide_sql_core::model::{Catalog, QualifiedName, SqlType};
//!
//! let mut catalog = Catalog::new("shop");
//! let schema = catalog.create_schema("main").unwrap();
//! let customers = schema.create_table("customers").unwrap();
//! customers.create_column("id", SqlType::Int32).unwrap();
//! customers.create_primary_key("pk_customers", &["id"]).unwrap();
//!
//! assert!(catalog.table(&QualifiedName::new("main", "customers")).is_some());
//! ```

mod catalog;
mod collection;
mod constraint;
mod error;
mod index;
mod sequence;
mod table;
mod types;
mod view;

pub use catalog::{
    Catalog, CharacterSet, Collation, PartitionBoundary, PartitionFunction, QualifiedName, Schema,
};
pub use collection::{Named, NodeCollection, NodeKind};
pub use constraint::{Constraint, ConstraintKind, ForeignKey, ReferentialAction};
pub use error::{ModelError, Result};
pub use index::{Index, IndexColumn, IndexTarget};
pub use sequence::{Sequence, SequenceDescriptor};
pub use table::{Table, TableColumn, TableKind};
pub use types::{SqlType, SqlValueType};
pub use view::{View, ViewColumn, ViewDefinition};
