//! Ordered, name-unique child collections.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{ModelError, Result};

/// The kind of a schema node, used in error messages and difference paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A schema.
    Schema,
    /// A table (regular or temporary).
    Table,
    /// A table column.
    Column,
    /// An index.
    Index,
    /// A table constraint.
    Constraint,
    /// A view.
    View,
    /// A view column.
    ViewColumn,
    /// A sequence.
    Sequence,
    /// A character set.
    CharacterSet,
    /// A collation.
    Collation,
    /// A partition function.
    PartitionFunction,
}

impl NodeKind {
    /// Returns a lowercase, human readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Table => "table",
            Self::Column => "column",
            Self::Index => "index",
            Self::Constraint => "constraint",
            Self::View => "view",
            Self::ViewColumn => "view column",
            Self::Sequence => "sequence",
            Self::CharacterSet => "character set",
            Self::Collation => "collation",
            Self::PartitionFunction => "partition function",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node that lives in a [`NodeCollection`].
pub trait Named {
    /// Kind reported when a name collides.
    const KIND: NodeKind;

    /// Returns the node name.
    fn name(&self) -> &str;
}

pub(crate) trait Rename: Named {
    fn set_name(&mut self, name: String);
}

/// An ordered collection whose members have unique names.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCollection<T> {
    items: Vec<T>,
}

impl<T> Default for NodeCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Named> NodeCollection<T> {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub(crate) fn from_items(items: Vec<T>, parent: &str) -> Result<Self> {
        let mut collection = Self::new();
        for item in items {
            collection.push(parent, item)?;
        }
        Ok(collection)
    }

    /// Appends a node, failing if the name is already taken.
    pub(crate) fn push(&mut self, parent: &str, item: T) -> Result<&mut T> {
        if self.contains(item.name()) {
            return Err(ModelError::DuplicateName {
                kind: T::KIND,
                name: item.name().to_string(),
                parent: parent.to_string(),
            });
        }
        let index = self.items.len();
        self.items.push(item);
        Ok(&mut self.items[index])
    }

    pub(crate) fn get_or_insert_with(&mut self, name: &str, make: impl FnOnce() -> T) -> &mut T {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.items.push(make());
                self.items.len() - 1
            }
        };
        &mut self.items[index]
    }

    /// Looks up a node by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.items.iter().find(|item| item.name() == name)
    }

    /// Looks up a node by name for mutation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.name() == name)
    }

    /// Returns whether a node with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the position of a node in creation order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|item| item.name() == name)
    }

    /// Removes a node by name, returning it.
    pub fn remove(&mut self, name: &str) -> Option<T> {
        let index = self.position(name)?;
        Some(self.items.remove(index))
    }

    /// Iterates over the node names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(Named::name)
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
    }

    pub(crate) fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

impl<T> NodeCollection<T> {
    /// Iterates over the nodes in creation order.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Rename> NodeCollection<T> {
    pub(crate) fn rename(&mut self, parent: &str, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }
        if self.contains(new) {
            return Err(ModelError::DuplicateName {
                kind: T::KIND,
                name: new.to_string(),
                parent: parent.to_string(),
            });
        }
        let item = self.get_mut(old).ok_or_else(|| ModelError::NotFound {
            kind: T::KIND,
            name: old.to_string(),
            parent: parent.to_string(),
        })?;
        item.set_name(new.to_string());
        Ok(())
    }
}

impl<'a, T> IntoIterator for &'a NodeCollection<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for NodeCollection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Named + Deserialize<'de>> Deserialize<'de> for NodeCollection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Self::from_items(items, "").map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(String);

    impl Named for Item {
        const KIND: NodeKind = NodeKind::Column;
        fn name(&self) -> &str {
            &self.0
        }
    }

    impl Rename for Item {
        fn set_name(&mut self, name: String) {
            self.0 = name;
        }
    }

    #[test]
    fn test_push_rejects_duplicates() {
        let mut items = NodeCollection::new();
        items.push("t", Item("a".into())).unwrap();
        let err = items.push("t", Item("a".into())).unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateName {
                kind: NodeKind::Column,
                name: "a".into(),
                parent: "t".into(),
            }
        );
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_order_is_preserved() {
        let mut items = NodeCollection::new();
        for name in ["c", "a", "b"] {
            items.push("t", Item(name.into())).unwrap();
        }
        assert_eq!(items.names().collect::<Vec<_>>(), vec!["c", "a", "b"]);
        assert_eq!(items.position("b"), Some(2));
    }

    #[test]
    fn test_rename_checks_target_name() {
        let mut items = NodeCollection::new();
        items.push("t", Item("a".into())).unwrap();
        items.push("t", Item("b".into())).unwrap();
        assert!(items.rename("t", "a", "b").is_err());
        items.rename("t", "a", "z").unwrap();
        assert!(items.contains("z"));
        assert!(!items.contains("a"));
    }
}
