//! Items
//!
//! Items are interned into an [`ItemCatalog`] once, then handled as dense [`ItemId`]s. Ids are
//! handed out in ascending name order, so sorting ids sorts names.

use std::{cmp::Ordering, fmt};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Dense identifier of an interned item.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(usize);

impl ItemId {
    /// Creates an item id from its position in the catalog.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the position of the item in the catalog.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A sorted, deduplicated list of item ids.
pub type ItemList = SmallVec<[ItemId; 4]>;

/// Builds an [`ItemList`] from ids in any order.
pub fn item_list(items: impl IntoIterator<Item = ItemId>) -> ItemList {
    let mut list: ItemList = items.into_iter().collect();

    list.sort_unstable();
    list.dedup();

    list
}

/// Returns whether every id in `needle` is also in `haystack`.
///
/// Both slices must be sorted.
pub fn is_sorted_subset(needle: &[ItemId], haystack: &[ItemId]) -> bool {
    if needle.len() > haystack.len() {
        return false;
    }

    let mut haystack = haystack.iter();

    'needle: for item in needle {
        for candidate in haystack.by_ref() {
            match candidate.cmp(item) {
                Ordering::Less => {}
                Ordering::Equal => continue 'needle,
                Ordering::Greater => return false,
            }
        }

        return false;
    }

    true
}

/// Bidirectional mapping between item names and [`ItemId`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCatalog {
    names: Vec<String>,
    ids: FxHashMap<String, ItemId>,
}

impl ItemCatalog {
    /// Creates a catalog from item names, deduplicated and sorted.
    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();

        names.sort_unstable();
        names.dedup();

        let ids = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), ItemId::new(idx)))
            .collect();

        Self { names, ids }
    }

    /// Returns the id of an item by name.
    pub fn id(&self, name: &str) -> Option<ItemId> {
        self.ids.get(name).copied()
    }

    /// Returns the name of an item by id.
    pub fn name(&self, id: ItemId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    /// Resolves a list of names to a sorted [`ItemList`], or `None` if any name is unknown.
    pub fn ids_of(&self, names: &[&str]) -> Option<ItemList> {
        names
            .iter()
            .map(|name| self.id(name))
            .collect::<Option<Vec<_>>>()
            .map(item_list)
    }

    /// Iterate over `(id, name)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(idx, name)| (ItemId::new(idx), name.as_str()))
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog holds no items.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Formats a set of ids as `{a, b}`.
    pub fn display_set<'a>(&'a self, items: &'a [ItemId]) -> DisplaySet<'a> {
        DisplaySet {
            catalog: self,
            items,
        }
    }
}

/// [`fmt::Display`] adapter returned by [`ItemCatalog::display_set`].
#[derive(Debug)]
pub struct DisplaySet<'a> {
    catalog: &'a ItemCatalog,
    items: &'a [ItemId],
}

impl fmt::Display for DisplaySet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;

        for (position, item) in self.items.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }

            match self.catalog.name(*item) {
                Some(name) => f.write_str(name)?,
                None => write!(f, "#{}", item.index())?,
            }
        }

        f.write_str("}")
    }
}
