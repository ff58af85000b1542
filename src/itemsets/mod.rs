//! Frequent Itemsets

use num_traits::ToPrimitive;
use rustc_hash::FxHashMap;

use crate::{
    items::{ItemId, ItemList},
    parameters::ParameterError,
    transactions::OccurrenceMatrix,
};

pub mod apriori;
pub mod observer;

pub use apriori::{Apriori, MiningOptions};
pub use observer::{MiningObserver, NoopObserver};

/// A set of items with its support in the mined transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Itemset {
    items: ItemList,
    count: usize,
    support: f64,
}

impl Itemset {
    /// Creates an itemset from sorted items and the number of transactions containing them.
    pub fn new(items: ItemList, count: usize, transactions: usize) -> Self {
        Self {
            items,
            count,
            support: fraction(count, transactions),
        }
    }

    /// Items in the set, sorted by id.
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Number of items in the set.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of transactions containing every item of the set.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Fraction of transactions containing every item of the set.
    pub fn support(&self) -> f64 {
        self.support
    }
}

/// The frequent itemsets of one mining run.
///
/// Itemsets are ordered by size, then lexicographically by item id. Every subset of a
/// contained itemset is contained as well.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequentItemsets {
    itemsets: Vec<Itemset>,
    index: FxHashMap<ItemList, usize>,
    transaction_count: usize,
    complete: bool,
}

impl FrequentItemsets {
    /// Creates a collection from mined itemsets.
    ///
    /// `complete` is `false` when mining stopped early and larger itemsets may be missing.
    pub fn new(itemsets: Vec<Itemset>, transaction_count: usize, complete: bool) -> Self {
        let index = itemsets
            .iter()
            .enumerate()
            .map(|(position, itemset)| (itemset.items.clone(), position))
            .collect();

        Self {
            itemsets,
            index,
            transaction_count,
            complete,
        }
    }

    /// Iterate over the itemsets in mining order.
    pub fn iter(&self) -> impl Iterator<Item = &Itemset> {
        self.itemsets.iter()
    }

    /// Itemsets as a slice, in mining order.
    pub fn as_slice(&self) -> &[Itemset] {
        &self.itemsets
    }

    /// Looks up an itemset by its sorted items.
    pub fn get(&self, items: &[ItemId]) -> Option<&Itemset> {
        self.index
            .get(items)
            .and_then(|position| self.itemsets.get(*position))
    }

    /// Support of an itemset, if it is frequent.
    pub fn support_of(&self, items: &[ItemId]) -> Option<f64> {
        self.get(items).map(Itemset::support)
    }

    /// Itemsets with exactly `len` items.
    pub fn of_len(&self, len: usize) -> impl Iterator<Item = &Itemset> {
        self.itemsets.iter().filter(move |itemset| itemset.len() == len)
    }

    /// Size of the largest itemset, or zero when empty.
    pub fn max_len(&self) -> usize {
        self.itemsets.iter().map(Itemset::len).max().unwrap_or(0)
    }

    /// Number of itemsets.
    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    /// Whether no itemset met the minimum support.
    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    /// Number of transactions mined.
    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    /// Whether every level was mined.
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Mines frequent itemsets from an occurrence matrix.
pub trait ItemsetMiner {
    /// Mine every itemset whose support is at least `min_support`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] if `min_support` is outside `(0, 1]`.
    fn mine(
        &self,
        matrix: &OccurrenceMatrix,
        min_support: f64,
    ) -> Result<FrequentItemsets, ParameterError> {
        self.mine_with_observer(matrix, min_support, &mut NoopObserver)
    }

    /// Mine with an observer notified of each level.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] if `min_support` is outside `(0, 1]`.
    fn mine_with_observer(
        &self,
        matrix: &OccurrenceMatrix,
        min_support: f64,
        observer: &mut dyn MiningObserver,
    ) -> Result<FrequentItemsets, ParameterError>;
}

/// `count / total` as a float, zero when `total` is zero.
pub(crate) fn fraction(count: usize, total: usize) -> f64 {
    match (count.to_f64(), total.to_f64()) {
        (Some(count), Some(total)) if total > 0.0 => count / total,
        _ => 0.0,
    }
}
