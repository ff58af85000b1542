//! Transactions
//!
//! Encoding of raw purchase records into a binary occurrence matrix.
//!
//! Records are assumed to be complete: rows with missing fields are dropped during ingestion,
//! before they reach the encoder.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use smallvec::SmallVec;
use tracing::debug;

use crate::items::{ItemCatalog, ItemId};

/// Items present in a single transaction, sorted by id.
pub type ItemRow = SmallVec<[ItemId; 8]>;

/// A raw purchase record: one line of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionRecord {
    /// Transaction (bill) identifier
    pub transaction: String,

    /// Item name
    pub item: String,

    /// Quantity purchased
    pub quantity: i64,

    /// Unit price, if known
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl TransactionRecord {
    /// Creates a record without a price.
    pub fn new(transaction: impl Into<String>, item: impl Into<String>, quantity: i64) -> Self {
        Self {
            transaction: transaction.into(),
            item: item.into(),
            quantity,
            price: None,
        }
    }

    /// Sets the unit price of the record.
    #[must_use]
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    /// Whether the record counts towards the encoding: positive quantity, and a positive price
    /// when one is given.
    pub fn is_countable(&self) -> bool {
        self.quantity > 0 && self.price.is_none_or(|price| price > Decimal::ZERO)
    }
}

/// Total quantity purchased of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuantity {
    /// Item name
    pub item: String,

    /// Summed quantity over countable records
    pub quantity: i64,
}

/// Turns purchase records into an [`OccurrenceMatrix`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionEncoder;

impl TransactionEncoder {
    /// Encode records into an occurrence matrix.
    ///
    /// Records with a non-positive quantity or price are excluded. Quantities for the same
    /// `(transaction, item)` pair are summed, and a positive total marks the item present.
    /// Transactions keep the order in which they first appear.
    pub fn encode(records: &[TransactionRecord]) -> OccurrenceMatrix {
        let mut order: FxHashMap<&str, usize> = FxHashMap::default();
        let mut totals: Vec<(&str, FxHashMap<&str, i64>)> = Vec::new();
        let mut skipped = 0usize;

        for record in records {
            if !record.is_countable() {
                skipped += 1;
                continue;
            }

            let position = *order
                .entry(record.transaction.as_str())
                .or_insert_with(|| {
                    totals.push((record.transaction.as_str(), FxHashMap::default()));
                    totals.len() - 1
                });

            if let Some((_, items)) = totals.get_mut(position) {
                let total = items.entry(record.item.as_str()).or_insert(0);
                *total = total.saturating_add(record.quantity);
            }
        }

        debug!(
            records = records.len(),
            skipped,
            transactions = totals.len(),
            "encoding transaction records"
        );

        OccurrenceMatrix::from_transactions(totals.into_iter().map(|(transaction, items)| {
            let present = items
                .into_iter()
                .filter(|(_, total)| *total > 0)
                .map(|(item, _)| item);

            (transaction, present)
        }))
    }

    /// Total quantity per item over the countable records, highest first.
    ///
    /// Ties are ordered by item name.
    pub fn item_quantities(records: &[TransactionRecord]) -> Vec<ItemQuantity> {
        let mut totals: FxHashMap<&str, i64> = FxHashMap::default();

        for record in records.iter().filter(|record| record.is_countable()) {
            let total = totals.entry(record.item.as_str()).or_insert(0);
            *total = total.saturating_add(record.quantity);
        }

        let mut ranked: Vec<ItemQuantity> = totals
            .into_iter()
            .map(|(item, quantity)| ItemQuantity {
                item: item.to_string(),
                quantity,
            })
            .collect();

        ranked.sort_by(|left, right| {
            right
                .quantity
                .cmp(&left.quantity)
                .then_with(|| left.item.cmp(&right.item))
        });

        ranked
    }
}

/// Transactions × items boolean relation.
///
/// Each transaction is stored as a sorted row of the items present in it. The matrix is
/// built once and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccurrenceMatrix {
    catalog: ItemCatalog,
    transaction_ids: Vec<String>,
    rows: Vec<ItemRow>,
}

impl OccurrenceMatrix {
    /// Build a matrix from already grouped transactions.
    ///
    /// Repeated items within a transaction collapse to one. Transactions without any item are
    /// dropped.
    pub fn from_transactions<T, I, S>(transactions: impl IntoIterator<Item = (T, I)>) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let grouped: Vec<(String, Vec<String>)> = transactions
            .into_iter()
            .map(|(id, items)| {
                let id: String = id.into();
                let items: Vec<String> = items.into_iter().map(Into::into).collect();

                (id, items)
            })
            .filter(|(_, items)| !items.is_empty())
            .collect();

        let catalog = ItemCatalog::from_names(
            grouped
                .iter()
                .flat_map(|(_, items)| items.iter().map(String::as_str)),
        );

        let mut transaction_ids = Vec::with_capacity(grouped.len());
        let mut rows = Vec::with_capacity(grouped.len());

        for (id, items) in grouped {
            let mut row: ItemRow = items
                .iter()
                .filter_map(|item| catalog.id(item))
                .collect();

            row.sort_unstable();
            row.dedup();

            transaction_ids.push(id);
            rows.push(row);
        }

        Self {
            catalog,
            transaction_ids,
            rows,
        }
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix holds no transactions.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct items.
    pub fn item_count(&self) -> usize {
        self.catalog.len()
    }

    /// The catalog mapping item ids to names.
    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// All transaction rows.
    pub fn rows(&self) -> &[ItemRow] {
        &self.rows
    }

    /// Returns the items of a transaction by position.
    pub fn row(&self, transaction: usize) -> Option<&[ItemId]> {
        self.rows.get(transaction).map(SmallVec::as_slice)
    }

    /// Returns the identifier of a transaction by position.
    pub fn transaction_id(&self, transaction: usize) -> Option<&str> {
        self.transaction_ids.get(transaction).map(String::as_str)
    }

    /// Boolean matrix view: whether `item` is present in the transaction at `transaction`.
    pub fn is_present(&self, transaction: usize, item: ItemId) -> bool {
        self.row(transaction)
            .is_some_and(|row| row.binary_search(&item).is_ok())
    }

    /// Number of transactions containing each item, indexed by [`ItemId::index`].
    pub fn item_frequencies(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.item_count()];

        for item in self.rows.iter().flatten() {
            if let Some(count) = counts.get_mut(item.index()) {
                *count += 1;
            }
        }

        counts
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;

    fn names_in(matrix: &OccurrenceMatrix, transaction: usize) -> Vec<&str> {
        matrix
            .row(transaction)
            .unwrap_or_default()
            .iter()
            .filter_map(|item| matrix.catalog().name(*item))
            .collect()
    }

    #[test]
    fn excludes_non_positive_quantities_and_prices() {
        let records = [
            TransactionRecord::new("T1", "milk", 1),
            TransactionRecord::new("T1", "bread", 0),
            TransactionRecord::new("T1", "eggs", -2),
            TransactionRecord::new("T1", "jam", 1).with_price(Decimal::ZERO),
            TransactionRecord::new("T1", "tea", 1).with_price(Decimal::new(-150, 2)),
            TransactionRecord::new("T1", "butter", 3).with_price(Decimal::new(199, 2)),
        ];

        let matrix = TransactionEncoder::encode(&records);

        assert_eq!(matrix.len(), 1);
        assert_eq!(names_in(&matrix, 0), vec!["butter", "milk"]);
        assert_eq!(matrix.item_count(), 2);
    }

    #[test]
    fn duplicate_lines_collapse_to_presence() {
        let records = [
            TransactionRecord::new("T1", "milk", 2),
            TransactionRecord::new("T1", "milk", 5),
            TransactionRecord::new("T1", "bread", 1),
        ];

        let matrix = TransactionEncoder::encode(&records);

        assert_eq!(matrix.row(0).map(<[ItemId]>::len), Some(2));
        assert_eq!(matrix.item_frequencies(), vec![1, 1]);
    }

    #[test]
    fn quantity_totals_saturate() {
        let records = [
            TransactionRecord::new("T1", "milk", i64::MAX),
            TransactionRecord::new("T1", "milk", i64::MAX),
        ];

        let matrix = TransactionEncoder::encode(&records);

        assert_eq!(names_in(&matrix, 0), vec!["milk"]);
    }

    #[test]
    fn transactions_with_only_excluded_records_are_dropped() {
        let records = [
            TransactionRecord::new("T1", "milk", 0),
            TransactionRecord::new("T2", "bread", 1),
        ];

        let matrix = TransactionEncoder::encode(&records);

        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.transaction_id(0), Some("T2"));
    }

    #[test]
    fn transactions_keep_first_appearance_order() {
        let records = [
            TransactionRecord::new("B", "milk", 1),
            TransactionRecord::new("A", "bread", 1),
            TransactionRecord::new("B", "eggs", 1),
        ];

        let matrix = TransactionEncoder::encode(&records);

        assert_eq!(matrix.transaction_id(0), Some("B"));
        assert_eq!(matrix.transaction_id(1), Some("A"));
        assert_eq!(names_in(&matrix, 0), vec!["eggs", "milk"]);
    }

    #[test]
    fn item_quantities_rank_countable_totals() {
        let records = [
            TransactionRecord::new("T1", "milk", 2),
            TransactionRecord::new("T2", "milk", 3),
            TransactionRecord::new("T1", "bread", 5),
            TransactionRecord::new("T2", "eggs", 12).with_price(Decimal::ZERO),
            TransactionRecord::new("T3", "bread", -4),
            TransactionRecord::new("T3", "jam", 1),
            TransactionRecord::new("T3", "tea", 1),
        ];

        let ranked: Vec<(String, i64)> = TransactionEncoder::item_quantities(&records)
            .into_iter()
            .map(|total| (total.item, total.quantity))
            .collect();

        assert_eq!(
            ranked,
            vec![
                ("bread".to_string(), 5),
                ("milk".to_string(), 5),
                ("jam".to_string(), 1),
                ("tea".to_string(), 1),
            ]
        );
    }

    #[test]
    fn is_present_reads_as_a_boolean_matrix() -> TestResult {
        let matrix = OccurrenceMatrix::from_transactions([
            ("T1", vec!["milk", "bread"]),
            ("T2", vec!["eggs"]),
        ]);

        let milk = matrix.catalog().id("milk").ok_or("missing milk")?;
        let eggs = matrix.catalog().id("eggs").ok_or("missing eggs")?;

        assert!(matrix.is_present(0, milk));
        assert!(!matrix.is_present(0, eggs));
        assert!(matrix.is_present(1, eggs));
        assert!(!matrix.is_present(9, eggs));

        Ok(())
    }

    #[test]
    fn empty_input_yields_empty_matrix() {
        let matrix = TransactionEncoder::encode(&[]);

        assert!(matrix.is_empty());
        assert_eq!(matrix.item_count(), 0);
        assert!(matrix.item_frequencies().is_empty());
    }

    #[test]
    fn empty_baskets_are_dropped() {
        let matrix =
            OccurrenceMatrix::from_transactions([("T1", Vec::<&str>::new()), ("T2", vec!["tea"])]);

        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.transaction_id(0), Some("T2"));
    }
}
