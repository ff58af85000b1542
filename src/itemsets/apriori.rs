//! Apriori
//!
//! Level-wise frequent itemset mining. Level `k + 1` candidates are joined from the frequent
//! itemsets of level `k` that share their first `k - 1` items, and a candidate is kept only if
//! all of its `k`-subsets are frequent. Each level costs one scan of the occurrence matrix.

use std::time::Instant;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::{
    items::{ItemId, ItemList, is_sorted_subset},
    itemsets::{FrequentItemsets, Itemset, ItemsetMiner, fraction, observer::MiningObserver},
    parameters::{ParameterError, Threshold, validate_max_len},
    transactions::OccurrenceMatrix,
};

/// Options bounding a mining run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiningOptions {
    /// Largest itemset size to mine
    pub max_len: Option<usize>,

    /// Stop before starting a new level once this instant has passed
    pub deadline: Option<Instant>,
}

/// Apriori frequent itemset miner
#[derive(Debug, Clone, Copy, Default)]
pub struct Apriori {
    options: MiningOptions,
}

impl Apriori {
    /// Creates a miner with no length limit or deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a miner with the given options.
    pub fn with_options(options: MiningOptions) -> Self {
        Self { options }
    }

    /// Limits mined itemsets to at most `max_len` items.
    #[must_use]
    pub fn max_len(mut self, max_len: usize) -> Self {
        self.options.max_len = Some(max_len);
        self
    }

    /// Stops mining between levels once `deadline` has passed.
    #[must_use]
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.options.deadline = Some(deadline);
        self
    }

    /// The options used by this miner.
    pub fn options(&self) -> MiningOptions {
        self.options
    }

    fn deadline_passed(&self) -> bool {
        self.options
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl ItemsetMiner for Apriori {
    fn mine_with_observer(
        &self,
        matrix: &OccurrenceMatrix,
        min_support: f64,
        observer: &mut dyn MiningObserver,
    ) -> Result<FrequentItemsets, ParameterError> {
        let min_support = Threshold::new("min_support", min_support)?;
        let max_len = validate_max_len(self.options.max_len)?;
        let transactions = matrix.len();

        observer.on_level_candidates(1, matrix.item_count());

        let mut level: Vec<Itemset> = matrix
            .item_frequencies()
            .into_iter()
            .enumerate()
            .filter(|(_, count)| min_support.admits(fraction(*count, transactions)))
            .map(|(idx, count)| {
                let items: ItemList = SmallVec::from_slice(&[ItemId::new(idx)]);
                Itemset::new(items, count, transactions)
            })
            .collect();

        let mut frequent = Vec::new();
        let mut complete = true;
        let mut size = 1usize;

        loop {
            observer.on_level_frequent(size, level.len());
            debug!(level = size, frequent = level.len(), "mined itemset level");

            if level.is_empty() || max_len.is_some_and(|max| size >= max) {
                frequent.append(&mut level);
                break;
            }

            let candidates = generate_candidates(&level);
            frequent.append(&mut level);

            if candidates.is_empty() {
                break;
            }

            if self.deadline_passed() {
                warn!(
                    level = size,
                    itemsets = frequent.len(),
                    "mining deadline passed, returning partial itemsets"
                );
                complete = false;
                break;
            }

            size += 1;
            observer.on_level_candidates(size, candidates.len());
            level = count_candidates(matrix, candidates, min_support);
        }

        Ok(FrequentItemsets::new(frequent, transactions, complete))
    }
}

/// Join frequent itemsets sharing all but their last item, keeping only candidates whose
/// subsets one item smaller are all frequent.
///
/// `level` must be sorted lexicographically with itemsets of equal size.
fn generate_candidates(level: &[Itemset]) -> Vec<ItemList> {
    let known: FxHashSet<&[ItemId]> = level.iter().map(Itemset::items).collect();
    let mut candidates = Vec::new();

    for (position, left) in level.iter().enumerate() {
        let Some((left_last, prefix)) = left.items().split_last() else {
            continue;
        };

        for right in level.iter().skip(position + 1) {
            let Some((right_last, right_prefix)) = right.items().split_last() else {
                continue;
            };

            // Sorted input keeps itemsets with a shared prefix adjacent.
            if prefix != right_prefix {
                break;
            }

            let mut candidate: ItemList = SmallVec::with_capacity(prefix.len() + 2);
            candidate.extend_from_slice(prefix);
            candidate.push(*left_last);
            candidate.push(*right_last);

            if subsets_are_frequent(&candidate, &known) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

fn subsets_are_frequent(candidate: &[ItemId], known: &FxHashSet<&[ItemId]>) -> bool {
    let mut subset: ItemList = SmallVec::with_capacity(candidate.len());

    // Dropping either of the last two items gives back the joined parents.
    (0..candidate.len().saturating_sub(2)).all(|skip| {
        subset.clear();
        subset.extend(
            candidate
                .iter()
                .enumerate()
                .filter(|(position, _)| *position != skip)
                .map(|(_, item)| *item),
        );

        known.contains(subset.as_slice())
    })
}

fn count_candidates(
    matrix: &OccurrenceMatrix,
    candidates: Vec<ItemList>,
    min_support: Threshold,
) -> Vec<Itemset> {
    let size = candidates.first().map_or(0, SmallVec::len);
    let mut counts = vec![0usize; candidates.len()];

    for row in matrix.rows().iter().filter(|row| row.len() >= size) {
        for (candidate, count) in candidates.iter().zip(counts.iter_mut()) {
            if is_sorted_subset(candidate, row) {
                *count += 1;
            }
        }
    }

    let transactions = matrix.len();

    candidates
        .into_iter()
        .zip(counts)
        .filter(|(_, count)| min_support.admits(fraction(*count, transactions)))
        .map(|(items, count)| Itemset::new(items, count, transactions))
        .collect()
}
