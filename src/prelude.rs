//! Affinity prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    analysis::{Analysis, AnalysisParameters, AnalysisReport},
    fixtures::{FixtureError, TransactionFixture},
    items::{ItemCatalog, ItemId, ItemList},
    itemsets::{
        FrequentItemsets, Itemset, ItemsetMiner,
        apriori::{Apriori, MiningOptions},
        observer::{LevelRecorder, LevelSummary, MiningObserver, NoopObserver},
    },
    parameters::{ParameterError, Threshold},
    pruning::{PrunedRules, is_redundant, prune_redundant},
    report::{ReportError, write_itemsets, write_rules, write_top_items},
    rules::{Rule, RuleMetric, generate_rules, top_by},
    transactions::{
        ItemQuantity, ItemRow, OccurrenceMatrix, TransactionEncoder, TransactionRecord,
    },
};
