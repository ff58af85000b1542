//! Analysis
//!
//! Runs the whole pipeline over an occurrence matrix: mining, rule generation and pruning.

use std::time::Instant;

use serde::Deserialize;
use tracing::{info, info_span};

use crate::{
    itemsets::{
        FrequentItemsets, ItemsetMiner,
        apriori::{Apriori, MiningOptions},
        observer::{MiningObserver, NoopObserver},
    },
    parameters::{ParameterError, Threshold, validate_max_len},
    pruning::{PrunedRules, prune_redundant},
    rules::{Rule, generate_rules},
    transactions::OccurrenceMatrix,
};

/// Default minimum support
pub const DEFAULT_MIN_SUPPORT: f64 = 0.01;

/// Default minimum confidence
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.8;

/// Thresholds for an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisParameters {
    /// Minimum fraction of transactions an itemset must appear in
    pub min_support: f64,

    /// Minimum confidence a rule must reach
    pub min_confidence: f64,

    /// Largest itemset size to mine
    pub max_len: Option<usize>,
}

impl AnalysisParameters {
    /// Creates parameters with no itemset length limit.
    pub fn new(min_support: f64, min_confidence: f64) -> Self {
        Self {
            min_support,
            min_confidence,
            max_len: None,
        }
    }

    /// Validates every parameter.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] for the first parameter out of range.
    pub fn validate(&self) -> Result<(), ParameterError> {
        Threshold::new("min_support", self.min_support)?;
        Threshold::new("min_confidence", self.min_confidence)?;
        validate_max_len(self.max_len)?;

        Ok(())
    }
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SUPPORT, DEFAULT_MIN_CONFIDENCE)
    }
}

/// Tables produced by one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Frequent itemsets with their supports
    pub itemsets: FrequentItemsets,

    /// Every rule meeting the minimum confidence
    pub rules: Vec<Rule>,

    /// Rules left after redundancy pruning
    pub pruned: PrunedRules,
}

/// Market basket analysis over an occurrence matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct Analysis {
    parameters: AnalysisParameters,
    deadline: Option<Instant>,
}

impl Analysis {
    /// Creates an analysis with the given parameters.
    pub fn new(parameters: AnalysisParameters) -> Self {
        Self {
            parameters,
            deadline: None,
        }
    }

    /// Stops mining between levels once `deadline` has passed.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The parameters of this analysis.
    pub fn parameters(&self) -> &AnalysisParameters {
        &self.parameters
    }

    /// Run the analysis.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] if any parameter is out of range. Parameters are checked
    /// before the matrix is scanned.
    pub fn run(&self, matrix: &OccurrenceMatrix) -> Result<AnalysisReport, ParameterError> {
        self.run_with_observer(matrix, &mut NoopObserver)
    }

    /// Run the analysis, reporting mining progress to `observer`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] if any parameter is out of range. Parameters are checked
    /// before the matrix is scanned.
    pub fn run_with_observer(
        &self,
        matrix: &OccurrenceMatrix,
        observer: &mut dyn MiningObserver,
    ) -> Result<AnalysisReport, ParameterError> {
        self.parameters.validate()?;

        let AnalysisParameters {
            min_support,
            min_confidence,
            max_len,
        } = self.parameters;

        let miner = Apriori::with_options(MiningOptions {
            max_len,
            deadline: self.deadline,
        });

        let itemsets = {
            let _span = info_span!("mine", min_support, transactions = matrix.len()).entered();
            miner.mine_with_observer(matrix, min_support, observer)?
        };

        let rules = {
            let _span = info_span!("rules", min_confidence).entered();
            generate_rules(&itemsets, min_confidence)?
        };

        let pruned = {
            let _span = info_span!("prune").entered();
            prune_redundant(&rules)
        };

        info!(
            transactions = matrix.len(),
            items = matrix.item_count(),
            itemsets = itemsets.len(),
            complete = itemsets.is_complete(),
            rules = rules.len(),
            pruned = pruned.len(),
            "analysis finished"
        );

        Ok(AnalysisReport {
            itemsets,
            rules,
            pruned,
        })
    }
}
