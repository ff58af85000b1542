//! Redundancy Pruning
//!
//! A single pass over the rules in their given order. A rule is dropped when an already
//! accepted rule covers both its antecedents and its consequents. Rules accepted earlier are
//! never revisited, so a more general rule arriving later does not remove them: the outcome
//! depends on input order.

use tracing::{debug, warn};

use crate::{items::is_sorted_subset, rules::Rule};

/// Output of [`prune_redundant`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrunedRules {
    rules: Vec<Rule>,
    used_fallback: bool,
}

impl PrunedRules {
    /// The surviving rules, in input order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Consumes the result, returning the rules.
    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    /// Whether pruning removed everything and the unpruned input was returned instead.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    /// Number of surviving rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule survived.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Whether `rule` is covered by one of the `accepted` rules.
///
/// A rule is covered when another row's antecedents and consequents are both supersets of its
/// own. A row identical to `rule` in itemsets and metrics does not cover it.
pub fn is_redundant(rule: &Rule, accepted: &[Rule]) -> bool {
    accepted.iter().any(|kept| {
        is_sorted_subset(rule.antecedents(), kept.antecedents())
            && is_sorted_subset(rule.consequents(), kept.consequents())
            && rule != kept
    })
}

/// Drop rules covered by an earlier accepted rule.
///
/// If nothing survives from a non-empty input, the input is returned unpruned.
pub fn prune_redundant(rules: &[Rule]) -> PrunedRules {
    let accepted = rules.iter().fold(Vec::new(), |mut accepted, rule| {
        if !is_redundant(rule, &accepted) {
            accepted.push(rule.clone());
        }

        accepted
    });

    if accepted.is_empty() && !rules.is_empty() {
        warn!(
            rules = rules.len(),
            "no rules left after redundancy pruning, using all rules"
        );

        return PrunedRules {
            rules: rules.to_vec(),
            used_fallback: true,
        };
    }

    debug!(
        rules = rules.len(),
        kept = accepted.len(),
        "pruned redundant rules"
    );

    PrunedRules {
        rules: accepted,
        used_fallback: false,
    }
}
