//! Association Rules
//!
//! Rules are expanded from frequent itemsets: every non-empty proper subset `A` of a frequent
//! itemset `I` gives the rule `A => I \ A`.

use clap::ValueEnum;
use num_traits::ToPrimitive;
use serde::Deserialize;
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    items::{ItemCatalog, ItemId, ItemList},
    itemsets::{FrequentItemsets, fraction},
    parameters::{ParameterError, Threshold},
};

/// A directed association rule with its interest metrics.
///
/// Two rules are equal only when their itemsets and every metric match.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    antecedents: ItemList,
    consequents: ItemList,
    antecedent_support: f64,
    consequent_support: f64,
    support: f64,
    confidence: f64,
    lift: f64,
    leverage: f64,
    conviction: f64,
}

impl Rule {
    /// Creates a rule from its itemsets and the supports of the antecedents, the consequents
    /// and their union. The remaining metrics are derived.
    pub fn new(
        antecedents: ItemList,
        consequents: ItemList,
        antecedent_support: f64,
        consequent_support: f64,
        support: f64,
    ) -> Self {
        let confidence = support / antecedent_support;
        let lift = confidence / consequent_support;

        Self::with_metrics(
            antecedents,
            consequents,
            [antecedent_support, consequent_support, support],
            confidence,
            lift,
        )
    }

    /// Creates a rule from transaction counts: of the antecedents, of the consequents, of
    /// their union, and of all transactions.
    ///
    /// Confidence and lift are taken straight from the counts, so a rule holding in exactly
    /// 4 of 5 transactions has a confidence of exactly `0.8`.
    pub fn from_counts(
        antecedents: ItemList,
        consequents: ItemList,
        [antecedent_count, consequent_count, count]: [usize; 3],
        transactions: usize,
    ) -> Self {
        let confidence = fraction(count, antecedent_count);
        let lift = match (
            as_f64(count) * as_f64(transactions),
            as_f64(antecedent_count) * as_f64(consequent_count),
        ) {
            (numerator, denominator) if denominator > 0.0 => numerator / denominator,
            _ => 0.0,
        };

        Self::with_metrics(
            antecedents,
            consequents,
            [
                fraction(antecedent_count, transactions),
                fraction(consequent_count, transactions),
                fraction(count, transactions),
            ],
            confidence,
            lift,
        )
    }

    fn with_metrics(
        antecedents: ItemList,
        consequents: ItemList,
        [antecedent_support, consequent_support, support]: [f64; 3],
        confidence: f64,
        lift: f64,
    ) -> Self {
        let leverage = support - antecedent_support * consequent_support;
        let conviction = if confidence >= 1.0 {
            f64::INFINITY
        } else {
            (1.0 - consequent_support) / (1.0 - confidence)
        };

        Self {
            antecedents,
            consequents,
            antecedent_support,
            consequent_support,
            support,
            confidence,
            lift,
            leverage,
            conviction,
        }
    }

    /// Items on the "if" side.
    pub fn antecedents(&self) -> &[ItemId] {
        &self.antecedents
    }

    /// Items on the "then" side.
    pub fn consequents(&self) -> &[ItemId] {
        &self.consequents
    }

    /// Support of the antecedents alone.
    pub fn antecedent_support(&self) -> f64 {
        self.antecedent_support
    }

    /// Support of the consequents alone.
    pub fn consequent_support(&self) -> f64 {
        self.consequent_support
    }

    /// Support of the antecedents and consequents together.
    pub fn support(&self) -> f64 {
        self.support
    }

    /// `support / antecedent_support`
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// `confidence / consequent_support`
    pub fn lift(&self) -> f64 {
        self.lift
    }

    /// `support - antecedent_support * consequent_support`
    pub fn leverage(&self) -> f64 {
        self.leverage
    }

    /// `(1 - consequent_support) / (1 - confidence)`, infinite for certain rules.
    pub fn conviction(&self) -> f64 {
        self.conviction
    }

    /// Value of the given metric.
    pub fn metric(&self, metric: RuleMetric) -> f64 {
        match metric {
            RuleMetric::Support => self.support,
            RuleMetric::Confidence => self.confidence,
            RuleMetric::Lift => self.lift,
            RuleMetric::Leverage => self.leverage,
            RuleMetric::Conviction => self.conviction,
        }
    }

    /// Formats the rule as `{a, b} => {c}`.
    pub fn display(&self, catalog: &ItemCatalog) -> String {
        format!(
            "{} => {}",
            catalog.display_set(&self.antecedents),
            catalog.display_set(&self.consequents)
        )
    }
}

/// Rule metrics usable for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RuleMetric {
    /// Joint support
    Support,

    /// Confidence
    Confidence,

    /// Lift
    Lift,

    /// Leverage
    Leverage,

    /// Conviction
    Conviction,
}

/// Generate every rule from `itemsets` whose confidence is at least `min_confidence`.
///
/// Rules come out in a fixed order: itemsets in mining order, then antecedents from largest to
/// smallest, each size in lexicographic order.
///
/// # Errors
///
/// Returns a [`ParameterError`] if `min_confidence` is outside `(0, 1]`.
pub fn generate_rules(
    itemsets: &FrequentItemsets,
    min_confidence: f64,
) -> Result<Vec<Rule>, ParameterError> {
    let min_confidence = Threshold::new("min_confidence", min_confidence)?;
    let mut rules = Vec::new();

    for itemset in itemsets.iter().filter(|itemset| itemset.len() >= 2) {
        let items = itemset.items();

        for size in (1..items.len()).rev() {
            for antecedents in combinations(items, size) {
                let consequents: ItemList = items
                    .iter()
                    .filter(|item| antecedents.binary_search(item).is_err())
                    .copied()
                    .collect();

                let (Some(antecedent), Some(consequent)) =
                    (itemsets.get(&antecedents), itemsets.get(&consequents))
                else {
                    debug!(
                        ?antecedents,
                        ?consequents,
                        "skipping rule with unknown subset support"
                    );
                    continue;
                };

                let rule = Rule::from_counts(
                    antecedents,
                    consequents,
                    [antecedent.count(), consequent.count(), itemset.count()],
                    itemsets.transaction_count(),
                );

                if min_confidence.admits(rule.confidence()) {
                    rules.push(rule);
                }
            }
        }
    }

    debug!(
        itemsets = itemsets.len(),
        rules = rules.len(),
        "generated association rules"
    );

    Ok(rules)
}

/// The `n` best rules by `metric`, highest first. Ties keep their original order.
pub fn top_by(rules: &[Rule], metric: RuleMetric, n: usize) -> Vec<&Rule> {
    let mut ranked: Vec<&Rule> = rules.iter().collect();

    ranked.sort_by(|left, right| right.metric(metric).total_cmp(&left.metric(metric)));
    ranked.truncate(n);

    ranked
}

fn as_f64(value: usize) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// All `size`-item combinations of `items`, in lexicographic order.
fn combinations(items: &[ItemId], size: usize) -> Vec<ItemList> {
    let len = items.len();

    if size == 0 || size > len {
        return Vec::new();
    }

    let mut indices: SmallVec<[usize; 8]> = (0..size).collect();
    let mut combinations = Vec::new();

    loop {
        combinations.push(
            indices
                .iter()
                .filter_map(|&idx| items.get(idx).copied())
                .collect(),
        );

        // Rightmost position that has not reached its final value.
        let Some(position) = (0..size)
            .rev()
            .find(|&position| indices.get(position) != Some(&(position + len - size)))
        else {
            break;
        };

        let start = indices.get(position).map_or(0, |idx| idx + 1);

        for (offset, idx) in indices.iter_mut().skip(position).enumerate() {
            *idx = start + offset;
        }
    }

    combinations
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{
        itemsets::{Apriori, Itemset, ItemsetMiner},
        transactions::OccurrenceMatrix,
    };

    use super::*;

    fn ids(raw: &[usize]) -> ItemList {
        raw.iter().copied().map(ItemId::new).collect()
    }

    #[test]
    fn combinations_are_lexicographic() {
        let items = ids(&[0, 1, 2, 3]);

        assert_eq!(
            combinations(&items, 2),
            vec![
                ids(&[0, 1]),
                ids(&[0, 2]),
                ids(&[0, 3]),
                ids(&[1, 2]),
                ids(&[1, 3]),
                ids(&[2, 3]),
            ]
        );
        assert_eq!(combinations(&items, 4), vec![items.clone()]);
        assert!(combinations(&items, 0).is_empty());
        assert!(combinations(&items, 5).is_empty());
    }

    #[test]
    fn metrics_follow_their_definitions() {
        let rule = Rule::new(ids(&[0]), ids(&[1]), 0.75, 0.75, 0.5);

        assert!((rule.confidence() - 0.5 / 0.75).abs() < 1e-12);
        assert!((rule.lift() - (0.5 / 0.75) / 0.75).abs() < 1e-12);
        assert!((rule.leverage() - (0.5 - 0.75 * 0.75)).abs() < 1e-12);
        assert!((rule.conviction() - 0.25 / (1.0 - 0.5 / 0.75)).abs() < 1e-12);
    }

    #[test]
    fn counts_give_exact_confidence_and_lift() {
        let rule = Rule::from_counts(ids(&[0]), ids(&[1]), [5, 4, 4], 6);

        assert!((rule.confidence() - 0.8).abs() < f64::EPSILON);
        assert!(rule.confidence() >= 0.8);
        assert!((rule.lift() - 24.0 / 20.0).abs() < f64::EPSILON);
        assert!((rule.support() - 4.0 / 6.0).abs() < f64::EPSILON);
        assert!((rule.antecedent_support() - 5.0 / 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_exactly_at_the_threshold_is_kept() -> TestResult {
        // milk is in 5 baskets and milk with bread in 4, so milk => bread holds 4 times in 5.
        let matrix = OccurrenceMatrix::from_transactions([
            ("T1", vec!["milk", "bread"]),
            ("T2", vec!["milk", "bread"]),
            ("T3", vec!["milk", "bread"]),
            ("T4", vec!["milk", "bread"]),
            ("T5", vec!["milk"]),
            ("T6", vec!["tea"]),
        ]);
        let itemsets = Apriori::new().mine(&matrix, 0.1)?;

        let rules = generate_rules(&itemsets, 0.8)?;
        let shown: Vec<String> = rules
            .iter()
            .map(|rule| rule.display(matrix.catalog()))
            .collect();

        assert_eq!(shown, vec!["{bread} => {milk}", "{milk} => {bread}"]);

        let milk_bread = rules.last().ok_or("missing milk => bread")?;
        assert!((milk_bread.confidence() - 0.8).abs() < f64::EPSILON);

        Ok(())
    }

    #[test]
    fn certain_rules_have_infinite_conviction() {
        let rule = Rule::new(ids(&[0]), ids(&[1]), 0.5, 0.75, 0.5);

        assert!((rule.confidence() - 1.0).abs() < f64::EPSILON);
        assert!(rule.conviction().is_infinite());
    }

    #[test]
    fn rule_order_puts_larger_antecedents_first() -> TestResult {
        let itemsets = FrequentItemsets::new(
            vec![
                Itemset::new(ids(&[0]), 2, 2),
                Itemset::new(ids(&[1]), 2, 2),
                Itemset::new(ids(&[2]), 2, 2),
                Itemset::new(ids(&[0, 1]), 2, 2),
                Itemset::new(ids(&[0, 2]), 2, 2),
                Itemset::new(ids(&[1, 2]), 2, 2),
                Itemset::new(ids(&[0, 1, 2]), 2, 2),
            ],
            2,
            true,
        );

        let rules = generate_rules(&itemsets, 1.0)?;
        let shapes: Vec<(ItemList, ItemList)> = rules
            .iter()
            .skip(6)
            .map(|rule| {
                (
                    rule.antecedents().iter().copied().collect(),
                    rule.consequents().iter().copied().collect(),
                )
            })
            .collect();

        assert_eq!(rules.len(), 12);
        assert_eq!(
            shapes,
            vec![
                (ids(&[0, 1]), ids(&[2])),
                (ids(&[0, 2]), ids(&[1])),
                (ids(&[1, 2]), ids(&[0])),
                (ids(&[0]), ids(&[1, 2])),
                (ids(&[1]), ids(&[0, 2])),
                (ids(&[2]), ids(&[0, 1])),
            ]
        );

        Ok(())
    }

    #[test]
    fn filters_by_confidence() -> TestResult {
        let matrix = OccurrenceMatrix::from_transactions([
            ("T1", vec!["tea", "milk"]),
            ("T2", vec!["tea", "milk"]),
            ("T3", vec!["tea"]),
            ("T4", vec!["coffee"]),
        ]);
        let itemsets = Apriori::new().mine(&matrix, 0.25)?;

        let rules = generate_rules(&itemsets, 0.9)?;

        // milk => tea holds every time, tea => milk only two times in three.
        assert_eq!(rules.len(), 1);
        let rule = rules.first().ok_or("missing rule")?;
        assert_eq!(rule.display(matrix.catalog()), "{milk} => {tea}");

        Ok(())
    }

    #[test]
    fn singletons_produce_no_rules() -> TestResult {
        let itemsets = FrequentItemsets::new(vec![Itemset::new(ids(&[0]), 1, 1)], 1, true);

        assert!(generate_rules(&itemsets, 0.5)?.is_empty());
        assert!(generate_rules(&FrequentItemsets::default(), 0.5)?.is_empty());

        Ok(())
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let result = generate_rules(&FrequentItemsets::default(), 0.0);

        assert!(matches!(
            result,
            Err(ParameterError::InvalidParameter {
                name: "min_confidence",
                ..
            })
        ));
    }

    #[test]
    fn rules_with_missing_subsets_are_skipped() -> TestResult {
        let itemsets = FrequentItemsets::new(
            vec![
                Itemset::new(ids(&[0]), 1, 1),
                Itemset::new(ids(&[0, 1]), 1, 1),
            ],
            1,
            true,
        );

        let rules = generate_rules(&itemsets, 0.5)?;

        assert!(rules.is_empty());

        Ok(())
    }

    #[test]
    fn top_by_ranks_descending_and_keeps_ties_in_order() {
        let first = Rule::new(ids(&[0]), ids(&[1]), 0.5, 0.5, 0.25);
        let second = Rule::new(ids(&[1]), ids(&[0]), 0.5, 0.5, 0.25);
        let best = Rule::new(ids(&[2]), ids(&[3]), 0.25, 0.5, 0.25);
        let rules = vec![first.clone(), second.clone(), best.clone()];

        let top = top_by(&rules, RuleMetric::Confidence, 2);

        assert_eq!(top, vec![&best, &first]);
        assert_eq!(top_by(&rules, RuleMetric::Lift, 10).len(), 3);

        let single: ItemList = smallvec![ItemId::new(2)];
        assert_eq!(top.first().map(|rule| rule.antecedents()), Some(single.as_slice()));
    }
}
