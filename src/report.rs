//! Report
//!
//! Plain-text tables for frequent itemsets and rules.

use std::io;

use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    items::ItemCatalog, itemsets::FrequentItemsets, rules::Rule, transactions::ItemQuantity,
};

/// Errors that can occur when writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// IO error
    #[error("Failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Writes the frequent itemset table.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_itemsets(
    mut out: impl io::Write,
    itemsets: &FrequentItemsets,
    catalog: &ItemCatalog,
) -> Result<(), ReportError> {
    let mut builder = Builder::default();

    builder.push_record(["Itemset", "Count", "Support"]);

    for itemset in itemsets.iter() {
        builder.push_record([
            catalog.display_set(itemset.items()).to_string(),
            itemset.count().to_string(),
            format!("{:.4}", itemset.support()),
        ]);
    }

    write_table(&mut out, builder, 1)?;

    if !itemsets.is_complete() {
        writeln!(out, "(incomplete: mining stopped before the last level)")?;
    }

    Ok(())
}

/// Writes a rule table: antecedents, consequents, support, confidence and lift.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_rules<'r>(
    mut out: impl io::Write,
    rules: impl IntoIterator<Item = &'r Rule>,
    catalog: &ItemCatalog,
) -> Result<(), ReportError> {
    let mut builder = Builder::default();

    builder.push_record([
        "Antecedents",
        "Consequents",
        "Support",
        "Confidence",
        "Lift",
    ]);

    for rule in rules {
        builder.push_record([
            catalog.display_set(rule.antecedents()).to_string(),
            catalog.display_set(rule.consequents()).to_string(),
            format!("{:.4}", rule.support()),
            format!("{:.4}", rule.confidence()),
            format!("{:.4}", rule.lift()),
        ]);
    }

    write_table(&mut out, builder, 2)
}

/// Writes the item ranking by total quantity.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_top_items<'q>(
    mut out: impl io::Write,
    items: impl IntoIterator<Item = &'q ItemQuantity>,
) -> Result<(), ReportError> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Quantity"]);

    for total in items {
        builder.push_record([total.item.clone(), total.quantity.to_string()]);
    }

    write_table(&mut out, builder, 1)
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    first_numeric_column: usize,
) -> Result<(), ReportError> {
    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(first_numeric_column..), Alignment::right());
    table.modify(Rows::first(), Alignment::center());

    writeln!(out, "{table}")?;

    Ok(())
}
