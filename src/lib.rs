//! Affinity
//!
//! Affinity is a market basket analysis engine written in Rust. It encodes purchase records
//! into an occurrence matrix, mines frequent itemsets level by level, derives association
//! rules with support, confidence and lift, and prunes rules subsumed by earlier ones.

pub mod analysis;
pub mod fixtures;
pub mod items;
pub mod itemsets;
pub mod parameters;
pub mod prelude;
pub mod pruning;
pub mod report;
pub mod rules;
pub mod transactions;
