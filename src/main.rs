//! Affinity CLI
//!
//! Mines a YAML transaction fixture and prints the frequent itemsets and the strongest
//! pruned association rules.

use std::{
    io::{self, Write},
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use affinity::{
    analysis::{Analysis, AnalysisParameters},
    fixtures::TransactionFixture,
    itemsets::observer::LevelRecorder,
    report::{write_itemsets, write_rules, write_top_items},
    rules::{RuleMetric, top_by},
    transactions::TransactionEncoder,
};

/// Market basket analysis over a transaction fixture
#[derive(Debug, Parser)]
#[command(name = "affinity", about = "Market basket analysis", long_about = None)]
struct Args {
    /// Path to a YAML transaction fixture
    fixture: PathBuf,

    /// Minimum itemset support, overriding the fixture
    #[arg(short = 's', long, env = "AFFINITY_MIN_SUPPORT")]
    min_support: Option<f64>,

    /// Minimum rule confidence, overriding the fixture
    #[arg(short = 'c', long, env = "AFFINITY_MIN_CONFIDENCE")]
    min_confidence: Option<f64>,

    /// Largest itemset size to mine
    #[arg(long)]
    max_len: Option<usize>,

    /// Stop mining after this many milliseconds, keeping the finished levels
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Number of items to print in the quantity ranking
    #[arg(long, default_value = "20")]
    top_items: usize,

    /// Number of pruned rules to print
    #[arg(short = 'n', long, default_value = "10")]
    top: usize,

    /// Metric used to rank the printed rules
    #[arg(short = 'm', long, value_enum, default_value = "confidence")]
    metric: RuleMetric,

    /// Log level (trace, debug, info, warn, error), overriding `RUST_LOG`
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Args {
    fn parameters(&self, fixture: &TransactionFixture) -> AnalysisParameters {
        let base = fixture.parameters.unwrap_or_default();

        AnalysisParameters {
            min_support: self.min_support.unwrap_or(base.min_support),
            min_confidence: self.min_confidence.unwrap_or(base.min_confidence),
            max_len: self.max_len.or(base.max_len),
        }
    }
}

/// An explicit level wins over `RUST_LOG`, which wins over `info`.
fn log_filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

/// Affinity CLI entry point
pub fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(log_filter(args.log_level.as_deref()))
        .init();

    let fixture = TransactionFixture::from_path(&args.fixture)?;
    let parameters = args.parameters(&fixture);
    let matrix = fixture.to_matrix();
    let quantities = TransactionEncoder::item_quantities(&fixture.records());

    info!(
        fixture = %args.fixture.display(),
        transactions = matrix.len(),
        items = matrix.item_count(),
        "loaded fixture"
    );

    let start = Instant::now();

    let mut analysis = Analysis::new(parameters);

    if let Some(deadline) = args
        .timeout_ms
        .and_then(|timeout_ms| start.checked_add(Duration::from_millis(timeout_ms)))
    {
        analysis = analysis.with_deadline(deadline);
    }

    let mut recorder = LevelRecorder::default();
    let report = analysis.run_with_observer(&matrix, &mut recorder)?;
    let elapsed = start.elapsed();

    for level in recorder.levels() {
        info!(
            level = level.level,
            candidates = level.candidates,
            frequent = level.frequent,
            "itemset level"
        );
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    writeln!(handle, "Frequent itemsets")?;
    write_itemsets(&mut handle, &report.itemsets, matrix.catalog())?;

    writeln!(handle, "\nTop {} items by quantity", args.top_items)?;
    write_top_items(&mut handle, quantities.iter().take(args.top_items))?;

    writeln!(handle, "\nTop {} rules by {:?}", args.top, args.metric)?;
    write_rules(
        &mut handle,
        top_by(report.pruned.rules(), args.metric, args.top),
        matrix.catalog(),
    )?;

    writeln!(
        handle,
        "\nRules: {} generated, {} after pruning{}",
        report.rules.len(),
        report.pruned.len(),
        if report.pruned.used_fallback() {
            " (pruning fallback)"
        } else {
            ""
        }
    )?;
    writeln!(handle, "Analysis: {}", elapsed.human(Truncate::Nano))?;

    Ok(())
}
