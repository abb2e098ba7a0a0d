//! The `eqscore batch` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use eqscore_core::config::load_config_from;
use eqscore_core::engine::{BatchEngine, BatchReport, ProgressReporter};
use eqscore_core::parser;
use eqscore_core::report::EvaluationReport;
use eqscore_core::traits::FsSubmissionSource;
use eqscore_core::Evaluator;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_submission_start(&self, key: &str) {
        tracing::debug!("scoring {key}");
    }

    fn on_submission_complete(&self, key: &str, report: &EvaluationReport) {
        eprintln!(
            "  Done: {} -> {:.1} ({})",
            key, report.result.overall_score, report.result.eq_rating
        );
    }

    fn on_submission_error(&self, key: &str, error: &str) {
        eprintln!("  ERROR: {key}: {error}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} scored, {failed} rejected ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    battery_path: PathBuf,
    submissions: PathBuf,
    parallelism: Option<usize>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let battery = parser::parse_battery(&battery_path)?;
    let source = FsSubmissionSource::new(&submissions);
    let keys = source.list_keys().await?;
    if keys.is_empty() {
        eprintln!(
            "Warning: no .json answer sheets found in {}",
            submissions.display()
        );
    }

    eprintln!(
        "eqscore v{}: scoring {} submission(s) against '{}'",
        env!("CARGO_PKG_VERSION"),
        keys.len(),
        battery.name
    );
    eprintln!();

    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
    let engine = BatchEngine::new(Arc::new(source), Evaluator::try_new(config)?, parallelism);
    let report = engine.run(&battery, &keys, &ConsoleReporter).await?;

    print_summary(&report);

    std::fs::create_dir_all(&output_dir)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = output_dir.join(format!("batch-{timestamp}.json"));
    report.save_json(&path)?;
    eprintln!("Results saved to: {}", path.display());

    Ok(())
}

fn print_summary(report: &BatchReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Candidate",
        "Overall",
        "Rating",
        "Inconsistency",
        "Consistency",
    ]);

    for entry in &report.evaluations {
        let result = &entry.report.result;
        let candidate = entry.report.candidate_id.as_deref().unwrap_or(&entry.key);
        table.add_row(vec![
            Cell::new(candidate),
            Cell::new(format!("{:.1}", result.overall_score)),
            Cell::new(&result.eq_rating),
            Cell::new(format!("{:.1}", result.inconsistency_index)),
            Cell::new(&result.inconsistency_rating),
        ]);
    }

    println!("{table}");

    let stats = &report.stats;
    if stats.candidates > 0 {
        println!(
            "Cohort: {} candidates, mean {:.1} (sd {:.1}, range {:.1} to {:.1}), {} flagged inconsistent",
            stats.candidates,
            stats.mean_overall,
            stats.std_dev_overall,
            stats.min_overall,
            stats.max_overall,
            stats.flagged_inconsistent
        );
    }
    if !report.failures.is_empty() {
        println!("{} submission(s) rejected", report.failures.len());
    }
}
