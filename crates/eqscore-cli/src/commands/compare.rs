//! The `eqscore compare` command.

use std::path::PathBuf;

use anyhow::Result;

use eqscore_core::report::EvaluationReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = EvaluationReport::load_json(&baseline_path)?;
    let current = EvaluationReport::load_json(&current_path)?;

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Overall: {:.1} ({}) -> {:.1} ({}), {:+.1}",
                report.baseline_overall,
                report.baseline_rating,
                report.current_overall,
                report.current_rating,
                report.overall_delta
            );
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            if !report.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &report.regressions {
                    println!(
                        "  {} {:.1} -> {:.1} ({:+.1})",
                        r.module, r.baseline_score, r.current_score, r.delta
                    );
                }
            }

            if !report.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &report.improvements {
                    println!(
                        "  {} {:.1} -> {:.1} ({:+.1})",
                        i.module, i.baseline_score, i.current_score, i.delta
                    );
                }
            }

            if !report.new_modules.is_empty() {
                println!("\nNew module(s): {}", report.new_modules.join(", "));
            }
            if !report.removed_modules.is_empty() {
                println!("Removed module(s): {}", report.removed_modules.join(", "));
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
