//! The `eqscore evaluate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use eqscore_core::config::load_config_from;
use eqscore_core::parser;
use eqscore_core::report::EvaluationReport;
use eqscore_core::Evaluator;

pub fn execute(
    battery_path: PathBuf,
    answers_path: PathBuf,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let battery = parser::parse_battery(&battery_path)?;
    let sheet = parser::load_answer_sheet(&answers_path)?;

    let evaluator = Evaluator::try_new(config)?;
    let result = evaluator
        .evaluate_sheet(&battery, &sheet)
        .with_context(|| format!("failed to evaluate {}", answers_path.display()))?;
    let report = EvaluationReport::new(&battery, sheet.candidate_id.clone(), result);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        _ => print_text(&report),
    }

    if let Some(path) = output {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_text(report: &EvaluationReport) {
    use comfy_table::{Cell, Table};

    let result = &report.result;
    println!("Battery: {}", report.battery.name);
    if let Some(candidate) = &report.candidate_id {
        println!("Candidate: {candidate}");
    }

    let mut table = Table::new();
    table.set_header(vec!["Module", "Submodule", "Score"]);
    for module in result.modules.values() {
        table.add_row(vec![
            Cell::new(&module.module),
            Cell::new(""),
            Cell::new(format!("{:.1}", module.score)),
        ]);
        for (submodule, score) in &module.submodules {
            table.add_row(vec![
                Cell::new(""),
                Cell::new(submodule),
                Cell::new(format!("{score:.1}")),
            ]);
        }
    }
    println!("{table}");

    println!(
        "Overall: {:.1} ({})",
        result.overall_score, result.eq_rating
    );
    println!(
        "Inconsistency: {:.1} ({}, {} pairs)",
        result.inconsistency_index, result.inconsistency_rating, result.pairs_evaluated
    );
}
