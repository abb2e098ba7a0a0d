//! The `eqscore validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(battery_path: PathBuf) -> Result<()> {
    let batteries = if battery_path.is_dir() {
        eqscore_core::parser::load_battery_directory(&battery_path)?
    } else {
        vec![eqscore_core::parser::parse_battery(&battery_path)?]
    };

    let mut total_warnings = 0;
    let mut total_errors = 0;

    for battery in &batteries {
        println!(
            "Battery: {} ({} questions, {} modules)",
            battery.name,
            battery.questions.len(),
            battery.modules().len()
        );

        if let Err(e) = battery.check() {
            println!("  ERROR: {e}");
            total_errors += 1;
        }

        let warnings = eqscore_core::parser::validate_battery(battery);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    anyhow::ensure!(total_errors == 0, "{total_errors} battery error(s) found");

    if total_warnings == 0 {
        println!("All batteries valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
