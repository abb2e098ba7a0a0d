//! TOML battery parser and JSON answer-sheet loader.
//!
//! Loads question batteries from TOML files and directories, fills default
//! Likert options, and reports authoring warnings.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{AnswerOption, AnswerSheet, Battery, Difficulty, Question, QuestionType};

/// Intermediate TOML structure for parsing battery files.
#[derive(Debug, Deserialize)]
struct TomlBatteryFile {
    battery: TomlBatteryHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBatteryHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    likert_scale: TomlLikertScale,
}

#[derive(Debug, Deserialize)]
struct TomlLikertScale {
    #[serde(default = "default_likert_labels")]
    labels: Vec<String>,
}

impl Default for TomlLikertScale {
    fn default() -> Self {
        Self {
            labels: default_likert_labels(),
        }
    }
}

fn default_likert_labels() -> Vec<String> {
    [
        "Strongly Disagree",
        "Disagree",
        "Neutral",
        "Agree",
        "Strongly Agree",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_type_str() -> String {
    "likert".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    text: String,
    #[serde(rename = "type", default = "default_type_str")]
    question_type: String,
    module: String,
    submodule: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    difficulty: Difficulty,
    #[serde(default)]
    options: Vec<AnswerOption>,
    #[serde(default)]
    inconsistency_pair_id: Option<String>,
    #[serde(default)]
    is_reversed: bool,
    #[serde(default)]
    weight: Option<f64>,
}

/// Parse a single TOML file into a `Battery`.
pub fn parse_battery(path: &Path) -> Result<Battery> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read battery file: {}", path.display()))?;

    parse_battery_str(&content, path)
}

/// Parse a TOML string into a `Battery` (useful for testing).
pub fn parse_battery_str(content: &str, source_path: &Path) -> Result<Battery> {
    let parsed: TomlBatteryFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let labels = &parsed.battery.likert_scale.labels;
    anyhow::ensure!(
        labels.len() >= 2,
        "likert scale in {} needs at least 2 labels",
        source_path.display()
    );

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let question_type: QuestionType = q
                .question_type
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question '{}': {}", q.id, e))?;

            let options = if q.options.is_empty() && question_type == QuestionType::Likert {
                likert_options(labels, q.is_reversed)
            } else {
                q.options
            };

            Ok(Question {
                id: q.id,
                text: q.text,
                question_type,
                module: q.module,
                submodule: q.submodule,
                category: q.category,
                difficulty: q.difficulty,
                options,
                inconsistency_pair_id: q.inconsistency_pair_id,
                is_reversed: q.is_reversed,
                weight: q.weight,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Battery {
        id: parsed.battery.id,
        name: parsed.battery.name,
        description: parsed.battery.description,
        questions,
    })
}

/// Build a Likert option list with values "1".."n" scaled onto 0-100.
/// Reversed items score the scale from the top down.
fn likert_options(labels: &[String], reversed: bool) -> Vec<AnswerOption> {
    let points = labels.len();
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let position = i + 1;
            let scored = if reversed {
                points + 1 - position
            } else {
                position
            };
            AnswerOption {
                label: label.clone(),
                value: position.to_string(),
                score: scored as f64 * 100.0 / points as f64,
            }
        })
        .collect()
}

/// Recursively load all `.toml` battery files from a directory.
pub fn load_battery_directory(dir: &Path) -> Result<Vec<Battery>> {
    let mut batteries = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            batteries.extend(load_battery_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_battery(&path) {
                Ok(battery) => batteries.push(battery),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(batteries)
}

/// Load a JSON answer sheet.
pub fn load_answer_sheet(path: &Path) -> Result<AnswerSheet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer sheet: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answer sheet: {}", path.display()))
}

/// A warning from battery validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a battery for authoring issues that do not block evaluation.
pub fn validate_battery(battery: &Battery) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for q in &battery.questions {
        if q.text.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "question text is empty".into(),
            });
        }

        if q.question_type == QuestionType::Mcq && q.options.len() < 2 {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: format!("mcq question has {} option(s)", q.options.len()),
            });
        }
    }

    // Single-item submodules give unstable means
    let mut submodule_sizes: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for q in &battery.questions {
        *submodule_sizes
            .entry((q.module.as_str(), q.submodule.as_str()))
            .or_default() += 1;
    }
    for ((module, submodule), size) in submodule_sizes {
        if size == 1 {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!("submodule '{module} / {submodule}' has a single question"),
            });
        }
    }

    // Pairs whose members sit in different modules
    let mut pair_modules: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for q in &battery.questions {
        if let Some(pair_id) = &q.inconsistency_pair_id {
            pair_modules
                .entry(pair_id.as_str())
                .or_default()
                .insert(q.module.as_str());
        }
    }
    for (pair_id, modules) in pair_modules {
        if modules.len() > 1 {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!("inconsistency pair '{pair_id}' spans multiple modules"),
            });
        }
    }

    warnings
}
