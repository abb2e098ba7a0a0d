//! Evaluation report types with JSON persistence and attempt comparison.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Battery, EvaluationResult};

/// A persisted evaluation of one candidate submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the battery that was scored.
    pub battery: BatterySummary,
    /// Candidate the answers belong to, if known.
    #[serde(default)]
    pub candidate_id: Option<String>,
    pub result: EvaluationResult,
}

/// Summary of a battery (without the full question definitions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatterySummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
    pub modules: Vec<String>,
}

impl From<&Battery> for BatterySummary {
    fn from(battery: &Battery) -> Self {
        Self {
            id: battery.id.clone(),
            name: battery.name.clone(),
            question_count: battery.questions.len(),
            modules: battery.modules().into_iter().map(String::from).collect(),
        }
    }
}

impl EvaluationReport {
    pub fn new(battery: &Battery, candidate_id: Option<String>, result: EvaluationResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            battery: BatterySummary::from(battery),
            candidate_id,
            result,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: EvaluationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let result = &self.result;
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.battery.name));
        if let Some(candidate) = &self.candidate_id {
            md.push_str(&format!("**Candidate:** {candidate}\n\n"));
        }
        md.push_str(&format!(
            "**Overall:** {:.1} ({})\n\n**Inconsistency:** {:.1} ({}, {} pairs)\n\n",
            result.overall_score,
            result.eq_rating,
            result.inconsistency_index,
            result.inconsistency_rating,
            result.pairs_evaluated
        ));

        md.push_str("| Module | Submodule | Score |\n");
        md.push_str("|--------|-----------|-------|\n");
        for module in result.modules.values() {
            md.push_str(&format!("| **{}** | | **{:.1}** |\n", module.module, module.score));
            for (submodule, score) in &module.submodules {
                md.push_str(&format!("| | {submodule} | {score:.1} |\n"));
            }
        }

        md
    }

    /// Compare this report against an earlier attempt, module by module.
    ///
    /// `threshold` is in score points; deltas within it count as unchanged.
    pub fn compare(&self, baseline: &EvaluationReport, threshold: f64) -> ComparisonReport {
        if self.battery.id != baseline.battery.id {
            tracing::warn!(
                "comparing reports from different batteries: '{}' vs '{}'",
                baseline.battery.id,
                self.battery.id
            );
        }

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_modules = Vec::new();

        for (module, current) in &self.result.modules {
            let Some(previous) = baseline.result.modules.get(module) else {
                new_modules.push(module.clone());
                continue;
            };

            let change = ModuleChange {
                module: module.clone(),
                baseline_score: previous.score,
                current_score: current.score,
                delta: current.score - previous.score,
            };
            if change.delta < -threshold {
                regressions.push(change);
            } else if change.delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_modules = baseline
            .result
            .modules
            .keys()
            .filter(|m| !self.result.modules.contains_key(*m))
            .cloned()
            .collect();

        ComparisonReport {
            baseline_overall: baseline.result.overall_score,
            current_overall: self.result.overall_score,
            overall_delta: self.result.overall_score - baseline.result.overall_score,
            baseline_rating: baseline.result.eq_rating.clone(),
            current_rating: self.result.eq_rating.clone(),
            regressions,
            improvements,
            unchanged,
            new_modules,
            removed_modules,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub baseline_overall: f64,
    pub current_overall: f64,
    pub overall_delta: f64,
    pub baseline_rating: String,
    pub current_rating: String,
    /// Modules where the score went down.
    pub regressions: Vec<ModuleChange>,
    /// Modules where the score went up.
    pub improvements: Vec<ModuleChange>,
    /// Modules with no significant change.
    pub unchanged: usize,
    /// Modules in current but not baseline.
    pub new_modules: Vec<String>,
    /// Modules in baseline but not current.
    pub removed_modules: Vec<String>,
}

/// Score movement of one module between attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleChange {
    pub module: String,
    pub baseline_score: f64,
    pub current_score: f64,
    pub delta: f64,
}

impl ComparisonReport {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Overall:** {:.1} ({}) -> {:.1} ({}), {:+.1}\n\n",
            self.baseline_overall,
            self.baseline_rating,
            self.current_overall,
            self.current_rating,
            self.overall_delta
        ));
        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Module | Baseline | Current | Delta |\n");
            md.push_str("|--------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.1} | {:.1} | {:+.1} |\n",
                    c.module, c.baseline_score, c.current_score, c.delta
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if any module regressed.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModuleScore;
    use std::collections::BTreeMap;

    fn make_result(modules: &[(&str, f64)]) -> EvaluationResult {
        let modules: BTreeMap<String, ModuleScore> = modules
            .iter()
            .map(|(name, score)| {
                (
                    name.to_string(),
                    ModuleScore {
                        module: name.to_string(),
                        score: *score,
                        submodules: BTreeMap::from([("General".to_string(), *score)]),
                    },
                )
            })
            .collect();
        let overall = modules.values().map(|m| m.score).sum::<f64>() / modules.len().max(1) as f64;
        EvaluationResult {
            overall_score: overall,
            eq_rating: "Average".into(),
            modules,
            inconsistency_index: 0.0,
            inconsistency_rating: "Excellent".into(),
            pairs_evaluated: 0,
        }
    }

    fn make_report(modules: &[(&str, f64)]) -> EvaluationReport {
        EvaluationReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            battery: BatterySummary {
                id: "eq".into(),
                name: "EQ".into(),
                question_count: 10,
                modules: modules.iter().map(|(m, _)| m.to_string()).collect(),
            },
            candidate_id: Some("c1".into()),
            result: make_result(modules),
        }
    }

    #[test]
    fn compare_identical_reports() {
        let baseline = make_report(&[("Empathy", 70.0), ("Motivation", 60.0)]);
        let current = make_report(&[("Empathy", 70.0), ("Motivation", 60.0)]);

        let report = current.compare(&baseline, 5.0);
        assert!(report.regressions.is_empty());
        assert!(report.improvements.is_empty());
        assert_eq!(report.unchanged, 2);
        assert_eq!(report.overall_delta, 0.0);
    }

    #[test]
    fn compare_with_regression_and_improvement() {
        let baseline = make_report(&[("Empathy", 70.0), ("Motivation", 60.0)]);
        let current = make_report(&[("Empathy", 50.0), ("Motivation", 72.0)]);

        let report = current.compare(&baseline, 5.0);
        assert!(report.has_regressions());
        assert_eq!(report.regressions[0].module, "Empathy");
        assert!((report.regressions[0].delta + 20.0).abs() < 1e-9);
        assert_eq!(report.improvements[0].module, "Motivation");
    }

    #[test]
    fn small_changes_within_threshold_are_unchanged() {
        let baseline = make_report(&[("Empathy", 70.0)]);
        let current = make_report(&[("Empathy", 67.0)]);
        let report = current.compare(&baseline, 5.0);
        assert!(!report.has_regressions());
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn compare_with_new_and_removed_modules() {
        let baseline = make_report(&[("Empathy", 70.0)]);
        let current = make_report(&[("Social Skills", 70.0)]);

        let report = current.compare(&baseline, 5.0);
        assert_eq!(report.new_modules, vec!["Social Skills"]);
        assert_eq!(report.removed_modules, vec!["Empathy"]);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(&[("Empathy", 70.0)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = EvaluationReport::load_json(&path).unwrap();

        assert_eq!(loaded.battery, report.battery);
        assert_eq!(loaded.result, report.result);
    }

    #[test]
    fn report_markdown_lists_modules() {
        let report = make_report(&[("Empathy", 70.0), ("Motivation", 55.5)]);
        let md = report.to_markdown();
        assert!(md.contains("**Candidate:** c1"));
        assert!(md.contains("| **Motivation** | | **55.5** |"));
        assert!(md.contains("| | General | 70.0 |"));
    }

    #[test]
    fn markdown_output() {
        let baseline = make_report(&[("Empathy", 70.0)]);
        let current = make_report(&[("Empathy", 40.0)]);

        let md = current.compare(&baseline, 5.0).to_markdown();
        assert!(md.contains("### Regressions"));
        assert!(md.contains("| Empathy | 70.0 | 40.0 | -30.0 |"));
        assert!(!md.contains("### Improvements"));
    }
}
