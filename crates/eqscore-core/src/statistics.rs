//! Cohort statistics across many evaluated candidates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::EvaluationResult;
use crate::rating::RatingTable;

/// Aggregate statistics over a set of evaluation results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    /// Number of results aggregated.
    pub candidates: usize,
    pub mean_overall: f64,
    pub min_overall: f64,
    pub max_overall: f64,
    /// Population standard deviation of overall scores.
    pub std_dev_overall: f64,
    /// EQ rating label → number of candidates.
    pub rating_distribution: BTreeMap<String, usize>,
    /// Module → mean module score across candidates that have it.
    pub module_means: BTreeMap<String, f64>,
    pub mean_inconsistency: f64,
    /// Candidates whose inconsistency rating is the table's worst label.
    pub flagged_inconsistent: usize,
}

/// Compute cohort statistics. `inconsistency` supplies the worst label used
/// to flag unreliable response patterns.
pub fn compute_cohort_stats(results: &[EvaluationResult], inconsistency: &RatingTable) -> CohortStats {
    if results.is_empty() {
        return CohortStats::default();
    }

    let n = results.len() as f64;
    let overall: Vec<f64> = results.iter().map(|r| r.overall_score).collect();
    let mean_overall = overall.iter().sum::<f64>() / n;
    let variance = overall
        .iter()
        .map(|s| (s - mean_overall).powi(2))
        .sum::<f64>()
        / n;

    let mut rating_distribution = BTreeMap::new();
    for r in results {
        *rating_distribution.entry(r.eq_rating.clone()).or_insert(0) += 1;
    }

    let mut module_totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for r in results {
        for (module, score) in &r.modules {
            let entry = module_totals.entry(module.as_str()).or_insert((0.0, 0));
            entry.0 += score.score;
            entry.1 += 1;
        }
    }
    let module_means = module_totals
        .into_iter()
        .map(|(module, (sum, count))| (module.to_string(), sum / count as f64))
        .collect();

    let worst = inconsistency.worst_label();
    let flagged_inconsistent = results
        .iter()
        .filter(|r| r.inconsistency_rating == worst)
        .count();

    CohortStats {
        candidates: results.len(),
        mean_overall,
        min_overall: overall.iter().copied().fold(f64::INFINITY, f64::min),
        max_overall: overall.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        std_dev_overall: variance.sqrt(),
        rating_distribution,
        module_means,
        mean_inconsistency: results.iter().map(|r| r.inconsistency_index).sum::<f64>() / n,
        flagged_inconsistent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModuleScore;

    fn result(overall: f64, rating: &str, inconsistency: f64, incons_rating: &str) -> EvaluationResult {
        let mut modules = BTreeMap::new();
        modules.insert(
            "Empathy".to_string(),
            ModuleScore {
                module: "Empathy".into(),
                score: overall,
                submodules: BTreeMap::new(),
            },
        );
        EvaluationResult {
            overall_score: overall,
            eq_rating: rating.into(),
            modules,
            inconsistency_index: inconsistency,
            inconsistency_rating: incons_rating.into(),
            pairs_evaluated: 1,
        }
    }

    #[test]
    fn empty_cohort() {
        let stats = compute_cohort_stats(&[], &RatingTable::inconsistency_default());
        assert_eq!(stats.candidates, 0);
        assert!(stats.rating_distribution.is_empty());
    }

    #[test]
    fn cohort_aggregates() {
        let results = vec![
            result(90.0, "Very High", 0.0, "Excellent"),
            result(50.0, "Average", 50.0, "Poor"),
            result(70.0, "High", 20.0, "Good"),
        ];
        let stats = compute_cohort_stats(&results, &RatingTable::inconsistency_default());

        assert_eq!(stats.candidates, 3);
        assert!((stats.mean_overall - 70.0).abs() < 1e-9);
        assert_eq!(stats.min_overall, 50.0);
        assert_eq!(stats.max_overall, 90.0);
        // deviations 20, -20, 0 -> variance 800/3
        assert!((stats.std_dev_overall - (800.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(stats.rating_distribution["High"], 1);
        assert!((stats.module_means["Empathy"] - 70.0).abs() < 1e-9);
        assert!((stats.mean_inconsistency - 70.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.flagged_inconsistent, 1);
    }
}
