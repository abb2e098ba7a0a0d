//! Batch evaluation engine.
//!
//! Scores many submissions against one battery with bounded concurrency.
//! Each submission is independent: one bad answer sheet is recorded as a
//! failure and never affects the others.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::evaluator::Evaluator;
use crate::model::Battery;
use crate::report::{BatterySummary, EvaluationReport};
use crate::statistics::{compute_cohort_stats, CohortStats};
use crate::traits::SubmissionSource;

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_submission_start(&self, key: &str);
    fn on_submission_complete(&self, key: &str, report: &EvaluationReport);
    fn on_submission_error(&self, key: &str, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_submission_start(&self, _: &str) {}
    fn on_submission_complete(&self, _: &str, _: &EvaluationReport) {}
    fn on_submission_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// A successfully scored submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEvaluation {
    /// Source key the answer sheet was fetched from.
    pub key: String,
    pub report: EvaluationReport,
}

/// A submission that could not be scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionFailure {
    pub key: String,
    pub error: String,
    /// True when the failure traces back to the battery, not the answers.
    pub content_defect: bool,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub battery: BatterySummary,
    /// Name of the submission source.
    pub source: String,
    /// Scored submissions, ordered by key.
    pub evaluations: Vec<BatchEvaluation>,
    /// Rejected submissions, ordered by key.
    pub failures: Vec<SubmissionFailure>,
    pub stats: CohortStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl BatchReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize batch report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write batch report to {}", path.display()))?;
        Ok(())
    }

    /// Load a batch report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read batch report from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse batch report JSON")
    }
}

/// Scores submissions from a source against a battery.
pub struct BatchEngine {
    source: Arc<dyn SubmissionSource>,
    evaluator: Evaluator,
    parallelism: usize,
}

impl BatchEngine {
    pub fn new(source: Arc<dyn SubmissionSource>, evaluator: Evaluator, parallelism: usize) -> Self {
        Self {
            source,
            evaluator,
            parallelism: parallelism.max(1),
        }
    }

    /// Evaluate every key against `battery`.
    ///
    /// Fails outright only when the battery itself is defective.
    pub async fn run(
        &self,
        battery: &Battery,
        keys: &[String],
        progress: &dyn ProgressReporter,
    ) -> Result<BatchReport> {
        let start = Instant::now();

        if let Err(e) = battery.check() {
            tracing::error!(battery = %battery.id, error = %e, "battery failed integrity check");
            return Err(anyhow::Error::new(e)
                .context(format!("battery '{}' failed integrity check", battery.id)));
        }

        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut futures = FuturesUnordered::new();

        for key in keys {
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let outcome = async {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    progress.on_submission_start(key);

                    let sheet = self.source.fetch(key).await?;
                    let result = self.evaluator.evaluate_sheet(battery, &sheet)?;
                    let candidate_id = sheet.candidate_id.clone().or_else(|| Some(key.clone()));
                    Ok::<_, anyhow::Error>(EvaluationReport::new(battery, candidate_id, result))
                };
                (key, outcome.await)
            });
        }

        let mut evaluations = Vec::new();
        let mut failures = Vec::new();
        let total = futures.len();

        while let Some((key, outcome)) = futures.next().await {
            match outcome {
                Ok(report) => {
                    progress.on_submission_complete(key, &report);
                    evaluations.push(BatchEvaluation {
                        key: key.clone(),
                        report,
                    });
                }
                Err(e) => {
                    let content_defect = e
                        .downcast_ref::<crate::error::EvaluationError>()
                        .is_some_and(|err| err.is_content_defect());
                    tracing::warn!("submission {key} rejected: {e:#}");
                    progress.on_submission_error(key, &format!("{e:#}"));
                    failures.push(SubmissionFailure {
                        key: key.clone(),
                        error: format!("{e:#}"),
                        content_defect,
                    });
                }
            }
        }

        evaluations.sort_by(|a, b| a.key.cmp(&b.key));
        failures.sort_by(|a, b| a.key.cmp(&b.key));

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, evaluations.len(), failures.len(), elapsed);

        let results: Vec<_> = evaluations.iter().map(|e| e.report.result.clone()).collect();
        let stats = compute_cohort_stats(&results, &self.evaluator.config().inconsistency_rating);

        tracing::info!(
            battery = %battery.id,
            scored = evaluations.len(),
            rejected = failures.len(),
            "batch complete"
        );

        Ok(BatchReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            battery: BatterySummary::from(battery),
            source: self.source.name().to_string(),
            evaluations,
            failures,
            stats,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::model::{Answer, AnswerOption, AnswerSheet, Difficulty, Question, QuestionType};
    use crate::traits::MemorySubmissionSource;

    fn question(id: &str, module: &str) -> Question {
        Question {
            id: id.into(),
            text: format!("Statement {id}"),
            question_type: QuestionType::Likert,
            module: module.into(),
            submodule: "General".into(),
            category: String::new(),
            difficulty: Difficulty::Medium,
            options: (1..=5)
                .map(|v| AnswerOption {
                    label: format!("Level {v}"),
                    value: v.to_string(),
                    score: v as f64 * 20.0,
                })
                .collect(),
            inconsistency_pair_id: None,
            is_reversed: false,
            weight: None,
        }
    }

    fn battery() -> Battery {
        Battery {
            id: "eq-test".into(),
            name: "EQ Test".into(),
            description: String::new(),
            questions: vec![question("q1", "Empathy"), question("q2", "Motivation")],
        }
    }

    fn sheet(candidate: Option<&str>, answers: &[(&str, &str)]) -> AnswerSheet {
        AnswerSheet {
            candidate_id: candidate.map(String::from),
            answers: answers
                .iter()
                .map(|(q, v)| Answer {
                    question_id: q.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    #[derive(Default)]
    struct CountingReporter {
        completed: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ProgressReporter for CountingReporter {
        fn on_submission_start(&self, _: &str) {}
        fn on_submission_complete(&self, _: &str, _: &EvaluationReport) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_submission_error(&self, _: &str, _: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
    }

    #[tokio::test]
    async fn batch_scores_good_and_records_bad_submissions() {
        let source = MemorySubmissionSource::new()
            .with_sheet("alice", sheet(Some("A-1"), &[("q1", "5"), ("q2", "5")]))
            .with_sheet("bob", sheet(None, &[("q1", "3"), ("q2", "2")]))
            .with_sheet("carol", sheet(None, &[("q1", "4")]))
            .with_sheet("dave", sheet(None, &[("q1", "4"), ("q2", "9")]));
        let engine = BatchEngine::new(Arc::new(source), Evaluator::default(), 2);
        let keys: Vec<String> = ["alice", "bob", "carol", "dave", "erin"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let reporter = CountingReporter::default();

        let report = engine.run(&battery(), &keys, &reporter).await.unwrap();

        assert_eq!(report.source, "memory");
        assert_eq!(report.evaluations.len(), 2);
        assert_eq!(report.evaluations[0].key, "alice");
        assert_eq!(
            report.evaluations[0].report.candidate_id.as_deref(),
            Some("A-1")
        );
        assert_eq!(
            report.evaluations[1].report.candidate_id.as_deref(),
            Some("bob")
        );

        let failed: Vec<&str> = report.failures.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(failed, vec!["carol", "dave", "erin"]);
        assert!(report.failures[0].error.contains("missing answers"));
        assert!(report.failures[1].error.contains("invalid option"));
        assert!(report.failures[2].error.contains("no submission"));
        assert!(report.failures.iter().all(|f| !f.content_defect));

        assert_eq!(report.stats.candidates, 2);
        assert!((report.stats.mean_overall - 75.0).abs() < 1e-9);
        assert_eq!(reporter.completed.load(Ordering::SeqCst), 2);
        assert_eq!(reporter.errors.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn defective_battery_fails_whole_batch() {
        let mut battery = battery();
        battery.questions[1].id = "q1".into();
        let engine = BatchEngine::new(
            Arc::new(MemorySubmissionSource::new()),
            Evaluator::default(),
            4,
        );

        let err = engine
            .run(&battery, &["anyone".to_string()], &NoopReporter)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed integrity check"));
        assert!(err
            .downcast_ref::<crate::error::EvaluationError>()
            .is_some_and(|e| e.is_content_defect()));
    }

    #[tokio::test]
    async fn empty_batch_produces_empty_report() {
        let engine = BatchEngine::new(
            Arc::new(MemorySubmissionSource::new()),
            Evaluator::default(),
            0,
        );
        let report = engine.run(&battery(), &[], &NoopReporter).await.unwrap();
        assert!(report.evaluations.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(report.stats.candidates, 0);
    }

    #[tokio::test]
    async fn batch_report_json_roundtrip() {
        let source = MemorySubmissionSource::new()
            .with_sheet("alice", sheet(None, &[("q1", "4"), ("q2", "4")]));
        let engine = BatchEngine::new(Arc::new(source), Evaluator::default(), 1);
        let report = engine
            .run(&battery(), &["alice".to_string()], &NoopReporter)
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        report.save_json(&path).unwrap();
        let loaded = BatchReport::load_json(&path).unwrap();
        assert_eq!(loaded.evaluations.len(), 1);
        assert_eq!(loaded.battery.id, "eq-test");
    }
}
