//! EQ score evaluation.
//!
//! Turns a battery plus one candidate's responses into submodule, module and
//! overall scores, a qualitative rating, and an inconsistency index computed
//! from reversed item pairs.
//!
//! Every check runs before aggregation starts, so a rejected evaluation never
//! produces a partial result.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::ScoringConfig;
use crate::error::{ConfigError, EvaluationError};
use crate::model::{AnswerSheet, Battery, EvaluationResult, ModuleScore, Question, Responses};

/// The two members of an inconsistency pair.
#[derive(Debug, Clone, Copy)]
pub struct InconsistencyPair<'a> {
    pub pair_id: &'a str,
    pub positive: &'a Question,
    pub reversed: &'a Question,
}

/// A resolved answer: the chosen option's scale position and score.
#[derive(Debug, Clone, Copy)]
struct Selection<'a> {
    question: &'a Question,
    position: usize,
    score: f64,
}

/// Evaluate `responses` against `questions` with the default rating tables.
pub fn evaluate(
    questions: &[Question],
    responses: &Responses,
) -> Result<EvaluationResult, EvaluationError> {
    Evaluator::default().evaluate(questions, responses)
}

/// Scores answer sets using a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: ScoringConfig,
}

impl Evaluator {
    /// Build an evaluator without checking `config`. Use [`Evaluator::try_new`]
    /// for configuration that has not been through [`ScoringConfig::validate`].
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Build an evaluator after validating the rating tables and parallelism.
    pub fn try_new(config: ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Evaluate a full answer sheet against a battery.
    pub fn evaluate_sheet(
        &self,
        battery: &Battery,
        sheet: &AnswerSheet,
    ) -> Result<EvaluationResult, EvaluationError> {
        self.evaluate(&battery.questions, &sheet.responses())
    }

    /// Evaluate `responses` against `questions`.
    pub fn evaluate(
        &self,
        questions: &[Question],
        responses: &Responses,
    ) -> Result<EvaluationResult, EvaluationError> {
        let pairs = check_questions(questions).map_err(|e| {
            tracing::error!(error = %e, "question battery defect, evaluation rejected");
            e
        })?;
        let selections = resolve_answers(questions, responses)?;

        let modules = aggregate_modules(&selections);
        let overall_score = clamp_score(mean(modules.values().map(|m| m.score)));

        let by_id: HashMap<&str, &Selection<'_>> = selections
            .iter()
            .map(|s| (s.question.id.as_str(), s))
            .collect();
        let inconsistency_index =
            clamp_score(mean(pairs.iter().map(|pair| pair_deviation(pair, &by_id))));

        let result = EvaluationResult {
            overall_score,
            eq_rating: self.config.eq_rating.classify(overall_score).to_string(),
            modules,
            inconsistency_index,
            inconsistency_rating: self
                .config
                .inconsistency_rating
                .classify(inconsistency_index)
                .to_string(),
            pairs_evaluated: pairs.len(),
        };

        tracing::debug!(
            overall = result.overall_score,
            rating = %result.eq_rating,
            inconsistency = result.inconsistency_index,
            pairs = result.pairs_evaluated,
            "evaluation complete"
        );

        Ok(result)
    }
}

/// Check battery integrity and return its inconsistency pairs ordered by id.
pub fn check_questions(
    questions: &[Question],
) -> Result<Vec<InconsistencyPair<'_>>, EvaluationError> {
    if questions.is_empty() {
        return Err(EvaluationError::EmptyBattery);
    }

    let mut seen_ids = HashSet::new();
    for q in questions {
        if !seen_ids.insert(q.id.as_str()) {
            return Err(EvaluationError::DuplicateQuestion(q.id.clone()));
        }
        if q.options.is_empty() {
            return Err(EvaluationError::NoOptions(q.id.clone()));
        }
        let mut values = HashSet::new();
        if let Some(option) = q.options.iter().find(|o| !values.insert(o.value.as_str())) {
            return Err(EvaluationError::DuplicateOptionValue {
                question_id: q.id.clone(),
                value: option.value.clone(),
            });
        }
        if let Some(option) = q
            .options
            .iter()
            .find(|o| !(0.0..=100.0).contains(&o.score))
        {
            return Err(EvaluationError::ScoreOutOfRange {
                question_id: q.id.clone(),
                label: option.label.clone(),
                score: option.score,
            });
        }
        let weight = q.weight();
        if !weight.is_finite() || weight <= 0.0 {
            return Err(EvaluationError::InvalidWeight {
                question_id: q.id.clone(),
                weight,
            });
        }
    }

    let mut grouped: BTreeMap<&str, Vec<&Question>> = BTreeMap::new();
    for q in questions {
        if let Some(pair_id) = &q.inconsistency_pair_id {
            grouped.entry(pair_id.as_str()).or_default().push(q);
        }
    }

    grouped
        .into_iter()
        .map(|(pair_id, members)| build_pair(pair_id, &members))
        .collect()
}

fn build_pair<'a>(
    pair_id: &'a str,
    members: &[&'a Question],
) -> Result<InconsistencyPair<'a>, EvaluationError> {
    let malformed = |reason: String| EvaluationError::MalformedPair {
        pair_id: pair_id.to_string(),
        reason,
    };

    let (positive, reversed) = match members {
        [a, b] if !a.is_reversed && b.is_reversed => (*a, *b),
        [a, b] if a.is_reversed && !b.is_reversed => (*b, *a),
        [a, b] if a.is_reversed == b.is_reversed => {
            let kind = if a.is_reversed { "reversed" } else { "positive" };
            return Err(malformed(format!("both members are {kind}")));
        }
        _ => {
            return Err(malformed(format!(
                "expected 2 members, found {}",
                members.len()
            )))
        }
    };

    if positive.options.len() != reversed.options.len() {
        return Err(malformed(format!(
            "members have different scales ({} vs {} options)",
            positive.options.len(),
            reversed.options.len()
        )));
    }
    if positive.options.len() < 2 {
        return Err(malformed("scale needs at least 2 options".to_string()));
    }

    Ok(InconsistencyPair {
        pair_id,
        positive,
        reversed,
    })
}

fn resolve_answers<'a>(
    questions: &'a [Question],
    responses: &Responses,
) -> Result<Vec<Selection<'a>>, EvaluationError> {
    let missing: Vec<String> = questions
        .iter()
        .filter(|q| !responses.contains_key(&q.id))
        .map(|q| q.id.clone())
        .collect();
    if !missing.is_empty() {
        return Err(EvaluationError::MissingAnswer {
            question_ids: missing,
        });
    }

    let known: HashSet<&str> = questions.iter().map(|q| q.id.as_str()).collect();
    for question_id in responses.keys().filter(|id| !known.contains(id.as_str())) {
        tracing::warn!(%question_id, "ignoring answer to a question not in the battery");
    }

    questions
        .iter()
        .map(|question| {
            let value = &responses[&question.id];
            question
                .option_for(value)
                .map(|(position, option)| Selection {
                    question,
                    position,
                    score: option.score,
                })
                .ok_or_else(|| EvaluationError::InvalidOption {
                    question_id: question.id.clone(),
                    value: value.clone(),
                })
        })
        .collect()
}

/// Weighted mean per submodule, then the plain mean of submodule means per
/// module. A submodule with many items counts the same as one with few.
fn aggregate_modules(selections: &[Selection<'_>]) -> BTreeMap<String, ModuleScore> {
    let mut grouped: BTreeMap<&str, BTreeMap<&str, Vec<&Selection<'_>>>> = BTreeMap::new();
    for s in selections {
        grouped
            .entry(s.question.module.as_str())
            .or_default()
            .entry(s.question.submodule.as_str())
            .or_default()
            .push(s);
    }

    grouped
        .into_iter()
        .map(|(module, submodules)| {
            let submodules: BTreeMap<String, f64> = submodules
                .into_iter()
                .map(|(name, items)| (name.to_string(), clamp_score(weighted_mean(&items))))
                .collect();
            let score = clamp_score(mean(submodules.values().copied()));
            (
                module.to_string(),
                ModuleScore {
                    module: module.to_string(),
                    score,
                    submodules,
                },
            )
        })
        .collect()
}

/// Weights are scaled by the group's largest weight first, so every scaled
/// weight lies in [0, 1] and the sums stay finite for any finite weights.
fn weighted_mean(items: &[&Selection<'_>]) -> f64 {
    let max_weight = items
        .iter()
        .map(|s| s.question.weight())
        .fold(0.0_f64, f64::max);
    if max_weight <= 0.0 {
        return 0.0;
    }

    let (weighted, total) = items.iter().fold((0.0, 0.0), |(weighted, total), s| {
        let weight = s.question.weight() / max_weight;
        (weighted + s.score * weight, total + weight)
    });
    weighted / total
}

/// Deviation of the reversed answer from the exact opposite of the positive
/// answer, as a percentage of the largest possible deviation.
fn pair_deviation(pair: &InconsistencyPair<'_>, by_id: &HashMap<&str, &Selection<'_>>) -> f64 {
    let scale = pair.positive.options.len();
    let positive = by_id[pair.positive.id.as_str()].position;
    let reversed = by_id[pair.reversed.id.as_str()].position;

    let expected = scale + 1 - positive;
    let deviation = reversed.abs_diff(expected) as f64;
    let max_deviation = (scale - 1) as f64;

    deviation / max_deviation * 100.0
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
