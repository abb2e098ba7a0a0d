//! Core data model types for eqscore.
//!
//! Questions, batteries and answer sheets are inputs; `EvaluationResult` and
//! `ModuleScore` are what the evaluator produces.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EvaluationError;

/// Submitted answers keyed by question id.
pub type Responses = BTreeMap<String, String>;

/// How a question is presented to the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Likert,
    Mcq,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Likert => write!(f, "likert"),
            QuestionType::Mcq => write!(f, "mcq"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "likert" => Ok(QuestionType::Likert),
            "mcq" | "multiple_choice" => Ok(QuestionType::Mcq),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Authoring difficulty tag. Does not affect scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// One selectable answer of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Text shown to the candidate (e.g. "Strongly Agree").
    pub label: String,
    /// Value submitted when this option is chosen.
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    /// Score on the 0-100 scale.
    pub score: f64,
}

/// A single battery item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within the battery.
    pub id: String,
    /// Question text.
    pub text: String,
    /// Presentation type.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Top-level competency (e.g. "Self-Awareness").
    pub module: String,
    /// Facet within the module (e.g. "Emotional Insight").
    pub submodule: String,
    /// Free-form authoring category.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Options ordered from lowest to highest agreement.
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    /// Id shared by the two members of an inconsistency pair.
    #[serde(default, alias = "inconsistencyPairId")]
    pub inconsistency_pair_id: Option<String>,
    /// Marks the reversed member of an inconsistency pair.
    #[serde(default, alias = "isReversed")]
    pub is_reversed: bool,
    /// Weight within its submodule. Defaults to 1.0.
    #[serde(default)]
    pub weight: Option<f64>,
}

impl Question {
    /// Effective weight of this question within its submodule.
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }

    /// Find the option with the given value and its 1-based scale position.
    pub fn option_for(&self, value: &str) -> Option<(usize, &AnswerOption)> {
        self.options
            .iter()
            .enumerate()
            .find(|(_, o)| o.value == value)
            .map(|(i, o)| (i + 1, o))
    }
}

/// A fixed set of questions administered together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Battery {
    /// Check the structural invariants the evaluator relies on.
    pub fn check(&self) -> Result<(), EvaluationError> {
        crate::evaluator::check_questions(&self.questions).map(|_| ())
    }

    /// Distinct module names in first-appearance order.
    pub fn modules(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for q in &self.questions {
            if !seen.contains(&q.module.as_str()) {
                seen.push(q.module.as_str());
            }
        }
        seen
    }
}

/// One submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(alias = "questionId")]
    pub question_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
}

/// A candidate's full submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerSheet {
    #[serde(default, alias = "candidateId")]
    pub candidate_id: Option<String>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl AnswerSheet {
    /// Collapse the answer list into a lookup map. Later answers to the same
    /// question replace earlier ones.
    pub fn responses(&self) -> Responses {
        let mut map = Responses::new();
        for answer in &self.answers {
            if let Some(previous) = map.insert(answer.question_id.clone(), answer.value.clone()) {
                tracing::warn!(
                    question_id = %answer.question_id,
                    previous = %previous,
                    "question answered more than once, keeping last answer"
                );
            }
        }
        map
    }
}

/// Score of one module and its submodules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleScore {
    pub module: String,
    /// Mean of the submodule scores (0-100).
    pub score: f64,
    /// Submodule name → weighted mean item score (0-100).
    pub submodules: BTreeMap<String, f64>,
}

/// The outcome of evaluating one complete answer set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Mean of the module scores (0-100).
    pub overall_score: f64,
    pub eq_rating: String,
    pub modules: BTreeMap<String, ModuleScore>,
    /// Mean normalized deviation across inconsistency pairs (0-100).
    pub inconsistency_index: f64,
    pub inconsistency_rating: String,
    /// Number of inconsistency pairs compared.
    pub pairs_evaluated: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Int(i64),
    Float(f64),
}

/// Accept option values written either as strings or as bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawValue::deserialize(deserializer)? {
        RawValue::Text(s) => s,
        RawValue::Int(i) => i.to_string(),
        RawValue::Float(f) => f.to_string(),
    })
}
