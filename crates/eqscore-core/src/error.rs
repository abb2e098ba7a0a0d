//! Evaluation and configuration error types.
//!
//! `EvaluationError` is returned before any aggregation happens, so a failed
//! evaluation never yields a partial score.

use thiserror::Error;

/// Errors that reject an evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// One or more battery questions have no answer.
    #[error("missing answers for {} question(s): {}", question_ids.len(), question_ids.join(", "))]
    MissingAnswer { question_ids: Vec<String> },

    /// An inconsistency pair is not exactly one positive and one reversed item.
    #[error("malformed inconsistency pair '{pair_id}': {reason}")]
    MalformedPair { pair_id: String, reason: String },

    /// A submitted value matches none of the question's options.
    #[error("invalid option '{value}' for question '{question_id}'")]
    InvalidOption { question_id: String, value: String },

    /// The battery has no questions.
    #[error("battery contains no questions")]
    EmptyBattery,

    /// Two questions share an id.
    #[error("duplicate question id: {0}")]
    DuplicateQuestion(String),

    /// An option score lies outside [0, 100].
    #[error("option '{label}' of question '{question_id}' has score {score} outside [0, 100]")]
    ScoreOutOfRange {
        question_id: String,
        label: String,
        score: f64,
    },

    /// A question weight is not a positive finite number.
    #[error("question '{question_id}' has invalid weight {weight}")]
    InvalidWeight { question_id: String, weight: f64 },

    /// A question has no options to choose from.
    #[error("question '{0}' has no options")]
    NoOptions(String),

    /// Two options of one question share a value.
    #[error("question '{question_id}' has duplicate option value '{value}'")]
    DuplicateOptionValue { question_id: String, value: String },
}

impl EvaluationError {
    /// Returns `true` if the error points at a question-bank authoring defect
    /// rather than at the submitted answers.
    pub fn is_content_defect(&self) -> bool {
        !matches!(
            self,
            EvaluationError::MissingAnswer { .. } | EvaluationError::InvalidOption { .. }
        )
    }
}

/// Errors in scoring configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A rating band has an empty label.
    #[error("rating table '{table}' has a band with an empty label")]
    EmptyLabel { table: String },

    /// A rating band bound is NaN or infinite.
    #[error("rating table '{table}' has a non-finite bound for '{label}'")]
    NonFiniteBound { table: String, label: String },

    /// Bands are not strictly ordered in the table's evaluation direction.
    #[error("rating table '{table}' bands are out of order at '{label}'")]
    UnorderedBands { table: String, label: String },

    /// Parallelism must be at least one.
    #[error("parallelism must be at least 1")]
    ZeroParallelism,
}
