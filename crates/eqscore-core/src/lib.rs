//! eqscore-core: EQ assessment scoring.
//!
//! This crate defines the question battery model, the evaluator that turns a
//! candidate's answers into module scores and ratings, and the supporting
//! loader, configuration, reporting and batch-evaluation layers.

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod rating;
pub mod report;
pub mod statistics;
pub mod traits;

pub use error::{ConfigError, EvaluationError};
pub use evaluator::{evaluate, Evaluator};
pub use model::{AnswerSheet, Battery, EvaluationResult, ModuleScore, Question, Responses};
pub use rating::RatingTable;
