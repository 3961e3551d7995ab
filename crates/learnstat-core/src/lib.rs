//! learnstat-core: learning statistics engine.
//!
//! Builds a discipline's topic tree, indexes its active questions, tallies
//! quiz answers per user (and for all users pooled), and computes the
//! per-topic metrics served as a learning view.

pub mod config;
pub mod discipline;
pub mod engine;
pub mod error;
pub mod learning;
pub mod ledger;
pub mod model;
pub mod parser;
pub mod questions;
pub mod report;
pub mod statistics;
pub mod traits;
pub mod tree;

pub use discipline::{Discipline, TopicStructure};
pub use error::LearningError;
pub use learning::LearningView;
pub use ledger::{AnswerLedger, Scope};
pub use questions::QuestionIndex;
pub use statistics::{StatisticsAggregator, TopicStatistics};
pub use tree::TopicTree;
