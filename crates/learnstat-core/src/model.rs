//! Core data model types for learnstat.
//!
//! These are the plain snapshot records handed to the engine by the
//! persistence layer: topics, questions and quiz answers for one discipline.

use serde::{Deserialize, Serialize};

/// A node in a discipline's subject hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Unique identifier for this topic.
    pub id: String,
    /// Discipline owning this topic.
    pub discipline_id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Parent topic; `None` for roots.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Root ancestor; equal to `id` for roots.
    pub root_id: String,
    /// 1 for roots, parent depth + 1 otherwise.
    pub depth: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Marks a non-recursive classification leaf ("to be classified").
    #[serde(default)]
    pub is_topic_classify: bool,
}

impl Topic {
    /// Returns `true` if this topic has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A question attached to exactly one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub topic_id: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub statement: String,
}

/// One user's response to one question within a quiz.
///
/// Append-only: the same (user, question) pair may recur across quizzes and
/// every occurrence counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAnswer {
    #[serde(default)]
    pub quiz_id: String,
    pub question_id: String,
    /// Denormalized from the question.
    pub topic_id: String,
    pub user_id: String,
    /// `None` until the answer is scored.
    #[serde(default)]
    pub is_correct: Option<bool>,
    /// 0-100, `None` until the answer is scored.
    #[serde(default)]
    pub grade: Option<f64>,
}

/// Identity of a discipline, without its topic forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplineInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Everything the engine needs for one discipline, as loaded by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisciplineSnapshot {
    pub discipline: DisciplineInfo,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Answers from every user; scoping happens inside the engine.
    #[serde(default)]
    pub answers: Vec<QuizAnswer>,
}

impl DisciplineSnapshot {
    /// Distinct user ids that have answered at least one question, sorted.
    pub fn users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.answers.iter().map(|a| a.user_id.clone()).collect();
        users.sort();
        users.dedup();
        users
    }
}

fn default_true() -> bool {
    true
}
