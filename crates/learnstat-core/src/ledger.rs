//! Answer ledger: per-topic answer tallies for one scope.
//!
//! A scope is either a single user or the collective (every user pooled).
//! Both go through the same code path; only the filter differs.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::QuizAnswer;
use crate::tree::TopicTree;

/// Whose answers a ledger aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "lowercase")]
pub enum Scope {
    User(String),
    Collective,
}

impl Scope {
    pub fn user(user_id: impl Into<String>) -> Self {
        Scope::User(user_id.into())
    }

    /// Returns `true` if answers from `user_id` belong to this scope.
    pub fn includes(&self, user_id: &str) -> bool {
        match self {
            Scope::User(id) => id == user_id,
            Scope::Collective => true,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::User(id) => write!(f, "user:{id}"),
            Scope::Collective => write!(f, "collective"),
        }
    }
}

/// Running counts for one topic (or a merged subtree).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TopicTally {
    /// Every answer record, scored or not.
    pub answered: usize,
    pub correct: usize,
    /// Answers with a correctness flag.
    pub scored: usize,
    /// Answers with a grade.
    pub graded: usize,
    pub grade_sum: f64,
}

impl TopicTally {
    fn record(&mut self, answer: &QuizAnswer) {
        self.answered += 1;
        if let Some(correct) = answer.is_correct {
            self.scored += 1;
            if correct {
                self.correct += 1;
            }
        }
        if let Some(grade) = answer.grade.filter(|g| g.is_finite()) {
            self.graded += 1;
            self.grade_sum += grade.clamp(0.0, 100.0);
        }
    }

    pub fn merge(&mut self, other: &TopicTally) {
        self.answered += other.answered;
        self.correct += other.correct;
        self.scored += other.scored;
        self.graded += other.graded;
        self.grade_sum += other.grade_sum;
    }

    /// Mean grade, or `None` when nothing has been graded.
    pub fn avg_grade(&self) -> Option<f64> {
        (self.graded > 0).then(|| self.grade_sum / self.graded as f64)
    }

    /// Share of scored answers that were wrong, or `None` when nothing is scored.
    pub fn error_rate(&self) -> Option<f64> {
        (self.scored > 0).then(|| (self.scored - self.correct) as f64 / self.scored as f64)
    }
}

/// Answers for one scope, tallied by topic.
#[derive(Debug, Clone)]
pub struct AnswerLedger {
    scope: Scope,
    per_topic: HashMap<String, TopicTally>,
}

impl AnswerLedger {
    /// Keep only the answers inside `scope` and tally them by topic.
    pub fn build(answers: &[QuizAnswer], scope: Scope) -> Self {
        let mut per_topic: HashMap<String, TopicTally> = HashMap::new();
        for answer in answers.iter().filter(|a| scope.includes(&a.user_id)) {
            per_topic
                .entry(answer.topic_id.clone())
                .or_default()
                .record(answer);
        }
        tracing::debug!(%scope, topics = per_topic.len(), "answer ledger built");
        Self { scope, per_topic }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Tally of answers recorded directly at the topic.
    pub fn tally(&self, topic_id: &str) -> TopicTally {
        self.per_topic.get(topic_id).copied().unwrap_or_default()
    }

    pub fn qty_questions_answered(&self, topic_id: &str) -> usize {
        self.tally(topic_id).answered
    }

    pub fn qty_questions_correct_answered(&self, topic_id: &str) -> usize {
        self.tally(topic_id).correct
    }

    /// Mean grade at the topic; `None` when no graded answer exists.
    pub fn avg_grade(&self, topic_id: &str) -> Option<f64> {
        self.tally(topic_id).avg_grade()
    }

    /// Tally merged over the topic and all its descendants.
    pub fn subtree_tally(&self, tree: &TopicTree, topic_id: &str) -> Result<TopicTally> {
        let mut total = self.tally(topic_id);
        for d in tree.all_descendants(topic_id)? {
            total.merge(&self.tally(&d.id));
        }
        Ok(total)
    }
}
