//! Active question counts per topic.

use std::collections::HashMap;

use crate::error::Result;
use crate::model::Question;
use crate::tree::TopicTree;

/// Active questions grouped by topic.
#[derive(Debug, Clone, Default)]
pub struct QuestionIndex {
    per_topic: HashMap<String, usize>,
    active: usize,
}

impl QuestionIndex {
    /// Index the active questions; inactive ones are ignored entirely.
    pub fn build(questions: &[Question]) -> Self {
        let mut per_topic: HashMap<String, usize> = HashMap::new();
        let mut active = 0;
        for q in questions.iter().filter(|q| q.is_active) {
            *per_topic.entry(q.topic_id.clone()).or_default() += 1;
            active += 1;
        }
        tracing::debug!(active, topics = per_topic.len(), "question index built");
        Self { per_topic, active }
    }

    /// Total number of active questions.
    pub fn len(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Questions attached directly to the topic.
    pub fn qty_questions(&self, topic_id: &str) -> usize {
        self.per_topic.get(topic_id).copied().unwrap_or(0)
    }

    /// Questions attached to the topic's descendants, not to the topic itself.
    pub fn qty_questions_recursive(&self, tree: &TopicTree, topic_id: &str) -> Result<usize> {
        Ok(tree
            .all_descendants(topic_id)?
            .map(|d| self.qty_questions(&d.id))
            .sum())
    }

    /// Every active question in the topic's subtree, itself included.
    pub fn qty_all_questions_depth(&self, tree: &TopicTree, topic_id: &str) -> Result<usize> {
        Ok(self.qty_questions(topic_id) + self.qty_questions_recursive(tree, topic_id)?)
    }
}
