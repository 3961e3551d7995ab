//! Learning view: the computed statistics of one (user, discipline) pair.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{LearningError, Result};
use crate::statistics::TopicStatistics;

/// Read-only per-topic statistics, keyed by topic id.
///
/// Built fresh by the aggregator for each request; never persisted as the
/// source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningView {
    user_id: String,
    discipline_id: String,
    max_topics_depth: u32,
    topics: BTreeMap<String, TopicStatistics>,
}

impl LearningView {
    pub(crate) fn new(
        user_id: String,
        discipline_id: String,
        max_topics_depth: u32,
        topics: BTreeMap<String, TopicStatistics>,
    ) -> Self {
        Self {
            user_id,
            discipline_id,
            max_topics_depth,
            topics,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn discipline_id(&self) -> &str {
        &self.discipline_id
    }

    pub fn max_topics_depth(&self) -> u32 {
        self.max_topics_depth
    }

    /// Statistics of one topic.
    ///
    /// Fails with [`LearningError::MissingArgument`] for an empty id and
    /// returns `Ok(None)` when the discipline has no such topic.
    pub fn find_by_topic_id(&self, topic_id: &str) -> Result<Option<&TopicStatistics>> {
        if topic_id.trim().is_empty() {
            return Err(LearningError::MissingArgument("topic_id"));
        }
        Ok(self.topics.get(topic_id))
    }

    /// All records, ordered by topic id.
    pub fn get_items(&self) -> impl Iterator<Item = &TopicStatistics> + '_ {
        self.topics.values()
    }

    /// All records depth-first, each topic followed by its subtree. Roots
    /// and siblings are ordered by topic id.
    pub fn tree_order(&self) -> Vec<&TopicStatistics> {
        let mut children: HashMap<Option<&str>, Vec<&TopicStatistics>> = HashMap::new();
        for s in self.topics.values() {
            children.entry(s.parent_id.as_deref()).or_default().push(s);
        }

        let mut ordered = Vec::with_capacity(self.topics.len());
        let mut stack: Vec<&TopicStatistics> = children
            .get(&None::<&str>)
            .map(|roots| roots.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(s) = stack.pop() {
            ordered.push(s);
            if let Some(kids) = children.get(&Some(s.topic_id.as_str())) {
                stack.extend(kids.iter().rev());
            }
        }
        ordered
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
