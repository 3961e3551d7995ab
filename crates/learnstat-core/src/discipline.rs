//! Discipline: a subject area owning one validated topic forest.

use serde::{Deserialize, Serialize};

use crate::error::{LearningError, Result};
use crate::model::{DisciplineInfo, Topic};
use crate::tree::TopicTree;

/// Tree-shape metrics of one topic, independent of question and answer data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStructure {
    pub depth: u32,
    pub max_depth: u32,
    pub qty_children: usize,
    pub qty_children_recursive: usize,
}

/// A discipline and its topic forest.
#[derive(Debug, Clone)]
pub struct Discipline {
    info: DisciplineInfo,
    tree: TopicTree,
}

impl Discipline {
    /// Validate `topics` as this discipline's forest.
    pub fn new(info: DisciplineInfo, topics: Vec<Topic>) -> Result<Self> {
        if info.id.is_empty() {
            return Err(LearningError::MissingArgument("discipline.id"));
        }
        if let Some(foreign) = topics.iter().find(|t| t.discipline_id != info.id) {
            return Err(LearningError::topology(
                &foreign.id,
                format!(
                    "belongs to discipline '{}', expected '{}'",
                    foreign.discipline_id, info.id
                ),
            ));
        }
        let tree = TopicTree::build(topics)?;
        Ok(Self { info, tree })
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn info(&self) -> &DisciplineInfo {
        &self.info
    }

    pub fn tree(&self) -> &TopicTree {
        &self.tree
    }

    /// Deepest level reached by any active topic; 0 when there is none.
    pub fn max_topics_depth(&self) -> u32 {
        self.tree
            .topics()
            .filter(|t| t.is_active)
            .map(|t| t.depth)
            .max()
            .unwrap_or(0)
    }

    /// Structural metrics for one topic.
    pub fn statistics(&self, topic_id: &str) -> Result<TopicStructure> {
        let i = self.tree.locate(topic_id)?;
        Ok(TopicStructure {
            depth: self.tree.node(i).depth,
            max_depth: self.tree.subtree_max_depth(i),
            qty_children: self.tree.children_indices(i).len(),
            qty_children_recursive: self.tree.descendant_count(i),
        })
    }

    /// Topics flagged as classification buckets.
    pub fn classification_topics(&self) -> impl Iterator<Item = &Topic> + '_ {
        self.tree.topics().filter(|t| t.is_topic_classify)
    }
}
