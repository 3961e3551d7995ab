//! Topic hierarchy for one discipline.
//!
//! Topics are stored in a flat arena and linked by index. A single pre-order
//! walk lays every subtree out contiguously, so descendant queries are slices
//! and reversing the walk gives a valid bottom-up (post-order) schedule.

use std::collections::HashMap;

use crate::error::{LearningError, Result};
use crate::model::Topic;

/// Indexed, validated topic forest.
#[derive(Debug, Clone)]
pub struct TopicTree {
    topics: Vec<Topic>,
    index: HashMap<String, usize>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    /// Arena indices in pre-order; each subtree is a contiguous run.
    preorder: Vec<usize>,
    /// Arena index -> position in `preorder`.
    position: Vec<usize>,
    /// Number of descendants (excluding the topic itself).
    descendants: Vec<usize>,
    max_depth: Vec<u32>,
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl TopicTree {
    /// Build and validate the forest.
    ///
    /// Fails with [`LearningError::InvalidTopology`] on duplicate ids, mixed
    /// disciplines, missing parents, cycles, or a `depth`/`root_id` that does
    /// not agree with the parent chain.
    pub fn build(topics: Vec<Topic>) -> Result<Self> {
        let mut index = HashMap::with_capacity(topics.len());
        for (i, topic) in topics.iter().enumerate() {
            if topic.id.is_empty() {
                return Err(LearningError::MissingArgument("topic.id"));
            }
            if index.insert(topic.id.clone(), i).is_some() {
                return Err(LearningError::topology(&topic.id, "duplicate topic id"));
            }
        }

        if let Some(first) = topics.first() {
            if let Some(foreign) = topics
                .iter()
                .find(|t| t.discipline_id != first.discipline_id)
            {
                return Err(LearningError::topology(
                    &foreign.id,
                    format!(
                        "belongs to discipline '{}', expected '{}'",
                        foreign.discipline_id, first.discipline_id
                    ),
                ));
            }
        }

        let mut parent = vec![None; topics.len()];
        let mut children = vec![Vec::new(); topics.len()];
        let mut roots = Vec::new();
        for (i, topic) in topics.iter().enumerate() {
            match &topic.parent_id {
                None => roots.push(i),
                Some(pid) if pid == &topic.id => {
                    return Err(LearningError::topology(&topic.id, "topic is its own parent"));
                }
                Some(pid) => {
                    let Some(&p) = index.get(pid) else {
                        return Err(LearningError::topology(
                            &topic.id,
                            format!("parent '{pid}' not found"),
                        ));
                    };
                    parent[i] = Some(p);
                    children[p].push(i);
                }
            }
        }

        detect_cycles(&topics, &parent)?;

        let mut tree = TopicTree {
            position: vec![0; topics.len()],
            descendants: vec![0; topics.len()],
            max_depth: vec![0; topics.len()],
            preorder: Vec::with_capacity(topics.len()),
            topics,
            index,
            parent,
            children,
            roots,
        };
        tree.layout()?;

        tracing::debug!(
            topics = tree.topics.len(),
            roots = tree.roots.len(),
            "topic tree indexed"
        );
        Ok(tree)
    }

    /// Pre-order walk from every root; checks declared depth and root, then
    /// fills subtree sizes and max depths bottom-up.
    fn layout(&mut self) -> Result<()> {
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            let topic = &self.topics[i];
            let (expected_depth, expected_root) = match self.parent[i] {
                None => (1, topic.id.as_str()),
                Some(p) => (
                    self.topics[p].depth + 1,
                    self.topics[p].root_id.as_str(),
                ),
            };
            if topic.depth != expected_depth {
                return Err(LearningError::topology(
                    &topic.id,
                    format!(
                        "declared depth {} but parent chain gives {}",
                        topic.depth, expected_depth
                    ),
                ));
            }
            if topic.root_id != expected_root {
                return Err(LearningError::topology(
                    &topic.id,
                    format!(
                        "declared root '{}' but parent chain gives '{}'",
                        topic.root_id, expected_root
                    ),
                ));
            }

            self.position[i] = self.preorder.len();
            self.preorder.push(i);
            stack.extend(self.children[i].iter().rev().copied());
        }

        for &i in self.preorder.iter().rev() {
            let mut size = 0;
            let mut deepest = self.topics[i].depth;
            for &c in &self.children[i] {
                size += 1 + self.descendants[c];
                deepest = deepest.max(self.max_depth[c]);
            }
            self.descendants[i] = size;
            self.max_depth[i] = deepest;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Look up a topic by id.
    pub fn topic(&self, topic_id: &str) -> Option<&Topic> {
        self.index.get(topic_id).map(|&i| &self.topics[i])
    }

    /// All topics in pre-order (each parent before its descendants).
    pub fn topics(&self) -> impl Iterator<Item = &Topic> + '_ {
        self.preorder.iter().map(move |&i| &self.topics[i])
    }

    /// Root topics, in input order.
    pub fn roots(&self) -> impl Iterator<Item = &Topic> + '_ {
        self.roots.iter().map(move |&i| &self.topics[i])
    }

    pub fn depth(&self, topic_id: &str) -> Result<u32> {
        Ok(self.topics[self.locate(topic_id)?].depth)
    }

    pub fn direct_children(&self, topic_id: &str) -> Result<impl Iterator<Item = &Topic> + '_> {
        let i = self.locate(topic_id)?;
        Ok(self.children[i].iter().map(move |&c| &self.topics[c]))
    }

    /// Transitive closure below the topic, excluding the topic itself.
    pub fn all_descendants(&self, topic_id: &str) -> Result<impl Iterator<Item = &Topic> + '_> {
        let i = self.locate(topic_id)?;
        Ok(self
            .descendant_indices(i)
            .iter()
            .map(move |&d| &self.topics[d]))
    }

    /// Parent chain from the direct parent up to the root.
    pub fn ancestors(&self, topic_id: &str) -> Result<Vec<&Topic>> {
        let mut current = self.parent[self.locate(topic_id)?];
        let mut chain = Vec::new();
        while let Some(p) = current {
            chain.push(&self.topics[p]);
            current = self.parent[p];
        }
        Ok(chain)
    }

    /// Maximum depth over the topic and its descendants.
    pub fn max_depth(&self, topic_id: &str) -> Result<u32> {
        Ok(self.max_depth[self.locate(topic_id)?])
    }

    pub fn root_of(&self, topic_id: &str) -> Result<&Topic> {
        let i = self.locate(topic_id)?;
        let root = &self.topics[i].root_id;
        Ok(&self.topics[self.index[root]])
    }

    pub fn qty_children(&self, topic_id: &str) -> Result<usize> {
        Ok(self.children[self.locate(topic_id)?].len())
    }

    pub fn qty_children_recursive(&self, topic_id: &str) -> Result<usize> {
        Ok(self.descendants[self.locate(topic_id)?])
    }

    // -----------------------------------------------------------------------
    // Index-level access for the aggregator
    // -----------------------------------------------------------------------

    pub(crate) fn locate(&self, topic_id: &str) -> Result<usize> {
        if topic_id.is_empty() {
            return Err(LearningError::MissingArgument("topic_id"));
        }
        self.index
            .get(topic_id)
            .copied()
            .ok_or_else(|| LearningError::UnknownTopic(topic_id.to_string()))
    }

    pub(crate) fn node(&self, i: usize) -> &Topic {
        &self.topics[i]
    }

    pub(crate) fn parent_index(&self, i: usize) -> Option<usize> {
        self.parent[i]
    }

    pub(crate) fn children_indices(&self, i: usize) -> &[usize] {
        &self.children[i]
    }

    pub(crate) fn root_indices(&self) -> &[usize] {
        &self.roots
    }

    pub(crate) fn descendant_indices(&self, i: usize) -> &[usize] {
        let start = self.position[i] + 1;
        &self.preorder[start..start + self.descendants[i]]
    }

    pub(crate) fn descendant_count(&self, i: usize) -> usize {
        self.descendants[i]
    }

    pub(crate) fn subtree_max_depth(&self, i: usize) -> u32 {
        self.max_depth[i]
    }

    /// Arena indices with every descendant before its ancestors.
    pub(crate) fn post_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.preorder.iter().rev().copied()
    }

    /// Arena indices with every ancestor before its descendants.
    pub(crate) fn pre_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.preorder.iter().copied()
    }
}

/// Walk each parent chain once, coloring nodes; reaching a node that is still
/// on the current chain means the chain loops.
fn detect_cycles(topics: &[Topic], parent: &[Option<usize>]) -> Result<()> {
    let mut marks = vec![Mark::Unvisited; topics.len()];
    let mut chain = Vec::new();
    for start in 0..topics.len() {
        let mut current = Some(start);
        while let Some(i) = current {
            match marks[i] {
                Mark::Done => break,
                Mark::InProgress => {
                    return Err(LearningError::topology(
                        &topics[i].id,
                        "cycle detected in parent chain",
                    ));
                }
                Mark::Unvisited => {
                    marks[i] = Mark::InProgress;
                    chain.push(i);
                    current = parent[i];
                }
            }
        }
        for i in chain.drain(..) {
            marks[i] = Mark::Done;
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn ids<'a>(it: impl Iterator<Item = &'a Topic>) -> Vec<&'a str> {
        let mut v: Vec<&str> = it.map(|t| t.id.as_str()).collect();
        v.sort();
        v
    }

    #[test]
    fn structural_queries() {
        let tree = TopicTree::build(portuguese_topics()).unwrap();
        assert_eq!(tree.len(), 11);
        assert_eq!(tree.depth("terra").unwrap(), 3);
        assert_eq!(tree.qty_children("crase").unwrap(), 4);
        assert_eq!(tree.qty_children_recursive("crase").unwrap(), 6);
        assert_eq!(tree.max_depth("crase").unwrap(), 3);
        assert_eq!(tree.max_depth("pronomes").unwrap(), 2);
        assert_eq!(tree.max_depth("terra").unwrap(), 3);
        assert_eq!(tree.root_of("distancia").unwrap().id, "crase");
        assert_eq!(
            ids(tree.all_descendants("especiais").unwrap()),
            vec!["distancia", "terra"]
        );
        assert_eq!(
            ids(tree.direct_children("crase").unwrap()),
            vec!["cidades", "especiais", "masculinas", "repetidas"]
        );
        assert_eq!(tree.all_descendants("cidades").unwrap().count(), 0);
    }

    #[test]
    fn ancestors_walk_to_root() {
        let tree = TopicTree::build(portuguese_topics()).unwrap();
        let chain: Vec<&str> = tree
            .ancestors("terra")
            .unwrap()
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(chain, vec!["especiais", "crase"]);
        assert!(tree.ancestors("crase").unwrap().is_empty());
    }

    #[test]
    fn children_count_matches_recursive_definition() {
        let tree = TopicTree::build(portuguese_topics()).unwrap();
        for topic in tree.topics() {
            let expected: usize = tree
                .direct_children(&topic.id)
                .unwrap()
                .map(|c| 1 + tree.qty_children_recursive(&c.id).unwrap())
                .sum();
            assert_eq!(tree.qty_children_recursive(&topic.id).unwrap(), expected);
        }
    }

    #[test]
    fn post_order_visits_descendants_first() {
        let tree = TopicTree::build(portuguese_topics()).unwrap();
        let order: Vec<usize> = tree.post_order().collect();
        let seen_at = |i: usize| order.iter().position(|&x| x == i).unwrap();
        for &i in &order {
            if let Some(p) = tree.parent_index(i) {
                assert!(seen_at(i) < seen_at(p));
            }
        }
    }

    #[test]
    fn input_order_is_irrelevant() {
        let mut topics = portuguese_topics();
        topics.reverse();
        let tree = TopicTree::build(topics).unwrap();
        assert_eq!(tree.qty_children_recursive("crase").unwrap(), 6);
    }

    #[test]
    fn rejects_missing_parent() {
        let topics = vec![topic("orphan", Some("ghost"), "ghost", 2)];
        let err = TopicTree::build(topics).unwrap_err();
        assert!(matches!(err, LearningError::InvalidTopology { ref topic_id, .. } if topic_id == "orphan"));
    }

    #[test]
    fn rejects_cycle() {
        let topics = vec![
            topic("a", Some("b"), "a", 2),
            topic("b", Some("a"), "a", 2),
        ];
        let err = TopicTree::build(topics).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn rejects_self_parent() {
        let err = TopicTree::build(vec![topic("a", Some("a"), "a", 1)]).unwrap_err();
        assert!(err.is_corrupt_input());
    }

    #[test]
    fn rejects_depth_mismatch() {
        let topics = vec![
            topic("root", None, "root", 1),
            topic("child", Some("root"), "root", 3),
        ];
        let err = TopicTree::build(topics).unwrap_err();
        assert!(err.to_string().contains("depth"));
    }

    #[test]
    fn rejects_root_mismatch() {
        let topics = vec![
            topic("root", None, "root", 1),
            topic("other", None, "other", 1),
            topic("child", Some("root"), "other", 2),
        ];
        let err = TopicTree::build(topics).unwrap_err();
        assert!(err.to_string().contains("root"));
    }

    #[test]
    fn rejects_duplicates_and_foreign_disciplines() {
        let dup = vec![topic("a", None, "a", 1), topic("a", None, "a", 1)];
        assert!(TopicTree::build(dup).unwrap_err().to_string().contains("duplicate"));

        let mut foreign = topic("b", None, "b", 1);
        foreign.discipline_id = "math".into();
        let mixed = vec![topic("a", None, "a", 1), foreign];
        assert!(TopicTree::build(mixed).unwrap_err().is_corrupt_input());
    }

    #[test]
    fn lookup_errors() {
        let tree = TopicTree::build(portuguese_topics()).unwrap();
        assert_eq!(
            tree.depth("").unwrap_err(),
            LearningError::MissingArgument("topic_id")
        );
        assert_eq!(
            tree.depth("nope").unwrap_err(),
            LearningError::UnknownTopic("nope".into())
        );
    }

    #[test]
    fn empty_forest() {
        let tree = TopicTree::build(vec![]).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.roots().count(), 0);
    }
}
