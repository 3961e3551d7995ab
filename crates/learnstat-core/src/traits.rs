//! Snapshot source trait.
//!
//! The persistence layer (discipline, topic, question and answer
//! repositories) lives outside this crate. The engine only sees it through
//! [`SnapshotSource`], which hands over plain data copies per request.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::model::{DisciplineInfo, DisciplineSnapshot, Question, QuizAnswer, Topic};

/// Read access to discipline data.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Human-readable source name (e.g. "memory").
    fn name(&self) -> &str;

    /// Discipline identity, or `None` if it does not exist.
    async fn discipline(&self, discipline_id: &str) -> anyhow::Result<Option<DisciplineInfo>>;

    /// Every topic of the discipline, active or not.
    async fn topics(&self, discipline_id: &str) -> anyhow::Result<Vec<Topic>>;

    /// Every question of the discipline, active or not.
    async fn questions(&self, discipline_id: &str) -> anyhow::Result<Vec<Question>>;

    /// Every user's answers within the discipline.
    async fn answers(&self, discipline_id: &str) -> anyhow::Result<Vec<QuizAnswer>>;

    /// Load everything at once.
    async fn snapshot(&self, discipline_id: &str) -> anyhow::Result<Option<DisciplineSnapshot>> {
        let Some(discipline) = self.discipline(discipline_id).await? else {
            return Ok(None);
        };
        Ok(Some(DisciplineSnapshot {
            discipline,
            topics: self.topics(discipline_id).await?,
            questions: self.questions(discipline_id).await?,
            answers: self.answers(discipline_id).await?,
        }))
    }
}

/// A source backed by snapshots held in memory (loaded files, fixtures).
#[derive(Debug, Default)]
pub struct InMemorySource {
    snapshots: HashMap<String, DisciplineSnapshot>,
}

impl InMemorySource {
    pub fn new(snapshots: impl IntoIterator<Item = DisciplineSnapshot>) -> Self {
        Self {
            snapshots: snapshots
                .into_iter()
                .map(|s| (s.discipline.id.clone(), s))
                .collect(),
        }
    }

    /// Add or replace a discipline's snapshot.
    pub fn insert(&mut self, snapshot: DisciplineSnapshot) {
        self.snapshots
            .insert(snapshot.discipline.id.clone(), snapshot);
    }

    /// Ids of every held discipline, sorted.
    pub fn discipline_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.snapshots.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn get(&self, discipline_id: &str) -> anyhow::Result<&DisciplineSnapshot> {
        self.snapshots
            .get(discipline_id)
            .ok_or_else(|| anyhow::anyhow!("discipline not found: {discipline_id}"))
    }
}

#[async_trait]
impl SnapshotSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn discipline(&self, discipline_id: &str) -> anyhow::Result<Option<DisciplineInfo>> {
        Ok(self
            .snapshots
            .get(discipline_id)
            .map(|s| s.discipline.clone()))
    }

    async fn topics(&self, discipline_id: &str) -> anyhow::Result<Vec<Topic>> {
        Ok(self.get(discipline_id)?.topics.clone())
    }

    async fn questions(&self, discipline_id: &str) -> anyhow::Result<Vec<Question>> {
        Ok(self.get(discipline_id)?.questions.clone())
    }

    async fn answers(&self, discipline_id: &str) -> anyhow::Result<Vec<QuizAnswer>> {
        Ok(self.get(discipline_id)?.answers.clone())
    }
}
