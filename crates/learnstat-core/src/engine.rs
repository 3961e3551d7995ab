//! The "get learning" use case.
//!
//! Loads a discipline snapshot from a [`SnapshotSource`], builds the tree and
//! indexes, and runs the aggregator. Batch mode serves many (user,
//! discipline) requests concurrently; each computation owns its own data, so
//! nothing is shared between them besides the source.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::config::EngineSettings;
use crate::discipline::Discipline;
use crate::learning::LearningView;
use crate::model::DisciplineSnapshot;
use crate::questions::QuestionIndex;
use crate::report::LearningReport;
use crate::statistics::{FrequencyReference, StatisticsAggregator};
use crate::traits::SnapshotSource;

/// Configuration for the learning engine.
#[derive(Debug, Clone)]
pub struct LearningEngineConfig {
    /// Maximum concurrent computations in batch mode.
    pub parallelism: usize,
    /// Cohort used by `frequency_in_depth`.
    pub frequency_reference: FrequencyReference,
}

impl Default for LearningEngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            frequency_reference: FrequencyReference::default(),
        }
    }
}

impl From<&EngineSettings> for LearningEngineConfig {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            parallelism: settings.parallelism.max(1),
            frequency_reference: settings.frequency_reference,
        }
    }
}

/// One learning to compute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearningRequest {
    pub user_id: String,
    pub discipline_id: String,
}

impl LearningRequest {
    pub fn new(user_id: impl Into<String>, discipline_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            discipline_id: discipline_id.into(),
        }
    }
}

/// A request that could not be served.
#[derive(Debug, Clone)]
pub struct FailedRequest {
    pub request: LearningRequest,
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone)]
pub struct LearningBatch {
    pub reports: Vec<LearningReport>,
    pub failed: Vec<FailedRequest>,
    pub duration_ms: u64,
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_learning_start(&self, user_id: &str, discipline_id: &str);
    fn on_learning_complete(&self, report: &LearningReport);
    fn on_learning_error(&self, user_id: &str, discipline_id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_learning_start(&self, _: &str, _: &str) {}
    fn on_learning_complete(&self, _: &LearningReport) {}
    fn on_learning_error(&self, _: &str, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Compute one learning view from an in-memory snapshot.
pub fn compute_learning(
    snapshot: &DisciplineSnapshot,
    user_id: &str,
    reference: FrequencyReference,
) -> crate::error::Result<LearningView> {
    let discipline = Discipline::new(snapshot.discipline.clone(), snapshot.topics.clone())?;
    let questions = QuestionIndex::build(&snapshot.questions);
    StatisticsAggregator::new(&discipline, &questions)
        .with_frequency_reference(reference)
        .compute(&snapshot.answers, user_id)
}

/// The learning engine.
pub struct LearningEngine {
    source: Arc<dyn SnapshotSource>,
    config: LearningEngineConfig,
}

impl LearningEngine {
    pub fn new(source: Arc<dyn SnapshotSource>, config: LearningEngineConfig) -> Self {
        Self { source, config }
    }

    /// Compute the learning view of one user in one discipline.
    pub async fn get_learning(&self, user_id: &str, discipline_id: &str) -> Result<LearningView> {
        Ok(self.get_report(user_id, discipline_id).await?.learning)
    }

    /// Same as [`get_learning`](Self::get_learning), wrapped in a report.
    pub async fn get_report(&self, user_id: &str, discipline_id: &str) -> Result<LearningReport> {
        serve(
            Arc::clone(&self.source),
            self.config.frequency_reference,
            user_id,
            discipline_id,
        )
        .await
    }

    /// Serve many requests concurrently, at most `parallelism` at a time.
    pub async fn get_learnings(
        &self,
        requests: &[LearningRequest],
        progress: &dyn ProgressReporter,
    ) -> LearningBatch {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();
        for request in requests {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            let reference = self.config.frequency_reference;
            let request = request.clone();

            progress.on_learning_start(&request.user_id, &request.discipline_id);
            futures.push(async move {
                let outcome = async {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    serve(source, reference, &request.user_id, &request.discipline_id).await
                }
                .await;
                (request, outcome)
            });
        }

        let total = futures.len();
        let mut reports = Vec::new();
        let mut failed = Vec::new();

        while let Some((request, outcome)) = futures.next().await {
            match outcome {
                Ok(report) => {
                    progress.on_learning_complete(&report);
                    reports.push(report);
                }
                Err(e) => {
                    tracing::error!(
                        "learning failed for {}/{}: {e:#}",
                        request.user_id,
                        request.discipline_id
                    );
                    progress.on_learning_error(
                        &request.user_id,
                        &request.discipline_id,
                        &format!("{e:#}"),
                    );
                    failed.push(FailedRequest {
                        request,
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, reports.len(), failed.len(), elapsed);

        reports.sort_by(|a, b| {
            (&a.discipline.id, a.learning.user_id()).cmp(&(&b.discipline.id, b.learning.user_id()))
        });

        LearningBatch {
            reports,
            failed,
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}

async fn serve(
    source: Arc<dyn SnapshotSource>,
    reference: FrequencyReference,
    user_id: &str,
    discipline_id: &str,
) -> Result<LearningReport> {
    let start = Instant::now();
    let snapshot = source
        .snapshot(discipline_id)
        .await
        .with_context(|| format!("failed to load discipline '{discipline_id}' from {}", source.name()))?
        .ok_or_else(|| anyhow::anyhow!("discipline not found: {discipline_id}"))?;

    let learning = compute_learning(&snapshot, user_id, reference)?;
    Ok(LearningReport::new(
        &snapshot.discipline,
        learning,
        start.elapsed().as_millis() as u64,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::ledger::fixtures::answer;
    use crate::model::DisciplineInfo;
    use crate::questions::fixtures::portuguese_questions;
    use crate::traits::InMemorySource;
    use crate::tree::fixtures::{portuguese_topics, topic};

    fn portuguese() -> DisciplineSnapshot {
        DisciplineSnapshot {
            discipline: DisciplineInfo {
                id: "portugues".into(),
                name: "Língua Portuguesa".into(),
                description: String::new(),
            },
            topics: portuguese_topics(),
            questions: portuguese_questions(),
            answers: vec![
                answer("alice", "terra", Some(true), Some(100.0)),
                answer("bob", "terra", Some(false), Some(0.0)),
            ],
        }
    }

    fn corrupt() -> DisciplineSnapshot {
        DisciplineSnapshot {
            discipline: DisciplineInfo {
                id: "broken".into(),
                name: String::new(),
                description: String::new(),
            },
            topics: vec![topic("orphan", Some("ghost"), "ghost", 2)],
            questions: vec![],
            answers: vec![],
        }
    }

    fn engine() -> LearningEngine {
        let source = InMemorySource::new(vec![portuguese(), corrupt()]);
        LearningEngine::new(Arc::new(source), LearningEngineConfig::default())
    }

    #[derive(Default)]
    struct CountingReporter {
        started: AtomicUsize,
        completed: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ProgressReporter for CountingReporter {
        fn on_learning_start(&self, _: &str, _: &str) {
            self.started.fetch_add(1, Ordering::Relaxed);
        }
        fn on_learning_complete(&self, _: &LearningReport) {
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
        fn on_learning_error(&self, _: &str, _: &str, _: &str) {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
    }

    #[tokio::test]
    async fn get_learning_for_user() {
        let view = engine().get_learning("alice", "portugues").await.unwrap();
        let terra = view.find_by_topic_id("terra").unwrap().unwrap();
        assert_eq!(terra.avg_grade, Some(100.0));
        assert_eq!(terra.collective_avg_grade, Some(50.0));
        assert_eq!(terra.difficulty, 50.0);
    }

    #[tokio::test]
    async fn unknown_discipline_fails() {
        let err = engine().get_learning("alice", "math").await.unwrap_err();
        assert!(err.to_string().contains("discipline not found"));
    }

    #[tokio::test]
    async fn corrupt_topology_aborts() {
        let err = engine().get_learning("alice", "broken").await.unwrap_err();
        let learning_err = err.downcast_ref::<crate::error::LearningError>().unwrap();
        assert!(learning_err.is_corrupt_input());
    }

    #[tokio::test]
    async fn batch_reports_successes_and_failures() {
        let requests = vec![
            LearningRequest::new("bob", "portugues"),
            LearningRequest::new("alice", "portugues"),
            LearningRequest::new("alice", "broken"),
            LearningRequest::new("", "portugues"),
        ];
        let reporter = CountingReporter::default();
        let batch = engine().get_learnings(&requests, &reporter).await;

        assert_eq!(batch.reports.len(), 2);
        assert_eq!(batch.failed.len(), 2);
        assert_eq!(batch.reports[0].learning.user_id(), "alice");
        assert_eq!(batch.reports[1].learning.user_id(), "bob");
        assert_eq!(reporter.started.load(Ordering::Relaxed), 4);
        assert_eq!(reporter.completed.load(Ordering::Relaxed), 2);
        assert_eq!(reporter.errors.load(Ordering::Relaxed), 2);
        assert!(batch
            .failed
            .iter()
            .any(|f| f.error.contains("missing argument: user_id")));
    }

    #[tokio::test]
    async fn batch_matches_single_requests() {
        let engine = engine();
        let single = engine.get_learning("bob", "portugues").await.unwrap();
        let batch = engine
            .get_learnings(&[LearningRequest::new("bob", "portugues")], &NoopReporter)
            .await;
        assert_eq!(batch.reports[0].learning, single);
    }

    #[test]
    fn config_from_settings() {
        let settings = EngineSettings {
            frequency_reference: FrequencyReference::Siblings,
            parallelism: 0,
        };
        let config = LearningEngineConfig::from(&settings);
        assert_eq!(config.parallelism, 1);
        assert_eq!(config.frequency_reference, FrequencyReference::Siblings);
    }
}
