//! End-to-end pipeline tests: snapshot file -> engine -> report files.

use std::path::Path;
use std::sync::Arc;

use learnstat_core::engine::{LearningEngine, LearningEngineConfig, LearningRequest, NoopReporter};
use learnstat_core::parser;
use learnstat_core::report::LearningReport;
use learnstat_core::statistics::FrequencyReference;
use learnstat_core::traits::InMemorySource;
use learnstat_report::html::write_html_report;

fn engine(reference: FrequencyReference) -> LearningEngine {
    let snapshots = parser::load_snapshots(Path::new("../../snapshots")).unwrap();
    let config = LearningEngineConfig {
        parallelism: 2,
        frequency_reference: reference,
    };
    LearningEngine::new(Arc::new(InMemorySource::new(snapshots)), config)
}

#[tokio::test]
async fn e2e_portugues_for_alice() {
    let view = engine(FrequencyReference::Depth)
        .get_learning("alice", "portugues")
        .await
        .unwrap();

    assert_eq!(view.len(), 11);
    assert_eq!(view.max_topics_depth(), 3);

    let crase = view.find_by_topic_id("crase").unwrap().unwrap();
    assert_eq!(crase.qty_questions, 4);
    assert_eq!(crase.qty_all_questions_depth, 11);
    assert_eq!(crase.frequency_in_depth, 52.38);
    assert_eq!(crase.avg_grade, Some(100.0));
    assert_eq!(crase.collective_avg_grade, Some(60.0));
    assert_eq!(crase.difficulty, 40.0);
    assert_eq!(crase.qty_questions_answered_recursive, 2);
    assert_eq!(crase.qty_questions_correct_answered_recursive, 1);

    let terra = view.find_by_topic_id("terra").unwrap().unwrap();
    assert_eq!(terra.avg_grade, Some(30.0));
    assert_eq!(terra.collective_avg_grade, Some(60.0));
    assert_eq!(terra.qty_questions_correct_answered, 0);

    let classify = view.find_by_topic_id("a-classificar").unwrap().unwrap();
    assert!(classify.is_topic_classify);
    assert_eq!(classify.avg_grade, None);
    assert_eq!(classify.difficulty, 50.0);
}

#[tokio::test]
async fn e2e_learner_without_answers_sees_cohort_difficulty() {
    let view = engine(FrequencyReference::Depth)
        .get_learning("dave", "portugues")
        .await
        .unwrap();

    let terra = view.find_by_topic_id("terra").unwrap().unwrap();
    assert_eq!(terra.qty_questions_answered, 0);
    assert_eq!(terra.avg_grade, None);
    assert_eq!(terra.collective_avg_grade, Some(60.0));
    assert_eq!(terra.difficulty, 40.0);
}

#[tokio::test]
async fn e2e_siblings_reference() {
    let view = engine(FrequencyReference::Siblings)
        .get_learning("alice", "portugues")
        .await
        .unwrap();

    let especiais = view.find_by_topic_id("especiais").unwrap().unwrap();
    assert_eq!(especiais.frequency_in_depth, 71.43);
}

#[tokio::test]
async fn e2e_batch_to_report_files() {
    let engine = engine(FrequencyReference::Depth);
    let requests = vec![
        LearningRequest::new("alice", "portugues"),
        LearningRequest::new("alice", "matematica"),
        LearningRequest::new("alice", "history"),
    ];
    let batch = engine.get_learnings(&requests, &NoopReporter).await;

    assert_eq!(batch.reports.len(), 2);
    assert_eq!(batch.failed.len(), 1);
    assert_eq!(batch.failed[0].request.discipline_id, "history");

    let dir = tempfile::tempdir().unwrap();
    for report in &batch.reports {
        let stem = format!("{}-{}", report.discipline.id, report.learning.user_id());
        let json = dir.path().join(format!("{stem}.json"));
        let html = dir.path().join(format!("{stem}.html"));
        report.save_json(&json).unwrap();
        write_html_report(report, &html).unwrap();

        let loaded = LearningReport::load_json(&json).unwrap();
        assert_eq!(loaded.learning, report.learning);
        assert!(std::fs::read_to_string(&html)
            .unwrap()
            .contains(&report.discipline.name));
    }

    let matematica = &batch.reports[0];
    assert_eq!(matematica.discipline.id, "matematica");
    let equacoes = matematica
        .learning
        .find_by_topic_id("equacoes")
        .unwrap()
        .unwrap();
    assert_eq!(equacoes.avg_grade, Some(95.0));
    assert_eq!(equacoes.difficulty, 5.0);
}
