//! Discipline snapshot loader.
//!
//! Loads snapshots from TOML (hand-written fixtures) or JSON (repository
//! exports), from single files or whole directories, and validates them.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::discipline::Discipline;
use crate::model::{DisciplineInfo, DisciplineSnapshot, Question, QuizAnswer, Topic};

/// Intermediate TOML structure for snapshot files.
#[derive(Debug, Deserialize)]
struct TomlSnapshotFile {
    discipline: TomlDiscipline,
    #[serde(default)]
    topics: Vec<TomlTopic>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
    #[serde(default)]
    answers: Vec<TomlAnswer>,
}

#[derive(Debug, Deserialize)]
struct TomlDiscipline {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlTopic {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    parent: Option<String>,
    /// Derived from the parent chain when omitted.
    #[serde(default)]
    root: Option<String>,
    /// Derived from the parent chain when omitted.
    #[serde(default)]
    depth: Option<u32>,
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default)]
    classify: bool,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    topic: String,
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default)]
    statement: String,
}

#[derive(Debug, Deserialize)]
struct TomlAnswer {
    #[serde(default)]
    quiz: String,
    question: String,
    /// Denormalized from the question when omitted.
    #[serde(default)]
    topic: Option<String>,
    user: String,
    #[serde(default)]
    correct: Option<bool>,
    #[serde(default)]
    grade: Option<f64>,
}

fn default_true() -> bool {
    true
}

/// Parse a single snapshot file; `.json` files are read as JSON, anything
/// else as TOML.
pub fn parse_snapshot(path: &Path) -> Result<DisciplineSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot file: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))
    } else {
        parse_snapshot_str(&content, path)
    }
}

/// Parse a TOML string into a `DisciplineSnapshot` (useful for testing).
pub fn parse_snapshot_str(content: &str, source_path: &Path) -> Result<DisciplineSnapshot> {
    let parsed: TomlSnapshotFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let discipline_id = parsed.discipline.id.clone();
    let lineage = derive_lineage(&parsed.topics);

    let topics: Vec<Topic> = parsed
        .topics
        .into_iter()
        .map(|t| {
            let (derived_root, derived_depth) = lineage
                .get(t.id.as_str())
                .cloned()
                .unwrap_or_else(|| (t.id.clone(), 0));
            Topic {
                discipline_id: discipline_id.clone(),
                name: t.name,
                parent_id: t.parent,
                root_id: t.root.unwrap_or(derived_root),
                depth: t.depth.unwrap_or(derived_depth),
                is_active: t.active,
                is_topic_classify: t.classify,
                id: t.id,
            }
        })
        .collect();

    let question_topics: HashMap<&str, &str> = parsed
        .questions
        .iter()
        .map(|q| (q.id.as_str(), q.topic.as_str()))
        .collect();

    let answers = parsed
        .answers
        .iter()
        .map(|a| {
            let topic_id = match &a.topic {
                Some(topic) => topic.clone(),
                None => question_topics
                    .get(a.question.as_str())
                    .map(|t| t.to_string())
                    .with_context(|| {
                        format!(
                            "answer by '{}' references unknown question '{}' and has no topic",
                            a.user, a.question
                        )
                    })?,
            };
            Ok(QuizAnswer {
                quiz_id: a.quiz.clone(),
                question_id: a.question.clone(),
                topic_id,
                user_id: a.user.clone(),
                is_correct: a.correct,
                grade: a.grade,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| Question {
            id: q.id,
            topic_id: q.topic,
            is_active: q.active,
            statement: q.statement,
        })
        .collect();

    Ok(DisciplineSnapshot {
        discipline: DisciplineInfo {
            id: discipline_id,
            name: parsed.discipline.name,
            description: parsed.discipline.description,
        },
        topics,
        questions,
        answers,
    })
}

/// Root and depth of every topic whose parent chain resolves. Topics with
/// a broken or looping chain are left out; the tree build reports them.
fn derive_lineage(topics: &[TomlTopic]) -> HashMap<String, (String, u32)> {
    let parents: HashMap<&str, Option<&str>> = topics
        .iter()
        .map(|t| (t.id.as_str(), t.parent.as_deref()))
        .collect();

    let mut lineage = HashMap::new();
    for topic in topics {
        let mut current = topic.id.as_str();
        let mut depth = 1u32;
        let mut steps = 0;
        let resolved = loop {
            match parents.get(current) {
                Some(None) => break Some(current),
                Some(Some(parent)) if steps < topics.len() => {
                    current = *parent;
                    depth += 1;
                    steps += 1;
                }
                _ => break None,
            }
        };
        if let Some(root) = resolved {
            lineage.insert(topic.id.clone(), (root.to_string(), depth));
        }
    }
    lineage
}

/// Recursively load all `.toml` and `.json` snapshots from a directory.
pub fn load_snapshot_directory(dir: &Path) -> Result<Vec<DisciplineSnapshot>> {
    let mut snapshots = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            snapshots.extend(load_snapshot_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_snapshot(&path) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(snapshots)
}

/// Load a file, or every snapshot under a directory.
pub fn load_snapshots(path: &Path) -> Result<Vec<DisciplineSnapshot>> {
    if path.is_dir() {
        load_snapshot_directory(path)
    } else {
        Ok(vec![parse_snapshot(path)?])
    }
}

/// A warning from snapshot validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The topic, question or answer the warning is about (if applicable).
    pub record_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn about(record_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            record_id: Some(record_id.into()),
            message: message.into(),
        }
    }
}

/// Validate a snapshot for common data issues.
pub fn validate_snapshot(snapshot: &DisciplineSnapshot) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if let Err(e) = Discipline::new(snapshot.discipline.clone(), snapshot.topics.clone()) {
        warnings.push(ValidationWarning {
            record_id: None,
            message: e.to_string(),
        });
    }

    let topic_ids: HashSet<&str> = snapshot.topics.iter().map(|t| t.id.as_str()).collect();

    let mut question_topics: HashMap<&str, &str> = HashMap::new();
    for q in &snapshot.questions {
        if question_topics.insert(&q.id, &q.topic_id).is_some() {
            warnings.push(ValidationWarning::about(
                &q.id,
                format!("duplicate question ID: {}", q.id),
            ));
        }
        if !topic_ids.contains(q.topic_id.as_str()) {
            warnings.push(ValidationWarning::about(
                &q.id,
                format!("question attached to unknown topic '{}'", q.topic_id),
            ));
        }
    }

    for a in &snapshot.answers {
        match question_topics.get(a.question_id.as_str()) {
            None => warnings.push(ValidationWarning::about(
                &a.question_id,
                format!("answer by '{}' references unknown question", a.user_id),
            )),
            Some(&topic) if topic != a.topic_id => warnings.push(ValidationWarning::about(
                &a.question_id,
                format!(
                    "answer by '{}' records topic '{}' but the question belongs to '{}'",
                    a.user_id, a.topic_id, topic
                ),
            )),
            Some(_) => {}
        }
        if let Some(grade) = a.grade {
            if !(0.0..=100.0).contains(&grade) {
                warnings.push(ValidationWarning::about(
                    &a.question_id,
                    format!("answer by '{}' has grade {grade} outside 0-100", a.user_id),
                ));
            }
        }
    }

    warnings
}
