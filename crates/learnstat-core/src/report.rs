//! Learning report types with JSON persistence and progress comparison.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::learning::LearningView;
use crate::model::DisciplineInfo;

/// A computed learning view with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the discipline.
    pub discipline: DisciplineSummary,
    /// Per-topic statistics.
    pub learning: LearningView,
    /// Wall-clock time to load and compute, in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a discipline (without its topic forest).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisciplineSummary {
    pub id: String,
    pub name: String,
    pub topic_count: usize,
}

impl LearningReport {
    pub fn new(discipline: &DisciplineInfo, learning: LearningView, duration_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            discipline: DisciplineSummary {
                id: discipline.id.clone(),
                name: discipline.name.clone(),
                topic_count: learning.len(),
            },
            learning,
            duration_ms,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: LearningReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report's per-topic average grades against a baseline.
    ///
    /// `threshold` is in grade points: changes within it count as unchanged.
    pub fn compare(&self, baseline: &LearningReport, threshold: f64) -> ProgressReport {
        let grades = |report: &LearningReport| -> HashMap<String, (String, Option<f64>)> {
            report
                .learning
                .get_items()
                .map(|s| (s.topic_id.clone(), (s.name.clone(), s.avg_grade)))
                .collect()
        };

        let baseline_grades = grades(baseline);
        let current_grades = grades(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut newly_graded = 0usize;
        let mut ungraded = 0usize;
        let mut new_topics = 0usize;

        for (topic_id, (name, current)) in &current_grades {
            let Some((_, before)) = baseline_grades.get(topic_id) else {
                new_topics += 1;
                continue;
            };
            match (before, current) {
                (Some(before), Some(now)) => {
                    let change = GradeChange {
                        topic_id: topic_id.clone(),
                        name: name.clone(),
                        baseline_grade: *before,
                        current_grade: *now,
                        delta: now - before,
                    };
                    if change.delta < -threshold {
                        regressions.push(change);
                    } else if change.delta > threshold {
                        improvements.push(change);
                    } else {
                        unchanged += 1;
                    }
                }
                (None, Some(_)) => newly_graded += 1,
                (_, None) => ungraded += 1,
            }
        }

        let removed_topics = baseline_grades
            .keys()
            .filter(|k| !current_grades.contains_key(*k))
            .count();

        regressions.sort_by(|a, b| a.delta.total_cmp(&b.delta));
        improvements.sort_by(|a, b| b.delta.total_cmp(&a.delta));

        ProgressReport {
            user_id: self.learning.user_id().to_string(),
            discipline_id: self.discipline.id.clone(),
            regressions,
            improvements,
            unchanged,
            newly_graded,
            ungraded,
            new_topics,
            removed_topics,
        }
    }
}

/// Result of comparing two learning reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub user_id: String,
    pub discipline_id: String,
    /// Topics whose average grade went down, worst first.
    pub regressions: Vec<GradeChange>,
    /// Topics whose average grade went up, best first.
    pub improvements: Vec<GradeChange>,
    /// Topics with no significant change.
    pub unchanged: usize,
    /// Topics graded now but not in the baseline.
    pub newly_graded: usize,
    /// Topics without a grade in the current report.
    pub ungraded: usize,
    /// Topics in current but not baseline.
    pub new_topics: usize,
    /// Topics in baseline but not current.
    pub removed_topics: usize,
}

/// Average grade movement of one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeChange {
    pub topic_id: String,
    pub name: String,
    pub baseline_grade: f64,
    pub current_grade: f64,
    pub delta: f64,
}

impl ProgressReport {
    /// Format the progress report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**{} / {}:** {} regressions, {} improvements, {} unchanged, {} newly graded\n\n",
            self.user_id,
            self.discipline_id,
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged,
            self.newly_graded
        ));

        let mut table = |title: &str, changes: &[GradeChange]| {
            if changes.is_empty() {
                return;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Topic | Baseline | Current | Delta |\n");
            md.push_str("|-------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.2} | {:.2} | {:+.2} |\n",
                    if c.name.is_empty() { &c.topic_id } else { &c.name },
                    c.baseline_grade,
                    c.current_grade,
                    c.delta
                ));
            }
            md.push('\n');
        };
        table("Regressions", &self.regressions);
        table("Improvements", &self.improvements);

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
