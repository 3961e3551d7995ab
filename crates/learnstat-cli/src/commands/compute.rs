//! The `learnstat compute` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use learnstat_core::config::load_config_from;
use learnstat_core::engine::{
    LearningEngine, LearningEngineConfig, LearningRequest, ProgressReporter,
};
use learnstat_core::parser;
use learnstat_core::report::LearningReport;
use learnstat_core::statistics::FrequencyReference;
use learnstat_core::traits::InMemorySource;
use learnstat_report::html::write_html_report;

/// Arguments of `learnstat compute`.
pub struct ComputeArgs {
    pub snapshot: PathBuf,
    pub user: Option<String>,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub frequency_reference: Option<String>,
    pub parallelism: Option<usize>,
    pub config: Option<PathBuf>,
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_learning_start(&self, user_id: &str, discipline_id: &str) {
        eprintln!("  Starting: {discipline_id} :: {user_id}");
    }

    fn on_learning_complete(&self, report: &LearningReport) {
        let answered: usize = report
            .learning
            .get_items()
            .map(|s| s.qty_questions_answered)
            .sum();
        eprintln!(
            "  Done: {} :: {} ({} topics, {} answers, {}ms)",
            report.discipline.id,
            report.learning.user_id(),
            report.discipline.topic_count,
            answered,
            report.duration_ms,
        );
    }

    fn on_learning_error(&self, user_id: &str, discipline_id: &str, error: &str) {
        eprintln!("  ERROR: {discipline_id} :: {user_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} succeeded, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(args: ComputeArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;

    let mut engine_config = LearningEngineConfig::from(&config.engine);
    if let Some(parallelism) = args.parallelism {
        anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
        engine_config.parallelism = parallelism;
    }
    if let Some(reference) = &args.frequency_reference {
        engine_config.frequency_reference = reference
            .parse::<FrequencyReference>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    if let Some(user) = &args.user {
        anyhow::ensure!(!user.trim().is_empty(), "--user must not be empty");
    }

    let output = args.output.unwrap_or_else(|| config.output_dir.clone());
    let format = args.format.unwrap_or_else(|| config.default_format.clone());

    let snapshots = parser::load_snapshots(&args.snapshot)?;
    anyhow::ensure!(
        !snapshots.is_empty(),
        "no snapshots found in {}",
        args.snapshot.display()
    );

    // One request per (discipline, learner)
    let mut requests = Vec::new();
    for snapshot in &snapshots {
        let users = match &args.user {
            Some(user) => vec![user.clone()],
            None => snapshot.users(),
        };
        if users.is_empty() {
            tracing::warn!(
                "discipline '{}' has no answers; pass --user to compute anyway",
                snapshot.discipline.id
            );
        }
        requests.extend(
            users
                .into_iter()
                .map(|user| LearningRequest::new(user, snapshot.discipline.id.clone())),
        );
    }

    eprintln!(
        "learnstat v{} - Computing {} learning(s) across {} discipline(s)",
        env!("CARGO_PKG_VERSION"),
        requests.len(),
        snapshots.len()
    );
    eprintln!();

    let source = InMemorySource::new(snapshots);
    let engine = LearningEngine::new(Arc::new(source), engine_config);
    let batch = engine.get_learnings(&requests, &ConsoleReporter).await;

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "table"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    for report in &batch.reports {
        let stem = format!(
            "learning-{}-{}-{timestamp}",
            report.discipline.id,
            report.learning.user_id()
        );
        for fmt in &formats {
            match *fmt {
                "json" => {
                    let path = output.join(format!("{stem}.json"));
                    report.save_json(&path)?;
                    eprintln!("Results saved to: {}", path.display());
                }
                "html" => {
                    let path = output.join(format!("{stem}.html"));
                    write_html_report(report, &path)?;
                    eprintln!("HTML report: {}", path.display());
                }
                "table" => print_summary(report),
                _ => {
                    eprintln!("Unknown format: {fmt}");
                }
            }
        }
    }

    anyhow::ensure!(
        batch.failed.is_empty(),
        "{} of {} learning(s) failed",
        batch.failed.len(),
        requests.len()
    );

    Ok(())
}

fn grade(value: Option<f64>) -> String {
    value
        .map(|g| format!("{g:.2}"))
        .unwrap_or_else(|| "-".to_string())
}

fn print_summary(report: &LearningReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Topic",
        "Depth",
        "Questions",
        "Freq. depth",
        "Answered (subtree)",
        "Correct (subtree)",
        "Avg grade",
        "Collective",
        "Difficulty",
    ]);

    for s in report.learning.tree_order() {
        let label = if s.name.is_empty() { &s.topic_id } else { &s.name };
        table.add_row(vec![
            Cell::new(format!("{}{label}", "  ".repeat(s.depth.saturating_sub(1) as usize))),
            Cell::new(s.depth),
            Cell::new(format!("{}/{}", s.qty_questions, s.qty_all_questions_depth)),
            Cell::new(format!("{:.2}%", s.frequency_in_depth)),
            Cell::new(s.qty_questions_answered_recursive),
            Cell::new(s.qty_questions_correct_answered_recursive),
            Cell::new(grade(s.avg_grade)),
            Cell::new(grade(s.collective_avg_grade)),
            Cell::new(format!("{:.2}", s.difficulty)),
        ]);
    }

    println!(
        "\n{} :: {}\n{table}",
        report.discipline.name,
        report.learning.user_id()
    );
}
