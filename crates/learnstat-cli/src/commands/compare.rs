//! The `learnstat compare` command.

use std::path::PathBuf;

use anyhow::Result;

use learnstat_core::config::load_config;
use learnstat_core::report::LearningReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: Option<f64>,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    let threshold = match threshold {
        Some(t) => t,
        None => load_config()?.compare_threshold,
    };
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = LearningReport::load_json(&baseline_path)?;
    let current = LearningReport::load_json(&current_path)?;

    if baseline.learning.user_id() != current.learning.user_id()
        || baseline.discipline.id != current.discipline.id
    {
        tracing::warn!(
            "comparing different learnings: {}/{} vs {}/{}",
            baseline.discipline.id,
            baseline.learning.user_id(),
            current.discipline.id,
            current.learning.user_id()
        );
    }

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            // text format
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            if !report.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &report.regressions {
                    println!(
                        "  {} {:.2} -> {:.2} ({:+.2})",
                        r.topic_id, r.baseline_grade, r.current_grade, r.delta
                    );
                }
            }

            if !report.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &report.improvements {
                    println!(
                        "  {} {:.2} -> {:.2} ({:+.2})",
                        i.topic_id, i.baseline_grade, i.current_grade, i.delta
                    );
                }
            }

            if report.newly_graded > 0 {
                println!("\n{} newly graded topic(s)", report.newly_graded);
            }
            if report.new_topics > 0 {
                println!("{} new topic(s)", report.new_topics);
            }
            if report.removed_topics > 0 {
                println!("{} removed topic(s)", report.removed_topics);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
