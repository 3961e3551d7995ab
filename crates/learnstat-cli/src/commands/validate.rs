//! The `learnstat validate` command.

use std::path::PathBuf;

use anyhow::Result;

use learnstat_core::parser;

pub fn execute(snapshot_path: PathBuf) -> Result<()> {
    let snapshots = parser::load_snapshots(&snapshot_path)?;

    let mut total_warnings = 0;

    for snapshot in &snapshots {
        println!(
            "Discipline: {} ({} topics, {} questions, {} answers)",
            snapshot.discipline.id,
            snapshot.topics.len(),
            snapshot.questions.len(),
            snapshot.answers.len()
        );

        let warnings = parser::validate_snapshot(snapshot);
        for w in &warnings {
            let prefix = w
                .record_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All snapshots valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
