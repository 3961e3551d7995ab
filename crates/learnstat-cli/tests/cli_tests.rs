//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn learnstat() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("learnstat").unwrap();
    cmd.env_remove("LEARNSTAT_OUTPUT_DIR")
        .env_remove("LEARNSTAT_PARALLELISM");
    cmd
}

#[test]
fn validate_valid_snapshot() {
    learnstat()
        .arg("validate")
        .arg("--snapshot")
        .arg("../../snapshots/portugues.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("11 topics, 22 questions, 6 answers"))
        .stdout(predicate::str::contains("All snapshots valid"));
}

#[test]
fn validate_directory() {
    learnstat()
        .arg("validate")
        .arg("--snapshot")
        .arg("../../snapshots")
        .assert()
        .success()
        .stdout(predicate::str::contains("Discipline: matematica"))
        .stdout(predicate::str::contains("Discipline: portugues"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[discipline]
id = "broken"

[[topics]]
id = "crase"

[[questions]]
id = "q1"
topic = "crase"

[[answers]]
question = "q1"
user = "alice"
grade = 140.0
"#,
    )
    .unwrap();

    learnstat()
        .arg("validate")
        .arg("--snapshot")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[q1] WARNING"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    learnstat()
        .arg("validate")
        .arg("--snapshot")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn compute_prints_table() {
    let dir = TempDir::new().unwrap();

    learnstat()
        .current_dir(dir.path())
        .arg("compute")
        .arg("--snapshot")
        .arg(std::fs::canonicalize("../../snapshots/portugues.toml").unwrap())
        .arg("--user")
        .arg("alice")
        .arg("--format")
        .arg("table")
        .assert()
        .success()
        .stdout(predicate::str::contains("Língua Portuguesa :: alice"))
        .stdout(predicate::str::contains("Palavra terra"))
        .stdout(predicate::str::contains("30.00"))
        .stdout(predicate::str::contains("Answered (subtree)"))
        .stdout(predicate::function(|out: &str| {
            // terra sits under crase, so it prints before the pronomes subtree
            let terra = out.find("Palavra terra");
            let obliquos = out.find("Pronomes oblíquos");
            matches!((terra, obliquos), (Some(t), Some(o)) if t < o)
        }))
        .stderr(predicate::str::contains("(11 topics, 3 answers,"))
        .stderr(predicate::str::contains("1/1 succeeded"));
}

#[test]
fn compute_writes_one_report_per_user() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out");

    learnstat()
        .current_dir(dir.path())
        .arg("compute")
        .arg("--snapshot")
        .arg(std::fs::canonicalize("../../snapshots").unwrap())
        .arg("--output")
        .arg(&output)
        .arg("--format")
        .arg("json,html")
        .assert()
        .success()
        .stderr(predicate::str::contains("4/4 succeeded"));

    let mut names: Vec<String> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    assert_eq!(names.len(), 8);
    assert!(names[0].starts_with("learning-matematica-alice-"));
    assert_eq!(names.iter().filter(|n| n.ends_with(".html")).count(), 4);
}

#[test]
fn compute_rejects_unknown_frequency_reference() {
    learnstat()
        .arg("compute")
        .arg("--snapshot")
        .arg("../../snapshots/portugues.toml")
        .arg("--frequency-reference")
        .arg("galaxy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown frequency reference"));
}

#[test]
fn compute_fails_on_corrupt_topology() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cycle.toml");
    std::fs::write(
        &path,
        r#"
[discipline]
id = "cycle"

[[topics]]
id = "a"
parent = "b"
root = "a"
depth = 1

[[topics]]
id = "b"
parent = "a"
root = "a"
depth = 2
"#,
    )
    .unwrap();

    learnstat()
        .current_dir(dir.path())
        .arg("compute")
        .arg("--snapshot")
        .arg(&path)
        .arg("--user")
        .arg("alice")
        .arg("--format")
        .arg("table")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid topology"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    learnstat()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created learnstat.toml"))
        .stdout(predicate::str::contains("Created snapshots/example.toml"));

    assert!(dir.path().join("learnstat.toml").exists());
    assert!(dir.path().join("snapshots/example.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    learnstat()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    learnstat()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn init_output_validates_and_computes() {
    let dir = TempDir::new().unwrap();

    learnstat()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    learnstat()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--snapshot")
        .arg("snapshots/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All snapshots valid"));

    learnstat()
        .current_dir(dir.path())
        .arg("compute")
        .arg("--snapshot")
        .arg("snapshots/example.toml")
        .assert()
        .success()
        .stderr(predicate::str::contains("2/2 succeeded"));

    assert!(dir.path().join("learnstat-results").is_dir());
}

#[test]
fn compare_reports() {
    let dir = TempDir::new().unwrap();

    let baseline = make_test_report("terra", Some(90.0));
    let current = make_test_report("terra", Some(40.0));

    let baseline_path = dir.path().join("baseline.json");
    let current_path = dir.path().join("current.json");

    std::fs::write(&baseline_path, &baseline).unwrap();
    std::fs::write(&current_path, &current).unwrap();

    learnstat()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline_path)
        .arg("--current")
        .arg(&current_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 regressions"))
        .stdout(predicate::str::contains("terra 90.00 -> 40.00 (-50.00)"));

    learnstat()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline_path)
        .arg("--current")
        .arg(&current_path)
        .arg("--fail-on-regression")
        .assert()
        .failure();
}

#[test]
fn compare_nonexistent_report() {
    learnstat()
        .arg("compare")
        .arg("--baseline")
        .arg("no_such_file.json")
        .arg("--current")
        .arg("also_no_file.json")
        .assert()
        .failure();
}

#[test]
fn help_output() {
    learnstat()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Per-topic learning statistics for quiz platforms",
        ));
}

#[test]
fn version_output() {
    learnstat()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("learnstat"));
}

/// Create a minimal valid JSON report with one topic for testing.
fn make_test_report(topic_id: &str, avg_grade: Option<f64>) -> String {
    let grade = avg_grade
        .map(|g| g.to_string())
        .unwrap_or_else(|| "null".to_string());

    format!(
        r#"{{
    "id": "00000000-0000-0000-0000-000000000000",
    "created_at": "2025-01-01T00:00:00Z",
    "discipline": {{
        "id": "portugues",
        "name": "Língua Portuguesa",
        "topic_count": 1
    }},
    "learning": {{
        "user_id": "alice",
        "discipline_id": "portugues",
        "max_topics_depth": 1,
        "topics": {{
            "{topic_id}": {{
                "topic_id": "{topic_id}",
                "discipline_id": "portugues",
                "name": "",
                "parent_id": null,
                "root_id": "{topic_id}",
                "is_active": true,
                "is_topic_classify": false,
                "depth": 1,
                "max_depth": 1,
                "qty_children": 0,
                "qty_children_recursive": 0,
                "qty_questions": 1,
                "qty_questions_recursive": 0,
                "qty_all_questions_depth": 1,
                "max_qty_all_questions_root_recursive": 1,
                "frequency_in_discipline": 1.0,
                "frequency_in_depth": 100.0,
                "qty_questions_answered": 1,
                "qty_questions_correct_answered": 0,
                "qty_questions_answered_recursive": 1,
                "qty_questions_correct_answered_recursive": 0,
                "avg_grade": {grade},
                "collective_avg_grade": {grade},
                "difficulty": 50.0,
                "difficulty_recursive": 50.0
            }}
        }}
    }},
    "duration_ms": 1
}}"#
    )
}
