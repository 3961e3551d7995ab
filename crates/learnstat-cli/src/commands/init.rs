//! The `learnstat init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("learnstat.toml").exists() {
        println!("learnstat.toml already exists, skipping.");
    } else {
        std::fs::write("learnstat.toml", SAMPLE_CONFIG)?;
        println!("Created learnstat.toml");
    }

    std::fs::create_dir_all("snapshots")?;
    let example_path = std::path::Path::new("snapshots/example.toml");
    if example_path.exists() {
        println!("snapshots/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_SNAPSHOT)?;
        println!("Created snapshots/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: learnstat validate --snapshot snapshots/example.toml");
    println!("  2. Run: learnstat compute --snapshot snapshots/example.toml --format table");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# learnstat configuration

output_dir = "./learnstat-results"
default_format = "json"
compare_threshold = 5.0

[engine]
# "depth": share of every topic at the same depth
# "siblings": share of the topic and its siblings
frequency_reference = "depth"
parallelism = 4
"#;

const EXAMPLE_SNAPSHOT: &str = r#"[discipline]
id = "portugues"
name = "Língua Portuguesa"
description = "A small example discipline to get started"

[[topics]]
id = "crase"
name = "Crase"

[[topics]]
id = "especiais"
name = "Casos especiais"
parent = "crase"

[[topics]]
id = "terra"
name = "Palavra terra"
parent = "especiais"

[[topics]]
id = "pronomes"
name = "Pronomes"

[[questions]]
id = "q1"
topic = "crase"

[[questions]]
id = "q2"
topic = "terra"

[[questions]]
id = "q3"
topic = "terra"

[[questions]]
id = "q4"
topic = "pronomes"

[[answers]]
quiz = "quiz-1"
question = "q1"
user = "alice"
correct = true
grade = 100.0

[[answers]]
quiz = "quiz-1"
question = "q2"
user = "alice"
correct = false
grade = 40.0

[[answers]]
quiz = "quiz-2"
question = "q2"
user = "bob"
correct = true
grade = 90.0
"#;
