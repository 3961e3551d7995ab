//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use std::path::Path;

use anyhow::Result;

use learnstat_core::report::LearningReport;
use learnstat_core::statistics::TopicStatistics;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn grade_cell(grade: Option<f64>) -> String {
    grade.map(|g| format!("{g:.2}")).unwrap_or_else(|| "-".to_string())
}

/// Generate an HTML report from a learning report.
pub fn generate_html(report: &LearningReport) -> String {
    let mut html = String::new();
    let learning = &report.learning;

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>learnstat report - {}</title>\n",
        html_escape(&report.discipline.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>learnstat report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Discipline: <strong>{}</strong> | learner <strong>{}</strong> | {} topics | max depth {} | {}</p>\n",
        html_escape(&report.discipline.name),
        html_escape(learning.user_id()),
        report.discipline.topic_count,
        learning.max_topics_depth(),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Root summary
    let roots: Vec<&TopicStatistics> = learning.get_items().filter(|s| s.depth == 1).collect();
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    if !roots.is_empty() {
        html.push_str(&generate_bar_chart(&roots));
    }
    html.push_str("</section>\n");

    // Per-topic results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Topics</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr>");
    for (col, title) in [
        "Topic",
        "Depth",
        "Questions",
        "Subtree",
        "Freq. discipline",
        "Freq. depth %",
        "Answered",
        "Correct",
        "Avg grade",
        "Collective",
        "Difficulty",
        "Difficulty (subtree)",
    ]
    .iter()
    .enumerate()
    {
        html.push_str(&format!("<th onclick=\"sortTable({col})\">{title}</th>"));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for s in learning.tree_order() {
        let row_class = match s.avg_grade {
            Some(g) if g >= 70.0 => "pass",
            Some(g) if g < 50.0 => "fail",
            _ => "",
        };
        let label = if s.name.is_empty() { &s.topic_id } else { &s.name };
        let classify = if s.is_topic_classify { " <em>(to classify)</em>" } else { "" };
        html.push_str(&format!(
            "<tr class=\"{row_class}\"><td style=\"padding-left:{}rem\">{}{classify}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.4}</td><td>{:.2}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
            s.depth,
            html_escape(label),
            s.depth,
            s.qty_questions,
            s.qty_all_questions_depth,
            s.frequency_in_discipline,
            s.frequency_in_depth,
            s.qty_questions_answered,
            s.qty_questions_correct_answered,
            grade_cell(s.avg_grade),
            grade_cell(s.collective_avg_grade),
            s.difficulty,
            s.difficulty_recursive,
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &LearningReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

/// Horizontal bars of each root's share of the discipline's questions.
fn generate_bar_chart(roots: &[&TopicStatistics]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = roots.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, root) in roots.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let share = root.frequency_in_depth / 100.0;
        let width = (share * max_width as f64) as usize;

        let color = if root.difficulty_recursive >= 70.0 {
            "#ef4444"
        } else if root.difficulty_recursive >= 40.0 {
            "#eab308"
        } else {
            "#22c55e"
        };
        let label = if root.name.is_empty() { &root.topic_id } else { &root.name };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            root.frequency_in_depth
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    if (!isNaN(na) && !isNaN(nb)) return asc ? na - nb : nb - na;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
