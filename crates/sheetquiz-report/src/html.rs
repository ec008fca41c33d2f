//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined. The colour
//! scheme follows the saved [`Theme`] rather than the browser preference.

use anyhow::{Context, Result};
use std::path::Path;

use sheetquiz_core::model::Theme;
use sheetquiz_core::report::SessionReport;
use sheetquiz_core::session::format_clock;
use sheetquiz_core::summary::{to_percent, GroupStat, Outcome};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report for a finished session.
pub fn generate_html(report: &SessionReport, theme: Theme) -> String {
    let summary = &report.summary;
    let mut html = String::new();

    html.push_str(&format!(
        "<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"{theme}\">\n<head>\n"
    ));
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>sheetquiz report: {}</title>\n",
        html_escape(&report.source_label)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>sheetquiz report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Source: <strong>{}</strong> | {} questions | {} mode | {}</p>\n",
        html_escape(&report.source_label),
        report.question_count,
        summary.mode,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Score cards
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<div class=\"cards\">\n");
    html.push_str(&card("Accuracy", &format!("{}%", to_percent(summary.accuracy))));
    html.push_str(&card("Correct", &summary.correct.to_string()));
    html.push_str(&card("Incorrect", &summary.incorrect.to_string()));
    html.push_str(&card("Skipped", &summary.skipped.to_string()));
    if let Some(timing) = summary.timing {
        html.push_str(&card("Time", &format_clock(timing.elapsed_seconds)));
    }
    html.push_str("</div>\n");

    html.push_str(&highlight_list("Strengths", "pass", &summary.strengths));
    html.push_str(&highlight_list("Focus areas", "fail", &summary.focus));

    if !summary.by_submodule.is_empty() {
        html.push_str("<h3>By submodule</h3>\n");
        html.push_str(&generate_bar_chart(&summary.by_submodule));
        html.push_str(&group_table(&summary.by_submodule, true));
    }
    if !summary.by_tag.is_empty() {
        html.push_str("<h3>By tag</h3>\n");
        html.push_str(&group_table(&summary.by_tag, false));
    }
    html.push_str("</section>\n");

    // Per-question review
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Review</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">#</th><th onclick=\"sortTable(1)\">Question</th><th onclick=\"sortTable(2)\">Submodule</th><th onclick=\"sortTable(3)\">Your answer</th><th onclick=\"sortTable(4)\">Correct answer</th><th onclick=\"sortTable(5)\">Result</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for (i, q) in summary.questions.iter().enumerate() {
        let (class, text) = match q.outcome() {
            Outcome::Correct => ("pass", "Correct"),
            Outcome::Incorrect => ("fail", "Incorrect"),
            Outcome::Skipped => ("skip", "Skipped"),
        };
        let mut prompt = html_escape(&q.prompt);
        if let Some(explanation) = &q.explanation {
            prompt.push_str(&format!(
                "<div class=\"explanation\">{}</div>",
                html_escape(explanation)
            ));
        }

        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{}</td></tr>\n",
            class,
            i + 1,
            prompt,
            html_escape(&q.submodule),
            html_escape(q.selected_label.as_deref().unwrap_or("-")),
            html_escape(&q.correct_label),
            class,
            text
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &SessionReport, theme: Theme, path: &Path) -> Result<()> {
    let html = generate_html(report, theme);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn card(label: &str, value: &str) -> String {
    format!("<div class=\"card\"><span class=\"label\">{label}</span><span class=\"value\">{value}</span></div>\n")
}

fn highlight_list(title: &str, class: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut out = format!("<h3>{title}</h3>\n<ul class=\"{class}-list\">\n");
    for item in items {
        out.push_str(&format!("<li>{}</li>\n", html_escape(item)));
    }
    out.push_str("</ul>\n");
    out
}

fn group_table(groups: &[GroupStat], with_module: bool) -> String {
    let mut out = String::from("<table class=\"summary\">\n<thead><tr>");
    if with_module {
        out.push_str("<th>Module</th>");
    }
    out.push_str("<th>Group</th><th>Correct</th><th>Total</th><th>Accuracy</th></tr></thead>\n<tbody>\n");
    for g in groups {
        out.push_str("<tr>");
        if with_module {
            out.push_str(&format!(
                "<td>{}</td>",
                html_escape(g.module.as_deref().unwrap_or("-"))
            ));
        }
        out.push_str(&format!(
            "<td>{}</td><td>{}</td><td>{}</td><td>{}%</td></tr>\n",
            html_escape(&g.label),
            g.correct,
            g.total,
            to_percent(g.accuracy)
        ));
    }
    out.push_str("</tbody></table>\n");
    out
}

fn generate_bar_chart(groups: &[GroupStat]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = groups.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, group) in groups.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (group.accuracy * max_width as f64) as usize;

        let color = if group.accuracy >= 0.75 {
            "#22c55e"
        } else if group.accuracy >= 0.6 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&group.label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            to_percent(group.accuracy)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --muted: #6b7280; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --skip: #f3f4f6; }
[data-theme="dark"] { --bg: #111827; --fg: #f9fafb; --muted: #9ca3af; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --skip: #1f2937; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta, .explanation { color: var(--muted); }
.explanation { font-size: 0.85rem; margin-top: 0.25rem; }
.cards { display: flex; gap: 1rem; flex-wrap: wrap; }
.card { border: 1px solid var(--border); border-radius: 8px; padding: 1rem 1.5rem; display: flex; flex-direction: column; }
.card .label { color: var(--muted); font-size: 0.85rem; }
.card .value { font-size: 1.5rem; font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.skip { background: var(--skip); }
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
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
