use super::types::RunResults;
use crate::runner::status::TestStatus;
use anyhow::Result;
use std::path::Path;

/// Generate HTML report
pub async fn generate(results: &RunResults, output: Option<&Path>) -> Result<()> {
    let html = generate_html(results);

    if let Some(path) = output {
        std::fs::write(path, html)?;
        println!("HTML report saved to: {}", path.display());
    } else {
        println!("{}", html);
    }

    Ok(())
}

/// Write the self-contained HTML report into the run folder.
pub fn write_report(results: &RunResults, run_dir: &Path) -> Result<()> {
    let path = run_dir.join("index.html");
    std::fs::write(&path, generate_html(results))?;
    println!("    Generated HTML report: {}", path.display());
    Ok(())
}

fn generate_html(results: &RunResults) -> String {
    let summary = &results.summary;
    let pass_rate = if summary.total > 0 {
        (summary.passed as f64 / summary.total as f64 * 100.0) as u32
    } else {
        0
    };

    let mut tests_html = String::new();
    for test in &results.tests {
        let (status_text, status_class) = match test.status {
            TestStatus::Passed => ("Passed", "passed"),
            TestStatus::Failed => ("Failed", "failed"),
        };

        let error_html = if test.failure_reason.is_empty() {
            String::new()
        } else {
            format!(
                r##"<div class="error-message">{}</div>"##,
                html_escape(&test.failure_reason)
            )
        };

        let screenshot_html = match &test.screenshot {
            Some(file) => format!(
                r##"<a class="screenshot-link" href="{}">📸 View screenshot</a>"##,
                html_escape(file)
            ),
            None => String::new(),
        };

        let data_html = if test.test_data.is_null() {
            String::new()
        } else {
            format!(
                r#"
                <details class="data-details">
                    <summary>Test data</summary>
                    <pre>{}</pre>
                </details>
            "#,
                html_escape(
                    &serde_json::to_string_pretty(&test.test_data).unwrap_or_default()
                )
            )
        };

        tests_html.push_str(&format!(
            r#"
            <div class="test {status_class}">
                <div class="test-header">
                    <h3>{} <span class="test-status-badge">{status_text}</span></h3>
                    <span class="duration">{}</span>
                </div>
                <div class="test-body">
                    <div class="test-meta">
                        <span>Last step: <strong>{}</strong></span>
                        <span>Browser: {}</span>
                        <span>Started: {}</span>
                        {screenshot_html}
                    </div>
                    {error_html}
                    {data_html}
                </div>
            </div>
        "#,
            html_escape(&test.name),
            format_duration(test.duration_ms),
            html_escape(&test.last_step),
            html_escape(&test.browser),
            html_escape(&test.started_at),
            status_text = status_text,
            status_class = status_class,
            screenshot_html = screenshot_html,
            error_html = error_html,
            data_html = data_html
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Booking Report - {}</title>
    <link rel="preconnect" href="https://fonts.googleapis.com">
    <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>
    <link href="https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700;800&family=JetBrains+Mono:wght@400;500&display=swap" rel="stylesheet">
    <style>
        :root {{
            --bg-primary: #0a0f1d;
            --bg-secondary: #141b2d;
            --bg-tertiary: #1f2937;
            --border: #374151;
            --text-primary: #f9fafb;
            --text-secondary: #9ca3af;
            --green: #10b981;
            --red: #ef4444;
            --yellow: #f59e0b;
            --blue: #3b82f6;
            --purple: #8b5cf6;
            --glass: rgba(255, 255, 255, 0.03);
        }}

        * {{
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }}

        body {{
            font-family: 'Inter', system-ui, -apple-system, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.5;
            padding: 3rem 1rem;
        }}

        .container {{
            max-width: 1100px;
            margin: 0 auto;
        }}

        header {{
            margin-bottom: 3rem;
            display: flex;
            justify-content: space-between;
            align-items: flex-end;
        }}

        h1 {{
            font-size: 2.25rem;
            font-weight: 800;
            letter-spacing: -0.025em;
            background: linear-gradient(135deg, #fff 0%, #94a3b8 100%);
            -webkit-background-clip: text;
            -webkit-text-fill-color: transparent;
        }}

        .summary {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 1.5rem;
            margin-bottom: 3rem;
        }}

        .stat {{
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            padding: 1.5rem;
            border-radius: 1rem;
            position: relative;
            overflow: hidden;
            transition: transform 0.2s;
        }}

        .stat:hover {{
            transform: translateY(-2px);
        }}

        .stat-value {{
            font-size: 2.5rem;
            font-weight: 800;
            margin-bottom: 0.25rem;
        }}

        .stat-label {{
            color: var(--text-secondary);
            font-size: 0.875rem;
            font-weight: 500;
            text-transform: uppercase;
            letter-spacing: 0.05em;
        }}

        .stat.passed .stat-value {{ color: var(--green); }}
        .stat.failed .stat-value {{ color: var(--red); }}

        .progress-container {{
            margin-bottom: 4rem;
        }}

        .progress-bar {{
            background: var(--bg-secondary);
            height: 12px;
            border-radius: 6px;
            overflow: hidden;
            display: flex;
            border: 1px solid var(--border);
        }}

        .progress-fill {{
            height: 100%;
            background: linear-gradient(90deg, var(--green), #34d399);
            transition: width 0.8s cubic-bezier(0.16, 1, 0.3, 1);
        }}

        .test {{
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 1.25rem;
            margin-bottom: 2rem;
            overflow: hidden;
            box-shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1);
        }}

        .test-header {{
            padding: 1.5rem;
            background: var(--glass);
            display: flex;
            justify-content: space-between;
            align-items: center;
            border-bottom: 1px solid var(--border);
        }}

        .test-header h3 {{
            font-size: 1.25rem;
            font-weight: 700;
            display: flex;
            align-items: center;
            gap: 0.75rem;
        }}

        .test-status-badge {{
            padding: 0.25rem 0.75rem;
            border-radius: 9999px;
            font-size: 0.75rem;
            font-weight: 600;
            text-transform: uppercase;
        }}

        .test.passed .test-status-badge {{ background: rgba(16, 185, 129, 0.1); color: var(--green); }}
        .test.failed .test-status-badge {{ background: rgba(239, 68, 68, 0.1); color: var(--red); }}

        .test-body {{
            padding: 1rem 1.5rem 1.5rem 1.5rem;
        }}

        .test-meta {{
            display: flex;
            gap: 2rem;
            color: var(--text-secondary);
            font-size: 0.875rem;
        }}

        .duration {{
            color: var(--text-secondary);
            font-size: 0.875rem;
            font-weight: 500;
        }}

        .screenshot-link {{
            color: var(--blue);
            font-size: 0.875rem;
            font-weight: 600;
            text-decoration: none;
        }}

        .screenshot-link:hover {{
            text-decoration: underline;
        }}

        .error-message {{
            background: rgba(239, 68, 68, 0.1);
            border-radius: 0.5rem;
            padding: 0.75rem;
            margin-top: 0.75rem;
            color: #fca5a5;
            font-size: 0.8125rem;
            font-family: 'JetBrains Mono', monospace;
            border: 1px solid rgba(239, 68, 68, 0.2);
        }}

        .data-details {{
            margin-top: 1rem;
            padding: 1rem;
            background: rgba(0, 0, 0, 0.2);
            border-radius: 0.75rem;
            border: 1px solid var(--border);
        }}

        .data-details summary {{
            cursor: pointer;
            font-weight: 600;
            color: var(--blue);
            outline: none;
            user-select: none;
            list-style: none;
        }}

        .data-details summary::-webkit-details-marker {{
            display: none;
        }}

        .data-details pre {{
            margin-top: 1rem;
            font-family: 'JetBrains Mono', monospace;
            font-size: 0.8125rem;
            color: var(--text-secondary);
            overflow-x: auto;
        }}

        .meta {{
            margin-top: 4rem;
            padding-top: 2rem;
            border-top: 1px solid var(--border);
            color: var(--text-secondary);
            font-size: 0.875rem;
            text-align: center;
            display: flex;
            justify-content: center;
            gap: 2rem;
        }}
    </style>
</head>
<body>
    <div class="container">
        <header>
            <div>
                <div style="font-size: 0.875rem; font-weight: 600; color: var(--purple); text-transform: uppercase; letter-spacing: 0.1em; margin-bottom: 0.5rem;">Hotel Booking Suite</div>
                <h1>Booking Run Report</h1>
            </div>
            <div style="text-align: right;">
                <div style="font-size: 0.875rem; color: var(--text-secondary);">Run Duration</div>
                <div style="font-size: 1.25rem; font-weight: 700;">{}</div>
            </div>
        </header>

        <div class="summary">
            <div class="stat">
                <div class="stat-value">{}</div>
                <div class="stat-label">Total Tests</div>
            </div>
            <div class="stat">
                <div class="stat-value">{}</div>
                <div class="stat-label">Environment</div>
            </div>
            <div class="stat passed">
                <div class="stat-value">{}</div>
                <div class="stat-label">Passed</div>
            </div>
            <div class="stat failed">
                <div class="stat-value">{}</div>
                <div class="stat-label">Failed</div>
            </div>
        </div>

        <div class="progress-container">
            <div style="display: flex; justify-content: space-between; margin-bottom: 0.75rem;">
                <span style="font-weight: 600; font-size: 0.875rem;">Success Rate</span>
                <span style="font-weight: 700; color: var(--green);">{pass_rate}%</span>
            </div>
            <div class="progress-bar">
                <div class="progress-fill" style="width: {pass_rate}%"></div>
            </div>
        </div>

        {tests_html}

        <div class="meta">
            <span>Session: {}</span>
            <span>Platform: {}</span>
            <span>Generated: {}</span>
        </div>
    </div>
</body>
</html>"#,
        results.session_id,
        format_duration(summary.total_duration_ms),
        summary.total,
        html_escape(&results.environment),
        summary.passed,
        summary.failed,
        results.session_id,
        html_escape(&results.platform),
        results.generated_at
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60000;
        let seconds = (ms % 60000) as f64 / 1000.0;
        format!("{}m {:.0}s", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::status::{TestStatus, TestSummary};

    #[test]
    fn failure_reason_is_escaped_into_the_page() {
        let results = RunResults::from_tests(
            "s",
            "staging",
            "local",
            vec![TestSummary {
                name: "Book a hotel in Lisbon".to_string(),
                status: TestStatus::Failed,
                failure_reason: "Failed at step 'Search hotels': <timeout>".to_string(),
                last_step: "Search hotels".to_string(),
                duration_ms: 2000,
                environment: "staging".to_string(),
                browser: "chromium".to_string(),
                test_data: serde_json::Value::Null,
                screenshot: Some("book-a-hotel-in-lisbon-failure.png".to_string()),
                started_at: "2026-08-27T10:30:00+02:00".to_string(),
                finished_at: "2026-08-27T10:30:02+02:00".to_string(),
            }],
        );

        let html = generate_html(&results);
        assert!(html.contains("&lt;timeout&gt;"));
        assert!(html.contains("Book a hotel in Lisbon"));
        assert!(html.contains("book-a-hotel-in-lisbon-failure.png"));
        assert!(html.contains("0%"));
    }
}
