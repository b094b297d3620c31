use std::fs;
use std::path::Path;
use axum::response::Html;
use serde::Deserialize;
use crate::errors::{AppError, AppResult};
use crate::models::{PredictionTable, COLUMN_NAMES};

/// Inline message carried across redirects as `?error=` or `?success=`.
#[derive(Debug, Default, Deserialize)]
pub struct Notice {
    pub error: Option<String>,
    pub success: Option<String>,
}

pub enum UploadOutcome<'a> {
    Idle,
    Warning(&'a str),
    Failed(String),
    Results(&'a PredictionTable),
}

fn load_template(dir: &Path, name: &str) -> AppResult<String> {
    fs::read_to_string(dir.join(name)).map_err(|e| {
        tracing::error!("Failed to read template {}: {}", name, e);
        AppError::File(e)
    })
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn notice_html(class: &str, message: &str) -> String {
    format!(r#"<div class="notice {}">{}</div>"#, class, escape_html(message))
}

fn render_notice(notice: &Notice) -> String {
    let mut html = String::new();
    if let Some(message) = &notice.error {
        html.push_str(&notice_html("error", message));
    }
    if let Some(message) = &notice.success {
        html.push_str(&notice_html("success", message));
    }
    html
}

pub fn render_login(dir: &Path, notice: &Notice) -> AppResult<Html<String>> {
    let template = load_template(dir, "login.html")?;
    Ok(Html(template.replace("{{notice}}", &render_notice(notice))))
}

pub fn render_signup(dir: &Path, notice: &Notice) -> AppResult<Html<String>> {
    let template = load_template(dir, "signup.html")?;
    Ok(Html(template.replace("{{notice}}", &render_notice(notice))))
}

pub fn render_upload(dir: &Path, notice: &Notice, outcome: UploadOutcome<'_>) -> AppResult<Html<String>> {
    let template = load_template(dir, "upload.html")?;

    let (status, results) = match outcome {
        UploadOutcome::Idle => (String::new(), String::new()),
        UploadOutcome::Warning(message) => (notice_html("warning", message), String::new()),
        UploadOutcome::Failed(message) => (notice_html("error", &message), String::new()),
        UploadOutcome::Results(table) => (String::new(), render_results(table)?),
    };

    Ok(Html(
        template
            .replace("{{notice}}", &format!("{}{}", render_notice(notice), status))
            .replace("{{results}}", &results),
    ))
}

// Results table plus a data: link so the CSV never has to be stored server side
fn render_results(table: &PredictionTable) -> AppResult<String> {
    let header = COLUMN_NAMES
        .iter()
        .map(|name| format!("<th>{}</th>", name))
        .collect::<String>();

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let cells = row
                .values()
                .iter()
                .map(|value| format!("<td>{}</td>", value))
                .collect::<String>();
            format!("<tr>{}</tr>", cells)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let csv = table.to_csv()?;
    let href = format!(
        "data:text/csv;charset=utf-8,{}",
        urlencoding::encode_binary(&csv)
    );

    Ok(format!(
        r#"<h2>Predictions</h2>
<table class="predictions">
<thead><tr>{}</tr></thead>
<tbody>
{}
</tbody>
</table>
<a class="download" href="{}" download="predictions.csv">Download Predictions as CSV</a>"#,
        header, rows, href
    ))
}
