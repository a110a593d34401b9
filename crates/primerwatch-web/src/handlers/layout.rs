//! Page shell and small HTML helpers shared by every page handler.

use primerwatch_client::BatchFailure;

/// Navigation HTML template shared across all pages
pub const NAV_HTML: &str = include_str!("../../templates/nav.html");

/// Inline banner shown above a page after an action.
#[derive(Debug, Clone)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn render(&self) -> String {
        let (class, text) = match self {
            Notice::Success(t) => ("alert-success", t),
            Notice::Error(t) => ("alert-error", t),
        };
        format!(r#"<div class="alert {}" role="status">{}</div>"#, class, escape(text))
    }
}

pub fn notices_html(notices: &[Notice]) -> String {
    notices.iter().map(Notice::render).collect()
}

/// Escape text for element content and double-quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Per-item failure list under a bulk-action banner.
pub fn failures_html(failures: &[BatchFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let items: String = failures
        .iter()
        .map(|f| format!("<li><strong>{}</strong>: {}</li>", escape(&f.label), escape(&f.message)))
        .collect();
    format!(r#"<ul class="failure-list">{}</ul>"#, items)
}

pub fn page(title: &str, body: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{} — primerwatch</title>
    <link rel="stylesheet" href="/static/css/main.css?v=0.1.0">
</head>
<body>
<div class="app-container">
{}
<main class="main-content">
{}
</main>
</div>
</body>
</html>"#, escape(title), NAV_HTML, body)
}

/// Page without navigation, for the sign-in screen.
pub fn bare_page(title: &str, body: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{} — primerwatch</title>
    <link rel="stylesheet" href="/static/css/main.css?v=0.1.0">
</head>
<body class="bare">
<main class="login-container">
{}
</main>
</body>
</html>"#, escape(title), body)
}

pub fn empty_row(colspan: usize, text: &str) -> String {
    format!(r#"<tr><td colspan="{}" class="text-center text-muted">{}</td></tr>"#, colspan, escape(text))
}
