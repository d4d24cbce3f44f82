//! Server-side HTML for the log browser.

use std::fmt::Write;

use crate::recorder::{PageEntry, RecordPage, TransactionRecord};

const STYLE: &str = r#"
body {
    font-family: -apple-system, "Segoe UI", Roboto, sans-serif;
    background: #0f172a; color: #e2e8f0; margin: 0; padding: 20px;
}
.container { max-width: 1200px; margin: 0 auto; }
.pagination {
    margin: 20px 0; display: flex; gap: 10px;
    justify-content: center; align-items: center;
}
.btn {
    background: #1e293b; border: 1px solid #334155; color: #e2e8f0;
    padding: 8px 16px; text-decoration: none; border-radius: 4px;
}
.btn.disabled { opacity: 0.5; pointer-events: none; }
.log-entry {
    background: #1e293b; border-radius: 8px; margin-bottom: 12px;
    border: 1px solid #334155; overflow: hidden;
}
.log-header {
    padding: 12px 16px; display: grid; gap: 15px; cursor: pointer;
    grid-template-columns: 260px 80px 1fr 80px 100px;
}
.url { white-space: nowrap; overflow: hidden; text-overflow: ellipsis; font-family: monospace; }
.ok { color: #22c55e; } .err { color: #ef4444; }
.empty { text-align: center; padding: 40px; color: #64748b; }
pre {
    margin: 0; padding: 20px; background: #0b1120; overflow-x: auto;
    font-size: 13px; white-space: pre-wrap; word-break: break-all;
}
"#;

/// Minimal HTML text escaping.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn pagination(out: &mut String, page: &RecordPage) {
    out.push_str("<div class=\"pagination\">");
    if page.page > 1 {
        let _ = write!(
            out,
            "<a class=\"btn\" href=\"/?page={}\">&larr; Previous</a>",
            page.page - 1
        );
    } else {
        out.push_str("<span class=\"btn disabled\">&larr; Previous</span>");
    }
    let _ = write!(out, "<span>Page {} of {}</span>", page.page, page.total_pages.max(1));
    if page.page < page.total_pages {
        let _ = write!(
            out,
            "<a class=\"btn\" href=\"/?page={}\">Next &rarr;</a>",
            page.page + 1
        );
    } else {
        out.push_str("<span class=\"btn disabled\">Next &rarr;</span>");
    }
    out.push_str("</div>");
}

/// Render the record's bodies as parsed JSON when they hold JSON.
fn display_json(record: &TransactionRecord) -> String {
    let mut value = match serde_json::to_value(record) {
        Ok(value) => value,
        Err(e) => return e.to_string(),
    };
    for side in ["request", "response"] {
        if let Some(body) = value.get_mut(side).and_then(|s| s.get_mut("body")) {
            let parsed = body
                .as_str()
                .and_then(|text| serde_json::from_str::<serde_json::Value>(text).ok())
                .filter(|v| v.is_object() || v.is_array());
            if let Some(parsed) = parsed {
                *body = parsed;
            }
        }
    }
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

fn entry(out: &mut String, entry: &PageEntry) {
    match entry {
        PageEntry::Record { record, .. } => {
            let status = record.response.status_code;
            let class = if (200..300).contains(&status) { "ok" } else { "err" };
            let _ = write!(
                out,
                "<div class=\"log-entry\"><details><summary class=\"log-header\">\
                 <span>{}</span><span>{}</span>\
                 <span class=\"url\" title=\"{url}\">{url}</span>\
                 <span class=\"{}\">{}</span><span>{:.0}ms</span></summary>\
                 <pre>{}</pre></details></div>",
                escape(&record.timestamp.to_rfc3339()),
                escape(&record.request.method),
                class,
                status,
                record.duration_ms,
                escape(&display_json(record)),
                url = escape(&record.request.url),
            );
        }
        PageEntry::Unreadable { key, error } => {
            let _ = write!(
                out,
                "<div class=\"log-entry\"><details><summary class=\"log-header\">\
                 <span>ERROR</span><span>ERR</span><span class=\"url\">{}</span>\
                 <span class=\"err\">0</span><span>0ms</span></summary>\
                 <pre>{}</pre></details></div>",
                escape(&key.display().to_string()),
                escape(error),
            );
        }
    }
}

/// Render a full page.
pub fn render_page(page: &RecordPage) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"UTF-8\">\
         <title>Proxy Logs</title><style>{}</style></head><body><div class=\"container\">\
         <h1>Proxy Logs</h1>",
        STYLE
    );
    pagination(&mut out, page);
    for e in &page.entries {
        entry(&mut out, e);
    }
    if page.entries.is_empty() {
        out.push_str("<div class=\"empty\">No logs found.</div>");
    }
    pagination(&mut out, page);
    out.push_str("</div></body></html>");
    out
}
