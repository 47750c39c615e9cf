// Pre-flight notification banner, written to stderr before command output.

use chrono::{DateTime, Utc};
use gdoc_core::ChangeReport;

/// Render the banner for a pre-flight report.
pub fn render(report: &ChangeReport, now: DateTime<Utc>) -> String {
    if report.is_first_interaction {
        return render_first_interaction(report);
    }
    if !report.has_changes() {
        return "--- no changes ---\n".to_string();
    }

    let mut out = match report.previous_seen.map(|seen| time_ago(seen, now)) {
        Some(ago) => format!("--- since last interaction ({ago}) ---\n"),
        None => "--- since last interaction ---\n".to_string(),
    };

    if report.doc_edited {
        let editor = report.editor.as_deref().unwrap_or("unknown");
        let versions = match (report.version_from, report.version_to) {
            (Some(from), Some(to)) => format!(" (v{from} \u{2192} v{to})"),
            _ => String::new(),
        };
        out.push_str(&format!(" \u{270e} doc edited by {editor}{versions}\n"));
    }
    for item in &report.new_comments {
        out.push_str(&format!(
            " \u{1f4ac} new comment #{} by {}: \"{}\"\n",
            item.comment_id, item.author, item.snippet
        ));
    }
    for item in &report.new_replies {
        out.push_str(&format!(
            " \u{21a9} new reply on #{} by {}: \"{}\"\n",
            item.comment_id, item.author, item.snippet
        ));
    }
    for item in &report.resolved_comments {
        out.push_str(&format!(" \u{2713} comment #{} resolved by {}\n", item.comment_id, item.author));
    }
    for item in &report.reopened_comments {
        out.push_str(&format!(" \u{21ba} comment #{} reopened by {}\n", item.comment_id, item.author));
    }
    out.push_str("---\n");
    out
}

fn render_first_interaction(report: &ChangeReport) -> String {
    let mut out = String::from("--- first interaction with this doc ---\n");
    let modified = report
        .doc_modified
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    out.push_str(&format!(
        " \u{1f4c4} \"{}\" by {}, last edited {modified}\n",
        report.doc_title.as_deref().unwrap_or(""),
        report.doc_owner.as_deref().unwrap_or("unknown"),
    ));

    let mut parts = Vec::new();
    if report.open_comment_count > 0 {
        let plural = if report.open_comment_count == 1 { "" } else { "s" };
        parts.push(format!("{} open comment{plural}", report.open_comment_count));
    }
    if report.resolved_comment_count > 0 {
        parts.push(format!("{} resolved", report.resolved_comment_count));
    }
    if !parts.is_empty() {
        out.push_str(&format!(" \u{1f4ac} {}\n", parts.join(", ")));
    }
    out.push_str("---\n");
    out
}

/// Coarse "N unit ago" label.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    if seconds < 60 {
        return format!("{seconds} sec ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes} min ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours} hr ago");
    }
    match hours / 24 {
        1 => "1 day ago".to_string(),
        days => format!("{days} days ago"),
    }
}
