// Line-numbered rendering of exported text with review comments projected onto
// the lines their anchors point at.
//
// Placement is best effort and never fails: every comment lands either under its
// anchor line or in the trailing unanchored block with a reason.

use std::collections::BTreeMap;

use gdoc_common::types::{author_label, Comment};

const ANNOTATION_PREFIX: &str = "      \t";
const MIN_ANCHOR_CHARS: usize = 4;
const ANCHOR_DISPLAY_CHARS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnanchoredReason {
    /// The comment never had an anchor.
    Missing,
    TooShort,
    /// The quoted text is no longer in the document.
    Deleted,
    Ambiguous,
}

impl UnanchoredReason {
    pub fn note(self) -> Option<&'static str> {
        match self {
            Self::Missing => None,
            Self::TooShort => Some("anchor too short"),
            Self::Deleted => Some("anchor deleted"),
            Self::Ambiguous => Some("anchor ambiguous"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorOutcome {
    /// Zero-based index of the last line the unique match spans.
    Line(usize),
    Unanchored(UnanchoredReason),
}

/// Resolve where `anchor` sits in `text`.
pub fn locate_anchor(text: &str, anchor: Option<&str>) -> AnchorOutcome {
    let Some(anchor) = anchor.filter(|a| !a.is_empty()) else {
        return AnchorOutcome::Unanchored(UnanchoredReason::Missing);
    };
    if anchor.trim().chars().count() < MIN_ANCHOR_CHARS {
        return AnchorOutcome::Unanchored(UnanchoredReason::TooShort);
    }

    let Some(start) = text.find(anchor) else {
        return AnchorOutcome::Unanchored(UnanchoredReason::Deleted);
    };
    // Overlapping occurrences count: resume one character past the first match start.
    let step = anchor.chars().next().map_or(1, char::len_utf8);
    if text[start + step..].contains(anchor) {
        return AnchorOutcome::Unanchored(UnanchoredReason::Ambiguous);
    }

    let last_char_len = anchor.chars().next_back().map_or(0, char::len_utf8);
    let last_char_start = start + anchor.len() - last_char_len;
    let line = text[..last_char_start].matches('\n').count();
    AnchorOutcome::Line(line.min(split_lines(text).len().saturating_sub(1)))
}

/// Render `text` as numbered lines with comments interleaved.
///
/// Resolved comments are dropped unless `show_resolved` is set. Unplaceable
/// comments are listed after an `[UNANCHORED]` marker in input order.
pub fn annotate(text: &str, comments: &[Comment], show_resolved: bool) -> String {
    let lines = split_lines(text);

    let mut anchored: BTreeMap<usize, Vec<&Comment>> = BTreeMap::new();
    let mut unanchored: Vec<(&Comment, UnanchoredReason)> = Vec::new();
    for comment in comments.iter().filter(|c| show_resolved || !c.resolved) {
        match locate_anchor(text, comment.anchor()) {
            AnchorOutcome::Line(line) => anchored.entry(line).or_default().push(comment),
            AnchorOutcome::Unanchored(reason) => unanchored.push((comment, reason)),
        }
    }

    let mut out = String::with_capacity(text.len() * 2);
    for (index, line) in lines.iter().enumerate() {
        out.push_str(&format!("{:>6}\t{line}\n", index + 1));
        for comment in anchored.get(&index).into_iter().flatten() {
            push_anchored_block(&mut out, comment);
        }
    }

    if !unanchored.is_empty() {
        out.push_str(ANNOTATION_PREFIX);
        out.push_str("[UNANCHORED]\n");
        for (comment, reason) in unanchored {
            push_unanchored_block(&mut out, comment, reason);
        }
    }

    out
}

fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if text.ends_with('\n') {
        lines.pop();
    }
    lines
}

fn status_tag(comment: &Comment) -> String {
    format!("[#{} {}]", comment.id, comment.status())
}

fn push_anchored_block(out: &mut String, comment: &Comment) {
    // Keep the header on one line so anchor text never reads as document content.
    let anchor = comment.anchor().unwrap_or_default().replace('\n', " ");
    let display_anchor = if anchor.chars().count() > ANCHOR_DISPLAY_CHARS {
        let mut cut: String = anchor.chars().take(ANCHOR_DISPLAY_CHARS - 3).collect();
        cut.push_str("...");
        cut
    } else {
        anchor
    };
    out.push_str(&format!(
        "{ANNOTATION_PREFIX}  {} {} on \"{display_anchor}\":\n",
        status_tag(comment),
        comment.author_label()
    ));
    out.push_str(&format!("{ANNOTATION_PREFIX}    \"{}\"\n", comment.content));
    push_replies(out, comment);
}

fn push_unanchored_block(out: &mut String, comment: &Comment, reason: UnanchoredReason) {
    let mut tag = status_tag(comment);
    if let Some(note) = reason.note() {
        tag.push_str(&format!(" [{note}]"));
    }
    out.push_str(&format!(
        "{ANNOTATION_PREFIX}  {tag} {}: \"{}\"\n",
        comment.author_label(),
        comment.content
    ));
    push_replies(out, comment);
}

// Action-only replies (bare resolve/reopen) carry no text and are skipped.
fn push_replies(out: &mut String, comment: &Comment) {
    for reply in comment.replies.iter().filter(|r| !r.content.is_empty()) {
        out.push_str(&format!(
            "{ANNOTATION_PREFIX}    > {}: \"{}\"\n",
            author_label(reply.author.as_ref()),
            reply.content
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdoc_common::types::{Author, QuotedFileContent, Reply, ReplyAction};

    fn comment(id: &str, anchor: Option<&str>, content: &str) -> Comment {
        Comment {
            id: id.to_string(),
            author: Some(Author {
                display_name: Some("Alice".into()),
                email_address: Some("alice@co.com".into()),
            }),
            content: content.to_string(),
            quoted_file_content: anchor
                .map(|value| QuotedFileContent { mime_type: None, value: Some(value.to_string()) }),
            ..Comment::default()
        }
    }

    #[test]
    fn locate_single_line_anchor() {
        assert_eq!(locate_anchor("line1\nline2\nline3", Some("line2")), AnchorOutcome::Line(1));
    }

    #[test]
    fn locate_multi_line_anchor_uses_last_line() {
        let text = "alpha\nbeta gamma\ndelta\n";
        assert_eq!(locate_anchor(text, Some("gamma\ndelt")), AnchorOutcome::Line(2));
    }

    #[test]
    fn anchor_ending_in_newline_stays_on_its_line() {
        assert_eq!(
            locate_anchor("one\ntwo lines\nthree", Some("two lines\n")),
            AnchorOutcome::Line(1)
        );
    }

    #[test]
    fn short_anchor_is_too_short_even_if_unique() {
        assert_eq!(
            locate_anchor("ab cd", Some("ab")),
            AnchorOutcome::Unanchored(UnanchoredReason::TooShort)
        );
        assert_eq!(
            locate_anchor("x   ab   y", Some("  ab  ")),
            AnchorOutcome::Unanchored(UnanchoredReason::TooShort)
        );
    }

    #[test]
    fn missing_deleted_and_ambiguous() {
        assert_eq!(
            locate_anchor("text", None),
            AnchorOutcome::Unanchored(UnanchoredReason::Missing)
        );
        assert_eq!(
            locate_anchor("text", Some("")),
            AnchorOutcome::Unanchored(UnanchoredReason::Missing)
        );
        assert_eq!(
            locate_anchor("hello world", Some("gone away")),
            AnchorOutcome::Unanchored(UnanchoredReason::Deleted)
        );
        assert_eq!(
            locate_anchor("same text\nsame text", Some("same text")),
            AnchorOutcome::Unanchored(UnanchoredReason::Ambiguous)
        );
    }

    #[test]
    fn overlapping_matches_are_ambiguous() {
        assert_eq!(
            locate_anchor("aaaaa", Some("aaaa")),
            AnchorOutcome::Unanchored(UnanchoredReason::Ambiguous)
        );
    }

    #[test]
    fn case_sensitive_match() {
        assert_eq!(
            locate_anchor("Hello World", Some("hello world")),
            AnchorOutcome::Unanchored(UnanchoredReason::Deleted)
        );
    }

    #[test]
    fn annotation_follows_anchor_line() {
        let rendered = annotate("line1\nline2\nline3", &[comment("c1", Some("line2"), "fix")], false);
        let expected = concat!(
            "     1\tline1\n",
            "     2\tline2\n",
            "      \t  [#c1 open] alice@co.com on \"line2\":\n",
            "      \t    \"fix\"\n",
            "     3\tline3\n",
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn unanchored_block_keeps_every_comment_in_order() {
        let comments = vec![
            comment("amb", Some("same text"), "which one?"),
            comment("ok", Some("unique line"), "fine"),
            comment("none", None, "general remark"),
            comment("short", Some("ab"), "tiny"),
        ];
        let rendered = annotate("same text\nunique line\nsame text\n", &comments, false);
        let expected = concat!(
            "     1\tsame text\n",
            "     2\tunique line\n",
            "      \t  [#ok open] alice@co.com on \"unique line\":\n",
            "      \t    \"fine\"\n",
            "     3\tsame text\n",
            "      \t[UNANCHORED]\n",
            "      \t  [#amb open] [anchor ambiguous] alice@co.com: \"which one?\"\n",
            "      \t  [#none open] alice@co.com: \"general remark\"\n",
            "      \t  [#short open] [anchor too short] alice@co.com: \"tiny\"\n",
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn replies_render_and_action_only_replies_are_skipped() {
        let mut c = comment("c1", Some("target line"), "question");
        c.replies = vec![
            Reply {
                author: Some(Author { display_name: Some("Bob".into()), email_address: None }),
                content: "answer".into(),
                ..Reply::default()
            },
            Reply { action: Some(ReplyAction::Resolve), ..Reply::default() },
        ];
        let rendered = annotate("target line", &[c], true);
        assert!(rendered.ends_with("      \t    > Bob: \"answer\"\n"));
        assert_eq!(rendered.matches("> ").count(), 1);
    }

    #[test]
    fn resolved_comments_hidden_unless_requested() {
        let mut c = comment("r1", Some("some line"), "done");
        c.resolved = true;
        let hidden = annotate("some line", std::slice::from_ref(&c), false);
        assert!(!hidden.contains("#r1"));
        let shown = annotate("some line", &[c], true);
        assert!(shown.contains("[#r1 resolved]"));
    }

    #[test]
    fn long_anchor_is_truncated_in_header() {
        let anchor = "a fairly long anchor sentence that keeps going on";
        let rendered = annotate(anchor, &[comment("c1", Some(anchor), "x")], false);
        assert!(rendered.contains("on \"a fairly long anchor sentence that ke...\":"));
    }

    #[test]
    fn multi_line_anchor_header_stays_on_one_line() {
        let text = "aaaa\nbbbb\ncccc\n";
        let rendered = annotate(text, &[comment("c1", Some("aaaa\nbbbb"), "spans two")], false);
        let expected = concat!(
            "     1\taaaa\n",
            "     2\tbbbb\n",
            "      \t  [#c1 open] alice@co.com on \"aaaa bbbb\":\n",
            "      \t    \"spans two\"\n",
            "     3\tcccc\n",
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn output_ends_with_newline_and_drops_trailing_empty_line() {
        assert_eq!(annotate("a\nb\n", &[], false), "     1\ta\n     2\tb\n");
        assert_eq!(annotate("", &[], false), "     1\t\n");
    }
}
