//! Message text helpers: attachment-tag stripping, segment projection for
//! rendered bodies, and the two timestamp formats.

use chrono::{DateTime, Utc};
use regex::Regex;
use shared::discussion::{MentionKind, MentionRef};
use std::sync::LazyLock;

static NODE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(NG-\d{3})\]").expect("node tag pattern compiles"));

static EXTRA_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace pattern compiles"));

/// Remove bracketed occurrences of `tag` from composed text so an attached
/// element is not referenced twice, collapsing the whitespace left behind.
pub fn strip_attachment_tag(text: &str, tag: &str) -> String {
    let pattern = format!(r"\s*\[{}\]\s*", regex::escape(tag));
    let stripped = match Regex::new(&pattern) {
        Ok(re) => re.replace_all(text, " "),
        Err(_) => return text.trim().to_string(),
    };
    EXTRA_WHITESPACE
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Piece of a rendered message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSegment {
    Plain(String),
    /// A resolved mention, styled by kind.
    Mention { label: String, kind: MentionKind },
    /// A `[NG-###]` reference that can focus its canvas node.
    NodeTag(String),
}

/// Split a message body into segments: one mention span per occurrence of a
/// resolved label, node-tag links, and plain text between them. Earlier
/// mentions claim their ranges first.
pub fn segment_message(text: &str, mentions: &[MentionRef]) -> Vec<MessageSegment> {
    struct Claim {
        start: usize,
        end: usize,
        segment: MessageSegment,
    }
    let mut claims: Vec<Claim> = Vec::new();

    let mut seen_labels: Vec<&str> = Vec::new();
    for mention in mentions {
        if seen_labels.contains(&mention.label.as_str()) {
            continue;
        }
        seen_labels.push(&mention.label);

        let mut from = 0;
        while let Some(pos) = text[from..].find(mention.label.as_str()) {
            let start = from + pos;
            let end = start + mention.label.len();
            if !claims.iter().any(|c| start < c.end && end > c.start) {
                claims.push(Claim {
                    start,
                    end,
                    segment: MessageSegment::Mention {
                        label: mention.label.clone(),
                        kind: mention.kind,
                    },
                });
            }
            from = end;
        }
    }

    for caps in NODE_TAG.captures_iter(text) {
        let (Some(whole), Some(tag)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let (start, end) = (whole.start(), whole.end());
        if !claims.iter().any(|c| start < c.end && end > c.start) {
            claims.push(Claim {
                start,
                end,
                segment: MessageSegment::NodeTag(tag.as_str().to_string()),
            });
        }
    }

    claims.sort_by_key(|c| c.start);

    let mut segments = Vec::new();
    let mut cursor = 0;
    for claim in claims {
        if claim.start > cursor {
            segments.push(MessageSegment::Plain(text[cursor..claim.start].to_string()));
        }
        segments.push(claim.segment);
        cursor = claim.end;
    }
    if cursor < text.len() {
        segments.push(MessageSegment::Plain(text[cursor..].to_string()));
    }
    segments
}

/// Relative age for the tasks board: rounded buckets up to a week, then a
/// date.
pub fn format_relative_time(then: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(then) = then else {
        return "Just now".to_string();
    };
    let delta_ms = now.signed_duration_since(then).num_milliseconds();
    let minutes = (delta_ms as f64 / 60_000.0).round() as i64;
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = (minutes as f64 / 60.0).round() as i64;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = (hours as f64 / 24.0).round() as i64;
    if days < 7 {
        return format!("{}d ago", days);
    }
    then.format("%-m/%-d/%Y").to_string()
}

/// Timestamp next to a message: floored buckets up to a day, then a date.
pub fn format_message_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta_ms = now.signed_duration_since(then).num_milliseconds();
    let minutes = delta_ms.div_euclid(60_000);
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes.div_euclid(60);
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    then.format("%-m/%-d/%Y").to_string()
}

/// Display name for a message author. Locally authored messages show as
/// "You".
pub fn author_display(created_by: &str) -> &str {
    if created_by == "me" {
        "You"
    } else {
        created_by
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_strip_removes_every_tag_occurrence_and_tidies_whitespace() {
        assert_eq!(
            strip_attachment_tag("look at [NG-003] please [NG-003]", "NG-003"),
            "look at please"
        );
        assert_eq!(strip_attachment_tag("[NG-001]", "NG-001"), "");
        assert_eq!(
            strip_attachment_tag("keep [NG-002] here", "NG-001"),
            "keep [NG-002] here"
        );
    }

    #[test]
    fn test_segments_split_mentions_tags_and_plain_text() {
        let mentions = vec![MentionRef {
            id: "1".to_string(),
            label: "@Alice".to_string(),
            kind: MentionKind::Lead,
        }];
        let segments = segment_message("@Alice check [NG-007] today", &mentions);
        assert_eq!(
            segments,
            vec![
                MessageSegment::Mention {
                    label: "@Alice".to_string(),
                    kind: MentionKind::Lead,
                },
                MessageSegment::Plain(" check ".to_string()),
                MessageSegment::NodeTag("NG-007".to_string()),
                MessageSegment::Plain(" today".to_string()),
            ]
        );
    }

    #[test]
    fn test_segments_mark_every_occurrence_of_a_label() {
        let mentions = vec![
            MentionRef {
                id: "1".to_string(),
                label: "@Bob".to_string(),
                kind: MentionKind::User,
            },
            MentionRef {
                id: "1".to_string(),
                label: "@Bob".to_string(),
                kind: MentionKind::User,
            },
        ];
        let segments = segment_message("@Bob and @Bob", &mentions);
        let mention_count = segments
            .iter()
            .filter(|s| matches!(s, MessageSegment::Mention { .. }))
            .count();
        assert_eq!(mention_count, 2);
    }

    #[test]
    fn test_unresolved_text_stays_plain() {
        let segments = segment_message("@Carol wrote NG-001 without brackets", &[]);
        assert_eq!(segments.len(), 1);
        assert!(matches!(segments[0], MessageSegment::Plain(_)));
    }

    #[test]
    fn test_relative_time_rounds_its_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let at = |secs: i64| Some(now - chrono::Duration::seconds(secs));

        assert_eq!(format_relative_time(None, now), "Just now");
        assert_eq!(format_relative_time(at(20), now), "Just now");
        assert_eq!(format_relative_time(at(90), now), "2m ago");
        assert_eq!(format_relative_time(at(30 * 60), now), "30m ago");
        assert_eq!(format_relative_time(at(90 * 60), now), "2h ago");
        assert_eq!(format_relative_time(at(3 * 24 * 3600), now), "3d ago");
        assert_eq!(format_relative_time(at(10 * 24 * 3600), now), "2/29/2024");
    }

    #[test]
    fn test_message_time_floors_its_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let at = |secs: i64| now - chrono::Duration::seconds(secs);

        assert_eq!(format_message_time(at(30), now), "Just now");
        assert_eq!(format_message_time(at(90), now), "1m ago");
        assert_eq!(format_message_time(at(59 * 60 + 59), now), "59m ago");
        assert_eq!(format_message_time(at(23 * 3600 + 3599), now), "23h ago");
        assert_eq!(format_message_time(at(25 * 3600), now), "3/9/2024");
    }

    #[test]
    fn test_author_display_masks_the_local_author() {
        assert_eq!(author_display("me"), "You");
        assert_eq!(author_display("Alice"), "Alice");
    }
}
