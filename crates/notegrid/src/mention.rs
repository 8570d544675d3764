//! Mention engine for the discussion composer.
//!
//! While typing, `@` opens a completion session over the roster; the session
//! tracks the trigger offset and narrows on every keystroke. At send time
//! mentions are resolved again from the raw text, so hand-typed `@Name`
//! tokens count exactly like completed ones.

use regex::Regex;
use shared::discussion::{MentionKind, MentionRef};
use shared::team::TeamMember;
use std::sync::LazyLock;

static MENTION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("mention pattern compiles"));

/// One row in the completion dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionCandidate {
    pub id: String,
    pub label: String,
    pub name: String,
    /// Role line shown under the name.
    pub role: String,
    pub kind: MentionKind,
}

impl MentionCandidate {
    fn everyone() -> Self {
        Self {
            id: "everyone".to_string(),
            label: "@Everyone".to_string(),
            name: "Everyone".to_string(),
            role: "Notify all team members".to_string(),
            kind: MentionKind::Everyone,
        }
    }

    fn member(member: &TeamMember) -> Self {
        Self {
            id: member.id.to_string(),
            label: format!("@{}", member.name),
            name: member.name.clone(),
            role: member.role.clone(),
            kind: if member.is_lead {
                MentionKind::Lead
            } else {
                MentionKind::User
            },
        }
    }
}

/// Full candidate list: @Everyone, then the lead, then the remaining
/// members in store order.
pub fn candidates(roster: &[TeamMember]) -> Vec<MentionCandidate> {
    let mut list = vec![MentionCandidate::everyone()];
    if let Some(lead) = roster.iter().find(|m| m.is_lead) {
        list.push(MentionCandidate::member(lead));
    }
    list.extend(
        roster
            .iter()
            .filter(|m| !m.is_lead)
            .map(MentionCandidate::member),
    );
    list
}

/// Candidates whose name or label contains the query, case-insensitively.
pub fn filter_candidates(roster: &[TeamMember], query: &str) -> Vec<MentionCandidate> {
    let list = candidates(roster);
    if query.is_empty() {
        return list;
    }
    let lowered = query.to_lowercase();
    list.into_iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&lowered) || c.label.to_lowercase().contains(&lowered)
        })
        .collect()
}

/// An open completion session. Offsets are byte positions into the
/// composer text.
#[derive(Debug, Clone)]
pub struct MentionSession {
    /// Offset of the `@` trigger.
    pub start: usize,
    pub query: String,
    pub highlighted: usize,
    pub candidates: Vec<MentionCandidate>,
}

/// Advance the session for one input event. A literal `@` insertion opens a
/// session; afterwards the query is the substring between the trigger and
/// the cursor. Whitespace in the query, a cursor at or before the trigger,
/// or an empty candidate list all close it.
pub fn on_input(
    session: Option<MentionSession>,
    roster: &[TeamMember],
    text: &str,
    cursor: usize,
    inserted: Option<&str>,
) -> Option<MentionSession> {
    if inserted == Some("@") && cursor >= 1 {
        return Some(MentionSession {
            start: cursor - 1,
            query: String::new(),
            highlighted: 0,
            candidates: candidates(roster),
        });
    }

    let session = session?;
    if cursor <= session.start {
        return None;
    }
    let query = text.get(session.start + 1..cursor)?;
    if query.contains(' ') || query.contains('\n') {
        return None;
    }
    let filtered = filter_candidates(roster, query);
    if filtered.is_empty() {
        return None;
    }
    Some(MentionSession {
        start: session.start,
        query: query.to_string(),
        highlighted: 0,
        candidates: filtered,
    })
}

/// Replace the trigger substring with the chosen label and a trailing
/// space, appending the attached canvas tag in brackets when one exists.
/// Returns the new text and cursor position.
pub fn complete(
    text: &str,
    cursor: usize,
    session: &MentionSession,
    candidate: &MentionCandidate,
    attached_tag: Option<&str>,
) -> (String, usize) {
    let before = text.get(..session.start).unwrap_or(text);
    let after = text.get(cursor..).unwrap_or("");
    let insertion = match attached_tag {
        Some(tag) => format!("{} [{}] ", candidate.label, tag),
        None => format!("{} ", candidate.label),
    };
    let new_cursor = before.len() + insertion.len();
    (format!("{}{}{}", before, insertion, after), new_cursor)
}

/// Move the highlighted row, clamped to the candidate list.
pub fn move_highlight(session: &mut MentionSession, down: bool) {
    if down {
        let max = session.candidates.len().saturating_sub(1);
        session.highlighted = (session.highlighted + 1).min(max);
    } else {
        session.highlighted = session.highlighted.saturating_sub(1);
    }
}

/// Resolve finalized mentions from raw text. `@everyone` matches
/// case-insensitively; other tokens must equal a roster member's name
/// (case-insensitive). Unknown tokens drop out; repeats are kept in text
/// order.
pub fn resolve_mentions(text: &str, roster: &[TeamMember]) -> Vec<MentionRef> {
    let mut mentions = Vec::new();
    for caps in MENTION_TOKEN.captures_iter(text) {
        let Some(token) = caps.get(1) else { continue };
        let token = token.as_str();
        if token.eq_ignore_ascii_case("everyone") {
            mentions.push(MentionRef::everyone());
            continue;
        }
        let lowered = token.to_lowercase();
        if let Some(member) = roster.iter().find(|m| m.name.to_lowercase() == lowered) {
            mentions.push(MentionRef {
                id: member.id.to_string(),
                label: format!("@{}", member.name),
                kind: if member.is_lead {
                    MentionKind::Lead
                } else {
                    MentionKind::User
                },
            });
        }
    }
    mentions
}
