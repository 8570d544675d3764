//! Pure projections of controller state into view models. Nothing here
//! mutates state or performs I/O; embedders call these to paint each screen.

use crate::layout::LayoutEngine;
use crate::mention;
use crate::messages::{self, MessageSegment};
use crate::types::{AnalysisStatus, TasksState};
use chrono::{DateTime, Utc};
use services::tracker::{TrackerCard, TrackerMember, MAX_CARDS_PER_SECTION};
use shared::discussion::{DiscussionMessage, MentionRef};
use shared::notes::{Note, NoteKind, NoteSet};
use shared::team::TeamMember;
use uuid::Uuid;

pub const EMPTY_FEED_NOTICE: &str = "No messages yet. Start a discussion with your team!";
pub const EMPTY_TEAM_NOTICE: &str = "No team members yet.\nClick \"+ Add\" to get started.";
pub const EMPTY_SAVED_NOTICE: &str = "No saved notes yet.";

/// Overlay line that replaces the board while analysis is running or after it
/// failed. `None` means the cards themselves render.
pub fn board_status(analysis: &AnalysisStatus) -> Option<&str> {
    match analysis {
        AnalysisStatus::Idle => None,
        AnalysisStatus::Running => Some("Analyzing with AI…"),
        AnalysisStatus::Failed(message) => Some(message),
    }
}

/// One sticky card with its resolved geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct StickyCardView {
    pub id: usize,
    pub kind: NoteKind,
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub editable: bool,
    pub collapsed: bool,
}

/// Join note content with engine geometry. Card ids index into `notes`.
pub fn board_cards(notes: &[Note], layout: &LayoutEngine) -> Vec<StickyCardView> {
    layout
        .cards()
        .iter()
        .filter_map(|card| {
            let note = notes.get(card.id)?;
            Some(StickyCardView {
                id: card.id,
                kind: card.kind,
                text: note.text.clone(),
                left: card.rect.left,
                top: card.rect.top,
                width: card.rect.width,
                height: card.rect.height,
                editable: card.editable,
                collapsed: card.collapsed,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavedSetView {
    pub id: Uuid,
    pub title: String,
    pub created_label: String,
}

/// Saved list rows, preserving store order (most recent first).
pub fn saved_sets_view(sets: &[NoteSet]) -> Vec<SavedSetView> {
    sets.iter()
        .map(|set| {
            let title = set.title.trim();
            SavedSetView {
                id: set.id,
                title: if title.is_empty() {
                    "Untitled".to_string()
                } else {
                    title.to_string()
                },
                created_label: set.created_at.format("%Y-%m-%d %H:%M").to_string(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberRowView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_lead: bool,
    /// Confirmation prompt for the remove action.
    pub remove_prompt: String,
}

pub fn team_rows(members: &[TeamMember]) -> Vec<MemberRowView> {
    members
        .iter()
        .map(|m| MemberRowView {
            id: m.id,
            name: m.name.clone(),
            email: m.email.clone(),
            is_lead: m.is_lead,
            remove_prompt: format!("Remove {} from the team?", m.name),
        })
        .collect()
}

/// Trim, then cut to `max_chars` with a trailing ellipsis when over.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let safe = text.trim();
    if safe.chars().count() <= max_chars {
        return safe.to_string();
    }
    let mut out: String = safe.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// First letters of the first two name parts, uppercased.
pub fn initials(input: &str) -> String {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.is_empty() {
        return "?".to_string();
    }
    parts
        .iter()
        .take(2)
        .filter_map(|part| part.chars().next())
        .flat_map(|ch| ch.to_uppercase())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvatarView {
    pub initials: String,
    pub display_name: String,
    pub is_self: bool,
    pub avatar_url: Option<String>,
}

fn avatar_view(member: &TrackerMember, current_user: Option<&str>) -> AvatarView {
    let display_name = if !member.full_name.is_empty() {
        member.full_name.clone()
    } else if !member.username.is_empty() {
        member.username.clone()
    } else {
        "Unknown".to_string()
    };
    let letters = if member.initials.is_empty() {
        initials(&display_name)
    } else {
        member.initials.to_uppercase()
    };
    // Bare avatar endpoints need a size suffix to resolve to an image.
    let avatar_url = member.avatar_url.as_ref().map(|url| {
        if url.ends_with(".png") {
            url.clone()
        } else {
            format!("{url}/50.png")
        }
    });
    AvatarView {
        initials: letters,
        display_name,
        is_self: current_user == Some(member.id.as_str()),
        avatar_url,
    }
}

/// One card shaped for the tasks board.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCardView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub updated_label: String,
    pub creator_label: Option<String>,
    /// At most four avatars render; the rest fold into `overflow_label`.
    pub avatars: Vec<AvatarView>,
    pub overflow_label: Option<String>,
    pub unassigned: bool,
}

fn activity_time(card: &TrackerCard) -> Option<DateTime<Utc>> {
    card.date_last_activity
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn task_card_view(
    card: &TrackerCard,
    current_user: Option<&str>,
    now: DateTime<Utc>,
) -> TaskCardView {
    let trimmed = card.name.trim();
    let title = if trimmed.is_empty() {
        "Untitled card".to_string()
    } else {
        trimmed.to_string()
    };
    let description = {
        let text = truncate_text(&card.desc, 160);
        (!text.is_empty()).then_some(text)
    };
    let creator_label = card
        .member_creator
        .as_ref()
        .filter(|m| !m.full_name.is_empty())
        .map(|m| format!("Creator: {}", m.full_name));
    let avatars: Vec<AvatarView> = card
        .members
        .iter()
        .take(4)
        .map(|m| avatar_view(m, current_user))
        .collect();
    let overflow = card.members.len().saturating_sub(4);
    TaskCardView {
        id: card.id.clone(),
        title,
        description,
        updated_label: format!(
            "Updated {}",
            messages::format_relative_time(activity_time(card), now)
        ),
        creator_label,
        avatars,
        overflow_label: (overflow > 0).then(|| format!("+{overflow}")),
        unassigned: card.members.is_empty(),
    }
}

/// Section of the tasks board with its badge and empty-state copy.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSectionView {
    pub heading: &'static str,
    pub badge: &'static str,
    pub empty_notice: &'static str,
    pub cards: Vec<TaskCardView>,
}

pub fn task_sections(tasks: &TasksState, now: DateTime<Utc>) -> Vec<TaskSectionView> {
    let me = tasks.me.as_ref().map(|m| m.id.as_str());
    let project = |cards: &[TrackerCard]| -> Vec<TaskCardView> {
        cards
            .iter()
            .take(MAX_CARDS_PER_SECTION)
            .map(|card| task_card_view(card, me, now))
            .collect()
    };
    vec![
        TaskSectionView {
            heading: "Assigned to Me",
            badge: "To Do",
            empty_notice: "No tasks found — you're all caught up!",
            cards: project(&tasks.board.assigned_to_me),
        },
        TaskSectionView {
            heading: "Assigned by Me (In Progress)",
            badge: "In Progress",
            empty_notice: "No active assignments right now.",
            cards: project(&tasks.board.assigned_by_me_open),
        },
        TaskSectionView {
            heading: "Assigned by Me (Completed)",
            badge: "Done",
            empty_notice: "No completed tasks yet.",
            cards: project(&tasks.board.assigned_by_me_done),
        },
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentButton {
    pub tag: String,
    pub label: String,
}

/// One feed row.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    pub id: String,
    pub author: String,
    pub mine: bool,
    pub time_label: String,
    pub segments: Vec<MessageSegment>,
    /// Focus buttons for attached canvas nodes.
    pub attachments: Vec<AttachmentButton>,
}

pub fn message_view(message: &DiscussionMessage, now: DateTime<Utc>) -> MessageView {
    let attachments = message
        .attachments
        .iter()
        .filter(|att| !att.tag.is_empty())
        .map(|att| {
            let node_type = if att.node_type.is_empty() {
                "Element"
            } else {
                att.node_type.as_str()
            };
            AttachmentButton {
                tag: att.tag.clone(),
                label: format!("[{}] {}", att.tag, node_type),
            }
        })
        .collect();
    MessageView {
        id: message.id.clone(),
        author: messages::author_display(&message.created_by).to_string(),
        mine: message.created_by == "me",
        time_label: messages::format_message_time(message.created_at, now),
        segments: messages::segment_message(&message.text, &message.mentions),
        attachments,
    }
}

/// Segment the live composer text against the current mention catalog so the
/// input overlay styles known labels before send.
pub fn input_preview(text: &str, roster: &[TeamMember]) -> Vec<MessageSegment> {
    let catalog: Vec<MentionRef> = mention::candidates(roster)
        .into_iter()
        .map(|c| MentionRef {
            id: c.id,
            label: c.label,
            kind: c.kind,
        })
        .collect();
    messages::segment_message(text, &catalog)
}
