//! Controller-owned state and the closed set of UI intents that mutate it.

use crate::layout::{CardId, LayoutEngine, DEFAULT_CANVAS_WIDTH};
use crate::mention::MentionSession;
use crate::navigation::NavigationState;
use providers::analysis::AnalysisFile;
use services::tracker::{TaskBoard, TrackerMember};
use shared::discussion::{AttachmentRef, DiscussionMessage};
use shared::host::CanvasSelection;
use shared::notes::{Note, NoteSet};
use shared::outcome::DeliveryOutcome;
use shared::team::TeamMember;
use std::time::Instant;
use uuid::Uuid;

/// Every screen the add-on can show. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    StickyNotes,
    Input,
    Result,
    Team,
    Tasks,
    Discussion,
}

impl View {
    pub fn all() -> &'static [View] {
        &[
            View::Home,
            View::StickyNotes,
            View::Input,
            View::Result,
            View::Team,
            View::Tasks,
            View::Discussion,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Home => "home",
            View::StickyNotes => "sticky-notes",
            View::Input => "input",
            View::Result => "result",
            View::Team => "team",
            View::Tasks => "tasks",
            View::Discussion => "discussion",
        }
    }

    pub fn from_name(name: &str) -> Option<View> {
        View::all().iter().copied().find(|v| v.as_str() == name)
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the UI layer is allowed to ask for. The controller applies
/// these one at a time on the main thread; anything slow is handed to a
/// background worker and drained later.
#[derive(Debug, Clone)]
pub enum UiIntent {
    NavigateTo {
        target: View,
        replace_history: bool,
        entry_source: Option<View>,
    },
    GoBack,

    // Note creation.
    BeginDraft { title: String },
    SubmitDraft { text: String, files: Vec<AnalysisFile> },
    DiscardDraft,
    OpenSavedNotes,
    OpenNoteSet { id: Uuid },

    // Team roster.
    OpenTeam,
    OpenMemberForm,
    CloseMemberForm,
    SubmitMemberForm {
        name: String,
        email: String,
        role: String,
        is_lead: bool,
    },
    SetLead { id: Uuid },
    RequestRemoveMember { id: Uuid },
    ConfirmRemoveMember,
    CancelRemoveMember,

    // Tasks board.
    OpenTasks,
    RefreshTasks,

    // Discussion composer.
    OpenDiscussion,
    ComposerInput {
        text: String,
        cursor: usize,
        inserted: Option<String>,
    },
    MentionMove { down: bool },
    MentionCancel,
    CompleteMention { index: usize },
    /// Affirmative key: completes an open mention session, otherwise sends.
    SubmitComposer,
    SendMessage,
    AttachSelection,
    DismissSelection,
    JumpToTag { tag: String },

    // Sticky-note canvas.
    CardPress { id: CardId, x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerRelease { x: f32, y: f32 },
    CollapseCard { id: CardId },
    CanvasResized { width: f32 },
}

/// Where the note-analysis request currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisStatus {
    Idle,
    Running,
    Failed(String),
}

/// Pending note between the name step and the content step.
#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub title: String,
}

/// Composer-side canvas attachment state.
#[derive(Debug, Clone, Default)]
pub struct ComposerState {
    pub input: String,
    pub cursor: usize,
    /// At most one attachment rides along with a message.
    pub pending_attachment: Option<AttachmentRef>,
    /// Selection snapshot from the last watcher tick.
    pub selection: Option<CanvasSelection>,
    /// Node the user dismissed; suppressed until a different node arrives.
    pub dismissed_node: Option<String>,
    /// Status line under the composer.
    pub host_status: String,
    /// One-shot message for the embedder to surface, then clear.
    pub alert: Option<String>,
}

/// Tasks screen state, including the fetch cache stamp.
#[derive(Debug, Clone, Default)]
pub struct TasksState {
    pub board: TaskBoard,
    pub me: Option<TrackerMember>,
    pub loading: bool,
    pub error: Option<String>,
    pub fetched_at: Option<Instant>,
}

/// The whole application state. Owned by the controller; the UI only ever
/// reads it.
pub struct AppState {
    pub nav: NavigationState,
    pub draft: Option<NoteDraft>,
    pub analysis: AnalysisStatus,
    pub board_title: String,
    pub notes: Vec<Note>,
    pub layout: LayoutEngine,
    pub canvas_width: f32,
    /// Card that should receive input focus after a click on editable text.
    pub focused_card: Option<CardId>,
    pub saved_sets: Vec<NoteSet>,
    pub members: Vec<TeamMember>,
    pub member_form_open: bool,
    pub member_form_error: Option<String>,
    pub confirm_remove: Option<Uuid>,
    pub messages: Vec<DiscussionMessage>,
    pub composer: ComposerState,
    pub mention: Option<MentionSession>,
    pub tasks: TasksState,
    /// Every notification outcome observed this session, newest last.
    pub delivery_log: Vec<DeliveryOutcome>,
}

impl AppState {
    pub fn new(boot: View) -> Self {
        Self {
            nav: NavigationState::new(boot),
            draft: None,
            analysis: AnalysisStatus::Idle,
            board_title: String::new(),
            notes: Vec::new(),
            layout: LayoutEngine::new(),
            canvas_width: DEFAULT_CANVAS_WIDTH,
            focused_card: None,
            saved_sets: Vec::new(),
            members: Vec::new(),
            member_form_open: false,
            member_form_error: None,
            confirm_remove: None,
            messages: Vec::new(),
            composer: ComposerState::default(),
            mention: None,
            tasks: TasksState::default(),
            delivery_log: Vec::new(),
        }
    }
}
