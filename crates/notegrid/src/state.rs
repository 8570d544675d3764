//! The application controller. One instance owns [`AppState`], and every
//! interaction arrives as a [`UiIntent`] applied on the caller's thread.
//! Anything slow runs on a worker thread that reports back over a channel
//! drained by [`Controller::poll_background`].

use crate::layout::{CardSpec, ReleaseAction, DEFAULT_CARD_HEIGHT};
use crate::mention;
use crate::messages::strip_attachment_tag;
use crate::navigation::NavigateOptions;
use crate::types::{AnalysisStatus, AppState, NoteDraft, UiIntent, View};
use providers::analysis::{AnalysisClient, AnalysisFile};
use services::discussion_log::DiscussionLog;
use services::host::{spawn_selection_watcher, HostEvent, HostFactory};
use services::notes_store::NotesStore;
use services::notify::{self, PlannedDelivery};
use services::roster::Roster;
use services::store::KeyValueStore;
use services::tags::TagAllocator;
use services::tracker::{self, TaskBoard, TrackerClient, TrackerMember, CACHE_TTL};
use shared::discussion::{AttachmentRef, DiscussionMessage};
use shared::host::{CanvasSelection, HostDocument};
use shared::notes::{Note, NoteSet};
use shared::outcome::DeliveryOutcome;
use shared::settings::Settings;
use shared::team::TeamMember;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

struct AnalysisDone {
    title: String,
    result: anyhow::Result<Vec<Note>>,
}

struct TasksDone(anyhow::Result<(TrackerMember, TaskBoard)>);

struct AttachDone(anyhow::Result<AttachmentRef>);

struct FocusDone {
    tag: String,
    found: anyhow::Result<bool>,
}

pub struct Controller {
    pub state: AppState,
    settings: Settings,
    notes_store: NotesStore,
    roster: Roster,
    discussion: DiscussionLog,
    tags: TagAllocator,
    host: Option<Arc<dyn HostDocument>>,
    host_events: Option<Receiver<HostEvent>>,
    analysis_rx: Option<Receiver<AnalysisDone>>,
    tasks_rx: Option<Receiver<TasksDone>>,
    attach_rx: Option<Receiver<AttachDone>>,
    focus_rx: Option<Receiver<FocusDone>>,
    // Sends can overlap, so deliveries ride one long-lived channel.
    delivery_tx: Sender<Vec<DeliveryOutcome>>,
    delivery_rx: Receiver<Vec<DeliveryOutcome>>,
}

impl Controller {
    /// Build a controller over the given store. Persisted slots are read up
    /// front so the first paint reflects disk.
    pub fn new(store: Arc<dyn KeyValueStore>, settings: Settings) -> Self {
        let notes_store = NotesStore::new(store.clone());
        let roster = Roster::new(store.clone());
        let discussion = DiscussionLog::new(store.clone());
        let tags = TagAllocator::new(store);

        let mut state = AppState::new(View::Home);
        state.saved_sets = notes_store.all();
        state.members = roster.members();
        state.messages = discussion.messages();
        state.composer.host_status = "connecting to sandbox…".to_string();

        let (delivery_tx, delivery_rx) = channel();
        Self {
            state,
            settings,
            notes_store,
            roster,
            discussion,
            tags,
            host: None,
            host_events: None,
            analysis_rx: None,
            tasks_rx: None,
            attach_rx: None,
            focus_rx: None,
            delivery_tx,
            delivery_rx,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Start the selection watcher against the host document.
    pub fn connect_host(&mut self, factory: Arc<HostFactory>) {
        self.host_events = Some(spawn_selection_watcher(factory, &self.settings));
    }

    /// One-shot alert for the embedder to surface, then forget.
    pub fn take_alert(&mut self) -> Option<String> {
        self.state.composer.alert.take()
    }

    /// Apply one intent synchronously. Anything slow is spawned and lands
    /// later through [`Controller::poll_background`].
    pub fn apply(&mut self, intent: UiIntent) {
        match intent {
            UiIntent::NavigateTo {
                target,
                replace_history,
                entry_source,
            } => {
                self.navigate(
                    target,
                    NavigateOptions {
                        replace_history,
                        entry_source,
                    },
                );
            }
            UiIntent::GoBack => {
                if self.state.nav.go_back() {
                    self.close_team_overlays();
                }
            }

            UiIntent::BeginDraft { title } => {
                let title = title.trim();
                let title = if title.is_empty() {
                    "Untitled note".to_string()
                } else {
                    title.to_string()
                };
                self.state.board_title = title.clone();
                self.state.draft = Some(NoteDraft { title });
                self.navigate(View::Input, NavigateOptions::default());
            }
            UiIntent::SubmitDraft { text, files } => self.submit_draft(text, files),
            UiIntent::DiscardDraft => {
                self.state.draft = None;
                self.state.analysis = AnalysisStatus::Idle;
                self.state.notes.clear();
                self.place_cards();
                if self.state.nav.go_back() {
                    self.close_team_overlays();
                }
            }
            UiIntent::OpenSavedNotes => {
                self.state.saved_sets = self.notes_store.all();
                self.navigate(View::StickyNotes, NavigateOptions::default());
            }
            UiIntent::OpenNoteSet { id } => {
                if let Some(set) = self.notes_store.open(id) {
                    let title = set.title.trim();
                    self.state.board_title = if title.is_empty() {
                        "Untitled note".to_string()
                    } else {
                        title.to_string()
                    };
                    self.state.notes = set.notes();
                    self.state.analysis = AnalysisStatus::Idle;
                    self.place_cards();
                    self.navigate(
                        View::Result,
                        NavigateOptions {
                            replace_history: false,
                            entry_source: Some(View::StickyNotes),
                        },
                    );
                }
            }

            UiIntent::OpenTeam => {
                self.state.members = self.roster.members();
                self.navigate(View::Team, NavigateOptions::default());
            }
            UiIntent::OpenMemberForm => {
                self.state.member_form_open = true;
                self.state.member_form_error = None;
            }
            UiIntent::CloseMemberForm => {
                self.state.member_form_open = false;
                self.state.member_form_error = None;
            }
            UiIntent::SubmitMemberForm {
                name,
                email,
                role,
                is_lead,
            } => {
                let (name, email, role) = (name.trim(), email.trim(), role.trim());
                if name.is_empty() || email.is_empty() || role.is_empty() {
                    self.state.member_form_error = Some(
                        "Please fill in all required fields (Name, Email, and Role)".to_string(),
                    );
                    return;
                }
                self.state.members = self.roster.add(TeamMember::new(name, email, role, is_lead));
                self.state.member_form_open = false;
                self.state.member_form_error = None;
            }
            UiIntent::SetLead { id } => {
                self.state.members = self.roster.set_lead(id);
            }
            UiIntent::RequestRemoveMember { id } => {
                // The confirm dialog supersedes the member form.
                self.state.member_form_open = false;
                self.state.member_form_error = None;
                self.state.confirm_remove = Some(id);
            }
            UiIntent::ConfirmRemoveMember => {
                if let Some(id) = self.state.confirm_remove.take() {
                    self.state.members = self.roster.remove(id);
                }
            }
            UiIntent::CancelRemoveMember => {
                self.state.confirm_remove = None;
            }

            UiIntent::OpenTasks => {
                self.navigate(View::Tasks, NavigateOptions::default());
                self.load_tasks(false);
            }
            UiIntent::RefreshTasks => self.load_tasks(true),

            UiIntent::OpenDiscussion => {
                self.state.messages = self.discussion.messages();
                self.navigate(View::Discussion, NavigateOptions::default());
            }
            UiIntent::ComposerInput {
                text,
                cursor,
                inserted,
            } => {
                self.state.composer.input = text;
                self.state.composer.cursor = cursor;
                self.state.mention = mention::on_input(
                    self.state.mention.take(),
                    &self.state.members,
                    &self.state.composer.input,
                    cursor,
                    inserted.as_deref(),
                );
            }
            UiIntent::MentionMove { down } => {
                if let Some(session) = &mut self.state.mention {
                    mention::move_highlight(session, down);
                }
            }
            UiIntent::MentionCancel => {
                self.state.mention = None;
            }
            UiIntent::CompleteMention { index } => self.complete_mention(index),
            UiIntent::SubmitComposer => {
                if let Some(session) = &self.state.mention {
                    let index = session.highlighted;
                    self.complete_mention(index);
                } else {
                    self.send_message();
                }
            }
            UiIntent::SendMessage => self.send_message(),
            UiIntent::AttachSelection => self.attach_selection(),
            UiIntent::DismissSelection => {
                if let Some(selection) = self.state.composer.selection.take() {
                    self.state.composer.dismissed_node = Some(selection.node_id);
                }
                self.state.composer.host_status = "selection cleared.".to_string();
            }
            UiIntent::JumpToTag { tag } => self.jump_to_tag(tag),

            UiIntent::CardPress { id, x, y } => {
                self.state.focused_card = None;
                self.state.layout.press(id, x, y);
            }
            UiIntent::PointerMove { x, y } => self.state.layout.pointer_move(x, y),
            UiIntent::PointerRelease { x, y } => {
                if let ReleaseAction::Focus(id) = self.state.layout.release(x, y) {
                    self.state.focused_card = Some(id);
                }
            }
            UiIntent::CollapseCard { id } => self.state.layout.collapse(id),
            UiIntent::CanvasResized { width } => {
                self.state.canvas_width = width;
                self.state.layout.resize(width);
            }
        }
    }

    /// Drain every background channel. Call once per UI tick.
    pub fn poll_background(&mut self) {
        self.poll_host_events();
        self.poll_analysis();
        self.poll_tasks();
        self.poll_attach();
        self.poll_focus();
        self.poll_deliveries();
    }

    fn navigate(&mut self, target: View, options: NavigateOptions) {
        if self.state.nav.navigate_to(target, options) {
            self.close_team_overlays();
        }
    }

    fn close_team_overlays(&mut self) {
        self.state.member_form_open = false;
        self.state.member_form_error = None;
        self.state.confirm_remove = None;
    }

    fn place_cards(&mut self) {
        let specs: Vec<CardSpec> = self
            .state
            .notes
            .iter()
            .map(|note| CardSpec {
                kind: note.kind,
                height: DEFAULT_CARD_HEIGHT,
                editable: true,
            })
            .collect();
        let width = self.state.canvas_width;
        self.state.layout.place(&specs, width);
        self.state.focused_card = None;
    }

    fn submit_draft(&mut self, text: String, files: Vec<AnalysisFile>) {
        let title = match self.state.draft.take() {
            Some(draft) => draft.title,
            None => {
                let fallback = self.state.board_title.trim();
                if fallback.is_empty() {
                    "Untitled note".to_string()
                } else {
                    fallback.to_string()
                }
            }
        };
        self.state.board_title = title.clone();
        self.state.analysis = AnalysisStatus::Running;
        self.navigate(
            View::Result,
            NavigateOptions {
                replace_history: false,
                entry_source: Some(View::Home),
            },
        );

        let (tx, rx) = channel();
        self.analysis_rx = Some(rx);
        let base_url = self.settings.server_base_url.clone();
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = tx.send(AnalysisDone {
                        title,
                        result: Err(e.into()),
                    });
                    return;
                }
            };
            let client = AnalysisClient::new(base_url);
            let result = rt.block_on(client.analyze(&text, &files));
            let _ = tx.send(AnalysisDone { title, result });
        });
    }

    fn poll_analysis(&mut self) {
        if let Some(rx) = &self.analysis_rx {
            if let Ok(done) = rx.try_recv() {
                self.analysis_rx = None;
                match done.result {
                    Ok(notes) => {
                        self.state.analysis = AnalysisStatus::Idle;
                        self.state.notes = notes;
                        self.place_cards();
                        self.notes_store.save(NoteSet::new(done.title, &self.state.notes));
                        self.state.saved_sets = self.notes_store.all();
                    }
                    Err(e) => {
                        tracing::warn!("analysis failed: {}", e);
                        self.state.analysis =
                            AnalysisStatus::Failed("AI failed. Is backend running?".to_string());
                    }
                }
            }
        }
    }

    fn load_tasks(&mut self, force: bool) {
        if self.state.tasks.loading {
            return;
        }
        if !force {
            if let Some(at) = self.state.tasks.fetched_at {
                if at.elapsed() < CACHE_TTL {
                    return;
                }
            }
        }
        self.state.tasks.loading = true;
        self.state.tasks.error = None;

        let (tx, rx) = channel();
        self.tasks_rx = Some(rx);
        let client = TrackerClient::new(self.settings.tracker.clone());
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = tx.send(TasksDone(Err(e.into())));
                    return;
                }
            };
            let result = rt.block_on(async {
                let (me, cards) = futures::future::try_join(
                    client.fetch_current_member(),
                    client.fetch_member_cards(),
                )
                .await?;
                let board = tracker::build_board(&cards, &me.id);
                Ok((me, board))
            });
            let _ = tx.send(TasksDone(result));
        });
    }

    fn poll_tasks(&mut self) {
        if let Some(rx) = &self.tasks_rx {
            if let Ok(done) = rx.try_recv() {
                self.tasks_rx = None;
                self.state.tasks.loading = false;
                match done.0 {
                    Ok((me, board)) => {
                        self.state.tasks.me = Some(me);
                        self.state.tasks.board = board;
                        self.state.tasks.error = None;
                        self.state.tasks.fetched_at = Some(Instant::now());
                    }
                    Err(e) => {
                        tracing::warn!("tasks fetch failed: {}", e);
                        let message = e.to_string();
                        self.state.tasks.error = Some(if message.is_empty() {
                            "Unable to load Trello tasks.".to_string()
                        } else {
                            message
                        });
                        self.state.tasks.board = TaskBoard::default();
                    }
                }
            }
        }
    }

    fn complete_mention(&mut self, index: usize) {
        let Some(session) = self.state.mention.take() else {
            return;
        };
        let Some(candidate) = session.candidates.get(index).or_else(|| session.candidates.first())
        else {
            return;
        };
        // Only a live canvas selection carries its tag into the mention.
        let tag = self
            .state
            .composer
            .selection
            .as_ref()
            .and_then(|sel| sel.tag.as_deref());
        let (text, cursor) = mention::complete(
            &self.state.composer.input,
            self.state.composer.cursor,
            &session,
            candidate,
            tag,
        );
        self.state.composer.input = text;
        self.state.composer.cursor = cursor;
    }

    fn send_message(&mut self) {
        let trimmed = self.state.composer.input.trim().to_string();
        if trimmed.is_empty() && self.state.composer.pending_attachment.is_none() {
            return;
        }
        let attachment = self.state.composer.pending_attachment.take();
        let text = match &attachment {
            Some(att) => strip_attachment_tag(&trimmed, &att.tag),
            None => trimmed,
        };

        let mentions = mention::resolve_mentions(&text, &self.state.members);
        let attachments: Vec<AttachmentRef> = attachment.into_iter().collect();
        let message = DiscussionMessage::compose(text.clone(), mentions.clone(), attachments);
        self.state.messages = self.discussion.append(message);

        let (planned, skipped) = notify::plan_notifications(&mentions, &self.state.members, &text);
        for outcome in &skipped {
            tracing::info!("notification skipped for {}", outcome.member());
        }
        self.state.delivery_log.extend(skipped);
        if !planned.is_empty() {
            self.spawn_dispatch(planned);
        }

        self.state.composer.input.clear();
        self.state.composer.cursor = 0;
        self.state.mention = None;
    }

    fn spawn_dispatch(&mut self, planned: Vec<PlannedDelivery>) {
        let tx = self.delivery_tx.clone();
        let base_url = self.settings.server_base_url.clone();
        let tracker = TrackerClient::new(self.settings.tracker.clone());
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::warn!("notification runtime failed: {}", e);
                    return;
                }
            };
            let outcomes = rt.block_on(notify::dispatch_all(&base_url, &tracker, planned));
            let _ = tx.send(outcomes);
        });
    }

    fn poll_deliveries(&mut self) {
        while let Ok(outcomes) = self.delivery_rx.try_recv() {
            self.state.delivery_log.extend(outcomes);
        }
    }

    fn attach_selection(&mut self) {
        let Some(selection) = self.state.composer.selection.clone() else {
            self.state.composer.alert = Some("Select an element on the canvas first.".to_string());
            return;
        };

        if let Some(tag) = selection.tag.clone() {
            self.finish_attach(AttachmentRef {
                node_id: selection.node_id,
                node_type: selection.node_type,
                tag,
            });
            return;
        }

        let Some(host) = self.host.clone() else {
            self.state.composer.alert =
                Some("Could not assign an ID to the selected element.".to_string());
            return;
        };
        let tag = self.tags.next_tag();
        let (tx, rx) = channel();
        self.attach_rx = Some(rx);
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = tx.send(AttachDone(Err(e.into())));
                    return;
                }
            };
            let result: anyhow::Result<AttachmentRef> = rt.block_on(async {
                let saved = host.ensure_tag(&selection.node_id, &tag).await?;
                Ok(AttachmentRef {
                    node_id: selection.node_id,
                    node_type: selection.node_type,
                    // The host may hand back a tag it already persisted.
                    tag: saved.unwrap_or(tag),
                })
            });
            let _ = tx.send(AttachDone(result));
        });
    }

    fn poll_attach(&mut self) {
        if let Some(rx) = &self.attach_rx {
            if let Ok(done) = rx.try_recv() {
                self.attach_rx = None;
                match done.0 {
                    Ok(attachment) => self.finish_attach(attachment),
                    Err(e) => {
                        tracing::warn!("attach failed: {}", e);
                        self.state.composer.alert =
                            Some("Could not assign an ID to the selected element.".to_string());
                    }
                }
            }
        }
    }

    fn finish_attach(&mut self, attachment: AttachmentRef) {
        if let Some(selection) = &mut self.state.composer.selection {
            if selection.node_id == attachment.node_id {
                selection.tag = Some(attachment.tag.clone());
            }
        }
        self.refresh_selection_status();
        // One attachment at a time; a new one replaces the old.
        self.state.composer.pending_attachment = Some(attachment);
    }

    fn jump_to_tag(&mut self, tag: String) {
        let Some(host) = self.host.clone() else {
            self.state.composer.alert =
                Some("Canvas jump not available. Refresh the add-on.".to_string());
            return;
        };
        let (tx, rx) = channel();
        self.focus_rx = Some(rx);
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = tx.send(FocusDone {
                        tag,
                        found: Err(e.into()),
                    });
                    return;
                }
            };
            let found = rt.block_on(host.focus_by_tag(&tag)).map(|hit| hit.is_some());
            let _ = tx.send(FocusDone { tag, found });
        });
    }

    fn poll_focus(&mut self) {
        if let Some(rx) = &self.focus_rx {
            if let Ok(done) = rx.try_recv() {
                self.focus_rx = None;
                if !matches!(done.found, Ok(true)) {
                    self.state.composer.alert =
                        Some(format!("Couldn't find element {} on the canvas.", done.tag));
                }
            }
        }
    }

    fn poll_host_events(&mut self) {
        let Some(rx) = &self.host_events else { return };
        let mut drained = Vec::new();
        while let Ok(event) = rx.try_recv() {
            drained.push(event);
        }
        for event in drained {
            self.apply_host_event(event);
        }
    }

    fn apply_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Connecting { .. } => {
                self.state.composer.host_status = "connecting to sandbox…".to_string();
            }
            HostEvent::Connected(host) => {
                self.host = Some(host);
            }
            HostEvent::Unavailable { attempts } => {
                tracing::warn!("sandbox connect failed after {} attempts", attempts);
                self.state.composer.host_status =
                    "sandbox not connected (click Add-on Dev Refresh).".to_string();
            }
            HostEvent::Selection(selection) => self.apply_selection(selection),
            HostEvent::PollFailed(_) => {
                self.state.composer.host_status = "waiting for sandbox…".to_string();
            }
        }
    }

    fn apply_selection(&mut self, incoming: Option<CanvasSelection>) {
        let dismissed = self.state.composer.dismissed_node.clone();
        match incoming {
            // The dismissed node stays hidden until a different one arrives.
            Some(sel) if dismissed.as_deref() == Some(sel.node_id.as_str()) => {
                self.state.composer.selection = None;
            }
            other => {
                self.state.composer.selection = other;
                self.state.composer.dismissed_node = None;
            }
        }
        self.refresh_selection_status();
    }

    fn refresh_selection_status(&mut self) {
        self.state.composer.host_status =
            selection_status(self.state.composer.selection.as_ref());
    }
}

fn selection_status(selection: Option<&CanvasSelection>) -> String {
    match selection {
        None => "select an element on the canvas.".to_string(),
        Some(sel) => {
            let readiness = if sel.tag.is_some() {
                "ready."
            } else {
                "ready — click chip to attach."
            };
            if sel.selection_count > 1 {
                format!("{} selected, using the first. {}", sel.selection_count, readiness)
            } else {
                readiness.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::host::StaticHost;
    use services::store::MemoryStore;
    use shared::notes::NoteKind;
    use std::time::Duration;

    fn controller() -> Controller {
        Controller::new(Arc::new(MemoryStore::new()), Settings::default())
    }

    fn poll_until(ctl: &mut Controller, mut done: impl FnMut(&Controller) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !done(ctl) {
            assert!(Instant::now() < deadline, "background work never finished");
            ctl.poll_background();
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn selection(node_id: &str, tag: Option<&str>, count: usize) -> CanvasSelection {
        CanvasSelection {
            node_id: node_id.to_string(),
            node_type: "Text".to_string(),
            tag: tag.map(|t| t.to_string()),
            selection_count: count,
        }
    }

    #[test]
    fn test_begin_draft_falls_back_to_untitled() {
        let mut ctl = controller();
        ctl.apply(UiIntent::BeginDraft {
            title: "   ".to_string(),
        });
        assert_eq!(ctl.state.board_title, "Untitled note");
        assert_eq!(ctl.state.nav.current(), View::Input);

        ctl.apply(UiIntent::DiscardDraft);
        assert!(ctl.state.draft.is_none());
        assert_eq!(ctl.state.nav.current(), View::Home);
    }

    #[test]
    fn test_submit_draft_failure_surfaces_backend_hint() {
        let settings = Settings {
            // Nothing listens here, so the analysis call fails fast.
            server_base_url: "http://127.0.0.1:9".to_string(),
            ..Settings::default()
        };
        let mut ctl = Controller::new(Arc::new(MemoryStore::new()), settings);

        ctl.apply(UiIntent::BeginDraft {
            title: "Sprint".to_string(),
        });
        ctl.apply(UiIntent::SubmitDraft {
            text: "do the thing".to_string(),
            files: Vec::new(),
        });
        assert_eq!(ctl.state.analysis, AnalysisStatus::Running);
        assert_eq!(ctl.state.nav.current(), View::Result);
        assert_eq!(ctl.state.nav.entry(), Some(View::Home));

        poll_until(&mut ctl, |c| c.state.analysis != AnalysisStatus::Running);
        assert_eq!(
            ctl.state.analysis,
            AnalysisStatus::Failed("AI failed. Is backend running?".to_string())
        );
        assert!(ctl.state.saved_sets.is_empty());
    }

    #[test]
    fn test_open_note_set_places_cards() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let seed = NoteSet::new(
            "Retro",
            &[
                Note::new(NoteKind::Task, "fix the build"),
                Note::new(NoteKind::Question, "why flaky?"),
            ],
        );
        let id = seed.id;
        NotesStore::new(store.clone()).save(seed);

        let mut ctl = Controller::new(store, Settings::default());
        assert_eq!(ctl.state.saved_sets.len(), 1);

        ctl.apply(UiIntent::OpenNoteSet { id });
        assert_eq!(ctl.state.board_title, "Retro");
        assert_eq!(ctl.state.notes.len(), 2);
        assert_eq!(ctl.state.nav.current(), View::Result);
        assert_eq!(ctl.state.nav.entry(), Some(View::StickyNotes));
        let cards = ctl.state.layout.cards();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].rect.left, 20.0);

        ctl.apply(UiIntent::GoBack);
        assert_eq!(ctl.state.nav.current(), View::StickyNotes);
    }

    #[test]
    fn test_member_form_requires_all_fields() {
        let mut ctl = controller();
        ctl.apply(UiIntent::OpenTeam);
        ctl.apply(UiIntent::OpenMemberForm);
        ctl.apply(UiIntent::SubmitMemberForm {
            name: "Ada".to_string(),
            email: "ada@x.io".to_string(),
            role: "  ".to_string(),
            is_lead: false,
        });
        assert!(ctl.state.member_form_open);
        assert_eq!(
            ctl.state.member_form_error.as_deref(),
            Some("Please fill in all required fields (Name, Email, and Role)")
        );

        ctl.apply(UiIntent::SubmitMemberForm {
            name: "Ada".to_string(),
            email: "ada@x.io".to_string(),
            role: "Eng".to_string(),
            is_lead: true,
        });
        assert!(!ctl.state.member_form_open);
        assert_eq!(ctl.state.members.len(), 1);
        assert!(ctl.state.members[0].is_lead);
    }

    #[test]
    fn test_leaving_team_closes_overlays() {
        let mut ctl = controller();
        ctl.apply(UiIntent::OpenTeam);
        ctl.apply(UiIntent::OpenMemberForm);
        ctl.apply(UiIntent::NavigateTo {
            target: View::Home,
            replace_history: false,
            entry_source: None,
        });
        assert!(!ctl.state.member_form_open);
    }

    #[test]
    fn test_remove_member_needs_confirmation() {
        let mut ctl = controller();
        ctl.apply(UiIntent::SubmitMemberForm {
            name: "Ada".to_string(),
            email: "ada@x.io".to_string(),
            role: "Eng".to_string(),
            is_lead: false,
        });
        let id = ctl.state.members[0].id;

        ctl.apply(UiIntent::RequestRemoveMember { id });
        assert_eq!(ctl.state.confirm_remove, Some(id));
        ctl.apply(UiIntent::CancelRemoveMember);
        assert_eq!(ctl.state.confirm_remove, None);
        assert_eq!(ctl.state.members.len(), 1);

        ctl.apply(UiIntent::RequestRemoveMember { id });
        ctl.apply(UiIntent::ConfirmRemoveMember);
        assert!(ctl.state.members.is_empty());
    }

    #[test]
    fn test_mention_session_completes_into_input() {
        let mut ctl = controller();
        ctl.apply(UiIntent::SubmitMemberForm {
            name: "Alice".to_string(),
            email: "alice@x.io".to_string(),
            role: "Eng".to_string(),
            is_lead: false,
        });

        ctl.apply(UiIntent::ComposerInput {
            text: "@".to_string(),
            cursor: 1,
            inserted: Some("@".to_string()),
        });
        let session = ctl.state.mention.as_ref().expect("session open");
        assert_eq!(session.candidates.len(), 2);

        ctl.apply(UiIntent::ComposerInput {
            text: "@al".to_string(),
            cursor: 3,
            inserted: Some("l".to_string()),
        });
        let session = ctl.state.mention.as_ref().expect("session filtered");
        assert_eq!(session.candidates.len(), 1);

        ctl.apply(UiIntent::CompleteMention { index: 0 });
        assert_eq!(ctl.state.composer.input, "@Alice ");
        assert_eq!(ctl.state.composer.cursor, 7);
        assert!(ctl.state.mention.is_none());
    }

    #[test]
    fn test_complete_mention_carries_selection_tag() {
        let mut ctl = controller();
        ctl.apply_selection(Some(selection("n1", Some("NG-042"), 1)));
        ctl.apply(UiIntent::ComposerInput {
            text: "@".to_string(),
            cursor: 1,
            inserted: Some("@".to_string()),
        });
        ctl.apply(UiIntent::SubmitComposer);
        assert_eq!(ctl.state.composer.input, "@Everyone [NG-042] ");
        assert!(ctl.state.messages.is_empty());
    }

    #[test]
    fn test_send_message_appends_and_clears_composer() {
        let mut ctl = controller();
        ctl.apply(UiIntent::ComposerInput {
            text: "hello team".to_string(),
            cursor: 10,
            inserted: None,
        });
        ctl.apply(UiIntent::SendMessage);

        assert_eq!(ctl.state.messages.len(), 1);
        assert_eq!(ctl.state.messages[0].created_by, "me");
        assert!(ctl.state.composer.input.is_empty());
        assert_eq!(ctl.state.composer.cursor, 0);
        // Persisted, not just in memory.
        assert_eq!(ctl.discussion.messages().len(), 1);
    }

    #[test]
    fn test_send_strips_attached_tag_from_text() {
        let mut ctl = controller();
        ctl.state.composer.pending_attachment = Some(AttachmentRef {
            node_id: "n1".to_string(),
            node_type: "Text".to_string(),
            tag: "NG-001".to_string(),
        });
        ctl.apply(UiIntent::ComposerInput {
            text: "fix [NG-001] please".to_string(),
            cursor: 19,
            inserted: None,
        });
        ctl.apply(UiIntent::SendMessage);

        let message = &ctl.state.messages[0];
        assert_eq!(message.text, "fix please");
        assert_eq!(message.attachments.len(), 1);
        assert!(ctl.state.composer.pending_attachment.is_none());
    }

    #[test]
    fn test_send_logs_skipped_mentions() {
        let mut ctl = controller();
        ctl.apply(UiIntent::ComposerInput {
            text: "@Ghost are you there".to_string(),
            cursor: 20,
            inserted: None,
        });
        ctl.apply(UiIntent::SendMessage);
        // @Ghost resolves to nobody, so nothing lands in the delivery log
        // and no worker is spawned.
        assert!(ctl.state.delivery_log.is_empty());
        assert_eq!(ctl.state.messages.len(), 1);
    }

    #[test]
    fn test_send_skips_member_without_email() {
        let mut ctl = controller();
        ctl.state.members = ctl.roster.add(TeamMember::new("Bob", "", "Dev", false));
        ctl.apply(UiIntent::ComposerInput {
            text: "@Bob ping".to_string(),
            cursor: 9,
            inserted: None,
        });
        ctl.apply(UiIntent::SendMessage);

        assert_eq!(ctl.state.delivery_log.len(), 1);
        assert!(matches!(
            ctl.state.delivery_log[0],
            DeliveryOutcome::Skipped { .. }
        ));
    }

    #[test]
    fn test_attach_without_selection_alerts() {
        let mut ctl = controller();
        ctl.apply(UiIntent::AttachSelection);
        assert_eq!(
            ctl.take_alert().as_deref(),
            Some("Select an element on the canvas first.")
        );
        assert_eq!(ctl.take_alert(), None);
    }

    #[test]
    fn test_attach_with_tagged_selection_is_immediate() {
        let mut ctl = controller();
        ctl.apply_selection(Some(selection("n1", Some("NG-007"), 1)));
        ctl.apply(UiIntent::AttachSelection);

        let attachment = ctl.state.composer.pending_attachment.as_ref().unwrap();
        assert_eq!(attachment.tag, "NG-007");
        assert_eq!(ctl.state.composer.host_status, "ready.");
    }

    #[test]
    fn test_attach_allocates_tag_through_host() {
        let mut ctl = controller();
        let host: Arc<dyn HostDocument> = Arc::new(StaticHost::new());
        ctl.apply_host_event(HostEvent::Connected(host));
        ctl.apply_selection(Some(selection("n1", None, 1)));

        ctl.apply(UiIntent::AttachSelection);
        poll_until(&mut ctl, |c| c.state.composer.pending_attachment.is_some());

        let attachment = ctl.state.composer.pending_attachment.as_ref().unwrap();
        assert_eq!(attachment.tag, "NG-001");
        let sel = ctl.state.composer.selection.as_ref().unwrap();
        assert_eq!(sel.tag.as_deref(), Some("NG-001"));
        assert_eq!(ctl.state.composer.host_status, "ready.");
    }

    #[test]
    fn test_selection_status_lines() {
        let mut ctl = controller();
        ctl.apply_host_event(HostEvent::Connecting { attempt: 1 });
        assert_eq!(ctl.state.composer.host_status, "connecting to sandbox…");

        ctl.apply_host_event(HostEvent::Selection(None));
        assert_eq!(
            ctl.state.composer.host_status,
            "select an element on the canvas."
        );

        ctl.apply_host_event(HostEvent::Selection(Some(selection("n1", None, 3))));
        assert_eq!(
            ctl.state.composer.host_status,
            "3 selected, using the first. ready — click chip to attach."
        );

        ctl.apply_host_event(HostEvent::Selection(Some(selection("n1", Some("NG-001"), 1))));
        assert_eq!(ctl.state.composer.host_status, "ready.");

        ctl.apply_host_event(HostEvent::PollFailed("boom".to_string()));
        assert_eq!(ctl.state.composer.host_status, "waiting for sandbox…");

        ctl.apply_host_event(HostEvent::Unavailable { attempts: 10 });
        assert_eq!(
            ctl.state.composer.host_status,
            "sandbox not connected (click Add-on Dev Refresh)."
        );
    }

    #[test]
    fn test_dismissed_node_stays_hidden_until_replaced() {
        let mut ctl = controller();
        ctl.apply_selection(Some(selection("n1", None, 1)));
        ctl.apply(UiIntent::DismissSelection);
        assert!(ctl.state.composer.selection.is_none());
        assert_eq!(ctl.state.composer.host_status, "selection cleared.");

        ctl.apply_selection(Some(selection("n1", None, 1)));
        assert!(ctl.state.composer.selection.is_none());

        ctl.apply_selection(Some(selection("n2", None, 1)));
        assert_eq!(
            ctl.state.composer.selection.as_ref().map(|s| s.node_id.as_str()),
            Some("n2")
        );
        assert!(ctl.state.composer.dismissed_node.is_none());
    }

    #[test]
    fn test_jump_without_host_alerts() {
        let mut ctl = controller();
        ctl.apply(UiIntent::JumpToTag {
            tag: "NG-001".to_string(),
        });
        assert_eq!(
            ctl.take_alert().as_deref(),
            Some("Canvas jump not available. Refresh the add-on.")
        );
    }

    #[test]
    fn test_jump_to_missing_tag_alerts() {
        let mut ctl = controller();
        let host: Arc<dyn HostDocument> = Arc::new(StaticHost::new());
        ctl.apply_host_event(HostEvent::Connected(host));

        ctl.apply(UiIntent::JumpToTag {
            tag: "NG-404".to_string(),
        });
        poll_until(&mut ctl, |c| c.state.composer.alert.is_some());
        assert_eq!(
            ctl.take_alert().as_deref(),
            Some("Couldn't find element NG-404 on the canvas.")
        );
    }

    #[test]
    fn test_fresh_tasks_cache_short_circuits() {
        let mut ctl = controller();
        ctl.state.tasks.fetched_at = Some(Instant::now());
        ctl.apply(UiIntent::OpenTasks);
        assert!(!ctl.state.tasks.loading);
        assert_eq!(ctl.state.nav.current(), View::Tasks);
    }

    #[test]
    fn test_tasks_fetch_without_credentials_errors() {
        let mut ctl = controller();
        ctl.apply(UiIntent::RefreshTasks);
        assert!(ctl.state.tasks.loading);

        poll_until(&mut ctl, |c| !c.state.tasks.loading);
        assert!(ctl.state.tasks.error.is_some());
        assert!(ctl.state.tasks.board.assigned_to_me.is_empty());
    }

    #[test]
    fn test_card_intents_drive_the_layout() {
        let mut ctl = controller();
        ctl.state.notes = vec![Note::new(NoteKind::Task, "drag me")];
        ctl.place_cards();

        ctl.apply(UiIntent::CardPress {
            id: 0,
            x: 30.0,
            y: 30.0,
        });
        ctl.apply(UiIntent::PointerMove { x: 90.0, y: 30.0 });
        ctl.apply(UiIntent::PointerRelease { x: 90.0, y: 30.0 });
        assert_eq!(ctl.state.layout.cards()[0].rect.left, 80.0);
        assert!(ctl.state.focused_card.is_none());

        ctl.apply(UiIntent::CardPress {
            id: 0,
            x: 90.0,
            y: 30.0,
        });
        ctl.apply(UiIntent::PointerRelease { x: 91.0, y: 30.0 });
        assert_eq!(ctl.state.focused_card, Some(0));

        ctl.apply(UiIntent::CollapseCard { id: 0 });
        assert!(ctl.state.layout.cards()[0].collapsed);

        ctl.apply(UiIntent::CanvasResized { width: 500.0 });
        assert_eq!(ctl.state.canvas_width, 500.0);
    }

    #[test]
    fn test_watcher_wires_selection_into_state() {
        let settings = Settings {
            selection_poll_ms: 1,
            connect_retry_delay_ms: 0,
            ..Settings::default()
        };
        let mut ctl = Controller::new(Arc::new(MemoryStore::new()), settings);
        let factory: Arc<HostFactory> = Arc::new(|| {
            Ok(Arc::new(StaticHost::with_selection(CanvasSelection {
                node_id: "n1".to_string(),
                node_type: "Text".to_string(),
                tag: Some("NG-009".to_string()),
                selection_count: 1,
            })) as Arc<dyn HostDocument>)
        });

        ctl.connect_host(factory);
        poll_until(&mut ctl, |c| c.state.composer.host_status == "ready.");
        assert!(ctl.host.is_some());
        assert_eq!(
            ctl.state.composer.selection.as_ref().map(|s| s.node_id.as_str()),
            Some("n1")
        );
    }
}
