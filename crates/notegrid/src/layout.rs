//! Sticky-note canvas: absolute-positioned cards with drag repositioning,
//! collapse-to-dot clustering, and expand-back.
//!
//! All geometry lives here so rendering stays a pure projection. Drags are
//! strictly serialized; a press while a session is live is ignored. Layout
//! never persists; every render starts from the grouped-column placement.

use shared::notes::NoteKind;

/// Index of a card within the engine, stable for the life of a placement.
pub type CardId = usize;

pub const DEFAULT_CANVAS_WIDTH: f32 = 640.0;
pub const MIN_CANVAS_HEIGHT: f32 = 400.0;

/// Full-size card footprint used by initial placement.
pub const CARD_WIDTH: f32 = 180.0;
pub const DEFAULT_CARD_HEIGHT: f32 = 120.0;
const CARD_GAP: f32 = 12.0;
const COLUMN_GAP: f32 = 16.0;
/// Inset from the canvas edges.
const BOARD_PADDING: f32 = 20.0;
/// Below this canvas width everything stacks into one column.
const SINGLE_COLUMN_THRESHOLD: f32 = 420.0;

/// Movement must exceed this many pixels to count as a drag.
const DRAG_THRESHOLD: f32 = 5.0;
/// Extra canvas height added when a drag pushes past the bottom.
const GROWTH_MARGIN: f32 = 20.0;

/// Collapsed cards render as fixed-size dots.
pub const COLLAPSED_SIZE: f32 = 24.0;
const CLUSTER_SPACING: f32 = 4.0;
/// Vertical offset between per-type cluster home rows.
const CLUSTER_ROW_OFFSET: f32 = 30.0;
/// Row advance when a cluster row wraps: dot size plus spacing.
const CLUSTER_WRAP_OFFSET: f32 = 28.0;

/// Axis-aligned card box in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Geometry captured when a card collapses, restored on expand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredGeometry {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub was_editable: bool,
}

/// Input card for initial placement.
#[derive(Debug, Clone, Copy)]
pub struct CardSpec {
    pub kind: NoteKind,
    pub height: f32,
    pub editable: bool,
}

impl CardSpec {
    pub fn sized(kind: NoteKind, height: f32) -> Self {
        Self {
            kind,
            height,
            editable: false,
        }
    }
}

/// One card on the canvas.
#[derive(Debug, Clone)]
pub struct Card {
    pub id: CardId,
    pub kind: NoteKind,
    pub rect: Rect,
    pub editable: bool,
    pub collapsed: bool,
    stored: Option<StoredGeometry>,
}

/// What a pointer release amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseAction {
    None,
    /// Editable card pressed and never moved past the threshold: give it
    /// input focus.
    Focus(CardId),
    /// Collapsed card clicked without movement: it expanded.
    Expanded(CardId),
}

#[derive(Debug, Clone, Copy)]
struct DragSession {
    card: CardId,
    start_x: f32,
    start_y: f32,
    origin: Rect,
    /// Editable cards wait for the threshold before moving.
    deferred: bool,
    started: bool,
    /// Press landed on a collapsed dot; release may expand it.
    on_collapsed: bool,
}

#[derive(Debug, Clone)]
pub struct LayoutEngine {
    cards: Vec<Card>,
    canvas_width: f32,
    canvas_height: f32,
    drag: Option<DragSession>,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            cards: Vec::new(),
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: MIN_CANVAS_HEIGHT,
            drag: None,
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    pub fn canvas_width(&self) -> f32 {
        self.canvas_width
    }

    pub fn canvas_height(&self) -> f32 {
        self.canvas_height
    }

    /// Track the live canvas width. Drag clamping and cluster wrap read it;
    /// already-placed cards keep their positions.
    pub fn resize(&mut self, width: f32) {
        self.canvas_width = width;
    }

    /// Card currently being moved, once its drag has actually started.
    pub fn dragging(&self) -> Option<CardId> {
        self.drag.filter(|d| d.started).map(|d| d.card)
    }

    /// Rebuild the canvas from scratch: cards grouped by type into columns
    /// (one column under the width threshold), stacking top-to-bottom with
    /// a fixed gap. Card ids are the spec indices.
    pub fn place(&mut self, specs: &[CardSpec], canvas_width: f32) {
        self.canvas_width = canvas_width;
        self.drag = None;
        self.cards = specs
            .iter()
            .enumerate()
            .map(|(id, spec)| Card {
                id,
                kind: spec.kind,
                rect: Rect {
                    left: 0.0,
                    top: 0.0,
                    width: CARD_WIDTH,
                    height: spec.height,
                },
                editable: spec.editable,
                collapsed: false,
                stored: None,
            })
            .collect();

        let present: Vec<NoteKind> = NoteKind::all()
            .iter()
            .copied()
            .filter(|kind| self.cards.iter().any(|c| c.kind == *kind))
            .collect();

        if canvas_width < SINGLE_COLUMN_THRESHOLD {
            let mut y = BOARD_PADDING;
            for kind in &present {
                for card in self.cards.iter_mut().filter(|c| c.kind == *kind) {
                    card.rect.left = BOARD_PADDING;
                    card.rect.top = y;
                    y += card.rect.height + CARD_GAP;
                }
            }
        } else {
            let mut column_y = vec![BOARD_PADDING; present.len()];
            for card in &mut self.cards {
                let col = present.iter().position(|k| *k == card.kind).unwrap_or(0);
                card.rect.left = BOARD_PADDING + col as f32 * (CARD_WIDTH + COLUMN_GAP);
                card.rect.top = column_y[col];
                column_y[col] = card.rect.top + card.rect.height + CARD_GAP;
            }
        }

        let content_bottom = self
            .cards
            .iter()
            .map(|c| c.rect.top + c.rect.height)
            .fold(0.0_f32, f32::max);
        self.canvas_height = (content_bottom + GROWTH_MARGIN).max(MIN_CANVAS_HEIGHT);
    }

    /// Begin a pointer interaction on a card. Non-editable cards drag
    /// immediately; editable ones defer until the threshold. Ignored while
    /// another session is live.
    pub fn press(&mut self, id: CardId, x: f32, y: f32) {
        if self.drag.is_some() {
            return;
        }
        let Some(card) = self.cards.get(id) else { return };
        let deferred = card.editable && !card.collapsed;
        self.drag = Some(DragSession {
            card: id,
            start_x: x,
            start_y: y,
            origin: card.rect,
            deferred,
            started: !deferred,
            on_collapsed: card.collapsed,
        });
    }

    /// Track pointer movement for the live session. Horizontal position is
    /// clamped to the canvas; vertical is clamped to zero upward and free
    /// downward, growing the canvas as needed.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let Some(drag) = self.drag else { return };
        let dx = x - drag.start_x;
        let dy = y - drag.start_y;

        if !drag.started {
            if dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD {
                if let Some(session) = self.drag.as_mut() {
                    session.started = true;
                }
            } else {
                return;
            }
        }

        let Some(card) = self.cards.get_mut(drag.card) else { return };
        let new_left = drag.origin.left + dx;
        let new_top = drag.origin.top + dy;
        let max_left = (self.canvas_width - card.rect.width).max(0.0);
        card.rect.left = new_left.clamp(0.0, max_left);
        card.rect.top = new_top.max(0.0);

        // Growth keys off the unclamped bottom; the canvas never shrinks
        // mid-drag.
        let bottom = new_top + card.rect.height;
        if bottom > self.canvas_height {
            self.canvas_height = bottom + GROWTH_MARGIN;
        }
    }

    /// End the live session. A release within the threshold expands a
    /// collapsed dot or focuses a deferred editable card.
    pub fn release(&mut self, x: f32, y: f32) -> ReleaseAction {
        let Some(drag) = self.drag.take() else {
            return ReleaseAction::None;
        };
        let dx = (x - drag.start_x).abs();
        let dy = (y - drag.start_y).abs();
        if drag.on_collapsed && dx < DRAG_THRESHOLD && dy < DRAG_THRESHOLD {
            self.expand(drag.card);
            return ReleaseAction::Expanded(drag.card);
        }
        if drag.deferred && !drag.started {
            return ReleaseAction::Focus(drag.card);
        }
        ReleaseAction::None
    }

    /// Shrink a card to a dot and tuck it into its type cluster, recording
    /// the geometry to restore on expand.
    pub fn collapse(&mut self, id: CardId) {
        let Some(card) = self.cards.get(id) else { return };
        if card.collapsed {
            return;
        }
        let stored = StoredGeometry {
            left: card.rect.left,
            top: card.rect.top,
            width: card.rect.width,
            height: card.rect.height,
            was_editable: card.editable,
        };
        let slot = self.cluster_slot(card.kind, id);

        let card = &mut self.cards[id];
        card.stored = Some(stored);
        card.collapsed = true;
        card.editable = false;
        card.rect = Rect {
            left: slot.0,
            top: slot.1,
            width: COLLAPSED_SIZE,
            height: COLLAPSED_SIZE,
        };
    }

    /// Restore a collapsed card to its recorded geometry and editability.
    /// Without a record the card keeps its current box.
    pub fn expand(&mut self, id: CardId) {
        let Some(card) = self.cards.get_mut(id) else { return };
        if !card.collapsed {
            return;
        }
        card.collapsed = false;
        if let Some(stored) = card.stored.take() {
            card.rect = Rect {
                left: stored.left,
                top: stored.top,
                width: stored.width,
                height: stored.height,
            };
            card.editable = stored.was_editable;
        }
    }

    /// Slot for a newly collapsed card: first of its type gets the fixed
    /// per-type home row, the rest sit right of the rightmost peer, wrapping
    /// to a new row when the cluster would overflow the canvas.
    fn cluster_slot(&self, kind: NoteKind, skip: CardId) -> (f32, f32) {
        let peers: Vec<&Card> = self
            .cards
            .iter()
            .filter(|c| c.collapsed && c.kind == kind && c.id != skip)
            .collect();

        if peers.is_empty() {
            return (
                BOARD_PADDING,
                BOARD_PADDING + kind.order_index() as f32 * CLUSTER_ROW_OFFSET,
            );
        }

        let max_right = peers
            .iter()
            .map(|c| c.rect.left + COLLAPSED_SIZE)
            .fold(0.0_f32, f32::max);
        let cluster_top = peers
            .iter()
            .map(|c| c.rect.top)
            .find(|top| *top != 0.0)
            .unwrap_or(0.0);

        if max_right + CLUSTER_SPACING + COLLAPSED_SIZE > self.canvas_width - BOARD_PADDING {
            (BOARD_PADDING, cluster_top + CLUSTER_WRAP_OFFSET)
        } else {
            (max_right + CLUSTER_SPACING, cluster_top)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: NoteKind) -> CardSpec {
        CardSpec::sized(kind, DEFAULT_CARD_HEIGHT)
    }

    #[test]
    fn test_place_groups_types_into_columns() {
        let mut engine = LayoutEngine::new();
        engine.place(
            &[
                spec(NoteKind::Task),
                spec(NoteKind::Decision),
                spec(NoteKind::Task),
                spec(NoteKind::Question),
            ],
            640.0,
        );

        let cards = engine.cards();
        // Task column.
        assert_eq!(cards[0].rect.left, 20.0);
        assert_eq!(cards[0].rect.top, 20.0);
        assert_eq!(cards[2].rect.left, 20.0);
        assert_eq!(cards[2].rect.top, 152.0);
        // Decision and question columns sit to the right.
        assert_eq!(cards[1].rect.left, 216.0);
        assert_eq!(cards[1].rect.top, 20.0);
        assert_eq!(cards[3].rect.left, 412.0);
        assert_eq!(cards[3].rect.top, 20.0);
    }

    #[test]
    fn test_place_stacks_one_column_under_the_threshold() {
        let mut engine = LayoutEngine::new();
        engine.place(
            &[
                spec(NoteKind::Task),
                spec(NoteKind::Decision),
                spec(NoteKind::Task),
            ],
            400.0,
        );

        let cards = engine.cards();
        assert!(cards.iter().all(|c| c.rect.left == 20.0));
        // Grouped order: both tasks, then the decision.
        assert_eq!(cards[0].rect.top, 20.0);
        assert_eq!(cards[2].rect.top, 152.0);
        assert_eq!(cards[1].rect.top, 284.0);
    }

    #[test]
    fn test_drag_clamps_to_the_right_edge_exactly() {
        let mut engine = LayoutEngine::new();
        engine.place(&[spec(NoteKind::Task)], 640.0);

        engine.press(0, 100.0, 100.0);
        engine.pointer_move(10_000.0, 100.0);
        assert_eq!(engine.card(0).unwrap().rect.left, 640.0 - CARD_WIDTH);
        assert_eq!(engine.card(0).unwrap().rect.top, 20.0);
        engine.release(10_000.0, 100.0);
    }

    #[test]
    fn test_drag_clamps_top_at_zero_and_grows_the_canvas_downward() {
        let mut engine = LayoutEngine::new();
        engine.place(&[spec(NoteKind::Task)], 640.0);
        assert_eq!(engine.canvas_height(), MIN_CANVAS_HEIGHT);

        engine.press(0, 100.0, 100.0);
        engine.pointer_move(100.0, -10_000.0);
        assert_eq!(engine.card(0).unwrap().rect.top, 0.0);

        engine.pointer_move(100.0, 1_100.0);
        let top = engine.card(0).unwrap().rect.top;
        assert_eq!(top, 20.0 + 1_000.0);
        assert_eq!(engine.canvas_height(), top + DEFAULT_CARD_HEIGHT + 20.0);
        engine.release(100.0, 1_100.0);
    }

    #[test]
    fn test_editable_press_defers_until_the_threshold() {
        let mut engine = LayoutEngine::new();
        engine.place(
            &[CardSpec {
                kind: NoteKind::Task,
                height: DEFAULT_CARD_HEIGHT,
                editable: true,
            }],
            640.0,
        );

        engine.press(0, 100.0, 100.0);
        engine.pointer_move(103.0, 100.0);
        assert_eq!(engine.card(0).unwrap().rect.left, 20.0);
        assert_eq!(engine.dragging(), None);
        assert_eq!(engine.release(103.0, 100.0), ReleaseAction::Focus(0));

        engine.press(0, 100.0, 100.0);
        engine.pointer_move(110.0, 100.0);
        assert_eq!(engine.dragging(), Some(0));
        assert_eq!(engine.card(0).unwrap().rect.left, 30.0);
        assert_eq!(engine.release(110.0, 100.0), ReleaseAction::None);
    }

    #[test]
    fn test_presses_are_ignored_while_a_drag_is_live() {
        let mut engine = LayoutEngine::new();
        engine.place(&[spec(NoteKind::Task), spec(NoteKind::Task)], 640.0);

        engine.press(0, 100.0, 100.0);
        engine.press(1, 300.0, 300.0);
        engine.pointer_move(110.0, 100.0);
        assert_eq!(engine.card(0).unwrap().rect.left, 30.0);
        assert_eq!(engine.card(1).unwrap().rect.top, 152.0);
        engine.release(110.0, 100.0);
    }

    #[test]
    fn test_collapse_clusters_by_type() {
        let mut engine = LayoutEngine::new();
        engine.place(
            &[
                spec(NoteKind::Task),
                spec(NoteKind::Task),
                spec(NoteKind::Decision),
            ],
            640.0,
        );

        engine.collapse(0);
        let dot = engine.card(0).unwrap();
        assert_eq!((dot.rect.left, dot.rect.top), (20.0, 20.0));
        assert_eq!((dot.rect.width, dot.rect.height), (24.0, 24.0));
        assert!(dot.collapsed);

        // Second task dot sits right of the first.
        engine.collapse(1);
        let dot = engine.card(1).unwrap();
        assert_eq!((dot.rect.left, dot.rect.top), (48.0, 20.0));

        // Decisions get their own home row.
        engine.collapse(2);
        let dot = engine.card(2).unwrap();
        assert_eq!((dot.rect.left, dot.rect.top), (20.0, 50.0));
    }

    #[test]
    fn test_cluster_wraps_when_the_row_would_overflow() {
        let mut engine = LayoutEngine::new();
        engine.place(
            &[
                spec(NoteKind::Task),
                spec(NoteKind::Task),
                spec(NoteKind::Task),
            ],
            100.0,
        );

        engine.collapse(0);
        engine.collapse(1);
        assert_eq!(engine.card(1).unwrap().rect.left, 48.0);

        // 72 + 4 + 24 > 100 - 20, so the third dot starts a new row.
        engine.collapse(2);
        let dot = engine.card(2).unwrap();
        assert_eq!((dot.rect.left, dot.rect.top), (20.0, 48.0));
    }

    #[test]
    fn test_expand_restores_the_exact_geometry_and_editability() {
        let mut engine = LayoutEngine::new();
        engine.place(
            &[CardSpec {
                kind: NoteKind::Question,
                height: 90.0,
                editable: true,
            }],
            640.0,
        );

        engine.press(0, 100.0, 100.0);
        engine.pointer_move(150.0, 180.0);
        engine.release(150.0, 180.0);
        let before = engine.card(0).unwrap().rect;

        engine.collapse(0);
        assert!(!engine.card(0).unwrap().editable);

        engine.expand(0);
        let card = engine.card(0).unwrap();
        assert_eq!(card.rect, before);
        assert!(card.editable);
        assert!(!card.collapsed);
    }

    #[test]
    fn test_click_on_a_collapsed_dot_expands_it() {
        let mut engine = LayoutEngine::new();
        engine.place(&[spec(NoteKind::Task)], 640.0);
        let before = engine.card(0).unwrap().rect;
        engine.collapse(0);

        engine.press(0, 30.0, 30.0);
        engine.pointer_move(32.0, 31.0);
        assert_eq!(engine.release(32.0, 31.0), ReleaseAction::Expanded(0));
        assert_eq!(engine.card(0).unwrap().rect, before);
    }

    #[test]
    fn test_dragging_a_dot_moves_it_without_expanding() {
        let mut engine = LayoutEngine::new();
        engine.place(&[spec(NoteKind::Task)], 640.0);
        engine.collapse(0);

        engine.press(0, 30.0, 30.0);
        engine.pointer_move(80.0, 30.0);
        assert_eq!(engine.release(80.0, 30.0), ReleaseAction::None);
        let dot = engine.card(0).unwrap();
        assert!(dot.collapsed);
        assert_eq!(dot.rect.left, 70.0);

        // A later click still restores the pre-collapse spot.
        engine.press(0, 75.0, 30.0);
        assert_eq!(engine.release(75.0, 30.0), ReleaseAction::Expanded(0));
        assert_eq!(engine.card(0).unwrap().rect.left, 20.0);
    }

    #[test]
    fn test_expand_without_a_record_keeps_the_current_box() {
        let mut engine = LayoutEngine::new();
        engine.place(&[spec(NoteKind::Task)], 640.0);
        engine.collapse(0);
        engine.cards[0].stored = None;

        engine.expand(0);
        let card = engine.card(0).unwrap();
        assert!(!card.collapsed);
        assert_eq!((card.rect.width, card.rect.height), (24.0, 24.0));
    }
}
