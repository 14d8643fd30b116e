// Drag controller - Pointer gesture state machine for one item at a time
use crate::domain::coordinates::{CoordinateModel, PixelPoint};
use crate::domain::item::{GridRect, Item};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Pointer-down over an item, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerDown<'a> {
    pub item_id: &'a str,
    pub button: PointerButton,
    pub client: PixelPoint,
    /// Client-space top-left of the canvas.
    pub canvas_origin: PixelPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub item_id: String,
    pub start: GridRect,
    /// Pointer offset inside the item's rendered box.
    pub grab: PixelPoint,
    /// Client-space position of the canvas top-left.
    pub canvas_origin: PixelPoint,
    pub preview: Option<GridRect>,
}

impl DragSession {
    /// Snapped preview for a pointer position; visual only, no collision check.
    pub fn track(&mut self, model: &CoordinateModel, client: PixelPoint, viewport_width: f64) -> GridRect {
        let canvas_px = PixelPoint::new(
            client.x - self.canvas_origin.x - self.grab.x,
            client.y - self.canvas_origin.y - self.grab.y,
        );
        let cell = model.pixel_to_cell(canvas_px, self.start.w, self.start.h, viewport_width);
        let preview = self.start.moved_to(cell.x, cell.y);
        self.preview = Some(preview);
        preview
    }

    /// Final candidate: preview if the pointer moved, else the start rect.
    pub fn candidate(&self) -> GridRect {
        self.preview.unwrap_or(self.start)
    }
}

/// Why a pending commit exists; decides what a failure rolls back.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitKind {
    Move { item_id: String, start: GridRect },
    Add { item_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    pub kind: CommitKind,
    pub next_items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragPhase {
    Idle,
    Dragging(DragSession),
    Committing(CommitKind),
}

/// Outcome of releasing the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum DragRelease {
    /// No session for this item.
    Ignored,
    /// Candidate overlapped another item; visuals restored, nothing persisted.
    Reverted { item_id: String, candidate: GridRect },
    /// Candidate is valid; persist `next_items` then resolve the commit.
    Commit(CommitRequest),
}

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("grid is not in edit mode")]
    NotEditing,

    #[error("a commit is already in flight")]
    CommitInFlight,

    #[error("another drag is in progress")]
    DragInProgress,

    #[error("only the primary button starts a drag")]
    NotPrimaryButton,

    #[error("unknown item {0}")]
    UnknownItem(String),

    #[error("duplicate item id {0}")]
    DuplicateItem(String),

    #[error("placement of {item_id} at {rect:?} overlaps another item")]
    PlacementConflict { item_id: String, rect: GridRect },

    #[error("no commit is pending")]
    NoPendingCommit,

    #[error("commit request does not match the pending commit")]
    StaleCommit,

    #[error("layout commit failed: {0}")]
    Persistence(#[from] crate::application::persistence_gateway::PersistenceError),
}
