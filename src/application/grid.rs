// Grid - Item placement, drag lifecycle and commit resolution
use crate::application::canvas::{CanvasFrame, CanvasRenderer, ContainerLookup, WidgetContainer};
use crate::application::drag_controller::{
    CommitKind, CommitRequest, DragPhase, DragRelease, DragSession, GridError, PointerButton,
    PointerDown,
};
use crate::application::persistence_gateway::PersistenceError;
use crate::domain::collision::collides;
use crate::domain::coordinates::{CoordinateModel, OverlayDims, PixelPoint};
use crate::domain::item::{GridRect, Item};

/// Grid-wide controller. Holds the committed item list and at most one
/// drag or commit at a time. IO is left to the caller: a
/// [`CommitRequest`] is persisted externally and fed back through
/// [`Grid::resolve_commit`].
#[derive(Debug)]
pub struct Grid {
    model: CoordinateModel,
    viewport_width: f64,
    items: Vec<Item>,
    editing: bool,
    phase: DragPhase,
    canvas: CanvasRenderer,
}

impl Grid {
    pub fn new(model: CoordinateModel, viewport_width: f64) -> Self {
        let mut grid = Self {
            model,
            viewport_width,
            items: Vec::new(),
            editing: false,
            phase: DragPhase::Idle,
            canvas: CanvasRenderer::new(),
        };
        grid.refresh();
        grid
    }

    pub fn model(&self) -> &CoordinateModel {
        &self.model
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn overlay_dims(&self) -> OverlayDims {
        self.model.resolve_overlay_dims(self.viewport_width)
    }

    pub fn frame(&self) -> &CanvasFrame {
        self.canvas.frame()
    }

    pub fn canvas(&self) -> &CanvasRenderer {
        &self.canvas
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.phase, DragPhase::Committing(_))
    }

    /// Copy of the committed item list.
    pub fn items(&self) -> Vec<Item> {
        self.items.clone()
    }

    /// Replace the committed item list. A drag on the old list is dropped;
    /// a pending commit refuses the swap.
    pub fn set_items(&mut self, items: Vec<Item>) -> Result<(), GridError> {
        if self.is_saving() {
            return Err(GridError::CommitInFlight);
        }
        if let DragPhase::Dragging(session) = std::mem::replace(&mut self.phase, DragPhase::Idle) {
            tracing::debug!(item_id = %session.item_id, "Item list replaced, drag discarded");
        }
        self.items = items;
        self.refresh();
        Ok(())
    }

    pub fn set_edit_mode(&mut self, editing: bool) {
        self.editing = editing;
        self.canvas
            .render_overlay(&self.model, editing, self.viewport_width);
    }

    pub fn resize(&mut self, viewport_width: f64) {
        self.viewport_width = viewport_width;
        self.canvas
            .update_size(&self.model, &self.items, viewport_width);
        if self.editing {
            self.render_all();
        }
    }

    // Idle -> Dragging
    pub fn pointer_down(&mut self, ev: PointerDown<'_>) -> Result<(), GridError> {
        if !self.editing {
            return Err(GridError::NotEditing);
        }
        match self.phase {
            DragPhase::Committing(_) => return Err(GridError::CommitInFlight),
            DragPhase::Dragging(_) => return Err(GridError::DragInProgress),
            DragPhase::Idle => {}
        }
        if ev.button != PointerButton::Primary {
            return Err(GridError::NotPrimaryButton);
        }

        let item = self
            .items
            .iter()
            .find(|it| it.id == ev.item_id)
            .ok_or_else(|| GridError::UnknownItem(ev.item_id.to_string()))?;
        let item_box = self
            .frame()
            .item_box(ev.item_id)
            .ok_or_else(|| GridError::UnknownItem(ev.item_id.to_string()))?
            .rect;

        let grab = PixelPoint::new(
            ev.client.x - (ev.canvas_origin.x + item_box.left),
            ev.client.y - (ev.canvas_origin.y + item_box.top),
        );
        let session = DragSession {
            item_id: item.id.clone(),
            start: item.rect(),
            grab,
            canvas_origin: ev.canvas_origin,
            preview: None,
        };

        tracing::debug!(item_id = %session.item_id, start = ?session.start, "Drag started");
        self.canvas.set_dragging(ev.item_id, true);
        self.phase = DragPhase::Dragging(session);
        Ok(())
    }

    /// Returns the snapped preview, or `None` if `item_id` is not being dragged.
    pub fn pointer_move(&mut self, item_id: &str, client: PixelPoint) -> Option<GridRect> {
        let DragPhase::Dragging(session) = &mut self.phase else {
            return None;
        };
        if session.item_id != item_id {
            return None;
        }
        let preview = session.track(&self.model, client, self.viewport_width);
        self.canvas
            .place_item(&self.model, item_id, &preview, self.viewport_width);
        Some(preview)
    }

    // Dragging -> Committing, or hard revert back to Idle
    pub fn pointer_up(&mut self, item_id: &str) -> DragRelease {
        let session = match std::mem::replace(&mut self.phase, DragPhase::Idle) {
            DragPhase::Dragging(session) if session.item_id == item_id => session,
            other => {
                self.phase = other;
                return DragRelease::Ignored;
            }
        };
        self.canvas.set_dragging(item_id, false);

        let Some(idx) = self.items.iter().position(|it| it.id == item_id) else {
            return DragRelease::Ignored;
        };

        let candidate = session.candidate();
        if collides(&candidate, &self.items, Some(item_id)) {
            tracing::debug!(%item_id, ?candidate, "Drop overlaps another item, reverting");
            self.canvas
                .place_item(&self.model, item_id, &session.start, self.viewport_width);
            return DragRelease::Reverted {
                item_id: item_id.to_string(),
                candidate,
            };
        }

        let mut next_items = self.items.clone();
        next_items[idx].set_position(candidate.x, candidate.y);

        let kind = CommitKind::Move {
            item_id: item_id.to_string(),
            start: session.start,
        };
        self.phase = DragPhase::Committing(kind.clone());
        DragRelease::Commit(CommitRequest { kind, next_items })
    }

    pub fn pointer_cancel(&mut self, item_id: &str) {
        let DragPhase::Dragging(session) = &self.phase else {
            return;
        };
        if session.item_id != item_id {
            return;
        }
        let start = session.start;
        self.canvas
            .place_item(&self.model, item_id, &start, self.viewport_width);
        self.canvas.set_dragging(item_id, false);
        self.phase = DragPhase::Idle;
        tracing::debug!(%item_id, "Drag cancelled");
    }

    /// Validate a new item and enter the committing phase.
    pub fn add_item(&mut self, item: Item) -> Result<CommitRequest, GridError> {
        match self.phase {
            DragPhase::Committing(_) => return Err(GridError::CommitInFlight),
            DragPhase::Dragging(_) => return Err(GridError::DragInProgress),
            DragPhase::Idle => {}
        }
        if self.items.iter().any(|it| it.id == item.id) {
            return Err(GridError::DuplicateItem(item.id));
        }
        if collides(&item.rect(), &self.items, None) {
            return Err(GridError::PlacementConflict {
                item_id: item.id.clone(),
                rect: item.rect(),
            });
        }

        let mut next_items = self.items.clone();
        let kind = CommitKind::Add {
            item_id: item.id.clone(),
        };
        next_items.push(item);
        self.phase = DragPhase::Committing(kind.clone());
        Ok(CommitRequest { kind, next_items })
    }

    /// Committing -> Idle. On success the request's items become the truth;
    /// on failure visuals go back to the pre-gesture placement.
    pub fn resolve_commit(
        &mut self,
        request: CommitRequest,
        outcome: Result<(), PersistenceError>,
    ) -> Result<(), GridError> {
        let DragPhase::Committing(kind) = std::mem::replace(&mut self.phase, DragPhase::Idle) else {
            return Err(GridError::NoPendingCommit);
        };
        if request.kind != kind {
            self.phase = DragPhase::Committing(kind);
            return Err(GridError::StaleCommit);
        }

        match outcome {
            Ok(()) => {
                self.items = request.next_items;
                self.refresh();
                tracing::debug!(?kind, "Layout committed");
                Ok(())
            }
            Err(e) => {
                if let CommitKind::Move { item_id, start } = &kind {
                    self.canvas
                        .place_item(&self.model, item_id, start, self.viewport_width);
                }
                tracing::warn!(?kind, error = %e, "Layout commit failed, rolled back");
                Err(GridError::Persistence(e))
            }
        }
    }

    pub fn container(&self, item_id: &str) -> Option<WidgetContainer> {
        self.canvas.container(item_id)
    }

    fn refresh(&mut self) {
        self.canvas
            .update_size(&self.model, &self.items, self.viewport_width);
        self.render_all();
    }

    fn render_all(&mut self) {
        self.canvas
            .render_all(&self.model, &self.items, self.editing, self.viewport_width);
    }
}

impl ContainerLookup for Grid {
    fn container(&self, item_id: &str) -> Option<WidgetContainer> {
        self.canvas.container(item_id)
    }
}
