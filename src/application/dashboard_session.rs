// Dashboard session - Ties gestures, persistence and widget hosting together
use crate::application::dashboard_store::DashboardStore;
use crate::application::drag_controller::{DragRelease, GridError};
use crate::application::grid::Grid;
use crate::application::persistence_gateway::{PersistenceError, PersistenceGateway};
use crate::application::widget_host::{SyncReport, WidgetHost};
use crate::application::widget_registry::{WidgetError, validate_config};
use crate::domain::collision::first_free_slot;
use crate::domain::dashboard::{DashboardsDocument, RemoveOutcome};
use crate::domain::item::{GridRect, Item};
use crate::domain::range::{RangePreset, RangeSelector};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Widget(#[from] WidgetError),

    #[error("no active dashboard")]
    NoActiveDashboard,

    #[error("unknown dashboard {0}")]
    UnknownDashboard(String),

    #[error("dashboard name must not be empty")]
    EmptyName,

    #[error("the name {0} is already in use")]
    NameInUse(String),

    #[error("invalid range: 'to' must be after 'from'")]
    InvalidRange,
}

/// Result of releasing a dragged item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Ignored,
    Reverted,
    Committed,
}

/// One open dashboards document. All mutations persist the full next
/// document first and only then touch local state.
pub struct DashboardSession {
    store: DashboardStore,
    grid: Grid,
    host: WidgetHost,
}

impl DashboardSession {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, grid: Grid, host: WidgetHost) -> Self {
        Self {
            store: DashboardStore::new(gateway),
            grid,
            host,
        }
    }

    pub fn snapshot(&self) -> Arc<DashboardsDocument> {
        self.store.snapshot()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Pointer down/move/cancel go straight to the grid.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn host(&self) -> &WidgetHost {
        &self.host
    }

    pub async fn boot(&mut self) -> Result<(), SessionError> {
        let snapshot = self.store.reload().await?;
        tracing::info!(
            dashboards = snapshot.dashboards.len(),
            active_id = %snapshot.active_id,
            "Dashboards loaded"
        );
        self.render_active_dashboard()?;
        self.grid.set_edit_mode(false);
        Ok(())
    }

    pub fn set_edit_mode(&mut self, editing: bool) {
        self.grid.set_edit_mode(editing);
    }

    pub fn resize(&mut self, viewport_width: f64) {
        self.grid.resize(viewport_width);
        self.sync_widgets();
    }

    pub fn sync_widgets(&mut self) -> SyncReport {
        let snapshot = self.store.snapshot();
        let items = self.grid.items();
        self.host.sync(&items, &self.grid, &snapshot)
    }

    pub async fn pointer_up(&mut self, item_id: &str) -> Result<DropOutcome, SessionError> {
        match self.grid.pointer_up(item_id) {
            DragRelease::Ignored => Ok(DropOutcome::Ignored),
            DragRelease::Reverted { .. } => Ok(DropOutcome::Reverted),
            DragRelease::Commit(request) => {
                let outcome = self.persist_items(request.next_items.clone()).await;
                self.grid.resolve_commit(request, outcome)?;
                self.sync_widgets();
                Ok(DropOutcome::Committed)
            }
        }
    }

    /// Add a widget of `kind` at the first free overlay slot; returns its id.
    /// `config` is merged over the module defaults before validation.
    pub async fn add_widget(
        &mut self,
        kind: &str,
        config: Map<String, Value>,
    ) -> Result<String, SessionError> {
        let module = self
            .host
            .registry()
            .get(kind)
            .ok_or_else(|| WidgetError::UnknownWidgetType(kind.to_string()))?;

        let snapshot = self.store.snapshot();
        let dashboard = snapshot
            .active_dashboard()
            .ok_or(SessionError::NoActiveDashboard)?;
        let id = dashboard.next_widget_id();

        let mut item = self.host.registry().default_item(id.clone(), kind, config)?;
        validate_config(module.meta(), &item.config)?;
        let slot = self.free_slot(&item);
        item.set_position(slot.x, slot.y);

        let request = self.grid.add_item(item)?;
        let outcome = self.persist_items(request.next_items.clone()).await;
        self.grid.resolve_commit(request, outcome)?;
        self.sync_widgets();

        tracing::info!(%id, %kind, "Widget added");
        Ok(id)
    }

    pub async fn select_dashboard(&mut self, id: &str) -> Result<(), SessionError> {
        let mut next = (*self.store.snapshot()).clone();
        if !next.set_active(id) {
            return Err(SessionError::UnknownDashboard(id.to_string()));
        }
        self.store.commit(next).await?;
        self.render_active_dashboard()?;
        Ok(())
    }

    pub async fn rename_dashboard(&mut self, id: &str, name: &str) -> Result<(), SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }

        let mut next = (*self.store.snapshot()).clone();
        if next.name_in_use(name, id) {
            return Err(SessionError::NameInUse(name.to_string()));
        }
        if !next.rename_dashboard(id, name) {
            return Err(SessionError::UnknownDashboard(id.to_string()));
        }
        self.store.commit(next).await?;
        Ok(())
    }

    /// Deleting the last dashboard resets it instead.
    pub async fn delete_dashboard(&mut self, id: &str) -> Result<RemoveOutcome, SessionError> {
        let mut next = (*self.store.snapshot()).clone();
        let outcome = next.remove_dashboard(id);
        if outcome == RemoveOutcome::NotFound {
            return Err(SessionError::UnknownDashboard(id.to_string()));
        }
        self.store.commit(next).await?;
        self.render_active_dashboard()?;
        Ok(outcome)
    }

    pub async fn create_dashboard(&mut self, name: &str) -> Result<String, SessionError> {
        let id = self.store.gateway().create_dashboard(name).await?;
        self.store.reload().await?;
        self.render_active_dashboard()?;
        Ok(id)
    }

    pub async fn set_range_preset(&mut self, preset: RangePreset) -> Result<RangeSelector, SessionError> {
        let range = RangeSelector::preset(preset, chrono::Utc::now().timestamp_millis());
        self.commit_range(range).await
    }

    pub async fn apply_custom_range(
        &mut self,
        from_ts_ms: i64,
        to_ts_ms: i64,
    ) -> Result<RangeSelector, SessionError> {
        let range = RangeSelector::custom(from_ts_ms, to_ts_ms).ok_or(SessionError::InvalidRange)?;
        self.commit_range(range).await
    }

    async fn commit_range(&mut self, range: RangeSelector) -> Result<RangeSelector, SessionError> {
        let next = self
            .store
            .snapshot()
            .with_active_range(Some(range.clone()))
            .ok_or(SessionError::NoActiveDashboard)?;
        self.store.commit(next).await?;
        self.sync_widgets();
        Ok(range)
    }

    async fn persist_items(&mut self, items: Vec<Item>) -> Result<(), PersistenceError> {
        let next = self
            .store
            .snapshot()
            .with_active_items(items)
            .ok_or_else(|| PersistenceError::Unavailable("no active dashboard".to_string()))?;
        self.store.commit(next).await.map(|_| ())
    }

    fn render_active_dashboard(&mut self) -> Result<(), GridError> {
        let items = self
            .store
            .snapshot()
            .active_dashboard()
            .map(|d| d.items.clone())
            .unwrap_or_default();
        self.grid.set_items(items)?;
        self.sync_widgets();
        Ok(())
    }

    // Inside the overlay if possible, else below everything placed.
    fn free_slot(&self, item: &Item) -> GridRect {
        let dims = self.grid.overlay_dims();
        let items = self.grid.items();
        first_free_slot(&items, item.w, item.h, dims.cols, dims.rows).unwrap_or_else(|| {
            let bottom = items.iter().map(|it| it.rect().bottom()).max().unwrap_or(0);
            GridRect::new(0, bottom, item.w, item.h)
        })
    }
}
