// Canvas renderer - Derives the visual frame from items and viewport
use crate::domain::coordinates::{CoordinateModel, Padding, PixelPoint, PixelRect, PixelSize};
use crate::domain::item::{GridRect, Item};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct ContainerInner {
    id: u64,
    item_id: String,
    body: Mutex<Value>,
}

/// Render target handed to a widget module. Every full render issues new
/// containers, so identity tells the widget host whether to remount.
#[derive(Debug, Clone)]
pub struct WidgetContainer {
    inner: Arc<ContainerInner>,
}

impl WidgetContainer {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
                item_id: item_id.into(),
                body: Mutex::new(Value::Null),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn item_id(&self) -> &str {
        &self.inner.item_id
    }

    pub fn same_as(&self, other: &WidgetContainer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn clear(&self) {
        *self.body() = Value::Null;
    }

    pub fn render(&self, view: Value) {
        *self.body() = view;
    }

    /// Mutate the current view in place.
    pub fn patch(&self, f: impl FnOnce(&mut Value)) {
        f(&mut self.body());
    }

    pub fn content(&self) -> Value {
        self.body().clone()
    }

    fn body(&self) -> MutexGuard<'_, Value> {
        self.inner
            .body
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Lookup of the live container for an item.
pub trait ContainerLookup {
    fn container(&self, item_id: &str) -> Option<WidgetContainer>;
}

impl ContainerLookup for HashMap<String, WidgetContainer> {
    fn container(&self, item_id: &str) -> Option<WidgetContainer> {
        self.get(item_id).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemBox {
    pub item_id: String,
    pub rect: PixelRect,
    pub dragging: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CanvasFrame {
    pub size: PixelSize,
    pub padding: Padding,
    pub cell: f64,
    pub cell_inset: f64,
    pub editing: bool,
    pub overlay: Vec<PixelRect>,
    pub items: Vec<ItemBox>,
}

impl CanvasFrame {
    pub fn item_box(&self, item_id: &str) -> Option<&ItemBox> {
        self.items.iter().find(|b| b.item_id == item_id)
    }
}

#[derive(Debug, Default)]
pub struct CanvasRenderer {
    frame: CanvasFrame,
    containers: HashMap<String, WidgetContainer>,
    generation: u64,
}

impl CanvasRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> &CanvasFrame {
        &self.frame
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn containers(&self) -> &HashMap<String, WidgetContainer> {
        &self.containers
    }

    pub fn update_size(&mut self, model: &CoordinateModel, items: &[Item], viewport_width: f64) {
        self.frame.size = model.canvas_extent(items, viewport_width);
        self.frame.padding = model.resolve_padding(viewport_width);
        self.frame.cell = model.cell;
        self.frame.cell_inset = model.cell_inset;
    }

    /// Snap cells; only populated in edit mode.
    pub fn render_overlay(&mut self, model: &CoordinateModel, editing: bool, viewport_width: f64) {
        self.frame.editing = editing;
        self.frame.overlay.clear();
        if !editing {
            return;
        }

        let dims = model.resolve_overlay_dims(viewport_width);
        for y in 0..dims.rows {
            for x in 0..dims.cols {
                let PixelPoint { x: left, y: top } = model.cell_to_pixel(x, y, viewport_width);
                self.frame.overlay.push(PixelRect {
                    left,
                    top,
                    width: model.cell,
                    height: model.cell,
                });
            }
        }
    }

    /// Rebuild every item box and issue fresh containers.
    pub fn render_all(
        &mut self,
        model: &CoordinateModel,
        items: &[Item],
        editing: bool,
        viewport_width: f64,
    ) {
        self.render_overlay(model, editing, viewport_width);

        self.frame.items = items
            .iter()
            .map(|it| ItemBox {
                item_id: it.id.clone(),
                rect: model.item_box(&it.rect(), viewport_width),
                dragging: false,
            })
            .collect();

        self.containers = items
            .iter()
            .map(|it| (it.id.clone(), WidgetContainer::new(it.id.clone())))
            .collect();
        self.generation += 1;

        tracing::trace!(
            generation = self.generation,
            items = items.len(),
            "Canvas re-rendered"
        );
    }

    /// Move one item's visual box without touching item data.
    pub fn place_item(
        &mut self,
        model: &CoordinateModel,
        item_id: &str,
        rect: &GridRect,
        viewport_width: f64,
    ) {
        if let Some(item_box) = self.frame.items.iter_mut().find(|b| b.item_id == item_id) {
            item_box.rect = model.item_box(rect, viewport_width);
        }
    }

    pub fn set_dragging(&mut self, item_id: &str, dragging: bool) {
        if let Some(item_box) = self.frame.items.iter_mut().find(|b| b.item_id == item_id) {
            item_box.dragging = dragging;
        }
    }
}

impl ContainerLookup for CanvasRenderer {
    fn container(&self, item_id: &str) -> Option<WidgetContainer> {
        self.containers.get(item_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coordinates::OverlayBreakpoint;
    use serde_json::json;

    fn model() -> CoordinateModel {
        CoordinateModel {
            overlay_breakpoints: vec![OverlayBreakpoint {
                max_width: 1000.0,
                cols: 4,
                rows: 3,
            }],
            padding: Padding::uniform(10.0),
            ..CoordinateModel::default()
        }
    }

    #[test]
    fn test_overlay_hidden_outside_edit_mode() {
        let mut canvas = CanvasRenderer::new();
        canvas.render_overlay(&model(), false, 800.0);
        assert!(canvas.frame().overlay.is_empty());

        canvas.render_overlay(&model(), true, 800.0);
        assert_eq!(canvas.frame().overlay.len(), 12);
        assert_eq!(canvas.frame().overlay[5].left, 10.0 + 80.0);
        assert_eq!(canvas.frame().overlay[5].top, 10.0 + 80.0);
    }

    #[test]
    fn test_render_all_issues_fresh_containers() {
        let items = vec![Item::new("w1", "value1x1", GridRect::new(1, 1, 2, 2))];
        let mut canvas = CanvasRenderer::new();
        canvas.render_all(&model(), &items, false, 800.0);
        let first = canvas.container("w1").unwrap();

        canvas.render_all(&model(), &items, false, 800.0);
        let second = canvas.container("w1").unwrap();

        assert!(!first.same_as(&second));
        assert_eq!(canvas.generation(), 2);
        assert!(canvas.container("w2").is_none());

        let item_box = canvas.frame().item_box("w1").unwrap();
        assert_eq!(item_box.rect.left, 90.0);
        assert_eq!(item_box.rect.width, 160.0);
    }

    #[test]
    fn test_place_item_moves_only_the_box() {
        let items = vec![Item::new("w1", "value1x1", GridRect::new(0, 0, 1, 1))];
        let mut canvas = CanvasRenderer::new();
        canvas.render_all(&model(), &items, true, 800.0);
        canvas.place_item(&model(), "w1", &GridRect::new(2, 1, 1, 1), 800.0);

        let item_box = canvas.frame().item_box("w1").unwrap();
        assert_eq!((item_box.rect.left, item_box.rect.top), (170.0, 90.0));
    }

    #[test]
    fn test_container_content() {
        let container = WidgetContainer::new("w1");
        assert_eq!(container.content(), Value::Null);
        container.render(json!({"value": 3}));
        container.patch(|v| v["title"] = json!("t"));
        assert_eq!(container.content(), json!({"value": 3, "title": "t"}));
        container.clear();
        assert_eq!(container.content(), Value::Null);
    }
}
