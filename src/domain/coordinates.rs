// Pixel <-> cell coordinate model with responsive breakpoints
use serde::{Deserialize, Serialize};

use super::item::{GridRect, Item};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn origin(&self) -> PixelPoint {
        PixelPoint::new(self.left, self.top)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPoint {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayDims {
    pub cols: u32,
    pub rows: u32,
}

/// Padding insets; sides left out of config resolve to 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Padding {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub bottom: f64,
}

impl Padding {
    pub fn uniform(px: f64) -> Self {
        Self {
            left: px,
            right: px,
            top: px,
            bottom: px,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayBreakpoint {
    pub max_width: f64,
    pub cols: u32,
    pub rows: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddingBreakpoint {
    pub max_width: f64,
    #[serde(default)]
    pub padding: Padding,
}

/// Static grid geometry: fixed cell size, breakpoint tables and fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoordinateModel {
    pub cell: f64,
    pub cols: u32,
    pub cell_inset: f64,
    pub overlay_cols: u32,
    pub overlay_rows: u32,
    pub overlay_breakpoints: Vec<OverlayBreakpoint>,
    pub padding: Padding,
    pub padding_breakpoints: Vec<PaddingBreakpoint>,
}

impl Default for CoordinateModel {
    fn default() -> Self {
        Self {
            cell: 80.0,
            cols: 40,
            cell_inset: 4.0,
            overlay_cols: 40,
            overlay_rows: 12,
            overlay_breakpoints: Vec::new(),
            padding: Padding::uniform(12.0),
            padding_breakpoints: Vec::new(),
        }
    }
}

impl CoordinateModel {
    pub fn resolve_overlay_dims(&self, viewport_width: f64) -> OverlayDims {
        self.overlay_breakpoints
            .iter()
            .find(|bp| viewport_width <= bp.max_width)
            .map(|bp| OverlayDims {
                cols: bp.cols,
                rows: bp.rows,
            })
            .unwrap_or(OverlayDims {
                cols: self.overlay_cols,
                rows: self.overlay_rows,
            })
    }

    pub fn resolve_padding(&self, viewport_width: f64) -> Padding {
        self.padding_breakpoints
            .iter()
            .find(|bp| viewport_width <= bp.max_width)
            .map(|bp| bp.padding)
            .unwrap_or(self.padding)
    }

    pub fn cell_to_pixel(&self, x: u32, y: u32, viewport_width: f64) -> PixelPoint {
        let pad = self.resolve_padding(viewport_width);
        PixelPoint::new(
            pad.left + f64::from(x) * self.cell,
            pad.top + f64::from(y) * self.cell,
        )
    }

    /// Canvas-relative pixel to the nearest cell, clamped so a `w`x`h` item
    /// stays inside the resolved overlay.
    pub fn pixel_to_cell(&self, px: PixelPoint, w: u32, h: u32, viewport_width: f64) -> CellPoint {
        let pad = self.resolve_padding(viewport_width);
        let dims = self.resolve_overlay_dims(viewport_width);
        let max_x = dims.cols.saturating_sub(w);
        let max_y = dims.rows.saturating_sub(h);
        CellPoint {
            x: snap(px.x - pad.left, self.cell, max_x),
            y: snap(px.y - pad.top, self.cell, max_y),
        }
    }

    pub fn item_box(&self, rect: &GridRect, viewport_width: f64) -> PixelRect {
        let origin = self.cell_to_pixel(rect.x, rect.y, viewport_width);
        PixelRect {
            left: origin.x,
            top: origin.y,
            width: f64::from(rect.w) * self.cell,
            height: f64::from(rect.h) * self.cell,
        }
    }

    /// Grows past the nominal grid to fit placed items.
    pub fn canvas_extent(&self, items: &[Item], viewport_width: f64) -> PixelSize {
        let pad = self.resolve_padding(viewport_width);
        let dims = self.resolve_overlay_dims(viewport_width);

        let max_right = items.iter().map(|it| it.rect().right()).max().unwrap_or(0);
        let max_bottom = items.iter().map(|it| it.rect().bottom()).max().unwrap_or(0);

        let needed_cols = self.cols.max(max_right.saturating_add(1));
        let needed_rows = dims.rows.max(max_bottom.saturating_add(1));

        PixelSize {
            width: f64::from(needed_cols) * self.cell + pad.left + pad.right,
            height: f64::from(needed_rows) * self.cell + pad.top + pad.bottom,
        }
    }
}

fn snap(offset: f64, cell: f64, max: u32) -> u32 {
    let cells = (offset / cell).round();
    if !cells.is_finite() || cells <= 0.0 {
        return 0;
    }
    (cells as u32).min(max)
}
