// Grid item domain model
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Grid-cell aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn moved_to(&self, x: u32, y: u32) -> Self {
        Self { x, y, ..*self }
    }
}

/// A placed, sized, typed widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub x: u32,
    pub y: u32,
    #[serde(default = "one")]
    pub w: u32,
    #[serde(default = "one")]
    pub h: u32,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

fn one() -> u32 {
    1
}

fn default_kind() -> String {
    "value1x1".to_string()
}

impl Item {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, rect: GridRect) -> Self {
        Self {
            id: id.into(),
            x: rect.x,
            y: rect.y,
            w: rect.w.max(1),
            h: rect.h.max(1),
            kind: kind.into(),
            config: Map::new(),
        }
    }

    pub fn with_config(mut self, config: Map<String, Value>) -> Self {
        self.config = config;
        self
    }

    pub fn rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.w, self.h)
    }

    pub fn set_position(&mut self, x: u32, y: u32) {
        self.x = x;
        self.y = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_wire_format() {
        let json = r#"{"id":"w1","x":2,"y":3,"w":6,"h":4,"type":"linechart6x4","config":{"title":"Temp"}}"#;
        let item: Item = serde_json::from_str(json).unwrap();

        assert_eq!(item.kind, "linechart6x4");
        assert_eq!(item.rect(), GridRect::new(2, 3, 6, 4));
        assert_eq!(item.config["title"], "Temp");

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["type"], "linechart6x4");
        assert!(back.get("kind").is_none());
    }

    #[test]
    fn test_missing_type_defaults_to_value_tile() {
        let item: Item = serde_json::from_str(r#"{"id":"w1","x":0,"y":0}"#).unwrap();
        assert_eq!(item.kind, "value1x1");
        assert_eq!((item.w, item.h), (1, 1));
        assert!(item.config.is_empty());
    }
}
