// Dashboard and persisted document domain model
use serde::{Deserialize, Serialize};

use super::item::Item;
use super::range::RangeSelector;

pub const DEFAULT_DASHBOARD_ID: &str = "d1";
pub const DEFAULT_DASHBOARD_NAME: &str = "Main";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeSelector>,
}

impl Dashboard {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            items: Vec::new(),
            range: None,
        }
    }

    /// Smallest `w{n}` id not already taken.
    pub fn next_widget_id(&self) -> String {
        (1..)
            .map(|n| format!("w{n}"))
            .find(|candidate| !self.items.iter().any(|it| &it.id == candidate))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// Last dashboard; reset in place instead.
    ResetLast,
    NotFound,
}

/// Root persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardsDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub active_id: String,
    pub dashboards: Vec<Dashboard>,
}

fn default_version() -> u32 {
    1
}

impl Default for DashboardsDocument {
    fn default() -> Self {
        Self {
            version: 1,
            active_id: DEFAULT_DASHBOARD_ID.to_string(),
            dashboards: vec![Dashboard::new(DEFAULT_DASHBOARD_ID, DEFAULT_DASHBOARD_NAME)],
        }
    }
}

impl DashboardsDocument {
    pub fn dashboard(&self, id: &str) -> Option<&Dashboard> {
        self.dashboards.iter().find(|d| d.id == id)
    }

    pub fn active_dashboard(&self) -> Option<&Dashboard> {
        self.dashboard(&self.active_id)
    }

    pub fn active_dashboard_mut(&mut self) -> Option<&mut Dashboard> {
        let active_id = self.active_id.clone();
        self.dashboards.iter_mut().find(|d| d.id == active_id)
    }

    pub fn rename_dashboard(&mut self, id: &str, name: &str) -> bool {
        match self.dashboards.iter_mut().find(|d| d.id == id) {
            Some(d) => {
                d.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Case-insensitive, whitespace-trimmed name clash against other dashboards.
    pub fn name_in_use(&self, name: &str, except_id: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        self.dashboards
            .iter()
            .any(|d| d.id != except_id && d.name.trim().to_lowercase() == wanted)
    }

    pub fn set_active(&mut self, id: &str) -> bool {
        if self.dashboard(id).is_none() {
            return false;
        }
        self.active_id = id.to_string();
        true
    }

    /// Never drops below one dashboard: the last one is reset to "Main".
    pub fn remove_dashboard(&mut self, id: &str) -> RemoveOutcome {
        let Some(idx) = self.dashboards.iter().position(|d| d.id == id) else {
            return RemoveOutcome::NotFound;
        };

        if self.dashboards.len() == 1 {
            let d = &mut self.dashboards[0];
            d.items.clear();
            d.name = DEFAULT_DASHBOARD_NAME.to_string();
            d.range = None;
            return RemoveOutcome::ResetLast;
        }

        self.dashboards.remove(idx);
        if self.active_id == id {
            self.active_id = self.dashboards[0].id.clone();
        }
        RemoveOutcome::Removed
    }

    /// Next document with the active dashboard's items replaced.
    pub fn with_active_items(&self, items: Vec<Item>) -> Option<Self> {
        let mut next = self.clone();
        next.active_dashboard_mut()?.items = items;
        Some(next)
    }

    /// Next document with the active dashboard's range replaced.
    pub fn with_active_range(&self, range: Option<RangeSelector>) -> Option<Self> {
        let mut next = self.clone();
        next.active_dashboard_mut()?.range = range;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::GridRect;

    fn doc_with(ids: &[&str]) -> DashboardsDocument {
        DashboardsDocument {
            version: 1,
            active_id: ids[0].to_string(),
            dashboards: ids.iter().map(|id| Dashboard::new(*id, id.to_uppercase())).collect(),
        }
    }

    #[test]
    fn test_next_widget_id_fills_gaps() {
        let mut d = Dashboard::new("d1", "Main");
        assert_eq!(d.next_widget_id(), "w1");
        d.items.push(Item::new("w1", "value1x1", GridRect::new(0, 0, 1, 1)));
        d.items.push(Item::new("w3", "value1x1", GridRect::new(1, 0, 1, 1)));
        assert_eq!(d.next_widget_id(), "w2");
    }

    #[test]
    fn test_last_dashboard_is_reset_not_removed() {
        let mut doc = DashboardsDocument::default();
        doc.dashboards[0].name = "Renamed".to_string();
        doc.dashboards[0]
            .items
            .push(Item::new("w1", "value1x1", GridRect::new(0, 0, 1, 1)));

        assert_eq!(doc.remove_dashboard("d1"), RemoveOutcome::ResetLast);
        assert_eq!(doc.dashboards.len(), 1);
        assert_eq!(doc.dashboards[0].name, "Main");
        assert!(doc.dashboards[0].items.is_empty());
        assert_eq!(doc.active_id, "d1");
    }

    #[test]
    fn test_removing_active_moves_active_to_first() {
        let mut doc = doc_with(&["a", "b", "c"]);
        doc.set_active("b");
        assert_eq!(doc.remove_dashboard("b"), RemoveOutcome::Removed);
        assert_eq!(doc.active_id, "a");
        assert_eq!(doc.remove_dashboard("zzz"), RemoveOutcome::NotFound);
        assert_eq!(doc.dashboards.len(), 2);
    }

    #[test]
    fn test_with_active_items_leaves_other_dashboards_untouched() {
        let mut doc = doc_with(&["a", "b"]);
        doc.dashboards[1]
            .items
            .push(Item::new("w9", "gauge3x3", GridRect::new(0, 0, 3, 3)));
        let items = vec![Item::new("w1", "value1x1", GridRect::new(5, 5, 1, 1))];

        let next = doc.with_active_items(items.clone()).unwrap();
        assert_eq!(next.dashboards[0].items, items);
        assert_eq!(next.dashboards[1], doc.dashboards[1]);
        assert!(doc.dashboards[0].items.is_empty());
    }

    #[test]
    fn test_name_in_use_is_case_insensitive() {
        let doc = doc_with(&["a", "b"]);
        assert!(doc.name_in_use("  b ", "a"));
        assert!(!doc.name_in_use("A", "a"));
    }

    #[test]
    fn test_document_wire_format() {
        let doc: DashboardsDocument =
            serde_json::from_str(r#"{"activeId":"d1","dashboards":[{"id":"d1","name":"Main","items":[]}]}"#)
                .unwrap();
        assert_eq!(doc, DashboardsDocument::default());

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["activeId"], "d1");
        assert!(json["dashboards"][0].get("range").is_none());

        assert!(serde_json::from_str::<DashboardsDocument>(r#"{"activeId":"d1"}"#).is_err());
    }
}
