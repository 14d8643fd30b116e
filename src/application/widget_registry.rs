// Widget registry - Pluggable widget modules keyed by type tag
use crate::application::canvas::WidgetContainer;
use crate::domain::dashboard::{Dashboard, DashboardsDocument};
use crate::domain::item::Item;
use crate::domain::range::RangeSelector;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum WidgetError {
    #[error("unknown widget type {0}")]
    UnknownWidgetType(String),

    #[error("field {0} is required")]
    MissingField(String),

    #[error("field {field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("field {0} must be a number")]
    NotANumber(String),

    #[error("field {field} needs {partner} as well")]
    IncompletePair { field: String, partner: String },

    #[error("field {field} accepts at most {max} entries")]
    TooManyEntries { field: String, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WidgetSize {
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Select,
    Ranges,
    ColorRanges,
    Sources,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

/// Editable config field consumed by the add-widget form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<&'static str>,
    /// Optional field that must be filled together with this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paired_with: Option<&'static str>,
}

impl FieldSpec {
    pub fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: false,
            max: None,
            options: Vec::new(),
            help: None,
            paired_with: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub fn paired_with(mut self, partner: &'static str) -> Self {
        self.paired_with = Some(partner);
        self
    }

    pub fn options<V: Into<Value>>(mut self, options: impl IntoIterator<Item = (V, &'static str)>) -> Self {
        self.options = options
            .into_iter()
            .map(|(value, label)| SelectOption {
                value: value.into(),
                label: label.to_string(),
            })
            .collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetMeta {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: &'static str,
    pub size: WidgetSize,
    pub defaults: Map<String, Value>,
    pub fields: Vec<FieldSpec>,
}

/// Shared services handed to every widget.
#[derive(Debug, Clone)]
pub struct WidgetServices {
    pub http: reqwest::Client,
    pub base_url: reqwest::Url,
}

impl WidgetServices {
    pub fn new(base_url: reqwest::Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }
}

/// What a widget sees on mount and update.
#[derive(Debug, Clone)]
pub struct WidgetContext {
    pub item: Item,
    pub document: Arc<DashboardsDocument>,
    pub services: Arc<WidgetServices>,
}

impl WidgetContext {
    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.document.active_dashboard()
    }

    /// Dashboard-wide time range, if set and well-formed.
    pub fn dashboard_range(&self) -> Option<RangeSelector> {
        self.dashboard()
            .and_then(|d| d.range.clone())
            .filter(RangeSelector::is_usable)
    }
}

/// Live widget state owned by the host.
pub trait WidgetInstance: Send {
    fn update(&mut self, ctx: WidgetContext);

    /// Release timers, in-flight requests and render state. Idempotent.
    fn unmount(&mut self);
}

pub trait WidgetModule: Send + Sync {
    fn meta(&self) -> &WidgetMeta;

    fn mount(&self, container: &WidgetContainer, ctx: WidgetContext) -> Box<dyn WidgetInstance>;

    fn update(&self, instance: &mut dyn WidgetInstance, ctx: WidgetContext) {
        instance.update(ctx);
    }

    fn unmount(&self, instance: &mut dyn WidgetInstance) {
        instance.unmount();
    }
}

#[derive(Clone, Default)]
pub struct WidgetRegistry {
    modules: BTreeMap<&'static str, Arc<dyn WidgetModule>>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: Arc<dyn WidgetModule>) {
        let kind = module.meta().kind;
        if self.modules.insert(kind, module).is_some() {
            tracing::warn!(%kind, "Widget module replaced");
        }
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn WidgetModule>> {
        self.modules.get(kind).cloned()
    }

    pub fn metas(&self) -> Vec<&WidgetMeta> {
        self.modules.values().map(|m| m.meta()).collect()
    }

    /// Item skeleton (size, type, defaults merged with `config`) at the origin.
    pub fn default_item(
        &self,
        id: impl Into<String>,
        kind: &str,
        config: Map<String, Value>,
    ) -> Result<Item, WidgetError> {
        let module = self
            .get(kind)
            .ok_or_else(|| WidgetError::UnknownWidgetType(kind.to_string()))?;
        let meta = module.meta();

        let mut merged = meta.defaults.clone();
        merged.extend(config);

        let mut item = Item::new(
            id,
            kind,
            crate::domain::item::GridRect::new(0, 0, meta.size.w, meta.size.h),
        );
        item.config = merged;
        Ok(item)
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}

/// Check a submitted config against the module's field schema.
pub fn validate_config(meta: &WidgetMeta, config: &Map<String, Value>) -> Result<(), WidgetError> {
    for field in &meta.fields {
        let value = config.get(field.key);

        if field.required && is_blank(value) {
            return Err(WidgetError::MissingField(field.key.to_string()));
        }

        if let Some(partner) = field.paired_with {
            if is_blank(value) != is_blank(config.get(partner)) {
                let (missing, present) = if is_blank(value) {
                    (field.key, partner)
                } else {
                    (partner, field.key)
                };
                return Err(WidgetError::IncompletePair {
                    field: missing.to_string(),
                    partner: present.to_string(),
                });
            }
        }

        let Some(value) = value.filter(|v| !is_blank(Some(*v))) else {
            continue;
        };

        match field.kind {
            FieldKind::Text => {
                if let (Some(max), Some(s)) = (field.max, value.as_str()) {
                    if s.chars().count() > max {
                        return Err(WidgetError::TooLong {
                            field: field.key.to_string(),
                            max,
                        });
                    }
                }
            }
            FieldKind::Number => {
                let numeric = value.is_number()
                    || value
                        .as_str()
                        .is_some_and(|s| s.trim().parse::<f64>().is_ok());
                if !numeric {
                    return Err(WidgetError::NotANumber(field.key.to_string()));
                }
            }
            FieldKind::Sources | FieldKind::Ranges | FieldKind::ColorRanges => {
                if let (Some(max), Some(entries)) = (field.max, value.as_array()) {
                    if entries.len() > max {
                        return Err(WidgetError::TooManyEntries {
                            field: field.key.to_string(),
                            max,
                        });
                    }
                }
            }
            FieldKind::Select => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NullInstance;

    impl WidgetInstance for NullInstance {
        fn update(&mut self, _ctx: WidgetContext) {}
        fn unmount(&mut self) {}
    }

    struct TileModule(WidgetMeta);

    impl WidgetModule for TileModule {
        fn meta(&self) -> &WidgetMeta {
            &self.0
        }

        fn mount(&self, _container: &WidgetContainer, _ctx: WidgetContext) -> Box<dyn WidgetInstance> {
            Box::new(NullInstance)
        }
    }

    fn tile_meta() -> WidgetMeta {
        let mut defaults = Map::new();
        defaults.insert("title".into(), json!("value"));
        defaults.insert("refreshMs".into(), json!(5000));
        WidgetMeta {
            kind: "tile",
            label: "Tile",
            size: WidgetSize { w: 2, h: 1 },
            defaults,
            fields: vec![
                FieldSpec::new("title", "Title", FieldKind::Text).max(5),
                FieldSpec::new("endpoint", "Endpoint", FieldKind::Text).required(),
                FieldSpec::new("paramKey", "Query key", FieldKind::Text).paired_with("paramValue"),
                FieldSpec::new("paramValue", "Query value", FieldKind::Text),
                FieldSpec::new("min", "Min", FieldKind::Number),
            ],
        }
    }

    fn config(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_default_item_merges_config_over_defaults() {
        let mut registry = WidgetRegistry::new();
        registry.register(Arc::new(TileModule(tile_meta())));

        let item = registry
            .default_item("w1", "tile", config(json!({"title": "pH"})))
            .unwrap();
        assert_eq!((item.w, item.h), (2, 1));
        assert_eq!(item.config["title"], "pH");
        assert_eq!(item.config["refreshMs"], 5000);

        assert_eq!(
            registry.default_item("w2", "nope", Map::new()).unwrap_err(),
            WidgetError::UnknownWidgetType("nope".into())
        );
        assert_eq!(registry.metas().len(), 1);
    }

    #[test]
    fn test_validate_required_and_length() {
        let meta = tile_meta();
        assert_eq!(
            validate_config(&meta, &config(json!({"title": "x"}))),
            Err(WidgetError::MissingField("endpoint".into()))
        );
        assert!(matches!(
            validate_config(&meta, &config(json!({"endpoint": "/a", "title": "toolong"}))),
            Err(WidgetError::TooLong { .. })
        ));
        assert!(validate_config(&meta, &config(json!({"endpoint": "/a", "min": "12.5"}))).is_ok());
        assert_eq!(
            validate_config(&meta, &config(json!({"endpoint": "/a", "min": "abc"}))),
            Err(WidgetError::NotANumber("min".into()))
        );
    }

    #[test]
    fn test_validate_pairs_both_or_neither() {
        let meta = tile_meta();
        assert!(validate_config(&meta, &config(json!({"endpoint": "/a"}))).is_ok());
        assert!(
            validate_config(
                &meta,
                &config(json!({"endpoint": "/a", "paramKey": "k", "paramValue": "v"}))
            )
            .is_ok()
        );
        assert_eq!(
            validate_config(&meta, &config(json!({"endpoint": "/a", "paramKey": "k"}))),
            Err(WidgetError::IncompletePair {
                field: "paramValue".into(),
                partner: "paramKey".into(),
            })
        );
    }

    #[test]
    fn test_context_ignores_malformed_range() {
        let mut doc = DashboardsDocument::default();
        doc.dashboards[0].range = Some(RangeSelector {
            mode: crate::domain::range::RangeMode::Custom,
            preset: None,
            from_ts_ms: 10,
            to_ts_ms: 5,
        });
        let ctx = WidgetContext {
            item: Item::new("w1", "tile", crate::domain::item::GridRect::new(0, 0, 1, 1)),
            document: Arc::new(doc),
            services: Arc::new(WidgetServices::new(
                reqwest::Url::parse("http://localhost:3000").unwrap(),
            )),
        };
        assert!(ctx.dashboard().is_some());
        assert!(ctx.dashboard_range().is_none());
    }
}
