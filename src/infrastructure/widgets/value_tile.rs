// Single-value tile (1x1)
use super::fetch::{PLACEHOLDER, Poller, get_json, refresh_period, resolve_url, set_field, text, title};
use crate::application::canvas::WidgetContainer;
use crate::application::widget_registry::{
    FieldKind, FieldSpec, WidgetContext, WidgetInstance, WidgetMeta, WidgetModule, WidgetSize,
};
use serde_json::{Map, Value, json};

pub const KIND: &str = "value1x1";

const DEFAULT_TITLE: &str = "value";
const DEFAULT_ENDPOINT: &str = "/api/latest";
const DEFAULT_PARAM_KEY: &str = "key";
const DEFAULT_PARAM_VALUE: &str = "value";
const DEFAULT_REFRESH_MS: u64 = 5_000;
const ERROR_TEXT: &str = "ERR";

pub struct ValueTile {
    meta: WidgetMeta,
}

impl ValueTile {
    pub fn new() -> Self {
        let defaults = json!({
            "title": DEFAULT_TITLE,
            "endpoint": DEFAULT_ENDPOINT,
            "paramKey": DEFAULT_PARAM_KEY,
            "paramValue": DEFAULT_PARAM_VALUE,
            "refreshMs": DEFAULT_REFRESH_MS,
        });

        Self {
            meta: WidgetMeta {
                kind: KIND,
                label: "Value (1x1)",
                size: WidgetSize { w: 1, h: 1 },
                defaults: defaults.as_object().cloned().unwrap_or_default(),
                fields: vec![
                    FieldSpec::new("title", "Title", FieldKind::Text).max(20),
                    FieldSpec::new("refreshMs", "Refresh Interval", FieldKind::Select)
                        .required()
                        .options([(1_000, "1s"), (5_000, "5s"), (10_000, "10s"), (30_000, "30s"), (60_000, "1m")]),
                    FieldSpec::new("endpoint", "Endpoint", FieldKind::Text)
                        .required()
                        .help("Example: /api/latest?key=value"),
                    FieldSpec::new("paramKey", "Query key", FieldKind::Text).paired_with("paramValue"),
                    FieldSpec::new("paramValue", "Query value", FieldKind::Text).paired_with("paramKey"),
                ],
            },
        }
    }
}

impl Default for ValueTile {
    fn default() -> Self {
        Self::new()
    }
}

/// Text for a `{ "value": ... }` payload.
pub fn display_value(payload: &Value) -> String {
    match payload.get("value") {
        None | Some(Value::Null) => PLACEHOLDER.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn tile_url(base: &reqwest::Url, config: &Map<String, Value>) -> Result<reqwest::Url, super::fetch::FetchError> {
    let endpoint = text(config, "endpoint").unwrap_or(DEFAULT_ENDPOINT);
    let key = text(config, "paramKey").unwrap_or(DEFAULT_PARAM_KEY);
    let value = text(config, "paramValue").unwrap_or(DEFAULT_PARAM_VALUE);
    resolve_url(base, endpoint, &[(key.to_string(), value.to_string())])
}

struct ValueTileInstance {
    container: WidgetContainer,
    poller: Option<Poller>,
}

impl ValueTileInstance {
    fn start(&mut self, ctx: &WidgetContext) {
        self.stop();

        let config = &ctx.item.config;
        let period = refresh_period(config, DEFAULT_REFRESH_MS, None);
        let url = tile_url(&ctx.services.base_url, config);
        let http = ctx.services.http.clone();
        let target = self.container.clone();

        self.poller = Some(Poller::start(period, move |live| {
            let url = url.as_ref().ok().cloned();
            let http = http.clone();
            let target = target.clone();
            async move {
                let shown = match url {
                    Some(url) => match get_json(&http, url).await {
                        Ok(payload) => display_value(&payload),
                        Err(e) => {
                            tracing::debug!(item_id = %target.item_id(), "Value fetch failed: {}", e);
                            ERROR_TEXT.to_string()
                        }
                    },
                    None => ERROR_TEXT.to_string(),
                };
                if live.is_aborted() {
                    return;
                }
                target.patch(|view| set_field(view, "value", Value::String(shown)));
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }
}

impl WidgetInstance for ValueTileInstance {
    fn update(&mut self, ctx: WidgetContext) {
        let heading = title(&ctx.item.config, DEFAULT_TITLE);
        self.container.patch(|view| set_field(view, "title", Value::String(heading)));
        self.start(&ctx);
    }

    fn unmount(&mut self) {
        self.stop();
    }
}

impl WidgetModule for ValueTile {
    fn meta(&self) -> &WidgetMeta {
        &self.meta
    }

    fn mount(&self, container: &WidgetContainer, ctx: WidgetContext) -> Box<dyn WidgetInstance> {
        container.render(json!({
            "widget": KIND,
            "title": title(&ctx.item.config, DEFAULT_TITLE),
            "value": PLACEHOLDER,
        }));

        let mut instance = ValueTileInstance {
            container: container.clone(),
            poller: None,
        };
        instance.start(&ctx);
        Box::new(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::widgets::testing::{context, stub_server, wait_for};
    use axum::{Json, Router, extract::Query, routing::get};
    use std::collections::HashMap;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!({"value": 8.2})), "8.2");
        assert_eq!(display_value(&json!({"value": "high"})), "high");
        assert_eq!(display_value(&json!({"value": null})), PLACEHOLDER);
        assert_eq!(display_value(&json!({})), PLACEHOLDER);
    }

    #[test]
    fn test_blank_params_fall_back_to_defaults() {
        let base = reqwest::Url::parse("http://tank.local/").unwrap();
        let config = json!({"paramKey": "", "paramValue": "  "});
        let url = tile_url(&base, config.as_object().unwrap()).unwrap();
        assert_eq!(url.as_str(), "http://tank.local/api/latest?key=value");
    }

    #[tokio::test]
    async fn test_mount_fetches_and_unmount_is_idempotent() {
        let router = Router::new().route(
            "/api/latest",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                Json(json!({ "value": q.get("probe").map(|p| format!("{p}=7.9")) }))
            }),
        );
        let base = stub_server(router).await;

        let module = ValueTile::new();
        let container = WidgetContainer::new("w1");
        let config = json!({"title": "pH", "paramKey": "probe", "paramValue": "ph", "refreshMs": 1000});
        let mut instance = module.mount(&container, context("w1", KIND, config, base));

        assert_eq!(container.content()["title"], "pH");
        wait_for(&container, |view| view["value"] == "ph=7.9").await;

        module.unmount(instance.as_mut());
        module.unmount(instance.as_mut());
    }

    #[tokio::test]
    async fn test_late_response_after_unmount_is_dropped() {
        let router = Router::new().route(
            "/api/latest",
            get(|| async {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                Json(json!({"value": 7.9}))
            }),
        );
        let base = stub_server(router).await;

        let module = ValueTile::new();
        let container = WidgetContainer::new("w1");
        let mut instance = module.mount(&container, context("w1", KIND, json!({}), base));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        instance.unmount();

        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
        assert_eq!(container.content()["value"], PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_fetch_error_shows_err() {
        let base = stub_server(Router::new()).await;
        let module = ValueTile::new();
        let container = WidgetContainer::new("w1");
        let mut instance = module.mount(&container, context("w1", KIND, json!({}), base));

        wait_for(&container, |view| view["value"] == ERROR_TEXT).await;
        instance.unmount();
    }

    #[test]
    fn test_defaults_pass_validation() {
        let module = ValueTile::new();
        let meta = module.meta();
        assert!(crate::application::widget_registry::validate_config(meta, &meta.defaults).is_ok());
    }
}
