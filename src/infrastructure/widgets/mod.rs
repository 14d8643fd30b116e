// Built-in widget modules
pub mod fetch;
pub mod gauge;
pub mod line_chart;
pub mod value_tile;

use crate::application::widget_registry::WidgetRegistry;
use std::sync::Arc;

/// Registry with every built-in widget type.
pub fn builtin_registry() -> WidgetRegistry {
    let mut registry = WidgetRegistry::new();
    registry.register(Arc::new(value_tile::ValueTile::new()));
    registry.register(Arc::new(gauge::Gauge::new()));
    registry.register(Arc::new(line_chart::LineChart::new()));
    registry
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::application::canvas::WidgetContainer;
    use crate::application::widget_registry::{WidgetContext, WidgetServices};
    use crate::domain::dashboard::DashboardsDocument;
    use crate::domain::item::{GridRect, Item};
    use crate::domain::range::RangeSelector;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;

    /// Serve `router` on an ephemeral local port.
    pub async fn stub_server(router: axum::Router) -> reqwest::Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        reqwest::Url::parse(&format!("http://{addr}/")).unwrap()
    }

    pub fn context(item_id: &str, kind: &str, config: Value, base: reqwest::Url) -> WidgetContext {
        build_context(item_id, kind, config, base, None)
    }

    pub fn context_with_range(
        item_id: &str,
        kind: &str,
        config: Value,
        base: reqwest::Url,
        range: RangeSelector,
    ) -> WidgetContext {
        build_context(item_id, kind, config, base, Some(range))
    }

    fn build_context(
        item_id: &str,
        kind: &str,
        config: Value,
        base: reqwest::Url,
        range: Option<RangeSelector>,
    ) -> WidgetContext {
        let item = Item::new(item_id, kind, GridRect::new(0, 0, 1, 1))
            .with_config(config.as_object().cloned().unwrap_or_default());
        let mut document = DashboardsDocument::default();
        document.dashboards[0].items.push(item.clone());
        document.dashboards[0].range = range;

        WidgetContext {
            item,
            document: Arc::new(document),
            services: Arc::new(WidgetServices::new(base)),
        }
    }

    /// Poll the container until `ready` holds, failing after two seconds.
    pub async fn wait_for(container: &WidgetContainer, ready: impl Fn(&Value) -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let view = container.content();
            if ready(&view) {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "container never reached expected state: {view}"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
