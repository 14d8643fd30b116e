// Line chart (6x4): up to three time series over the dashboard range
use super::fetch::{
    FetchError, MAX_REFRESH_MS, Poller, coerce_number, get_json, number, query_pair, refresh_period,
    resolve_url, text, title,
};
use crate::application::canvas::WidgetContainer;
use crate::application::widget_registry::{
    FieldKind, FieldSpec, WidgetContext, WidgetInstance, WidgetMeta, WidgetModule, WidgetSize,
};
use crate::domain::range::{RangePreset, RangeSelector};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{Map, Value, json};

pub const KIND: &str = "linechart6x4";

pub const MAX_SOURCES: usize = 3;

const DEFAULT_TITLE: &str = "LineChart";
const DEFAULT_REFRESH_MS: u64 = 60_000;
const DEFAULT_MAX_POINTS: i64 = 400;
const DEFAULT_SERIES_COLOR: &str = "#0d6efd";
const MIN_RANGE_MS: i64 = 60_000;
const MAX_RANGE_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Query window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub from_ts_ms: i64,
    pub to_ts_ms: i64,
}

/// Dashboard range if one is set, else `rangeMs` back from `now_ms`.
pub fn query_window(dashboard_range: Option<&RangeSelector>, config: &Map<String, Value>, now_ms: i64) -> Window {
    if let Some(range) = dashboard_range {
        return Window {
            from_ts_ms: range.from_ts_ms,
            to_ts_ms: range.to_ts_ms,
        };
    }
    let range_ms = number(config, "rangeMs")
        .map(|n| (n.round() as i64).clamp(MIN_RANGE_MS, MAX_RANGE_MS))
        .unwrap_or(RangePreset::SixHours.duration_ms());
    Window {
        from_ts_ms: now_ms - range_ms,
        to_ts_ms: now_ms,
    }
}

pub fn max_points(config: &Map<String, Value>) -> i64 {
    number(config, "maxPoints")
        .map(|n| (n.round() as i64).clamp(10, 20_000))
        .unwrap_or(DEFAULT_MAX_POINTS)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSource {
    pub endpoint: String,
    pub name: String,
    pub color: String,
    pub param: Option<(String, String)>,
}

/// At most [`MAX_SOURCES`] sources with an endpoint.
pub fn parse_sources(value: Option<&Value>) -> Vec<SeriesSource> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .filter_map(|src| {
            let endpoint = text(src, "endpoint")?.to_string();
            let name = text(src, "label")
                .or_else(|| text(src, "paramValue"))
                .unwrap_or("Series")
                .to_string();
            let color = text(src, "color").unwrap_or(DEFAULT_SERIES_COLOR).to_string();
            Some(SeriesSource {
                endpoint,
                name,
                color,
                param: query_pair(src, "paramKey", "paramValue"),
            })
        })
        .take(MAX_SOURCES)
        .collect()
}

/// `[[ts, value], ...]` from `{points}`, `{data}` or a bare array, sorted by ts.
pub fn parse_points(payload: &Value) -> Vec<(i64, f64)> {
    let raw = payload
        .get("points")
        .and_then(Value::as_array)
        .or_else(|| payload.get("data").and_then(Value::as_array))
        .or_else(|| payload.as_array());

    let mut points: Vec<(i64, f64)> = raw
        .into_iter()
        .flatten()
        .filter_map(|p| {
            let pair = p.as_array()?;
            let ts = coerce_number(pair.first()?)?;
            let value = coerce_number(pair.get(1)?)?;
            Some((ts.round() as i64, value))
        })
        .collect();
    points.sort_by_key(|(ts, _)| *ts);
    points
}

fn source_url(
    base: &reqwest::Url,
    source: &SeriesSource,
    window: Window,
    max_points: i64,
) -> Result<reqwest::Url, FetchError> {
    let mut params = vec![
        ("from_ts_ms".to_string(), window.from_ts_ms.to_string()),
        ("to_ts_ms".to_string(), window.to_ts_ms.to_string()),
        ("max_points".to_string(), max_points.to_string()),
    ];
    params.extend(source.param.clone());
    resolve_url(base, &source.endpoint, &params)
}

fn chart_view(config: &Map<String, Value>, sources: &[SeriesSource], points: &[Vec<(i64, f64)>], window: Option<Window>) -> Value {
    let series: Vec<Value> = sources
        .iter()
        .enumerate()
        .map(|(i, src)| {
            json!({
                "name": src.name,
                "color": src.color,
                "points": points.get(i).cloned().unwrap_or_default(),
            })
        })
        .collect();

    json!({
        "widget": KIND,
        "title": title(config, DEFAULT_TITLE),
        "yMin": number(config, "yMin"),
        "yMax": number(config, "yMax"),
        "window": window,
        "series": series,
    })
}

pub struct LineChart {
    meta: WidgetMeta,
}

impl LineChart {
    pub fn new() -> Self {
        const HOUR: i64 = 60 * 60 * 1000;
        let defaults = json!({
            "title": DEFAULT_TITLE,
            "refreshMs": DEFAULT_REFRESH_MS,
            "rangeMs": 6 * HOUR,
            "maxPoints": DEFAULT_MAX_POINTS,
            "yMin": "",
            "yMax": "",
            "sources": [],
        });

        Self {
            meta: WidgetMeta {
                kind: KIND,
                label: "Line Chart (6x4)",
                size: WidgetSize { w: 6, h: 4 },
                defaults: defaults.as_object().cloned().unwrap_or_default(),
                fields: vec![
                    FieldSpec::new("title", "Title", FieldKind::Text).max(20),
                    FieldSpec::new("refreshMs", "Refresh Interval", FieldKind::Select)
                        .required()
                        .options([(60_000, "1m"), (300_000, "5m"), (600_000, "10m"), (1_800_000, "30m"), (3_600_000, "1h")]),
                    FieldSpec::new("rangeMs", "Fallback range", FieldKind::Select)
                        .required()
                        .options([(6 * HOUR, "6h"), (12 * HOUR, "12h"), (24 * HOUR, "24h"), (7 * 24 * HOUR, "7d"), (30 * 24 * HOUR, "30d")])
                        .help("Used when no time range is set."),
                    FieldSpec::new("maxPoints", "Max points", FieldKind::Number)
                        .required()
                        .help("Maximum data points to display."),
                    FieldSpec::new("sources", "Time Series", FieldKind::Sources)
                        .required()
                        .max(MAX_SOURCES)
                        .help("Up to 3 series. Each series defines endpoint + label + color."),
                    FieldSpec::new("yMin", "Y min", FieldKind::Number).help("Leave empty for auto."),
                    FieldSpec::new("yMax", "Y max", FieldKind::Number).help("Leave empty for auto."),
                ],
            },
        }
    }
}

impl Default for LineChart {
    fn default() -> Self {
        Self::new()
    }
}

struct LineChartInstance {
    container: WidgetContainer,
    poller: Option<Poller>,
}

impl LineChartInstance {
    fn start(&mut self, ctx: &WidgetContext) {
        self.stop();

        let config = ctx.item.config.clone();
        let sources = parse_sources(config.get("sources"));
        if sources.is_empty() {
            return;
        }

        let period = refresh_period(&config, DEFAULT_REFRESH_MS, Some(MAX_REFRESH_MS));
        let dashboard_range = ctx.dashboard_range();
        let base = ctx.services.base_url.clone();
        let http = ctx.services.http.clone();
        let target = self.container.clone();

        self.poller = Some(Poller::start(period, move |live| {
            let (config, sources, dashboard_range) = (config.clone(), sources.clone(), dashboard_range.clone());
            let (base, http, target) = (base.clone(), http.clone(), target.clone());
            async move {
                let window = query_window(dashboard_range.as_ref(), &config, chrono::Utc::now().timestamp_millis());
                let limit = max_points(&config);

                let fetches = sources.iter().map(|src| {
                    let http = http.clone();
                    let url = source_url(&base, src, window, limit);
                    async move { Ok::<_, FetchError>(parse_points(&get_json(&http, url?).await?)) }
                });

                // One failing source leaves the previous chart in place.
                let points = match try_join_all(fetches).await {
                    Ok(points) => points,
                    Err(e) => {
                        tracing::debug!(item_id = %target.item_id(), "Series fetch failed: {}", e);
                        return;
                    }
                };
                if live.is_aborted() {
                    return;
                }
                target.render(chart_view(&config, &sources, &points, Some(window)));
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }
}

impl WidgetInstance for LineChartInstance {
    fn update(&mut self, ctx: WidgetContext) {
        self.start(&ctx);
    }

    fn unmount(&mut self) {
        self.stop();
    }
}

impl WidgetModule for LineChart {
    fn meta(&self) -> &WidgetMeta {
        &self.meta
    }

    fn mount(&self, container: &WidgetContainer, ctx: WidgetContext) -> Box<dyn WidgetInstance> {
        let config = &ctx.item.config;
        container.render(chart_view(config, &parse_sources(config.get("sources")), &[], None));

        let mut instance = LineChartInstance {
            container: container.clone(),
            poller: None,
        };
        instance.start(&ctx);
        Box::new(instance)
    }
}
