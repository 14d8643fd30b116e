// Gauge (3x3): a clamped value on a colored axis
use super::fetch::{
    MAX_REFRESH_MS, Poller, coerce_number, get_json, number, query_pair, refresh_period, resolve_url,
    set_field, text, title,
};
use crate::application::canvas::WidgetContainer;
use crate::application::widget_registry::{
    FieldKind, FieldSpec, WidgetContext, WidgetInstance, WidgetMeta, WidgetModule, WidgetSize,
};
use serde_json::{Map, Value, json};

pub const KIND: &str = "gauge3x3";

const DEFAULT_TITLE: &str = "Gauge";
const DEFAULT_ENDPOINT: &str = "/api/latest";
const DEFAULT_REFRESH_MS: u64 = 5_000;
const DEFAULT_MIN: f64 = 0.0;
const DEFAULT_MAX: f64 = 2000.0;
const AXIS_FALLBACK_COLOR: &str = "#e6e6e6";

#[derive(Debug, Clone, PartialEq)]
pub struct ColorRange {
    pub from: f64,
    pub to: f64,
    pub color: String,
}

/// Well-formed `{from, to, color}` rows, sorted by `from`.
pub fn parse_ranges(value: Option<&Value>) -> Vec<ColorRange> {
    let mut ranges: Vec<ColorRange> = value
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let from = coerce_number(row.get("from")?)?;
                    let to = coerce_number(row.get("to")?)?;
                    let color = row
                        .get("color")
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .unwrap_or(AXIS_FALLBACK_COLOR)
                        .to_string();
                    (to > from).then_some(ColorRange { from, to, color })
                })
                .collect()
        })
        .unwrap_or_default();
    ranges.sort_by(|a, b| a.from.total_cmp(&b.from));
    ranges
}

/// Cumulative axis stops in `0..=1`; the last stop always reaches 1 and
/// stops never decrease.
pub fn axis_stops(min: f64, max: f64, ranges: &[ColorRange]) -> Vec<(f64, String)> {
    let span = max - min;
    if !(span > 0.0) {
        return vec![(1.0, AXIS_FALLBACK_COLOR.to_string())];
    }

    let mut stops: Vec<(f64, String)> = ranges
        .iter()
        .map(|r| {
            let to = r.to.clamp(min, max);
            (((to - min) / span).clamp(0.0, 1.0), r.color.clone())
        })
        .collect();

    if stops.last().is_none_or(|(stop, _)| *stop < 1.0) {
        stops.push((1.0, AXIS_FALLBACK_COLOR.to_string()));
    }

    let mut prev = 0.0_f64;
    for (stop, _) in &mut stops {
        *stop = stop.max(prev);
        prev = *stop;
    }
    stops
}

/// Color of the first range containing `value`.
pub fn segment_color(value: f64, ranges: &[ColorRange]) -> Option<&str> {
    ranges
        .iter()
        .find(|r| value >= r.from && value <= r.to)
        .map(|r| r.color.as_str())
}

fn bounds(config: &Map<String, Value>) -> (f64, f64) {
    (
        number(config, "min").unwrap_or(DEFAULT_MIN),
        number(config, "max").unwrap_or(DEFAULT_MAX),
    )
}

fn gauge_view(config: &Map<String, Value>, value: Option<f64>) -> Value {
    let (min, max) = bounds(config);
    let ranges = parse_ranges(config.get("ranges"));
    let value = value.map(|v| if max >= min { v.clamp(min, max) } else { v });

    json!({
        "widget": KIND,
        "title": title(config, DEFAULT_TITLE),
        "min": min,
        "max": max,
        "value": value,
        "color": value.and_then(|v| segment_color(v, &ranges)),
        "stops": axis_stops(min, max, &ranges),
    })
}

pub struct Gauge {
    meta: WidgetMeta,
}

impl Gauge {
    pub fn new() -> Self {
        let defaults = json!({
            "title": DEFAULT_TITLE,
            "refreshMs": DEFAULT_REFRESH_MS,
            "endpoint": DEFAULT_ENDPOINT,
            "paramKey": "key",
            "paramValue": "value",
            "min": DEFAULT_MIN,
            "max": DEFAULT_MAX,
            "ranges": [],
        });

        Self {
            meta: WidgetMeta {
                kind: KIND,
                label: "Gauge (3x3)",
                size: WidgetSize { w: 3, h: 3 },
                defaults: defaults.as_object().cloned().unwrap_or_default(),
                fields: vec![
                    FieldSpec::new("title", "Title", FieldKind::Text).max(20),
                    FieldSpec::new("refreshMs", "Refresh Interval", FieldKind::Select)
                        .required()
                        .options([
                            (1_000, "1s"),
                            (2_000, "2s"),
                            (5_000, "5s"),
                            (10_000, "10s"),
                            (30_000, "30s"),
                            (60_000, "1m"),
                            (300_000, "5m"),
                            (3_600_000, "1h"),
                        ]),
                    FieldSpec::new("endpoint", "Endpoint", FieldKind::Text)
                        .required()
                        .help("Example: /api/latest?key=value"),
                    FieldSpec::new("paramKey", "Query key", FieldKind::Text).paired_with("paramValue"),
                    FieldSpec::new("paramValue", "Query value", FieldKind::Text).paired_with("paramKey"),
                    FieldSpec::new("min", "Min", FieldKind::Number).required(),
                    FieldSpec::new("max", "Max", FieldKind::Number).required(),
                    FieldSpec::new("ranges", "Color ranges", FieldKind::ColorRanges)
                        .help("Define colored segments on the gauge axis."),
                ],
            },
        }
    }
}

impl Default for Gauge {
    fn default() -> Self {
        Self::new()
    }
}

struct GaugeInstance {
    container: WidgetContainer,
    poller: Option<Poller>,
}

impl GaugeInstance {
    fn start(&mut self, ctx: &WidgetContext) {
        self.stop();

        let config = ctx.item.config.clone();
        let period = refresh_period(&config, DEFAULT_REFRESH_MS, Some(MAX_REFRESH_MS));
        let endpoint = text(&config, "endpoint").unwrap_or(DEFAULT_ENDPOINT);
        let params: Vec<_> = query_pair(&config, "paramKey", "paramValue").into_iter().collect();
        let url = match resolve_url(&ctx.services.base_url, endpoint, &params) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(item_id = %ctx.item.id, "Gauge disabled: {}", e);
                return;
            }
        };
        let http = ctx.services.http.clone();
        let target = self.container.clone();

        self.poller = Some(Poller::start(period, move |live| {
            let (url, http, target, config) = (url.clone(), http.clone(), target.clone(), config.clone());
            async move {
                // Errors keep the last reading on screen.
                let payload = match get_json(&http, url).await {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::debug!(item_id = %target.item_id(), "Gauge fetch failed: {}", e);
                        return;
                    }
                };
                if live.is_aborted() {
                    return;
                }
                let reading = payload.get("value").and_then(coerce_number);
                target.render(gauge_view(&config, reading));
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }
}

impl WidgetInstance for GaugeInstance {
    fn update(&mut self, ctx: WidgetContext) {
        let heading = title(&ctx.item.config, DEFAULT_TITLE);
        self.container.patch(|view| set_field(view, "title", Value::String(heading)));
        self.start(&ctx);
    }

    fn unmount(&mut self) {
        self.stop();
    }
}

impl WidgetModule for Gauge {
    fn meta(&self) -> &WidgetMeta {
        &self.meta
    }

    fn mount(&self, container: &WidgetContainer, ctx: WidgetContext) -> Box<dyn WidgetInstance> {
        container.render(gauge_view(&ctx.item.config, None));
        let mut instance = GaugeInstance {
            container: container.clone(),
            poller: None,
        };
        instance.start(&ctx);
        Box::new(instance)
    }
}
