// Shared plumbing for built-in widgets: config coercion, URLs and polling
use futures::future::{AbortHandle, Abortable};
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub const MIN_REFRESH_MS: u64 = 1_000;
pub const MAX_REFRESH_MS: u64 = 3_600_000;

/// Shown where a value is not known yet.
pub const PLACEHOLDER: &str = "—";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    Url(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Trimmed, non-empty string field.
pub fn text<'a>(config: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    config
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Finite number, given either as a JSON number or a numeric string.
pub fn number(config: &Map<String, Value>, key: &str) -> Option<f64> {
    coerce_number(config.get(key)?)
}

pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

pub fn title(config: &Map<String, Value>, fallback: &str) -> String {
    text(config, "title").unwrap_or(fallback).to_string()
}

/// Refresh period from `refreshMs`, at least one second and at most `max_ms`.
pub fn refresh_period(config: &Map<String, Value>, fallback_ms: u64, max_ms: Option<u64>) -> Duration {
    let ms = number(config, "refreshMs")
        .map(|n| n.round().max(0.0) as u64)
        .unwrap_or(fallback_ms)
        .max(MIN_REFRESH_MS);
    Duration::from_millis(max_ms.map_or(ms, |max| ms.min(max)))
}

/// Both halves of an optional query parameter, or nothing.
pub fn query_pair(object: &Map<String, Value>, key_field: &str, value_field: &str) -> Option<(String, String)> {
    let key = text(object, key_field)?;
    let value = text(object, value_field)?;
    Some((key.to_string(), value.to_string()))
}

/// Resolve `endpoint` against `base` and set the query parameters.
pub fn resolve_url(
    base: &reqwest::Url,
    endpoint: &str,
    params: &[(String, String)],
) -> Result<reqwest::Url, FetchError> {
    let mut url = base
        .join(endpoint.trim())
        .map_err(|e| FetchError::Url(format!("{endpoint}: {e}")))?;
    if !params.is_empty() {
        let mut query = url.query_pairs_mut();
        for (key, value) in params {
            query.append_pair(key, value);
        }
    }
    Ok(url)
}

pub async fn get_json(http: &reqwest::Client, url: reqwest::Url) -> Result<Value, FetchError> {
    let value = http
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(value)
}

/// Write one field of an object view. Non-object views are left alone.
pub fn set_field(view: &mut Value, key: &str, value: Value) {
    if let Some(object) = view.as_object_mut() {
        object.insert(key.to_string(), value);
    }
}

/// Background refresh loop for one widget instance. The first tick fires
/// immediately. Each refresh gets the abort handle and must check it before
/// writing into its container.
#[derive(Debug)]
pub struct Poller {
    abort: AbortHandle,
}

impl Poller {
    pub fn start<F, Fut>(period: Duration, mut refresh: F) -> Self
    where
        F: FnMut(AbortHandle) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (abort, registration) = AbortHandle::new_pair();
        let live = abort.clone();

        let task = async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                refresh(live.clone()).await;
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(Abortable::new(task, registration));
            }
            Err(_) => {
                tracing::warn!("No async runtime, widget refresh disabled");
                abort.abort();
            }
        }

        Self { abort }
    }

    pub fn stop(&self) {
        self.abort.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.abort.is_aborted()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.abort.abort();
    }
}
