// Dashboard-wide time range selector
use serde::{Deserialize, Serialize};

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeMode {
    Preset,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangePreset {
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
}

impl RangePreset {
    pub fn duration_ms(self) -> i64 {
        match self {
            RangePreset::SixHours => 6 * HOUR_MS,
            RangePreset::TwelveHours => 12 * HOUR_MS,
            RangePreset::OneDay => DAY_MS,
            RangePreset::SevenDays => 7 * DAY_MS,
            RangePreset::ThirtyDays => 30 * DAY_MS,
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "6h" => Some(RangePreset::SixHours),
            "12h" => Some(RangePreset::TwelveHours),
            "24h" => Some(RangePreset::OneDay),
            "7d" => Some(RangePreset::SevenDays),
            "30d" => Some(RangePreset::ThirtyDays),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSelector {
    pub mode: RangeMode,
    #[serde(default)]
    pub preset: Option<RangePreset>,
    pub from_ts_ms: i64,
    pub to_ts_ms: i64,
}

impl RangeSelector {
    /// Preset window ending at `now_ms`.
    pub fn preset(preset: RangePreset, now_ms: i64) -> Self {
        Self {
            mode: RangeMode::Preset,
            preset: Some(preset),
            from_ts_ms: now_ms - preset.duration_ms(),
            to_ts_ms: now_ms,
        }
    }

    /// Custom window; `None` unless `to` is strictly after `from`.
    pub fn custom(from_ts_ms: i64, to_ts_ms: i64) -> Option<Self> {
        if to_ts_ms <= from_ts_ms {
            return None;
        }
        Some(Self {
            mode: RangeMode::Custom,
            preset: None,
            from_ts_ms,
            to_ts_ms,
        })
    }

    pub fn is_usable(&self) -> bool {
        self.to_ts_ms > self.from_ts_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_window() {
        let r = RangeSelector::preset(RangePreset::SixHours, 10 * HOUR_MS);
        assert_eq!(r.from_ts_ms, 4 * HOUR_MS);
        assert_eq!(r.to_ts_ms, 10 * HOUR_MS);
        assert!(r.is_usable());
    }

    #[test]
    fn test_custom_requires_ordered_bounds() {
        assert!(RangeSelector::custom(10, 10).is_none());
        assert!(RangeSelector::custom(10, 5).is_none());
        assert_eq!(RangeSelector::custom(5, 10).unwrap().mode, RangeMode::Custom);
    }

    #[test]
    fn test_wire_format() {
        let r = RangeSelector::preset(RangePreset::SevenDays, 1_000_000_000);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["mode"], "preset");
        assert_eq!(json["preset"], "7d");
        assert!(json.get("fromTsMs").is_some());
        assert_eq!(RangePreset::parse("30d"), Some(RangePreset::ThirtyDays));
        assert_eq!(RangePreset::parse("1y"), None);
    }
}
