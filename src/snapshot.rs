//! Normalization of columnar telemetry responses
//!
//! A [`Snapshot`] pairs every column id with the matching cell of the first
//! row, preserving column order. Empty responses are not an error here: they
//! produce an empty snapshot and the bridge simply skips the absent values.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::qendercore::DsResponse;

/// Metric identifiers of the realtime dataset
pub mod metric {
    pub const SOLAR_POWER: &str = "inv.core.solar_prod_pwr_w";
    pub const CONSUMPTION_POWER: &str = "inv.core.consumption_pwr_w";
    pub const GRID_POWER: &str = "inv.core.meter_pwr_w";
    pub const BATTERY_POWER: &str = "inv.core.battery_pwr_w";
    pub const BATTERY_SOC: &str = "inv.core.batt_soc_perc";

    /// Sample timestamp column, when the API includes one
    pub const TIMESTAMP: &str = "ts";
}

/// Metric values of one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    metrics: Map<String, Value>,

    #[serde(skip)]
    timestamp: Option<String>,
}

impl Snapshot {
    /// Build a snapshot from the first row of a columnar response
    pub fn from_response(response: &DsResponse) -> Self {
        let Some(row) = response.first_row() else {
            return Self::default();
        };
        if response.cols.is_empty() {
            return Self::default();
        }

        let metrics = response
            .cols
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let id = col.id.clone().unwrap_or_else(|| format!("col{i}"));
                (id, row.get(i).cloned().unwrap_or(Value::Null))
            })
            .collect();
        Self::from_metrics(metrics)
    }

    /// Wrap an already keyed mapping
    pub fn from_metrics(metrics: Map<String, Value>) -> Self {
        let timestamp = match metrics.get(metric::TIMESTAMP) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Self { metrics, timestamp }
    }

    /// Value of a metric; JSON `null` counts as absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metrics.get(key).filter(|v| !v.is_null())
    }

    /// Numeric value of a metric, accepting numeric strings
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn state_of_charge(&self) -> Option<f64> {
        self.number(metric::BATTERY_SOC)
    }

    /// Signed battery power in watts, positive while charging
    pub fn battery_power(&self) -> Option<f64> {
        self.number(metric::BATTERY_POWER)
    }

    pub fn battery_state(&self) -> BatteryState {
        BatteryState::from_power(self.battery_power())
    }

    /// Sample timestamp reported by the API
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// Metrics in column order
    pub const fn metrics(&self) -> &Map<String, Value> {
        &self.metrics
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }
}

/// Battery activity derived from the sign of its power
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryState {
    Charging,
    Discharging,
    Idle,
    Unknown,
}

impl BatteryState {
    /// Exact sign test: zero is idle. NaN is unknown.
    #[allow(clippy::float_cmp)]
    pub fn from_power(power_w: Option<f64>) -> Self {
        match power_w {
            Some(p) if p > 0.0 => Self::Charging,
            Some(p) if p < 0.0 => Self::Discharging,
            Some(p) if p == 0.0 => Self::Idle,
            _ => Self::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Charging => "charging",
            Self::Discharging => "discharging",
            Self::Idle => "idle",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for BatteryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> DsResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_pairs_columns_with_first_row() {
        let snapshot = Snapshot::from_response(&response(json!({
            "cols": [{"id": "a"}, {"id": "b"}],
            "rows": [[1, 2], [3, 4]]
        })));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("a"), Some(&json!(1)));
        assert_eq!(snapshot.get("b"), Some(&json!(2)));
        let keys: Vec<_> = snapshot.metrics().keys().cloned().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn test_empty_cols_or_rows() {
        let no_rows = response(json!({"cols": [{"id": "a"}], "rows": []}));
        let no_cols = response(json!({"cols": [], "rows": [[1]]}));
        assert!(Snapshot::from_response(&no_rows).is_empty());
        assert!(Snapshot::from_response(&no_cols).is_empty());
        assert!(Snapshot::from_response(&DsResponse::default()).is_empty());
    }

    #[test]
    fn test_short_row_and_unnamed_column() {
        let snapshot = Snapshot::from_response(&response(json!({
            "cols": [{"id": "a"}, {}, {"id": "c"}],
            "rows": [[1, "x"]]
        })));
        assert_eq!(snapshot.get("col1"), Some(&json!("x")));
        assert_eq!(snapshot.get("c"), None);
        assert!(snapshot.metrics().contains_key("c"));
    }

    #[test]
    fn test_timestamp_column() {
        let snapshot = Snapshot::from_response(&response(json!({
            "cols": [{"id": "ts"}, {"id": metric::BATTERY_SOC}],
            "rows": [["2026-10-16T12:00:00", 80]]
        })));
        assert_eq!(snapshot.timestamp(), Some("2026-10-16T12:00:00"));
        assert_eq!(snapshot.state_of_charge(), Some(80.0));
    }

    #[test]
    fn test_battery_state_boundaries() {
        assert_eq!(BatteryState::from_power(Some(0.1)), BatteryState::Charging);
        assert_eq!(BatteryState::from_power(Some(-0.1)), BatteryState::Discharging);
        assert_eq!(BatteryState::from_power(Some(0.0)), BatteryState::Idle);
        assert_eq!(BatteryState::from_power(Some(-0.0)), BatteryState::Idle);
        assert_eq!(
            BatteryState::from_power(Some(f64::MIN_POSITIVE)),
            BatteryState::Charging
        );
        assert_eq!(BatteryState::from_power(None), BatteryState::Unknown);
        assert_eq!(BatteryState::from_power(Some(f64::NAN)), BatteryState::Unknown);
    }

    #[test]
    fn test_numeric_strings() {
        let mut metrics = Map::new();
        metrics.insert(metric::BATTERY_POWER.into(), json!("-350.5"));
        let snapshot = Snapshot::from_metrics(metrics);
        assert_eq!(snapshot.battery_power(), Some(-350.5));
        assert_eq!(snapshot.battery_state(), BatteryState::Discharging);
    }

    #[test]
    fn test_serializes_as_flat_mapping() {
        let snapshot = Snapshot::from_response(&response(json!({
            "cols": [{"id": "a"}],
            "rows": [[null]]
        })));
        assert_eq!(serde_json::to_value(&snapshot).unwrap(), json!({"a": null}));
    }
}
