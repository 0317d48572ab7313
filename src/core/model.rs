use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type MetricName = String;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Circular region the monitored person is expected to stay in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeArea {
    pub center: Coordinates,
    #[serde(rename = "radiusMeters", alias = "radius")]
    pub radius_meters: f64,
}

impl Default for SafeArea {
    fn default() -> Self {
        Self {
            center: Coordinates::new(-23.5505, -46.6333),
            radius_meters: 100.0,
        }
    }
}

/// Raw accelerometer reading, in the wearable's native scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

/// One named behavioral metric with the range considered normal for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorPattern {
    #[serde(rename = "type")]
    pub metric: MetricName,
    pub value: f64,
    #[serde(rename = "normalRange")]
    pub normal_range: (f64, f64),
    pub unit: String,
}

impl BehaviorPattern {
    pub fn new(metric: impl Into<String>, value: f64, normal_range: (f64, f64), unit: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            value,
            normal_range,
            unit: unit.into(),
        }
    }
}

/// Daily behavior summary used by the trend analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub recorded_at: DateTime<Utc>,
    pub sleep_hours: f64,
    pub steps: f64,
    pub bathroom_visits: f64,
}
