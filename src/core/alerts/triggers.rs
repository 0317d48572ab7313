// Single-reading classifiers.
//
// Each monitor looks at one raw sample and returns the anomalies it finds.
// They are pure: no clocks, no logging, no dispatch.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::model::{Anomaly, NotificationKind, Severity};
use crate::core::geofence;
use crate::core::model::{Acceleration, BloodPressure, Coordinates, SafeArea};

pub const FALL_TITLE: &str = "Fall Detected!";
pub const FALL_MESSAGE: &str = "A possible fall was detected. Immediate check required.";

/// Fires on a sudden vertical-axis spike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallDetector {
    /// Absolute y-axis reading above which a fall is assumed
    #[serde(default = "default_fall_axis_limit")]
    pub axis_limit: f64,
}

fn default_fall_axis_limit() -> f64 {
    20.0
}

impl Default for FallDetector {
    fn default() -> Self {
        Self {
            axis_limit: default_fall_axis_limit(),
        }
    }
}

impl FallDetector {
    pub fn check(&self, accel: Acceleration, at: DateTime<Utc>) -> Option<Anomaly> {
        if accel.y.abs() > self.axis_limit {
            Some(fall_anomaly(at))
        } else {
            None
        }
    }
}

/// The anomaly reported for a detected or manually raised fall.
pub fn fall_anomaly(at: DateTime<Utc>) -> Anomaly {
    Anomaly::new(
        NotificationKind::Fall,
        FALL_TITLE,
        Severity::High,
        FALL_MESSAGE,
        at,
    )
}

/// Heart rate and blood pressure limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSignsMonitor {
    #[serde(default = "default_heart_rate_min")]
    pub heart_rate_min: f64,
    #[serde(default = "default_heart_rate_max")]
    pub heart_rate_max: f64,
    #[serde(default = "default_systolic_max")]
    pub systolic_max: f64,
    #[serde(default = "default_diastolic_max")]
    pub diastolic_max: f64,
}

fn default_heart_rate_min() -> f64 {
    60.0
}

fn default_heart_rate_max() -> f64 {
    100.0
}

fn default_systolic_max() -> f64 {
    140.0
}

fn default_diastolic_max() -> f64 {
    90.0
}

impl Default for VitalSignsMonitor {
    fn default() -> Self {
        Self {
            heart_rate_min: default_heart_rate_min(),
            heart_rate_max: default_heart_rate_max(),
            systolic_max: default_systolic_max(),
            diastolic_max: default_diastolic_max(),
        }
    }
}

impl VitalSignsMonitor {
    /// Heart rate and blood pressure are checked independently, so one
    /// reading can yield two anomalies.
    pub fn check(&self, heart_rate: f64, pressure: BloodPressure, at: DateTime<Utc>) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();

        if heart_rate < self.heart_rate_min || heart_rate > self.heart_rate_max {
            anomalies.push(Anomaly::new(
                NotificationKind::VitalSigns,
                "Vital Signs Changed",
                Severity::High,
                format!("Abnormal heart rate detected: {} bpm", heart_rate),
                at,
            ));
        }

        if pressure.systolic > self.systolic_max || pressure.diastolic > self.diastolic_max {
            anomalies.push(Anomaly::new(
                NotificationKind::VitalSigns,
                "High Blood Pressure",
                Severity::Medium,
                format!(
                    "Blood pressure: {}/{} mmHg",
                    pressure.systolic, pressure.diastolic
                ),
                at,
            ));
        }

        anomalies
    }
}

/// Flags long stretches without any recorded activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InactivityMonitor {
    /// Idle time tolerated before alerting, in minutes
    #[serde(default = "default_inactivity_limit_minutes")]
    pub limit_minutes: u32,
}

fn default_inactivity_limit_minutes() -> u32 {
    180
}

impl Default for InactivityMonitor {
    fn default() -> Self {
        Self {
            limit_minutes: default_inactivity_limit_minutes(),
        }
    }
}

impl InactivityMonitor {
    pub fn limit(&self) -> Duration {
        Duration::minutes(i64::from(self.limit_minutes))
    }

    pub fn check(&self, last_activity: DateTime<Utc>, now: DateTime<Utc>) -> Option<Anomaly> {
        if now - last_activity <= self.limit() {
            return None;
        }
        Some(Anomaly::new(
            NotificationKind::Inactivity,
            "Prolonged Inactivity",
            Severity::Medium,
            format!(
                "No activity detected in the last {}.",
                describe_minutes(self.limit_minutes)
            ),
            now,
        ))
    }
}

fn describe_minutes(minutes: u32) -> String {
    if minutes % 60 == 0 {
        let hours = minutes / 60;
        if hours == 1 {
            "hour".to_string()
        } else {
            format!("{} hours", hours)
        }
    } else {
        format!("{} minutes", minutes)
    }
}

/// Geofence check against a safe area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationMonitor;

impl LocationMonitor {
    pub fn check(&self, position: Coordinates, area: &SafeArea, at: DateTime<Utc>) -> Option<Anomaly> {
        if !geofence::is_outside(position, area) {
            return None;
        }
        Some(Anomaly::new(
            NotificationKind::Location,
            "Outside Safe Area",
            Severity::Medium,
            "The monitored person left the defined safe area.",
            at,
        ))
    }
}

/// Thresholds for every single-reading monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default)]
    pub fall: FallDetector,
    #[serde(default)]
    pub vitals: VitalSignsMonitor,
    #[serde(default)]
    pub inactivity: InactivityMonitor,
}
