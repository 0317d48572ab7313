use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alerts::bus::AlertBus;
use super::alerts::model::NotificationId;
use super::analysis::{self, PatternThresholds, TrendThresholds};
use super::config::Settings;
use super::model::{Acceleration, BehaviorPattern, BloodPressure, Coordinates, DailyRecord, SafeArea};

/// One reading from an external sample source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sample", rename_all = "snake_case")]
pub enum Sample {
    Accelerometer {
        x: f64,
        y: f64,
        z: f64,
    },
    Vitals {
        heart_rate: f64,
        systolic: f64,
        diastolic: f64,
    },
    Position {
        lat: f64,
        lng: f64,
    },
    /// Any movement or interaction; resets the inactivity timer
    Activity {
        #[serde(default)]
        at: Option<DateTime<Utc>>,
    },
    Patterns {
        patterns: Vec<BehaviorPattern>,
    },
    Trends {
        records: Vec<DailyRecord>,
    },
    Status {
        message: String,
    },
    Medication {
        medicine: String,
    },
    Exercise {
        description: String,
    },
}

/// Routes samples to the right classifier and dispatches what they find.
pub struct Coordinator {
    bus: Arc<AlertBus>,
    safe_area: SafeArea,
    patterns: PatternThresholds,
    trends: TrendThresholds,
    last_activity: DateTime<Utc>,
}

impl Coordinator {
    pub fn new(bus: Arc<AlertBus>, settings: &Settings) -> Self {
        let last_activity = bus.now();
        Self {
            bus,
            safe_area: settings.safe_area,
            patterns: settings.patterns.clone(),
            trends: settings.trends.clone(),
            last_activity,
        }
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Returns the ids of the notifications dispatched for this sample.
    pub fn handle(&mut self, sample: Sample) -> Vec<NotificationId> {
        match sample {
            Sample::Accelerometer { x, y, z } => {
                self.bus.check_for_falls(Acceleration { x, y, z })
            }
            Sample::Vitals {
                heart_rate,
                systolic,
                diastolic,
            } => self
                .bus
                .check_vital_signs(heart_rate, BloodPressure { systolic, diastolic }),
            Sample::Position { lat, lng } => self
                .bus
                .check_location(Coordinates::new(lat, lng), &self.safe_area),
            Sample::Activity { at } => {
                let at = at.unwrap_or_else(|| self.bus.now());
                self.record_activity(at);
                Vec::new()
            }
            Sample::Patterns { patterns } => {
                let now = self.bus.now();
                let mut found = analysis::classify_patterns(&patterns, &self.patterns, now);
                found.extend(analysis::predict_risks(&patterns, &self.patterns, now));
                self.bus.dispatch_anomalies(found)
            }
            Sample::Trends { records } => {
                let found = analysis::analyze_trends(&records, &self.trends, self.bus.now());
                self.bus.dispatch_anomalies(found)
            }
            Sample::Status { message } => vec![self.bus.status_notification(&message)],
            Sample::Medication { medicine } => vec![self.bus.medication_reminder(&medicine)],
            Sample::Exercise { description } => {
                let now = self.bus.now();
                self.record_activity(now);
                vec![self.bus.activity_notification(&description)]
            }
        }
    }

    /// Inactivity check against the bus clock; meant to run periodically.
    pub fn check_idle(&self) -> Vec<NotificationId> {
        self.bus.check_inactivity(self.last_activity)
    }

    fn record_activity(&mut self, at: DateTime<Utc>) {
        // Late-arriving samples never move the timer backwards
        if at > self.last_activity {
            self.last_activity = at;
        }
    }
}
