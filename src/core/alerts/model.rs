// Alert model types: notifications, severities and classifier output.
//
// NOTE: serialized field names follow the camelCase shape consumed by the UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type NotificationId = Uuid;

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    /// Possible fall picked up by the accelerometer
    Fall,
    /// No activity for longer than the configured limit
    Inactivity,
    /// Heart rate or blood pressure out of range
    VitalSigns,
    /// Left the safe area
    Location,
    /// Medication reminder
    Medication,
    /// Physical activity and behavior findings
    Activity,
    /// Routine status update
    Status,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fall => "fall",
            Self::Inactivity => "inactivity",
            Self::VitalSigns => "vitalSigns",
            Self::Location => "location",
            Self::Medication => "medication",
            Self::Activity => "activity",
            Self::Status => "status",
        }
    }

    pub fn all() -> &'static [NotificationKind] {
        &[
            Self::Fall,
            Self::Inactivity,
            Self::VitalSigns,
            Self::Location,
            Self::Medication,
            Self::Activity,
            Self::Status,
        ]
    }
}

/// Urgency tier. Ordered `Low < Medium < High`; controls contact routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Short marker used when rendering a notification on one line
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::High => "🚨",
            Self::Medium => "⚠️",
            Self::Low => "ℹ️",
        }
    }
}

/// Canonical, dispatchable alert.
///
/// Severity is fixed at construction. `read` only ever goes from false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    id: NotificationId,
    #[serde(rename = "type")]
    kind: NotificationKind,
    severity: Severity,
    title: String,
    message: String,
    timestamp: DateTime<Utc>,
    read: bool,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            severity,
            title: title.into(),
            message: message.into(),
            timestamp,
            read: false,
        }
    }

    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    /// Marks the notification as read. Calling it again is a no-op.
    pub fn mark_read(&mut self) {
        self.read = true;
    }
}

/// Classifier output: one deviation, not yet dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Notification kind this anomaly is reported under
    pub kind: NotificationKind,
    /// Short label, e.g. "Horas de Sono Baixo" or "Fall Risk"
    #[serde(rename = "type")]
    pub label: String,
    pub severity: Severity,
    pub message: String,
    #[serde(rename = "detectedAt")]
    pub detected_at: DateTime<Utc>,
}

impl Anomaly {
    pub fn new(
        kind: NotificationKind,
        label: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            severity,
            message: message.into(),
            detected_at,
        }
    }

    /// Label becomes the title, detection time the timestamp.
    pub fn into_notification(self) -> Notification {
        Notification::new(
            self.kind,
            self.severity,
            self.label,
            self.message,
            self.detected_at,
        )
    }
}
