//! Behavioral pattern analysis.
//!
//! Three pure classifiers over caller-owned data:
//! - range classification of named metrics (`classify_patterns`)
//! - predictive risk rules combining metrics (`predict_risks`)
//! - day-over-day trend changes (`analyze_trends`)

use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::alerts::model::{Anomaly, NotificationKind, Severity};
use super::model::{BehaviorPattern, DailyRecord};

lazy_static! {
    // Whole-label matches only; "Sleep Quality" or "Steps Goal" are different metrics
    static ref STEPS_METRIC: Regex =
        Regex::new(r"(?i)^\s*(daily steps|passos diários)\s*$").expect("Invalid steps regex");
    static ref SITTING_METRIC: Regex =
        Regex::new(r"(?i)^\s*(sitting time|tempo sentado)\s*$").expect("Invalid sitting regex");
    static ref SLEEP_METRIC: Regex =
        Regex::new(r"(?i)^\s*(sleep hours|horas de sono)\s*$").expect("Invalid sleep regex");
    static ref BATHROOM_METRIC: Regex =
        Regex::new(r"(?i)^\s*(bathroom|bathroom usage|uso do banheiro)\s*$").expect("Invalid bathroom regex");
}

/// Well-known behavioral metrics, recognised by name in English or Portuguese.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    DailySteps,
    SittingTime,
    SleepHours,
    BathroomUsage,
}

impl MetricKind {
    pub fn identify(name: &str) -> Option<Self> {
        if STEPS_METRIC.is_match(name) {
            Some(Self::DailySteps)
        } else if SITTING_METRIC.is_match(name) {
            Some(Self::SittingTime)
        } else if SLEEP_METRIC.is_match(name) {
            Some(Self::SleepHours)
        } else if BATHROOM_METRIC.is_match(name) {
            Some(Self::BathroomUsage)
        } else {
            None
        }
    }
}

/// First value reported for `kind`, if any.
fn metric_value(patterns: &[BehaviorPattern], kind: MetricKind) -> Option<f64> {
    patterns
        .iter()
        .find(|p| MetricKind::identify(&p.metric) == Some(kind))
        .map(|p| p.value)
}

/// Multipliers and limits for range and predictive classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternThresholds {
    /// Below `min * low_multiplier` is high severity
    #[serde(default = "default_low_multiplier")]
    pub low_multiplier: f64,
    /// Above `max * high_multiplier` is high severity
    #[serde(default = "default_high_multiplier")]
    pub high_multiplier: f64,
    #[serde(default = "default_fall_risk_max_steps")]
    pub fall_risk_max_steps: f64,
    #[serde(default = "default_fall_risk_min_sitting_hours")]
    pub fall_risk_min_sitting_hours: f64,
    #[serde(default = "default_sleep_disorder_max_hours")]
    pub sleep_disorder_max_hours: f64,
}

fn default_low_multiplier() -> f64 {
    0.8
}

fn default_high_multiplier() -> f64 {
    1.2
}

fn default_fall_risk_max_steps() -> f64 {
    2000.0
}

fn default_fall_risk_min_sitting_hours() -> f64 {
    12.0
}

fn default_sleep_disorder_max_hours() -> f64 {
    6.0
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            low_multiplier: default_low_multiplier(),
            high_multiplier: default_high_multiplier(),
            fall_risk_max_steps: default_fall_risk_max_steps(),
            fall_risk_min_sitting_hours: default_fall_risk_min_sitting_hours(),
            sleep_disorder_max_hours: default_sleep_disorder_max_hours(),
        }
    }
}

/// Flags every pattern whose value lies outside its normal range.
/// Values equal to either bound are normal.
pub fn classify_patterns(
    patterns: &[BehaviorPattern],
    thresholds: &PatternThresholds,
    now: DateTime<Utc>,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for pattern in patterns {
        let (min, max) = pattern.normal_range;

        if pattern.value < min {
            let severity = if pattern.value < min * thresholds.low_multiplier {
                Severity::High
            } else {
                Severity::Medium
            };
            anomalies.push(Anomaly::new(
                NotificationKind::Activity,
                format!("{} Baixo", pattern.metric),
                severity,
                format!(
                    "{} is below normal ({} {})",
                    pattern.metric, pattern.value, pattern.unit
                ),
                now,
            ));
        } else if pattern.value > max {
            let severity = if pattern.value > max * thresholds.high_multiplier {
                Severity::High
            } else {
                Severity::Medium
            };
            anomalies.push(Anomaly::new(
                NotificationKind::Activity,
                format!("{} Alto", pattern.metric),
                severity,
                format!(
                    "{} is above normal ({} {})",
                    pattern.metric, pattern.value, pattern.unit
                ),
                now,
            ));
        }
    }

    anomalies
}

/// Rules combining metrics into forward-looking risks. A rule whose metrics
/// are missing is skipped.
pub fn predict_risks(
    patterns: &[BehaviorPattern],
    thresholds: &PatternThresholds,
    now: DateTime<Utc>,
) -> Vec<Anomaly> {
    let mut risks = Vec::new();

    let steps = metric_value(patterns, MetricKind::DailySteps);
    let sitting = metric_value(patterns, MetricKind::SittingTime);
    if let (Some(steps), Some(sitting)) = (steps, sitting) {
        if steps < thresholds.fall_risk_max_steps && sitting > thresholds.fall_risk_min_sitting_hours {
            risks.push(Anomaly::new(
                NotificationKind::Activity,
                "Fall Risk",
                Severity::High,
                "High sedentary behavior detected. Increased risk of falls.",
                now,
            ));
        }
    }

    if let Some(sleep) = metric_value(patterns, MetricKind::SleepHours) {
        if sleep < thresholds.sleep_disorder_max_hours {
            risks.push(Anomaly::new(
                NotificationKind::Activity,
                "Sleep Disorder",
                Severity::Medium,
                "Irregular sleep pattern detected. Possible health risk.",
                now,
            ));
        }
    }

    risks
}

/// Limits for day-over-day change detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendThresholds {
    /// Only records this recent are considered
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// Number of most recent records averaged
    #[serde(default = "default_trend_window")]
    pub window: usize,
    #[serde(default = "default_sleep_change_hours")]
    pub sleep_change_hours: f64,
    /// Latest steps below `average * activity_drop_ratio` is a drop
    #[serde(default = "default_activity_drop_ratio")]
    pub activity_drop_ratio: f64,
    #[serde(default = "default_bathroom_change_visits")]
    pub bathroom_change_visits: f64,
}

fn default_lookback_days() -> u32 {
    7
}

fn default_trend_window() -> usize {
    3
}

fn default_sleep_change_hours() -> f64 {
    2.0
}

fn default_activity_drop_ratio() -> f64 {
    0.5
}

fn default_bathroom_change_visits() -> f64 {
    3.0
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            window: default_trend_window(),
            sleep_change_hours: default_sleep_change_hours(),
            activity_drop_ratio: default_activity_drop_ratio(),
            bathroom_change_visits: default_bathroom_change_visits(),
        }
    }
}

/// Compares the latest daily record against the average of the recent window.
pub fn analyze_trends(
    records: &[DailyRecord],
    thresholds: &TrendThresholds,
    now: DateTime<Utc>,
) -> Vec<Anomaly> {
    let since = now - Duration::days(i64::from(thresholds.lookback_days));
    let mut recent: Vec<&DailyRecord> = records
        .iter()
        .filter(|r| r.recorded_at >= since && r.recorded_at <= now)
        .collect();
    recent.sort_by_key(|r| r.recorded_at);

    let window_start = recent.len().saturating_sub(thresholds.window.max(1));
    let window = &recent[window_start..];
    let latest = match window.last() {
        Some(latest) => *latest,
        None => return Vec::new(),
    };

    let count = window.len() as f64;
    let average = |value: fn(&DailyRecord) -> f64| window.iter().map(|r| value(r)).sum::<f64>() / count;

    let mut anomalies = Vec::new();

    let avg_sleep = average(|r| r.sleep_hours);
    if (latest.sleep_hours - avg_sleep).abs() > thresholds.sleep_change_hours {
        anomalies.push(Anomaly::new(
            NotificationKind::Activity,
            "Sleep Duration Change",
            Severity::High,
            format!(
                "Significant change in sleep pattern detected: {} hours",
                latest.sleep_hours
            ),
            now,
        ));
    }

    let avg_steps = average(|r| r.steps);
    if latest.steps < avg_steps * thresholds.activity_drop_ratio {
        anomalies.push(Anomaly::new(
            NotificationKind::Activity,
            "Activity Drop",
            Severity::Medium,
            "Significant reduction in activity level detected",
            now,
        ));
    }

    let avg_bathroom = average(|r| r.bathroom_visits);
    if (latest.bathroom_visits - avg_bathroom).abs() > thresholds.bathroom_change_visits {
        anomalies.push(Anomaly::new(
            NotificationKind::Activity,
            "Bathroom Usage Change",
            Severity::High,
            "Significant change in bathroom usage pattern detected",
            now,
        ));
    }

    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap()
    }

    fn steps(value: f64) -> BehaviorPattern {
        BehaviorPattern::new("Passos Diários", value, (3000.0, 6000.0), "passos")
    }

    fn sitting(value: f64) -> BehaviorPattern {
        BehaviorPattern::new("Tempo Sentado", value, (6.0, 10.0), "horas")
    }

    fn sleep(value: f64) -> BehaviorPattern {
        BehaviorPattern::new("Horas de Sono", value, (7.0, 9.0), "horas")
    }

    #[test]
    fn test_metric_identification() {
        assert_eq!(MetricKind::identify("daily steps"), Some(MetricKind::DailySteps));
        assert_eq!(MetricKind::identify("Passos Diários"), Some(MetricKind::DailySteps));
        assert_eq!(MetricKind::identify("Sitting Time"), Some(MetricKind::SittingTime));
        assert_eq!(MetricKind::identify("Tempo Sentado"), Some(MetricKind::SittingTime));
        assert_eq!(MetricKind::identify("sleep hours"), Some(MetricKind::SleepHours));
        assert_eq!(MetricKind::identify("Horas de Sono"), Some(MetricKind::SleepHours));
        assert_eq!(MetricKind::identify("Uso do Banheiro"), Some(MetricKind::BathroomUsage));
        assert_eq!(MetricKind::identify("heart rate"), None);
        assert_eq!(MetricKind::identify("Sleep Quality"), None);
        assert_eq!(MetricKind::identify("Steps Goal"), None);
        assert_eq!(MetricKind::identify("Sitting Breaks"), None);
    }

    #[test]
    fn test_similar_metric_names_do_not_predict_risks() {
        let t = PatternThresholds::default();
        let sleep_quality = BehaviorPattern::new("Sleep Quality", 4.0, (3.0, 5.0), "score");
        assert!(predict_risks(&[sleep_quality], &t, now()).is_empty());

        let lookalikes = vec![
            BehaviorPattern::new("Steps Goal", 1000.0, (500.0, 2000.0), "steps"),
            BehaviorPattern::new("Sitting Breaks", 13.0, (6.0, 10.0), "breaks"),
        ];
        assert!(predict_risks(&lookalikes, &t, now()).is_empty());
    }

    #[test]
    fn test_bounds_are_normal() {
        let t = PatternThresholds::default();
        assert!(classify_patterns(&[steps(3000.0)], &t, now()).is_empty());
        assert!(classify_patterns(&[steps(6000.0)], &t, now()).is_empty());
        assert!(classify_patterns(&[steps(4500.0)], &t, now()).is_empty());
    }

    #[test]
    fn test_just_below_min_is_medium() {
        let t = PatternThresholds::default();
        let found = classify_patterns(&[steps(3000.0 - 1e-6)], &t, now());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Medium);
        assert_eq!(found[0].label, "Passos Diários Baixo");
    }

    #[test]
    fn test_far_below_min_is_high() {
        let t = PatternThresholds::default();
        let found = classify_patterns(&[steps(3000.0 * 0.8 - 1e-6)], &t, now());
        assert_eq!(found[0].severity, Severity::High);
        // Exactly min * 0.8 is still medium
        let found = classify_patterns(&[steps(2400.0)], &t, now());
        assert_eq!(found[0].severity, Severity::Medium);
    }

    #[test]
    fn test_above_max() {
        let t = PatternThresholds::default();
        let found = classify_patterns(&[sitting(11.0)], &t, now());
        assert_eq!(found[0].label, "Tempo Sentado Alto");
        assert_eq!(found[0].severity, Severity::Medium);

        let found = classify_patterns(&[sitting(12.5)], &t, now());
        assert_eq!(found[0].severity, Severity::High);
        assert!(found[0].message.contains("12.5 horas"));
    }

    #[test]
    fn test_reference_patterns() {
        let patterns = vec![
            sleep(6.5),
            steps(2500.0),
            BehaviorPattern::new("Uso do Banheiro", 8.0, (4.0, 7.0), "vezes"),
            sitting(12.0),
        ];
        let found = classify_patterns(&patterns, &PatternThresholds::default(), now());
        let labels: Vec<_> = found.iter().map(|a| (a.label.as_str(), a.severity)).collect();
        assert_eq!(
            labels,
            vec![
                ("Horas de Sono Baixo", Severity::Medium),
                ("Passos Diários Baixo", Severity::Medium),
                ("Uso do Banheiro Alto", Severity::Medium),
                ("Tempo Sentado Alto", Severity::Medium),
            ]
        );
    }

    #[test]
    fn test_fall_risk_fires() {
        let t = PatternThresholds::default();
        let risks = predict_risks(&[steps(1500.0), sitting(13.0)], &t, now());
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].label, "Fall Risk");
        assert_eq!(risks[0].severity, Severity::High);
    }

    #[test]
    fn test_fall_risk_needs_both_conditions() {
        let t = PatternThresholds::default();
        assert!(predict_risks(&[steps(5000.0), sitting(13.0)], &t, now()).is_empty());
        assert!(predict_risks(&[steps(1500.0), sitting(12.0)], &t, now()).is_empty());
    }

    #[test]
    fn test_missing_metric_skips_rule() {
        let t = PatternThresholds::default();
        assert!(predict_risks(&[steps(100.0)], &t, now()).is_empty());
        assert!(predict_risks(&[], &t, now()).is_empty());
    }

    #[test]
    fn test_sleep_disorder_and_fall_risk_together() {
        let t = PatternThresholds::default();
        let patterns = vec![
            BehaviorPattern::new("daily steps", 1500.0, (3000.0, 6000.0), "steps"),
            BehaviorPattern::new("sitting time", 13.0, (6.0, 10.0), "hours"),
            BehaviorPattern::new("sleep hours", 5.0, (7.0, 9.0), "hours"),
        ];
        let risks = predict_risks(&patterns, &t, now());
        let labels: Vec<_> = risks.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Fall Risk", "Sleep Disorder"]);
        assert_eq!(risks[1].severity, Severity::Medium);
    }

    fn record(days_ago: i64, sleep_hours: f64, steps: f64, bathroom_visits: f64) -> DailyRecord {
        DailyRecord {
            recorded_at: now() - Duration::days(days_ago),
            sleep_hours,
            steps,
            bathroom_visits,
        }
    }

    #[test]
    fn test_trends_empty_history() {
        assert!(analyze_trends(&[], &TrendThresholds::default(), now()).is_empty());
    }

    #[test]
    fn test_trends_stable_history() {
        let records = vec![
            record(2, 7.5, 4000.0, 5.0),
            record(1, 7.0, 4200.0, 6.0),
            record(0, 7.2, 3900.0, 5.0),
        ];
        assert!(analyze_trends(&records, &TrendThresholds::default(), now()).is_empty());
    }

    #[test]
    fn test_trends_flag_changes() {
        let records = vec![
            record(2, 8.0, 6000.0, 4.0),
            record(1, 8.0, 6000.0, 4.0),
            // Latest: sleep avg 6.0 -> |2-6| = 4; steps avg 4100 -> 300 < 2050; bathroom avg 7 -> 13-7 = 6
            record(0, 2.0, 300.0, 13.0),
        ];
        let found = analyze_trends(&records, &TrendThresholds::default(), now());
        let labels: Vec<_> = found.iter().map(|a| (a.label.as_str(), a.severity)).collect();
        assert_eq!(
            labels,
            vec![
                ("Sleep Duration Change", Severity::High),
                ("Activity Drop", Severity::Medium),
                ("Bathroom Usage Change", Severity::High),
            ]
        );
    }

    #[test]
    fn test_trends_ignore_old_records() {
        let records = vec![
            // Outside the 7 day lookback: would otherwise drag the averages
            record(10, 12.0, 20000.0, 1.0),
            record(9, 12.0, 20000.0, 1.0),
            record(0, 7.0, 4000.0, 5.0),
        ];
        assert!(analyze_trends(&records, &TrendThresholds::default(), now()).is_empty());
    }

    #[test]
    fn test_trends_use_latest_window_only() {
        let records = vec![
            record(6, 7.0, 100.0, 5.0),
            record(3, 7.0, 4000.0, 5.0),
            record(2, 7.0, 4000.0, 5.0),
            record(1, 7.0, 4000.0, 5.0),
        ];
        assert!(analyze_trends(&records, &TrendThresholds::default(), now()).is_empty());
    }
}
