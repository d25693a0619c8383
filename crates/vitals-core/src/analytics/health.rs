//! Composite health scoring and threshold alerting.
//!
//! Thresholds and weights arrive from configuration; nothing here is a
//! load-bearing constant. The score starts at 100 and loses weighted penalty
//! points proportional to how far each signal sits above its threshold.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::names;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthThresholds {
    #[serde(default = "default_cpu_percent")]
    pub cpu_percent: f64,
    #[serde(default = "default_memory_percent")]
    pub memory_percent: f64,
    #[serde(default = "default_error_rate_percent")]
    pub error_rate_percent: f64,
    #[serde(default = "default_p95_latency_seconds")]
    pub p95_latency_seconds: f64,
    #[serde(default = "default_active_requests")]
    pub active_requests: f64,
}

fn default_cpu_percent() -> f64 {
    80.0
}
fn default_memory_percent() -> f64 {
    85.0
}
fn default_error_rate_percent() -> f64 {
    5.0
}
fn default_p95_latency_seconds() -> f64 {
    2.0
}
fn default_active_requests() -> f64 {
    100.0
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            cpu_percent: default_cpu_percent(),
            memory_percent: default_memory_percent(),
            error_rate_percent: default_error_rate_percent(),
            p95_latency_seconds: default_p95_latency_seconds(),
            active_requests: default_active_requests(),
        }
    }
}

/// Penalty weights per component. Error rate carries the heaviest weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthWeights {
    #[serde(default = "default_weight_cpu")]
    pub cpu: f64,
    #[serde(default = "default_weight_memory")]
    pub memory: f64,
    #[serde(default = "default_weight_error_rate")]
    pub error_rate: f64,
    #[serde(default = "default_weight_latency")]
    pub latency: f64,
}

fn default_weight_cpu() -> f64 {
    20.0
}
fn default_weight_memory() -> f64 {
    20.0
}
fn default_weight_error_rate() -> f64 {
    35.0
}
fn default_weight_latency() -> f64 {
    25.0
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            cpu: default_weight_cpu(),
            memory: default_weight_memory(),
            error_rate: default_weight_error_rate(),
            latency: default_weight_latency(),
        }
    }
}

/// Signals the score is computed from, gathered by the analyzer.
#[derive(Debug, Clone, Default)]
pub struct HealthInputs {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub error_rate_percent: f64,
    pub p95_latency_seconds: Option<f64>,
    pub active_requests: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthStatus {
    fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            HealthStatus::Excellent
        } else if score >= 75.0 {
            HealthStatus::Good
        } else if score >= 60.0 {
            HealthStatus::Fair
        } else if score >= 40.0 {
            HealthStatus::Poor
        } else {
            HealthStatus::Critical
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentPenalty {
    pub value: f64,
    pub threshold: f64,
    pub penalty: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub score: f64,
    pub status: HealthStatus,
    pub components: BTreeMap<String, ComponentPenalty>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthPolicy {
    pub thresholds: HealthThresholds,
    pub weights: HealthWeights,
}

impl HealthPolicy {
    /// score = 100 − Σ weightᵢ × max(0, valueᵢ/thresholdᵢ − 1), clamped to
    /// [0, 100]. A signal exactly at its threshold costs nothing; one at 2×
    /// costs its full weight.
    pub fn assess(&self, inputs: &HealthInputs) -> HealthReport {
        let mut components = BTreeMap::new();
        let mut score = 100.0;

        let mut apply = |key: &str, value: f64, threshold: f64, weight: f64| {
            let excess = if threshold > 0.0 {
                (value / threshold - 1.0).max(0.0)
            } else {
                0.0
            };
            let penalty = weight * excess;
            score -= penalty;
            components.insert(
                key.to_string(),
                ComponentPenalty {
                    value,
                    threshold,
                    penalty,
                },
            );
        };

        apply(
            names::KEY_CPU_PERCENT,
            inputs.cpu_percent,
            self.thresholds.cpu_percent,
            self.weights.cpu,
        );
        apply(
            names::KEY_MEMORY_PERCENT,
            inputs.memory_percent,
            self.thresholds.memory_percent,
            self.weights.memory,
        );
        apply(
            names::KEY_ERROR_RATE_PERCENT,
            inputs.error_rate_percent,
            self.thresholds.error_rate_percent,
            self.weights.error_rate,
        );
        apply(
            names::KEY_P95_LATENCY_SECONDS,
            inputs.p95_latency_seconds.unwrap_or(0.0),
            self.thresholds.p95_latency_seconds,
            self.weights.latency,
        );

        let score = score.clamp(0.0, 100.0);
        HealthReport {
            score,
            status: HealthStatus::from_score(score),
            components,
        }
    }
}

// ---- threshold alerting ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// One static alert rule; read-only at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertThreshold {
    pub metric_key: String,
    pub comparator: Comparator,
    pub limit: f64,
    pub severity: Severity,
}

/// A rule currently breached, with the observed value alongside the limit.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveAlert {
    pub metric_key: String,
    pub severity: Severity,
    pub observed: f64,
    pub limit: f64,
    pub message: String,
}

/// Evaluate every rule against the current values; rules whose key has no
/// current value are skipped.
pub fn evaluate_alerts(
    rules: &[AlertThreshold],
    current: &BTreeMap<String, f64>,
) -> Vec<ActiveAlert> {
    let mut breached = Vec::new();
    for rule in rules {
        let Some(&observed) = current.get(&rule.metric_key) else {
            continue;
        };
        let hit = match rule.comparator {
            Comparator::Above => observed > rule.limit,
            Comparator::Below => observed < rule.limit,
        };
        if hit {
            let direction = match rule.comparator {
                Comparator::Above => "exceeds",
                Comparator::Below => "is below",
            };
            breached.push(ActiveAlert {
                metric_key: rule.metric_key.clone(),
                severity: rule.severity,
                observed,
                limit: rule.limit,
                message: format!(
                    "{} ({observed:.1}) {direction} threshold ({:.1})",
                    rule.metric_key, rule.limit
                ),
            });
        }
    }
    breached
}

/// The default warning/critical ladder.
pub fn default_alert_rules() -> Vec<AlertThreshold> {
    fn above(key: &str, limit: f64, severity: Severity) -> AlertThreshold {
        AlertThreshold {
            metric_key: key.to_string(),
            comparator: Comparator::Above,
            limit,
            severity,
        }
    }
    vec![
        above(names::KEY_CPU_PERCENT, 80.0, Severity::Warning),
        above(names::KEY_CPU_PERCENT, 95.0, Severity::Critical),
        above(names::KEY_MEMORY_PERCENT, 85.0, Severity::Warning),
        above(names::KEY_MEMORY_PERCENT, 95.0, Severity::Critical),
        above(names::KEY_ERROR_RATE_PERCENT, 5.0, Severity::Warning),
        above(names::KEY_ERROR_RATE_PERCENT, 15.0, Severity::Critical),
        above(names::KEY_P95_LATENCY_SECONDS, 2.0, Severity::Warning),
        above(names::KEY_P95_LATENCY_SECONDS, 5.0, Severity::Critical),
        above(names::KEY_ACTIVE_REQUESTS, 100.0, Severity::Warning),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn all_healthy_scores_one_hundred() {
        let policy = HealthPolicy::default();
        let report = policy.assess(&HealthInputs {
            cpu_percent: 10.0,
            memory_percent: 20.0,
            error_rate_percent: 0.0,
            p95_latency_seconds: Some(0.1),
            active_requests: 3.0,
        });
        assert_eq!(report.score, 100.0);
        assert_eq!(report.status, HealthStatus::Excellent);
    }

    #[test]
    fn cpu_at_twice_threshold_costs_its_weight() {
        let policy = HealthPolicy::default();
        let report = policy.assess(&HealthInputs {
            cpu_percent: 160.0, // 2x the 80% threshold
            ..HealthInputs::default()
        });
        assert!(report.score < 100.0);
        assert!(report.score > 0.0);
        assert_eq!(report.score, 100.0 - policy.weights.cpu);
    }

    #[test]
    fn score_is_clamped_at_zero() {
        let policy = HealthPolicy::default();
        let report = policy.assess(&HealthInputs {
            cpu_percent: 10_000.0,
            memory_percent: 10_000.0,
            error_rate_percent: 100.0,
            p95_latency_seconds: Some(60.0),
            active_requests: 0.0,
        });
        assert_eq!(report.score, 0.0);
        assert_eq!(report.status, HealthStatus::Critical);
    }

    #[test]
    fn alerts_report_breached_rules_only() {
        let mut current = BTreeMap::new();
        current.insert("cpu_percent".to_string(), 90.0);
        current.insert("memory_percent".to_string(), 50.0);
        current.insert("error_rate_percent".to_string(), 1.0);

        let breached = evaluate_alerts(&default_alert_rules(), &current);
        assert_eq!(breached.len(), 1);
        assert_eq!(breached[0].metric_key, "cpu_percent");
        assert_eq!(breached[0].severity, Severity::Warning);
        assert_eq!(breached[0].observed, 90.0);
        assert_eq!(breached[0].limit, 80.0);
    }

    #[test]
    fn rules_without_current_values_are_skipped() {
        let breached = evaluate_alerts(&default_alert_rules(), &BTreeMap::new());
        assert!(breached.is_empty());
    }
}
