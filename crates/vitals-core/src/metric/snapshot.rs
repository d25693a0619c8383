//! Immutable registry snapshots.
//!
//! A snapshot is per-series consistent (each series read atomically under its
//! own cell) but not globally atomic across series — exposition is a
//! point-in-time approximation by design.

use serde::Serialize;

use super::desc::MetricKind;

/// Frozen histogram state: cumulative "le" counts (one per boundary plus the
/// implicit +Inf slot), sum, and count.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramSnapshot {
    pub boundaries: Vec<f64>,
    pub cumulative: Vec<u64>,
    pub sum: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesValue {
    Counter(f64),
    Gauge(f64),
    Histogram(HistogramSnapshot),
    Info(Vec<(String, String)>),
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesSnapshot {
    pub label_values: Vec<String>,
    pub value: SeriesValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilySnapshot {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub label_names: Vec<String>,
    pub series: Vec<SeriesSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub families: Vec<FamilySnapshot>,
}

impl RegistrySnapshot {
    pub fn family(&self, name: &str) -> Option<&FamilySnapshot> {
        self.families.iter().find(|f| f.name == name)
    }

    /// Sum of a counter family across all its labeled series.
    pub fn counter_total(&self, name: &str) -> f64 {
        self.family(name)
            .map(|f| {
                f.series
                    .iter()
                    .filter_map(|s| match &s.value {
                        SeriesValue::Counter(v) => Some(*v),
                        _ => None,
                    })
                    .sum()
            })
            .unwrap_or(0.0)
    }

    /// Value of an unlabeled (or first) gauge series, if present.
    pub fn gauge_value(&self, name: &str) -> Option<f64> {
        self.family(name).and_then(|f| {
            f.series.iter().find_map(|s| match &s.value {
                SeriesValue::Gauge(v) => Some(*v),
                _ => None,
            })
        })
    }

    /// Merge every series of a histogram family into one distribution.
    /// Series of one family always share a bucket layout.
    pub fn histogram_merged(&self, name: &str) -> Option<HistogramSnapshot> {
        let family = self.family(name)?;
        let mut merged: Option<HistogramSnapshot> = None;
        for series in &family.series {
            if let SeriesValue::Histogram(h) = &series.value {
                match merged.as_mut() {
                    None => merged = Some(h.clone()),
                    Some(m) => {
                        for (slot, add) in m.cumulative.iter_mut().zip(&h.cumulative) {
                            *slot += add;
                        }
                        m.sum += h.sum;
                        m.count += h.count;
                    }
                }
            }
        }
        merged
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::metric::{MetricDescriptor, Registry};

    #[test]
    fn histogram_merge_sums_series() {
        let reg = Registry::new();
        let h = reg
            .register(MetricDescriptor::histogram(
                "latency",
                "seconds",
                &["method"],
                &[0.1, 1.0],
            ))
            .unwrap();
        h.histogram(&["GET"]).unwrap().observe(0.05);
        h.histogram(&["GET"]).unwrap().observe(0.5);
        h.histogram(&["POST"]).unwrap().observe(5.0);

        let merged = reg.snapshot().histogram_merged("latency").unwrap();
        assert_eq!(merged.cumulative, vec![1, 2, 3]);
        assert_eq!(merged.count, 3);
        assert!((merged.sum - 5.55).abs() < 1e-9);
    }

    #[test]
    fn lookups_on_missing_families_are_benign() {
        let snap = Registry::new().snapshot();
        assert_eq!(snap.counter_total("nope"), 0.0);
        assert!(snap.gauge_value("nope").is_none());
        assert!(snap.histogram_merged("nope").is_none());
    }
}
