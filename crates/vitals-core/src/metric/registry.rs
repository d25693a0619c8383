//! The metric registry: registered families, lazy labeled series, snapshots.
//!
//! Constructed once at process start and passed by `Arc` to every writer and
//! reader; there is no ambient global. The family map and each family's
//! series map are `DashMap`s, so the only contended path is the one-time lazy
//! creation of a new label combination — increments and observations go
//! straight to the per-series atomics.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::error::{MetricsError, Result};

use super::desc::{MetricDescriptor, MetricKind};
use super::series::{CounterCell, GaugeCell, HistogramCell, InfoCell, SeriesCell};
use super::snapshot::{FamilySnapshot, RegistrySnapshot, SeriesSnapshot, SeriesValue};

#[derive(Debug)]
pub(crate) struct MetricFamily {
    desc: MetricDescriptor,
    series: DashMap<Vec<String>, Arc<SeriesCell>>,
}

impl MetricFamily {
    fn new(desc: MetricDescriptor) -> Self {
        Self {
            desc,
            series: DashMap::new(),
        }
    }

    fn snapshot(&self) -> FamilySnapshot {
        let mut series: Vec<SeriesSnapshot> = self
            .series
            .iter()
            .map(|entry| {
                let value = match entry.value().as_ref() {
                    SeriesCell::Counter(c) => SeriesValue::Counter(c.value()),
                    SeriesCell::Gauge(g) => SeriesValue::Gauge(g.value()),
                    SeriesCell::Histogram(h) => {
                        let (cumulative, sum, count) = h.read();
                        SeriesValue::Histogram(super::snapshot::HistogramSnapshot {
                            boundaries: h.boundaries().to_vec(),
                            cumulative,
                            sum,
                            count,
                        })
                    }
                    SeriesCell::Info(i) => SeriesValue::Info(i.pairs.clone()),
                };
                SeriesSnapshot {
                    label_values: entry.key().clone(),
                    value,
                }
            })
            .collect();
        // Deterministic output regardless of map iteration order.
        series.sort_by(|a, b| a.label_values.cmp(&b.label_values));

        FamilySnapshot {
            name: self.desc.name.clone(),
            help: self.desc.help.clone(),
            kind: self.desc.kind,
            label_names: self.desc.label_names.clone(),
            series,
        }
    }
}

/// Typed handle onto a counter series.
#[derive(Clone)]
pub struct Counter {
    cell: Arc<SeriesCell>,
}

impl Counter {
    /// Increment by `delta` (>= 0). `InvalidDelta` otherwise.
    pub fn inc(&self, delta: f64) -> Result<()> {
        match self.cell.as_ref() {
            SeriesCell::Counter(c) => c.inc(delta),
            _ => Err(MetricsError::Internal("handle kind mismatch".into())),
        }
    }

    pub fn value(&self) -> f64 {
        match self.cell.as_ref() {
            SeriesCell::Counter(c) => c.value(),
            _ => 0.0,
        }
    }
}

/// Typed handle onto a gauge series.
#[derive(Clone)]
pub struct Gauge {
    cell: Arc<SeriesCell>,
}

impl Gauge {
    pub fn set(&self, v: f64) {
        if let SeriesCell::Gauge(g) = self.cell.as_ref() {
            g.set(v);
        }
    }

    pub fn add(&self, delta: f64) {
        if let SeriesCell::Gauge(g) = self.cell.as_ref() {
            g.add(delta);
        }
    }

    pub fn value(&self) -> f64 {
        match self.cell.as_ref() {
            SeriesCell::Gauge(g) => g.value(),
            _ => 0.0,
        }
    }
}

/// Typed handle onto a histogram series.
#[derive(Clone)]
pub struct Histogram {
    cell: Arc<SeriesCell>,
}

impl Histogram {
    pub fn observe(&self, v: f64) {
        if let SeriesCell::Histogram(h) = self.cell.as_ref() {
            h.observe(v);
        }
    }
}

/// Handle to one registered family; resolves label tuples to series cells.
#[derive(Clone)]
pub struct MetricHandle {
    family: Arc<MetricFamily>,
}

impl MetricHandle {
    pub fn name(&self) -> &str {
        &self.family.desc.name
    }

    fn series(&self, label_values: &[&str]) -> Result<Arc<SeriesCell>> {
        let desc = &self.family.desc;
        if label_values.len() != desc.label_names.len() {
            return Err(MetricsError::InvalidDelta(format!(
                "{}: expected {} label values, got {}",
                desc.name,
                desc.label_names.len(),
                label_values.len()
            )));
        }
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        if let Some(existing) = self.family.series.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }
        // Lazy-creation path; the entry lock is scoped to this insert.
        let cell = self
            .family
            .series
            .entry(key)
            .or_insert_with(|| {
                Arc::new(match desc.kind {
                    MetricKind::Counter => SeriesCell::Counter(CounterCell::default()),
                    MetricKind::Gauge => SeriesCell::Gauge(GaugeCell::default()),
                    MetricKind::Histogram => {
                        SeriesCell::Histogram(HistogramCell::new(&desc.buckets))
                    }
                    MetricKind::Info => SeriesCell::Info(InfoCell { pairs: Vec::new() }),
                })
            })
            .value()
            .clone();
        Ok(cell)
    }

    pub fn counter(&self, label_values: &[&str]) -> Result<Counter> {
        Ok(Counter {
            cell: self.series(label_values)?,
        })
    }

    pub fn gauge(&self, label_values: &[&str]) -> Result<Gauge> {
        Ok(Gauge {
            cell: self.series(label_values)?,
        })
    }

    pub fn histogram(&self, label_values: &[&str]) -> Result<Histogram> {
        Ok(Histogram {
            cell: self.series(label_values)?,
        })
    }

    /// Replace the single info series with the given constant pairs.
    pub fn set_info(&self, pairs: &[(&str, &str)]) {
        let cell = SeriesCell::Info(InfoCell {
            pairs: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        self.family.series.insert(Vec::new(), Arc::new(cell));
    }
}

/// Process-wide metric registry.
#[derive(Debug, Default)]
pub struct Registry {
    families: DashMap<String, Arc<MetricFamily>>,
    /// Registration order, for stable exposition output.
    order: Mutex<Vec<Arc<MetricFamily>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a family. Idempotent for an identical schema; a name collision
    /// with a different kind, label set, or bucket layout is a
    /// `DuplicateMetric` error (fatal at startup by policy).
    pub fn register(&self, desc: MetricDescriptor) -> Result<MetricHandle> {
        desc.validate()?;
        match self.families.entry(desc.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(existing) => {
                let family = existing.get();
                if family.desc.schema_matches(&desc) {
                    Ok(MetricHandle {
                        family: Arc::clone(family),
                    })
                } else {
                    Err(MetricsError::DuplicateMetric(desc.name))
                }
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let family = Arc::new(MetricFamily::new(desc));
                slot.insert(Arc::clone(&family));
                self.push_order(Arc::clone(&family));
                Ok(MetricHandle { family })
            }
        }
    }

    fn push_order(&self, family: Arc<MetricFamily>) {
        let mut order = self.order.lock().unwrap_or_else(|e| e.into_inner());
        order.push(family);
    }

    /// Point-in-time view of every family. Each series is read atomically;
    /// cross-series consistency is intentionally not guaranteed.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let order = self.order.lock().unwrap_or_else(|e| e.into_inner());
        RegistrySnapshot {
            families: order.iter().map(|f| f.snapshot()).collect(),
        }
    }
}
