//! Concurrent per-series state.
//!
//! Every labeled series owns one cell; all mutation is lock-free atomics so
//! the request hot path never blocks on anything wider than a CAS retry.
//! f64 values live in `AtomicU64` bit patterns (counters must accept
//! fractional deltas such as CPU seconds).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{MetricsError, Result};

/// f64 stored as raw bits; add() is a CAS loop.
#[derive(Debug, Default)]
pub(crate) struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub(crate) fn new(v: f64) -> Self {
        Self(AtomicU64::new(v.to_bits()))
    }

    pub(crate) fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn set(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn add(&self, delta: f64) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }
}

/// Monotonically non-decreasing value. Negative or non-finite deltas are
/// rejected and leave the value untouched.
#[derive(Debug, Default)]
pub struct CounterCell {
    value: AtomicF64,
}

impl CounterCell {
    pub fn inc(&self, delta: f64) -> Result<()> {
        if delta < 0.0 || !delta.is_finite() {
            return Err(MetricsError::InvalidDelta(format!(
                "counter increment must be a finite value >= 0, got {delta}"
            )));
        }
        self.value.add(delta);
        Ok(())
    }

    pub fn value(&self) -> f64 {
        self.value.get()
    }
}

/// Point-in-time value; set or moved by arbitrary deltas.
#[derive(Debug, Default)]
pub struct GaugeCell {
    value: AtomicF64,
}

impl GaugeCell {
    pub fn set(&self, v: f64) {
        self.value.set(v);
    }

    pub fn add(&self, delta: f64) {
        self.value.add(delta);
    }

    pub fn value(&self) -> f64 {
        self.value.get()
    }
}

/// Distribution over fixed ascending boundaries.
///
/// Buckets are stored non-cumulative: an observation increments exactly one
/// slot, found by binary search (O(log B)). Cumulative "le" counts are
/// produced at snapshot time, which makes them monotone in boundary order by
/// construction.
#[derive(Debug)]
pub struct HistogramCell {
    boundaries: Vec<f64>,
    /// `boundaries.len() + 1` slots; the last is the +Inf overflow bucket.
    slots: Vec<AtomicU64>,
    sum: AtomicF64,
    count: AtomicU64,
}

impl HistogramCell {
    pub(crate) fn new(boundaries: &[f64]) -> Self {
        let slots = (0..=boundaries.len()).map(|_| AtomicU64::new(0)).collect();
        Self {
            boundaries: boundaries.to_vec(),
            slots,
            sum: AtomicF64::new(0.0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, v: f64) {
        // First boundary >= v; everything past the end lands in +Inf.
        let idx = self.boundaries.partition_point(|b| *b < v);
        self.slots[idx].fetch_add(1, Ordering::Relaxed);
        self.sum.add(v);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Cumulative counts (one per boundary plus the +Inf slot), total sum,
    /// total count. Count is derived from the slots so the `+Inf` line always
    /// equals `_count` even while writers race.
    pub fn read(&self) -> (Vec<u64>, f64, u64) {
        let mut cumulative = Vec::with_capacity(self.slots.len());
        let mut running = 0u64;
        for slot in &self.slots {
            running += slot.load(Ordering::Relaxed);
            cumulative.push(running);
        }
        (cumulative, self.sum.get(), running)
    }
}

/// Constant informational series (rendered as a gauge with value 1).
#[derive(Debug)]
pub struct InfoCell {
    pub(crate) pairs: Vec<(String, String)>,
}

/// One labeled series of any kind.
#[derive(Debug)]
pub enum SeriesCell {
    Counter(CounterCell),
    Gauge(GaugeCell),
    Histogram(HistogramCell),
    Info(InfoCell),
}
