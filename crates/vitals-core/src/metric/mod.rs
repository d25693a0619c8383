//! Metric model: descriptors, concurrent series cells, the registry, and
//! point-in-time snapshots.

mod desc;
mod registry;
mod series;
mod snapshot;

pub use desc::{MetricDescriptor, MetricKind};
pub use registry::{Counter, Gauge, Histogram, MetricHandle, Registry};
pub use series::{CounterCell, GaugeCell, HistogramCell, SeriesCell};
pub use snapshot::{
    FamilySnapshot, HistogramSnapshot, RegistrySnapshot, SeriesSnapshot, SeriesValue,
};
