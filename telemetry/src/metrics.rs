//! Metric instrument pass-throughs.
//!
//! Instruments validate nothing beyond their own recording rules and keep
//! no state: every recording is forwarded as a Measurement to the
//! registered MetricsExporters, which own aggregation and transport.

use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;

use crate::basetypes::Attributes;

/// MetricsExporter is a trait for structs that receive instrument
/// measurements. Implementations should be safe for concurrent use and
/// return quickly.
pub trait MetricsExporter {
    fn export_measurement(&self, m: &Measurement);
}

type MetricsExporters = RwLock<Vec<Arc<dyn MetricsExporter + Send + Sync>>>;

lazy_static! {
    static ref METRICS_EXPORTERS: MetricsExporters = RwLock::new(Vec::new());
}

/// register_metrics_exporter adds to the list of MetricsExporters that
/// will receive measurements.
pub fn register_metrics_exporter(e: Arc<dyn MetricsExporter + Send + Sync>) {
    let mut exporters = METRICS_EXPORTERS.write().unwrap();
    if exporters.iter().any(|exporter| Arc::ptr_eq(exporter, &e)) {
        return;
    }
    exporters.push(e);
}

/// unregister_metrics_exporter removes the MetricsExporter that was
/// registered with the given Arc.
pub fn unregister_metrics_exporter(e: &Arc<dyn MetricsExporter + Send + Sync>) {
    let mut exporters = METRICS_EXPORTERS.write().unwrap();
    exporters.retain(|exporter| !Arc::ptr_eq(exporter, e));
}

fn export_measurement(m: &Measurement) {
    let exporters = METRICS_EXPORTERS.read().unwrap();
    for exporter in &*exporters {
        exporter.export_measurement(m);
    }
}

/// InstrumentKind distinguishes the instrument a measurement came from.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum InstrumentKind {
    /// Monotonically increasing sum.
    Counter,
    /// Sum whose increments may be negative.
    UpDownCounter,
    /// Latest-value instrument.
    Gauge,
    /// Distribution of observed values.
    Histogram,
}

/// InstrumentDescriptor identifies an instrument to exporters.
#[derive(Clone, PartialEq, Debug)]
pub struct InstrumentDescriptor {
    /// Dotted instrument name.
    pub name: String,
    /// The instrument the measurement came from.
    pub kind: InstrumentKind,
    /// Unit of measure, free-form.
    pub unit: String,
    /// Human-readable description.
    pub description: String,
    /// Advisory explicit bucket boundaries, histograms only.
    pub boundaries: Option<Vec<f64>>,
}

/// Measurement is one recorded instrument value.
#[derive(Clone, PartialEq, Debug)]
pub struct Measurement {
    /// The instrument that produced the value.
    pub descriptor: Arc<InstrumentDescriptor>,
    /// The recorded value.
    pub value: f64,
    /// Attributes recorded with the value.
    pub attributes: Attributes,
}

fn descriptor(
    name: &str,
    kind: InstrumentKind,
    unit: &str,
    description: &str,
    boundaries: Option<Vec<f64>>,
) -> Arc<InstrumentDescriptor> {
    Arc::new(InstrumentDescriptor {
        name: name.to_string(),
        kind,
        unit: unit.to_string(),
        description: description.to_string(),
        boundaries,
    })
}

/// Counter is a monotonically increasing instrument.
#[derive(Clone, Debug)]
pub struct Counter {
    descriptor: Arc<InstrumentDescriptor>,
}

impl Counter {
    /// new creates a counter instrument.
    pub fn new(name: &str, unit: &str, description: &str) -> Counter {
        Counter {
            descriptor: descriptor(name, InstrumentKind::Counter, unit, description, None),
        }
    }

    /// add records an increment. Counters are monotonic; negative amounts
    /// are dropped with a warning rather than exported.
    pub fn add(&self, amount: f64, attributes: Attributes) {
        if amount < 0.0 {
            log::warn!(
                "counter {} dropped negative increment {}",
                self.descriptor.name,
                amount
            );
            return;
        }
        export_measurement(&Measurement {
            descriptor: Arc::clone(&self.descriptor),
            value: amount,
            attributes,
        });
    }
}

/// UpDownCounter is a counter whose increments may be negative.
#[derive(Clone, Debug)]
pub struct UpDownCounter {
    descriptor: Arc<InstrumentDescriptor>,
}

impl UpDownCounter {
    /// new creates an up-down counter instrument.
    pub fn new(name: &str, unit: &str, description: &str) -> UpDownCounter {
        UpDownCounter {
            descriptor: descriptor(name, InstrumentKind::UpDownCounter, unit, description, None),
        }
    }

    /// add records a signed increment.
    pub fn add(&self, amount: f64, attributes: Attributes) {
        export_measurement(&Measurement {
            descriptor: Arc::clone(&self.descriptor),
            value: amount,
            attributes,
        });
    }
}

/// Gauge records the latest value of a quantity.
#[derive(Clone, Debug)]
pub struct Gauge {
    descriptor: Arc<InstrumentDescriptor>,
}

impl Gauge {
    /// new creates a gauge instrument.
    pub fn new(name: &str, unit: &str, description: &str) -> Gauge {
        Gauge {
            descriptor: descriptor(name, InstrumentKind::Gauge, unit, description, None),
        }
    }

    /// set records the current value.
    pub fn set(&self, value: f64, attributes: Attributes) {
        export_measurement(&Measurement {
            descriptor: Arc::clone(&self.descriptor),
            value,
            attributes,
        });
    }
}

/// Histogram records a distribution of values.
#[derive(Clone, Debug)]
pub struct Histogram {
    descriptor: Arc<InstrumentDescriptor>,
}

impl Histogram {
    /// new creates a histogram instrument with default buckets.
    pub fn new(name: &str, unit: &str, description: &str) -> Histogram {
        Histogram::with_boundaries(name, unit, description, None)
    }

    /// with_boundaries creates a histogram carrying advisory explicit
    /// bucket boundaries for the backend.
    pub fn with_boundaries(
        name: &str,
        unit: &str,
        description: &str,
        boundaries: Option<Vec<f64>>,
    ) -> Histogram {
        Histogram {
            descriptor: descriptor(name, InstrumentKind::Histogram, unit, description, boundaries),
        }
    }

    /// record adds one observation to the distribution.
    pub fn record(&self, value: f64, attributes: Attributes) {
        export_measurement(&Measurement {
            descriptor: Arc::clone(&self.descriptor),
            value,
            attributes,
        });
    }
}
