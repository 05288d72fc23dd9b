use std::sync::{Arc, RwLock};
use std::time;

use lazy_static::lazy_static;

use crate::basetypes::{Annotation, Attributes, SpanID, Status};
use crate::trace::SpanContext;

/// Exporter is a trait for structs that receive finished spans.
///
/// The export_span method should be safe for concurrent use and should
/// return quickly; if an Exporter takes a significant amount of time to
/// process a SpanData, that work should be done on another thread.
///
/// Batching, transport and backend wire formats belong entirely to
/// Exporter implementations; the tracer only hands over SpanData.
pub trait Exporter {
    fn export_span(&self, s: &SpanData);
}

type Exporters = RwLock<Vec<Arc<dyn Exporter + Send + Sync>>>;

lazy_static! {
    pub(crate) static ref EXPORTERS: Exporters = RwLock::new(Vec::new());
}

/// register_exporter adds to the list of Exporters that will receive
/// sampled spans once they end.
///
/// Binaries should register exporters, libraries shouldn't.
pub fn register_exporter(e: Arc<dyn Exporter + Send + Sync>) {
    let mut exporters = EXPORTERS.write().unwrap();
    if exporters.iter().any(|exporter| Arc::ptr_eq(exporter, &e)) {
        return;
    }
    log::debug!("registering span exporter");
    exporters.push(e);
}

/// unregister_exporter removes from the list of Exporters the Exporter
/// that was registered with the given Arc.
pub fn unregister_exporter(e: &Arc<dyn Exporter + Send + Sync>) {
    let mut exporters = EXPORTERS.write().unwrap();
    exporters.retain(|exporter| !Arc::ptr_eq(exporter, e));
}

/// SpanData contains all the information collected by a Span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanData {
    pub span_context: SpanContext,
    pub parent_span_id: Option<SpanID>,
    /// The full composed name, `root.action1.action2...`.
    pub name: String,
    /// Resource identity of the producing service.
    pub service_name: String,
    pub environment: String,
    pub start_time: time::Instant,
    pub end_time: Option<time::Instant>,
    pub attributes: Attributes,
    pub annotations: Vec<Annotation>,
    pub status: Option<Status>,
    pub has_remote_parent: bool,
}

/// ConsoleExporter writes a one-line summary of every finished span to the
/// process logger. The development default; production deployments
/// register a real backend exporter instead.
pub struct ConsoleExporter;

impl Exporter for ConsoleExporter {
    fn export_span(&self, s: &SpanData) {
        log::info!(
            "span ended name={} trace_id={} span_id={} service={} status={:?}",
            s.name,
            s.span_context.trace_id,
            s.span_context.span_id,
            s.service_name,
            s.status,
        );
    }
}
