use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use rand_core::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::basetypes::{SpanID, TraceID};

/// IDGenerator produces the identities of locally originated spans and
/// traces.
pub trait IDGenerator {
    fn new_trace_id(&self) -> TraceID;
    fn new_span_id(&self) -> SpanID;
}

/// default_id_generator returns the process-wide generator used by tracers
/// that were not given one explicitly.
pub fn default_id_generator() -> Arc<dyn IDGenerator + Send + Sync> {
    lazy_static! {
        static ref DEFAULT_ID_GENERATOR: Arc<dyn IDGenerator + Send + Sync> =
            Arc::new(DefaultIDGenerator::new());
    }
    Arc::clone(&DEFAULT_ID_GENERATOR)
}

/// DefaultIDGenerator draws ids from a clock-seeded Xoshiro256+ source.
pub struct DefaultIDGenerator {
    source: Mutex<Xoshiro256Plus>,
}

impl DefaultIDGenerator {
    fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64 ^ d.as_secs())
            .unwrap_or(0);
        DefaultIDGenerator {
            source: Mutex::new(Xoshiro256Plus::seed_from_u64(seed)),
        }
    }
}

impl IDGenerator for DefaultIDGenerator {
    fn new_trace_id(&self) -> TraceID {
        let mut trace_id: [u8; 16] = [0; 16];
        let mut source = self.source.lock().unwrap();
        (*source).fill_bytes(&mut trace_id[..]);
        TraceID(trace_id)
    }

    fn new_span_id(&self) -> SpanID {
        let mut span_id: [u8; 8] = [0; 8];
        let mut source = self.source.lock().unwrap();
        (*source).fill_bytes(&mut span_id[..]);
        SpanID(span_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_nonzero_and_distinct() {
        let gen = default_id_generator();
        let trace_id = gen.new_trace_id();
        let span_id = gen.new_span_id();
        assert!(!trace_id.is_zero());
        assert!(!span_id.is_zero());
        assert_ne!(gen.new_span_id(), span_id);
        assert_ne!(gen.new_trace_id(), trace_id);
    }
}
