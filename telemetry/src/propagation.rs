//! Carrier codec for continuing a trace started in another process.
//!
//! A carrier is the transport-agnostic, string-keyed representation of a
//! span identity passed between processes, e.g. as message headers:
//!
//! trace_id: (len = 32, required) - lowercase hex of the 128-bit trace id.
//! span_id: (len = 16, required) - lowercase hex of the 64-bit span id.
//! trace_flags: (decimal integer, optional, default = 1) - sampling flags.
//!
//! Decoding validates lengths and rejects zero ids; encoding renders a
//! local span's identity in the same key set.

use std::collections::HashMap;

use byteorder::{BigEndian, ByteOrder};

use crate::basetypes::{SpanID, TraceID};
use crate::trace::{SpanContext, TraceOptions};
use crate::validate::ValidationError;

/// Carrier key for the trace id.
pub const TRACE_ID_KEY: &str = "trace_id";
/// Carrier key for the span id.
pub const SPAN_ID_KEY: &str = "span_id";
/// Carrier key for the sampling flags.
pub const TRACE_FLAGS_KEY: &str = "trace_flags";

/// Carrier is the external representation of a span identity.
pub type Carrier = HashMap<String, String>;

/// RemoteParent is the identity of a span in another process that a local
/// root span should continue rather than originate. Constructed only by
/// from_carrier and consumed once when the root span is started.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct RemoteParent {
    /// The trace the local root span should join.
    pub trace_id: TraceID,
    /// The remote span the local root span descends from.
    pub span_id: SpanID,
    /// The remote caller's sampling flags, inherited by the local root.
    pub trace_options: TraceOptions,
}

impl RemoteParent {
    /// is_sampled returns true if the remote caller sampled the trace.
    pub fn is_sampled(&self) -> bool {
        self.trace_options.is_sampled()
    }
}

/// from_carrier parses and validates an externally supplied carrier into a
/// RemoteParent, or reports why it cannot.
pub fn from_carrier(carrier: &Carrier) -> Result<RemoteParent, ValidationError> {
    let trace_id = carrier
        .get(TRACE_ID_KEY)
        .ok_or(ValidationError::MissingField { field: "trace_id" })?;
    let span_id = carrier
        .get(SPAN_ID_KEY)
        .ok_or(ValidationError::MissingField { field: "span_id" })?;

    let trace_id = decode_trace_id(trace_id)?;
    let span_id = decode_span_id(span_id)?;

    let trace_options = match carrier.get(TRACE_FLAGS_KEY) {
        Some(flags) => flags
            .parse::<u32>()
            .map(TraceOptions)
            .map_err(|_| ValidationError::InvalidTraceFlags(flags.clone()))?,
        None => TraceOptions(1),
    };

    Ok(RemoteParent {
        trace_id,
        span_id,
        trace_options,
    })
}

/// to_carrier renders a local span identity in carrier form, the inverse
/// of from_carrier. Ids come out as lowercase hex, flags as decimal.
pub fn to_carrier(span_context: &SpanContext) -> Carrier {
    let mut carrier = Carrier::new();
    carrier.insert(TRACE_ID_KEY.to_string(), span_context.trace_id.to_string());
    carrier.insert(SPAN_ID_KEY.to_string(), span_context.span_id.to_string());
    carrier.insert(
        TRACE_FLAGS_KEY.to_string(),
        span_context.trace_options.0.to_string(),
    );
    carrier
}

fn decode_trace_id(value: &str) -> Result<TraceID, ValidationError> {
    if value.len() != 32 {
        return Err(ValidationError::InvalidTraceId(format!(
            "must have exactly 32 hexadecimal characters, received {}",
            value.len()
        )));
    }
    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidTraceId(
            "must be a valid hexadecimal string".to_string(),
        ));
    }
    let parsed = u128::from_str_radix(value, 16)
        .map_err(|e| ValidationError::InvalidTraceId(e.to_string()))?;
    if parsed == 0 {
        return Err(ValidationError::InvalidTraceId(
            "must not be zero".to_string(),
        ));
    }
    let mut bytes = [0; 16];
    BigEndian::write_u128(&mut bytes, parsed);
    Ok(TraceID(bytes))
}

fn decode_span_id(value: &str) -> Result<SpanID, ValidationError> {
    if value.len() != 16 {
        return Err(ValidationError::InvalidSpanId(format!(
            "must have exactly 16 hexadecimal characters, received {}",
            value.len()
        )));
    }
    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidSpanId(
            "must be a valid hexadecimal string".to_string(),
        ));
    }
    let parsed = u64::from_str_radix(value, 16)
        .map_err(|e| ValidationError::InvalidSpanId(e.to_string()))?;
    if parsed == 0 {
        return Err(ValidationError::InvalidSpanId(
            "must not be zero".to_string(),
        ));
    }
    let mut bytes = [0; 8];
    BigEndian::write_u64(&mut bytes, parsed);
    Ok(SpanID(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier(trace_id: &str, span_id: &str, flags: Option<&str>) -> Carrier {
        let mut c = Carrier::new();
        c.insert(TRACE_ID_KEY.to_string(), trace_id.to_string());
        c.insert(SPAN_ID_KEY.to_string(), span_id.to_string());
        if let Some(flags) = flags {
            c.insert(TRACE_FLAGS_KEY.to_string(), flags.to_string());
        }
        c
    }

    const TID_HEX: &str = "01020304050607080102040810204080";
    const SID_HEX: &str = "0102040810204080";

    #[test]
    fn decodes_valid_carrier() {
        let parent = from_carrier(&carrier(TID_HEX, SID_HEX, Some("1"))).unwrap();
        assert_eq!(
            parent.trace_id,
            TraceID([1, 2, 3, 4, 5, 6, 7, 8, 1, 2, 4, 8, 16, 32, 64, 128])
        );
        assert_eq!(parent.span_id, SpanID([1, 2, 4, 8, 16, 32, 64, 128]));
        assert!(parent.is_sampled());
    }

    #[test]
    fn sampled_defaults_to_true_when_flags_absent() {
        let parent = from_carrier(&carrier(TID_HEX, SID_HEX, None)).unwrap();
        assert_eq!(parent.trace_options, TraceOptions(1));
        assert!(parent.is_sampled());
    }

    #[test]
    fn unsampled_flags() {
        let parent = from_carrier(&carrier(TID_HEX, SID_HEX, Some("0"))).unwrap();
        assert!(!parent.is_sampled());
    }

    #[test]
    fn flags_accepted_verbatim_beyond_one_byte() {
        // flags wider than the 8-bit wire range pass through unchanged
        let parent = from_carrier(&carrier(TID_HEX, SID_HEX, Some("511"))).unwrap();
        assert_eq!(parent.trace_options, TraceOptions(511));
    }

    #[test]
    fn non_integer_flags_rejected() {
        let got = from_carrier(&carrier(TID_HEX, SID_HEX, Some("sampled")));
        assert_eq!(
            got,
            Err(ValidationError::InvalidTraceFlags("sampled".to_string()))
        );
    }

    #[test]
    fn missing_fields() {
        let mut c = Carrier::new();
        c.insert(SPAN_ID_KEY.to_string(), SID_HEX.to_string());
        assert_eq!(
            from_carrier(&c),
            Err(ValidationError::MissingField { field: "trace_id" })
        );

        let mut c = Carrier::new();
        c.insert(TRACE_ID_KEY.to_string(), TID_HEX.to_string());
        assert_eq!(
            from_carrier(&c),
            Err(ValidationError::MissingField { field: "span_id" })
        );
    }

    #[test]
    fn zero_ids_rejected_despite_correct_length() {
        let zeros_32 = "0".repeat(32);
        let zeros_16 = "0".repeat(16);

        match from_carrier(&carrier(&zeros_32, SID_HEX, None)) {
            Err(ValidationError::InvalidTraceId(_)) => {}
            other => panic!("want InvalidTraceId, got {:?}", other),
        }
        match from_carrier(&carrier(TID_HEX, &zeros_16, None)) {
            Err(ValidationError::InvalidSpanId(_)) => {}
            other => panic!("want InvalidSpanId, got {:?}", other),
        }
    }

    #[test]
    fn wrong_lengths_rejected() {
        struct TestCase {
            trace_id: &'static str,
            span_id: &'static str,
            want_trace_id_error: bool,
        }

        let test_cases = &[
            TestCase {
                trace_id: "abc123",
                span_id: SID_HEX,
                want_trace_id_error: true,
            },
            TestCase {
                trace_id: "010203040506070801020408102040801",
                span_id: SID_HEX,
                want_trace_id_error: true,
            },
            TestCase {
                trace_id: TID_HEX,
                span_id: "abc123",
                want_trace_id_error: false,
            },
        ];

        for test in test_cases {
            match from_carrier(&carrier(test.trace_id, test.span_id, None)) {
                Err(ValidationError::InvalidTraceId(_)) if test.want_trace_id_error => {}
                Err(ValidationError::InvalidSpanId(_)) if !test.want_trace_id_error => {}
                other => panic!("unexpected result {:?}", other),
            }
        }
    }

    #[test]
    fn non_hex_rejected() {
        let bad_trace_id = "0102030405060708010204081020408g";
        match from_carrier(&carrier(bad_trace_id, SID_HEX, None)) {
            Err(ValidationError::InvalidTraceId(_)) => {}
            other => panic!("want InvalidTraceId, got {:?}", other),
        }

        // a sign prefix is not a hex digit even though the parser would
        // otherwise accept it
        let signed = "+1020304050607080102040810204080";
        match from_carrier(&carrier(signed, SID_HEX, None)) {
            Err(ValidationError::InvalidTraceId(_)) => {}
            other => panic!("want InvalidTraceId, got {:?}", other),
        }
    }

    #[test]
    fn uppercase_hex_accepted() {
        let upper = "0102030405060708010204081020408A";
        let parent = from_carrier(&carrier(upper, SID_HEX, None)).unwrap();
        assert_eq!(parent.trace_id.0[15], 0x8a);
    }

    #[test]
    fn carrier_roundtrip() {
        let span_context = SpanContext {
            trace_id: TraceID([1, 2, 3, 4, 5, 6, 7, 8, 1, 2, 4, 8, 16, 32, 64, 128]),
            span_id: SpanID([1, 2, 4, 8, 16, 32, 64, 128]),
            trace_options: TraceOptions(1),
        };

        let carrier = to_carrier(&span_context);
        assert_eq!(carrier[TRACE_ID_KEY], TID_HEX);
        assert_eq!(carrier[SPAN_ID_KEY], SID_HEX);
        assert_eq!(carrier[TRACE_FLAGS_KEY], "1");

        let parent = from_carrier(&carrier).unwrap();
        assert_eq!(parent.trace_id, span_context.trace_id);
        assert_eq!(parent.span_id, span_context.span_id);
        assert_eq!(parent.trace_options, span_context.trace_options);
    }
}
