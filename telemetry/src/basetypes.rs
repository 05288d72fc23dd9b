use std::collections::HashMap;
use std::fmt;
use std::time;

/// TraceID is a 16-byte identifier shared by every span in one trace.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct TraceID(pub [u8; 16]);

/// SpanID is an 8-byte identifier for a single span.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct SpanID(pub [u8; 8]);

impl TraceID {
    /// is_zero reports whether every byte of the id is zero. Zero trace ids
    /// are invalid on the wire.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl SpanID {
    /// is_zero reports whether every byte of the id is zero. Zero span ids
    /// are invalid on the wire.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for TraceID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for val in self.0.iter() {
            write!(f, "{:02x}", val)?;
        }
        Ok(())
    }
}

impl fmt::Display for SpanID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for val in self.0.iter() {
            write!(f, "{:02x}", val)?;
        }
        Ok(())
    }
}

/// Attributes are the key-value pairs recorded on a span or measurement.
pub type Attributes = HashMap<String, AttributeValue>;

/// AttributeValues are the values of attributes on a span or measurement.
#[derive(Clone, PartialEq, Debug)]
pub enum AttributeValue {
    BoolAttribute(bool),
    Int64Attribute(i64),
    Float64Attribute(f64),
    StringAttribute(String),
}

/// Annotation represents a text annotation with a set of attributes and a
/// timestamp, e.g. a recorded error.
#[derive(Clone, PartialEq, Debug)]
pub struct Annotation {
    pub time: time::Instant,
    pub message: String,
    pub attributes: Attributes,
}

/// StatusCode is the caller-visible outcome of a span.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum StatusCode {
    /// No status was set; the default for every new span.
    Unset = 0,
    /// The operation completed successfully.
    Ok = 1,
    /// The operation failed.
    Error = 2,
}

impl Default for StatusCode {
    fn default() -> StatusCode {
        StatusCode::Unset
    }
}

/// Status is the status of a Span.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Status {
    pub code: StatusCode,
    pub message: String,
}

impl Status {
    /// ok builds a Status with code Ok and no message.
    pub fn ok() -> Status {
        Status {
            code: StatusCode::Ok,
            message: String::new(),
        }
    }

    /// error builds a Status with code Error and the given description.
    pub fn error(message: &str) -> Status {
        Status {
            code: StatusCode::Error,
            message: message.to_string(),
        }
    }
}
