use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Characters that may never appear anywhere in a span name.
const FORBIDDEN_CHARACTERS: &str = r#"[!@#$%^&*()+=\[\]{}|\\;:'",<>/?`~]"#;

/// NameKind is the role a candidate span name is validated for.
///
/// Root names follow the `service.resource.action` convention and must have
/// exactly three dot-separated parts. Action names are bare leaf tokens and
/// must have exactly one.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum NameKind {
    /// The outermost span of a logical operation.
    Root,
    /// A nested unit of work inside a root span.
    Action,
}

impl NameKind {
    fn expected_parts(self) -> usize {
        match self {
            NameKind::Root => 3,
            NameKind::Action => 1,
        }
    }
}

/// ValidationError describes why caller-supplied input was rejected before
/// any span state changed.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Error)]
pub enum ValidationError {
    /// The name was empty or whitespace-only.
    #[error("span name must not be empty")]
    EmptyName,
    /// The name had the wrong number of dot-separated parts for its role.
    #[error("span name must have exactly {expected} parts separated by '.', got {actual}")]
    WrongPartCount {
        /// Parts required by the role (3 for roots, 1 for actions).
        expected: usize,
        /// Parts the candidate name actually had.
        actual: usize,
    },
    /// The name contained a character from the forbidden set.
    #[error("span name contains forbidden characters")]
    InvalidCharacters,
    /// A required carrier key was absent.
    #[error("carrier is missing required field `{field}`")]
    MissingField {
        /// The absent key.
        field: &'static str,
    },
    /// The carrier trace id was malformed or zero.
    #[error("invalid trace_id: {0}")]
    InvalidTraceId(String),
    /// The carrier span id was malformed or zero.
    #[error("invalid span_id: {0}")]
    InvalidSpanId(String),
    /// The carrier flags value was not a decimal integer.
    #[error("invalid trace_flags: {0}")]
    InvalidTraceFlags(String),
}

/// A single validation step. Checks run in a fixed order and the first
/// failure wins, so an empty name reports EmptyName rather than a part
/// count mismatch.
type NameCheck = fn(&str, NameKind) -> Result<(), ValidationError>;

const NAME_CHECKS: &[NameCheck] = &[
    check_not_empty,
    check_part_count,
    check_forbidden_characters,
];

/// validate_span_name decides whether a candidate name is acceptable for
/// the requested role. New checks can be appended to the chain without
/// touching the existing ones.
pub fn validate_span_name(name: &str, kind: NameKind) -> Result<(), ValidationError> {
    for check in NAME_CHECKS {
        check(name, kind)?;
    }
    Ok(())
}

fn check_not_empty(name: &str, _kind: NameKind) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        Err(ValidationError::EmptyName)
    } else {
        Ok(())
    }
}

fn check_part_count(name: &str, kind: NameKind) -> Result<(), ValidationError> {
    let expected = kind.expected_parts();
    let actual = name.split('.').count();
    if actual != expected {
        Err(ValidationError::WrongPartCount { expected, actual })
    } else {
        Ok(())
    }
}

fn check_forbidden_characters(name: &str, _kind: NameKind) -> Result<(), ValidationError> {
    lazy_static! {
        static ref FORBIDDEN_RE: Regex = Regex::new(FORBIDDEN_CHARACTERS).unwrap();
    }
    if FORBIDDEN_RE.is_match(name) {
        Err(ValidationError::InvalidCharacters)
    } else {
        Ok(())
    }
}
