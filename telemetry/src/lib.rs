/*!
Structured, hierarchical tracing for microservice call chains.

Every logical operation opens exactly one root span, named
`service.resource.action`, and nests zero or more action spans beneath it.
Action names are single tokens; the full span name is composed from the
lineage, so a `validate` action under `user.creation.create` is recorded
as `user.creation.create.validate`. Names are validated before any span is
created, and nesting is enforced per logical context through a span stack
carried in an `io_context::Context`.

### Opening spans

```rust
use io_context::Context;
use telemetry_toolkit::Tracer;

let tracer = Tracer::new("user-service");
let parent = Context::background().freeze();

let (ctx, mut root) = tracer
    .start_root_span(&parent, "user.creation.create", None)
    .unwrap();
let ctx = ctx.freeze();
{
    let mut action = tracer.start_span_action(&ctx, "validate").unwrap();
    assert_eq!(action.name(), "user.creation.create.validate");
    action.set_status_ok();
}
root.set_status_ok();
```

The returned guards end their span and pop the stack when dropped, on
every exit path. Roots may only be opened while no span is active in the
context; actions require an open root.

### Continuing a remote trace

A consumer joins the trace of a remote producer by decoding the producer's
carrier (e.g. message headers) and seeding its root span with the result:

```rust
use io_context::Context;
use telemetry_toolkit::propagation::from_carrier;
use telemetry_toolkit::Tracer;

let tracer = Tracer::new("consumer-service");
let mut carrier = std::collections::HashMap::new();
carrier.insert("trace_id".to_string(), "01020304050607080102040810204080".to_string());
carrier.insert("span_id".to_string(), "0102040810204080".to_string());

let remote = from_carrier(&carrier).unwrap();
let parent = Context::background().freeze();
let (_ctx, span) = tracer
    .start_root_span(&parent, "queue.message.consume", Some(&remote))
    .unwrap();
assert_eq!(span.span_context().trace_id.to_string(), carrier["trace_id"]);
```

### Exporting

Finished spans go to the registered [`Exporter`]s; register at least one
(e.g. [`ConsoleExporter`] during development). Batching, retries and
backend wire formats are the exporter's concern.
*/
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

mod basetypes;
/// Text encoding and HTTP auth header helpers
pub mod encoding;
mod export;
mod id_generator;
/// Metric instrument pass-throughs
pub mod metrics;
/// Carrier codec for cross-process trace continuation
pub mod propagation;
mod spanstack;
mod trace;
mod validate;

pub use crate::basetypes::{
    Annotation, AttributeValue, Attributes, SpanID, Status, StatusCode, TraceID,
};
pub use crate::export::{
    register_exporter, unregister_exporter, ConsoleExporter, Exporter, SpanData,
};
pub use crate::id_generator::{default_id_generator, IDGenerator};
pub use crate::spanstack::{NestingError, SpanFrame, SpanStack};
pub use crate::trace::{
    new_context, stack_from_context, ScopedSpan, Span, SpanContext, TraceError, TraceOptions,
    Tracer,
};
pub use crate::validate::{validate_span_name, NameKind, ValidationError};
