use std::error::Error;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Once, RwLock};
use std::time::Instant;

use io_context::Context;

use crate::basetypes::{Annotation, AttributeValue, Attributes, SpanID, Status, TraceID};
use crate::export::{SpanData, EXPORTERS};
use crate::id_generator::{default_id_generator, IDGenerator};
use crate::propagation::{to_carrier, Carrier, RemoteParent};
use crate::spanstack::{NestingError, SpanStack};
use crate::validate::{validate_span_name, NameKind, ValidationError};

/// TraceError is everything start_root_span / start_span_action can report
/// to the caller. All variants surface before any span is created.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum TraceError {
    /// The span name or carrier input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The root/action nesting contract was violated.
    #[error(transparent)]
    Nesting(#[from] NestingError),
}

/// SpanContext contains the state that must propagate across process
/// boundaries.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct SpanContext {
    /// trace_id is the id of the trace the span belongs to.
    pub trace_id: TraceID,
    /// span_id is the id of the span.
    pub span_id: SpanID,
    /// trace_options carries the sampling flags for the span.
    pub trace_options: TraceOptions,
}

impl SpanContext {
    /// is_sampled returns true if the span will be exported.
    pub fn is_sampled(&self) -> bool {
        self.trace_options.is_sampled()
    }
}

/// TraceOptions contains the flags associated with a trace span. Only the
/// low bit (sampled) is interpreted; the rest pass through verbatim.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct TraceOptions(pub u32);

impl TraceOptions {
    /// Whether the trace should be exported.
    pub fn is_sampled(self) -> bool {
        self.0 & 1 == 1
    }
}

/// Tracer orchestrates the span hierarchy for a service: it validates
/// names, enforces the root/action nesting contract through the
/// per-context SpanStack, and hands finished spans to the registered
/// exporters.
///
/// The tracer itself holds no per-request state and can be shared freely;
/// each logical execution context carries its own SpanStack inside an
/// io_context::Context.
pub struct Tracer {
    service_name: String,
    environment: String,
    id_generator: Arc<dyn IDGenerator + Send + Sync>,
}

impl Tracer {
    /// new creates a tracer for a service in the "development"
    /// environment.
    pub fn new(service_name: &str) -> Tracer {
        Tracer::with_environment(service_name, "development")
    }

    /// with_environment creates a tracer that stamps spans with the given
    /// deployment environment.
    pub fn with_environment(service_name: &str, environment: &str) -> Tracer {
        Tracer {
            service_name: service_name.to_string(),
            environment: environment.to_string(),
            id_generator: default_id_generator(),
        }
    }

    /// with_id_generator replaces the source of trace and span ids.
    pub fn with_id_generator(mut self, id_generator: Arc<dyn IDGenerator + Send + Sync>) -> Tracer {
        self.id_generator = id_generator;
        self
    }

    /// service_name returns the service this tracer was created for.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// start_root_span opens the outermost span for one logical operation.
    ///
    /// The name must follow the `service.resource.action` convention. A
    /// remote parent, decoded from a carrier with
    /// propagation::from_carrier, joins the new span to the caller's trace
    /// instead of originating a fresh one; its sampling flags are
    /// inherited. Without a remote parent the new trace is sampled.
    ///
    /// Fails with NestedRootNotAllowed if the context already has an open
    /// root. On success the returned Context carries the span stack for
    /// nested actions, and the ScopedSpan guard pops the stack when it
    /// goes out of scope, however the scope exits.
    pub fn start_root_span(
        &self,
        ctx: &Arc<Context>,
        name: &str,
        remote_parent: Option<&RemoteParent>,
    ) -> Result<(Context, ScopedSpan), TraceError> {
        validate_span_name(name, NameKind::Root)?;

        let stack = match stack_from_context(ctx) {
            Some(stack) => stack.clone(),
            None => SpanStack::new(),
        };

        let span_context = match remote_parent {
            Some(parent) => SpanContext {
                trace_id: parent.trace_id,
                span_id: self.id_generator.new_span_id(),
                trace_options: parent.trace_options,
            },
            None => SpanContext {
                trace_id: self.id_generator.new_trace_id(),
                span_id: self.id_generator.new_span_id(),
                trace_options: TraceOptions(1),
            },
        };

        stack.push_root(name, span_context.clone())?;

        let span = self.make_span(
            name,
            span_context,
            remote_parent.map(|p| p.span_id),
            remote_parent.is_some(),
        );
        log::debug!("started root span {}", name);

        let scoped = ScopedSpan {
            name: name.to_string(),
            span,
            stack: stack.clone(),
        };
        Ok((new_context(ctx, stack), scoped))
    }

    /// start_span_action opens a nested unit of work under the currently
    /// open span.
    ///
    /// The name must be a single token; the span itself is created under
    /// the composed name `parent.name`. Fails with
    /// ActionRequiresActiveRoot when the context has no open root span.
    pub fn start_span_action(&self, ctx: &Context, name: &str) -> Result<ScopedSpan, TraceError> {
        validate_span_name(name, NameKind::Action)?;

        let stack = stack_from_context(ctx).ok_or(NestingError::ActionRequiresActiveRoot)?;
        let parent = stack.top().ok_or(NestingError::ActionRequiresActiveRoot)?;

        let span_context = SpanContext {
            trace_id: parent.span_context.trace_id,
            span_id: self.id_generator.new_span_id(),
            trace_options: parent.span_context.trace_options,
        };
        let full_name = stack.push_action(name, span_context.clone())?;

        let span = self.make_span(
            &full_name,
            span_context,
            Some(parent.span_context.span_id),
            false,
        );
        log::debug!("started action span {}", full_name);

        Ok(ScopedSpan {
            name: full_name,
            span,
            stack: stack.clone(),
        })
    }

    fn make_span(
        &self,
        name: &str,
        span_context: SpanContext,
        parent_span_id: Option<SpanID>,
        has_remote_parent: bool,
    ) -> Span {
        if !span_context.is_sampled() {
            return Span {
                data: None,
                span_context,
                end_once: Arc::new(Once::new()),
            };
        }

        let data = SpanData {
            span_context: span_context.clone(),
            parent_span_id,
            name: name.to_string(),
            service_name: self.service_name.clone(),
            environment: self.environment.clone(),
            start_time: Instant::now(),
            end_time: None,
            attributes: Attributes::new(),
            annotations: Vec::new(),
            status: None,
            has_remote_parent,
        };

        Span {
            data: Some(Arc::new(RwLock::new(data))),
            span_context,
            end_once: Arc::new(Once::new()),
        }
    }
}

/// Span is an open span handle. It stores data accumulated while the span
/// is active and carries the identity that propagates to children and
/// across process boundaries.
///
/// A span whose trace is not sampled is a plain identity carrier: it
/// records nothing and is never exported.
#[derive(Debug, Clone)]
pub struct Span {
    /// data is some if the span is recording; otherwise the span only
    /// carries its SpanContext.
    data: Option<Arc<RwLock<SpanData>>>,
    span_context: SpanContext,
    end_once: Arc<Once>,
}

impl Span {
    /// is_recording_events indicates whether the span records data.
    pub fn is_recording_events(&self) -> bool {
        self.data.is_some()
    }

    /// span_context gets a reference to the span context of the span.
    pub fn span_context(&self) -> &SpanContext {
        &self.span_context
    }

    /// carrier renders this span's identity in carrier form, for handing
    /// to a downstream process (e.g. as message headers).
    pub fn carrier(&self) -> Carrier {
        to_carrier(&self.span_context)
    }

    /// set_attribute records a single attribute on the span.
    pub fn set_attribute(&mut self, key: &str, value: AttributeValue) {
        if let Some(data) = &self.data {
            let mut data = data.write().unwrap();
            (*data).attributes.insert(key.to_string(), value);
        }
    }

    /// set_status_ok marks the span as successful.
    pub fn set_status_ok(&mut self) {
        self.set_status(Status::ok());
    }

    /// set_status_error marks the span as failed with a description.
    pub fn set_status_error(&mut self, description: &str) {
        self.set_status(Status::error(description));
    }

    /// record_error marks the span as failed and attaches the error as an
    /// annotation.
    pub fn record_error(&mut self, error: &dyn Error) {
        let message = error.to_string();
        self.set_status(Status::error(&message));
        if let Some(data) = &self.data {
            let mut data = data.write().unwrap();
            (*data).annotations.push(Annotation {
                time: Instant::now(),
                message,
                attributes: Attributes::new(),
            });
        }
    }

    fn set_status(&mut self, status: Status) {
        if let Some(data) = &self.data {
            let mut data = data.write().unwrap();
            (*data).status = Some(status);
        }
    }

    /// end closes the span once and exports it if its trace is sampled.
    fn end(&self) {
        let end_once = Arc::clone(&self.end_once);
        end_once.call_once(|| {
            let data = match &self.data {
                Some(data) => data,
                None => return,
            };
            let mut span_data = data.read().unwrap().clone();
            span_data.end_time = Some(Instant::now());
            let exporters = EXPORTERS.read().unwrap();
            for exporter in &*exporters {
                exporter.export_span(&span_data);
            }
        });
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(data) = &self.data {
            let data = data.read().unwrap();
            write!(f, "span {} {}", self.span_context.span_id, data.name)?;
        } else {
            write!(f, "span {}", self.span_context.span_id)?;
        }
        Ok(())
    }
}

/// ScopedSpan ties a span's lifetime to a scope: dropping it ends the span
/// and pops the context's stack, on every exit path including panic
/// unwind. Errors raised inside the scope are the caller's to record via
/// record_error; the guard never inspects them.
pub struct ScopedSpan {
    name: String,
    span: Span,
    stack: SpanStack,
}

impl ScopedSpan {
    /// name returns the full composed name of the span.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Deref for ScopedSpan {
    type Target = Span;

    fn deref(&self) -> &Span {
        &self.span
    }
}

impl DerefMut for ScopedSpan {
    fn deref_mut(&mut self) -> &mut Span {
        &mut self.span
    }
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        self.span.end();
        self.stack.pop();
    }
}

const SPAN_STACK_KEY: &str = "TELEMETRY_SPAN_STACK_KEY";

/// stack_from_context retrieves the span stack of the current logical
/// context, if one was started.
pub fn stack_from_context(ctx: &Context) -> Option<&SpanStack> {
    ctx.get_value(SPAN_STACK_KEY)
}

/// new_context creates a child context carrying the given span stack, so
/// work spawned within the same logical context inherits it.
pub fn new_context(parent: &Arc<Context>, stack: SpanStack) -> Context {
    let mut ctx = Context::create_child(parent);
    ctx.add_value(SPAN_STACK_KEY, stack);
    ctx
}
