use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::trace::SpanContext;

/// NestingError indicates caller misuse of the root/action span contract.
/// Surfaced synchronously, never silently corrected.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Error)]
pub enum NestingError {
    /// A root span was requested while one is already open in this
    /// context.
    #[error("a root span is already open in this context; use an action span for nested work")]
    NestedRootNotAllowed,
    /// An action span was requested with no root span open.
    #[error("no active root span found to create an action span")]
    ActionRequiresActiveRoot,
}

/// SpanFrame is one open span in a context: its full composed name and the
/// identity it was created with.
#[derive(Clone, Debug)]
pub struct SpanFrame {
    /// The full composed name of the open span.
    pub name: String,
    /// The identity the span was created with.
    pub span_context: SpanContext,
}

/// SpanStack holds the chain of currently open span names for one logical
/// execution context.
///
/// Clones share the same frames, so the stack can travel inside an
/// io_context::Context and still be popped through the guard that pushed
/// it. Each logical context must own its own SpanStack; the stack has
/// exactly one writer at a time and is never shared across concurrent
/// contexts.
///
/// Invariant: frame 0 holds the root's raw name and every later frame's
/// name is `previous + "." + action`, so any frame's prefix chain
/// reconstructs its full lineage.
#[derive(Clone, Debug, Default)]
pub struct SpanStack {
    frames: Arc<Mutex<Vec<SpanFrame>>>,
}

impl SpanStack {
    pub fn new() -> SpanStack {
        SpanStack::default()
    }

    /// is_empty reports whether no span is open in this context.
    pub fn is_empty(&self) -> bool {
        self.frames.lock().unwrap().is_empty()
    }

    /// depth is the current nesting depth.
    pub fn depth(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    /// top returns the most recently opened frame, if any.
    pub fn top(&self) -> Option<SpanFrame> {
        self.frames.lock().unwrap().last().cloned()
    }

    /// push_root opens the outermost frame. The stack must be empty.
    pub fn push_root(&self, name: &str, span_context: SpanContext) -> Result<(), NestingError> {
        let mut frames = self.frames.lock().unwrap();
        if !frames.is_empty() {
            return Err(NestingError::NestedRootNotAllowed);
        }
        frames.push(SpanFrame {
            name: name.to_string(),
            span_context,
        });
        Ok(())
    }

    /// push_action composes `top.name + "." + name`, pushes a frame under
    /// the composed name and returns it. The stack must be non-empty.
    pub fn push_action(
        &self,
        name: &str,
        span_context: SpanContext,
    ) -> Result<String, NestingError> {
        let mut frames = self.frames.lock().unwrap();
        let parent = frames
            .last()
            .ok_or(NestingError::ActionRequiresActiveRoot)?;
        let composed = format!("{}.{}", parent.name, name);
        frames.push(SpanFrame {
            name: composed.clone(),
            span_context,
        });
        Ok(composed)
    }

    /// pop removes the most recently pushed frame.
    ///
    /// Panics if the stack is empty: scoped acquisition guarantees every
    /// pop matches a push, so an empty pop means the hosting code broke
    /// that contract and there is nothing sensible to recover to.
    pub fn pop(&self) {
        let mut frames = self.frames.lock().unwrap();
        if frames.pop().is_none() {
            panic!("span stack popped while empty");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_context() -> SpanContext {
        SpanContext::default()
    }

    #[test]
    fn starts_empty() {
        let stack = SpanStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.depth(), 0);
        assert!(stack.top().is_none());
    }

    #[test]
    fn root_then_actions_compose() {
        let stack = SpanStack::new();
        stack.push_root("user.creation.create", span_context()).unwrap();
        assert_eq!(stack.top().unwrap().name, "user.creation.create");

        let composed = stack.push_action("validate", span_context()).unwrap();
        assert_eq!(composed, "user.creation.create.validate");

        let composed = stack.push_action("save", span_context()).unwrap();
        assert_eq!(composed, "user.creation.create.validate.save");
        assert_eq!(stack.depth(), 3);
    }

    #[test]
    fn second_root_is_rejected() {
        let stack = SpanStack::new();
        stack.push_root("a.b.c", span_context()).unwrap();
        assert_eq!(
            stack.push_root("d.e.f", span_context()),
            Err(NestingError::NestedRootNotAllowed)
        );
        // the failed push must not have touched the stack
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn action_without_root_is_rejected() {
        let stack = SpanStack::new();
        assert_eq!(
            stack.push_action("validate", span_context()),
            Err(NestingError::ActionRequiresActiveRoot)
        );
        assert!(stack.is_empty());
    }

    #[test]
    fn push_pop_drains() {
        let stack = SpanStack::new();
        stack.push_root("a.b.c", span_context()).unwrap();
        for name in &["x", "y", "z"] {
            stack.push_action(name, span_context()).unwrap();
        }
        assert_eq!(stack.depth(), 4);
        for _ in 0..4 {
            stack.pop();
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn clones_share_frames() {
        let stack = SpanStack::new();
        let alias = stack.clone();
        stack.push_root("a.b.c", span_context()).unwrap();
        assert_eq!(alias.depth(), 1);
        alias.pop();
        assert!(stack.is_empty());
    }

    #[test]
    #[should_panic(expected = "span stack popped while empty")]
    fn pop_on_empty_is_fatal() {
        SpanStack::new().pop();
    }
}
