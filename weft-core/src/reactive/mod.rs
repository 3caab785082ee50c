//! Reactive Primitives
//!
//! This module implements the core reactive system: observed values,
//! effects, computeds, and refs. These primitives form the foundation of
//! Weft's fine-grained reactivity.
//!
//! # Concepts
//!
//! ## Observed values
//!
//! [`reactive`] wraps a dynamic aggregate (record, list, map, or set) in
//! an intercepting facade. Reads through the facade record which effect
//! performed them; writes re-invoke exactly the effects that read that
//! location. [`readonly`] produces a facade that rejects writes while the
//! access-control lock is engaged.
//!
//! ## Effects
//!
//! [`effect`] registers a function and runs it. Every observable location
//! read during the run becomes a dependency; writing any of them runs the
//! function again (or hands it to its scheduler). Dependencies are
//! dynamic: each run starts from a clean slate.
//!
//! ## Computeds
//!
//! [`computed`] creates a cached derived value. It recomputes on demand,
//! only after a dependency changed, and always settles before any plain
//! effect that reads it.
//!
//! ## Refs
//!
//! [`new_ref`] boxes a single value into a reactive cell; [`to_refs`]
//! splits a record into per-field cells that read and write through.
//!
//! # Implementation Notes
//!
//! Dependency detection is automatic: the runtime keeps a call stack of
//! running effects, and every tracked read registers the top of the stack
//! as a subscriber of the location read. The engine is single-threaded
//! and synchronous; the only indirection point is the per-effect
//! scheduler, which replaces synchronous re-invocation when present.
//!
//! The free functions below operate on a thread-local default [`Runtime`];
//! every one of them is also available as a method on an explicit
//! `Runtime` for isolated reactive worlds.

mod collections;
mod computed;
mod effect;
mod observed;
mod reference;
mod runtime;
mod value;

pub use effect::{DebugEvent, DebugHook, Effect, EffectOptions, Scheduler, StopHook};
pub use observed::{AccessMode, Observed};
pub use reference::{is_ref, Ref};
pub use runtime::{DepKey, Operation, Runtime};
pub use value::{same_value, EntryKey, List, MapCell, Record, SetCell, Shape, TargetId, Value};

thread_local! {
    static DEFAULT_RUNTIME: Runtime = Runtime::new();
}

/// Run `f` against the thread-local default runtime.
pub fn with_runtime<R>(f: impl FnOnce(&Runtime) -> R) -> R {
    DEFAULT_RUNTIME.with(|rt| f(rt))
}

/// Wrap an aggregate in a mutable intercepting facade.
/// See [`Runtime::reactive`].
pub fn reactive(value: impl Into<Value>) -> Value {
    with_runtime(|rt| rt.reactive(value.into()))
}

/// Wrap an aggregate in a read-only intercepting facade.
/// See [`Runtime::readonly`].
pub fn readonly(value: impl Into<Value>) -> Value {
    with_runtime(|rt| rt.readonly(value.into()))
}

/// Whether a value is a mutable wrapper.
pub fn is_reactive(value: &Value) -> bool {
    matches!(value, Value::Observed(o) if o.mode() == AccessMode::Mutable)
}

/// Whether a value is a read-only wrapper.
pub fn is_readonly(value: &Value) -> bool {
    matches!(value, Value::Observed(o) if o.mode() == AccessMode::ReadOnly)
}

/// The raw target behind a wrapper; non-wrappers pass through.
pub fn to_raw(value: Value) -> Value {
    match value {
        Value::Observed(o) => o.raw(),
        other => other,
    }
}

/// Force a raw value to always resolve read-only when wrapped.
pub fn mark_readonly(value: &Value) {
    with_runtime(|rt| rt.mark_readonly(value));
}

/// Opt a raw value out of wrapping entirely.
pub fn mark_non_reactive(value: &Value) {
    with_runtime(|rt| rt.mark_non_reactive(value));
}

/// Register a side-effecting computation and run it immediately.
/// See [`Runtime::effect`].
pub fn effect(f: impl Fn() + 'static) -> Effect {
    with_runtime(|rt| rt.effect(f))
}

/// Register a side-effecting computation with explicit options.
/// See [`Runtime::effect_with`].
pub fn effect_with(f: impl Fn() + 'static, options: EffectOptions) -> Effect {
    with_runtime(|rt| rt.effect_with(f, options))
}

/// Stop a runner: clear its subscriptions and mark it inactive.
pub fn stop(runner: &Effect) {
    runner.stop();
}

/// Create a read-only computed from a getter. See [`Runtime::computed`].
pub fn computed(getter: impl Fn() -> Value + 'static) -> Ref {
    with_runtime(|rt| rt.computed(getter))
}

/// Create a writable computed. See [`Runtime::computed_with`].
pub fn computed_with(
    getter: impl Fn() -> Value + 'static,
    setter: impl Fn(Value) + 'static,
) -> Ref {
    with_runtime(|rt| rt.computed_with(getter, setter))
}

/// Box a value into a reactive cell. See [`Runtime::new_ref`].
pub fn new_ref(value: impl Into<Value>) -> Ref {
    with_runtime(|rt| rt.new_ref(value))
}

/// One alias ref per own key of `source`. See [`Runtime::to_refs`].
pub fn to_refs(source: &Value) -> Value {
    with_runtime(|rt| rt.to_refs(source))
}

/// Suspend dependency tracking on the default runtime.
pub fn pause_tracking() {
    with_runtime(|rt| rt.pause_tracking());
}

/// Resume dependency tracking on the default runtime.
pub fn resume_tracking() {
    with_runtime(|rt| rt.resume_tracking());
}

/// Run `f` with tracking suspended, restoring the previous state after.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    with_runtime(|rt| rt.untracked(f))
}

/// Engage the access-control lock on the default runtime.
pub fn lock() {
    with_runtime(|rt| rt.lock());
}

/// Disengage the access-control lock on the default runtime.
pub fn unlock() {
    with_runtime(|rt| rt.unlock());
}
