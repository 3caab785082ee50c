//! Effect Implementation
//!
//! An Effect wraps a user function whose reads are tracked, so that a
//! later write to any location it read re-invokes it.
//!
//! # How Effects Work
//!
//! 1. When created (non-lazy), the effect runs its function immediately to
//!    establish initial dependencies.
//!
//! 2. Every run first clears the previous subscription-set memberships:
//!    dependencies are dynamic, and a branch not taken this time must stop
//!    re-triggering the effect.
//!
//! 3. The effect pushes itself onto the runtime's call stack for the
//!    duration of the run. The pop happens in a drop guard, so a panic in
//!    the user function restores the bookkeeping before propagating.
//!
//! 4. An effect already on the stack is never pushed again: a function
//!    that writes a location it also reads does not recurse synchronously.
//!
//! # Stopping
//!
//! `stop` removes the effect from every subscription set and marks it
//! inactive (idempotent, fires `on_stop` once). A stopped effect can still
//! be invoked directly; it then runs its function without tracking.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;
use tracing::trace;

use super::runtime::{Dep, DepKey, Operation, Runtime};
use super::value::{TargetId, Value};

/// Counter for generating unique effect IDs.
static EFFECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_effect_id() -> u64 {
    EFFECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Payload handed to the `on_track` / `on_trigger` diagnostic hooks.
#[derive(Clone)]
pub struct DebugEvent {
    /// Id of the effect the event is about.
    pub effect: u64,
    pub target: TargetId,
    pub op: Operation,
    pub key: Option<DepKey>,
    /// Previous value of the written location, when the write path knows it.
    pub old: Option<Value>,
    /// New value of the written location.
    pub new: Option<Value>,
}

impl fmt::Debug for DebugEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugEvent")
            .field("effect", &self.effect)
            .field("target", &self.target)
            .field("op", &self.op)
            .field("key", &self.key)
            .finish()
    }
}

pub type DebugHook = Rc<dyn Fn(&DebugEvent)>;
pub type Scheduler = Rc<dyn Fn(&Effect)>;
pub type StopHook = Rc<dyn Fn()>;

/// Configuration for an effect.
#[derive(Clone, Default)]
pub struct EffectOptions {
    /// Don't run on creation; the caller decides when the first run is.
    pub lazy: bool,
    /// Participate in computed-first trigger ordering. Set by the derived
    /// value cache; plain effects leave it false.
    pub computed: bool,
    /// Replaces synchronous invocation on trigger: the runtime calls this
    /// instead of running the effect, and the scheduler decides when (or
    /// whether) the run happens.
    pub scheduler: Option<Scheduler>,
    /// Called when a new dependency edge is recorded for this effect.
    pub on_track: Option<DebugHook>,
    /// Called when a write is about to (re-)invoke this effect.
    pub on_trigger: Option<DebugHook>,
    /// Called once when the effect is stopped.
    pub on_stop: Option<StopHook>,
}

/// A re-runnable tracked computation.
///
/// This is a cheap-to-clone handle; clones share the effect's state.
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectState>,
}

struct EffectState {
    id: u64,
    rt: Runtime,
    f: Box<dyn Fn() -> Value>,
    active: Cell<bool>,
    /// Subscription sets this effect is a member of. Shared with the
    /// ledger, so cleanup is a direct removal from each set.
    deps: RefCell<SmallVec<[Dep; 4]>>,
    options: EffectOptions,
}

impl Effect {
    /// Create an effect without running it. `Runtime::effect` /
    /// `Runtime::effect_with` handle the immediate first run.
    pub(crate) fn new(
        rt: &Runtime,
        f: impl Fn() -> Value + 'static,
        options: EffectOptions,
    ) -> Self {
        Self {
            inner: Rc::new(EffectState {
                id: next_effect_id(),
                rt: rt.clone(),
                f: Box::new(f),
                active: Cell::new(true),
                deps: RefCell::new(SmallVec::new()),
                options,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    pub fn is_computed(&self) -> bool {
        self.inner.options.computed
    }

    /// Number of subscription sets this effect currently belongs to.
    pub fn dep_count(&self) -> usize {
        self.inner.deps.borrow().len()
    }

    pub(crate) fn scheduler(&self) -> Option<Scheduler> {
        self.inner.options.scheduler.clone()
    }

    pub(crate) fn on_track(&self) -> Option<DebugHook> {
        self.inner.options.on_track.clone()
    }

    pub(crate) fn on_trigger(&self) -> Option<DebugHook> {
        self.inner.options.on_trigger.clone()
    }

    pub(crate) fn push_dep(&self, dep: Dep) {
        self.inner.deps.borrow_mut().push(dep);
    }

    pub(crate) fn deps_snapshot(&self) -> Vec<Dep> {
        self.inner.deps.borrow().iter().cloned().collect()
    }

    /// Run the effect's function.
    ///
    /// Inactive effects run their function directly, untracked. An effect
    /// already on the call stack is not re-entered; the call returns
    /// `Unit` without running anything.
    pub fn run(&self) -> Value {
        if !self.inner.active.get() {
            return (self.inner.f)();
        }

        let stack = &self.inner.rt.state().stack;
        if stack.borrow().iter().any(|e| e.inner.id == self.inner.id) {
            trace!(effect = self.inner.id, "re-entrant run dropped");
            return Value::Unit;
        }

        // Dependencies are re-collected from scratch on every run.
        self.cleanup();

        stack.borrow_mut().push(self.clone());
        let _guard = StackGuard { rt: &self.inner.rt };
        (self.inner.f)()
    }

    /// Remove this effect from every subscription set it belongs to.
    fn cleanup(&self) {
        let deps: SmallVec<[Dep; 4]> =
            std::mem::take(&mut *self.inner.deps.borrow_mut());
        for dep in deps {
            dep.borrow_mut().shift_remove(self);
        }
    }

    /// Stop the effect: clear its memberships and mark it inactive.
    /// Idempotent; `on_stop` fires on the first call only. Does not abort
    /// an in-flight invocation.
    pub fn stop(&self) {
        if self.inner.active.get() {
            self.cleanup();
            self.inner.active.set(false);
            if let Some(hook) = &self.inner.options.on_stop {
                hook();
            }
        }
    }
}

/// Pops the effect stack when the run ends, also on unwind.
struct StackGuard<'a> {
    rt: &'a Runtime,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.rt.state().stack.borrow_mut().pop();
    }
}

impl PartialEq for Effect {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Effect {}

impl Hash for Effect {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("active", &self.inner.active.get())
            .field("computed", &self.inner.options.computed)
            .field("dep_count", &self.dep_count())
            .finish()
    }
}

impl Runtime {
    /// Register a side-effecting computation and run it immediately.
    pub fn effect(&self, f: impl Fn() + 'static) -> Effect {
        self.effect_with(f, EffectOptions::default())
    }

    /// Register a side-effecting computation with explicit options.
    /// Runs immediately unless `lazy`.
    pub fn effect_with(&self, f: impl Fn() + 'static, options: EffectOptions) -> Effect {
        self.value_effect(
            move || {
                f();
                Value::Unit
            },
            options,
        )
    }

    /// Register an effect whose function produces a value (the form the
    /// derived-value cache uses). Runs immediately unless `lazy`.
    pub(crate) fn value_effect(
        &self,
        f: impl Fn() -> Value + 'static,
        options: EffectOptions,
    ) -> Effect {
        let lazy = options.lazy;
        let runner = Effect::new(self, f, options);
        if !lazy {
            runner.run();
        }
        runner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn effect_runs_on_creation() {
        let rt = Runtime::new();
        let runs = Rc::new(Cell::new(0));

        let runs2 = runs.clone();
        let _runner = rt.effect(move || {
            runs2.set(runs2.get() + 1);
        });

        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn lazy_effect_waits_for_the_first_run() {
        let rt = Runtime::new();
        let runs = Rc::new(Cell::new(0));

        let runs2 = runs.clone();
        let runner = rt.effect_with(
            move || {
                runs2.set(runs2.get() + 1);
            },
            EffectOptions {
                lazy: true,
                ..Default::default()
            },
        );

        assert_eq!(runs.get(), 0);
        runner.run();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn stop_is_idempotent_and_fires_on_stop_once() {
        let rt = Runtime::new();
        let stops = Rc::new(Cell::new(0));

        let stops2 = stops.clone();
        let runner = rt.effect_with(
            || {},
            EffectOptions {
                on_stop: Some(Rc::new(move || {
                    stops2.set(stops2.get() + 1);
                })),
                ..Default::default()
            },
        );

        assert!(runner.is_active());
        runner.stop();
        runner.stop();

        assert!(!runner.is_active());
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn stopped_effect_still_runs_directly() {
        let rt = Runtime::new();
        let runs = Rc::new(Cell::new(0));

        let runs2 = runs.clone();
        let runner = rt.effect(move || {
            runs2.set(runs2.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        runner.stop();
        runner.run();

        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn panicking_effect_restores_the_stack() {
        let rt = Runtime::new();

        let runner = rt.effect_with(
            || panic!("boom"),
            EffectOptions {
                lazy: true,
                ..Default::default()
            },
        );

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            runner.run();
        }));
        assert!(result.is_err());

        // The stack must be balanced again.
        assert!(rt.current_effect().is_none());
    }

    #[test]
    fn effect_handles_are_shared() {
        let rt = Runtime::new();
        let runner = rt.effect(|| {});
        let clone = runner.clone();

        assert_eq!(runner.id(), clone.id());
        runner.stop();
        assert!(!clone.is_active());
    }
}
