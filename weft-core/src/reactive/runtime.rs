//! Reactive Runtime
//!
//! The runtime is the reactivity context that connects observed values,
//! refs, computeds, and effects. It owns every piece of shared state the
//! engine has: the dependency ledger, the wrapper registries, the effect
//! call stack, the tracking flag, and the access-control lock.
//!
//! # How It Works
//!
//! 1. When an effect runs, it is pushed onto the runtime's call stack.
//!
//! 2. When an observable location is read, `track` records an edge from
//!    `(target, key)` to the effect on top of the stack.
//!
//! 3. When that location is written, `trigger` resolves the subscribed
//!    effects and invokes each one: through its scheduler if it has one,
//!    synchronously otherwise. Computed-tagged effects always run before
//!    plain ones, so a derived value is invalidated before any consumer
//!    reading it re-executes.
//!
//! # Isolation
//!
//! `Runtime` is a cheap-to-clone handle. The free-function surface of this
//! crate binds a thread-local default instance; tests (or embedders that
//! want several independent reactive worlds) construct their own with
//! [`Runtime::new`] and call the same methods on it.
//!
//! # Liveness
//!
//! Ledger entries hold a weak probe of their target and wrapper registries
//! hold weak wrappers: the runtime never keeps a value alive. A dead entry
//! behaves exactly like a missing one; [`Runtime::sweep`] reclaims the
//! storage.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use indexmap::IndexSet;
use tracing::trace;

use super::effect::{DebugEvent, Effect};
use super::observed::ObservedCell;
use super::value::{EntryKey, Shape, TargetId, Value};

/// The read/write vocabulary of the engine.
///
/// `Get`, `Has`, and `Iterate` describe reads (tracking); `Add`, `Set`,
/// `Delete`, and `Clear` describe writes (triggering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Has,
    Iterate,
    Add,
    Set,
    Delete,
    Clear,
}

/// A location within a target that an effect can depend on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DepKey {
    /// A record field.
    Field(Rc<str>),
    /// A list slot.
    Index(usize),
    /// A keyed-collection entry.
    Entry(EntryKey),
    /// The length of a list; doubles as its iterate-all key.
    Length,
    /// The single slot of a ref.
    Value,
    /// The iterate-all sentinel for records and keyed collections: any
    /// key addition or removal invalidates enumeration.
    Iterate,
}

/// One subscription set. Shared between the ledger and every member
/// effect's own membership list, so unsubscribing is a direct removal
/// from each set rather than a ledger walk.
pub(crate) type Dep = Rc<RefCell<IndexSet<Effect>>>;

/// Per-target slice of the ledger.
struct TargetDeps {
    /// Weak probe of the target cell; dead means the whole entry is dead.
    probe: Weak<dyn Any>,
    keys: HashMap<DepKey, Dep>,
}

/// A reactivity context: dependency ledger, wrapper registries, effect
/// stack, and the global flags.
pub struct Runtime {
    state: Rc<RuntimeState>,
}

impl Clone for Runtime {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

pub(crate) struct RuntimeState {
    deps: RefCell<HashMap<TargetId, TargetDeps>>,
    pub(crate) mutable_wrappers: RefCell<HashMap<TargetId, Weak<ObservedCell>>>,
    pub(crate) readonly_wrappers: RefCell<HashMap<TargetId, Weak<ObservedCell>>>,
    pub(crate) stack: RefCell<Vec<Effect>>,
    tracking: Cell<bool>,
    locked: Cell<bool>,
    pub(crate) readonly_marks: RefCell<HashSet<TargetId>>,
    pub(crate) non_reactive_marks: RefCell<HashSet<TargetId>>,
}

impl Runtime {
    /// Create an isolated reactivity context.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RuntimeState {
                deps: RefCell::new(HashMap::new()),
                mutable_wrappers: RefCell::new(HashMap::new()),
                readonly_wrappers: RefCell::new(HashMap::new()),
                stack: RefCell::new(Vec::new()),
                tracking: Cell::new(true),
                locked: Cell::new(true),
                readonly_marks: RefCell::new(HashSet::new()),
                non_reactive_marks: RefCell::new(HashSet::new()),
            }),
        }
    }

    pub(crate) fn state(&self) -> &RuntimeState {
        &self.state
    }

    // ------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------

    /// Suspend dependency tracking. Reads performed while paused create
    /// no edges.
    pub fn pause_tracking(&self) {
        self.state.tracking.set(false);
    }

    /// Resume dependency tracking.
    pub fn resume_tracking(&self) {
        self.state.tracking.set(true);
    }

    pub fn is_tracking(&self) -> bool {
        self.state.tracking.get()
    }

    /// Run `f` with tracking suspended, restoring the previous state
    /// afterwards (also on unwind).
    pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        struct Restore<'a>(&'a Cell<bool>, bool);
        impl Drop for Restore<'_> {
            fn drop(&mut self) {
                self.0.set(self.1);
            }
        }

        let prev = self.state.tracking.replace(false);
        let _restore = Restore(&self.state.tracking, prev);
        f()
    }

    /// Engage the access-control lock (the default state). While engaged,
    /// writes through read-only wrappers are rejected.
    pub fn lock(&self) {
        self.state.locked.set(true);
    }

    /// Disengage the access-control lock so privileged code can write
    /// through read-only wrappers.
    ///
    /// There is no reentrancy counter: `unlock(); ...; lock()` pairs do
    /// not nest, and an unwind between the two leaves the lock
    /// disengaged.
    pub fn unlock(&self) {
        self.state.locked.set(false);
    }

    pub fn is_locked(&self) -> bool {
        self.state.locked.get()
    }

    // ------------------------------------------------------------------
    // Track / trigger
    // ------------------------------------------------------------------

    /// The effect currently on top of the call stack, if any.
    pub(crate) fn current_effect(&self) -> Option<Effect> {
        self.state.stack.borrow().last().cloned()
    }

    /// Record that the currently running effect depends on
    /// `(target, key)`. No-op when tracking is paused or no effect is
    /// running.
    pub(crate) fn track(
        &self,
        target: TargetId,
        probe: impl FnOnce() -> Weak<dyn Any>,
        op: Operation,
        key: DepKey,
    ) {
        if !self.state.tracking.get() {
            return;
        }
        let Some(effect) = self.current_effect() else {
            return;
        };

        let dep = {
            let mut deps = self.state.deps.borrow_mut();
            let entry = deps.entry(target).or_insert_with(|| TargetDeps {
                probe: probe(),
                keys: HashMap::new(),
            });
            entry
                .keys
                .entry(key.clone())
                .or_insert_with(|| Rc::new(RefCell::new(IndexSet::new())))
                .clone()
        };

        let added = {
            let mut set = dep.borrow_mut();
            set.insert(effect.clone())
        };

        if added {
            effect.push_dep(dep);
            trace!(target_id = target.raw(), ?op, ?key, "dependency recorded");
            if let Some(hook) = effect.on_track() {
                hook(&DebugEvent {
                    effect: effect.id(),
                    target,
                    op,
                    key: Some(key),
                    old: None,
                    new: None,
                });
            }
        }
    }

    /// Notify the effects subscribed to `(target, key)` that it changed.
    ///
    /// `Clear` fans out to every key of the target. `Add` and `Delete`
    /// additionally hit the target's iterate-all set (`Length` for lists,
    /// the iterate sentinel otherwise). Computed-tagged effects are always
    /// invoked before plain ones.
    pub(crate) fn trigger(
        &self,
        target: TargetId,
        op: Operation,
        key: Option<DepKey>,
        shape: Option<Shape>,
        old: Option<Value>,
        new: Option<Value>,
    ) {
        // Snapshot the candidates before running anything: the effects we
        // invoke will rewrite these same sets while re-tracking.
        let (computed, plain) = {
            let deps = self.state.deps.borrow();
            let Some(entry) = deps.get(&target) else {
                return;
            };

            let mut computed: IndexSet<Effect> = IndexSet::new();
            let mut plain: IndexSet<Effect> = IndexSet::new();
            let mut collect = |dep: &Dep| {
                for effect in dep.borrow().iter() {
                    if effect.is_computed() {
                        computed.insert(effect.clone());
                    } else {
                        plain.insert(effect.clone());
                    }
                }
            };

            if op == Operation::Clear {
                for dep in entry.keys.values() {
                    collect(dep);
                }
            } else {
                if let Some(key) = &key {
                    if let Some(dep) = entry.keys.get(key) {
                        collect(dep);
                    }
                }
                if matches!(op, Operation::Add | Operation::Delete) {
                    let iterate_key = match shape {
                        Some(Shape::List) => DepKey::Length,
                        _ => DepKey::Iterate,
                    };
                    if let Some(dep) = entry.keys.get(&iterate_key) {
                        collect(dep);
                    }
                }
            }

            (computed, plain)
        };

        if computed.is_empty() && plain.is_empty() {
            return;
        }

        trace!(
            target_id = target.raw(),
            ?op,
            ?key,
            computed = computed.len(),
            plain = plain.len(),
            "trigger"
        );

        for effect in computed.iter().chain(plain.iter()) {
            self.invoke(effect, target, op, &key, &old, &new);
        }
    }

    fn invoke(
        &self,
        effect: &Effect,
        target: TargetId,
        op: Operation,
        key: &Option<DepKey>,
        old: &Option<Value>,
        new: &Option<Value>,
    ) {
        if let Some(hook) = effect.on_trigger() {
            hook(&DebugEvent {
                effect: effect.id(),
                target,
                op,
                key: key.clone(),
                old: old.clone(),
                new: new.clone(),
            });
        }
        match effect.scheduler() {
            Some(scheduler) => scheduler(effect),
            None => {
                effect.run();
            }
        }
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Drop ledger entries whose target has been collected, and empty
    /// subscription sets left behind by effect cleanup.
    pub fn sweep(&self) {
        let mut deps = self.state.deps.borrow_mut();
        deps.retain(|_, entry| {
            if entry.probe.strong_count() == 0 {
                return false;
            }
            entry.keys.retain(|_, dep| !dep.borrow().is_empty());
            true
        });
        drop(deps);

        self.state
            .mutable_wrappers
            .borrow_mut()
            .retain(|_, w| w.strong_count() > 0);
        self.state
            .readonly_wrappers
            .borrow_mut()
            .retain(|_, w| w.strong_count() > 0);
    }

    /// Number of targets with at least one ledger entry.
    pub fn tracked_target_count(&self) -> usize {
        self.state.deps.borrow().len()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::effect::EffectOptions;
    use crate::reactive::value::Record;

    #[test]
    fn track_is_a_noop_outside_an_effect() {
        let rt = Runtime::new();
        let rec = Record::new();

        rt.track(
            rec.id(),
            || rec.probe(),
            Operation::Get,
            DepKey::Field(Rc::from("a")),
        );

        assert_eq!(rt.tracked_target_count(), 0);
    }

    #[test]
    fn track_records_an_edge_for_the_running_effect() {
        let rt = Runtime::new();
        let rec = Record::new();
        let rec2 = rec.clone();
        let rt2 = rt.clone();

        rt.effect(move || {
            rt2.track(
                rec2.id(),
                || rec2.probe(),
                Operation::Get,
                DepKey::Field(Rc::from("a")),
            );
        });

        assert_eq!(rt.tracked_target_count(), 1);
    }

    #[test]
    fn trigger_reinvokes_subscribers_of_the_written_key() {
        let rt = Runtime::new();
        let rec = Record::new();
        let runs = Rc::new(Cell::new(0));

        let rec2 = rec.clone();
        let rt2 = rt.clone();
        let runs2 = runs.clone();
        rt.effect(move || {
            runs2.set(runs2.get() + 1);
            rt2.track(
                rec2.id(),
                || rec2.probe(),
                Operation::Get,
                DepKey::Field(Rc::from("a")),
            );
        });
        assert_eq!(runs.get(), 1);

        rt.trigger(
            rec.id(),
            Operation::Set,
            Some(DepKey::Field(Rc::from("a"))),
            Some(Shape::Record),
            None,
            None,
        );
        assert_eq!(runs.get(), 2);

        // A different key leaves the effect alone.
        rt.trigger(
            rec.id(),
            Operation::Set,
            Some(DepKey::Field(Rc::from("b"))),
            Some(Shape::Record),
            None,
            None,
        );
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn paused_tracking_creates_no_edges() {
        let rt = Runtime::new();
        let rec = Record::new();

        let rec2 = rec.clone();
        let rt2 = rt.clone();
        rt.effect(move || {
            rt2.pause_tracking();
            rt2.track(
                rec2.id(),
                || rec2.probe(),
                Operation::Get,
                DepKey::Field(Rc::from("a")),
            );
            rt2.resume_tracking();
        });

        assert_eq!(rt.tracked_target_count(), 0);
    }

    #[test]
    fn untracked_restores_the_previous_state() {
        let rt = Runtime::new();
        assert!(rt.is_tracking());

        let rt2 = rt.clone();
        rt.untracked(move || {
            assert!(!rt2.is_tracking());
        });

        assert!(rt.is_tracking());
    }

    #[test]
    fn lock_is_engaged_by_default() {
        let rt = Runtime::new();
        assert!(rt.is_locked());

        rt.unlock();
        assert!(!rt.is_locked());

        rt.lock();
        assert!(rt.is_locked());
    }

    #[test]
    fn sweep_reclaims_dead_targets() {
        let rt = Runtime::new();
        let rec = Record::new();

        let rec2 = rec.clone();
        let rt2 = rt.clone();
        let runner = rt.effect(move || {
            rt2.track(
                rec2.id(),
                || rec2.probe(),
                Operation::Get,
                DepKey::Field(Rc::from("a")),
            );
        });
        assert_eq!(rt.tracked_target_count(), 1);

        runner.stop();
        // The effect's closure holds the last clone of the record.
        drop(runner);
        drop(rec);
        rt.sweep();

        assert_eq!(rt.tracked_target_count(), 0);
    }

    #[test]
    fn effects_with_options_run_lazily_when_asked() {
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
}
