//! Derived-Value Cache
//!
//! A computed is a memoizing, demand-driven derived value that behaves
//! like a reactive cell to its readers. It is built from one `lazy`,
//! `computed`-tagged effect whose scheduler only flips a dirty bit:
//! triggering a dependency never recomputes eagerly, the next `.get()`
//! does.
//!
//! # Transitive dependencies
//!
//! Whenever a computed is read inside another effect, every subscription
//! set the computed's own runner belongs to also gains that outer effect.
//! If effect A reads computed C which reads state S, then from S's point
//! of view A is a direct subscriber: writing S re-runs A even though A
//! never touched S's wrapper. Combined with computed-first trigger
//! ordering, A always observes a freshly invalidated C.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::warn;

use super::effect::{Effect, EffectOptions};
use super::reference::Ref;
use super::runtime::Runtime;
use super::value::Value;

type Setter = Rc<dyn Fn(Value)>;

/// The state behind a computed ref.
pub(crate) struct ComputedCell {
    runner: Effect,
    value: RefCell<Value>,
    dirty: Rc<Cell<bool>>,
    setter: Option<Setter>,
}

impl ComputedCell {
    /// Current value, recomputing first if a dependency changed since the
    /// last read.
    pub(crate) fn value(&self, rt: &Runtime) -> Value {
        if self.dirty.get() {
            let fresh = self.runner.run();
            *self.value.borrow_mut() = fresh;
            self.dirty.set(false);
        }

        self.propagate_to_consumer(rt);
        self.value.borrow().clone()
    }

    /// Add the effect currently on the call stack to every subscription
    /// set the computed's runner belongs to.
    fn propagate_to_consumer(&self, rt: &Runtime) {
        let Some(consumer) = rt.current_effect() else {
            return;
        };
        if consumer.id() == self.runner.id() {
            return;
        }

        for dep in self.runner.deps_snapshot() {
            let added = dep.borrow_mut().insert(consumer.clone());
            if added {
                consumer.push_dep(dep);
            }
        }
    }

    pub(crate) fn set_value(&self, value: Value) {
        match &self.setter {
            Some(setter) => setter(value),
            None => warn!("write to a computed value that has no setter"),
        }
    }

    pub(crate) fn runner(&self) -> &Effect {
        &self.runner
    }
}

impl Runtime {
    /// Create a read-only computed from a getter.
    pub fn computed(&self, getter: impl Fn() -> Value + 'static) -> Ref {
        self.make_computed(getter, None)
    }

    /// Create a writable computed: reads go through the getter's cache,
    /// writes are forwarded to `setter`.
    pub fn computed_with(
        &self,
        getter: impl Fn() -> Value + 'static,
        setter: impl Fn(Value) + 'static,
    ) -> Ref {
        self.make_computed(getter, Some(Rc::new(setter)))
    }

    fn make_computed(
        &self,
        getter: impl Fn() -> Value + 'static,
        setter: Option<Setter>,
    ) -> Ref {
        let dirty = Rc::new(Cell::new(true));
        let scheduler = {
            let dirty = dirty.clone();
            // Pull-based: a trigger only invalidates, it never recomputes.
            Rc::new(move |_: &Effect| dirty.set(true))
        };

        let runner = self.value_effect(
            getter,
            EffectOptions {
                lazy: true,
                computed: true,
                scheduler: Some(scheduler),
                ..Default::default()
            },
        );

        Ref::computed(
            self,
            ComputedCell {
                runner,
                value: RefCell::new(Value::Unit),
                dirty,
                setter,
            },
        )
    }
}
