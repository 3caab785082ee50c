//! Access-Interception Wrapper
//!
//! An `Observed` value is a facade over a raw aggregate. Reads route
//! through the runtime's `track` and lazily wrap aggregate children in
//! the same access mode; writes route through `trigger` with the
//! add/set/delete vocabulary and NaN-aware change suppression.
//!
//! # Registries
//!
//! At most one mutable and one read-only wrapper exist per target. The
//! runtime holds them weakly, keyed by target id: re-wrapping a value
//! yields the wrapper already in circulation, and dropping every handle
//! lets both the wrapper and the target go away.
//!
//! # Modes
//!
//! A read-only wrapper shares its target with the mutable one, but its
//! write and delete paths consult the runtime's access-control lock
//! first: while the lock is engaged they warn and report success without
//! mutating. Disengaging the lock turns them into the mutable paths.

use std::any::Any;
use std::rc::{Rc, Weak};

use tracing::warn;

use super::runtime::{DepKey, Operation, Runtime};
use super::value::{same_value, List, Record, Shape, TargetId, Value};

/// Access mode of a wrapper, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Mutable,
    ReadOnly,
}

/// An intercepting facade over a raw aggregate.
///
/// Cheap to clone; clones are the same wrapper.
#[derive(Clone)]
pub struct Observed {
    pub(crate) inner: Rc<ObservedCell>,
}

pub(crate) struct ObservedCell {
    /// The wrapper's own identity (distinct from the target's).
    pub(crate) id: TargetId,
    pub(crate) rt: Runtime,
    /// The raw aggregate; always one of the four wrappable variants.
    pub(crate) target: Value,
    pub(crate) target_id: TargetId,
    pub(crate) shape: Shape,
    pub(crate) mode: AccessMode,
}

impl Observed {
    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    pub fn target_id(&self) -> TargetId {
        self.inner.target_id
    }

    pub fn shape(&self) -> Shape {
        self.inner.shape
    }

    pub fn mode(&self) -> AccessMode {
        self.inner.mode
    }

    pub fn runtime(&self) -> &Runtime {
        &self.inner.rt
    }

    /// The raw target behind this wrapper.
    pub fn raw(&self) -> Value {
        self.inner.target.clone()
    }

    pub(crate) fn same_wrapper(&self, other: &Observed) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn probe(&self) -> Weak<dyn Any> {
        self.inner
            .target
            .probe()
            .expect("wrapper target is always an aggregate")
    }

    pub(crate) fn record(&self) -> &Record {
        match &self.inner.target {
            Value::Record(r) => r,
            _ => unreachable!("shape-checked before dispatch"),
        }
    }

    pub(crate) fn list(&self) -> &List {
        match &self.inner.target {
            Value::List(l) => l,
            _ => unreachable!("shape-checked before dispatch"),
        }
    }

    /// Wrap an aggregate child in this wrapper's access mode; other
    /// values pass through.
    pub(crate) fn wrap_child(&self, value: Value) -> Value {
        if !value.is_wrappable() {
            return value;
        }
        match self.inner.mode {
            AccessMode::Mutable => self.inner.rt.reactive(value),
            AccessMode::ReadOnly => self.inner.rt.readonly(value),
        }
    }

    /// True when a mutation through this wrapper must be rejected.
    /// Warns once per call; the caller returns its success value.
    pub(crate) fn rejects_mutation(&self, what: &str) -> bool {
        if self.inner.mode == AccessMode::ReadOnly && self.inner.rt.is_locked() {
            warn!(
                target_id = self.inner.target_id.raw(),
                "{what} rejected on read-only value"
            );
            return true;
        }
        false
    }

    fn track(&self, op: Operation, key: DepKey) {
        self.inner
            .rt
            .track(self.inner.target_id, || self.probe(), op, key);
    }

    fn trigger(&self, op: Operation, key: Option<DepKey>, old: Option<Value>, new: Option<Value>) {
        self.inner
            .rt
            .trigger(self.inner.target_id, op, key, Some(self.inner.shape), old, new);
    }

    // ------------------------------------------------------------------
    // Record interception
    // ------------------------------------------------------------------

    /// Intercepted field read. Ref slots auto-unwrap (the ref records its
    /// own dependency); aggregate results are wrapped in this wrapper's
    /// mode on the way out.
    pub fn get(&self, key: &str) -> Value {
        if self.inner.shape != Shape::Record {
            warn!(kind = ?self.inner.shape, key, "field read on a non-record");
            return Value::Unit;
        }

        let found = self.record().get(key);
        if let Some(Value::Ref(r)) = &found {
            return r.get();
        }

        self.track(Operation::Get, DepKey::Field(Rc::from(key)));
        match found {
            Some(v) => self.wrap_child(v),
            None => Value::Unit,
        }
    }

    /// Intercepted field write.
    ///
    /// If the slot holds a ref and the incoming value is not one, the
    /// write lands on the ref's value instead of replacing the slot (the
    /// ref fires its own trigger). Otherwise writes fire `Add` for a new
    /// key or `Set` for a changed value; an identical value (NaN-aware)
    /// fires nothing.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        if self.inner.shape != Shape::Record {
            warn!(kind = ?self.inner.shape, key, "field write on a non-record");
            return;
        }
        if self.rejects_mutation("field write") {
            return;
        }

        let value = value.into();
        let record = self.record();
        let old = record.get(key);

        if let Some(Value::Ref(r)) = &old {
            if !matches!(value, Value::Ref(_)) {
                r.set(value);
                return;
            }
        }

        record.insert(key, value.clone());
        match old {
            None => self.trigger(
                Operation::Add,
                Some(DepKey::Field(Rc::from(key))),
                None,
                Some(value),
            ),
            Some(prev) => {
                if !same_value(&prev, &value) {
                    self.trigger(
                        Operation::Set,
                        Some(DepKey::Field(Rc::from(key))),
                        Some(prev),
                        Some(value),
                    );
                }
            }
        }
    }

    /// Intercepted field delete. Returns whether the key existed, except
    /// on a locked read-only wrapper, which reports success.
    pub fn delete(&self, key: &str) -> bool {
        if self.inner.shape != Shape::Record {
            warn!(kind = ?self.inner.shape, key, "field delete on a non-record");
            return false;
        }
        if self.rejects_mutation("field delete") {
            return true;
        }

        match self.record().remove(key) {
            Some(prev) => {
                self.trigger(
                    Operation::Delete,
                    Some(DepKey::Field(Rc::from(key))),
                    Some(prev),
                    None,
                );
                true
            }
            None => false,
        }
    }

    /// Intercepted existence check.
    pub fn has(&self, key: &str) -> bool {
        if self.inner.shape != Shape::Record {
            warn!(kind = ?self.inner.shape, key, "existence check on a non-record");
            return false;
        }
        self.track(Operation::Has, DepKey::Field(Rc::from(key)));
        self.record().contains_key(key)
    }

    // ------------------------------------------------------------------
    // List interception
    // ------------------------------------------------------------------

    /// Intercepted slot read; mirrors `get` with index keys.
    pub fn at(&self, index: usize) -> Value {
        if self.inner.shape != Shape::List {
            warn!(kind = ?self.inner.shape, index, "slot read on a non-list");
            return Value::Unit;
        }

        let found = self.list().get(index);
        if let Some(Value::Ref(r)) = &found {
            return r.get();
        }

        self.track(Operation::Get, DepKey::Index(index));
        match found {
            Some(v) => self.wrap_child(v),
            None => Value::Unit,
        }
    }

    /// Intercepted slot write. Writing past the end extends the list and
    /// fires `Add` (which also reaches `Length` subscribers).
    pub fn set_at(&self, index: usize, value: impl Into<Value>) {
        if self.inner.shape != Shape::List {
            warn!(kind = ?self.inner.shape, index, "slot write on a non-list");
            return;
        }
        if self.rejects_mutation("slot write") {
            return;
        }

        let value = value.into();
        let list = self.list();
        let old = list.get(index);

        if let Some(Value::Ref(r)) = &old {
            if !matches!(value, Value::Ref(_)) {
                r.set(value);
                return;
            }
        }

        list.set(index, value.clone());
        match old {
            None => self.trigger(
                Operation::Add,
                Some(DepKey::Index(index)),
                None,
                Some(value),
            ),
            Some(prev) => {
                if !same_value(&prev, &value) {
                    self.trigger(
                        Operation::Set,
                        Some(DepKey::Index(index)),
                        Some(prev),
                        Some(value),
                    );
                }
            }
        }
    }

    /// Intercepted append.
    pub fn push(&self, value: impl Into<Value>) {
        if self.inner.shape != Shape::List {
            warn!(kind = ?self.inner.shape, "push on a non-list");
            return;
        }
        if self.rejects_mutation("push") {
            return;
        }

        let value = value.into();
        let list = self.list();
        let index = list.len();
        list.push(value.clone());
        self.trigger(Operation::Add, Some(DepKey::Index(index)), None, Some(value));
    }

    /// Intercepted removal of the last slot. Returns the removed value as
    /// stored (no tracking, no wrapping), or `Unit` when empty or
    /// rejected.
    pub fn pop(&self) -> Value {
        if self.inner.shape != Shape::List {
            warn!(kind = ?self.inner.shape, "pop on a non-list");
            return Value::Unit;
        }
        if self.rejects_mutation("pop") {
            return Value::Unit;
        }

        let list = self.list();
        match list.pop() {
            Some(prev) => {
                self.trigger(
                    Operation::Delete,
                    Some(DepKey::Index(list.len())),
                    Some(prev.clone()),
                    None,
                );
                prev
            }
            None => Value::Unit,
        }
    }

    /// Length / size of the target. Lists track their `Length` key;
    /// records and collections track the iterate sentinel.
    pub fn len(&self) -> usize {
        match &self.inner.target {
            Value::Record(r) => {
                self.track(Operation::Iterate, DepKey::Iterate);
                r.len()
            }
            Value::List(l) => {
                self.track(Operation::Get, DepKey::Length);
                l.len()
            }
            Value::Map(m) => {
                self.track(Operation::Iterate, DepKey::Iterate);
                m.len()
            }
            Value::Set(s) => {
                self.track(Operation::Iterate, DepKey::Iterate);
                s.len()
            }
            _ => unreachable!("wrapper target is always an aggregate"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Observed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observed")
            .field("id", &self.inner.id.raw())
            .field("target", &self.inner.target_id.raw())
            .field("shape", &self.inner.shape)
            .field("mode", &self.inner.mode)
            .finish()
    }
}

impl Runtime {
    /// Wrap an aggregate in a mutable intercepting facade.
    ///
    /// Idempotent on wrappers (a read-only wrapper stays read-only);
    /// values marked non-reactive and non-aggregates pass through
    /// unchanged, the latter with a diagnostic.
    pub fn reactive(&self, value: Value) -> Value {
        match value {
            Value::Observed(_) => value,
            v if v.is_wrappable() => {
                let id = v.id().expect("aggregates always carry an id");
                if self.state().non_reactive_marks.borrow().contains(&id) {
                    return v;
                }
                if self.state().readonly_marks.borrow().contains(&id) {
                    return self.observe(v, AccessMode::ReadOnly);
                }
                self.observe(v, AccessMode::Mutable)
            }
            other => {
                warn!(kind = other.type_name(), "value cannot be made reactive");
                other
            }
        }
    }

    /// Wrap an aggregate in a read-only intercepting facade. Requesting
    /// read-only of an already-mutable wrapper yields a read-only wrapper
    /// over the same target.
    pub fn readonly(&self, value: Value) -> Value {
        match value {
            Value::Observed(o) if o.mode() == AccessMode::ReadOnly => Value::Observed(o),
            Value::Observed(o) => {
                let raw = o.raw();
                self.observe(raw, AccessMode::ReadOnly)
            }
            v if v.is_wrappable() => {
                let id = v.id().expect("aggregates always carry an id");
                if self.state().non_reactive_marks.borrow().contains(&id) {
                    return v;
                }
                self.observe(v, AccessMode::ReadOnly)
            }
            other => {
                warn!(kind = other.type_name(), "value cannot be made read-only");
                other
            }
        }
    }

    /// Find-or-create the wrapper for `raw` in the given mode.
    fn observe(&self, raw: Value, mode: AccessMode) -> Value {
        let target_id = raw.id().expect("aggregates always carry an id");
        let registry = match mode {
            AccessMode::Mutable => &self.state().mutable_wrappers,
            AccessMode::ReadOnly => &self.state().readonly_wrappers,
        };

        if let Some(existing) = registry
            .borrow()
            .get(&target_id)
            .and_then(|weak| weak.upgrade())
        {
            return Value::Observed(Observed { inner: existing });
        }

        let shape = raw.shape().expect("wrappable values have a shape");
        let cell = Rc::new(ObservedCell {
            id: TargetId::next(),
            rt: self.clone(),
            target: raw,
            target_id,
            shape,
            mode,
        });
        registry.borrow_mut().insert(target_id, Rc::downgrade(&cell));
        Value::Observed(Observed { inner: cell })
    }

    /// Force a raw value to always resolve read-only when wrapped.
    pub fn mark_readonly(&self, value: &Value) {
        match crate::reactive::to_raw(value.clone()).id() {
            Some(id) => {
                self.state().readonly_marks.borrow_mut().insert(id);
            }
            None => warn!(
                kind = value.type_name(),
                "only aggregates can be marked read-only"
            ),
        }
    }

    /// Opt a raw value out of wrapping entirely.
    pub fn mark_non_reactive(&self, value: &Value) {
        match crate::reactive::to_raw(value.clone()).id() {
            Some(id) => {
                self.state().non_reactive_marks.borrow_mut().insert(id);
            }
            None => warn!(
                kind = value.type_name(),
                "only aggregates can be marked non-reactive"
            ),
        }
    }
}
