//! Keyed-Collection Instrumentation
//!
//! Map and set operations are not field accesses, so each one is
//! instrumented individually on the wrapper surface. Every method
//! unwraps the receiver and any wrapped argument back to raw identity
//! before touching storage (lookups and mutations must hit the raw
//! target, never a wrapper), computes hit/miss and old-value bookkeeping
//! before forwarding, and re-wraps read results (including every value
//! and pair yielded by iteration) in the wrapper's access mode.
//!
//! The enumeration methods (`keys`, `values`, `entries`, `for_each`,
//! `size`) are also implemented here for records and lists, so one
//! surface covers all four shapes.

use tracing::warn;

use super::observed::Observed;
use super::runtime::{DepKey, Operation};
use super::value::{same_value, EntryKey, MapCell, SetCell, Shape, Value};

impl Observed {
    fn map(&self) -> &MapCell {
        match &self.inner.target {
            Value::Map(m) => m,
            _ => unreachable!("shape-checked before dispatch"),
        }
    }

    fn set_cell(&self) -> &SetCell {
        match &self.inner.target {
            Value::Set(s) => s,
            _ => unreachable!("shape-checked before dispatch"),
        }
    }

    fn track_entry(&self, op: Operation, key: &Value) {
        self.inner.rt.track(
            self.inner.target_id,
            || self.probe(),
            op,
            DepKey::Entry(EntryKey(key.clone())),
        );
    }

    fn track_iterate(&self) {
        self.inner.rt.track(
            self.inner.target_id,
            || self.probe(),
            Operation::Iterate,
            match self.inner.shape {
                Shape::List => DepKey::Length,
                _ => DepKey::Iterate,
            },
        );
    }

    fn trigger_entry(&self, op: Operation, key: Value, old: Option<Value>, new: Option<Value>) {
        self.inner.rt.trigger(
            self.inner.target_id,
            op,
            Some(DepKey::Entry(EntryKey(key))),
            Some(self.inner.shape),
            old,
            new,
        );
    }

    // ------------------------------------------------------------------
    // Map interception
    // ------------------------------------------------------------------

    /// Intercepted map lookup, keyed by raw identity.
    pub fn entry(&self, key: &Value) -> Value {
        if self.inner.shape != Shape::Map {
            warn!(kind = ?self.inner.shape, "entry lookup on a non-map");
            return Value::Unit;
        }

        let key = crate::reactive::to_raw(key.clone());
        let found = self.map().get(&key);
        self.track_entry(Operation::Get, &key);
        match found {
            Some(v) => self.wrap_child(v),
            None => Value::Unit,
        }
    }

    /// Intercepted map insert. Both key and value are unwrapped to raw
    /// before storage.
    pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) {
        if self.inner.shape != Shape::Map {
            warn!(kind = ?self.inner.shape, "entry insert on a non-map");
            return;
        }
        if self.rejects_mutation("entry insert") {
            return;
        }

        let key = crate::reactive::to_raw(key.into());
        let value = crate::reactive::to_raw(value.into());

        let old = self.map().get(&key);
        self.map().insert(key.clone(), value.clone());
        match old {
            None => self.trigger_entry(Operation::Add, key, None, Some(value)),
            Some(prev) => {
                if !same_value(&prev, &value) {
                    self.trigger_entry(Operation::Set, key, Some(prev), Some(value));
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Set interception
    // ------------------------------------------------------------------

    /// Intercepted set insertion.
    pub fn add(&self, value: impl Into<Value>) {
        if self.inner.shape != Shape::Set {
            warn!(kind = ?self.inner.shape, "member add on a non-set");
            return;
        }
        if self.rejects_mutation("member add") {
            return;
        }

        let value = crate::reactive::to_raw(value.into());
        let had = self.set_cell().contains(&value);
        self.set_cell().insert(value.clone());
        if !had {
            self.trigger_entry(Operation::Add, value.clone(), None, Some(value));
        }
    }

    // ------------------------------------------------------------------
    // Shared map/set surface
    // ------------------------------------------------------------------

    /// Intercepted membership check for maps and sets.
    pub fn contains(&self, key: &Value) -> bool {
        let key = crate::reactive::to_raw(key.clone());
        match self.inner.shape {
            Shape::Map => {
                self.track_entry(Operation::Has, &key);
                self.map().contains(&key)
            }
            Shape::Set => {
                self.track_entry(Operation::Has, &key);
                self.set_cell().contains(&key)
            }
            other => {
                warn!(kind = ?other, "membership check on a non-collection");
                false
            }
        }
    }

    /// Intercepted entry/member removal. Returns whether the key existed,
    /// except on a locked read-only wrapper, which reports success.
    pub fn remove(&self, key: &Value) -> bool {
        if !matches!(self.inner.shape, Shape::Map | Shape::Set) {
            warn!(kind = ?self.inner.shape, "entry removal on a non-collection");
            return false;
        }
        if self.rejects_mutation("entry removal") {
            return true;
        }

        let key = crate::reactive::to_raw(key.clone());
        match self.inner.shape {
            Shape::Map => match self.map().remove(&key) {
                Some(prev) => {
                    self.trigger_entry(Operation::Delete, key, Some(prev), None);
                    true
                }
                None => false,
            },
            Shape::Set => {
                let had = self.set_cell().remove(&key);
                if had {
                    self.trigger_entry(Operation::Delete, key, None, None);
                }
                had
            }
            _ => unreachable!("shape-checked above"),
        }
    }

    /// Intercepted clear. Fires once, to every subscriber of the target,
    /// and only when there was something to remove.
    pub fn clear(&self) {
        if !matches!(self.inner.shape, Shape::Map | Shape::Set) {
            warn!(kind = ?self.inner.shape, "clear on a non-collection");
            return;
        }
        if self.rejects_mutation("clear") {
            return;
        }

        let had = match self.inner.shape {
            Shape::Map => {
                let had = !self.map().is_empty();
                self.map().clear();
                had
            }
            Shape::Set => {
                let had = !self.set_cell().is_empty();
                self.set_cell().clear();
                had
            }
            _ => unreachable!("shape-checked above"),
        };

        if had {
            self.inner.rt.trigger(
                self.inner.target_id,
                Operation::Clear,
                None,
                Some(self.inner.shape),
                None,
                None,
            );
        }
    }

    /// Entry count, tracked against the iterate sentinel.
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Intercepted iteration: `f(value, key)` per entry. For sets the
    /// member doubles as its own key, mirroring the map signature.
    pub fn for_each(&self, mut f: impl FnMut(Value, Value)) {
        match self.inner.shape {
            Shape::Map => {
                self.track_iterate();
                for (k, v) in self.map().entries() {
                    f(self.wrap_child(v), self.wrap_child(k));
                }
            }
            Shape::Set => {
                self.track_iterate();
                for v in self.set_cell().members() {
                    f(self.wrap_child(v.clone()), self.wrap_child(v));
                }
            }
            other => warn!(kind = ?other, "iteration on a non-collection"),
        }
    }

    // ------------------------------------------------------------------
    // Enumeration across all shapes
    // ------------------------------------------------------------------

    /// Own keys of the target: field names, list indices, map keys, or
    /// set members. Tracked against the shape's iterate-all key.
    pub fn keys(&self) -> Vec<Value> {
        self.track_iterate();
        match &self.inner.target {
            Value::Record(r) => r.keys().into_iter().map(Value::Str).collect(),
            Value::List(l) => (0..l.len()).map(|i| Value::Int(i as i64)).collect(),
            Value::Map(m) => m.entries().into_iter().map(|(k, _)| k).collect(),
            Value::Set(s) => s.members(),
            _ => unreachable!("wrapper target is always an aggregate"),
        }
    }

    /// Own values of the target, each re-wrapped in the access mode.
    ///
    /// Record and list values go through the normal read interception, so
    /// the iterator depends on every slot it saw, not just the shape of
    /// the target. Collection values are native reads keyed only by the
    /// iterate sentinel.
    pub fn values(&self) -> Vec<Value> {
        self.track_iterate();
        match &self.inner.target {
            Value::Record(r) => r.keys().iter().map(|k| self.get(k)).collect(),
            Value::List(l) => (0..l.len()).map(|i| self.at(i)).collect(),
            Value::Map(m) => m
                .entries()
                .into_iter()
                .map(|(_, v)| self.wrap_child(v))
                .collect(),
            Value::Set(s) => s.members().into_iter().map(|v| self.wrap_child(v)).collect(),
            _ => unreachable!("wrapper target is always an aggregate"),
        }
    }

    /// Own `(key, value)` pairs of the target, values read as in
    /// [`Observed::values`].
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.track_iterate();
        match &self.inner.target {
            Value::Record(r) => r
                .keys()
                .into_iter()
                .map(|k| {
                    let v = self.get(&k);
                    (Value::Str(k), v)
                })
                .collect(),
            Value::List(l) => (0..l.len())
                .map(|i| (Value::Int(i as i64), self.at(i)))
                .collect(),
            Value::Map(m) => m
                .entries()
                .into_iter()
                .map(|(k, v)| (self.wrap_child(k), self.wrap_child(v)))
                .collect(),
            Value::Set(s) => s
                .members()
                .into_iter()
                .map(|v| (self.wrap_child(v.clone()), self.wrap_child(v)))
                .collect(),
            _ => unreachable!("wrapper target is always an aggregate"),
        }
    }
}
