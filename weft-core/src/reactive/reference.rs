//! Boxed Reactive Cells
//!
//! A `Ref` is a single-value reactive container: reading `.get()` tracks
//! the ref itself (under its fixed value key) and writing `.set()`
//! triggers it. Three kinds share the surface:
//!
//! - a plain cell with its own storage,
//! - a field alias created by `to_refs`, proxying reads and writes
//!   straight through to the source object with no storage of its own,
//! - a computed cell (see the derived-value cache), which answers
//!   `is_ref` like the others.
//!
//! Aggregate payloads are converted through the wrap-eligibility check on
//! store, so a ref holding a record hands out a reactive record.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::warn;

use super::computed::ComputedCell;
use super::runtime::{DepKey, Operation, Runtime};
use super::value::{Record, TargetId, Value};

/// A single-value reactive container. Cheap to clone; clones are the
/// same cell.
#[derive(Clone)]
pub struct Ref {
    inner: Rc<RefState>,
}

struct RefState {
    id: TargetId,
    rt: Runtime,
    kind: RefKind,
}

enum RefKind {
    /// Own storage.
    Cell(RefCell<Value>),
    /// Alias to `source[key]`; reads and writes pass straight through.
    Alias { source: Value, key: Rc<str> },
    /// Derived-value cache.
    Computed(ComputedCell),
}

impl Ref {
    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    pub(crate) fn computed(rt: &Runtime, cell: ComputedCell) -> Self {
        Self {
            inner: Rc::new(RefState {
                id: TargetId::next(),
                rt: rt.clone(),
                kind: RefKind::Computed(cell),
            }),
        }
    }

    fn alias(rt: &Runtime, source: Value, key: Rc<str>) -> Self {
        Self {
            inner: Rc::new(RefState {
                id: TargetId::next(),
                rt: rt.clone(),
                kind: RefKind::Alias { source, key },
            }),
        }
    }

    /// Read the cell. Plain cells track themselves; aliases defer to the
    /// source read (which tracks if the source is wrapped); computeds
    /// refresh on demand.
    pub fn get(&self) -> Value {
        match &self.inner.kind {
            RefKind::Cell(cell) => {
                self.inner.rt.track(
                    self.inner.id,
                    || self.probe(),
                    Operation::Get,
                    DepKey::Value,
                );
                cell.borrow().clone()
            }
            RefKind::Alias { source, key } => source.get(key),
            RefKind::Computed(c) => c.value(&self.inner.rt),
        }
    }

    /// Write the cell. Plain cells store (converting aggregates through
    /// the wrap check) and fire `Set` against themselves; aliases defer
    /// to the source write; computeds forward to their setter.
    pub fn set(&self, value: impl Into<Value>) {
        let value = value.into();
        match &self.inner.kind {
            RefKind::Cell(cell) => {
                let converted = self.inner.rt.convert(value);
                let old = cell.replace(converted.clone());
                self.inner.rt.trigger(
                    self.inner.id,
                    Operation::Set,
                    Some(DepKey::Value),
                    None,
                    Some(old),
                    Some(converted),
                );
            }
            RefKind::Alias { source, key } => source.set(key, value),
            RefKind::Computed(c) => c.set_value(value),
        }
    }

    /// The runner behind a computed ref, for callers that need to stop
    /// it. `None` for plain cells and aliases.
    pub fn runner(&self) -> Option<super::effect::Effect> {
        match &self.inner.kind {
            RefKind::Computed(c) => Some(c.runner().clone()),
            _ => None,
        }
    }

    pub(crate) fn same_ref(&self, other: &Ref) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn probe(&self) -> Weak<dyn Any> {
        let any: Rc<dyn Any> = self.inner.clone();
        Rc::downgrade(&any)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.inner.kind {
            RefKind::Cell(_) => "cell",
            RefKind::Alias { .. } => "alias",
            RefKind::Computed(_) => "computed",
        };
        f.debug_struct("Ref")
            .field("id", &self.inner.id.raw())
            .field("kind", &kind)
            .finish()
    }
}

impl Runtime {
    /// Box a value into a reactive cell. Idempotent on refs; aggregate
    /// payloads become reactive on the way in.
    pub fn new_ref(&self, value: impl Into<Value>) -> Ref {
        let value = value.into();
        if let Value::Ref(r) = value {
            return r;
        }
        let converted = self.convert(value);
        Ref {
            inner: Rc::new(RefState {
                id: TargetId::next(),
                rt: self.clone(),
                kind: RefKind::Cell(RefCell::new(converted)),
            }),
        }
    }

    /// The wrap-eligibility conversion applied to ref payloads.
    pub(crate) fn convert(&self, value: Value) -> Value {
        if value.is_wrappable() {
            self.reactive(value)
        } else {
            value
        }
    }

    /// One alias ref per own key of `source`, gathered into a plain
    /// record. Each alias proxies reads and writes straight through to
    /// `source[key]`; there is no independent storage.
    pub fn to_refs(&self, source: &Value) -> Value {
        let keys: Vec<Rc<str>> = match source {
            Value::Record(r) => r.keys(),
            Value::Observed(o) => match &o.inner.target {
                Value::Record(r) => r.keys(),
                _ => {
                    warn!(kind = ?o.shape(), "to_refs needs a record");
                    return Value::Record(Record::new());
                }
            },
            other => {
                warn!(kind = other.type_name(), "to_refs needs a record");
                return Value::Record(Record::new());
            }
        };

        let out = Record::new();
        for key in keys {
            let alias = Ref::alias(self, source.clone(), key.clone());
            out.insert(key, Value::Ref(alias));
        }
        Value::Record(out)
    }
}

/// Whether a value is a boxed reactive cell (including computeds).
pub fn is_ref(value: &Value) -> bool {
    matches!(value, Value::Ref(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use std::cell::Cell;

    #[test]
    fn ref_round_trips_a_value() {
        let rt = Runtime::new();
        let r = rt.new_ref(1);

        assert_eq!(r.get(), Value::Int(1));
        r.set(2);
        assert_eq!(r.get(), Value::Int(2));
    }

    #[test]
    fn new_ref_is_idempotent() {
        let rt = Runtime::new();
        let r = rt.new_ref(1);
        let again = rt.new_ref(Value::Ref(r.clone()));

        assert!(r.same_ref(&again));
    }

    #[test]
    fn ref_writes_retrigger_readers() {
        let rt = Runtime::new();
        let r = rt.new_ref(0);

        let seen = Rc::new(Cell::new(-1));
        let seen2 = seen.clone();
        let r2 = r.clone();
        rt.effect(move || {
            seen2.set(r2.get().as_int().unwrap_or(-1));
        });
        assert_eq!(seen.get(), 0);

        r.set(7);
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn aggregate_payloads_become_reactive() {
        let rt = Runtime::new();
        let r = rt.new_ref(record! { "a" => 1 });

        assert!(crate::reactive::is_reactive(&r.get()));
    }

    #[test]
    fn auto_unwrap_on_record_read() {
        let rt = Runtime::new();
        let r = rt.new_ref(1);
        let state = rt.reactive(record! { "a" => Value::Ref(r.clone()) });

        // Reading through the record yields the ref's value, not the ref.
        assert_eq!(state.get("a"), Value::Int(1));

        // Writing a non-ref value lands on the ref's slot.
        state.set("a", 2);
        assert_eq!(r.get(), Value::Int(2));
        assert_eq!(state.get("a"), Value::Int(2));
    }

    #[test]
    fn ref_in_record_keeps_its_own_subscribers() {
        let rt = Runtime::new();
        let r = rt.new_ref(1);
        let state = rt.reactive(record! { "a" => Value::Ref(r.clone()) });

        let seen = Rc::new(Cell::new(0));
        let seen2 = seen.clone();
        let state2 = state.clone();
        rt.effect(move || {
            seen2.set(state2.get("a").as_int().unwrap_or(0));
        });
        assert_eq!(seen.get(), 1);

        // Writing the ref directly reaches the record reader too.
        r.set(5);
        assert_eq!(seen.get(), 5);
    }

    #[test]
    fn to_refs_aliases_read_and_write_through() {
        let rt = Runtime::new();
        let state = rt.reactive(record! { "a" => 1, "b" => 2 });
        let refs = rt.to_refs(&state);

        let a = match refs.get("a") {
            Value::Ref(r) => r,
            other => panic!("expected an alias ref, got {other:?}"),
        };

        assert_eq!(a.get(), Value::Int(1));

        a.set(10);
        assert_eq!(state.get("a"), Value::Int(10));

        state.set("a", 20);
        assert_eq!(a.get(), Value::Int(20));
    }

    #[test]
    fn to_refs_on_a_non_record_warns_and_returns_empty() {
        let rt = Runtime::new();
        let refs = rt.to_refs(&Value::Int(1));

        match refs {
            Value::Record(r) => assert!(r.is_empty()),
            other => panic!("expected an empty record, got {other:?}"),
        }
    }
}
