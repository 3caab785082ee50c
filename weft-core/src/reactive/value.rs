//! Dynamic Value Model
//!
//! The engine observes aggregates whose shape is only known at runtime:
//! records (string-keyed), lists (index-keyed), and keyed collections
//! (maps and sets). `Value` is the cheap-to-clone handle that all of them,
//! plus the primitives, travel through.
//!
//! # Identity
//!
//! Every aggregate cell carries a `TargetId` allocated from a monotone
//! counter. Identity is the id, never the contents: the dependency ledger
//! and the wrapper registries key off it, and because ids are never
//! reused, a recycled allocation can never be confused with a dead entry.
//!
//! # Equality
//!
//! `same_value` implements the change-detection comparison used to
//! suppress no-op writes: primitives compare by value (NaN equals NaN,
//! integers and floats compare numerically), aggregates, refs, and
//! wrappers compare by identity. `Value`'s `PartialEq` is this comparison.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::{IndexMap, IndexSet};

use super::observed::Observed;
use super::reference::Ref;

/// Counter for generating unique target IDs.
static TARGET_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identity of an observable cell (aggregate, ref, or wrapper).
///
/// Ids are allocated once and never reused, so a stale registry entry can
/// always be told apart from a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(u64);

impl TargetId {
    /// Allocate the next unique id.
    pub fn next() -> Self {
        Self(TARGET_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The shape of an observable aggregate, resolved once at wrap time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// String-keyed record.
    Record,
    /// Index-keyed list.
    List,
    /// Arbitrary-keyed map.
    Map,
    /// Membership set.
    Set,
}

/// A dynamically shaped value.
///
/// Aggregate variants are shared handles: cloning a `Value` clones the
/// handle, not the contents. `Ref` is a boxed reactive cell and `Observed`
/// is an intercepting wrapper; both flow through the same enum so that a
/// wrapped child can be stored anywhere a raw one can.
#[derive(Clone)]
pub enum Value {
    /// The absent/neutral value.
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Record(Record),
    List(List),
    Map(MapCell),
    Set(SetCell),
    Ref(Ref),
    Observed(Observed),
}

/// A string-keyed aggregate with insertion-ordered fields.
#[derive(Clone)]
pub struct Record(pub(crate) Rc<RecordCell>);

pub(crate) struct RecordCell {
    pub(crate) id: TargetId,
    pub(crate) fields: RefCell<IndexMap<Rc<str>, Value>>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self(Rc::new(RecordCell {
            id: TargetId::next(),
            fields: RefCell::new(IndexMap::new()),
        }))
    }

    pub fn id(&self) -> TargetId {
        self.0.id
    }

    /// Plain (untracked) field read.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.fields.borrow().get(key).cloned()
    }

    /// Plain field write.
    pub fn insert(&self, key: impl Into<Rc<str>>, value: impl Into<Value>) {
        self.0.fields.borrow_mut().insert(key.into(), value.into());
    }

    /// Plain field removal, preserving the order of remaining fields.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.fields.borrow_mut().shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.fields.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<Rc<str>> {
        self.0.fields.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.fields.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.fields.borrow().is_empty()
    }

    pub(crate) fn probe(&self) -> Weak<dyn Any> {
        let any: Rc<dyn Any> = self.0.clone();
        Rc::downgrade(&any)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

/// An index-keyed aggregate.
#[derive(Clone)]
pub struct List(pub(crate) Rc<ListCell>);

pub(crate) struct ListCell {
    pub(crate) id: TargetId,
    pub(crate) items: RefCell<Vec<Value>>,
}

impl List {
    /// Create an empty list.
    pub fn new() -> Self {
        Self(Rc::new(ListCell {
            id: TargetId::next(),
            items: RefCell::new(Vec::new()),
        }))
    }

    pub fn id(&self) -> TargetId {
        self.0.id
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.items.borrow().get(index).cloned()
    }

    /// Plain slot write; slots between the old length and `index` are
    /// filled with `Unit`.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let mut items = self.0.items.borrow_mut();
        if index < items.len() {
            items[index] = value.into();
        } else {
            items.resize(index, Value::Unit);
            items.push(value.into());
        }
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.items.borrow_mut().push(value.into());
    }

    pub fn pop(&self) -> Option<Value> {
        self.0.items.borrow_mut().pop()
    }

    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.borrow().is_empty()
    }

    pub fn items(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    pub(crate) fn probe(&self) -> Weak<dyn Any> {
        let any: Rc<dyn Any> = self.0.clone();
        Rc::downgrade(&any)
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

/// An arbitrary-keyed aggregate with insertion-ordered entries.
#[derive(Clone)]
pub struct MapCell(pub(crate) Rc<MapInner>);

pub(crate) struct MapInner {
    pub(crate) id: TargetId,
    pub(crate) entries: RefCell<IndexMap<EntryKey, Value>>,
}

impl MapCell {
    /// Create an empty map.
    pub fn new() -> Self {
        Self(Rc::new(MapInner {
            id: TargetId::next(),
            entries: RefCell::new(IndexMap::new()),
        }))
    }

    pub fn id(&self) -> TargetId {
        self.0.id
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.0.entries.borrow().get(&EntryKey(key.clone())).cloned()
    }

    pub fn insert(&self, key: Value, value: Value) {
        self.0.entries.borrow_mut().insert(EntryKey(key), value);
    }

    pub fn remove(&self, key: &Value) -> Option<Value> {
        self.0
            .entries
            .borrow_mut()
            .shift_remove(&EntryKey(key.clone()))
    }

    pub fn contains(&self, key: &Value) -> bool {
        self.0.entries.borrow().contains_key(&EntryKey(key.clone()))
    }

    pub fn clear(&self) {
        self.0.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.0.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.entries.borrow().is_empty()
    }

    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.0
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.0.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn probe(&self) -> Weak<dyn Any> {
        let any: Rc<dyn Any> = self.0.clone();
        Rc::downgrade(&any)
    }
}

impl Default for MapCell {
    fn default() -> Self {
        Self::new()
    }
}

/// A membership-set aggregate with insertion-ordered members.
#[derive(Clone)]
pub struct SetCell(pub(crate) Rc<SetInner>);

pub(crate) struct SetInner {
    pub(crate) id: TargetId,
    pub(crate) members: RefCell<IndexSet<EntryKey>>,
}

impl SetCell {
    /// Create an empty set.
    pub fn new() -> Self {
        Self(Rc::new(SetInner {
            id: TargetId::next(),
            members: RefCell::new(IndexSet::new()),
        }))
    }

    pub fn id(&self) -> TargetId {
        self.0.id
    }

    /// Plain insertion. Returns true if the member was new.
    pub fn insert(&self, value: Value) -> bool {
        self.0.members.borrow_mut().insert(EntryKey(value))
    }

    /// Plain removal, preserving the order of remaining members.
    pub fn remove(&self, value: &Value) -> bool {
        self.0
            .members
            .borrow_mut()
            .shift_remove(&EntryKey(value.clone()))
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.members.borrow().contains(&EntryKey(value.clone()))
    }

    pub fn clear(&self) {
        self.0.members.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.0.members.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.members.borrow().is_empty()
    }

    pub fn members(&self) -> Vec<Value> {
        self.0.members.borrow().iter().map(|k| k.0.clone()).collect()
    }

    pub(crate) fn probe(&self) -> Weak<dyn Any> {
        let any: Rc<dyn Any> = self.0.clone();
        Rc::downgrade(&any)
    }
}

impl Default for SetCell {
    fn default() -> Self {
        Self::new()
    }
}

/// A `Value` usable as a map key or set member.
///
/// Hashing and equality follow `same_value`: primitives by value with
/// NaN normalized and integers/floats unified numerically, everything
/// else by identity.
#[derive(Clone)]
pub struct EntryKey(pub Value);

impl Hash for EntryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            Value::Unit => state.write_u8(0),
            Value::Bool(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            Value::Int(i) => hash_number(state, *i as f64),
            Value::Float(f) => hash_number(state, *f),
            Value::Str(s) => {
                state.write_u8(3);
                s.hash(state);
            }
            other => {
                state.write_u8(4);
                // Aggregates, refs, and wrappers hash by identity.
                other.id().map(|id| id.raw()).unwrap_or(0).hash(state);
            }
        }
    }
}

/// Hash a number so that `Int` and `Float` representations of the same
/// quantity collide, and every NaN collides with every other NaN.
fn hash_number<H: Hasher>(state: &mut H, f: f64) {
    state.write_u8(2);
    if f.is_nan() {
        state.write_u64(u64::MAX);
    } else if f == (f as i64) as f64 {
        state.write_i64(f as i64);
    } else {
        state.write_u64(f.to_bits());
    }
}

impl PartialEq for EntryKey {
    fn eq(&self, other: &Self) -> bool {
        same_value(&self.0, &other.0)
    }
}

impl Eq for EntryKey {}

impl fmt::Debug for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The identity comparison used for write-change suppression.
///
/// NaN compares equal to NaN (a write replacing NaN with NaN is a no-op),
/// `-0.0` equals `0.0`, and `Int`/`Float` values compare numerically.
/// Aggregates, refs, and wrappers compare by identity, never structurally.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Unit, Value::Unit) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => {
            if x.is_nan() {
                y.is_nan()
            } else {
                x == y
            }
        }
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
            !y.is_nan() && *x as f64 == *y
        }
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Record(x), Value::Record(y)) => Rc::ptr_eq(&x.0, &y.0),
        (Value::List(x), Value::List(y)) => Rc::ptr_eq(&x.0, &y.0),
        (Value::Map(x), Value::Map(y)) => Rc::ptr_eq(&x.0, &y.0),
        (Value::Set(x), Value::Set(y)) => Rc::ptr_eq(&x.0, &y.0),
        (Value::Ref(x), Value::Ref(y)) => x.same_ref(y),
        (Value::Observed(x), Value::Observed(y)) => x.same_wrapper(y),
        _ => false,
    }
}

impl PartialEq for Value {
    /// `same_value` equality. Note that this makes NaN equal to itself,
    /// which is what change detection wants.
    fn eq(&self, other: &Self) -> bool {
        same_value(self, other)
    }
}

impl Value {
    /// The identity of an aggregate, ref, or wrapper. `None` for primitives.
    pub fn id(&self) -> Option<TargetId> {
        match self {
            Value::Record(r) => Some(r.id()),
            Value::List(l) => Some(l.id()),
            Value::Map(m) => Some(m.id()),
            Value::Set(s) => Some(s.id()),
            Value::Ref(r) => Some(r.id()),
            Value::Observed(o) => Some(o.id()),
            _ => None,
        }
    }

    /// The shape of a raw aggregate. `None` for everything else,
    /// including wrappers (ask the wrapper itself).
    pub fn shape(&self) -> Option<Shape> {
        match self {
            Value::Record(_) => Some(Shape::Record),
            Value::List(_) => Some(Shape::List),
            Value::Map(_) => Some(Shape::Map),
            Value::Set(_) => Some(Shape::Set),
            _ => None,
        }
    }

    /// Whether this value is a raw aggregate eligible for wrapping.
    pub fn is_wrappable(&self) -> bool {
        self.shape().is_some()
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Record(_) => "record",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Ref(_) => "ref",
            Value::Observed(_) => "observed",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value, covering both `Int` and `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<Rc<str>> {
        match self {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Liveness probe for the dependency ledger. `None` for primitives.
    pub(crate) fn probe(&self) -> Option<Weak<dyn Any>> {
        match self {
            Value::Record(r) => Some(r.probe()),
            Value::List(l) => Some(l.probe()),
            Value::Map(m) => Some(m.probe()),
            Value::Set(s) => Some(s.probe()),
            Value::Ref(r) => Some(r.probe()),
            _ => None,
        }
    }
}

/// Uniform dynamic surface: wrapped and raw values answer the same
/// operations. On an `Observed` value every call is intercepted; on a raw
/// aggregate it is the plain operation; on anything else it is a
/// diagnostic no-op with a neutral return value.
impl Value {
    fn shape_warn(&self, what: &str) {
        tracing::warn!(kind = self.type_name(), "{what} not supported on this value");
    }

    /// Field read (records).
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Observed(o) => o.get(key),
            Value::Record(r) => r.get(key).unwrap_or(Value::Unit),
            _ => {
                self.shape_warn("field read");
                Value::Unit
            }
        }
    }

    /// Field write (records).
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        match self {
            Value::Observed(o) => o.set(key, value),
            Value::Record(r) => {
                r.insert(key, value);
            }
            _ => self.shape_warn("field write"),
        }
    }

    /// Field existence check (records).
    pub fn has(&self, key: &str) -> bool {
        match self {
            Value::Observed(o) => o.has(key),
            Value::Record(r) => r.contains_key(key),
            _ => {
                self.shape_warn("existence check");
                false
            }
        }
    }

    /// Field delete (records).
    pub fn delete(&self, key: &str) -> bool {
        match self {
            Value::Observed(o) => o.delete(key),
            Value::Record(r) => r.remove(key).is_some(),
            _ => {
                self.shape_warn("field delete");
                false
            }
        }
    }

    /// Slot read (lists).
    pub fn at(&self, index: usize) -> Value {
        match self {
            Value::Observed(o) => o.at(index),
            Value::List(l) => l.get(index).unwrap_or(Value::Unit),
            _ => {
                self.shape_warn("slot read");
                Value::Unit
            }
        }
    }

    /// Slot write (lists).
    pub fn set_at(&self, index: usize, value: impl Into<Value>) {
        match self {
            Value::Observed(o) => o.set_at(index, value),
            Value::List(l) => {
                l.set(index, value);
            }
            _ => self.shape_warn("slot write"),
        }
    }

    /// Append (lists).
    pub fn push(&self, value: impl Into<Value>) {
        match self {
            Value::Observed(o) => o.push(value),
            Value::List(l) => l.push(value),
            _ => self.shape_warn("push"),
        }
    }

    /// Remove the last slot (lists).
    pub fn pop(&self) -> Value {
        match self {
            Value::Observed(o) => o.pop(),
            Value::List(l) => l.pop().unwrap_or(Value::Unit),
            _ => {
                self.shape_warn("pop");
                Value::Unit
            }
        }
    }

    /// Entry lookup (maps).
    pub fn entry(&self, key: &Value) -> Value {
        match self {
            Value::Observed(o) => o.entry(key),
            Value::Map(m) => m.get(key).unwrap_or(Value::Unit),
            _ => {
                self.shape_warn("entry lookup");
                Value::Unit
            }
        }
    }

    /// Entry insert (maps).
    pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) {
        match self {
            Value::Observed(o) => o.insert(key, value),
            Value::Map(m) => {
                m.insert(key.into(), value.into());
            }
            _ => self.shape_warn("entry insert"),
        }
    }

    /// Member insertion (sets).
    pub fn add(&self, value: impl Into<Value>) {
        match self {
            Value::Observed(o) => o.add(value),
            Value::Set(s) => {
                s.insert(value.into());
            }
            _ => self.shape_warn("member add"),
        }
    }

    /// Membership check (maps and sets).
    pub fn contains(&self, key: &Value) -> bool {
        match self {
            Value::Observed(o) => o.contains(key),
            Value::Map(m) => m.contains(key),
            Value::Set(s) => s.contains(key),
            _ => {
                self.shape_warn("membership check");
                false
            }
        }
    }

    /// Entry/member removal (maps and sets).
    pub fn remove(&self, key: &Value) -> bool {
        match self {
            Value::Observed(o) => o.remove(key),
            Value::Map(m) => m.remove(key).is_some(),
            Value::Set(s) => s.remove(key),
            _ => {
                self.shape_warn("entry removal");
                false
            }
        }
    }

    /// Remove every entry/member (maps and sets).
    pub fn clear(&self) {
        match self {
            Value::Observed(o) => o.clear(),
            Value::Map(m) => m.clear(),
            Value::Set(s) => s.clear(),
            _ => self.shape_warn("clear"),
        }
    }

    /// Length of the aggregate (fields, slots, entries, or members).
    pub fn len(&self) -> usize {
        match self {
            Value::Observed(o) => o.len(),
            Value::Record(r) => r.len(),
            Value::List(l) => l.len(),
            Value::Map(m) => m.len(),
            Value::Set(s) => s.len(),
            _ => {
                self.shape_warn("length");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry count (maps and sets); same as `len`.
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Iteration as `f(value, key)` (maps and sets).
    pub fn for_each(&self, mut f: impl FnMut(Value, Value)) {
        match self {
            Value::Observed(o) => o.for_each(f),
            Value::Map(m) => {
                for (k, v) in m.entries() {
                    f(v, k);
                }
            }
            Value::Set(s) => {
                for v in s.members() {
                    f(v.clone(), v);
                }
            }
            _ => self.shape_warn("iteration"),
        }
    }

    /// Own keys of the aggregate.
    pub fn keys(&self) -> Vec<Value> {
        match self {
            Value::Observed(o) => o.keys(),
            Value::Record(r) => r.keys().into_iter().map(Value::Str).collect(),
            Value::List(l) => (0..l.len()).map(|i| Value::Int(i as i64)).collect(),
            Value::Map(m) => m.entries().into_iter().map(|(k, _)| k).collect(),
            Value::Set(s) => s.members(),
            _ => {
                self.shape_warn("key enumeration");
                Vec::new()
            }
        }
    }

    /// Own values of the aggregate.
    pub fn values(&self) -> Vec<Value> {
        match self {
            Value::Observed(o) => o.values(),
            Value::Record(r) => {
                let keys = r.keys();
                keys.iter().filter_map(|k| r.get(k)).collect()
            }
            Value::List(l) => l.items(),
            Value::Map(m) => m.entries().into_iter().map(|(_, v)| v).collect(),
            Value::Set(s) => s.members(),
            _ => {
                self.shape_warn("value enumeration");
                Vec::new()
            }
        }
    }

    /// Own `(key, value)` pairs of the aggregate.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        match self {
            Value::Observed(o) => o.entries(),
            Value::Record(r) => {
                let keys = r.keys();
                keys.into_iter()
                    .filter_map(|k| {
                        let v = r.get(&k)?;
                        Some((Value::Str(k), v))
                    })
                    .collect()
            }
            Value::List(l) => l
                .items()
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Value::Int(i as i64), v))
                .collect(),
            Value::Map(m) => m.entries(),
            Value::Set(s) => s.members().into_iter().map(|v| (v.clone(), v)).collect(),
            _ => {
                self.shape_warn("entry enumeration");
                Vec::new()
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Aggregates print identity, not contents: they may be cyclic.
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Record(r) => write!(f, "Record(#{}, {} fields)", r.id().raw(), r.len()),
            Value::List(l) => write!(f, "List(#{}, {} items)", l.id().raw(), l.len()),
            Value::Map(m) => write!(f, "Map(#{}, {} entries)", m.id().raw(), m.len()),
            Value::Set(s) => write!(f, "Set(#{}, {} members)", s.id().raw(), s.len()),
            Value::Ref(r) => write!(f, "Ref(#{})", r.id().raw()),
            Value::Observed(o) => write!(
                f,
                "Observed(#{} -> #{}, {:?})",
                o.id().raw(),
                o.target_id().raw(),
                o.mode()
            ),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s.as_str()))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::Str(s)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Value::List(l)
    }
}

impl From<MapCell> for Value {
    fn from(m: MapCell) -> Self {
        Value::Map(m)
    }
}

impl From<SetCell> for Value {
    fn from(s: SetCell) -> Self {
        Value::Set(s)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Value::Ref(r)
    }
}

impl From<Observed> for Value {
    fn from(o: Observed) -> Self {
        Value::Observed(o)
    }
}
