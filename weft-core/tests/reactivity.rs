//! Integration tests for the reactive engine.
//!
//! These exercise the full protocol end to end: wrappers, the dependency
//! ledger, effects, computeds, refs, and the access-control lock working
//! together.

use std::cell::Cell;
use std::rc::Rc;

use test_log::test;

use weft_core::reactive::{
    computed, effect, effect_with, is_reactive, is_readonly, lock, new_ref, reactive, readonly,
    same_value, stop, to_raw, to_refs, unlock, DebugEvent, Effect, EffectOptions, Operation,
    Runtime, Value,
};
use weft_core::{list, record};

#[test]
fn end_to_end_synchronous_propagation() {
    let state = reactive(record! { "count" => 0 });

    let seen = Rc::new(Cell::new(-1));
    let seen2 = seen.clone();
    let state2 = state.clone();
    effect(move || {
        seen2.set(state2.get("count").as_int().unwrap_or(-1));
    });
    assert_eq!(seen.get(), 0);

    state.set("count", 5);
    assert_eq!(seen.get(), 5);
}

#[test]
fn unchanged_write_does_not_reinvoke() {
    let state = reactive(record! { "count" => 0 });

    let runs = Rc::new(Cell::new(0));
    let runs2 = runs.clone();
    let state2 = state.clone();
    effect(move || {
        runs2.set(runs2.get() + 1);
        state2.get("count");
    });
    assert_eq!(runs.get(), 1);

    state.set("count", 5);
    assert_eq!(runs.get(), 2);

    // Same value again: NaN-aware identity comparison suppresses it.
    state.set("count", 5);
    assert_eq!(runs.get(), 2);
}

#[test]
fn dependency_precision_across_keys() {
    let state = reactive(record! { "k1" => 1, "k2" => 2 });

    let runs = Rc::new(Cell::new(0));
    let runs2 = runs.clone();
    let state2 = state.clone();
    effect(move || {
        runs2.set(runs2.get() + 1);
        state2.get("k1");
    });
    assert_eq!(runs.get(), 1);

    state.set("k2", 20);
    assert_eq!(runs.get(), 1);

    state.set("k1", 10);
    assert_eq!(runs.get(), 2);
}

#[test]
fn wrapping_is_idempotent_and_raw_round_trips() {
    let raw = record! { "a" => 1 };

    let wrapped = reactive(raw.clone());
    let rewrapped = reactive(wrapped.clone());

    assert!(same_value(&wrapped, &rewrapped));
    assert!(same_value(&to_raw(wrapped), &raw));
}

#[test]
fn ref_unwraps_on_read_and_writes_through() {
    let inner = new_ref(1);
    let state = reactive(record! { "a" => Value::Ref(inner.clone()) });

    assert_eq!(state.get("a"), Value::Int(1));

    state.set("a", 2);

    // The slot still holds the same ref; the write landed on its value.
    assert_eq!(inner.get(), Value::Int(2));
    assert_eq!(state.get("a"), Value::Int(2));
}

#[test]
fn computed_is_lazy_and_memoized() {
    let calls = Rc::new(Cell::new(0));

    let calls2 = calls.clone();
    let c = computed(move || {
        calls2.set(calls2.get() + 1);
        Value::Int(1)
    });
    assert_eq!(calls.get(), 0);

    c.get();
    c.get();
    assert_eq!(calls.get(), 1);
}

#[test]
fn transitive_computed_dependency() {
    let s = reactive(record! { "n" => 1 });

    let s2 = s.clone();
    let c = computed(move || Value::Int(s2.get("n").as_int().unwrap_or(0) * 2));

    let seen = Rc::new(Cell::new(0));
    let seen2 = seen.clone();
    let c2 = c.clone();
    effect(move || {
        seen2.set(c2.get().as_int().unwrap_or(0));
    });
    assert_eq!(seen.get(), 2);

    // The effect never reads `s` directly, yet re-runs when it changes.
    s.set("n", 4);
    assert_eq!(seen.get(), 8);
}

#[test]
fn computed_settles_before_plain_consumers() {
    let s = reactive(record! { "n" => 1 });

    let s2 = s.clone();
    let c = computed(move || Value::Int(s2.get("n").as_int().unwrap_or(0) * 2));

    let stale_reads = Rc::new(Cell::new(0));
    let stale2 = stale_reads.clone();
    let s3 = s.clone();
    let c2 = c.clone();
    effect(move || {
        let n = s3.get("n").as_int().unwrap_or(0);
        if c2.get().as_int().unwrap_or(0) != n * 2 {
            stale2.set(stale2.get() + 1);
        }
    });

    for n in 2..10 {
        s.set("n", n);
    }
    assert_eq!(stale_reads.get(), 0);
}

#[test]
fn readonly_rejects_silently_and_lock_bypasses() {
    let r = readonly(record! { "a" => 1 });
    assert!(is_readonly(&r));

    // Rejected without an exception, value unchanged.
    r.set("a", 2);
    assert_eq!(r.get("a"), Value::Int(1));

    // The same write with the lock disengaged lands.
    unlock();
    r.set("a", 2);
    lock();
    assert_eq!(r.get("a"), Value::Int(2));
}

#[test]
fn effect_writing_its_own_dependency_does_not_recurse() {
    let state = reactive(record! { "n" => 0 });

    let runs = Rc::new(Cell::new(0));
    let runs2 = runs.clone();
    let state2 = state.clone();
    effect(move || {
        runs2.set(runs2.get() + 1);
        let n = state2.get("n").as_int().unwrap_or(0);
        // Reads and writes the same key inside its own body.
        state2.set("n", n + 1);
    });

    // One initial run; the self-inflicted trigger is dropped.
    assert_eq!(runs.get(), 1);
    assert_eq!(state.get("n"), Value::Int(1));

    // An outside write still re-invokes it once.
    state.set("n", 10);
    assert_eq!(runs.get(), 2);
    assert_eq!(state.get("n"), Value::Int(11));
}

#[test]
fn stopped_effects_are_deaf_to_triggers() {
    let state = reactive(record! { "n" => 0 });

    let runs = Rc::new(Cell::new(0));
    let runs2 = runs.clone();
    let state2 = state.clone();
    let runner = effect(move || {
        runs2.set(runs2.get() + 1);
        state2.get("n");
    });
    assert_eq!(runs.get(), 1);

    stop(&runner);
    state.set("n", 1);
    assert_eq!(runs.get(), 1);

    // Direct invocation still works, untracked.
    runner.run();
    assert_eq!(runs.get(), 2);
    state.set("n", 2);
    assert_eq!(runs.get(), 2);
}

#[test]
fn scheduler_replaces_synchronous_invocation() {
    let state = reactive(record! { "n" => 0 });

    let runs = Rc::new(Cell::new(0));
    let scheduled = Rc::new(Cell::new(0));

    let runs2 = runs.clone();
    let state2 = state.clone();
    let scheduled2 = scheduled.clone();
    let runner = effect_with(
        move || {
            runs2.set(runs2.get() + 1);
            state2.get("n");
        },
        EffectOptions {
            scheduler: Some(Rc::new(move |_: &Effect| {
                scheduled2.set(scheduled2.get() + 1);
            })),
            ..Default::default()
        },
    );
    assert_eq!(runs.get(), 1);

    // The trigger queues instead of running.
    state.set("n", 1);
    assert_eq!(runs.get(), 1);
    assert_eq!(scheduled.get(), 1);

    // The scheduler's owner decides when the run happens.
    runner.run();
    assert_eq!(runs.get(), 2);
}

#[test]
fn debug_hooks_observe_track_and_trigger() {
    let state = reactive(record! { "n" => 0 });

    let tracked: Rc<Cell<u32>> = Rc::new(Cell::new(0));
    let triggered: Rc<Cell<u32>> = Rc::new(Cell::new(0));
    let last_op = Rc::new(Cell::new(None::<Operation>));

    let tracked2 = tracked.clone();
    let triggered2 = triggered.clone();
    let last_op2 = last_op.clone();
    let state2 = state.clone();
    effect_with(
        move || {
            state2.get("n");
        },
        EffectOptions {
            on_track: Some(Rc::new(move |_e: &DebugEvent| {
                tracked2.set(tracked2.get() + 1);
            })),
            on_trigger: Some(Rc::new(move |e: &DebugEvent| {
                triggered2.set(triggered2.get() + 1);
                last_op2.set(Some(e.op));
            })),
            ..Default::default()
        },
    );
    assert_eq!(tracked.get(), 1);
    assert_eq!(triggered.get(), 0);

    state.set("n", 1);
    assert_eq!(triggered.get(), 1);
    assert_eq!(last_op.get(), Some(Operation::Set));
    // The re-run re-records the dependency.
    assert_eq!(tracked.get(), 2);
}

#[test]
fn dynamic_dependencies_follow_branches() {
    let state = reactive(record! { "use_a" => true, "a" => 1, "b" => 2 });

    let runs = Rc::new(Cell::new(0));
    let runs2 = runs.clone();
    let state2 = state.clone();
    effect(move || {
        runs2.set(runs2.get() + 1);
        if state2.get("use_a").as_bool().unwrap_or(false) {
            state2.get("a");
        } else {
            state2.get("b");
        }
    });
    assert_eq!(runs.get(), 1);

    // Switch to the other branch.
    state.set("use_a", false);
    assert_eq!(runs.get(), 2);

    // The untaken branch no longer re-triggers.
    state.set("a", 10);
    assert_eq!(runs.get(), 2);

    state.set("b", 20);
    assert_eq!(runs.get(), 3);
}

#[test]
fn lists_propagate_length_and_slots() {
    let items = reactive(list![1, 2]);

    let total = Rc::new(Cell::new(0));
    let total2 = total.clone();
    let items2 = items.clone();
    effect(move || {
        let mut sum = 0;
        for v in items2.values() {
            sum += v.as_int().unwrap_or(0);
        }
        total2.set(sum);
    });
    assert_eq!(total.get(), 3);

    items.push(10);
    assert_eq!(total.get(), 13);

    items.set_at(0, 5);
    assert_eq!(total.get(), 17);

    items.pop();
    assert_eq!(total.get(), 7);
}

#[test]
fn nested_records_are_deeply_reactive() {
    let state = reactive(record! { "user" => record! { "name" => "ada" } });

    let seen = Rc::new(std::cell::RefCell::new(String::new()));
    let seen2 = seen.clone();
    let state2 = state.clone();
    effect(move || {
        let name = state2.get("user").get("name");
        *seen2.borrow_mut() = name.as_str().map(|s| s.to_string()).unwrap_or_default();
    });
    assert_eq!(*seen.borrow(), "ada");

    state.get("user").set("name", "grace");
    assert_eq!(*seen.borrow(), "grace");
}

#[test]
fn to_refs_field_cells_stay_live() {
    let state = reactive(record! { "x" => 1 });
    let refs = to_refs(&state);

    let x = match refs.get("x") {
        Value::Ref(r) => r,
        other => panic!("expected an alias ref, got {other:?}"),
    };

    let seen = Rc::new(Cell::new(0));
    let seen2 = seen.clone();
    let x2 = x.clone();
    effect(move || {
        seen2.set(x2.get().as_int().unwrap_or(0));
    });
    assert_eq!(seen.get(), 1);

    // A write through the original wrapper reaches the alias reader.
    state.set("x", 3);
    assert_eq!(seen.get(), 3);

    // And a write through the alias reaches the wrapper.
    x.set(4);
    assert_eq!(state.get("x"), Value::Int(4));
}

#[test]
fn readonly_collections_honor_the_lock() {
    let ro = readonly(weft_core::map_value! { "a" => 1 });

    ro.insert("a", 2);
    assert_eq!(ro.entry(&Value::from("a")), Value::Int(1));

    unlock();
    ro.insert("a", 2);
    lock();
    assert_eq!(ro.entry(&Value::from("a")), Value::Int(2));
}

#[test]
fn isolated_runtimes_do_not_interfere() {
    let rt_a = Runtime::new();
    let rt_b = Runtime::new();

    let state_a = rt_a.reactive(record! { "n" => 0 });

    let runs = Rc::new(Cell::new(0));
    let runs2 = runs.clone();
    let state2 = state_a.clone();
    rt_a.effect(move || {
        runs2.set(runs2.get() + 1);
        state2.get("n");
    });
    assert_eq!(runs.get(), 1);
    assert_eq!(rt_a.tracked_target_count(), 1);
    assert_eq!(rt_b.tracked_target_count(), 0);

    // The other runtime's lock does not gate this one's wrappers.
    rt_b.unlock();
    let ro = rt_a.readonly(record! { "a" => 1 });
    ro.set("a", 2);
    assert_eq!(ro.get("a"), Value::Int(1));
}

#[test]
fn cyclic_structures_wrap_without_recursion() {
    use weft_core::reactive::Record;

    let raw = Record::new();
    raw.insert("name", "root");
    // The record points at itself.
    raw.insert("me", Value::Record(raw.clone()));

    let state = reactive(Value::Record(raw));

    // Wrapping is per-read and registry-backed, so the cycle resolves to
    // the same wrapper instead of recursing.
    let me = state.get("me");
    assert!(is_reactive(&me));
    assert!(same_value(&me, &state));

    assert_eq!(state.get("me").get("me").get("name"), Value::from("root"));
}

#[test]
fn iteration_follows_structural_changes() {
    let state = reactive(record! { "a" => 1 });

    let count = Rc::new(Cell::new(0));
    let count2 = count.clone();
    let state2 = state.clone();
    effect(move || {
        count2.set(state2.keys().len());
    });
    assert_eq!(count.get(), 1);

    state.set("b", 2);
    assert_eq!(count.get(), 2);

    // Overwriting an existing key is not a structural change.
    state.set("a", 100);
    assert_eq!(count.get(), 2);

    state.delete("a");
    assert_eq!(count.get(), 1);
}
