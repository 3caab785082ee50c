//! Weft Core
//!
//! This crate provides the core reactivity runtime for the Weft UI
//! framework. It implements:
//!
//! - A dynamic value model (records, lists, maps, sets)
//! - Access-intercepting wrappers with per-key dependency tracking
//! - The effect run/track/trigger protocol
//! - Demand-driven computed values and boxed reactive cells
//!
//! The template compiler, virtual-tree renderer, and component scheduler
//! sit on top of this crate and treat it as a "tell me when this changes"
//! primitive.
//!
//! # Architecture
//!
//! Everything lives in the `reactive` module:
//!
//! - `value`: the dynamic value model and identity/equality rules
//! - `runtime`: the reactivity context: dependency ledger, wrapper
//!   registries, effect stack, tracking flag, access-control lock
//! - `effect`: the re-runnable tracked computation
//! - `observed` / `collections`: interception for records, lists, maps,
//!   and sets
//! - `computed`: the memoizing derived-value cache
//! - `reference`: boxed single-value cells and field aliases
//!
//! # Example
//!
//! ```rust,ignore
//! use weft_core::reactive::{effect, reactive};
//! use weft_core::record;
//!
//! let state = reactive(record! { "count" => 0 });
//!
//! let state2 = state.clone();
//! effect(move || {
//!     println!("count is {:?}", state2.get("count"));
//! });
//!
//! // The effect re-runs, prints: "count is 5"
//! state.set("count", 5);
//! ```

pub mod reactive;

mod macros;

pub use reactive::{
    computed, computed_with, effect, effect_with, is_reactive, is_readonly, is_ref, lock,
    mark_non_reactive, mark_readonly, new_ref, pause_tracking, reactive, readonly,
    resume_tracking, stop, to_raw, to_refs, unlock, untracked, with_runtime, Effect,
    EffectOptions, Ref, Runtime, Value,
};
