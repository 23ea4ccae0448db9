//! End-to-end tests for method effects.
//!
//! Calls are dispatched through the standard handler table, the way the
//! data-flow walker does it.

use std::rc::Rc;

use dfa_rs::call::CallDescriptor;
use dfa_rs::factory::ValueFactory;
use dfa_rs::handlers::{standard_handlers, JAVA_LANG_LONG, JAVA_LANG_MATH, JAVA_LANG_STRING};
use dfa_rs::range::{Range, RangeSet};
use dfa_rs::reference::ValueId;
use dfa_rs::state::MemoryState;
use dfa_rs::types::{VarType, Width};
use dfa_rs::value::RelationOp;
use test_log::test;

fn setup() -> (Rc<ValueFactory>, MemoryState) {
    let factory = Rc::new(ValueFactory::default());
    let state = MemoryState::new(factory.clone());
    (factory, state)
}

fn call(
    descriptor: CallDescriptor,
    qualifier: ValueId,
    args: &[ValueId],
    state: MemoryState,
    factory: &ValueFactory,
) -> Vec<MemoryState> {
    match standard_handlers().apply(&descriptor, qualifier, args, state, factory) {
        Some(states) => states,
        None => panic!("No handler for {}", descriptor),
    }
}

fn string_call(name: &str, params: &[&str]) -> CallDescriptor {
    CallDescriptor::instance(JAVA_LANG_STRING, name, params)
}

fn result_range(state: &MemoryState) -> Option<RangeSet> {
    state.range_of(state.peek().expect("result was pushed"))
}

// ─── isEmpty ───────────────────────────────────────────────────────────────────

#[test]
fn is_empty_with_untracked_length() {
    let (factory, state) = setup();
    let o = factory.variable("o", VarType::Object);

    let states = call(string_call("isEmpty", &[]), o, &[], state, &factory);

    assert_eq!(states.len(), 1);
    assert_eq!(states[0].peek(), Some(factory.unknown()));
}

#[test]
fn is_empty_with_zero_length() {
    let (factory, mut state) = setup();
    let s = factory.variable("s", VarType::String);
    assert!(state.apply_relation(factory.string_length(s), RelationOp::Eq, factory.int(0)));

    let states = call(string_call("isEmpty", &[]), s, &[], state, &factory);

    assert_eq!(states.len(), 1);
    assert_eq!(states[0].peek(), Some(factory.boolean(true)));
}

#[test]
fn is_empty_with_length_five() {
    let (factory, mut state) = setup();
    let s = factory.variable("s", VarType::String);
    assert!(state.apply_relation(factory.string_length(s), RelationOp::Eq, factory.int(5)));

    let states = call(string_call("isEmpty", &[]), s, &[], state, &factory);

    assert_eq!(states.len(), 1);
    assert_eq!(states[0].peek(), Some(factory.boolean(false)));
}

#[test]
fn is_empty_after_string_binding_within_length_fact() {
    let (factory, mut state) = setup();
    let s = factory.variable("s", VarType::String);
    let length = factory.string_length(s);
    assert!(state.apply_relation(length, RelationOp::Le, factory.int(2)));
    assert!(!state.create_copy().apply_relation(s, RelationOp::Eq, factory.string("abc")));
    assert!(state.apply_relation(s, RelationOp::Eq, factory.string("")));

    let states = call(string_call("isEmpty", &[]), s, &[], state, &factory);

    assert_eq!(states.len(), 1);
    assert_eq!(states[0].peek(), Some(factory.boolean(true)));
    assert_eq!(states[0].range_of(length), Some(RangeSet::point(0)));
}

#[test]
fn is_empty_on_constant() {
    let (factory, state) = setup();
    let states = call(string_call("isEmpty", &[]), factory.string(""), &[], state, &factory);
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].peek(), Some(factory.boolean(true)));
}

#[test]
fn is_empty_forks_are_independent() {
    let (factory, state) = setup();
    let s = factory.variable("s", VarType::String);
    let length = factory.string_length(s);

    let states = call(string_call("isEmpty", &[]), s, &[], state, &factory);
    assert_eq!(states.len(), 2);

    let mut empty = states[0].clone();
    let mut non_empty = states[1].clone();
    assert!(!empty.apply_relation(length, RelationOp::Gt, factory.int(0)));
    assert!(non_empty.apply_relation(length, RelationOp::Gt, factory.int(0)));
    assert_eq!(states[1].range_of(length), Some(RangeSet::range(1, i32::MAX as i64)));
}

// ─── equals / equalsIgnoreCase ─────────────────────────────────────────────────

#[test]
fn equals_equal_constants() {
    let (factory, state) = setup();
    let states = call(
        string_call("equals", &["java.lang.Object"]),
        factory.string("abc"),
        &[factory.string("abc")],
        state,
        &factory,
    );
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].peek(), Some(factory.boolean(true)));
}

#[test]
fn equals_unequal_constants() {
    let (factory, state) = setup();
    let states = call(
        string_call("equals", &["java.lang.Object"]),
        factory.string("abc"),
        &[factory.string("xy")],
        state,
        &factory,
    );
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].peek(), Some(factory.boolean(false)));
}

#[test]
fn equals_through_bound_variable() {
    let (factory, mut state) = setup();
    let s = factory.variable("s", VarType::String);
    assert!(state.apply_relation(s, RelationOp::Eq, factory.string("abc")));

    let states = call(
        string_call("equals", &["java.lang.Object"]),
        s,
        &[factory.string("abc")],
        state,
        &factory,
    );
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].peek(), Some(factory.boolean(true)));
}

#[test]
fn equals_with_matching_lengths_stays_unknown() {
    let (factory, mut state) = setup();
    let s = factory.variable("s", VarType::String);
    assert!(state.apply_relation(factory.string_length(s), RelationOp::Eq, factory.int(3)));

    let states = call(
        string_call("equals", &["java.lang.Object"]),
        s,
        &[factory.string("abc")],
        state,
        &factory,
    );
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].peek(), Some(factory.unknown()));
}

#[test]
fn equals_ignore_case_constants() {
    let (factory, state) = setup();
    let states = call(
        string_call("equalsIgnoreCase", &[JAVA_LANG_STRING]),
        factory.string("ABC"),
        &[factory.string("abc")],
        state,
        &factory,
    );
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].peek(), Some(factory.boolean(true)));
}

// ─── startsWith / endsWith ─────────────────────────────────────────────────────

#[test]
fn starts_with_longer_argument_is_false() {
    let (factory, mut state) = setup();
    let s = factory.variable("s", VarType::String);
    let t = factory.variable("t", VarType::String);
    assert!(state.apply_relation(factory.string_length(s), RelationOp::Le, factory.int(3)));
    assert!(state.apply_relation(factory.string_length(t), RelationOp::Eq, factory.int(5)));

    let states = call(string_call("startsWith", &[JAVA_LANG_STRING]), s, &[t], state, &factory);

    assert_eq!(states.len(), 1);
    assert_eq!(states[0].peek(), Some(factory.boolean(false)));
}

#[test]
fn ends_with_unconstrained_forks() {
    let (factory, state) = setup();
    let s = factory.variable("s", VarType::String);

    let states = call(
        string_call("endsWith", &[JAVA_LANG_STRING]),
        s,
        &[factory.string(".rs")],
        state,
        &factory,
    );

    assert_eq!(states.len(), 2);
    assert_eq!(states[0].peek(), Some(factory.unknown()));
    assert_eq!(states[1].peek(), Some(factory.boolean(false)));
    let length = factory.string_length(s);
    assert_eq!(states[0].range_of(length), Some(RangeSet::range(3, i32::MAX as i64)));
    assert_eq!(states[1].range_of(length), Some(RangeSet::range(0, 2)));
}

#[test]
fn starts_with_constants() {
    let (factory, state) = setup();
    let states = call(
        string_call("startsWith", &[JAVA_LANG_STRING]),
        factory.string("prefix-body"),
        &[factory.string("body")],
        state,
        &factory,
    );
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].peek(), Some(factory.boolean(false)));
}

// ─── indexOf ───────────────────────────────────────────────────────────────────

#[test]
fn index_of_constant_receiver() {
    let (factory, state) = setup();
    let states = call(
        string_call("indexOf", &["int"]),
        factory.string("hello"),
        &[factory.int('l' as i32)],
        state,
        &factory,
    );
    assert_eq!(states.len(), 1);
    assert_eq!(result_range(&states[0]), Some(RangeSet::range(-1, 4)));
}

// ─── Math.max / Math.min ───────────────────────────────────────────────────────

#[test]
fn max_of_overlapping_ranges() {
    let (factory, state) = setup();
    let a = factory.range(RangeSet::range(1, 5));
    let b = factory.range(RangeSet::range(3, 10));

    let states = call(
        CallDescriptor::static_call(JAVA_LANG_MATH, "max", &["int", "int"]),
        factory.unknown(),
        &[a, b],
        state,
        &factory,
    );

    assert_eq!(states.len(), 1);
    assert_eq!(result_range(&states[0]), Some(RangeSet::range(3, 10)));
}

#[test]
fn max_keeps_holes() {
    let (factory, state) = setup();
    let a = factory.range(RangeSet::from_ranges([Range::new(0, 2), Range::new(8, 9)]));
    let b = factory.int(1);

    let states = call(
        CallDescriptor::static_call(JAVA_LANG_LONG, "max", &["long", "long"]),
        factory.unknown(),
        &[a, b],
        state,
        &factory,
    );

    assert_eq!(
        result_range(&states[0]),
        Some(RangeSet::from_ranges([Range::new(1, 2), Range::new(8, 9)]))
    );
}

#[test]
fn min_with_operand_lacking_range() {
    let (factory, state) = setup();
    let a = factory.range(RangeSet::range(1, 5));
    let o = factory.variable("o", VarType::Object);

    let states = call(
        CallDescriptor::static_call(JAVA_LANG_MATH, "min", &["int", "int"]),
        factory.unknown(),
        &[a, o],
        state.create_copy(),
        &factory,
    );
    assert!(states.is_empty());

    let states = call(
        CallDescriptor::static_call(JAVA_LANG_MATH, "max", &["int", "int"]),
        factory.unknown(),
        &[factory.unknown(), a],
        state,
        &factory,
    );
    assert!(states.is_empty());
}

#[test]
fn min_with_empty_operand() {
    let (factory, state) = setup();
    let empty = factory.range(RangeSet::empty());
    let states = call(
        CallDescriptor::static_call(JAVA_LANG_MATH, "min", &["long", "long"]),
        factory.unknown(),
        &[empty, factory.long(3)],
        state,
        &factory,
    );
    assert!(states.is_empty());
}

// ─── Math.abs ──────────────────────────────────────────────────────────────────

#[test]
fn abs_long_min_maps_to_itself() {
    let (factory, state) = setup();
    let x = factory.range(RangeSet::range(i64::MIN, -1));

    let states = call(
        CallDescriptor::static_call(JAVA_LANG_MATH, "abs", &["long"]),
        factory.unknown(),
        &[x],
        state,
        &factory,
    );

    assert_eq!(states.len(), 1);
    let result = result_range(&states[0]).expect("abs has a range");
    assert!(result.contains(i64::MIN));
    assert_eq!(result, RangeSet::point(i64::MIN).union(&RangeSet::range(1, i64::MAX)));
}

#[test]
fn abs_int_of_narrowed_variable() {
    let (factory, mut state) = setup();
    let x = factory.variable("x", VarType::Int);
    assert!(state.apply_relation(x, RelationOp::Ge, factory.int(-7)));
    assert!(state.apply_relation(x, RelationOp::Le, factory.int(3)));

    let states = call(
        CallDescriptor::static_call(JAVA_LANG_MATH, "abs", &["int"]),
        factory.unknown(),
        &[x],
        state,
        &factory,
    );

    assert_eq!(result_range(&states[0]), Some(RangeSet::range(0, 7)));
}

#[test]
fn abs_is_idempotent_through_handlers() {
    let (factory, state) = setup();
    let x = factory.variable("x", VarType::Long);
    let abs = CallDescriptor::static_call(JAVA_LANG_MATH, "abs", &["long"]);

    let mut states = call(abs.clone(), factory.unknown(), &[x], state, &factory);
    let mut state = states.remove(0);
    let once = state.pop();
    let states = call(abs, factory.unknown(), &[once], state, &factory);
    let twice = states[0].peek().expect("result was pushed");

    assert_eq!(once, twice);
    assert_eq!(
        states[0].range_of(twice).map(|r| r == r.abs(Width::Long)),
        Some(true)
    );
}
