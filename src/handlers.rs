//! Effects of well-known library methods.
//!
//! Each [`MethodHandler`] models the result of one family of methods. It
//! takes the current [`MemoryState`] and returns the successor states, each
//! with the result value pushed on its evaluation stack:
//!
//! - one successor when the result is determined by what is known,
//! - two successors (true branch first) when the result is a boolean that
//!   depends on a relation; a branch contradicting the state is dropped,
//! - no successors when the call cannot be modeled or cannot be reached.
//!   The caller prunes the path in that case.
//!
//! The standard table mapping call signatures to handlers is built once by
//! [`standard_handlers`] and never changes afterwards.

use std::sync::OnceLock;

use log::debug;

use crate::call::{CallDescriptor, CallMapper, CallMatcher};
use crate::factory::ValueFactory;
use crate::range::RangeSet;
use crate::reference::ValueId;
use crate::state::MemoryState;
use crate::types::Width;
use crate::value::{Literal, RelationOp};

pub const JAVA_LANG_STRING: &str = "java.lang.String";
pub const JAVA_LANG_MATH: &str = "java.lang.Math";
pub const JAVA_LANG_INTEGER: &str = "java.lang.Integer";
pub const JAVA_LANG_LONG: &str = "java.lang.Long";

/// Effect model of a method family.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MethodHandler {
    /// `String.isEmpty()`
    StringIsEmpty,
    /// `String.indexOf(..)` and `String.lastIndexOf(..)`
    StringIndexOf,
    /// `String.equals(Object)` and `String.equalsIgnoreCase(String)`
    StringEquals { ignore_case: bool },
    /// `String.startsWith(String)` and `String.endsWith(String)`
    StringStartsEnds { ends: bool },
    /// `Math.max`/`Math.min` and the `Integer`/`Long` variants
    MathMinMax { max: bool },
    /// `Math.abs(int)` and `Math.abs(long)`
    MathAbs { width: Width },
}

impl MethodHandler {
    /// Compute the successor states of a call.
    ///
    /// `qualifier` is the receiver of an instance call; static calls pass
    /// [`ValueFactory::unknown`].
    ///
    /// # Panics
    ///
    /// Panics if `state` was created by a different factory.
    pub fn handle(
        &self,
        qualifier: ValueId,
        args: &[ValueId],
        state: MemoryState,
        factory: &ValueFactory,
    ) -> Vec<MemoryState> {
        assert!(
            std::ptr::eq(factory, state.factory()),
            "State belongs to a different value factory"
        );
        debug!("handle {:?} on {} with {} args", self, factory.display(qualifier), args.len());
        let result = match *self {
            MethodHandler::StringIsEmpty => string_is_empty(qualifier, state, factory),
            MethodHandler::StringIndexOf => string_index_of(qualifier, state, factory),
            MethodHandler::StringEquals { ignore_case } => string_equals(qualifier, args, state, factory, ignore_case),
            MethodHandler::StringStartsEnds { ends } => string_starts_ends(qualifier, args, state, factory, ends),
            MethodHandler::MathMinMax { max } => math_min_max(args, state, factory, max),
            MethodHandler::MathAbs { width } => math_abs(args, state, factory, width),
        };
        debug!("{:?} produced {} successor(s)", self, result.len());
        result
    }
}

/// Registry of method handlers keyed by call signature.
#[derive(Debug, Clone)]
pub struct CustomMethodHandlers {
    mapper: CallMapper<MethodHandler>,
}

impl Default for CustomMethodHandlers {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomMethodHandlers {
    /// Build the standard table.
    pub fn new() -> Self {
        use CallMatcher as M;

        let min_max = |name: &str| {
            M::any_of(vec![
                M::static_call(JAVA_LANG_MATH, &[name]).parameter_types(&["int", "int"]),
                M::static_call(JAVA_LANG_MATH, &[name]).parameter_types(&["long", "long"]),
                M::static_call(JAVA_LANG_INTEGER, &[name]).parameter_types(&["int", "int"]),
                M::static_call(JAVA_LANG_LONG, &[name]).parameter_types(&["long", "long"]),
            ])
        };

        let mapper = CallMapper::new()
            .register(
                M::instance_call(JAVA_LANG_STRING, &["isEmpty"]).parameter_count(0),
                MethodHandler::StringIsEmpty,
            )
            .register(
                M::instance_call(JAVA_LANG_STRING, &["indexOf", "lastIndexOf"]),
                MethodHandler::StringIndexOf,
            )
            .register(
                M::instance_call(JAVA_LANG_STRING, &["equals"]).parameter_count(1),
                MethodHandler::StringEquals { ignore_case: false },
            )
            .register(
                M::instance_call(JAVA_LANG_STRING, &["equalsIgnoreCase"]).parameter_count(1),
                MethodHandler::StringEquals { ignore_case: true },
            )
            .register(
                M::instance_call(JAVA_LANG_STRING, &["startsWith"]).parameter_count(1),
                MethodHandler::StringStartsEnds { ends: false },
            )
            .register(
                M::instance_call(JAVA_LANG_STRING, &["endsWith"]).parameter_count(1),
                MethodHandler::StringStartsEnds { ends: true },
            )
            .register(min_max("max"), MethodHandler::MathMinMax { max: true })
            .register(min_max("min"), MethodHandler::MathMinMax { max: false })
            .register(
                M::static_call(JAVA_LANG_MATH, &["abs"]).parameter_types(&["int"]),
                MethodHandler::MathAbs { width: Width::Int },
            )
            .register(
                M::static_call(JAVA_LANG_MATH, &["abs"]).parameter_types(&["long"]),
                MethodHandler::MathAbs { width: Width::Long },
            );

        Self { mapper }
    }

    /// The handler for a call, if the call has a custom effect model.
    pub fn find(&self, call: &CallDescriptor) -> Option<MethodHandler> {
        let handler = self.mapper.find(call).copied();
        debug!("find({}) -> {:?}", call, handler);
        handler
    }

    /// Find the handler for `call` and run it.
    ///
    /// Returns `None` if no handler applies, in which case the caller should
    /// model the result as unknown.
    pub fn apply(
        &self,
        call: &CallDescriptor,
        qualifier: ValueId,
        args: &[ValueId],
        state: MemoryState,
        factory: &ValueFactory,
    ) -> Option<Vec<MemoryState>> {
        self.find(call)
            .map(|handler| handler.handle(qualifier, args, state, factory))
    }
}

/// The process-wide standard handler table.
pub fn standard_handlers() -> &'static CustomMethodHandlers {
    static HANDLERS: OnceLock<CustomMethodHandlers> = OnceLock::new();
    HANDLERS.get_or_init(CustomMethodHandlers::new)
}

fn string_is_empty(qualifier: ValueId, state: MemoryState, factory: &ValueFactory) -> Vec<MemoryState> {
    let length = state.string_length_of(qualifier);
    if factory.is_unknown(length) {
        return single_result(state, factory.unknown());
    }
    let zero = factory.int(0);
    let true_relation = factory.relation(length, zero, RelationOp::EqEq, false);
    let false_relation = factory.relation(length, zero, RelationOp::Ne, false);
    apply_condition(
        state,
        true_relation,
        factory.boolean(true),
        false_relation,
        factory.boolean(false),
    )
}

fn string_index_of(qualifier: ValueId, state: MemoryState, factory: &ValueFactory) -> Vec<MemoryState> {
    let length = state.string_length_of(qualifier);
    let max_length = match state.range_of(length) {
        Some(range) if !range.is_empty() => range.max(),
        _ => Width::Int.max_value(),
    };
    let result = factory.range(RangeSet::range(-1, max_length - 1));
    single_result(state, result)
}

fn string_equals(
    qualifier: ValueId,
    args: &[ValueId],
    state: MemoryState,
    factory: &ValueFactory,
    ignore_case: bool,
) -> Vec<MemoryState> {
    let Some(&arg) = args.first() else {
        return Vec::new();
    };
    if let (Some(left), Some(right)) = (string_constant(&state, qualifier), string_constant(&state, arg)) {
        let equal = if ignore_case {
            equals_ignore_case(&left, &right)
        } else {
            left == right
        };
        return single_result(state, factory.boolean(equal));
    }
    let left_length = state.string_length_of(qualifier);
    let right_length = state.string_length_of(arg);
    let true_relation = factory.relation(left_length, right_length, RelationOp::Eq, false);
    let false_relation = factory.relation(left_length, right_length, RelationOp::Ne, false);
    // Equal lengths do not make the strings equal.
    apply_condition(
        state,
        true_relation,
        factory.unknown(),
        false_relation,
        factory.boolean(false),
    )
}

fn string_starts_ends(
    qualifier: ValueId,
    args: &[ValueId],
    state: MemoryState,
    factory: &ValueFactory,
    ends: bool,
) -> Vec<MemoryState> {
    let Some(&arg) = args.first() else {
        return Vec::new();
    };
    if let (Some(left), Some(right)) = (string_constant(&state, qualifier), string_constant(&state, arg)) {
        let result = if ends {
            left.ends_with(right.as_str())
        } else {
            left.starts_with(right.as_str())
        };
        return single_result(state, factory.boolean(result));
    }
    let left_length = state.string_length_of(qualifier);
    let right_length = state.string_length_of(arg);
    let true_relation = factory.relation(left_length, right_length, RelationOp::Ge, false);
    let false_relation = factory.relation(left_length, right_length, RelationOp::Lt, false);
    apply_condition(
        state,
        true_relation,
        factory.unknown(),
        false_relation,
        factory.boolean(false),
    )
}

fn math_min_max(args: &[ValueId], state: MemoryState, factory: &ValueFactory, max: bool) -> Vec<MemoryState> {
    let [first, second] = args else {
        return Vec::new();
    };
    let (Some(first), Some(second)) = (state.range_of(*first), state.range_of(*second)) else {
        return Vec::new();
    };
    if first.is_empty() || second.is_empty() {
        return Vec::new();
    }
    let domain = if max {
        RangeSet::range(first.min().max(second.min()), i64::MAX)
    } else {
        RangeSet::range(i64::MIN, first.max().min(second.max()))
    };
    let result = first.union(&second).intersect(&domain);
    single_result(state, factory.range(result))
}

fn math_abs(args: &[ValueId], state: MemoryState, factory: &ValueFactory, width: Width) -> Vec<MemoryState> {
    let Some(&arg) = args.first() else {
        return Vec::new();
    };
    let Some(range) = state.range_of(arg) else {
        return Vec::new();
    };
    single_result(state, factory.range(range.abs(width)))
}

fn single_result(mut state: MemoryState, value: ValueId) -> Vec<MemoryState> {
    state.push(value);
    vec![state]
}

/// Fork `state` on a pair of complementary conditions.
///
/// The true-branch state comes first. Infeasible branches are dropped.
fn apply_condition(
    state: MemoryState,
    true_relation: ValueId,
    true_result: ValueId,
    false_relation: ValueId,
    false_result: ValueId,
) -> Vec<MemoryState> {
    let mut false_state = state.create_copy();
    let mut true_state = state;
    let mut result = Vec::with_capacity(2);
    if true_state.apply_condition(true_relation) {
        true_state.push(true_result);
        result.push(true_state);
    } else {
        debug!("true branch is infeasible");
    }
    if false_state.apply_condition(false_relation) {
        false_state.push(false_result);
        result.push(false_state);
    } else {
        debug!("false branch is infeasible");
    }
    result
}

fn string_constant(state: &MemoryState, value: ValueId) -> Option<String> {
    match state.constant_value_of(value)? {
        Literal::Str(s) => Some(s),
        _ => None,
    }
}

/// Case-insensitive comparison of two strings, character by character.
fn equals_ignore_case(a: &str, b: &str) -> bool {
    a.encode_utf16().count() == b.encode_utf16().count()
        && a.chars().count() == b.chars().count()
        && a.chars().zip(b.chars()).all(|(x, y)| {
            x == y || x.to_uppercase().eq(y.to_uppercase()) || x.to_lowercase().eq(y.to_lowercase())
        })
}
