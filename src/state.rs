//! Abstract memory state.
//!
//! A [`MemoryState`] holds what the analysis knows at one program point:
//!
//! - the expression-evaluation stack,
//! - a range fact per integer variable,
//! - a constant binding per non-integer variable,
//! - relation facts (`a < b`, `a != b`, ...) between values.
//!
//! Conditions are applied with [`apply_condition`][MemoryState::apply_condition],
//! which narrows the state in place and reports whether it is still feasible.
//! To explore both outcomes of a condition, fork the state first with
//! [`create_copy`][MemoryState::create_copy]; the copy shares nothing mutable
//! with the original.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use crate::factory::{ValueFactory, LENGTH};
use crate::range::RangeSet;
use crate::reference::ValueId;
use crate::types::{VarType, Width};
use crate::value::{Literal, RelationOp, Value, Variable};

/// Relation fact `left op right`, stored with `left <= right`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct Fact {
    left: ValueId,
    op: RelationOp,
    right: ValueId,
}

impl Fact {
    fn new(left: ValueId, op: RelationOp, right: ValueId) -> Self {
        let op = if op == RelationOp::EqEq { RelationOp::Eq } else { op };
        if left <= right {
            Fact { left, op, right }
        } else {
            Fact {
                left: right,
                op: op.flip(),
                right: left,
            }
        }
    }
}

const FACT_OPS: [RelationOp; 6] = [
    RelationOp::Eq,
    RelationOp::Ne,
    RelationOp::Lt,
    RelationOp::Le,
    RelationOp::Gt,
    RelationOp::Ge,
];

#[derive(Clone)]
pub struct MemoryState {
    factory: Rc<ValueFactory>,
    stack: Vec<ValueId>,
    ranges: HashMap<ValueId, RangeSet>,
    constants: HashMap<ValueId, ValueId>,
    facts: HashSet<Fact>,
}

impl MemoryState {
    pub fn new(factory: Rc<ValueFactory>) -> Self {
        Self {
            factory,
            stack: Vec::new(),
            ranges: HashMap::new(),
            constants: HashMap::new(),
            facts: HashSet::new(),
        }
    }

    pub fn factory(&self) -> &ValueFactory {
        &self.factory
    }

    /// Fork this state.
    ///
    /// Conditions applied to the copy never affect `self`, and vice versa.
    pub fn create_copy(&self) -> MemoryState {
        self.clone()
    }
}

// Evaluation stack
impl MemoryState {
    pub fn push(&mut self, value: ValueId) {
        trace!("push({})", self.factory.display(value));
        self.stack.push(value);
    }

    /// # Panics
    ///
    /// Panics if the stack is empty.
    pub fn pop(&mut self) -> ValueId {
        match self.stack.pop() {
            Some(value) => value,
            None => panic!("Pop from an empty evaluation stack"),
        }
    }

    pub fn peek(&self) -> Option<ValueId> {
        self.stack.last().copied()
    }

    pub fn stack(&self) -> &[ValueId] {
        &self.stack
    }
}

// Queries
impl MemoryState {
    /// Possible values of an integer-valued expression.
    ///
    /// `None` means no numeric fact is known at all, which is different from
    /// an empty set (no value is possible).
    pub fn range_of(&self, value: ValueId) -> Option<RangeSet> {
        match self.factory.value(value) {
            Value::Constant(lit) => lit.as_integer().map(RangeSet::point),
            Value::Range(set) => Some(set),
            Value::Variable(var) => match self.ranges.get(&value) {
                Some(set) => Some(set.clone()),
                None => default_range(&var),
            },
            Value::Relation { .. } | Value::Unknown => None,
        }
    }

    /// The value holding the length of a string, or unknown.
    pub fn string_length_of(&self, value: ValueId) -> ValueId {
        match self.constant_value_of(value) {
            Some(Literal::Str(s)) => return self.factory.int(java_length(&s)),
            Some(_) => return self.factory.unknown(),
            None => {}
        }
        match self.factory.value(value) {
            Value::Variable(var) if var.ty == VarType::String => self.factory.string_length(value),
            _ => self.factory.unknown(),
        }
    }

    /// The literal a value is known to be equal to.
    pub fn constant_value_of(&self, value: ValueId) -> Option<Literal> {
        match self.factory.value(value) {
            Value::Constant(lit) => Some(lit),
            Value::Variable(var) => {
                if let Some(&c) = self.constants.get(&value) {
                    return match self.factory.value(c) {
                        Value::Constant(lit) => Some(lit),
                        _ => None,
                    };
                }
                let n = self.ranges.get(&value)?.constant_value()?;
                match var.ty {
                    VarType::Int => i32::try_from(n).ok().map(Literal::Int),
                    VarType::Long => Some(Literal::Long(n)),
                    _ => None,
                }
            }
            Value::Relation { .. } | Value::Range(_) | Value::Unknown => None,
        }
    }
}

// Conditions
impl MemoryState {
    /// Narrow this state by a condition.
    ///
    /// Returns `false` if the condition contradicts what is already known.
    /// An infeasible state must be discarded by the caller.
    pub fn apply_condition(&mut self, condition: ValueId) -> bool {
        let feasible = match self.factory.value(condition) {
            Value::Constant(Literal::Bool(b)) => b,
            Value::Relation {
                left,
                right,
                op,
                negated,
            } => {
                let op = if negated { op.negate() } else { op };
                self.apply_relation(left, op, right)
            }
            Value::Variable(var) if var.ty == VarType::Boolean => {
                let t = self.factory.boolean(true);
                self.apply_relation(condition, RelationOp::Eq, t)
            }
            _ => true,
        };
        debug!(
            "apply_condition({}) -> {}",
            self.factory.display(condition),
            if feasible { "feasible" } else { "infeasible" }
        );
        feasible
    }

    /// Narrow this state by `left op right`.
    pub fn apply_relation(&mut self, left: ValueId, op: RelationOp, right: ValueId) -> bool {
        if self.factory.is_unknown(left) || self.factory.is_unknown(right) {
            return true;
        }
        if left == right {
            return op.eval(0, 0);
        }

        if let (Some(a), Some(b)) = (self.constant_value_of(left), self.constant_value_of(right)) {
            if let (Some(x), Some(y)) = (a.as_integer(), b.as_integer()) {
                return op.eval(x, y);
            }
            match op {
                RelationOp::Eq | RelationOp::EqEq => return a == b,
                RelationOp::Ne => return a != b,
                _ => {}
            }
        }

        if let (Some(lr), Some(rr)) = (self.range_of(left), self.range_of(right)) {
            let new_left = lr.intersect(&rr.from_relation(op));
            let new_right = rr.intersect(&lr.from_relation(op.flip()));
            if new_left.is_empty() || new_right.is_empty() {
                trace!("{} {} {}: ranges {} and {} are incompatible", left, op, right, lr, rr);
                return false;
            }
            // Both sets are non-empty subsets of the current ranges.
            let narrowed_left = self.narrow_range(left, new_left);
            let narrowed_right = self.narrow_range(right, new_right);
            debug_assert!(narrowed_left && narrowed_right);
        }

        if op.is_equality() && !self.bind_constants(left, right) {
            return false;
        }

        self.record_fact(left, op, right)
    }

    /// Intersect the range fact of a variable with `set`.
    ///
    /// Returns `false` if the result is empty. Values other than variables
    /// carry no mutable facts and are only checked.
    pub fn narrow_range(&mut self, value: ValueId, set: RangeSet) -> bool {
        let current = match self.range_of(value) {
            Some(current) => current.intersect(&set),
            None => set,
        };
        if current.is_empty() {
            return false;
        }
        if matches!(self.factory.value(value), Value::Variable(_)) {
            self.ranges.insert(value, current);
        }
        true
    }

    /// Record `left == right` when one side is a known non-integer constant.
    ///
    /// Binding a string variable also fixes its length.
    fn bind_constants(&mut self, left: ValueId, right: ValueId) -> bool {
        for (var, other) in [(left, right), (right, left)] {
            let Value::Variable(variable) = self.factory.value(var) else {
                continue;
            };
            let Some(literal) = self.constant_value_of(other) else {
                continue;
            };
            if literal.as_integer().is_some() {
                // Integer constants are tracked as one-point ranges.
                continue;
            }
            if let Some(existing) = self.constant_value_of(var) {
                if existing != literal {
                    return false;
                }
            }
            if let Literal::Str(text) = &literal {
                if variable.ty == VarType::String {
                    let length = self.factory.string_length(var);
                    if !self.narrow_range(length, RangeSet::point(java_length(text) as i64)) {
                        trace!("{} = {} contradicts its length fact", var, literal);
                        return false;
                    }
                }
            }
            let c = self.factory.constant(literal);
            self.constants.insert(var, c);
        }
        true
    }

    fn record_fact(&mut self, left: ValueId, op: RelationOp, right: ValueId) -> bool {
        let fact = Fact::new(left, op, right);
        let opposite = fact.op.negate();
        for known in FACT_OPS {
            let stored = Fact {
                op: known,
                ..fact
            };
            if known.implies(opposite) && self.facts.contains(&stored) {
                trace!("{} {} {} contradicts a known fact", left, op, right);
                return false;
            }
        }
        self.facts.insert(fact);
        true
    }
}

impl MemoryState {
    /// Checks whether an equality fact is already recorded as a constant binding.
    fn is_binding(&self, fact: &Fact) -> bool {
        let bound = |v: ValueId, c: ValueId| self.constants.get(&v) == Some(&c);
        fact.op == RelationOp::Eq && (bound(fact.left, fact.right) || bound(fact.right, fact.left))
    }
}

/// Range of a variable about which nothing has been learned yet.
fn default_range(var: &Variable) -> Option<RangeSet> {
    if var.name == LENGTH && var.qualifier.is_some() {
        return Some(RangeSet::range(0, Width::Int.max_value()));
    }
    var.ty.width().map(RangeSet::from_width)
}

/// Length of a string in UTF-16 code units.
fn java_length(s: &str) -> i32 {
    s.encode_utf16().count() as i32
}

impl fmt::Debug for MemoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryState")
            .field("stack", &self.stack)
            .field("ranges", &self.ranges)
            .field("constants", &self.constants)
            .field("facts", &self.facts)
            .finish()
    }
}

impl fmt::Display for MemoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factory = &self.factory;

        let stack: Vec<String> = self.stack.iter().map(|&v| factory.display(v)).collect();
        write!(f, "<stack: [{}]", stack.join(", "))?;

        let mut ranges: Vec<_> = self.ranges.iter().collect();
        ranges.sort_by_key(|(v, _)| **v);
        for (&v, set) in ranges {
            write!(f, ", {} in {}", factory.display(v), set)?;
        }

        let mut constants: Vec<_> = self.constants.iter().collect();
        constants.sort_by_key(|(v, _)| **v);
        for (&v, &c) in constants {
            write!(f, ", {} = {}", factory.display(v), factory.display(c))?;
        }

        let mut facts: Vec<_> = self.facts.iter().filter(|fact| !self.is_binding(fact)).collect();
        facts.sort_by_key(|fact| (fact.left, fact.right));
        for fact in facts {
            write!(
                f,
                ", {} {} {}",
                factory.display(fact.left),
                fact.op,
                factory.display(fact.right)
            )?;
        }
        write!(f, ">")
    }
}
