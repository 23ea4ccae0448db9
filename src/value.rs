//! Abstract values tracked by the analysis.

use std::fmt;

use crate::range::RangeSet;
use crate::reference::ValueId;
use crate::types::VarType;
use crate::utils::{pairing2, pairing4, MyHash};

/// Literal of a constant value.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Literal {
    Bool(bool),
    Int(i32),
    Long(i64),
    Str(String),
}

impl Literal {
    /// Integer value of an `int` or `long` literal.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Literal::Int(n) => Some(*n as i64),
            Literal::Long(n) => Some(*n),
            _ => None,
        }
    }
}

impl MyHash for Literal {
    fn hash(&self) -> u64 {
        match self {
            Literal::Bool(b) => pairing2(1, *b as u64),
            Literal::Int(n) => pairing2(2, *n as u64),
            Literal::Long(n) => pairing2(3, *n as u64),
            Literal::Str(s) => pairing2(4, s.as_str().hash()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Long(n) => write!(f, "{}L", n),
            Literal::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Comparison operator of a relation between two values.
///
/// [`EqEq`][RelationOp::EqEq] is identity equality (`==` on references),
/// as opposed to value equality [`Eq`][RelationOp::Eq].
/// On integer facts both narrow the same way.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RelationOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
}

impl RelationOp {
    /// The operator of the logical negation: `!(a op b) == a op.negate() b`.
    pub fn negate(self) -> Self {
        match self {
            RelationOp::Eq | RelationOp::EqEq => RelationOp::Ne,
            RelationOp::Ne => RelationOp::Eq,
            RelationOp::Lt => RelationOp::Ge,
            RelationOp::Ge => RelationOp::Lt,
            RelationOp::Gt => RelationOp::Le,
            RelationOp::Le => RelationOp::Gt,
        }
    }

    /// The operator with swapped operands: `a op b == b op.flip() a`.
    pub fn flip(self) -> Self {
        match self {
            RelationOp::Lt => RelationOp::Gt,
            RelationOp::Gt => RelationOp::Lt,
            RelationOp::Le => RelationOp::Ge,
            RelationOp::Ge => RelationOp::Le,
            op => op,
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, RelationOp::Eq | RelationOp::EqEq)
    }

    /// Checks whether `a self b` entails `a other b` for every `a` and `b`.
    pub fn implies(self, other: RelationOp) -> bool {
        use RelationOp::*;
        let this = if self == EqEq { Eq } else { self };
        let other = if other == EqEq { Eq } else { other };
        this == other
            || matches!(
                (this, other),
                (Lt, Le) | (Lt, Ne) | (Gt, Ge) | (Gt, Ne) | (Eq, Le) | (Eq, Ge)
            )
    }

    /// Evaluates the operator on two integers.
    pub fn eval(self, a: i64, b: i64) -> bool {
        match self {
            RelationOp::Eq | RelationOp::EqEq => a == b,
            RelationOp::Ne => a != b,
            RelationOp::Lt => a < b,
            RelationOp::Le => a <= b,
            RelationOp::Gt => a > b,
            RelationOp::Ge => a >= b,
        }
    }

    fn tag(self) -> u64 {
        match self {
            RelationOp::Eq => 1,
            RelationOp::Ne => 2,
            RelationOp::Lt => 3,
            RelationOp::Le => 4,
            RelationOp::Gt => 5,
            RelationOp::Ge => 6,
            RelationOp::EqEq => 7,
        }
    }
}

impl fmt::Display for RelationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationOp::Eq => "=",
            RelationOp::Ne => "!=",
            RelationOp::Lt => "<",
            RelationOp::Le => "<=",
            RelationOp::Gt => ">",
            RelationOp::Ge => ">=",
            RelationOp::EqEq => "==",
        };
        write!(f, "{}", s)
    }
}

/// Named abstract variable, optionally derived from another value.
///
/// The length of a string `s` is the variable `length` qualified by `s`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Variable {
    pub name: String,
    pub ty: VarType,
    pub qualifier: Option<ValueId>,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: VarType) -> Self {
        Self {
            name: name.into(),
            ty,
            qualifier: None,
        }
    }

    pub fn qualified(name: impl Into<String>, ty: VarType, qualifier: ValueId) -> Self {
        Self {
            name: name.into(),
            ty,
            qualifier: Some(qualifier),
        }
    }
}

/// Abstract value.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Value {
    Constant(Literal),
    Variable(Variable),
    /// `left op right`, or its negation when `negated` is set.
    Relation {
        left: ValueId,
        right: ValueId,
        op: RelationOp,
        negated: bool,
    },
    /// Integer known only by the set of values it may take.
    Range(RangeSet),
    Unknown,
}

impl MyHash for Value {
    fn hash(&self) -> u64 {
        match self {
            Value::Constant(lit) => pairing2(1, lit.hash()),
            Value::Variable(var) => pairing4(
                2,
                var.name.as_str().hash(),
                var.ty.tag(),
                var.qualifier.map_or(0, |q| q.get() as u64),
            ),
            Value::Relation {
                left,
                right,
                op,
                negated,
            } => pairing4(
                3,
                pairing2(left.get() as u64, right.get() as u64),
                op.tag(),
                *negated as u64,
            ),
            Value::Range(set) => pairing2(4, set.hash()),
            Value::Unknown => 5,
        }
    }
}
