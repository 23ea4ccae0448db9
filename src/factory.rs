//! Interning arena for abstract values.
//!
//! Every [`Value`] lives in the factory exactly once and is addressed by a
//! [`ValueId`] handle. Asking for the same value twice returns the same
//! handle, so handle equality is value identity: two equal constants share a
//! handle, and a variable is the same variable wherever it is mentioned.

use std::cell::RefCell;
use std::fmt::Debug;

use log::trace;

use crate::range::RangeSet;
use crate::reference::ValueId;
use crate::table::Table;
use crate::types::VarType;
use crate::value::{Literal, RelationOp, Value, Variable};

/// Name of the derived variable holding the length of a string.
pub const LENGTH: &str = "length";

pub struct ValueFactory {
    table: RefCell<Table<Value>>,
    unknown: ValueId,
    true_value: ValueId,
    false_value: ValueId,
}

impl ValueFactory {
    /// Create a new factory with `2^bucket_bits` hash buckets.
    pub fn new(bucket_bits: usize) -> Self {
        let mut table = Table::new(bucket_bits);
        let unknown = ValueId::new(table.put(Value::Unknown) as u32);
        let true_value = ValueId::new(table.put(Value::Constant(Literal::Bool(true))) as u32);
        let false_value = ValueId::new(table.put(Value::Constant(Literal::Bool(false))) as u32);
        Self {
            table: RefCell::new(table),
            unknown,
            true_value,
            false_value,
        }
    }
}

impl Default for ValueFactory {
    fn default() -> Self {
        ValueFactory::new(12)
    }
}

impl Debug for ValueFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueFactory")
            .field("size", &self.size())
            .finish()
    }
}

impl ValueFactory {
    /// Number of interned values.
    pub fn size(&self) -> usize {
        self.table.borrow().size()
    }

    /// Intern a value and return its handle.
    pub fn intern(&self, value: Value) -> ValueId {
        let index = self.table.borrow_mut().put(value);
        ValueId::new(index as u32)
    }

    /// Look up the value behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not issued by this factory.
    pub fn value(&self, id: ValueId) -> Value {
        self.table.borrow().value(id.index()).clone()
    }

    pub fn unknown(&self) -> ValueId {
        self.unknown
    }

    pub fn is_unknown(&self, id: ValueId) -> bool {
        id == self.unknown
    }

    pub fn boolean(&self, value: bool) -> ValueId {
        if value {
            self.true_value
        } else {
            self.false_value
        }
    }

    pub fn constant(&self, literal: Literal) -> ValueId {
        self.intern(Value::Constant(literal))
    }

    pub fn int(&self, value: i32) -> ValueId {
        self.constant(Literal::Int(value))
    }

    pub fn long(&self, value: i64) -> ValueId {
        self.constant(Literal::Long(value))
    }

    pub fn string(&self, value: impl Into<String>) -> ValueId {
        self.constant(Literal::Str(value.into()))
    }

    pub fn variable(&self, name: impl Into<String>, ty: VarType) -> ValueId {
        self.intern(Value::Variable(Variable::new(name, ty)))
    }

    /// The variable holding the length of the string `qualifier`.
    pub fn string_length(&self, qualifier: ValueId) -> ValueId {
        self.intern(Value::Variable(Variable::qualified(LENGTH, VarType::Int, qualifier)))
    }

    /// An integer known only by its possible values.
    ///
    /// A one-point set becomes a `long` constant.
    pub fn range(&self, set: RangeSet) -> ValueId {
        match set.constant_value() {
            Some(value) => self.long(value),
            None => self.intern(Value::Range(set)),
        }
    }

    /// The relation `left op right`, negated if `negated` is set.
    ///
    /// A relation mentioning an unknown value carries no information and
    /// collapses to [`unknown`][ValueFactory::unknown].
    pub fn relation(&self, left: ValueId, right: ValueId, op: RelationOp, negated: bool) -> ValueId {
        if self.is_unknown(left) || self.is_unknown(right) {
            trace!("relation({} {} {}) over unknown operand", left, op, right);
            return self.unknown;
        }
        self.intern(Value::Relation {
            left,
            right,
            op,
            negated,
        })
    }

    /// Renders a value for diagnostics.
    pub fn display(&self, id: ValueId) -> String {
        match self.value(id) {
            Value::Constant(lit) => lit.to_string(),
            Value::Variable(var) => match var.qualifier {
                Some(q) => format!("{}.{}", self.display(q), var.name),
                None => var.name,
            },
            Value::Relation {
                left,
                right,
                op,
                negated,
            } => {
                let text = format!("{} {} {}", self.display(left), op, self.display(right));
                if negated {
                    format!("!({})", text)
                } else {
                    text
                }
            }
            Value::Range(set) => set.to_string(),
            Value::Unknown => "?".to_string(),
        }
    }
}
