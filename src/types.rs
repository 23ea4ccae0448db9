//! Integer domain widths and declared variable types.
//!
//! The analysis tracks all integers as `i64`, but `int` arithmetic wraps at
//! 32 bits. [`Width`] selects which of the two domains an operation follows.
use std::fmt;

/// Width of a signed integer domain.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Width {
    /// 32-bit `int`.
    Int,
    /// 64-bit `long`.
    Long,
}

impl Width {
    /// Smallest value of the domain.
    ///
    /// This is the one value whose negation overflows back to itself.
    pub fn min_value(self) -> i64 {
        match self {
            Width::Int => i32::MIN as i64,
            Width::Long => i64::MIN,
        }
    }

    /// Largest value of the domain.
    pub fn max_value(self) -> i64 {
        match self {
            Width::Int => i32::MAX as i64,
            Width::Long => i64::MAX,
        }
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Width::Int => write!(f, "int"),
            Width::Long => write!(f, "long"),
        }
    }
}

/// Declared type of an abstract variable.
///
/// The type decides which default facts a variable carries when the memory
/// state knows nothing else about it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VarType {
    Boolean,
    Int,
    Long,
    String,
    Object,
}

impl VarType {
    /// Integer width of the type, if it is an integer type.
    pub fn width(self) -> Option<Width> {
        match self {
            VarType::Int => Some(Width::Int),
            VarType::Long => Some(Width::Long),
            _ => None,
        }
    }

    pub fn tag(self) -> u64 {
        match self {
            VarType::Boolean => 1,
            VarType::Int => 2,
            VarType::Long => 3,
            VarType::String => 4,
            VarType::Object => 5,
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarType::Boolean => "boolean",
            VarType::Int => "int",
            VarType::Long => "long",
            VarType::String => "String",
            VarType::Object => "Object",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_bounds() {
        assert_eq!(Width::Int.min_value(), -2147483648);
        assert_eq!(Width::Int.max_value(), 2147483647);
        assert_eq!(Width::Long.min_value(), i64::MIN);
        assert_eq!(Width::Long.max_value(), i64::MAX);
    }

    #[test]
    fn test_var_type_width() {
        assert_eq!(VarType::Int.width(), Some(Width::Int));
        assert_eq!(VarType::Long.width(), Some(Width::Long));
        assert_eq!(VarType::String.width(), None);
        assert_eq!(VarType::String.to_string(), "String");
    }
}
