//! Call signatures and the ordered signature-to-handler mapping.
//!
//! The front end resolves each call site to a [`CallDescriptor`]. A
//! [`CallMapper`] holds `(matcher, value)` pairs in registration order and
//! returns the value of the first matcher accepting the descriptor.
//! Matching only looks at the static signature.

use std::fmt;

/// Resolved static signature of a call.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct CallDescriptor {
    /// Fully qualified name of the declaring class.
    pub class: String,
    pub name: String,
    pub parameter_types: Vec<String>,
    pub is_static: bool,
}

impl CallDescriptor {
    pub fn instance(class: &str, name: &str, parameter_types: &[&str]) -> Self {
        Self::new(class, name, parameter_types, false)
    }

    pub fn static_call(class: &str, name: &str, parameter_types: &[&str]) -> Self {
        Self::new(class, name, parameter_types, true)
    }

    fn new(class: &str, name: &str, parameter_types: &[&str], is_static: bool) -> Self {
        Self {
            class: class.to_string(),
            name: name.to_string(),
            parameter_types: parameter_types.iter().map(|t| t.to_string()).collect(),
            is_static,
        }
    }

    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }
}

impl fmt::Display for CallDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            write!(f, "static ")?;
        }
        write!(
            f,
            "{}.{}({})",
            self.class,
            self.name,
            self.parameter_types.join(", ")
        )
    }
}

/// Constraint on the parameter list of a matched call.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Parameters {
    Any,
    Count(usize),
    Types(Vec<String>),
}

/// Predicate over call descriptors.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CallMatcher {
    /// A method of `class` named one of `names`.
    Method {
        class: String,
        names: Vec<String>,
        is_static: bool,
        parameters: Parameters,
    },
    /// Matches if any of the inner matchers does.
    AnyOf(Vec<CallMatcher>),
}

impl CallMatcher {
    /// Instance methods of `class` with one of the given names.
    pub fn instance_call(class: &str, names: &[&str]) -> Self {
        Self::method(class, names, false)
    }

    /// Static methods of `class` with one of the given names.
    pub fn static_call(class: &str, names: &[&str]) -> Self {
        Self::method(class, names, true)
    }

    fn method(class: &str, names: &[&str], is_static: bool) -> Self {
        assert!(!names.is_empty(), "At least one method name is required");
        CallMatcher::Method {
            class: class.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
            is_static,
            parameters: Parameters::Any,
        }
    }

    pub fn any_of(matchers: Vec<CallMatcher>) -> Self {
        CallMatcher::AnyOf(matchers)
    }

    /// Restrict to calls with exactly `count` parameters.
    pub fn parameter_count(self, count: usize) -> Self {
        self.with_parameters(Parameters::Count(count))
    }

    /// Restrict to calls with exactly these parameter types.
    pub fn parameter_types(self, types: &[&str]) -> Self {
        self.with_parameters(Parameters::Types(
            types.iter().map(|t| t.to_string()).collect(),
        ))
    }

    fn with_parameters(self, parameters: Parameters) -> Self {
        match self {
            CallMatcher::Method {
                class,
                names,
                is_static,
                ..
            } => CallMatcher::Method {
                class,
                names,
                is_static,
                parameters,
            },
            CallMatcher::AnyOf(_) => panic!("Parameter constraints apply to single method matchers only"),
        }
    }

    pub fn matches(&self, call: &CallDescriptor) -> bool {
        match self {
            CallMatcher::Method {
                class,
                names,
                is_static,
                parameters,
            } => {
                *is_static == call.is_static
                    && *class == call.class
                    && names.iter().any(|n| *n == call.name)
                    && match parameters {
                        Parameters::Any => true,
                        Parameters::Count(count) => call.arity() == *count,
                        Parameters::Types(types) => *types == call.parameter_types,
                    }
            }
            CallMatcher::AnyOf(matchers) => matchers.iter().any(|m| m.matches(call)),
        }
    }
}

/// Ordered mapping from call matchers to values.
#[derive(Debug, Clone)]
pub struct CallMapper<T> {
    entries: Vec<(CallMatcher, T)>,
}

impl<T> Default for CallMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CallMapper<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry. Earlier entries take precedence.
    pub fn register(mut self, matcher: CallMatcher, value: T) -> Self {
        self.entries.push((matcher, value));
        self
    }

    /// The value of the first matcher accepting `call`.
    pub fn find(&self, call: &CallDescriptor) -> Option<&T> {
        self.entries
            .iter()
            .find(|(matcher, _)| matcher.matches(call))
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
