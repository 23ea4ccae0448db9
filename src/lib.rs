//! # dfa-rs: method effects for data-flow value analysis
//!
//! **`dfa-rs`** models what calls to well-known library methods do to an abstract program state.
//! Given a call such as `s.isEmpty()` or `Math.max(a, b)` and what is known about its receiver and arguments,
//! it computes the possible results and splits the state into one successor per feasible outcome.
//!
//! ## Architecture
//!
//! - **Interned values**: Every abstract value (constant, variable, relation, range, unknown) lives in a
//!   [`ValueFactory`][crate::factory::ValueFactory] and is addressed by a lightweight
//!   [`ValueId`][crate::reference::ValueId] handle. Equal values share a handle.
//! - **Range sets**: Integer facts are [`RangeSet`][crate::range::RangeSet]s, normalized unions of disjoint intervals.
//!   An empty set means "infeasible".
//! - **Memory states**: A [`MemoryState`][crate::state::MemoryState] holds the evaluation stack and the constraint store.
//!   Forking is a plain copy; applying a condition narrows the state or reports infeasibility.
//! - **Handlers**: A [`MethodHandler`][crate::handlers::MethodHandler] is selected by call signature from an ordered
//!   table ([`standard_handlers`][crate::handlers::standard_handlers]) and returns zero, one or two successor states.
//!
//! ## Basic Usage
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use dfa_rs::call::CallDescriptor;
//! use dfa_rs::factory::ValueFactory;
//! use dfa_rs::handlers::standard_handlers;
//! use dfa_rs::state::MemoryState;
//! use dfa_rs::types::VarType;
//!
//! let factory = Rc::new(ValueFactory::default());
//! let state = MemoryState::new(factory.clone());
//!
//! // s.isEmpty() for an unconstrained string s
//! let s = factory.variable("s", VarType::String);
//! let call = CallDescriptor::instance("java.lang.String", "isEmpty", &[]);
//! let states = standard_handlers().apply(&call, s, &[], state, &factory).unwrap();
//!
//! // One successor where s is empty, one where it is not.
//! assert_eq!(states.len(), 2);
//! assert_eq!(states[0].peek(), Some(factory.boolean(true)));
//! assert_eq!(states[1].peek(), Some(factory.boolean(false)));
//! ```

pub mod call;
pub mod factory;
pub mod handlers;
pub mod range;
pub mod reference;
pub mod state;
pub mod table;
pub mod types;
pub mod utils;
pub mod value;
