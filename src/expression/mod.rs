//! Expression trees, their compilation to flat postfix programs, the compile-time optimization
//! passes and the stack machine that evaluates them.
//!
//! Pass order: validate, postfix, bind, solve, generators, link.

pub(crate) mod bind;
pub(crate) mod builtins;
pub(crate) mod compile;
pub(crate) mod flow;
pub(crate) mod generators;
pub(crate) mod instr;
pub(crate) mod link;
pub(crate) mod node;
pub(crate) mod registry;
pub(crate) mod solve;
pub(crate) mod validate;
pub(crate) mod vm;
