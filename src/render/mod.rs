//! Parallel execution of compiled programs over a canvas region.

pub(crate) mod evaluator;
pub(crate) mod rows;
