//! The compile-then-execute pipeline over four-channel expression trees.

pub(crate) mod pipeline;
