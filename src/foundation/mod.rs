//! Value types shared by every stage: pixels, geometry, errors and hashing.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod hash;
pub(crate) mod pixel;
