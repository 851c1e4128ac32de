//! Rasters, interpolation, the named image store and the generated image cache.

pub(crate) mod interp;
pub(crate) mod raster;
pub(crate) mod store;
