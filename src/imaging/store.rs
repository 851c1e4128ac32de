use crate::foundation::error::{PixelMathError, PixelMathResult};
use crate::imaging::raster::Raster;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

/// Named input images available to expressions.
///
/// Images are immutable once inserted and shared by reference with compiled programs.
#[derive(Clone, Debug, Default)]
pub struct ImageStore {
    images: BTreeMap<String, Arc<Raster>>,
}

impl ImageStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an image.
    pub fn insert(&mut self, id: impl Into<String>, raster: Raster) {
        self.images.insert(id.into(), Arc::new(raster));
    }

    /// Look up an image by identifier.
    pub fn get(&self, id: &str) -> Option<&Arc<Raster>> {
        self.images.get(id)
    }

    /// `true` when `id` names an image.
    pub fn contains(&self, id: &str) -> bool {
        self.images.contains_key(id)
    }

    /// Image identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }
}

/// Identifiers that name the target image of an execution.
pub(crate) fn is_target_alias(id: &str) -> bool {
    id == "$T" || id == "$target"
}

/// Image lookup with the target image as default.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ImageScope<'a> {
    pub(crate) store: &'a ImageStore,
    pub(crate) target: Option<&'a str>,
}

impl<'a> ImageScope<'a> {
    pub(crate) fn new(store: &'a ImageStore, target: Option<&'a str>) -> Self {
        Self { store, target }
    }

    /// Canonical identifier for `id`; `None` and the target aliases map to the target image.
    pub(crate) fn canonical<'s>(&self, id: Option<&'s str>) -> PixelMathResult<&'s str>
    where
        'a: 's,
    {
        match id {
            Some(id) if !is_target_alias(id) => Ok(id),
            _ => self
                .target
                .ok_or_else(|| PixelMathError::compile("no target image is available")),
        }
    }

    /// Resolve `id` to a stored image.
    pub(crate) fn find(&self, id: Option<&str>) -> PixelMathResult<&'a Arc<Raster>> {
        let key = self.canonical(id)?;
        self.store
            .get(key)
            .ok_or_else(|| PixelMathError::compile(format!("unknown image identifier '{key}'")))
    }
}

/// Summary of the generated image cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheReport {
    /// Number of cached images.
    pub images: usize,
    /// Total sample bytes held by the cached images.
    pub bytes: usize,
}

/// Process-wide cache of rasters synthesized by image generators.
///
/// Keys identify the generator, its parameters and its source content, so an entry can be reused
/// by later expressions and executions for as long as caching is enabled.
#[derive(Debug, Default)]
pub(crate) struct ImageCache {
    images: HashMap<String, Arc<Raster>>,
}

static IMAGE_CACHE: LazyLock<Mutex<ImageCache>> = LazyLock::new(|| Mutex::new(ImageCache::default()));

impl ImageCache {
    /// Lock the process-wide cache. A poisoned lock is recovered: entries are immutable rasters,
    /// so a panic elsewhere cannot leave them half-written.
    pub(crate) fn global() -> MutexGuard<'static, ImageCache> {
        IMAGE_CACHE
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<Raster>> {
        self.images.get(key).cloned()
    }

    pub(crate) fn insert(&mut self, key: String, raster: Arc<Raster>) {
        self.images.insert(key, raster);
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<Arc<Raster>> {
        self.images.remove(key)
    }

    pub(crate) fn report(&self) -> CacheReport {
        CacheReport {
            images: self.images.len(),
            bytes: self.images.values().map(|r| r.byte_size()).sum(),
        }
    }

    pub(crate) fn clear(&mut self) -> CacheReport {
        let freed = self.report();
        self.images.clear();
        freed
    }
}

/// Report the number and size of images currently held by the generated image cache.
pub fn image_cache_report() -> CacheReport {
    ImageCache::global().report()
}

/// Release every generated image. Returns what was freed.
pub fn clear_image_cache() -> CacheReport {
    let freed = ImageCache::global().clear();
    if freed.images > 0 {
        tracing::info!(
            images = freed.images,
            bytes = freed.bytes,
            "cleared generated image cache"
        );
    }
    freed
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/store.rs"]
mod tests;
