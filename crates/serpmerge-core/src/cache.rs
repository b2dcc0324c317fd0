use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::debug;

use crate::error::Result;
use crate::model::{TableInput, TransformOptions, TransformOutput};
use crate::pipeline;

/// Optional memoization layer over [`pipeline::transform`]. Keyed by a
/// content hash of the ordered inputs and every option, so a repeated
/// request is served from memory instead of recomputed. Failed runs are
/// never cached.
pub struct TransformCache {
    entries: LruCache<String, Arc<TransformOutput>>,
}

impl TransformCache {
    /// Creates a cache holding at most `capacity` results. A zero
    /// capacity is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serves the transform from cache when this exact input and option
    /// tuple has been seen, running and storing it otherwise.
    pub fn get_or_transform(
        &mut self,
        inputs: &[TableInput],
        options: &TransformOptions,
    ) -> Result<Arc<TransformOutput>> {
        let key = cache_key(inputs, options);
        if let Some(hit) = self.entries.get(&key) {
            debug!(key = %key, "transform cache hit");
            return Ok(Arc::clone(hit));
        }

        let output = Arc::new(pipeline::transform(inputs, options)?);
        self.entries.put(key, Arc::clone(&output));
        debug!(entries = self.entries.len(), "transform cached");
        Ok(output)
    }
}

/// Content hash of the ordered inputs and options. Every variable-width
/// component is length-framed so distinct tuples cannot collide through
/// concatenation. Input names are deliberately excluded: they only feed
/// error messages, which are never cached.
pub fn cache_key(inputs: &[TableInput], options: &TransformOptions) -> String {
    let mut hasher = blake3::Hasher::new();

    hasher.update(&(inputs.len() as u64).to_le_bytes());
    for input in inputs {
        hasher.update(&(input.contents.len() as u64).to_le_bytes());
        hasher.update(input.contents.as_bytes());
    }

    hasher.update(&options.max_position.to_le_bytes());
    hasher.update(&(options.branded_terms.len() as u64).to_le_bytes());
    for term in &options.branded_terms {
        hasher.update(&(term.len() as u64).to_le_bytes());
        hasher.update(term.as_bytes());
    }
    hasher.update(&[options.include_segments as u8]);

    hasher.finalize().to_hex().to_string()
}
