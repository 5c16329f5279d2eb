//! C target for scalar-rs composites.
//!
//! Turns a [`Composite`] into a standalone C function whose name is derived
//! from the composite fingerprint, so structurally identical composites share
//! one symbol. Generated modules are cached per process.

mod codegen;
mod error;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use scalar_rs::Composite;
use tracing::{debug, trace};

pub use error::{CodegenError, CodegenResult};

/// Generated translation unit for one composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CModule {
    pub symbol: String,
    pub source: String,
}

pub struct CCompositeTarget {
    prefix: String,
}

impl CCompositeTarget {
    pub fn new() -> Self {
        Self::with_prefix("composite")
    }

    /// Uses `prefix` (sanitized into a C identifier) for entrypoint names.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: codegen::sanitize_symbol(&prefix.into()),
        }
    }

    pub fn name(&self) -> &str {
        "c"
    }

    /// Emits `composite` as a C function. Float16 composites are narrowed to
    /// float32 first since C has no portable half type.
    pub fn convert(&self, composite: &Composite) -> CodegenResult<CModule> {
        let composite = if composite.has_float16() {
            debug!(signature = %composite.signature(), "narrowing float16 composite for C");
            composite.clone_float32()?
        } else {
            composite.clone()
        };
        let symbol = self.entrypoint_name(&composite);
        let source = codegen::render_module(&composite, &symbol)?;
        trace!(%symbol, bytes = source.len(), "generated C module");
        Ok(CModule { symbol, source })
    }

    /// `<prefix>__<fingerprint>` with the fingerprint as 16 hex digits.
    pub fn entrypoint_name(&self, composite: &Composite) -> String {
        format!("{}__{:016x}", self.prefix, composite.fingerprint())
    }
}

impl Default for CCompositeTarget {
    fn default() -> Self {
        Self::new()
    }
}

type KernelCacheEntry = Arc<OnceLock<CodegenResult<Arc<CModule>>>>;
type KernelCacheMap = HashMap<String, KernelCacheEntry>;

/// In-process memo of generated modules keyed by composite cache key.
pub struct KernelCache {
    entries: Mutex<KernelCacheMap>,
}

impl KernelCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the module cached for `composite`, building it with `build` on
    /// first request. Concurrent callers for the same key share one result.
    pub fn get_or_convert<F>(&self, composite: &Composite, build: F) -> CodegenResult<Arc<CModule>>
    where
        F: FnOnce(&Composite) -> CodegenResult<CModule>,
    {
        let cell = {
            let mut guard = self
                .entries
                .lock()
                .map_err(|_| CodegenError::new("kernel cache poisoned"))?;
            guard
                .entry(composite.cache_key().to_string())
                .or_insert_with(|| Arc::new(OnceLock::new()))
                .clone()
        };

        if let Some(existing) = cell.get() {
            trace!(signature = %composite.signature(), "kernel cache hit");
            return existing.clone();
        }

        debug!(signature = %composite.signature(), "kernel cache miss");
        let built = build(composite).map(Arc::new);
        let _ = cell.set(built.clone());
        match cell.get() {
            Some(stored) => stored.clone(),
            None => built,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KernelCache {
    fn default() -> Self {
        Self::new()
    }
}
