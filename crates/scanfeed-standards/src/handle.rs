#![deny(unsafe_code)]

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::error::SchemaError;
use crate::registry::{MappingRegistry, sha256_hex};

/// Shared handle to the active registry.
///
/// Readers take a snapshot with [`current`](Self::current) and keep using
/// it for the whole report; a reload swaps the handle and never touches a
/// snapshot already handed out.
#[derive(Debug, Clone, Default)]
pub struct RegistryHandle {
    inner: Arc<RwLock<Arc<MappingRegistry>>>,
}

impl RegistryHandle {
    pub fn new(registry: MappingRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    pub fn current(&self) -> Arc<MappingRegistry> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swaps in `registry`, returning the one it replaced.
    pub fn replace(&self, registry: MappingRegistry) -> Arc<MappingRegistry> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(registry))
    }

    /// Re-reads a schema file and swaps it in if its contents changed.
    ///
    /// Returns `true` when the registry was replaced. On error the current
    /// registry stays active.
    pub fn reload_from(&self, path: &Path) -> Result<bool, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
        let digest = sha256_hex(text.as_bytes());
        if self.current().digest() == Some(digest.as_str()) {
            debug!(path = %path.display(), "schema unchanged");
            return Ok(false);
        }

        let registry = MappingRegistry::from_json(&text)?;
        self.replace(registry);
        info!(path = %path.display(), digest = %digest, "schema reloaded");
        Ok(true)
    }
}
