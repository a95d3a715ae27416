//! Custom network protocols shared by every map in the process.
//!
//! A protocol URL such as `dem-contour://12/2135/1457?...` is served by the
//! handler registered for its scheme instead of going over the network.

use crate::prelude::{Arc, HashMap};
use crate::{Result, ViewerError};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::sync::RwLock;

/// Serves requests for one URL scheme.
#[async_trait]
pub trait ProtocolHandler: Send + Sync {
    async fn handle(&self, url: &str) -> Result<Vec<u8>>;
}

static GLOBAL_REGISTRY: Lazy<ProtocolRegistry> = Lazy::new(ProtocolRegistry::new);

/// Scheme → handler table. Clones share the same table.
#[derive(Clone, Default)]
pub struct ProtocolRegistry {
    handlers: Arc<RwLock<HashMap<String, Arc<dyn ProtocolHandler>>>>,
}

impl ProtocolRegistry {
    /// A fresh, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry maps resolve protocol URLs against
    pub fn global() -> Self {
        GLOBAL_REGISTRY.clone()
    }

    /// Registers `handler` for `scheme`, replacing and returning any previous one
    pub fn add_protocol(
        &self,
        scheme: &str,
        handler: Arc<dyn ProtocolHandler>,
    ) -> Option<Arc<dyn ProtocolHandler>> {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        let previous = handlers.insert(scheme.to_string(), handler);
        if previous.is_some() {
            log::debug!("replaced protocol handler for {}://", scheme);
        }
        previous
    }

    pub fn remove_protocol(&self, scheme: &str) -> Option<Arc<dyn ProtocolHandler>> {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        handlers.remove(scheme)
    }

    /// Removes the handler for `scheme` only if it is `handler`, so a stale
    /// owner cannot unregister its replacement.
    pub fn remove_protocol_if(&self, scheme: &str, handler: &Arc<dyn ProtocolHandler>) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        let owned = handlers
            .get(scheme)
            .map(|current| same_handler(current, handler))
            .unwrap_or(false);
        if owned {
            handlers.remove(scheme);
        }
        owned
    }

    pub fn has_protocol(&self, scheme: &str) -> bool {
        self.handlers
            .read()
            .map(|handlers| handlers.contains_key(scheme))
            .unwrap_or(false)
    }

    pub fn handler(&self, scheme: &str) -> Option<Arc<dyn ProtocolHandler>> {
        self.handlers.read().ok()?.get(scheme).cloned()
    }

    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self
            .handlers
            .read()
            .map(|handlers| handlers.keys().cloned().collect())
            .unwrap_or_default();
        schemes.sort();
        schemes
    }

    /// Dispatches `url` to the handler registered for its scheme
    pub async fn request(&self, url: &str) -> Result<Vec<u8>> {
        let (scheme, _) = url
            .split_once("://")
            .ok_or_else(|| ViewerError::InvalidProtocolUrl(url.to_string()))?;
        let handler = self
            .handler(scheme)
            .ok_or_else(|| ViewerError::UnknownProtocol(scheme.to_string()))?;
        handler.handle(url).await
    }
}

impl std::fmt::Debug for ProtocolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

fn same_handler(a: &Arc<dyn ProtocolHandler>, b: &Arc<dyn ProtocolHandler>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
