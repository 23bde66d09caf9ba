//! Namespace registry and per-interpreter sessions.
//!
//! The [`NamespaceRegistry`] maps namespace URIs to loaders. It is built once
//! when an interpreter is configured and read-only afterwards. A
//! [`NamespaceSession`] belongs to one interpreter instance: it constructs
//! each module at most once, routes elements to it, and unloads every module
//! exactly once at teardown.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::validate_namespace_uri;
use crate::element::ElementHandle;
use crate::error::{ActionError, ExtensionError, Result};
use crate::interpreter::Interpreter;
use crate::namespace::{Dispatch, Namespace, NamespaceLoader};
use crate::xml::Document;

/// Registry mapping namespace URIs to loaders.
#[derive(Clone, Default)]
pub struct NamespaceRegistry {
    loaders: HashMap<String, NamespaceLoader>,
}

impl NamespaceRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader for a namespace URI.
    ///
    /// # Errors
    /// `InvalidNamespaceUri` for a malformed URI, `DuplicateNamespace` if a
    /// loader is already registered for it.
    pub fn register(&mut self, uri: impl Into<String>, loader: NamespaceLoader) -> Result<()> {
        let uri = uri.into();
        validate_namespace_uri(&uri)?;
        if self.loaders.contains_key(&uri) {
            return Err(ExtensionError::DuplicateNamespace(uri));
        }
        self.loaders.insert(uri, loader);
        Ok(())
    }

    /// Register every `(uri, loader)` pair.
    ///
    /// # Errors
    /// The first registration failure.
    pub fn register_all(
        &mut self,
        loaders: impl IntoIterator<Item = (String, NamespaceLoader)>,
    ) -> Result<()> {
        for (uri, loader) in loaders {
            self.register(uri, loader)?;
        }
        Ok(())
    }

    /// Look up the loader for a URI.
    #[must_use]
    pub fn get(&self, uri: &str) -> Option<&NamespaceLoader> {
        self.loaders.get(uri)
    }

    /// Check if a loader is registered for a URI.
    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.loaders.contains_key(uri)
    }

    /// Registered URIs, sorted.
    #[must_use]
    pub fn uris(&self) -> Vec<&str> {
        let mut uris: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
        uris.sort_unstable();
        uris
    }

    /// Number of registered namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Invoke the loader for `uri`.
    ///
    /// # Errors
    /// `UnknownNamespace` if nothing is registered for `uri`, otherwise the
    /// loader's own failure.
    pub fn load(
        &self,
        uri: &str,
        interpreter: Arc<dyn Interpreter>,
        document: Arc<Document>,
    ) -> Result<Box<dyn Namespace>> {
        let loader = self
            .get(uri)
            .ok_or_else(|| ExtensionError::UnknownNamespace(uri.to_string()))?;
        let module = loader(interpreter, document)?;
        tracing::debug!(uri, "Loaded namespace");
        Ok(module)
    }
}

impl fmt::Debug for NamespaceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceRegistry")
            .field("uris", &self.uris())
            .finish()
    }
}

/// Modules loaded for one interpreter instance.
pub struct NamespaceSession {
    registry: Arc<NamespaceRegistry>,
    document: Arc<Document>,
    modules: Mutex<BTreeMap<String, Arc<dyn Namespace>>>,
    closed: AtomicBool,
}

impl NamespaceSession {
    /// Create a session over a registry for one document.
    #[must_use]
    pub fn new(registry: Arc<NamespaceRegistry>, document: Arc<Document>) -> Self {
        Self {
            registry,
            document,
            modules: Mutex::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// The registry this session loads from.
    #[must_use]
    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// The document this session was created for.
    #[must_use]
    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    fn lock_modules(&self) -> MutexGuard<'_, BTreeMap<String, Arc<dyn Namespace>>> {
        self.modules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(ExtensionError::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// URIs of the modules loaded so far, sorted.
    #[must_use]
    pub fn loaded_uris(&self) -> Vec<String> {
        self.lock_modules().keys().cloned().collect()
    }

    /// Get the module for `uri`, loading it on first use.
    ///
    /// Returns `Ok(None)` when no loader is registered for `uri`.
    ///
    /// # Errors
    /// `SessionClosed` after [`unload`](Self::unload), or the loader failure.
    pub fn module(
        &self,
        uri: &str,
        interpreter: &Arc<dyn Interpreter>,
    ) -> Result<Option<Arc<dyn Namespace>>> {
        self.ensure_open()?;
        if let Some(module) = self.lock_modules().get(uri) {
            return Ok(Some(Arc::clone(module)));
        }
        if !self.registry.contains(uri) {
            return Ok(None);
        }

        // The loader runs without the lock held so it may call back into
        // the interpreter.
        let loaded: Arc<dyn Namespace> = Arc::from(self.registry.load(
            uri,
            Arc::clone(interpreter),
            Arc::clone(&self.document),
        )?);
        let module = Arc::clone(
            self.lock_modules()
                .entry(uri.to_string())
                .or_insert(loaded),
        );
        Ok(Some(module))
    }

    /// Load every registered namespace used by an element in the document.
    ///
    /// # Errors
    /// The first loader failure.
    pub fn preload(&self, interpreter: &Arc<dyn Interpreter>) -> Result<()> {
        let mut uris: Vec<&str> = self
            .document
            .root()
            .descendants()
            .filter_map(|el| el.namespace_uri())
            .filter(|uri| self.registry.contains(uri))
            .collect();
        uris.sort_unstable();
        uris.dedup();
        for uri in uris {
            self.module(uri, interpreter)?;
        }
        Ok(())
    }

    /// Route an element to the module owning its namespace.
    ///
    /// Elements without a namespace, or in a namespace nobody registered,
    /// are declined.
    ///
    /// # Errors
    /// `SessionClosed`, loader failures, or the module's `InvalidElement`.
    pub fn dispatch(
        &self,
        element: &dyn ElementHandle,
        interpreter: &Arc<dyn Interpreter>,
    ) -> Result<Dispatch> {
        let Some(uri) = element.namespace_uri() else {
            return Ok(Dispatch::Declined);
        };
        match self.module(uri, interpreter)? {
            Some(module) => Ok(module.handle(Some(element))?),
            None => Ok(Dispatch::Declined),
        }
    }

    /// Offer an element outside any namespace to the loaded modules that
    /// accept unqualified elements, in URI order.
    ///
    /// This is the default-namespace pass: the `agent` namespace records
    /// transition schemas this way. The first module that handles the
    /// element wins.
    ///
    /// # Errors
    /// `SessionClosed`, or a module's `InvalidElement`.
    pub fn offer(&self, element: &dyn ElementHandle) -> Result<Dispatch> {
        self.ensure_open()?;
        let modules: Vec<Arc<dyn Namespace>> = self
            .lock_modules()
            .values()
            .filter(|module| module.accepts_unqualified())
            .cloned()
            .collect();
        for module in modules {
            let dispatch = module.handle(Some(element))?;
            if dispatch.is_handled() {
                return Ok(dispatch);
            }
        }
        Ok(Dispatch::Declined)
    }

    /// Event schemas recorded by the loaded modules, merged in URI order.
    #[must_use]
    pub fn event_schemas(&self) -> BTreeMap<String, String> {
        let modules: Vec<Arc<dyn Namespace>> = self.lock_modules().values().cloned().collect();
        modules
            .iter()
            .flat_map(|module| module.event_schemas())
            .collect()
    }

    /// Unload every module. Only the first call has any effect.
    ///
    /// All modules are unloaded even if one fails; the first failure is
    /// returned.
    ///
    /// # Errors
    /// The first module unload failure.
    pub fn unload(&self) -> std::result::Result<(), ActionError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let modules = std::mem::take(&mut *self.lock_modules());
        let mut first_error = None;
        for (uri, module) in modules {
            if let Err(err) = module.unload() {
                tracing::warn!(uri = %uri, error = %err, "Namespace unload failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Whether [`unload`](Self::unload) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for NamespaceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceSession")
            .field("registry", &self.registry)
            .field("loaded", &self.loaded_uris())
            .field("closed", &self.is_closed())
            .finish()
    }
}
