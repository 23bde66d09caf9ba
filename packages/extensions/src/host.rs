//! Reference host: runs a document through the namespace session.
//!
//! This is not a statechart engine. Elements are executed depth-first in
//! document order; namespaced elements go to their module, and everything a
//! module declines gets default processing:
//!
//! - `assign location=".." expr=".."` stores the evaluated value
//! - `log label=".." expr=".."` logs the evaluated value
//! - `transition` is skipped (no events are processed)
//! - any other element executes its children
//!
//! Modules hold an `Arc` back to the host, so a host stays alive until
//! [`Host::teardown`] unloads them.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;

use crate::datamodel::MemoryDataModel;
use crate::element::ElementHandle;
use crate::error::{ActionError, ErrorKind, ExtensionError, Result};
use crate::interpreter::{DataModel, Interpreter};
use crate::namespace::Dispatch;
use crate::registry::{NamespaceRegistry, NamespaceSession};
use crate::resolve::{AttributeResolver, AttributeSpec};
use crate::value::Value;
use crate::xml::Document;

const LOCATION: AttributeSpec<'static> = AttributeSpec::required("location").trimmed();
const LABEL: AttributeSpec<'static> = AttributeSpec::optional("label");

/// One line emitted through [`Interpreter::log`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub label: String,
    pub message: String,
}

/// Minimal interpreter implementing the host interfaces.
pub struct Host {
    me: Weak<Host>,
    session: NamespaceSession,
    data_model: Option<MemoryDataModel>,
    logs: Mutex<Vec<LogRecord>>,
}

impl Host {
    /// Create a host with an in-memory data model.
    #[must_use]
    pub fn new(registry: Arc<NamespaceRegistry>, document: Arc<Document>) -> Arc<Self> {
        Self::build(registry, document, true)
    }

    /// Create a host with no data model bound.
    #[must_use]
    pub fn without_data_model(
        registry: Arc<NamespaceRegistry>,
        document: Arc<Document>,
    ) -> Arc<Self> {
        Self::build(registry, document, false)
    }

    fn build(
        registry: Arc<NamespaceRegistry>,
        document: Arc<Document>,
        with_data_model: bool,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            session: NamespaceSession::new(registry, document),
            data_model: with_data_model.then(MemoryDataModel::new),
            logs: Mutex::new(Vec::new()),
        })
    }

    /// The namespace session owned by this host.
    #[must_use]
    pub fn session(&self) -> &NamespaceSession {
        &self.session
    }

    /// The document being run.
    #[must_use]
    pub fn document(&self) -> &Arc<Document> {
        self.session.document()
    }

    fn lock_logs(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.logs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Everything logged so far, in order.
    #[must_use]
    pub fn logs(&self) -> Vec<LogRecord> {
        self.lock_logs().clone()
    }

    /// Copy of the data model variables; empty without a data model.
    #[must_use]
    pub fn data_model_snapshot(&self) -> BTreeMap<String, Value> {
        self.data_model
            .as_ref()
            .map(MemoryDataModel::snapshot)
            .unwrap_or_default()
    }

    /// Event schemas recorded by the loaded modules. Empty after teardown.
    #[must_use]
    pub fn event_schemas(&self) -> BTreeMap<String, String> {
        self.session.event_schemas()
    }

    fn interpreter(&self) -> std::result::Result<Arc<dyn Interpreter>, ActionError> {
        let me: Arc<dyn Interpreter> = self.me.upgrade().ok_or_else(|| {
            ActionError::new(ErrorKind::Load, "", "Interpreter is no longer available")
        })?;
        Ok(me)
    }

    /// Load the document's namespaces, then execute the root element.
    ///
    /// # Errors
    /// Load failures, or the first action failure.
    pub fn run(&self) -> Result<()> {
        let itp = self.interpreter()?;
        self.session.preload(&itp)?;
        let root = self.document().root();
        tracing::debug!(root = root.tag_name(), "Running document");
        self.execute_element(root)?;
        Ok(())
    }

    /// Unload every namespace module. Safe to call more than once.
    ///
    /// # Errors
    /// The first module unload failure.
    pub fn teardown(&self) -> Result<()> {
        self.session.unload()?;
        Ok(())
    }

    fn execute_default(&self, element: &dyn ElementHandle) -> std::result::Result<(), ActionError> {
        match element.local_name().to_lowercase().as_str() {
            "assign" => self.assign(element),
            "log" => self.log_element(element),
            "transition" => Ok(()),
            _ => element
                .child_elements()
                .try_for_each(|child| self.execute_element(child)),
        }
    }

    fn resolver<'a>(
        &'a self,
        element: &'a dyn ElementHandle,
        action: &'a str,
    ) -> AttributeResolver<'a> {
        AttributeResolver::new(element, self.data_model(), action)
    }

    fn assign(&self, element: &dyn ElementHandle) -> std::result::Result<(), ActionError> {
        let resolver = self.resolver(element, "assign");
        let location = resolver.resolve(&LOCATION)?.unwrap_or_default();
        let value = match resolver.literal("expr", false) {
            Some(expr) => resolver.evaluate("expr", expr)?,
            None => Value::Null,
        };
        resolver
            .data_model()?
            .set_variable(&location, value)
            .map_err(|err| {
                ActionError::new(
                    ErrorKind::Assignment,
                    "assign",
                    format!("Failed to assign to {location}"),
                )
                .with_data("location", location.as_str())
                .with_cause(err)
            })
    }

    fn log_element(&self, element: &dyn ElementHandle) -> std::result::Result<(), ActionError> {
        let resolver = self.resolver(element, "log");
        let label = resolver.resolve(&LABEL)?.unwrap_or_default();
        let message = match resolver.literal("expr", false) {
            Some(expr) => resolver
                .evaluate("expr", expr)?
                .to_attribute_string()
                .unwrap_or_else(|| "null".to_string()),
            None => String::new(),
        };
        self.log(&label, &message);
        Ok(())
    }
}

impl Interpreter for Host {
    fn log(&self, label: &str, message: &str) {
        tracing::info!(label, "{message}");
        self.lock_logs().push(LogRecord {
            label: label.to_string(),
            message: message.to_string(),
        });
    }

    fn data_model(&self) -> Option<&dyn DataModel> {
        self.data_model.as_ref().map(|dm| dm as &dyn DataModel)
    }

    fn execute_element(&self, element: &dyn ElementHandle) -> std::result::Result<(), ActionError> {
        let itp = self.interpreter()?;
        let dispatch = if element.namespace_uri().is_some() {
            self.session.dispatch(element, &itp)
        } else {
            self.session.offer(element)
        };
        match dispatch {
            Ok(Dispatch::Handled(result)) => result,
            Ok(Dispatch::Declined) => self.execute_default(element),
            Err(ExtensionError::Action(err)) => Err(err),
            Err(err) => Err(ActionError::new(
                ErrorKind::Load,
                element.local_name(),
                format!("Failed to load namespace for {}: {err}", element.tag_name()),
            )
            .with_data("namespace", element.namespace_uri().unwrap_or_default())
            .with_cause(err)),
        }
    }
}
