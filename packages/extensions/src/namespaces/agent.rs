//! The `agent` namespace: a document-root element replacing `<scxml>`.
//!
//! ```xml
//! <agent xmlns="urn:scxml-ext:agent"
//!        xmlns:use="urn:scxml-ext:use"
//!        datamodel="ecmascript"
//!        use:memory="urn:example:memory">
//!   <state id="start">
//!     <transition event="user.input" event:schema='{"type":"object"}' target="reply"/>
//!   </state>
//! </agent>
//! ```
//!
//! `use:<prefix>` attributes declare namespace aliases the same way
//! `xmlns:<prefix>` does. Event payload schemas on transitions are logged and
//! recorded but never parsed or enforced.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::field::Empty;

use crate::config::{is_valid_alias_prefix, EVENT_SCHEMA_ATTRIBUTE, USE_PREFIX};
use crate::element::ElementHandle;
use crate::error::{ActionError, ErrorKind};
use crate::interpreter::Interpreter;
use crate::namespace::{loader, require_element, Dispatch, Namespace, NamespaceLoader};

/// Namespace URI of the `agent` vocabulary.
pub const NAMESPACE_URI: &str = "urn:scxml-ext:agent";

const LABEL: &str = "agent";

/// Loader for the `agent` namespace.
#[must_use]
pub fn loader_for_agent() -> NamespaceLoader {
    loader(|itp, _doc| Ok(Box::new(AgentNamespace::new(itp))))
}

/// Collect `use:<prefix>="uri"` declarations, keyed by prefix.
///
/// Prefixes that are not valid NCNames are skipped with a warning.
pub fn namespace_aliases(element: &dyn ElementHandle) -> BTreeMap<String, String> {
    let mut aliases = BTreeMap::new();
    for (name, uri) in element.attributes() {
        let Some(prefix) = name.strip_prefix(USE_PREFIX) else {
            continue;
        };
        if is_valid_alias_prefix(prefix) {
            aliases.insert(prefix.to_string(), uri.to_string());
        } else {
            tracing::warn!(attribute = %name, "Ignoring namespace alias with invalid prefix");
        }
    }
    aliases
}

/// The loaded `agent` namespace.
pub struct AgentNamespace {
    itp: Arc<dyn Interpreter>,
    schemas: Mutex<BTreeMap<String, String>>,
}

impl AgentNamespace {
    /// Create the module for an interpreter.
    #[must_use]
    pub fn new(itp: Arc<dyn Interpreter>) -> Self {
        Self {
            itp,
            schemas: Mutex::new(BTreeMap::new()),
        }
    }

    fn record_schema(&self, event: &str, schema: &str) {
        self.schemas
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(event.to_string(), schema.to_string());
    }

    /// A transition met during default processing.
    fn note_transition(&self, element: &dyn ElementHandle) {
        let schema = element.attribute(EVENT_SCHEMA_ATTRIBUTE).unwrap_or_default();
        if schema.is_empty() {
            return;
        }
        self.itp
            .log(LABEL, &format!("Transition event schema: {schema}"));
        if let Some(event) = element.attribute("event").filter(|e| !e.is_empty()) {
            self.record_schema(event, schema);
        }
    }

    /// `<agent>`: declare aliases, scan schemas, run children in order.
    fn execute(&self, element: &dyn ElementHandle) -> Result<(), ActionError> {
        let span = tracing::info_span!(
            "agent.execute",
            agent.datamodel = Empty,
            agent.children = Empty
        );
        let _guard = span.enter();

        let datamodel = element.attribute("datamodel").unwrap_or_default();
        span.record("agent.datamodel", datamodel);

        if !datamodel.is_empty() {
            self.itp.log(LABEL, &format!("Datamodel: {datamodel}"));
        }
        for (prefix, uri) in namespace_aliases(element) {
            self.itp.log(LABEL, &format!("Namespace {prefix}: {uri}"));
        }

        self.scan_event_schemas(element);

        let mut executed = 0_u64;
        for child in element.child_elements() {
            self.itp.execute_element(child).map_err(|err| {
                ActionError::new(
                    ErrorKind::DelegatedChild,
                    LABEL,
                    format!("Failed to execute agent child element: {err}"),
                )
                .with_data("child", child.tag_name())
                .with_data("datamodel", datamodel)
                .with_cause(err)
            })?;
            executed += 1;
        }
        span.record("agent.children", executed);
        Ok(())
    }

    /// Walk all descendants for transitions carrying `event:schema`.
    ///
    /// Advisory only: nothing here affects execution.
    fn scan_event_schemas(&self, element: &dyn ElementHandle) {
        if element.local_name().eq_ignore_ascii_case("transition") {
            let schema = element.attribute(EVENT_SCHEMA_ATTRIBUTE).unwrap_or_default();
            let event = element.attribute("event").unwrap_or_default();
            if !schema.is_empty() && !event.is_empty() {
                self.itp
                    .log(LABEL, &format!("Event schema for '{event}': {schema}"));
                self.record_schema(event, schema);
            }
        }
        for child in element.child_elements() {
            self.scan_event_schemas(child);
        }
    }
}

impl Namespace for AgentNamespace {
    fn uri(&self) -> &str {
        NAMESPACE_URI
    }

    fn handle(&self, element: Option<&dyn ElementHandle>) -> Result<Dispatch, ActionError> {
        let (element, local) = require_element(LABEL, element)?;
        match local.as_str() {
            "agent" => Ok(Dispatch::Handled(self.execute(element))),
            "transition" => {
                // Default processing still owns the transition itself.
                self.note_transition(element);
                Ok(Dispatch::Declined)
            }
            _ => Ok(Dispatch::Declined),
        }
    }

    fn accepts_unqualified(&self) -> bool {
        true
    }

    fn event_schemas(&self) -> BTreeMap<String, String> {
        self.schemas
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
