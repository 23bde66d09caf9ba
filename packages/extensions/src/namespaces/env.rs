//! The `env` namespace: read and write external key-value entries.
//!
//! ```xml
//! <env:get name="HOME" location="home_dir"/>
//! <env:get name="PORT" location="port" default="8080"/>
//! <env:set name="MY_VAR" value="hello"/>
//! <env:set nameexpr="var_name" expr="server_port"/>
//! ```

use std::sync::Arc;

use tracing::field::Empty;

use crate::element::ElementHandle;
use crate::error::{ActionError, ErrorKind};
use crate::interpreter::Interpreter;
use crate::namespace::{loader, require_element, Dispatch, Namespace, NamespaceLoader};
use crate::resolve::{AttributeResolver, AttributeSpec};
use crate::store::{KeyValueStore, ProcessEnvironment};
use crate::value::Value;

/// Namespace URI of the `env` vocabulary.
pub const NAMESPACE_URI: &str = "urn:scxml-ext:env";

const LABEL: &str = "env";

const NAME: AttributeSpec<'static> = AttributeSpec::required("name").or_expr("nameexpr").trimmed();
const LOCATION: AttributeSpec<'static> = AttributeSpec::required("location").trimmed();
const DEFAULT: AttributeSpec<'static> = AttributeSpec::optional("default");
const VALUE: AttributeSpec<'static> = AttributeSpec::required("value").xor_expr("expr");

/// Loader backed by the process environment.
#[must_use]
pub fn loader_for_process() -> NamespaceLoader {
    loader_with_store(Arc::new(ProcessEnvironment))
}

/// Loader backed by an injected store.
#[must_use]
pub fn loader_with_store(store: Arc<dyn KeyValueStore>) -> NamespaceLoader {
    loader(move |itp, _doc| {
        Ok(Box::new(EnvNamespace {
            itp,
            store: Arc::clone(&store),
        }))
    })
}

/// The loaded `env` namespace.
pub struct EnvNamespace {
    itp: Arc<dyn Interpreter>,
    store: Arc<dyn KeyValueStore>,
}

impl Namespace for EnvNamespace {
    fn uri(&self) -> &str {
        NAMESPACE_URI
    }

    fn handle(&self, element: Option<&dyn ElementHandle>) -> Result<Dispatch, ActionError> {
        let (element, local) = require_element(LABEL, element)?;
        match local.as_str() {
            "get" => Ok(Dispatch::Handled(self.get(element))),
            "set" => Ok(Dispatch::Handled(self.set(element))),
            _ => Ok(Dispatch::Declined),
        }
    }
}

impl EnvNamespace {
    /// `<env:get>`: copy one store entry into the data model.
    fn get(&self, element: &dyn ElementHandle) -> Result<(), ActionError> {
        let span = tracing::info_span!(
            "env.get",
            env.name = Empty,
            env.exists = Empty,
            env.used_default = Empty
        );
        let _guard = span.enter();

        let resolver = AttributeResolver::new(element, self.itp.data_model(), "env:get");
        let dm = resolver.data_model()?;

        let name = required(resolver.resolve(&NAME)?);
        span.record("env.name", name.as_str());

        let location = required(
            resolver
                .resolve(&LOCATION)
                .map_err(|e| e.with_data("name", &name))?,
        );
        let default = resolver.resolve(&DEFAULT)?;

        let found = self.store.get(&name);
        span.record("env.exists", found.is_some());

        let value = match (found, default) {
            (Some(value), _) => value,
            (None, Some(default)) => {
                span.record("env.used_default", true);
                self.itp.log(
                    LABEL,
                    &format!("{name} is not set, using default '{default}'"),
                );
                default
            }
            (None, None) => String::new(),
        };

        dm.set_variable(&location, Value::String(value))
            .map_err(|err| {
                ActionError::new(
                    ErrorKind::Assignment,
                    "get",
                    "Failed to store environment variable",
                )
                .with_data("name", &name)
                .with_data("location", &location)
                .with_cause(err)
            })
    }

    /// `<env:set>`: write one store entry.
    fn set(&self, element: &dyn ElementHandle) -> Result<(), ActionError> {
        let span = tracing::info_span!("env.set", env.name = Empty, env.value = Empty);
        let _guard = span.enter();

        let resolver = AttributeResolver::new(element, self.itp.data_model(), "env:set");
        resolver.data_model()?;

        let name = required(resolver.resolve(&NAME)?);
        span.record("env.name", name.as_str());

        let value = required(
            resolver
                .resolve(&VALUE)
                .map_err(|e| e.with_data("name", &name))?,
        );

        self.store.set(&name, &value).map_err(|err| {
            ActionError::new(
                ErrorKind::ExternalEffect,
                "set",
                "Failed to set environment variable",
            )
            .with_data("name", &name)
            .with_data("value", &value)
            .with_cause(err)
        })?;

        span.record("env.value", value.as_str());
        Ok(())
    }
}

/// Required specs never resolve to `None`.
fn required(value: Option<String>) -> String {
    value.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::namespaces::testing::{document, RecordingInterpreter};
    use crate::store::MemoryStore;

    fn env_element(local: &str) -> Element {
        Element::new(format!("env:{local}")).in_namespace(NAMESPACE_URI)
    }

    fn load(itp: &Arc<RecordingInterpreter>, store: &Arc<MemoryStore>) -> Box<dyn Namespace> {
        let loader = loader_with_store(store.clone());
        let itp: Arc<dyn Interpreter> = itp.clone();
        loader(itp, document()).unwrap()
    }

    #[test]
    fn test_uri() {
        let itp = RecordingInterpreter::new();
        let ns = load(&itp, &Arc::new(MemoryStore::new()));
        assert_eq!(ns.uri(), "urn:scxml-ext:env");
        assert!(ns.unload().is_ok());
    }

    #[test]
    fn test_handle_nil_element() {
        let itp = RecordingInterpreter::new();
        let ns = load(&itp, &Arc::new(MemoryStore::new()));
        assert!(ns.handle(None).is_err());
    }

    #[test]
    fn test_handle_unknown_element() {
        let itp = RecordingInterpreter::new();
        let ns = load(&itp, &Arc::new(MemoryStore::new()));
        let dispatch = ns.handle(Some(&env_element("unset"))).unwrap();
        assert!(!dispatch.is_handled());
        let dispatch = ns.handle(Some(&Element::new("state"))).unwrap();
        assert!(!dispatch.is_handled());
    }

    #[test]
    fn test_get_existing() {
        let itp = RecordingInterpreter::new();
        let store = Arc::new(MemoryStore::with_entries([("HOME", "/home/agent")]));
        let ns = load(&itp, &store);

        let el = env_element("get")
            .with_attribute("name", "HOME")
            .with_attribute("location", "home_dir");
        ns.handle(Some(&el)).unwrap().into_result().unwrap();

        assert_eq!(itp.variable("home_dir"), Some(Value::from("/home/agent")));
    }

    #[test]
    fn test_get_case_insensitive() {
        let itp = RecordingInterpreter::new();
        let store = Arc::new(MemoryStore::with_entries([("HOME", "/root")]));
        let ns = load(&itp, &store);

        let el = env_element("GET")
            .with_attribute("name", "HOME")
            .with_attribute("location", "home");
        assert!(ns.handle(Some(&el)).unwrap().is_handled());
        assert_eq!(itp.variable("home"), Some(Value::from("/root")));
    }

    #[test]
    fn test_get_default_used() {
        let itp = RecordingInterpreter::new();
        let ns = load(&itp, &Arc::new(MemoryStore::new()));

        let el = env_element("get")
            .with_attribute("name", "PORT")
            .with_attribute("location", "port")
            .with_attribute("default", "8080");
        ns.handle(Some(&el)).unwrap().into_result().unwrap();

        assert_eq!(itp.variable("port"), Some(Value::from("8080")));
        assert!(itp
            .messages()
            .iter()
            .any(|m| m.contains("PORT is not set, using default '8080'")));
    }

    #[test]
    fn test_get_missing_without_default_is_empty() {
        let itp = RecordingInterpreter::new();
        let ns = load(&itp, &Arc::new(MemoryStore::new()));

        let el = env_element("get")
            .with_attribute("name", "PORT")
            .with_attribute("location", "port");
        ns.handle(Some(&el)).unwrap().into_result().unwrap();

        assert_eq!(itp.variable("port"), Some(Value::from("")));
        assert!(itp.messages().is_empty());
    }

    #[test]
    fn test_get_nameexpr() {
        let itp = RecordingInterpreter::new();
        itp.define("var_name", Value::from("TOKEN"));
        let store = Arc::new(MemoryStore::with_entries([("TOKEN", "abc")]));
        let ns = load(&itp, &store);

        let el = env_element("get")
            .with_attribute("nameexpr", "var_name")
            .with_attribute("location", "token");
        ns.handle(Some(&el)).unwrap().into_result().unwrap();
        assert_eq!(itp.variable("token"), Some(Value::from("abc")));
    }

    #[test]
    fn test_get_missing_location() {
        let itp = RecordingInterpreter::new();
        let ns = load(&itp, &Arc::new(MemoryStore::new()));

        let el = env_element("get").with_attribute("name", "HOME");
        let Dispatch::Handled(Err(err)) = ns.handle(Some(&el)).unwrap() else {
            panic!("expected a handled failure");
        };
        assert_eq!(err.kind, ErrorKind::MissingParameter);
        assert_eq!(err.to_string(), "env:get requires location attribute");
        assert_eq!(err.data_str("name"), Some("HOME"));
    }

    #[test]
    fn test_get_without_data_model() {
        let itp = RecordingInterpreter::without_data_model();
        let ns = load(&itp, &Arc::new(MemoryStore::new()));

        let el = env_element("get")
            .with_attribute("name", "HOME")
            .with_attribute("location", "home");
        let Dispatch::Handled(Err(err)) = ns.handle(Some(&el)).unwrap() else {
            panic!("expected a handled failure");
        };
        assert_eq!(err.kind, ErrorKind::MissingDataModel);
        assert_eq!(err.event_name, "error.execution");
    }

    #[test]
    fn test_set_value() {
        let itp = RecordingInterpreter::new();
        let store = Arc::new(MemoryStore::new());
        let ns = load(&itp, &store);

        let el = env_element("set")
            .with_attribute("name", "MY_VAR")
            .with_attribute("value", "hello");
        ns.handle(Some(&el)).unwrap().into_result().unwrap();
        assert_eq!(store.get("MY_VAR").as_deref(), Some("hello"));
    }

    #[test]
    fn test_set_expr_stringifies() {
        let itp = RecordingInterpreter::new();
        itp.define("server_port", Value::Int(9000));
        let store = Arc::new(MemoryStore::new());
        let ns = load(&itp, &store);

        let el = env_element("set")
            .with_attribute("name", "PORT")
            .with_attribute("expr", "server_port");
        ns.handle(Some(&el)).unwrap().into_result().unwrap();
        assert_eq!(store.get("PORT").as_deref(), Some("9000"));
    }

    #[test]
    fn test_set_conflict_performs_no_write() {
        let itp = RecordingInterpreter::new();
        itp.define("y", Value::from("from-expr"));
        let store = Arc::new(MemoryStore::new());
        let ns = load(&itp, &store);

        let el = env_element("set")
            .with_attribute("name", "X")
            .with_attribute("value", "x")
            .with_attribute("expr", "y");
        let Dispatch::Handled(Err(err)) = ns.handle(Some(&el)).unwrap() else {
            panic!("expected a handled failure");
        };
        assert_eq!(err.kind, ErrorKind::ConflictingParameters);
        assert_eq!(err.data_str("name"), Some("X"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_missing_value() {
        let itp = RecordingInterpreter::new();
        let store = Arc::new(MemoryStore::new());
        let ns = load(&itp, &store);

        let el = env_element("set").with_attribute("name", "X");
        let err = ns.handle(Some(&el)).unwrap().into_result().unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingParameter);
        assert_eq!(err.to_string(), "env:set requires value or expr attribute");
    }

    #[test]
    fn test_set_expr_empty_string_is_written() {
        let itp = RecordingInterpreter::new();
        itp.define("blank", Value::from(""));
        let store = Arc::new(MemoryStore::new());
        let ns = load(&itp, &store);

        let el = env_element("set")
            .with_attribute("name", "EMPTY")
            .with_attribute("expr", "blank");
        ns.handle(Some(&el)).unwrap().into_result().unwrap();
        assert_eq!(store.get("EMPTY").as_deref(), Some(""));
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> std::io::Result<()> {
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "store is read-only",
            ))
        }
    }

    #[test]
    fn test_set_store_failure_is_external_effect() {
        use std::error::Error as _;

        let itp = RecordingInterpreter::new();
        let dyn_itp: Arc<dyn Interpreter> = itp.clone();
        let ns = loader_with_store(Arc::new(ReadOnlyStore))(dyn_itp, document()).unwrap();

        let el = env_element("set")
            .with_attribute("name", "LOCKED")
            .with_attribute("value", "v");
        let err = ns.handle(Some(&el)).unwrap().into_result().unwrap_err();

        assert_eq!(err.kind, ErrorKind::ExternalEffect);
        assert_eq!(err.to_string(), "Failed to set environment variable");
        assert_eq!(err.data_str("name"), Some("LOCKED"));
        assert_eq!(err.data_str("value"), Some("v"));
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("store is read-only")
        );
    }

    #[test]
    fn test_set_then_get_roundtrip() {
        let itp = RecordingInterpreter::new();
        let store = Arc::new(MemoryStore::new());
        let ns = load(&itp, &store);

        let set = env_element("set")
            .with_attribute("name", "GREETING")
            .with_attribute("value", "hi there");
        let get = env_element("get")
            .with_attribute("name", "GREETING")
            .with_attribute("location", "greeting");
        ns.handle(Some(&set)).unwrap().into_result().unwrap();
        ns.handle(Some(&get)).unwrap().into_result().unwrap();

        assert_eq!(itp.variable("greeting"), Some(Value::from("hi there")));
    }
}
