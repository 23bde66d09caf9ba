//! SCXML extensions - pluggable action namespaces for a markup-driven
//! state-machine interpreter.
//!
//! An interpreter hands elements it does not own to namespace modules keyed
//! by URI. Each module routes on the element's local name, resolves literal
//! or expression attributes against the data model, performs its effect and
//! reports a uniform [`ActionError`] on failure.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use scxml_extensions::host::Host;
//! use scxml_extensions::namespaces::env;
//! use scxml_extensions::store::MemoryStore;
//! use scxml_extensions::value::Value;
//! use scxml_extensions::xml::parse_document;
//! use scxml_extensions::NamespaceRegistry;
//!
//! let xml = r#"<scxml xmlns:env="urn:scxml-ext:env">
//!   <env:get name="PORT" location="port" default="8080"/>
//! </scxml>"#;
//!
//! let mut registry = NamespaceRegistry::new();
//! let store = Arc::new(MemoryStore::new());
//! registry.register(env::NAMESPACE_URI, env::loader_with_store(store)).unwrap();
//!
//! let host = Host::new(Arc::new(registry), Arc::new(parse_document(xml).unwrap()));
//! host.run().unwrap();
//! host.teardown().unwrap();
//! assert_eq!(host.data_model_snapshot().get("port"), Some(&Value::from("8080")));
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration constants and validation
//! - [`error`]: [`ActionError`], [`ExtensionError`] and the Result alias
//! - [`value`]: Dynamic values exchanged with the data model
//! - [`element`]: Element view consumed by namespaces
//! - [`xml`]: XML loading
//! - [`interpreter`]: Host interfaces (interpreter, data model)
//! - [`namespace`]: The namespace module contract
//! - [`registry`]: URI to loader registry and per-interpreter sessions
//! - [`resolve`]: Literal vs expression attribute resolution
//! - [`store`]: Key-value stores for the `env` namespace
//! - [`namespaces`]: Built-in `env`, `stdin` and `agent` modules
//! - [`datamodel`]: In-memory data model
//! - [`host`]: Reference host
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod datamodel;
pub mod element;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod namespace;
pub mod namespaces;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod value;
pub mod xml;

// Re-export commonly used items
pub use element::{Element, ElementHandle};
pub use error::{ActionError, ErrorKind, ExtensionError, Result};
pub use interpreter::{DataModel, Interpreter};
pub use namespace::{Dispatch, Namespace, NamespaceLoader};
pub use namespaces::{all_loaders, default_registry};
pub use registry::{NamespaceRegistry, NamespaceSession};
pub use value::Value;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
