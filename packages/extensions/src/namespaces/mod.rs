//! Built-in namespace modules.
//!
//! | URI                   | Elements        | Module          |
//! |-----------------------|-----------------|-----------------|
//! | `urn:scxml-ext:env`   | `get`, `set`    | [`env`]         |
//! | `urn:scxml-ext:stdin` | `read`          | [`stdin`]       |
//! | `urn:scxml-ext:agent` | `agent`         | [`agent`]       |

pub mod agent;
pub mod env;
pub mod stdin;

#[cfg(test)]
mod testing;

use crate::error::Result;
use crate::namespace::NamespaceLoader;
use crate::registry::NamespaceRegistry;

/// Every built-in namespace with its production loader.
///
/// `env` uses the process environment, `stdin` the process standard streams.
#[must_use]
pub fn all_loaders() -> Vec<(String, NamespaceLoader)> {
    vec![
        (agent::NAMESPACE_URI.to_string(), agent::loader_for_agent()),
        (env::NAMESPACE_URI.to_string(), env::loader_for_process()),
        (stdin::NAMESPACE_URI.to_string(), stdin::loader_for_stdin()),
    ]
}

/// A registry with every built-in namespace registered.
///
/// # Errors
/// Only if two built-ins share a URI.
pub fn default_registry() -> Result<NamespaceRegistry> {
    let mut registry = NamespaceRegistry::new();
    registry.register_all(all_loaders())?;
    Ok(registry)
}
