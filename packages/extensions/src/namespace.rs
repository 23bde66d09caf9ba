//! The namespace module contract.
//!
//! A namespace owns one URI and handles the elements of that vocabulary.
//! `handle` reports one of three outcomes:
//!
//! | Return                         | Meaning                                        |
//! |--------------------------------|------------------------------------------------|
//! | `Ok(Dispatch::Declined)`       | not mine, continue default processing          |
//! | `Ok(Dispatch::Handled(result))`| mine; `result` is the action outcome           |
//! | `Err(error)`                   | could not inspect the element (none supplied)  |

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::element::ElementHandle;
use crate::error::{ActionError, ErrorKind, Result};
use crate::interpreter::Interpreter;
use crate::xml::Document;

/// Outcome of offering an element to a namespace.
#[derive(Debug)]
#[must_use]
pub enum Dispatch {
    /// The namespace does not own this element.
    Declined,
    /// The namespace owns this element; carries the action result.
    Handled(std::result::Result<(), ActionError>),
}

impl Dispatch {
    /// Whether the namespace claimed the element.
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }

    /// The action result, treating `Declined` as success.
    ///
    /// # Errors
    /// The action's failure, if it was handled and failed.
    pub fn into_result(self) -> std::result::Result<(), ActionError> {
        match self {
            Self::Declined => Ok(()),
            Self::Handled(result) => result,
        }
    }
}

/// A loaded extension vocabulary.
///
/// Modules are owned by one interpreter session. `handle` takes `&self` so an
/// action may re-enter the interpreter (the `agent` root executes its
/// children); state that survives between calls sits behind a lock.
pub trait Namespace: Send + Sync {
    /// The namespace URI this module owns.
    fn uri(&self) -> &str;

    /// Offer an element to the module.
    ///
    /// # Errors
    /// `InvalidElement` when `element` is `None`.
    fn handle(
        &self,
        element: Option<&dyn ElementHandle>,
    ) -> std::result::Result<Dispatch, ActionError>;

    /// Whether elements outside any namespace are offered to this module.
    ///
    /// Off by default, so a module never claims a bare `<set>` or `<read>`
    /// that happens to share a local name with its own vocabulary.
    fn accepts_unqualified(&self) -> bool {
        false
    }

    /// Event payload schemas recorded by this module, keyed by event name.
    fn event_schemas(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Release module resources. Called exactly once at session teardown.
    ///
    /// # Errors
    /// Resource cleanup failures.
    fn unload(&self) -> std::result::Result<(), ActionError> {
        Ok(())
    }
}

/// Factory building a namespace module for one interpreter session.
pub type NamespaceLoader =
    Arc<dyn Fn(Arc<dyn Interpreter>, Arc<Document>) -> Result<Box<dyn Namespace>> + Send + Sync>;

/// Wrap a closure as a [`NamespaceLoader`].
///
/// The bound lets the closure's argument types be inferred.
pub fn loader<F>(factory: F) -> NamespaceLoader
where
    F: Fn(Arc<dyn Interpreter>, Arc<Document>) -> Result<Box<dyn Namespace>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(factory)
}

/// Unwrap the element argument of `handle`, or report `InvalidElement`.
///
/// Returns the element together with its lower-cased local name, which is
/// what modules route on.
///
/// # Errors
/// `InvalidElement` when no element was supplied.
pub fn require_element<'a>(
    label: &str,
    element: Option<&'a dyn ElementHandle>,
) -> std::result::Result<(&'a dyn ElementHandle, String), ActionError> {
    let element = element.ok_or_else(|| {
        ActionError::new(
            ErrorKind::InvalidElement,
            "",
            format!("{label}: element cannot be nil"),
        )
        .with_data("namespace", label)
    })?;
    Ok((element, element.local_name().to_lowercase()))
}
