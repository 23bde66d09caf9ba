//! Host interfaces consumed by namespace modules.
//!
//! Namespaces never see a concrete interpreter: they receive an
//! `Arc<dyn Interpreter>` at load time and reach the data model through it.

use crate::element::ElementHandle;
use crate::error::{ActionError, BoxError};
use crate::value::Value;

/// Expression evaluation and variable storage.
pub trait DataModel: Send + Sync {
    /// Evaluate an expression attribute.
    ///
    /// # Errors
    /// Any failure of the expression engine; wrapped by the caller.
    fn evaluate_value(&self, expression: &str) -> Result<Value, BoxError>;

    /// Store a value at a location.
    ///
    /// # Errors
    /// The location is invalid or not writable.
    fn set_variable(&self, location: &str, value: Value) -> Result<(), BoxError>;
}

/// The interpreter a namespace module is loaded into.
pub trait Interpreter: Send + Sync {
    /// Emit a diagnostic line under a label (usually the namespace name).
    fn log(&self, label: &str, message: &str);

    /// The active data model, if the document binds one.
    fn data_model(&self) -> Option<&dyn DataModel>;

    /// Execute an element through the interpreter's generic entry point.
    ///
    /// # Errors
    /// Whatever the element's handler reports.
    fn execute_element(&self, element: &dyn ElementHandle) -> Result<(), ActionError>;
}
