//! Recording interpreter shared by the namespace unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::element::{Element, ElementHandle};
use crate::error::{ActionError, BoxError, ErrorKind};
use crate::interpreter::{DataModel, Interpreter};
use crate::value::Value;
use crate::xml::Document;

/// Interpreter double that records logs, variables and executed children.
pub struct RecordingInterpreter {
    has_data_model: bool,
    variables: Mutex<BTreeMap<String, Value>>,
    logs: Mutex<Vec<(String, String)>>,
    executed: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingInterpreter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(true))
    }

    pub fn without_data_model() -> Arc<Self> {
        Arc::new(Self::build(false))
    }

    fn build(has_data_model: bool) -> Self {
        Self {
            has_data_model,
            variables: Mutex::new(BTreeMap::new()),
            logs: Mutex::new(Vec::new()),
            executed: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn define(&self, name: &str, value: Value) {
        self.variables
            .lock()
            .unwrap()
            .insert(name.to_string(), value);
    }

    pub fn variable(&self, name: &str) -> Option<Value> {
        self.variables.lock().unwrap().get(name).cloned()
    }

    pub fn messages(&self) -> Vec<String> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .map(|(l, _)| l.clone())
            .collect()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// Make `execute_element` fail for children with this tag name.
    pub fn fail_on(&self, tag_name: &str) {
        self.failing.lock().unwrap().insert(tag_name.to_string());
    }
}

impl DataModel for RecordingInterpreter {
    fn evaluate_value(&self, expression: &str) -> Result<Value, BoxError> {
        self.variable(expression)
            .ok_or_else(|| format!("{expression} is not defined").into())
    }

    fn set_variable(&self, location: &str, value: Value) -> Result<(), BoxError> {
        self.define(location, value);
        Ok(())
    }
}

impl Interpreter for RecordingInterpreter {
    fn log(&self, label: &str, message: &str) {
        self.logs
            .lock()
            .unwrap()
            .push((label.to_string(), message.to_string()));
    }

    fn data_model(&self) -> Option<&dyn DataModel> {
        if self.has_data_model {
            Some(self)
        } else {
            None
        }
    }

    fn execute_element(&self, element: &dyn ElementHandle) -> Result<(), ActionError> {
        let tag = element.tag_name().to_string();
        if self.failing.lock().unwrap().contains(&tag) {
            return Err(ActionError::new(
                ErrorKind::Evaluation,
                element.local_name(),
                format!("{tag} failed"),
            ));
        }
        self.executed.lock().unwrap().push(tag);
        Ok(())
    }
}

pub fn document() -> Arc<Document> {
    Arc::new(Document::new(Element::new("scxml")))
}
