//! The `stdin` namespace: line-oriented input.
//!
//! ```xml
//! <stdin:read location="answer" prompt="Your name: "/>
//! <stdin:read dataid="line" promptexpr="question"/>
//! ```
//!
//! Each module owns one buffered reader for its whole lifetime. Re-creating
//! it per read would drop whatever was buffered past the consumed line.
//! Prompts go to a separate writer (stderr by default) so they never mix
//! with the result stream.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::field::Empty;

use crate::element::ElementHandle;
use crate::error::{ActionError, ErrorKind};
use crate::interpreter::Interpreter;
use crate::namespace::{loader, require_element, Dispatch, Namespace, NamespaceLoader};
use crate::resolve::{AttributeResolver, AttributeSpec};
use crate::value::Value;

/// Namespace URI of the `stdin` vocabulary.
pub const NAMESPACE_URI: &str = "urn:scxml-ext:stdin";

const LABEL: &str = "stdin";

const LOCATION: AttributeSpec<'static> =
    AttributeSpec::required("location").or_literal("dataid").trimmed();
const PROMPT: AttributeSpec<'static> = AttributeSpec::optional("prompt").xor_expr("promptexpr");

/// Opens the input stream for a new module.
pub type InputFactory = Arc<dyn Fn() -> Box<dyn BufRead + Send> + Send + Sync>;

/// Opens the prompt writer for a new module.
pub type PromptFactory = Arc<dyn Fn() -> Box<dyn Write + Send> + Send + Sync>;

/// Loader reading from the process stdin and prompting on stderr.
#[must_use]
pub fn loader_for_stdin() -> NamespaceLoader {
    loader_with_io(
        input_factory(|| BufReader::new(io::stdin())),
        prompt_factory(io::stderr),
    )
}

/// Loader over injected input and prompt streams.
#[must_use]
pub fn loader_with_io(input: InputFactory, prompt: PromptFactory) -> NamespaceLoader {
    loader(move |itp, _doc| {
        Ok(Box::new(StdinNamespace {
            itp,
            input: Mutex::new(input()),
            prompt: Mutex::new(prompt()),
        }))
    })
}

/// Box a reader constructor as an [`InputFactory`].
pub fn input_factory<R, F>(open: F) -> InputFactory
where
    R: BufRead + Send + 'static,
    F: Fn() -> R + Send + Sync + 'static,
{
    Arc::new(move || Box::new(open()) as Box<dyn BufRead + Send>)
}

/// Box a writer constructor as a [`PromptFactory`].
pub fn prompt_factory<W, F>(open: F) -> PromptFactory
where
    W: Write + Send + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    Arc::new(move || Box::new(open()) as Box<dyn Write + Send>)
}

/// The loaded `stdin` namespace.
pub struct StdinNamespace {
    itp: Arc<dyn Interpreter>,
    input: Mutex<Box<dyn BufRead + Send>>,
    prompt: Mutex<Box<dyn Write + Send>>,
}

impl Namespace for StdinNamespace {
    fn uri(&self) -> &str {
        NAMESPACE_URI
    }

    fn handle(&self, element: Option<&dyn ElementHandle>) -> Result<Dispatch, ActionError> {
        let (element, local) = require_element(LABEL, element)?;
        match local.as_str() {
            "read" => Ok(Dispatch::Handled(self.read(element))),
            _ => Ok(Dispatch::Declined),
        }
    }

    fn unload(&self) -> Result<(), ActionError> {
        self.prompt
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
            .map_err(|err| {
                ActionError::new(ErrorKind::ExternalEffect, "read", "Failed to flush prompt")
                    .with_cause(err)
            })
    }
}

impl StdinNamespace {
    /// `<stdin:read>`: consume one line into the data model.
    fn read(&self, element: &dyn ElementHandle) -> Result<(), ActionError> {
        let span = tracing::info_span!("stdin.read", stdin.location = Empty, stdin.eof = Empty);
        let _guard = span.enter();

        let resolver = AttributeResolver::new(element, self.itp.data_model(), "stdin:read");
        let dm = resolver.data_model()?;

        let location = resolver.resolve(&LOCATION)?.unwrap_or_default();
        span.record("stdin.location", location.as_str());

        if let Some(prompt) = resolver.resolve(&PROMPT)? {
            self.write_prompt(&prompt)
                .map_err(|e| e.with_data("location", &location))?;
        }

        let mut line = Vec::new();
        let read = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read_until(b'\n', &mut line)
            .map_err(|err| {
                ActionError::new(ErrorKind::ExternalEffect, "read", "Failed to read from stdin")
                    .with_data("location", &location)
                    .with_cause(err)
            })?;

        let value = if read == 0 {
            span.record("stdin.eof", true);
            Value::Null
        } else {
            span.record("stdin.eof", false);
            let trimmed = line.strip_suffix(b"\n").unwrap_or(&line);
            let trimmed = trimmed.strip_suffix(b"\r").unwrap_or(trimmed);
            Value::from(String::from_utf8_lossy(trimmed).into_owned())
        };

        dm.set_variable(&location, value).map_err(|err| {
            ActionError::new(ErrorKind::Assignment, "read", "Failed to store input line")
                .with_data("location", &location)
                .with_cause(err)
        })
    }

    fn write_prompt(&self, prompt: &str) -> Result<(), ActionError> {
        let mut out = self.prompt.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(prompt.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|err| {
                ActionError::new(ErrorKind::ExternalEffect, "read", "Failed to write prompt")
                    .with_data("prompt", prompt)
                    .with_cause(err)
            })
    }
}
