//! Attribute resolution: literal values, expression fallbacks and conflicts.
//!
//! A logical parameter is spelled either as a literal attribute (`name`,
//! `value`) or as an expression attribute evaluated against the data model
//! (`nameexpr`, `expr`). Identifier-like parameters prefer the literal;
//! value-like parameters reject having both.
//!
//! Attributes that are present but empty count as absent. The element
//! interface can tell the two apart, but existing documents use `name=""`
//! to mean a missing attribute.

use crate::element::ElementHandle;
use crate::error::{ActionError, ErrorKind};
use crate::interpreter::DataModel;
use crate::value::Value;

/// How a literal attribute and its expression counterpart combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    /// The literal wins; the expression is only evaluated when it is absent.
    LiteralFirst,
    /// At most one of the two may be present.
    Exclusive,
}

/// Resolution request for one logical parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec<'a> {
    /// Literal attribute name.
    pub literal: &'a str,
    /// Alternative literal attribute, consulted when `literal` is absent.
    pub alias: Option<&'a str>,
    /// Expression attribute name.
    pub expr: Option<&'a str>,
    /// Whether absence is an error.
    pub required: bool,
    /// How literal and expression combine.
    pub precedence: Precedence,
    /// Trim surrounding whitespace (identifiers, locations).
    pub trim: bool,
}

impl<'a> AttributeSpec<'a> {
    /// A parameter that must resolve to a value.
    #[must_use]
    pub const fn required(literal: &'a str) -> Self {
        Self {
            literal,
            alias: None,
            expr: None,
            required: true,
            precedence: Precedence::LiteralFirst,
            trim: false,
        }
    }

    /// A parameter that may be absent.
    #[must_use]
    pub const fn optional(literal: &'a str) -> Self {
        Self {
            required: false,
            ..Self::required(literal)
        }
    }

    /// Fall back to an expression when the literal is absent.
    #[must_use]
    pub const fn or_expr(mut self, expr: &'a str) -> Self {
        self.expr = Some(expr);
        self.precedence = Precedence::LiteralFirst;
        self
    }

    /// Accept either the literal or the expression, never both.
    #[must_use]
    pub const fn xor_expr(mut self, expr: &'a str) -> Self {
        self.expr = Some(expr);
        self.precedence = Precedence::Exclusive;
        self
    }

    /// Accept a second literal spelling (`location` / `dataid`).
    #[must_use]
    pub const fn or_literal(mut self, alias: &'a str) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Trim whitespace from literal values and expression text.
    #[must_use]
    pub const fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }

    /// `name or nameexpr`, `location or dataid`, `value or expr`.
    fn describe(&self) -> String {
        let mut names = vec![self.literal];
        names.extend(self.alias);
        names.extend(self.expr);
        names.join(" or ")
    }
}

/// Resolves attributes of one element on behalf of one action.
pub struct AttributeResolver<'a> {
    element: &'a dyn ElementHandle,
    data_model: Option<&'a dyn DataModel>,
    action: &'a str,
}

impl<'a> AttributeResolver<'a> {
    /// Create a resolver. `action` is the qualified action name used in
    /// messages, e.g. `env:get`.
    #[must_use]
    pub fn new(
        element: &'a dyn ElementHandle,
        data_model: Option<&'a dyn DataModel>,
        action: &'a str,
    ) -> Self {
        Self {
            element,
            data_model,
            action,
        }
    }

    /// Local name of the element, as reported in diagnostics.
    #[must_use]
    pub fn element_name(&self) -> &str {
        self.element.local_name()
    }

    /// The data model, or a `MissingDataModel` error.
    ///
    /// # Errors
    /// The host has no data model bound.
    pub fn data_model(&self) -> Result<&'a dyn DataModel, ActionError> {
        self.data_model.ok_or_else(|| {
            let namespace = self.action.split(':').next().unwrap_or(self.action);
            ActionError::missing_data_model(namespace, self.element_name())
                .with_cause("no datamodel")
        })
    }

    /// Read a plain attribute; empty counts as absent.
    #[must_use]
    pub fn literal(&self, name: &str, trim: bool) -> Option<&'a str> {
        self.element
            .attribute(name)
            .map(|v| if trim { v.trim() } else { v })
            .filter(|v| !v.is_empty())
    }

    /// Evaluate an expression attribute against the data model.
    ///
    /// # Errors
    /// `MissingDataModel` without a data model, `Evaluation` when the data
    /// model rejects the expression.
    pub fn evaluate(&self, attribute: &str, expression: &str) -> Result<Value, ActionError> {
        let dm = self.data_model()?;
        dm.evaluate_value(expression).map_err(|err| {
            ActionError::new(
                ErrorKind::Evaluation,
                self.element_name(),
                format!("Failed to evaluate {attribute}"),
            )
            .with_data(attribute, expression)
            .with_cause(err)
        })
    }

    /// Resolve one logical parameter.
    ///
    /// Returns `Ok(None)` only for optional parameters that are absent.
    ///
    /// # Errors
    /// `ConflictingParameters` for an exclusive pair with both present,
    /// `MissingParameter` for an absent required parameter, and any
    /// evaluation failure.
    pub fn resolve(&self, spec: &AttributeSpec<'_>) -> Result<Option<String>, ActionError> {
        let literal = self
            .literal(spec.literal, spec.trim)
            .or_else(|| spec.alias.and_then(|alias| self.literal(alias, spec.trim)));
        let expr = spec
            .expr
            .and_then(|name| self.literal(name, spec.trim).map(|text| (name, text)));

        if spec.precedence == Precedence::Exclusive {
            if let (Some(value), Some((expr_name, text))) = (literal, expr) {
                return Err(ActionError::new(
                    ErrorKind::ConflictingParameters,
                    self.element_name(),
                    format!(
                        "{} cannot have both {} and {} attributes",
                        self.action, spec.literal, expr_name
                    ),
                )
                .with_data(spec.literal, value)
                .with_data(expr_name, text)
                .with_cause("conflicting attributes"));
            }
        }

        if let Some(value) = literal {
            return Ok(Some(value.to_string()));
        }

        if let Some((expr_name, text)) = expr {
            // Identifiers need content; an exclusive value may be "".
            let keep_empty = spec.precedence == Precedence::Exclusive && !spec.trim;
            let resolved = self
                .evaluate(expr_name, text)?
                .to_attribute_string()
                .map(|s| if spec.trim { s.trim().to_string() } else { s })
                .filter(|s| keep_empty || !s.is_empty());
            if resolved.is_some() {
                return Ok(resolved);
            }
        }

        if spec.required {
            return Err(ActionError::new(
                ErrorKind::MissingParameter,
                self.element_name(),
                format!("{} requires {} attribute", self.action, spec.describe()),
            )
            .with_cause(format!("missing {}", spec.literal)));
        }

        Ok(None)
    }
}
