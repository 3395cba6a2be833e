//! Typed access to node attributes.
//!
//! This layer translates between raw [`Value`] attributes and the typed
//! values the domain models work with. Two contracts here are load
//! bearing:
//!
//! - [`Document::get_or_init`] has insert-on-miss semantics: if the
//!   attribute is absent, or present but invalid for the requested type,
//!   the default is written into the document and returned. A read can
//!   therefore have a write side effect. The pure counterpart is
//!   [`Document::peek_var`].
//! - [`Document::set_choice`] validates against the declared choice set
//!   *before* mutating, so a rejected write leaves the prior value (or
//!   absence) intact.

use std::fmt;

use crate::document::{Document, NodeId, Value};

/// A typed value that can be stored in, and recovered from, a node
/// attribute.
pub trait VarValue: Clone {
    /// Converts a stored attribute value into this type, if it is valid.
    fn from_value(value: &Value) -> Option<Self>;

    /// Converts this value into its stored representation.
    fn into_value(self) -> Value;
}

impl VarValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_real()
    }

    fn into_value(self) -> Value {
        Value::Real(self)
    }
}

impl VarValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl VarValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl VarValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(ToString::to_string)
    }

    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl VarValue for Vec<f64> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_list()?.iter().map(Value::as_real).collect()
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(Value::Real).collect())
    }
}

/// An enumerated attribute with a closed set of string tags.
///
/// Implementors declare their full domain in [`Choice::CHOICES`]; the
/// accessor layer uses it to validate writes arriving as strings (for
/// example from a presentation layer) before they reach the document.
pub trait Choice: Copy + Sized + 'static {
    /// Every member of the choice set, in declaration order.
    const CHOICES: &'static [Self];

    /// The stored string tag for this member.
    fn tag(self) -> &'static str;

    /// Resolves a stored tag back to a member of the choice set.
    #[must_use]
    fn from_tag(tag: &str) -> Option<Self> {
        Self::CHOICES.iter().copied().find(|choice| choice.tag() == tag)
    }
}

/// Error returned when a value outside an attribute's declared choice
/// set is written.
///
/// The write is rejected before any mutation; the attribute keeps its
/// prior value (or stays absent).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub struct InvalidChoiceError {
    /// The attribute that was being written.
    pub attr: String,
    /// The rejected value.
    pub value: String,
    /// The attribute's declared domain.
    pub choices: Vec<&'static str>,
}

impl InvalidChoiceError {
    /// Builds the error for a rejected write of `value` to `attr`,
    /// reporting `C`'s declared domain.
    #[must_use]
    pub fn new<C: Choice>(attr: &str, value: &str) -> Self {
        Self {
            attr: attr.to_string(),
            value: value.to_string(),
            choices: C::CHOICES.iter().copied().map(Choice::tag).collect(),
        }
    }
}

impl fmt::Display for InvalidChoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a valid value for attribute '{}' (expected one of: ",
            self.value, self.attr
        )?;
        for (i, choice) in self.choices.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            f.write_str(choice)?;
        }
        write!(f, ")")
    }
}

impl Document {
    /// Returns the typed value of an attribute, writing (and returning)
    /// `default` if the attribute is absent or invalid for `T`.
    ///
    /// After the first call, repeated calls with no intervening write are
    /// pure reads.
    ///
    /// # Panics
    ///
    /// Panics if `node` refers to a removed node.
    pub fn get_or_init<T: VarValue>(&mut self, node: NodeId, attr: &str, default: T) -> T {
        if let Some(value) = self.attr(node, attr).and_then(T::from_value) {
            return value;
        }
        self.set_attr(node, attr, default.clone().into_value());
        default
    }

    /// Returns the typed value of an attribute without any write side
    /// effect.
    ///
    /// Returns `None` if the attribute is absent or its stored value is
    /// not valid for `T`.
    ///
    /// # Panics
    ///
    /// Panics if `node` refers to a removed node.
    #[must_use]
    pub fn peek_var<T: VarValue>(&self, node: NodeId, attr: &str) -> Option<T> {
        self.attr(node, attr).and_then(T::from_value)
    }

    /// Overwrites an attribute with a typed value, dropping any previous
    /// value.
    ///
    /// # Panics
    ///
    /// Panics if `node` refers to a removed node.
    pub fn set_var<T: VarValue>(&mut self, node: NodeId, attr: &str, value: T) {
        self.set_attr(node, attr, value.into_value());
    }

    /// Returns the choice stored in an attribute, writing (and
    /// returning) `default` if the attribute is absent or holds a tag
    /// outside the choice set.
    ///
    /// # Panics
    ///
    /// Panics if `node` refers to a removed node.
    pub fn get_or_init_choice<C: Choice>(&mut self, node: NodeId, attr: &str, default: C) -> C {
        let stored = self
            .attr(node, attr)
            .and_then(Value::as_str)
            .and_then(C::from_tag);
        if let Some(choice) = stored {
            return choice;
        }
        self.set_attr(node, attr, default.tag());
        default
    }

    /// Returns the choice stored in an attribute without any write side
    /// effect.
    ///
    /// # Panics
    ///
    /// Panics if `node` refers to a removed node.
    #[must_use]
    pub fn peek_choice<C: Choice>(&self, node: NodeId, attr: &str) -> Option<C> {
        self.attr(node, attr)
            .and_then(Value::as_str)
            .and_then(C::from_tag)
    }

    /// Writes a statically-valid member of a choice set.
    ///
    /// # Panics
    ///
    /// Panics if `node` refers to a removed node.
    pub fn write_choice<C: Choice>(&mut self, node: NodeId, attr: &str, choice: C) {
        self.set_attr(node, attr, choice.tag());
    }

    /// Validates `tag` against `C`'s choice set and writes it.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidChoiceError`] if `tag` is outside the declared
    /// domain. The document is not touched in that case.
    ///
    /// # Panics
    ///
    /// Panics if `node` refers to a removed node.
    pub fn set_choice<C: Choice>(
        &mut self,
        node: NodeId,
        attr: &str,
        tag: &str,
    ) -> Result<C, InvalidChoiceError> {
        let Some(choice) = C::from_tag(tag) else {
            return Err(InvalidChoiceError::new::<C>(attr, tag));
        };
        self.set_attr(node, attr, choice.tag());
        Ok(choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Regime {
        Laminar,
        Turbulent,
    }

    impl Choice for Regime {
        const CHOICES: &'static [Self] = &[Self::Laminar, Self::Turbulent];

        fn tag(self) -> &'static str {
            match self {
                Self::Laminar => "laminar",
                Self::Turbulent => "turbulent",
            }
        }
    }

    fn document_with_node() -> (Document, NodeId) {
        let mut document = Document::new();
        let node = document.ensure_path(&"models/regime".parse().unwrap());
        (document, node)
    }

    #[test]
    fn get_or_init_writes_the_default_once() {
        let (mut document, node) = document_with_node();

        assert_eq!(document.peek_var::<f64>(node, "velocity"), None);
        assert_eq!(document.get_or_init(node, "velocity", 1.5), 1.5);

        // The default is now stored; a second call is a pure read.
        let snapshot = document.clone();
        assert_eq!(document.get_or_init(node, "velocity", 9.9), 1.5);
        assert_eq!(document, snapshot);
    }

    #[test]
    fn get_or_init_replaces_invalid_stored_values() {
        let (mut document, node) = document_with_node();
        document.set_attr(node, "velocity", "fast");

        assert_eq!(document.get_or_init(node, "velocity", 2.0), 2.0);
        assert_eq!(document.peek_var::<f64>(node, "velocity"), Some(2.0));
    }

    #[test]
    fn set_var_overwrites_unconditionally() {
        let (mut document, node) = document_with_node();
        document.set_var(node, "velocity", 1.0);
        document.set_var(node, "velocity", 2.0);
        assert_eq!(document.peek_var::<f64>(node, "velocity"), Some(2.0));
    }

    #[test]
    fn set_choice_rejects_unknown_tags_without_mutating() {
        let (mut document, node) = document_with_node();
        document.write_choice(node, "regime", Regime::Laminar);

        let error = document
            .set_choice::<Regime>(node, "regime", "transsonic")
            .unwrap_err();
        assert_eq!(error.attr, "regime");
        assert_eq!(error.value, "transsonic");
        assert_eq!(error.choices, vec!["laminar", "turbulent"]);

        // Prior value intact.
        assert_eq!(
            document.peek_choice::<Regime>(node, "regime"),
            Some(Regime::Laminar)
        );
    }

    #[test]
    fn set_choice_rejection_leaves_absent_attributes_absent() {
        let (mut document, node) = document_with_node();
        assert!(document.set_choice::<Regime>(node, "regime", "bogus").is_err());
        assert_eq!(document.attr(node, "regime"), None);
    }

    #[test]
    fn set_choice_accepts_valid_tags() {
        let (mut document, node) = document_with_node();
        let choice = document
            .set_choice::<Regime>(node, "regime", "turbulent")
            .unwrap();
        assert_eq!(choice, Regime::Turbulent);
        assert_eq!(
            document.peek_choice::<Regime>(node, "regime"),
            Some(Regime::Turbulent)
        );
    }

    #[test]
    fn get_or_init_choice_defaults_on_invalid_tag() {
        let (mut document, node) = document_with_node();
        document.set_attr(node, "regime", "unknown");

        assert_eq!(
            document.get_or_init_choice(node, "regime", Regime::Laminar),
            Regime::Laminar
        );
        assert_eq!(
            document.peek_choice::<Regime>(node, "regime"),
            Some(Regime::Laminar)
        );
    }

    #[test]
    fn list_values_round_trip() {
        let (mut document, node) = document_with_node();
        document.set_var(node, "direction", vec![0.0, 0.0, -9.81]);
        assert_eq!(
            document.peek_var::<Vec<f64>>(node, "direction"),
            Some(vec![0.0, 0.0, -9.81])
        );
    }

    #[test]
    fn remove_attr_is_a_no_op_when_absent() {
        let (mut document, node) = document_with_node();
        document.set_var(node, "velocity", 1.0);
        assert!(document.remove_attr(node, "velocity"));
        assert!(!document.remove_attr(node, "velocity"));
        assert_eq!(document.peek_var::<f64>(node, "velocity"), None);
    }
}
