//! Registration and lookup of physics fields.
//!
//! Fields live under the `fields` subtree as `field` nodes keyed by
//! their `id` attribute. Document child order is the authoritative field
//! order; it may encode solve or coupling order, so every listing
//! operation here preserves it.

use std::{fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;

use crate::{
    case::Case,
    document::{Document, NodeId, Value},
    model::boundary::{BoundaryConditions, BoundaryConditionsModel},
    vars::Choice,
};

pub(crate) const FIELDS: &str = "fields";
pub(crate) const FIELD: &str = "field";
const ID: &str = "id";
const LABEL: &str = "label";
const PHASE: &str = "phase";
const CARRIER: &str = "carrier";

/// A validated field identifier.
///
/// Identifiers start with an ASCII letter and continue with letters,
/// digits, or underscores. They are stable keys: boundary conditions and
/// carrier links refer to fields by identifier without owning them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(NonEmptyString);

impl FieldId {
    /// Creates a new `FieldId` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidIdError`] if the string is empty, does not start
    /// with an ASCII letter, or contains characters other than ASCII
    /// letters, digits, and underscores.
    pub fn new(s: String) -> Result<Self, InvalidIdError> {
        let non_empty = NonEmptyString::new(s.clone()).map_err(|_| InvalidIdError(s.clone()))?;

        let mut chars = s.chars();
        let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(InvalidIdError(s));
        }

        Ok(Self(non_empty))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for FieldId {
    type Error = InvalidIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for FieldId {
    type Error = InvalidIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl FromStr for FieldId {
    type Err = InvalidIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl AsRef<str> for FieldId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for FieldId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a string is not a valid field identifier.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error(
    "invalid field id '{0}': must start with a letter and contain only letters, digits, and \
     underscores"
)]
pub struct InvalidIdError(String);

/// The phase of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A continuous (carrier) phase.
    Continuous,
    /// A dispersed phase carried by a continuous field.
    Dispersed,
}

impl Choice for Phase {
    const CHOICES: &'static [Self] = &[Self::Continuous, Self::Dispersed];

    fn tag(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Dispersed => "dispersed",
        }
    }
}

/// The properties applied to a field when it is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProperties {
    /// Display label for the field.
    pub label: String,
    /// Phase of the field.
    pub phase: Phase,
    /// For dispersed fields, the continuous field carrying them.
    ///
    /// This is a non-owning reference: the carrier's lifecycle is
    /// managed by its own registration entry.
    pub carrier: Option<FieldId>,
}

impl FieldProperties {
    /// Properties for a continuous field.
    #[must_use]
    pub fn continuous(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            phase: Phase::Continuous,
            carrier: None,
        }
    }

    /// Properties for a dispersed field carried by `carrier`.
    #[must_use]
    pub fn dispersed(label: impl Into<String>, carrier: FieldId) -> Self {
        Self {
            label: label.into(),
            phase: Phase::Dispersed,
            carrier: Some(carrier),
        }
    }
}

/// Error returned when deleting a field that is still referenced.
///
/// The delete is aborted before any mutation; the registration entry
/// survives intact.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub struct DanglingReferenceError {
    /// The field that was being removed.
    pub field: FieldId,
    /// Human-readable descriptions of the remaining referrers.
    pub referrers: Vec<String>,
}

impl fmt::Display for DanglingReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}' is still referenced by: ", self.field)?;
        for (i, referrer) in self.referrers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            f.write_str(referrer)?;
        }
        Ok(())
    }
}

/// The field-registration capability.
///
/// One capability interface per model: a facade composes this with
/// other capabilities over one shared [`Case`].
pub trait FieldRegistry {
    /// Registers a field.
    ///
    /// Registration is idempotent: if a field with `id` already exists,
    /// the existing entry is kept unchanged and `properties` is ignored.
    /// Returns `true` if a new entry was created.
    fn add_field(&self, id: &FieldId, properties: &FieldProperties) -> bool;

    /// Returns all registered field identifiers in document order.
    ///
    /// Document order is the authoritative ordering guarantee; consumers
    /// presenting a field list must preserve it.
    fn field_ids(&self) -> Vec<FieldId>;

    /// Returns the identifiers of continuous fields, in document order.
    fn continuous_field_ids(&self) -> Vec<FieldId>;

    /// Returns the properties of a registered field.
    fn properties(&self, id: &FieldId) -> Option<FieldProperties>;

    /// Returns the display label of a registered field.
    fn label(&self, id: &FieldId) -> Option<String>;

    /// Replaces the display label of a registered field.
    ///
    /// Returns `false` if no field with `id` exists.
    fn set_label(&self, id: &FieldId, label: &str) -> bool;

    /// Returns the carrier of a dispersed field.
    fn carrier(&self, id: &FieldId) -> Option<FieldId>;

    /// Removes a field registration entry.
    ///
    /// Returns `Ok(false)` if no field with `id` exists.
    ///
    /// # Errors
    ///
    /// Returns [`DanglingReferenceError`] if the field is still
    /// referenced by a boundary condition or as another field's carrier.
    /// Nothing is deleted in that case.
    fn remove_field(&self, id: &FieldId) -> Result<bool, DanglingReferenceError>;
}

/// The field-registration model over the `fields` subtree.
#[derive(Debug, Clone)]
pub struct FieldsModel {
    case: Case,
}

impl FieldsModel {
    /// Creates a fields model over the given case.
    ///
    /// Construction is cheap and performs no document access.
    #[must_use]
    pub fn new(case: &Case) -> Self {
        Self { case: case.clone() }
    }
}

/// Finds the registration entry for `id`, without creating anything.
fn entry(document: &Document, id: &FieldId) -> Option<NodeId> {
    let fields = document.peek_child(document.root(), FIELDS)?;
    document.find_child_by_attr(fields, FIELD, ID, &Value::from(id.as_str()))
}

/// Parses the ids of `field` children of the `fields` subtree, in
/// document order, filtered by `keep`.
fn collect_ids(document: &Document, keep: impl Fn(&Document, NodeId) -> bool) -> Vec<FieldId> {
    let Some(fields) = document.peek_child(document.root(), FIELDS) else {
        return Vec::new();
    };
    document
        .children_named(fields, FIELD)
        .filter(|&node| keep(document, node))
        .filter_map(|node| {
            document
                .peek_var::<String>(node, ID)
                .and_then(|id| FieldId::new(id).ok())
        })
        .collect()
}

impl FieldRegistry for FieldsModel {
    fn add_field(&self, id: &FieldId, properties: &FieldProperties) -> bool {
        self.case.edit(|document| {
            let root = document.root();
            let fields = document.ensure_child(root, FIELDS);
            let existing =
                document.find_child_by_attr(fields, FIELD, ID, &Value::from(id.as_str()));
            if existing.is_some() {
                return false;
            }

            let node = document.append_child(fields, FIELD);
            document.set_attr(node, ID, id.as_str());
            document.set_attr(node, LABEL, properties.label.as_str());
            document.write_choice(node, PHASE, properties.phase);
            if let Some(carrier) = &properties.carrier {
                document.set_attr(node, CARRIER, carrier.as_str());
            }
            true
        })
    }

    fn field_ids(&self) -> Vec<FieldId> {
        self.case.read(|document| collect_ids(document, |_, _| true))
    }

    fn continuous_field_ids(&self) -> Vec<FieldId> {
        self.case.read(|document| {
            collect_ids(document, |document, node| {
                document.peek_choice(node, PHASE) == Some(Phase::Continuous)
            })
        })
    }

    fn properties(&self, id: &FieldId) -> Option<FieldProperties> {
        self.case.read(|document| {
            let node = entry(document, id)?;
            Some(FieldProperties {
                label: document.peek_var(node, LABEL).unwrap_or_default(),
                phase: document.peek_choice(node, PHASE).unwrap_or(Phase::Continuous),
                carrier: document
                    .peek_var::<String>(node, CARRIER)
                    .and_then(|carrier| FieldId::new(carrier).ok()),
            })
        })
    }

    fn label(&self, id: &FieldId) -> Option<String> {
        self.case
            .read(|document| entry(document, id).and_then(|node| document.peek_var(node, LABEL)))
    }

    fn set_label(&self, id: &FieldId, label: &str) -> bool {
        self.case.edit(|document| {
            entry(document, id).is_some_and(|node| {
                document.set_attr(node, LABEL, label);
                true
            })
        })
    }

    fn carrier(&self, id: &FieldId) -> Option<FieldId> {
        self.case.read(|document| {
            let node = entry(document, id)?;
            document
                .peek_var::<String>(node, CARRIER)
                .and_then(|carrier| FieldId::new(carrier).ok())
        })
    }

    fn remove_field(&self, id: &FieldId) -> Result<bool, DanglingReferenceError> {
        // Referential integrity is checked here, not by the document:
        // the store itself knows nothing about cross-subtree references.
        let mut referrers: Vec<String> = self
            .case
            .read(|document| {
                collect_ids(document, |document, node| {
                    document.peek_var::<String>(node, CARRIER).as_deref() == Some(id.as_str())
                })
            })
            .into_iter()
            .map(|dependent| format!("field '{dependent}' (carrier)"))
            .collect();

        let boundaries = BoundaryConditionsModel::new(&self.case);
        referrers.extend(
            boundaries
                .zones_referencing(id)
                .into_iter()
                .map(|zone| format!("boundary '{zone}'")),
        );

        if !referrers.is_empty() {
            return Err(DanglingReferenceError {
                field: id.clone(),
                referrers,
            });
        }

        Ok(self.case.edit(|document| {
            entry(document, id).is_some_and(|node| document.remove_node(node))
        }))
    }
}
