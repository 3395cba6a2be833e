//! Boundary conditions per (boundary zone, field) pair.
//!
//! Conditions live under the `boundary_conditions` subtree: one
//! `boundary` node per zone (keyed by its `label` attribute), with one
//! `condition` node per field (keyed by its `field` attribute). An entry
//! for a given pair is idempotently created; re-requesting it resolves
//! to the existing node rather than duplicating it.

use crate::{
    case::Case,
    document::{Document, NodeId, Value},
    model::fields::FieldId,
    vars::{Choice, InvalidChoiceError},
};

pub(crate) const BOUNDARIES: &str = "boundary_conditions";
pub(crate) const BOUNDARY: &str = "boundary";
pub(crate) const CONDITION: &str = "condition";
const LABEL: &str = "label";
const FIELD: &str = "field";
const KIND: &str = "kind";
const VELOCITY: &str = "velocity";
const PRESSURE: &str = "pressure";
const ROUGHNESS: &str = "roughness";

/// Default norm of the velocity prescribed on an inlet, in m/s.
pub const DEFAULT_VELOCITY: f64 = 0.0;
/// Default reference pressure prescribed on an outlet, in Pa.
pub const DEFAULT_PRESSURE: f64 = 101_325.0;
/// Default wall roughness height, in m.
pub const DEFAULT_ROUGHNESS: f64 = 0.0;

/// The type of a boundary condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    /// Prescribed-velocity inflow.
    Inlet,
    /// Prescribed-pressure outflow.
    Outlet,
    /// Solid wall.
    Wall,
    /// Symmetry plane.
    Symmetry,
}

impl ConditionKind {
    /// The kind assumed for a pair that has never been configured.
    pub const DEFAULT: Self = Self::Wall;
}

impl Choice for ConditionKind {
    const CHOICES: &'static [Self] = &[Self::Inlet, Self::Outlet, Self::Wall, Self::Symmetry];

    fn tag(self) -> &'static str {
        match self {
            Self::Inlet => "inlet",
            Self::Outlet => "outlet",
            Self::Wall => "wall",
            Self::Symmetry => "symmetry",
        }
    }
}

/// The boundary-condition capability.
///
/// One capability interface per model: a facade composes this with
/// other capabilities over one shared [`Case`].
pub trait BoundaryConditions {
    /// Returns the condition kind for a (zone, field) pair.
    ///
    /// The entry is created with [`ConditionKind::DEFAULT`] if the pair
    /// has never been configured (insert-on-miss).
    fn condition_kind(&self, zone: &str, field: &FieldId) -> ConditionKind;

    /// Sets the condition kind for a (zone, field) pair from a string
    /// tag.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidChoiceError`] if `kind` is not a valid condition
    /// kind. The document is not touched in that case — not even to
    /// create the entry.
    fn set_condition_kind(
        &self,
        zone: &str,
        field: &FieldId,
        kind: &str,
    ) -> Result<ConditionKind, InvalidChoiceError>;

    /// Returns the inlet velocity for a pair, initializing it to
    /// [`DEFAULT_VELOCITY`] if unset.
    fn velocity(&self, zone: &str, field: &FieldId) -> f64;

    /// Sets the inlet velocity for a pair.
    fn set_velocity(&self, zone: &str, field: &FieldId, velocity: f64);

    /// Returns the outlet pressure for a pair, initializing it to
    /// [`DEFAULT_PRESSURE`] if unset.
    fn pressure(&self, zone: &str, field: &FieldId) -> f64;

    /// Sets the outlet pressure for a pair.
    fn set_pressure(&self, zone: &str, field: &FieldId, pressure: f64);

    /// Returns the wall roughness for a pair, initializing it to
    /// [`DEFAULT_ROUGHNESS`] if unset.
    fn roughness(&self, zone: &str, field: &FieldId) -> f64;

    /// Sets the wall roughness for a pair.
    fn set_roughness(&self, zone: &str, field: &FieldId, roughness: f64);

    /// Returns the labels of all configured zones, in document order.
    fn zone_labels(&self) -> Vec<String>;

    /// Returns the fields with a condition on `zone`, in document order.
    fn fields_on_zone(&self, zone: &str) -> Vec<FieldId>;

    /// Returns the labels of zones holding a condition for `field`, in
    /// document order.
    fn zones_referencing(&self, field: &FieldId) -> Vec<String>;

    /// Returns `true` if any zone holds a condition for `field`.
    fn references_field(&self, field: &FieldId) -> bool {
        !self.zones_referencing(field).is_empty()
    }

    /// Removes the condition entry for a pair.
    ///
    /// Returns `false` if the pair was never configured.
    fn remove_condition(&self, zone: &str, field: &FieldId) -> bool;

    /// Removes a zone and every condition on it.
    ///
    /// Returns `false` if the zone was never configured.
    fn remove_zone(&self, zone: &str) -> bool;
}

/// The boundary-condition model over the `boundary_conditions` subtree.
#[derive(Debug, Clone)]
pub struct BoundaryConditionsModel {
    case: Case,
}

impl BoundaryConditionsModel {
    /// Creates a boundary-condition model over the given case.
    ///
    /// Construction is cheap and performs no document access.
    #[must_use]
    pub fn new(case: &Case) -> Self {
        Self { case: case.clone() }
    }
}

fn peek_zone(document: &Document, zone: &str) -> Option<NodeId> {
    let boundaries = document.peek_child(document.root(), BOUNDARIES)?;
    document.find_child_by_attr(boundaries, BOUNDARY, LABEL, &Value::from(zone))
}

fn peek_condition(document: &Document, zone: &str, field: &FieldId) -> Option<NodeId> {
    let zone_node = peek_zone(document, zone)?;
    document.find_child_by_attr(zone_node, CONDITION, FIELD, &Value::from(field.as_str()))
}

/// Resolves the condition entry for a pair, creating the zone and
/// condition nodes if absent. Idempotent: an existing entry is reused.
fn ensure_condition(document: &mut Document, zone: &str, field: &FieldId) -> NodeId {
    let root = document.root();
    let boundaries = document.ensure_child(root, BOUNDARIES);

    let zone_node = match document.find_child_by_attr(
        boundaries,
        BOUNDARY,
        LABEL,
        &Value::from(zone),
    ) {
        Some(node) => node,
        None => {
            let node = document.append_child(boundaries, BOUNDARY);
            document.set_attr(node, LABEL, zone);
            node
        }
    };

    match document.find_child_by_attr(zone_node, CONDITION, FIELD, &Value::from(field.as_str())) {
        Some(node) => node,
        None => {
            let node = document.append_child(zone_node, CONDITION);
            document.set_attr(node, FIELD, field.as_str());
            node
        }
    }
}

impl BoundaryConditionsModel {
    fn get_or_init_param(&self, zone: &str, field: &FieldId, attr: &str, default: f64) -> f64 {
        self.case.edit(|document| {
            let node = ensure_condition(document, zone, field);
            document.get_or_init(node, attr, default)
        })
    }

    fn set_param(&self, zone: &str, field: &FieldId, attr: &str, value: f64) {
        self.case.edit(|document| {
            let node = ensure_condition(document, zone, field);
            document.set_var(node, attr, value);
        });
    }
}

impl BoundaryConditions for BoundaryConditionsModel {
    fn condition_kind(&self, zone: &str, field: &FieldId) -> ConditionKind {
        self.case.edit(|document| {
            let node = ensure_condition(document, zone, field);
            document.get_or_init_choice(node, KIND, ConditionKind::DEFAULT)
        })
    }

    fn set_condition_kind(
        &self,
        zone: &str,
        field: &FieldId,
        kind: &str,
    ) -> Result<ConditionKind, InvalidChoiceError> {
        // Validate before touching the document, so a rejected write
        // does not vivify the entry as a side effect.
        let Some(kind) = ConditionKind::from_tag(kind) else {
            return Err(InvalidChoiceError::new::<ConditionKind>(KIND, kind));
        };
        self.case.edit(|document| {
            let node = ensure_condition(document, zone, field);
            document.write_choice(node, KIND, kind);
        });
        Ok(kind)
    }

    fn velocity(&self, zone: &str, field: &FieldId) -> f64 {
        self.get_or_init_param(zone, field, VELOCITY, DEFAULT_VELOCITY)
    }

    fn set_velocity(&self, zone: &str, field: &FieldId, velocity: f64) {
        self.set_param(zone, field, VELOCITY, velocity);
    }

    fn pressure(&self, zone: &str, field: &FieldId) -> f64 {
        self.get_or_init_param(zone, field, PRESSURE, DEFAULT_PRESSURE)
    }

    fn set_pressure(&self, zone: &str, field: &FieldId, pressure: f64) {
        self.set_param(zone, field, PRESSURE, pressure);
    }

    fn roughness(&self, zone: &str, field: &FieldId) -> f64 {
        self.get_or_init_param(zone, field, ROUGHNESS, DEFAULT_ROUGHNESS)
    }

    fn set_roughness(&self, zone: &str, field: &FieldId, roughness: f64) {
        self.set_param(zone, field, ROUGHNESS, roughness);
    }

    fn zone_labels(&self) -> Vec<String> {
        self.case.read(|document| {
            let Some(boundaries) = document.peek_child(document.root(), BOUNDARIES) else {
                return Vec::new();
            };
            document
                .children_named(boundaries, BOUNDARY)
                .filter_map(|zone| document.peek_var(zone, LABEL))
                .collect()
        })
    }

    fn fields_on_zone(&self, zone: &str) -> Vec<FieldId> {
        self.case.read(|document| {
            let Some(zone_node) = peek_zone(document, zone) else {
                return Vec::new();
            };
            document
                .children_named(zone_node, CONDITION)
                .filter_map(|condition| {
                    document
                        .peek_var::<String>(condition, FIELD)
                        .and_then(|field| FieldId::new(field).ok())
                })
                .collect()
        })
    }

    fn zones_referencing(&self, field: &FieldId) -> Vec<String> {
        self.case.read(|document| {
            let Some(boundaries) = document.peek_child(document.root(), BOUNDARIES) else {
                return Vec::new();
            };
            document
                .children_named(boundaries, BOUNDARY)
                .filter(|&zone| {
                    document
                        .find_child_by_attr(zone, CONDITION, FIELD, &Value::from(field.as_str()))
                        .is_some()
                })
                .filter_map(|zone| document.peek_var(zone, LABEL))
                .collect()
        })
    }

    fn remove_condition(&self, zone: &str, field: &FieldId) -> bool {
        self.case.edit(|document| {
            peek_condition(document, zone, field)
                .is_some_and(|node| document.remove_node(node))
        })
    }

    fn remove_zone(&self, zone: &str) -> bool {
        self.case.edit(|document| {
            peek_zone(document, zone).is_some_and(|node| document.remove_node(node))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> FieldId {
        FieldId::new(s.to_string()).unwrap()
    }

    fn model() -> BoundaryConditionsModel {
        BoundaryConditionsModel::new(&Case::new())
    }

    #[test]
    fn unconfigured_pairs_default_to_wall() {
        let boundaries = model();
        assert_eq!(
            boundaries.condition_kind("inlet_1", &id("water")),
            ConditionKind::Wall
        );
    }

    #[test]
    fn condition_entries_are_created_once_per_pair() {
        let case = Case::new();
        let boundaries = BoundaryConditionsModel::new(&case);

        let _ = boundaries.condition_kind("inlet_1", &id("water"));
        let nodes_after_first = case.read(crate::document::Document::node_count);

        // Re-requesting the pair, by any accessor, reuses the entry.
        let _ = boundaries.condition_kind("inlet_1", &id("water"));
        let _ = boundaries.velocity("inlet_1", &id("water"));
        assert_eq!(case.read(crate::document::Document::node_count), nodes_after_first);

        // A different field on the same zone gets its own entry.
        let _ = boundaries.condition_kind("inlet_1", &id("steam"));
        assert_eq!(
            boundaries.fields_on_zone("inlet_1"),
            vec![id("water"), id("steam")]
        );
    }

    #[test]
    fn set_condition_kind_validates_before_mutating() {
        let case = Case::new();
        let boundaries = BoundaryConditionsModel::new(&case);

        let error = boundaries
            .set_condition_kind("inlet_1", &id("water"), "porous")
            .unwrap_err();
        assert_eq!(error.attr, "kind");
        assert_eq!(error.value, "porous");

        // The rejected write did not vivify the entry.
        assert!(boundaries.zone_labels().is_empty());

        let kind = boundaries
            .set_condition_kind("inlet_1", &id("water"), "inlet")
            .unwrap();
        assert_eq!(kind, ConditionKind::Inlet);
        assert_eq!(
            boundaries.condition_kind("inlet_1", &id("water")),
            ConditionKind::Inlet
        );
    }

    #[test]
    fn rejected_kind_keeps_the_prior_value() {
        let boundaries = model();
        boundaries
            .set_condition_kind("outlet_1", &id("water"), "outlet")
            .unwrap();

        assert!(boundaries
            .set_condition_kind("outlet_1", &id("water"), "bogus")
            .is_err());
        assert_eq!(
            boundaries.condition_kind("outlet_1", &id("water")),
            ConditionKind::Outlet
        );
    }

    #[test]
    fn parameters_initialize_to_their_defaults() {
        let boundaries = model();
        assert!((boundaries.velocity("inlet_1", &id("water")) - DEFAULT_VELOCITY).abs() < f64::EPSILON);
        assert!(
            (boundaries.pressure("outlet_1", &id("water")) - DEFAULT_PRESSURE).abs()
                < f64::EPSILON
        );

        boundaries.set_velocity("inlet_1", &id("water"), 2.5);
        assert!((boundaries.velocity("inlet_1", &id("water")) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn zone_labels_follow_configuration_order() {
        let boundaries = model();
        for zone in ["inlet_1", "outlet_1", "walls"] {
            let _ = boundaries.condition_kind(zone, &id("water"));
        }
        assert_eq!(boundaries.zone_labels(), vec!["inlet_1", "outlet_1", "walls"]);
    }

    #[test]
    fn reference_queries_report_configured_zones() {
        let boundaries = model();
        let _ = boundaries.condition_kind("inlet_1", &id("water"));
        let _ = boundaries.condition_kind("outlet_1", &id("steam"));
        let _ = boundaries.condition_kind("walls", &id("water"));

        assert_eq!(
            boundaries.zones_referencing(&id("water")),
            vec!["inlet_1", "walls"]
        );
        assert!(boundaries.references_field(&id("steam")));
        assert!(!boundaries.references_field(&id("oil")));
    }

    #[test]
    fn remove_condition_and_zone() {
        let boundaries = model();
        let _ = boundaries.condition_kind("inlet_1", &id("water"));
        let _ = boundaries.condition_kind("inlet_1", &id("steam"));

        assert!(boundaries.remove_condition("inlet_1", &id("water")));
        assert!(!boundaries.remove_condition("inlet_1", &id("water")));
        assert_eq!(boundaries.fields_on_zone("inlet_1"), vec![id("steam")]);

        assert!(boundaries.remove_zone("inlet_1"));
        assert!(!boundaries.remove_zone("inlet_1"));
        assert!(boundaries.zone_labels().is_empty());
    }
}
