//! Domain models over the case document.
//!
//! Each model owns one logical subtree and exposes its operations
//! through a capability trait; [`CaseModel`] composes the capabilities
//! into a single API surface for presentation code.

pub mod boundary;
pub mod fields;

pub use boundary::{BoundaryConditions, BoundaryConditionsModel, ConditionKind};
pub use fields::{
    DanglingReferenceError, FieldId, FieldProperties, FieldRegistry, FieldsModel, Phase,
};

use crate::{case::Case, vars::InvalidChoiceError};

/// The composed model a presentation layer talks to.
///
/// A `CaseModel` holds one model instance per capability, all over the
/// same shared [`Case`], and implements every capability trait by
/// delegation. It has no state of its own beyond those handles.
///
/// Construction never fails and performs zero document accesses: all
/// expensive or failing work is deferred to the first real accessor
/// call.
#[derive(Debug, Clone)]
pub struct CaseModel {
    fields: FieldsModel,
    boundaries: BoundaryConditionsModel,
}

impl CaseModel {
    /// Creates the composed model over the given case.
    #[must_use]
    pub fn new(case: &Case) -> Self {
        Self {
            fields: FieldsModel::new(case),
            boundaries: BoundaryConditionsModel::new(case),
        }
    }
}

impl FieldRegistry for CaseModel {
    fn add_field(&self, id: &FieldId, properties: &FieldProperties) -> bool {
        self.fields.add_field(id, properties)
    }

    fn field_ids(&self) -> Vec<FieldId> {
        self.fields.field_ids()
    }

    fn continuous_field_ids(&self) -> Vec<FieldId> {
        self.fields.continuous_field_ids()
    }

    fn properties(&self, id: &FieldId) -> Option<FieldProperties> {
        self.fields.properties(id)
    }

    fn label(&self, id: &FieldId) -> Option<String> {
        self.fields.label(id)
    }

    fn set_label(&self, id: &FieldId, label: &str) -> bool {
        self.fields.set_label(id, label)
    }

    fn carrier(&self, id: &FieldId) -> Option<FieldId> {
        self.fields.carrier(id)
    }

    fn remove_field(&self, id: &FieldId) -> Result<bool, DanglingReferenceError> {
        self.fields.remove_field(id)
    }
}

impl BoundaryConditions for CaseModel {
    fn condition_kind(&self, zone: &str, field: &FieldId) -> ConditionKind {
        self.boundaries.condition_kind(zone, field)
    }

    fn set_condition_kind(
        &self,
        zone: &str,
        field: &FieldId,
        kind: &str,
    ) -> Result<ConditionKind, InvalidChoiceError> {
        self.boundaries.set_condition_kind(zone, field, kind)
    }

    fn velocity(&self, zone: &str, field: &FieldId) -> f64 {
        self.boundaries.velocity(zone, field)
    }

    fn set_velocity(&self, zone: &str, field: &FieldId, velocity: f64) {
        self.boundaries.set_velocity(zone, field, velocity);
    }

    fn pressure(&self, zone: &str, field: &FieldId) -> f64 {
        self.boundaries.pressure(zone, field)
    }

    fn set_pressure(&self, zone: &str, field: &FieldId, pressure: f64) {
        self.boundaries.set_pressure(zone, field, pressure);
    }

    fn roughness(&self, zone: &str, field: &FieldId) -> f64 {
        self.boundaries.roughness(zone, field)
    }

    fn set_roughness(&self, zone: &str, field: &FieldId, roughness: f64) {
        self.boundaries.set_roughness(zone, field, roughness);
    }

    fn zone_labels(&self) -> Vec<String> {
        self.boundaries.zone_labels()
    }

    fn fields_on_zone(&self, zone: &str) -> Vec<FieldId> {
        self.boundaries.fields_on_zone(zone)
    }

    fn zones_referencing(&self, field: &FieldId) -> Vec<String> {
        self.boundaries.zones_referencing(field)
    }

    fn remove_condition(&self, zone: &str, field: &FieldId) -> bool {
        self.boundaries.remove_condition(zone, field)
    }

    fn remove_zone(&self, zone: &str) -> bool {
        self.boundaries.remove_zone(zone)
    }
}
