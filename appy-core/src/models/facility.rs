use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::validation::{required_text, BrokenValidations, Validate, Validation};

/// A tenant: the business whose calendar is being booked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    id: i32,
    #[serde(default)]
    name: String,
    #[serde(skip)]
    broken: BrokenValidations,
}

const VALIDATIONS: &[Validation<Facility>] = &[Validation {
    property: "name",
    responsible: &[],
    error_code: "validations.REQUIRED",
    is_valid: |f| required_text(&f.name),
}];

impl Facility {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Facility {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.property_changed("name");
    }
}

impl Validate for Facility {
    fn validations() -> &'static [Validation<Self>] {
        VALIDATIONS
    }

    fn broken_validations(&self) -> &BrokenValidations {
        &self.broken
    }

    fn broken_validations_mut(&mut self) -> &mut BrokenValidations {
        &mut self.broken
    }
}

impl Entity for Facility {
    type Id = i32;

    fn id(&self) -> i32 {
        self.id
    }

    fn apply_update(&mut self, other: &Self) {
        self.name = other.name.clone();
    }

    fn apply_server_validation_errors(&mut self, errors: &BTreeMap<String, String>) {
        Validate::apply_server_validation_errors(self, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_required() {
        let mut facility = Facility::new(1, "Salon");
        facility.set_name("  ");

        assert_eq!(facility.validation_error("name"), Some("validations.REQUIRED"));
    }

    #[test]
    fn deserializes_without_bookkeeping() {
        let facility: Facility = serde_json::from_str(r#"{"id": 4, "name": "Salon"}"#).unwrap();

        assert_eq!(facility, Facility::new(4, "Salon"));
    }
}
