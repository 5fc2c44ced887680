use std::collections::BTreeMap;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::validation::{required, required_text, BrokenValidations, Validate, Validation};

/// A bookable service offered by a facility (haircut, massage, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    id: i32,
    #[serde(default)]
    name: String,
    #[serde(default, with = "crate::models::duration_minutes")]
    duration: Option<TimeDelta>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    color_id: Option<i32>,
    #[serde(skip)]
    broken: BrokenValidations,
}

const VALIDATIONS: &[Validation<Service>] = &[
    Validation {
        property: "name",
        responsible: &[],
        error_code: "validations.REQUIRED",
        is_valid: |s| required_text(&s.name),
    },
    Validation {
        property: "duration",
        responsible: &[],
        error_code: "validations.REQUIRED",
        is_valid: |s| required(&s.duration),
    },
    Validation {
        property: "duration",
        responsible: &[],
        error_code: "pages.services.errors.DURATION_NOT_POSITIVE",
        is_valid: |s| s.duration.is_none_or(|d| d > TimeDelta::zero()),
    },
    Validation {
        property: "price",
        responsible: &[],
        error_code: "pages.services.errors.NEGATIVE_PRICE",
        is_valid: |s| s.price.is_none_or(|p| p >= 0.0),
    },
];

impl Service {
    pub fn new(id: i32, name: impl Into<String>, duration: TimeDelta) -> Self {
        Service {
            id,
            name: name.into(),
            duration: Some(duration),
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

    pub fn duration(&self) -> Option<TimeDelta> {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Option<TimeDelta>) {
        self.duration = duration;
        self.property_changed("duration");
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn set_price(&mut self, price: Option<f64>) {
        self.price = price;
        self.property_changed("price");
    }

    pub fn color_id(&self) -> Option<i32> {
        self.color_id
    }

    pub fn set_color_id(&mut self, color_id: Option<i32>) {
        self.color_id = color_id;
        self.property_changed("color_id");
    }
}

impl Validate for Service {
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

impl Entity for Service {
    type Id = i32;

    fn id(&self) -> i32 {
        self.id
    }

    fn apply_update(&mut self, other: &Self) {
        self.name = other.name.clone();
        self.duration = other.duration;
        self.price = other.price;
        self.color_id = other.color_id;
    }

    fn apply_server_validation_errors(&mut self, errors: &BTreeMap<String, String>) {
        Validate::apply_server_validation_errors(self, errors);
    }
}
