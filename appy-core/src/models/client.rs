use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::validation::{required_text, BrokenValidations, Validate, Validation};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
    id: i32,
    #[serde(default)]
    name: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(skip)]
    broken: BrokenValidations,
}

const VALIDATIONS: &[Validation<Client>] = &[
    Validation {
        property: "name",
        responsible: &[],
        error_code: "validations.REQUIRED",
        is_valid: |c| required_text(&c.name),
    },
    Validation {
        property: "email",
        responsible: &[],
        error_code: "validations.INVALID_EMAIL",
        is_valid: |c| c.email.as_deref().is_none_or(|e| e.is_empty() || e.contains('@')),
    },
];

impl Client {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Client {
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

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn set_phone(&mut self, phone: Option<String>) {
        self.phone = phone;
        self.property_changed("phone");
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn set_email(&mut self, email: Option<String>) {
        self.email = email;
        self.property_changed("email");
    }
}

impl Validate for Client {
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

impl Entity for Client {
    type Id = i32;

    fn id(&self) -> i32 {
        self.id
    }

    fn apply_update(&mut self, other: &Self) {
        self.name = other.name.clone();
        self.phone = other.phone.clone();
        self.email = other.email.clone();
    }

    fn apply_server_validation_errors(&mut self, errors: &BTreeMap<String, String>) {
        Validate::apply_server_validation_errors(self, errors);
    }
}
