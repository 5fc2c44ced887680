//! Client-side model validation.
//!
//! Each model type declares a static list of rules. A rule belongs to one
//! property but may depend on others (`responsible`), so changing any of
//! those re-runs it. Broken rules are tracked per property as error codes
//! that the UI translates.

use std::collections::BTreeMap;

/// A single validation rule of model `M`.
pub struct Validation<M> {
    /// Property the error is reported on.
    pub property: &'static str,
    /// Other properties whose change re-runs this rule.
    pub responsible: &'static [&'static str],
    pub error_code: &'static str,
    pub is_valid: fn(&M) -> bool,
}

impl<M> Validation<M> {
    fn concerns(&self, property: &str) -> bool {
        self.property == property || self.responsible.contains(&property)
    }
}

/// Error codes of currently broken rules, keyed by property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrokenValidations(BTreeMap<String, Vec<String>>);

impl BrokenValidations {
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// First error code reported on `property`.
    pub fn first(&self, property: &str) -> Option<&str> {
        self.0
            .get(property)
            .and_then(|codes| codes.first())
            .map(String::as_str)
    }

    pub fn codes(&self, property: &str) -> &[String] {
        self.0.get(property).map(Vec::as_slice).unwrap_or_default()
    }

    /// First error code of every broken property, in the shape the server
    /// reports them.
    pub fn first_errors(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .filter_map(|(property, codes)| Some((property.clone(), codes.first()?.clone())))
            .collect()
    }

    fn clear_property(&mut self, property: &str) {
        self.0.remove(property);
    }

    fn insert(&mut self, property: &str, code: &str) {
        let codes = self.0.entry(property.to_string()).or_default();
        if !codes.iter().any(|c| c == code) {
            codes.push(code.to_string());
        }
    }

    fn remove(&mut self, property: &str, code: &str) {
        if let Some(codes) = self.0.get_mut(property) {
            codes.retain(|c| c != code);
        }
    }
}

/// Validation behaviour shared by all models.
pub trait Validate: Sized + 'static {
    fn validations() -> &'static [Validation<Self>];

    fn broken_validations(&self) -> &BrokenValidations;

    fn broken_validations_mut(&mut self) -> &mut BrokenValidations;

    /// Re-run every rule. Returns whether the model is valid.
    fn validate(&mut self) -> bool {
        self.broken_validations_mut().clear();

        let mut valid = true;
        for rule in Self::validations() {
            if !(rule.is_valid)(self) {
                self.broken_validations_mut().insert(rule.property, rule.error_code);
                valid = false;
            }
        }
        valid
    }

    /// Re-run the rules owned by or depending on `property`.
    fn validate_property(&mut self, property: &str) {
        self.broken_validations_mut().clear_property(property);

        for rule in Self::validations().iter().filter(|r| r.concerns(property)) {
            if (rule.is_valid)(self) {
                self.broken_validations_mut().remove(rule.property, rule.error_code);
            } else {
                self.broken_validations_mut().insert(rule.property, rule.error_code);
            }
        }
    }

    /// Hook called by every setter after the field was written.
    fn property_changed(&mut self, property: &str) {
        self.validate_property(property);
    }

    fn validation_error(&self, property: &str) -> Option<&str> {
        self.broken_validations().first(property)
    }

    /// Record errors returned by the server, keyed by property.
    fn apply_server_validation_errors(&mut self, errors: &BTreeMap<String, String>) {
        for (property, code) in errors {
            self.broken_validations_mut().insert(property, code);
        }
    }
}

/// Shared "required" check for optional fields.
pub fn required<T>(value: &Option<T>) -> bool {
    value.is_some()
}

/// Shared "required" check for text fields.
pub fn required_text(value: &str) -> bool {
    !value.trim().is_empty()
}
