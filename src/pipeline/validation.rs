use crate::error::FieldErrors;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub property: String,
    pub message: String,
}

/// Every failure found while validating one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailures(Vec<ValidationFailure>);

impl ValidationFailures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, property: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationFailure {
            property: property.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Rule: value present and not blank
    pub fn not_empty(&mut self, property: &str, value: Option<&str>) -> bool {
        let ok = value.is_some_and(|v| !v.trim().is_empty());
        if !ok {
            self.add(property, format!("'{}' must not be empty.", property));
        }
        ok
    }

    /// Rule: at most `max` characters; absent values pass
    pub fn max_length(&mut self, property: &str, value: Option<&str>, max: usize) -> bool {
        let length = value.map(|v| v.chars().count()).unwrap_or(0);
        let ok = length <= max;
        if !ok {
            self.add(
                property,
                format!(
                    "The length of '{}' must be {} characters or fewer. You entered {} characters.",
                    property, max, length
                ),
            );
        }
        ok
    }

    /// Messages grouped by property, in the order they were found
    pub fn into_field_errors(self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for failure in self.0 {
            errors.entry(failure.property).or_default().push(failure.message);
        }
        errors
    }
}
