//! Address value object embedded in the employee aggregate.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{DomainError, DomainResult};
use crate::value::{FieldValue, Snapshot};

static US_ZIP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("valid zip regex"));

static CA_POSTAL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]\d[A-Z] ?\d[A-Z]\d$").expect("valid postal regex"));

static GENERIC_POSTAL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{3,10}$").expect("valid postal regex"));

/// Postal address.
///
/// Either every field is empty (no address) or every field is filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// Build a validated address from raw input, trimming surrounding whitespace.
    pub fn new(
        street: &str,
        city: &str,
        state: &str,
        postal_code: &str,
        country: &str,
    ) -> DomainResult<Self> {
        let address = Self {
            street: street.trim().to_string(),
            city: city.trim().to_string(),
            state: state.trim().to_string(),
            postal_code: postal_code.trim().to_string(),
            country: country.trim().to_string(),
        };
        address.validate()?;
        Ok(address)
    }

    pub fn is_empty(&self) -> bool {
        self.street.is_empty()
            && self.city.is_empty()
            && self.state.is_empty()
            && self.postal_code.is_empty()
            && self.country.is_empty()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Ok(());
        }

        let required = [
            (&self.street, "street"),
            (&self.city, "city"),
            (&self.state, "state"),
            (&self.postal_code, "postal code"),
            (&self.country, "country"),
        ];
        for (value, field) in required {
            if value.is_empty() {
                return Err(DomainError::validation(format!(
                    "{field} is required when other address fields are provided"
                )));
            }
        }

        check_bounds(&self.street, "street", MIN_STREET_LENGTH, MAX_STREET_LENGTH)?;
        check_bounds(&self.city, "city", MIN_CITY_LENGTH, MAX_CITY_LENGTH)?;
        check_bounds(&self.state, "state", MIN_STATE_LENGTH, MAX_STATE_LENGTH)?;
        validate_postal_code(&self.postal_code)?;
        check_bounds(&self.country, "country", MIN_COUNTRY_LENGTH, MAX_COUNTRY_LENGTH)?;

        Ok(())
    }

    /// Multi-line mailing format; empty for an empty address.
    pub fn format(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let city_line = format!("{}, {} {}", self.city, self.state, self.postal_code);
        [self.street.as_str(), city_line.trim(), self.country.as_str()].join("\n")
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from([
            ("street".to_string(), FieldValue::from(self.street.as_str())),
            ("city".to_string(), FieldValue::from(self.city.as_str())),
            ("state".to_string(), FieldValue::from(self.state.as_str())),
            ("postalCode".to_string(), FieldValue::from(self.postal_code.as_str())),
            ("country".to_string(), FieldValue::from(self.country.as_str())),
        ])
    }
}

fn check_bounds(value: &str, field: &str, min: usize, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len < min {
        return Err(DomainError::validation(format!(
            "{field} must be at least {min} characters long"
        )));
    }
    if len > max {
        return Err(DomainError::validation(format!(
            "{field} cannot exceed {max} characters"
        )));
    }
    Ok(())
}

/// Accepts US ZIP, Canadian postal codes, or a generic 3-10 alphanumeric code.
fn validate_postal_code(postal_code: &str) -> DomainResult<()> {
    let normalized = postal_code.replace(' ', "").to_uppercase();
    if US_ZIP_REGEX.is_match(postal_code)
        || CA_POSTAL_REGEX.is_match(postal_code)
        || GENERIC_POSTAL_REGEX.is_match(&normalized)
    {
        Ok(())
    } else {
        Err(DomainError::validation(
            "invalid postal code: postal code format is invalid",
        ))
    }
}
