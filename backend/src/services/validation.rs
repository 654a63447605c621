//! Field validation for user payloads.
//!
//! Every rule runs independently and all failures are collected, so a client
//! gets the complete list of problems in one response.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{NewUser, UserFields};

/// Field name to human readable message, ordered by field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// `local@domain.tld` with a purely alphabetic tld of two or more letters.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Exactly ten ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}

/// `first_name` -> `First Name`.
fn field_label(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Check presence and format of the four user fields.
///
/// Returns an empty map when the payload is valid. A present email or phone
/// that fails its format check reports only the format error, even when the
/// value is empty.
pub fn validate(fields: &UserFields) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for (name, value) in fields.entries() {
        if value.map_or(true, str::is_empty) {
            errors.insert(name, format!("{} is required", field_label(name)));
        }
    }

    if let Some(email) = fields.email.as_deref() {
        if !is_valid_email(email) {
            errors.insert("email", "Invalid email format".to_owned());
        }
    }

    if let Some(phone) = fields.phone.as_deref() {
        if !is_valid_phone(phone) {
            errors.insert("phone", "Phone must be 10 digits".to_owned());
        }
    }

    errors
}

impl UserFields {
    /// Validate and turn the payload into a [`NewUser`].
    pub fn into_new_user(self) -> Result<NewUser, FieldErrors> {
        let errors = validate(&self);
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewUser {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
        })
    }
}
