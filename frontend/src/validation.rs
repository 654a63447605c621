//! Client-side copy of the server's field rules, so obvious mistakes are
//! caught before a round trip. The server stays authoritative.

use std::sync::OnceLock;

use regex::Regex;

use crate::api::{FieldErrors, UserDraft};

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {}", error))
    })
}

fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}

pub fn validate(draft: &UserDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let fields = [
        ("first_name", "First Name", &draft.first_name),
        ("last_name", "Last Name", &draft.last_name),
        ("email", "Email", &draft.email),
        ("phone", "Phone", &draft.phone),
    ];
    for (name, label, value) in fields {
        if value.is_empty() {
            errors.insert(name.to_string(), format!("{} is required", label));
        }
    }

    if !is_valid_email(&draft.email) {
        errors.insert("email".to_string(), "Invalid email format".to_string());
    }

    if !is_valid_phone(&draft.phone) {
        errors.insert("phone".to_string(), "Phone must be 10 digits".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(email: &str, phone: &str) -> UserDraft {
        UserDraft {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        }
    }

    #[test]
    fn well_formed_draft_passes() {
        assert!(validate(&draft("john@example.com", "1234567890")).is_empty());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let errors = validate(&draft("missing@domain", "1234567890"));
        assert_eq!(errors.get("email").map(String::as_str), Some("Invalid email format"));
    }

    #[test]
    fn short_phone_is_rejected() {
        let errors = validate(&draft("john@example.com", "12345"));
        assert_eq!(errors.get("phone").map(String::as_str), Some("Phone must be 10 digits"));
    }
}
