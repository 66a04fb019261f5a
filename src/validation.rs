pub mod document;

use once_cell::sync::Lazy;
use regex::Regex;

pub use document::{clean_document, is_document_valid};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern must compile")
});

const MIN_PASSWORD_LEN: usize = 8;

/// A name is exactly two non-empty words separated by a single space.
pub fn is_name_valid(name: &str) -> bool {
    let mut parts = name.split(' ');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(first), Some(last), None) if !first.is_empty() && !last.is_empty()
    )
}

pub fn is_email_valid(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn is_password_valid(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
}
