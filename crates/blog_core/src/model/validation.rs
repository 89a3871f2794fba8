//! Field validation for user-supplied blog input.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]{1,64}$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Input rejected before any storage access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    BlankField(&'static str),
    /// Username contains unsupported characters or is too long.
    InvalidUsername(String),
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::InvalidUsername(value) => write!(f, "invalid username: `{value}`"),
            Self::InvalidEmail(value) => write!(f, "invalid email: `{value}`"),
        }
    }
}

impl Error for ValidationError {}

/// Trims `value` and rejects it when nothing remains.
pub fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(trimmed.to_string())
}

pub fn validate_username(value: &str) -> Result<String, ValidationError> {
    let trimmed = require_text("username", value)?;
    if !USERNAME_RE.is_match(&trimmed) {
        return Err(ValidationError::InvalidUsername(trimmed));
    }
    Ok(trimmed)
}

pub fn validate_email(value: &str) -> Result<String, ValidationError> {
    let trimmed = require_text("email", value)?;
    if !EMAIL_RE.is_match(&trimmed) {
        return Err(ValidationError::InvalidEmail(trimmed));
    }
    Ok(trimmed)
}

/// Validates tag names and drops repeats, keeping first-seen order.
pub fn normalize_tag_names(names: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = require_text("tag name", name)?;
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    Ok(unique)
}
