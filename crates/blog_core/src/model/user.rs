//! User entity.

use crate::model::validation::{validate_email, validate_username, ValidationError};
use serde::{Deserialize, Serialize};

pub type UserId = i64;

/// Stored blog author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique across all users.
    pub username: String,
    /// Unique across all users.
    pub email: String,
}

/// Validated input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

impl NewUser {
    /// Trims and validates both fields.
    pub fn parse(username: &str, email: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            username: validate_username(username)?,
            email: validate_email(email)?,
        })
    }
}
