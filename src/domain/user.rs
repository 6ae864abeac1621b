//! User entity.

use serde::{Deserialize, Serialize};

use crate::domain::id::UserId;

/// A marketplace user.
///
/// Owned by the external store; the core only ever reads it. Credential
/// material (password hash, tokens) never crosses the store boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
