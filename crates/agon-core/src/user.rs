//! Internal user records.
//!
//! A user is nothing more than a stable id keyed by the email the identity
//! provider vouches for. Profiles live elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub user_id:    Uuid,
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

/// The authenticated acting principal for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
  pub user_id: Uuid,
  pub email:   String,
}

impl From<User> for Principal {
  fn from(u: User) -> Self {
    Self {
      user_id: u.user_id,
      email:   u.email,
    }
  }
}
