use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use tracing::{debug, error};
use uuid::Uuid;

use super::password::{hash_password, verify_password, PasswordHash};
use crate::{
    error::{ModelError, ModelResult},
    recipes::model::Recipe,
    validate,
};

pub(crate) const USERNAME_REQUIRED: &str = "Username must be provided.";
pub(crate) const PASSWORD_REQUIRED: &str = "Password must be provided.";

/// A user account. `id` and `created_at` are assigned by the store on insert.
///
/// The password hash is write-only from the outside: it is set through
/// [`User::set_password`], checked through [`User::authenticate`], and skipped
/// by serialization.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    id: Option<Uuid>,
    username: String,
    #[serde(skip)]
    password_hash: Option<PasswordHash>,
    pub image_url: Option<String>,
    pub bio: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
}

impl User {
    pub fn new(username: &str) -> ModelResult<Self> {
        let mut user = Self {
            id: None,
            username: String::new(),
            password_hash: None,
            image_url: None,
            bio: None,
            created_at: None,
        };
        user.set_username(username)?;
        Ok(user)
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn created_at(&self) -> Option<OffsetDateTime> {
        self.created_at
    }

    /// Trims and stores the username. Uniqueness is the store's job.
    pub fn set_username(&mut self, value: &str) -> ModelResult<()> {
        self.username = validate::required("username", value, USERNAME_REQUIRED)?;
        Ok(())
    }

    /// Hash `plain` with a fresh salt and replace any previous hash.
    /// The plaintext is not trimmed; only the empty string is refused.
    pub fn set_password(&mut self, plain: &str) -> ModelResult<()> {
        if plain.is_empty() {
            return Err(ModelError::validation("password", PASSWORD_REQUIRED));
        }
        self.password_hash = Some(hash_password(plain)?);
        debug!(username = %self.username, "password hash replaced");
        Ok(())
    }

    /// There is no readable password. Always fails.
    pub fn password(&self) -> ModelResult<&str> {
        Err(ModelError::AccessDenied)
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Returns `false` when no password was ever set.
    pub fn authenticate(&self, plain: &str) -> bool {
        let Some(hash) = &self.password_hash else {
            debug!(username = %self.username, "authenticate without stored password");
            return false;
        };
        match verify_password(plain, hash) {
            Ok(ok) => ok,
            Err(e) => {
                error!(error = %e, username = %self.username, "stored password hash unreadable");
                false
            }
        }
    }

    pub(crate) fn credential(&self) -> Option<&PasswordHash> {
        self.password_hash.as_ref()
    }

    pub(crate) fn set_credential(&mut self, hash: PasswordHash) {
        self.password_hash = Some(hash);
    }

    pub(crate) fn stored_password_hash(&self) -> Option<&str> {
        self.credential().map(PasswordHash::as_stored)
    }

    pub(crate) fn assign_identity(&mut self, id: Uuid, created_at: OffsetDateTime) {
        self.id = Some(id);
        self.created_at = Some(created_at);
    }
}

/// Row shape of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: Option<String>,
    pub image_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: Some(r.id),
            username: r.username,
            password_hash: r.password_hash.map(PasswordHash::from_stored),
            image_url: r.image_url,
            bio: r.bio,
            created_at: Some(r.created_at),
        }
    }
}

/// Serialization view of a user together with the recipes they own.
#[derive(Debug, Serialize)]
pub struct UserWithRecipes {
    #[serde(flatten)]
    pub user: User,
    pub recipes: Vec<Recipe>,
}
