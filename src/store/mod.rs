use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::ModelResult,
    recipes::model::Recipe,
    users::{model::User, password::PasswordHash},
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence for users and recipes.
///
/// Implementations enforce username uniqueness, require every recipe to
/// reference an existing user, and delete a user's recipes along with the
/// user. Violations surface as `ModelError::ConstraintViolation`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: &User) -> ModelResult<User>;
    /// Writes username, image_url and bio. The stored password hash is untouched.
    async fn update_user(&self, user: &User) -> ModelResult<User>;
    /// Replace only the password hash of user `id`.
    async fn set_password_hash(&self, id: Uuid, hash: &PasswordHash) -> ModelResult<()>;
    async fn find_user(&self, id: Uuid) -> ModelResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> ModelResult<Option<User>>;
    /// Returns `false` when no such user existed.
    async fn delete_user(&self, id: Uuid) -> ModelResult<bool>;

    async fn insert_recipe(&self, recipe: &Recipe) -> ModelResult<Recipe>;
    async fn update_recipe(&self, recipe: &Recipe) -> ModelResult<Recipe>;
    async fn find_recipe(&self, id: Uuid) -> ModelResult<Option<Recipe>>;
    async fn list_recipes(&self) -> ModelResult<Vec<Recipe>>;
    async fn list_recipes_by_user(&self, user_id: Uuid) -> ModelResult<Vec<Recipe>>;
    async fn delete_recipe(&self, id: Uuid) -> ModelResult<bool>;
}
