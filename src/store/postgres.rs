use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::Store;
use crate::{
    error::{ModelError, ModelResult},
    recipes::model::{Recipe, RecipeRow},
    users::{
        model::{User, UserRow},
        password::PasswordHash,
    },
};

const USER_COLUMNS: &str = "id, username, password_hash, image_url, bio, created_at";
const RECIPE_COLUMNS: &str = "id, title, instructions, minutes_to_complete, user_id, created_at";

/// Store backed by the `users` and `recipes` tables.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Split constraint failures out of generic database errors.
fn classify(e: sqlx::Error) -> ModelError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() || db.is_foreign_key_violation() {
            warn!(constraint = ?db.constraint(), "constraint violation");
            return ModelError::ConstraintViolation(db.message().to_string());
        }
    }
    ModelError::Database(e)
}

fn owner(recipe: &Recipe) -> ModelResult<Uuid> {
    recipe
        .user_id()
        .ok_or_else(|| ModelError::ConstraintViolation("recipe has no owning user".into()))
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: &User) -> ModelResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, password_hash, image_url, bio)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.username())
        .bind(user.stored_password_hash())
        .bind(user.image_url.as_deref())
        .bind(user.bio.as_deref())
        .fetch_one(&self.db)
        .await
        .map_err(classify)?;
        debug!(user_id = %row.id, "user inserted");
        Ok(row.into())
    }

    async fn update_user(&self, user: &User) -> ModelResult<User> {
        let id = user.id().ok_or(ModelError::NotFound("user"))?;
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET username = $2, image_url = $3, bio = $4
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user.username())
        .bind(user.image_url.as_deref())
        .bind(user.bio.as_deref())
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?
        .ok_or(ModelError::NotFound("user"))?;
        Ok(row.into())
    }

    async fn set_password_hash(&self, id: Uuid, hash: &PasswordHash) -> ModelResult<()> {
        let res = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash.as_stored())
            .execute(&self.db)
            .await
            .map_err(classify)?;
        if res.rows_affected() == 0 {
            return Err(ModelError::NotFound("user"));
        }
        debug!(user_id = %id, "password hash stored");
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> ModelResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_username(&self, username: &str) -> ModelResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn delete_user(&self, id: Uuid) -> ModelResult<bool> {
        // recipes go with it through ON DELETE CASCADE
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        debug!(user_id = %id, deleted = res.rows_affected(), "user delete");
        Ok(res.rows_affected() > 0)
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> ModelResult<Recipe> {
        let user_id = owner(recipe)?;
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            INSERT INTO recipes (title, instructions, minutes_to_complete, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(recipe.title())
        .bind(recipe.instructions())
        .bind(recipe.minutes_to_complete)
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .map_err(classify)?;
        debug!(recipe_id = %row.id, user_id = %user_id, "recipe inserted");
        Ok(row.into())
    }

    async fn update_recipe(&self, recipe: &Recipe) -> ModelResult<Recipe> {
        let id = recipe.id().ok_or(ModelError::NotFound("recipe"))?;
        let user_id = owner(recipe)?;
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            UPDATE recipes
               SET title = $2, instructions = $3, minutes_to_complete = $4, user_id = $5
             WHERE id = $1
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(recipe.title())
        .bind(recipe.instructions())
        .bind(recipe.minutes_to_complete)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?
        .ok_or(ModelError::NotFound("recipe"))?;
        Ok(row.into())
    }

    async fn find_recipe(&self, id: Uuid) -> ModelResult<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Recipe::from))
    }

    async fn list_recipes(&self) -> ModelResult<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn list_recipes_by_user(&self, user_id: Uuid) -> ModelResult<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
              FROM recipes
             WHERE user_id = $1
             ORDER BY created_at ASC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn delete_recipe(&self, id: Uuid) -> ModelResult<bool> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
