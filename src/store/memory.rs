use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::Store;
use crate::{
    error::{ModelError, ModelResult},
    recipes::model::Recipe,
    users::{model::User, password::PasswordHash},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    recipes: Vec<Recipe>,
}

/// Process-local store with the same constraints as the `users`/`recipes` schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Tables {
    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.username() == username && u.id() != except)
    }

    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id() == Some(id))
    }

    fn owner_of(&self, recipe: &Recipe) -> ModelResult<Uuid> {
        let user_id = recipe
            .user_id()
            .ok_or_else(|| ModelError::ConstraintViolation("recipe has no owning user".into()))?;
        if !self.user_exists(user_id) {
            return Err(ModelError::ConstraintViolation(format!(
                "user {user_id} does not exist"
            )));
        }
        Ok(user_id)
    }
}

fn duplicate_username(username: &str) -> ModelError {
    ModelError::ConstraintViolation(format!("username {username:?} is already taken"))
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> ModelResult<User> {
        let mut t = self.write();
        if t.username_taken(user.username(), None) {
            return Err(duplicate_username(user.username()));
        }
        let mut row = user.clone();
        row.assign_identity(Uuid::new_v4(), OffsetDateTime::now_utc());
        t.users.push(row.clone());
        debug!(user_id = ?row.id(), "memory insert user");
        Ok(row)
    }

    async fn update_user(&self, user: &User) -> ModelResult<User> {
        let id = user.id().ok_or(ModelError::NotFound("user"))?;
        let mut t = self.write();
        if t.username_taken(user.username(), Some(id)) {
            return Err(duplicate_username(user.username()));
        }
        let slot = t
            .users
            .iter_mut()
            .find(|u| u.id() == Some(id))
            .ok_or(ModelError::NotFound("user"))?;
        slot.set_username(user.username())?;
        slot.image_url = user.image_url.clone();
        slot.bio = user.bio.clone();
        Ok(slot.clone())
    }

    async fn set_password_hash(&self, id: Uuid, hash: &PasswordHash) -> ModelResult<()> {
        let mut t = self.write();
        let slot = t
            .users
            .iter_mut()
            .find(|u| u.id() == Some(id))
            .ok_or(ModelError::NotFound("user"))?;
        slot.set_credential(hash.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> ModelResult<Option<User>> {
        Ok(self.read().users.iter().find(|u| u.id() == Some(id)).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> ModelResult<Option<User>> {
        Ok(self
            .read()
            .users
            .iter()
            .find(|u| u.username() == username)
            .cloned())
    }

    async fn delete_user(&self, id: Uuid) -> ModelResult<bool> {
        let mut t = self.write();
        let before = t.users.len();
        t.users.retain(|u| u.id() != Some(id));
        if t.users.len() == before {
            return Ok(false);
        }
        let recipes_before = t.recipes.len();
        t.recipes.retain(|r| r.user_id() != Some(id));
        debug!(user_id = %id, cascaded = recipes_before - t.recipes.len(), "memory delete user");
        Ok(true)
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> ModelResult<Recipe> {
        let mut t = self.write();
        t.owner_of(recipe)?;
        let mut row = recipe.clone();
        row.assign_identity(Uuid::new_v4(), OffsetDateTime::now_utc());
        t.recipes.push(row.clone());
        Ok(row)
    }

    async fn update_recipe(&self, recipe: &Recipe) -> ModelResult<Recipe> {
        let id = recipe.id().ok_or(ModelError::NotFound("recipe"))?;
        let mut t = self.write();
        t.owner_of(recipe)?;
        let slot = t
            .recipes
            .iter_mut()
            .find(|r| r.id() == Some(id))
            .ok_or(ModelError::NotFound("recipe"))?;
        let created_at = slot.created_at().unwrap_or_else(OffsetDateTime::now_utc);
        let mut row = recipe.clone();
        row.assign_identity(id, created_at);
        *slot = row.clone();
        Ok(row)
    }

    async fn find_recipe(&self, id: Uuid) -> ModelResult<Option<Recipe>> {
        Ok(self
            .read()
            .recipes
            .iter()
            .find(|r| r.id() == Some(id))
            .cloned())
    }

    async fn list_recipes(&self) -> ModelResult<Vec<Recipe>> {
        Ok(self.read().recipes.clone())
    }

    async fn list_recipes_by_user(&self, user_id: Uuid) -> ModelResult<Vec<Recipe>> {
        Ok(self
            .read()
            .recipes
            .iter()
            .filter(|r| r.user_id() == Some(user_id))
            .cloned()
            .collect())
    }

    async fn delete_recipe(&self, id: Uuid) -> ModelResult<bool> {
        let mut t = self.write();
        let before = t.recipes.len();
        t.recipes.retain(|r| r.id() != Some(id));
        Ok(t.recipes.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::model::tests::LONG_INSTRUCTIONS;

    fn recipe_for(owner: Uuid, title: &str) -> Recipe {
        let mut r = Recipe::new(title, LONG_INSTRUCTIONS).unwrap();
        r.set_owner(owner);
        r
    }

    #[tokio::test]
    async fn insert_assigns_identity() {
        let store = MemoryStore::new();
        let user = store.insert_user(&User::new("ada").unwrap()).await.unwrap();
        assert!(user.id().is_some());
        assert!(user.created_at().is_some());
        let found = store.find_user(user.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(found.username(), "ada");
    }

    #[tokio::test]
    async fn duplicate_trimmed_username_is_a_constraint_violation() {
        let store = MemoryStore::new();
        store.insert_user(&User::new("ada").unwrap()).await.unwrap();
        let err = store
            .insert_user(&User::new("  ada  ").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn rename_onto_existing_username_is_rejected() {
        let store = MemoryStore::new();
        store.insert_user(&User::new("ada").unwrap()).await.unwrap();
        let mut grace = store.insert_user(&User::new("grace").unwrap()).await.unwrap();
        grace.set_username("ada").unwrap();
        let err = store.update_user(&grace).await.unwrap_err();
        assert!(matches!(err, ModelError::ConstraintViolation(_)));

        // keeping your own name is fine
        grace.set_username("grace").unwrap();
        store.update_user(&grace).await.unwrap();
    }

    #[tokio::test]
    async fn recipe_requires_existing_owner() {
        let store = MemoryStore::new();
        let orphan = Recipe::new("Bread", LONG_INSTRUCTIONS).unwrap();
        let err = store.insert_recipe(&orphan).await.unwrap_err();
        assert!(matches!(err, ModelError::ConstraintViolation(_)));

        let dangling = recipe_for(Uuid::new_v4(), "Bread");
        let err = store.insert_recipe(&dangling).await.unwrap_err();
        assert!(matches!(err, ModelError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_recipes() {
        let store = MemoryStore::new();
        let ada = store.insert_user(&User::new("ada").unwrap()).await.unwrap();
        let grace = store.insert_user(&User::new("grace").unwrap()).await.unwrap();
        let ada_id = ada.id().unwrap();

        let r1 = store.insert_recipe(&recipe_for(ada_id, "Bread")).await.unwrap();
        let r2 = store.insert_recipe(&recipe_for(ada_id, "Soup")).await.unwrap();
        let kept = store
            .insert_recipe(&recipe_for(grace.id().unwrap(), "Pie"))
            .await
            .unwrap();

        assert!(store.delete_user(ada_id).await.unwrap());
        for r in [&r1, &r2] {
            assert!(store.find_recipe(r.id().unwrap()).await.unwrap().is_none());
        }
        assert!(store.find_recipe(kept.id().unwrap()).await.unwrap().is_some());
        assert!(store.list_recipes_by_user(ada_id).await.unwrap().is_empty());
        assert!(!store.delete_user(ada_id).await.unwrap());
    }

    #[tokio::test]
    async fn update_user_leaves_password_hash_alone() {
        let store = MemoryStore::new();
        let mut user = User::new("ada").unwrap();
        user.set_password("old-pw").unwrap();
        let saved = store.insert_user(&user).await.unwrap();
        let id = saved.id().unwrap();

        let mut fresh = saved.clone();
        fresh.set_password("new-pw").unwrap();
        store
            .set_password_hash(id, fresh.credential().unwrap())
            .await
            .unwrap();

        let mut stale = saved;
        stale.bio = Some("late edit".into());
        let written = store.update_user(&stale).await.unwrap();
        assert!(written.authenticate("new-pw"));
        assert!(!written.authenticate("old-pw"));
    }

    #[tokio::test]
    async fn set_password_hash_on_missing_user_is_not_found() {
        let store = MemoryStore::new();
        let mut user = User::new("ada").unwrap();
        user.set_password("pw").unwrap();
        let err = store
            .set_password_hash(Uuid::new_v4(), user.credential().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::NotFound("user")));
    }

    #[tokio::test]
    async fn update_without_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_user(&User::new("ada").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::NotFound("user")));
    }

    #[tokio::test]
    async fn stored_password_survives_roundtrip() {
        let store = MemoryStore::new();
        let mut user = User::new("ada").unwrap();
        user.set_password("lovelace-1815").unwrap();
        let saved = store.insert_user(&user).await.unwrap();
        let loaded = store.find_user_by_username("ada").await.unwrap().unwrap();
        assert_eq!(loaded.id(), saved.id());
        assert!(loaded.authenticate("lovelace-1815"));
    }
}
