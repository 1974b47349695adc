use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{SignupRequest, UpdateUserRequest},
    model::{User, UserWithRecipes, PASSWORD_REQUIRED, USERNAME_REQUIRED},
};
use crate::{
    error::{ModelError, ModelResult},
    store::Store,
    validate,
};

/// Validate the payload, hash the password and insert the user.
pub async fn register(store: &dyn Store, req: SignupRequest) -> ModelResult<User> {
    let username = validate::present("username", req.username.as_deref(), USERNAME_REQUIRED)?;
    let password = validate::present("password", req.password.as_deref(), PASSWORD_REQUIRED)?;

    let mut user = User::new(username)?;
    user.image_url = req.image_url;
    user.bio = req.bio;
    user.set_password(password)?;

    let user = store.insert_user(&user).await?;
    info!(user_id = ?user.id(), username = %user.username(), "user registered");
    Ok(user)
}

/// Look the user up by trimmed username and check the password.
///
/// Unknown usernames, users without a password and wrong passwords all yield
/// [`ModelError::InvalidCredentials`].
pub async fn authenticate(store: &dyn Store, username: &str, password: &str) -> ModelResult<User> {
    let username = username.trim();
    let Some(user) = store.find_user_by_username(username).await? else {
        warn!(username = %username, "login unknown username");
        return Err(ModelError::InvalidCredentials);
    };
    if !user.authenticate(password) {
        warn!(user_id = ?user.id(), "login invalid password");
        return Err(ModelError::InvalidCredentials);
    }
    info!(user_id = ?user.id(), "user authenticated");
    Ok(user)
}

pub async fn find(store: &dyn Store, id: Uuid) -> ModelResult<User> {
    store.find_user(id).await?.ok_or(ModelError::NotFound("user"))
}

pub async fn find_with_recipes(store: &dyn Store, id: Uuid) -> ModelResult<UserWithRecipes> {
    let user = find(store, id).await?;
    let recipes = store.list_recipes_by_user(id).await?;
    Ok(UserWithRecipes { user, recipes })
}

pub async fn update_profile(
    store: &dyn Store,
    id: Uuid,
    req: UpdateUserRequest,
) -> ModelResult<User> {
    let mut user = find(store, id).await?;
    if let Some(username) = req.username.as_deref() {
        user.set_username(username)?;
    }
    if req.image_url.is_some() {
        user.image_url = req.image_url;
    }
    if req.bio.is_some() {
        user.bio = req.bio;
    }
    store.update_user(&user).await
}

pub async fn change_password(store: &dyn Store, id: Uuid, password: &str) -> ModelResult<()> {
    let mut user = find(store, id).await?;
    user.set_password(password)?;
    let hash = user
        .credential()
        .ok_or_else(|| ModelError::Hashing("no hash after set_password".into()))?;
    store.set_password_hash(id, hash).await?;
    info!(user_id = %id, "password changed");
    Ok(())
}

/// Delete the user and, through the store's cascade, their recipes.
pub async fn delete(store: &dyn Store, id: Uuid) -> ModelResult<()> {
    if !store.delete_user(id).await? {
        return Err(ModelError::NotFound("user"));
    }
    info!(user_id = %id, "user deleted");
    Ok(())
}
