use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{ChangePasswordRequest, LoginRequest, SignupRequest, UpdateUserRequest},
    model::{User, UserWithRecipes},
    services,
};
use crate::{error::reject, recipes::model::Recipe, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:id", get(get_user).patch(update_user).delete(delete_user))
        .route("/users/:id/password", put(change_password))
        .route("/users/:id/recipes", get(list_user_recipes))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<User>), (StatusCode, String)> {
    let user = services::register(state.store.as_ref(), payload)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<User>, (StatusCode, String)> {
    let user = services::authenticate(state.store.as_ref(), &payload.username, &payload.password)
        .await
        .map_err(reject)?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserWithRecipes>, (StatusCode, String)> {
    services::find_with_recipes(state.store.as_ref(), id)
        .await
        .map(Json)
        .map_err(reject)
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, (StatusCode, String)> {
    services::update_profile(state.store.as_ref(), id, payload)
        .await
        .map(Json)
        .map_err(reject)
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    services::change_password(state.store.as_ref(), id, &payload.password)
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    services::delete(state.store.as_ref(), id)
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_user_recipes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Recipe>>, (StatusCode, String)> {
    let store = state.store.as_ref();
    services::find(store, id).await.map_err(reject)?;
    store
        .list_recipes_by_user(id)
        .await
        .map(Json)
        .map_err(reject)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_body(username: &str, password: &str) -> Json<SignupRequest> {
        Json(SignupRequest {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn signup_response_has_no_password_field() {
        let state = AppState::fake();
        let (status, Json(user)) = signup(State(state), signup_body("ada", "lovelace-1815"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"username\":\"ada\""));
        assert!(!json.contains("password"));
        assert!(!json.contains("$argon2"));
    }

    #[tokio::test]
    async fn signup_blank_username_is_unprocessable() {
        let state = AppState::fake();
        let (status, body) = signup(State(state), signup_body("   ", "pw"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "Username must be provided.");
    }

    #[tokio::test]
    async fn duplicate_signup_is_conflict() {
        let state = AppState::fake();
        let (status, _) = signup(State(state.clone()), signup_body("ada", "pw"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = signup(State(state), signup_body(" ada ", "pw"))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn login_rejects_bad_password() {
        let state = AppState::fake();
        let (status, _) = signup(State(state.clone()), signup_body("ada", "pw"))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let ok = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "ada".into(),
                password: "pw".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(ok.0.username(), "ada");

        let (status, _) = login(
            State(state),
            Json(LoginRequest {
                username: "ada".into(),
                password: "nope".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let state = AppState::fake();
        let (status, _) = get_user(State(state.clone()), Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = delete_user(State(state), Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn change_password_then_login() {
        let state = AppState::fake();
        let (_, Json(user)) = signup(State(state.clone()), signup_body("ada", "old"))
            .await
            .unwrap();
        let id = user.id().unwrap();
        let status = change_password(
            State(state.clone()),
            Path(id),
            Json(ChangePasswordRequest {
                password: "new".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let ok = login(
            State(state),
            Json(LoginRequest {
                username: "ada".into(),
                password: "new".into(),
            }),
        )
        .await;
        assert!(ok.is_ok());
    }
}
