use tracing::info;
use uuid::Uuid;

use super::{
    dto::{CreateRecipeRequest, UpdateRecipeRequest},
    model::{Recipe, INSTRUCTIONS_REQUIRED, TITLE_REQUIRED},
};
use crate::{
    error::{ModelError, ModelResult},
    store::Store,
    validate,
};

pub async fn create_recipe(store: &dyn Store, req: CreateRecipeRequest) -> ModelResult<Recipe> {
    let title = validate::present("title", req.title.as_deref(), TITLE_REQUIRED)?;
    let instructions = validate::present(
        "instructions",
        req.instructions.as_deref(),
        INSTRUCTIONS_REQUIRED,
    )?;

    let mut recipe = Recipe::new(title, instructions)?;
    recipe.minutes_to_complete = req.minutes_to_complete;
    if let Some(user_id) = req.user_id {
        recipe.set_owner(user_id);
    }

    let recipe = store.insert_recipe(&recipe).await?;
    info!(recipe_id = ?recipe.id(), user_id = ?recipe.user_id(), "recipe created");
    Ok(recipe)
}

pub async fn find(store: &dyn Store, id: Uuid) -> ModelResult<Recipe> {
    store
        .find_recipe(id)
        .await?
        .ok_or(ModelError::NotFound("recipe"))
}

pub async fn update_recipe(
    store: &dyn Store,
    id: Uuid,
    req: UpdateRecipeRequest,
) -> ModelResult<Recipe> {
    let mut recipe = find(store, id).await?;
    if let Some(title) = req.title.as_deref() {
        recipe.set_title(title)?;
    }
    if let Some(instructions) = req.instructions.as_deref() {
        recipe.set_instructions(instructions)?;
    }
    if req.minutes_to_complete.is_some() {
        recipe.minutes_to_complete = req.minutes_to_complete;
    }
    store.update_recipe(&recipe).await
}

pub async fn delete(store: &dyn Store, id: Uuid) -> ModelResult<()> {
    if !store.delete_recipe(id).await? {
        return Err(ModelError::NotFound("recipe"));
    }
    info!(recipe_id = %id, "recipe deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::model::tests::LONG_INSTRUCTIONS;
    use crate::store::MemoryStore;
    use crate::users::model::User;

    async fn owner(store: &MemoryStore) -> Uuid {
        store
            .insert_user(&User::new("ada").unwrap())
            .await
            .unwrap()
            .id()
            .unwrap()
    }

    fn request(user_id: Option<Uuid>, instructions: &str) -> CreateRecipeRequest {
        CreateRecipeRequest {
            title: Some(" Bread ".into()),
            instructions: Some(instructions.into()),
            minutes_to_complete: Some(90),
            user_id,
        }
    }

    #[tokio::test]
    async fn create_stores_normalized_fields() {
        let store = MemoryStore::new();
        let user_id = owner(&store).await;
        let recipe = create_recipe(&store, request(Some(user_id), LONG_INSTRUCTIONS))
            .await
            .unwrap();
        assert!(recipe.id().is_some());
        assert_eq!(recipe.title(), "Bread");
        assert_eq!(recipe.user_id(), Some(user_id));
        assert_eq!(recipe.minutes_to_complete, Some(90));
    }

    #[tokio::test]
    async fn short_instructions_never_reach_the_store() {
        let store = MemoryStore::new();
        let user_id = owner(&store).await;
        let err = create_recipe(&store, request(Some(user_id), "Mix flour and water."))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Validation { field: "instructions", .. }));
        assert!(store.list_recipes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_title_is_a_validation_error() {
        let store = MemoryStore::new();
        let mut req = request(None, LONG_INSTRUCTIONS);
        req.title = None;
        let err = create_recipe(&store, req).await.unwrap_err();
        assert!(matches!(err, ModelError::Validation { field: "title", .. }));
    }

    #[tokio::test]
    async fn missing_owner_is_a_constraint_violation() {
        let store = MemoryStore::new();
        let err = create_recipe(&store, request(None, LONG_INSTRUCTIONS))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn update_validates_each_field() {
        let store = MemoryStore::new();
        let user_id = owner(&store).await;
        let recipe = create_recipe(&store, request(Some(user_id), LONG_INSTRUCTIONS))
            .await
            .unwrap();
        let id = recipe.id().unwrap();

        let err = update_recipe(
            &store,
            id,
            UpdateRecipeRequest {
                instructions: Some("  stir  ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ModelError::Validation { .. }));

        let updated = update_recipe(
            &store,
            id,
            UpdateRecipeRequest {
                title: Some("  Rye Bread ".into()),
                minutes_to_complete: Some(120),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title(), "Rye Bread");
        assert_eq!(updated.instructions(), LONG_INSTRUCTIONS);
        assert_eq!(updated.minutes_to_complete, Some(120));
        assert_eq!(updated.created_at(), recipe.created_at());
    }

    #[tokio::test]
    async fn deleted_recipe_is_not_found() {
        let store = MemoryStore::new();
        let user_id = owner(&store).await;
        let recipe = create_recipe(&store, request(Some(user_id), LONG_INSTRUCTIONS))
            .await
            .unwrap();
        let id = recipe.id().unwrap();
        delete(&store, id).await.unwrap();
        assert!(matches!(find(&store, id).await, Err(ModelError::NotFound("recipe"))));
        assert!(matches!(delete(&store, id).await, Err(ModelError::NotFound("recipe"))));
    }
}
