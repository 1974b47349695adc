use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    error::ModelResult,
    validate::{self, MIN_INSTRUCTIONS_LEN},
};

pub(crate) const TITLE_REQUIRED: &str = "Title must be provided.";
pub(crate) const INSTRUCTIONS_REQUIRED: &str = "Instructions must be provided.";
pub(crate) const INSTRUCTIONS_TOO_SHORT: &str = "Instructions must be at least 50 characters long.";

/// A recipe owned by exactly one user once stored.
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    id: Option<Uuid>,
    title: String,
    instructions: String,
    pub minutes_to_complete: Option<i32>,
    user_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
}

impl Recipe {
    pub fn new(title: &str, instructions: &str) -> ModelResult<Self> {
        let mut recipe = Self {
            id: None,
            title: String::new(),
            instructions: String::new(),
            minutes_to_complete: None,
            user_id: None,
            created_at: None,
        };
        recipe.set_title(title)?;
        recipe.set_instructions(instructions)?;
        Ok(recipe)
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn created_at(&self) -> Option<OffsetDateTime> {
        self.created_at
    }

    pub fn set_title(&mut self, value: &str) -> ModelResult<()> {
        self.title = validate::required("title", value, TITLE_REQUIRED)?;
        Ok(())
    }

    pub fn set_instructions(&mut self, value: &str) -> ModelResult<()> {
        self.instructions = validate::min_chars(
            "instructions",
            value,
            MIN_INSTRUCTIONS_LEN,
            INSTRUCTIONS_REQUIRED,
            INSTRUCTIONS_TOO_SHORT,
        )?;
        Ok(())
    }

    /// Point the recipe at its owner. Whether the owner exists is checked on insert.
    pub fn set_owner(&mut self, user_id: Uuid) {
        self.user_id = Some(user_id);
    }

    pub(crate) fn assign_identity(&mut self, id: Uuid, created_at: OffsetDateTime) {
        self.id = Some(id);
        self.created_at = Some(created_at);
    }
}

/// Row shape of the `recipes` table.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct RecipeRow {
    pub id: Uuid,
    pub title: String,
    pub instructions: String,
    pub minutes_to_complete: Option<i32>,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

impl From<RecipeRow> for Recipe {
    fn from(r: RecipeRow) -> Self {
        Self {
            id: Some(r.id),
            title: r.title,
            instructions: r.instructions,
            minutes_to_complete: r.minutes_to_complete,
            user_id: Some(r.user_id),
            created_at: Some(r.created_at),
        }
    }
}
