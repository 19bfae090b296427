//! Category data models.
//!
//! Categories are either shared system categories or owned by a single user.
//! The distinction is carried by [`CategoryOwner`] rather than a bare nullable id,
//! so "system categories cannot be deleted" is checked by matching on a variant.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the system category every kind falls back to when a user category is deleted.
pub const FALLBACK_CATEGORY_NAME: &str = "Other";

/// What a category classifies. Immutable once the category exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Expense,
    Income,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown category type: {0:?}")]
pub struct UnknownCategoryKind(pub String);

impl FromStr for CategoryKind {
    type Err = UnknownCategoryKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            other => Err(UnknownCategoryKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for CategoryKind {
    type Error = UnknownCategoryKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Who a category belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryOwner {
    /// Shared by every user; cannot be deleted.
    System,
    User(i64),
}

impl CategoryOwner {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::System => None,
            Self::User(id) => Some(*id),
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System)
    }
}

/// Maps the nullable `user_id` column.
impl From<Option<i64>> for CategoryOwner {
    fn from(user_id: Option<i64>) -> Self {
        match user_id {
            Some(id) => Self::User(id),
            None => Self::System,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: i64,

    #[sqlx(rename = "user_id", try_from = "Option<i64>")]
    pub owner: CategoryOwner,

    pub name: String,

    #[sqlx(rename = "type", try_from = "String")]
    pub kind: CategoryKind,

    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Visible to `user_id` when owned by them or by the system.
    pub fn is_visible_to(&self, user_id: i64) -> bool {
        match self.owner {
            CategoryOwner::System => true,
            CategoryOwner::User(owner) => owner == user_id,
        }
    }
}

/// Request body for creating a category.
///
/// ```json
/// { "name": "Groceries", "type": "expense" }
/// ```
///
/// `type` is kept as a string so an unknown value surfaces as `invalid_request`.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,
}

/// Query string of `GET /api/v1/categories`.
#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub is_system: bool,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            kind: category.kind,
            is_system: category.owner.is_system(),
        }
    }
}
