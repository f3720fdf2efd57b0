//! Database models
//!
//! Data structures representing database tables

use serde::Serialize;

/// User record in the database
///
/// Deliberately not `Serialize`: responses go through `UserProfile`, which
/// has no password hash field.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

/// Shopping list item as stored and as returned to its owner
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: Option<String>,
    pub amount: Option<String>,
    pub notes: Option<String>,
    pub is_checked: bool,
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub created_at: String,
}

/// Client-supplied fields of a new item; owner and timestamps are stamped by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewShopItem {
    pub name: Option<String>,
    pub amount: Option<String>,
    pub notes: Option<String>,
    pub is_checked: bool,
}

/// Partial update. Outer `None` leaves a column untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopItemPatch {
    pub name: Option<Option<String>>,
    pub amount: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub is_checked: Option<bool>,
}

impl ShopItemPatch {
    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.amount.is_none()
            && self.notes.is_none()
            && self.is_checked.is_none()
    }
}
