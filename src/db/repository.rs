//! Repository pattern implementation for data access layer
//!
//! `UserRepository` is the credential store. `ShopItemRepository` is the
//! owner-scoped item store: every statement it issues filters on both the
//! item id and the caller's user id, so another user's item is simply a row
//! that does not match.

use crate::core::error::{Result, ShopError};
use crate::db::manager::DatabaseManager;
use crate::db::models::{NewShopItem, ShopItem, ShopItemPatch, User};
use async_trait::async_trait;
use rusqlite::{ErrorCode, OptionalExtension, Row};
use std::sync::Arc;
use uuid::Uuid;

/// Message used when an email is already registered
pub const DUPLICATE_USER_MESSAGE: &str = "User already exists";

/// CRUD over records that belong to exactly one owner
///
/// No method can reach a record without naming its owner.
#[async_trait]
pub trait OwnedRepository<T>: Send + Sync {
    type Draft: Send + 'static;
    type Patch: Send + 'static;

    /// All records belonging to `owner_id`, oldest first
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<T>>;

    /// The record with `id` if it belongs to `owner_id`
    async fn find_owned(&self, owner_id: &str, id: &str) -> Result<Option<T>>;

    /// Insert a record stamped with `owner_id`, returning it
    async fn create_owned(&self, owner_id: &str, draft: Self::Draft) -> Result<T>;

    /// Apply `patch` to the owned record, returning the updated record,
    /// or `None` when nothing matched
    async fn update_owned(&self, owner_id: &str, id: &str, patch: Self::Patch) -> Result<Option<T>>;

    /// Delete the owned record, returning how many rows were removed
    async fn delete_owned(&self, owner_id: &str, id: &str) -> Result<usize>;
}

/// Repository for User entities
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find a user by email (exact, case-sensitive match)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        self.db.execute(move |conn| {
            Ok(conn.query_row(
                "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
                [&email],
                user_from_row,
            ).optional()?)
        }).await
    }

    /// Find a user by id
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let id = id.to_string();
        self.db.execute(move |conn| {
            Ok(conn.query_row(
                "SELECT id, email, password_hash, created_at FROM users WHERE id = ?",
                [&id],
                user_from_row,
            ).optional()?)
        }).await
    }

    /// Insert a new user
    ///
    /// A unique-constraint violation on `email` becomes `ShopError::Conflict`,
    /// which covers two registrations racing past the pre-insert lookup.
    pub async fn create(&self, user: &User) -> Result<()> {
        let user = user.clone();
        self.db.execute(move |conn| {
            conn.execute(
                "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
                rusqlite::params![
                    &user.id,
                    &user.email,
                    &user.password_hash,
                    &user.created_at,
                ],
            ).map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref err, _)
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    ShopError::Conflict(DUPLICATE_USER_MESSAGE.to_string())
                }
                other => ShopError::DatabaseError(other),
            })?;
            Ok(())
        }).await
    }

    /// Count total users
    #[cfg(test)]
    pub async fn count(&self) -> Result<i64> {
        self.db.execute(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
        }).await
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: row.get(3)?,
    })
}

const SHOP_ITEM_COLUMNS: &str = "id, name, amount, notes, is_checked, user_id, created_at";

fn shop_item_from_row(row: &Row<'_>) -> rusqlite::Result<ShopItem> {
    Ok(ShopItem {
        id: row.get(0)?,
        name: row.get(1)?,
        amount: row.get(2)?,
        notes: row.get(3)?,
        is_checked: row.get(4)?,
        owner_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn select_owned(conn: &rusqlite::Connection, owner_id: &str, id: &str) -> Result<Option<ShopItem>> {
    Ok(conn.query_row(
        &format!("SELECT {} FROM shop_items WHERE id = ? AND user_id = ?", SHOP_ITEM_COLUMNS),
        [id, owner_id],
        shop_item_from_row,
    ).optional()?)
}

/// Repository for ShopItem entities
pub struct ShopItemRepository {
    db: Arc<DatabaseManager>,
}

impl ShopItemRepository {
    /// Create a new ShopItemRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OwnedRepository<ShopItem> for ShopItemRepository {
    type Draft = NewShopItem;
    type Patch = ShopItemPatch;

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<ShopItem>> {
        let owner_id = owner_id.to_string();
        self.db.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM shop_items WHERE user_id = ? ORDER BY rowid",
                SHOP_ITEM_COLUMNS
            ))?;

            let items = stmt.query_map([&owner_id], shop_item_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(items)
        }).await
    }

    async fn find_owned(&self, owner_id: &str, id: &str) -> Result<Option<ShopItem>> {
        let owner_id = owner_id.to_string();
        let id = id.to_string();
        self.db.execute(move |conn| select_owned(conn, &owner_id, &id)).await
    }

    async fn create_owned(&self, owner_id: &str, draft: NewShopItem) -> Result<ShopItem> {
        let item = ShopItem {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            amount: draft.amount,
            notes: draft.notes,
            is_checked: draft.is_checked,
            owner_id: owner_id.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        self.db.execute(move |conn| {
            conn.execute(
                "INSERT INTO shop_items (id, name, amount, notes, is_checked, user_id, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    &item.id,
                    &item.name,
                    &item.amount,
                    &item.notes,
                    item.is_checked,
                    &item.owner_id,
                    &item.created_at,
                ],
            )?;
            Ok(item)
        }).await
    }

    async fn update_owned(&self, owner_id: &str, id: &str, patch: ShopItemPatch) -> Result<Option<ShopItem>> {
        let owner_id = owner_id.to_string();
        let id = id.to_string();

        self.db.transaction(move |tx| {
            if patch.is_empty() {
                return select_owned(tx, &owner_id, &id);
            }

            let mut assignments: Vec<&str> = Vec::new();
            let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(name) = patch.name {
                assignments.push("name = ?");
                params.push(Box::new(name));
            }
            if let Some(amount) = patch.amount {
                assignments.push("amount = ?");
                params.push(Box::new(amount));
            }
            if let Some(notes) = patch.notes {
                assignments.push("notes = ?");
                params.push(Box::new(notes));
            }
            if let Some(is_checked) = patch.is_checked {
                assignments.push("is_checked = ?");
                params.push(Box::new(is_checked));
            }

            let sql = format!(
                "UPDATE shop_items SET {} WHERE id = ? AND user_id = ?",
                assignments.join(", ")
            );
            params.push(Box::new(id.clone()));
            params.push(Box::new(owner_id.clone()));

            let matched = tx.execute(
                &sql,
                rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
            )?;
            if matched == 0 {
                return Ok(None);
            }

            select_owned(tx, &owner_id, &id)
        }).await
    }

    async fn delete_owned(&self, owner_id: &str, id: &str) -> Result<usize> {
        let owner_id = owner_id.to_string();
        let id = id.to_string();
        self.db.execute(move |conn| {
            Ok(conn.execute(
                "DELETE FROM shop_items WHERE id = ? AND user_id = ?",
                [&id, &owner_id],
            )?)
        }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (UserRepository, ShopItemRepository) {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        (UserRepository::new(db.clone()), ShopItemRepository::new(db))
    }

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: "$2b$04$hash".to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn draft(name: &str) -> NewShopItem {
        NewShopItem {
            name: Some(name.to_string()),
            amount: Some("1".to_string()),
            notes: Some(String::new()),
            is_checked: false,
        }
    }

    #[tokio::test]
    async fn test_user_create_and_lookup() {
        let (users, _) = setup();
        users.create(&user("u1", "a@x.com")).await.unwrap();

        let by_email = users.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, "u1");

        let by_id = users.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");

        assert!(users.find_by_email("A@x.com").await.unwrap().is_none());
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let (users, _) = setup();
        users.create(&user("u1", "a@x.com")).await.unwrap();

        let err = users.create(&user("u2", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, ShopError::Conflict(_)));
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let (_, items) = setup();
        items.create_owned("alice", draft("Oat drink")).await.unwrap();
        items.create_owned("bob", draft("Spelt flour")).await.unwrap();
        items.create_owned("alice", draft("Eggs")).await.unwrap();

        let alice: Vec<_> = items.list_for_owner("alice").await.unwrap()
            .into_iter()
            .map(|i| i.name.unwrap())
            .collect();
        assert_eq!(alice, vec!["Oat drink", "Eggs"]);

        assert_eq!(items.list_for_owner("bob").await.unwrap().len(), 1);
        assert!(items.list_for_owner("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let (_, items) = setup();
        let created = items.create_owned("alice", draft("Eggs")).await.unwrap();

        let found = items.find_owned("alice", &created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(found.owner_id, "alice");
        assert!(!found.is_checked);
    }

    #[tokio::test]
    async fn test_other_owner_sees_nothing() {
        let (_, items) = setup();
        let created = items.create_owned("bob", draft("Feta")).await.unwrap();

        assert!(items.find_owned("alice", &created.id).await.unwrap().is_none());

        let patch = ShopItemPatch { is_checked: Some(true), ..Default::default() };
        assert!(items.update_owned("alice", &created.id, patch).await.unwrap().is_none());
        assert_eq!(items.delete_owned("alice", &created.id).await.unwrap(), 0);

        // Bob's item is untouched
        let still_there = items.find_owned("bob", &created.id).await.unwrap().unwrap();
        assert!(!still_there.is_checked);
    }

    #[tokio::test]
    async fn test_partial_update_touches_only_given_fields() {
        let (_, items) = setup();
        let created = items.create_owned("alice", draft("Eggs")).await.unwrap();

        let patch = ShopItemPatch {
            is_checked: Some(true),
            notes: Some(None),
            ..Default::default()
        };
        let updated = items.update_owned("alice", &created.id, patch).await.unwrap().unwrap();

        assert!(updated.is_checked);
        assert_eq!(updated.notes, None);
        assert_eq!(updated.name.as_deref(), Some("Eggs"));
        assert_eq!(updated.amount.as_deref(), Some("1"));
        assert_eq!(updated.owner_id, "alice");
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_empty_patch_returns_owned_item() {
        let (_, items) = setup();
        let created = items.create_owned("alice", draft("Eggs")).await.unwrap();

        let same = items.update_owned("alice", &created.id, ShopItemPatch::default()).await.unwrap();
        assert_eq!(same, Some(created.clone()));

        let none = items.update_owned("bob", &created.id, ShopItemPatch::default()).await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_delete_is_single_shot() {
        let (_, items) = setup();
        let created = items.create_owned("alice", draft("Eggs")).await.unwrap();

        assert_eq!(items.delete_owned("alice", &created.id).await.unwrap(), 1);
        assert_eq!(items.delete_owned("alice", &created.id).await.unwrap(), 0);
        assert_eq!(items.delete_owned("alice", "not-a-uuid").await.unwrap(), 0);
    }
}
