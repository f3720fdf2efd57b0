use super::common::{deserialize_flag, deserialize_present_flag, deserialize_present_text, deserialize_text};
use crate::db::models::{NewShopItem, ShopItemPatch};
use serde::{Deserialize, Serialize};

/// Body of `POST /shopItem`; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShopItemRequest {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_checked: bool,
}

impl From<CreateShopItemRequest> for NewShopItem {
    fn from(req: CreateShopItemRequest) -> Self {
        NewShopItem {
            name: req.name,
            amount: req.amount,
            notes: req.notes,
            is_checked: req.is_checked,
        }
    }
}

/// Body of `PATCH /shopItem/:id`
///
/// Only the four item fields are recognised. Any other key, including
/// `_id` and `userId`, is dropped during deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShopItemRequest {
    #[serde(default, deserialize_with = "deserialize_present_text")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_present_text")]
    pub amount: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_present_text")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_present_flag")]
    pub is_checked: Option<bool>,
}

impl From<UpdateShopItemRequest> for ShopItemPatch {
    fn from(req: UpdateShopItemRequest) -> Self {
        ShopItemPatch {
            name: req.name,
            amount: req.amount,
            notes: req.notes,
            is_checked: req.is_checked,
        }
    }
}

/// Result of an insert
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    pub acknowledged: bool,
    pub inserted_id: String,
}

/// Result of a delete
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub acknowledged: bool,
    pub deleted_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let req: CreateShopItemRequest = serde_json::from_str("{}").unwrap();
        let item = NewShopItem::from(req);
        assert_eq!(item, NewShopItem::default());
    }

    #[test]
    fn test_create_request_fields() {
        let req: CreateShopItemRequest = serde_json::from_str(
            r#"{"name":"Oat drink","amount":2,"notes":"","isChecked":"true","userId":"someone-else"}"#,
        )
        .unwrap();

        assert_eq!(req.name.as_deref(), Some("Oat drink"));
        assert_eq!(req.amount.as_deref(), Some("2"));
        assert_eq!(req.notes.as_deref(), Some(""));
        assert!(req.is_checked);
    }

    #[test]
    fn test_patch_ignores_ownership_keys() {
        let req: UpdateShopItemRequest =
            serde_json::from_str(r#"{"_id":"x","userId":"mallory","createdAt":"then"}"#).unwrap();
        assert!(ShopItemPatch::from(req).is_empty());
    }

    #[test]
    fn test_patch_null_clears() {
        let req: UpdateShopItemRequest =
            serde_json::from_str(r#"{"notes":null,"isChecked":true}"#).unwrap();
        let patch = ShopItemPatch::from(req);

        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.is_checked, Some(true));
        assert_eq!(patch.name, None);
        assert_eq!(patch.amount, None);
    }

    #[test]
    fn test_response_wire_names() {
        let inserted = serde_json::to_value(InsertResponse {
            acknowledged: true,
            inserted_id: "abc".to_string(),
        })
        .unwrap();
        assert_eq!(inserted["insertedId"], "abc");

        let deleted = serde_json::to_value(DeleteResponse {
            acknowledged: true,
            deleted_count: 1,
        })
        .unwrap();
        assert_eq!(deleted["deletedCount"], 1);
    }
}
