use crate::core::error::ShopError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::header,
    Json,
};
use serde::{de::DeserializeOwned, de::Error as _, Deserialize, Serialize};
use serde_json::Value;

/// JSON body extractor whose rejections use the service's error format
///
/// A request with no `Content-Type` and an empty body is read as `{}`.
/// Any other missing content type, malformed JSON or type mismatch becomes
/// a 400 with the parser's message.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !req.headers().contains_key(header::CONTENT_TYPE) {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|rejection| ShopError::InvalidRequest(rejection.body_text()))?;

            if !bytes.is_empty() {
                return Err(ShopError::InvalidRequest(
                    "Expected request with `Content-Type: application/json`".to_string(),
                ));
            }

            return serde_json::from_slice(b"{}")
                .map(JsonBody)
                .map_err(|e| ShopError::InvalidRequest(e.to_string()));
        }

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ShopError {
    ShopError::InvalidRequest(rejection.body_text())
}

/// Plain `{"message": ...}` body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Lenient text: strings as-is, numbers and booleans stringified, null as `None`
pub fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Value> = Deserialize::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string, number or boolean, found {}",
            kind_of(&other)
        ))),
    }
}

/// Lenient flag: booleans, `"true"`/`"false"`, `0`/`1`; null is `false`
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Value> = Deserialize::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::String(s)) => match s.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(D::Error::custom(format!("invalid boolean string: {:?}", s))),
        },
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(D::Error::custom(format!("invalid boolean number: {}", n))),
        },
        Some(other) => Err(D::Error::custom(format!(
            "expected a boolean, found {}",
            kind_of(&other)
        ))),
    }
}

/// `deserialize_text` for patch fields: present (even as null) becomes `Some`
pub fn deserialize_present_text<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_text(deserializer).map(Some)
}

/// `deserialize_flag` for patch fields: present becomes `Some`
pub fn deserialize_present_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_flag(deserializer).map(Some)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
