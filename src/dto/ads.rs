use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::Ad;

/// Body for create, `PUT` and `PATCH`. Every field is optional at the wire
/// level so missing fields surface as field errors rather than a parse failure.
/// Server-computed and read-only fields (`owner`, `is_approved`, ...) are ignored.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct AdPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "1500.00")]
    pub price: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct AdList {
    #[schema(value_type = Vec<Ad>)]
    pub items: Vec<Ad>,
}
