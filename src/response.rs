use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Pagination block of the envelope. All fields are null outside listings.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn page(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// Envelope shared by every JSON response: `{message, data, meta}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    /// One page of a listing together with its position in the full result.
    pub fn paged(message: impl Into<String>, data: T, page: i64, per_page: i64, total: i64) -> Self {
        Self::success(message, data, Some(Meta::page(page, per_page, total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_resources_carry_null_meta() {
        let body = ApiResponse::success("Ad", json!({ "id": 1 }), Some(Meta::empty()));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "message": "Ad",
                "data": { "id": 1 },
                "meta": { "page": null, "per_page": null, "total": null }
            })
        );
    }

    #[test]
    fn listings_report_page_and_total() {
        let body = ApiResponse::paged("Ads", json!([]), 2, 20, 41);
        assert_eq!(body.meta, Some(Meta::page(2, 20, 41)));
    }
}
