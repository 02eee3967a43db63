use serde::Deserialize;
use utoipa::ToSchema;

use crate::{error::ValidationErrors, models::Price};

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

/// Sort orders a client may request with `ordering`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdOrdering {
    PriceAsc,
    PriceDesc,
    CreatedAtAsc,
    #[default]
    CreatedAtDesc,
}

impl AdOrdering {
    /// Values outside the allow-list fall back to newest first.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("price") => AdOrdering::PriceAsc,
            Some("-price") => AdOrdering::PriceDesc,
            Some("created_at") => AdOrdering::CreatedAtAsc,
            Some("-created_at") => AdOrdering::CreatedAtDesc,
            _ => AdOrdering::default(),
        }
    }
}

/// Raw query string of the ad listings. Must stay flat: `serde_urlencoded`
/// cannot parse numbers inside `#[serde(flatten)]` structs.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct AdQuery {
    pub q: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Validated listing criteria. `None` means "no constraint".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AdFilters {
    pub search: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub ordering: AdOrdering,
}

impl AdQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn filters(&self) -> Result<AdFilters, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let search = non_empty(self.q.as_deref())
            .or_else(|| non_empty(self.search.as_deref()))
            .map(str::to_string);
        let min_price = parse_price_param("min_price", self.min_price.as_deref(), &mut errors);
        let max_price = parse_price_param("max_price", self.max_price.as_deref(), &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(AdFilters {
            search,
            min_price,
            max_price,
            ordering: AdOrdering::parse(self.ordering.as_deref()),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_price_param(
    field: &str,
    raw: Option<&str>,
    errors: &mut ValidationErrors,
) -> Option<Price> {
    let raw = non_empty(raw)?;
    match raw.parse::<Price>() {
        Ok(price) => Some(price),
        Err(err) => {
            errors.add(field, err.to_string());
            None
        }
    }
}

/// Query string of the moderation queue.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct ModerationQuery {
    pub q: Option<String>,
    pub is_approved: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ModerationQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn search(&self) -> Option<&str> {
        non_empty(self.q.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        let wide = Pagination {
            page: Some(0),
            per_page: Some(1_000),
        };
        assert_eq!(wide.normalize(), (1, 100, 0));
        let third = Pagination {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(third.normalize(), (3, 10, 20));
    }

    #[test]
    fn huge_page_saturates_offset() {
        let far = Pagination {
            page: Some(i64::MAX),
            per_page: Some(20),
        };
        assert_eq!(far.normalize(), (i64::MAX, 20, i64::MAX));
    }

    #[test]
    fn unknown_ordering_falls_back_to_newest() {
        assert_eq!(AdOrdering::parse(Some("price")), AdOrdering::PriceAsc);
        assert_eq!(AdOrdering::parse(Some("-price")), AdOrdering::PriceDesc);
        assert_eq!(AdOrdering::parse(Some("owner")), AdOrdering::CreatedAtDesc);
        assert_eq!(AdOrdering::parse(None), AdOrdering::CreatedAtDesc);
    }

    #[test]
    fn invalid_price_bounds_are_field_errors() {
        let query = AdQuery {
            min_price: Some("cheap".into()),
            max_price: Some("10.001".into()),
            ..AdQuery::default()
        };
        let errors = query.filters().unwrap_err();
        assert!(errors.contains("min_price"));
        assert!(errors.contains("max_price"));
    }

    #[test]
    fn q_takes_precedence_over_search() {
        let query = AdQuery {
            q: Some(" bike ".into()),
            search: Some("car".into()),
            ..AdQuery::default()
        };
        assert_eq!(query.filters().unwrap().search.as_deref(), Some("bike"));
    }
}
