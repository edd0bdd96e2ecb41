use serde::{Deserialize, Serialize};

use crate::web::error::AppError;

pub mod recipe_models;
pub mod user_models;

pub use recipe_models::*;
pub use user_models::*;

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // email
    pub user_id: i32,
    pub exp: usize,
}

/// Struct to hold authenticated user details, to be passed as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub email: String,
}

/// `page` / `limit` query parameters, validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based.
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u64 = 6;
    pub const MAX_LIMIT: u64 = 100;

    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, AppError> {
        let page = match page {
            Some(raw) => parse_positive("page", raw)?,
            None => 1,
        };
        let limit = match limit {
            Some(raw) => parse_positive("limit", raw)?.min(Self::MAX_LIMIT),
            None => Self::DEFAULT_LIMIT,
        };
        // The row offset is bound as a signed 64-bit integer.
        let offset_fits = (page - 1)
            .checked_mul(limit)
            .is_some_and(|offset| i64::try_from(offset).is_ok());
        if !offset_fits {
            return Err(AppError::InvalidInput(format!(
                "'page' is out of range, got '{page}'."
            )));
        }
        Ok(PageRequest { page, limit })
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Parses a strictly positive integer query parameter.
pub fn parse_positive(name: &str, raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(AppError::InvalidInput(format!(
            "'{name}' must be a positive integer, got '{raw}'."
        ))),
    }
}

/// Parses a strictly positive limit that fits in `u32`.
pub fn parse_small_positive(name: &str, raw: &str) -> Result<u32, AppError> {
    let value = parse_positive(name, raw)?;
    u32::try_from(value).map_err(|_| {
        AppError::InvalidInput(format!("'{name}' must be at most {}, got '{raw}'.", u32::MAX))
    })
}

/// Parses a `1/0/true/false` query flag.
pub fn parse_flag(name: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(AppError::InvalidInput(format!(
            "'{name}' must be one of 1, 0, true, false."
        ))),
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<u64>,
    pub previous: Option<u64>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(results: Vec<T>, count: u64, page: PageRequest) -> Self {
        let next = page
            .page
            .checked_mul(page.limit)
            .is_some_and(|seen| seen < count)
            .then_some(page.page + 1);
        let previous = (page.page > 1).then(|| page.page - 1);
        Paginated {
            count,
            next,
            previous,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let page = PageRequest::parse(None, None).unwrap();
        assert_eq!(page, PageRequest::default());
    }

    #[test]
    fn test_page_request_clamps_limit() {
        let page = PageRequest::parse(Some("2"), Some("1000")).unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, PageRequest::MAX_LIMIT);
    }

    #[test]
    fn test_page_request_rejects_garbage() {
        assert!(matches!(
            PageRequest::parse(Some("abc"), None),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            PageRequest::parse(None, Some("0")),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            PageRequest::parse(None, Some("-3")),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_page_request_rejects_unreachable_page() {
        assert!(matches!(
            PageRequest::parse(Some("18446744073709551615"), None),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            PageRequest::parse(Some("999999999999999999"), Some("100")),
            Err(AppError::InvalidInput(_))
        ));
        let far = PageRequest::parse(Some("1000000"), Some("100")).unwrap();
        assert_eq!((far.page, far.limit), (1_000_000, 100));
    }

    #[test]
    fn test_parse_small_positive() {
        assert_eq!(parse_small_positive("recipes_limit", "3").unwrap(), 3);
        assert!(parse_small_positive("recipes_limit", "18446744073709551615").is_err());
        assert!(parse_small_positive("recipes_limit", "4294967296").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("is_favorited", "1").unwrap());
        assert!(!parse_flag("is_favorited", "false").unwrap());
        assert!(parse_flag("is_favorited", "yes").is_err());
    }

    #[test]
    fn test_paginated_links() {
        let page = PageRequest { page: 2, limit: 6 };
        let paginated = Paginated::new(vec![1, 2, 3], 15, page);
        assert_eq!(paginated.next, Some(3));
        assert_eq!(paginated.previous, Some(1));

        let last = Paginated::new(vec![1], 13, PageRequest { page: 3, limit: 6 });
        assert_eq!(last.next, None);
    }
}
