use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
}

/// Keyset pagination over creation time, newest first
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CursorQuery {
    /// `next_cursor` of the previous page (unix milliseconds); omit for the first page
    pub cursor: Option<i64>,

    /// Items per page (default: 10, max: 100)
    #[param(minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
}

impl CursorQuery {
    /// Non-positive or missing limits fall back to the default page size
    pub fn limit(&self) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 => limit.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    /// Upper bound (exclusive) on `created_at`, `None` for the first page
    pub fn before(&self) -> Option<DateTime<Utc>> {
        self.cursor
            .filter(|cursor| *cursor > 0)
            .and_then(DateTime::from_timestamp_millis)
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_query_limit_is_clamped() {
        let query = |limit| CursorQuery {
            cursor: None,
            limit,
        };
        assert_eq!(query(None).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(query(Some(0)).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(query(Some(-5)).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(query(Some(25)).limit(), 25);
        assert_eq!(query(Some(1000)).limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_cursor_query_before() {
        let first_page = CursorQuery::default();
        assert_eq!(first_page.before(), None);

        let zero = CursorQuery {
            cursor: Some(0),
            limit: None,
        };
        assert_eq!(zero.before(), None);

        let next = CursorQuery {
            cursor: Some(1_700_000_000_123),
            limit: None,
        };
        assert_eq!(
            next.before().map(|t| t.timestamp_millis()),
            Some(1_700_000_000_123)
        );
    }
}
