//! Offset pagination shared by the list endpoints.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 10;

pub const MAX_LIMIT: i64 = 100;

/// `skip` / `limit` query parameters.
///
/// Values outside the accepted range are clamped rather than rejected: `skip` is at least 0 and
/// `limit` lies in `1..=MAX_LIMIT`.
#[serde_as]
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Number of items to skip (default: 0)
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub skip: Option<i64>,

    /// Maximum number of items to return (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    #[inline]
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// `(skip, limit)` after clamping
    #[inline]
    pub fn params(&self) -> (i64, i64) {
        (self.skip(), self.limit())
    }
}

/// A page of results plus the total number of matches before paging
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    pub data: Vec<T>,
    pub total_count: i64,
    pub skip: i64,
    pub limit: i64,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total_count: i64, skip: i64, limit: i64) -> Self {
        Self {
            data,
            total_count,
            skip,
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(skip: Option<i64>, limit: Option<i64>) -> Pagination {
        Pagination { skip, limit }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Pagination::default().params(), (0, DEFAULT_LIMIT));
    }

    #[test]
    fn test_clamping() {
        assert_eq!(page(None, Some(0)).limit(), 1);
        assert_eq!(page(None, Some(-5)).limit(), 1);
        assert_eq!(page(None, Some(1000)).limit(), MAX_LIMIT);
        assert_eq!(page(Some(-10), None).skip(), 0);
        assert_eq!(page(Some(20), Some(50)).params(), (20, 50));
    }

    #[test]
    fn test_parse_from_query_string() {
        let parsed: Pagination = serde_urlencoded::from_str("skip=5&limit=2").unwrap();
        assert_eq!(parsed, page(Some(5), Some(2)));

        let empty: Pagination = serde_urlencoded::from_str("").unwrap();
        assert_eq!(empty, Pagination::default());

        assert!(serde_urlencoded::from_str::<Pagination>("limit=lots").is_err());
    }
}
