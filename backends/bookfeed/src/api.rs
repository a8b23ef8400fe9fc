pub mod auth;
pub mod bookmarks;
pub mod books;
pub mod comments;
pub mod feed;
pub mod likes;
pub mod moods;
pub mod notifications;
pub mod posts;
pub mod quotes;
pub mod recommendations;
pub mod summaries;
pub mod tags;
pub mod users;

use serde::Deserialize;

const MAX_PAGE_SIZE: i64 = 100;

/// `?limit&offset` query used by list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitOffset {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl LimitOffset {
    pub const DEFAULT_LIMIT: i64 = 20;

    /// Clamped `(limit, offset)`.
    pub fn window(&self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Trimmed text, or `None` when blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_and_clamps() {
        assert_eq!(LimitOffset::default().window(), (20, 0));

        let query = LimitOffset {
            limit: Some(1000),
            offset: Some(-5),
        };
        assert_eq!(query.window(), (100, 0));

        let query = LimitOffset {
            limit: Some(0),
            offset: Some(40),
        };
        assert_eq!(query.window(), (1, 40));
    }

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(non_blank(Some("  emma ")), Some("emma"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
