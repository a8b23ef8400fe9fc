use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use tracing::debug;

use crate::{
    api::LimitOffset,
    auth::AuthUser,
    db::feed_candidates,
    error::AppResult,
    feed::{self, FeedEntry},
};

fn page(entries: Vec<FeedEntry>, limit: i64, offset: i64) -> Vec<FeedEntry> {
    entries
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

// GET /api/v1/feeds
pub async fn get_feed(
    State(pool): State<PgPool>,
    AuthUser(viewer): AuthUser,
    Query(query): Query<LimitOffset>,
) -> AppResult<impl IntoResponse> {
    let (limit, offset) = query.window();

    let ranked = feed::rank(feed_candidates(&pool, viewer).await?);
    let total = ranked.len();
    debug!(viewer, total, "feed ranked");

    if ranked.is_empty() {
        return Ok(Json(json!({
            "message": "No posts currently available.",
            "posts": [],
        })));
    }

    let posts = page(ranked, limit, offset);
    Ok(Json(json!({ "total": total, "posts": posts })))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::feed::FeedCandidate;

    fn entries(count: i32) -> Vec<FeedEntry> {
        let candidates = (1..=count)
            .map(|id| FeedCandidate {
                id,
                author_id: 1,
                author: "ada".to_string(),
                book_id: None,
                book_title: None,
                content: String::new(),
                image_url: None,
                posted_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                like_count: 0,
                comment_count: 0,
            })
            .collect();
        feed::rank(candidates)
    }

    #[test]
    fn pages_after_ranking() {
        let ids: Vec<i32> = page(entries(5), 2, 1).iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[test]
    fn offset_past_the_end_is_empty() {
        assert!(page(entries(3), 20, 10).is_empty());
    }
}
