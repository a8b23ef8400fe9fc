//! Feed ranking.
//!
//! Candidate posts are selected in the database (see [`crate::db::feed_candidates`]);
//! this module turns them into the viewer's ordered feed: one entry per post,
//! newest first, with popularity breaking ties between equal timestamps.

use std::{cmp::Ordering, collections::HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::db::{BookId, PostId, UserId};

const LIKE_WEIGHT: f64 = 0.5;
const COMMENT_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, FromRow)]
pub struct FeedCandidate {
    pub id: PostId,
    pub author_id: UserId,
    pub author: String,
    pub book_id: Option<BookId>,
    pub book_title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub like_count: i64,
    pub comment_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry {
    pub id: PostId,
    pub author_id: UserId,
    pub author: String,
    pub book_id: Option<BookId>,
    pub book_title: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub like_count: i64,
    pub comment_count: i64,
    pub popularity: f64,
}

pub fn popularity(like_count: i64, comment_count: i64) -> f64 {
    LIKE_WEIGHT * like_count as f64 + COMMENT_WEIGHT * comment_count as f64
}

impl From<FeedCandidate> for FeedEntry {
    fn from(candidate: FeedCandidate) -> Self {
        Self {
            popularity: popularity(candidate.like_count, candidate.comment_count),
            id: candidate.id,
            author_id: candidate.author_id,
            author: candidate.author,
            book_id: candidate.book_id,
            book_title: candidate.book_title,
            content: candidate.content,
            image_url: candidate.image_url,
            posted_at: candidate.posted_at,
            like_count: candidate.like_count,
            comment_count: candidate.comment_count,
        }
    }
}

/// Orders by `(posted_at DESC, popularity DESC, id DESC)`.
fn feed_order(a: &FeedEntry, b: &FeedEntry) -> Ordering {
    b.posted_at
        .cmp(&a.posted_at)
        .then_with(|| b.popularity.total_cmp(&a.popularity))
        .then_with(|| b.id.cmp(&a.id))
}

/// Deduplicates candidates by post id and sorts them into feed order.
pub fn rank(candidates: Vec<FeedCandidate>) -> Vec<FeedEntry> {
    let mut seen = HashSet::with_capacity(candidates.len());
    let mut entries: Vec<FeedEntry> = candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.id))
        .map(FeedEntry::from)
        .collect();

    entries.sort_by(feed_order);
    entries
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn candidate(id: PostId, posted_at: DateTime<Utc>, likes: i64, comments: i64) -> FeedCandidate {
        FeedCandidate {
            id,
            author_id: 1,
            author: "ada".to_string(),
            book_id: None,
            book_title: None,
            content: format!("post {id}"),
            image_url: None,
            posted_at,
            like_count: likes,
            comment_count: comments,
        }
    }

    fn ids(entries: &[FeedEntry]) -> Vec<PostId> {
        entries.iter().map(|entry| entry.id).collect()
    }

    #[test]
    fn weights_likes_and_comments() {
        assert!((popularity(4, 2) - 2.6).abs() < 1e-9);
        assert_eq!(popularity(0, 0), 0.0);
        assert!((popularity(0, 10) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn no_candidates_means_empty_feed() {
        assert!(rank(Vec::new()).is_empty());
    }

    #[test]
    fn newest_post_comes_first_regardless_of_popularity() {
        let feed = rank(vec![
            candidate(1, at(0), 100, 100),
            candidate(2, at(5), 0, 0),
        ]);

        assert_eq!(ids(&feed), vec![2, 1]);
    }

    #[test]
    fn popularity_breaks_timestamp_ties() {
        let feed = rank(vec![
            candidate(1, at(0), 1, 0),
            candidate(2, at(0), 4, 2),
            candidate(3, at(0), 2, 1),
        ]);

        assert_eq!(ids(&feed), vec![2, 3, 1]);
        assert!((feed[0].popularity - 2.6).abs() < 1e-9);
    }

    #[test]
    fn equal_timestamp_and_popularity_fall_back_to_id() {
        let feed = rank(vec![candidate(3, at(0), 0, 0), candidate(9, at(0), 0, 0)]);
        assert_eq!(ids(&feed), vec![9, 3]);
    }

    #[test]
    fn post_matching_several_signals_appears_once() {
        let feed = rank(vec![
            candidate(7, at(1), 0, 0),
            candidate(8, at(2), 0, 0),
            candidate(7, at(1), 0, 0),
            candidate(7, at(1), 0, 0),
        ]);

        assert_eq!(ids(&feed), vec![8, 7]);
    }

    #[test]
    fn unpopular_posts_still_qualify() {
        let feed = rank(vec![candidate(1, at(0), 0, 0)]);

        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].popularity, 0.0);
    }

    #[test]
    fn entries_keep_display_fields() {
        let mut hello = candidate(1, at(0), 0, 0);
        hello.author = "austen".to_string();
        hello.content = "Hello".to_string();
        hello.book_title = Some("Emma".to_string());

        let feed = rank(vec![hello]);

        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].author, "austen");
        assert_eq!(feed[0].content, "Hello");
        assert_eq!(feed[0].book_title.as_deref(), Some("Emma"));
    }
}
