//! Mood-based book recommendations and the per-user recommendation cache.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    db::{normalize_mood_names, BookId, MoodId, NewBook, UserId},
    error::AppResult,
    llm::{ChatClient, ChatRequest, WireMessage},
};

const RECOMMENDER_PROMPT: &str = r#"You are a reading companion that recommends books for the reader's mood of the day.
Only recommend books. Prefer public-domain titles available from https://www.gutenberg.org/cache/epub/ and link their files there.
Answer with a JSON object of this shape:
{
    "reasoning": "why these books suit the mood",
    "books": [
        {
            "title": "book title",
            "author": "book author",
            "description": "short description",
            "file_url": "link to the book file",
            "genre": "genre",
            "cover_image_url": "link to a cover image",
            "year_published": 1813,
            "isbn": "ISBN if known"
        }
    ]
}"#;

/// What the recommender suggested for a mood.
#[derive(Debug, Clone, Default)]
pub struct Suggestions {
    pub reasoning: String,
    pub books: Vec<NewBook>,
}

#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    async fn recommend(&self, mood: &str) -> Result<Suggestions>;
}

pub struct LlmRecommender {
    chat: ChatClient,
    model: String,
}

impl LlmRecommender {
    pub fn new(chat: ChatClient, model: &str) -> Self {
        Self {
            chat,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl RecommendationProvider for LlmRecommender {
    async fn recommend(&self, mood: &str) -> Result<Suggestions> {
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::system(RECOMMENDER_PROMPT))
            .message(WireMessage::user(format!(
                "Today I am feeling {mood}. Recommend five books for me to read."
            )))
            .temperature(1.0)
            .max_tokens(4096)
            .json_object();

        let content = self.chat.complete(&request).await?;
        Ok(parse_suggestions(&content))
    }
}

fn text_field(book: &Value, key: &str) -> Option<String> {
    book.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Longest title, author or ISBN the catalog columns hold.
const CATALOG_FIELD_MAX_CHARS: usize = 255;

fn bounded_field(book: &Value, key: &str) -> Option<String> {
    text_field(book, key).filter(|value| value.chars().count() <= CATALOG_FIELD_MAX_CHARS)
}

fn year_field(book: &Value) -> Option<i32> {
    let year = book.get("year_published").or_else(|| book.get("year_pusblished"))?;
    match year {
        Value::Number(number) => number.as_i64().and_then(|year| i32::try_from(year).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn suggested_book(book: &Value) -> Option<NewBook> {
    Some(NewBook {
        title: bounded_field(book, "title")?,
        author: bounded_field(book, "author")?,
        description: text_field(book, "description"),
        genre: text_field(book, "genre"),
        cover_image_url: text_field(book, "cover_image_url"),
        file_url: text_field(book, "file_url"),
        year_published: year_field(book),
        isbn: bounded_field(book, "isbn"),
    })
}

/// Reads the recommender's JSON answer. Anything unreadable yields no books;
/// entries without a usable title or author are dropped.
pub fn parse_suggestions(content: &str) -> Suggestions {
    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(err) => {
            warn!(%err, "recommendation response is not JSON");
            return Suggestions::default();
        }
    };

    let reasoning = value
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let books = value
        .get("books")
        .and_then(Value::as_array)
        .map(|books| books.iter().filter_map(suggested_book).collect())
        .unwrap_or_default();

    Suggestions { reasoning, books }
}

/// Storage operations the recommendation cache needs. One store instance is
/// one unit of work: the Postgres store wraps a single transaction.
#[async_trait]
pub trait RecommendationStore: Send {
    async fn ensure_mood(&mut self, name: &str) -> AppResult<MoodId>;
    /// A catalog book with the same ISBN or the same title (case-insensitive).
    async fn find_book(&mut self, book: &NewBook) -> AppResult<Option<BookId>>;
    async fn insert_book(&mut self, owner: UserId, book: &NewBook) -> AppResult<BookId>;
    async fn tag_book_mood(&mut self, book_id: BookId, mood_id: MoodId) -> AppResult<()>;
    /// Returns `false` when the (user, book) recommendation already existed.
    async fn link_recommendation(&mut self, user_id: UserId, book_id: BookId) -> AppResult<bool>;
}

#[derive(Debug, Clone, Serialize)]
pub struct CachedBook {
    pub book_id: BookId,
    pub newly_cataloged: bool,
    pub newly_recommended: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheOutcome {
    pub books: Vec<CachedBook>,
}

impl CacheOutcome {
    pub fn book_ids(&self) -> Vec<BookId> {
        self.books.iter().map(|book| book.book_id).collect()
    }

    pub fn cataloged(&self) -> usize {
        self.books.iter().filter(|book| book.newly_cataloged).count()
    }

    pub fn recommended(&self) -> usize {
        self.books.iter().filter(|book| book.newly_recommended).count()
    }
}

/// Links every suggested book to `viewer`, reusing catalog entries where
/// possible. Safe to repeat: existing books and recommendations are skipped.
pub async fn cache_recommendations<S>(
    store: &mut S,
    viewer: UserId,
    mood: &str,
    books: &[NewBook],
) -> AppResult<CacheOutcome>
where
    S: RecommendationStore + ?Sized,
{
    let mood_id = match normalize_mood_names(&[mood]).first() {
        Some(name) => Some(store.ensure_mood(name).await?),
        None => None,
    };

    let mut outcome = CacheOutcome::default();
    for book in books {
        let (book_id, newly_cataloged) = match store.find_book(book).await? {
            Some(book_id) => (book_id, false),
            None => (store.insert_book(viewer, book).await?, true),
        };

        if let Some(mood_id) = mood_id {
            store.tag_book_mood(book_id, mood_id).await?;
        }

        let newly_recommended = store.link_recommendation(viewer, book_id).await?;
        outcome.books.push(CachedBook {
            book_id,
            newly_cataloged,
            newly_recommended,
        });
    }

    info!(
        viewer,
        mood,
        cataloged = outcome.cataloged(),
        recommended = outcome.recommended(),
        "recommendations cached"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::error::AppError;

    #[derive(Default)]
    struct MemoryStore {
        books: Vec<(BookId, NewBook, UserId)>,
        moods: HashMap<String, MoodId>,
        book_moods: HashSet<(BookId, MoodId)>,
        recommendations: HashSet<(UserId, BookId)>,
        fail_on_title: Option<&'static str>,
    }

    #[async_trait]
    impl RecommendationStore for MemoryStore {
        async fn ensure_mood(&mut self, name: &str) -> AppResult<MoodId> {
            let next = self.moods.len() as MoodId + 1;
            Ok(*self.moods.entry(name.to_string()).or_insert(next))
        }

        async fn find_book(&mut self, book: &NewBook) -> AppResult<Option<BookId>> {
            Ok(self
                .books
                .iter()
                .find(|(_, existing, _)| {
                    (book.isbn.is_some() && existing.isbn == book.isbn)
                        || existing.title.to_lowercase() == book.title.to_lowercase()
                })
                .map(|(id, _, _)| *id))
        }

        async fn insert_book(&mut self, owner: UserId, book: &NewBook) -> AppResult<BookId> {
            if self.fail_on_title == Some(book.title.as_str()) {
                return Err(AppError::Anyhow(anyhow::anyhow!("disk full")));
            }
            let id = self.books.len() as BookId + 1;
            self.books.push((id, book.clone(), owner));
            Ok(id)
        }

        async fn tag_book_mood(&mut self, book_id: BookId, mood_id: MoodId) -> AppResult<()> {
            self.book_moods.insert((book_id, mood_id));
            Ok(())
        }

        async fn link_recommendation(&mut self, user_id: UserId, book_id: BookId) -> AppResult<bool> {
            Ok(self.recommendations.insert((user_id, book_id)))
        }
    }

    fn book(title: &str, isbn: Option<&str>) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Jane Austen".to_string(),
            isbn: isbn.map(str::to_string),
            ..NewBook::default()
        }
    }

    #[tokio::test]
    async fn caches_new_books_for_the_viewer() {
        let mut store = MemoryStore::default();
        let books = vec![book("Emma", None), book("Persuasion", None)];

        let outcome = cache_recommendations(&mut store, 1, "Cheerful", &books)
            .await
            .unwrap();

        assert_eq!(outcome.cataloged(), 2);
        assert_eq!(outcome.recommended(), 2);
        assert_eq!(store.books.len(), 2);
        assert!(store.books.iter().all(|(_, _, owner)| *owner == 1));
        assert_eq!(store.moods.get("cheerful"), Some(&1));
        assert_eq!(store.book_moods.len(), 2);
    }

    #[tokio::test]
    async fn repeating_the_same_batch_adds_no_rows() {
        let mut store = MemoryStore::default();
        let books = vec![book("Emma", None), book("Persuasion", None)];

        cache_recommendations(&mut store, 1, "calm", &books).await.unwrap();
        let (book_rows, recommendation_rows) = (store.books.len(), store.recommendations.len());

        let again = cache_recommendations(&mut store, 1, "calm", &books).await.unwrap();

        assert_eq!(store.books.len(), book_rows);
        assert_eq!(store.recommendations.len(), recommendation_rows);
        assert_eq!(again.cataloged(), 0);
        assert_eq!(again.recommended(), 0);
        assert_eq!(again.book_ids(), vec![1, 2]);
    }

    #[tokio::test]
    async fn reuses_catalog_books_by_title_or_isbn() {
        let mut store = MemoryStore::default();
        cache_recommendations(&mut store, 1, "calm", &[book("Emma", Some("978-0"))])
            .await
            .unwrap();

        let outcome = cache_recommendations(
            &mut store,
            2,
            "calm",
            &[book("EMMA", None), book("Emma (Penguin Classics)", Some("978-0"))],
        )
        .await
        .unwrap();

        assert_eq!(store.books.len(), 1);
        assert_eq!(outcome.book_ids(), vec![1, 1]);
        assert_eq!(outcome.recommended(), 1);
        assert!(store.recommendations.contains(&(2, 1)));
    }

    #[tokio::test]
    async fn blank_mood_skips_mood_tagging() {
        let mut store = MemoryStore::default();

        cache_recommendations(&mut store, 1, "   ", &[book("Emma", None)])
            .await
            .unwrap();

        assert!(store.moods.is_empty());
        assert!(store.book_moods.is_empty());
        assert_eq!(store.recommendations.len(), 1);
    }

    #[tokio::test]
    async fn stops_at_the_first_failing_book() {
        let mut store = MemoryStore {
            fail_on_title: Some("Persuasion"),
            ..MemoryStore::default()
        };
        let books = vec![book("Emma", None), book("Persuasion", None), book("Sanditon", None)];

        let result = cache_recommendations(&mut store, 1, "calm", &books).await;

        assert!(result.is_err());
        assert!(store.books.iter().all(|(_, book, _)| book.title != "Sanditon"));
    }

    #[test]
    fn parses_recommender_answers() {
        let suggestions = parse_suggestions(
            r#"{
                "reasoning": "Light comedies for a bright day.",
                "books": [
                    {"title": "Emma", "author": "Jane Austen", "year_published": 1815, "genre": "Comedy"},
                    {"title": "Cranford", "author": "Elizabeth Gaskell", "year_pusblished": "1853", "isbn": ""}
                ]
            }"#,
        );

        assert_eq!(suggestions.reasoning, "Light comedies for a bright day.");
        assert_eq!(suggestions.books.len(), 2);
        assert_eq!(suggestions.books[0].year_published, Some(1815));
        assert_eq!(suggestions.books[0].genre.as_deref(), Some("Comedy"));
        assert_eq!(suggestions.books[1].year_published, Some(1853));
        assert_eq!(suggestions.books[1].isbn, None);
    }

    #[test]
    fn malformed_answers_yield_no_books() {
        assert!(parse_suggestions("not json at all").books.is_empty());
        assert!(parse_suggestions(r#"{"books": "five"}"#).books.is_empty());
        assert!(parse_suggestions(r#"[1, 2, 3]"#).books.is_empty());
    }

    #[test]
    fn drops_books_without_title_or_author() {
        let suggestions = parse_suggestions(
            r#"{"books": [{"title": "Emma"}, {"author": "Anon"}, {"title": " ", "author": "X"}, {"title": "Ok", "author": "Y"}]}"#,
        );

        assert_eq!(suggestions.books.len(), 1);
        assert_eq!(suggestions.books[0].title, "Ok");
    }

    #[test]
    fn drops_books_too_long_for_the_catalog() {
        let long = "a".repeat(300);
        let content = serde_json::json!({
            "books": [
                {"title": long, "author": "Jane Austen"},
                {"title": "Emma", "author": long},
                {"title": "Persuasion", "author": "Jane Austen", "isbn": long},
                {"title": "b".repeat(255), "author": "Anon"}
            ]
        })
        .to_string();

        let suggestions = parse_suggestions(&content);

        assert_eq!(suggestions.books.len(), 2);
        assert_eq!(suggestions.books[0].title, "Persuasion");
        assert_eq!(suggestions.books[0].isbn, None);
        assert_eq!(suggestions.books[1].title.chars().count(), 255);
    }
}
