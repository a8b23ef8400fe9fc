use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use validator::Validate;

use crate::{
    api::non_blank,
    auth::AuthUser,
    db::{self, create_book, get_book, list_books, list_genres, search_books, BookId, NewBook, UserId},
    error::{AppError, AppResult},
};

const DEFAULT_PER_PAGE: i64 = 10;
const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_prev: bool,
    pub next_page: Option<i64>,
    pub prev_page: Option<i64>,
}

impl PageQuery {
    /// Clamped `(page, per_page)`.
    fn resolve(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }
}

fn page_meta(page: i64, per_page: i64, total: i64) -> PageMeta {
    let has_next = page * per_page < total;
    let has_prev = page > 1;

    PageMeta {
        page,
        per_page,
        total,
        has_next,
        has_prev,
        next_page: has_next.then_some(page + 1),
        prev_page: has_prev.then_some(page - 1),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct BookPayload {
    #[validate(length(min = 1, max = 255, message = "title can't be blank"))]
    title: String,
    #[validate(length(min = 1, max = 255, message = "author can't be blank"))]
    author: String,
    #[validate(length(min = 1, message = "description can't be blank"))]
    description: String,
    genre: Option<String>,
    #[validate(url(message = "cover image must be a URL"))]
    cover_image_url: Option<String>,
    #[validate(url(message = "file must be a URL"))]
    file_url: Option<String>,
    #[validate(range(min = 0, max = 9999, message = "year is out of range"))]
    year_published: Option<i32>,
    #[validate(length(max = 255))]
    isbn: Option<String>,
}

impl From<BookPayload> for NewBook {
    fn from(payload: BookPayload) -> Self {
        NewBook {
            title: payload.title,
            author: payload.author,
            description: Some(payload.description),
            genre: non_blank(payload.genre.as_deref()).map(str::to_string),
            cover_image_url: payload.cover_image_url,
            file_url: payload.file_url,
            year_published: payload.year_published,
            isbn: non_blank(payload.isbn.as_deref()).map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    title: Option<String>,
    author: Option<String>,
}

// GET /api/v1/books
pub async fn get_books(
    State(pool): State<PgPool>,
    _: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = query.resolve();
    let (books, total) = list_books(&pool, per_page, (page - 1) * per_page).await?;

    Ok(Json(json!({
        "books": books,
        "meta": page_meta(page, per_page, total),
    })))
}

// POST /api/v1/books
pub async fn create(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<BookPayload>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let book_id = create_book(&pool, user_id, &payload.into()).await?;
    let book = get_book(&pool, book_id).await?;

    info!(book_id, user_id, "book created");
    Ok((StatusCode::CREATED, Json(json!({ "book": book }))))
}

// GET /api/v1/books/:id
pub async fn get_one(
    State(pool): State<PgPool>,
    _: AuthUser,
    Path(book_id): Path<BookId>,
) -> AppResult<impl IntoResponse> {
    let book = get_book(&pool, book_id).await?;
    Ok(Json(json!({ "book": book })))
}

// GET /api/v1/books/search
pub async fn search(
    State(pool): State<PgPool>,
    _: AuthUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let title = non_blank(query.title.as_deref());
    let author = non_blank(query.author.as_deref());

    if title.is_none() && author.is_none() {
        return Err(AppError::bad_request(
            "Provide a title or an author to search for.",
        ));
    }

    let books = search_books(&pool, title, author).await?;
    Ok(Json(json!({ "count": books.len(), "books": books })))
}

async fn owned_book(pool: &PgPool, book_id: BookId, user_id: UserId, action: &'static str) -> AppResult<()> {
    let book = get_book(pool, book_id).await?;
    if book.user_id != Some(user_id) {
        return Err(AppError::Forbidden(action));
    }
    Ok(())
}

// PUT /api/v1/books/:id
pub async fn update(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(book_id): Path<BookId>,
    Json(payload): Json<BookPayload>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    owned_book(&pool, book_id, user_id, "You can only edit books you added.").await?;

    db::update_book(&pool, book_id, user_id, &payload.into()).await?;
    let book = get_book(&pool, book_id).await?;

    Ok(Json(json!({ "book": book })))
}

// DELETE /api/v1/books/:id
pub async fn delete(
    State(pool): State<PgPool>,
    AuthUser(user_id): AuthUser,
    Path(book_id): Path<BookId>,
) -> AppResult<impl IntoResponse> {
    owned_book(&pool, book_id, user_id, "You can only delete books you added.").await?;

    db::delete_book(&pool, book_id, user_id).await?;

    info!(book_id, user_id, "book deleted");
    Ok(Json(json!({ "message": "Book deleted." })))
}

// GET /api/v1/genres
pub async fn genres(State(pool): State<PgPool>, _: AuthUser) -> AppResult<impl IntoResponse> {
    let genres = list_genres(&pool).await?;
    Ok(Json(json!({ "genres": genres })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_page_defaults_and_bounds() {
        assert_eq!(PageQuery::default().resolve(), (1, 10));

        let query = PageQuery {
            page: Some(0),
            per_page: Some(500),
        };
        assert_eq!(query.resolve(), (1, 100));
    }

    #[test]
    fn describes_neighbouring_pages() {
        let first = page_meta(1, 10, 25);
        assert!(first.has_next);
        assert!(!first.has_prev);
        assert_eq!(first.next_page, Some(2));
        assert_eq!(first.prev_page, None);

        let last = page_meta(3, 10, 25);
        assert!(!last.has_next);
        assert_eq!(last.prev_page, Some(2));
    }

    #[test]
    fn exact_multiple_has_no_next_page() {
        let meta = page_meta(2, 10, 20);
        assert!(!meta.has_next);
        assert_eq!(meta.next_page, None);
    }

    #[test]
    fn payload_becomes_catalog_entry() {
        let payload = BookPayload {
            title: "Emma".to_string(),
            author: "Jane Austen".to_string(),
            description: "A comedy of manners.".to_string(),
            genre: Some("  ".to_string()),
            cover_image_url: None,
            file_url: Some("https://www.gutenberg.org/cache/epub/158/pg158.txt".to_string()),
            year_published: Some(1815),
            isbn: None,
        };
        assert!(payload.validate().is_ok());

        let book: NewBook = payload.into();
        assert_eq!(book.genre, None);
        assert_eq!(book.description.as_deref(), Some("A comedy of manners."));
    }
}
