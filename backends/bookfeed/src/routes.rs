use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    BoxError, Json, Router,
};
use serde_json::json;
use tower::{buffer::BufferLayer, limit::RateLimitLayer, ServiceBuilder};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{api, AppState};

fn api_routes() -> Router<AppState> {
    Router::new()
        // ==== AUTH ==== //
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        .route("/auth/token/refresh", post(api::auth::refresh_token))
        // ==== USERS ==== //
        .route("/users/me", get(api::auth::me).put(api::users::update_me))
        .route("/users/:id", get(api::users::get_profile))
        .route("/users/:id/follow", post(api::users::follow))
        .route("/users/:id/unfollow", post(api::users::unfollow))
        .route("/users/:id/followers", get(api::users::followers))
        .route("/users/:id/following", get(api::users::following))
        .route("/users/:id/posts", get(api::posts::user_posts))
        // ==== BOOKS ==== //
        .route("/books", get(api::books::get_books).post(api::books::create))
        .route("/books/search", get(api::books::search))
        .route(
            "/books/:id",
            get(api::books::get_one)
                .put(api::books::update)
                .delete(api::books::delete),
        )
        .route(
            "/books/:id/tags",
            get(api::tags::book_tags).post(api::tags::attach),
        )
        .route("/books/:id/tags/:tag_id", delete(api::tags::detach))
        .route("/genres", get(api::books::genres))
        // ==== TAGS ==== //
        .route("/tags", get(api::tags::get_tags).post(api::tags::create))
        .route("/tags/:id", delete(api::tags::delete))
        // ==== POSTS ==== //
        .route("/posts", get(api::posts::get_posts).post(api::posts::create))
        .route(
            "/posts/:id",
            get(api::posts::get_one)
                .put(api::posts::update)
                .delete(api::posts::delete),
        )
        .route(
            "/posts/:id/comments",
            get(api::comments::get_comments).post(api::comments::create),
        )
        .route("/posts/:id/like", post(api::likes::like))
        .route("/posts/:id/unlike", post(api::likes::unlike))
        .route("/comments/:id", delete(api::comments::delete))
        // ==== FEED ==== //
        .route("/feeds", get(api::feed::get_feed))
        // ==== BOOKMARKS ==== //
        .route(
            "/bookmarks",
            get(api::bookmarks::get_bookmarks).delete(api::bookmarks::clear),
        )
        .route(
            "/bookmarks/:id",
            post(api::bookmarks::add)
                .put(api::bookmarks::update)
                .delete(api::bookmarks::remove),
        )
        // ==== QUOTES ==== //
        .route("/quotes", get(api::quotes::get_quotes))
        .route(
            "/quotes/books/:book_id",
            get(api::quotes::book_quotes).post(api::quotes::create),
        )
        .route(
            "/quotes/:id",
            get(api::quotes::get_one).delete(api::quotes::delete),
        )
        // ==== NOTIFICATIONS ==== //
        .route("/notifications", get(api::notifications::get_notifications))
        .route("/notifications/read", post(api::notifications::read_all))
        .route(
            "/notifications/:id",
            get(api::notifications::get_one).delete(api::notifications::delete),
        )
        // ==== MOODS ==== //
        .route("/moods", get(api::moods::get_moods))
        .route(
            "/moods/active",
            get(api::moods::get_active).post(api::moods::activate),
        )
        .route("/moods/active/:id", delete(api::moods::deactivate))
        // ==== AI ==== //
        .route("/recommendations", get(api::recommendations::recommend))
        .route("/recommendations/cached", get(api::recommendations::cached))
        .route("/summaries", get(api::summaries::get_summaries))
        .route(
            "/summaries/books/:id",
            post(api::summaries::summarize_book),
        )
}

pub fn generate_routes(state: AppState, rate_limit_per_second: u64) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .fallback(handler_404)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|err: BoxError| async move {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Unhandled error: {}", err),
                    )
                }))
                .layer(BufferLayer::new(1024))
                .layer(RateLimitLayer::new(
                    rate_limit_per_second.max(1),
                    Duration::from_secs(1),
                )),
        )
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "nothing to see here" })),
    )
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        testing::{test_state, token_for},
        utils::jwt::TokenKind,
    };

    fn app() -> (Router, AppState) {
        let state = test_state();
        (generate_routes(state.clone(), 1000), state)
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn feed_requires_a_token() {
        let (app, _) = app();
        let (status, body) = send(app, request(Method::GET, "/api/v1/feeds", None, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn own_profile_is_readable_under_users() {
        let (app, _) = app();
        let (status, body) = send(app, request(Method::GET, "/api/v1/users/me", None, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn garbage_tokens_are_unauthorized() {
        let (app, _) = app();
        let (status, _) = send(
            app,
            request(Method::GET, "/api/v1/feeds", Some("not.a.jwt"), None),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_tokens_do_not_open_regular_routes() {
        let (app, state) = app();
        let refresh = token_for(&state, 7, TokenKind::Refresh);

        let (status, _) = send(
            app,
            request(Method::GET, "/api/v1/feeds", Some(&refresh), None),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_paths_fall_back_to_404() {
        let (app, _) = app();
        let (status, body) = send(app, request(Method::GET, "/api/v2/feeds", None, None)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "nothing to see here");
    }

    #[tokio::test]
    async fn invalid_registration_is_rejected_before_storage() {
        let (app, _) = app();
        let payload = serde_json::json!({
            "username": "jo",
            "email": "jo@example.com",
            "password": "longenough",
            "confirm_password": "different",
            "bio": "hi",
        });

        let (status, _) = send(
            app,
            request(Method::POST, "/api/v1/auth/register", None, Some(payload)),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn blank_mood_is_a_bad_request() {
        let (app, state) = app();
        let access = token_for(&state, 7, TokenKind::Access);

        let (status, body) = send(
            app,
            request(
                Method::GET,
                "/api/v1/recommendations?mood=%20%20",
                Some(&access),
                None,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Mood should not be empty.");
    }

    #[tokio::test]
    async fn users_cannot_follow_themselves() {
        let (app, state) = app();
        let access = token_for(&state, 7, TokenKind::Access);

        let (status, body) = send(
            app,
            request(Method::POST, "/api/v1/users/7/follow", Some(&access), None),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "You cannot follow yourself.");
    }

    #[tokio::test]
    async fn search_needs_a_title_or_author() {
        let (app, state) = app();
        let access = token_for(&state, 7, TokenKind::Access);

        let (status, _) = send(
            app,
            request(Method::GET, "/api/v1/books/search?title=", Some(&access), None),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
