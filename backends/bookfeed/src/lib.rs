pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod llm;
pub mod notify;
pub mod recommend;
pub mod routes;
pub mod summarize;
pub mod telemetry;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    config::Config,
    llm::ChatClient,
    recommend::{LlmRecommender, RecommendationProvider},
    summarize::{LlmSummarizer, SummaryProvider},
    utils::jwt::JwtKeys,
};

/// Services shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jwt: JwtKeys,
    pub recommender: Arc<dyn RecommendationProvider>,
    pub summarizer: Arc<dyn SummaryProvider>,
    pub http: reqwest::Client,
    pub summary_max_chars: usize,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        let chat = ChatClient::new(&config.llm_base_url, &config.llm_api_key);

        Self {
            pool,
            jwt: JwtKeys::new(
                &config.jwt_secret,
                chrono::Duration::minutes(config.access_token_minutes),
                chrono::Duration::days(config.refresh_token_days),
            ),
            recommender: Arc::new(LlmRecommender::new(
                chat.clone(),
                &config.recommendation_model,
            )),
            summarizer: Arc::new(LlmSummarizer::new(chat, &config.summary_model)),
            http: reqwest::Client::new(),
            summary_max_chars: config.summary_max_chars,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> PgPool {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(app_state: &AppState) -> JwtKeys {
        app_state.jwt.clone()
    }
}

impl FromRef<AppState> for Arc<dyn RecommendationProvider> {
    fn from_ref(app_state: &AppState) -> Arc<dyn RecommendationProvider> {
        app_state.recommender.clone()
    }
}

impl FromRef<AppState> for Arc<dyn SummaryProvider> {
    fn from_ref(app_state: &AppState) -> Arc<dyn SummaryProvider> {
        app_state.summarizer.clone()
    }
}
