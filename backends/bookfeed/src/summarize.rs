use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::llm::{ChatClient, ChatRequest, WireMessage};

const SUMMARIZER_PROMPT: &str = "You summarize books for readers deciding what to read next. \
Write a clear prose summary of the text you are given: the premise, the main characters, \
the central themes and the tone. Do not reveal the ending.";

#[async_trait]
pub trait SummaryProvider: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}

pub struct LlmSummarizer {
    chat: ChatClient,
    model: String,
}

impl LlmSummarizer {
    pub fn new(chat: ChatClient, model: &str) -> Self {
        Self {
            chat,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SummaryProvider for LlmSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::system(SUMMARIZER_PROMPT))
            .message(WireMessage::user(text))
            .temperature(0.4)
            .max_tokens(1024);

        let summary = self.chat.complete(&request).await?;
        Ok(summary.trim().to_string())
    }
}

/// At most `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// UTF-8 needs at most four bytes per character.
const MAX_BYTES_PER_CHAR: usize = 4;

fn byte_budget(max_chars: usize) -> usize {
    max_chars.saturating_mul(MAX_BYTES_PER_CHAR)
}

/// Appends `chunk` to `body` without growing past `budget` bytes.
/// Returns false once the budget is used up.
fn take_chunk(body: &mut Vec<u8>, chunk: &[u8], budget: usize) -> bool {
    let room = budget.saturating_sub(body.len());
    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
    body.len() < budget
}

/// Downloads a book file as text, reading no more than is needed for
/// `max_chars` characters.
pub async fn fetch_text(http: &reqwest::Client, url: &str, max_chars: usize) -> Result<String> {
    let mut response = http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("fetching {url} failed with {status}"));
    }

    let budget = byte_budget(max_chars);
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if !take_chunk(&mut body, &chunk, budget) {
            debug!(url, budget, "book file cut at byte budget");
            break;
        }
    }

    let text = String::from_utf8_lossy(&body);
    debug!(url, bytes = body.len(), "book file fetched");
    Ok(truncate_chars(&text, max_chars).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("Emma", 10), "Emma");
        assert_eq!(truncate_chars("Emma", 4), "Emma");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn cuts_on_character_boundaries() {
        assert_eq!(truncate_chars("Émile Zola", 3), "Émi");
        assert_eq!(truncate_chars("日本語の本", 2), "日本");
    }

    #[test]
    fn zero_limit_yields_nothing() {
        assert_eq!(truncate_chars("anything", 0), "");
    }

    #[test]
    fn body_stops_at_the_byte_budget() {
        let budget = byte_budget(3);
        let mut body = Vec::new();

        assert!(take_chunk(&mut body, b"Emma", budget));
        assert!(!take_chunk(&mut body, b" Woodhouse, handsome", budget));
        assert_eq!(body, b"Emma Woodhou");
        assert!(!take_chunk(&mut body, b"more", budget));
        assert_eq!(body.len(), budget);
    }

    #[test]
    fn budget_covers_multibyte_characters() {
        let text = "日本語";
        let mut body = Vec::new();
        take_chunk(&mut body, text.as_bytes(), byte_budget(3));

        assert_eq!(String::from_utf8_lossy(&body), text);
    }
}
