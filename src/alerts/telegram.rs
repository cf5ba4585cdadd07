//! Telegram Bot API alerter.

use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::alerts::Alerter;
use crate::config::{TELEGRAM_API_BASE, TELEGRAM_MAX_MESSAGE_LEN, TELEGRAM_TIMEOUT};
use crate::error_handling::AlertError;

/// Splits `text` into chunks of at most `limit` characters.
///
/// Breaks at the last newline inside the window when it falls in the second
/// half of the window; otherwise splits hard at `limit`. The newline used as a
/// break is dropped.
pub fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest: &[char] = &chars;
    while !rest.is_empty() {
        if rest.len() <= limit {
            chunks.push(rest.iter().collect());
            break;
        }
        let split_at = match rest[..limit].iter().rposition(|&c| c == '\n') {
            Some(i) if i >= limit / 2 => i,
            _ => limit,
        };
        let (part, tail) = rest.split_at(split_at);
        rest = tail.strip_prefix(&['\n']).unwrap_or(tail);
        if !part.is_empty() {
            chunks.push(part.iter().collect());
        }
    }
    chunks
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

/// Sends alert text to one Telegram chat.
pub struct TelegramAlerter {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
    parse_mode: Option<String>,
}

impl std::fmt::Debug for TelegramAlerter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramAlerter")
            .field("api_base", &self.api_base)
            .field("chat_id", &self.chat_id)
            .field("parse_mode", &self.parse_mode)
            .finish_non_exhaustive()
    }
}

impl TelegramAlerter {
    /// # Errors
    ///
    /// Returns `AlertError::Http` if the HTTP client cannot be built.
    pub fn new(
        token: impl Into<String>,
        chat_id: impl Into<String>,
        parse_mode: Option<String>,
    ) -> Result<Self, AlertError> {
        let client = reqwest::Client::builder()
            .timeout(TELEGRAM_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
            parse_mode: parse_mode.filter(|mode| !mode.trim().is_empty()),
        })
    }

    /// Overrides the Bot API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn send_chunk(&self, url: &str, chunk: &str) -> Result<(), AlertError> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: chunk,
            parse_mode: self.parse_mode.as_deref(),
        };
        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Rejected(format!("HTTP {status}")));
        }
        let reply: Value = response.json().await?;
        if reply.get("ok").and_then(Value::as_bool) != Some(true) {
            let description = reply
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("ok=false");
            return Err(AlertError::Rejected(description.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Alerter for TelegramAlerter {
    /// Sends every chunk in order; a failed chunk does not stop the rest.
    async fn send_text(&self, text: &str) -> Result<(), AlertError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let mut first_error = None;
        for chunk in chunk_text(text, TELEGRAM_MAX_MESSAGE_LEN) {
            if let Err(e) = self.send_chunk(&url, &chunk).await {
                debug!("Telegram chunk failed: {e}");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_chunk_short_text_untouched() {
        assert_eq!(chunk_text("hello", 10), vec!["hello"]);
        assert_eq!(chunk_text("", 10), vec![""]);
    }

    #[test]
    fn test_chunk_prefers_newlines() {
        let text = "aaaaaaa\nbbbbbbb\nccc";
        assert_eq!(chunk_text(text, 10), vec!["aaaaaaa", "bbbbbbb", "ccc"]);
    }

    #[test]
    fn test_chunk_hard_split_without_late_newline() {
        let text = "a\nbbbbbbbbbbbbbbbbbb";
        let chunks = chunk_text(text, 8);
        assert_eq!(chunks[0], "a\nbbbbbb");
        assert!(chunks.iter().all(|c| c.chars().count() <= 8));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_chunk_counts_characters_not_bytes() {
        let text = "é".repeat(10);
        let chunks = chunk_text(&text, 4);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[tokio::test]
    async fn test_send_text_posts_each_chunk() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_partial_json(serde_json::json!({"chat_id": "42", "parse_mode": "HTML"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(2)
            .mount(&server)
            .await;

        let alerter = TelegramAlerter::new("TOKEN", "42", Some("HTML".into()))
            .expect("alerter")
            .with_api_base(server.uri());
        let long = format!("{}\n{}", "x".repeat(4000), "y".repeat(200));
        alerter.send_text(&long).await.expect("sent");
    }

    #[tokio::test]
    async fn test_send_text_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"ok": false, "description": "chat not found"}),
            ))
            .mount(&server)
            .await;

        let alerter = TelegramAlerter::new("TOKEN", "42", None)
            .expect("alerter")
            .with_api_base(server.uri());
        match alerter.send_text("hi").await {
            Err(AlertError::Rejected(msg)) => assert_eq!(msg, "chat not found"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
