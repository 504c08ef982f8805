use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::prompt::{build_prompt, truncate_chars, MAX_TRANSLATION_CHARS, WELCOME_MESSAGE};
use super::sessions::ChatSessions;
use crate::error::{ApiError, ApiResult};
use crate::language::Language;
use crate::llm::{ChatMessage, StatelessLLMInterface};
use crate::store::{DocumentStore, BOOKINGS};
use crate::translate::TranslateInterface;

/// Question answering, welcome text and booking intake.
///
/// Every handle is set once at startup and only read afterwards. Without a
/// session id each question is answered with a fresh, empty conversation.
pub struct AssistantService {
    llm: Arc<dyn StatelessLLMInterface>,
    translator: Arc<dyn TranslateInterface>,
    store: Arc<dyn DocumentStore>,
    sessions: Option<ChatSessions>,
}

impl AssistantService {
    pub fn new(
        llm: Arc<dyn StatelessLLMInterface>,
        translator: Arc<dyn TranslateInterface>,
        store: Arc<dyn DocumentStore>,
        sessions: Option<ChatSessions>,
    ) -> Self {
        Self {
            llm,
            translator,
            store,
            sessions,
        }
    }

    /// Greeting in the requested language. Unknown names are still sent
    /// through the translator, targeting English.
    pub async fn welcome(&self, language: Option<&str>) -> ApiResult<String> {
        let name = language.unwrap_or("english").trim().to_lowercase();
        if name == Language::English.name() {
            return Ok(WELCOME_MESSAGE.to_string());
        }

        let target = Language::from_name_or_default(&name);
        self.translator
            .translate(WELCOME_MESSAGE, None, target.code())
            .await
            .map_err(ApiError::Upstream)
    }

    pub async fn ask(
        &self,
        question: Option<&str>,
        language: Option<&str>,
        session_id: Option<&str>,
    ) -> ApiResult<String> {
        let question = question
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ApiError::InvalidInput("Please provide a question".to_string()))?;
        let language: Language = language.unwrap_or("english").parse()?;

        let prompt = build_prompt(question);
        let answer = match (session_id, &self.sessions) {
            (Some(id), Some(sessions)) => {
                let history = sessions.session(id);
                // Held across the model call so turns of one session stay ordered
                let mut history = history.lock().await;
                let mut messages = history.clone();
                messages.push(ChatMessage::user(prompt.clone()));

                let answer = self.complete(&messages).await?;
                sessions.record_turn(&mut history, prompt, answer.clone());
                debug!("Session {} now holds {} message(s)", id, history.len());
                answer
            }
            _ => self.complete(&[ChatMessage::user(prompt)]).await?,
        };

        if language.is_english() {
            return Ok(answer);
        }

        let short_answer = truncate_chars(answer.trim(), MAX_TRANSLATION_CHARS);
        self.translator
            .translate(short_answer, None, language.code())
            .await
            .map_err(ApiError::Upstream)
    }

    async fn complete(&self, messages: &[ChatMessage]) -> ApiResult<String> {
        self.llm
            .chat_completion(messages)
            .await
            .map_err(ApiError::Upstream)
    }

    /// Persist a booking from an arbitrary JSON object. Status defaults to
    /// "pending" and `createdAt` to the store's clock.
    pub async fn create_booking(&self, body: Value) -> ApiResult<Map<String, Value>> {
        let Value::Object(mut fields) = body else {
            return Err(ApiError::BookingCreate(anyhow::anyhow!(
                "booking payload must be a JSON object"
            )));
        };

        fields.remove("id");
        fields
            .entry("status")
            .or_insert_with(|| json!("pending"));
        let server_timestamps: &[&str] = if fields.contains_key("createdAt") {
            &[]
        } else {
            &["createdAt"]
        };

        let doc = self
            .store
            .create(BOOKINGS, fields, server_timestamps)
            .await
            .map_err(|e| ApiError::BookingCreate(e.into()))?;
        info!("Created booking {}", doc.id);
        Ok(doc.into_record())
    }
}
