//! Telegram Bot API transport.
//!
//! Renders assignments into chat messages (inline keyboard for choice
//! assignments, a plain prompt for text assignments), delivers them via
//! `sendMessage`, and long-polls `getUpdates` for inbound events.
//!
//! Callback buttons carry their answer as `answer_<assignment>_<label>`
//! so a click can be graded without any per-chat state.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use quizcast_core::error::DeliveryError;
use quizcast_core::model::{Assignment, AssignmentId, AssignmentKind, RecipientId};
use quizcast_core::traits::Transport;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CALLBACK_PREFIX: &str = "answer_";

/// Telegram Bot API transport.
pub struct TelegramTransport {
    token: String,
    base_url: String,
    client: reqwest::Client,
    // getUpdates confirmation offset; advances past consumed updates.
    offset: AtomicI64,
}

impl TelegramTransport {
    pub fn new(token: &str, base_url: Option<String>) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            // poll timeout plus slack so long polls are not cut short
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS + 10))
            .build()
            .map_err(|e| DeliveryError::NetworkError(e.to_string()))?;

        Ok(Self {
            token: token.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
            offset: AtomicI64::new(0),
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Send a plain text message; used for verdicts and reports.
    pub async fn send_text(
        &self,
        recipient: RecipientId,
        text: &str,
    ) -> Result<(), DeliveryError> {
        self.send_message(recipient, text, None).await
    }

    async fn send_message(
        &self,
        recipient: RecipientId,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), DeliveryError> {
        let body = SendMessageRequest {
            chat_id: recipient,
            text: text.to_string(),
            reply_markup,
        };

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(classify_request_error)?;

        check_status(response).await.map(|_| ())
    }

    /// Long-poll for inbound events, advancing the update offset past
    /// everything returned.
    pub async fn poll_updates(
        &self,
        timeout_secs: u64,
    ) -> Result<Vec<InboundEvent>, DeliveryError> {
        let body = GetUpdatesRequest {
            offset: self.offset.load(Ordering::SeqCst),
            timeout: timeout_secs,
        };

        let response = self
            .client
            .post(self.api_url("getUpdates"))
            .json(&body)
            .send()
            .await
            .map_err(classify_request_error)?;

        let payload: UpdatesResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| DeliveryError::ApiError {
                status: 0,
                message: format!("failed to parse updates: {e}"),
            })?;

        let mut events = Vec::new();
        for update in payload.result {
            self.offset
                .fetch_max(update.update_id + 1, Ordering::SeqCst);
            if let Some(event) = InboundEvent::from_update(update) {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Acknowledge a callback query so the client stops its spinner.
    pub async fn answer_callback(&self, callback_id: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.api_url("answerCallbackQuery"))
            .json(&serde_json::json!({ "callback_query_id": callback_id }))
            .send()
            .await
            .map_err(classify_request_error)?;
        check_status(response).await.map(|_| ())
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    #[instrument(skip(self, assignment), fields(assignment_id = assignment.id))]
    async fn deliver(
        &self,
        recipient: RecipientId,
        assignment: &Assignment,
    ) -> Result<(), DeliveryError> {
        match &assignment.kind {
            AssignmentKind::Choice { options } => {
                let text = format!("Assignment #{}\n\n{}", assignment.id, assignment.question);
                let keyboard = InlineKeyboardMarkup {
                    inline_keyboard: options
                        .iter()
                        .map(|o| {
                            vec![InlineKeyboardButton {
                                text: format!("{}) {}", o.label, o.text),
                                callback_data: format!(
                                    "{CALLBACK_PREFIX}{}_{}",
                                    assignment.id, o.label
                                ),
                            }]
                        })
                        .collect(),
                };
                self.send_message(recipient, &text, Some(keyboard)).await
            }
            AssignmentKind::Text => {
                let text = format!(
                    "Assignment #{}\n\n{}\n\nReply with your answer as a plain message.",
                    assignment.id, assignment.question
                );
                self.send_message(recipient, &text, None).await
            }
        }
    }
}

fn classify_request_error(e: reqwest::Error) -> DeliveryError {
    if e.is_timeout() {
        DeliveryError::Timeout(DEFAULT_TIMEOUT_SECS)
    } else {
        DeliveryError::NetworkError(e.to_string())
    }
}

/// Map a Telegram response status to a delivery outcome.
///
/// 403 means the recipient blocked the bot; a 400 "chat not found"
/// means the id never resolved. Both are permanent for that recipient.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DeliveryError> {
    let status = response.status().as_u16();
    if status < 400 {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ApiError>(&body).ok();
    let description = parsed
        .as_ref()
        .map(|e| e.description.clone())
        .unwrap_or(body);

    match status {
        403 => Err(DeliveryError::Blocked),
        400 if description.to_lowercase().contains("chat not found") => {
            Err(DeliveryError::RecipientNotFound)
        }
        429 => {
            let retry_after_secs = parsed
                .and_then(|e| e.parameters)
                .map(|p| p.retry_after)
                .unwrap_or(5);
            Err(DeliveryError::RateLimited { retry_after_secs })
        }
        _ => Err(DeliveryError::ApiError {
            status,
            message: description,
        }),
    }
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A `/command` message, with anything after the command verb.
    Command {
        recipient: RecipientId,
        command: String,
        args: String,
    },
    /// A plain text message (candidate free-text answer).
    TextReply {
        recipient: RecipientId,
        text: String,
    },
    /// An answer-button click.
    ChoiceClick {
        recipient: RecipientId,
        callback_id: String,
        assignment_id: AssignmentId,
        label: String,
    },
}

impl InboundEvent {
    fn from_update(update: Update) -> Option<Self> {
        if let Some(callback) = update.callback_query {
            let data = callback.data?;
            let (assignment_id, label) = parse_callback_data(&data)?;
            return Some(InboundEvent::ChoiceClick {
                recipient: callback.from.id,
                callback_id: callback.id,
                assignment_id,
                label,
            });
        }

        let message = update.message?;
        let text = message.text?;
        let recipient = message.chat.id;

        if let Some(rest) = text.strip_prefix('/') {
            let (command, args) = match rest.split_once(char::is_whitespace) {
                Some((c, a)) => (c.to_string(), a.trim().to_string()),
                None => (rest.to_string(), String::new()),
            };
            Some(InboundEvent::Command {
                recipient,
                command,
                args,
            })
        } else {
            Some(InboundEvent::TextReply { recipient, text })
        }
    }
}

/// Parse `answer_<assignment>_<label>` callback data.
///
/// Splits on the first underscore after the id, so labels containing
/// underscores still round-trip, although authored labels are normally
/// "A".."Z".
pub fn parse_callback_data(data: &str) -> Option<(AssignmentId, String)> {
    let rest = data.strip_prefix(CALLBACK_PREFIX)?;
    let (id, label) = rest.split_once('_')?;
    let assignment_id = id.parse().ok()?;
    if label.is_empty() {
        return None;
    }
    Some((assignment_id, label.to_string()))
}

// --- wire types ------------------------------------------------------

#[derive(Serialize)]
struct SendMessageRequest {
    chat_id: RecipientId,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct InlineKeyboardMarkup {
    inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Serialize)]
struct InlineKeyboardButton {
    text: String,
    callback_data: String,
}

#[derive(Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
}

#[derive(Deserialize)]
struct UpdatesResponse {
    result: Vec<Update>,
}

#[derive(Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    callback_query: Option<CallbackQuery>,
}

#[derive(Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Chat {
    id: RecipientId,
}

#[derive(Deserialize)]
struct CallbackQuery {
    id: String,
    from: User,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Deserialize)]
struct User {
    id: RecipientId,
}

#[derive(Deserialize)]
struct ApiError {
    description: String,
    #[serde(default)]
    parameters: Option<ApiErrorParameters>,
}

#[derive(Deserialize)]
struct ApiErrorParameters {
    retry_after: u64,
}
