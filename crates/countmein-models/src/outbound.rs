//! The closed set of outbound Bot API operations.
//!
//! Each variant carries exactly the parameters its method accepts, so a
//! request cannot be constructed with a mismatched parameter set. The
//! delivery worker serializes the active variant's fields as the JSON body
//! and posts it to `<api_base>/<method>`.

use serde::Serialize;

use crate::keyboard::InlineKeyboardMarkup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
}

/// Where an edit lands: a regular chat message or an inline-posted message.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageTarget {
    Chat { chat_id: i64, message_id: i64 },
    Inline { inline_message_id: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageText {
    #[serde(flatten)]
    pub target: MessageTarget,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageReplyMarkup {
    #[serde(flatten)]
    pub target: MessageTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerInlineQuery {
    pub inline_query_id: String,
    pub results: Vec<InlineQueryResultArticle>,
    pub cache_time: u32,
    pub switch_pm_text: String,
    pub switch_pm_parameter: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineQueryResultArticle {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub title: String,
    pub description: String,
    pub input_message_content: InputMessageContent,
    pub reply_markup: InlineKeyboardMarkup,
    pub thumbnail_url: String,
}

impl InlineQueryResultArticle {
    pub fn new(
        id: String,
        title: String,
        description: String,
        input_message_content: InputMessageContent,
        reply_markup: InlineKeyboardMarkup,
        thumbnail_url: String,
    ) -> Self {
        Self {
            kind: "article",
            id,
            title,
            description,
            input_message_content,
            reply_markup,
            thumbnail_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InputMessageContent {
    pub message_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BotRequest {
    SendMessage(SendMessage),
    EditMessageText(EditMessageText),
    EditMessageReplyMarkup(EditMessageReplyMarkup),
    AnswerCallbackQuery(AnswerCallbackQuery),
    AnswerInlineQuery(AnswerInlineQuery),
}

impl BotRequest {
    /// The Bot API method name this request is posted to.
    pub fn method(&self) -> &'static str {
        match self {
            BotRequest::SendMessage(_) => "sendMessage",
            BotRequest::EditMessageText(_) => "editMessageText",
            BotRequest::EditMessageReplyMarkup(_) => "editMessageReplyMarkup",
            BotRequest::AnswerCallbackQuery(_) => "answerCallbackQuery",
            BotRequest::AnswerInlineQuery(_) => "answerInlineQuery",
        }
    }
}

impl From<SendMessage> for BotRequest {
    fn from(value: SendMessage) -> Self {
        BotRequest::SendMessage(value)
    }
}

impl From<EditMessageText> for BotRequest {
    fn from(value: EditMessageText) -> Self {
        BotRequest::EditMessageText(value)
    }
}

impl From<EditMessageReplyMarkup> for BotRequest {
    fn from(value: EditMessageReplyMarkup) -> Self {
        BotRequest::EditMessageReplyMarkup(value)
    }
}

impl From<AnswerCallbackQuery> for BotRequest {
    fn from(value: AnswerCallbackQuery) -> Self {
        BotRequest::AnswerCallbackQuery(value)
    }
}

impl From<AnswerInlineQuery> for BotRequest {
    fn from(value: AnswerInlineQuery) -> Self {
        BotRequest::AnswerInlineQuery(value)
    }
}
