use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::prelude::*;

/// Chat identifier as Telegram assigns it.
pub type ChatId = i64;

#[derive(Clone)]
pub struct Api {
    client: Client,
    base_url: String,
    polling_timeout: Duration,
}

impl Api {
    pub fn new(token: &str, polling_timeout: Duration) -> Result<Self> {
        ensure!(!token.is_empty(), "Telegram token is required");
        let client = Client::builder()
            .user_agent("foxbot")
            .timeout(polling_timeout.saturating_add(Duration::from_secs(10)))
            .build()?;
        let base_url = format!("https://api.telegram.org/bot{token}");
        Ok(Self { client, base_url, polling_timeout })
    }

    /// Long-poll the pending updates starting from the `offset`.
    #[instrument(skip_all, level = Level::DEBUG, fields(offset = ?offset))]
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            #[serde(skip_serializing_if = "Option::is_none")]
            offset: Option<i64>,

            timeout: u64,

            allowed_updates: &'static [&'static str],
        }

        self.post(
            "getUpdates",
            &GetUpdatesRequest {
                offset,
                timeout: self.polling_timeout.as_secs(),
                allowed_updates: &["message", "callback_query"],
            },
        )
        .await
    }

    #[instrument(skip_all, fields(chat_id = request.chat_id))]
    pub async fn send_message(&self, request: &SendMessage<'_>) -> Result {
        debug!("sending…");
        self.post::<_, serde_json::Value>("sendMessage", request)
            .await
            .context("failed to send the message")?;
        Ok(())
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result {
        #[derive(Serialize)]
        struct AnswerCallbackQueryRequest<'a> {
            callback_query_id: &'a str,
        }

        let request = AnswerCallbackQueryRequest { callback_query_id };
        self.post::<_, bool>("answerCallbackQuery", &request)
            .await
            .context("failed to answer the callback query")?;
        Ok(())
    }

    async fn post<B, R>(&self, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        self.client
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await
            .with_context(|| format!("failed to call `{method}`"))?
            .json::<Response<R>>()
            .await
            .with_context(|| format!("failed to deserialize `{method}` response JSON"))?
            .into()
    }
}

/// Bot API response envelope.
#[derive(Deserialize)]
struct Response<R> {
    ok: bool,
    description: Option<String>,
    result: Option<R>,
}

impl<R> From<Response<R>> for Result<R> {
    fn from(response: Response<R>) -> Self {
        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => bail!("Telegram returned no result"),
            (false, _) => bail!(
                "Telegram error: {}",
                response.description.as_deref().unwrap_or("no description")
            ),
        }
    }
}

#[derive(Deserialize)]
pub struct Update {
    #[serde(rename = "update_id")]
    pub id: i64,

    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub id: String,

    /// Absent when the original message is too old.
    pub message: Option<Message>,

    pub data: Option<String>,
}

#[derive(Serialize, bon::Builder)]
pub struct SendMessage<'a> {
    pub chat_id: ChatId,
    pub text: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup<'a>>,
}

#[derive(Serialize)]
pub struct InlineKeyboardMarkup<'a> {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton<'a>>>,
}

#[derive(Serialize)]
pub struct InlineKeyboardButton<'a> {
    pub text: &'a str,
    pub callback_data: &'a str,
}
