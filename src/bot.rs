use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{task::JoinHandle, time::sleep};

use crate::{
    api::{
        foxess::{self, Cloud},
        telegram::{self, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, SendMessage, Update},
    },
    prelude::*,
    router::{Action, Router, Transport},
};

/// Pause after a failed long poll.
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[async_trait]
impl Transport for telegram::Api {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result {
        self.send_message(&SendMessage::builder().chat_id(chat_id).text(text).build()).await
    }

    async fn send_menu(&self, chat_id: ChatId, text: &str, actions: &[Action]) -> Result {
        let tokens: Vec<_> = actions.iter().map(ToString::to_string).collect();
        let inline_keyboard = actions
            .iter()
            .zip(&tokens)
            .map(|(action, token)| {
                vec![InlineKeyboardButton { text: action.label(), callback_data: token.as_str() }]
            })
            .collect();
        let request = SendMessage::builder()
            .chat_id(chat_id)
            .text(text)
            .reply_markup(InlineKeyboardMarkup { inline_keyboard })
            .build();
        self.send_message(&request).await
    }

    async fn acknowledge(&self, callback_query_id: &str) -> Result {
        self.answer_callback_query(callback_query_id).await
    }
}

/// What an update asks the bot to do.
#[derive(Debug, Eq, PartialEq)]
enum Event<'a> {
    Greeting { chat_id: ChatId },
    Action { chat_id: ChatId, callback_query_id: &'a str, token: &'a str },
}

impl<'a> Event<'a> {
    fn from_update(update: &'a Update) -> Option<Self> {
        if let Some(message) = &update.message
            && let Some(text) = &message.text
            && is_start_command(text)
        {
            return Some(Self::Greeting { chat_id: message.chat.id });
        }
        let callback_query = update.callback_query.as_ref()?;
        Some(Self::Action {
            chat_id: callback_query.message.as_ref()?.chat.id,
            callback_query_id: callback_query.id.as_str(),
            token: callback_query.data.as_deref()?,
        })
    }
}

/// `/start`, optionally addressed to the bot as `/start@name`, with any payload.
fn is_start_command(text: &str) -> bool {
    text.split_whitespace().next().is_some_and(|command| {
        command == "/start" || command.strip_prefix("/start@").is_some_and(|name| !name.is_empty())
    })
}

pub struct Bot {
    telegram: telegram::Api,
    router: Arc<Router<foxess::Api, telegram::Api>>,
}

impl Bot {
    pub fn new(telegram: telegram::Api, fox_ess: foxess::Api, serial_number: String) -> Self {
        let router = Arc::new(Router::new(fox_ess, telegram.clone(), serial_number));
        Self { telegram, router }
    }

    /// Poll and dispatch the updates until the process is interrupted.
    pub async fn run(&self) -> Result {
        tokio::select! {
            result = self.poll() => result,
            result = tokio::signal::ctrl_c() => {
                info!("interrupted");
                result.context("failed to listen for Ctrl-C")
            }
        }
    }

    async fn poll(&self) -> Result {
        let mut offset = None;
        loop {
            let updates = match self.telegram.get_updates(offset).await {
                Ok(updates) => updates,
                Err(error) => {
                    warn!("failed to get the updates: {error:#}");
                    sleep(RETRY_DELAY).await;
                    continue;
                }
            };
            for update in updates {
                offset = Some(update.id + 1);
                dispatch(&self.router, update);
            }
        }
    }
}

/// Handle the update in its own task: a slow vendor call delays only its own reply.
fn dispatch<C, T>(router: &Arc<Router<C, T>>, update: Update) -> JoinHandle<()>
where
    C: Cloud + 'static,
    T: Transport + 'static,
{
    let router = Arc::clone(router);
    tokio::spawn(async move {
        if let Err(error) = handle(&router, &update).await {
            error!(update_id = update.id, "failed to handle the update: {error:#}");
        }
    })
}

#[instrument(skip_all, level = Level::DEBUG, fields(update_id = update.id))]
async fn handle<C: Cloud, T: Transport>(router: &Router<C, T>, update: &Update) -> Result {
    match Event::from_update(update) {
        Some(Event::Greeting { chat_id }) => router.greet(chat_id).await,
        Some(Event::Action { chat_id, callback_query_id, token }) => {
            router.acknowledge(callback_query_id).await;
            router.route(chat_id, token).await
        }
        None => {
            debug!("nothing to do");
            Ok(())
        }
    }
}
