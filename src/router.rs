use std::str::FromStr;

use async_trait::async_trait;
use chrono::Local;

use crate::{
    api::{foxess::Cloud, telegram::ChatId},
    prelude::*,
    report::{Energy, History, RealTime, Status, produce},
};

pub const GREETING: &str = "Bem-vindo ao Bot da FoxESS! Escolha uma opção:";

/// Outbound side of the chat.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result;

    /// Send the `text` along with a button per action.
    async fn send_menu(&self, chat_id: ChatId, text: &str, actions: &[Action]) -> Result;

    /// Tell the chat client that the button press was received.
    async fn acknowledge(&self, callback_query_id: &str) -> Result;
}

/// User-selectable action, identified by its callback token.
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display)]
pub enum Action {
    #[display("real_time")]
    RealTime,

    #[display("energy")]
    Energy,

    #[display("status")]
    Status,

    #[display("history")]
    History,
}

impl Action {
    pub const ALL: [Self; 4] = [Self::RealTime, Self::Energy, Self::Status, Self::History];

    /// Menu button label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::RealTime => "📊 Dados em tempo real",
            Self::Energy => "⚡ Produção de energia",
            Self::Status => "🔄 Atualizar Status",
            Self::History => "📈 Histórico do dia",
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.to_string() == token)
            .with_context(|| format!("unknown action `{token}`"))
    }
}

/// Dispatches chat actions to the reports.
pub struct Router<C, T> {
    cloud: C,
    transport: T,
    serial_number: String,
}

impl<C: Cloud, T: Transport> Router<C, T> {
    pub const fn new(cloud: C, transport: T, serial_number: String) -> Self {
        Self { cloud, transport, serial_number }
    }

    #[instrument(skip_all, fields(chat_id = chat_id))]
    pub async fn greet(&self, chat_id: ChatId) -> Result {
        info!("greeting…");
        self.transport.send_menu(chat_id, GREETING, &Action::ALL).await
    }

    /// Failures are only logged: the reply follows regardless.
    pub async fn acknowledge(&self, callback_query_id: &str) {
        if let Err(error) = self.transport.acknowledge(callback_query_id).await {
            warn!("failed to acknowledge the callback query: {error:#}");
        }
    }

    /// Run the report behind the `token` and reply with it.
    ///
    /// Unknown tokens are ignored without a reply.
    #[instrument(skip_all, fields(chat_id = chat_id, token = token))]
    pub async fn route(&self, chat_id: ChatId, token: &str) -> Result {
        let Ok(action) = token.parse::<Action>() else {
            debug!("ignoring the unknown action");
            return Ok(());
        };
        info!(%action, "routing…");
        let now = Local::now();
        let serial_number = self.serial_number.as_str();
        let text = match action {
            Action::RealTime => produce::<RealTime, _>(&self.cloud, serial_number, now).await,
            Action::Energy => produce::<Energy, _>(&self.cloud, serial_number, now).await,
            Action::Status => produce::<Status, _>(&self.cloud, serial_number, now).await,
            Action::History => produce::<History, _>(&self.cloud, serial_number, now).await,
        };
        self.transport.send_text(chat_id, &text).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::{
        api::foxess,
        report::{Report, format},
    };

    /// Replies to every path with a fixed response, recording the calls.
    struct FakeCloud {
        response: serde_json::Value,
        calls: Mutex<Vec<(Method, String, serde_json::Value)>>,
    }

    impl FakeCloud {
        fn new(response: serde_json::Value) -> Self {
            Self { response, calls: Mutex::default() }
        }
    }

    #[async_trait]
    impl<'a> Cloud for &'a FakeCloud {
        async fn call(
            &self,
            method: Method,
            path: &str,
            params: serde_json::Value,
        ) -> Result<serde_json::Value> {
            self.calls.lock().unwrap().push((method, path.to_owned(), params));
            Ok(self.response.clone())
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        sent: Mutex<Vec<(ChatId, String, Vec<Action>)>>,
        acknowledged: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl<'a> Transport for &'a FakeTransport {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result {
            self.sent.lock().unwrap().push((chat_id, text.to_owned(), Vec::new()));
            Ok(())
        }

        async fn send_menu(&self, chat_id: ChatId, text: &str, actions: &[Action]) -> Result {
            self.sent.lock().unwrap().push((chat_id, text.to_owned(), actions.to_vec()));
            Ok(())
        }

        async fn acknowledge(&self, callback_query_id: &str) -> Result {
            self.acknowledged.lock().unwrap().push(callback_query_id.to_owned());
            Ok(())
        }
    }

    #[test]
    fn test_action_tokens() -> Result {
        for action in Action::ALL {
            assert_eq!(action.to_string().parse::<Action>()?, action);
        }
        assert_eq!("real_time".parse::<Action>()?, Action::RealTime);
        assert!("realtime".parse::<Action>().is_err());
        assert!("".parse::<Action>().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_greet_sends_menu() -> Result {
        let cloud = FakeCloud::new(json!({}));
        let transport = FakeTransport::default();
        Router::new(&cloud, &transport, "60BH".to_owned()).greet(42).await?;
        let sent = transport.sent.lock().unwrap();
        assert_eq!(*sent, [(42, GREETING.to_owned(), Action::ALL.to_vec())]);
        assert!(cloud.calls.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_acknowledge_ok() {
        let cloud = FakeCloud::new(json!({}));
        let transport = FakeTransport::default();
        Router::new(&cloud, &transport, "60BH".to_owned()).acknowledge("cb-1").await;
        assert_eq!(*transport.acknowledged.lock().unwrap(), ["cb-1"]);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_route_unknown_token_is_ignored() -> Result {
        let cloud = FakeCloud::new(json!({}));
        let transport = FakeTransport::default();
        Router::new(&cloud, &transport, "60BH".to_owned()).route(42, "reboot").await?;
        assert!(transport.sent.lock().unwrap().is_empty());
        assert!(cloud.calls.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_route_status_ok() -> Result {
        let response = json!({
            "errno": 0,
            "result": {"status": 1, "hasBattery": true, "hasPV": false},
        });
        let cloud = FakeCloud::new(response.clone());
        let transport = FakeTransport::default();
        Router::new(&cloud, &transport, "60BH".to_owned()).route(7, "status").await?;

        let calls = cloud.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Method::GET);
        assert_eq!(calls[0].1, foxess::DEVICE_DETAIL_PATH);
        assert_eq!(calls[0].2, json!({"sn": "60BH"}));

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 7);
        assert_eq!(sent[0].1, format::<Status>(response)?);
        assert!(sent[0].1.contains("Online"));
        Ok(())
    }

    #[tokio::test]
    async fn test_route_vendor_error_replies_with_failure() -> Result {
        let cloud = FakeCloud::new(json!({"errno": 40256, "msg": "illegal signature"}));
        let transport = FakeTransport::default();
        let router = Router::new(&cloud, &transport, "60BH".to_owned());
        router.route(7, "real_time").await?;
        router.route(7, "energy").await?;
        router.route(7, "history").await?;

        let paths: Vec<_> = cloud.calls.lock().unwrap().iter().map(|call| call.1.clone()).collect();
        assert_eq!(paths, [foxess::REAL_TIME_PATH, foxess::REPORT_PATH, foxess::HISTORY_PATH]);

        let replies: Vec<_> =
            transport.sent.lock().unwrap().iter().map(|sent| sent.1.clone()).collect();
        assert_eq!(replies, [RealTime::FAILURE, Energy::FAILURE, History::FAILURE]);
        Ok(())
    }
}
