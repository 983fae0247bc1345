use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use anyhow::{anyhow, Result};
use futures::future::join_all;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{config::SETTINGS, util::http};

static TELEGRAM: Lazy<Arc<OnceLock<Telegram>>> = Lazy::new(|| Arc::new(OnceLock::new()));

struct Telegram {
    client: Client,
    send_message_url: String,
}

impl Telegram {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http::build_client(Duration::from_secs(15), "quote_collector")?,
            send_message_url: format!(
                "https://api.telegram.org/bot{}/sendMessage",
                SETTINGS.bot.telegram.token
            ),
        })
    }

    pub async fn send(&self, message: &str) -> Result<()> {
        let futures: Vec<_> = SETTINGS
            .bot
            .telegram
            .allowed
            .keys()
            .map(|id| self.send_message(SendMessageRequest::new(*id, message)))
            .collect();

        join_all(futures)
            .await
            .into_iter()
            .find(|res| res.is_err())
            .unwrap_or_else(|| Ok(()))
    }

    async fn send_message(&self, payload: SendMessageRequest<'_>) -> Result<()> {
        http::post_use_json::<SendMessageRequest, SendMessageResponse>(
            &self.client,
            &self.send_message_url,
            None,
            Some(&payload),
        )
        .await
        .map_err(|err| anyhow!("Failed to send_message because: {:?}", err))?;

        Ok(())
    }
}

fn get_client() -> Result<&'static Telegram> {
    if let Some(t) = TELEGRAM.get() {
        return Ok(t);
    }

    let telegram = Telegram::new()?;

    Ok(TELEGRAM.get_or_init(|| telegram))
}

#[derive(Serialize, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    result: Option<Message>,
}

#[derive(Serialize, Deserialize)]
struct Message {
    message_id: i64,
}

#[derive(Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
}

impl<'a> SendMessageRequest<'a> {
    pub fn new(chat_id: i64, text: &'a str) -> SendMessageRequest<'_> {
        SendMessageRequest { chat_id, text }
    }
}

/// 將訊息送給所有允許的 chat,未設定 token 時視為停用,靜默略過
pub async fn send(msg: &str) -> Result<()> {
    if SETTINGS.bot.telegram.token.is_empty() {
        return Ok(());
    }

    get_client()?.send(msg).await
}
