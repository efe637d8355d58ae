// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for the Giftlist bot.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling of private messages and callback queries, HTML messages
//! with inline keyboards, and callback answers.

pub mod format;
pub mod handler;

use async_trait::async_trait;
use giftlist_config::model::TelegramConfig;
use giftlist_core::error::GiftlistError;
use giftlist_core::traits::{ChannelAdapter, PluginAdapter};
use giftlist_core::types::{
    AdapterType, CallbackAnswer, HealthStatus, InboundEvent, MessageId, OutboundMessage,
};
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, ChatId, LinkPreviewOptions, ParseMode, Recipient};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Telegram channel adapter implementing [`ChannelAdapter`].
///
/// Connects to Telegram via long polling, ignores everything outside
/// private chats, and delivers rendered screens as HTML.
pub struct TelegramChannel {
    bot: Bot,
    bot_username: Option<String>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, GiftlistError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            GiftlistError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(GiftlistError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            bot_username: config
                .bot_username
                .map(|u| u.trim_start_matches('@').to_string())
                .filter(|u| !u.is_empty()),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// The bot's public username, from config or resolved on connect.
    pub fn bot_username(&self) -> Option<&str> {
        self.bot_username.as_deref()
    }

    /// Resolves the bot username via `getMe` when config did not set one.
    async fn resolve_username(&mut self) -> Result<(), GiftlistError> {
        if self.bot_username.is_some() {
            return Ok(());
        }
        let me = self.bot.get_me().await.map_err(|e| GiftlistError::Channel {
            message: format!("failed to query bot identity: {e}"),
            source: Some(Box::new(e)),
        })?;
        self.bot_username = me.user.username.clone();
        if self.bot_username.is_none() {
            warn!("bot has no username; share links will be unavailable");
        }
        Ok(())
    }

    async fn send_chunk(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<teloxide::types::InlineKeyboardMarkup>,
    ) -> Result<teloxide::types::Message, GiftlistError> {
        let mut request = self
            .bot
            .send_message(Recipient::Id(chat_id), text)
            .parse_mode(ParseMode::Html)
            .link_preview_options(LinkPreviewOptions {
                is_disabled: true,
                url: None,
                prefer_small_media: false,
                prefer_large_media: false,
                show_above_text: false,
            });
        if let Some(markup) = keyboard {
            request = request.reply_markup(markup);
        }
        request.await.map_err(|e| GiftlistError::Channel {
            message: format!("failed to send message: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, GiftlistError> {
        // Check if the bot token is valid by calling getMe.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), GiftlistError> {
        debug!("Telegram channel shutting down");
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), GiftlistError> {
        if self.polling_handle.is_some() {
            return Ok(()); // Already connected
        }

        self.resolve_username().await?;

        let bot = self.bot.clone();
        let message_tx = self.inbound_tx.clone();
        let callback_tx = self.inbound_tx.clone();
        let username = self.bot_username.clone();

        info!(bot_username = ?self.bot_username, "starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = dptree::entry()
                .branch(Update::filter_message().endpoint(move |msg: Message| {
                    let tx = message_tx.clone();
                    let username = username.clone();
                    async move {
                        if !handler::is_dm(&msg) {
                            debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                            return respond(());
                        }

                        match handler::message_to_event(&msg, username.as_deref()) {
                            Some(event) => {
                                if tx.send(event).await.is_err() {
                                    warn!("inbound channel closed, dropping message");
                                }
                            }
                            None => {
                                debug!(msg_id = msg.id.0, "ignoring unsupported message type");
                            }
                        }

                        respond(())
                    }
                }))
                .branch(Update::filter_callback_query().endpoint(
                    move |query: CallbackQuery| {
                        let tx = callback_tx.clone();
                        async move {
                            match handler::callback_to_event(&query) {
                                Some(event) => {
                                    if tx.send(event).await.is_err() {
                                        warn!("inbound channel closed, dropping callback");
                                    }
                                }
                                None => {
                                    debug!(query_id = %query.id, "ignoring callback query");
                                }
                            }
                            respond(())
                        }
                    },
                ));

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {}) // Silently ignore other updates
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, GiftlistError> {
        let chat_id = ChatId(msg.chat_id);
        let chunks = format::split_message(&msg.text, format::MAX_MESSAGE_CHARS);
        let last = chunks.len() - 1;
        let mut sent_id = None;

        // The keyboard rides on the final chunk so it sits under the list.
        for (i, chunk) in chunks.into_iter().enumerate() {
            let keyboard = if i == last {
                format::inline_keyboard(&msg.keyboard)
            } else {
                None
            };
            let sent = self.send_chunk(chat_id, chunk, keyboard).await?;
            sent_id = Some(sent.id.0);
        }

        sent_id
            .map(|id| MessageId(id.to_string()))
            .ok_or_else(|| GiftlistError::Internal("no message chunk was sent".into()))
    }

    async fn answer_callback(&self, answer: CallbackAnswer) -> Result<(), GiftlistError> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(answer.callback_id));
        if let Some(text) = answer.text {
            request = request.text(text);
        }
        match request.await {
            Ok(_) => Ok(()),
            Err(e) => {
                // Queries older than ~15 minutes can no longer be answered.
                if e.to_string().contains("query is too old") {
                    debug!(error = %e, "callback answer expired");
                    Ok(())
                } else {
                    Err(GiftlistError::Channel {
                        message: format!("failed to answer callback query: {e}"),
                        source: Some(Box::new(e)),
                    })
                }
            }
        }
    }

    async fn receive(&self) -> Result<InboundEvent, GiftlistError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| GiftlistError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }
}
