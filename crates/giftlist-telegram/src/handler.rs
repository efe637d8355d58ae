// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update routing and mapping into channel-agnostic events.
//!
//! Only private chats are served. Text starting with `/` becomes a
//! [`InboundEvent::Command`], other text becomes [`InboundEvent::Text`], and
//! callback queries become [`InboundEvent::Button`].

use giftlist_core::types::{InboundEvent, UserIdentity};
use teloxide::types::{CallbackQuery, ChatKind, Message, User};

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Public identity of a Telegram user.
pub fn identity(user: &User) -> UserIdentity {
    // Telegram ids fit in 52 bits.
    let mut identity = UserIdentity::new(user.id.0 as i64);
    identity.handle = user.username.clone().filter(|h| !h.is_empty());
    let name = user.full_name();
    if !name.trim().is_empty() {
        identity.name = Some(name);
    }
    identity
}

/// Splits `/name@bot args` into a lowercase command name and trimmed args.
///
/// Returns `None` for text that is not a command, or for a command
/// explicitly addressed to a different bot.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<(String, String)> {
    let body = text.strip_prefix('/')?;
    let (head, args) = match body.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (body, ""),
    };
    let name = match head.split_once('@') {
        Some((name, target)) => {
            if let Some(me) = bot_username
                && !target.eq_ignore_ascii_case(me)
            {
                return None;
            }
            name
        }
        None => head,
    };
    if name.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), args.to_string()))
}

/// Maps a private text message to an inbound event.
///
/// Returns `None` for messages without a sender or without text
/// (stickers, photos, and so on).
pub fn message_to_event(msg: &Message, bot_username: Option<&str>) -> Option<InboundEvent> {
    let from = identity(msg.from.as_ref()?);
    let text = msg.text()?;
    let chat_id = msg.chat.id.0;

    if let Some((name, args)) = parse_command(text, bot_username) {
        return Some(InboundEvent::Command {
            from,
            chat_id,
            name,
            args,
        });
    }

    Some(InboundEvent::Text {
        from,
        chat_id,
        text: text.to_string(),
    })
}

/// Maps a callback query to an inbound event.
///
/// Returns `None` for queries without data or from a non-private chat. When
/// the originating message is unavailable the user id doubles as the chat id,
/// which holds for private chats.
pub fn callback_to_event(query: &CallbackQuery) -> Option<InboundEvent> {
    let payload = query.data.clone()?;
    let chat_id = match query.message.as_ref() {
        Some(message) => {
            let chat = message.chat();
            if !chat.is_private() {
                return None;
            }
            chat.id.0
        }
        None => query.from.id.0 as i64,
    };

    Some(InboundEvent::Button {
        from: identity(&query.from),
        chat_id,
        callback_id: query.id.to_string(),
        payload,
    })
}
