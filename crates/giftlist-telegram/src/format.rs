// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound formatting for the Telegram Bot API.
//!
//! Rendered screens are HTML whose tags never span a line break, so long
//! lists can be split at paragraph or line boundaries without breaking
//! markup. The inline keyboard is converted to teloxide's markup type.

use giftlist_core::types::Button;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Maximum text length Telegram accepts in one message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Converts rows of dialog buttons into an inline keyboard.
///
/// Returns `None` for an empty keyboard so no markup is attached.
pub fn inline_keyboard(rows: &[Vec<Button>]) -> Option<InlineKeyboardMarkup> {
    if rows.is_empty() {
        return None;
    }
    let rows = rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.payload.clone()))
            .collect::<Vec<_>>()
    });
    Some(InlineKeyboardMarkup::new(rows))
}

/// Splits text at a paragraph boundary before `max_chars` characters.
///
/// Priority: double newline > single newline > space > hard split. The
/// limit counts characters, and the split never lands inside a code point.
pub fn split_at_paragraph_boundary(text: &str, max_chars: usize) -> (&str, &str) {
    let cut = match text.char_indices().nth(max_chars) {
        Some((idx, _)) => idx,
        None => return (text, ""),
    };

    let search_region = &text[..cut];

    if let Some(pos) = search_region.rfind("\n\n") {
        return (&text[..pos], text[pos + 2..].trim_start());
    }

    if let Some(pos) = search_region.rfind('\n') {
        return (&text[..pos], text[pos + 1..].trim_start());
    }

    if let Some(pos) = search_region.rfind(' ') {
        return (&text[..pos], &text[pos + 1..]);
    }

    (&text[..cut], &text[cut..])
}

/// Splits a message into chunks Telegram will accept.
pub fn split_message(text: &str, max_chars: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    loop {
        let (head, tail) = split_at_paragraph_boundary(rest, max_chars);
        if !head.is_empty() || chunks.is_empty() {
            chunks.push(head);
        }
        if tail.is_empty() {
            return chunks;
        }
        rest = tail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_keyboard_has_no_markup() {
        assert!(inline_keyboard(&[]).is_none());
    }

    #[test]
    fn keyboard_keeps_row_layout() {
        let rows = vec![
            vec![Button::new("✏️ Книга", "edit:1"), Button::new("🗑", "del:1")],
            vec![Button::new("➕ Добавить подарок", "owner:add")],
        ];
        let markup = inline_keyboard(&rows).unwrap();
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[0][1].text, "🗑");
        assert_eq!(markup.inline_keyboard[1][0].text, "➕ Добавить подарок");
    }

    #[test]
    fn split_short_text_is_untouched() {
        let (first, rest) = split_at_paragraph_boundary("Короткий текст", 100);
        assert_eq!(first, "Короткий текст");
        assert_eq!(rest, "");
    }

    #[test]
    fn split_prefers_gift_paragraphs() {
        let text = "1. <b>Книга</b>\n   <i>любая</i>\n\n2. <b>Чай</b>";
        let (first, rest) = split_at_paragraph_boundary(text, 40);
        assert_eq!(first, "1. <b>Книга</b>\n   <i>любая</i>");
        assert_eq!(rest, "2. <b>Чай</b>");
    }

    #[test]
    fn split_falls_back_to_single_newline() {
        let text = "Первая строка\nВторая строка подлиннее";
        let (first, rest) = split_at_paragraph_boundary(text, 20);
        assert_eq!(first, "Первая строка");
        assert_eq!(rest, "Вторая строка подлиннее");
    }

    #[test]
    fn hard_split_respects_char_boundaries() {
        let text = "абвгдежзийклмн";
        let (first, rest) = split_at_paragraph_boundary(text, 5);
        assert_eq!(first, "абвгд");
        assert_eq!(rest, "ежзийклмн");
    }

    #[test]
    fn split_message_covers_whole_text() {
        let gifts: Vec<String> = (1..=300)
            .map(|i| format!("{i}. <b>Подарок номер {i}</b> — ○ свободно"))
            .collect();
        let text = gifts.join("\n\n");
        let chunks = split_message(&text, MAX_MESSAGE_CHARS);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_MESSAGE_CHARS));
        assert_eq!(chunks.join("\n\n"), text);
    }

    #[test]
    fn split_message_keeps_empty_text_as_one_chunk() {
        assert_eq!(split_message("", 10), vec![""]);
    }
}
