// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTML rendering of every screen the bot shows.
//!
//! All functions are pure: they take domain values and return a [`Reply`]
//! (text plus inline keyboard). The dialog decides which chat it goes to.

use chrono::{Datelike, NaiveDate};
use giftlist_core::{
    Button, CallbackAnswer, Event, EventId, Gift, GiftField, Outbound, OutboundMessage, UserId,
    user_label,
};

use crate::action::CallbackAction;

/// Rendered text with its keyboard, not yet addressed to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Vec<Vec<Button>>,
}

impl Reply {
    pub fn new(text: impl Into<String>, keyboard: Vec<Vec<Button>>) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }

    pub fn to(self, chat_id: i64) -> Outbound {
        Outbound::Message(OutboundMessage {
            chat_id,
            text: self.text,
            keyboard: self.keyboard,
        })
    }
}

/// A callback acknowledgement, optionally with a toast.
pub fn answer(callback_id: &str, toast: Option<&str>) -> Outbound {
    Outbound::Answer(CallbackAnswer {
        callback_id: callback_id.to_string(),
        text: toast.map(str::to_string),
    })
}

fn button(label: impl Into<String>, action: CallbackAction) -> Button {
    Button::new(label, action)
}

pub const CREATE_LABEL: &str = "📝 Создать свой вишлист";
pub const VIEW_LABEL: &str = "👀 Посмотреть чужой вишлист";
const OWNER_FALLBACK: &str = "Владелец";
const RESERVER_FALLBACK: &str = "кто-то";

const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// Escape text for Telegram's HTML mode, including `"` so the result is also
/// safe inside a quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// `15 июня 2025`.
pub fn format_date(date: NaiveDate) -> String {
    let month = MONTHS_GENITIVE[date.month0() as usize];
    format!("{} {month} {}", date.day(), date.year())
}

/// `15.06.2025`, the shape owners type dates in.
pub fn format_date_numeric(date: NaiveDate) -> String {
    format!("{:02}.{:02}.{:04}", date.day(), date.month(), date.year())
}

pub fn priority_stars(priority: u8) -> String {
    "⭐".repeat(priority.min(5) as usize)
}

pub fn priority_label(priority: u8) -> Option<&'static str> {
    match priority {
        1 => Some("мелочь"),
        2 => Some("приятно"),
        3 => Some("хочу"),
        4 => Some("очень хочу"),
        5 => Some("мечта"),
        _ => None,
    }
}

/// Shorten a title for a button label, counting characters rather than bytes.
pub fn truncate(title: &str, max: usize) -> String {
    if title.chars().count() > max {
        let cut: String = title.chars().take(max).collect();
        format!("{cut}…")
    } else {
        title.to_string()
    }
}

/// One numbered line of a gift list.
pub fn gift_line(gift: &Gift, index: usize, for_owner: bool) -> String {
    let status = match (gift.is_reserved(), for_owner) {
        (false, _) => " — ○ свободно".to_string(),
        (true, true) => " — будет подарен".to_string(),
        (true, false) => {
            let who = user_label(
                gift.reserved_by_handle.as_deref(),
                gift.reserved_by_name.as_deref(),
                RESERVER_FALLBACK,
            );
            format!(" — подарит {}", escape_html(&who))
        }
    };
    let mut line = format!("{}. <b>{}</b>{status}", index + 1, escape_html(&gift.title));
    if gift.priority > 0 {
        line.push(' ');
        line.push_str(&priority_stars(gift.priority));
        if let Some(label) = priority_label(gift.priority) {
            line.push_str(&format!(" ({label})"));
        }
    }
    if let Some(description) = &gift.description {
        line.push_str(&format!("\n   <i>{}</i>", escape_html(description)));
    }
    if let Some(link) = &gift.link {
        line.push_str(&format!(
            "\n   🔗 <a href=\"{}\">Ссылка</a>",
            escape_html(link)
        ));
    }
    line
}

fn gift_lines(gifts: &[Gift], for_owner: bool) -> String {
    gifts
        .iter()
        .enumerate()
        .map(|(i, g)| gift_line(g, i, for_owner))
        .collect::<Vec<_>>()
        .join("\n\n")
}

// --- Menus ---

pub fn choice_keyboard() -> Vec<Vec<Button>> {
    vec![
        vec![button(CREATE_LABEL, CallbackAction::MenuCreate)],
        vec![button(VIEW_LABEL, CallbackAction::MenuView)],
    ]
}

pub fn owner_menu(has_current_event: bool) -> Vec<Vec<Button>> {
    let mut rows = Vec::with_capacity(3);
    if has_current_event {
        rows.push(vec![button("📋 События", CallbackAction::OwnerEvents)]);
    }
    rows.push(vec![
        button("🎁 Мой список", CallbackAction::OwnerList),
        button("➕ Добавить", CallbackAction::OwnerAdd),
    ]);
    rows.push(vec![
        button("🔗 Ссылка", CallbackAction::OwnerShare),
        button("❓ Помощь", CallbackAction::OwnerHelp),
    ]);
    rows
}

fn home_keyboard() -> Vec<Vec<Button>> {
    vec![vec![button("◀️ Главное меню", CallbackAction::MenuHome)]]
}

fn cancel_row(label: &str) -> Vec<Button> {
    vec![button(label, CallbackAction::Cancel)]
}

pub fn welcome() -> Reply {
    Reply::new(
        "👋 Привет! Здесь можно собрать список желаемых подарков и поделиться им с друзьями, \
         а друзья смогут тайно выбрать, что подарить.\n\nЧто хотите сделать?",
        choice_keyboard(),
    )
}

// --- Owner screens ---

pub fn owner_list(event: &Event, gifts: &[Gift]) -> Reply {
    let mut text = format!("🎁 <b>{}</b>\n\n", escape_html(&event.title));
    if let Some(date) = event.event_date {
        text.push_str(&format!("📅 Дедлайн: {}\n\n", format_date(date)));
    }
    if gifts.is_empty() {
        text.push_str("Пока пусто. Нажми ➕ Добавить подарок.");
    } else {
        text.push_str(&gift_lines(gifts, true));
    }

    let mut keyboard: Vec<Vec<Button>> = gifts
        .iter()
        .map(|g| {
            vec![
                button(format!("✏️ {}", truncate(&g.title, 25)), CallbackAction::Edit(g.id)),
                button("🗑", CallbackAction::Delete(g.id)),
            ]
        })
        .collect();
    keyboard.push(vec![button("➕ Добавить подарок", CallbackAction::OwnerAdd)]);
    keyboard.push(vec![
        button("🔗 Ссылка", CallbackAction::OwnerShare),
        button("📅 Дедлайн", CallbackAction::Deadline(event.id)),
    ]);
    keyboard.push(vec![
        button("📋 К событиям", CallbackAction::OwnerEvents),
        button("❓ Помощь", CallbackAction::OwnerHelp),
    ]);
    keyboard.push(vec![button(
        "🗑 Удалить событие",
        CallbackAction::DeleteEvent(event.id),
    )]);
    Reply::new(text, keyboard)
}

pub fn events_list(events: &[Event]) -> Reply {
    if events.is_empty() {
        return Reply::new(
            "У вас пока нет событий. Нажмите «Создать свой вишлист».",
            choice_keyboard(),
        );
    }
    let mut keyboard: Vec<Vec<Button>> = events
        .iter()
        .map(|e| {
            vec![button(
                format!("🎂 {}", truncate(&e.title, 28)),
                CallbackAction::OpenEvent(e.id),
            )]
        })
        .collect();
    keyboard.push(vec![button("➕ Новое событие", CallbackAction::OwnerNewEvent)]);
    Reply::new(
        "📋 <b>Ваши события</b>\n\nВыберите событие, чтобы посмотреть или редактировать \
         список подарков. У каждого события своя ссылка.",
        keyboard,
    )
}

pub fn new_event_prompt() -> Reply {
    Reply::new(
        "➕ Введите <b>название события</b> (например: День рождения 2025, Новый год):",
        vec![cancel_row("❌ Отмена")],
    )
}

pub fn event_created(event: &Event) -> Reply {
    Reply::plain(format!(
        "✅ Событие «<b>{}</b>» создано! У него своя ссылка — нажмите 🔗 Ссылка.",
        escape_html(&event.title)
    ))
}

pub fn delete_event_confirm(event: &Event) -> Reply {
    Reply::new(
        format!(
            "🗑 Удалить событие «<b>{}</b>» вместе со всеми подарками?",
            escape_html(&event.title)
        ),
        vec![vec![
            button("✅ Да, удалить", CallbackAction::DeleteEventConfirm(event.id)),
            button("« Нет", CallbackAction::OwnerList),
        ]],
    )
}

// --- Add flow ---

pub fn add_title_prompt() -> Reply {
    Reply::new(
        "➕ Напиши <b>название подарка</b> (обязательно):",
        vec![cancel_row("« Отмена")],
    )
}

pub fn add_description_prompt() -> Reply {
    Reply::new(
        "📝 Добавить <b>описание</b>? (магазин, размер, цвет — по желанию)",
        vec![
            vec![button("⏭ Пропустить", CallbackAction::AddSkipDescription)],
            cancel_row("« Отмена"),
        ],
    )
}

pub fn add_link_prompt() -> Reply {
    Reply::new(
        "🔗 Добавить <b>ссылку</b> на товар?",
        vec![
            vec![button("⏭ Пропустить", CallbackAction::AddSkipLink)],
            cancel_row("« Отмена"),
        ],
    )
}

pub fn add_priority_prompt() -> Reply {
    let stars = (1..=5)
        .map(|n| button(priority_stars(n), CallbackAction::AddPriority(n)))
        .collect();
    Reply::new(
        "⭐ <b>Приоритет</b>: насколько это важно? (гости увидят звёздочки)",
        vec![
            stars,
            vec![button("⏭ Пропустить", CallbackAction::AddPriority(0))],
            cancel_row("« Отмена"),
        ],
    )
}

pub fn gift_added(title: &str, priority: u8, has_current_event: bool) -> Reply {
    let mut text = format!("✅ Подарок <b>{}</b> добавлен!", escape_html(title));
    if priority > 0 {
        text.push(' ');
        text.push_str(&priority_stars(priority));
    }
    Reply::new(text, owner_menu(has_current_event))
}

// --- Edit flow ---

pub fn edit_menu(gift: &Gift) -> Reply {
    Reply::new(
        format!("✏️ Что изменить в «<b>{}</b>»?", escape_html(&gift.title)),
        vec![
            vec![
                button("📌 Название", CallbackAction::EditField(gift.id, GiftField::Title)),
                button(
                    "📝 Описание",
                    CallbackAction::EditField(gift.id, GiftField::Description),
                ),
            ],
            vec![
                button("🔗 Ссылка", CallbackAction::EditField(gift.id, GiftField::Link)),
                button("⭐ Приоритет", CallbackAction::EditPriority(gift.id)),
            ],
            vec![button("◀️ Назад к списку", CallbackAction::OwnerList)],
        ],
    )
}

pub fn edit_field_prompt(field: GiftField) -> Reply {
    let text = match field {
        GiftField::Title => "Введите новое название:",
        GiftField::Description => "Введите описание (или «—» чтобы очистить):",
        GiftField::Link => "Введите ссылку (или «—» чтобы убрать):",
    };
    Reply::new(text, vec![cancel_row("« Отмена")])
}

pub fn priority_picker(gift: &Gift) -> Reply {
    let stars = (1..=5)
        .map(|n| button(priority_stars(n), CallbackAction::SetPriority(gift.id, n)))
        .collect();
    Reply::new(
        "⭐ Выберите приоритет (1 — мелочь, 5 — мечта):",
        vec![
            stars,
            vec![button("Убрать приоритет", CallbackAction::SetPriority(gift.id, 0))],
            vec![button("◀️ Назад", CallbackAction::Edit(gift.id))],
        ],
    )
}

pub fn priority_updated(priority: u8, has_current_event: bool) -> Reply {
    let text = match priority_label(priority) {
        Some(label) => format!("✅ Приоритет: {} {label}", priority_stars(priority)),
        None => "✅ Приоритет убран.".to_string(),
    };
    Reply::new(text, owner_menu(has_current_event))
}

pub fn gift_updated(title: &str, has_current_event: bool) -> Reply {
    Reply::new(
        format!("✅ Обновлено: <b>{}</b>", escape_html(title)),
        owner_menu(has_current_event),
    )
}

pub fn delete_gift_confirm(gift: &Gift) -> Reply {
    Reply::new(
        format!("🗑 Удалить подарок «<b>{}</b>»?", escape_html(&gift.title)),
        vec![vec![
            button("✅ Да, удалить", CallbackAction::DeleteConfirm(gift.id)),
            button("« Нет", CallbackAction::OwnerList),
        ]],
    )
}

// --- Deadline ---

pub fn deadline_screen(event: &Event) -> Reply {
    let date = event
        .event_date
        .map(format_date)
        .unwrap_or_else(|| "не указана".to_string());
    let remind = match event.remind_days_before {
        Some(days) if days > 0 => format!("за {days} дн."),
        _ => "не включено".to_string(),
    };
    let text = format!(
        "📅 <b>Дедлайн</b> — событие «{}»\n\n\
         Дата события: {date}\n\
         Напоминание владельцу: {remind}\n\n\
         Гости увидят «Подарки нужны до …». Вам придёт напоминание обновить список за N дней до даты.",
        escape_html(&event.title)
    );
    Reply::new(
        text,
        vec![
            vec![button("📆 Установить дату события", CallbackAction::SetDate(event.id))],
            vec![button("🔔 Напомнить за N дней", CallbackAction::SetRemind(event.id))],
            vec![button("🗑 Убрать дедлайн", CallbackAction::ClearDate(event.id))],
            vec![button("◀️ Назад к списку", CallbackAction::OwnerList)],
        ],
    )
}

pub fn date_prompt() -> Reply {
    Reply::new(
        "📆 Введите <b>дату события</b> в формате ДД.ММ.ГГГГ (например 15.06.2025) \
         или ДД.ММ (год — текущий):",
        vec![cancel_row("« Отмена")],
    )
}

pub fn date_set(date: NaiveDate, has_current_event: bool) -> Reply {
    Reply::new(
        format!(
            "✅ Дата события: {}. Можно настроить напоминание (кнопка «Дедлайн»).",
            format_date(date)
        ),
        owner_menu(has_current_event),
    )
}

pub fn remind_picker(event_id: EventId) -> Reply {
    let remind = |label: &str, days| button(label, CallbackAction::Remind(event_id, days));
    Reply::new(
        "🔔 Напомнить вам <b>обновить список</b> за сколько дней до даты события?",
        vec![
            vec![remind("1 день", 1), remind("3 дня", 3)],
            vec![remind("7 дней", 7), remind("14 дней", 14)],
            vec![remind("Убрать", 0)],
            vec![button("◀️ Назад", CallbackAction::Deadline(event_id))],
        ],
    )
}

pub fn remind_set(days: u32, has_current_event: bool) -> Reply {
    let text = if days == 0 {
        "✅ Напоминание отключено.".to_string()
    } else {
        format!("✅ Буду напоминать обновить список за {days} дн. до даты события.")
    };
    Reply::new(text, owner_menu(has_current_event))
}

pub fn deadline_cleared(has_current_event: bool) -> Reply {
    Reply::new(
        "✅ Дедлайн убран. Гости больше не увидят «Подарки нужны до …».",
        owner_menu(has_current_event),
    )
}

// --- Visitor ---

pub fn reference_prompt() -> Reply {
    Reply::new(
        "👀 Введите <b>@username</b> владельца вишлиста (например <code>@username</code>) \
         или перейдите по ссылке, которую он вам прислал.",
        home_keyboard(),
    )
}

pub fn reference_empty() -> Reply {
    Reply::new("Введите @username или ссылку.", home_keyboard())
}

pub fn reference_retry() -> Reply {
    Reply::new(
        "❌ Вишлист не найден. Введи @username или ссылку ещё раз — или вернись в главное меню.",
        home_keyboard(),
    )
}

pub fn start_reference_not_found() -> Reply {
    Reply::new(
        "❌ Вишлист не найден. Проверь ссылку или @username владельца.",
        choice_keyboard(),
    )
}

/// Label for an event owner as visitors see it.
pub fn owner_label(handle: Option<&str>, name: Option<&str>) -> String {
    user_label(handle, name, OWNER_FALLBACK)
}

pub fn visitor_list(event: &Event, owner: &str, gifts: &[Gift], viewer: UserId) -> Reply {
    let title = if event.title.is_empty() {
        "Вишлист"
    } else {
        event.title.as_str()
    };
    let mut text = format!(
        "🎁 <b>{}</b> — {}\n\n",
        escape_html(title),
        escape_html(owner)
    );
    if let Some(date) = event.event_date {
        text.push_str(&format!("📅 Подарки нужны до <b>{}</b>\n\n", format_date(date)));
    }
    if gifts.is_empty() {
        text.push_str("Пока пусто.");
    } else {
        text.push_str(&gift_lines(gifts, false));
    }

    let mut keyboard: Vec<Vec<Button>> = gifts
        .iter()
        .filter_map(|g| {
            if !g.is_reserved() {
                Some(vec![button(
                    format!("🎁 Выбрать: {}", truncate(&g.title, 30)),
                    CallbackAction::Reserve(g.id),
                )])
            } else if g.is_reserved_by(viewer) {
                Some(vec![button(
                    format!("↩️ Отменить выбор: {}", truncate(&g.title, 28)),
                    CallbackAction::Unreserve(g.id),
                )])
            } else {
                None
            }
        })
        .collect();
    keyboard.push(vec![button("🔄 Обновить список", CallbackAction::Refresh)]);
    keyboard.push(vec![button("◀️ Главный экран", CallbackAction::MenuHome)]);
    Reply::new(text, keyboard)
}

pub fn reserved_notice(title: &str) -> String {
    format!("🎁 Кто-то зарезервировал подарок «<b>{}</b>».", escape_html(title))
}

pub fn unreserved_notice(title: &str) -> String {
    format!("↩️ Резерв подарка «<b>{}</b>» снят.", escape_html(title))
}

// --- Misc ---

pub fn share(slug: &str, bot_username: Option<&str>, has_current_event: bool) -> Reply {
    let link_text = match bot_username {
        Some(bot) if !bot.is_empty() => {
            let link = format!("https://t.me/{bot}?start={slug}");
            format!(
                "Перешли друзьям:\n<a href=\"{}\">{}</a>",
                escape_html(&link),
                escape_html(&link)
            )
        }
        _ => format!("Отправь друзьям: <code>/start {}</code>", escape_html(slug)),
    };
    Reply::new(
        format!(
            "🔗 <b>Ссылка для друзей</b>\n\nДрузья переходят по ссылке и видят этот список. \
             У каждого события своя ссылка.\n\n{link_text}"
        ),
        owner_menu(has_current_event),
    )
}

pub fn help(for_owner: bool, has_current_event: bool) -> Reply {
    let mut text = String::from(
        "❓ <b>Помощь</b>\n\n\
         • <b>📋 События</b> — несколько вишлистов (ДР, Новый год и т.д.), у каждого своя ссылка\n\
         • <b>🎁 Мой список</b> — список подарков выбранного события (редактирование, удаление)\n\
         • <b>➕ Добавить</b> — добавить желание (название, описание, ссылка, приоритет 1–5)\n\
         • <b>🔗 Ссылка</b> — ссылка на текущее событие для друзей\n\
         • <b>📅 Дедлайн</b> — дата события и напоминание «обнови список» за N дней\n",
    );
    if !for_owner {
        text.push_str(
            "\nВы смотрите чужой вишлист — можно только выбрать подарок (кнопки под списком).",
        );
    }
    Reply::new(text, owner_menu(has_current_event))
}

pub fn reminder(event: &Event) -> String {
    let days = event.remind_days_before.unwrap_or_default();
    let date = event.event_date.map(format_date).unwrap_or_default();
    format!(
        "📅 <b>Напоминание</b>\n\nЧерез {days} дн. событие «{}» ({date}). \
         Обновите список подарков, если нужно.",
        escape_html(&event.title)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftlist_core::GiftId;

    fn gift(id: i64, title: &str) -> Gift {
        Gift {
            id: GiftId(id),
            event_id: EventId(1),
            title: title.to_string(),
            description: None,
            link: None,
            priority: 0,
            reserved_by: None,
            reserved_by_handle: None,
            reserved_by_name: None,
            created_at: "2025-01-01 00:00:00".to_string(),
        }
    }

    fn event() -> Event {
        Event {
            id: EventId(1),
            owner_id: UserId(10),
            title: "ДР <2025>".to_string(),
            slug: "alice".to_string(),
            event_date: NaiveDate::from_ymd_opt(2025, 6, 15),
            remind_days_before: Some(3),
            reminder_sent_for: None,
            created_at: "2025-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn escapes_html_specials() {
        assert_eq!(escape_html("a & <b>"), "a &amp; &lt;b&gt;");
        assert_eq!(escape_html("\"quotes\""), "&quot;quotes&quot;");
    }

    #[test]
    fn quote_in_link_stays_inside_href() {
        let mut g = gift(1, "Чайник");
        g.link = Some("магазин \"Ромашка\"".into());
        let line = gift_line(&g, 0, false);
        assert!(line.contains("<a href=\"магазин &quot;Ромашка&quot;\">Ссылка</a>"));
        // Every attribute quote that opens is closed on the same tag.
        let tag_start = line.find("<a ").unwrap();
        let tag_end = tag_start + line[tag_start..].find('>').unwrap();
        assert_eq!(line[tag_start..tag_end].matches('"').count(), 2);
    }

    #[test]
    fn russian_dates() {
        let d = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(format_date(d), "15 июня 2025");
        assert_eq!(format_date_numeric(d), "15.06.2025");
        let d = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(format_date(d), "1 января 2026");
    }

    #[test]
    fn gift_line_for_owner_and_visitor() {
        let mut g = gift(1, "Наушники");
        g.priority = 4;
        g.description = Some("чёрные".into());
        g.link = Some("https://shop.example/?a=1&b=2".into());
        let owner = gift_line(&g, 0, true);
        assert_eq!(
            owner,
            "1. <b>Наушники</b> — ○ свободно ⭐⭐⭐⭐ (очень хочу)\n   <i>чёрные</i>\n   \
             🔗 <a href=\"https://shop.example/?a=1&amp;b=2\">Ссылка</a>"
        );

        g.reserved_by = Some(UserId(5));
        g.reserved_by_handle = Some("bob".into());
        assert!(gift_line(&g, 2, true).starts_with("3. <b>Наушники</b> — будет подарен"));
        assert!(gift_line(&g, 2, false).contains(" — подарит @bob"));
        g.reserved_by_handle = None;
        assert!(gift_line(&g, 2, false).contains(" — подарит кто-то"));
    }

    #[test]
    fn truncation_counts_chars() {
        assert_eq!(truncate("коротко", 25), "коротко");
        let long = "ы".repeat(30);
        assert_eq!(truncate(&long, 25), format!("{}…", "ы".repeat(25)));
    }

    #[test]
    fn owner_list_layout() {
        let reply = owner_list(&event(), &[gift(7, "Книга")]);
        assert!(reply.text.starts_with("🎁 <b>ДР &lt;2025&gt;</b>\n\n📅 Дедлайн: 15 июня 2025\n\n"));
        assert_eq!(reply.keyboard[0][0].payload, "edit:7");
        assert_eq!(reply.keyboard[0][1].payload, "del:7");
        assert_eq!(reply.keyboard[2][1].payload, "deadline:1");

        let empty = owner_list(&event(), &[]);
        assert!(empty.text.ends_with("Пока пусто. Нажми ➕ Добавить подарок."));
    }

    #[test]
    fn visitor_buttons_depend_on_reservation() {
        let viewer = UserId(20);
        let free = gift(1, "Свободный");
        let mut mine = gift(2, "Мой");
        mine.reserved_by = Some(viewer);
        let mut theirs = gift(3, "Чужой");
        theirs.reserved_by = Some(UserId(30));

        let reply = visitor_list(&event(), "@alice", &[free, mine, theirs], viewer);
        let payloads: Vec<&str> = reply
            .keyboard
            .iter()
            .flatten()
            .map(|b| b.payload.as_str())
            .collect();
        assert_eq!(payloads, ["reserve:1", "unreserve:2", "refresh", "menu:home"]);
        assert!(reply.text.contains("📅 Подарки нужны до <b>15 июня 2025</b>"));
    }

    #[test]
    fn share_link_with_and_without_bot_name() {
        let with = share("alice", Some("gift_bot"), true);
        assert!(with.text.contains("<a href=\"https://t.me/gift_bot?start=alice\">"));
        let without = share("alice", None, false);
        assert!(without.text.contains("<code>/start alice</code>"));
    }

    #[test]
    fn owner_menu_shows_events_only_with_current_event() {
        assert_eq!(owner_menu(true).len(), 3);
        assert_eq!(owner_menu(false).len(), 2);
        assert_eq!(owner_menu(true)[0][0].payload, "owner:events");
    }

    #[test]
    fn reminder_text() {
        let text = reminder(&event());
        assert!(text.contains("Через 3 дн. событие «ДР &lt;2025&gt;» (15 июня 2025)"));
    }

    #[test]
    fn priority_messages() {
        assert_eq!(priority_updated(0, false).text, "✅ Приоритет убран.");
        assert_eq!(priority_updated(5, false).text, "✅ Приоритет: ⭐⭐⭐⭐⭐ мечта");
        assert_eq!(gift_added("Книга", 4, false).text, "✅ Подарок <b>Книга</b> добавлен! ⭐⭐⭐⭐");
    }
}
