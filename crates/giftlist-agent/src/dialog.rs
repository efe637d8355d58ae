// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user conversation state machine.
//!
//! [`Dialog::handle`] turns one inbound event into the replies it causes.
//! Domain outcomes (unknown reference, reserved gift, stale session, bad date)
//! are rendered as messages or toasts; only infrastructure failures return
//! `Err`.

use std::sync::Arc;

use chrono::NaiveDate;
use giftlist_core::{
    Button, ConversationSession, DraftStep, Event, EventId, EventPatch, Gift, GiftDraft,
    GiftField, GiftId, GiftPatch, GiftlistError, InboundEvent, NewGift, Outbound, PendingInput,
    SessionStore, UserIdentity, Viewing, WishlistStore,
};
use tracing::{debug, info};

use crate::action::CallbackAction;
use crate::notifier::Notifier;
use crate::parse::{
    DateError, extract_link, is_clear_input, normalize_reference, parse_event_date,
    parse_priority_digit,
};
use crate::render::{self, Reply};

const STALE: &str = "Сессия устарела.";
const UPDATE_FAILED: &str = "Не удалось обновить.";
const GIFT_NOT_FOUND: &str = "Подарок не найден.";
const EVENT_NOT_FOUND: &str = "Событие не найдено.";
const OPEN_FIRST: &str = "Сначала откройте вишлист по ссылке или введите @username.";

/// Settings the dialog needs beyond its stores.
#[derive(Debug, Clone)]
pub struct DialogSettings {
    /// Bot username used to build share links, without `@`.
    pub bot_username: Option<String>,
    /// Title used when the owner sends an empty new-event title.
    pub new_event_title: String,
}

impl Default for DialogSettings {
    fn default() -> Self {
        Self {
            bot_username: None,
            new_event_title: "Новое событие".to_string(),
        }
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub struct Dialog {
    store: Arc<dyn WishlistStore>,
    sessions: Arc<dyn SessionStore>,
    notifier: Notifier,
    settings: DialogSettings,
    today: fn() -> NaiveDate,
}

/// Mutable state of one handled event.
struct Turn<'a> {
    user: &'a UserIdentity,
    chat_id: i64,
    session: ConversationSession,
    out: Vec<Outbound>,
}

impl Turn<'_> {
    fn reply(&mut self, reply: Reply) {
        self.out.push(reply.to(self.chat_id));
    }

    fn has_event(&self) -> bool {
        self.session.current_event.is_some()
    }

    fn owner_menu(&self) -> Vec<Vec<Button>> {
        render::owner_menu(self.has_event())
    }

    fn say(&mut self, text: &str) {
        let keyboard = self.owner_menu();
        self.reply(Reply::new(text, keyboard));
    }
}

impl Dialog {
    pub fn new(
        store: Arc<dyn WishlistStore>,
        sessions: Arc<dyn SessionStore>,
        notifier: Notifier,
        settings: DialogSettings,
    ) -> Self {
        Self {
            store,
            sessions,
            notifier,
            settings,
            today: local_today,
        }
    }

    /// Overrides the date used to fill in a missing year.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Handles one inbound event and returns everything to deliver, in order.
    pub async fn handle(&self, event: InboundEvent) -> Result<Vec<Outbound>, GiftlistError> {
        let user = event.from().clone();
        self.store.ensure_user(&user).await?;
        let session = self.sessions.load(user.id).await?;
        let mut turn = Turn {
            user: &user,
            chat_id: event.chat_id(),
            session,
            out: Vec::new(),
        };

        match event {
            InboundEvent::Command { name, args, .. } => {
                self.on_command(&mut turn, &name, &args).await?;
            }
            InboundEvent::Text { text, .. } => self.on_text(&mut turn, &text).await?,
            InboundEvent::Button {
                callback_id,
                payload,
                ..
            } => {
                let toast = match payload.parse::<CallbackAction>() {
                    Ok(action) => self.on_action(&mut turn, action).await?,
                    Err(e) => {
                        debug!(user = %user.id, error = %e, "ignoring button");
                        None
                    }
                };
                turn.out
                    .insert(0, render::answer(&callback_id, toast.as_deref()));
            }
        }

        self.sessions.save(user.id, &turn.session).await?;
        Ok(turn.out)
    }

    // --- Commands ---

    async fn on_command(
        &self,
        turn: &mut Turn<'_>,
        name: &str,
        args: &str,
    ) -> Result<(), GiftlistError> {
        match name {
            "start" => self.cmd_start(turn, args).await,
            "wishlist" => self.open_owner_list(turn).await,
            "events" => self.show_events(turn).await,
            "add" => self.cmd_add(turn, args).await,
            "help" => {
                self.show_help(turn);
                Ok(())
            }
            "cancel" => {
                self.cancel(turn);
                Ok(())
            }
            other => {
                debug!(command = other, "unknown command");
                turn.say("Неизвестная команда. Список возможностей — /help.");
                Ok(())
            }
        }
    }

    async fn cmd_start(&self, turn: &mut Turn<'_>, args: &str) -> Result<(), GiftlistError> {
        turn.session.pending = None;
        let reference = normalize_reference(args);
        if reference.is_empty() {
            turn.session.viewing = None;
            turn.reply(render::welcome());
            return Ok(());
        }
        if !self.open_reference(turn, &reference).await? {
            turn.reply(render::start_reference_not_found());
        }
        Ok(())
    }

    async fn cmd_add(&self, turn: &mut Turn<'_>, args: &str) -> Result<(), GiftlistError> {
        let title = args.trim();
        if title.is_empty() {
            turn.say("Напиши: <code>/add название подарка</code> или нажми кнопку ➕ Добавить.");
            return Ok(());
        }
        let Some(event) = self.owned_event(turn).await? else {
            turn.reply(Reply::new("Создайте вишлист.", render::choice_keyboard()));
            return Ok(());
        };
        let gift_id = self.store.add_gift(event.id, NewGift::titled(title)).await?;
        info!(user = %turn.user.id, event = %event.id, gift = %gift_id, "gift added by command");
        turn.session.current_event = Some(event.id);
        turn.reply(render::gift_added(title, 0, true));
        Ok(())
    }

    fn cancel(&self, turn: &mut Turn<'_>) {
        match turn.session.take_pending() {
            Some(PendingInput::AddingGift(_)) => turn.say("Добавление отменено."),
            Some(PendingInput::AwaitingReference) => {
                turn.reply(Reply::new("Действие отменено.", render::choice_keyboard()));
            }
            Some(_) => turn.say("Действие отменено."),
            None => turn.say("Нечего отменять."),
        }
    }

    fn show_help(&self, turn: &mut Turn<'_>) {
        let for_owner = turn.session.viewing.is_none();
        let has_event = turn.has_event();
        turn.reply(render::help(for_owner, has_event));
    }

    // --- Buttons ---

    async fn on_action(
        &self,
        turn: &mut Turn<'_>,
        action: CallbackAction,
    ) -> Result<Option<String>, GiftlistError> {
        use CallbackAction::*;
        debug!(user = %turn.user.id, action = %action, "button pressed");
        match action {
            MenuCreate => {
                let event = self.store.get_or_create_event(turn.user).await?;
                turn.session = ConversationSession {
                    current_event: Some(event.id),
                    ..Default::default()
                };
                self.show_owner_list(turn, &event).await?;
            }
            MenuView => {
                turn.session.viewing = None;
                turn.session.pending = Some(PendingInput::AwaitingReference);
                turn.reply(render::reference_prompt());
            }
            MenuHome => {
                turn.session = ConversationSession::default();
                turn.reply(render::welcome());
            }
            OwnerList => self.open_owner_list(turn).await?,
            OwnerEvents => {
                turn.session.current_event = None;
                turn.session.pending = None;
                self.show_events(turn).await?;
            }
            OwnerAdd => self.start_add(turn).await?,
            OwnerShare => self.share(turn).await?,
            OwnerHelp => self.show_help(turn),
            OwnerNewEvent => {
                turn.session.pending = Some(PendingInput::AwaitingEventTitle);
                turn.reply(render::new_event_prompt());
            }
            OpenEvent(event_id) => {
                match self.store.get_event_for_owner(event_id, turn.user.id).await? {
                    Some(event) => {
                        turn.session.current_event = Some(event.id);
                        turn.session.viewing = None;
                        turn.session.pending = None;
                        self.show_owner_list(turn, &event).await?;
                    }
                    None => turn.say(EVENT_NOT_FOUND),
                }
            }
            AddSkipDescription => self.advance_draft(turn, DraftStep::Description, None).await?,
            AddSkipLink => self.advance_draft(turn, DraftStep::Link, None).await?,
            AddPriority(n) => {
                let priority = if n == 0 { 0 } else { n.clamp(1, 5) };
                match turn.session.pending.take() {
                    Some(PendingInput::AddingGift(draft)) if draft.step == DraftStep::Priority => {
                        self.finish_draft(turn, draft, priority).await?;
                    }
                    other => {
                        turn.session.pending = other;
                        turn.say(STALE);
                    }
                }
            }
            Cancel => self.cancel(turn),
            Edit(gift_id) => {
                if let Some((_, gift)) = self.owned_gift(turn, gift_id).await? {
                    turn.reply(render::edit_menu(&gift));
                }
            }
            EditField(gift_id, field) => {
                if let Some((event, gift)) = self.owned_gift(turn, gift_id).await? {
                    turn.session.pending = Some(PendingInput::EditingGift {
                        gift_id,
                        event_id: event.id,
                        field,
                        fallback_title: gift.title,
                    });
                    turn.reply(render::edit_field_prompt(field));
                }
            }
            EditPriority(gift_id) => {
                if let Some((_, gift)) = self.owned_gift(turn, gift_id).await? {
                    turn.reply(render::priority_picker(&gift));
                }
            }
            SetPriority(gift_id, n) => {
                if let Some((event, _)) = self.owned_gift(turn, gift_id).await? {
                    let priority = n.min(5);
                    let patch = GiftPatch {
                        priority: Some(priority),
                        ..Default::default()
                    };
                    if self.store.update_gift(gift_id, event.id, patch).await? {
                        turn.reply(render::priority_updated(priority, turn.has_event()));
                    } else {
                        turn.say(UPDATE_FAILED);
                    }
                }
            }
            Delete(gift_id) => {
                if let Some((_, gift)) = self.owned_gift(turn, gift_id).await? {
                    turn.reply(render::delete_gift_confirm(&gift));
                }
            }
            DeleteConfirm(gift_id) => {
                let deleted = match self.owned_event(turn).await? {
                    Some(event) => self.store.delete_gift(gift_id, event.id).await?,
                    None => false,
                };
                if deleted {
                    info!(user = %turn.user.id, gift = %gift_id, "gift deleted");
                    turn.say("✅ Подарок удалён.");
                } else {
                    turn.say("Не удалось удалить.");
                }
            }
            Deadline(event_id) => {
                if let Some(event) = self.owned_event_by_id(turn, event_id).await? {
                    turn.reply(render::deadline_screen(&event));
                }
            }
            SetDate(event_id) => {
                if let Some(event) = self.owned_event_by_id(turn, event_id).await? {
                    turn.session.pending = Some(PendingInput::EditingDate { event_id: event.id });
                    turn.reply(render::date_prompt());
                }
            }
            SetRemind(event_id) => {
                if let Some(event) = self.owned_event_by_id(turn, event_id).await? {
                    turn.reply(render::remind_picker(event.id));
                }
            }
            Remind(event_id, days) => {
                let patch = EventPatch {
                    remind_days_before: Some((days > 0).then_some(days)),
                    ..Default::default()
                };
                if self.store.update_event(event_id, turn.user.id, patch).await? {
                    turn.session.current_event = Some(event_id);
                    turn.reply(render::remind_set(days, true));
                } else {
                    turn.say(UPDATE_FAILED);
                }
            }
            ClearDate(event_id) => {
                let patch = EventPatch {
                    event_date: Some(None),
                    remind_days_before: Some(None),
                    ..Default::default()
                };
                if self.store.update_event(event_id, turn.user.id, patch).await? {
                    turn.session.current_event = Some(event_id);
                    turn.reply(render::deadline_cleared(true));
                } else {
                    turn.say(UPDATE_FAILED);
                }
            }
            DeleteEvent(event_id) => {
                if let Some(event) = self.owned_event_by_id(turn, event_id).await? {
                    turn.reply(render::delete_event_confirm(&event));
                }
            }
            DeleteEventConfirm(event_id) => {
                if self.store.delete_event(event_id, turn.user.id).await? {
                    info!(user = %turn.user.id, event = %event_id, "event deleted");
                    if turn.session.current_event == Some(event_id) {
                        turn.session.current_event = None;
                    }
                    turn.session.pending = None;
                    turn.reply(Reply::plain("✅ Событие удалено."));
                    self.show_events(turn).await?;
                } else {
                    turn.say("Не удалось удалить.");
                }
            }
            Reserve(gift_id) => return self.toggle_reservation(turn, gift_id, true).await,
            Unreserve(gift_id) => return self.toggle_reservation(turn, gift_id, false).await,
            Refresh => match turn.session.viewing.clone() {
                Some(viewing) => self.show_visitor(turn, &viewing).await?,
                None => turn.reply(render::welcome()),
            },
        }
        Ok(None)
    }

    // --- Free text ---

    async fn on_text(&self, turn: &mut Turn<'_>, text: &str) -> Result<(), GiftlistError> {
        match turn.session.take_pending() {
            None => {
                let keyboard = if turn.has_event() {
                    render::owner_menu(true)
                } else {
                    render::choice_keyboard()
                };
                turn.reply(Reply::new(
                    "Выберите действие кнопками ниже или откройте /help.",
                    keyboard,
                ));
            }
            Some(PendingInput::AwaitingReference) => {
                let reference = normalize_reference(text);
                if reference.is_empty() {
                    turn.session.pending = Some(PendingInput::AwaitingReference);
                    turn.reply(render::reference_empty());
                } else if !self.open_reference(turn, &reference).await? {
                    turn.session.pending = Some(PendingInput::AwaitingReference);
                    turn.reply(render::reference_retry());
                }
            }
            Some(PendingInput::AwaitingEventTitle) => {
                let title = match text.trim() {
                    "" => self.settings.new_event_title.as_str(),
                    t => t,
                };
                let event = self.store.create_event(turn.user, title).await?;
                info!(user = %turn.user.id, event = %event.id, slug = %event.slug, "event created");
                turn.session.current_event = Some(event.id);
                turn.session.viewing = None;
                turn.reply(render::event_created(&event));
                self.show_owner_list(turn, &event).await?;
            }
            Some(PendingInput::AddingGift(draft)) => self.on_draft_text(turn, draft, text).await?,
            Some(PendingInput::EditingGift {
                gift_id,
                event_id,
                field,
                fallback_title,
            }) => {
                self.apply_gift_edit(turn, gift_id, event_id, field, &fallback_title, text)
                    .await?;
            }
            Some(PendingInput::EditingDate { event_id }) => {
                match parse_event_date(text, (self.today)()) {
                    Ok(date) => {
                        let patch = EventPatch {
                            event_date: Some(Some(date)),
                            ..Default::default()
                        };
                        if self.store.update_event(event_id, turn.user.id, patch).await? {
                            turn.session.current_event = Some(event_id);
                            turn.reply(render::date_set(date, true));
                        } else {
                            turn.say(UPDATE_FAILED);
                        }
                    }
                    Err(e) => {
                        turn.session.pending = Some(PendingInput::EditingDate { event_id });
                        turn.say(match e {
                            DateError::BadFormat => "Неверный формат. Введите ДД.ММ.ГГГГ или ДД.ММ",
                            DateError::InvalidDate => "Некорректная дата.",
                        });
                    }
                }
            }
        }
        Ok(())
    }

    async fn on_draft_text(
        &self,
        turn: &mut Turn<'_>,
        mut draft: GiftDraft,
        text: &str,
    ) -> Result<(), GiftlistError> {
        let text = text.trim();
        match draft.step {
            DraftStep::Title => {
                if text.is_empty() {
                    turn.session.pending = Some(PendingInput::AddingGift(draft));
                    turn.reply(Reply::new(
                        "Напиши название подарка.",
                        render::add_title_prompt().keyboard,
                    ));
                    return Ok(());
                }
                draft.title = text.to_string();
                draft.step = DraftStep::Description;
                turn.session.pending = Some(PendingInput::AddingGift(draft));
                turn.reply(render::add_description_prompt());
            }
            DraftStep::Description => {
                let value = (!text.is_empty()).then(|| text.to_string());
                turn.session.pending = Some(PendingInput::AddingGift(draft));
                self.advance_draft(turn, DraftStep::Description, value).await?;
            }
            DraftStep::Link => {
                let value = (!text.is_empty()).then(|| extract_link(text));
                turn.session.pending = Some(PendingInput::AddingGift(draft));
                self.advance_draft(turn, DraftStep::Link, value).await?;
            }
            DraftStep::Priority => match parse_priority_digit(text) {
                Some(priority) => self.finish_draft(turn, draft, priority).await?,
                None => {
                    turn.session.pending = Some(PendingInput::AddingGift(draft));
                    turn.reply(render::add_priority_prompt());
                }
            },
        }
        Ok(())
    }

    /// Records an optional draft field for `step` and moves to the next prompt.
    async fn advance_draft(
        &self,
        turn: &mut Turn<'_>,
        step: DraftStep,
        value: Option<String>,
    ) -> Result<(), GiftlistError> {
        let mut draft = match turn.session.pending.take() {
            Some(PendingInput::AddingGift(draft)) if draft.step == step => draft,
            other => {
                turn.session.pending = other;
                turn.say(STALE);
                return Ok(());
            }
        };
        match step {
            DraftStep::Description => {
                draft.description = value;
                draft.step = DraftStep::Link;
                turn.reply(render::add_link_prompt());
            }
            DraftStep::Link => {
                draft.link = value;
                draft.step = DraftStep::Priority;
                turn.reply(render::add_priority_prompt());
            }
            DraftStep::Title | DraftStep::Priority => {
                return Err(GiftlistError::Internal(format!(
                    "draft step {step:?} has no optional value"
                )));
            }
        }
        turn.session.pending = Some(PendingInput::AddingGift(draft));
        Ok(())
    }

    async fn finish_draft(
        &self,
        turn: &mut Turn<'_>,
        draft: GiftDraft,
        priority: u8,
    ) -> Result<(), GiftlistError> {
        if self
            .store
            .get_event_for_owner(draft.event_id, turn.user.id)
            .await?
            .is_none()
        {
            turn.say(STALE);
            return Ok(());
        }
        let gift = NewGift {
            title: draft.title,
            description: draft.description,
            link: draft.link,
            priority,
        };
        let title = gift.title.clone();
        let gift_id = self.store.add_gift(draft.event_id, gift).await?;
        info!(user = %turn.user.id, event = %draft.event_id, gift = %gift_id, "gift added");
        turn.session.current_event = Some(draft.event_id);
        turn.reply(render::gift_added(&title, priority, true));
        Ok(())
    }

    async fn apply_gift_edit(
        &self,
        turn: &mut Turn<'_>,
        gift_id: GiftId,
        event_id: EventId,
        field: GiftField,
        fallback_title: &str,
        text: &str,
    ) -> Result<(), GiftlistError> {
        // The event may have been deleted or handed elsewhere since the prompt.
        if self.store.get_event_owner_id(event_id).await? != Some(turn.user.id) {
            info!(user = %turn.user.id, event = %event_id, "stale edit session");
            turn.session.current_event = None;
            turn.say(STALE);
            return Ok(());
        }

        let mut shown_title = fallback_title.to_string();
        let patch = match field {
            GiftField::Title => {
                let title = match text.trim() {
                    "" => fallback_title,
                    t => t,
                };
                shown_title = title.to_string();
                GiftPatch {
                    title: Some(title.to_string()),
                    ..Default::default()
                }
            }
            GiftField::Description => GiftPatch {
                description: Some((!is_clear_input(text)).then(|| text.trim().to_string())),
                ..Default::default()
            },
            GiftField::Link => GiftPatch {
                link: Some((!is_clear_input(text)).then(|| extract_link(text))),
                ..Default::default()
            },
        };

        if self.store.update_gift(gift_id, event_id, patch).await? {
            turn.session.current_event = Some(event_id);
            turn.reply(render::gift_updated(&shown_title, true));
        } else {
            turn.say(UPDATE_FAILED);
        }
        Ok(())
    }

    // --- Owner helpers ---

    /// Id of the event owner actions apply to: the open one, else the earliest.
    async fn owner_event_id(&self, turn: &Turn<'_>) -> Result<Option<EventId>, GiftlistError> {
        match turn.session.current_event {
            Some(id) => Ok(Some(id)),
            None => self.store.get_user_default_event_id(turn.user.id).await,
        }
    }

    /// The event owner actions apply to, verified to belong to the user.
    async fn owned_event(&self, turn: &mut Turn<'_>) -> Result<Option<Event>, GiftlistError> {
        if let Some(id) = turn.session.current_event {
            if let Some(event) = self.store.get_event_for_owner(id, turn.user.id).await? {
                return Ok(Some(event));
            }
            turn.session.current_event = None;
        }
        match self.store.get_user_default_event_id(turn.user.id).await? {
            Some(id) => self.store.get_event_for_owner(id, turn.user.id).await,
            None => Ok(None),
        }
    }

    /// Looks up an event named by a button, replying when it is not the user's.
    async fn owned_event_by_id(
        &self,
        turn: &mut Turn<'_>,
        event_id: EventId,
    ) -> Result<Option<Event>, GiftlistError> {
        let event = self.store.get_event_for_owner(event_id, turn.user.id).await?;
        match &event {
            Some(event) => turn.session.current_event = Some(event.id),
            None => turn.say(EVENT_NOT_FOUND),
        }
        Ok(event)
    }

    /// Looks up a gift of the open event, replying when it is gone.
    async fn owned_gift(
        &self,
        turn: &mut Turn<'_>,
        gift_id: GiftId,
    ) -> Result<Option<(Event, Gift)>, GiftlistError> {
        let Some(event) = self.owned_event(turn).await? else {
            turn.reply(Reply::new(
                "Сначала создайте вишлист.",
                render::choice_keyboard(),
            ));
            return Ok(None);
        };
        match self.store.get_gift(gift_id, event.id).await? {
            Some(gift) => Ok(Some((event, gift))),
            None => {
                turn.say(GIFT_NOT_FOUND);
                Ok(None)
            }
        }
    }

    async fn open_owner_list(&self, turn: &mut Turn<'_>) -> Result<(), GiftlistError> {
        turn.session.pending = None;
        turn.session.viewing = None;
        match self.owned_event(turn).await? {
            Some(event) => {
                turn.session.current_event = Some(event.id);
                self.show_owner_list(turn, &event).await
            }
            None => self.show_events(turn).await,
        }
    }

    async fn show_owner_list(&self, turn: &mut Turn<'_>, event: &Event) -> Result<(), GiftlistError> {
        let gifts = self.store.get_gifts(event.id).await?;
        turn.reply(render::owner_list(event, &gifts));
        Ok(())
    }

    async fn show_events(&self, turn: &mut Turn<'_>) -> Result<(), GiftlistError> {
        let events = self.store.list_events_for_owner(turn.user.id).await?;
        turn.reply(render::events_list(&events));
        Ok(())
    }

    async fn start_add(&self, turn: &mut Turn<'_>) -> Result<(), GiftlistError> {
        let Some(event) = self.owned_event(turn).await? else {
            turn.reply(Reply::new(
                "Сначала выберите событие или создайте вишлист.",
                render::choice_keyboard(),
            ));
            return Ok(());
        };
        turn.session.current_event = Some(event.id);
        turn.session.viewing = None;
        turn.session.pending = Some(PendingInput::AddingGift(GiftDraft::new(event.id)));
        turn.reply(render::add_title_prompt());
        Ok(())
    }

    async fn share(&self, turn: &mut Turn<'_>) -> Result<(), GiftlistError> {
        let slug = match self.owner_event_id(turn).await? {
            Some(id) => self.store.get_share_slug(id).await?,
            None => None,
        };
        match slug {
            Some(slug) => {
                let bot = self.settings.bot_username.as_deref();
                let has_event = turn.has_event();
                turn.reply(render::share(&slug, bot, has_event));
            }
            None => turn.reply(Reply::new(
                "Сначала создайте вишлист (кнопка «Создать свой вишлист»).",
                render::choice_keyboard(),
            )),
        }
        Ok(())
    }

    // --- Visitor helpers ---

    /// Resolves a reference and shows the event. Returns `false` when nothing matched.
    async fn open_reference(
        &self,
        turn: &mut Turn<'_>,
        reference: &str,
    ) -> Result<bool, GiftlistError> {
        let Some(found) = self.store.resolve_event_reference(reference).await? else {
            debug!(user = %turn.user.id, reference, "reference not found");
            return Ok(false);
        };
        let viewing = Viewing {
            event_id: found.event.id,
            owner_label: render::owner_label(
                found.owner_handle.as_deref(),
                found.owner_name.as_deref(),
            ),
        };
        info!(user = %turn.user.id, event = %viewing.event_id, "visitor opened event");
        let gifts = self.store.get_gifts(viewing.event_id).await?;
        turn.reply(render::visitor_list(
            &found.event,
            &viewing.owner_label,
            &gifts,
            turn.user.id,
        ));
        turn.session.viewing = Some(viewing);
        turn.session.pending = None;
        Ok(true)
    }

    async fn show_visitor(&self, turn: &mut Turn<'_>, viewing: &Viewing) -> Result<(), GiftlistError> {
        let Some(event) = self.store.get_event(viewing.event_id).await? else {
            turn.session.viewing = None;
            turn.reply(Reply::new(
                "Этот вишлист больше недоступен.",
                render::choice_keyboard(),
            ));
            return Ok(());
        };
        let gifts = self.store.get_gifts(event.id).await?;
        turn.reply(render::visitor_list(
            &event,
            &viewing.owner_label,
            &gifts,
            turn.user.id,
        ));
        Ok(())
    }

    async fn toggle_reservation(
        &self,
        turn: &mut Turn<'_>,
        gift_id: GiftId,
        reserve: bool,
    ) -> Result<Option<String>, GiftlistError> {
        let Some(viewing) = turn.session.viewing.clone() else {
            return Ok(Some(OPEN_FIRST.to_string()));
        };
        let Some(gift) = self.store.get_gift(gift_id, viewing.event_id).await? else {
            return Ok(Some(GIFT_NOT_FOUND.to_string()));
        };

        let (changed, toast, notice) = if reserve {
            let ok = self.store.reserve_gift(gift_id, turn.user).await?;
            let toast = if ok {
                "Вы выбрали этот подарок!"
            } else {
                "Этот подарок уже кто-то выбрал."
            };
            (ok, toast, render::reserved_notice(&gift.title))
        } else {
            let ok = self.store.unreserve_gift(gift_id, turn.user.id).await?;
            let toast = if ok {
                "Вы отменили выбор этого подарка."
            } else {
                "Не удалось отменить (возможно, уже снято)."
            };
            (ok, toast, render::unreserved_notice(&gift.title))
        };

        if changed {
            info!(user = %turn.user.id, gift = %gift_id, reserve, "reservation changed");
            if let Some(owner) = self.store.get_event_owner_id(viewing.event_id).await?
                && owner != turn.user.id
            {
                self.notifier.notify(owner, notice);
            }
            self.show_visitor(turn, &viewing).await?;
        }
        Ok(Some(toast.to_string()))
    }
}
