// SPDX-FileCopyrightText: 2026 Giftlist Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Button payloads.
//!
//! Each inline button carries a short `kind[:arg[:arg]]` string (well under the
//! 64-byte limit chat platforms impose). [`CallbackAction`] is the typed form.

use std::fmt;
use std::str::FromStr;

use giftlist_core::{EventId, GiftField, GiftId};
use thiserror::Error;

/// Everything a button press can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    MenuCreate,
    MenuView,
    MenuHome,
    OwnerList,
    OwnerEvents,
    OwnerAdd,
    OwnerShare,
    OwnerHelp,
    OwnerNewEvent,
    OpenEvent(EventId),
    AddSkipDescription,
    AddSkipLink,
    /// Priority chosen in the add flow; 0 skips.
    AddPriority(u8),
    Cancel,
    Edit(GiftId),
    EditField(GiftId, GiftField),
    EditPriority(GiftId),
    SetPriority(GiftId, u8),
    Delete(GiftId),
    DeleteConfirm(GiftId),
    Deadline(EventId),
    SetDate(EventId),
    SetRemind(EventId),
    /// Reminder offset in days; 0 turns reminders off.
    Remind(EventId, u32),
    ClearDate(EventId),
    DeleteEvent(EventId),
    DeleteEventConfirm(EventId),
    Reserve(GiftId),
    Unreserve(GiftId),
    Refresh,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized button payload `{0}`")]
pub struct UnknownAction(pub String);

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CallbackAction::*;
        match self {
            MenuCreate => f.write_str("menu:create"),
            MenuView => f.write_str("menu:view"),
            MenuHome => f.write_str("menu:home"),
            OwnerList => f.write_str("owner:list"),
            OwnerEvents => f.write_str("owner:events"),
            OwnerAdd => f.write_str("owner:add"),
            OwnerShare => f.write_str("owner:share"),
            OwnerHelp => f.write_str("owner:help"),
            OwnerNewEvent => f.write_str("owner:newevent"),
            OpenEvent(e) => write!(f, "event:{e}"),
            AddSkipDescription => f.write_str("add:skipdesc"),
            AddSkipLink => f.write_str("add:skiplink"),
            AddPriority(n) => write!(f, "add:prio:{n}"),
            Cancel => f.write_str("cancel"),
            Edit(g) => write!(f, "edit:{g}"),
            EditField(g, field) => write!(f, "editfield:{g}:{field}"),
            EditPriority(g) => write!(f, "editprio:{g}"),
            SetPriority(g, n) => write!(f, "setprio:{g}:{n}"),
            Delete(g) => write!(f, "del:{g}"),
            DeleteConfirm(g) => write!(f, "delok:{g}"),
            Deadline(e) => write!(f, "deadline:{e}"),
            SetDate(e) => write!(f, "setdate:{e}"),
            SetRemind(e) => write!(f, "setremind:{e}"),
            Remind(e, days) => write!(f, "remind:{e}:{days}"),
            ClearDate(e) => write!(f, "cleardate:{e}"),
            DeleteEvent(e) => write!(f, "delevent:{e}"),
            DeleteEventConfirm(e) => write!(f, "deleventok:{e}"),
            Reserve(g) => write!(f, "reserve:{g}"),
            Unreserve(g) => write!(f, "unreserve:{g}"),
            Refresh => f.write_str("refresh"),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use CallbackAction::*;
        let unknown = || UnknownAction(s.to_string());
        let parts: Vec<&str> = s.split(':').collect();
        let event = |i: usize| -> Result<EventId, UnknownAction> {
            parts
                .get(i)
                .and_then(|p| p.parse().ok())
                .map(EventId)
                .ok_or_else(unknown)
        };
        let gift = |i: usize| -> Result<GiftId, UnknownAction> {
            parts
                .get(i)
                .and_then(|p| p.parse().ok())
                .map(GiftId)
                .ok_or_else(unknown)
        };
        let number = |i: usize| -> Result<u32, UnknownAction> {
            parts
                .get(i)
                .and_then(|p| p.parse().ok())
                .ok_or_else(unknown)
        };
        let small = |i: usize| -> Result<u8, UnknownAction> {
            number(i).and_then(|n| u8::try_from(n).map_err(|_| unknown()))
        };

        let action = match (parts[0], parts.len()) {
            ("menu", 2) => match parts[1] {
                "create" => MenuCreate,
                "view" => MenuView,
                "home" => MenuHome,
                _ => return Err(unknown()),
            },
            ("owner", 2) => match parts[1] {
                "list" => OwnerList,
                "events" => OwnerEvents,
                "add" => OwnerAdd,
                "share" => OwnerShare,
                "help" => OwnerHelp,
                "newevent" => OwnerNewEvent,
                _ => return Err(unknown()),
            },
            ("event", 2) => OpenEvent(event(1)?),
            ("add", 2) if parts[1] == "skipdesc" => AddSkipDescription,
            ("add", 2) if parts[1] == "skiplink" => AddSkipLink,
            ("add", 3) if parts[1] == "prio" => AddPriority(small(2)?),
            ("cancel", 1) => Cancel,
            ("edit", 2) => Edit(gift(1)?),
            ("editfield", 3) => {
                let field = parts[2].parse::<GiftField>().map_err(|_| unknown())?;
                EditField(gift(1)?, field)
            }
            ("editprio", 2) => EditPriority(gift(1)?),
            ("setprio", 3) => SetPriority(gift(1)?, small(2)?),
            ("del", 2) => Delete(gift(1)?),
            ("delok", 2) => DeleteConfirm(gift(1)?),
            ("deadline", 2) => Deadline(event(1)?),
            ("setdate", 2) => SetDate(event(1)?),
            ("setremind", 2) => SetRemind(event(1)?),
            ("remind", 3) => Remind(event(1)?, number(2)?),
            ("cleardate", 2) => ClearDate(event(1)?),
            ("delevent", 2) => DeleteEvent(event(1)?),
            ("deleventok", 2) => DeleteEventConfirm(event(1)?),
            ("reserve", 2) => Reserve(gift(1)?),
            ("unreserve", 2) => Unreserve(gift(1)?),
            ("refresh", 1) => Refresh,
            _ => return Err(unknown()),
        };
        Ok(action)
    }
}
