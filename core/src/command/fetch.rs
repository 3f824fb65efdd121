/*
 * fetch.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Portalettere, an asynchronous IMAP client engine.
 *
 * Portalettere is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Portalettere is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Portalettere.  If not, see <http://www.gnu.org/licenses/>.
 */

//! FETCH commands. Built either from an explicit list of data item names
//! or from one of the named macros (ALL, FAST, FULL); the two entry
//! points are mutually exclusive and compile to the same wire shape:
//! `FETCH <message-set> <items-or-macro>`. A UID variant prefixes the
//! verb; a streaming variant has its untagged responses forwarded live
//! instead of buffered.

use bytes::Bytes;

use super::CRLF;
use crate::error::ImapError;
use crate::message_set::{to_sequence_string, MessageNumberSet};

/// Named fetch item macro (RFC 3501 §6.4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMacro {
    All,
    Fast,
    Full,
}

impl FetchMacro {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMacro::All => "ALL",
            FetchMacro::Fast => "FAST",
            FetchMacro::Full => "FULL",
        }
    }
}

#[derive(Debug)]
enum FetchItems {
    /// Explicit item names, e.g. "FLAGS BODY[]".
    Items(String),
    Macro(FetchMacro),
}

/// FETCH over a message set, by sequence number or (with `uid_*`) by UID.
#[derive(Debug)]
pub struct FetchCommand {
    uid: bool,
    streaming: bool,
    sets: Vec<MessageNumberSet>,
    items: FetchItems,
}

impl FetchCommand {
    pub fn with_items(sets: Vec<MessageNumberSet>, items: impl Into<String>) -> Self {
        Self {
            uid: false,
            streaming: false,
            sets,
            items: FetchItems::Items(items.into()),
        }
    }

    pub fn with_macro(sets: Vec<MessageNumberSet>, m: FetchMacro) -> Self {
        Self {
            uid: false,
            streaming: false,
            sets,
            items: FetchItems::Macro(m),
        }
    }

    pub fn uid_with_items(sets: Vec<MessageNumberSet>, items: impl Into<String>) -> Self {
        Self {
            uid: true,
            ..Self::with_items(sets, items)
        }
    }

    pub fn uid_with_macro(sets: Vec<MessageNumberSet>, m: FetchMacro) -> Self {
        Self {
            uid: true,
            ..Self::with_macro(sets, m)
        }
    }

    /// Forward untagged FETCH responses to the caller as they arrive
    /// instead of buffering them until the tagged completion.
    pub fn streaming(mut self) -> Self {
        self.streaming = true;
        self
    }

    pub(crate) fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub(crate) fn encode(&self) -> Result<Bytes, ImapError> {
        let items = match &self.items {
            FetchItems::Items(s) => {
                let trimmed = s.trim().trim_start_matches('(').trim_end_matches(')');
                format!("({})", trimmed)
            }
            FetchItems::Macro(m) => m.as_str().to_string(),
        };
        Ok(Bytes::from(format!(
            "{}FETCH {} {}{}",
            if self.uid { "UID " } else { "" },
            to_sequence_string(&self.sets),
            items,
            CRLF
        )))
    }

    pub(crate) fn cleanup(&mut self) {
        self.sets = Vec::new();
        self.items = FetchItems::Items(String::new());
    }
}
