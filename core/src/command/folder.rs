/*
 * folder.rs
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

//! Mailbox-addressed commands: SELECT, STATUS, CREATE, APPEND. Mailbox
//! names go through the wire codec (bare / quoted / modified UTF-7).
//! APPEND announces its literal size up front and supplies the body as
//! the continuation response.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, FixedOffset};

use super::CRLF;
use crate::error::ImapError;
use crate::mailbox::encode_mailbox_name;

/// SELECT a mailbox for access.
#[derive(Debug)]
pub struct SelectCommand {
    mailbox: String,
}

impl SelectCommand {
    pub fn new(mailbox: impl Into<String>) -> Self {
        Self {
            mailbox: mailbox.into(),
        }
    }

    pub(crate) fn encode(&self) -> Result<Bytes, ImapError> {
        Ok(Bytes::from(format!(
            "SELECT {}{}",
            encode_mailbox_name(&self.mailbox),
            CRLF
        )))
    }

    pub(crate) fn cleanup(&mut self) {
        self.mailbox = String::new();
    }
}

/// STATUS with a list of status data item names (MESSAGES, UIDNEXT, ...).
#[derive(Debug)]
pub struct StatusCommand {
    mailbox: String,
    items: Vec<String>,
}

impl StatusCommand {
    pub fn new<I, S>(mailbox: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mailbox: mailbox.into(),
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn encode(&self) -> Result<Bytes, ImapError> {
        Ok(Bytes::from(format!(
            "STATUS {} ({}){}",
            encode_mailbox_name(&self.mailbox),
            self.items.join(" "),
            CRLF
        )))
    }

    pub(crate) fn cleanup(&mut self) {
        self.mailbox = String::new();
        self.items = Vec::new();
    }
}

/// CREATE a mailbox.
#[derive(Debug)]
pub struct CreateCommand {
    mailbox: String,
}

impl CreateCommand {
    pub fn new(mailbox: impl Into<String>) -> Self {
        Self {
            mailbox: mailbox.into(),
        }
    }

    pub(crate) fn encode(&self) -> Result<Bytes, ImapError> {
        Ok(Bytes::from(format!(
            "CREATE {}{}",
            encode_mailbox_name(&self.mailbox),
            CRLF
        )))
    }

    pub(crate) fn cleanup(&mut self) {
        self.mailbox = String::new();
    }
}

/// APPEND a raw message. The initial line announces flags, an optional
/// internal date and the literal size; the message bytes are written as
/// the continuation response once the server prompts with `+`.
#[derive(Debug)]
pub struct AppendCommand {
    mailbox: String,
    flags: Vec<String>,
    date: Option<DateTime<FixedOffset>>,
    message: Vec<u8>,
}

impl AppendCommand {
    pub fn new(mailbox: impl Into<String>, message: Vec<u8>) -> Self {
        Self {
            mailbox: mailbox.into(),
            flags: Vec::new(),
            date: None,
            message,
        }
    }

    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_internal_date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    pub(crate) fn encode(&self) -> Result<Bytes, ImapError> {
        let mut line = format!("APPEND {}", encode_mailbox_name(&self.mailbox));
        if !self.flags.is_empty() {
            line.push_str(&format!(" ({})", self.flags.join(" ")));
        }
        if let Some(date) = &self.date {
            // RFC 3501 date-time, always quoted
            line.push_str(&format!(" \"{}\"", date.format("%d-%b-%Y %H:%M:%S %z")));
        }
        line.push_str(&format!(" {{{}}}{}", self.message.len(), CRLF));
        Ok(Bytes::from(line))
    }

    pub(crate) fn next_line(&self) -> Result<Bytes, ImapError> {
        let mut buf = BytesMut::with_capacity(self.message.len() + 2);
        buf.put_slice(&self.message);
        buf.put_slice(CRLF.as_bytes());
        Ok(buf.freeze())
    }

    pub(crate) fn cleanup(&mut self) {
        self.mailbox = String::new();
        self.flags = Vec::new();
        self.date = None;
        self.message = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_create_bare_name() {
        let cmd = CreateCommand::new("folderABC");
        assert_eq!(cmd.encode().unwrap(), Bytes::from(&b"CREATE folderABC\r\n"[..]));
    }

    #[test]
    fn test_create_name_with_space_is_quoted() {
        let cmd = CreateCommand::new("folder ABC");
        assert_eq!(
            cmd.encode().unwrap(),
            Bytes::from(&b"CREATE \"folder ABC\"\r\n"[..])
        );
    }

    #[test]
    fn test_create_non_ascii_name_is_utf7() {
        let cmd = CreateCommand::new("\u{6d4b}\u{8bd5}");
        assert_eq!(cmd.encode().unwrap(), Bytes::from(&b"CREATE &bUuL1Q-\r\n"[..]));
    }

    #[test]
    fn test_create_cleanup_clears_name() {
        let mut cmd = CreateCommand::new("folderABC");
        cmd.cleanup();
        assert!(cmd.mailbox.is_empty());
    }

    #[test]
    fn test_select_and_status_forms() {
        assert_eq!(
            SelectCommand::new("INBOX").encode().unwrap(),
            Bytes::from(&b"SELECT INBOX\r\n"[..])
        );
        let status = StatusCommand::new("INBOX", ["MESSAGES", "UIDNEXT"]);
        assert_eq!(
            status.encode().unwrap(),
            Bytes::from(&b"STATUS INBOX (MESSAGES UIDNEXT)\r\n"[..])
        );
    }

    #[test]
    fn test_append_announces_literal_size() {
        let msg = b"From: a@b\r\n\r\nhi".to_vec();
        let cmd = AppendCommand::new("INBOX", msg.clone()).with_flags(["\\Seen"]);
        let line = cmd.encode().unwrap();
        assert_eq!(
            line,
            Bytes::from(format!("APPEND INBOX (\\Seen) {{{}}}\r\n", msg.len()))
        );
        let mut body = msg;
        body.extend_from_slice(b"\r\n");
        assert_eq!(cmd.next_line().unwrap(), Bytes::from(body));
    }

    #[test]
    fn test_append_internal_date_format() {
        let date = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 2, 7, 9, 30, 5)
            .unwrap();
        let cmd = AppendCommand::new("INBOX", b"x".to_vec()).with_internal_date(date);
        let line = String::from_utf8(cmd.encode().unwrap().to_vec()).unwrap();
        assert_eq!(line, "APPEND INBOX \"07-Feb-2026 09:30:05 +0000\" {1}\r\n");
    }
}
