/*
 * response.rs
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

//! Server response records. Every inbound line is classified as untagged
//! (`*`), continuation (`+`) or tagged completion (`<tag> OK|NO|BAD`);
//! anything else is a protocol violation. A line announcing a literal
//! (`{N}` suffix) carries the literal bytes alongside the line. Framing is
//! done incrementally from a byte accumulator so a partially received
//! response survives until the rest arrives.

use bytes::{Buf, BytesMut};

use crate::error::ImapError;

/// Completion status of a tagged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    No,
    Bad,
}

impl ResponseStatus {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "OK" => Some(ResponseStatus::Ok),
            "NO" => Some(ResponseStatus::No),
            "BAD" => Some(ResponseStatus::Bad),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseStatus::Ok)
    }
}

/// One untagged data line, with its literal bytes if the line announced one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntaggedResponse {
    pub line: String,
    pub literal: Option<Vec<u8>>,
}

/// A classified server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImapResponse {
    Untagged(UntaggedResponse),
    /// `+` line requesting more client data (or acknowledging IDLE).
    Continuation { prompt: String },
    /// Terminal line for one tagged command.
    Tagged {
        tag: String,
        status: ResponseStatus,
        line: String,
    },
}

/// Terminal result of one command: the tagged line plus the untagged data
/// buffered for it (empty for streaming commands, whose data was already
/// forwarded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCompletion {
    pub tag: String,
    pub status: ResponseStatus,
    pub line: String,
    pub untagged: Vec<UntaggedResponse>,
}

/// Classify one raw line. `<tag> OK|NO|BAD ...` is a tagged completion;
/// `*` and `+` keep their usual meanings. Any other non-empty line is the
/// tail of a literal-carrying response and counts as untagged data. An
/// empty line is outside the grammar.
pub fn classify_line(line: String, literal: Option<Vec<u8>>) -> Result<ImapResponse, ImapError> {
    if line.is_empty() {
        return Err(ImapError::ProtocolViolation(
            "empty response line".to_string(),
        ));
    }
    if line.starts_with('*') {
        return Ok(ImapResponse::Untagged(UntaggedResponse { line, literal }));
    }
    if let Some(rest) = line.strip_prefix('+') {
        return Ok(ImapResponse::Continuation {
            prompt: rest.trim().to_string(),
        });
    }
    let mut words = line.splitn(3, ' ');
    let tag = words.next().unwrap_or("");
    let status = words.next().and_then(ResponseStatus::from_word);
    match status {
        Some(status) => Ok(ImapResponse::Tagged {
            tag: tag.to_string(),
            status,
            line,
        }),
        None => Ok(ImapResponse::Untagged(UntaggedResponse { line, literal })),
    }
}

/// Take one complete frame (CRLF-terminated line, plus the announced
/// literal if the line ends with `{N}`) out of the accumulator. Returns
/// None when more bytes are needed; nothing is consumed in that case.
pub fn take_frame(acc: &mut BytesMut) -> Option<(String, Option<Vec<u8>>)> {
    let eol = acc.windows(2).position(|w| w == b"\r\n")?;
    let line = String::from_utf8_lossy(&acc[..eol]).trim().to_string();
    match literal_size(&line) {
        Some(size) => {
            let size = size as usize;
            if acc.len() < eol + 2 + size {
                return None;
            }
            acc.advance(eol + 2);
            let literal = acc.split_to(size).to_vec();
            Some((line, Some(literal)))
        }
        None => {
            acc.advance(eol + 2);
            Some((line, None))
        }
    }
}

/// Size announced by a trailing `{N}`, if present.
fn literal_size(line: &str) -> Option<u32> {
    let open = line.rfind('{')?;
    let rest = &line[open + 1..];
    rest.strip_suffix('}')?.trim().parse().ok()
}
