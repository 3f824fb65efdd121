/*
 * error.rs
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

//! Engine errors. Local failures (UnsupportedOperation, CapabilityMissing,
//! StateViolation) are returned synchronously at issue or continuation time;
//! ProtocolViolation and ConnectionClosed are delivered to the affected
//! completion handles.

use std::fmt;
use std::io;

use crate::session::SessionState;

/// Errors raised by the IMAP engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImapError {
    /// A command was asked to do something outside its contract, e.g.
    /// a continuation line from a command that never defers its payload,
    /// or a terminate line from a command that has none.
    UnsupportedOperation,
    /// The command requires a capability the server did not advertise.
    CapabilityMissing(String),
    /// The server stepped outside the response grammar or tag discipline
    /// (unknown tag, continuation with nothing waiting, malformed line).
    ProtocolViolation(String),
    /// The command is not legal in the current session state.
    StateViolation {
        state: SessionState,
        command: &'static str,
    },
    /// The transport was torn down while the command was outstanding.
    ConnectionClosed(String),
}

impl fmt::Display for ImapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImapError::UnsupportedOperation => {
                write!(f, "operation not supported for this command")
            }
            ImapError::CapabilityMissing(cap) => {
                write!(f, "server does not advertise capability {}", cap)
            }
            ImapError::ProtocolViolation(msg) => write!(f, "protocol violation: {}", msg),
            ImapError::StateViolation { state, command } => {
                write!(f, "{} not legal in state {:?}", command, state)
            }
            ImapError::ConnectionClosed(msg) => write!(f, "connection closed: {}", msg),
        }
    }
}

impl std::error::Error for ImapError {}

impl From<io::Error> for ImapError {
    fn from(e: io::Error) -> Self {
        ImapError::ConnectionClosed(e.to_string())
    }
}
