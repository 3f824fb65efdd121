/*
 * lib.rs
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

//! Asynchronous IMAP client engine. Encodes commands to wire bytes,
//! correlates server responses back to the issuing command by tag, and
//! drives the protocol's sub-dialogs: SASL challenge/response, literal
//! continuation (APPEND) and long-lived streaming commands (IDLE).
//!
//! The session is generic over the transport (any AsyncRead/AsyncWrite
//! pair); `net` provides plain-TCP and implicit-TLS conveniences.

pub mod capability;
pub mod command;
pub mod error;
pub mod mailbox;
pub mod message_set;
pub mod net;
pub mod registry;
pub mod response;
pub mod sasl;
pub mod session;

pub use capability::Capability;
pub use command::{ImapCommand, ImapCommandType};
pub use error::ImapError;
pub use registry::{CompletionHandle, UntaggedStream};
pub use response::{CommandCompletion, ImapResponse, ResponseStatus, UntaggedResponse};
pub use session::{ImapSession, SessionState};
